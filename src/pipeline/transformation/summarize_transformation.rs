use std::{
    cmp::Ordering,
    collections::{hash_map::Entry, HashMap},
};

use tracing::debug;

use crate::pipeline::{
    aggregation::{Aggregation, Sum},
    expression::Expression,
    Column, PlotError, Schema, Table, Value,
};

use super::Transformation;

#[derive(Debug, Clone)]
struct Agg {
    column_name: String,
    aggregation: Aggregation,
}

#[derive(Debug)]
struct Key {
    column_name: String,
    expression: Box<dyn Expression>,
}

/**
 * Collapses rows sharing the same key columns into one row per group.
 * Every numeric column outside the key is summed, other non-key columns are dropped.
 * Rows with a null key are dropped, groups come out ordered by key.
 */
#[derive(Debug)]
pub struct SummarizeTransformation {
    output_schema: Schema,
    aggregations: Vec<Agg>,
    keys: Vec<Key>,
}

impl SummarizeTransformation {
    pub fn create(
        input_schema: &Schema,
        keys: Vec<String>,
    ) -> Result<Box<dyn Transformation>, PlotError> {
        let keys: Vec<Key> = keys
            .into_iter()
            .map(|col| {
                Ok(Key {
                    expression: input_schema.get_col_expr(&col)?,
                    column_name: col,
                })
            })
            .collect::<Result<Vec<_>, PlotError>>()?;
        let aggregations: Vec<Agg> = input_schema
            .columns
            .iter()
            .filter(|c| c.column_type.is_numeric())
            .filter(|c| !keys.iter().any(|k| k.column_name == c.name))
            .map(|c| {
                Ok(Agg {
                    column_name: c.name.clone(),
                    aggregation: Aggregation::new(
                        Box::new(Sum::new(c.column_type)),
                        vec![input_schema.get_col_expr(&c.name)?],
                    ),
                })
            })
            .collect::<Result<Vec<_>, PlotError>>()?;

        let types = input_schema.get_column_types();
        let mut columns = vec![];
        for key in keys.iter() {
            columns.push(Column::new(
                key.column_name.clone(),
                key.expression.get_output_type(&types)?,
            ));
        }
        for agg in aggregations.iter() {
            columns.push(Column::new(
                agg.column_name.clone(),
                agg.aggregation.get_output_type(&types)?,
            ));
        }
        Ok(Box::new(SummarizeTransformation {
            output_schema: Schema::from(columns),
            aggregations,
            keys,
        }))
    }

    fn get_key(&self, row: &[Value]) -> Vec<Value> {
        self.keys.iter().map(|k| k.expression.eval(row)).collect()
    }
}

fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.sort_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Transformation for SummarizeTransformation {
    fn get_output_schema(&self, _input_schema: &Schema) -> Schema {
        self.output_schema.clone()
    }

    fn transform(&self, table: &Table) -> Result<Table, PlotError> {
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<Value>, Vec<Agg>)> = vec![];
        for row in table.rows.iter() {
            let key = self.get_key(row);
            if let Some(Value::Error(e)) = key.iter().find(|v| v.is_error()) {
                return Err(e.clone());
            }
            if key.iter().any(|v| v.is_null()) {
                continue;
            }
            let idx = match index.entry(key) {
                Entry::Occupied(o) => *o.get(),
                Entry::Vacant(v) => {
                    groups.push((v.key().clone(), self.aggregations.clone()));
                    *v.insert(groups.len() - 1)
                }
            };
            groups[idx]
                .1
                .iter_mut()
                .try_for_each(|agg| agg.aggregation.feed(row))?;
        }
        groups.sort_by(|(a, _), (b, _)| compare_keys(a, b));
        debug!("Summarized {} rows into {} groups", table.len(), groups.len());

        let mut rows = Vec::with_capacity(groups.len());
        for (key, aggs) in groups.into_iter() {
            let mut row = key;
            for agg in aggs.into_iter() {
                row.push(agg.aggregation.get_result()?);
            }
            rows.push(row);
        }
        Ok(Table::new(self.output_schema.clone(), rows))
    }

    fn dump(&self) -> String {
        let aggs = self
            .aggregations
            .iter()
            .map(|agg| format!("{}={}", agg.column_name, agg.aggregation.dump()))
            .collect::<Vec<_>>()
            .join(", ");
        let keys = self
            .keys
            .iter()
            .map(|key| key.column_name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        format!("summarize {} by {}", aggs, keys)
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::{Column, Schema, Table, Value, ValueType};

    use super::*;

    fn schema() -> Schema {
        Schema::from(vec![
            Column::new("date", ValueType::String),
            Column::new("geo", ValueType::String),
            Column::new("Spend", ValueType::Long),
            Column::new("Activity", ValueType::Long),
        ])
    }

    #[test]
    fn test_summarize() {
        let table = Table::new(
            schema(),
            vec![
                vec!["d2".into(), "north".into(), 10.into(), 2.into()],
                vec!["d1".into(), "north".into(), 1.into(), 1.into()],
                vec!["d2".into(), "south".into(), 5.into(), 3.into()],
                vec![Value::Null, "south".into(), 100.into(), 100.into()],
            ],
        );
        let t = SummarizeTransformation::create(&schema(), vec!["date".to_string()]).unwrap();
        let out = t.transform(&table).unwrap();

        // `geo` is neither a key nor numeric
        assert_eq!(
            out.schema,
            Schema::from(vec![
                Column::new("date", ValueType::String),
                Column::new("Spend", ValueType::Long),
                Column::new("Activity", ValueType::Long),
            ])
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows[0], vec![Value::from("d1"), 1.into(), 1.into()]);
        assert_eq!(out.rows[1], vec![Value::from("d2"), 15.into(), 5.into()]);
        assert_eq!(
            t.dump(),
            "summarize Spend=sum(Spend), Activity=sum(Activity) by date"
        );
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            SummarizeTransformation::create(&schema(), vec!["region".to_string()]),
            Err(PlotError::ColumnNotFound(_))
        ));
    }
}
