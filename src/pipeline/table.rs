use serde::{Deserialize, Serialize};

use super::{
    expression::{ColumnExpression, Expression},
    PlotError, Value, ValueType,
};

/**
 * The column definition
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /**
     * Column name
     */
    pub name: String,

    /**
     * Column type
     */
    pub column_type: ValueType,
}

impl Column {
    pub fn new<T>(name: T, column_type: ValueType) -> Self
    where
        T: ToString,
    {
        Self {
            name: name.to_string(),
            column_type,
        }
    }
}

/**
 * Schema is a collection of columns
 */
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl<T> From<T> for Schema
where
    T: IntoIterator<Item = Column>,
{
    fn from(columns: T) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Schema {
    pub fn get_column_types(&self) -> Vec<ValueType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }

    /// Column names are matched exactly, `Spend` and `spend` are different columns.
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name == column_name)
    }

    pub fn has_column(&self, column_name: &str) -> bool {
        self.get_column_index(column_name).is_some()
    }

    pub fn get_column(&self, column_name: &str) -> Result<&Column, PlotError> {
        self.columns
            .iter()
            .find(|column| column.name == column_name)
            .ok_or_else(|| PlotError::ColumnNotFound(column_name.to_string()))
    }

    /**
     * Get an expression that reads the named column from a row of this schema
     */
    pub fn get_col_expr(&self, column_name: &str) -> Result<Box<dyn Expression>, PlotError> {
        let column_index = self
            .get_column_index(column_name)
            .ok_or_else(|| PlotError::ColumnNotFound(column_name.to_string()))?;
        Ok(Box::new(ColumnExpression {
            column_name: column_name.to_string(),
            column_index,
        }))
    }

    pub fn dump(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} as {}", c.name, c.column_type))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/**
 * Define how the rows of a table are checked against its schema
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /**
     * The table is rejected if there is any field doesn't match the schema.
     */
    Strict,

    /**
     * The row will be skipped if there is any field doesn't match the schema.
     */
    Skip,

    /**
     * The unmatched field will be converted to the schema type, and turned into `null` if failed.
     */
    #[default]
    Convert,
}

/**
 * The in-memory observation table.
 * Pipeline stages never modify a table, they always produce a new one.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub schema: Schema,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /**
     * All values of the named column, in row order
     */
    pub fn column_values(&self, column_name: &str) -> Result<Vec<Value>, PlotError> {
        let idx = self
            .schema
            .get_column_index(column_name)
            .ok_or_else(|| PlotError::ColumnNotFound(column_name.to_string()))?;
        // A short row reads as null past its end
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or_default())
            .collect())
    }

    /**
     * Distinct non-null values of the named column, in the order of their first appearance
     */
    pub fn distinct_values(&self, column_name: &str) -> Result<Vec<Value>, PlotError> {
        let mut ret: Vec<Value> = vec![];
        for v in self.column_values(column_name)? {
            if !v.is_null() && !ret.contains(&v) {
                ret.push(v);
            }
        }
        Ok(ret)
    }

    /**
     * Smallest and largest non-null values of the named column, None if the column has no value
     */
    pub fn min_max(&self, column_name: &str) -> Result<Option<(Value, Value)>, PlotError> {
        let values = self.column_values(column_name)?;
        let mut iter = values.into_iter().filter(|v| !v.is_null());
        let first = match iter.next() {
            Some(v) => v,
            None => return Ok(None),
        };
        Ok(Some(iter.fold((first.clone(), first), |(min, max), v| {
            let min = if v.sort_cmp(&min).is_lt() { v.clone() } else { min };
            let max = if v.sort_cmp(&max).is_gt() { v } else { max };
            (min, max)
        })))
    }

    /**
     * Check all rows against the schema, `mode` defines how mismatched rows are handled
     */
    pub fn validated(self, mode: ValidationMode) -> Result<Table, PlotError> {
        let types = self.schema.get_column_types();
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            if row.len() != types.len() {
                match mode {
                    ValidationMode::Strict => {
                        return Err(PlotError::InvalidRowLength(types.len(), row.len()))
                    }
                    ValidationMode::Skip => continue,
                    // Short rows are padded with nulls
                    ValidationMode::Convert => {}
                }
            }
            match mode {
                ValidationMode::Strict => {
                    rows.push(
                        row.into_iter()
                            .zip(types.iter())
                            .map(|(field, t)| field.try_into(*t))
                            .collect::<Result<Vec<_>, _>>()?,
                    );
                }
                ValidationMode::Skip => {
                    if let Ok(row) = row
                        .into_iter()
                        .zip(types.iter())
                        .map(|(field, t)| field.try_into(*t))
                        .collect::<Result<Vec<_>, _>>()
                    {
                        rows.push(row);
                    }
                }
                ValidationMode::Convert => {
                    let mut row = row;
                    row.resize(types.len(), Value::Null);
                    rows.push(
                        row.into_iter()
                            .zip(types.iter())
                            .map(|(field, t)| field.try_convert(*t).unwrap_or(Value::Null))
                            .collect(),
                    );
                }
            }
        }
        Ok(Table {
            schema: self.schema,
            rows,
        })
    }

    pub fn dump(&self) -> String {
        let mut ret = String::new();
        let s = self.schema.dump();
        ret.push_str(&s);
        ret.push('\n');
        ret.push_str("-".repeat(s.len()).as_str());
        ret.push('\n');
        for row in &self.rows {
            ret.push_str(
                row.iter()
                    .map(|v| v.dump())
                    .collect::<Vec<_>>()
                    .join(", ")
                    .as_str(),
            );
            ret.push('\n');
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen_schema() -> Schema {
        vec![
            Column::new("Spend", ValueType::Double),
            Column::new("activity_type", ValueType::String),
            Column::new("date", ValueType::Date),
        ]
        .into()
    }

    fn gen_table() -> Table {
        Table::new(
            gen_schema(),
            vec![
                vec![Value::from(10), Value::from("Clicks"), Value::from("2021-01-02")],
                vec![Value::from(2.5), Value::from("Impressions"), Value::from("2021-01-01")],
                vec![Value::from("x"), Value::from("Clicks"), Value::from("2021-01-03")],
            ],
        )
    }

    #[test]
    fn test_validate_convert() {
        let t = gen_table().validated(ValidationMode::Convert).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows[0][0], Value::Double(10f64));
        assert!(t.rows[2][0].is_null());
        assert_eq!(t.rows[1][2].value_type(), ValueType::Date);
    }

    #[test]
    fn test_validate_skip_and_strict() {
        // Dates are still strings, so casting fails for every row
        let t = gen_table().validated(ValidationMode::Skip).unwrap();
        assert!(t.is_empty());
        assert!(gen_table().validated(ValidationMode::Strict).is_err());
    }

    #[test]
    fn test_distinct_and_range() {
        let t = gen_table().validated(ValidationMode::Convert).unwrap();
        assert_eq!(
            t.distinct_values("activity_type").unwrap(),
            vec![Value::from("Clicks"), Value::from("Impressions")]
        );
        let (min, max) = t.min_max("date").unwrap().unwrap();
        assert_eq!(min.to_string(), "2021-01-01");
        assert_eq!(max.to_string(), "2021-01-03");
        assert!(matches!(
            t.distinct_values("geo"),
            Err(PlotError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_short_rows_read_as_null() {
        let t = Table::new(
            gen_schema(),
            vec![
                vec![Value::from(1)],
                vec![Value::from(2), Value::from("Clicks")],
            ],
        );
        assert_eq!(
            t.column_values("activity_type").unwrap(),
            vec![Value::Null, Value::from("Clicks")]
        );
        assert_eq!(
            t.distinct_values("activity_type").unwrap(),
            vec![Value::from("Clicks")]
        );
        assert_eq!(
            crate::pipeline::validate_selector(&t, "activity_type", "clicks").unwrap(),
            Value::from("Clicks")
        );
        assert_eq!(t.min_max("date").unwrap(), None);
    }
}
