use crate::pipeline::{expression::Expression, Column, PlotError, Schema, Table, Value};

use super::Transformation;

/**
 * Computes a column from the other columns of the same row.
 * An existing column with the same name is replaced in place, otherwise the column is appended.
 */
#[derive(Clone, Debug)]
pub struct DeriveTransformation {
    output_schema: Schema,
    column_name: String,
    expression: Box<dyn Expression>,
    replaced_index: Option<usize>,
}

impl DeriveTransformation {
    pub fn create(
        input_schema: &Schema,
        column_name: &str,
        expression: Box<dyn Expression>,
    ) -> Result<Box<dyn Transformation>, PlotError> {
        let column_type = expression.get_output_type(&input_schema.get_column_types())?;
        let replaced_index = input_schema.get_column_index(column_name);
        let mut output_schema = input_schema.clone();
        match replaced_index {
            Some(idx) => output_schema.columns[idx].column_type = column_type,
            None => output_schema
                .columns
                .push(Column::new(column_name, column_type)),
        }
        Ok(Box::new(Self {
            output_schema,
            column_name: column_name.to_string(),
            expression,
            replaced_index,
        }))
    }
}

impl Transformation for DeriveTransformation {
    fn get_output_schema(&self, _input_schema: &Schema) -> Schema {
        self.output_schema.clone()
    }

    fn transform(&self, table: &Table) -> Result<Table, PlotError> {
        let rows = table
            .rows
            .iter()
            .map(|row| {
                let value = self.expression.eval(row);
                if let Value::Error(e) = value {
                    return Err(e);
                }
                let mut row = row.clone();
                row.resize(table.schema.columns.len(), Value::Null);
                match self.replaced_index {
                    Some(idx) => row[idx] = value,
                    None => row.push(value),
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>, PlotError>>()?;
        Ok(Table::new(self.output_schema.clone(), rows))
    }

    fn dump(&self) -> String {
        format!("derive {}={}", self.column_name, self.expression.dump())
    }
}
