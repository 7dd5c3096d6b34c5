use crate::pipeline::{expression::Expression, PlotError, Schema, Table, Value, ValueType};

use super::Transformation;

#[derive(Clone, Debug)]
pub struct WhereTransformation {
    pub predicate: Box<dyn Expression>,
}

impl WhereTransformation {
    pub fn create(
        input_schema: &Schema,
        predicate: Box<dyn Expression>,
    ) -> Result<Box<dyn Transformation>, PlotError> {
        // Reject ill-typed predicates before touching any row
        predicate.get_output_type(&input_schema.get_column_types())?;
        Ok(Box::new(Self { predicate }))
    }
}

impl Transformation for WhereTransformation {
    fn get_output_schema(&self, input_schema: &Schema) -> Schema {
        input_schema.clone()
    }

    fn transform(&self, table: &Table) -> Result<Table, PlotError> {
        let mut rows = vec![];
        for row in table.rows.iter() {
            match self.predicate.eval(row) {
                Value::Bool(true) => rows.push(row.clone()),
                Value::Bool(false) | Value::Null => continue,
                Value::Error(e) => return Err(e),
                v => return Err(PlotError::InvalidValueType(v.value_type(), ValueType::Bool)),
            }
        }
        Ok(Table::new(table.schema.clone(), rows))
    }

    fn dump(&self) -> String {
        format!("where {}", self.predicate.dump())
    }
}
