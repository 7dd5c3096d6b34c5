use std::fmt::Debug;

use dyn_clonable::clonable;

use super::{operator::Operator, PlotError, Value, ValueType};

#[clonable]
pub trait Expression: Clone + Debug + Send + Sync {
    fn get_output_type(&self, schema: &[ValueType]) -> Result<ValueType, PlotError>;

    fn eval(&self, row: &[Value]) -> Value;

    fn dump(&self) -> String;
}

#[derive(Clone, Debug)]
pub struct ColumnExpression {
    pub column_name: String,
    pub column_index: usize,
}

impl Expression for ColumnExpression {
    fn get_output_type(&self, schema: &[ValueType]) -> Result<ValueType, PlotError> {
        schema
            .get(self.column_index)
            .copied()
            .ok_or_else(|| PlotError::ColumnNotFound(self.column_name.clone()))
    }

    fn eval(&self, row: &[Value]) -> Value {
        match row.get(self.column_index) {
            Some(v) => v.clone(),
            None => Value::Error(PlotError::ColumnNotFound(self.column_name.clone())),
        }
    }

    fn dump(&self) -> String {
        self.column_name.to_owned()
    }
}

#[derive(Clone, Debug)]
pub struct LiteralExpression {
    pub value: Value,
}

impl Expression for LiteralExpression {
    fn get_output_type(&self, _schema: &[ValueType]) -> Result<ValueType, PlotError> {
        Ok(self.value.value_type())
    }

    fn eval(&self, _row: &[Value]) -> Value {
        self.value.clone()
    }

    fn dump(&self) -> String {
        self.value.dump()
    }
}

#[derive(Clone, Debug)]
pub struct OperatorExpression {
    pub operator: Box<dyn Operator>,
    pub arguments: Vec<Box<dyn Expression>>,
}

impl Expression for OperatorExpression {
    fn get_output_type(&self, schema: &[ValueType]) -> Result<ValueType, PlotError> {
        self.operator.get_output_type(
            &self
                .arguments
                .iter()
                .map(|arg| arg.get_output_type(schema))
                .collect::<Result<Vec<ValueType>, PlotError>>()?,
        )
    }

    fn eval(&self, row: &[Value]) -> Value {
        let arguments = self.arguments.iter().map(|e| e.eval(row)).collect();
        self.operator.eval(arguments)
    }

    fn dump(&self) -> String {
        self.operator
            .dump(self.arguments.iter().map(|e| e.dump()).collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::{
        expression::Expression,
        operator::{AndOperator, LessEqualOperator},
        Value,
    };

    use super::{ColumnExpression, LiteralExpression, OperatorExpression};

    #[test]
    fn test_operator() {
        let l = ColumnExpression {
            column_name: "a".to_owned(),
            column_index: 0,
        };
        let r = LiteralExpression { value: 42.into() };
        let e = OperatorExpression {
            operator: Box::new(LessEqualOperator),
            arguments: vec![Box::new(l) as Box<dyn Expression>, Box::new(r)],
        };
        assert_eq!(e.eval(&[Value::from(100)]), false.into());
        assert_eq!(e.eval(&[Value::from(42)]), true.into());
        assert_eq!(e.dump(), "(a <= 42)");

        let both = OperatorExpression {
            operator: Box::new(AndOperator),
            arguments: vec![Box::new(e.clone()) as Box<dyn Expression>, Box::new(e)],
        };
        assert_eq!(both.eval(&[Value::from(21)]), true.into());
    }

    #[test]
    fn test_missing_column_is_error() {
        let e = ColumnExpression {
            column_name: "b".to_owned(),
            column_index: 3,
        };
        assert!(e.eval(&[Value::Null]).is_error());
        assert!(e.get_output_type(&[]).is_err());
    }
}
