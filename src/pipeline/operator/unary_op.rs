use crate::pipeline::{PlotError, Value, ValueType};

use super::Operator;

/// Natural exponent, reverts a log-transformed measure
#[derive(Clone, Debug)]
pub struct ExpOperator;

impl Operator for ExpOperator {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
        match argument_types {
            [t] if t.is_numeric() => Ok(ValueType::Double),
            [ValueType::Null | ValueType::Dynamic] => Ok(ValueType::Double),
            [t] => Err(PlotError::InvalidOperandType("exp".to_string(), *t)),
            _ => Err(PlotError::ArityError(
                "exp".to_string(),
                argument_types.len(),
            )),
        }
    }

    fn eval(&self, arguments: Vec<Value>) -> Value {
        match arguments.as_slice() {
            [Value::Null] => Value::Null,
            [v @ Value::Error(_)] => v.clone(),
            [v] => match v.get_double() {
                Ok(d) => d.exp().into(),
                Err(_) => Value::Error(PlotError::InvalidOperandType(
                    "exp".to_string(),
                    v.value_type(),
                )),
            },
            _ => Value::Error(PlotError::ArityError("exp".to_string(), arguments.len())),
        }
    }

    fn dump(&self, arguments: Vec<String>) -> String {
        format!("exp({})", arguments[0])
    }
}
