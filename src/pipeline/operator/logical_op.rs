use crate::pipeline::{PlotError, Value, ValueType};

use super::{first_error, Operator};

/// Conjunction of two predicates, the only way filter predicates are combined
#[derive(Clone, Debug)]
pub struct AndOperator;

impl Operator for AndOperator {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
        match argument_types {
            [ValueType::Bool | ValueType::Dynamic, ValueType::Bool | ValueType::Dynamic] => {
                Ok(ValueType::Bool)
            }
            [a, b] => Err(PlotError::TypeMismatch("and".to_string(), *a, *b)),
            _ => Err(PlotError::ArityError(
                "and".to_string(),
                argument_types.len(),
            )),
        }
    }

    fn eval(&self, arguments: Vec<Value>) -> Value {
        if arguments.len() != 2 {
            return Value::Error(PlotError::ArityError("and".to_string(), arguments.len()));
        }
        if let Some(e) = first_error(&arguments) {
            return e;
        }

        match arguments.as_slice() {
            [Value::Bool(a), Value::Bool(b)] => (*a && *b).into(),
            [a, b] => Value::Error(PlotError::TypeMismatch(
                "and".to_string(),
                a.value_type(),
                b.value_type(),
            )),
            _ => unreachable!("Unknown error."),
        }
    }

    fn dump(&self, arguments: Vec<String>) -> String {
        format!("({} and {})", arguments[0], arguments[1])
    }
}
