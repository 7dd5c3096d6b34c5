use std::cmp::Ordering;

use crate::pipeline::{PlotError, Value, ValueType};

use super::{first_error, Operator};

fn comparable(a: ValueType, b: ValueType) -> bool {
    (a.is_numeric() && b.is_numeric())
        || a == b
        || matches!(a, ValueType::Dynamic | ValueType::Null)
        || matches!(b, ValueType::Dynamic | ValueType::Null)
}

fn comparison_output_type(op: &str, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
    match argument_types {
        [a, b] if comparable(*a, *b) => Ok(ValueType::Bool),
        [a, b] => Err(PlotError::TypeMismatch(op.to_string(), *a, *b)),
        _ => Err(PlotError::ArityError(op.to_string(), argument_types.len())),
    }
}

macro_rules! order_op {
    ($name:ident, $op:tt) => {
        #[derive(Clone, Debug)]
        pub struct $name;

        impl Operator for $name {
            fn get_output_type(
                &self,
                argument_types: &[ValueType],
            ) -> Result<ValueType, PlotError> {
                comparison_output_type(stringify!($op), argument_types)
            }

            fn eval(&self, arguments: Vec<Value>) -> Value {
                if arguments.len() != 2 {
                    return Value::Error(PlotError::ArityError(
                        stringify!($op).to_string(),
                        arguments.len(),
                    ));
                }
                if let Some(e) = first_error(&arguments) {
                    return e;
                }

                match arguments.as_slice() {
                    // Missing values never satisfy a range
                    [Value::Null, _] | [_, Value::Null] => false.into(),
                    [a, b] => match a.partial_cmp(b) {
                        Some(ord) => (ord $op Ordering::Equal).into(),
                        None => Value::Error(PlotError::TypeMismatch(
                            stringify!($op).to_string(),
                            a.value_type(),
                            b.value_type(),
                        )),
                    },
                    // Shouldn't reach here
                    _ => unreachable!("Unknown error."),
                }
            }

            fn dump(&self, arguments: Vec<String>) -> String {
                format!("({} {} {})", arguments[0], stringify!($op), arguments[1])
            }
        }
    };
}

order_op!(LessEqualOperator, <=);
order_op!(GreaterEqualOperator, >=);

fn values_equal(a: &Value, b: &Value, ignore_case: bool) -> bool {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) if ignore_case => {
            x.to_lowercase() == y.to_lowercase()
        }
        (Value::Long(_), Value::Double(_)) | (Value::Double(_), Value::Long(_)) => {
            a.partial_cmp(b) == Some(Ordering::Equal)
        }
        _ => a == b,
    }
}

/// Exact equality, strings are compared case-sensitively
#[derive(Clone, Debug)]
pub struct EqualOperator;

impl Operator for EqualOperator {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
        comparison_output_type("==", argument_types)
    }

    fn eval(&self, arguments: Vec<Value>) -> Value {
        if arguments.len() != 2 {
            return Value::Error(PlotError::ArityError("==".to_string(), arguments.len()));
        }
        if let Some(e) = first_error(&arguments) {
            return e;
        }
        values_equal(&arguments[0], &arguments[1], false).into()
    }

    fn dump(&self, arguments: Vec<String>) -> String {
        format!("({} == {})", arguments[0], arguments[1])
    }
}

/// Equality where strings are compared case-insensitively
#[derive(Clone, Debug)]
pub struct EqualIgnoreCaseOperator;

impl Operator for EqualIgnoreCaseOperator {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
        comparison_output_type("=~", argument_types)
    }

    fn eval(&self, arguments: Vec<Value>) -> Value {
        if arguments.len() != 2 {
            return Value::Error(PlotError::ArityError("=~".to_string(), arguments.len()));
        }
        if let Some(e) = first_error(&arguments) {
            return e;
        }
        values_equal(&arguments[0], &arguments[1], true).into()
    }

    fn dump(&self, arguments: Vec<String>) -> String {
        format!("({} =~ {})", arguments[0], arguments[1])
    }
}
