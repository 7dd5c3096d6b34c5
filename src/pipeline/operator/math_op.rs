use crate::pipeline::{PlotError, Value, ValueType};

use super::{first_error, Operator};

/// Addition used by aggregations, a null operand is skipped
#[derive(Clone, Debug, Default)]
pub struct PlusOperator;

impl Operator for PlusOperator {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
        match argument_types {
            [ValueType::Long, ValueType::Long] => Ok(ValueType::Long),
            [a, b] if a.is_numeric() && b.is_numeric() => Ok(ValueType::Double),

            [ValueType::Null, t] | [t, ValueType::Null] => Ok(*t),
            [ValueType::Dynamic, _] | [_, ValueType::Dynamic] => Ok(ValueType::Dynamic),

            // All other combinations are invalid
            [a, b] => Err(PlotError::TypeMismatch("+".to_string(), *a, *b)),
            _ => Err(PlotError::ArityError("+".to_string(), argument_types.len())),
        }
    }

    fn eval(&self, arguments: Vec<Value>) -> Value {
        if arguments.len() != 2 {
            return Value::Error(PlotError::ArityError("+".to_string(), arguments.len()));
        }
        if let Some(e) = first_error(&arguments) {
            return e;
        }

        match arguments.as_slice() {
            [Value::Null, v] | [v, Value::Null] => v.clone(),

            // Long overflow falls back to double
            [Value::Long(a), Value::Long(b)] => a
                .checked_add(*b)
                .map(Value::from)
                .unwrap_or_else(|| (*a as f64 + *b as f64).into()),
            [Value::Long(a), Value::Double(b)] => (*a as f64 + b).into(),
            [Value::Double(a), Value::Long(b)] => (a + *b as f64).into(),
            [Value::Double(a), Value::Double(b)] => (a + b).into(),

            // All other combinations are invalid
            [a, b] => Value::Error(PlotError::TypeMismatch(
                "+".to_string(),
                a.value_type(),
                b.value_type(),
            )),

            // Shouldn't reach here
            _ => unreachable!("Unknown error."),
        }
    }

    fn dump(&self, arguments: Vec<String>) -> String {
        format!("({} + {})", arguments[0], arguments[1])
    }
}

/**
 * Division that always yields a finite double.
 * Division by zero, missing or non-numeric operands and non-finite results all become `0`.
 */
#[derive(Clone, Debug, Default)]
pub struct SafeDivideOperator;

impl Operator for SafeDivideOperator {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError> {
        match argument_types {
            [_, _] => Ok(ValueType::Double),
            _ => Err(PlotError::ArityError("/".to_string(), argument_types.len())),
        }
    }

    fn eval(&self, arguments: Vec<Value>) -> Value {
        if arguments.len() != 2 {
            return Value::Error(PlotError::ArityError("/".to_string(), arguments.len()));
        }
        if let Some(e) = first_error(&arguments) {
            return e;
        }

        match arguments.as_slice() {
            [Value::Null, _] | [_, Value::Null] => 0f64.into(),
            [a, b] => match (a.get_double(), b.get_double()) {
                (Ok(a), Ok(b)) => {
                    let r = a / b;
                    if r.is_finite() {
                        r.into()
                    } else {
                        0f64.into()
                    }
                }
                // Non-numeric operands count as missing
                _ => 0f64.into(),
            },
            _ => unreachable!("Unknown error."),
        }
    }

    fn dump(&self, arguments: Vec<String>) -> String {
        format!("({} / {})", arguments[0], arguments[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_divide() {
        let op = SafeDivideOperator;
        assert_eq!(op.eval(vec![100.into(), 10.into()]), 10f64.into());
        assert_eq!(op.eval(vec![7.5.into(), 2.5.into()]), 3f64.into());
        assert_eq!(op.eval(vec![100.into(), 0.into()]), 0f64.into());
        assert_eq!(op.eval(vec![0.into(), 0.into()]), 0f64.into());
        assert_eq!(op.eval(vec![Value::Null, 2.into()]), 0f64.into());
        assert_eq!(op.eval(vec![2.into(), Value::Null]), 0f64.into());
        assert_eq!(op.eval(vec![f64::NAN.into(), 2.into()]), 0f64.into());
        assert_eq!(op.eval(vec!["n/a".into(), 2f64.into()]), 0f64.into());
        assert_eq!(op.eval(vec![2.into(), "n/a".into()]), 0f64.into());
        assert!(op.eval(vec![Value::Error(PlotError::EmptyTable), 2.into()]).is_error());
        assert_eq!(
            op.get_output_type(&[ValueType::Long, ValueType::Long]).unwrap(),
            ValueType::Double
        );
        assert_eq!(
            op.get_output_type(&[ValueType::String, ValueType::Double]).unwrap(),
            ValueType::Double
        );
        assert!(op.get_output_type(&[ValueType::Long]).is_err());
    }

    #[test]
    fn test_plus() {
        let op = PlusOperator;
        assert_eq!(op.eval(vec![10.into(), 5.into()]), 15.into());
        assert_eq!(op.eval(vec![10.into(), 0.5.into()]), 10.5.into());
        assert_eq!(op.eval(vec![Value::Null, 5.into()]), 5.into());
        assert_eq!(
            op.eval(vec![i64::MAX.into(), 1.into()]),
            (i64::MAX as f64 + 1f64).into()
        );
        assert!(op.eval(vec!["a".into(), 5.into()]).is_error());
    }
}
