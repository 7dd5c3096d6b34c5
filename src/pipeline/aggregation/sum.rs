use crate::pipeline::{
    operator::{Operator, PlusOperator},
    PlotError, Value, ValueType,
};

use super::AggregationFunction;

/// Sum of a numeric column, nulls are skipped and an all-null group sums to zero
#[derive(Clone, Debug)]
pub struct Sum {
    sum: Option<Value>,
    zero: Value,
    op: PlusOperator,
}

impl Sum {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            sum: None,
            zero: match value_type {
                ValueType::Long => Value::Long(0),
                _ => Value::Double(0f64),
            },
            op: PlusOperator,
        }
    }
}

impl Default for Sum {
    fn default() -> Self {
        Self::new(ValueType::Double)
    }
}

impl AggregationFunction for Sum {
    fn get_output_type(&self, input_type: &[ValueType]) -> Result<ValueType, PlotError> {
        if input_type.len() != 1 {
            return Err(PlotError::ArityError("sum".to_string(), input_type.len()));
        }
        if !(input_type[0].is_numeric() || input_type[0] == ValueType::Dynamic) {
            return Err(PlotError::InvalidOperandType(
                "sum".to_string(),
                input_type[0],
            ));
        }
        Ok(input_type[0])
    }

    fn feed(&mut self, arguments: &[Value]) -> Result<(), PlotError> {
        if arguments.len() != 1 {
            return Err(PlotError::ArityError("sum".to_string(), arguments.len()));
        }
        let next = match &self.sum {
            None => arguments[0].clone(),
            Some(v) => self.op.eval(vec![v.clone(), arguments[0].clone()]),
        };
        if let Value::Error(e) = next {
            return Err(e);
        }
        self.sum = Some(next);
        Ok(())
    }

    fn get_result(&self) -> Result<Value, PlotError> {
        Ok(match &self.sum {
            None | Some(Value::Null) => self.zero.clone(),
            Some(v) => v.clone(),
        })
    }

    fn dump(&self) -> String {
        "sum".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_skips_nulls() {
        let mut s = Sum::new(ValueType::Long);
        assert_eq!(s.get_result().unwrap(), Value::Long(0));
        s.feed(&[Value::Null]).unwrap();
        s.feed(&[10.into()]).unwrap();
        s.feed(&[5.into()]).unwrap();
        assert_eq!(s.get_result().unwrap(), 15.into());
        assert!(s.feed(&["x".into()]).is_err());
    }
}
