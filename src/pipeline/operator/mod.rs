use std::fmt::Debug;

use dyn_clonable::clonable;

use super::{PlotError, Value, ValueType};

mod comparison_op;
mod logical_op;
mod math_op;
mod unary_op;

pub use comparison_op::{
    EqualIgnoreCaseOperator, EqualOperator, GreaterEqualOperator, LessEqualOperator,
};
pub use logical_op::AndOperator;
pub use math_op::{PlusOperator, SafeDivideOperator};
pub use unary_op::ExpOperator;

#[clonable]
pub trait Operator: Clone + Debug + Send + Sync {
    fn get_output_type(&self, argument_types: &[ValueType]) -> Result<ValueType, PlotError>;

    /// Errors are carried in the returned value as `Value::Error`
    fn eval(&self, arguments: Vec<Value>) -> Value;

    fn dump(&self, arguments: Vec<String>) -> String;
}

/// Returns the first error among the arguments, if any
fn first_error(arguments: &[Value]) -> Option<Value> {
    arguments.iter().find(|v| v.is_error()).cloned()
}
