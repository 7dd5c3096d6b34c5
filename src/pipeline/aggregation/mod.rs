use std::fmt::Debug;
use std::sync::Arc;

use dyn_clonable::clonable;

use super::{expression::Expression, PlotError, Value, ValueType};

mod sum;

pub use sum::Sum;

#[clonable]
pub trait AggregationFunction: Send + Sync + Clone + Debug {
    fn get_output_type(&self, input_type: &[ValueType]) -> Result<ValueType, PlotError>;
    fn feed(&mut self, arguments: &[Value]) -> Result<(), PlotError>;
    fn get_result(&self) -> Result<Value, PlotError>;
    fn dump(&self) -> String;
}

/**
 * An aggregation function bound to the expressions producing its arguments.
 * Each group clones a fresh instance and feeds its rows into it.
 */
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub aggregation: Box<dyn AggregationFunction>,
    pub arguments: Arc<Vec<Box<dyn Expression>>>,
}

impl Aggregation {
    pub fn new(
        aggregation: Box<dyn AggregationFunction>,
        arguments: Vec<Box<dyn Expression>>,
    ) -> Self {
        Self {
            aggregation,
            arguments: Arc::new(arguments),
        }
    }

    pub fn get_output_type(&self, input_type: &[ValueType]) -> Result<ValueType, PlotError> {
        let arguments = self
            .arguments
            .iter()
            .map(|e| e.get_output_type(input_type))
            .collect::<Result<Vec<_>, _>>()?;
        self.aggregation.get_output_type(&arguments)
    }

    pub fn feed(&mut self, row: &[Value]) -> Result<(), PlotError> {
        let arguments = self
            .arguments
            .iter()
            .map(|e| e.eval(row))
            .collect::<Vec<_>>();
        self.aggregation.feed(&arguments)
    }

    pub fn get_result(&self) -> Result<Value, PlotError> {
        self.aggregation.get_result()
    }

    pub fn dump(&self) -> String {
        format!(
            "{}({})",
            self.aggregation.dump(),
            self.arguments
                .iter()
                .map(|e| e.dump())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
