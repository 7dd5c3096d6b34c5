use std::fmt::Debug;

use super::{PlotError, Schema, Table};

mod derive_transformation;
mod summarize_transformation;
mod where_transformation;

pub use derive_transformation::DeriveTransformation;
pub use summarize_transformation::SummarizeTransformation;
pub use where_transformation::WhereTransformation;

/**
 * One step of the table query pipeline.
 * A transformation reads its input table and produces a new one, the input is never modified.
 */
pub trait Transformation: Sync + Send + Debug {
    fn get_output_schema(&self, input_schema: &Schema) -> Schema;

    fn transform(&self, table: &Table) -> Result<Table, PlotError>;

    fn dump(&self) -> String;
}
