mod aggregation;
mod errors;
mod expression;
mod operator;
mod pipeline;
mod table;
mod transformation;
mod validator;
mod value;

pub use errors::PlotError;
pub use pipeline::{
    is_select_all, Derivation, Pipeline, Predicate, TableQuery, SELECT_ALL_SENTINELS,
};
pub use table::{Column, Schema, Table, ValidationMode};
pub use validator::validate_selector;
pub use value::{parse_date, Value, ValueType};
