use thiserror::Error;

use super::ValueType;

// All errors that can be returned while building a plot.
#[derive(Clone, Debug, Error)]
pub enum PlotError {
    // Unknown error
    #[error("{0}")]
    Unknown(String),

    // Requested categorical value is not one of the column's distinct values
    #[error("{}", invalid_selector_message(.column, .value, .valid, .suggestion))]
    InvalidSelector {
        column: String,
        value: String,
        valid: Vec<String>,
        suggestion: Option<String>,
    },

    // Empty name means a group value was given without a group column
    #[error("{}", invalid_group_column_message(.0))]
    InvalidGroupColumn(String),

    // Column is not found
    #[error("Column '{0}' not found.")]
    ColumnNotFound(String),

    #[error("Invalid date range, start date {0} is after end date {1}.")]
    InvalidDateRange(String, String),

    #[error("Unknown plot type '{0}', expecting 'Scatter Plot' or 'Time Series'.")]
    InvalidPlotType(String),

    #[error("Missing input '{0}'.")]
    MissingInput(String),

    #[error("Table contains no rows.")]
    EmptyTable,

    #[error("Invalid table data: {0}")]
    DataError(String),

    // Row has incorrect number of fields
    #[error("Expecting row with {0} columns, but got {1}")]
    InvalidRowLength(usize, usize),

    // Type cast failed
    #[error("Cannot cast from type {0:?} to type {1:?}.")]
    InvalidTypeCast(ValueType, ValueType),

    // Type conversion failed
    #[error("Cannot convert from type {0:?} to type {1:?}.")]
    InvalidTypeConversion(ValueType, ValueType),

    // Arguments with given types cannot be applied to the operator, e.g. string + date
    #[error("Cannot apply '{0}' operation between {1:?} and {2:?}.")]
    TypeMismatch(String, ValueType, ValueType),

    // Unary operator got invalid argument type
    #[error("Cannot apply '{0}' operation to {1:?}.")]
    InvalidOperandType(String, ValueType),

    // Value is not in the expected type
    #[error("Assume value is {1:?}, but actual type is {0:?}.")]
    InvalidValueType(ValueType, ValueType),

    // Operator or aggregation has incorrect number of arguments
    #[error("{0} cannot take {1} arguments.")]
    ArityError(String, usize),

    // String format error
    #[error("String {0} is not a valid {1:?}.")]
    FormatError(String, ValueType),
}

fn invalid_selector_message(
    column: &str,
    value: &str,
    valid: &[String],
    suggestion: &Option<String>,
) -> String {
    let mut msg = format!(
        "'{}' is not available for '{}'.\nThe available values are:",
        value, column
    );
    for v in valid {
        msg.push_str("\n    ");
        msg.push_str(v);
    }
    if let Some(s) = suggestion {
        msg.push_str(&format!("\nDid you mean '{}'?", s));
    }
    msg
}

fn invalid_group_column_message(column: &str) -> String {
    if column.is_empty() {
        "Please enter a valid group column name, a group value needs a group column.".to_string()
    } else {
        format!(
            "Please enter a valid group column name, '{}' is not a column of the table.",
            column
        )
    }
}
