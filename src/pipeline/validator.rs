use tracing::warn;

use super::{PlotError, Table, Value};

/**
 * Check that `requested` is one of the distinct values of `column`, ignoring case.
 *
 * Returns the value as it appears in the table. On failure the error carries the
 * requested value and every valid choice, plus the closest valid choice if any.
 */
pub fn validate_selector(table: &Table, column: &str, requested: &str) -> Result<Value, PlotError> {
    let distinct = table.distinct_values(column)?;
    let wanted = requested.to_lowercase();
    if let Some(v) = distinct
        .iter()
        .find(|v| v.to_string().to_lowercase() == wanted)
    {
        return Ok(v.clone());
    }

    let valid: Vec<String> = distinct.iter().map(|v| v.to_string()).collect();
    let suggestion = valid
        .iter()
        .map(|v| (levenshtein::levenshtein(&v.to_lowercase(), &wanted), v))
        // Only suggest something that looks like a typo
        .filter(|(d, v)| *d <= (v.chars().count() / 2).max(1))
        .min_by_key(|(d, _)| *d)
        .map(|(_, v)| v.clone());
    warn!(
        "'{}' is not a valid value of column '{}', {} valid values",
        requested,
        column,
        valid.len()
    );
    Err(PlotError::InvalidSelector {
        column: column.to_string(),
        value: requested.to_string(),
        valid,
        suggestion,
    })
}

#[cfg(test)]
mod tests {
    use crate::pipeline::{Column, Schema, ValueType};

    use super::*;

    fn table() -> Table {
        Table::new(
            Schema::from(vec![
                Column::new("variable_description", ValueType::String),
                Column::new("Spend", ValueType::Long),
            ]),
            vec![
                vec!["TV".into(), 1.into()],
                vec!["Radio".into(), 2.into()],
                vec!["TV".into(), 3.into()],
                vec!["Search".into(), 4.into()],
            ],
        )
    }

    #[test]
    fn test_valid_selector_ignores_case() {
        assert_eq!(
            validate_selector(&table(), "variable_description", "tv").unwrap(),
            Value::from("TV")
        );
        assert_eq!(
            validate_selector(&table(), "variable_description", "RADIO").unwrap(),
            Value::from("Radio")
        );
    }

    #[test]
    fn test_invalid_selector_lists_all_values() {
        match validate_selector(&table(), "variable_description", "Radoi") {
            Err(PlotError::InvalidSelector {
                column,
                value,
                valid,
                suggestion,
            }) => {
                assert_eq!(column, "variable_description");
                assert_eq!(value, "Radoi");
                assert_eq!(valid, vec!["TV", "Radio", "Search"]);
                assert_eq!(suggestion.as_deref(), Some("Radio"));
            }
            r => panic!("unexpected result {:?}", r),
        }

        let e = validate_selector(&table(), "variable_description", "Print").unwrap_err();
        let msg = e.to_string();
        assert!(msg.contains("'Print'"));
        assert!(msg.contains("TV") && msg.contains("Radio") && msg.contains("Search"));
        assert!(!msg.contains("Did you mean"));
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(
            validate_selector(&table(), "channel", "TV"),
            Err(PlotError::ColumnNotFound(_))
        ));
    }
}
