use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
};

use chrono::NaiveDate;
use serde_json::Number;

use super::PlotError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/**
 * The type of a value
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Long,
    Double,
    String,
    Date,
    /**
     * Dynamic means the value is polymorphic, and can be any of the above types.
     */
    Dynamic,
    /**
     * Error means this value is an error.
     */
    Error,
}

impl ValueType {
    /**
     * True if the value type is numeric, including long and double.
     */
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Long | ValueType::Double)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Null => write!(f, "null"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Long => write!(f, "long"),
            ValueType::Double => write!(f, "double"),
            ValueType::String => write!(f, "string"),
            ValueType::Date => write!(f, "date"),
            ValueType::Dynamic => write!(f, "dynamic"),
            ValueType::Error => write!(f, "error"),
        }
    }
}

/**
 * A single cell of the observation table.
 */
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    Error(PlotError),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(l0), Self::Bool(r0)) => l0 == r0,
            (Self::Long(l0), Self::Long(r0)) => l0 == r0,
            (Self::Double(l0), Self::Double(r0)) => l0 == r0,
            (Self::String(l0), Self::String(r0)) => l0 == r0,
            (Self::Date(l0), Self::Date(r0)) => l0 == r0,
            (Self::Error(_), Self::Error(_)) => false,
            _ => false,
        }
    }
}

// Group keys never contain NaN, the loader turns them into nulls.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null | Value::Error(_) => {}
            Value::Bool(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            // `0.0` and `-0.0` are equal, so they must hash the same
            Value::Double(v) => {
                if *v == 0f64 {
                    0f64.to_bits().hash(state)
                } else {
                    v.to_bits().hash(state)
                }
            }
            Value::String(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(v),
            Value::Long(v) => serde_json::Value::Number(v.into()),
            Value::Double(v) => Number::from_f64(v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(v) => serde_json::Value::String(v.into()),
            Value::Date(v) => serde_json::Value::String(v.format(DATE_FORMAT).to_string()),
            Value::Error(_) => serde_json::Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => v.into(),
            serde_json::Value::Number(v) => match v.as_i64() {
                Some(i) => i.into(),
                None => v.as_f64().map(Value::from).unwrap_or_default(),
            },
            serde_json::Value::String(v) => v.into(),
            // Nested values never appear in a flat observation table
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Value::Error(PlotError::DataError(format!("unexpected nested value {}", v)))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Long(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Long(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(value: Cow<'static, str>) -> Self {
        Value::String(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::String(value.into())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<PlotError> for Value {
    fn from(value: PlotError) -> Self {
        Value::Error(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T> From<Result<T, PlotError>> for Value
where
    T: Into<Value>,
{
    fn from(value: Result<T, PlotError>) -> Self {
        match value {
            Ok(v) => v.into(),
            Err(e) => e.into(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

impl Value {
    /**
     * Get the type of the value
     */
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Date(_) => ValueType::Date,
            Value::Error(_) => ValueType::Error,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /**
     * Get the bool value, if the value is not a bool, return PlotError::InvalidValueType
     */
    pub fn get_bool(&self) -> Result<bool, PlotError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Error(e) => Err(e.clone()),
            _ => Err(PlotError::InvalidValueType(
                self.value_type(),
                ValueType::Bool,
            )),
        }
    }

    /**
     * Get the long value, doubles are truncated
     */
    pub fn get_long(&self) -> Result<i64, PlotError> {
        match self {
            Value::Long(v) => Ok(*v),
            Value::Double(v) => Ok(*v as i64),
            Value::Error(e) => Err(e.clone()),
            _ => Err(PlotError::InvalidValueType(
                self.value_type(),
                ValueType::Long,
            )),
        }
    }

    /**
     * Get the double value, longs are automatically converted
     */
    pub fn get_double(&self) -> Result<f64, PlotError> {
        match self {
            Value::Long(v) => Ok(*v as f64),
            Value::Double(v) => Ok(*v),
            Value::Error(e) => Err(e.clone()),
            _ => Err(PlotError::InvalidValueType(
                self.value_type(),
                ValueType::Double,
            )),
        }
    }

    /**
     * Get the string value, if the value is not a string, return PlotError::InvalidValueType
     */
    pub fn get_string(&self) -> Result<Cow<'_, str>, PlotError> {
        match self {
            Value::String(v) => Ok(v.clone()),
            Value::Error(e) => Err(e.clone()),
            _ => Err(PlotError::InvalidValueType(
                self.value_type(),
                ValueType::String,
            )),
        }
    }

    pub fn get_date(&self) -> Result<NaiveDate, PlotError> {
        match self {
            Value::Date(v) => Ok(*v),
            Value::Error(e) => Err(e.clone()),
            _ => Err(PlotError::InvalidValueType(
                self.value_type(),
                ValueType::Date,
            )),
        }
    }

    /**
     * Type cast, number types can be auto casted to each others, others are not
     */
    pub fn try_into(self, value_type: ValueType) -> Result<Value, PlotError> {
        // Dynamic means the value could be any type
        if value_type == ValueType::Dynamic || self.is_null() {
            return Ok(self);
        }

        Ok(match self {
            Value::Long(v) => match value_type {
                ValueType::Long => v.into(),
                ValueType::Double => (v as f64).into(),
                _ => Err(PlotError::InvalidTypeCast(ValueType::Long, value_type))?,
            },
            Value::Double(v) => match value_type {
                ValueType::Long => (v as i64).into(),
                ValueType::Double => v.into(),
                _ => Err(PlotError::InvalidTypeCast(ValueType::Double, value_type))?,
            },
            Value::Error(e) => Err(e)?,
            v => {
                if v.value_type() == value_type {
                    v
                } else {
                    Err(PlotError::InvalidTypeCast(v.value_type(), value_type))?
                }
            }
        })
    }

    /**
     * Type conversion, strings are parsed into numbers and dates
     */
    pub fn try_convert(self, value_type: ValueType) -> Result<Value, PlotError> {
        if value_type == ValueType::Dynamic || self.value_type() == value_type || self.is_null() {
            return Ok(self);
        }

        Ok(match self {
            Value::Bool(v) => match value_type {
                ValueType::Long => (v as i64).into(),
                ValueType::Double => (if v { 1f64 } else { 0f64 }).into(),
                ValueType::String => (if v { "true" } else { "false" }).into(),
                _ => Err(PlotError::InvalidTypeConversion(
                    ValueType::Bool,
                    value_type,
                ))?,
            },
            Value::Long(v) => match value_type {
                ValueType::Bool => (v != 0).into(),
                ValueType::Double => (v as f64).into(),
                ValueType::String => v.to_string().into(),
                _ => Err(PlotError::InvalidTypeConversion(
                    ValueType::Long,
                    value_type,
                ))?,
            },
            Value::Double(v) => match value_type {
                ValueType::Bool => (v != 0f64).into(),
                ValueType::Long => (v as i64).into(),
                ValueType::String => v.to_string().into(),
                _ => Err(PlotError::InvalidTypeConversion(
                    ValueType::Double,
                    value_type,
                ))?,
            },
            Value::String(v) => match value_type {
                ValueType::Bool => (v == "true").into(),
                ValueType::Long => v
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| PlotError::FormatError(v.to_string(), value_type))?
                    .into(),
                ValueType::Double => v
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| PlotError::FormatError(v.to_string(), value_type))?
                    .into(),
                ValueType::Date => parse_date(&v)?.into(),
                _ => Err(PlotError::InvalidTypeConversion(
                    ValueType::String,
                    value_type,
                ))?,
            },
            Value::Date(v) => match value_type {
                ValueType::String => v.format(DATE_FORMAT).to_string().into(),
                _ => Err(PlotError::InvalidTypeConversion(
                    ValueType::Date,
                    value_type,
                ))?,
            },
            Value::Error(e) => Err(e)?,
            Value::Null => Value::Null,
        })
    }

    /**
     * Total order used to sort group keys, values that cannot be compared are treated as equal.
     */
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            // Nulls go last
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            _ => self.partial_cmp(other).unwrap_or(Ordering::Equal),
        }
    }

    pub fn dump(&self) -> String {
        match self {
            Value::String(v) => format!("\"{}\"", v),
            Value::Error(e) => format!("{:?}", e),
            _ => self.to_string(),
        }
    }
}

/**
 * Parse a date, the time part of a datetime string is ignored
 */
pub fn parse_date(s: &str) -> Result<NaiveDate, PlotError> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|_| PlotError::FormatError(s.to_string(), ValueType::Date))
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(x), Value::Bool(y)) => x.partial_cmp(y),

            (Value::Long(x), Value::Long(y)) => x.partial_cmp(y),
            (Value::Long(x), Value::Double(y)) => (*x as f64).partial_cmp(y),
            (Value::Double(x), Value::Long(y)) => x.partial_cmp(&(*y as f64)),
            (Value::Double(x), Value::Double(y)) => x.partial_cmp(y),

            (Value::String(x), Value::String(y)) => x.partial_cmp(y),
            (Value::Date(x), Value::Date(y)) => x.partial_cmp(y),

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conv() {
        let v = Value::from("2021-01-03");
        assert_eq!(
            v.clone().try_convert(ValueType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2021, 1, 3).unwrap())
        );
        assert!(v.try_convert(ValueType::Double).is_err());

        let v = Value::from("12.5");
        assert_eq!(v.try_convert(ValueType::Double).unwrap(), 12.5f64.into());

        let v = Value::Long(3);
        assert_eq!(v.clone().try_convert(ValueType::Double).unwrap(), 3f64.into());
        assert_eq!(v.clone().try_convert(ValueType::String).unwrap(), "3".into());
        assert!(v.try_convert(ValueType::Date).is_err());

        assert!(Value::Null.try_convert(ValueType::Date).unwrap().is_null());
    }

    #[test]
    fn datetime_string_keeps_date() {
        assert_eq!(
            parse_date("2021-03-04T00:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()
        );
        assert!(parse_date("03/04/2021").is_err());
    }

    #[test]
    fn numeric_ordering_promotes() {
        assert_eq!(Value::Long(2).partial_cmp(&Value::Double(2.5)), Some(Ordering::Less));
        assert_eq!(Value::from("a").partial_cmp(&Value::Long(1)), None);
        assert_eq!(Value::Null.sort_cmp(&Value::Long(1)), Ordering::Greater);
    }

    #[test]
    fn json_round_trip_of_special_values() {
        let v: serde_json::Value = Value::Double(f64::INFINITY).into();
        assert!(v.is_null());
        let v: serde_json::Value = Value::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()).into();
        assert_eq!(v, serde_json::json!("2021-01-01"));
        assert_eq!(Value::from(serde_json::json!(7)), Value::Long(7));
        assert!(Value::from(serde_json::json!([1, 2])).is_error());
    }
}
