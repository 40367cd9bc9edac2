//! Value types inlined into rendered SQL

use crate::{Error, Raw, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A SQL value that gets escaped into a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value, rendered as `1` or `0`
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// Unsigned 64-bit integer (ids, counters)
    U64(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// JSON value, encoded as a string literal
    Json(serde_json::Value),
    /// Array of values, encoded as a JSON string literal
    Array(Vec<Value>),
    /// Trusted SQL fragment with escaped parameters. Never built from
    /// deserialized input.
    #[serde(skip_deserializing)]
    Raw(Raw),
}

/// Ordered column => value mapping. Insertion order is the SQL tuple order.
pub type Row = IndexMap<String, Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the MySQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INT",
            Value::I64(_) => "BIGINT",
            Value::U64(_) => "BIGINT UNSIGNED",
            Value::F32(_) => "FLOAT",
            Value::F64(_) => "DOUBLE",
            Value::String(_) => "VARCHAR",
            Value::Json(_) => "JSON",
            Value::Array(_) => "ARRAY",
            Value::Raw(_) => "RAW",
        }
    }

    /// Extract array values if this is an Array variant
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Convert to a JSON value for composite encoding.
    ///
    /// Raw fragments and non-finite floats have no JSON form.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        use serde_json::{Number, Value as Json};

        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::I32(i) => Json::Number(Number::from(*i)),
            Value::I64(i) => Json::Number(Number::from(*i)),
            Value::U64(i) => Json::Number(Number::from(*i)),
            Value::F32(f) => Number::from_f64(f64::from(*f))
                .map(Json::Number)
                .ok_or_else(|| Error::unescapable(format!("non-finite float {f}")))?,
            Value::F64(f) => Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| Error::unescapable(format!("non-finite float {f}")))?,
            Value::String(s) => Json::String(s.clone()),
            Value::Json(j) => j.clone(),
            Value::Array(arr) => Json::Array(
                arr.iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Raw(_) => {
                return Err(Error::unescapable("raw expression inside a JSON value"))
            }
        })
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(i64::from(val))
    }
}

impl From<u64> for Value {
    fn from(val: u64) -> Self {
        Value::U64(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl From<Raw> for Value {
    fn from(val: Raw) -> Self {
        Value::Raw(val)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(vals: Vec<T>) -> Self {
        Value::Array(vals.into_iter().map(|v| v.into()).collect())
    }
}

impl<T> From<&[T]> for Value
where
    T: Clone + Into<Value>,
{
    fn from(vals: &[T]) -> Self {
        Value::Array(vals.iter().cloned().map(|v| v.into()).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.format("%Y-%m-%d").to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::Raw(Raw::new(val.to_string()))
    }
}

/// Types that can be turned into an ordered row
pub trait IntoRow {
    fn into_row(self) -> Row;
}

impl IntoRow for Row {
    fn into_row(self) -> Row {
        self
    }
}

impl<K, V> IntoRow for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_row(self) -> Row {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V, const N: usize> IntoRow for [(K, V); N]
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_row(self) -> Row {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// Build a [`Row`] keeping the written column order.
///
/// # Examples
/// ```
/// use bartleby_core::{row, Value};
///
/// let r = row! { "id" => 1, "label" => "hello" };
/// assert_eq!(r.keys().collect::<Vec<_>>(), vec!["id", "label"]);
/// assert_eq!(r["label"], Value::String("hello".into()));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        row
    }};
}
