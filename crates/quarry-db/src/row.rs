//! Rows returned by a driver and the typed access trait.
//!
//! A [`Row`] is an ordered `column name → Value` mapping. The hydrator
//! produces the same shape keyed by property names, aliased as [`Record`].

use indexmap::IndexMap;
use quarry_core::{QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An ordered mapping from column names to raw values.
///
/// # Examples
///
/// ```
/// use quarry_db::row::Row;
/// use quarry_db::value::Value;
///
/// let row = Row::from_pairs([("id", Value::Int(1)), ("name", Value::from("Ada"))]);
/// let name: String = row.get("name").unwrap();
/// assert_eq!(name, "Ada");
/// assert_eq!(row.columns().collect::<Vec<_>>(), ["id", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<String, Value>,
}

/// A hydrated row keyed by property names.
pub type Record = Row;

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from `(column, value)` pairs, keeping their order.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Builds a row from a JSON object, converting scalars with
    /// [`Value::from_json_scalar`].
    ///
    /// # Errors
    ///
    /// Returns a `Hydration` error if `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> QuarryResult<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(Self {
                cells: map
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json_scalar(v)))
                    .collect(),
            }),
            other => Err(QuarryError::Hydration(format!(
                "expected a JSON object row, got {other}"
            ))),
        }
    }

    /// Sets a cell, keeping the original position if the column exists.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.cells.insert(column.into(), value);
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns a `Hydration` error if the column does not exist or the
    /// value cannot be converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> QuarryResult<T> {
        let value = self
            .cells
            .get(column)
            .ok_or_else(|| QuarryError::Hydration(format!("column '{column}' not found in row")))?;
        T::from_value(value)
    }

    /// Returns the raw value of a column.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Returns the first cell.
    pub fn first(&self) -> Option<(&str, &Value)> {
        self.cells.first().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates the column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Iterates the cells in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if the column is present.
    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> QuarryResult<Self>;
}

fn mismatch(expected: &str, value: &Value) -> QuarryError {
    QuarryError::Hydration(format!("expected {expected}, got {} {value}", value.kind_name()))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Int(i) => Self::try_from(*i)
                .map_err(|e| QuarryError::Hydration(format!("int {i} out of i32 range: {e}"))),
            _ => Err(mismatch("int", value)),
        }
    }
}

impl FromValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as Self),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch("string", value)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::String(s) => Self::parse_str(s)
                .map_err(|e| QuarryError::Hydration(format!("invalid uuid '{s}': {e}"))),
            _ => Err(mismatch("uuid", value)),
        }
    }
}

impl FromValue for chrono::DateTime<chrono::Utc> {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::DateTimeTz(dt) => Ok(*dt),
            _ => Err(mismatch("datetimetz", value)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            _ => Err(mismatch("json", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> QuarryResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}
