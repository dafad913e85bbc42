//! Backend-agnostic values.
//!
//! [`Value`] is used for literal operands in the expression tree, for field
//! values written through `values()`, and for the raw cells a driver hands
//! back. Conversions exist from the common Rust, `chrono`, `uuid`, and
//! `serde_json` types.

use std::fmt;

/// A literal, a parameter, or a raw cell.
///
/// Field kinds convert between the property form of a value and the raw form
/// a column stores, so the same property can appear as different variants on
/// either side of a driver.
///
/// ```
/// use quarry_db::value::Value;
///
/// assert_eq!(Value::from(Some(7_i32)), Value::Int(7));
/// assert_eq!(Value::from(None::<&str>), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean.
    Bool(bool),
    /// Any integer, widened to 64 bits.
    Int(i64),
    /// Any float, widened to 64 bits.
    Float(f64),
    /// Text.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// A calendar date.
    Date(chrono::NaiveDate),
    /// A timestamp without zone.
    DateTime(chrono::NaiveDateTime),
    /// A UTC timestamp.
    DateTimeTz(chrono::DateTime<chrono::Utc>),
    /// A time of day.
    Time(chrono::NaiveTime),
    /// A UUID.
    Uuid(uuid::Uuid),
    /// A JSON document.
    Json(serde_json::Value),
    /// A list, as the right-hand side of IN.
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => fmt::Display::fmt(b, f),
            Self::Int(i) => fmt::Display::fmt(i, f),
            Self::Float(x) => fmt::Display::fmt(x, f),
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Date(d) => fmt::Display::fmt(d, f),
            Self::DateTime(dt) => fmt::Display::fmt(dt, f),
            Self::DateTimeTz(dt) => fmt::Display::fmt(dt, f),
            Self::Time(t) => fmt::Display::fmt(t, f),
            Self::Uuid(u) => fmt::Display::fmt(u, f),
            Self::Json(j) => fmt::Display::fmt(j, f),
            Self::List(items) => {
                f.write_str("[")?;
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    fmt::Display::fmt(item, f)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from!(
    bool => |v| Self::Bool(v),
    i16 => |v| Self::Int(i64::from(v)),
    i32 => |v| Self::Int(i64::from(v)),
    i64 => |v| Self::Int(v),
    f32 => |v| Self::Float(f64::from(v)),
    f64 => |v| Self::Float(v),
    String => |v| Self::String(v),
    &str => |v| Self::String(v.to_string()),
    Vec<u8> => |v| Self::Bytes(v),
    chrono::NaiveDate => |v| Self::Date(v),
    chrono::NaiveDateTime => |v| Self::DateTime(v),
    chrono::DateTime<chrono::Utc> => |v| Self::DateTimeTz(v),
    chrono::NaiveTime => |v| Self::Time(v),
    uuid::Uuid => |v| Self::Uuid(v),
    serde_json::Value => |v| Self::Json(v),
    Vec<Value> => |v| Self::List(v),
);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Value {
    /// Returns `true` for `Null`. Equality against a null operand compiles
    /// to `IS` / `IS NOT`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts a JSON scalar into the matching primitive variant.
    ///
    /// Numbers become `Int` when they fit, `Float` otherwise. Arrays and
    /// objects stay `Json`. Drivers that speak JSON use this to build rows.
    pub fn from_json_scalar(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            other => Self::Json(other),
        }
    }

    /// Short variant name, for error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::DateTimeTz(_) => "datetimetz",
            Self::Time(_) => "time",
            Self::Uuid(_) => "uuid",
            Self::Json(_) => "json",
            Self::List(_) => "list",
        }
    }
}
