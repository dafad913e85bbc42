//! Field kinds: pluggable storage transforms.
//!
//! A [`FieldKind`] describes how a property's in-memory value differs from
//! its stored form. It can act at two levels:
//!
//! - **value level**: `writer` converts a value before it is sent as a
//!   parameter, `reader` converts a raw cell during hydration;
//! - **query level**: `write_query` wraps the parameter expression (e.g.
//!   `ST_GeomFromText(?)`), `read_query` wraps the column reference wherever
//!   the field is resolved (e.g. `ST_AsText(col)`).
//!
//! Every method defaults to identity. Kinds are normally attached by value;
//! the [`KindRegistry`] exists for schemas that name kinds by string and is
//! always passed explicitly.
//!
//! # Examples
//!
//! ```
//! use quarry_db::fields::{FieldKind, KindRegistry};
//! use quarry_db::value::Value;
//!
//! let registry = KindRegistry::with_defaults();
//! let kind = registry.resolve("bool").unwrap();
//! assert_eq!(kind.writer(Value::Bool(true)).unwrap(), Value::Int(1));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use quarry_core::{QuarryError, QuarryResult};

use crate::query::expressions::Expr;
use crate::value::Value;

/// A storage transform for one field.
pub trait FieldKind: fmt::Debug + Send + Sync {
    /// The name this kind is registered under.
    fn name(&self) -> &str;

    /// Wraps a resolved column reference.
    fn read_query(&self, expr: Expr) -> Expr {
        expr
    }

    /// Wraps a written parameter.
    fn write_query(&self, expr: Expr) -> Expr {
        expr
    }

    /// Converts a raw cell into the property value.
    fn reader(&self, raw: Value) -> QuarryResult<Value> {
        Ok(raw)
    }

    /// Converts a property value into its raw form.
    fn writer(&self, value: Value) -> QuarryResult<Value> {
        Ok(value)
    }
}

/// Stores JSON documents as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonKind;

impl FieldKind for JsonKind {
    fn name(&self) -> &str {
        "json"
    }

    fn reader(&self, raw: Value) -> QuarryResult<Value> {
        match raw {
            Value::String(s) => serde_json::from_str(&s)
                .map(Value::Json)
                .map_err(|e| QuarryError::Hydration(format!("invalid JSON '{s}': {e}"))),
            other => Ok(other),
        }
    }

    fn writer(&self, value: Value) -> QuarryResult<Value> {
        match value {
            Value::Json(j) => Ok(Value::String(j.to_string())),
            other => Ok(other),
        }
    }
}

/// Stores booleans as `0` / `1` integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolKind;

impl FieldKind for BoolKind {
    fn name(&self) -> &str {
        "bool"
    }

    fn reader(&self, raw: Value) -> QuarryResult<Value> {
        match raw {
            Value::Int(i) => Ok(Value::Bool(i != 0)),
            Value::String(ref s) => match s.trim().to_lowercase().as_str() {
                "1" | "true" | "t" => Ok(Value::Bool(true)),
                "0" | "false" | "f" => Ok(Value::Bool(false)),
                _ => Err(QuarryError::Hydration(format!("invalid boolean '{s}'"))),
            },
            other => Ok(other),
        }
    }

    fn writer(&self, value: Value) -> QuarryResult<Value> {
        match value {
            Value::Bool(b) => Ok(Value::Int(i64::from(b))),
            other => Ok(other),
        }
    }
}

/// Stores UTC timestamps as RFC 3339 text; also reads Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampKind;

impl FieldKind for TimestampKind {
    fn name(&self) -> &str {
        "timestamp"
    }

    fn reader(&self, raw: Value) -> QuarryResult<Value> {
        match raw {
            Value::String(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Value::DateTimeTz(dt.with_timezone(&Utc)))
                .map_err(|e| QuarryError::Hydration(format!("invalid timestamp '{s}': {e}"))),
            Value::Int(secs) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .map(Value::DateTimeTz)
                .ok_or_else(|| QuarryError::Hydration(format!("invalid timestamp '{secs}'"))),
            other => Ok(other),
        }
    }

    fn writer(&self, value: Value) -> QuarryResult<Value> {
        match value {
            Value::DateTimeTz(dt) => Ok(Value::String(dt.to_rfc3339())),
            other => Ok(other),
        }
    }
}

/// Stores geometries in a spatial column, exchanged as WKT text.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryKind;

impl FieldKind for GeometryKind {
    fn name(&self) -> &str {
        "geometry"
    }

    fn read_query(&self, expr: Expr) -> Expr {
        Expr::func("ST_AsText", vec![expr])
    }

    fn write_query(&self, expr: Expr) -> Expr {
        Expr::func("ST_GeomFromText", vec![expr])
    }
}

/// A named registry of field kinds.
///
/// Never consulted implicitly: field descriptors resolve through it only via
/// [`FieldDescriptor::kind_named`](crate::fields::FieldDescriptor::kind_named).
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, Arc<dyn FieldKind>>,
}

impl KindRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonKind);
        registry.register(BoolKind);
        registry.register(TimestampKind);
        registry.register(GeometryKind);
        registry
    }

    /// Registers a kind under its own name, replacing any previous one.
    pub fn register(&mut self, kind: impl FieldKind + 'static) {
        self.kinds.insert(kind.name().to_string(), Arc::new(kind));
    }

    /// Registers a kind under an explicit name.
    pub fn register_as(&mut self, name: impl Into<String>, kind: Arc<dyn FieldKind>) {
        self.kinds.insert(name.into(), kind);
    }

    /// Resolves a kind by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKind` if nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> QuarryResult<Arc<dyn FieldKind>> {
        self.kinds
            .get(name)
            .cloned()
            .ok_or_else(|| QuarryError::UnknownKind(name.to_string()))
    }

    /// Returns `true` if a kind is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let doc = serde_json::json!({"tags": ["a", "b"]});
        let raw = JsonKind.writer(Value::Json(doc.clone())).unwrap();
        assert!(matches!(raw, Value::String(_)));
        assert_eq!(JsonKind.reader(raw).unwrap(), Value::Json(doc));
    }

    #[test]
    fn test_json_reader_rejects_garbage() {
        let err = JsonKind.reader(Value::String("{oops".into())).unwrap_err();
        assert!(err.to_string().contains("{oops"));
    }

    #[test]
    fn test_bool_round_trip() {
        assert_eq!(BoolKind.writer(Value::Bool(false)).unwrap(), Value::Int(0));
        assert_eq!(BoolKind.reader(Value::Int(1)).unwrap(), Value::Bool(true));
        assert_eq!(BoolKind.reader(Value::String("false".into())).unwrap(), Value::Bool(false));
        assert!(BoolKind.reader(Value::String("maybe".into())).is_err());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let raw = TimestampKind.writer(Value::DateTimeTz(now)).unwrap();
        assert_eq!(TimestampKind.reader(raw).unwrap(), Value::DateTimeTz(now));
        assert_eq!(
            TimestampKind.reader(Value::Int(now.timestamp())).unwrap(),
            Value::DateTimeTz(now)
        );
    }

    #[test]
    fn test_geometry_wraps_queries() {
        let col = Expr::column(Some("place"), "location");
        assert_eq!(
            GeometryKind.read_query(col.clone()),
            Expr::func("ST_AsText", vec![col])
        );
        let param = Expr::Param(Value::from("POINT(1 2)"));
        assert_eq!(
            GeometryKind.write_query(param.clone()),
            Expr::func("ST_GeomFromText", vec![param])
        );
    }

    #[test]
    fn test_registry_defaults() {
        let registry = KindRegistry::with_defaults();
        for name in ["json", "bool", "timestamp", "geometry"] {
            assert!(registry.contains(name), "missing {name}");
            assert_eq!(registry.resolve(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_registry_unknown() {
        let registry = KindRegistry::new();
        assert!(matches!(
            registry.resolve("money"),
            Err(QuarryError::UnknownKind(name)) if name == "money"
        ));
    }

    #[test]
    fn test_register_as_alias() {
        let mut registry = KindRegistry::new();
        registry.register_as("boolean", Arc::new(BoolKind));
        assert_eq!(registry.resolve("boolean").unwrap().name(), "bool");
    }
}
