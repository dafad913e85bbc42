//! Result hydration.
//!
//! Drivers hand back untyped [`Row`]s keyed by raw column names. A
//! [`Hydrator`] maps them onto model property names, drops sensitive fields
//! unless asked not to, applies each field kind's `reader`, and builds models
//! through [`Model::from_record`]. Columns that match no field (aggregates,
//! aliases) pass through under their raw name. Input rows are never mutated.
//!
//! Models that were never registered hydrate against an empty descriptor,
//! so every column passes through unchanged.

use std::sync::Arc;

use quarry_core::{QuarryError, QuarryResult};

use crate::model::{Model, TableDescriptor};
use crate::registry::{registry, Registry};
use crate::row::{Record, Row};
use crate::value::Value;

/// Returns the rows unchanged.
pub fn rows(rows: Vec<Row>) -> Vec<Row> {
    rows
}

/// Reads a count: the first column of the first row as an integer.
///
/// Empty input (or a first row with no cells) reads as `0`. Floats are
/// truncated; strings are read by their leading integer, so `"12"`,
/// `" 12 "` and `"12.9"` all read as `12`.
///
/// # Errors
///
/// Returns `Hydration` naming the raw value when it has no integer reading.
///
/// ```
/// use quarry_db::reader::scalar;
/// use quarry_db::row::Row;
/// use quarry_db::value::Value;
///
/// assert_eq!(scalar(&[]).unwrap(), 0);
/// let rows = vec![Row::from_pairs([("count", Value::from("42"))])];
/// assert_eq!(scalar(&rows).unwrap(), 42);
/// ```
pub fn scalar(rows: &[Row]) -> QuarryResult<i64> {
    let Some((_, value)) = rows.first().and_then(Row::first) else {
        return Ok(0);
    };
    let count = match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => truncate(*f),
        Value::String(s) => leading_integer(s),
        _ => None,
    };
    tracing::trace!(?count, "read scalar");
    count.ok_or_else(|| {
        QuarryError::Hydration(format!(
            "cannot read a count from {} value '{value}'",
            value.kind_name()
        ))
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(value: f64) -> Option<i64> {
    // i64::MAX is not representable; the upper bound is exclusive.
    let in_range = value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64;
    in_range.then(|| value.trunc() as i64)
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits_start = usize::from(text.starts_with(['+', '-']));
    let digits = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    text[..digits_start + digits].parse().ok()
}

/// Hydrates rows against one table's metadata.
#[derive(Debug, Clone)]
pub struct Hydrator {
    table: Arc<TableDescriptor>,
    include_sensitive: bool,
}

impl Hydrator {
    /// Creates a hydrator over explicit metadata, hiding sensitive fields.
    pub const fn new(table: Arc<TableDescriptor>) -> Self {
        Self {
            table,
            include_sensitive: false,
        }
    }

    /// Creates a hydrator for a model in the global registry.
    pub fn for_model<M: Model>() -> Self {
        Self::for_model_in::<M>(registry())
    }

    /// Creates a hydrator for a model in `registry`.
    pub fn for_model_in<M: Model>(registry: &Registry) -> Self {
        Self::new(registry.probe::<M>())
    }

    /// Controls whether sensitive fields are hydrated.
    #[must_use]
    pub const fn include_sensitive(mut self, include: bool) -> Self {
        self.include_sensitive = include;
        self
    }

    /// Maps one row onto property names.
    ///
    /// # Errors
    ///
    /// Propagates `Hydration` errors from field readers.
    pub fn record(&self, row: &Row) -> QuarryResult<Record> {
        let mut record = Record::new();
        for (column, raw) in row.iter() {
            match self.table.field_by_column(column) {
                Some((_, field)) if field.is_sensitive && !self.include_sensitive => {}
                Some((property, field)) => {
                    record.insert(property, field.read_value(raw.clone())?);
                }
                None => record.insert(column, raw.clone()),
            }
        }
        Ok(record)
    }

    /// Maps every row onto property names.
    ///
    /// # Errors
    ///
    /// Propagates `Hydration` errors from field readers.
    pub fn records(&self, rows: &[Row]) -> QuarryResult<Vec<Record>> {
        tracing::trace!(
            table = self.table.table_name(),
            rows = rows.len(),
            "hydrating records"
        );
        rows.iter().map(|row| self.record(row)).collect()
    }

    /// Builds a model from every row.
    ///
    /// # Errors
    ///
    /// Propagates errors from field readers and `Model::from_record`.
    pub fn models<M: Model>(&self, rows: &[Row]) -> QuarryResult<Vec<M>> {
        self.records(rows)?.iter().map(M::from_record).collect()
    }

    /// Builds a model from the first row, if there is one.
    ///
    /// # Errors
    ///
    /// Propagates errors from field readers and `Model::from_record`.
    pub fn first<M: Model>(&self, rows: &[Row]) -> QuarryResult<Option<M>> {
        rows.first()
            .map(|row| self.record(row).and_then(|r| M::from_record(&r)))
            .transpose()
    }

    /// Builds a model from the first row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when there are no rows.
    pub fn one<M: Model>(&self, rows: &[Row]) -> QuarryResult<M> {
        self.first(rows)?.ok_or_else(|| self.not_found::<M>())
    }

    /// Builds a model from every row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when there are no rows.
    pub fn many_or_not_found<M: Model>(&self, rows: &[Row]) -> QuarryResult<Vec<M>> {
        if rows.is_empty() {
            return Err(self.not_found::<M>());
        }
        self.models(rows)
    }

    fn not_found<M: Model>(&self) -> QuarryError {
        QuarryError::NotFound(format!(
            "no {} rows in '{}'",
            M::model_name(),
            self.table.table_name()
        ))
    }
}

/// Hydrates records for a globally registered model.
///
/// # Errors
///
/// Propagates `Hydration` errors from field readers.
pub fn records<M: Model>(rows: &[Row], include_sensitive: bool) -> QuarryResult<Vec<Record>> {
    Hydrator::for_model::<M>()
        .include_sensitive(include_sensitive)
        .records(rows)
}

/// Hydrates models for a globally registered model.
///
/// # Errors
///
/// Propagates errors from field readers and `Model::from_record`.
pub fn models<M: Model>(rows: &[Row], include_sensitive: bool) -> QuarryResult<Vec<M>> {
    Hydrator::for_model::<M>()
        .include_sensitive(include_sensitive)
        .models(rows)
}

/// Hydrates the first row, if any.
///
/// # Errors
///
/// Propagates errors from field readers and `Model::from_record`.
pub fn first<M: Model>(rows: &[Row], include_sensitive: bool) -> QuarryResult<Option<M>> {
    Hydrator::for_model::<M>()
        .include_sensitive(include_sensitive)
        .first(rows)
}

/// Hydrates the first row, failing with `NotFound` when there is none.
///
/// # Errors
///
/// Returns `NotFound` for empty input.
pub fn one<M: Model>(rows: &[Row], include_sensitive: bool) -> QuarryResult<M> {
    Hydrator::for_model::<M>()
        .include_sensitive(include_sensitive)
        .one(rows)
}

/// Hydrates every row, failing with `NotFound` when there are none.
///
/// # Errors
///
/// Returns `NotFound` for empty input.
pub fn many_or_not_found<M: Model>(rows: &[Row], include_sensitive: bool) -> QuarryResult<Vec<M>> {
    Hydrator::for_model::<M>()
        .include_sensitive(include_sensitive)
        .many_or_not_found(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDescriptor, JsonKind};
    use crate::model::TableBuilder;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct User {
        id: i64,
        email: String,
        password: Option<String>,
    }

    impl Model for User {
        fn from_record(record: &Record) -> QuarryResult<Self> {
            Ok(Self {
                id: record.get("id")?,
                email: record.get("email")?,
                password: record
                    .contains("password")
                    .then(|| record.get("password"))
                    .transpose()?,
            })
        }
        fn to_record(&self) -> Record {
            Record::from_pairs([
                ("id", Value::from(self.id)),
                ("email", Value::from(self.email.clone())),
                ("password", Value::from(self.password.clone())),
            ])
        }
    }

    fn hydrator() -> Hydrator {
        Hydrator::new(Arc::new(
            TableBuilder::new()
                .field("id", FieldDescriptor::new().primary_key())
                .field("email", FieldDescriptor::new().column("email_address"))
                .field("password", FieldDescriptor::new().sensitive())
                .field("prefs", FieldDescriptor::new().kind(JsonKind))
                .build("user")
                .unwrap(),
        ))
    }

    fn row() -> Row {
        Row::from_pairs([
            ("id", Value::Int(1)),
            ("email_address", Value::from("ada@example.com")),
            ("password", Value::from("hunter2")),
            ("prefs", Value::from(r#"{"dark":true}"#)),
            ("post_count", Value::Int(4)),
        ])
    }

    #[test]
    fn test_rows_pass_through() {
        let input = vec![row()];
        assert_eq!(rows(input.clone()), input);
    }

    #[test]
    fn test_scalar_empty_is_zero() {
        assert_eq!(scalar(&[]).unwrap(), 0);
        assert_eq!(scalar(&[Row::new()]).unwrap(), 0);
    }

    #[test]
    fn test_scalar_readings() {
        let read = |v: Value| scalar(&[Row::from_pairs([("n", v)])]);
        assert_eq!(read(Value::Int(7)).unwrap(), 7);
        assert_eq!(read(Value::Float(7.9)).unwrap(), 7);
        assert_eq!(read(Value::from(" 12 ")).unwrap(), 12);
        assert_eq!(read(Value::from("12.9")).unwrap(), 12);
        assert_eq!(read(Value::from("-3")).unwrap(), -3);
    }

    #[test]
    fn test_scalar_unparseable_names_value() {
        let err = scalar(&[Row::from_pairs([("n", Value::from("many"))])]).unwrap_err();
        assert!(matches!(err, QuarryError::Hydration(_)));
        assert!(err.to_string().contains("many"));

        let err = scalar(&[Row::from_pairs([("n", Value::Null)])]).unwrap_err();
        assert!(err.to_string().contains("NULL"));
    }

    #[test]
    fn test_record_maps_columns_and_hides_sensitive() {
        let record = hydrator().record(&row()).unwrap();
        assert_eq!(
            record.columns().collect::<Vec<_>>(),
            ["id", "email", "prefs", "post_count"]
        );
        assert_eq!(
            record.get::<serde_json::Value>("prefs").unwrap(),
            serde_json::json!({"dark": true})
        );
        assert_eq!(record.get::<i64>("post_count").unwrap(), 4);
    }

    #[test]
    fn test_include_sensitive() {
        let record = hydrator().include_sensitive(true).record(&row()).unwrap();
        assert_eq!(record.get::<String>("password").unwrap(), "hunter2");
    }

    #[test]
    fn test_input_rows_untouched() {
        let input = vec![row()];
        let before = input.clone();
        hydrator().records(&input).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_models() {
        let users: Vec<User> = hydrator().models(&[row()]).unwrap();
        assert_eq!(
            users,
            vec![User {
                id: 1,
                email: "ada@example.com".into(),
                password: None,
            }]
        );
    }

    #[test]
    fn test_first_and_one() {
        let h = hydrator();
        assert_eq!(h.first::<User>(&[]).unwrap(), None);
        assert_eq!(h.first::<User>(&[row()]).unwrap().map(|u| u.id), Some(1));

        let err = h.one::<User>(&[]).unwrap_err();
        assert!(err.is_not_found());
        assert!(h.one::<User>(&[row()]).is_ok());
    }

    #[test]
    fn test_many_or_not_found() {
        let h = hydrator();
        assert!(h.many_or_not_found::<User>(&[]).unwrap_err().is_not_found());
        assert_eq!(h.many_or_not_found::<User>(&[row(), row()]).unwrap().len(), 2);
    }

    #[test]
    fn test_reader_errors_are_hydration_errors() {
        let bad = Row::from_pairs([("prefs", Value::from("{not json"))]);
        let err = hydrator().record(&bad).unwrap_err();
        assert!(matches!(err, QuarryError::Hydration(_)));
    }

    #[test]
    fn test_unregistered_model_passes_columns_through() {
        struct Loose;
        impl Model for Loose {
            fn from_record(_record: &Record) -> QuarryResult<Self> {
                Ok(Self)
            }
            fn to_record(&self) -> Record {
                Record::new()
            }
        }
        let registry = Registry::new();
        let record = Hydrator::for_model_in::<Loose>(&registry)
            .record(&row())
            .unwrap();
        assert_eq!(record.len(), 5);
        assert!(record.contains("email_address"));
    }
}
