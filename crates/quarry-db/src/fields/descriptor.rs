//! Field descriptors.
//!
//! A [`FieldDescriptor`] captures everything the query layer knows about one
//! model property: the column it maps to, its flags, an optional
//! [`FieldKind`] transform, and, for virtual fields, the table that backs it.

use std::fmt;
use std::sync::Arc;

use quarry_core::QuarryResult;

use super::kinds::{FieldKind, KindRegistry};
use crate::query::expressions::Expr;
use crate::query::tree::Query;
use crate::value::Value;

/// Builds the subquery behind a virtual field.
///
/// The argument is the owning table's primary-key column expression, already
/// qualified with the owning alias.
pub type SubqueryBuilder = Arc<dyn Fn(Expr) -> QuarryResult<Query> + Send + Sync>;

/// Marks a virtual field backed by a column of another table.
///
/// The field's own `column_name` names the value column in `table_name`;
/// `key_field` is the column there that holds the owning primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedTo {
    /// The related table.
    pub table_name: String,
    /// The column in the related table that references the owner.
    pub key_field: String,
}

/// Complete description of one model property.
///
/// Built with a fluent API and handed to
/// [`TableBuilder::field`](crate::model::TableBuilder::field).
///
/// ```
/// use quarry_db::fields::FieldDescriptor;
///
/// let id = FieldDescriptor::new().primary_key().auto_increment();
/// let email = FieldDescriptor::new().column("email_address").sensitive();
/// assert!(id.is_primary_key);
/// assert_eq!(email.column_name, "email_address");
/// ```
#[derive(Clone, Default)]
pub struct FieldDescriptor {
    /// The database column name. Empty means "same as the property name".
    pub column_name: String,
    /// Whether this field is (part of) the primary key.
    pub is_primary_key: bool,
    /// Whether the database generates the value.
    pub is_auto_increment: bool,
    /// Whether UPDATE statements may assign this field.
    pub is_read_only: bool,
    /// Whether hydration hides this field unless asked otherwise.
    pub is_sensitive: bool,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Default value for new rows.
    pub default_value: Option<Value>,
    /// Optional storage transform.
    pub kind: Option<Arc<dyn FieldKind>>,
    /// Virtual field backed by another table's column.
    pub related_to: Option<RelatedTo>,
    /// Virtual field backed by an arbitrary subquery.
    pub subquery_builder: Option<SubqueryBuilder>,
}

impl FieldDescriptor {
    /// Creates a plain, non-null column field.
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Creates a virtual field reading `column` from `table`, matched on `key_field`.
    pub fn related(
        table: impl Into<String>,
        key_field: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column.into(),
            related_to: Some(RelatedTo {
                table_name: table.into(),
                key_field: key_field.into(),
            }),
            ..<Self as Default>::default()
        }
    }

    /// Creates a virtual field backed by a subquery builder.
    pub fn subquery<F>(builder: F) -> Self
    where
        F: Fn(Expr) -> QuarryResult<Query> + Send + Sync + 'static,
    {
        Self {
            subquery_builder: Some(Arc::new(builder)),
            ..<Self as Default>::default()
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column_name = column.into();
        self
    }

    /// Marks this field as (part of) the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Marks this field as database-generated.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    /// Prevents UPDATE statements from assigning this field.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    /// Hides this field from hydration unless sensitive fields are requested.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.is_sensitive = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Attaches a storage transform.
    #[must_use]
    pub fn kind(mut self, kind: impl FieldKind + 'static) -> Self {
        self.kind = Some(Arc::new(kind));
        self
    }

    /// Attaches a storage transform resolved by name from `registry`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKind` if `name` is not registered.
    pub fn kind_named(mut self, registry: &KindRegistry, name: &str) -> QuarryResult<Self> {
        self.kind = Some(registry.resolve(name)?);
        Ok(self)
    }

    /// Returns `true` for filter-only fields that have no column of their own.
    pub const fn is_virtual(&self) -> bool {
        self.related_to.is_some() || self.subquery_builder.is_some()
    }

    /// Applies the kind's `reader` to a raw value, or returns it unchanged.
    pub fn read_value(&self, raw: Value) -> QuarryResult<Value> {
        match &self.kind {
            Some(kind) => kind.reader(raw),
            None => Ok(raw),
        }
    }

    /// Applies the kind's `writer`, then wraps the raw value in a parameter
    /// piped through `write_query`.
    pub fn write_value(&self, value: Value) -> QuarryResult<Expr> {
        match &self.kind {
            Some(kind) => {
                let raw = kind.writer(value)?;
                Ok(kind.write_query(Expr::Param(raw)))
            }
            None => Ok(Expr::Param(value)),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("column_name", &self.column_name)
            .field("is_primary_key", &self.is_primary_key)
            .field("is_auto_increment", &self.is_auto_increment)
            .field("is_read_only", &self.is_read_only)
            .field("is_sensitive", &self.is_sensitive)
            .field("is_nullable", &self.is_nullable)
            .field("default_value", &self.default_value)
            .field("kind", &self.kind.as_ref().map(|k| k.name()))
            .field("related_to", &self.related_to)
            .field("subquery_builder", &self.subquery_builder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::kinds::BoolKind;

    #[test]
    fn test_defaults() {
        let f = FieldDescriptor::new();
        assert!(f.column_name.is_empty());
        assert!(!f.is_primary_key);
        assert!(!f.is_nullable);
        assert!(!f.is_virtual());
        assert!(f.kind.is_none());
    }

    #[test]
    fn test_builder_flags() {
        let f = FieldDescriptor::new()
            .column("user_id")
            .primary_key()
            .auto_increment()
            .read_only()
            .sensitive()
            .nullable()
            .default(0);
        assert_eq!(f.column_name, "user_id");
        assert!(f.is_primary_key && f.is_auto_increment && f.is_read_only);
        assert!(f.is_sensitive && f.is_nullable);
        assert_eq!(f.default_value, Some(Value::Int(0)));
    }

    #[test]
    fn test_related_is_virtual() {
        let f = FieldDescriptor::related("tag", "post_id", "label");
        assert!(f.is_virtual());
        assert_eq!(f.column_name, "label");
        assert_eq!(f.related_to.as_ref().unwrap().table_name, "tag");
    }

    #[test]
    fn test_subquery_is_virtual() {
        let f = FieldDescriptor::subquery(|_pk| Err(quarry_core::QuarryError::InvalidQuery("x".into())));
        assert!(f.is_virtual());
    }

    #[test]
    fn test_write_value_without_kind() {
        let f = FieldDescriptor::new();
        assert_eq!(f.write_value(Value::Int(3)).unwrap(), Expr::Param(Value::Int(3)));
        assert_eq!(f.read_value(Value::Int(3)).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_write_value_with_kind() {
        let f = FieldDescriptor::new().kind(BoolKind);
        assert_eq!(f.write_value(Value::Bool(true)).unwrap(), Expr::Param(Value::Int(1)));
        assert_eq!(f.read_value(Value::Int(0)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_kind_named_unknown() {
        let registry = KindRegistry::new();
        let err = FieldDescriptor::new().kind_named(&registry, "money").unwrap_err();
        assert!(err.to_string().contains("money"));
    }

    #[test]
    fn test_debug_hides_closures() {
        let f = FieldDescriptor::new().kind(BoolKind);
        let dbg = format!("{f:?}");
        assert!(dbg.contains("\"bool\""));
    }
}
