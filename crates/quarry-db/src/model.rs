//! Model trait and table metadata.
//!
//! The [`Model`] trait connects a Rust type to the query layer: it names the
//! model and converts between instances and [`Record`]s. The table metadata
//! lives in a [`TableDescriptor`], built once with a [`TableBuilder`] and
//! stored in the [`Registry`](crate::registry::Registry).

use std::fmt;

use indexmap::IndexMap;
use quarry_core::{QuarryError, QuarryResult};

use crate::fields::FieldDescriptor;
use crate::query::expressions::Expr;
use crate::row::Record;

/// The core trait for all query-able models.
///
/// # Examples
///
/// ```
/// use quarry_db::model::Model;
/// use quarry_db::row::Record;
/// use quarry_core::QuarryResult;
///
/// struct PersonModel {
///     id: i64,
///     name: String,
/// }
///
/// impl Model for PersonModel {
///     fn from_record(record: &Record) -> QuarryResult<Self> {
///         Ok(Self {
///             id: record.get("id")?,
///             name: record.get("name")?,
///         })
///     }
///
///     fn to_record(&self) -> Record {
///         Record::from_pairs([("id", self.id.into()), ("name", self.name.clone().into())])
///     }
/// }
///
/// assert_eq!(PersonModel::model_name(), "PersonModel");
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// Returns the model name; defaults to the short type name.
    fn model_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Constructs an instance from a hydrated record.
    fn from_record(record: &Record) -> QuarryResult<Self>;

    /// Returns the property values of this instance.
    fn to_record(&self) -> Record;
}

/// Derives the default table name: the model name without a trailing
/// `Model`, lower-cased.
///
/// ```
/// use quarry_db::model::default_table_name;
///
/// assert_eq!(default_table_name("PersonModel"), "person");
/// assert_eq!(default_table_name("Invoice"), "invoice");
/// ```
pub fn default_table_name(model_name: &str) -> String {
    let stem = match model_name.strip_suffix("Model") {
        Some(stem) if !stem.is_empty() => stem,
        _ => model_name,
    };
    stem.to_lowercase()
}

/// A unique index usable as an upsert conflict target.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescriptor {
    /// The index name.
    pub name: String,
    /// The property names covered by the index, in order.
    pub key_fields: Vec<String>,
    /// Whether this index is the conflict target when no name is given and
    /// the table has no primary key.
    pub is_default: bool,
    /// Partial-index predicate.
    pub where_condition: Option<Expr>,
}

impl IndexDescriptor {
    /// Creates a new index over the given properties.
    pub fn new(name: impl Into<String>, key_fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            key_fields: key_fields.iter().map(|f| (*f).to_string()).collect(),
            is_default: false,
            where_condition: None,
        }
    }

    /// Marks this index as the default conflict target.
    #[must_use]
    pub const fn default_target(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Makes this a partial index.
    #[must_use]
    pub fn where_condition(mut self, condition: Expr) -> Self {
        self.where_condition = Some(condition);
        self
    }
}

/// Per-model table metadata.
///
/// Created once through [`TableBuilder`] and shared read-only afterwards.
pub struct TableDescriptor {
    table_name: String,
    primary_key: Vec<String>,
    fields: IndexMap<String, FieldDescriptor>,
    indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    /// Creates a descriptor with no fields.
    ///
    /// Used for unregistered models probed during hydration, and as the
    /// target of related-field subqueries.
    pub fn empty(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: Vec::new(),
            fields: IndexMap::new(),
            indexes: Vec::new(),
        }
    }

    /// Creates a synthetic descriptor whose fields are plain columns.
    ///
    /// Derived tables use this to expose the inner projection's names.
    pub fn synthetic<I, S>(table_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = columns
            .into_iter()
            .map(|c| {
                let name = c.into();
                let field = FieldDescriptor::new().column(name.clone());
                (name, field)
            })
            .collect();
        Self {
            table_name: table_name.into(),
            primary_key: Vec::new(),
            fields,
            indexes: Vec::new(),
        }
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the primary key property when it is a single field.
    pub fn primary_key_field(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Returns every primary-key property in declaration order.
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Returns the field map in declaration order.
    pub fn fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }

    /// Returns a field by property name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Returns a field by property name, failing with `UnknownField`.
    pub fn require_field(&self, name: &str) -> QuarryResult<&FieldDescriptor> {
        self.fields
            .get(name)
            .ok_or_else(|| QuarryError::unknown_field(&self.table_name, name))
    }

    /// Iterates the fields backed by a real column.
    pub fn column_fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields
            .iter()
            .filter(|(_, f)| !f.is_virtual())
            .map(|(name, f)| (name.as_str(), f))
    }

    /// Finds the property stored in the given column.
    pub fn field_by_column(&self, column: &str) -> Option<(&str, &FieldDescriptor)> {
        self.column_fields().find(|(_, f)| f.column_name == column)
    }

    /// Returns the declared indexes.
    pub fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    /// Returns an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Returns the index flagged as the default conflict target.
    pub fn default_index(&self) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|i| i.is_default)
    }

    /// Maps property names to their column names.
    pub fn columns_for(&self, properties: &[String]) -> QuarryResult<Vec<String>> {
        properties
            .iter()
            .map(|p| self.require_field(p).map(|f| f.column_name.clone()))
            .collect()
    }

    /// Returns `true` if no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for TableDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.table_name == other.table_name
            && self.primary_key == other.primary_key
            && self.fields.keys().eq(other.fields.keys())
    }
}

impl fmt::Debug for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDescriptor")
            .field("table_name", &self.table_name)
            .field("primary_key", &self.primary_key)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("indexes", &self.indexes)
            .finish()
    }
}

/// Accumulates fields and indexes for one model before registration.
///
/// # Examples
///
/// ```
/// use quarry_db::fields::FieldDescriptor;
/// use quarry_db::model::{IndexDescriptor, TableBuilder};
///
/// let table = TableBuilder::new()
///     .field("id", FieldDescriptor::new().primary_key())
///     .field("email", FieldDescriptor::new())
///     .index(IndexDescriptor::new("person_email_key", &["email"]))
///     .build("person")
///     .unwrap();
/// assert_eq!(table.primary_key_field(), Some("id"));
/// ```
#[derive(Debug, Default)]
pub struct TableBuilder {
    table_name: Option<String>,
    fields: Vec<(String, FieldDescriptor, bool)>,
    indexes: Vec<IndexDescriptor>,
}

impl TableBuilder {
    /// Creates a builder that will use the model's default table name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with an explicit table name.
    pub fn named(table_name: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            ..Self::default()
        }
    }

    /// Registers a column field. An empty column name defaults to `name`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.push((name.into(), field, false));
        self
    }

    /// Registers a virtual filter-only field.
    ///
    /// [`build`](Self::build) rejects it unless it is related or
    /// subquery-backed.
    #[must_use]
    pub fn filter_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.push((name.into(), field, true));
        self
    }

    /// Declares an index.
    #[must_use]
    pub fn index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    /// Finalizes the descriptor, falling back to `default_name` for the table.
    ///
    /// # Errors
    ///
    /// Fails if a property is declared twice, if a primary-key field is
    /// virtual, if a filter field is not virtual, or if an index names an
    /// unknown field.
    pub fn build(self, default_name: &str) -> QuarryResult<TableDescriptor> {
        let table_name = self
            .table_name
            .unwrap_or_else(|| default_name.to_string());

        let mut fields = IndexMap::with_capacity(self.fields.len());
        let mut primary_key = Vec::new();
        for (name, mut field, filter_only) in self.fields {
            if fields.contains_key(&name) {
                return Err(QuarryError::AlreadyRegistered(format!("{table_name}.{name}")));
            }
            if filter_only && !field.is_virtual() {
                return Err(QuarryError::InvalidQuery(format!(
                    "filter field '{name}' on table '{table_name}' needs a related table or a subquery builder"
                )));
            }
            if field.column_name.is_empty() {
                field.column_name.clone_from(&name);
            }
            if field.is_primary_key {
                if field.is_virtual() {
                    return Err(QuarryError::VirtualField {
                        table: table_name,
                        field: name,
                    });
                }
                primary_key.push(name.clone());
            }
            fields.insert(name, field);
        }

        let table = TableDescriptor {
            table_name,
            primary_key,
            fields,
            indexes: self.indexes,
        };
        for index in &table.indexes {
            for key in &index.key_fields {
                table.require_field(key)?;
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> TableDescriptor {
        TableBuilder::new()
            .field("id", FieldDescriptor::new().primary_key().auto_increment())
            .field("name", FieldDescriptor::new())
            .field("email", FieldDescriptor::new().column("email_address").sensitive())
            .filter_field("tag", FieldDescriptor::related("tag", "person_id", "label"))
            .index(IndexDescriptor::new("person_email_key", &["email"]).default_target())
            .build("person")
            .unwrap()
    }

    struct InvoiceModel;

    impl Model for InvoiceModel {
        fn from_record(_record: &Record) -> QuarryResult<Self> {
            Ok(Self)
        }

        fn to_record(&self) -> Record {
            Record::new()
        }
    }

    #[test]
    fn test_default_model_name() {
        assert_eq!(InvoiceModel::model_name(), "InvoiceModel");
    }

    #[test]
    fn test_default_table_name() {
        assert_eq!(default_table_name("PersonModel"), "person");
        assert_eq!(default_table_name("OrderLine"), "orderline");
        assert_eq!(default_table_name("Model"), "model");
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let table = person();
        let names: Vec<&str> = table.fields().keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "name", "email", "tag"]);
    }

    #[test]
    fn test_primary_key_registration() {
        let table = person();
        assert_eq!(table.primary_key_field(), Some("id"));
        assert_eq!(table.primary_key(), ["id".to_string()]);
    }

    #[test]
    fn test_composite_primary_key() {
        let table = TableBuilder::named("membership")
            .field("user_id", FieldDescriptor::new().primary_key())
            .field("group_id", FieldDescriptor::new().primary_key())
            .build("ignored")
            .unwrap();
        assert_eq!(table.table_name(), "membership");
        assert_eq!(table.primary_key_field(), None);
        assert_eq!(table.primary_key().len(), 2);
    }

    #[test]
    fn test_column_defaults_to_property() {
        let table = person();
        assert_eq!(table.field("name").unwrap().column_name, "name");
        assert_eq!(table.field("email").unwrap().column_name, "email_address");
    }

    #[test]
    fn test_column_fields_skip_virtual() {
        let table = person();
        let names: Vec<&str> = table.column_fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "name", "email"]);
    }

    #[test]
    fn test_field_by_column() {
        let table = person();
        let (prop, _) = table.field_by_column("email_address").unwrap();
        assert_eq!(prop, "email");
        assert!(table.field_by_column("label").is_none());
    }

    #[test]
    fn test_require_field_unknown() {
        let err = person().require_field("age").unwrap_err();
        assert_eq!(err.to_string(), "Unknown field 'age' on table 'person'");
    }

    #[test]
    fn test_indexes() {
        let table = person();
        assert_eq!(table.index("person_email_key").unwrap().key_fields, ["email"]);
        assert!(table.index("missing").is_none());
        assert_eq!(table.default_index().unwrap().name, "person_email_key");
        assert_eq!(
            table.columns_for(&["email".to_string()]).unwrap(),
            ["email_address"]
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = TableBuilder::new()
            .field("id", FieldDescriptor::new())
            .field("id", FieldDescriptor::new())
            .build("person");
        assert!(matches!(result, Err(QuarryError::AlreadyRegistered(_))));
    }

    #[test]
    fn test_filter_field_must_be_virtual() {
        let result = TableBuilder::new()
            .filter_field("tag", FieldDescriptor::new())
            .build("person");
        assert!(matches!(result, Err(QuarryError::InvalidQuery(_))));
    }

    #[test]
    fn test_index_on_unknown_field_rejected() {
        let result = TableBuilder::new()
            .field("id", FieldDescriptor::new())
            .index(IndexDescriptor::new("bad", &["nope"]))
            .build("person");
        assert!(matches!(result, Err(QuarryError::UnknownField { .. })));
    }

    #[test]
    fn test_partial_index() {
        let cond = Expr::column(Some("person"), "active").eq(true);
        let index = IndexDescriptor::new("active_email", &["email"]).where_condition(cond.clone());
        assert_eq!(index.where_condition, Some(cond));
        assert!(!index.is_default);
    }

    #[test]
    fn test_synthetic_descriptor() {
        let table = TableDescriptor::synthetic("person_SUBQUERY", ["name", "total"]);
        assert_eq!(table.table_name(), "person_SUBQUERY");
        assert_eq!(table.field("total").unwrap().column_name, "total");
        assert!(table.primary_key().is_empty());
    }

    #[test]
    fn test_empty_descriptor() {
        let table = TableDescriptor::empty("anything");
        assert!(table.is_empty());
        assert_eq!(table.table_name(), "anything");
    }
}
