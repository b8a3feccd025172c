//! The metadata contract between persisted record types and the mapper.
//!
//! Every record type publishes a static table of [`FieldMeta`] entries, one
//! per struct field in declaration order, and hands out typed mutable access
//! to its fields through [`Fields::slot`]. The mapper never inspects a type
//! beyond these two entry points.

/// Column-mapping metadata attached to one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// The Rust field name; the key accepted by [`Fields::slot`].
    pub field: &'static str,
    /// Explicit persisted-name annotation.
    pub column: Option<&'static str>,
    /// Combined `;`-separated tag, e.g. `primaryKey;column:id`,
    /// `index;column:role_id` or `foreignKey:role_id;references:id`.
    pub tag: &'static str,
}

impl FieldMeta {
    /// A field with an explicit persisted name.
    pub const fn column(field: &'static str, column: &'static str, tag: &'static str) -> Self {
        Self {
            field,
            column: Some(column),
            tag,
        }
    }

    /// A field described only by its combined tag.
    pub const fn tagged(field: &'static str, tag: &'static str) -> Self {
        Self {
            field,
            column: None,
            tag,
        }
    }
}

/// Typed mutable access to a single field.
pub enum Slot<'a> {
    Text(&'a mut String),
    Int(&'a mut i64),
    Float(&'a mut f64),
    /// A nested record, e.g. the payload of a belongs-to relation.
    Record(&'a mut dyn Fields),
}

/// Object-safe view of a record used by the coercion and relation layers.
pub trait Fields: Send {
    /// The type name, used to derive the table of a related record.
    fn type_name(&self) -> &'static str;

    /// Field metadata in declaration order.
    fn fields(&self) -> &'static [FieldMeta];

    /// Mutable access to the field named `field`, if it exists and has a
    /// storable kind.
    fn slot(&mut self, field: &str) -> Option<Slot<'_>>;
}

/// A persistable record type: constructible at its zero value.
pub trait Record: Fields + Default + Send + 'static {}

impl<T: Fields + Default + Send + 'static> Record for T {}
