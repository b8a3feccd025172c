//! Schema descriptor extraction: turns a record's field metadata into the
//! ordered column list and per-field roles the rest of the mapper works from.

use core_types::FieldMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Plain,
    PrimaryKey,
    /// A belongs-to relation populated by a nested fetch.
    ForeignKey,
}

/// A field that participates in persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub field: &'static str,
    pub column: &'static str,
    pub role: FieldRole,
    /// Marked `index` in the tag (foreign key scalars).
    pub indexed: bool,
}

/// A belongs-to relation: `field` holds the related record, `key_field` the
/// local integer holding the related primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub field: &'static str,
    pub key_field: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
    relations: Vec<RelationDescriptor>,
}

fn tag_parts(tag: &'static str) -> impl Iterator<Item = &'static str> {
    tag.split(';').map(str::trim).filter(|part| !part.is_empty())
}

/// Resolves the column a field maps to: the explicit annotation first, then
/// `column:` inside the combined tag. `None` means the field is not persisted.
pub fn persisted_name(meta: &FieldMeta) -> Option<&'static str> {
    meta.column.filter(|column| !column.is_empty()).or_else(|| {
        tag_parts(meta.tag)
            .find_map(|part| part.strip_prefix("column:"))
            .filter(|column| !column.is_empty())
    })
}

/// The local key field named by a `foreignKey:` annotation.
pub fn relation_key(meta: &FieldMeta) -> Option<&'static str> {
    tag_parts(meta.tag)
        .find_map(|part| part.strip_prefix("foreignKey:"))
        .filter(|key| !key.is_empty())
}

pub fn field_role(meta: &FieldMeta) -> FieldRole {
    if tag_parts(meta.tag).any(|part| part == "primaryKey") {
        FieldRole::PrimaryKey
    } else if relation_key(meta).is_some() {
        FieldRole::ForeignKey
    } else {
        FieldRole::Plain
    }
}

impl Schema {
    /// Builds the descriptor for a record type's field table.
    ///
    /// Fields without a resolvable persisted name are skipped silently; they can
    /// still be relations.
    pub fn describe(fields: &'static [FieldMeta]) -> Self {
        let mut schema = Schema::default();
        let mut has_primary_key = false;

        for meta in fields {
            let mut role = field_role(meta);
            if role == FieldRole::PrimaryKey {
                if has_primary_key {
                    tracing::warn!(field = meta.field, "second primaryKey field treated as plain");
                    role = FieldRole::Plain;
                }
                has_primary_key = true;
            }

            if let Some(key_field) = relation_key(meta) {
                schema.relations.push(RelationDescriptor {
                    field: meta.field,
                    key_field,
                });
            }

            if let Some(column) = persisted_name(meta) {
                schema.columns.push(ColumnDescriptor {
                    field: meta.field,
                    column,
                    role,
                    indexed: tag_parts(meta.tag).any(|part| part == "index"),
                });
            }
        }

        schema
    }

    /// Every persisted field, in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Distinct column names in declaration order; the select list.
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::with_capacity(self.columns.len());
        for descriptor in &self.columns {
            if !names.contains(&descriptor.column) {
                names.push(descriptor.column);
            }
        }
        names
    }

    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.relations
    }

    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|descriptor| descriptor.role == FieldRole::PrimaryKey)
    }

    /// The primary key column, falling back to `id`.
    pub fn primary_key_column(&self) -> &'static str {
        self.primary_key().map_or("id", |descriptor| descriptor.column)
    }
}
