//! Belongs-to relation resolution.
//!
//! For every relation field of a populated record the related table is
//! derived from the related type name and the related row is fetched by the
//! integer held in the local key field. A failed nested fetch is not an error:
//! the relation field simply stays at its zero value.

use crate::client::QueryClient;
use crate::schema::Schema;
use core_types::{Fields, Slot};
use futures::future::BoxFuture;

/// How many relation hops a top-level fetch follows.
pub const MAX_RELATION_DEPTH: usize = 1;

/// The table a related type lives in: lowercase type name plus `s`.
///
/// This is deliberately naive: `Category` maps to `categorys` and `Person`
/// to `persons`.
pub fn related_table(type_name: &str) -> String {
    format!("{}s", type_name.to_lowercase())
}

fn key_value(record: &mut dyn Fields, key_field: &str) -> Option<i64> {
    match record.slot(key_field)? {
        Slot::Int(value) => Some(*value),
        _ => None,
    }
}

/// Fills the relation fields of `record`, which was fetched at `depth`.
///
/// Nothing happens once `depth` reaches [`MAX_RELATION_DEPTH`], which keeps
/// records that reference each other from fetching indefinitely.
pub fn resolve<'a>(
    client: &'a QueryClient,
    record: &'a mut dyn Fields,
    depth: usize,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if depth >= MAX_RELATION_DEPTH {
            return;
        }

        let schema = Schema::describe(record.fields());
        for relation in schema.relations() {
            let Some(id) = key_value(record, relation.key_field) else {
                tracing::trace!(field = relation.key_field, "relation key is not an integer field");
                continue;
            };
            let Some(Slot::Record(target)) = record.slot(relation.field) else {
                continue;
            };

            let table = related_table(target.type_name());
            if let Err(error) = client.fetch_into(&table, id, target, depth + 1).await {
                tracing::debug!(
                    relation = relation.field,
                    table = %table,
                    id,
                    %error,
                    "related row not loaded"
                );
            }
        }
    })
}
