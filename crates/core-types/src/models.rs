use crate::record::{FieldMeta, Fields, Slot};
use serde::{Deserialize, Serialize};

/// A row of the `roles` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Role {
    const FIELDS: &'static [FieldMeta] = &[
        FieldMeta::column("id", "id", "primaryKey;column:id"),
        FieldMeta::column("name", "name", "column:name"),
    ];
}

impl Fields for Role {
    fn type_name(&self) -> &'static str {
        "Role"
    }

    fn fields(&self) -> &'static [FieldMeta] {
        Self::FIELDS
    }

    fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
        match field {
            "id" => Some(Slot::Int(&mut self.id)),
            "name" => Some(Slot::Text(&mut self.name)),
            _ => None,
        }
    }
}

/// A row of the `users` table. `role` is filled from `roles` by following `role_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub role: Role,
}

impl User {
    const FIELDS: &'static [FieldMeta] = &[
        FieldMeta::column("id", "id", "primaryKey;column:id"),
        FieldMeta::column("name", "name", "column:name"),
        FieldMeta::column("email", "email", "column:email"),
        FieldMeta::column("role_id", "role_id", "index;column:role_id"),
        FieldMeta::tagged(
            "role",
            "foreignKey:role_id;references:id;constraint:OnUpdate:CASCADE,OnDelete:SET NULL",
        ),
    ];
}

impl Fields for User {
    fn type_name(&self) -> &'static str {
        "User"
    }

    fn fields(&self) -> &'static [FieldMeta] {
        Self::FIELDS
    }

    fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
        match field {
            "id" => Some(Slot::Int(&mut self.id)),
            "name" => Some(Slot::Text(&mut self.name)),
            "email" => Some(Slot::Text(&mut self.email)),
            "role_id" => Some(Slot::Int(&mut self.role_id)),
            "role" => Some(Slot::Record(&mut self.role)),
            _ => None,
        }
    }
}

/// A row of the `savings` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Saving {
    pub id: i64,
    pub name: String,
    pub nominal: i64,
}

impl Saving {
    const FIELDS: &'static [FieldMeta] = &[
        FieldMeta::column("id", "id", "primaryKey;column:id"),
        FieldMeta::column("name", "name", "column:name"),
        FieldMeta::column("nominal", "nominal", "column:nominal"),
    ];
}

impl Fields for Saving {
    fn type_name(&self) -> &'static str {
        "Saving"
    }

    fn fields(&self) -> &'static [FieldMeta] {
        Self::FIELDS
    }

    fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
        match field {
            "id" => Some(Slot::Int(&mut self.id)),
            "name" => Some(Slot::Text(&mut self.name)),
            "nominal" => Some(Slot::Int(&mut self.nominal)),
            _ => None,
        }
    }
}

/// A row of the `payments` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub name: String,
}

impl Payment {
    // Only the legacy combined tag carries the column name here.
    const FIELDS: &'static [FieldMeta] = &[
        FieldMeta::tagged("id", "primaryKey;column:id"),
        FieldMeta::tagged("name", "type:varchar(100);column:name"),
    ];
}

impl Fields for Payment {
    fn type_name(&self) -> &'static str {
        "Payment"
    }

    fn fields(&self) -> &'static [FieldMeta] {
        Self::FIELDS
    }

    fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
        match field {
            "id" => Some(Slot::Int(&mut self.id)),
            "name" => Some(Slot::Text(&mut self.name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_field_has_a_slot() {
        let mut user = User::default();
        for meta in user.fields() {
            assert!(user.slot(meta.field).is_some(), "no slot for {}", meta.field);
        }
        assert!(user.slot("missing").is_none());
    }

    #[test]
    fn user_serializes_with_nested_role() {
        let user = User {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role_id: 2,
            role: Role {
                id: 2,
                name: "admin".to_string(),
            },
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"]["name"], "admin");
        assert_eq!(json["role_id"], 2);
    }
}
