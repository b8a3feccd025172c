pub mod enums;
pub mod models;
pub mod record;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use enums::DbKind;
pub use models::{Payment, Role, Saving, User};
pub use record::{FieldMeta, Fields, Record, Slot};
pub use value::{Cell, RawRow, Value};
