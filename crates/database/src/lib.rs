//! # Database Crate
//!
//! This crate maps rows of relational tables into plain record types and
//! back. Callers name a table and a destination type; the crate derives the
//! select list from the type's field metadata, coerces the untyped driver
//! values into the destination's fields and follows belongs-to relations one
//! hop deep.
//!
//! ## Architectural Principles
//!
//! - **Metadata-driven:** Record types publish a static field table (see
//!   `core_types::Fields`). Nothing here knows about concrete models.
//! - **Driver seam:** All SQL goes through the `Driver` trait, so the mapper
//!   can be exercised against an in-memory SQLite database or any other
//!   implementation.
//! - **Asynchronous & Pooled:** All operations are asynchronous and run on a
//!   shared `sqlx` connection pool (MySQL or SQLite).
//!
//! ## Public API
//!
//! - `connect` / `connect_in_memory`: Establish the connection pool.
//! - `run_migrations`: Apply the versioned schema migrations.
//! - `QueryClient`: `find`, `find_into`, `all`, `create`, `update`, `delete`.
//! - `list_tables`, `drop_table`, `drop_all`: Schema maintenance.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod client;
pub mod coerce;
pub mod connection;
pub mod driver;
pub mod error;
pub mod maintenance;
pub mod relation;
pub mod schema;
pub mod sql;

// Re-export the key components to create a clean, public-facing API.
pub use client::QueryClient;
pub use connection::{connect, connect_in_memory, run_migrations, Database};
pub use driver::{Driver, ExecOutcome};
pub use error::DbError;
pub use maintenance::{drop_all, drop_table, list_tables};
pub use schema::Schema;

impl From<Database> for QueryClient {
    fn from(database: Database) -> Self {
        QueryClient::new(std::sync::Arc::new(database))
    }
}
