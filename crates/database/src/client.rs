use crate::coerce;
use crate::driver::Driver;
use crate::error::DbError;
use crate::relation;
use crate::schema::Schema;
use crate::sql;
use core_types::{Fields, Record, Value};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Primary key column used by the write paths, which take explicit columns.
const PRIMARY_KEY: &str = "id";

/// The `QueryClient` maps rows of named tables into record types and back.
///
/// It holds no mutable state: the driver handle is shared read-only between
/// all clones, and every call works on its own destination records.
#[derive(Clone)]
pub struct QueryClient {
    driver: Arc<dyn Driver>,
}

fn select_columns(schema: &Schema, type_name: &str) -> Result<Vec<&'static str>, DbError> {
    let columns = schema.column_names();
    if columns.is_empty() {
        return Err(DbError::ShapeMismatch(format!(
            "{type_name} has no persisted columns"
        )));
    }
    Ok(columns)
}

fn check_shape(columns: &[&str], values: &[Value]) -> Result<(), DbError> {
    if columns.is_empty() {
        return Err(DbError::ShapeMismatch("no columns given".to_string()));
    }
    if columns.len() != values.len() {
        return Err(DbError::ShapeMismatch(format!(
            "{} columns but {} values",
            columns.len(),
            values.len()
        )));
    }
    Ok(())
}

impl QueryClient {
    /// Creates a new `QueryClient` over a shared driver handle.
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Fetches one row by primary key, with its relations resolved one hop deep.
    pub async fn find<T: Record>(&self, table: &str, id: i64) -> Result<T, DbError> {
        let mut record = T::default();
        self.find_into(table, id, &mut record).await?;
        Ok(record)
    }

    /// Like [`QueryClient::find`] but fills an existing record. On `NotFound`
    /// the destination is left untouched.
    pub async fn find_into(
        &self,
        table: &str,
        id: i64,
        dest: &mut dyn Fields,
    ) -> Result<(), DbError> {
        self.fetch_into(table, id, dest, 0).await
    }

    pub(crate) fn fetch_into<'a>(
        &'a self,
        table: &'a str,
        id: i64,
        dest: &'a mut dyn Fields,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), DbError>> {
        Box::pin(async move {
            let schema = Schema::describe(dest.fields());
            let columns = select_columns(&schema, dest.type_name())?;
            let query = sql::select_by_key(table, &columns, schema.primary_key_column())?;

            let row = self
                .driver
                .fetch_optional(&query, &[Value::Int(id)])
                .await?
                .ok_or(DbError::NotFound)?;

            coerce::populate(dest, &columns, &row);
            relation::resolve(self, dest, depth).await;
            Ok(())
        })
    }

    /// Fetches every row of `table` in the database's natural order.
    ///
    /// All rows are read and populated before returning; an empty table gives
    /// an empty vector.
    pub async fn all<T: Record>(&self, table: &str) -> Result<Vec<T>, DbError> {
        let probe = T::default();
        let schema = Schema::describe(probe.fields());
        let columns = select_columns(&schema, probe.type_name())?;
        let query = sql::select_all(table, &columns)?;

        let rows = self.driver.fetch_all(&query, &[]).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = T::default();
            coerce::populate(&mut record, &columns, &row);
            relation::resolve(self, &mut record, 0).await;
            records.push(record);
        }
        Ok(records)
    }

    /// Inserts one row and returns the key the database assigned to it.
    pub async fn create(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
    ) -> Result<i64, DbError> {
        check_shape(columns, values)?;
        let query = sql::insert(table, columns)?;
        let outcome = self.driver.execute(&query, values).await?;
        tracing::debug!(table, id = outcome.last_insert_id, "row created");
        Ok(outcome.last_insert_id)
    }

    /// Sets the given columns on the row with primary key `id`.
    pub async fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        id: i64,
    ) -> Result<u64, DbError> {
        check_shape(columns, values)?;
        let query = sql::update(table, columns, PRIMARY_KEY)?;

        let mut params = values.to_vec();
        params.push(Value::Int(id));
        let outcome = self.driver.execute(&query, &params).await?;
        Ok(outcome.rows_affected)
    }

    /// Deletes the row with primary key `id`.
    pub async fn delete(&self, table: &str, id: i64) -> Result<u64, DbError> {
        let query = sql::delete(table, PRIMARY_KEY)?;
        let outcome = self.driver.execute(&query, &[Value::Int(id)]).await?;
        Ok(outcome.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{connect_in_memory, run_migrations, Database};
    use core_types::{FieldMeta, Role, Slot, User};

    async fn setup() -> (Database, QueryClient) {
        let db = connect_in_memory().await.unwrap();
        run_migrations(&db).await.unwrap();
        let client = QueryClient::new(Arc::new(db.clone()));
        (db, client)
    }

    async fn ddl(db: &Database, statement: &str) {
        db.execute(statement, &[]).await.unwrap();
    }

    async fn seed_role(client: &QueryClient, name: &str) -> i64 {
        client.create("roles", &["name"], &[name.into()]).await.unwrap()
    }

    async fn seed_user(client: &QueryClient, name: &str, email: &str, role_id: Option<i64>) -> i64 {
        client
            .create(
                "users",
                &["name", "email", "role_id"],
                &[name.into(), email.into(), role_id.into()],
            )
            .await
            .unwrap()
    }

    // --- Test-only record types -------------------------------------------------

    #[derive(Debug, Default, PartialEq)]
    struct Author {
        id: i64,
        name: String,
    }

    impl Fields for Author {
        fn type_name(&self) -> &'static str {
            "Author"
        }
        fn fields(&self) -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[
                FieldMeta::column("id", "id", "primaryKey"),
                FieldMeta::column("name", "name", ""),
            ];
            FIELDS
        }
        fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
            match field {
                "id" => Some(Slot::Int(&mut self.id)),
                "name" => Some(Slot::Text(&mut self.name)),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Book {
        id: i64,
        title: String,
        author_id: i64,
        author: Author,
    }

    impl Fields for Book {
        fn type_name(&self) -> &'static str {
            "Book"
        }
        fn fields(&self) -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[
                FieldMeta::column("id", "id", "primaryKey"),
                FieldMeta::column("title", "title", ""),
                FieldMeta::column("author_id", "author_id", "index"),
                FieldMeta::tagged("author", "foreignKey:author_id"),
            ];
            FIELDS
        }
        fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
            match field {
                "id" => Some(Slot::Int(&mut self.id)),
                "title" => Some(Slot::Text(&mut self.title)),
                "author_id" => Some(Slot::Int(&mut self.author_id)),
                "author" => Some(Slot::Record(&mut self.author)),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Chapter {
        id: i64,
        book_id: i64,
        book: Book,
    }

    impl Fields for Chapter {
        fn type_name(&self) -> &'static str {
            "Chapter"
        }
        fn fields(&self) -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[
                FieldMeta::column("id", "id", "primaryKey"),
                FieldMeta::column("book_id", "book_id", "index"),
                FieldMeta::tagged("book", "foreignKey:book_id"),
            ];
            FIELDS
        }
        fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
            match field {
                "id" => Some(Slot::Int(&mut self.id)),
                "book_id" => Some(Slot::Int(&mut self.book_id)),
                "book" => Some(Slot::Record(&mut self.book)),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Measurement {
        id: i64,
        count: i64,
        ratio: f64,
        note: String,
        label: String,
        alias: String,
    }

    impl Fields for Measurement {
        fn type_name(&self) -> &'static str {
            "Measurement"
        }
        fn fields(&self) -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[
                FieldMeta::column("id", "id", "primaryKey"),
                FieldMeta::column("count", "count", ""),
                FieldMeta::column("ratio", "ratio", ""),
                FieldMeta::column("note", "note", ""),
                FieldMeta::column("label", "label", ""),
                FieldMeta::column("alias", "label", ""),
            ];
            FIELDS
        }
        fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
            match field {
                "id" => Some(Slot::Int(&mut self.id)),
                "count" => Some(Slot::Int(&mut self.count)),
                "ratio" => Some(Slot::Float(&mut self.ratio)),
                "note" => Some(Slot::Text(&mut self.note)),
                "label" => Some(Slot::Text(&mut self.label)),
                "alias" => Some(Slot::Text(&mut self.alias)),
                _ => None,
            }
        }
    }

    #[derive(Debug, Default)]
    struct Unmapped {
        scratch: String,
    }

    impl Fields for Unmapped {
        fn type_name(&self) -> &'static str {
            "Unmapped"
        }
        fn fields(&self) -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[FieldMeta::tagged("scratch", "type:text")];
            FIELDS
        }
        fn slot(&mut self, field: &str) -> Option<Slot<'_>> {
            match field {
                "scratch" => Some(Slot::Text(&mut self.scratch)),
                _ => None,
            }
        }
    }

    async fn library(db: &Database) {
        ddl(db, "CREATE TABLE authors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)").await;
        ddl(
            db,
            "CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, author_id INTEGER)",
        )
        .await;
        ddl(
            db,
            "CREATE TABLE chapters (id INTEGER PRIMARY KEY AUTOINCREMENT, book_id INTEGER)",
        )
        .await;
    }

    // --- find -------------------------------------------------------------------

    #[tokio::test]
    async fn find_populates_columns_and_resolves_the_role() {
        let (_db, client) = setup().await;
        let role_id = seed_role(&client, "admin").await;
        let user_id = seed_user(&client, "Ana", "ana@example.com", Some(role_id)).await;

        let user: User = client.find("users", user_id).await.unwrap();
        assert_eq!(
            user,
            User {
                id: user_id,
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                role_id,
                role: Role {
                    id: role_id,
                    name: "admin".to_string(),
                },
            }
        );
    }

    #[tokio::test]
    async fn find_missing_row_is_not_found_and_leaves_destination_untouched() {
        let (_db, client) = setup().await;
        let mut user = User::default();

        let err = client.find_into("users", 404, &mut user).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
        assert_eq!(user, User::default());
    }

    #[tokio::test]
    async fn byte_cells_from_the_driver_are_coerced() {
        let (db, client) = setup().await;
        ddl(
            &db,
            "CREATE TABLE measurements (id INTEGER PRIMARY KEY, count TEXT, ratio TEXT, note TEXT, label TEXT)",
        )
        .await;
        ddl(
            &db,
            "INSERT INTO measurements (id, count, ratio, note, label) VALUES (1, '42', '3.14', NULL, 'north')",
        )
        .await;

        let m: Measurement = client.find("measurements", 1).await.unwrap();
        assert_eq!(m.count, 42);
        assert_eq!(m.ratio, 3.14);
        assert_eq!(m.note, "");
        assert_eq!(m.label, "north");
        assert_eq!(m.alias, "", "second field mapped to `label` stays unset");
    }

    #[tokio::test]
    async fn unparseable_cells_leave_zero_values() {
        let (db, client) = setup().await;
        ddl(
            &db,
            "CREATE TABLE measurements (id INTEGER PRIMARY KEY, count TEXT, ratio TEXT, note TEXT, label TEXT)",
        )
        .await;
        ddl(
            &db,
            "INSERT INTO measurements (id, count, ratio, note, label) VALUES (1, 'many', 'high', 'n', 'l')",
        )
        .await;

        let m: Measurement = client.find("measurements", 1).await.unwrap();
        assert_eq!(m.count, 0);
        assert_eq!(m.ratio, 0.0);
        assert_eq!(m.note, "n");
    }

    // --- relations --------------------------------------------------------------

    #[tokio::test]
    async fn dangling_relation_is_left_at_zero() {
        let (db, client) = setup().await;
        library(&db).await;
        let book_id = client
            .create("books", &["title", "author_id"], &["Dune".into(), 77_i64.into()])
            .await
            .unwrap();

        let book: Book = client.find("books", book_id).await.unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author_id, 77);
        assert_eq!(book.author, Author::default());
    }

    #[tokio::test]
    async fn relation_fetch_errors_do_not_propagate() {
        let (db, client) = setup().await;
        ddl(
            &db,
            "CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, author_id INTEGER)",
        )
        .await;
        let book_id = client
            .create("books", &["title", "author_id"], &["Emma".into(), 1_i64.into()])
            .await
            .unwrap();

        // There is no `authors` table at all.
        let book: Book = client.find("books", book_id).await.unwrap();
        assert_eq!(book.title, "Emma");
        assert_eq!(book.author, Author::default());
    }

    #[tokio::test]
    async fn relations_are_followed_one_hop_only() {
        let (db, client) = setup().await;
        library(&db).await;
        let author_id = client
            .create("authors", &["name"], &["Herbert".into()])
            .await
            .unwrap();
        let book_id = client
            .create("books", &["title", "author_id"], &["Dune".into(), author_id.into()])
            .await
            .unwrap();
        let chapter_id = client
            .create("chapters", &["book_id"], &[book_id.into()])
            .await
            .unwrap();

        let book: Book = client.find("books", book_id).await.unwrap();
        assert_eq!(book.author.name, "Herbert");

        let chapter: Chapter = client.find("chapters", chapter_id).await.unwrap();
        assert_eq!(chapter.book.title, "Dune");
        assert_eq!(chapter.book.author_id, author_id);
        assert_eq!(chapter.book.author, Author::default());
    }

    // --- all --------------------------------------------------------------------

    #[tokio::test]
    async fn all_on_an_empty_table_is_empty() {
        let (_db, client) = setup().await;
        let users: Vec<User> = client.all("users").await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn all_materializes_every_row_with_relations() {
        let (_db, client) = setup().await;
        let staff = seed_role(&client, "staff").await;
        seed_user(&client, "Ana", "ana@example.com", Some(staff)).await;
        seed_user(&client, "Bo", "bo@example.com", None).await;

        let users: Vec<User> = client.all("users").await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Ana");
        assert_eq!(users[0].role.name, "staff");
        assert_eq!(users[1].name, "Bo");
        assert_eq!(users[1].role_id, 0);
        assert_eq!(users[1].role, Role::default());
    }

    // --- writes -----------------------------------------------------------------

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let (_db, client) = setup().await;
        let id = seed_user(&client, "Cy", "cy@example.com", None).await;
        assert!(id > 0);

        let user: User = client.find("users", id).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "Cy");
        assert_eq!(user.email, "cy@example.com");
    }

    #[tokio::test]
    async fn update_changes_only_the_named_column() {
        let (_db, client) = setup().await;
        let role = seed_role(&client, "ops").await;
        let id = seed_user(&client, "Di", "di@example.com", Some(role)).await;

        let affected = client
            .update("users", &["email"], &["di@corp.example".into()], id)
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let user: User = client.find("users", id).await.unwrap();
        assert_eq!(user.email, "di@corp.example");
        assert_eq!(user.name, "Di");
        assert_eq!(user.role_id, role);
        assert_eq!(user.role.name, "ops");
    }

    #[tokio::test]
    async fn delete_reports_rows_affected() {
        let (_db, client) = setup().await;
        let id = seed_user(&client, "Ed", "ed@example.com", None).await;

        assert_eq!(client.delete("users", id).await.unwrap(), 1);
        assert_eq!(client.delete("users", id).await.unwrap(), 0);
        assert!(matches!(
            client.find::<User>("users", id).await,
            Err(DbError::NotFound)
        ));
    }

    // --- failures ---------------------------------------------------------------

    #[tokio::test]
    async fn unsafe_identifiers_are_rejected_before_execution() {
        let (_db, client) = setup().await;
        let err = client
            .find::<User>("users` WHERE 1=1 --", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));

        let err = client
            .create("users", &["name; DROP TABLE users"], &["x".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn shape_mismatches_are_reported_before_execution() {
        let (_db, client) = setup().await;

        let err = client
            .create("users", &["name", "email"], &["only one".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ShapeMismatch(_)));

        let err = client.update("users", &[], &[], 1).await.unwrap_err();
        assert!(matches!(err, DbError::ShapeMismatch(_)));

        let err = client.all::<Unmapped>("users").await.unwrap_err();
        assert!(matches!(err, DbError::ShapeMismatch(_)));
    }

    #[tokio::test]
    async fn driver_failures_surface_as_connectivity_errors() {
        let (_db, client) = setup().await;
        let err = client.all::<User>("no_such_table").await.unwrap_err();
        assert!(matches!(err, DbError::ConnectivityError(_)));
    }
}
