use crate::{error::AppError, response::ApiResponse, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use core_types::{Payment, Record, Role, Saving, User, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A record type served under `/api/<TABLE>`.
pub trait Resource: Record + Serialize {
    const TABLE: &'static str;
    /// Capitalized singular name used in error messages.
    const NAME: &'static str;
}

impl Resource for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";
}

impl Resource for Role {
    const TABLE: &'static str = "roles";
    const NAME: &'static str = "Role";
}

impl Resource for Saving {
    const TABLE: &'static str = "savings";
    const NAME: &'static str = "Saving";
}

impl Resource for Payment {
    const TABLE: &'static str = "payments";
    const NAME: &'static str = "Payment";
}

fn parse_id<R: Resource>(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", R::NAME.to_lowercase())))
}

/// # GET /api/health
pub async fn health() -> ApiResponse<()> {
    ApiResponse::message("OK")
}

/// # GET /api/<table>
pub async fn list<R: Resource>(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<R>>, AppError> {
    let records = state.db.all::<R>(R::TABLE).await?;
    Ok(ApiResponse::ok(records))
}

/// # GET /api/<table>/:id
pub async fn show<R: Resource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<R>, AppError> {
    let id = parse_id::<R>(&id)?;
    let record = state
        .db
        .find::<R>(R::TABLE, id)
        .await
        .map_err(|e| AppError::lookup(e, R::NAME))?;
    Ok(ApiResponse::ok(record))
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_id: Option<i64>,
}

/// Every field is optional; only the ones present are written.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<i64>,
}

impl UpdateUser {
    fn into_assignments(self) -> (Vec<&'static str>, Vec<Value>) {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        if let Some(name) = self.name {
            columns.push("name");
            values.push(Value::from(name));
        }
        if let Some(email) = self.email {
            columns.push("email");
            values.push(Value::from(email));
        }
        if let Some(role_id) = self.role_id {
            columns.push("role_id");
            values.push(Value::from(role_id));
        }
        (columns, values)
    }
}

/// # POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<ApiResponse<User>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected user payload");
        AppError::BadRequest("Invalid request".to_string())
    })?;

    let id = state
        .db
        .create(
            User::TABLE,
            &["name", "email", "role_id"],
            &[
                payload.name.into(),
                payload.email.into(),
                payload.role_id.into(),
            ],
        )
        .await?;
    tracing::info!(id, "User created.");

    let user = state.db.find::<User>(User::TABLE, id).await?;
    Ok(ApiResponse::created(user, "User created"))
}

/// # PUT /api/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> Result<ApiResponse<User>, AppError> {
    let id = parse_id::<User>(&id)?;
    let Json(payload) = payload.map_err(|_| AppError::BadRequest("Invalid request".to_string()))?;

    let (columns, values) = payload.into_assignments();
    state.db.update(User::TABLE, &columns, &values, id).await?;

    // MySQL counts changed rows only, so existence is checked with a read.
    let user = state
        .db
        .find::<User>(User::TABLE, id)
        .await
        .map_err(|e| AppError::lookup(e, User::NAME))?;
    Ok(ApiResponse::ok(user))
}

/// # DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let id = parse_id::<User>(&id)?;
    if state.db.delete(User::TABLE, id).await? == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(ApiResponse::message("User deleted"))
}
