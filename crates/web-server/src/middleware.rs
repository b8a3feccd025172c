use crate::error::AppError;
use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Rejects requests that carry no `Authorization` header. The token itself is
/// not verified.
pub async fn require_authorization(request: Request, next: Next) -> Response {
    let present = request
        .headers()
        .get(AUTHORIZATION)
        .is_some_and(|value| !value.is_empty());

    if !present {
        tracing::debug!(path = %request.uri().path(), "request without Authorization header");
        return AppError::Unauthorized.into_response();
    }
    next.run(request).await
}
