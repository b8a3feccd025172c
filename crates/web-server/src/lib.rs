use axum::{routing::get, Router};
use configuration::ServerSettings;
use core_types::{Payment, Role, Saving, User};
use database::QueryClient;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db: QueryClient,
}

/// Builds the application routes.
///
/// With `use_auth` every `/api` route except the health check requires an
/// `Authorization` header.
pub fn router(db: QueryClient, use_auth: bool) -> Router {
    let app_state = Arc::new(AppState { db });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    let mut api = Router::new()
        .route(
            "/api/users",
            get(handlers::list::<User>).post(handlers::create_user),
        )
        .route(
            "/api/users/:id",
            get(handlers::show::<User>)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/api/roles", get(handlers::list::<Role>))
        .route("/api/roles/:id", get(handlers::show::<Role>))
        .route("/api/savings", get(handlers::list::<Saving>))
        .route("/api/savings/:id", get(handlers::show::<Saving>))
        .route("/api/payments", get(handlers::list::<Payment>))
        .route("/api/payments/:id", get(handlers::show::<Payment>));

    if use_auth {
        api = api.route_layer(axum::middleware::from_fn(middleware::require_authorization));
    }

    api.route("/api/health", get(handlers::health))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves the API until `shutdown` resolves, then drains in-flight requests.
pub async fn run_server(
    settings: &ServerSettings,
    db: QueryClient,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    let app = router(db, settings.use_auth);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}
