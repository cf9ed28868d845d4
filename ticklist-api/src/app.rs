/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use ticklist_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = ticklist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::middleware::security::SecurityHeadersLayer;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use ticklist_shared::auth::middleware::bearer_auth_layer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Holds the
/// only two pieces of process-wide state: the connection pool and the
/// immutable configuration. There is deliberately no session store and no
/// per-user cache; each request is reconstructible from its token plus the
/// database.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                  # Health check (public)
/// ├── /auth/
/// │   ├── POST /register       # Public
/// │   ├── POST /login          # Public
/// │   ├── GET  /me             # Bearer token required
/// │   └── POST /logout         # Bearer token required
/// ├── /tasks                   # Bearer token required
/// │   ├── GET    /             # List (filter + pagination)
/// │   ├── POST   /             # Create
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   └── DELETE /:id
/// └── /chat                    # Bearer token required
///     ├── POST /               # Send an instruction
///     └── GET  /:conversation_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-group, before any handler runs)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = axum::middleware::from_fn(bearer_auth_layer(state.jwt_secret().to_string()));

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Auth endpoints that require a verified token
    let auth_protected = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/logout", post(routes::auth::logout))
        .layer(auth_layer.clone());

    // Task CRUD (every route verified before the handler runs)
    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(auth_layer.clone());

    // Chat surface: the agent is just another authenticated client
    let chat_routes = Router::new()
        .route("/", post(routes::chat::send_message))
        .route("/:conversation_id", get(routes::chat::get_conversation))
        .layer(auth_layer);

    let cors = build_cors_layer(&state.config);

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/tasks", task_routes)
        .nest("/chat", chat_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Configures CORS based on the configured origins
fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    }
}
