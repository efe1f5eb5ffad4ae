/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todolist_api::{app::AppState, config::Config};
/// use todolist_shared::auth::password::Argon2Hasher;
/// use todolist_shared::clock::SystemClock;
/// use todolist_shared::notify::log::LogNotifier;
/// use todolist_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     config,
///     Arc::new(MemoryStore::new()),
///     Arc::new(LogNotifier::new()),
///     Arc::new(Argon2Hasher::default()),
///     Arc::new(SystemClock),
/// );
/// let app = todolist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use todolist_shared::{
    auth::{
        authenticator::Authenticator, context::RequestContext, jwt::TokenIssuer,
        password::PasswordHasher, verification::VerificationEngine,
    },
    clock::Clock,
    notify::Notifier,
    services::{ListService, TaskService},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,

    pub authenticator: Arc<Authenticator>,

    pub verification: Arc<VerificationEngine>,

    pub lists: Arc<ListService>,

    pub tasks: Arc<TaskService>,

    pub tokens: Arc<TokenIssuer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the domain services over the given adapters
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verification = Arc::new(
            VerificationEngine::new(store.clone(), notifier, clock)
                .with_code_ttl(Duration::minutes(config.verification.code_ttl_minutes)),
        );
        let authenticator = Arc::new(Authenticator::new(
            store.clone(),
            hasher,
            verification.clone(),
        ));
        let tokens = Arc::new(TokenIssuer::new(
            config.jwt.secret.clone(),
            Duration::seconds(config.jwt.expiration_seconds),
        ));

        Self {
            lists: Arc::new(ListService::new(store.clone())),
            tasks: Arc::new(TaskService::new(store.clone())),
            store,
            authenticator,
            verification,
            tokens,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/                       # Public
///     │   ├── POST /signup
///     │   ├── POST /login
///     │   ├── POST /verify
///     │   └── POST /resend
///     ├── /todolists/                  # Bearer token
///     │   ├── POST   /
///     │   ├── GET    /
///     │   ├── GET    /:id
///     │   ├── DELETE /:id
///     │   ├── POST   /:id/members
///     │   ├── DELETE /:id/members/:email
///     │   └── PUT    /:id/title
///     └── /tasks/                      # Bearer token
///         ├── POST   /
///         ├── GET    /?list_id=
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-router basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/verify", post(routes::auth::verify))
        .route("/resend", post(routes::auth::resend));

    let list_routes = Router::new()
        .route(
            "/",
            post(routes::lists::create_list).get(routes::lists::list_lists),
        )
        .route(
            "/:id",
            get(routes::lists::get_list).delete(routes::lists::delete_list),
        )
        .route("/:id/members", post(routes::lists::add_member))
        .route("/:id/members/:email", delete(routes::lists::remove_member))
        .route("/:id/title", put(routes::lists::update_title))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::add_task).get(routes::tasks::get_tasks),
        )
        .route(
            "/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/todolists", list_routes)
        .nest("/tasks", task_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
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
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token from the Authorization header and injects
/// the caller's [`RequestContext`] into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = state.tokens.validate(token)?;

    req.extensions_mut()
        .insert(RequestContext::from_claims(&claims));

    Ok(next.run(req).await)
}
