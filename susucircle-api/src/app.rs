/// Application state and router builder
///
/// This module defines the shared application state and provides a
/// function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use susucircle_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let identity = susucircle_api::app::build_identity_provider(&config.identity)?;
/// let state = AppState::new(pool, config, identity);
/// let app = susucircle_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::{Config, IdentityConfig, IdentityMode};
use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use susucircle_shared::auth::identity::{
    IdentityProvider, JwtIdentityProvider, RemoteIdentityProvider,
};
use susucircle_shared::auth::middleware::{authenticate, bearer_token, AuthError};
use susucircle_shared::groups::{InvitationManager, LifecycleEngine, MembershipManager};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Injected identity-provider adapter
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            identity,
        }
    }

    /// The lifecycle engine over this state's pool
    pub fn lifecycle(&self) -> LifecycleEngine {
        LifecycleEngine::new(self.db.clone())
    }

    /// The membership manager over this state's pool
    pub fn memberships(&self) -> MembershipManager {
        MembershipManager::new(self.db.clone())
    }

    /// The invitation manager over this state's pool
    pub fn invitations(&self) -> InvitationManager {
        InvitationManager::new(self.db.clone())
    }
}

/// Builds the configured identity-provider adapter
pub fn build_identity_provider(
    config: &IdentityConfig,
) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    match config.mode {
        IdentityMode::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("jwt mode requires IDENTITY_JWT_SECRET"))?;
            Ok(Arc::new(JwtIdentityProvider::new(
                secret,
                config.jwt_issuer.as_deref(),
            )))
        }
        IdentityMode::Remote => {
            let url = config
                .userinfo_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("remote mode requires IDENTITY_USERINFO_URL"))?;
            Ok(Arc::new(RemoteIdentityProvider::new(url)))
        }
    }
}

/// The authentication stage for protected routes
///
/// Resolves the bearer credential through the injected identity provider,
/// looks up the local account, and inserts the resulting `AuthContext`
/// extension for handlers to consume.
async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let credential = bearer_token(req.headers())?.to_string();
    let auth = authenticate(&state.db, state.identity.as_ref(), &credential).await?;

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// └── /v1/                                 # API v1 (versioned)
///     ├── /auth/register, /auth/login      # Credential exchange (public)
///     ├── /me                              # Profile (authenticated)
///     ├── /groups ...                      # Group lifecycle + membership
///     ├── /invitations ...                 # Invitation issue/redeem/cancel
///     └── /groups/:id/contributions ...    # Ledger operations
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (protected subtree only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public: health check and the credential-exchange endpoints, which
    // resolve the provider credential themselves.
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/v1/auth/register", post(routes::auth::register))
        .route("/v1/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/v1/me",
            get(routes::auth::me).patch(routes::auth::update_me),
        )
        .route(
            "/v1/groups",
            post(routes::groups::create_group).get(routes::groups::my_groups),
        )
        .route(
            "/v1/groups/:group_id",
            get(routes::groups::view_group).delete(routes::groups::delete_group),
        )
        .route("/v1/groups/:group_id/join", post(routes::groups::join_group))
        .route(
            "/v1/groups/:group_id/leave",
            post(routes::groups::leave_group),
        )
        .route(
            "/v1/groups/:group_id/members/:user_id",
            delete(routes::groups::remove_member),
        )
        .route(
            "/v1/groups/:group_id/invitations",
            post(routes::invitations::create_invitation)
                .get(routes::invitations::list_invitations),
        )
        .route(
            "/v1/invitations/redeem",
            post(routes::invitations::redeem_invitation),
        )
        .route(
            "/v1/invitations/:invitation_id/cancel",
            post(routes::invitations::cancel_invitation),
        )
        .route(
            "/v1/groups/:group_id/contributions",
            post(routes::payments::record_contribution),
        )
        .route(
            "/v1/groups/:group_id/settle",
            post(routes::payments::settle_group),
        )
        .route(
            "/v1/groups/:group_id/ledger",
            get(routes::payments::group_ledger),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
