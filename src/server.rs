//!
//! techhub HTTP server
//! -------------------
//! This module defines the Axum-based HTTP API for TechHub.
//!
//! Responsibilities:
//! - Building the application context (store, collections, token signer, cookie policy).
//! - Session issue/clear endpoints backed by signed cookie tokens.
//! - User directory endpoints, with `GET /users` behind the admin role gate.
//! - Product and review endpoints, each a single store operation.
//! - CORS for the configured frontend origins, request tracing, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Context;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::routing::{get, patch, post, put};
use axum::Router;
use chrono::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::directory::UserDirectory;
use crate::error::{AppError, AppResult};
use crate::identity::{CookiePolicy, Role, TokenSigner};
use crate::storage::{Collection, Store};

pub mod auth;
pub mod extract;
pub mod middleware;
pub mod products;
pub mod reviews;
pub mod users;

pub const PRODUCTS: &str = "products";
pub const REVIEWS: &str = "reviews";
pub const USERS: &str = "users";

/// Shared application context injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub signer: Arc<TokenSigner>,
    pub cookies: CookiePolicy,
    pub users: UserDirectory,
    pub products: Collection,
    pub reviews: Collection,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = match &config.db_folder {
            Some(dir) => Store::open(dir, &config.db_name)
                .with_context(|| format!("While opening store under {}", dir.display()))?,
            None => {
                warn!("no database folder configured; collections are kept in memory only");
                Store::in_memory(&config.db_name)
            }
        };
        let ttl = Duration::try_days(config.token_ttl_days).context("token lifetime out of range")?;
        let signer = TokenSigner::new(config.token_secret.as_bytes(), ttl).context("While creating token signer")?;
        let users = UserDirectory::new(store.collection(USERS).context("While loading users")?);
        let products = store.collection(PRODUCTS).context("While loading products")?;
        let reviews = store.collection(REVIEWS).context("While loading reviews")?;
        Ok(Self {
            cookies: CookiePolicy::new(config.is_production()),
            config: Arc::new(config),
            store,
            signer: Arc::new(signer),
            users,
            products,
            reviews,
        })
    }
}

/// Run a store write on the blocking pool. With persistence on, a write rewrites the
/// collection file while holding the collection lock.
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(target: "store", "blocking store task failed: {}", e);
        AppError::internal("task_failed", e.to_string())
    })?
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(StdDuration::from_secs(60 * 60))
}

/// Mount every route on a router bound to `state`.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let all_users = middleware::with_role(get(users::list_users), &state, Role::Admin);

    Router::new()
        .route("/", get(auth::root))
        // session
        .route("/jwt", post(auth::issue_token))
        .route("/logout", get(auth::logout))
        // users
        .route("/user", put(users::upsert_user))
        .route("/user/{email}", get(users::get_user))
        .route("/users", all_users)
        .route("/users/update/{email}", patch(users::update_user))
        // products
        .route("/feature-product", get(products::featured))
        .route("/trend-product", get(products::trending))
        .route("/product-details/{id}", get(products::details))
        .route("/search", get(products::search))
        .route("/add-product", post(products::add_product))
        // GET takes an owner email, DELETE a product id
        .route("/my-product/{key}", get(products::my_products).delete(products::delete_product))
        // reviews
        .route("/reviews", get(reviews::list_reviews))
        .route("/addReviews", post(reviews::add_review))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build state from `config`, bind the listener and serve until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let port = config.port;
    let state = AppState::new(config)?;
    info!(
        target: "startup",
        "TechHub starting: db='{}', persistent={}, production={}, origins={:?}",
        state.store.db_name(),
        state.store.is_persistent(),
        state.cookies.production,
        state.config.allowed_origins
    );

    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("While binding {}", addr))?;
    info!("TechHub server is running on port: {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("TechHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
