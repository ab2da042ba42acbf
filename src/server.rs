//! HTTP service behind `folio serve`.
//!
//! ```text
//! POST    /api/save_vote       {itemId, rating} → {success, newAverage, newCount}
//! OPTIONS /api/save_vote       preflight, 200
//! GET     /data/portfolio.json item collection
//! GET     /data/blog.json      blog posts
//! GET     /healthz             "ok"
//! ```
//!
//! Errors are JSON `{error}` bodies. `/api` requests are counted against a
//! per-client budget (see [`RateLimiter`]); the client is the first
//! `X-Forwarded-For` hop when present, otherwise the socket address.

use crate::config::{SiteConfig, VotesConfig};
use crate::rate_limit::RateLimiter;
use crate::votes::{VoteError, VoteRequest, VoteResponse, VoteStore};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a request handler needs.
#[derive(Debug)]
pub struct AppState {
    config: SiteConfig,
    root: PathBuf,
    votes: VoteStore,
    limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: SiteConfig, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let votes = VoteStore::new(root.join(&config.data.portfolio), config.votes.bounds());
        let limiter = RateLimiter::new(&config.votes.rate_limit);
        Self {
            config,
            root,
            votes,
            limiter,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Unsupported Media Type")]
    UnsupportedMediaType,
    #[error("Invalid request data: {reason}")]
    InvalidRequest { reason: String, min: u8, max: u8 },
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests, please try again later.")]
    RateLimited,
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn from_vote(err: VoteError, bounds: &VotesConfig) -> Self {
        match err {
            VoteError::InvalidRequest(reason) => ApiError::InvalidRequest {
                reason,
                min: bounds.min_rating,
                max: bounds.max_rating,
            },
            VoteError::NotFound(_) => ApiError::NotFound("Item not found".into()),
            VoteError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::InvalidRequest { reason, min, max } => json!({
                "error": "Invalid request data",
                "details": reason,
                "required": {
                    "itemId": "string",
                    "rating": format!("number ({min}-{max})"),
                },
            }),
            ApiError::Internal(details) => {
                error!(%details, "request failed");
                json!({ "error": "Internal server error", "details": details })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router with CORS and rate limiting installed.
pub fn router(state: AppState) -> Router {
    routes(Arc::new(state))
}

fn routes(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.allow_origin);

    let api = Router::new()
        .route(
            "/api/save_vote",
            post(save_vote)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(api)
        .route("/data/portfolio.json", get(portfolio_data))
        .route("/data/blog.json", get(blog_data))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    if allow_origin == "*" {
        return cors.allow_origin(AllowOrigin::any());
    }
    match HeaderValue::from_str(allow_origin) {
        Ok(origin) => cors.allow_origin(AllowOrigin::exact(origin)),
        Err(_) => {
            warn!(allow_origin, "unusable allow_origin, cross-origin requests will be refused");
            cors
        }
    }
}

/// Client identity for rate limiting.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

async fn rate_limit(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);
    if !state.limiter.check(&key, Instant::now()) {
        warn!(client = %key, "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

async fn save_vote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VoteResponse>, ApiError> {
    if !is_json(&headers) {
        return Err(ApiError::UnsupportedMediaType);
    }
    let bounds = &state.config.votes;
    let request = VoteRequest::parse(&body, bounds.min_rating, bounds.max_rating)
        .map_err(|e| ApiError::from_vote(e, bounds))?;

    let worker = state.clone();
    let vote = request.clone();
    let updated = tokio::task::spawn_blocking(move || worker.votes.record(&vote))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::from_vote(e, bounds))?;

    info!(
        item = %request.item_id,
        rating = request.rating,
        average = updated.average,
        count = updated.count,
        "vote recorded"
    );
    Ok(Json(updated.into()))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn portfolio_data(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    json_file(&state.root.join(&state.config.data.portfolio)).await
}

async fn blog_data(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    json_file(&state.root.join(&state.config.data.blog)).await
}

async fn json_file(path: &Path) -> Result<Response, ApiError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes = bytes.len(), "serving collection");
            Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("Collection not found".into()))
        }
        Err(e) => Err(ApiError::Internal(format!("{}: {e}", path.display()))),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Bind, serve until Ctrl+C or SIGTERM, then drain in-flight requests.
pub async fn serve(config: SiteConfig, root: PathBuf) -> Result<(), ServeError> {
    let bind = config.server.bind.clone();
    let port = config.server.port;
    let window = Duration::from_secs(config.votes.rate_limit.window_secs);

    let state = Arc::new(AppState::new(config, root));
    info!(
        collection = %state.votes.path().display(),
        "initializing state"
    );
    let app = routes(state.clone());

    // Expired client windows would otherwise accumulate for the process lifetime
    let pruned = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window);
        loop {
            ticker.tick().await;
            pruned.limiter.prune(Instant::now());
        }
    });

    let listener = TcpListener::bind((bind.as_str(), port)).await?;
    info!("server running on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let peer = "127.0.0.1:5000".parse().ok();
        assert_eq!(client_key(&headers, peer), "203.0.113.7");
    }

    #[test]
    fn client_key_falls_back_to_peer_ip() {
        let peer = "192.0.2.1:5000".parse().ok();
        assert_eq!(client_key(&HeaderMap::new(), peer), "192.0.2.1");
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn json_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            "Application/JSON; charset=utf-8".parse().unwrap(),
        );
        assert!(is_json(&headers));
    }

    #[test]
    fn api_error_statuses() {
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        let err = ApiError::from_vote(
            VoteError::NotFound("x".into()),
            &VotesConfig::default(),
        );
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err = ApiError::from_vote(
            VoteError::InvalidRequest("rating is required".into()),
            &VotesConfig::default(),
        );
        assert!(matches!(err, ApiError::InvalidRequest { min: 1, max: 5, .. }));
    }
}
