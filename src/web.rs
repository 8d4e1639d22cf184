use crate::browser::Trigger;
use crate::service::{BrowserHandle, ServiceError, Snapshot};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: BrowserHandle,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig, catalog: BrowserHandle) -> Result<(), WebError> {
    let state = Arc::new(AppState { catalog });
    let router = build_router(state);
    info!(%config.addr, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::unavailable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/entries", get(api_entries))
        .route("/api/query", post(api_query))
        .route("/api/load-more", post(api_load_more))
        .route("/api/status", get(api_status))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "pokedex-web" }))
}

/// The query is shared by every client of the session; an empty string
/// clears it.
#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
}

/// Status fields without the entry list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatusPayload {
    query: String,
    loading: bool,
    exhausted: bool,
    total: Option<u64>,
    loaded: usize,
    visible: usize,
    pending: usize,
}

impl From<&Snapshot> for StatusPayload {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            query: snapshot.query.clone(),
            loading: snapshot.loading,
            exhausted: snapshot.exhausted,
            total: snapshot.total,
            loaded: snapshot.loaded,
            visible: snapshot.entries.len(),
            pending: snapshot.pending,
        }
    }
}

async fn api_entries(State(state): State<SharedState>) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.catalog.snapshot().await?))
}

async fn api_query(
    State(state): State<SharedState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.catalog.set_query(request.query).await?))
}

async fn api_load_more(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let trigger = state.catalog.load_more().await?;
    let status = match trigger {
        Trigger::Started => StatusCode::ACCEPTED,
        Trigger::AlreadyLoading | Trigger::Exhausted => StatusCode::OK,
    };
    Ok((status, Json(json!({ "trigger": trigger }))).into_response())
}

async fn api_status(State(state): State<SharedState>) -> Result<Json<StatusPayload>, ApiError> {
    let snapshot = state.catalog.snapshot().await?;
    Ok(Json(StatusPayload::from(&snapshot)))
}

#[cfg(all(test, feature = "web"))]
mod tests {
    use super::*;
    use crate::browser::CatalogBrowser;
    use crate::service;
    use crate::source::testing::MemorySource;
    use crate::translate::TranslationTables;
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt;

    const FIRST: &str = "mem://pokemon?limit=2";
    const SECOND: &str = "mem://pokemon?offset=2&limit=2";

    async fn test_router() -> Router {
        let source = MemorySource::new()
            .page(FIRST, Some(SECOND), &["bulbasaur", "charmander"])
            .page(SECOND, None, &["squirtle"])
            .record("bulbasaur", 1, Some("grass"))
            .record("charmander", 4, Some("fire"))
            .record("squirtle", 7, Some("water"));
        let catalog = service::spawn(CatalogBrowser::new(
            Arc::new(source),
            Arc::new(TranslationTables::embedded().clone()),
            FIRST,
        ));
        catalog.wait_idle().await.unwrap();
        build_router(Arc::new(AppState { catalog }))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_ok() {
        let router = test_router().await;
        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    fn post_query(query: &str) -> Request<Body> {
        Request::post("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "query": query }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn query_filters_entries() {
        let router = test_router().await;
        let response = router.oneshot(post_query("char")).await.unwrap();
        assert!(response.status().is_success());
        let payload = json_body(response).await;
        assert_eq!(payload["query"], "char");
        let entries = payload["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], 4);
        assert_eq!(entries[0]["localizedName"], "ヒトカゲ");
    }

    #[tokio::test]
    async fn listing_entries_leaves_the_query_alone() {
        let router = test_router().await;
        router.clone().oneshot(post_query("ダネ")).await.unwrap();
        let response = router
            .clone()
            .oneshot(
                Request::get("/api/entries?q=char")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let payload = json_body(response).await;
        assert_eq!(payload["query"], "ダネ");
        assert_eq!(payload["entries"].as_array().unwrap().len(), 1);
        assert_eq!(payload["entries"][0]["id"], 1);

        let response = router.oneshot(post_query("")).await.unwrap();
        let payload = json_body(response).await;
        assert_eq!(payload["entries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn load_more_then_status() {
        let router = test_router().await;
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/load-more")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let payload = json_body(response).await;
        assert_eq!(payload["trigger"], "started");

        let response = router
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status: StatusPayload =
            serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(status.total, Some(151));
        assert!(status.loaded >= 2);
    }
}
