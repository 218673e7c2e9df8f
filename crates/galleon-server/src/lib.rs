use axum::extract::{MatchedPath, Request, State};
use axum::http::{StatusCode, Uri};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use galleon_api_types::storage::{SharedStorage, StorageProvider};
use metrics::{counter, histogram};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::StatusInRangeAsFailures;
use tower_http::trace::{DefaultOnFailure, TraceLayer};

pub mod conans;

pub mod downloads;

pub mod ini;

#[derive(Clone, Deserialize)]
pub struct ServiceConfig {
    pub address: SocketAddr,
    pub metrics_address: SocketAddr,
}

pub struct ServiceState {
    pub config: ServiceConfig,
    pub storage: SharedStorage,
}

pub fn router(config: ServiceConfig, storage: SharedStorage) -> Router {
    let state = Arc::new(ServiceState { config, storage });

    Router::new()
        .nest("/v1", conans::conans_router())
        .route("/healthcheck", get(healthcheck))
        .fallback_service(get(downloads::serve_blob).with_state(Arc::clone(&state)))
        .with_state(state)
        .layer(CatchPanicLayer::custom(|_: Box<dyn std::any::Any + Send>| {
            counter!("galleon_panics_total").increment(1);

            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }))
        .layer(
            TraceLayer::new(StatusInRangeAsFailures::new(400..=599).into_make_classifier())
                .make_span_with(|request: &Request| {
                    let method = request.method();
                    let uri = request.uri();

                    tracing::info_span!("http-request", ?method, ?uri)
                })
                .on_failure(DefaultOnFailure::new()),
        )
        .layer(from_fn(metrics_layer))
}

async fn metrics_layer(request: Request, next: Next) -> Response {
    let timer = Instant::now();

    let path = if let Some(path) = request.extensions().get::<MatchedPath>() {
        path.as_str().to_string()
    } else {
        request.uri().path().to_string()
    };

    let response = next.run(request).await;

    let elapsed = timer.elapsed();

    let code = response.status().as_u16().to_string();

    histogram!("request_duration_seconds", "code" => code, "endpoint" => path).record(elapsed);

    response
}

async fn healthcheck(State(state): State<Arc<ServiceState>>) -> axum::response::Result<String> {
    let check_time = Duration::from_secs(4);
    // healthcheck is unauthenticated and shouldn't leak internals via errors
    match timeout(check_time, state.storage.healthcheck()).await {
        Ok(Ok(())) => Ok("OK".into()),
        Ok(Err(e)) => {
            for cause in e.chain() {
                tracing::error!("storage healthcheck: {cause}");
            }
            Err((StatusCode::INTERNAL_SERVER_ERROR, "storage failed").into())
        }
        Err(_) => Err((StatusCode::INTERNAL_SERVER_ERROR, "storage timed out").into()),
    }
}

/// The 404 shape the Conan client expects on a missing resource.
pub(crate) fn uri_not_found(uri: &Uri) -> Response {
    (StatusCode::NOT_FOUND, format!("URI {uri} not found.")).into_response()
}
