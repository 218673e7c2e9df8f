use crate::{uri_not_found, ServiceState};
use axum::extract::{OriginalUri, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use galleon_api_types::storage::{StorageError, StorageProvider};
use std::sync::Arc;

/// Serves raw store blobs, so the URLs handed out by the download-urls
/// endpoints resolve against the same host.
pub async fn serve_blob(
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<ServiceState>>,
) -> Response {
    let key = uri.path().trim_start_matches('/');
    if key.is_empty() {
        return uri_not_found(&uri);
    }
    match state.storage.value(key).await {
        Ok(data) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            data,
        )
            .into_response(),
        Err(StorageError::NotFound) => uri_not_found(&uri),
        Err(e) => e.into_response(),
    }
}
