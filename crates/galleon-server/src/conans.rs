//! Conan `/v1` REST endpoints.
//!
//! Conan recognizes two kinds of artifacts: package recipes (sources)
//! and package binaries, one per build configuration. The v1 protocol
//! pins the revision subdirectory to `0`, so every response here is a
//! pure function of the store contents under that layout.

use crate::ini::IniDoc;
use crate::{uri_not_found, ServiceState};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::future::try_join_all;
use galleon_api_types::index::RecipeSearchResults;
use galleon_api_types::storage::{StorageProvider, StorageResult};
use galleon_index::paths;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Pinned revision subdirectory of the v1 path layout.
const V1_REVISION: i64 = 0;

/// Marker of recipe exports under the pinned revision.
const RECIPE_EXPORT_MARKER: &str = "/0/export/";

/// User/channel placeholder pair in package coordinates.
const NO_USER_CHANNEL: &str = "/_/_";

type Coordinate = (String, String, String, String);

pub fn conans_router() -> Router<Arc<ServiceState>> {
    Router::new()
        .route("/search", get(search_recipes))
        .route(
            "/conans/:name/:version/:user/:channel/download_urls",
            get(recipe_download_urls),
        )
        .route(
            "/conans/:name/:version/:user/:channel/search",
            get(search_binaries),
        )
        .route(
            "/conans/:name/:version/:user/:channel/packages/:hash",
            get(package_info),
        )
        .route(
            "/conans/:name/:version/:user/:channel/packages/:hash/download_urls",
            get(binary_download_urls),
        )
        .fallback(handle_conans_fallback)
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

async fn recipe_download_urls(
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<ServiceState>>,
    Path((name, version, user, channel)): Path<Coordinate>,
) -> axum::response::Result<Response> {
    let pkg = coordinate(&name, &version, &user, &channel);
    let host = host_of(&headers)?;
    let keys: Vec<String> = paths::RECIPE_FILES
        .iter()
        .map(|file| paths::recipe_file(&pkg, V1_REVISION, file))
        .collect();

    let urls = probe_urls(&*state.storage, host, &paths::RECIPE_FILES, &keys).await?;
    if urls.is_empty() {
        return Ok(uri_not_found(&uri));
    }
    Ok(Json(Value::Object(urls)).into_response())
}

async fn binary_download_urls(
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<ServiceState>>,
    Path((name, version, user, channel, hash)): Path<(String, String, String, String, String)>,
) -> axum::response::Result<Response> {
    let pkg = coordinate(&name, &version, &user, &channel);
    let host = host_of(&headers)?;
    let dir = paths::binary_dir(&pkg, V1_REVISION, &hash);
    let keys: Vec<String> = paths::PACKAGE_FILES
        .iter()
        .map(|file| paths::binary_file(&dir, V1_REVISION, file))
        .collect();

    let urls = probe_urls(&*state.storage, host, &paths::PACKAGE_FILES, &keys).await?;
    if urls.is_empty() {
        return Ok(uri_not_found(&uri));
    }
    Ok(Json(Value::Object(urls)).into_response())
}

/// MD5 digests of the binary files present for one package hash.
async fn package_info(
    OriginalUri(uri): OriginalUri,
    State(state): State<Arc<ServiceState>>,
    Path((name, version, user, channel, hash)): Path<(String, String, String, String, String)>,
) -> axum::response::Result<Response> {
    let pkg = coordinate(&name, &version, &user, &channel);
    let dir = paths::binary_dir(&pkg, V1_REVISION, &hash);

    let digests = try_join_all(paths::PACKAGE_FILES.iter().map(|file| {
        let key = paths::binary_file(&dir, V1_REVISION, file);
        let storage = &state.storage;
        async move {
            let digest = file_digest(&**storage, &key).await?;
            Ok::<_, galleon_api_types::storage::StorageError>((*file, digest))
        }
    }))
    .await?;

    let mut info = Map::new();
    for (file, digest) in digests {
        if let Some(digest) = digest {
            info.insert(file.to_owned(), Value::String(digest));
        }
    }
    if info.is_empty() {
        return Ok(uri_not_found(&uri));
    }
    Ok(Json(Value::Object(info)).into_response())
}

/// Settings/options of the first binary found under the package, keyed
/// by its hash, parsed out of `conaninfo.txt`.
async fn search_binaries(
    State(state): State<Arc<ServiceState>>,
    Path((name, version, user, channel)): Path<Coordinate>,
) -> axum::response::Result<Response> {
    let pkg = coordinate(&name, &version, &user, &channel);
    let bin_root = paths::packages_dir(&pkg, V1_REVISION);
    let keys = state.storage.list(&bin_root).await?;

    let Some(info_key) = keys.iter().find(|key| key.ends_with(paths::INFO_FILE)) else {
        return Ok((
            StatusCode::OK,
            format!("Package binaries not found: {bin_root}/"),
        )
            .into_response());
    };

    let hash = paths::next_segment(&bin_root, info_key).to_owned();
    let data = state.storage.value(info_key).await?;
    let doc = IniDoc::parse(&String::from_utf8_lossy(&data));

    let mut package = Map::new();
    for (section, entries) in doc.sections() {
        let mut fields = Map::new();
        for (key, value) in entries {
            if let Some(value) = value {
                fields.insert(key.clone(), Value::String(value.clone()));
            }
        }
        package.insert(section.clone(), Value::Object(fields));
    }
    // Conan stores the recipe hash as a bare key of its own section
    if let Some(entries) = doc.section("recipe_hash") {
        if let Some((first, _)) = entries.first() {
            package.insert("recipe_hash".to_owned(), Value::String(first.clone()));
        }
    }

    let mut body = Map::new();
    body.insert(hash, Value::Object(package));
    Ok(Json(Value::Object(body)).into_response())
}

/// Substring search over package coordinates derived from recipe
/// export keys.
async fn search_recipes(
    State(state): State<Arc<ServiceState>>,
    Query(query): Query<SearchQuery>,
) -> axum::response::Result<Json<RecipeSearchResults>> {
    let keys = state.storage.list("").await?;
    let mut results = BTreeSet::new();
    for key in &keys {
        let Some(start) = key.find(RECIPE_EXPORT_MARKER) else {
            continue;
        };
        if start == 0 {
            continue;
        }
        let mut recipe = &key[..start];
        if let Some(extra) = recipe.find(NO_USER_CHANNEL) {
            recipe = &key[..extra];
        }
        if recipe.contains(&query.q) {
            results.insert(recipe.to_owned());
        }
    }
    Ok(Json(RecipeSearchResults {
        results: results.into_iter().collect(),
    }))
}

async fn handle_conans_fallback() -> (StatusCode, &'static str) {
    (
        StatusCode::NOT_FOUND,
        "Galleon: Invalid URL for the Conan v1 endpoint",
    )
}

fn coordinate(name: &str, version: &str, user: &str, channel: &str) -> String {
    format!("{name}/{version}/{user}/{channel}")
}

fn host_of(headers: &HeaderMap) -> axum::response::Result<&str> {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Missing Host header").into())
}

/// One `"<file>": "http://<host>/<key>"` entry per file that exists.
async fn probe_urls(
    storage: &(dyn StorageProvider + Send + Sync),
    host: &str,
    files: &[&str],
    keys: &[String],
) -> StorageResult<Map<String, Value>> {
    let present = try_join_all(keys.iter().map(|key| storage.exists(key))).await?;
    let mut urls = Map::new();
    for ((file, key), exists) in files.iter().zip(keys).zip(present) {
        if exists {
            urls.insert(
                (*file).to_owned(),
                Value::String(format!("http://{host}/{key}")),
            );
        }
    }
    Ok(urls)
}

async fn file_digest(
    storage: &(dyn StorageProvider + Send + Sync),
    key: &str,
) -> StorageResult<Option<String>> {
    if !storage.exists(key).await? {
        return Ok(None);
    }
    let data = storage.value(key).await?;
    Ok(Some(unpadded_md5(&data)))
}

/// MD5 rendered as unpadded big-integer hex, the format conan_server
/// hands v1 clients.
fn unpadded_md5(data: &[u8]) -> String {
    let rendered = format!("{:x}", md5::compute(data));
    let trimmed = rendered.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}
