use axum::Router;
use galleon_api_types::storage::{Bytes, SharedStorage, StorageProvider};
use galleon_index::paths;
use galleon_server::{router, ServiceConfig};
use galleon_storage::mem::MemStorageProvider;
use std::sync::Arc;

pub const ZLIB: &str = "zlib/1.2.11/_/_";
pub const ZLIB_HASH: &str = "6af9cc7cb931c5ad942174fd7838eb655717c709";

/// md5("abc"), the content every non-INI fixture file carries.
pub const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

pub const CONANINFO: &str = "\
[settings]
    arch=x86_64
    build_type=Release
    compiler=gcc
    compiler.version=9
    os=Linux

[requires]

[options]
    shared=False

[full_settings]
    arch=x86_64
    os=Linux

[full_requires]

[full_options]
    shared=False

[recipe_hash]
    75d0ac22ef58c7b06e9970dbcdbbcc62

[env]
";

pub fn service_config() -> ServiceConfig {
    ServiceConfig {
        address: "127.0.0.1:8000".parse().unwrap(),
        metrics_address: "127.0.0.1:9000".parse().unwrap(),
    }
}

pub async fn seeded_storage() -> SharedStorage {
    let storage: SharedStorage = Arc::new(MemStorageProvider::default());
    for file in paths::RECIPE_FILES {
        storage
            .save(&paths::recipe_file(ZLIB, 0, file), Bytes::from_static(b"abc"))
            .await
            .unwrap();
    }
    let dir = paths::binary_dir(ZLIB, 0, ZLIB_HASH);
    for file in paths::PACKAGE_FILES {
        let content = if file == paths::INFO_FILE {
            Bytes::from_static(CONANINFO.as_bytes())
        } else {
            Bytes::from_static(b"abc")
        };
        storage
            .save(&paths::binary_file(&dir, 0, file), content)
            .await
            .unwrap();
    }
    storage
}

pub async fn seeded_router() -> Router {
    router(service_config(), seeded_storage().await)
}

pub fn empty_router() -> Router {
    let storage: SharedStorage = Arc::new(MemStorageProvider::default());
    router(service_config(), storage)
}
