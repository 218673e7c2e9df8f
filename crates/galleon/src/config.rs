use galleon_server::ServiceConfig;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(flatten)]
    pub storage: galleon_storage::Config,
}
