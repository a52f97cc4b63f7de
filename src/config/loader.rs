use config::{Config, Environment, File};
use serde::Deserialize;

use crate::config::bank::BankDisplayConfig;
use crate::config::cooperative::CooperativeConfig;
use crate::config::server::ServerConfig;
use crate::config::store::StoreConfig;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub cooperative: CooperativeConfig,
    pub bank: BankDisplayConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("COOPLEDGER").separator("__"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}
