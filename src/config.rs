// src/config.rs
use thiserror::Error;

pub const DEFAULT_BACKUP_STREAM: &str =
    "http://storage.googleapis.com/testtopbox-public/video_content/bbb/master.m3u8";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub db_url: String,
    pub admin_token: String,
    pub backup_stream_url: String,
    pub relay_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match get("DAI_BRIDGE_PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "DAI_BRIDGE_PORT", value: v })?,
            None => 8080,
        };
        let relay_capacity = match get("DAI_BRIDGE_RELAY_CAPACITY") {
            Some(v) => v
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or(ConfigError::Invalid { name: "DAI_BRIDGE_RELAY_CAPACITY", value: v })?,
            None => 64,
        };

        Ok(Self {
            port,
            db_url: get("DAI_BRIDGE_DB").unwrap_or_else(|| "sqlite://dai-bridge.db".to_string()),
            admin_token: get("DAI_BRIDGE_ADMIN_TOKEN").unwrap_or_else(|| "dev-token".to_string()),
            backup_stream_url: get("DAI_BRIDGE_BACKUP_STREAM")
                .unwrap_or_else(|| DEFAULT_BACKUP_STREAM.to_string()),
            relay_capacity,
        })
    }
}
