use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::broadcast::{BroadcastConfig, EncoderSettings};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub broadcast: BroadcastSection,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastSection {
    /// Directory that holds `live/` (segment output) and `ffmpeg/` (encoder binary)
    pub web_root: PathBuf,
    /// Explicit encoder binary; defaults to `<web_root>/ffmpeg/ffmpeg`
    pub encoder_path: Option<PathBuf>,
    /// Grace period for the encoder to exit after stdin is closed
    pub stop_timeout_ms: u64,
    #[serde(default)]
    pub encoder: EncoderSettings,
}

impl BroadcastSection {
    /// Resolve the section into the session manager's configuration
    pub fn to_broadcast_config(&self) -> BroadcastConfig {
        let mut cfg = BroadcastConfig::from_web_root(&self.web_root);
        if let Some(path) = &self.encoder_path {
            cfg.encoder_path = path.clone();
        }
        cfg.stop_timeout = Duration::from_millis(self.stop_timeout_ms);
        cfg.encoder = self.encoder.clone();
        cfg
    }
}

impl Config {
    /// Load configuration from an optional file plus `LIVE_BROADCAST__*` env vars.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "live-broadcast")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8080)?
            .set_default("broadcast.web_root", "wwwroot")?
            .set_default("broadcast.stop_timeout_ms", 2000)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LIVE_BROADCAST").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
