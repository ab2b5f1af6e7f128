use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, io};

use curtain_api::CurtainRule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub edge_host: String,
    pub edge_port: u16,
    pub reconnect_delay_ms: u64,
    /// Append-only audit trail of received statuses
    pub status_log: String,
}

impl Cloud {
    pub fn edge_address(&self) -> String {
        format!("{}:{}", self.edge_host, self.edge_port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub cloud: Cloud,
    /// Rule pushed on startup, before any console edits
    pub rule: CurtainRule,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))
    }

    pub fn from_toml(source: &str) -> Result<Self, Box<dyn Error>> {
        let mut settings: Settings = toml::from_str(source)?;

        settings.cloud.status_log = Self::normalize_path(&settings.cloud.status_log)?
            .to_string_lossy()
            .to_string();

        Ok(settings)
    }

    fn normalize_path(path: &str) -> io::Result<PathBuf> {
        let path_buf = PathBuf::from(path);

        Ok(if path_buf.is_absolute() {
            path_buf
        } else {
            env::current_dir()?.as_path().join(&path_buf)
        })
    }
}
