use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub interval_ms: u64,
    pub min_value: i32,
    pub max_value: i32,
    pub initial_value: i32,
    /// Upper bound (exclusive) of the per-tick random delta
    pub max_step: i32,
}

impl Sensor {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            min_value: 100,
            max_value: 1000,
            initial_value: 500,
            max_step: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actuator {
    pub latency_ms: u64,
}

impl Actuator {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for Actuator {
    fn default() -> Self {
        Self { latency_ms: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub sensor: Sensor,
    pub actuator: Actuator,
    pub gateway: Gateway,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("CURTAIN").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Rejects values the sensing unit cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.interval_ms == 0 {
            return Err(ConfigError::Message("sensor interval_ms must be positive".into()));
        }

        if self.sensor.min_value >= self.sensor.max_value {
            return Err(ConfigError::Message(format!(
                "sensor range is empty: [{}, {}]",
                self.sensor.min_value, self.sensor.max_value
            )));
        }

        if self.sensor.max_step <= 0 {
            return Err(ConfigError::Message("sensor max_step must be positive".into()));
        }

        Ok(())
    }
}
