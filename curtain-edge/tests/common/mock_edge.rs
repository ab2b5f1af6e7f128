use std::time::Duration;

use curtain_edge::configs::{Actuator, Gateway, Logger, Sensor, Settings};
use curtain_edge::services::Payload;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio::time::timeout;

pub fn test_settings() -> Settings {
    Settings {
        logger: Logger {
            level: String::from("debug"),
        },
        sensor: Sensor {
            interval_ms: 20,
            ..Sensor::default()
        },
        actuator: Actuator { latency_ms: 10 },
        gateway: Gateway {
            host: String::from("127.0.0.1"),
            port: 0,
        },
    }
}

pub async fn next_json<T: DeserializeOwned>(receiver: &mut broadcast::Receiver<Payload>) -> T {
    let payload = timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("timed out waiting for event")
        .unwrap();

    serde_json::from_slice(&payload).unwrap()
}

/// Polls `check` until it returns true or two seconds elapse.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
