use std::sync::Arc;
use std::time::Duration;

use curtain_api::protocols::{JsonProtocol, Protocol};
use curtain_api::topics::CURTAIN_CMD;
use curtain_api::{CurtainAction, CurtainCommand, CurtainState};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use crate::configs::Actuator;
use crate::errors::MessageError;
use crate::services::event_bus::EventBus;

/// Actuation unit: simulates moving the curtain. Never reports back.
pub struct CurtainActuator {
    state: Arc<RwLock<CurtainState>>,
    latency: Duration,
}

impl CurtainActuator {
    pub fn new(actuator: &Actuator) -> Self {
        Self {
            state: Arc::new(RwLock::new(CurtainState::Closed)),
            latency: actuator.latency(),
        }
    }

    /// Mirror of the last commanded state.
    pub fn state(&self) -> Arc<RwLock<CurtainState>> {
        Arc::clone(&self.state)
    }

    pub async fn start(self, event_bus: &EventBus) -> JoinHandle<()> {
        let mut receiver = event_bus.subscribe(CURTAIN_CMD).await;
        tracing::info!("Curtain actuator waiting for commands");

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(payload) => self.handle_payload(&payload).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Curtain actuator lagged, {} commands skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub async fn handle_payload(&self, payload: &[u8]) {
        match JsonProtocol.deserialize::<CurtainCommand>(payload).map_err(MessageError::from) {
            Ok(command) => self.execute(command).await,
            Err(e) => tracing::warn!("Ignoring curtain command: {}", e),
        }
    }

    /// Updates the mirror at once; completion is logged after the latency.
    pub async fn execute(&self, command: CurtainCommand) {
        tracing::info!("Received command => action={}, target={}", command.action, command.target);

        let (moving, done) = match command.action {
            CurtainAction::Open => ("Opening", "opened"),
            CurtainAction::Close => ("Closing", "closed"),
        };

        tracing::info!("{} curtain {}...", moving, command.target);
        *self.state.write().await = command.action.resulting_state();

        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            tracing::info!("Curtain {} fully {}", command.target, done);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_execute_updates_mirror() {
        let actuator = CurtainActuator::new(&Actuator { latency_ms: 1000 });
        let state = actuator.state();

        actuator.execute(CurtainCommand::new(CurtainAction::Open)).await;
        assert_eq!(*state.read().await, CurtainState::Open);

        tokio::time::sleep(Duration::from_millis(1000)).await;

        actuator.execute(CurtainCommand::new(CurtainAction::Close)).await;
        assert_eq!(*state.read().await, CurtainState::Closed);
    }

    #[tokio::test]
    async fn test_unknown_action_is_ignored() {
        let actuator = CurtainActuator::new(&Actuator { latency_ms: 0 });
        let state = actuator.state();

        actuator.handle_payload(br#"{"action":"OPEN"}"#).await;
        actuator.handle_payload(br#"{"action":"SPIN","target":"curtain1"}"#).await;
        actuator.handle_payload(b"not json").await;

        assert_eq!(*state.read().await, CurtainState::Open);
    }

    #[tokio::test]
    async fn test_consumes_bus_commands() {
        let event_bus = EventBus::new();
        let actuator = CurtainActuator::new(&Actuator { latency_ms: 0 });
        let state = actuator.state();
        let _handle = actuator.start(&event_bus).await;

        event_bus
            .publish_json(CURTAIN_CMD, &CurtainCommand::new(CurtainAction::Open))
            .await
            .unwrap();

        for _ in 0..50 {
            if *state.read().await == CurtainState::Open {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("actuator never applied the command");
    }
}
