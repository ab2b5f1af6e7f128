use curtain_api::topics::{CURTAIN_CMD, EDGE_STATUS, RULE_UPDATE, SENSOR_DATA};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::errors::MessageError;
use crate::services::decision_engine::{Clock, Decision, DecisionEngine, SystemClock};
use crate::services::event_bus::{EventBus, Payload};

const QUEUE_CAPACITY: usize = 64;

/// An event waiting for the decision loop.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub topic: &'static str,
    pub payload: Payload,
}

/// Runs the decision engine behind a single-consumer queue.
///
/// Sensor readings and rule updates arrive on separate topics; both are
/// funnelled into one channel so the engine sees exactly one event at a time.
pub struct EdgeProcessor<C: Clock = SystemClock> {
    engine: DecisionEngine<C>,
    event_bus: EventBus,
}

impl<C: Clock + 'static> EdgeProcessor<C> {
    pub fn new(engine: DecisionEngine<C>, event_bus: EventBus) -> Self {
        Self { engine, event_bus }
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &DecisionEngine<C> {
        &self.engine
    }

    /// Subscribes to the inbound topics and spawns the decision loop.
    ///
    /// Subscriptions are in place when this returns, so nothing published
    /// afterwards is missed.
    pub async fn start(self) -> JoinHandle<()> {
        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);

        for topic in [SENSOR_DATA, RULE_UPDATE] {
            let receiver = self.event_bus.subscribe(topic).await;
            tokio::spawn(forward(topic, receiver, queue_tx.clone()));
        }

        tracing::info!("Edge processor subscribed to {} and {}", SENSOR_DATA, RULE_UPDATE);

        tokio::spawn(self.run(queue_rx))
    }

    async fn run(mut self, mut queue_rx: mpsc::Receiver<Inbound>) {
        while let Some(inbound) = queue_rx.recv().await {
            self.dispatch(inbound).await;
        }

        tracing::info!("Edge processor stopped: {}", MessageError::ChannelClosed);
    }

    /// Handles one inbound event to completion, publishing its outputs.
    pub async fn dispatch(&mut self, inbound: Inbound) -> Option<Decision> {
        match inbound.topic {
            SENSOR_DATA => {
                let decision = self.engine.handle_sensor_payload(&inbound.payload)?;
                self.publish(&decision).await;
                Some(decision)
            }
            RULE_UPDATE => {
                self.engine.handle_rule_payload(&inbound.payload);
                None
            }
            other => {
                tracing::warn!("{}", MessageError::UnknownTopic(other.to_string()));
                None
            }
        }
    }

    async fn publish(&self, decision: &Decision) {
        if let Some(command) = &decision.command {
            if let Err(e) = self.event_bus.publish_json(CURTAIN_CMD, command).await {
                tracing::warn!("Dropped curtain command {}: {}", command.action, e);
            }
        }

        if let Err(e) = self.event_bus.publish_json(EDGE_STATUS, &decision.status).await {
            tracing::debug!("Dropped edge status: {}", e);
        }
    }
}

async fn forward(topic: &'static str, mut receiver: broadcast::Receiver<Payload>, queue_tx: mpsc::Sender<Inbound>) {
    loop {
        match receiver.recv().await {
            Ok(payload) => {
                if queue_tx.send(Inbound { topic, payload }).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Decision queue lagged on {}, {} messages skipped", topic, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use curtain_api::{CurtainAction, CurtainCommand, CurtainRule, CurtainState, EdgeStatus, ScheduleUpdate, SensorData};
    use time::macros::datetime;
    use tokio::time::timeout;

    use crate::services::decision_engine::FixedClock;

    use super::*;

    async fn next<T: for<'de> serde::Deserialize<'de>>(receiver: &mut broadcast::Receiver<Payload>) -> T {
        let payload = timeout(Duration::from_secs(1), receiver.recv()).await.unwrap().unwrap();
        serde_json::from_slice(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_publishes_command_before_status() {
        let event_bus = EventBus::new();
        let mut commands = event_bus.subscribe(CURTAIN_CMD).await;
        let mut statuses = event_bus.subscribe(EDGE_STATUS).await;

        let engine = DecisionEngine::with_clock(FixedClock(datetime!(2024-05-01 12:00 UTC)));
        let mut processor = EdgeProcessor::new(engine, event_bus.clone());

        let payload = serde_json::to_vec(&SensorData::light(700)).unwrap();
        let decision = processor
            .dispatch(Inbound { topic: SENSOR_DATA, payload: payload.into() })
            .await
            .unwrap();
        assert!(decision.command.is_some());

        let command: CurtainCommand = next(&mut commands).await;
        assert_eq!(command.action, CurtainAction::Open);

        let status: EdgeStatus = next(&mut statuses).await;
        assert_eq!(status.light_level, 700);
        assert_eq!(status.curtain_state, CurtainState::Open);
    }

    #[tokio::test]
    async fn test_malformed_payloads_emit_nothing() {
        let event_bus = EventBus::new();
        let mut commands = event_bus.subscribe(CURTAIN_CMD).await;
        let mut statuses = event_bus.subscribe(EDGE_STATUS).await;

        let engine = DecisionEngine::with_clock(FixedClock(datetime!(2024-05-01 12:00 UTC)));
        let mut processor = EdgeProcessor::new(engine, event_bus.clone());

        let sensor = processor
            .dispatch(Inbound { topic: SENSOR_DATA, payload: b"garbage".to_vec().into() })
            .await;
        let rule = processor
            .dispatch(Inbound { topic: RULE_UPDATE, payload: b"{}".to_vec().into() })
            .await;

        assert!(sensor.is_none());
        assert!(rule.is_none());
        assert!(processor.engine().rule().is_none());
        assert!(commands.try_recv().is_err());
        assert!(statuses.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_loop_applies_rule_before_following_reading() {
        let event_bus = EventBus::new();
        let mut commands = event_bus.subscribe(CURTAIN_CMD).await;
        let mut statuses = event_bus.subscribe(EDGE_STATUS).await;

        let engine = DecisionEngine::with_clock(FixedClock(datetime!(2024-05-01 09:00 UTC)));
        let _handle = EdgeProcessor::new(engine, event_bus.clone()).start().await;

        event_bus
            .publish_json(RULE_UPDATE, &ScheduleUpdate::new(CurtainRule::new("r1", "08:00", "10:00")))
            .await
            .unwrap();
        // Rule and reading travel on different topics; let the rule land first.
        tokio::time::sleep(Duration::from_millis(50)).await;
        event_bus.publish_json(SENSOR_DATA, &SensorData::light(900)).await.unwrap();

        let status: EdgeStatus = next(&mut statuses).await;
        assert!(status.override_active);
        assert_eq!(status.curtain_state, CurtainState::Closed);
        assert!(commands.try_recv().is_err());
    }
}
