use std::collections::HashMap;
use std::sync::Arc;

use curtain_api::protocols::{JsonProtocol, Protocol};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};

use crate::errors::MessageError;

/// Raw JSON payload as carried on a topic.
pub type Payload = Arc<[u8]>;

const TOPIC_CAPACITY: usize = 100;

/// In-process pub/sub with one FIFO broadcast channel per topic.
#[derive(Clone)]
pub struct EventBus {
    publishers: Arc<RwLock<HashMap<String, broadcast::Sender<Payload>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            publishers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn sender(&self, topic: &str) -> broadcast::Sender<Payload> {
        if let Some(sender) = self.publishers.read().await.get(topic) {
            return sender.clone();
        }

        let mut publishers = self.publishers.write().await;
        publishers
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    /// Publishes a payload, returning how many subscribers will see it.
    ///
    /// Delivery is best effort: with nobody listening the payload is dropped.
    pub async fn publish(&self, topic: &str, payload: impl Into<Payload>) -> Result<usize, MessageError> {
        self.sender(topic)
            .await
            .send(payload.into())
            .map_err(|_| MessageError::NoSubscriber(topic.to_string()))
    }

    pub async fn publish_json<T: Serialize>(&self, topic: &str, value: &T) -> Result<usize, MessageError> {
        let bytes = JsonProtocol.serialize(value)?;
        self.publish(topic, bytes).await
    }

    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<Payload> {
        self.sender(topic).await.subscribe()
    }

    pub async fn has_subscribers(&self, topic: &str) -> bool {
        let publishers = self.publishers.read().await;
        if let Some(sender) = publishers.get(topic) {
            sender.receiver_count() > 0
        } else {
            false
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let event_bus = EventBus::new();

        let mut receiver1 = event_bus.subscribe("test/event").await;
        let mut receiver2 = event_bus.subscribe("test/event").await;

        let receiver_count = event_bus.publish("test/event", b"{}".to_vec()).await.unwrap();
        assert_eq!(receiver_count, 2);

        assert_eq!(&*receiver1.recv().await.unwrap(), b"{}");
        assert_eq!(&*receiver2.recv().await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_multiple_topics() {
        let event_bus = EventBus::new();

        let mut receiver1 = event_bus.subscribe("topic1").await;
        let mut receiver2 = event_bus.subscribe("topic2").await;

        event_bus.publish("topic1", b"1".to_vec()).await.unwrap();
        event_bus.publish("topic2", b"2".to_vec()).await.unwrap();

        assert_eq!(&*receiver1.recv().await.unwrap(), b"1");
        assert_eq!(&*receiver2.recv().await.unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_topic_order_is_preserved() {
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe("ordered").await;

        for i in 0..10u8 {
            event_bus.publish("ordered", vec![i]).await.unwrap();
        }

        for i in 0..10u8 {
            assert_eq!(&*receiver.recv().await.unwrap(), &[i]);
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_is_dropped() {
        let event_bus = EventBus::new();

        let result = event_bus.publish("nobody/listens", b"{}".to_vec()).await;
        assert!(matches!(result, Err(MessageError::NoSubscriber(topic)) if topic == "nobody/listens"));
    }

    #[tokio::test]
    async fn test_has_subscribers() {
        let event_bus = EventBus::new();

        assert!(!event_bus.has_subscribers("test/event").await);

        let _receiver = event_bus.subscribe("test/event").await;

        assert!(event_bus.has_subscribers("test/event").await);
    }
}
