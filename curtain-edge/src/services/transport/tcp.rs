use std::net::SocketAddr;

use curtain_api::Envelope;
use curtain_api::protocols::{JsonProtocol, Protocol};
use curtain_api::topics::{EDGE_STATUS, RULE_UPDATE};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use crate::errors::MessageError;
use crate::services::event_bus::{EventBus, Payload};

/// Edge end of the remote link.
///
/// Accepts newline-delimited envelopes from the remote configurator, republishes
/// rule updates on the bus and streams every `edge/status` back out.
pub struct CloudGateway {
    addr: SocketAddr,
    event_bus: EventBus,
}

impl CloudGateway {
    pub fn new(addr: SocketAddr, event_bus: EventBus) -> Self {
        Self { addr, event_bus }
    }

    /// Binds the listener and spawns the accept loop.
    ///
    /// Returns the bound address and a handle that stops accepting when fired.
    pub async fn start(&self) -> Result<(SocketAddr, oneshot::Sender<()>), MessageError> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Cloud gateway listening on {}", local_addr);

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let event_bus = self.event_bus.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        tracing::info!("Cloud gateway shutting down");
                        break;
                    },
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, addr)) => {
                                let event_bus = event_bus.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, addr, event_bus).await;
                                });
                            },
                            Err(e) => {
                                tracing::error!("Failed to accept cloud connection: {}", e);
                            }
                        }
                    }
                }
            }
        });

        Ok((local_addr, stop_tx))
    }

    async fn handle_connection(stream: TcpStream, addr: SocketAddr, event_bus: EventBus) {
        let connection_id = Uuid::new_v4();
        tracing::info!("Cloud {} connected from {}", connection_id, addr);

        let (reader, writer) = stream.into_split();
        let statuses = event_bus.subscribe(EDGE_STATUS).await;
        let send_task = tokio::spawn(Self::forward_statuses(connection_id, statuses, writer));

        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    if let Err(e) = Self::handle_line(&event_bus, &line).await {
                        tracing::warn!("Discarded message from cloud {}: {}", connection_id, e);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to receive from cloud {}: {}", connection_id, e);
                    break;
                }
            }
        }

        send_task.abort();
        tracing::info!("Cloud {} disconnected", connection_id);
    }

    async fn handle_line(event_bus: &EventBus, line: &str) -> Result<(), MessageError> {
        let envelope = Envelope::from_line(line)?;

        match envelope.topic.as_str() {
            RULE_UPDATE => {
                event_bus.publish(RULE_UPDATE, envelope.payload_bytes()?).await?;
                Ok(())
            }
            _ => Err(MessageError::UnknownTopic(envelope.topic)),
        }
    }

    async fn forward_statuses(
        connection_id: Uuid,
        mut statuses: broadcast::Receiver<Payload>,
        mut writer: OwnedWriteHalf,
    ) {
        loop {
            let payload = match statuses.recv().await {
                Ok(payload) => payload,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Cloud {} lagged, {} statuses skipped", connection_id, skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let line = match Self::status_line(&payload) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Skipping status for cloud {}: {}", connection_id, e);
                    continue;
                }
            };

            if let Err(e) = writer.write_all(&line).await {
                tracing::warn!("Failed to send status to cloud {}: {}", connection_id, e);
                break;
            }
        }
    }

    fn status_line(payload: &[u8]) -> Result<Vec<u8>, MessageError> {
        let value: serde_json::Value = JsonProtocol.deserialize(payload)?;

        Ok(Envelope::wrap(EDGE_STATUS, &value)?.to_line()?)
    }
}
