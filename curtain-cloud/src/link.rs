use std::sync::Arc;
use std::time::Duration;

use curtain_api::topics::{EDGE_STATUS, RULE_UPDATE};
use curtain_api::{CurtainRule, EdgeStatus, Envelope, ScheduleUpdate};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::command::ConsoleCommand;
use crate::error::LinkError;
use crate::status::{StatusBoard, describe};

/// What the console loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Remote configurator's side of the edge link.
///
/// Holds the single rule, the latest status and the current connection, and
/// reconnects forever at a fixed delay.
#[derive(Clone)]
pub struct CloudLink {
    address: String,
    reconnect_delay: Duration,
    rule: Arc<RwLock<CurtainRule>>,
    board: Arc<Mutex<StatusBoard>>,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
}

impl CloudLink {
    pub fn new(address: String, reconnect_delay: Duration, rule: CurtainRule, board: StatusBoard) -> Self {
        Self {
            address,
            reconnect_delay,
            rule: Arc::new(RwLock::new(rule)),
            board: Arc::new(Mutex::new(board)),
            writer: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn rule(&self) -> CurtainRule {
        self.rule.read().await.clone()
    }

    pub async fn latest_status(&self) -> Option<EdgeStatus> {
        self.board.lock().await.latest().cloned()
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Spawns the connect/read/reconnect loop.
    pub fn start(&self) -> JoinHandle<()> {
        let link = self.clone();

        tokio::spawn(async move {
            loop {
                tracing::info!("Attempting to connect to edge device ({})...", link.address);

                match TcpStream::connect(&link.address).await {
                    Ok(stream) => {
                        let (reader, writer) = stream.into_split();
                        *link.writer.lock().await = Some(writer);
                        tracing::info!("Connected to edge device");

                        if let Err(e) = link.send_rule_update().await {
                            tracing::error!("Cannot send rule update: {}", e);
                        }

                        link.read_messages(reader).await;
                        link.writer.lock().await.take();
                    }
                    Err(e) => tracing::error!("Connection error: {}", e),
                }

                tracing::info!(
                    "Connection closed, attempting to reconnect in {:?}...",
                    link.reconnect_delay
                );
                tokio::time::sleep(link.reconnect_delay).await;
            }
        })
    }

    async fn read_messages(&self, reader: OwnedReadHalf) {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    if let Err(e) = self.handle_line(&line).await {
                        tracing::error!("Failed to handle message: {}", e);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Connection error: {}", e);
                    break;
                }
            }
        }
    }

    async fn handle_line(&self, line: &str) -> Result<(), LinkError> {
        let envelope = Envelope::from_line(line)?;
        if envelope.topic != EDGE_STATUS {
            return Err(LinkError::UnknownType(envelope.topic));
        }

        let status: EdgeStatus = envelope.payload_as()?;
        self.board.lock().await.record(status).await
    }

    /// Pushes the current rule. Dropped, not queued, while disconnected.
    pub async fn send_rule_update(&self) -> Result<(), LinkError> {
        let rule = self.rule().await;
        let line = Envelope::wrap(RULE_UPDATE, &ScheduleUpdate::new(rule.clone()))?.to_line()?;

        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(LinkError::NotConnected);
        };

        let result = stream.write_all(&line).await;
        if let Err(e) = result {
            writer.take();
            return Err(e.into());
        }

        tracing::info!(
            "Sent rule update => ID: {}, Period: {}-{}, Enabled: {}",
            rule.id,
            rule.window_start,
            rule.window_end,
            rule.enabled
        );

        Ok(())
    }

    /// Applies a console command, pushing the rule after every mutation.
    pub async fn apply(&self, command: ConsoleCommand) -> Flow {
        match command {
            ConsoleCommand::Enable => {
                self.rule.write().await.enabled = true;
                tracing::info!("Rule enabled");
            }
            ConsoleCommand::Disable => {
                self.rule.write().await.enabled = false;
                tracing::info!("Rule disabled");
            }
            ConsoleCommand::Time { start, end } => {
                {
                    let mut rule = self.rule.write().await;
                    rule.window_start = start;
                    rule.window_end = end;
                    tracing::info!("Rule period updated to {}-{}", rule.window_start, rule.window_end);
                }
            }
            ConsoleCommand::Status => {
                match self.latest_status().await {
                    Some(status) => println!("Latest status => {}", describe(&status)),
                    None => println!("No status information received yet"),
                }
                return Flow::Continue;
            }
            ConsoleCommand::Exit => {
                tracing::info!("Exiting...");
                self.close().await;
                return Flow::Exit;
            }
        }

        if let Err(e) = self.send_rule_update().await {
            tracing::error!("Cannot send rule update: {}", e);
        }

        Flow::Continue
    }

    pub async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
    }
}
