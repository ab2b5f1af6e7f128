use std::error::Error;
use std::net::{IpAddr, SocketAddr};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::configs::Settings;
use crate::services::{CloudGateway, CurtainActuator, DecisionEngine, EdgeProcessor, EventBus, LightSensor};

pub mod configs;
pub mod errors;
pub mod services;

/// Handles to a running edge node.
pub struct EdgeNode {
    pub event_bus: EventBus,
    pub gateway_addr: SocketAddr,
    gateway_stop: oneshot::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl EdgeNode {
    pub fn shutdown(self) {
        let _ = self.gateway_stop.send(());
        for task in self.tasks {
            task.abort();
        }

        tracing::info!("Edge node stopped");
    }
}

/// Wires the sensing, decision and actuation units onto one bus and opens
/// the cloud gateway.
pub async fn start(settings: &Settings) -> Result<EdgeNode, Box<dyn Error + Send + Sync>> {
    let event_bus = EventBus::new();

    let actuator = CurtainActuator::new(&settings.actuator).start(&event_bus).await;
    let processor = EdgeProcessor::new(DecisionEngine::new(), event_bus.clone()).start().await;

    let ip_addr = settings.gateway.host.parse::<IpAddr>()?;
    let address = SocketAddr::from((ip_addr, settings.gateway.port));
    let (gateway_addr, gateway_stop) = CloudGateway::new(address, event_bus.clone()).start().await?;

    let sensor = LightSensor::new(&settings.sensor, event_bus.clone()).start();

    Ok(EdgeNode {
        event_bus,
        gateway_addr,
        gateway_stop,
        tasks: vec![sensor, processor, actuator],
    })
}

pub async fn run(settings: &Settings) -> Result<(), Box<dyn Error + Send + Sync>> {
    let node = start(settings).await?;
    tracing::info!("Edge node running, gateway on {}", node.gateway_addr);

    tokio::signal::ctrl_c().await?;
    node.shutdown();

    Ok(())
}
