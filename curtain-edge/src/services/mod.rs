pub mod actuator_service;
pub mod decision_engine;
pub mod edge_processor;
pub mod event_bus;
pub mod sensor_service;
pub mod transport;

pub use actuator_service::*;
pub use decision_engine::*;
pub use edge_processor::*;
pub use event_bus::*;
pub use sensor_service::*;
pub use transport::*;
