mod control;
mod rule;
mod sensor;
mod status;

pub use control::*;
pub use rule::*;
pub use sensor::*;
pub use status::*;
