pub mod error;
pub mod event;
pub mod placement;
pub mod pose;
pub mod reactor;
pub mod reticle;
pub mod session;
pub mod telemetry;
pub mod time;
