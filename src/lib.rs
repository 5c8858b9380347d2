pub mod config;
pub mod kernel;
pub mod platform;
pub mod scene;

// Re-export specific items if needed for convenient access
pub use config::ArConfig;
pub use kernel::error::ArError;
pub use kernel::event::{ArEvent, Event, InputEvent, RejectionReason};
pub use kernel::pose::Pose;
pub use kernel::reactor::ArReactor;
pub use kernel::session::SessionState;
pub use kernel::time::FrameToken;
