//! Contract with the platform AR/XR runtime.
//!
//! The core only consumes this contract. Session negotiation, reference spaces
//! and hit-test sampling are implemented by the runtime behind `XrPlatform`.

pub mod mock;

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

use crate::kernel::pose::Pose;
use crate::kernel::time::FrameToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    ImmersiveAr,
    ImmersiveVr,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceKind {
    /// Follows the device's viewpoint. Sampling rays are cast from here.
    Viewer,
    Local,
    LocalFloor,
}

/// What the core asks for when starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInit {
    pub mode: SessionMode,
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpace {
    pub id: u64,
    pub kind: ReferenceSpaceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSource(pub u64);

/// Raw failures reported by the runtime. Never leaves the core boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("viewer pose could not be resolved")]
    TrackingLost,
    #[error("invalid handle")]
    InvalidHandle,
}

/// Signals pushed by the runtime outside of any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformSignal {
    /// Runtime ended the session (system UI, backgrounding, error).
    SessionEnded(SessionHandle),
}

/// Async operations return `Send` futures so negotiation can run on spawned tasks
/// without stalling the frame callback.
pub trait XrPlatform: Send + Sync + 'static {
    /// Whether an XR API exists at all.
    fn has_xr(&self) -> bool;

    fn is_session_supported(&self, mode: SessionMode) -> impl Future<Output = Result<bool, PlatformError>> + Send;

    fn request_session(&self, init: SessionInit) -> impl Future<Output = Result<SessionHandle, PlatformError>> + Send;

    fn end_session(&self, session: SessionHandle);

    fn request_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> impl Future<Output = Result<ReferenceSpace, PlatformError>> + Send;

    /// Registers a hit-test source casting from the origin of `space`.
    fn request_hit_test_source(
        &self,
        session: SessionHandle,
        space: ReferenceSpace,
    ) -> impl Future<Output = Result<HitTestSource, PlatformError>> + Send;

    fn cancel_hit_test_source(&self, source: HitTestSource);

    /// Ranked hit list for `frame`, poses expressed in `space`.
    /// `Err(TrackingLost)` when the viewer pose cannot be resolved this frame.
    fn hit_test_results(
        &self,
        frame: FrameToken,
        source: HitTestSource,
        space: ReferenceSpace,
    ) -> Result<Vec<Pose>, PlatformError>;
}
