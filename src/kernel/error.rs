use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::session::SessionState;
use crate::platform::{PlatformError, SessionMode};

/// Failure kinds surfaced past the core boundary.
/// Raw `PlatformError`s are converted into one of these where they occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArError {
    /// No XR API at all. Not retried.
    #[error("XR API not available on this device/browser")]
    CapabilityUnavailable,

    #[error("session mode {mode:?} is not supported")]
    FeatureUnsupported { mode: SessionMode },

    #[error("session negotiation failed: {0}")]
    SessionNegotiationFailed(String),

    /// Non-fatal: reticle stays hidden for the rest of the session.
    #[error("hit-test unavailable: {0}")]
    HitTestUnavailable(String),

    /// Per-frame, transient. Never escalated.
    #[error("tracking lost")]
    TrackingLost,

    #[error("session already {0:?}")]
    SessionBusy(SessionState),
}

impl ArError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArError::CapabilityUnavailable => ErrorKind::CapabilityUnavailable,
            ArError::FeatureUnsupported { .. } => ErrorKind::FeatureUnsupported,
            ArError::SessionNegotiationFailed(_) => ErrorKind::SessionNegotiationFailed,
            ArError::HitTestUnavailable(_) => ErrorKind::HitTestUnavailable,
            ArError::TrackingLost => ErrorKind::TrackingLost,
            ArError::SessionBusy(_) => ErrorKind::SessionBusy,
        }
    }

    /// Platform rejection while a session request is in flight.
    pub fn from_session_request(err: PlatformError) -> Self {
        match err {
            PlatformError::NotSupported(_) => ArError::FeatureUnsupported { mode: SessionMode::ImmersiveAr },
            other => ArError::SessionNegotiationFailed(other.to_string()),
        }
    }

    /// Platform rejection while negotiating spaces or the hit-test source.
    pub fn from_hit_test_setup(err: PlatformError) -> Self {
        ArError::HitTestUnavailable(err.to_string())
    }
}

/// Content-free tag for events and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    CapabilityUnavailable,
    FeatureUnsupported,
    SessionNegotiationFailed,
    HitTestUnavailable,
    TrackingLost,
    SessionBusy,
}
