use super::error::{ArError, ErrorKind};
use super::placement::PlacedObject;
use super::session::SessionGeneration;
use crate::platform::{HitTestSource, PlatformSignal, ReferenceSpace, SessionHandle};

/// Inbound events. Queued on the reactor channel and applied at the next frame boundary.
#[derive(Debug, Clone)]
pub enum Event {
    /// Discrete "select" from the input layer (tap, controller trigger, synthetic).
    Input(InputEvent),
    Platform(PlatformSignal),
    SessionNegotiated {
        generation: SessionGeneration,
        outcome: Result<SessionHandle, ArError>,
    },
    HitTestNegotiated {
        generation: SessionGeneration,
        outcome: Result<HitTestBinding, ArError>,
    },
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    /// Logged only. The core does not distinguish input devices.
    pub source: String,
}

impl InputEvent {
    pub fn select(source: &str) -> Self {
        Self { source: source.to_string() }
    }
}

/// Result of a successful hit-test negotiation: a viewer-bound source and the
/// room-stable space its poses are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestBinding {
    pub session: SessionHandle,
    pub viewer_space: ReferenceSpace,
    pub tracking_space: ReferenceSpace,
    pub source: HitTestSource,
}

/// Observability events. The core never depends on these being observed.
#[derive(Debug, Clone, PartialEq)]
pub enum ArEvent {
    SessionStarted { session_id: uuid::Uuid },
    SessionFailed(ErrorKind),
    SessionEnded { session_id: Option<uuid::Uuid> },
    HitTestUnavailable,
    ObjectPlaced(PlacedObject),
    PlacementRejected(RejectionReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RejectionReason {
    /// No confirmed surface under the reticle.
    ReticleHidden,
    /// Session not Active (never started, requesting, or ended).
    InputDisabled,
}
