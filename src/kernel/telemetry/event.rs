use serde::{Deserialize, Serialize};

use crate::kernel::error::ErrorKind;
use crate::kernel::event::RejectionReason;
use crate::kernel::placement::ObjectId;
use crate::kernel::time::FrameToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionLifecycle(SessionLifecycleEvent),

    FrameSampled {
        frame: FrameToken,
        found: bool,
    },

    HitTestUnavailable,

    ObjectPlaced {
        id: ObjectId,
        frame: FrameToken,
    },

    PlacementRejected {
        reason: RejectionReason,
    },

    SessionSummary {
        frames_sampled: u64,
        hit_ratio: f32,
        placements: u64,
        rejections: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionLifecycleEvent {
    Requested,
    Started,
    Failed(ErrorKind),
    Ended,
}
