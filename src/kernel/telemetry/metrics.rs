use serde::Serialize;

use super::event::{SessionLifecycleEvent, TelemetryEvent};
use crate::kernel::event::RejectionReason;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub session_stats: SessionStats,
    pub sampling_stats: SamplingStats,
    pub placement_stats: PlacementStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub requested: u64,
    pub started: u64,
    pub failed: u64,
    pub ended: u64,
    pub hit_test_unavailable: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SamplingStats {
    pub frames: u64,
    pub hits: u64,
    pub hit_ratio: f64,
    /// Longest run of consecutive frames without a surface.
    pub longest_miss_streak: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementStats {
    pub placed: u64,
    pub rejected_hidden: u64,
    pub rejected_disabled: u64,
}

impl PlacementStats {
    pub fn rejected(&self) -> u64 {
        self.rejected_hidden + self.rejected_disabled
    }
}

/// Running totals, fed one event at a time. Independent of any retention window.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    snap: TelemetrySnapshot,
    miss_streak: u64,
}

impl Tally {
    pub fn observe(&mut self, event: &TelemetryEvent) {
        let snap = &mut self.snap;
        match event {
            TelemetryEvent::SessionLifecycle(lifecycle) => match lifecycle {
                SessionLifecycleEvent::Requested => snap.session_stats.requested += 1,
                SessionLifecycleEvent::Started => snap.session_stats.started += 1,
                SessionLifecycleEvent::Failed(_) => snap.session_stats.failed += 1,
                SessionLifecycleEvent::Ended => snap.session_stats.ended += 1,
            },
            TelemetryEvent::HitTestUnavailable => snap.session_stats.hit_test_unavailable += 1,
            TelemetryEvent::FrameSampled { found, .. } => {
                snap.sampling_stats.frames += 1;
                if *found {
                    snap.sampling_stats.hits += 1;
                    self.miss_streak = 0;
                } else {
                    self.miss_streak += 1;
                    snap.sampling_stats.longest_miss_streak = snap.sampling_stats.longest_miss_streak.max(self.miss_streak);
                }
            }
            TelemetryEvent::ObjectPlaced { .. } => snap.placement_stats.placed += 1,
            TelemetryEvent::PlacementRejected { reason } => match reason {
                RejectionReason::ReticleHidden => snap.placement_stats.rejected_hidden += 1,
                RejectionReason::InputDisabled => snap.placement_stats.rejected_disabled += 1,
            },
            TelemetryEvent::SessionSummary { .. } => {}
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snap = self.snap.clone();
        if snap.sampling_stats.frames > 0 {
            snap.sampling_stats.hit_ratio = snap.sampling_stats.hits as f64 / snap.sampling_stats.frames as f64;
        }
        snap
    }
}
