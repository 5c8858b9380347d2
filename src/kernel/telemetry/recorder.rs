use std::collections::VecDeque;

use super::event::TelemetryEvent;
use super::metrics::{Tally, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

/// Counts cover everything ever recorded; the ring only keeps recent history.
#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
    totals: Tally,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
            totals: Tally::default(),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        self.totals.observe(&event);
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.totals.snapshot()
    }

    /// Most recent events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    /// Cumulative roll-up of everything recorded so far. Emitted when a session ends.
    pub fn aggregate_session(&self) -> TelemetryEvent {
        let snap = self.snapshot();
        TelemetryEvent::SessionSummary {
            frames_sampled: snap.sampling_stats.frames,
            hit_ratio: snap.sampling_stats.hit_ratio as f32,
            placements: snap.placement_stats.placed,
            rejections: snap.placement_stats.rejected(),
        }
    }
}
