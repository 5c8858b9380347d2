use serde::{Deserialize, Serialize};

/// Identifies one rendered frame. Issued by the rendering host, strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FrameToken {
    pub frame: u64,
}

/// Demo cadence (~60Hz display refresh).
pub const FRAME_MS: u64 = 16;

impl FrameToken {
    pub fn new(frame: u64) -> Self {
        FrameToken { frame }
    }

    pub fn next(&self) -> Self {
        FrameToken { frame: self.frame + 1 }
    }
}
