use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::event::RejectionReason;
use super::pose::Pose;
use super::reticle::ReticleController;
use super::time::FrameToken;
use crate::config::PlacementConfig;
use crate::scene::{PrimitiveKind, Rgb, StyleAttrs};

/// Opaque, strictly increasing within one reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn ordinal(&self) -> u64 {
        self.0
    }
}

/// Immutable once created. The pose is a copy taken at tap time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub pose: Pose,
    pub style: StyleAttrs,
    pub created_at: FrameToken,
}

/// Converts select taps into placed objects. Owns the append-only placement log.
pub struct PlacementController {
    log: Vec<PlacedObject>,
    next_id: u64,
    rng: StdRng,
    config: PlacementConfig,
}

impl PlacementController {
    pub fn new(config: PlacementConfig) -> Self {
        let rng = match config.style_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { log: Vec::new(), next_id: 0, rng, config }
    }

    pub fn primitive(&self) -> PrimitiveKind {
        let s = self.config.box_size;
        PrimitiveKind::Box { width: s, height: s, depth: s }
    }

    /// At most one object per call. A rejected tap is dropped, not queued.
    pub fn on_select(&mut self, reticle: &ReticleController, frame: FrameToken) -> Result<PlacedObject, RejectionReason> {
        let Some(pose) = reticle.current_placement_pose() else {
            let reason = if reticle.input_enabled() {
                RejectionReason::ReticleHidden
            } else {
                RejectionReason::InputDisabled
            };
            debug!(?reason, frame = frame.frame, "cannot place object");
            return Err(reason);
        };

        self.next_id += 1;
        let object = PlacedObject {
            id: ObjectId(self.next_id),
            pose,
            style: self.next_style(),
            created_at: frame,
        };
        info!(
            id = object.id.ordinal(),
            position = ?object.pose.position,
            color = %object.style.color.to_hex(),
            "placing object"
        );
        self.log.push(object.clone());
        Ok(object)
    }

    fn next_style(&mut self) -> StyleAttrs {
        StyleAttrs {
            color: Rgb::from_u24(self.rng.random_range(0..=0xff_ffff)),
            opacity: 1.0,
            roughness: self.config.roughness,
            metalness: self.config.metalness,
            flat: false,
            cast_shadow: true,
        }
    }

    /// Creation order.
    pub fn log(&self) -> &[PlacedObject] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
