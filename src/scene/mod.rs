//! Outbound contract with the rendering / scene-graph host.

pub mod recording;

use serde::{Deserialize, Serialize};

use crate::kernel::pose::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Ring { inner_radius: f32, outer_radius: f32 },
    Box { width: f32, height: f32, depth: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);

    pub fn from_u24(value: u32) -> Self {
        Rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleAttrs {
    pub color: Rgb,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    /// Unlit material (reticle).
    pub flat: bool,
    pub cast_shadow: bool,
}

pub trait SceneHost {
    fn create_primitive(&mut self, kind: PrimitiveKind, pose: &Pose, style: &StyleAttrs) -> EntityHandle;
    fn set_entity_visibility(&mut self, handle: EntityHandle, visible: bool);
    fn set_entity_pose(&mut self, handle: EntityHandle, pose: &Pose);
}
