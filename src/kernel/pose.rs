use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid transform expressed in the session's tracking space.
///
/// `Pose` is `Copy`: every hand-off (sample -> reticle -> placed object) is a
/// value copy, so a placed object can never alias the reticle it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self { position, orientation: Quat::IDENTITY }
    }

    /// Decomposes a column-major 4x4 transform as handed out by XR runtimes.
    /// Scale is discarded; surfaces are never scaled.
    pub fn from_matrix(cols: &[f32; 16]) -> Self {
        let (_scale, orientation, position) = Mat4::from_cols_array(cols).to_scale_rotation_translation();
        Self { position, orientation: orientation.normalize() }
    }

    pub fn to_matrix(&self) -> [f32; 16] {
        Mat4::from_rotation_translation(self.orientation, self.position).to_cols_array()
    }

    /// Orientation as XYZ euler angles in degrees (scene hosts that speak "rotation" attributes).
    pub fn euler_degrees(&self) -> Vec3 {
        let (x, y, z) = self.orientation.to_euler(glam::EulerRot::XYZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }
}
