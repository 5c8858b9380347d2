use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::platform::{ReferenceSpaceKind, SessionInit, SessionMode};
use crate::scene::Rgb;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: SessionMode,
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::ImmersiveAr,
            required_features: vec!["hit-test".to_string(), "local-floor".to_string()],
            optional_features: vec!["dom-overlay".to_string()],
        }
    }
}

impl SessionConfig {
    pub fn init(&self) -> SessionInit {
        SessionInit {
            mode: self.mode,
            required_features: self.required_features.clone(),
            optional_features: self.optional_features.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReticleConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub color: Rgb,
    pub opacity: f32,
}

impl Default for ReticleConfig {
    fn default() -> Self {
        Self { inner_radius: 0.04, outer_radius: 0.06, color: Rgb::WHITE, opacity: 0.8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Edge length of the placed cube, metres.
    pub box_size: f32,
    pub roughness: f32,
    pub metalness: f32,
    /// Fixed seed for reproducible colours. Entropy-seeded when absent.
    pub style_seed: Option<u64>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { box_size: 0.2, roughness: 0.6, metalness: 0.2, style_seed: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    pub session: SessionConfig,
    /// Space hit poses are expressed in. `local` is tried if this one is declined.
    pub tracking_space: ReferenceSpaceKind,
    pub reticle: ReticleConfig,
    pub placement: PlacementConfig,
    pub event_capacity: usize,
    pub frame_ms: u64,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            tracking_space: ReferenceSpaceKind::LocalFloor,
            reticle: ReticleConfig::default(),
            placement: PlacementConfig::default(),
            event_capacity: 64,
            frame_ms: crate::kernel::time::FRAME_MS,
        }
    }
}

impl ArConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ArConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.session.required_features.iter().any(|f| f == "hit-test") {
            return Err(ConfigError::Invalid("`hit-test` must be a required session feature".into()));
        }
        if self.tracking_space == ReferenceSpaceKind::Viewer {
            return Err(ConfigError::Invalid("tracking space must be room-stable, not `viewer`".into()));
        }
        let r = &self.reticle;
        if !(r.inner_radius > 0.0 && r.inner_radius < r.outer_radius) {
            return Err(ConfigError::Invalid(format!(
                "reticle radii must satisfy 0 < inner < outer (got {} / {})",
                r.inner_radius, r.outer_radius
            )));
        }
        if !(0.0..=1.0).contains(&r.opacity) {
            return Err(ConfigError::Invalid("reticle opacity must be within 0..=1".into()));
        }
        if self.placement.box_size <= 0.0 {
            return Err(ConfigError::Invalid("placement box_size must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be non-zero".into()));
        }
        if self.frame_ms == 0 {
            return Err(ConfigError::Invalid("frame_ms must be non-zero".into()));
        }
        Ok(())
    }
}
