use std::{fs, path::Path};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config,
    error::{Error, Result},
    types::Obstacle,
};

/// Live tunables for the simulation. Key names on disk are camelCase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationParameters {
    pub density: f32,
    pub particle_size: f32,

    pub gravity: f32,
    pub aero_scale: f32,
    pub lift_max: f32,
    pub drag_min: f32,
    pub drag_max: f32,
    pub torque_strength: f32,
    pub rot_damping: f32,
    pub wind_strength: f32,
    pub wind_noise_speed: f32,
    pub wind_noise_scale: f32,

    pub collision_stickiness: f32,
    pub horizontal_friction: f32,
    pub restitution: f32,

    /// Seconds a stuck particle waits before fading.
    pub static_threshold: f32,
    /// Seconds the fade takes.
    pub fade_duration: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            density: 20.0,
            particle_size: 3.0,
            gravity: 0.25,
            aero_scale: 0.18,
            lift_max: 1.5,
            drag_min: 0.1,
            drag_max: 1.2,
            torque_strength: 3.0,
            rot_damping: 0.05,
            wind_strength: 0.0,
            wind_noise_speed: 0.005,
            wind_noise_scale: 0.003,
            collision_stickiness: 2.0,
            horizontal_friction: 0.95,
            restitution: 0.0,
            static_threshold: 20.0,
            fade_duration: 3.0,
        }
    }
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<()> {
        let fields: [(&'static str, f32); 17] = [
            ("density", self.density),
            ("particleSize", self.particle_size),
            ("gravity", self.gravity),
            ("aeroScale", self.aero_scale),
            ("liftMax", self.lift_max),
            ("dragMin", self.drag_min),
            ("dragMax", self.drag_max),
            ("torqueStrength", self.torque_strength),
            ("rotDamping", self.rot_damping),
            ("windStrength", self.wind_strength),
            ("windNoiseSpeed", self.wind_noise_speed),
            ("windNoiseScale", self.wind_noise_scale),
            ("collisionStickiness", self.collision_stickiness),
            ("horizontalFriction", self.horizontal_friction),
            ("restitution", self.restitution),
            ("staticThreshold", self.static_threshold),
            ("fadeDuration", self.fade_duration),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(invalid(name, format!("must be finite, got {value}")));
            }
            // windStrength is the only signed field.
            if name != "windStrength" && value < 0.0 {
                return Err(invalid(name, format!("must be >= 0, got {value}")));
            }
        }
        if self.drag_max < self.drag_min {
            return Err(invalid(
                "dragMax",
                format!("must be >= dragMin ({}), got {}", self.drag_min, self.drag_max),
            ));
        }
        if self.fade_duration <= 0.0 {
            return Err(invalid("fadeDuration", "must be > 0".to_string()));
        }
        Ok(())
    }

    /// Clamp values left over from older project files.
    pub fn sanitize_legacy(&mut self) {
        if self.particle_size > config::LEGACY_PARTICLE_SIZE_MAX {
            warn!(
                "legacy particle size {} detected, resetting to {}",
                self.particle_size,
                config::LEGACY_PARTICLE_SIZE_RESET
            );
            self.particle_size = config::LEGACY_PARTICLE_SIZE_RESET;
        }
    }
}

fn invalid(name: &'static str, reason: String) -> Error {
    Error::InvalidParameter { name, reason }
}

/// Obstacles, settings and backdrop shape loaded from a project file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Backdrop width divided by height.
    pub aspect: f32,
    pub obstacles: Vec<Obstacle>,
    pub settings: SimulationParameters,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            aspect: config::DEFAULT_ASPECT,
            obstacles: Vec::new(),
            settings: SimulationParameters::default(),
        }
    }
}

impl Project {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let project = Self::from_json(&raw)?;
        info!(
            "loaded project {} ({} obstacles)",
            path.display(),
            project.obstacles.len()
        );
        Ok(project)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut project: Project = serde_json::from_str(raw)?;
        project.settings.sanitize_legacy();
        project.validate()?;
        Ok(project)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.aspect.is_finite() || self.aspect <= 0.0 {
            return Err(invalid("aspect", format!("must be > 0, got {}", self.aspect)));
        }
        for obs in &self.obstacles {
            let values = [obs.x, obs.y, obs.width, obs.height];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidObstacle {
                    id: obs.id.clone(),
                    reason: "coordinates must be finite".to_string(),
                });
            }
            if obs.width <= 0.0 || obs.height <= 0.0 {
                return Err(Error::InvalidObstacle {
                    id: obs.id.clone(),
                    reason: "width and height must be > 0".to_string(),
                });
            }
        }
        self.settings.validate()
    }

    pub fn world_size(&self) -> (f32, f32) {
        (
            config::WORLD_WIDTH,
            (config::WORLD_WIDTH / self.aspect).round(),
        )
    }
}
