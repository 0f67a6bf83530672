use serde::{Deserialize, Serialize};

pub use glam::Vec2;

use crate::config;

pub type ParticleId = u64;

/// Static rectangle in normalized [0,1] backdrop coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(default)]
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    /// Centre and size in world pixels for a `world`-sized backdrop.
    pub fn to_world(&self, world: Vec2) -> (Vec2, Vec2) {
        let size = Vec2::new(self.width, self.height) * world;
        let min = Vec2::new(self.x, self.y) * world;
        (min + size * 0.5, size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorId {
    Red,
    White,
    Gold,
}

impl ColorId {
    pub const ALL: [ColorId; 3] = [ColorId::Red, ColorId::White, ColorId::Gold];

    pub fn rgb(self) -> [u8; 3] {
        config::PALETTE[self as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Falling,
    Stuck { since: u64 },
}

impl LifecycleState {
    pub fn is_stuck(self) -> bool {
        matches!(self, LifecycleState::Stuck { .. })
    }
}

/// Render-only record of a particle that left the physics set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BakedParticle {
    pub pos: Vec2,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    pub color: ColorId,
    pub opacity: f32,
    /// Frame the particle stuck on; baked records keep fading from it.
    pub stuck_since: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveView {
    pub id: ParticleId,
    pub pos: Vec2,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    pub color: ColorId,
    pub opacity: f32,
    pub state: LifecycleState,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Particle {
    Active(ActiveView),
    Baked(BakedParticle),
}

impl Particle {
    pub fn pos(&self) -> Vec2 {
        match self {
            Particle::Active(p) => p.pos,
            Particle::Baked(p) => p.pos,
        }
    }

    pub fn angle(&self) -> f32 {
        match self {
            Particle::Active(p) => p.angle,
            Particle::Baked(p) => p.angle,
        }
    }

    pub fn size(&self) -> Vec2 {
        match self {
            Particle::Active(p) => Vec2::new(p.width, p.height),
            Particle::Baked(p) => Vec2::new(p.width, p.height),
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Particle::Active(p) => p.opacity,
            Particle::Baked(p) => p.opacity,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub fps: f32,
    pub total_particles: usize,
    pub active_particles: usize,
    pub static_particles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod color_id {
        use super::*;

        #[test]
        fn palette_order_matches_variants() {
            assert_eq!(ColorId::Red.rgb(), [0xD1, 0x00, 0x00]);
            assert_eq!(ColorId::White.rgb(), [0xF2, 0xF2, 0xF2]);
            assert_eq!(ColorId::Gold.rgb(), [0xFF, 0xD7, 0x00]);
        }

        #[test]
        fn all_covers_palette() {
            assert_eq!(ColorId::ALL.len(), config::PALETTE.len());
        }
    }

    mod lifecycle_state {
        use super::*;

        #[test]
        fn only_stuck_reports_stuck() {
            assert!(!LifecycleState::Falling.is_stuck());
            assert!(LifecycleState::Stuck { since: 3 }.is_stuck());
        }
    }

    mod particle {
        use super::*;

        fn baked() -> BakedParticle {
            BakedParticle {
                pos: Vec2::new(4.0, 5.0),
                angle: 0.5,
                width: 3.0,
                height: 2.0,
                color: ColorId::Gold,
                opacity: 0.25,
                stuck_since: 12,
            }
        }

        #[test]
        fn accessors_read_baked_fields() {
            let p = Particle::Baked(baked());
            assert_eq!(p.pos(), Vec2::new(4.0, 5.0));
            assert_eq!(p.angle(), 0.5);
            assert_eq!(p.size(), Vec2::new(3.0, 2.0));
            assert_eq!(p.opacity(), 0.25);
        }

        #[test]
        fn accessors_read_active_fields() {
            let p = Particle::Active(ActiveView {
                id: 7,
                pos: Vec2::new(1.0, 2.0),
                angle: 1.0,
                width: 4.0,
                height: 1.5,
                color: ColorId::Red,
                opacity: 1.0,
                state: LifecycleState::Falling,
            });
            assert_eq!(p.pos(), Vec2::new(1.0, 2.0));
            assert_eq!(p.size(), Vec2::new(4.0, 1.5));
            assert_eq!(p.opacity(), 1.0);
        }
    }

    mod obstacle {
        use super::*;

        #[test]
        fn deserializes_without_id() {
            let obs: Obstacle =
                serde_json::from_str(r#"{"x":0.1,"y":0.2,"width":0.3,"height":0.4}"#).unwrap();
            assert_eq!(obs.id, "");
            assert_eq!(obs.width, 0.3);
        }

        #[test]
        fn scales_to_world_pixels() {
            let obs = Obstacle {
                id: "shelf".to_string(),
                x: 0.25,
                y: 0.5,
                width: 0.5,
                height: 0.1,
            };
            let (center, size) = obs.to_world(Vec2::new(1920.0, 1080.0));
            assert_eq!(size, Vec2::new(960.0, 108.0));
            assert_eq!(center, Vec2::new(960.0, 594.0));
        }
    }
}
