//! Falling → Stuck → (Baked) → Removed.
//!
//! The lifecycle is the only writer of particle state. Collision events are
//! queued by the engine during its step and drained here once per frame;
//! the bookkeeping pass then ages, bakes and removes in a single sweep.

use std::collections::HashMap;

use log::{debug, trace};

use crate::{
    config,
    params::SimulationParameters,
    physics::{BodyHandle, CollisionEvent, RigidBodyEngine},
    types::{BakedParticle, LifecycleState, ParticleId, Vec2},
};

use super::ActiveParticle;

/// Opacity residue below this is treated as fully faded.
const FADE_EPSILON: f32 = 1e-4;

/// Impact gate for a Falling → Stuck transition.
///
/// `roll` in [0, 1) only matters for steep surfaces.
pub fn should_stick(impact_speed: f32, normal_y: f32, stickiness: f32, roll: f64) -> bool {
    impact_speed < stickiness
        && (normal_y.abs() > config::STICKY_NORMAL_Y_MIN || roll < config::STICKY_FALLBACK_CHANCE)
}

/// Deterministic uniform draw in [0, 1) for a particle on a given frame.
pub fn sticky_roll(id: ParticleId, frame: u64) -> f64 {
    let mut z = id
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(frame.rotate_left(32));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

/// Per-frame fade for something stuck since `since`, or 0 before the fade starts.
pub fn fade_decrement(since: u64, frame: u64, params: &SimulationParameters) -> f32 {
    let age = frame.saturating_sub(since) as f32;
    if age > params.static_threshold * config::SIM_HZ {
        1.0 / (params.fade_duration * config::SIM_HZ)
    } else {
        0.0
    }
}

/// True once `pos` has left the region the floor can still catch.
pub fn out_of_world(pos: Vec2, world: Vec2) -> bool {
    let floor_bottom = world.y + config::FLOOR_OFFSET + config::FLOOR_THICKNESS * 0.5;
    pos.y > floor_bottom + config::CULL_MARGIN
        || pos.x < -world.x * 0.5 - config::CULL_MARGIN
        || pos.x > world.x * 1.5 + config::CULL_MARGIN
}

fn fade(opacity: &mut f32, step: f32) {
    *opacity -= step;
    if *opacity < FADE_EPSILON {
        *opacity = 0.0;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub stuck: usize,
    pub baked: usize,
    pub removed: usize,
}

#[derive(Default)]
pub struct Lifecycle {
    events: Vec<CollisionEvent>,
    lookup: HashMap<BodyHandle, usize>,
    doomed: Vec<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the engine's collision queue and apply sticky transitions.
    /// Returns how many particles became Stuck.
    pub fn apply_collisions<E: RigidBodyEngine>(
        &mut self,
        engine: &mut E,
        active: &mut [ActiveParticle],
        frame: u64,
        stickiness: f32,
    ) -> usize {
        self.events.clear();
        engine.drain_collisions(&mut self.events);
        if self.events.is_empty() {
            return 0;
        }

        self.lookup.clear();
        self.lookup
            .extend(active.iter().enumerate().map(|(idx, p)| (p.body, idx)));

        let mut stuck = 0;
        for event in &self.events {
            for handle in [event.a, event.b] {
                let Some(&idx) = self.lookup.get(&handle) else {
                    continue;
                };
                let particle = &mut active[idx];
                if particle.state != LifecycleState::Falling {
                    continue;
                }
                let Some((other, impact_speed)) = event.involving(handle) else {
                    continue;
                };
                let other_static = engine.body(other).is_some_and(|b| b.is_static);
                if !other_static {
                    continue;
                }
                let roll = sticky_roll(particle.id, frame);
                if should_stick(impact_speed, event.normal.y, stickiness, roll) {
                    engine.set_static(particle.body, true);
                    particle.state = LifecycleState::Stuck { since: frame };
                    trace!(
                        "particle {} stuck after {} frames at {impact_speed:.2} px/frame",
                        particle.id,
                        frame.saturating_sub(particle.created_at)
                    );
                    stuck += 1;
                }
            }
        }
        stuck
    }

    /// Age, fade, bake and remove, in that order, over both tiers.
    /// Falling particles that left `world` are removed too.
    pub fn bookkeeping<E: RigidBodyEngine>(
        &mut self,
        engine: &mut E,
        active: &mut Vec<ActiveParticle>,
        baked: &mut Vec<BakedParticle>,
        frame: u64,
        params: &SimulationParameters,
        world: Vec2,
    ) -> PassReport {
        let mut report = PassReport::default();
        let over_capacity = active.len() > config::MAX_PHYSICS_BODIES;

        // Fade existing records first; particles baked below have already faded this frame.
        let baked_before = baked.len();
        for record in baked.iter_mut() {
            fade(&mut record.opacity, fade_decrement(record.stuck_since, frame, params));
        }
        baked.retain(|b| b.opacity > 0.0);
        report.removed += baked_before - baked.len();

        self.doomed.clear();
        self.doomed.resize(active.len(), false);

        for (idx, particle) in active.iter_mut().enumerate() {
            if particle.opacity <= 0.0 {
                self.doomed[idx] = true;
                continue;
            }
            let LifecycleState::Stuck { since } = particle.state else {
                if engine
                    .body(particle.body)
                    .is_some_and(|body| out_of_world(body.position, world))
                {
                    trace!("particle {} left the world", particle.id);
                    self.doomed[idx] = true;
                }
                continue;
            };
            report.stuck += 1;
            fade(&mut particle.opacity, fade_decrement(since, frame, params));

            if over_capacity
                && report.stuck > config::BAKE_MIN_STUCK
                && frame.saturating_sub(since) > config::BAKE_MIN_AGE_FRAMES
            {
                if let Some(body) = engine.body(particle.body) {
                    baked.push(BakedParticle {
                        pos: body.position,
                        angle: body.angle,
                        width: particle.width,
                        height: particle.height,
                        color: particle.color,
                        opacity: particle.opacity,
                        stuck_since: since,
                    });
                    report.baked += 1;
                }
                self.doomed[idx] = true;
            }
        }

        let mut idx = 0;
        let doomed = &self.doomed;
        active.retain(|particle| {
            let keep = !doomed[idx];
            idx += 1;
            if !keep {
                engine.remove_body(particle.body);
            }
            keep
        });
        let dropped = self.doomed.iter().filter(|d| **d).count();
        report.removed += dropped - report.baked;

        if report.baked > 0 {
            debug!(
                "frame {frame}: baked {} particles ({} active, {} baked)",
                report.baked,
                active.len(),
                baked.len()
            );
        }
        report
    }
}
