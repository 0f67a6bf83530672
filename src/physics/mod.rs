//! Rigid-body seam used by the simulation, plus a small built-in engine.
//!
//! The simulation only talks to [`RigidBodyEngine`]; [`BodyWorld`] is the
//! implementation the binary ships with. It integrates oriented rectangles
//! at a fixed step, resolves contacts with impulses and reports the pairs
//! that started touching during the step.

mod collide;
mod world;

pub use world::BodyWorld;

use crate::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Particle,
    Obstacle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    pub is_static: bool,
    pub friction: f32,
    pub restitution: f32,
}

impl BodyDesc {
    pub fn obstacle(position: Vec2, width: f32, height: f32, friction: f32) -> Self {
        Self {
            kind: BodyKind::Obstacle,
            position,
            angle: 0.0,
            width,
            height,
            is_static: true,
            friction,
            restitution: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub is_static: bool,
}

/// A pair of bodies that started touching during the last step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionEvent {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Contact normal, pointing from `a` to `b`.
    pub normal: Vec2,
    /// Speed of each body as it entered the contact, before resolution.
    pub impact_speed: [f32; 2],
}

impl CollisionEvent {
    /// The other body and this body's impact speed, if `handle` is part of the pair.
    pub fn involving(&self, handle: BodyHandle) -> Option<(BodyHandle, f32)> {
        if self.a == handle {
            Some((self.b, self.impact_speed[0]))
        } else if self.b == handle {
            Some((self.a, self.impact_speed[1]))
        } else {
            None
        }
    }
}

pub trait RigidBodyEngine {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Returns `false` when the handle was already gone.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn set_static(&mut self, handle: BodyHandle, is_static: bool);

    /// Accumulates a force at the centre of mass until the next step.
    fn apply_force(&mut self, handle: BodyHandle, force: Vec2);

    /// Overwrites the torque accumulator until the next step.
    fn set_torque(&mut self, handle: BodyHandle, torque: f32);

    fn body(&self, handle: BodyHandle) -> Option<BodyState>;

    fn set_gravity(&mut self, gravity: f32);

    fn step(&mut self, dt_ms: f32);

    /// Moves queued collision-start events into `out`.
    fn drain_collisions(&mut self, out: &mut Vec<CollisionEvent>);

    fn body_count(&self) -> usize;

    /// Releases every body.
    fn clear(&mut self);
}
