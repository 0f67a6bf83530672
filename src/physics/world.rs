use std::collections::HashSet;

use crate::{
    config,
    spatial::SpatialHash,
    types::Vec2,
};

use super::{
    BodyDesc, BodyHandle, BodyKind, BodyState, CollisionEvent, RigidBodyEngine,
    collide::{Obb, aabb_overlap, obb_overlap},
};

#[derive(Clone, Debug)]
struct Body {
    kind: BodyKind,
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    angular_velocity: f32,
    half: Vec2,
    is_static: bool,
    friction: f32,
    restitution: f32,
    inv_mass: f32,
    inv_inertia: f32,
    force: Vec2,
    torque: f32,
}

impl Body {
    fn from_desc(desc: &BodyDesc) -> Self {
        let mut body = Self {
            kind: desc.kind,
            position: desc.position,
            velocity: Vec2::ZERO,
            angle: desc.angle,
            angular_velocity: 0.0,
            half: Vec2::new(desc.width * 0.5, desc.height * 0.5),
            is_static: false,
            friction: desc.friction,
            restitution: desc.restitution,
            inv_mass: 0.0,
            inv_inertia: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
        };
        body.set_static(desc.is_static);
        body
    }

    fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.inv_mass = 0.0;
            self.inv_inertia = 0.0;
        } else {
            let (w, h) = (self.half.x * 2.0, self.half.y * 2.0);
            let mass = (config::BODY_DENSITY * w * h).max(f32::EPSILON);
            let inertia = mass * (w * w + h * h) / 12.0 * config::INERTIA_SCALE;
            self.inv_mass = 1.0 / mass;
            self.inv_inertia = 1.0 / inertia.max(f32::EPSILON);
        }
    }

    fn obb(&self) -> Obb {
        Obb::new(self.position, self.half, self.angle)
    }

    fn reach(&self) -> f32 {
        self.half.length()
    }

    fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            velocity: self.velocity,
            angle: self.angle,
            angular_velocity: self.angular_velocity,
            is_static: self.is_static,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Fixed-step rectangle world with a spatial-hash broad phase.
///
/// Bodies live in generational slots and are always visited in slot order,
/// so a given sequence of calls produces the same trajectories every run.
pub struct BodyWorld {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    gravity: f32,
    grid: SpatialHash,
    /// Obstacles and the floor, tested against every dynamic body.
    obstacles: Vec<usize>,
    gridded: Vec<usize>,
    neighbors: Vec<usize>,
    contacts: HashSet<(BodyHandle, BodyHandle)>,
    next_contacts: HashSet<(BodyHandle, BodyHandle)>,
    events: Vec<CollisionEvent>,
}

impl BodyWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            gravity,
            grid: SpatialHash::new(config::CELL_SIZE),
            obstacles: Vec::new(),
            gridded: Vec::new(),
            neighbors: Vec::new(),
            contacts: HashSet::new(),
            next_contacts: HashSet::new(),
            events: Vec::new(),
        }
    }

    fn get(&self, handle: BodyHandle) -> Option<&Body> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.body.as_ref()
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.body.as_mut()
    }

    fn handle_at(&self, index: usize) -> BodyHandle {
        BodyHandle::new(index as u32, self.slots[index].generation)
    }

    fn integrate(&mut self, k: f32) {
        let gravity = Vec2::new(0.0, self.gravity * config::GRAVITY_SCALE);
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            if !body.is_static {
                let accel = gravity + body.force * body.inv_mass;
                body.velocity = ((body.velocity + accel * k) * (1.0 - config::AIR_FRICTION))
                    .clamp_length_max(config::MAX_LINEAR_SPEED);
                body.angular_velocity = (body.angular_velocity
                    + body.torque * body.inv_inertia * k)
                    .clamp(-config::MAX_ANGULAR_SPEED, config::MAX_ANGULAR_SPEED);
                body.position += body.velocity * k;
                body.angle += body.angular_velocity * k;
            }
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    fn rebuild_broad_phase(&mut self) -> f32 {
        self.grid.clear();
        self.obstacles.clear();
        self.gridded.clear();
        let mut max_reach = 0.0_f32;
        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(body) = slot.body.as_ref() else {
                continue;
            };
            if body.kind == BodyKind::Obstacle {
                self.obstacles.push(idx);
            } else {
                self.grid.insert(idx, body.position);
                self.gridded.push(idx);
                max_reach = max_reach.max(body.reach());
            }
        }
        max_reach
    }

    fn detect_and_resolve(&mut self) {
        let max_reach = self.rebuild_broad_phase();
        self.next_contacts.clear();

        let gridded = std::mem::take(&mut self.gridded);
        let mut neighbors = std::mem::take(&mut self.neighbors);
        for &i in &gridded {
            let Some(body) = self.slots[i].body.as_ref() else {
                continue;
            };
            if body.is_static {
                continue;
            }
            let range = self.grid.range_for(body.reach() + max_reach);
            self.grid
                .query_neighbors_range(body.position, range, &mut neighbors);
            for &j in &neighbors {
                if j == i {
                    continue;
                }
                let other_dynamic = self.slots[j].body.as_ref().is_some_and(|b| !b.is_static);
                // Dynamic pairs are handled once, from the lower slot.
                if other_dynamic && j < i {
                    continue;
                }
                self.collide_pair(i, j);
            }
            for s in 0..self.obstacles.len() {
                let j = self.obstacles[s];
                self.collide_pair(i, j);
            }
        }
        self.gridded = gridded;
        self.neighbors = neighbors;

        std::mem::swap(&mut self.contacts, &mut self.next_contacts);
    }

    fn collide_pair(&mut self, i: usize, j: usize) {
        let (a, b) = pair_mut(&mut self.slots, i, j);
        let (Some(a), Some(b)) = (a.body.as_mut(), b.body.as_mut()) else {
            return;
        };
        let (obb_a, obb_b) = (a.obb(), b.obb());
        if !aabb_overlap(&obb_a, &obb_b) {
            return;
        }
        let Some(contact) = obb_overlap(&obb_a, &obb_b) else {
            return;
        };
        let impact_speed = [a.velocity.length(), b.velocity.length()];
        resolve(a, b, contact.normal, contact.depth);

        let (ha, hb) = (self.handle_at(i), self.handle_at(j));
        let key = if ha < hb { (ha, hb) } else { (hb, ha) };
        self.next_contacts.insert(key);
        if !self.contacts.contains(&key) {
            self.events.push(CollisionEvent {
                a: ha,
                b: hb,
                normal: contact.normal,
                impact_speed,
            });
        }
    }
}

fn pair_mut(slots: &mut [Slot], i: usize, j: usize) -> (&mut Slot, &mut Slot) {
    debug_assert!(i != j, "pair_mut needs distinct slots");
    if i < j {
        let (left, right) = slots.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = slots.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

fn resolve(a: &mut Body, b: &mut Body, normal: Vec2, depth: f32) {
    let inv_sum = a.inv_mass + b.inv_mass;
    if inv_sum <= 0.0 {
        return;
    }

    let correction = normal * ((depth - config::CONTACT_SLOP).max(0.0) / inv_sum);
    a.position -= correction * a.inv_mass;
    b.position += correction * b.inv_mass;

    let rel = b.velocity - a.velocity;
    let along = rel.dot(normal);
    if along >= 0.0 {
        return;
    }

    let restitution = a.restitution.max(b.restitution);
    let j = -(1.0 + restitution) * along / inv_sum;
    let impulse = normal * j;
    a.velocity -= impulse * a.inv_mass;
    b.velocity += impulse * b.inv_mass;

    let friction = a.friction.min(b.friction);
    let rel = b.velocity - a.velocity;
    let tangent = rel - normal * rel.dot(normal);
    if let Some(t_hat) = tangent.try_normalize() {
        let jt = (-rel.dot(t_hat) / inv_sum).clamp(-friction * j, friction * j);
        let friction_impulse = t_hat * jt;
        a.velocity -= friction_impulse * a.inv_mass;
        b.velocity += friction_impulse * b.inv_mass;
    }

    // Contacts carry no angular impulse; friction bleeds spin instead.
    let spin_keep = (1.0 - 0.5 * friction).clamp(0.0, 1.0);
    a.angular_velocity *= spin_keep;
    b.angular_velocity *= spin_keep;
}

impl RigidBodyEngine for BodyWorld {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let body = Body::from_desc(&desc);
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle::new(index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle::new((self.slots.len() - 1) as u32, 0)
        }
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if slot.generation != handle.generation() || slot.body.is_none() {
            return false;
        }
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.live -= 1;
        true
    }

    fn set_static(&mut self, handle: BodyHandle, is_static: bool) {
        if let Some(body) = self.get_mut(handle) {
            body.set_static(is_static);
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.force += force;
        }
    }

    fn set_torque(&mut self, handle: BodyHandle, torque: f32) {
        if let Some(body) = self.get_mut(handle) {
            body.torque = torque;
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        self.get(handle).map(Body::state)
    }

    fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    fn step(&mut self, dt_ms: f32) {
        let k = dt_ms / config::FRAME_MS;
        self.integrate(k);
        self.detect_and_resolve();
    }

    fn drain_collisions(&mut self, out: &mut Vec<CollisionEvent>) {
        out.append(&mut self.events);
    }

    fn body_count(&self) -> usize {
        self.live
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.body.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free = (0..self.slots.len() as u32).rev().collect();
        self.live = 0;
        self.contacts.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(x: f32, y: f32) -> BodyDesc {
        BodyDesc {
            kind: BodyKind::Particle,
            position: Vec2::new(x, y),
            angle: 0.0,
            width: 4.0,
            height: 2.0,
            is_static: false,
            friction: 0.9,
            restitution: 0.0,
        }
    }

    fn floor(world: &mut BodyWorld, y: f32) -> BodyHandle {
        world.create_body(BodyDesc::obstacle(Vec2::new(500.0, y + 50.0), 2000.0, 100.0, 1.0))
    }

    fn run(world: &mut BodyWorld, frames: usize) {
        for _ in 0..frames {
            world.step(config::FRAME_MS);
        }
    }

    mod handles {
        use super::*;

        #[test]
        fn removed_handle_is_stale() {
            let mut world = BodyWorld::new(0.0);
            let h = world.create_body(particle(0.0, 0.0));
            assert!(world.remove_body(h));
            assert!(world.body(h).is_none());
            assert!(!world.remove_body(h));
            let reused = world.create_body(particle(1.0, 1.0));
            assert_eq!(reused.index(), h.index());
            assert_ne!(reused, h);
            assert_eq!(world.body_count(), 1);
        }

        #[test]
        fn clear_releases_everything() {
            let mut world = BodyWorld::new(0.25);
            let h = world.create_body(particle(0.0, 0.0));
            floor(&mut world, 10.0);
            world.clear();
            assert_eq!(world.body_count(), 0);
            assert!(world.body(h).is_none());
        }
    }

    mod integration {
        use super::*;

        #[test]
        fn gravity_accelerates_dynamic_bodies() {
            let mut world = BodyWorld::new(1.0);
            let h = world.create_body(particle(0.0, 0.0));
            world.step(config::FRAME_MS);
            let state = world.body(h).unwrap();
            assert!(state.velocity.y > 0.0);
            assert!(state.position.y > 0.0);
        }

        #[test]
        fn static_bodies_do_not_move() {
            let mut world = BodyWorld::new(1.0);
            let h = world.create_body(particle(0.0, 0.0));
            world.set_static(h, true);
            world.apply_force(h, Vec2::new(5.0, 5.0));
            run(&mut world, 10);
            assert_eq!(world.body(h).unwrap().position, Vec2::ZERO);
        }

        #[test]
        fn forces_are_consumed_by_one_step() {
            let mut world = BodyWorld::new(0.0);
            let h = world.create_body(particle(0.0, 0.0));
            world.apply_force(h, Vec2::new(0.1, 0.0));
            world.step(config::FRAME_MS);
            let after_push = world.body(h).unwrap().velocity.x;
            world.step(config::FRAME_MS);
            let coasting = world.body(h).unwrap().velocity.x;
            assert!(after_push > 0.0);
            assert!(coasting <= after_push);
        }

        #[test]
        fn torque_spins_and_is_clamped() {
            let mut world = BodyWorld::new(0.0);
            let h = world.create_body(particle(0.0, 0.0));
            world.set_torque(h, 1.0e6);
            world.step(config::FRAME_MS);
            let spin = world.body(h).unwrap().angular_velocity;
            assert_eq!(spin, config::MAX_ANGULAR_SPEED);
        }
    }

    mod contacts {
        use super::*;

        #[test]
        fn falling_body_lands_and_reports_once() {
            let mut world = BodyWorld::new(1.0);
            let h = world.create_body(particle(500.0, 90.0));
            let ground = floor(&mut world, 100.0);
            let mut events = Vec::new();
            for _ in 0..120 {
                world.step(config::FRAME_MS);
                world.drain_collisions(&mut events);
            }
            let hits: Vec<_> = events.iter().filter(|e| e.involving(h).is_some()).collect();
            assert_eq!(hits.len(), 1);
            let (other, _) = hits[0].involving(h).unwrap();
            assert_eq!(other, ground);
            assert!(hits[0].normal.y.abs() > 0.5);

            let state = world.body(h).unwrap();
            assert!(state.position.y < 100.0);
            assert!(state.velocity.y.abs() < 0.5);
        }

        #[test]
        fn impact_speed_is_measured_before_resolution() {
            let mut world = BodyWorld::new(0.0);
            let h = world.create_body(particle(500.0, 95.0));
            floor(&mut world, 100.0);
            world.apply_force(h, Vec2::new(0.0, 2.0));
            let mut events = Vec::new();
            for _ in 0..10 {
                world.step(config::FRAME_MS);
                world.drain_collisions(&mut events);
                if !events.is_empty() {
                    break;
                }
            }
            let (_, speed) = events[0].involving(h).unwrap();
            assert!(speed > 1.0);
            assert!(world.body(h).unwrap().velocity.length() < speed);
        }

        #[test]
        fn dynamic_bodies_push_each_other_apart() {
            let mut world = BodyWorld::new(0.0);
            let a = world.create_body(particle(0.0, 0.0));
            let b = world.create_body(particle(3.0, 0.0));
            world.step(config::FRAME_MS);
            let pa = world.body(a).unwrap().position;
            let pb = world.body(b).unwrap().position;
            assert!(pb.x - pa.x > 3.0);
        }

        #[test]
        fn drained_events_are_not_repeated() {
            let mut world = BodyWorld::new(0.0);
            world.create_body(particle(0.0, 0.0));
            world.create_body(particle(3.0, 0.0));
            world.step(config::FRAME_MS);
            let mut events = Vec::new();
            world.drain_collisions(&mut events);
            assert_eq!(events.len(), 1);
            let mut again = Vec::new();
            world.drain_collisions(&mut again);
            assert!(again.is_empty());
        }
    }
}
