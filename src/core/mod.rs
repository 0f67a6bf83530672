pub mod director;
pub mod emission;
pub mod lifecycle;
pub mod stats;

use std::time::Instant;

use log::{debug, info, trace};

use crate::{
    aero::{self, AeroCoefficients, ForceTables, PlateState},
    config,
    error::Result,
    params::{Project, SimulationParameters},
    physics::{BodyDesc, BodyHandle, BodyKind, BodyWorld, RigidBodyEngine},
    types::{
        ActiveView, BakedParticle, ColorId, LifecycleState, Obstacle, Particle, ParticleId,
        SimulationStats, Vec2,
    },
    wind::WindField,
};

use director::{DirectorOverride, DirectorPhase};
use emission::{Emitter, SpawnRequest};
use lifecycle::Lifecycle;
use stats::StatsAggregator;

/// A particle backed by a physics body. Kinematics live in the engine.
#[derive(Clone, Debug)]
pub struct ActiveParticle {
    pub id: ParticleId,
    pub body: BodyHandle,
    pub width: f32,
    pub height: f32,
    pub area: f32,
    pub color: ColorId,
    pub opacity: f32,
    pub created_at: u64,
    pub state: LifecycleState,
}

pub struct Simulation<E: RigidBodyEngine = BodyWorld> {
    engine: E,
    params: SimulationParameters,
    live: SimulationParameters,
    obstacles: Vec<Obstacle>,
    obstacle_bodies: Vec<BodyHandle>,
    world_size: Vec2,
    active: Vec<ActiveParticle>,
    baked: Vec<BakedParticle>,
    emitter: Emitter,
    lifecycle: Lifecycle,
    stats: StatsAggregator,
    tables: &'static ForceTables,
    spawns: Vec<SpawnRequest>,
    frame: u64,
    next_id: ParticleId,
    director: bool,
    dropped_spawns: u64,
}

impl Simulation<BodyWorld> {
    pub fn new(project: &Project, seed: u64) -> Self {
        Self::with_engine(BodyWorld::new(project.settings.gravity), project, seed)
    }
}

impl<E: RigidBodyEngine> Simulation<E> {
    pub fn with_engine(mut engine: E, project: &Project, seed: u64) -> Self {
        let (width, height) = project.world_size();
        let world_size = Vec2::new(width, height);
        let obstacle_bodies = build_world(&mut engine, &project.obstacles, world_size);
        info!(
            "simulation started: {width}x{height} world, {} obstacles, seed {seed:#x}",
            project.obstacles.len()
        );
        Self {
            engine,
            params: project.settings.clone(),
            live: project.settings.clone(),
            obstacles: project.obstacles.clone(),
            obstacle_bodies,
            world_size,
            active: Vec::with_capacity(config::MAX_PHYSICS_BODIES),
            baked: Vec::new(),
            emitter: Emitter::new(seed),
            lifecycle: Lifecycle::new(),
            stats: StatsAggregator::new(),
            tables: ForceTables::shared(),
            spawns: Vec::new(),
            frame: 0,
            next_id: 0,
            director: false,
            dropped_spawns: 0,
        }
    }

    /// Advances one fixed 16.667 ms frame. `on_stats` fires every 20th frame.
    pub fn tick(&mut self, mut on_stats: impl FnMut(SimulationStats)) {
        self.frame += 1;
        let frame = self.frame;

        let over = if self.director {
            director::override_at(frame)
        } else {
            DirectorOverride::default()
        };
        self.live = over.apply(&self.params);
        self.engine.set_gravity(self.live.gravity);

        if let Some(step) = over.fade_step {
            self.fade_all(step);
        }

        self.emit();
        self.apply_aerodynamics();
        self.engine.step(config::FRAME_MS);

        let newly_stuck = self.lifecycle.apply_collisions(
            &mut self.engine,
            &mut self.active,
            frame,
            self.live.collision_stickiness,
        );
        let pass = self.lifecycle.bookkeeping(
            &mut self.engine,
            &mut self.active,
            &mut self.baked,
            frame,
            &self.live,
            self.world_size,
        );
        if newly_stuck + pass.baked + pass.removed > 0 {
            trace!(
                "frame {frame}: {newly_stuck} stuck, {} baked, {} removed",
                pass.baked, pass.removed
            );
        }

        let (active, baked) = (&self.active, &self.baked);
        if let Some(stats) = self
            .stats
            .on_tick(frame, Instant::now(), || count(active, baked))
        {
            on_stats(stats);
        }
    }

    /// Removes every particle from both tiers. Obstacles stay.
    pub fn clear_particles(&mut self) {
        for particle in self.active.drain(..) {
            self.engine.remove_body(particle.body);
        }
        self.baked.clear();
        info!("cleared particles at frame {}", self.frame);
    }

    /// Releases every physics body, obstacles included.
    pub fn shutdown(mut self) {
        self.active.clear();
        self.baked.clear();
        self.engine.clear();
        info!(
            "simulation stopped at frame {} ({} spawns dropped at capacity)",
            self.frame, self.dropped_spawns
        );
    }

    pub fn set_director(&mut self, enabled: bool) {
        if self.director != enabled {
            info!("director {}", if enabled { "on" } else { "off" });
        }
        self.director = enabled;
    }

    pub fn director_phase(&self) -> Option<DirectorPhase> {
        self.director.then(|| director::phase_at(self.frame).0)
    }

    /// Enables the director and restarts its timeline from frame 0.
    pub fn start_recording(&mut self) {
        self.frame = 0;
        self.stats.reset();
        self.set_director(true);
        info!("recording started");
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Parameters in effect for the last frame, director overrides included.
    pub fn live_params(&self) -> &SimulationParameters {
        &self.live
    }

    pub fn set_params(&mut self, params: SimulationParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Baked particles first, so active ones paint over them.
    pub fn snapshot(&self, out: &mut Vec<Particle>) {
        out.clear();
        out.extend(self.baked.iter().copied().map(Particle::Baked));
        for particle in &self.active {
            let Some(body) = self.engine.body(particle.body) else {
                continue;
            };
            out.push(Particle::Active(ActiveView {
                id: particle.id,
                pos: body.position,
                angle: body.angle,
                width: particle.width,
                height: particle.height,
                color: particle.color,
                opacity: particle.opacity,
                state: particle.state,
            }));
        }
    }

    pub fn stats(&self) -> SimulationStats {
        count(&self.active, &self.baked)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn baked_count(&self) -> usize {
        self.baked.len()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn world_size(&self) -> Vec2 {
        self.world_size
    }

    fn fade_all(&mut self, step: f32) {
        for particle in &mut self.active {
            particle.opacity = (particle.opacity - step).max(0.0);
        }
        for record in &mut self.baked {
            record.opacity = (record.opacity - step).max(0.0);
        }
    }

    fn emit(&mut self) {
        let mut spawns = std::mem::take(&mut self.spawns);
        self.emitter.emit(
            self.live.density,
            self.live.particle_size,
            self.world_size.x,
            &mut spawns,
        );
        // Checked once per frame: a single burst may overshoot the ceiling.
        if self.active.len() > config::MAX_PHYSICS_BODIES {
            if !spawns.is_empty() {
                self.dropped_spawns += spawns.len() as u64;
                debug!(
                    "frame {}: dropped {} spawns at capacity",
                    self.frame,
                    spawns.len()
                );
            }
        } else {
            for req in spawns.iter().copied() {
                self.spawn(req);
            }
        }
        self.spawns = spawns;
    }

    fn spawn(&mut self, req: SpawnRequest) {
        let body = self.engine.create_body(BodyDesc {
            kind: BodyKind::Particle,
            position: req.pos,
            angle: req.angle,
            width: req.width,
            height: req.height,
            is_static: false,
            friction: self.live.horizontal_friction,
            restitution: self.live.restitution,
        });
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(ActiveParticle {
            id,
            body,
            width: req.width,
            height: req.height,
            area: req.width * req.height / config::AREA_NORMALIZER,
            color: req.color,
            opacity: 1.0,
            created_at: self.frame,
            state: LifecycleState::Falling,
        });
    }

    fn apply_aerodynamics(&mut self) {
        let coeffs = AeroCoefficients::from_params(&self.live);
        let wind = WindField::from_params(&self.live);
        for particle in &self.active {
            if particle.state != LifecycleState::Falling {
                continue;
            }
            let Some(body) = self.engine.body(particle.body) else {
                continue;
            };
            let plate = PlateState {
                velocity: body.velocity,
                angle: body.angle,
                angular_velocity: body.angular_velocity,
                area: particle.area,
            };
            let gust = wind.sample(body.position, self.frame);
            if let Some(load) = aero::plate_load(&plate, gust, &coeffs, self.tables) {
                self.engine.apply_force(particle.body, load.force);
                self.engine.set_torque(particle.body, load.torque);
            }
        }
    }
}

fn count(active: &[ActiveParticle], baked: &[BakedParticle]) -> SimulationStats {
    let stuck = active.iter().filter(|p| p.state.is_stuck()).count();
    SimulationStats {
        fps: 0.0,
        total_particles: active.len() + baked.len(),
        active_particles: active.len().saturating_sub(stuck),
        static_particles: stuck + baked.len(),
    }
}

/// Static bodies for every obstacle plus a floor under the backdrop.
fn build_world<E: RigidBodyEngine>(
    engine: &mut E,
    obstacles: &[Obstacle],
    world: Vec2,
) -> Vec<BodyHandle> {
    let mut handles: Vec<_> = obstacles
        .iter()
        .map(|obs| {
            let (center, size) = obs.to_world(world);
            engine.create_body(BodyDesc::obstacle(
                center,
                size.x,
                size.y,
                config::OBSTACLE_FRICTION,
            ))
        })
        .collect();
    handles.push(engine.create_body(BodyDesc::obstacle(
        Vec2::new(world.x * 0.5, world.y + config::FLOOR_OFFSET),
        world.x * 2.0,
        config::FLOOR_THICKNESS,
        config::OBSTACLE_FRICTION,
    )));
    handles
}
