use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config,
    types::{ColorId, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    pub pos: Vec2,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    pub color: ColorId,
}

/// Turns `density` into whole spawns using a carried-over fraction.
pub struct Emitter {
    accumulator: f32,
    rng: StdRng,
}

impl Emitter {
    pub fn new(seed: u64) -> Self {
        Self {
            accumulator: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn emit(
        &mut self,
        density: f32,
        particle_size: f32,
        world_width: f32,
        out: &mut Vec<SpawnRequest>,
    ) {
        out.clear();
        if density <= 0.0 {
            return;
        }
        self.accumulator += 1.0;
        let interval = config::EMISSION_FRAMES_PER_UNIT / density;
        while self.accumulator >= interval {
            self.accumulator -= interval;
            out.push(self.roll(particle_size, world_width));
        }
    }

    fn roll(&mut self, size: f32, world_width: f32) -> SpawnRequest {
        let width =
            size * self.rng.gen_range(config::SPAWN_WIDTH_MIN..config::SPAWN_WIDTH_MAX);
        let height =
            size * self.rng.gen_range(config::SPAWN_HEIGHT_MIN..config::SPAWN_HEIGHT_MAX);
        let x = if world_width > 0.0 {
            self.rng.gen_range(0.0..world_width)
        } else {
            0.0
        };
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let color = ColorId::ALL[self.rng.gen_range(0..ColorId::ALL.len())];
        SpawnRequest {
            pos: Vec2::new(x, config::SPAWN_Y),
            angle,
            width,
            height,
            color,
        }
    }
}
