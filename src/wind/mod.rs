//! Deterministic wind field.
//!
//! Value noise over a hashed lattice, so the same position and frame always
//! yield the same gust. Nothing here holds state; the field is re-derived
//! from parameters and the frame counter alone, which keeps fixed-length
//! recordings reproducible.

use crate::{params::SimulationParameters, types::Vec2};

const HASH_X: f64 = 12.9898;
const HASH_Y: f64 = 78.233;
const HASH_T: f64 = 0.5;
const HASH_K: f64 = 43758.5453;

const WIND_X_GAIN: f32 = 10.0;
const WIND_Y_GAIN: f32 = 5.0;
/// Lattice offset decorrelating the vertical component from the horizontal.
const WIND_Y_OFFSET: f64 = 100.0;

/// Lattice hash in [0, 1).
fn lattice_hash(ix: f64, iy: f64, t: f64) -> f64 {
    let v = (ix * HASH_X + iy * HASH_Y + t * HASH_T).sin() * HASH_K;
    v - v.floor()
}

/// Smoothstep-blended value noise, C1 across cell borders.
pub fn noise2d(x: f64, y: f64, t: f64) -> f64 {
    let ix = x.floor();
    let iy = y.floor();
    let fx = x - ix;
    let fy = y - iy;
    let a = lattice_hash(ix, iy, t);
    let b = lattice_hash(ix + 1.0, iy, t);
    let c = lattice_hash(ix, iy + 1.0, t);
    let d = lattice_hash(ix + 1.0, iy + 1.0, t);
    let ux = fx * fx * (3.0 - 2.0 * fx);
    let uy = fy * fy * (3.0 - 2.0 * fy);
    a * (1.0 - ux) + b * ux + (c - a) * uy * (1.0 - ux) + (d - b) * ux * uy
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindField {
    pub strength: f32,
    pub noise_speed: f32,
    pub noise_scale: f32,
}

impl WindField {
    pub fn from_params(params: &SimulationParameters) -> Self {
        Self {
            strength: params.wind_strength,
            noise_speed: params.wind_noise_speed,
            noise_scale: params.wind_noise_scale,
        }
    }

    pub fn sample(&self, pos: Vec2, frame: u64) -> Vec2 {
        let scale = f64::from(self.noise_scale);
        let nx = f64::from(pos.x) * scale;
        let ny = f64::from(pos.y) * scale;
        let nt = frame as f64 * f64::from(self.noise_speed);
        let wx = self.strength + noise2d(nx, ny, nt) as f32 * WIND_X_GAIN;
        let wy = noise2d(nx + WIND_Y_OFFSET, ny, nt) as f32 * WIND_Y_GAIN;
        Vec2::new(wx, wy)
    }
}
