//! Stylized lift/drag model for thin plates tumbling through air.

mod lut;

pub use lut::{ForceTables, LUT_SIZE};

use crate::{params::SimulationParameters, types::Vec2};

/// Relative airflow below this squared speed produces no load.
pub const MIN_AIRFLOW_SQ: f32 = 0.01;
const TORQUE_GAIN: f32 = 0.01;
const DAMPING_GAIN: f32 = 100.0;

/// Coefficients copied out of the live parameters once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AeroCoefficients {
    pub aero_scale: f32,
    pub lift_max: f32,
    pub drag_min: f32,
    pub drag_range: f32,
    pub torque_strength: f32,
    pub rot_damping: f32,
}

impl AeroCoefficients {
    pub fn from_params(params: &SimulationParameters) -> Self {
        Self {
            aero_scale: params.aero_scale,
            lift_max: params.lift_max,
            drag_min: params.drag_min,
            drag_range: params.drag_max - params.drag_min,
            torque_strength: params.torque_strength,
            rot_damping: params.rot_damping,
        }
    }
}

/// Kinematic state the model reads for one plate.
#[derive(Clone, Copy, Debug)]
pub struct PlateState {
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    /// Normalized area, `w * h / 100`.
    pub area: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AeroLoad {
    pub force: Vec2,
    pub torque: f32,
    pub lift_coefficient: f32,
    pub drag_coefficient: f32,
}

/// Force and torque on a plate in the given wind, or `None` when the
/// airflow is too weak to normalize.
pub fn plate_load(
    plate: &PlateState,
    wind: Vec2,
    coeffs: &AeroCoefficients,
    tables: &ForceTables,
) -> Option<AeroLoad> {
    let rel = plate.velocity - wind;
    let speed_sq = rel.length_squared();
    if speed_sq < MIN_AIRFLOW_SQ {
        return None;
    }

    let (sin_a, cos_a) = plate.angle.sin_cos();
    let normal = Vec2::new(-sin_a, cos_a);
    let v_hat = rel / speed_sq.sqrt();

    let dot = v_hat.dot(normal).abs();
    let (sin_sq_alpha, sin_2alpha) = tables.lookup(dot);

    let lift_coefficient = coeffs.lift_max * sin_2alpha;
    let drag_coefficient = coeffs.drag_min + coeffs.drag_range * sin_sq_alpha;

    let q_area = 0.5 * coeffs.aero_scale * plate.area * speed_sq;

    let drag = -v_hat * (q_area * drag_coefficient);

    let cross = v_hat.perp_dot(normal);
    let side = if cross > 0.0 { 1.0 } else { -1.0 };
    let lift_dir = v_hat.perp() * side;
    let lift = lift_dir * (q_area * lift_coefficient);

    let aero_torque = coeffs.torque_strength * q_area * sin_2alpha * side * TORQUE_GAIN;
    let damping = plate.angular_velocity * coeffs.rot_damping * DAMPING_GAIN;

    Some(AeroLoad {
        force: drag + lift,
        torque: aero_torque - damping,
        lift_coefficient,
        drag_coefficient,
    })
}
