//! Scripted parameter timeline for recordings and auto-loop.
//!
//! The timeline never writes to the base parameters. Each frame it yields a
//! [`DirectorOverride`] that is merged over a fresh copy of them.

use crate::{config, params::SimulationParameters};

const INTRO_END: u64 = 300;
const BUILD_END: u64 = 1200;
const STORM_END: u64 = 1600;

const INTRO_DENSITY: f32 = 2.0;
const BUILD_DENSITY_PEAK: f32 = 20.0;
const BUILD_WIND_AMPLITUDE: f32 = 5.0;
const BUILD_WIND_RATE: f32 = 0.01;
const STORM_WIND: f32 = 15.0;
const STORM_GRAVITY: f32 = 0.05;
const KILL_FADE_STEP: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectorPhase {
    Intro,
    Build,
    Storm,
    Kill,
}

impl DirectorPhase {
    pub fn label(self) -> &'static str {
        match self {
            DirectorPhase::Intro => "intro",
            DirectorPhase::Build => "build",
            DirectorPhase::Storm => "storm",
            DirectorPhase::Kill => "kill",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectorOverride {
    pub density: Option<f32>,
    pub wind_strength: Option<f32>,
    pub gravity: Option<f32>,
    /// Opacity removed from every particle this frame.
    pub fade_step: Option<f32>,
}

impl DirectorOverride {
    pub fn apply(&self, base: &SimulationParameters) -> SimulationParameters {
        let mut live = base.clone();
        if let Some(density) = self.density {
            live.density = density;
        }
        if let Some(wind) = self.wind_strength {
            live.wind_strength = wind;
        }
        if let Some(gravity) = self.gravity {
            live.gravity = gravity;
        }
        live
    }
}

pub fn phase_at(frame: u64) -> (DirectorPhase, u64) {
    let t = frame % config::LOOP_FRAMES;
    let phase = if t < INTRO_END {
        DirectorPhase::Intro
    } else if t < BUILD_END {
        DirectorPhase::Build
    } else if t < STORM_END {
        DirectorPhase::Storm
    } else {
        DirectorPhase::Kill
    };
    (phase, t)
}

pub fn override_at(frame: u64) -> DirectorOverride {
    let (phase, t) = phase_at(frame);
    match phase {
        DirectorPhase::Intro => DirectorOverride {
            density: Some(INTRO_DENSITY),
            wind_strength: Some(0.0),
            ..DirectorOverride::default()
        },
        DirectorPhase::Build => {
            let progress = (t - INTRO_END) as f32 / (BUILD_END - INTRO_END) as f32;
            DirectorOverride {
                density: Some(INTRO_DENSITY + progress * (BUILD_DENSITY_PEAK - INTRO_DENSITY)),
                wind_strength: Some((t as f32 * BUILD_WIND_RATE).sin() * BUILD_WIND_AMPLITUDE),
                ..DirectorOverride::default()
            }
        }
        DirectorPhase::Storm => DirectorOverride {
            density: Some(0.0),
            wind_strength: Some(STORM_WIND),
            gravity: Some(STORM_GRAVITY),
            fade_step: None,
        },
        DirectorPhase::Kill => DirectorOverride {
            density: Some(0.0),
            fade_step: Some(KILL_FADE_STEP),
            ..DirectorOverride::default()
        },
    }
}
