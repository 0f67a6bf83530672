use std::time::Instant;

use crate::{config, types::SimulationStats};

/// Samples tick spacing so the stats sink can report a wall-clock FPS.
pub struct StatsAggregator {
    window_start: Option<Instant>,
    ticks: u64,
    fps: f32,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            window_start: None,
            ticks: 0,
            fps: 0.0,
        }
    }

    /// Counts a tick. Returns the stats to publish when `frame` lands on the
    /// reporting interval.
    pub fn on_tick(
        &mut self,
        frame: u64,
        now: Instant,
        counts: impl FnOnce() -> SimulationStats,
    ) -> Option<SimulationStats> {
        let start = *self.window_start.get_or_insert(now);
        self.ticks += 1;
        if frame % config::STATS_INTERVAL_FRAMES != 0 {
            return None;
        }
        let elapsed = now.duration_since(start).as_secs_f32();
        if elapsed > 0.0 {
            self.fps = self.ticks as f32 / elapsed;
        }
        self.window_start = Some(now);
        self.ticks = 0;
        Some(SimulationStats {
            fps: self.fps,
            ..counts()
        })
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
