use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    config,
    core::Simulation,
    params::{Project, SimulationParameters},
    render::{self, FrameBuffer, Ink},
    types::{Particle, SimulationStats, Vec2},
};

const DENSITY_STEP: f32 = 5.0;

/// Startup toggles taken from the command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiOptions {
    pub auto_loop: bool,
    pub record: bool,
}

pub fn run(project: Project, seed: u64, options: UiOptions) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &project, seed, options);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    project: &Project,
    seed: u64,
    options: UiOptions,
) -> Result<()> {
    let mut state = UiState::new(options.auto_loop);
    state.start(project, seed);
    if options.record {
        state.start_recording(Instant::now());
    }

    let frame_dt = config::FRAME_MS / 1000.0;
    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    let mut accumulator = 0.0_f32;
    let mut last_tick = Instant::now();
    let mut last_render = Instant::now();

    loop {
        let now = Instant::now();
        accumulator += (now - last_tick).as_secs_f32();
        last_tick = now;

        if let Some(sim) = state.sim.as_mut() {
            let stats = &mut state.stats;
            while accumulator >= frame_dt {
                sim.tick(|s| *stats = s);
                accumulator -= frame_dt;
            }
        } else {
            accumulator = 0.0;
        }
        state.expire_recording(now);

        while event::poll(Duration::from_millis(0))? {
            let CrosstermEvent::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    state.stop();
                    return Ok(());
                }
                KeyCode::Char(' ') => {
                    if state.sim.is_some() {
                        state.stop();
                    } else {
                        state.start(project, seed);
                    }
                }
                KeyCode::Char('c') => {
                    if let Some(sim) = state.sim.as_mut() {
                        sim.clear_particles();
                    }
                }
                KeyCode::Char('+') => state.nudge_density(DENSITY_STEP),
                KeyCode::Char('-') => state.nudge_density(-DENSITY_STEP),
                KeyCode::Char('r') => state.start_recording(Instant::now()),
                KeyCode::Char('l') => state.toggle_auto_loop(),
                _ => {}
            }
        }

        if last_render.elapsed() >= render_interval {
            if let Some(sim) = state.sim.as_ref() {
                sim.snapshot(&mut state.particles);
            } else {
                state.particles.clear();
            }
            let header_text = state.header(now);
            let world = state.world_size(project);
            let obstacles = state
                .sim
                .as_ref()
                .map_or(project.obstacles.as_slice(), |sim| sim.obstacles());
            terminal.draw(|frame| {
                let size = frame.size();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(size);

                let header = Paragraph::new(header_text)
                    .block(Block::default().borders(Borders::ALL).title("confetti-aero"));
                frame.render_widget(header, chunks[0]);

                let inner = Block::default().borders(Borders::ALL).inner(chunks[1]);
                let viewport = render::Viewport {
                    width: inner.width,
                    height: inner.height,
                };
                render::draw(
                    &state.particles,
                    obstacles,
                    world,
                    viewport,
                    &mut state.framebuf,
                );
                let canvas = Paragraph::new(lines(&state.framebuf))
                    .block(Block::default().borders(Borders::ALL).title("Backdrop"));
                frame.render_widget(canvas, chunks[1]);

                let footer = Paragraph::new(
                    "space: start/stop | c: clear | +/-: density | r: record | l: auto-loop | q: quit",
                )
                .block(Block::default().borders(Borders::ALL).title("Controls"));
                frame.render_widget(footer, chunks[2]);
            })?;
            last_render = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

struct UiState {
    sim: Option<Simulation>,
    stats: SimulationStats,
    particles: Vec<Particle>,
    framebuf: FrameBuffer,
    auto_loop: bool,
    recording_since: Option<Instant>,
    /// Base parameters of the last stopped run, reused by the next start.
    carried: Option<SimulationParameters>,
}

impl UiState {
    fn new(auto_loop: bool) -> Self {
        Self {
            sim: None,
            stats: SimulationStats::default(),
            particles: Vec::with_capacity(config::MAX_PHYSICS_BODIES),
            framebuf: FrameBuffer::new(0, 0),
            auto_loop,
            recording_since: None,
            carried: None,
        }
    }

    fn start(&mut self, project: &Project, seed: u64) {
        let mut sim = Simulation::new(project, seed);
        if let Some(params) = self.carried.take() {
            if let Err(err) = sim.set_params(params) {
                warn!("dropping carried parameters: {err}");
            }
        }
        sim.set_director(self.auto_loop);
        self.sim = Some(sim);
    }

    fn stop(&mut self) {
        if let Some(sim) = self.sim.take() {
            self.carried = Some(sim.params().clone());
            sim.shutdown();
        }
        self.recording_since = None;
        self.stats = SimulationStats::default();
    }

    fn start_recording(&mut self, now: Instant) {
        if let Some(sim) = self.sim.as_mut() {
            sim.start_recording();
            self.recording_since = Some(now);
        }
    }

    fn expire_recording(&mut self, now: Instant) {
        let Some(since) = self.recording_since else {
            return;
        };
        if now.duration_since(since) < Duration::from_secs(config::RECORDING_SECS) {
            return;
        }
        self.recording_since = None;
        info!("recording finished");
        if let Some(sim) = self.sim.as_mut() {
            sim.set_director(self.auto_loop);
        }
    }

    fn toggle_auto_loop(&mut self) {
        self.auto_loop = !self.auto_loop;
        info!("auto-loop {}", if self.auto_loop { "on" } else { "off" });
        let director = self.auto_loop || self.recording_since.is_some();
        if let Some(sim) = self.sim.as_mut() {
            sim.set_director(director);
        }
    }

    /// Adjusts the base density; the director may still override it.
    fn nudge_density(&mut self, delta: f32) {
        let Some(sim) = self.sim.as_mut() else {
            return;
        };
        let mut params = sim.params().clone();
        params.density = (params.density + delta).max(0.0);
        let density = params.density;
        if let Err(err) = sim.set_params(params) {
            warn!("density change rejected: {err}");
            return;
        }
        info!("density set to {density}");
    }

    fn world_size(&self, project: &Project) -> Vec2 {
        match self.sim.as_ref() {
            Some(sim) => sim.world_size(),
            None => {
                let (w, h) = project.world_size();
                Vec2::new(w, h)
            }
        }
    }

    fn header(&self, now: Instant) -> String {
        let Some(sim) = self.sim.as_ref() else {
            return "stopped | space: start".to_string();
        };
        let mut text = format!(
            "fps: {:.1} | total: {} | falling: {} | static: {} | density: {:.0} | frame: {}",
            self.stats.fps,
            self.stats.total_particles,
            self.stats.active_particles,
            self.stats.static_particles,
            sim.live_params().density,
            sim.frame()
        );
        if let Some(phase) = sim.director_phase() {
            text.push_str(&format!(" | director: {}", phase.label()));
        }
        if let Some(since) = self.recording_since {
            let left = config::RECORDING_SECS.saturating_sub(now.duration_since(since).as_secs());
            text.push_str(&format!(" | REC {left}s"));
        }
        if self.auto_loop {
            text.push_str(" | loop");
        }
        text
    }
}

fn lines(framebuf: &FrameBuffer) -> Vec<Line<'static>> {
    (0..framebuf.height())
        .map(|y| {
            let spans: Vec<Span> = (0..framebuf.width())
                .map(|x| {
                    let cell = framebuf.get(x, y);
                    Span::styled(cell.ch.to_string(), Style::default().fg(color_for(cell.ink)))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn color_for(ink: Ink) -> Color {
    match ink {
        Ink::Blank => Color::Reset,
        Ink::Obstacle => Color::DarkGray,
        Ink::Confetti(color) => {
            let [r, g, b] = color.rgb();
            Color::Rgb(r, g, b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColorId;

    mod color_for_fn {
        use super::*;

        #[test]
        fn confetti_uses_palette_rgb() {
            assert_eq!(
                color_for(Ink::Confetti(ColorId::Gold)),
                Color::Rgb(0xFF, 0xD7, 0x00)
            );
            assert_eq!(color_for(Ink::Obstacle), Color::DarkGray);
        }
    }

    mod ui_state {
        use super::*;

        #[test]
        fn recording_times_out_back_to_auto_loop_setting() {
            let mut state = UiState::new(false);
            state.start(&Project::default(), 1);
            let t0 = Instant::now();
            state.start_recording(t0);
            assert!(state.sim.as_ref().unwrap().director_phase().is_some());

            state.expire_recording(t0 + Duration::from_secs(29));
            assert!(state.recording_since.is_some());

            state.expire_recording(t0 + Duration::from_secs(config::RECORDING_SECS));
            assert!(state.recording_since.is_none());
            assert!(state.sim.as_ref().unwrap().director_phase().is_none());
        }

        #[test]
        fn auto_loop_keeps_director_after_recording() {
            let mut state = UiState::new(true);
            state.start(&Project::default(), 1);
            let t0 = Instant::now();
            state.start_recording(t0);
            state.expire_recording(t0 + Duration::from_secs(31));
            assert!(state.sim.as_ref().unwrap().director_phase().is_some());
        }

        #[test]
        fn recording_needs_a_running_simulation() {
            let mut state = UiState::new(false);
            state.start_recording(Instant::now());
            assert!(state.recording_since.is_none());
        }

        #[test]
        fn restart_keeps_density_changes() {
            let mut state = UiState::new(false);
            state.start(&Project::default(), 1);
            state.nudge_density(DENSITY_STEP);
            let density = state.sim.as_ref().unwrap().params().density;
            state.stop();
            state.start(&Project::default(), 1);
            assert_eq!(state.sim.as_ref().unwrap().params().density, density);
            assert_eq!(density, SimulationParameters::default().density + DENSITY_STEP);
        }

        #[test]
        fn stop_releases_simulation() {
            let mut state = UiState::new(false);
            state.start(&Project::default(), 1);
            state.toggle_auto_loop();
            assert!(state.sim.as_ref().unwrap().director_phase().is_some());
            state.stop();
            assert!(state.sim.is_none());
            assert_eq!(state.header(Instant::now()), "stopped | space: start");
        }
    }
}
