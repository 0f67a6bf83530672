use crate::types::{ColorId, Obstacle, Particle, Vec2};

const OBSTACLE_WEIGHT: f32 = -1.0;

#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

/// What a cell was painted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ink {
    Blank,
    Obstacle,
    Confetti(ColorId),
}

#[derive(Clone, Copy, Debug)]
pub struct RenderCell {
    pub ch: char,
    /// Paint priority; the strongest write to a cell wins.
    pub weight: f32,
    pub ink: Ink,
}

const BLANK: RenderCell = RenderCell {
    ch: ' ',
    weight: f32::NEG_INFINITY,
    ink: Ink::Blank,
};

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        self.cells.resize(len, BLANK);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    fn set(&mut self, x: i32, y: i32, ch: char, weight: f32, ink: Ink) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if weight >= cell.weight {
            *cell = RenderCell { ch, weight, ink };
        }
    }
}

/// Maps world pixels onto viewport cells, stretching to fill.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    scale: Vec2,
}

impl Projection {
    pub fn new(world: Vec2, viewport: Viewport) -> Self {
        let cells = Vec2::new(viewport.width as f32, viewport.height as f32);
        let scale = if world.x > 0.0 && world.y > 0.0 {
            cells / world
        } else {
            Vec2::ZERO
        };
        Self { scale }
    }

    pub fn cell(&self, pos: Vec2) -> (i32, i32) {
        let p = pos * self.scale;
        (p.x.floor() as i32, p.y.floor() as i32)
    }
}

pub fn glyph_for(opacity: f32) -> char {
    if opacity >= 0.75 {
        '█'
    } else if opacity >= 0.5 {
        '▓'
    } else if opacity >= 0.25 {
        '▒'
    } else {
        '░'
    }
}

pub fn draw(
    particles: &[Particle],
    obstacles: &[Obstacle],
    world: Vec2,
    viewport: Viewport,
    frame: &mut FrameBuffer,
) {
    if frame.width() != viewport.width || frame.height() != viewport.height {
        frame.resize(viewport.width, viewport.height);
    } else {
        frame.clear();
    }
    let projection = Projection::new(world, viewport);

    for obstacle in obstacles {
        draw_outline(obstacle, world, &projection, frame);
    }

    for particle in particles {
        let opacity = particle.opacity();
        if opacity <= 0.0 {
            continue;
        }
        let ink = match particle {
            Particle::Active(p) => Ink::Confetti(p.color),
            Particle::Baked(p) => Ink::Confetti(p.color),
        };
        let (sin, cos) = particle.angle().sin_cos();
        let half = particle.size() * 0.5;
        let extent = Vec2::new(
            cos.abs() * half.x + sin.abs() * half.y,
            sin.abs() * half.x + cos.abs() * half.y,
        );
        let (x0, y0) = projection.cell(particle.pos() - extent);
        let (x1, y1) = projection.cell(particle.pos() + extent);
        let ch = glyph_for(opacity);
        for y in y0..=y1 {
            for x in x0..=x1 {
                frame.set(x, y, ch, opacity, ink);
            }
        }
    }
}

fn draw_outline(obstacle: &Obstacle, world: Vec2, projection: &Projection, frame: &mut FrameBuffer) {
    let (center, size) = obstacle.to_world(world);
    let (x0, y0) = projection.cell(center - size * 0.5);
    let (x1, y1) = projection.cell(center + size * 0.5);
    for x in x0..=x1 {
        frame.set(x, y0, '─', OBSTACLE_WEIGHT, Ink::Obstacle);
        frame.set(x, y1, '─', OBSTACLE_WEIGHT, Ink::Obstacle);
    }
    for y in y0..=y1 {
        frame.set(x0, y, '│', OBSTACLE_WEIGHT, Ink::Obstacle);
        frame.set(x1, y, '│', OBSTACLE_WEIGHT, Ink::Obstacle);
    }
    if x1 > x0 && y1 > y0 {
        frame.set(x0, y0, '┌', OBSTACLE_WEIGHT, Ink::Obstacle);
        frame.set(x1, y0, '┐', OBSTACLE_WEIGHT, Ink::Obstacle);
        frame.set(x0, y1, '└', OBSTACLE_WEIGHT, Ink::Obstacle);
        frame.set(x1, y1, '┘', OBSTACLE_WEIGHT, Ink::Obstacle);
    }
}
