//! Separating-axis test between oriented rectangles.

use crate::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub center: Vec2,
    pub half: Vec2,
    pub axes: [Vec2; 2],
}

impl Obb {
    pub fn new(center: Vec2, half: Vec2, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            center,
            half,
            axes: [Vec2::new(cos, sin), Vec2::new(-sin, cos)],
        }
    }

    fn project_radius(&self, axis: Vec2) -> f32 {
        self.half.x * axis.dot(self.axes[0]).abs() + self.half.y * axis.dot(self.axes[1]).abs()
    }

    /// Half extents of the world-aligned box enclosing this one.
    pub fn aabb_half(&self) -> Vec2 {
        Vec2::new(
            self.project_radius(Vec2::X),
            self.project_radius(Vec2::Y),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first box towards the second.
    pub normal: Vec2,
    pub depth: f32,
}

pub fn aabb_overlap(a: &Obb, b: &Obb) -> bool {
    let d = (b.center - a.center).abs();
    let reach = a.aabb_half() + b.aabb_half();
    d.x < reach.x && d.y < reach.y
}

pub fn obb_overlap(a: &Obb, b: &Obb) -> Option<Contact> {
    let d = b.center - a.center;
    let mut best: Option<Contact> = None;
    for axis in a.axes.iter().chain(b.axes.iter()).copied() {
        let dist = d.dot(axis);
        let overlap = a.project_radius(axis) + b.project_radius(axis) - dist.abs();
        if overlap <= 0.0 {
            return None;
        }
        if best.is_none_or(|c| overlap < c.depth) {
            let normal = if dist < 0.0 { -axis } else { axis };
            best = Some(Contact {
                normal,
                depth: overlap,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    fn square(x: f32, y: f32, half: f32, angle: f32) -> Obb {
        Obb::new(Vec2::new(x, y), Vec2::splat(half), angle)
    }

    mod obb_overlap_fn {
        use super::*;

        #[test]
        fn separated_boxes_do_not_touch() {
            let a = square(0.0, 0.0, 1.0, 0.0);
            let b = square(3.0, 0.0, 1.0, 0.0);
            assert!(obb_overlap(&a, &b).is_none());
        }

        #[test]
        fn overlap_reports_min_axis() {
            let a = square(0.0, 0.0, 1.0, 0.0);
            let b = square(0.0, 1.5, 1.0, 0.0);
            let contact = obb_overlap(&a, &b).unwrap();
            assert!((contact.depth - 0.5).abs() < 1e-5);
            assert!((contact.normal - Vec2::Y).length() < 1e-5);
        }

        #[test]
        fn normal_points_from_first_to_second() {
            let a = square(0.0, 0.0, 1.0, 0.0);
            let b = square(-1.5, 0.0, 1.0, 0.0);
            let contact = obb_overlap(&a, &b).unwrap();
            assert!((contact.normal - Vec2::NEG_X).length() < 1e-5);
        }

        #[test]
        fn rotated_box_uses_its_own_axes() {
            // A diamond whose corner pokes into the square's top face.
            let a = square(0.0, 0.0, 1.0, 0.0);
            let b = square(0.0, 2.3, 1.0, FRAC_PI_4);
            let contact = obb_overlap(&a, &b).unwrap();
            assert!((contact.depth - (1.0 + 2f32.sqrt() - 2.3)).abs() < 1e-4);
            assert!(contact.normal.y > 0.9);
        }

        #[test]
        fn diamond_gap_is_detected() {
            // The AABBs overlap, the rotated shapes do not.
            let a = square(0.0, 0.0, 1.0, FRAC_PI_4);
            let b = square(2.2, 2.2, 1.0, FRAC_PI_4);
            assert!(aabb_overlap(&a, &b));
            assert!(obb_overlap(&a, &b).is_none());
        }
    }

    mod aabb_half {
        use super::*;

        #[test]
        fn rotated_square_grows_to_diagonal() {
            let half = square(0.0, 0.0, 1.0, FRAC_PI_4).aabb_half();
            assert!((half.x - 2f32.sqrt()).abs() < 1e-5);
            assert!((half.y - 2f32.sqrt()).abs() < 1e-5);
        }
    }
}
