use std::sync::LazyLock;

pub const LUT_SIZE: usize = 1000;

static TABLES: LazyLock<ForceTables> = LazyLock::new(ForceTables::build);

/// `sin²α` and `sin 2α` sampled over `d = |v̂·n̂| = sin α` in [0, 1].
#[derive(Debug)]
pub struct ForceTables {
    sin_sq: Vec<f32>,
    sin_double: Vec<f32>,
}

impl ForceTables {
    pub fn shared() -> &'static ForceTables {
        &TABLES
    }

    pub fn build() -> Self {
        let mut sin_sq = Vec::with_capacity(LUT_SIZE + 1);
        let mut sin_double = Vec::with_capacity(LUT_SIZE + 1);
        for i in 0..=LUT_SIZE {
            let d = i as f64 / LUT_SIZE as f64;
            sin_sq.push((d * d) as f32);
            sin_double.push((2.0 * d * (1.0 - d * d).max(0.0).sqrt()) as f32);
        }
        Self { sin_sq, sin_double }
    }

    pub fn index(dot: f32) -> usize {
        // Float-to-int casts saturate and send NaN to 0.
        ((dot.clamp(0.0, 1.0) * LUT_SIZE as f32).floor() as usize).min(LUT_SIZE)
    }

    /// Returns `(sin²α, sin 2α)`.
    pub fn lookup(&self, dot: f32) -> (f32, f32) {
        let idx = Self::index(dot);
        (self.sin_sq[idx], self.sin_double[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RESOLUTION: f32 = 2.0 / LUT_SIZE as f32;

    mod build {
        use super::*;

        #[test]
        fn holds_n_plus_one_samples() {
            let tables = ForceTables::build();
            assert_eq!(tables.sin_sq.len(), LUT_SIZE + 1);
            assert_eq!(tables.sin_double.len(), LUT_SIZE + 1);
        }

        #[test]
        fn matches_closed_form_at_anchor_points() {
            let tables = ForceTables::shared();
            for d in [0.0f32, 0.5, 1.0] {
                let (sin_sq, sin_double) = tables.lookup(d);
                let expected_double = 2.0 * d * (1.0 - d * d).sqrt();
                assert!((sin_sq - d * d).abs() <= RESOLUTION, "sin² at {d}");
                assert!(
                    (sin_double - expected_double).abs() <= RESOLUTION,
                    "sin 2α at {d}"
                );
            }
        }

        #[test]
        fn sin_double_peaks_at_forty_five_degrees() {
            let (_, peak) = ForceTables::shared().lookup(std::f32::consts::FRAC_1_SQRT_2);
            assert!((peak - 1.0).abs() < 1e-3);
        }
    }

    mod index {
        use super::*;

        #[test]
        fn clamps_out_of_range_input() {
            assert_eq!(ForceTables::index(-3.0), 0);
            assert_eq!(ForceTables::index(1.7), LUT_SIZE);
            assert_eq!(ForceTables::index(f32::INFINITY), LUT_SIZE);
        }

        #[test]
        fn nan_maps_to_zero() {
            assert_eq!(ForceTables::index(f32::NAN), 0);
        }
    }

    proptest! {
        #[test]
        fn lookup_never_leaves_table(dot in proptest::num::f32::ANY) {
            let (sin_sq, sin_double) = ForceTables::shared().lookup(dot);
            prop_assert!((0.0..=1.0).contains(&sin_sq));
            prop_assert!((0.0..=1.0 + 1e-6).contains(&sin_double));
        }
    }
}
