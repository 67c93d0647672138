//! Layered height noise for the terrain
//!
//! Heights are fractal Perlin noise sampled at each vertex. The raw sums are
//! tracked by a `HeightBounds` accumulator so they can be normalized once the
//! whole batch is known, and then faded out towards the border of the
//! sample region.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use rayon::prelude::*;

use crate::rng::{Stream, stage_rng};
use crate::settings::NoiseSettings;

/// Spread of the seeded offset applied to every sample
const RANDOM_OFFSET_RANGE: f64 = 10_000.0;

/// Running minimum and maximum of raw heights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightBounds {
    pub min: f32,
    pub max: f32,
}

impl HeightBounds {
    /// Bounds that contain nothing yet
    pub fn empty() -> Self {
        HeightBounds {
            min: f32::MAX,
            max: f32::MIN,
        }
    }

    pub fn include(self, height: f32) -> Self {
        HeightBounds {
            min: self.min.min(height),
            max: self.max.max(height),
        }
    }

    pub fn merge(self, other: HeightBounds) -> Self {
        HeightBounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Position of `height` between min and max, or 0 when the range is empty
    pub fn normalize(&self, height: f32) -> f32 {
        if self.max > self.min {
            inverse_lerp(self.min, self.max, height)
        } else {
            0.0
        }
    }
}

/// Seeded fractal noise sampler
pub struct HeightNoise {
    settings: NoiseSettings,
    perlin: Perlin,
    random_offset: [f64; 2],
}

impl HeightNoise {
    /// Create a sampler whose offset is drawn from the seed's noise stream
    pub fn new(settings: &NoiseSettings, seed: u64) -> Self {
        let mut rng = stage_rng(seed, Stream::NoiseOffset);
        let random_offset = [
            (rng.r#gen::<f64>() - 0.5) * RANDOM_OFFSET_RANGE,
            (rng.r#gen::<f64>() - 0.5) * RANDOM_OFFSET_RANGE,
        ];

        HeightNoise {
            settings: settings.clone(),
            perlin: Perlin::new(Perlin::DEFAULT_SEED),
            random_offset,
        }
    }

    /// Raw, unnormalized height at a ground-plane point
    ///
    /// Sums `octaves` layers, each remapped to -1..1 and weighted by an
    /// amplitude that shrinks by `persistence` while the frequency grows by
    /// `lacunarity`.
    pub fn height(&self, point: Vec2) -> f32 {
        let scale = self.settings.scale as f64;
        let offset = self.settings.offset.as_dvec2();

        let mut height = 0.0f64;
        let mut amplitude = 1.0f64;
        let mut frequency = 1.0f64;
        for _ in 0..self.settings.octaves {
            let sample_x = point.x as f64 / scale * frequency + offset.x + self.random_offset[0];
            let sample_y = point.y as f64 / scale * frequency + offset.y + self.random_offset[1];

            let noise = self.sample(sample_x, sample_y) * 2.0 - 1.0;
            height += noise * amplitude;

            amplitude *= self.settings.persistence as f64;
            frequency *= self.settings.lacunarity as f64;
        }

        height as f32
    }

    /// Coherent noise in 0..1
    fn sample(&self, x: f64, y: f64) -> f64 {
        ((self.perlin.get([x, y]) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Sample every point in parallel and reduce the bounds afterwards
    pub fn heights(&self, points: &[Vec2]) -> (Vec<f32>, HeightBounds) {
        let heights: Vec<f32> = points.par_iter().map(|p| self.height(*p)).collect();
        let bounds = heights
            .par_iter()
            .fold(HeightBounds::empty, |bounds, &h| bounds.include(h))
            .reduce(HeightBounds::empty, HeightBounds::merge);
        (heights, bounds)
    }
}

/// Remap every height into 0..1 using the batch bounds
pub fn normalize_heights(heights: &mut [f32], bounds: &HeightBounds) {
    for height in heights.iter_mut() {
        *height = bounds.normalize(*height);
    }
}

/// Fade heights to zero towards the border of the sample region
///
/// The border distance of a point is `max(|x| / (w/2), |y| / (h/2))`. Inside
/// `fall_off.x..=fall_off.y` the height is blended toward zero, beyond
/// `fall_off.y` it is zero.
///
/// # Arguments
/// * `points` - Ground-plane positions, centered on the origin
/// * `heights` - Normalized heights, updated in place
/// * `sample_region` - Width and depth of the region
/// * `fall_off` - Start and end of the fade as normalized border distances
pub fn add_fall_off(points: &[Vec2], heights: &mut [f32], sample_region: Vec2, fall_off: Vec2) {
    let half_region = sample_region / 2.0;
    for (point, height) in points.iter().zip(heights.iter_mut()) {
        let distance = (point.x.abs() / half_region.x).max(point.y.abs() / half_region.y);
        if distance >= fall_off.x && distance <= fall_off.y {
            let t = inverse_lerp(fall_off.x, fall_off.y, distance);
            *height = lerp(*height, 0.0, t);
        } else if distance > fall_off.y {
            *height = 0.0;
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Clamped position of `value` between `a` and `b`, 0 when they are equal
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid(size: usize, spacing: f32) -> Vec<Vec2> {
        let half = size as f32 * spacing / 2.0;
        (0..size * size)
            .map(|i| Vec2::new((i % size) as f32 * spacing - half, (i / size) as f32 * spacing - half))
            .collect()
    }

    #[test]
    fn test_heights_are_reproducible() {
        let settings = NoiseSettings::default();
        let points = sample_grid(16, 1.7);

        let (a, bounds_a) = HeightNoise::new(&settings, 12).heights(&points);
        let (b, bounds_b) = HeightNoise::new(&settings, 12).heights(&points);
        assert_eq!(a, b);
        assert_eq!(bounds_a, bounds_b);

        let (c, _) = HeightNoise::new(&settings, 13).heights(&points);
        assert_ne!(a, c, "Different seeds should give different terrain");
    }

    #[test]
    fn test_bounds_match_sequential_scan() {
        let settings = NoiseSettings::default();
        let points = sample_grid(20, 2.3);
        let (heights, bounds) = HeightNoise::new(&settings, 5).heights(&points);

        let expected = heights
            .iter()
            .fold(HeightBounds::empty(), |b, &h| b.include(h));
        assert_eq!(bounds, expected);
        assert!(bounds.min < bounds.max);
    }

    #[test]
    fn test_normalized_heights_in_unit_range() {
        for octaves in 1..=8 {
            let settings = NoiseSettings {
                octaves,
                persistence: 0.6,
                lacunarity: 2.5,
                ..NoiseSettings::default()
            };
            let points = sample_grid(24, 1.3);
            let (mut heights, bounds) = HeightNoise::new(&settings, 77).heights(&points);
            normalize_heights(&mut heights, &bounds);

            for h in &heights {
                assert!((0.0..=1.0).contains(h), "Height {h} outside 0..1 for {octaves} octaves");
            }
            assert!(heights.iter().any(|&h| h == 0.0));
            assert!(heights.iter().any(|&h| h == 1.0));
        }
    }

    #[test]
    fn test_flat_bounds_normalize_to_zero() {
        let bounds = HeightBounds::empty().include(0.4);
        let mut heights = vec![0.4, 0.4];
        normalize_heights(&mut heights, &bounds);
        assert_eq!(heights, vec![0.0, 0.0]);
    }

    #[test]
    fn test_fall_off() {
        let region = Vec2::new(20.0, 10.0);
        let fall_off = Vec2::new(0.5, 0.9);
        let points = vec![
            Vec2::ZERO,              // centre, untouched
            Vec2::new(4.0, 0.0),     // distance 0.4, before the fade
            Vec2::new(7.0, 0.0),     // distance 0.7, halfway through the fade
            Vec2::new(0.0, 4.75),    // distance 0.95, past the fade
            Vec2::new(-12.0, 8.0),   // outside the region entirely
        ];
        let mut heights = vec![0.8; points.len()];
        add_fall_off(&points, &mut heights, region, fall_off);

        assert_eq!(heights[0], 0.8);
        assert_eq!(heights[1], 0.8);
        assert!((heights[2] - 0.4).abs() < 1e-5);
        assert_eq!(heights[3], 0.0);
        assert_eq!(heights[4], 0.0);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(0.25, 0.75, 0.5), 0.5);
        assert_eq!(inverse_lerp(0.2, 0.6, 1.0), 1.0);
        assert_eq!(inverse_lerp(0.2, 0.6, 0.0), 0.0);
        assert_eq!(inverse_lerp(0.3, 0.3, 0.3), 0.0);
    }
}
