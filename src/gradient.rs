//! Colors and color ramps used to tint terrain faces
//!
//! Biomes carry a `Gradient` that is sampled with the vertex noise
//! normalized inside the biome's band, and a flat `Color` for wall faces.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Linear RGBA color with components in 0.0-1.0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    /// Returned by color lookups that fall outside every biome
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// Build an opaque color from 0-255 channel values
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Color::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Quantize to 8-bit channels with rounding
    pub fn to_rgba8(self) -> [u8; 4] {
        let quantize = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b), quantize(self.a)]
    }

    /// Raw bit pattern, used where colors take part in hash keys
    pub fn to_bits(self) -> [u32; 4] {
        bytemuck::cast(self)
    }

    /// Blend two colors with linear interpolation
    ///
    /// # Arguments
    /// * `other` - Target color
    /// * `t` - Blend factor (0.0 = self, 1.0 = other), clamped
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r * (1.0 - t) + other.r * t,
            g: self.g * (1.0 - t) + other.g * t,
            b: self.b * (1.0 - t) + other.b * t,
            a: self.a * (1.0 - t) + other.a * t,
        }
    }
}

/// A color stop on a gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientKey {
    /// Position of the stop in 0.0-1.0
    pub time: f32,
    pub color: Color,
}

/// Piecewise linear color ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GradientKey>", into = "Vec<GradientKey>")]
pub struct Gradient {
    keys: Vec<GradientKey>,
}

impl Gradient {
    /// Create a gradient from color stops in any order
    pub fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Gradient { keys }
    }

    /// Gradient that evaluates to `color` everywhere
    pub fn solid(color: Color) -> Self {
        Gradient::new(vec![GradientKey { time: 0.0, color }])
    }

    /// Two-stop gradient from `start` at 0.0 to `end` at 1.0
    pub fn linear(start: Color, end: Color) -> Self {
        Gradient::new(vec![
            GradientKey { time: 0.0, color: start },
            GradientKey { time: 1.0, color: end },
        ])
    }

    pub fn keys(&self) -> &[GradientKey] {
        &self.keys
    }

    /// Sample the gradient at `t`
    ///
    /// Values before the first stop or after the last one take that stop's
    /// color. An empty gradient is white.
    pub fn evaluate(&self, t: f32) -> Color {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::WHITE,
        };

        if t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }

        for pair in self.keys.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if t <= to.time {
                let span = to.time - from.time;
                if span <= 0.0 {
                    return to.color;
                }
                return from.color.lerp(to.color, (t - from.time) / span);
            }
        }

        last.color
    }
}

impl From<Vec<GradientKey>> for Gradient {
    fn from(keys: Vec<GradientKey>) -> Self {
        Gradient::new(keys)
    }
}

impl From<Gradient> for Vec<GradientKey> {
    fn from(gradient: Gradient) -> Self {
        gradient.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_lerp() {
        let black = Color::rgb(0.0, 0.0, 0.0);
        let white = Color::WHITE;

        let mid = black.lerp(white, 0.5);
        assert_eq!(mid.r, 0.5);
        assert_eq!(mid.g, 0.5);
        assert_eq!(mid.b, 0.5);
        assert_eq!(mid.a, 1.0);

        // Blend factor is clamped
        assert_eq!(black.lerp(white, 2.0), white);
        assert_eq!(black.lerp(white, -1.0), black);
    }

    #[test]
    fn test_gradient_evaluate_between_keys() {
        let gradient = Gradient::linear(Color::rgb(0.0, 0.0, 0.0), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(gradient.evaluate(0.25).r, 0.25);
        assert_eq!(gradient.evaluate(0.0).r, 0.0);
        assert_eq!(gradient.evaluate(1.0).r, 1.0);
    }

    #[test]
    fn test_gradient_clamps_outside_keys() {
        let green = Color::rgb(0.0, 1.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        let gradient = Gradient::new(vec![
            GradientKey { time: 0.8, color: blue },
            GradientKey { time: 0.2, color: green },
        ]);

        // Keys are sorted on construction
        assert_eq!(gradient.keys()[0].color, green);
        assert_eq!(gradient.evaluate(0.0), green);
        assert_eq!(gradient.evaluate(1.0), blue);
        assert!((gradient.evaluate(0.5).g - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_solid_and_empty_gradients() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        assert_eq!(Gradient::solid(red).evaluate(0.7), red);
        assert_eq!(Gradient::new(Vec::new()).evaluate(0.3), Color::WHITE);
    }

    #[test]
    fn test_color_quantization() {
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::from_rgb8(10, 20, 30).to_rgba8(), [10, 20, 30, 255]);
    }

    #[test]
    fn test_gradient_json_is_key_list() {
        let json = r#"[{"time": 0.0, "color": {"r": 0.0, "g": 0.5, "b": 1.0}}]"#;
        let gradient: Gradient = serde_json::from_str(json).unwrap();
        let color = gradient.evaluate(0.5);
        assert_eq!(color, Color::rgb(0.0, 0.5, 1.0));
    }
}
