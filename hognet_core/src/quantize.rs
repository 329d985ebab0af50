//! Deterministic rounding of floats onto a fixed-step lattice.
//!
//! Two machines stepping the same physics from the same inputs can still disagree because of
//! floating-point noise. Every value that feeds force accumulation (directions, dot products,
//! forces, velocities) is passed through the [`Quantizer`] so that small differences collapse
//! onto the same lattice point.
//!
//! Three precision tiers are exposed:
//! - [`Precision::Default`]: forces, velocities and most intermediate values
//! - [`Precision::Input`]: player controls, coarse on purpose
//! - [`Precision::High`]: positions, where a coarse lattice would be visible
use bevy_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Round `value` to the nearest multiple of `1 / precision`.
///
/// Non-finite values and a zero precision are returned unchanged.
pub fn quantize(value: f32, precision: u32) -> f32 {
    if precision == 0 || !value.is_finite() {
        return value;
    }
    let precision = precision as f32;
    (value * precision).round() / precision
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    Default,
    Input,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    pub default_precision: u32,
    pub input_precision: u32,
    pub high_precision: u32,
    /// When false every quantizer helper is the identity
    pub enabled: bool,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            default_precision: 1000,
            input_precision: 100,
            high_precision: 10000,
            enabled: true,
        }
    }
}

impl QuantizeConfig {
    pub fn precision(&self, tier: Precision) -> u32 {
        match tier {
            Precision::Default => self.default_precision,
            Precision::Input => self.input_precision,
            Precision::High => self.high_precision,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quantizer {
    config: QuantizeConfig,
}

impl Quantizer {
    pub fn new(config: QuantizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuantizeConfig {
        &self.config
    }

    pub fn at(&self, value: f32, tier: Precision) -> f32 {
        if !self.config.enabled {
            return value;
        }
        quantize(value, self.config.precision(tier))
    }

    pub fn float(&self, value: f32) -> f32 {
        self.at(value, Precision::Default)
    }

    pub fn input(&self, value: f32) -> f32 {
        self.at(value, Precision::Input)
    }

    pub fn high(&self, value: f32) -> f32 {
        self.at(value, Precision::High)
    }

    pub fn vec3_at(&self, v: Vec3, tier: Precision) -> Vec3 {
        Vec3::new(self.at(v.x, tier), self.at(v.y, tier), self.at(v.z, tier))
    }

    pub fn vec3(&self, v: Vec3) -> Vec3 {
        self.vec3_at(v, Precision::Default)
    }

    /// Positions use the high precision tier
    pub fn position(&self, v: Vec3) -> Vec3 {
        self.vec3_at(v, Precision::High)
    }

    /// Quantize, normalize, then quantize again so the result is both unit-length and on the lattice.
    ///
    /// A zero vector stays zero.
    pub fn normalize(&self, v: Vec3) -> Vec3 {
        self.vec3(self.vec3(v).normalize_or_zero())
    }

    /// Direction vectors used in force computations
    pub fn direction(&self, v: Vec3) -> Vec3 {
        self.normalize(v)
    }

    /// Component-wise quantization followed by renormalization.
    ///
    /// A degenerate quaternion becomes the identity rotation.
    pub fn quat(&self, q: Quat) -> Quat {
        if !self.config.enabled {
            return q;
        }
        let tier = Precision::High;
        let quantized = Quat::from_xyzw(
            self.at(q.x, tier),
            self.at(q.y, tier),
            self.at(q.z, tier),
            self.at(q.w, tier),
        );
        if quantized.length_squared() <= f32::EPSILON {
            return Quat::IDENTITY;
        }
        quantized.normalize()
    }

    pub fn dot(&self, a: Vec3, b: Vec3) -> f32 {
        self.float(self.vec3(a).dot(self.vec3(b)))
    }

    pub fn cross(&self, a: Vec3, b: Vec3) -> Vec3 {
        self.vec3(self.vec3(a).cross(self.vec3(b)))
    }

    /// Linear interpolation with `t` clamped to `[0, 1]`
    pub fn lerp(&self, a: f32, b: f32, t: f32) -> f32 {
        let t = self.float(t.clamp(0.0, 1.0));
        self.float(a + (b - a) * t)
    }
}


#[cfg(test)]
mod properties {
    use super::quantize;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn quantize_is_idempotent(
            x in -100.0f32..100.0,
            p in prop::sample::select(vec![100u32, 1000, 10000]),
        ) {
            let once = quantize(x, p);
            prop_assert_eq!(quantize(once, p), once);
        }
    }
}
