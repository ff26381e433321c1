//! Vector and interpolation helpers shared by every widget.
//!
//! Everything here is a pure function or a plain `Copy` value. Angles passed
//! to [`clerp`] are in degrees; rotations stored on widgets are radians.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn with_z(v: Vec2, z: f64) -> Self {
        Self::new(v.x, v.y, z)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Per-axis `lerp`.
    pub fn lerp(self, to: Vec3, t: f64) -> Vec3 {
        Vec3::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t), lerp(self.z, to.z, t))
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl Vec3 {
    pub fn get(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}

/// Measured width/height of a widget in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half(self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Closed scroll range along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: f64,
    pub end: f64,
}

impl Range {
    pub const UNBOUNDED: Range = Range {
        start: f64::NEG_INFINITY,
        end: f64::INFINITY,
    };

    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn clamp(self, n: f64) -> f64 {
        clamp(n, self.start, self.end)
    }

    pub fn contains(self, n: f64) -> bool {
        n >= self.start && n <= self.end
    }

    /// How far `n` lies outside the range (0 inside).
    pub fn overflow(self, n: f64) -> f64 {
        (self.start - n).max(n - self.end).max(0.0)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

/// Linear interpolation. `t` is not bounded.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Angular interpolation in degrees along the shorter arc.
///
/// The result is not re-wrapped into `[0, 360)`.
pub fn clerp(a: f64, b: f64, t: f64) -> f64 {
    let range = b - a;
    let a = if range > 180.0 {
        a + 360.0
    } else if range < -180.0 {
        a - 360.0
    } else {
        a
    };

    lerp(a, b, t)
}

/// Euclidean remainder: always in `[0, m)` for positive `m`.
pub fn modulo(a: f64, m: f64) -> f64 {
    ((a % m) + m) % m
}

/// Wrap `a` into `[min, max)`. A collapsed span returns `min`.
pub fn wrap(a: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return min;
    }
    modulo(a - min, span) + min
}

pub fn clamp(n: f64, min: f64, max: f64) -> f64 {
    n.max(min).min(max)
}

pub fn distance(a: f64, b: f64) -> f64 {
    (a - b).abs()
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Normalized RGB color, channels nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Build from 0–255 channel values.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Scale every channel; used to darken or brighten gradients.
    pub fn multiply(self, factor: f64) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }

    pub fn mix(self, other: Color, t: f64) -> Self {
        Self {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
        }
    }

    /// CSS-style `rgb(r, g, b)` string; channels are clamped to 0–255.
    pub fn to_rgb(self) -> String {
        let c = |v: f64| (clamp(v, 0.0, 1.0) * 255.0).round() as u8;
        format!("rgb({}, {}, {})", c(self.r), c(self.g), c(self.b))
    }

    /// Channels clamped to `[0, 1]` as `f32`, for renderer handoff.
    pub fn to_f32(self) -> [f32; 3] {
        [
            clamp(self.r, 0.0, 1.0) as f32,
            clamp(self.g, 0.0, 1.0) as f32,
            clamp(self.b, 0.0, 1.0) as f32,
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
