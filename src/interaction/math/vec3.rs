use rand::{self, Rng};
use std::ops;

/// Vectors shorter than this cannot be normalized.
pub const NORMALIZE_EPSILON: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 3]> for Vec3 {
    #[inline(always)]
    fn from(value: [f64; 3]) -> Self {
        Vec3::new(value[0], value[1], value[2])
    }
}

impl From<[f32; 3]> for Vec3 {
    #[inline(always)]
    fn from(value: [f32; 3]) -> Self {
        Vec3::new(value[0] as f64, value[1] as f64, value[2] as f64)
    }
}

impl ops::Add<Vec3> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl ops::Sub<Vec3> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl ops::Neg for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl ops::Mul<f64> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: f64) -> Self::Output {
        Vec3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl ops::Div<f64> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn div(self, rhs: f64) -> Self::Output {
        Vec3 {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

impl Vec3 {
    #[inline(always)]
    pub fn zero() -> Vec3 {
        Vec3::new(0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub fn one() -> Vec3 {
        Vec3::new(1.0, 1.0, 1.0)
    }

    #[inline(always)]
    pub fn x_axis() -> Vec3 {
        Vec3::new(1.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub fn y_axis() -> Vec3 {
        Vec3::new(0.0, 1.0, 0.0)
    }

    #[inline(always)]
    pub fn z_axis() -> Vec3 {
        Vec3::new(0.0, 0.0, 1.0)
    }

    /// Random point inside the axis-aligned box spanned by `min` and `max`.
    pub fn random_between(rng: &mut impl Rng, min: Vec3, max: Vec3) -> Vec3 {
        let dx = rng.gen_range(0.0..=1.0);
        let dy = rng.gen_range(0.0..=1.0);
        let dz = rng.gen_range(0.0..=1.0);
        Vec3::new(
            min.x + (max.x - min.x) * dx,
            min.y + (max.y - min.y) * dy,
            min.z + (max.z - min.z) * dz,
        )
    }

    #[inline(always)]
    pub fn new(x: f64, y: f64, z: f64) -> Vec3 {
        Vec3 { x, y, z }
    }

    #[inline(always)]
    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline(always)]
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline(always)]
    pub fn distance(self, other: Vec3) -> f64 {
        (self - other).len()
    }

    #[inline(always)]
    pub fn squared_len(self) -> f64 {
        self.dot(self)
    }

    #[inline(always)]
    pub fn len(self) -> f64 {
        self.squared_len().sqrt()
    }

    /// Unchecked normalization, the caller guarantees a non-zero vector.
    #[inline(always)]
    pub fn normalize(self) -> Vec3 {
        self / self.len()
    }

    /// Normalization that refuses zero-length and non-finite vectors.
    pub fn try_normalize(self) -> Option<Vec3> {
        let len = self.len();
        if !len.is_finite() || len < NORMALIZE_EPSILON {
            return None;
        }
        Some(self / len)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn component(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}
