use super::Vec3;
use crate::interaction::error::InteractionError;

/// A directed line with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray normalizing `direction`; zero or non-finite directions are
    /// rejected so every ray satisfies the unit-direction invariant.
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Ray, InteractionError> {
        let direction = direction
            .try_normalize()
            .ok_or(InteractionError::DegenerateRay)?;
        Ok(Ray { origin, direction })
    }

    /// Ray from `origin` passing through `point`.
    pub fn through(origin: Vec3, point: Vec3) -> Result<Ray, InteractionError> {
        Ray::new(origin, point - origin)
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Signed parameter of the orthogonal projection of `point` on the line.
    pub fn project(&self, point: Vec3) -> f64 {
        self.direction.dot(point - self.origin)
    }

    /// Distance from `point` to the infinite line carrying the ray.
    pub fn distance_to_line(&self, point: Vec3) -> f64 {
        (self.origin - point).cross(self.direction).len()
    }

    pub fn translated(&self, offset: Vec3) -> Ray {
        Ray {
            origin: self.origin + offset,
            direction: self.direction,
        }
    }
}
