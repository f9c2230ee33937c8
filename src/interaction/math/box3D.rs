use super::Vec3;

/// Axis-aligned box stored as center and half extension, used for model bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3 {
    pub center: Vec3,
    pub half_extension: Vec3,
}

impl Box3 {
    pub fn new(center: Vec3, half_extension: Vec3) -> Box3 {
        Box3 {
            center,
            half_extension,
        }
    }

    pub fn from_single_point(point: Vec3) -> Box3 {
        Box3 {
            center: point,
            half_extension: Vec3::zero(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Box3 {
        Box3 {
            center: (min + max) * 0.5,
            half_extension: (max - min) * 0.5,
        }
    }

    /// Smallest box containing every point, `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = Vec3>) -> Option<Box3> {
        let mut points = points.into_iter();
        let mut bbox = Box3::from_single_point(points.next()?);
        for point in points {
            bbox.include(point);
        }
        Some(bbox)
    }

    pub fn include(&mut self, point: Vec3) {
        let min = self.min();
        let max = self.max();
        *self = Box3::from_min_max(
            Vec3::new(min.x.min(point.x), min.y.min(point.y), min.z.min(point.z)),
            Vec3::new(max.x.max(point.x), max.y.max(point.y), max.z.max(point.z)),
        );
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extension
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extension
    }

    pub fn size(&self) -> Vec3 {
        self.half_extension * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_grows_to_fit_every_point() {
        let bbox = Box3::enclosing([
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 2.0, 0.5),
            Vec3::new(0.0, -3.0, 1.0),
        ])
        .unwrap();
        assert_eq!(bbox.min(), Vec3::new(-1.0, -3.0, 0.0));
        assert_eq!(bbox.max(), Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(bbox.size(), Vec3::new(2.0, 5.0, 1.0));
    }

    #[test]
    fn enclosing_nothing_is_none() {
        assert!(Box3::enclosing(std::iter::empty()).is_none());
    }
}
