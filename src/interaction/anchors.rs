use tracing::debug;

use super::features::{FeatureCloud, FeatureHit, HitOptions};
use super::math::{Mat4, Ray, Vec3};

/// Below this the ray is considered parallel to a plane.
const PARALLEL_EPSILON: f64 = 1e-9;

/// A detected horizontal surface. Its local frame has +Y as normal and the plane
/// is centred at the local origin, spanning `extent_x` by `extent_z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneAnchor {
    pub transform: Mat4,
    pub extent_x: f64,
    pub extent_z: f64,
}

impl PlaneAnchor {
    pub fn new(transform: Mat4, extent_x: f64, extent_z: f64) -> Self {
        Self {
            transform,
            extent_x,
            extent_z,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.transform.translation()
    }

    /// Ray parameter of the hit with the plane, limited to its extent and to
    /// the front of the ray.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let to_local = self.transform.inverse()?;
        let origin = to_local.apply(ray.origin)?;
        // affine maps preserve the ray parameter
        let direction = to_local.apply_vector(ray.direction);
        if direction.y.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -origin.y / direction.y;
        if t < 0.0 {
            return None;
        }
        let local = origin + direction * t;
        if local.x.abs() > self.extent_x * 0.5 || local.z.abs() > self.extent_z * 0.5 {
            return None;
        }
        Some(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitKind {
    Plane { anchor: usize },
    FeaturePoint(FeatureHit),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldHit {
    pub kind: HitKind,
    pub position: Vec3,
    pub distance: f64,
}

impl WorldHit {
    pub fn is_feature_point(&self) -> bool {
        matches!(self.kind, HitKind::FeaturePoint(_))
    }
}

/// Hits against the plane anchors and the feature cloud, nearest first.
pub fn hit_test(
    ray: &Ray,
    anchors: &[PlaneAnchor],
    cloud: &FeatureCloud,
    options: HitOptions,
) -> Vec<WorldHit> {
    let mut hits: Vec<WorldHit> = anchors
        .iter()
        .enumerate()
        .filter_map(|(anchor, plane)| {
            let t = plane.intersect(ray)?;
            Some(WorldHit {
                kind: HitKind::Plane { anchor },
                position: ray.at(t),
                distance: t,
            })
        })
        .collect();

    match options.intersect(ray, cloud) {
        Ok(feature) => hits.push(WorldHit {
            kind: HitKind::FeaturePoint(feature),
            position: feature.position,
            distance: feature.distance_to_ray_origin,
        }),
        Err(err) => debug!(%err, "no feature point hit"),
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Planes win over feature points; among the same kind the nearest hit wins.
pub fn preferred(hits: &[WorldHit]) -> Option<&WorldHit> {
    hits.iter()
        .find(|hit| !hit.is_feature_point())
        .or_else(|| hits.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(center: Vec3, extent: f64) -> PlaneAnchor {
        PlaneAnchor::new(Mat4::translate(center), extent, extent)
    }

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 1.5, 0.0), -Vec3::y_axis()).unwrap()
    }

    #[test]
    fn ray_hits_plane_within_extent() {
        let plane = floor(Vec3::zero(), 1.0);
        let t = plane.intersect(&down_ray()).unwrap();
        assert!((t - 1.5).abs() < 1e-12);
    }

    #[test]
    fn ray_misses_plane_outside_extent() {
        let plane = floor(Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert!(plane.intersect(&down_ray()).is_none());
    }

    #[test]
    fn planes_behind_or_parallel_are_ignored() {
        let plane = floor(Vec3::new(0.0, 3.0, 0.0), 10.0);
        assert!(plane.intersect(&down_ray()).is_none());
        let sideways = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::x_axis()).unwrap();
        assert!(floor(Vec3::zero(), 10.0).intersect(&sideways).is_none());
    }

    #[test]
    fn rotated_plane_uses_its_own_normal() {
        // wall facing +Z, one meter in front of the origin
        let wall = PlaneAnchor::new(
            Mat4::rotate(Vec3::x_axis(), std::f64::consts::FRAC_PI_2)
                .then(&Mat4::translate(Vec3::new(0.0, 0.0, -1.0))),
            2.0,
            2.0,
        );
        let ray = Ray::new(Vec3::zero(), -Vec3::z_axis()).unwrap();
        let t = wall.intersect(&ray).unwrap();
        assert!((t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hits_are_sorted_and_planes_preferred() {
        let anchors = [
            floor(Vec3::new(0.0, -1.0, 0.0), 1.0),
            floor(Vec3::zero(), 1.0),
        ];
        let cloud = FeatureCloud::new(vec![Vec3::new(0.0, 1.0, 0.0)]);
        let hits = hit_test(&down_ray(), &anchors, &cloud, HitOptions::default());
        assert_eq!(hits.len(), 3);
        assert!(hits[0].is_feature_point());
        assert_eq!(hits[1].kind, HitKind::Plane { anchor: 1 });
        assert_eq!(hits[2].kind, HitKind::Plane { anchor: 0 });

        let best = preferred(&hits).unwrap();
        assert_eq!(best.kind, HitKind::Plane { anchor: 1 });
        assert!(best.position.distance(Vec3::zero()) < 1e-12);
    }

    #[test]
    fn feature_point_is_the_fallback() {
        let cloud = FeatureCloud::new(vec![Vec3::new(0.1, 0.5, 0.0)]);
        let hits = hit_test(&down_ray(), &[], &cloud, HitOptions::default());
        let best = preferred(&hits).unwrap();
        assert!(best.is_feature_point());
        assert!(best.position.distance(Vec3::new(0.0, 0.5, 0.0)) < 1e-12);

        let nothing = hit_test(&down_ray(), &[], &FeatureCloud::default(), HitOptions::default());
        assert!(nothing.is_empty());
        assert!(preferred(&nothing).is_none());
    }
}
