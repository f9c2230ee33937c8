use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use super::error::{CloudError, InteractionError, Unavailable};
use super::math::{Box3, Ray, Vec3};

/// Read-only snapshot of the feature points tracked in the current frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCloud {
    points: Vec<Vec3>,
}

impl FeatureCloud {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Loads the vertex positions of a Wavefront OBJ file, faces are ignored.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, CloudError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CloudError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw = obj::raw::parse_obj(BufReader::new(file)).map_err(|source| CloudError::Obj {
            path: path.to_path_buf(),
            source,
        })?;
        let points: Vec<Vec3> = raw
            .positions
            .iter()
            .map(|&(x, y, z, _w)| Vec3::from([x, y, z]))
            .collect();
        debug!(path = %path.display(), count = points.len(), "loaded feature cloud");
        Ok(Self { points })
    }

    /// Uniformly scattered points inside `bounds`.
    pub fn random(rng: &mut impl Rng, bounds: Box3, count: usize) -> Self {
        let points = (0..count)
            .map(|_| Vec3::random_between(rng, bounds.min(), bounds.max()))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends the points delivered by a new frame.
    pub fn extend(&mut self, points: impl IntoIterator<Item = Vec3>) {
        self.points.extend(points);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.points.iter()
    }
}

impl From<Vec<Vec3>> for FeatureCloud {
    fn from(points: Vec<Vec3>) -> Self {
        Self::new(points)
    }
}

/// Which feature points may be hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitPolicy {
    /// The ray is an infinite line: points behind the origin are candidates too.
    #[default]
    Line,
    /// Only points whose projection lies at or after the origin are candidates.
    ForwardRay,
}

impl HitPolicy {
    fn accepts(self, ray: &Ray, point: Vec3) -> bool {
        match self {
            HitPolicy::Line => true,
            HitPolicy::ForwardRay => ray.project(point) >= 0.0,
        }
    }

    fn unavailable(self) -> Unavailable {
        match self {
            HitPolicy::Line => Unavailable::EmptyCloud,
            HitPolicy::ForwardRay => Unavailable::NothingInFront,
        }
    }
}

/// How a feature query runs: the hit policy and whether to scan in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitOptions {
    pub policy: HitPolicy,
    pub parallel: bool,
}

impl HitOptions {
    pub fn new(policy: HitPolicy, parallel: bool) -> Self {
        Self { policy, parallel }
    }

    pub fn intersect(
        &self,
        ray: &Ray,
        cloud: &FeatureCloud,
    ) -> Result<FeatureHit, InteractionError> {
        if self.parallel {
            intersect_par(ray, cloud.points(), self.policy)
        } else {
            intersect(ray, cloud.points(), self.policy)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureHit {
    /// point on the ray closest to the chosen feature
    pub position: Vec3,
    pub distance_to_ray_origin: f64,
    /// the chosen feature point
    pub feature: Vec3,
    /// perpendicular distance between the feature and the ray line
    pub feature_distance: f64,
}

impl FeatureHit {
    fn from_closest(ray: &Ray, feature: Vec3, feature_distance: f64) -> Self {
        let position = ray.at(ray.project(feature));
        Self {
            position,
            distance_to_ray_origin: position.distance(ray.origin),
            feature,
            feature_distance,
        }
    }
}

// (index, point, perpendicular distance) of a candidate
type Candidate = (usize, Vec3, f64);

fn closer(a: Candidate, b: Candidate) -> Candidate {
    // the lower index wins ties, as in the sequential scan
    if b.2 < a.2 || (b.2 == a.2 && b.0 < a.0) {
        b
    } else {
        a
    }
}

/// Finds the feature point closest to the ray line and projects it on the ray.
///
/// A single linear scan; ties keep the first point in iteration order. Points
/// with non-finite coordinates are never selected.
pub fn intersect(
    ray: &Ray,
    points: &[Vec3],
    policy: HitPolicy,
) -> Result<FeatureHit, InteractionError> {
    let mut closest: Option<(Vec3, f64)> = None;
    let mut min_distance = f64::INFINITY;
    for &point in points {
        if !policy.accepts(ray, point) {
            continue;
        }
        let distance = ray.distance_to_line(point);
        if distance < min_distance {
            min_distance = distance;
            closest = Some((point, distance));
        }
    }

    let (feature, feature_distance) = closest.ok_or(policy.unavailable())?;
    let hit = FeatureHit::from_closest(ray, feature, feature_distance);
    debug!(
        count = points.len(),
        feature = ?hit.feature,
        distance = hit.feature_distance,
        "feature hit"
    );
    Ok(hit)
}

/// Same result as [`intersect`], computed with a parallel reduction for large
/// clouds.
pub fn intersect_par(
    ray: &Ray,
    points: &[Vec3],
    policy: HitPolicy,
) -> Result<FeatureHit, InteractionError> {
    let (_, feature, feature_distance) = points
        .par_iter()
        .enumerate()
        .filter(|(_, point)| policy.accepts(ray, **point))
        .map(|(index, point)| (index, *point, ray.distance_to_line(*point)))
        .filter(|candidate| candidate.2 < f64::INFINITY)
        .reduce_with(closer)
        .ok_or(policy.unavailable())?;
    let hit = FeatureHit::from_closest(ray, feature, feature_distance);
    debug!(
        count = points.len(),
        feature = ?hit.feature,
        distance = hit.feature_distance,
        "feature hit (parallel)"
    );
    Ok(hit)
}
