use tracing::debug;

use super::camera::{ScreenPoint, ScreenProjection};
use super::error::{InteractionError, Unavailable};
use super::math::Ray;

/// Normalized depth of the far clipping plane.
pub const FAR_PLANE_DEPTH: f64 = 1.0;

/// Builds the world-space line of sight through `point`.
///
/// The ray starts at the camera position and passes through the screen point
/// unprojected on the far clipping plane. A missing frame is reported as
/// [`Unavailable::NoFrame`]; a pose whose far-plane point cannot be computed, or
/// coincides with the camera, yields [`InteractionError::DegenerateRay`].
pub fn cast<P>(point: ScreenPoint, pose: Option<&P>) -> Result<Ray, InteractionError>
where
    P: ScreenProjection + ?Sized,
{
    let pose = pose.ok_or(Unavailable::NoFrame)?;
    let origin = pose.camera_position();
    let far = pose
        .unproject(point, FAR_PLANE_DEPTH)
        .ok_or(InteractionError::DegenerateRay)?;
    let ray = Ray::through(origin, far)?;
    debug!(x = point.x, y = point.y, origin = ?ray.origin, direction = ?ray.direction, "cast ray");
    Ok(ray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::camera::{CameraPose, Viewport};
    use crate::interaction::math::Vec3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// Projection stub returning a fixed far-plane point.
    struct FixedFarPoint {
        position: Vec3,
        far: Option<Vec3>,
    }

    impl ScreenProjection for FixedFarPoint {
        fn viewport(&self) -> Viewport {
            Viewport::new(1.0, 1.0)
        }

        fn camera_position(&self) -> Vec3 {
            self.position
        }

        fn unproject(&self, _point: ScreenPoint, _depth: f64) -> Option<Vec3> {
            self.far
        }

        fn project(&self, _world: Vec3) -> Option<Vec3> {
            None
        }
    }

    fn pose_at(position: Vec3, target: Vec3) -> CameraPose {
        CameraPose::look_at(
            position,
            target,
            1.0,
            0.001,
            1000.0,
            Viewport::new(375.0, 812.0),
        )
        .unwrap()
    }

    #[test]
    fn no_frame_is_unavailable() {
        let err = cast::<CameraPose>(ScreenPoint::new(10.0, 10.0), None).unwrap_err();
        assert_eq!(err, InteractionError::Unavailable(Unavailable::NoFrame));
        assert!(err.is_unavailable());
    }

    #[test]
    fn ray_points_at_the_far_plane_point() {
        let stub = FixedFarPoint {
            position: Vec3::zero(),
            far: Some(Vec3::new(0.0, 0.0, 100.0)),
        };
        let ray = cast(ScreenPoint::new(0.5, 0.5), Some(&stub)).unwrap();
        assert_eq!(ray.origin, Vec3::zero());
        assert_eq!(ray.direction, Vec3::z_axis());
    }

    #[test]
    fn camera_looking_down_positive_z_through_screen_center() {
        let pose = pose_at(Vec3::zero(), Vec3::new(0.0, 0.0, 100.0));
        let ray = cast(pose.viewport.center(), Some(&pose)).unwrap();
        assert_eq!(ray.origin, Vec3::zero());
        assert!(ray.direction.distance(Vec3::z_axis()) < 1e-9);
    }

    #[test]
    fn far_point_on_camera_is_degenerate() {
        let stub = FixedFarPoint {
            position: Vec3::new(1.0, 2.0, 3.0),
            far: Some(Vec3::new(1.0, 2.0, 3.0)),
        };
        let err = cast(ScreenPoint::default(), Some(&stub)).unwrap_err();
        assert_eq!(err, InteractionError::DegenerateRay);

        let broken = FixedFarPoint {
            position: Vec3::zero(),
            far: None,
        };
        let err = cast(ScreenPoint::default(), Some(&broken)).unwrap_err();
        assert_eq!(err, InteractionError::DegenerateRay);
    }

    #[test]
    fn singular_projection_is_degenerate() {
        let mut pose = pose_at(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        pose.projection = crate::interaction::math::Mat4::scale(0.0);
        let err = cast(ScreenPoint::new(1.0, 1.0), Some(&pose)).unwrap_err();
        assert_eq!(err, InteractionError::DegenerateRay);
    }

    #[test]
    fn directions_are_unit_length_and_deterministic() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let position = Vec3::random_between(&mut rng, -Vec3::one(), Vec3::one());
            let target = position
                + Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-0.5..0.5), -1.0);
            let pose = pose_at(position, target);
            let point = ScreenPoint::new(rng.gen_range(0.0..375.0), rng.gen_range(0.0..812.0));

            let first = cast(point, Some(&pose)).unwrap();
            let second = cast(point, Some(&pose)).unwrap();
            assert!((first.direction.len() - 1.0).abs() < 1e-5);
            assert_eq!(first, second);
            assert_eq!(first.origin, position);
        }
    }
}
