use super::math::{Mat4, Vec3};

/// A touch location in view points, origin at the top-left corner, y down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Screen <-> world mapping of the current frame, provided by whatever owns the
/// tracking session.
pub trait ScreenProjection {
    fn viewport(&self) -> Viewport;

    fn camera_position(&self) -> Vec3;

    /// World point under `point` at normalized `depth` (0 near plane, 1 far plane).
    fn unproject(&self, point: ScreenPoint, depth: f64) -> Option<Vec3>;

    /// Screen position and normalized depth of a world point, packed as (x, y, depth).
    fn project(&self, world: Vec3) -> Option<Vec3>;

    /// True when `world` lies inside the view frustum.
    fn is_visible(&self, world: Vec3) -> bool {
        match self.project(world) {
            Some(p) => {
                (0.0..=1.0).contains(&p.z) && self.viewport().contains(ScreenPoint::new(p.x, p.y))
            }
            None => false,
        }
    }
}

/// Snapshot of the tracked camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// camera-to-world transform, the camera looks down its local -Z
    pub transform: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
}

impl CameraPose {
    pub fn new(transform: Mat4, projection: Mat4, viewport: Viewport) -> Self {
        Self {
            transform,
            projection,
            viewport,
        }
    }

    /// Camera placed at `position` looking toward `target` with world Y as up.
    /// Returns `None` when no orientation can be derived from the two points.
    pub fn look_at(
        position: Vec3,
        target: Vec3,
        fov_y: f64,
        near: f64,
        far: f64,
        viewport: Viewport,
    ) -> Option<Self> {
        let forward = (target - position).try_normalize()?;
        let back = -forward;
        // the camera basis is right-handed with -Z looking forward
        let right = Vec3::y_axis().cross(back).try_normalize()?;
        let up = back.cross(right);
        let transform = Mat4::from_basis(right, up, back, position);
        let projection = Mat4::perspective(fov_y, viewport.aspect(), near, far);
        Some(Self::new(transform, projection, viewport))
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation()
    }

    pub fn view(&self) -> Option<Mat4> {
        self.transform.inverse()
    }

    /// world -> clip space
    pub fn view_projection(&self) -> Option<Mat4> {
        Some(self.view()?.then(&self.projection))
    }
}

impl ScreenProjection for CameraPose {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn camera_position(&self) -> Vec3 {
        self.position()
    }

    fn unproject(&self, point: ScreenPoint, depth: f64) -> Option<Vec3> {
        let ndc = Vec3::new(
            2.0 * point.x / self.viewport.width - 1.0,
            1.0 - 2.0 * point.y / self.viewport.height,
            2.0 * depth - 1.0,
        );
        let world = self.view_projection()?.inverse()?.apply(ndc)?;
        world.is_finite().then_some(world)
    }

    fn project(&self, world: Vec3) -> Option<Vec3> {
        let ndc = self.view_projection()?.apply(world)?;
        let screen = Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
            (ndc.z + 1.0) * 0.5,
        );
        screen.is_finite().then_some(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn pose() -> CameraPose {
        CameraPose::look_at(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, -1.0),
            FRAC_PI_2,
            0.01,
            100.0,
            Viewport::new(400.0, 200.0),
        )
        .unwrap()
    }

    #[test]
    fn look_at_places_camera_and_orients_forward() {
        let pose = pose();
        assert_eq!(pose.position(), Vec3::new(0.0, 1.0, 0.0));
        let forward = pose.transform.apply_vector(-Vec3::z_axis());
        assert!(forward.distance(-Vec3::z_axis()) < 1e-12);
    }

    #[test]
    fn look_at_rejects_degenerate_orientation() {
        let viewport = Viewport::new(10.0, 10.0);
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert!(CameraPose::look_at(p, p, 1.0, 0.1, 10.0, viewport).is_none());
        // straight up is parallel to the world up vector
        let above = p + Vec3::y_axis();
        assert!(CameraPose::look_at(p, above, 1.0, 0.1, 10.0, viewport).is_none());
    }

    #[test]
    fn screen_center_unprojects_on_the_view_axis() {
        let pose = pose();
        let far = pose.unproject(pose.viewport.center(), 1.0).unwrap();
        assert!(far.distance(Vec3::new(0.0, 1.0, -100.0)) < 1e-6);
        let near = pose.unproject(pose.viewport.center(), 0.0).unwrap();
        assert!(near.distance(Vec3::new(0.0, 1.0, -0.01)) < 1e-9);
    }

    #[test]
    fn project_inverts_unproject() {
        let pose = pose();
        let point = ScreenPoint::new(310.0, 40.0);
        let world = pose.unproject(point, 0.9).unwrap();
        let back = pose.project(world).unwrap();
        assert!((back.x - point.x).abs() < 1e-6);
        assert!((back.y - point.y).abs() < 1e-6);
        assert!((back.z - 0.9).abs() < 1e-9);
    }

    #[test]
    fn screen_corners_follow_uikit_orientation() {
        let pose = pose();
        // top-left of the screen is up and left of the camera
        let world = pose.unproject(ScreenPoint::new(0.0, 0.0), 0.5).unwrap();
        let local = pose.view().unwrap().apply(world).unwrap();
        assert!(local.x < 0.0);
        assert!(local.y > 0.0);
        assert!(local.z < 0.0);
    }

    #[test]
    fn points_behind_the_camera_are_not_visible() {
        let pose = pose();
        assert!(pose.is_visible(Vec3::new(0.0, 1.0, -2.0)));
        assert!(!pose.is_visible(Vec3::new(0.0, 1.0, 2.0)));
        assert!(!pose.is_visible(Vec3::new(50.0, 1.0, -2.0)));
    }
}
