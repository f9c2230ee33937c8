use super::Vec3;

/// A matrix is singular when its determinant is below this fraction of the
/// product of its row lengths (the Hadamard bound), so the test does not depend
/// on the scale of the scene.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Row-major 4x4 transform. Points are column vectors, so the translation of a
/// rigid transform lives in the fourth column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    value: [f64; 16],
}

impl Mat4 {
    pub fn identity() -> Mat4 {
        Mat4 {
            value: [
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn scale(factor: f64) -> Mat4 {
        Mat4 {
            value: [
                factor, 0.0, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 0.0,
                1.0,
            ],
        }
    }

    pub fn translate(offset: Vec3) -> Mat4 {
        Mat4 {
            value: [
                1.0, 0.0, 0.0, offset.x, 0.0, 1.0, 0.0, offset.y, 0.0, 0.0, 1.0, offset.z, 0.0,
                0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn rotate(axis: Vec3, angle: f64) -> Mat4 {
        // https://en.wikipedia.org/wiki/Rotation_matrix#Rotation_matrix_from_axis_and_angle
        let u = axis.normalize();
        let cos_t = angle.cos();
        let sin_t = angle.sin();
        let k = 1.0 - cos_t;
        Mat4 {
            value: [
                cos_t + u.x * u.x * k,
                u.x * u.y * k - u.z * sin_t,
                u.x * u.z * k + u.y * sin_t,
                0.0,
                u.y * u.x * k + u.z * sin_t,
                cos_t + u.y * u.y * k,
                u.y * u.z * k - u.x * sin_t,
                0.0,
                u.z * u.x * k - u.y * sin_t,
                u.z * u.y * k + u.x * sin_t,
                cos_t + u.z * u.z * k,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
            ],
        }
    }

    /// Rigid frame whose columns are the given axes and origin.
    pub fn from_basis(x_axis: Vec3, y_axis: Vec3, z_axis: Vec3, origin: Vec3) -> Mat4 {
        Mat4 {
            value: [
                x_axis.x, y_axis.x, z_axis.x, origin.x, x_axis.y, y_axis.y, z_axis.y, origin.y,
                x_axis.z, y_axis.z, z_axis.z, origin.z, 0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Right-handed perspective projection looking down -Z, mapping the view
    /// frustum to clip space with NDC depth in [-1, 1].
    pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();
        let range = near - far;
        Mat4 {
            value: [
                f / aspect,
                0.0,
                0.0,
                0.0,
                0.0,
                f,
                0.0,
                0.0,
                0.0,
                0.0,
                (far + near) / range,
                2.0 * far * near / range,
                0.0,
                0.0,
                -1.0,
                0.0,
            ],
        }
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.value[row * 4 + col]
    }

    /// Translation component of a transform (its fourth column).
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.value[3], self.value[7], self.value[11])
    }

    // determinant of the 3x3 minor obtained removing a row and a column
    fn minor(&self, row_to_remove: usize, col_to_remove: usize) -> f64 {
        let mut m = [0.0; 9];
        let mut idx = 0;
        for row in (0..4).filter(|r| *r != row_to_remove) {
            for col in (0..4).filter(|c| *c != col_to_remove) {
                m[idx] = self.get(row, col);
                idx += 1;
            }
        }
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    fn cofactor(&self, row: usize, col: usize) -> f64 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col)
    }

    pub fn determinant(&self) -> f64 {
        (0..4).map(|col| self.value[col] * self.cofactor(0, col)).sum()
    }

    // upper bound of |det|, the product of the row lengths
    fn hadamard_bound(&self) -> f64 {
        (0..4)
            .map(|row| {
                (0..4)
                    .map(|col| self.get(row, col) * self.get(row, col))
                    .sum::<f64>()
                    .sqrt()
            })
            .product()
    }

    pub fn inverse(&self) -> Option<Mat4> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= SINGULAR_EPSILON * self.hadamard_bound() {
            return None;
        }

        let mut inverted_values = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                // the adjugate is the transposed cofactor matrix
                inverted_values[col * 4 + row] = self.cofactor(row, col) / det;
            }
        }

        Some(Mat4 {
            value: inverted_values,
        })
    }

    /// Composition applying `self` first and `other` after, i.e. `other * self`.
    pub fn then(&self, other: &Mat4) -> Mat4 {
        let mut value = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                value[row * 4 + col] = (0..4).map(|k| other.get(row, k) * self.get(k, col)).sum();
            }
        }
        Mat4 { value }
    }

    /// Transforms a point, including the homogeneous divide. Returns `None` when
    /// the point maps to infinity (zero or non-finite `w`).
    pub fn apply(&self, v: Vec3) -> Option<Vec3> {
        let x = self.value[0] * v.x + self.value[1] * v.y + self.value[2] * v.z + self.value[3];
        let y = self.value[4] * v.x + self.value[5] * v.y + self.value[6] * v.z + self.value[7];
        let z = self.value[8] * v.x + self.value[9] * v.y + self.value[10] * v.z + self.value[11];
        let w = self.value[12] * v.x + self.value[13] * v.y + self.value[14] * v.z + self.value[15];
        if w == 0.0 || !w.is_finite() {
            return None;
        }
        let point = Vec3::new(x / w, y / w, z / w);
        point.is_finite().then_some(point)
    }

    /// Transforms a direction, ignoring the translation.
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.value[0] * v.x + self.value[1] * v.y + self.value[2] * v.z,
            self.value[4] * v.x + self.value[5] * v.y + self.value[6] * v.z,
            self.value[8] * v.x + self.value[9] * v.y + self.value[10] * v.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn translation_is_the_fourth_column() {
        let m = Mat4::translate(Vec3::new(-4.0, 0.5, 9.0));
        assert_eq!(m.translation(), Vec3::new(-4.0, 0.5, 9.0));
        assert_vec_eq(m.apply(Vec3::zero()).unwrap(), Vec3::new(-4.0, 0.5, 9.0));
    }

    #[test]
    fn rotate_quarter_turn_about_y() {
        let m = Mat4::rotate(Vec3::y_axis(), FRAC_PI_2);
        assert_vec_eq(m.apply(Vec3::x_axis()).unwrap(), -Vec3::z_axis());
        assert_vec_eq(m.apply_vector(Vec3::z_axis()), Vec3::x_axis());
    }

    #[test]
    fn then_applies_left_to_right() {
        let m = Mat4::scale(2.0).then(&Mat4::translate(Vec3::new(1.0, 0.0, 0.0)));
        assert_vec_eq(m.apply(Vec3::one()).unwrap(), Vec3::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn inverse_round_trips_a_rigid_transform() {
        let m = Mat4::rotate(Vec3::new(1.0, 1.0, 0.0), 0.7)
            .then(&Mat4::translate(Vec3::new(0.3, -2.0, 5.0)));
        let inv = m.inverse().unwrap();
        let p = Vec3::new(0.25, -1.5, 4.0);
        assert_vec_eq(inv.apply(m.apply(p).unwrap()).unwrap(), p);
        let identity = m.then(&inv);
        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert!((identity.get(row, col) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat4::scale(0.0).inverse().is_none());
        // x and y axes collapse on the same direction
        let flat = Mat4::from_basis(Vec3::x_axis(), Vec3::x_axis(), Vec3::z_axis(), Vec3::one());
        assert!(flat.inverse().is_none());
    }

    #[test]
    fn tiny_scene_scales_stay_invertible() {
        // determinant 1e-18, far below any fixed cutoff
        let m = Mat4::scale(1e-6).then(&Mat4::translate(Vec3::new(2e-6, 0.0, -1e-6)));
        let inv = m.inverse().unwrap();
        let p = Vec3::new(0.3, -0.2, 0.9);
        assert_vec_eq(inv.apply(m.apply(p).unwrap()).unwrap(), p);

        let camera = Mat4::from_basis(
            Vec3::x_axis() * 1e-6,
            Vec3::y_axis() * 1e-6,
            Vec3::z_axis() * 1e-6,
            Vec3::zero(),
        );
        assert!(camera.inverse().is_some());
    }

    #[test]
    fn perspective_maps_near_and_far_planes_to_ndc_bounds() {
        let p = Mat4::perspective(FRAC_PI_2, 1.0, 0.1, 100.0);
        let near = p.apply(Vec3::new(0.0, 0.0, -0.1)).unwrap();
        let far = p.apply(Vec3::new(0.0, 0.0, -100.0)).unwrap();
        assert!((near.z + 1.0).abs() < 1e-9);
        assert!((far.z - 1.0).abs() < 1e-9);
        // a point on the camera plane cannot be projected
        assert!(p.apply(Vec3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn from_basis_matches_column_layout() {
        let m = Mat4::from_basis(
            Vec3::y_axis(),
            -Vec3::x_axis(),
            Vec3::z_axis(),
            Vec3::new(1.0, 2.0, 3.0),
        );
        assert_vec_eq(m.apply_vector(Vec3::x_axis()), Vec3::y_axis());
        assert_eq!(m.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.get(1, 0), 1.0);
    }
}
