//! Coordinate system conversion (Z-up source data to the Y-up target)

use glam::{Mat4, Vec3, Vec4};

/// Basis change taking Z-up directions to Y-up: (x, y, z) -> (x, z, -y)
const Z_UP_TO_Y_UP: Mat4 = Mat4::from_cols(Vec4::X, Vec4::NEG_Z, Vec4::Y, Vec4::W);

/// Coordinate system declared by `<CoordinateSystem>`
///
/// Y-up is the target system, so its converters are the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    #[default]
    YUp,
    ZUp,
}

impl CoordinateSystem {
    /// Map an EGG coordinate system name, `None` for systems without a converter
    pub fn from_egg_name(name: &str) -> Option<Self> {
        match name {
            "Y-Up" | "Y-Up-Right" => Some(Self::YUp),
            "Z-Up" | "Z-Up-Right" => Some(Self::ZUp),
            _ => None,
        }
    }

    /// Convert a direction or position into the Y-up system
    ///
    /// Not an involution: converting twice yields (x, -y, -z).
    pub fn convert_vec3(self, v: Vec3) -> Vec3 {
        match self {
            Self::YUp => v,
            Self::ZUp => Vec3::new(v.x, v.z, -v.y),
        }
    }

    /// Convert a transform into the Y-up system
    ///
    /// Applies the basis change after the transform, then swaps the Y and Z
    /// components of the resulting translation.
    pub fn convert_mat4(self, m: Mat4) -> Mat4 {
        match self {
            Self::YUp => m,
            Self::ZUp => {
                let mut out = Z_UP_TO_Y_UP * m;
                let t = out.w_axis;
                out.w_axis = Vec4::new(t.x, t.z, t.y, t.w);
                out
            }
        }
    }

    /// Express a transform in the Y-up basis
    ///
    /// Unlike [`convert_mat4`](Self::convert_mat4) this is a similarity
    /// transform, so it composes: converting each local transform of a
    /// hierarchy converts the resulting world transforms too. Points moved by
    /// the result match points moved by `m` and then passed through
    /// [`convert_vec3`](Self::convert_vec3).
    pub fn change_basis(self, m: Mat4) -> Mat4 {
        match self {
            Self::YUp => m,
            Self::ZUp => Z_UP_TO_Y_UP * m * Z_UP_TO_Y_UP.transpose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_z_up_mapping() {
        let v = CoordinateSystem::ZUp.convert_vec3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v, Vec3::new(1.0, 3.0, -2.0));
    }

    #[test]
    fn test_vec3_z_up_is_not_an_involution() {
        let once = CoordinateSystem::ZUp.convert_vec3(Vec3::new(1.0, 2.0, 3.0));
        let twice = CoordinateSystem::ZUp.convert_vec3(once);
        assert_eq!(twice, Vec3::new(1.0, -2.0, -3.0));
        assert_ne!(twice, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_y_up_is_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let m = Mat4::from_translation(v);
        assert_eq!(CoordinateSystem::YUp.convert_vec3(v), v);
        assert_eq!(CoordinateSystem::YUp.convert_mat4(m), m);
    }

    #[test]
    fn test_mat4_basis_matches_vector_conversion() {
        let m = CoordinateSystem::ZUp.convert_mat4(Mat4::IDENTITY);
        assert_eq!(m.transform_vector3(Vec3::Z), Vec3::Y);
        assert_eq!(m.transform_vector3(Vec3::Y), Vec3::NEG_Z);
        assert_eq!(m.transform_vector3(Vec3::X), Vec3::X);
        assert_eq!(m.w_axis, Vec4::W);
    }

    #[test]
    fn test_mat4_translation_swap() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let converted = CoordinateSystem::ZUp.convert_mat4(m);
        // Basis change gives (1, 3, -2); the swap then exchanges y and z.
        assert_eq!(converted.w_axis, Vec4::new(1.0, -2.0, 3.0, 1.0));
    }

    #[test]
    fn test_change_basis_agrees_with_vector_conversion() {
        let coords = CoordinateSystem::ZUp;
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)) * Mat4::from_rotation_z(0.5);
        let converted = coords.change_basis(m);
        let p = Vec3::new(-1.0, 0.5, 2.0);
        let expected = coords.convert_vec3(m.transform_point3(p));
        let actual = converted.transform_point3(coords.convert_vec3(p));
        assert!(actual.abs_diff_eq(expected, 1e-5), "{actual} != {expected}");

        let a = Mat4::from_translation(Vec3::Z);
        let b = Mat4::from_rotation_x(1.0);
        assert!(
            (coords.change_basis(a) * coords.change_basis(b))
                .abs_diff_eq(coords.change_basis(a * b), 1e-6)
        );
    }

    #[test]
    fn test_from_egg_name() {
        assert_eq!(CoordinateSystem::from_egg_name("Z-Up"), Some(CoordinateSystem::ZUp));
        assert_eq!(
            CoordinateSystem::from_egg_name("Z-Up-Right"),
            Some(CoordinateSystem::ZUp)
        );
        assert_eq!(CoordinateSystem::from_egg_name("Y-Up"), Some(CoordinateSystem::YUp));
        assert_eq!(CoordinateSystem::from_egg_name("Z-Up-Left"), None);
    }
}
