//! Transform primitive
//!
//! Rigid transforms are plain `nalgebra::Isometry3<f64>`. This module adds the
//! constructors, tolerance checks and interpolation the frame layer needs, plus
//! the [`Transformable`] trait implemented by every payload that can be moved
//! between frames.
//!
//! Composition follows nalgebra's multiplication order: the right operand is
//! applied first, so `world_from_child = world_from_parent * parent_from_child`.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// Rigid body transform (rotation + translation), f64 for robotics precision
pub type Transform = Isometry3<f64>;

/// Tolerance used for identity and near-equality checks.
///
/// Fixed, not derived from input magnitude.
pub const EPSILON: f64 = 1e-9;

/// Identity transform
#[inline]
pub fn identity() -> Transform {
    Transform::identity()
}

/// Transform from translation only
pub fn from_translation(translation: [f64; 3]) -> Transform {
    Transform::from_parts(
        Translation3::new(translation[0], translation[1], translation[2]),
        UnitQuaternion::identity(),
    )
}

/// Transform from translation and roll/pitch/yaw (radians)
pub fn from_euler(translation: [f64; 3], rpy: [f64; 3]) -> Transform {
    Transform::from_parts(
        Translation3::new(translation[0], translation[1], translation[2]),
        UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]),
    )
}

/// Transform from translation and a rotation of `angle` radians about `axis`
///
/// A zero axis yields a pure translation.
pub fn from_axis_angle(translation: [f64; 3], axis: [f64; 3], angle: f64) -> Transform {
    let axis = Vector3::new(axis[0], axis[1], axis[2]);
    let rotation = nalgebra::Unit::try_new(axis, EPSILON)
        .map(|axis| UnitQuaternion::from_axis_angle(&axis, angle))
        .unwrap_or_else(UnitQuaternion::identity);
    Transform::from_parts(
        Translation3::new(translation[0], translation[1], translation[2]),
        rotation,
    )
}

/// Spherical interpolation that never panics.
///
/// Falls back to normalised linear interpolation when the two rotations are
/// too close for slerp to be well defined.
pub fn slerp(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    a.try_slerp(b, t, EPSILON).unwrap_or_else(|| a.nlerp(b, t))
}

/// Interpolate between two transforms (lerp translation, slerp rotation)
pub fn interpolate(a: &Transform, b: &Transform, t: f64) -> Transform {
    let translation = a.translation.vector.lerp(&b.translation.vector, t);
    Transform::from_parts(
        Translation3::from(translation),
        slerp(&a.rotation, &b.rotation, t),
    )
}

/// Tolerance-aware queries on transforms
pub trait TransformExt {
    /// Whether the transform is the identity within `epsilon`
    fn is_identity(&self, epsilon: f64) -> bool;

    /// Whether two transforms are equal within `epsilon`
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;

    /// Rotation angle in radians, in `[0, pi]`
    fn rotation_angle(&self) -> f64;

    /// Length of the translation part
    fn translation_magnitude(&self) -> f64;

    /// Whether the rotation maps the z axis onto itself within `epsilon`
    fn keeps_z_axis(&self, epsilon: f64) -> bool;
}

impl TransformExt for Transform {
    fn is_identity(&self, epsilon: f64) -> bool {
        self.translation.vector.norm() <= epsilon && self.rotation.angle() <= epsilon
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.translation.vector - other.translation.vector).norm() <= epsilon
            && self.rotation.angle_to(&other.rotation) <= epsilon
    }

    fn rotation_angle(&self) -> f64 {
        self.rotation.angle()
    }

    fn translation_magnitude(&self) -> f64 {
        self.translation.vector.norm()
    }

    fn keeps_z_axis(&self, epsilon: f64) -> bool {
        (self.rotation * Vector3::z() - Vector3::z()).norm() <= epsilon
    }
}

/// A geometric payload that can be re-expressed through a rigid transform
pub trait Transformable: Sized {
    /// Return the payload as seen after applying `transform`
    fn transformed(&self, transform: &Transform) -> Self;
}

impl Transformable for Point3<f64> {
    fn transformed(&self, transform: &Transform) -> Self {
        transform.transform_point(self)
    }
}

/// Free vectors only see the rotation.
impl Transformable for Vector3<f64> {
    fn transformed(&self, transform: &Transform) -> Self {
        transform.transform_vector(self)
    }
}

impl Transformable for Transform {
    fn transformed(&self, transform: &Transform) -> Self {
        transform * self
    }
}

impl Transformable for UnitQuaternion<f64> {
    fn transformed(&self, transform: &Transform) -> Self {
        transform.rotation * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_compose_inverse_is_identity() {
        let t = from_euler([1.0, -2.0, 0.5], [0.3, -0.2, 1.1]);
        assert!((t * t.inverse()).is_identity(EPSILON));
        assert!((t.inverse() * t).is_identity(EPSILON));
    }

    #[test]
    fn test_composition_order() {
        // world_from_parent applied after parent_from_child
        let world_from_parent = from_axis_angle([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], FRAC_PI_2);
        let parent_from_child = from_translation([1.0, 0.0, 0.0]);
        let world_from_child = world_from_parent * parent_from_child;

        let origin = world_from_child.transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_axis_is_pure_translation() {
        let t = from_axis_angle([0.0, 2.0, 0.0], [0.0, 0.0, 0.0], 1.0);
        assert_relative_eq!(t.rotation_angle(), 0.0);
        assert_relative_eq!(t.translation_magnitude(), 2.0);
    }

    #[test]
    fn test_vector_ignores_translation() {
        let t = from_euler([5.0, 5.0, 5.0], [0.0, 0.0, FRAC_PI_2]);
        let v = Vector3::x().transformed(&t);
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = from_euler([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]);
        let b = from_euler([2.0, 0.0, 0.0], [0.0, 0.0, FRAC_PI_2]);
        assert!(interpolate(&a, &b, 0.0).approx_eq(&a, 1e-12));
        assert!(interpolate(&a, &b, 1.0).approx_eq(&b, 1e-12));

        let mid = interpolate(&a, &b, 0.5);
        assert_relative_eq!(mid.translation.vector.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mid.rotation_angle(), FRAC_PI_2 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_keeps_z_axis() {
        assert!(from_euler([1.0, 2.0, 3.0], [0.0, 0.0, 2.5]).keeps_z_axis(EPSILON));
        assert!(!from_euler([0.0, 0.0, 0.0], [0.1, 0.0, 0.0]).keeps_z_axis(EPSILON));
        assert!(!from_axis_angle([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], FRAC_PI_2).keeps_z_axis(EPSILON));
    }

    #[test]
    fn test_slerp_identical_rotations() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let r = slerp(&q, &q, 0.5);
        assert_relative_eq!(r.angle_to(&q), 0.0, epsilon = 1e-12);
    }
}
