use nalgebra::Vector3;

use super::FrameVector3;
use crate::error::FrameResult;
use crate::frame::FrameId;
use crate::transform::EPSILON;

impl FrameVector3 {
    pub fn from_xyz(frame: FrameId, x: f64, y: f64, z: f64) -> Self {
        Self::new(frame, Vector3::new(x, y, z))
    }

    pub fn zero(frame: FrameId) -> Self {
        Self::new(frame, Vector3::zeros())
    }

    pub fn x(&self) -> f64 {
        self.value().x
    }

    pub fn y(&self) -> f64 {
        self.value().y
    }

    pub fn z(&self) -> f64 {
        self.value().z
    }

    pub fn add(&self, other: &FrameVector3) -> FrameResult<FrameVector3> {
        let v = self.zip_with(other, |a, b| a + b)?;
        Ok(self.with_value(v))
    }

    pub fn sub(&self, other: &FrameVector3) -> FrameResult<FrameVector3> {
        let v = self.zip_with(other, |a, b| a - b)?;
        Ok(self.with_value(v))
    }

    pub fn dot(&self, other: &FrameVector3) -> FrameResult<f64> {
        self.zip_with(other, |a, b| a.dot(b))
    }

    pub fn cross(&self, other: &FrameVector3) -> FrameResult<FrameVector3> {
        let v = self.zip_with(other, |a, b| a.cross(b))?;
        Ok(self.with_value(v))
    }

    /// Angle between the two vectors in radians, in `[0, pi]`
    pub fn angle(&self, other: &FrameVector3) -> FrameResult<f64> {
        self.zip_with(other, |a, b| a.angle(b))
    }

    pub fn interpolate(&self, other: &FrameVector3, alpha: f64) -> FrameResult<FrameVector3> {
        let v = self.zip_with(other, |a, b| a.lerp(b, alpha))?;
        Ok(self.with_value(v))
    }

    pub fn norm(&self) -> f64 {
        self.value().norm()
    }

    pub fn norm_squared(&self) -> f64 {
        self.value().norm_squared()
    }

    pub fn negated(&self) -> FrameVector3 {
        self.with_value(-self.value())
    }

    pub fn scaled(&self, factor: f64) -> FrameVector3 {
        self.with_value(self.value() * factor)
    }

    /// Unit vector in the same direction, `None` for (near) zero vectors
    pub fn normalized(&self) -> Option<FrameVector3> {
        self.value()
            .try_normalize(EPSILON)
            .map(|v| self.with_value(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressed::FrameHolder;
    use crate::frame::FrameTree;
    use crate::transform::Transform;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_binary_ops() {
        let tree = FrameTree::default();
        let world = tree.world();
        let x = FrameVector3::from_xyz(world, 1.0, 0.0, 0.0);
        let y = FrameVector3::from_xyz(world, 0.0, 1.0, 0.0);

        assert_eq!(*x.add(&y).unwrap().value(), Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(*x.sub(&y).unwrap().value(), Vector3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(x.dot(&y).unwrap(), 0.0);
        assert_eq!(*x.cross(&y).unwrap().value(), Vector3::z());
        assert_relative_eq!(x.angle(&y).unwrap(), FRAC_PI_2);
        assert_relative_eq!(
            *x.interpolate(&y, 0.5).unwrap().value(),
            Vector3::new(0.5, 0.5, 0.0)
        );
    }

    #[test]
    fn test_unary_ops_ignore_frame() {
        let mut tree = FrameTree::default();
        let a = tree
            .create_frame("a", tree.world(), Transform::identity())
            .unwrap();
        let v = FrameVector3::from_xyz(a, 3.0, 0.0, 4.0);

        assert_relative_eq!(v.norm(), 5.0);
        assert_relative_eq!(v.norm_squared(), 25.0);
        assert_eq!(v.negated(), FrameVector3::from_xyz(a, -3.0, 0.0, -4.0));
        assert_eq!(v.scaled(2.0).frame(), a);
        assert_relative_eq!(v.normalized().unwrap().norm(), 1.0);
        assert!(FrameVector3::zero(a).normalized().is_none());
    }

    #[test]
    fn test_mismatch() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let a = tree.create_frame("a", world, Transform::identity()).unwrap();
        let v = FrameVector3::from_xyz(world, 1.0, 0.0, 0.0);
        let w = FrameVector3::from_xyz(a, 1.0, 0.0, 0.0);

        assert!(v.dot(&w).unwrap_err().is_frame_mismatch());
        assert!(v.add(&w).unwrap_err().is_frame_mismatch());
        assert!(v.cross(&w).unwrap_err().is_frame_mismatch());
    }
}
