use nalgebra::UnitQuaternion;

use super::{FrameOrientation3, FrameVector3};
use crate::error::FrameResult;
use crate::frame::FrameId;
use crate::transform;

impl FrameOrientation3 {
    pub fn identity(frame: FrameId) -> Self {
        Self::new(frame, UnitQuaternion::identity())
    }

    /// Orientation from roll, pitch and yaw in radians
    pub fn from_euler_angles(frame: FrameId, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(frame, UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// Roll, pitch and yaw in radians
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.value().euler_angles()
    }

    /// Smallest rotation angle between the two orientations
    pub fn angle_to(&self, other: &FrameOrientation3) -> FrameResult<f64> {
        self.zip_with(other, |a, b| a.angle_to(b))
    }

    pub fn interpolate(
        &self,
        other: &FrameOrientation3,
        alpha: f64,
    ) -> FrameResult<FrameOrientation3> {
        let q = self.zip_with(other, |a, b| transform::slerp(a, b, alpha))?;
        Ok(self.with_value(q))
    }

    /// Rotate a vector expressed in the same frame
    pub fn rotate(&self, vector: &FrameVector3) -> FrameResult<FrameVector3> {
        let v = self.zip_with(vector, |q, v| q * v)?;
        Ok(self.with_value(v))
    }

    pub fn inverse(&self) -> FrameOrientation3 {
        self.with_value(self.value().inverse())
    }
}
