use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};

use super::{FrameOrientation3, FramePoint3, FramePose3};
use crate::error::FrameResult;
use crate::frame::FrameId;
use crate::transform;

/// A pose stores `frame_from_body`: it maps coordinates of the posed body into
/// the frame the pose is expressed in.
impl FramePose3 {
    pub fn identity(frame: FrameId) -> Self {
        Self::new(frame, Isometry3::identity())
    }

    pub fn from_parts(
        frame: FrameId,
        position: Point3<f64>,
        orientation: UnitQuaternion<f64>,
    ) -> Self {
        Self::new(
            frame,
            Isometry3::from_parts(Translation3::from(position.coords), orientation),
        )
    }

    pub fn position(&self) -> FramePoint3 {
        self.with_value(Point3::from(self.value().translation.vector))
    }

    pub fn orientation(&self) -> FrameOrientation3 {
        self.with_value(self.value().rotation)
    }

    /// Distance between the two positions
    pub fn position_distance(&self, other: &FramePose3) -> FrameResult<f64> {
        self.zip_with(other, |a, b| (a.translation.vector - b.translation.vector).norm())
    }

    /// Smallest rotation angle between the two orientations, in radians
    pub fn orientation_distance(&self, other: &FramePose3) -> FrameResult<f64> {
        self.zip_with(other, |a, b| a.rotation.angle_to(&b.rotation))
    }

    /// Lerp position and slerp orientation
    pub fn interpolate(&self, other: &FramePose3, alpha: f64) -> FrameResult<FramePose3> {
        let pose = self.zip_with(other, |a, b| transform::interpolate(a, b, alpha))?;
        Ok(self.with_value(pose))
    }

    /// Point given in body coordinates, expressed in the pose's frame
    pub fn transform_point(&self, body_point: &Point3<f64>) -> FramePoint3 {
        self.with_value(self.value().transform_point(body_point))
    }

    /// Body coordinates of a point expressed in the pose's frame
    pub fn inverse_transform_point(&self, point: &FramePoint3) -> FrameResult<Point3<f64>> {
        self.zip_with(point, |pose, p| pose.inverse_transform_point(p))
    }
}
