use nalgebra::{center, distance, distance_squared, Point3};

use super::{FrameHolder, FramePoint3, FrameVector3};
use crate::error::FrameResult;
use crate::frame::FrameId;

impl FramePoint3 {
    pub fn from_xyz(frame: FrameId, x: f64, y: f64, z: f64) -> Self {
        Self::new(frame, Point3::new(x, y, z))
    }

    /// Origin of `frame`
    pub fn origin(frame: FrameId) -> Self {
        Self::new(frame, Point3::origin())
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

    /// Vector from `other` to `self`
    pub fn difference(&self, other: &FramePoint3) -> FrameResult<FrameVector3> {
        let v = self.zip_with(other, |a, b| a - b)?;
        Ok(self.with_value(v))
    }

    /// This point moved by `offset`
    pub fn translated(&self, offset: &FrameVector3) -> FrameResult<FramePoint3> {
        let p = self.zip_with(offset, |p, v| p + v)?;
        Ok(self.with_value(p))
    }

    pub fn distance(&self, other: &FramePoint3) -> FrameResult<f64> {
        self.zip_with(other, distance)
    }

    pub fn distance_squared(&self, other: &FramePoint3) -> FrameResult<f64> {
        self.zip_with(other, distance_squared)
    }

    /// Distance to the origin of the point's own frame
    pub fn distance_from_origin(&self) -> f64 {
        self.value().coords.norm()
    }

    /// Linear interpolation, `alpha = 0` gives `self`, `alpha = 1` gives `other`
    pub fn interpolate(&self, other: &FramePoint3, alpha: f64) -> FrameResult<FramePoint3> {
        let p = self.zip_with(other, |a, b| a + (b - a) * alpha)?;
        Ok(self.with_value(p))
    }

    pub fn midpoint(&self, other: &FramePoint3) -> FrameResult<FramePoint3> {
        let p = self.zip_with(other, center)?;
        Ok(self.with_value(p))
    }

    /// Displacement from the frame origin to this point
    pub fn to_vector(&self) -> FrameVector3 {
        FrameVector3::new(self.frame(), self.value().coords)
    }
}
