//! Axis-aligned bounding boxes expressed in a frame

use geoframe::{FrameHolder, FrameId, FramePoint3, FrameTree};
use nalgebra::{Point3, Vector3};

use crate::error::{ShapeError, ShapeResult};

/// Axis-aligned box whose axes are those of `frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBoundingBox {
    frame: FrameId,
    min: Point3<f64>,
    max: Point3<f64>,
}

impl FrameBoundingBox {
    /// Box spanning `min` to `max`; each coordinate of `min` must not exceed the one of `max`
    pub fn new(frame: FrameId, min: Point3<f64>, max: Point3<f64>) -> ShapeResult<Self> {
        for axis in 0..3 {
            let extent = max[axis] - min[axis];
            if !(extent >= 0.0 && extent.is_finite()) {
                return Err(ShapeError::InvalidDimension {
                    what: "bounding box extent",
                    value: extent,
                });
            }
        }
        Ok(Self { frame, min, max })
    }

    /// Smallest box containing every point
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points(
        frame: FrameId,
        points: impl IntoIterator<Item = Point3<f64>>,
    ) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Some(Self { frame, min, max })
    }

    pub fn min(&self) -> &Point3<f64> {
        &self.min
    }

    pub fn max(&self) -> &Point3<f64> {
        &self.max
    }

    pub fn center(&self) -> FramePoint3 {
        FramePoint3::new(self.frame, nalgebra::center(&self.min, &self.max))
    }

    /// Edge lengths along x, y and z
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        self.size().product()
    }

    /// Whether `point` lies inside or on the boundary
    pub fn contains(&self, point: &FramePoint3) -> ShapeResult<bool> {
        point.check_expressed_in(self.frame)?;
        let p = point.value();
        Ok((0..3).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis]))
    }

    /// Whether the two boxes overlap (touching counts)
    pub fn intersects(&self, other: &FrameBoundingBox) -> ShapeResult<bool> {
        other.check_expressed_in(self.frame)?;
        Ok((0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis]))
    }

    /// Smallest box containing both
    pub fn merge(&self, other: &FrameBoundingBox) -> ShapeResult<FrameBoundingBox> {
        other.check_expressed_in(self.frame)?;
        Ok(Self {
            frame: self.frame,
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        })
    }

    /// Box around this one once expressed in `target`
    ///
    /// The result is axis-aligned in `target`, so it is generally larger than
    /// the original when the frames are rotated relative to each other.
    pub fn expressed_in(&self, tree: &FrameTree, target: FrameId) -> ShapeResult<FrameBoundingBox> {
        let transform = tree.resolve_transform(self.frame, target)?;
        let corner = |i: usize| {
            let pick = |bit: usize, axis: usize| {
                if i & bit == 0 {
                    self.min[axis]
                } else {
                    self.max[axis]
                }
            };
            transform * Point3::new(pick(1, 0), pick(2, 1), pick(4, 2))
        };
        let first = corner(0);
        let (min, max) = (1..8).map(corner).fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        });
        Ok(Self::from_corners(target, min, max))
    }

    /// Unchecked constructor for bounds that are ordered by construction
    pub(crate) fn from_corners(frame: FrameId, min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { frame, min, max }
    }
}

impl FrameHolder for FrameBoundingBox {
    fn frame(&self) -> FrameId {
        self.frame
    }
}
