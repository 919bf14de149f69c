//! Frame-expressed geometry
//!
//! A [`FrameExpressed`] value pairs a plain nalgebra payload with the frame it
//! is expressed in. Binary operations only accept operands expressed in the
//! very same frame (compared by handle, never by pose) and fail with
//! `FrameMismatch` otherwise; the caller converts one side explicitly with
//! [`FrameExpressed::expressed_in`] first. Unary operations never look at the
//! frame.
//!
//! The payload is stored in the frame's local coordinates. Moving the frame
//! later does not change those coordinates, so the quantity moves with its
//! frame; only conversions see the new pose, because they resolve the
//! transform at call time.

mod orientation;
mod point;
mod pose;
mod vector;

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

use crate::error::{FrameError, FrameResult};
use crate::frame::{FrameId, FrameTree};
use crate::transform::Transformable;

/// Anything bound to a reference frame
pub trait FrameHolder {
    /// Frame the value is expressed in
    fn frame(&self) -> FrameId;

    /// Fail with `FrameMismatch` unless `other` is expressed in the same frame
    fn check_frame_match<H: FrameHolder + ?Sized>(&self, other: &H) -> FrameResult<()> {
        self.check_expressed_in(other.frame())
    }

    /// Fail with `FrameMismatch` unless this value is expressed in `frame`
    fn check_expressed_in(&self, frame: FrameId) -> FrameResult<()> {
        if self.frame() != frame {
            return Err(FrameError::FrameMismatch {
                expected: frame,
                actual: self.frame(),
            });
        }
        Ok(())
    }
}

/// A geometric value tagged with the frame it is valid in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameExpressed<T> {
    frame: FrameId,
    value: T,
}

/// Point expressed in a frame
pub type FramePoint3 = FrameExpressed<Point3<f64>>;
/// Free vector expressed in a frame
pub type FrameVector3 = FrameExpressed<Vector3<f64>>;
/// Pose (body-to-frame transform) expressed in a frame
pub type FramePose3 = FrameExpressed<Isometry3<f64>>;
/// Orientation expressed in a frame
pub type FrameOrientation3 = FrameExpressed<UnitQuaternion<f64>>;

impl<T> FrameExpressed<T> {
    /// Bind `value` to `frame`
    pub fn new(frame: FrameId, value: T) -> Self {
        Self { frame, value }
    }

    /// Payload in this frame's coordinates
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume and return the payload, dropping the frame binding
    pub fn into_value(self) -> T {
        self.value
    }

    /// New payload bound to the same frame
    pub(crate) fn with_value<U>(&self, value: U) -> FrameExpressed<U> {
        FrameExpressed {
            frame: self.frame,
            value,
        }
    }

    /// Check frames and combine both payloads
    pub(crate) fn zip_with<U, R>(
        &self,
        other: &FrameExpressed<U>,
        f: impl FnOnce(&T, &U) -> R,
    ) -> FrameResult<R> {
        other.check_expressed_in(self.frame)?;
        Ok(f(&self.value, &other.value))
    }
}

impl<T> FrameHolder for FrameExpressed<T> {
    fn frame(&self) -> FrameId {
        self.frame
    }
}

impl<T: Transformable> FrameExpressed<T> {
    /// The same quantity expressed in `target`
    ///
    /// Pure: the original is not modified. Fails with `InvalidHandle` if either
    /// frame is stale, and with `DisjointFrames` when the frames cannot be
    /// related.
    pub fn expressed_in(&self, tree: &FrameTree, target: FrameId) -> FrameResult<Self> {
        let transform = tree.resolve_transform(self.frame, target)?;
        Ok(Self {
            frame: target,
            value: self.value.transformed(&transform),
        })
    }

    /// Payload coordinates in `target`, without the frame binding
    pub fn value_in(&self, tree: &FrameTree, target: FrameId) -> FrameResult<T> {
        Ok(self.expressed_in(tree, target)?.value)
    }

    /// The same quantity expressed in the root of its tree
    pub fn expressed_in_root(&self, tree: &FrameTree) -> FrameResult<Self> {
        let root = tree.root_of(self.frame)?;
        let transform = tree.transform_to_root(self.frame)?;
        Ok(Self {
            frame: root,
            value: self.value.transformed(&transform),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::from_translation;

    #[test]
    fn test_check_frame_match() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let a = tree.create_frame("a", world, from_translation([1.0, 0.0, 0.0])).unwrap();

        let p = FramePoint3::new(world, Point3::origin());
        let q = FramePoint3::new(world, Point3::new(1.0, 0.0, 0.0));
        let r = FramePoint3::new(a, Point3::origin());

        assert!(p.check_frame_match(&q).is_ok());
        assert_eq!(
            p.check_frame_match(&r),
            Err(FrameError::FrameMismatch {
                expected: a,
                actual: world
            })
        );
    }

    #[test]
    fn test_expressed_in_is_pure() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let a = tree.create_frame("a", world, from_translation([1.0, 0.0, 0.0])).unwrap();

        let p = FramePoint3::new(a, Point3::origin());
        let q = p.expressed_in(&tree, world).unwrap();

        assert_eq!(p.frame(), a);
        assert_eq!(*p.value(), Point3::origin());
        assert_eq!(q.frame(), world);
        assert_eq!(*q.value(), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_expressed_in_root() {
        let mut tree = FrameTree::default();
        let map = tree.add_root("map").unwrap();
        let dock = tree.create_frame("dock", map, from_translation([0.0, 0.0, 2.0])).unwrap();

        let p = FramePoint3::new(dock, Point3::origin()).expressed_in_root(&tree).unwrap();
        assert_eq!(p.frame(), map);
        assert_eq!(*p.value(), Point3::new(0.0, 0.0, 2.0));
    }
}
