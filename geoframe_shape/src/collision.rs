//! Collision and distance queries between frame shapes
//!
//! Both shapes are brought into one detector frame through the frame tree
//! (shape A's frame unless another one is requested), then the narrow phase
//! runs on plain coordinates. Results are expressed in the detector frame.

use geoframe::{FrameHolder, FrameId, FramePoint3, FrameTree, FrameVector3, Transform};
use parry3d_f64::query;
use parry3d_f64::shape::Shape;
use tracing::warn;

use crate::error::{ShapeError, ShapeResult};
use crate::shape::FrameShape;

/// Contact or proximity between two shapes
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCollisionResult {
    /// Frame every field below is expressed in
    pub frame: FrameId,
    /// Whether the shapes touch or overlap
    pub colliding: bool,
    /// Separation distance, negative penetration depth when colliding
    pub signed_distance: f64,
    /// Point of shape A closest to (or deepest into) shape B
    pub point_on_a: FramePoint3,
    /// Point of shape B closest to (or deepest into) shape A
    pub point_on_b: FramePoint3,
    /// Outward normal of shape A at `point_on_a`
    pub normal_on_a: FrameVector3,
    /// Outward normal of shape B at `point_on_b`
    pub normal_on_b: FrameVector3,
}

impl FrameHolder for FrameCollisionResult {
    fn frame(&self) -> FrameId {
        self.frame
    }
}

/// Narrow-phase detector working across frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCollisionDetector {
    max_distance: f64,
}

impl Default for FrameCollisionDetector {
    fn default() -> Self {
        Self {
            max_distance: f64::MAX,
        }
    }
}

impl FrameCollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Separation beyond which `evaluate_collision` reports nothing
    ///
    /// Default: unbounded
    pub fn with_max_distance(max_distance: f64) -> ShapeResult<Self> {
        if max_distance.is_nan() || max_distance < 0.0 {
            return Err(ShapeError::InvalidDimension {
                what: "max distance",
                value: max_distance,
            });
        }
        Ok(Self { max_distance })
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Collision state of `a` and `b`, expressed in `a`'s frame
    ///
    /// Returns `None` when the shapes are further apart than the detector's
    /// maximum distance.
    pub fn evaluate_collision(
        &self,
        tree: &FrameTree,
        a: &FrameShape,
        b: &FrameShape,
    ) -> ShapeResult<Option<FrameCollisionResult>> {
        self.evaluate_collision_in(tree, a, b, a.frame())
    }

    /// Collision state of `a` and `b`, expressed in `frame`
    pub fn evaluate_collision_in(
        &self,
        tree: &FrameTree,
        a: &FrameShape,
        b: &FrameShape,
        frame: FrameId,
    ) -> ShapeResult<Option<FrameCollisionResult>> {
        let (shape_a, pose_a) = placed(tree, a, frame)?;
        let (shape_b, pose_b) = placed(tree, b, frame)?;

        let contact = query::contact(&pose_a, shape_a, &pose_b, shape_b, self.max_distance)
            .map_err(|_| unsupported("contact", a, b))?;

        Ok(contact.map(|contact| FrameCollisionResult {
            frame,
            colliding: contact.dist <= 0.0,
            signed_distance: contact.dist,
            point_on_a: FramePoint3::new(frame, contact.point1),
            point_on_b: FramePoint3::new(frame, contact.point2),
            normal_on_a: FrameVector3::new(frame, contact.normal1.into_inner()),
            normal_on_b: FrameVector3::new(frame, contact.normal2.into_inner()),
        }))
    }

    /// Separation distance, zero when the shapes overlap
    pub fn distance(&self, tree: &FrameTree, a: &FrameShape, b: &FrameShape) -> ShapeResult<f64> {
        let (shape_a, pose_a) = placed(tree, a, a.frame())?;
        let (shape_b, pose_b) = placed(tree, b, a.frame())?;
        query::distance(&pose_a, shape_a, &pose_b, shape_b).map_err(|_| unsupported("distance", a, b))
    }

    /// Whether the shapes touch or overlap
    pub fn intersects(&self, tree: &FrameTree, a: &FrameShape, b: &FrameShape) -> ShapeResult<bool> {
        let (shape_a, pose_a) = placed(tree, a, a.frame())?;
        let (shape_b, pose_b) = placed(tree, b, a.frame())?;
        query::intersection_test(&pose_a, shape_a, &pose_b, shape_b)
            .map_err(|_| unsupported("intersection", a, b))
    }
}

/// Collider of `shape` and its pose in `frame`
fn placed<'a>(
    tree: &FrameTree,
    shape: &'a FrameShape,
    frame: FrameId,
) -> ShapeResult<(&'a dyn Shape, Transform)> {
    let frame_from_shape_frame = tree.resolve_transform(shape.frame(), frame)?;
    let (collider, pose) = shape.collider();
    Ok((collider, frame_from_shape_frame * pose))
}

fn unsupported(what: &str, a: &FrameShape, b: &FrameShape) -> ShapeError {
    warn!(
        query = what,
        shape_a = a.kind().name(),
        shape_b = b.kind().name(),
        "unsupported shape pair"
    );
    ShapeError::UnsupportedQuery(format!(
        "{} between {} and {}",
        what,
        a.kind().name(),
        b.kind().name()
    ))
}
