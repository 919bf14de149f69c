//! # geoframe_shape
//!
//! Convex shapes bound to [`geoframe`] reference frames, with point queries,
//! bounding boxes and narrow-phase collision/distance between shapes living
//! in different frames.
//!
//! ## Usage
//!
//! ```rust
//! use geoframe::prelude::*;
//! use geoframe_shape::{FrameCollisionDetector, FrameShape};
//! use nalgebra::Vector3;
//!
//! let mut tree = FrameTree::new("world");
//! let gripper = tree.create_frame("gripper", tree.world(), from_translation([0.0, 0.0, 1.0]))?;
//!
//! let finger = FrameShape::capsule(gripper, Transform::identity(), 0.1, 0.01)?;
//! let table = FrameShape::cuboid(tree.world(), Transform::identity(), Vector3::new(2.0, 2.0, 0.1))?;
//!
//! let detector = FrameCollisionDetector::new();
//! let clearance = detector.distance(&tree, &finger, &table)?;
//! assert!((clearance - 0.89).abs() < 1e-4);
//! # Ok::<(), geoframe_shape::ShapeError>(())
//! ```

pub mod bounding_box;
pub mod collision;
pub mod error;
pub mod shape;

pub use bounding_box::FrameBoundingBox;
pub use collision::{FrameCollisionDetector, FrameCollisionResult};
pub use error::{ShapeError, ShapeResult};
pub use shape::{FrameShape, ShapeKind};
