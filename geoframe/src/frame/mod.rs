//! Reference frame tree
//!
//! Coordinate frame management for tracking the relationships between the
//! frames of a robot and resolving transforms between any two of them.
//!
//! # Example
//!
//! ```rust
//! use geoframe::frame::FrameTree;
//! use geoframe::transform::from_translation;
//! use nalgebra::Point3;
//!
//! let mut tree = FrameTree::new("world");
//! let robot = tree.create_frame("robot", tree.world(), from_translation([1.0, 0.0, 0.0]))?;
//! let sensor = tree.create_frame("sensor", robot, from_translation([0.0, 1.0, 0.0]))?;
//!
//! let world_from_sensor = tree.resolve_transform(sensor, tree.world())?;
//! assert_eq!(world_from_sensor * Point3::origin(), Point3::new(1.0, 1.0, 0.0));
//! # Ok::<(), geoframe::FrameError>(())
//! ```

mod id;
mod node;
mod resolver;
mod tree;

pub use id::FrameId;
pub use node::{FrameNode, FrameProperties};
pub use resolver::ResolverStats;
pub use tree::{FrameTree, ReparentPolicy};
