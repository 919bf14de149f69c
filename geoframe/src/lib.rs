//! # geoframe
//!
//! Reference-frame aware geometry for robotics.
//!
//! ## Structure
//!
//! ```text
//! geoframe/
//! ── transform     # Rigid transforms over nalgebra::Isometry3<f64>
//! ── frame/        # Frame tree, handles and the cached transform resolver
//! ── expressed/    # Points, vectors, poses and orientations bound to a frame
//! ── config        # Frame tree configuration (presets, builder, TOML)
//! ── error         # FrameError / FrameResult
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use geoframe::prelude::*;
//!
//! let mut tree = FrameTree::new("world");
//! let robot = tree.create_frame("robot", tree.world(), from_translation([1.0, 0.0, 0.0]))?;
//! let sensor = tree.create_frame("sensor", robot, from_translation([0.0, 1.0, 0.0]))?;
//!
//! let hit = FramePoint3::origin(sensor);
//! let in_world = hit.expressed_in(&tree, tree.world())?;
//! assert_eq!(in_world, FramePoint3::from_xyz(tree.world(), 1.0, 1.0, 0.0));
//!
//! // Mixing frames is refused until one side is converted
//! let home = FramePoint3::origin(tree.world());
//! assert!(hit.distance(&home).is_err());
//! assert!(in_world.distance(&home).is_ok());
//! # Ok::<(), FrameError>(())
//! ```

pub mod config;
pub mod error;
pub mod expressed;
pub mod frame;
pub mod transform;

pub use config::{DisjointPolicy, FrameTreeConfig, FrameTreeConfigBuilder};
pub use error::{FrameError, FrameResult};
pub use expressed::{
    FrameExpressed, FrameHolder, FrameOrientation3, FramePoint3, FramePose3, FrameVector3,
};
pub use frame::{FrameId, FrameNode, FrameProperties, FrameTree, ReparentPolicy, ResolverStats};
pub use transform::{Transform, TransformExt, Transformable, EPSILON};

/// Everything needed to build a tree and work with frame-expressed values
pub mod prelude {
    pub use crate::config::{DisjointPolicy, FrameTreeConfig};
    pub use crate::error::{FrameError, FrameResult};
    pub use crate::expressed::{
        FrameExpressed, FrameHolder, FrameOrientation3, FramePoint3, FramePose3, FrameVector3,
    };
    pub use crate::frame::{FrameId, FrameProperties, FrameTree, ReparentPolicy};
    pub use crate::transform::{
        from_axis_angle, from_euler, from_translation, Transform, TransformExt,
    };
}
