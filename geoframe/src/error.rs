//! Frame errors
//!
//! Every failure in this crate is local, synchronous and recoverable. A failed
//! mutation leaves the tree exactly as it was before the call.

use crate::frame::FrameId;
use thiserror::Error;

/// Frame tree and frame-expressed geometry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame {0} is stale or was removed from the tree")]
    InvalidHandle(FrameId),

    #[error("Parent frame {0} is stale or was removed from the tree")]
    InvalidParent(FrameId),

    #[error("Reparenting {frame} under {new_parent} would create a cycle")]
    CycleDetected { frame: FrameId, new_parent: FrameId },

    #[error("Frame {frame} still has {children} child frame(s)")]
    FrameHasChildren { frame: FrameId, children: usize },

    #[error("No common ancestor found between {0} and {1}")]
    DisjointFrames(FrameId, FrameId),

    #[error("Argument's frame {actual} does not match {expected}")]
    FrameMismatch { expected: FrameId, actual: FrameId },

    #[error("Operation not permitted on root frame {0}")]
    RootFrame(FrameId),

    #[error("Frame {0} is not a stationary frame")]
    NotStationary(FrameId),

    #[error("Frame {0} is not a z-up frame")]
    NotZUp(FrameId),

    #[error("Local transform of '{0}' tilts the z axis of a z-up frame")]
    ZAxisTilted(String),

    #[error("Frame '{0}' already exists")]
    FrameNameTaken(String),

    #[error("Frame '{0}' not found")]
    FrameNotFound(String),

    #[error("Invalid frame tree configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for frame operations
pub type FrameResult<T> = Result<T, FrameError>;

impl FrameError {
    /// Whether this error comes from mixing two frames without a conversion
    pub fn is_frame_mismatch(&self) -> bool {
        matches!(self, FrameError::FrameMismatch { .. })
    }

    /// Whether this error comes from a stale handle
    pub fn is_stale_handle(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidHandle(_) | FrameError::InvalidParent(_)
        )
    }
}
