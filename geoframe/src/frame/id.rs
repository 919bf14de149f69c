use std::fmt;

/// Generational handle to a frame in a [`FrameTree`](super::FrameTree)
///
/// Removing a frame bumps the generation of its slot, so every handle that
/// still points at it becomes stale and fails with `InvalidHandle`. Handles
/// also carry the id of the tree that issued them and are rejected by any
/// other tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId {
    tree: u32,
    index: u32,
    generation: u32,
}

impl FrameId {
    pub(crate) const fn new(tree: u32, index: u32, generation: u32) -> Self {
        Self {
            tree,
            index,
            generation,
        }
    }

    /// Id of the tree that issued this handle
    #[inline]
    pub fn tree(&self) -> u32 {
        self.tree
    }

    /// Slot index in the tree arena
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at the time the frame was created
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}v{}", self.index, self.generation)
    }
}
