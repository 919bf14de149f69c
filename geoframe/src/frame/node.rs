//! Frame node and its private resolver cache

use parking_lot::Mutex;

use super::FrameId;
use crate::transform::Transform;

/// Cached partial product `anchor_from_frame` for one anchor
///
/// `own_version`, `parent` and `parent_stamp` are the snapshot taken when the
/// product was computed. The parent's stamp pins the parent's own snapshot, so
/// the chain of stamps covers every ancestor between the frame and the anchor.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub anchor: FrameId,
    pub anchor_from_frame: Transform,
    pub stamp: u64,
    pub own_version: u64,
    pub parent: Option<FrameId>,
    /// Zero when the parent is the anchor itself
    pub parent_stamp: u64,
}

/// Per-frame cache, ordered from least to most recently refreshed
#[derive(Debug, Default)]
pub(crate) struct FrameCache {
    entries: Vec<CacheEntry>,
}

impl FrameCache {
    pub fn lookup(&self, anchor: FrameId) -> Option<&CacheEntry> {
        self.entries.iter().find(|e| e.anchor == anchor)
    }

    pub fn store(&mut self, entry: CacheEntry, capacity: usize) {
        self.entries.retain(|e| e.anchor != entry.anchor);
        while self.entries.len() >= capacity.max(1) {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Declared properties of a frame relative to its root
///
/// The default is a moving frame with no particular orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameProperties {
    /// The frame does not move relative to its root
    pub stationary: bool,
    /// The frame's z axis stays aligned with its root's z axis
    pub z_up: bool,
}

impl FrameProperties {
    /// Properties every root frame has
    pub const ROOT: Self = Self {
        stationary: true,
        z_up: true,
    };

    pub fn with_stationary(mut self, stationary: bool) -> Self {
        self.stationary = stationary;
        self
    }

    pub fn with_z_up(mut self, z_up: bool) -> Self {
        self.z_up = z_up;
        self
    }
}

/// A node in the frame tree
#[derive(Debug)]
pub struct FrameNode {
    pub(crate) name: String,
    pub(crate) parent: Option<FrameId>,
    pub(crate) children: Vec<FrameId>,
    /// Pose relative to the parent (`parent_from_frame`)
    pub(crate) local: Transform,
    pub(crate) version: u64,
    pub(crate) depth: usize,
    pub(crate) stationary: bool,
    pub(crate) z_up: bool,
    pub(crate) cache: Mutex<FrameCache>,
}

impl FrameNode {
    pub(crate) fn new_root(name: String) -> Self {
        Self::new(name, None, Transform::identity(), 0, FrameProperties::ROOT)
    }

    pub(crate) fn new(
        name: String,
        parent: Option<FrameId>,
        local: Transform,
        depth: usize,
        properties: FrameProperties,
    ) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            local,
            version: 0,
            depth,
            stationary: properties.stationary,
            z_up: properties.z_up,
            cache: Mutex::new(FrameCache::default()),
        }
    }

    /// Frame name, unique within its tree
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent frame (None for roots)
    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[FrameId] {
        &self.children
    }

    /// Pose of this frame relative to its parent
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Number of times the local transform or parent link has changed
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Distance to the root (roots have depth 0)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this frame has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_stationary(&self) -> bool {
        self.stationary
    }

    pub fn is_z_up(&self) -> bool {
        self.z_up
    }

    pub fn properties(&self) -> FrameProperties {
        FrameProperties {
            stationary: self.stationary,
            z_up: self.z_up,
        }
    }

    /// Number of anchors currently cached for this frame
    pub fn cached_anchor_count(&self) -> usize {
        self.cache.lock().len()
    }

    pub(crate) fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}
