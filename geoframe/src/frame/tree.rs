//! Frame Tree - frame hierarchy and structural mutation
//!
//! Frames live in a generational arena. Parents are stored as handles, so the
//! structure never owns itself and a stale handle is detected on use instead
//! of dangling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tracing::debug;

use super::node::{FrameNode, FrameProperties};
use super::resolver::ResolverCounters;
use super::FrameId;
use crate::config::FrameTreeConfig;
use crate::error::{FrameError, FrameResult};
use crate::transform::{Transform, TransformExt, EPSILON};

/// Source of process-unique tree ids stamped into every handle
static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

/// How `reparent` treats the moved frame's pose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentPolicy {
    /// Keep the pose relative to the tree: the local transform is recomputed
    PreserveWorldPose,
    /// Keep the local transform: the frame moves along with its new parent
    PreserveLocalTransform,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<FrameNode>,
}

/// Forest of reference frames
///
/// Structural mutation needs `&mut self`; transform queries only need `&self`
/// and refresh the per-frame caches internally. The tree does no locking of
/// its own around structure: sharing it across threads for mutation is up to
/// the caller (e.g. `Arc<RwLock<FrameTree>>`).
#[derive(Debug)]
pub struct FrameTree {
    id: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, FrameId>,
    roots: Vec<FrameId>,
    /// Root given at construction, cannot be removed
    world: FrameId,
    pub(crate) config: FrameTreeConfig,
    pub(crate) next_stamp: AtomicU64,
    pub(crate) counters: ResolverCounters,
}

impl Default for FrameTree {
    fn default() -> Self {
        Self::new("world")
    }
}

impl FrameTree {
    /// Create a new frame tree with the given root frame name
    pub fn new(root: impl Into<String>) -> Self {
        Self::build(root.into(), FrameTreeConfig::default())
    }

    /// Create a new frame tree with a custom configuration
    pub fn with_config(root: impl Into<String>, config: FrameTreeConfig) -> FrameResult<Self> {
        config.validate()?;
        Ok(Self::build(root.into(), config))
    }

    fn build(root: String, config: FrameTreeConfig) -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        let mut slots = Vec::with_capacity(config.initial_capacity.max(1));
        slots.push(Slot {
            generation: 0,
            node: Some(FrameNode::new_root(root.clone())),
        });
        let world = FrameId::new(id, 0, 0);
        let mut names = HashMap::new();
        names.insert(root, world);

        Self {
            id,
            slots,
            free: Vec::new(),
            names,
            roots: vec![world],
            world,
            config,
            next_stamp: AtomicU64::new(1),
            counters: ResolverCounters::default(),
        }
    }

    /// The root frame given at construction
    pub fn world(&self) -> FrameId {
        self.world
    }

    /// Active configuration
    pub fn config(&self) -> &FrameTreeConfig {
        &self.config
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get a frame node, failing on stale handles and handles of other trees
    pub fn frame(&self, id: FrameId) -> FrameResult<&FrameNode> {
        if id.tree() != self.id {
            return Err(FrameError::InvalidHandle(id));
        }
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(FrameError::InvalidHandle(id))
    }

    fn frame_mut(&mut self, id: FrameId) -> FrameResult<&mut FrameNode> {
        if id.tree() != self.id {
            return Err(FrameError::InvalidHandle(id));
        }
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(FrameError::InvalidHandle(id))
    }

    /// Check if a handle still refers to a live frame
    pub fn contains(&self, id: FrameId) -> bool {
        self.frame(id).is_ok()
    }

    /// Find a frame by name
    pub fn find(&self, name: &str) -> Option<FrameId> {
        self.names.get(name).copied()
    }

    /// Get a frame by name, failing with `FrameNotFound`
    pub fn frame_by_name(&self, name: &str) -> FrameResult<FrameId> {
        self.find(name)
            .ok_or_else(|| FrameError::FrameNotFound(name.to_string()))
    }

    pub fn name(&self, id: FrameId) -> FrameResult<&str> {
        Ok(self.frame(id)?.name())
    }

    pub fn parent(&self, id: FrameId) -> FrameResult<Option<FrameId>> {
        Ok(self.frame(id)?.parent)
    }

    pub fn children(&self, id: FrameId) -> FrameResult<&[FrameId]> {
        Ok(self.frame(id)?.children())
    }

    pub fn local_transform(&self, id: FrameId) -> FrameResult<Transform> {
        Ok(self.frame(id)?.local)
    }

    pub fn version(&self, id: FrameId) -> FrameResult<u64> {
        Ok(self.frame(id)?.version)
    }

    pub fn depth(&self, id: FrameId) -> FrameResult<usize> {
        Ok(self.frame(id)?.depth)
    }

    pub fn is_root(&self, id: FrameId) -> FrameResult<bool> {
        Ok(self.frame(id)?.is_root())
    }

    /// Number of live frames
    pub fn frame_count(&self) -> usize {
        self.names.len()
    }

    /// All current roots, the construction root first
    pub fn roots(&self) -> &[FrameId] {
        &self.roots
    }

    /// Iterate over all live frames
    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &FrameNode)> {
        let tree = self.id;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (FrameId::new(tree, index as u32, slot.generation), node))
        })
    }

    /// Whether the frame does not move relative to its root
    pub fn is_stationary(&self, id: FrameId) -> FrameResult<bool> {
        Ok(self.frame(id)?.is_stationary())
    }

    /// Whether the frame's z axis stays aligned with its root's z axis
    pub fn is_z_up(&self, id: FrameId) -> FrameResult<bool> {
        Ok(self.frame(id)?.is_z_up())
    }

    /// Fail with `NotStationary` unless the frame is stationary
    pub fn check_stationary(&self, id: FrameId) -> FrameResult<()> {
        if !self.is_stationary(id)? {
            return Err(FrameError::NotStationary(id));
        }
        Ok(())
    }

    /// Fail with `NotZUp` unless the frame is z-up
    pub fn check_z_up(&self, id: FrameId) -> FrameResult<()> {
        if !self.is_z_up(id)? {
            return Err(FrameError::NotZUp(id));
        }
        Ok(())
    }

    /// Root of the tree containing `id`
    pub fn root_of(&self, id: FrameId) -> FrameResult<FrameId> {
        let mut current = id;
        while let Some(parent) = self.frame(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    /// Frames from the root down to `id` (root first, `id` last)
    pub fn path_from_root(&self, id: FrameId) -> FrameResult<Vec<FrameId>> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.frame(current)?.parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor_of(&self, ancestor: FrameId, id: FrameId) -> FrameResult<bool> {
        self.frame(ancestor)?;
        let mut current = self.frame(id)?.parent;
        while let Some(frame) = current {
            if frame == ancestor {
                return Ok(true);
            }
            current = self.frame(frame)?.parent;
        }
        Ok(false)
    }

    /// All descendants of `id` (recursive, pre-order, excluding `id`)
    pub fn descendants(&self, id: FrameId) -> FrameResult<Vec<FrameId>> {
        let mut subtree = self.subtree(id)?;
        subtree.remove(0);
        Ok(subtree)
    }

    fn subtree(&self, id: FrameId) -> FrameResult<Vec<FrameId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.frame(current)?.children.iter().rev());
        }
        Ok(out)
    }

    /// Lowest common ancestor of two frames
    ///
    /// Walks both ancestor chains after levelling them by depth. Frames under
    /// different roots fail with `DisjointFrames`.
    pub fn common_ancestor(&self, a: FrameId, b: FrameId) -> FrameResult<FrameId> {
        let mut node_a = self.frame(a)?;
        let mut node_b = self.frame(b)?;
        let (mut cur_a, mut cur_b) = (a, b);

        while node_a.depth > node_b.depth {
            cur_a = node_a.parent.ok_or(FrameError::DisjointFrames(a, b))?;
            node_a = self.frame(cur_a)?;
        }
        while node_b.depth > node_a.depth {
            cur_b = node_b.parent.ok_or(FrameError::DisjointFrames(a, b))?;
            node_b = self.frame(cur_b)?;
        }

        while cur_a != cur_b {
            match (node_a.parent, node_b.parent) {
                (Some(pa), Some(pb)) => {
                    cur_a = pa;
                    cur_b = pb;
                    node_a = self.frame(pa)?;
                    node_b = self.frame(pb)?;
                }
                _ => return Err(FrameError::DisjointFrames(a, b)),
            }
        }

        Ok(cur_a)
    }

    /// Fail with `DisjointFrames` unless both frames share a root
    pub fn check_same_tree(&self, a: FrameId, b: FrameId) -> FrameResult<()> {
        if self.root_of(a)? != self.root_of(b)? {
            return Err(FrameError::DisjointFrames(a, b));
        }
        Ok(())
    }

    // ========================================================================
    // Structural mutation
    // ========================================================================

    fn allocate(&mut self, node: FrameNode) -> FrameId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            FrameId::new(self.id, index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            FrameId::new(self.id, (self.slots.len() - 1) as u32, 0)
        }
    }

    fn release(&mut self, id: FrameId) -> Option<FrameNode> {
        if id.tree() != self.id {
            return None;
        }
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(node)
    }

    /// Add an independent root frame
    ///
    /// Roots are stationary and z-up.
    pub fn add_root(&mut self, name: impl Into<String>) -> FrameResult<FrameId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(FrameError::FrameNameTaken(name));
        }

        let id = self.allocate(FrameNode::new_root(name.clone()));
        self.roots.push(id);
        debug!(frame = %id, name = %name, "added root frame");
        self.names.insert(name, id);
        Ok(id)
    }

    /// Create a moving frame under `parent` with the given pose relative to it
    pub fn create_frame(
        &mut self,
        name: impl Into<String>,
        parent: FrameId,
        local: Transform,
    ) -> FrameResult<FrameId> {
        self.create_frame_with(name, parent, local, FrameProperties::default())
    }

    /// Create a frame under `parent` with explicit frame properties
    ///
    /// A stationary frame needs a stationary parent. A z-up frame needs a z-up
    /// parent and a local rotation that keeps the z axis.
    pub fn create_frame_with(
        &mut self,
        name: impl Into<String>,
        parent: FrameId,
        local: Transform,
        properties: FrameProperties,
    ) -> FrameResult<FrameId> {
        let name = name.into();
        let parent_node = self
            .frame(parent)
            .map_err(|_| FrameError::InvalidParent(parent))?;
        if self.names.contains_key(&name) {
            return Err(FrameError::FrameNameTaken(name));
        }
        check_properties(parent, parent_node, &name, properties, &local)?;
        let depth = parent_node.depth + 1;

        let id = self.allocate(FrameNode::new(
            name.clone(),
            Some(parent),
            local,
            depth,
            properties,
        ));
        self.frame_mut(parent)?.children.push(id);
        debug!(frame = %id, name = %name, parent = %parent, "created frame");
        self.names.insert(name, id);
        Ok(id)
    }

    /// Replace a frame's pose relative to its parent
    ///
    /// O(1): only the version counter moves, caches are checked lazily on the
    /// next query.
    pub fn set_local_transform(&mut self, id: FrameId, transform: Transform) -> FrameResult<()> {
        self.update_local_transform(id, |local| *local = transform)
    }

    /// Edit a frame's pose relative to its parent in place
    pub fn update_local_transform(
        &mut self,
        id: FrameId,
        update: impl FnOnce(&mut Transform),
    ) -> FrameResult<()> {
        let node = self.frame_mut(id)?;
        if node.is_root() {
            return Err(FrameError::RootFrame(id));
        }
        let mut local = node.local;
        update(&mut local);
        if node.z_up && !local.keeps_z_axis(EPSILON) {
            return Err(FrameError::ZAxisTilted(node.name.clone()));
        }
        node.local = local;
        node.bump_version();
        Ok(())
    }

    /// Move a frame (and its subtree) under a new parent
    ///
    /// Fails with `CycleDetected` if `new_parent` is the frame itself or one of
    /// its descendants. Nothing is modified when an error is returned.
    pub fn reparent(
        &mut self,
        id: FrameId,
        new_parent: FrameId,
        policy: ReparentPolicy,
    ) -> FrameResult<()> {
        let node = self.frame(id)?;
        let (old_parent, properties) = (node.parent, node.properties());
        let parent_depth = self
            .frame(new_parent)
            .map_err(|_| FrameError::InvalidParent(new_parent))?
            .depth;
        if id == self.world {
            return Err(FrameError::RootFrame(id));
        }
        if id == new_parent || self.is_ancestor_of(id, new_parent)? {
            return Err(FrameError::CycleDetected {
                frame: id,
                new_parent,
            });
        }

        let local = match policy {
            ReparentPolicy::PreserveWorldPose => self.resolve_transform(id, new_parent)?,
            ReparentPolicy::PreserveLocalTransform => self.frame(id)?.local,
        };
        check_properties(
            new_parent,
            self.frame(new_parent)?,
            self.frame(id)?.name(),
            properties,
            &local,
        )?;

        match old_parent {
            Some(parent) => self.frame_mut(parent)?.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        self.frame_mut(new_parent)?.children.push(id);

        let node = self.frame_mut(id)?;
        node.parent = Some(new_parent);
        node.local = local;
        node.bump_version();
        self.set_subtree_depth(id, parent_depth + 1)?;

        debug!(frame = %id, new_parent = %new_parent, ?policy, "reparented frame");
        Ok(())
    }

    fn set_subtree_depth(&mut self, id: FrameId, depth: usize) -> FrameResult<()> {
        let mut stack = vec![(id, depth)];
        while let Some((current, depth)) = stack.pop() {
            let node = self.frame_mut(current)?;
            node.depth = depth;
            stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }

    /// Remove a frame from the tree
    ///
    /// Without `cascade`, a frame that still has children is left untouched and
    /// `FrameHasChildren` is returned. With `cascade`, the whole subtree is
    /// removed. Returns the removed handles; all of them become stale.
    pub fn remove_frame(&mut self, id: FrameId, cascade: bool) -> FrameResult<Vec<FrameId>> {
        let node = self.frame(id)?;
        if id == self.world {
            return Err(FrameError::RootFrame(id));
        }
        if !cascade && !node.children.is_empty() {
            return Err(FrameError::FrameHasChildren {
                frame: id,
                children: node.children.len(),
            });
        }

        let parent = node.parent;
        let removed = self.subtree(id)?;

        match parent {
            Some(parent) => self.frame_mut(parent)?.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        for &frame in &removed {
            if let Some(node) = self.release(frame) {
                self.names.remove(&node.name);
            }
        }

        debug!(frame = %id, count = removed.len(), "removed frame");
        Ok(removed)
    }

    /// Check parent/child links, depths and name index for consistency
    pub fn validate(&self) -> FrameResult<()> {
        for (id, node) in self.iter() {
            match node.parent {
                Some(parent) => {
                    let parent_node = self
                        .frame(parent)
                        .map_err(|_| FrameError::InvalidParent(parent))?;
                    if !parent_node.children.contains(&id) {
                        return Err(FrameError::InvalidParent(parent));
                    }
                    // Strictly increasing depth along every edge rules out cycles
                    if node.depth != parent_node.depth + 1 {
                        return Err(FrameError::CycleDetected {
                            frame: id,
                            new_parent: parent,
                        });
                    }
                    check_properties(
                        parent,
                        parent_node,
                        &node.name,
                        node.properties(),
                        &node.local,
                    )?;
                }
                None => {
                    if !self.roots.contains(&id) || node.depth != 0 {
                        return Err(FrameError::InvalidHandle(id));
                    }
                }
            }
            if self.names.get(&node.name) != Some(&id) {
                return Err(FrameError::FrameNotFound(node.name.clone()));
            }
        }
        Ok(())
    }
}

/// Check that a frame with `properties` and pose `local` may hang off `parent`
fn check_properties(
    parent: FrameId,
    parent_node: &FrameNode,
    name: &str,
    properties: FrameProperties,
    local: &Transform,
) -> FrameResult<()> {
    if properties.stationary && !parent_node.stationary {
        return Err(FrameError::NotStationary(parent));
    }
    if properties.z_up {
        if !parent_node.z_up {
            return Err(FrameError::NotZUp(parent));
        }
        if !local.keeps_z_axis(EPSILON) {
            return Err(FrameError::ZAxisTilted(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::from_translation;

    #[test]
    fn test_tree_creation() {
        let tree = FrameTree::new("world");
        assert_eq!(tree.frame_count(), 1);
        assert_eq!(tree.name(tree.world()).unwrap(), "world");
        assert!(tree.is_root(tree.world()).unwrap());
        assert_eq!(tree.roots(), &[tree.world()]);
    }

    #[test]
    fn test_create_frame() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let base = tree
            .create_frame("base_link", world, from_translation([1.0, 0.0, 0.0]))
            .unwrap();

        assert_eq!(tree.frame_count(), 2);
        assert_eq!(tree.parent(base).unwrap(), Some(world));
        assert_eq!(tree.children(world).unwrap(), &[base]);
        assert_eq!(tree.depth(base).unwrap(), 1);
        assert_eq!(tree.find("base_link"), Some(base));
    }

    #[test]
    fn test_duplicate_name() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        tree.create_frame("a", world, Transform::identity()).unwrap();
        let result = tree.create_frame("a", world, Transform::identity());
        assert!(matches!(result, Err(FrameError::FrameNameTaken(_))));
        assert!(matches!(
            tree.add_root("world"),
            Err(FrameError::FrameNameTaken(_))
        ));
    }

    #[test]
    fn test_set_local_transform_bumps_version() {
        let mut tree = FrameTree::default();
        let a = tree
            .create_frame("a", tree.world(), Transform::identity())
            .unwrap();
        assert_eq!(tree.version(a).unwrap(), 0);

        tree.set_local_transform(a, from_translation([0.0, 1.0, 0.0]))
            .unwrap();
        tree.update_local_transform(a, |t| t.translation.vector.x = 3.0)
            .unwrap();

        assert_eq!(tree.version(a).unwrap(), 2);
        let local = tree.local_transform(a).unwrap();
        assert_eq!(local.translation.vector.x, 3.0);
        assert_eq!(local.translation.vector.y, 1.0);
    }

    #[test]
    fn test_root_has_no_local_transform() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let result = tree.set_local_transform(world, from_translation([1.0, 0.0, 0.0]));
        assert!(matches!(result, Err(FrameError::RootFrame(_))));
        assert_eq!(tree.version(world).unwrap(), 0);
    }

    #[test]
    fn test_common_ancestor() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let base = tree.create_frame("base", world, Transform::identity()).unwrap();
        let arm = tree.create_frame("arm", base, Transform::identity()).unwrap();
        let gripper = tree.create_frame("gripper", arm, Transform::identity()).unwrap();
        let camera = tree.create_frame("camera", base, Transform::identity()).unwrap();

        assert_eq!(tree.common_ancestor(gripper, camera).unwrap(), base);
        assert_eq!(tree.common_ancestor(gripper, arm).unwrap(), arm);
        assert_eq!(tree.common_ancestor(world, camera).unwrap(), world);
        assert_eq!(tree.common_ancestor(camera, camera).unwrap(), camera);
    }

    #[test]
    fn test_disjoint_roots() {
        let mut tree = FrameTree::default();
        let a = tree.create_frame("a", tree.world(), Transform::identity()).unwrap();
        let map = tree.add_root("map").unwrap();
        let b = tree.create_frame("b", map, Transform::identity()).unwrap();

        assert!(matches!(
            tree.common_ancestor(a, b),
            Err(FrameError::DisjointFrames(_, _))
        ));
        assert!(tree.check_same_tree(a, b).is_err());
        assert_eq!(tree.root_of(b).unwrap(), map);
    }

    #[test]
    fn test_path_from_root() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let base = tree.create_frame("base", world, Transform::identity()).unwrap();
        let arm = tree.create_frame("arm", base, Transform::identity()).unwrap();

        assert_eq!(tree.path_from_root(arm).unwrap(), vec![world, base, arm]);
        assert!(tree.is_ancestor_of(world, arm).unwrap());
        assert!(!tree.is_ancestor_of(arm, world).unwrap());
        assert!(!tree.is_ancestor_of(arm, arm).unwrap());
    }

    #[test]
    fn test_remove_frees_and_reuses_slot() {
        let mut tree = FrameTree::default();
        let a = tree.create_frame("a", tree.world(), Transform::identity()).unwrap();
        tree.remove_frame(a, false).unwrap();
        assert!(!tree.contains(a));
        assert_eq!(tree.find("a"), None);

        let b = tree.create_frame("b", tree.world(), Transform::identity()).unwrap();
        assert_eq!(b.index(), a.index());
        assert_ne!(b, a);
        assert!(matches!(tree.name(a), Err(FrameError::InvalidHandle(_))));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_cannot_remove_world() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        assert!(matches!(
            tree.remove_frame(world, true),
            Err(FrameError::RootFrame(_))
        ));
        assert!(tree.contains(world));
    }

    #[test]
    fn test_reparent_updates_depths() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let a = tree.create_frame("a", world, Transform::identity()).unwrap();
        let b = tree.create_frame("b", world, Transform::identity()).unwrap();
        let c = tree.create_frame("c", b, Transform::identity()).unwrap();

        tree.reparent(b, a, ReparentPolicy::PreserveLocalTransform)
            .unwrap();

        assert_eq!(tree.parent(b).unwrap(), Some(a));
        assert_eq!(tree.depth(b).unwrap(), 2);
        assert_eq!(tree.depth(c).unwrap(), 3);
        assert_eq!(tree.children(world).unwrap(), &[a]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_invalid_parent() {
        let mut tree = FrameTree::default();
        let a = tree.create_frame("a", tree.world(), Transform::identity()).unwrap();
        tree.remove_frame(a, false).unwrap();

        let result = tree.create_frame("b", a, Transform::identity());
        assert!(matches!(result, Err(FrameError::InvalidParent(_))));
        assert_eq!(tree.frame_count(), 1);
    }
}
