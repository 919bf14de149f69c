//! Transform Resolver - transforms between any two frames
//!
//! Every query goes through the lowest common ancestor `C` of its two
//! endpoints. Each frame keeps, per anchor `C`, the partial product
//! `C_from_frame` together with a snapshot of what it was built from. Writes
//! never touch caches; reads validate them top-down from `C`:
//!
//! - a frame's entry is reused when its own version and parent are unchanged
//!   and its parent's entry (the one just validated or rebuilt) still carries
//!   the stamp recorded at cache time;
//! - otherwise `C_from_frame = C_from_parent * local` is recomputed and stored
//!   under a fresh stamp, which in turn invalidates every descendant entry that
//!   was built on the old one.
//!
//! Writes stay O(1); a read is O(depth) and only recomputes links that changed.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::node::CacheEntry;
use super::{FrameId, FrameTree};
use crate::config::DisjointPolicy;
use crate::error::{FrameError, FrameResult};
use crate::transform::Transform;

/// Snapshot of resolver activity since the tree was created or last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Calls to `resolve_transform` and `transform_to_root`
    pub queries: u64,
    /// Queries answered without traversal (same frame on both ends)
    pub identity_shortcuts: u64,
    /// Links whose cached partial product was reused
    pub links_reused: u64,
    /// Links whose partial product had to be recomputed
    pub links_recomputed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ResolverCounters {
    queries: AtomicU64,
    identity_shortcuts: AtomicU64,
    links_reused: AtomicU64,
    links_recomputed: AtomicU64,
}

impl ResolverCounters {
    fn snapshot(&self) -> ResolverStats {
        ResolverStats {
            queries: self.queries.load(Ordering::Relaxed),
            identity_shortcuts: self.identity_shortcuts.load(Ordering::Relaxed),
            links_reused: self.links_reused.load(Ordering::Relaxed),
            links_recomputed: self.links_recomputed.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.queries.store(0, Ordering::Relaxed);
        self.identity_shortcuts.store(0, Ordering::Relaxed);
        self.links_reused.store(0, Ordering::Relaxed);
        self.links_recomputed.store(0, Ordering::Relaxed);
    }
}

impl FrameTree {
    /// Transform mapping coordinates expressed in `from` into `to`
    ///
    /// The result is `to_from_from`: for a point `p` expressed in `from`,
    /// `resolve_transform(from, to)? * p` is the same point expressed in `to`.
    pub fn resolve_transform(&self, from: FrameId, to: FrameId) -> FrameResult<Transform> {
        self.frame(from)?;
        self.frame(to)?;
        self.counters.queries.fetch_add(1, Ordering::Relaxed);

        if from == to {
            self.counters
                .identity_shortcuts
                .fetch_add(1, Ordering::Relaxed);
            return Ok(Transform::identity());
        }

        let ancestor = match self.common_ancestor(from, to) {
            Ok(ancestor) => ancestor,
            Err(FrameError::DisjointFrames(..))
                if self.config.disjoint_policy == DisjointPolicy::CoincidentRoots =>
            {
                let root_from_from = self.anchored_to_root(from)?;
                let root_from_to = self.anchored_to_root(to)?;
                trace!(from = %from, to = %to, "resolving across coincident roots");
                return Ok(root_from_to.inverse() * root_from_from);
            }
            Err(e) => return Err(e),
        };

        if ancestor == to {
            return self.anchor_from_frame(from, to);
        }
        let ancestor_from_to = self.anchor_from_frame(to, ancestor)?;
        if ancestor == from {
            return Ok(ancestor_from_to.inverse());
        }
        let ancestor_from_from = self.anchor_from_frame(from, ancestor)?;

        Ok(ancestor_from_to.inverse() * ancestor_from_from)
    }

    /// Transform mapping coordinates expressed in `frame` into its root frame
    pub fn transform_to_root(&self, frame: FrameId) -> FrameResult<Transform> {
        self.counters.queries.fetch_add(1, Ordering::Relaxed);
        self.anchored_to_root(frame)
    }

    /// Resolver counters
    pub fn resolver_stats(&self) -> ResolverStats {
        self.counters.snapshot()
    }

    /// Zero the resolver counters (caches are left as they are)
    pub fn reset_resolver_stats(&self) {
        self.counters.reset();
    }

    fn anchored_to_root(&self, frame: FrameId) -> FrameResult<Transform> {
        let root = self.root_of(frame)?;
        if root == frame {
            return Ok(Transform::identity());
        }
        self.anchor_from_frame(frame, root)
    }

    /// `anchor_from_frame`, where `anchor` is a strict ancestor of `frame`
    fn anchor_from_frame(&self, frame: FrameId, anchor: FrameId) -> FrameResult<Transform> {
        let mut path = Vec::new();
        let mut current = frame;
        while current != anchor {
            path.push(current);
            current = self
                .frame(current)?
                .parent
                .ok_or(FrameError::DisjointFrames(frame, anchor))?;
        }

        let capacity = self.config.cache_anchors_per_frame;
        let mut anchor_from_node = Transform::identity();
        let mut parent_stamp = 0;
        let (mut reused, mut recomputed) = (0u64, 0u64);

        for &id in path.iter().rev() {
            let node = self.frame(id)?;
            let mut cache = node.cache.lock();

            let valid = cache.lookup(anchor).filter(|entry| {
                entry.own_version == node.version
                    && entry.parent == node.parent
                    && entry.parent_stamp == parent_stamp
            });
            if let Some(entry) = valid {
                anchor_from_node = entry.anchor_from_frame;
                parent_stamp = entry.stamp;
                reused += 1;
                continue;
            }

            anchor_from_node *= node.local;
            anchor_from_node.rotation.renormalize_fast();
            let stamp = self.next_stamp.fetch_add(1, Ordering::Relaxed);
            cache.store(
                CacheEntry {
                    anchor,
                    anchor_from_frame: anchor_from_node,
                    stamp,
                    own_version: node.version,
                    parent: node.parent,
                    parent_stamp,
                },
                capacity,
            );
            parent_stamp = stamp;
            recomputed += 1;
        }

        if recomputed > 0 {
            trace!(frame = %frame, anchor = %anchor, recomputed, reused, "refreshed frame cache");
        }
        self.counters
            .links_reused
            .fetch_add(reused, Ordering::Relaxed);
        self.counters
            .links_recomputed
            .fetch_add(recomputed, Ordering::Relaxed);

        Ok(anchor_from_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameTreeConfig;
    use crate::transform::{from_euler, from_translation, TransformExt, EPSILON};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn chain() -> (FrameTree, FrameId, FrameId, FrameId) {
        let mut tree = FrameTree::new("world");
        let world = tree.world();
        let robot = tree
            .create_frame("robot", world, from_translation([1.0, 0.0, 0.0]))
            .unwrap();
        let sensor = tree
            .create_frame("sensor", robot, from_translation([0.0, 1.0, 0.0]))
            .unwrap();
        (tree, world, robot, sensor)
    }

    #[test]
    fn test_lookup_identity() {
        let (tree, _, robot, _) = chain();
        let tf = tree.resolve_transform(robot, robot).unwrap();
        assert!(tf.is_identity(EPSILON));
        assert_eq!(tree.resolver_stats().identity_shortcuts, 1);
    }

    #[test]
    fn test_lookup_chain_transform() {
        let (tree, world, _, sensor) = chain();
        let tf = tree.resolve_transform(sensor, world).unwrap();
        let p = tf * Point3::origin();
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_lookup_inverse_transform() {
        let (tree, world, _, sensor) = chain();
        let tf = tree.resolve_transform(world, sensor).unwrap();
        let p = tf * Point3::origin();
        assert_relative_eq!(p, Point3::new(-1.0, -1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_repeated_query_hits_cache() {
        let (tree, world, _, sensor) = chain();
        tree.resolve_transform(sensor, world).unwrap();
        let first = tree.resolver_stats();
        assert_eq!(first.links_recomputed, 2);

        tree.resolve_transform(sensor, world).unwrap();
        let second = tree.resolver_stats();
        assert_eq!(second.links_recomputed, 2);
        assert_eq!(second.links_reused, 2);
    }

    #[test]
    fn test_mutation_recomputes_only_below_change() {
        let (mut tree, world, _, sensor) = chain();
        tree.resolve_transform(sensor, world).unwrap();
        tree.reset_resolver_stats();

        tree.set_local_transform(sensor, from_translation([0.0, 2.0, 0.0]))
            .unwrap();
        let tf = tree.resolve_transform(sensor, world).unwrap();

        let stats = tree.resolver_stats();
        assert_eq!(stats.links_reused, 1);
        assert_eq!(stats.links_recomputed, 1);
        assert_relative_eq!(
            tf * Point3::origin(),
            Point3::new(1.0, 2.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_ancestor_mutation_invalidates_descendants() {
        let (mut tree, world, robot, sensor) = chain();
        tree.resolve_transform(sensor, world).unwrap();

        tree.set_local_transform(robot, from_translation([2.0, 0.0, 0.0]))
            .unwrap();
        tree.reset_resolver_stats();
        let tf = tree.resolve_transform(sensor, world).unwrap();

        assert_eq!(tree.resolver_stats().links_recomputed, 2);
        assert_relative_eq!(
            tf * Point3::origin(),
            Point3::new(2.0, 1.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_sibling_refresh_does_not_hide_staleness() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let base = tree
            .create_frame("base", world, from_translation([1.0, 0.0, 0.0]))
            .unwrap();
        let left = tree
            .create_frame("left", base, from_translation([0.0, 1.0, 0.0]))
            .unwrap();
        let right = tree
            .create_frame("right", base, from_translation([0.0, -1.0, 0.0]))
            .unwrap();
        tree.resolve_transform(left, world).unwrap();
        tree.resolve_transform(right, world).unwrap();

        tree.set_local_transform(base, from_translation([5.0, 0.0, 0.0]))
            .unwrap();
        // Refreshes base through left; right must still notice the new stamp
        tree.resolve_transform(left, world).unwrap();
        let tf = tree.resolve_transform(right, world).unwrap();

        assert_relative_eq!(
            tf * Point3::origin(),
            Point3::new(5.0, -1.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_query_below_common_ancestor_ignores_ancestor_pose() {
        let mut tree = FrameTree::default();
        let world = tree.world();
        let base = tree
            .create_frame("base", world, from_euler([3.0, 0.0, 0.0], [0.0, 0.0, 0.7]))
            .unwrap();
        let a = tree
            .create_frame("a", base, from_translation([1.0, 0.0, 0.0]))
            .unwrap();
        let b = tree
            .create_frame("b", base, from_translation([0.0, 1.0, 0.0]))
            .unwrap();

        let before = tree.resolve_transform(a, b).unwrap();
        tree.set_local_transform(base, from_translation([-8.0, 2.0, 1.0]))
            .unwrap();
        tree.reset_resolver_stats();
        let after = tree.resolve_transform(a, b).unwrap();

        assert!(before.approx_eq(&after, EPSILON));
        assert_eq!(tree.resolver_stats().links_recomputed, 0);
    }

    #[test]
    fn test_small_cache_capacity_stays_correct() {
        let config = FrameTreeConfig::custom()
            .cache_anchors_per_frame(1)
            .build()
            .unwrap();
        let mut tree = FrameTree::with_config("world", config).unwrap();
        let world = tree.world();
        let base = tree
            .create_frame("base", world, from_translation([1.0, 0.0, 0.0]))
            .unwrap();
        let a = tree
            .create_frame("a", base, from_translation([0.0, 1.0, 0.0]))
            .unwrap();
        let b = tree
            .create_frame("b", base, from_translation([0.0, 0.0, 1.0]))
            .unwrap();

        for _ in 0..3 {
            let a_world = tree.resolve_transform(a, world).unwrap();
            let a_b = tree.resolve_transform(a, b).unwrap();
            assert_relative_eq!(
                a_world * Point3::origin(),
                Point3::new(1.0, 1.0, 0.0),
                epsilon = EPSILON
            );
            assert_relative_eq!(
                a_b * Point3::origin(),
                Point3::new(0.0, 1.0, -1.0),
                epsilon = EPSILON
            );
        }
        assert_eq!(tree.frame(a).unwrap().cached_anchor_count(), 1);
    }

    #[test]
    fn test_stale_endpoint_fails_fast() {
        let (mut tree, world, robot, sensor) = chain();
        tree.remove_frame(robot, true).unwrap();
        assert!(matches!(
            tree.resolve_transform(sensor, world),
            Err(FrameError::InvalidHandle(_))
        ));
        assert!(matches!(
            tree.resolve_transform(sensor, sensor),
            Err(FrameError::InvalidHandle(_))
        ));
    }
}
