//! Configuration for the frame tree

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// Upper bound on cached anchors kept per frame
pub const MAX_CACHE_ANCHORS: usize = 32;

/// Upper bound on frame slots reserved up front
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

/// What the resolver does with two frames that live under different roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisjointPolicy {
    /// Fail with `DisjointFrames`
    #[default]
    Error,
    /// Treat every root as the same physical frame
    CoincidentRoots,
}

/// Configuration for a [`FrameTree`](crate::frame::FrameTree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameTreeConfig {
    /// Behaviour for queries across independent roots
    ///
    /// Default: `Error`
    pub disjoint_policy: DisjointPolicy,

    /// Number of anchor frames whose partial products each frame caches
    ///
    /// Queries between frames under different common ancestors each use their
    /// own anchor. The least recently refreshed anchor is evicted first.
    ///
    /// Default: 4
    /// Range: 1 to 32
    pub cache_anchors_per_frame: usize,

    /// Number of frame slots reserved up front
    ///
    /// The tree still grows past it on demand.
    ///
    /// Default: 64
    /// Range: 0 to 1048576
    pub initial_capacity: usize,
}

impl Default for FrameTreeConfig {
    fn default() -> Self {
        Self::small()
    }
}

impl FrameTreeConfig {
    /// Small robot preset
    ///
    /// Suitable for single robots with a few dozen links.
    pub fn small() -> Self {
        Self {
            disjoint_policy: DisjointPolicy::Error,
            cache_anchors_per_frame: 4,
            initial_capacity: 64,
        }
    }

    /// Large scene preset
    ///
    /// Suitable for multi-robot scenes where queries hit many different
    /// common ancestors.
    pub fn large() -> Self {
        Self {
            disjoint_policy: DisjointPolicy::Error,
            cache_anchors_per_frame: 16,
            initial_capacity: 4096,
        }
    }

    /// Custom configuration builder
    pub fn custom() -> FrameTreeConfigBuilder {
        FrameTreeConfigBuilder::new()
    }

    /// Parse a configuration from TOML, missing keys take their defaults
    ///
    /// ```toml
    /// disjoint_policy = "coincident_roots"
    /// cache_anchors_per_frame = 8
    /// ```
    pub fn from_toml_str(source: &str) -> FrameResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| FrameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> FrameResult<()> {
        if self.cache_anchors_per_frame == 0 {
            return Err(FrameError::InvalidConfig(
                "cache_anchors_per_frame must be at least 1".to_string(),
            ));
        }
        if self.cache_anchors_per_frame > MAX_CACHE_ANCHORS {
            return Err(FrameError::InvalidConfig(format!(
                "cache_anchors_per_frame cannot exceed {}",
                MAX_CACHE_ANCHORS
            )));
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(FrameError::InvalidConfig(format!(
                "initial_capacity cannot exceed {}",
                MAX_INITIAL_CAPACITY
            )));
        }
        Ok(())
    }
}

/// Builder for custom frame tree configuration
pub struct FrameTreeConfigBuilder {
    config: FrameTreeConfig,
}

impl FrameTreeConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FrameTreeConfig::small(),
        }
    }

    /// Set the disjoint-root policy
    pub fn disjoint_policy(mut self, policy: DisjointPolicy) -> Self {
        self.config.disjoint_policy = policy;
        self
    }

    /// Set the number of cached anchors per frame
    pub fn cache_anchors_per_frame(mut self, n: usize) -> Self {
        self.config.cache_anchors_per_frame = n;
        self
    }

    /// Set the number of pre-reserved frame slots
    pub fn initial_capacity(mut self, n: usize) -> Self {
        self.config.initial_capacity = n;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> FrameResult<FrameTreeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for FrameTreeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let small = FrameTreeConfig::small();
        assert_eq!(small.disjoint_policy, DisjointPolicy::Error);
        assert!(small.validate().is_ok());

        let large = FrameTreeConfig::large();
        assert!(large.cache_anchors_per_frame > small.cache_anchors_per_frame);
        assert!(large.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = FrameTreeConfig::custom()
            .disjoint_policy(DisjointPolicy::CoincidentRoots)
            .cache_anchors_per_frame(8)
            .build()
            .unwrap();

        assert_eq!(config.disjoint_policy, DisjointPolicy::CoincidentRoots);
        assert_eq!(config.cache_anchors_per_frame, 8);
    }

    #[test]
    fn test_validation() {
        let mut config = FrameTreeConfig::small();
        config.cache_anchors_per_frame = 0;
        assert!(matches!(config.validate(), Err(FrameError::InvalidConfig(_))));

        config.cache_anchors_per_frame = MAX_CACHE_ANCHORS + 1;
        assert!(config.validate().is_err());

        let mut config = FrameTreeConfig::small();
        config.initial_capacity = MAX_INITIAL_CAPACITY + 1;
        assert!(matches!(config.validate(), Err(FrameError::InvalidConfig(_))));
        config.initial_capacity = MAX_INITIAL_CAPACITY;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_oversized_capacity() {
        let result = FrameTreeConfig::custom().initial_capacity(usize::MAX).build();
        assert!(matches!(result, Err(FrameError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_toml() {
        let config = FrameTreeConfig::from_toml_str(
            r#"
            disjoint_policy = "coincident_roots"
            cache_anchors_per_frame = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.disjoint_policy, DisjointPolicy::CoincidentRoots);
        assert_eq!(config.cache_anchors_per_frame, 2);
        assert_eq!(config.initial_capacity, 64);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(FrameTreeConfig::from_toml_str("cache_anchors_per_frame = 0").is_err());
        assert!(FrameTreeConfig::from_toml_str("disjoint_policy = \"maybe\"").is_err());
    }
}
