// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions and TOML loader
//!
//! Maps to sections in `noema.toml`. Every section falls back to its
//! `Default` impl field-by-field via `#[serde(default)]`, so a partial
//! file is always valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use noema_types::{NoemaError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NoemaConfig {
    pub engine: EngineConfig,
    pub graph: GraphConfig,
}

/// Worker pool and registry sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads draining the ready channel.
    pub workers: usize,
    /// Per-actor bounded mailbox capacity (raised to 64 if configured lower).
    pub mailbox_capacity: usize,
    /// Bucket count for the sharded registries (rounded up to a power of two).
    pub map_shards: usize,
    /// Expected number of live actors, used to pre-size registry buckets.
    pub initial_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            mailbox_capacity: 64,
            map_shards: 16,
            initial_capacity: 512,
        }
    }
}

/// Knowledge graph tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Minimum seconds between maintenance sweeps (decay + death checks).
    pub maintenance_interval_secs: i64,
    /// Relations used within this window are potentiated by `learn`.
    pub recent_window_secs: i64,
    /// Relations idle beyond this window are depressed by `learn`.
    pub stale_window_secs: i64,
    /// Multiplicative weight gain for recently used relations.
    pub potentiation: f64,
    /// Multiplicative weight loss for stale relations.
    pub depression: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            maintenance_interval_secs: 60,
            recent_window_secs: 3_600,
            stale_window_secs: 86_400,
            potentiation: 1.05,
            depression: 0.95,
        }
    }
}

impl NoemaConfig {
    /// Parse a TOML document. Unknown keys are ignored, missing sections
    /// fall back to defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: NoemaConfig =
            toml::from_str(input).map_err(|e| NoemaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NoemaError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.workers == 0 {
            return Err(NoemaError::InvalidConfig(
                "engine.workers must be at least 1".into(),
            ));
        }
        if self.engine.mailbox_capacity == 0 {
            return Err(NoemaError::InvalidConfig(
                "engine.mailbox_capacity must be at least 1".into(),
            ));
        }
        if self.engine.map_shards == 0 {
            return Err(NoemaError::InvalidConfig(
                "engine.map_shards must be at least 1".into(),
            ));
        }
        if self.graph.potentiation < 1.0 {
            return Err(NoemaError::InvalidConfig(
                "graph.potentiation must not shrink weights".into(),
            ));
        }
        if !(0.0 < self.graph.depression && self.graph.depression <= 1.0) {
            return Err(NoemaError::InvalidConfig(
                "graph.depression must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NoemaConfig::default();
        assert_eq!(config.engine.workers, 4);
        assert_eq!(config.engine.mailbox_capacity, 64);
        assert_eq!(config.graph.maintenance_interval_secs, 60);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = NoemaConfig::from_toml_str(
            r#"
            [engine]
            workers = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.workers, 8);
        assert_eq!(config.engine.mailbox_capacity, 64);
        assert_eq!(config.graph.stale_window_secs, 86_400);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = NoemaConfig::from_toml_str("[engine]\nworkers = 0\n").unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_bad_depression_rejected() {
        let err = NoemaConfig::from_toml_str("[graph]\ndepression = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("depression"));
    }
}
