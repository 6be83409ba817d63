/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Relation weight plasticity
//!
//! Recency-based learning: relations that carried activation recently are
//! potentiated, relations idle for a long time are depressed. Pure
//! computation; the concept actor applies it under its relations lock.

use serde::{Deserialize, Serialize};

use noema_runtime::config::GraphConfig;

/// Weights never fall below this floor; a relation that exists always
/// conducts a little.
pub const MIN_WEIGHT: f64 = 0.1;

pub const MAX_WEIGHT: f64 = 1.0;

/// Plasticity tuning parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlasticityConfig {
    /// Relations used within this many seconds are potentiated.
    pub recent_window_secs: i64,
    /// Relations idle beyond this many seconds are depressed.
    pub stale_window_secs: i64,
    /// Multiplicative gain for recent relations.
    pub potentiation: f64,
    /// Multiplicative loss for stale relations.
    pub depression: f64,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            recent_window_secs: 3_600,
            stale_window_secs: 86_400,
            potentiation: 1.05,
            depression: 0.95,
        }
    }
}

impl From<&GraphConfig> for PlasticityConfig {
    fn from(config: &GraphConfig) -> Self {
        Self {
            recent_window_secs: config.recent_window_secs,
            stale_window_secs: config.stale_window_secs,
            potentiation: config.potentiation,
            depression: config.depression,
        }
    }
}

/// Clamp a proposed weight into the legal band.
///
/// # Example
/// ```
/// use noema_graph::plasticity::{clamp_weight, MIN_WEIGHT, MAX_WEIGHT};
///
/// assert_eq!(clamp_weight(1.7), MAX_WEIGHT);
/// assert_eq!(clamp_weight(0.0), MIN_WEIGHT);
/// assert_eq!(clamp_weight(0.5), 0.5);
/// ```
#[inline]
pub fn clamp_weight(weight: f64) -> f64 {
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// Compute the adjusted weight for a relation idle for `idle_secs`.
///
/// Recently used relations grow, stale ones shrink, and relations in the
/// middle band keep their weight.
///
/// # Arguments
/// * `weight` - Current relation weight
/// * `idle_secs` - Seconds since the relation last carried activation
/// * `config` - Plasticity windows and factors
///
/// # Returns
/// The new weight, always inside [[`MIN_WEIGHT`], [`MAX_WEIGHT`]].
///
/// # Example
/// ```
/// use noema_graph::plasticity::{adjust_weight, PlasticityConfig};
///
/// let config = PlasticityConfig::default();
///
/// // Used a minute ago: potentiated
/// let grown = adjust_weight(0.5, 60, &config);
/// assert!(grown > 0.5);
///
/// // Idle for days: depressed
/// let shrunk = adjust_weight(0.5, 200_000, &config);
/// assert!(shrunk < 0.5);
///
/// // The middle band holds steady
/// assert_eq!(adjust_weight(0.5, 7_200, &config), 0.5);
/// ```
#[inline]
pub fn adjust_weight(weight: f64, idle_secs: i64, config: &PlasticityConfig) -> f64 {
    if idle_secs < config.recent_window_secs {
        (weight * config.potentiation).min(MAX_WEIGHT)
    } else if idle_secs > config.stale_window_secs {
        (weight * config.depression).max(MIN_WEIGHT)
    } else {
        weight
    }
}
