/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Noema Core Types
//!
//! Shared types for the noema knowledge graph engine.
//!
//! ## Design Philosophy
//! - **Type-safe**: Use strong id newtypes instead of bare integers
//! - **Lock-free reads**: Numeric concept state lives in sequentially
//!   consistent atomics so stats snapshots never take a lock
//! - **One error enum**: Every fallible core operation returns [`NoemaError`]

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Concept ID (external identity, assigned by the knowledge facade)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(pub u64);

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concept({})", self.0)
    }
}

/// Actor handle (runtime identity, assigned by the engine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    /// Sender id used for messages that originate outside any actor
    /// (facade calls, maintenance sweeps, tests).
    pub const EXTERNAL: ActorId = ActorId(0);
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

/// Typed edge category between two concepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Causes,
    IsA,
    PartOf,
    Synonym,
    Antonym,
    AssociatedWith,
    Custom,
}

impl RelationKind {
    /// Stable lowercase name, used in logs and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Causes => "causes",
            RelationKind::IsA => "is_a",
            RelationKind::PartOf => "part_of",
            RelationKind::Synonym => "synonym",
            RelationKind::Antonym => "antonym",
            RelationKind::AssociatedWith => "associated_with",
            RelationKind::Custom => "custom",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for noema operations
#[derive(Debug, thiserror::Error)]
pub enum NoemaError {
    /// The target actor was poisoned or already unregistered.
    #[error("actor gone: {0}")]
    ActorGone(ActorId),

    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// The target actor's bounded mailbox is at capacity. The runtime
    /// never silently drops a message.
    #[error("mailbox full for {0}")]
    MailboxFull(ActorId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NoemaError>;
pub type Error = NoemaError;

/// An `f64` readable and writable from any thread.
///
/// Bit-casts through an [`AtomicU64`]; all accesses are `SeqCst` so that
/// cross-field stats snapshots observe a coherent order of writes. A racing
/// reader sees either the old or the new value, never a torn one.
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::SeqCst);
    }

    /// Compare-and-swap loop applying `f` to the current value.
    ///
    /// Returns the previous value. Only needed when the writer is not the
    /// actor's own handler (handlers are serialized and can load/store).
    pub fn update(&self, f: impl Fn(f64) -> f64) -> f64 {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            let next = f(f64::from_bits(current)).to_bits();
            match self
                .0
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(prev) => return f64::from_bits(prev),
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}
