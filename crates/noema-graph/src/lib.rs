// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Noema Knowledge Graph
//!
//! Concept semantics on top of the actor runtime: spreading activation,
//! recency-based plasticity, decay, lifecycle transitions, and the
//! external-facing knowledge facade.

pub mod concept;
pub mod dynamics;
pub mod ingest;
pub mod knowledge;
pub mod lifecycle;
pub mod plasticity;

pub use concept::{Concept, ConceptStats, Relation};
pub use ingest::IngestStats;
pub use knowledge::{KnowledgeNetwork, NetworkStats};
pub use plasticity::PlasticityConfig;
