//! # Noema - Concurrent Knowledge Graph Engine
//!
//! Noema models knowledge as a graph of autonomous concept actors. Each
//! concept owns numeric state (activation, energy, stability, complexity)
//! and weighted typed relations; all communication happens through
//! asynchronous messages dispatched on a bounded worker pool. Spreading
//! activation, recency-based learning, decay, and lifecycle transitions
//! evolve the graph over time.
//!
//! ## Quick Start
//!
//! ```rust
//! use noema::prelude::*;
//!
//! let net = KnowledgeNetwork::init(4, 500);
//!
//! let sun = net.create_concept("sun");
//! let star = net.create_concept("star");
//! net.add_relation(sun, star, RelationKind::IsA, 0.9);
//!
//! net.activate_concept(sun);
//! net.wait_all();
//!
//! let stats = net.get_stats(sun).unwrap();
//! assert!(stats.activation > 0.0);
//! net.shutdown();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: noema-types                                │
//! │  (ids, RelationKind, errors, AtomicF64)                 │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Runtime: noema-runtime                                 │
//! │  (sharded registries, mailboxes, worker pool)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Semantics: noema-graph                                 │
//! │  (concept actors, dynamics, plasticity, facade)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! Parallel across actors, serialized within an actor: a worker claims an
//! actor with a non-blocking busy lock and handles exactly one message per
//! claim. Per-actor message order is FIFO; across actors there is no
//! global ordering. Poisoning is the only cancellation mechanism.

// Re-export foundation
pub use noema_types as types;

// Re-export runtime
pub use noema_runtime as runtime;

// Re-export graph semantics
pub use noema_graph as graph;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::types::{ActorId, ConceptId, NoemaError, RelationKind, Result};

    pub use crate::runtime::{Engine, Message, NoemaConfig, Payload};

    pub use crate::graph::{ConceptStats, IngestStats, KnowledgeNetwork, NetworkStats};
}
