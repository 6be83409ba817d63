// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Noema Actor Runtime
//!
//! Mailbox-per-actor runtime underneath the knowledge graph.
//!
//! ## Architecture
//! - One bounded FIFO mailbox and one busy lock per actor
//! - A fixed pool of worker threads consuming a shared ready channel
//! - Parallel across actors, serialized within an actor
//! - Poisoning as the only cancellation mechanism

pub mod actor;
pub mod config;
pub mod engine;
pub mod message;
pub mod shard_map;

pub use actor::Actor;
pub use config::{EngineConfig, GraphConfig, NoemaConfig};
pub use engine::{ActorState, Engine};
pub use message::{Message, Payload, Task};
pub use shard_map::ShardedMap;
