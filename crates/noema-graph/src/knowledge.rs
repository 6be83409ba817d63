/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Knowledge Facade
//!
//! External-facing layer translating terms and concept ids into actor
//! operations. Owns the engine and the two registries:
//!
//! - `concepts`: concept id -> actor id
//! - `terms`: term hash -> concept id
//!
//! Both registries are populated before `create_concept` returns, so a
//! concept is addressable the moment its id is visible. Unknown ids on the
//! send paths are silent no-ops; only lookups report absence.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use ahash::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use tracing::{debug, info, warn};

use noema_runtime::{Engine, Message, NoemaConfig, ShardedMap};
use noema_types::{ActorId, ConceptId, RelationKind};

use crate::concept::{now_secs, Concept, ConceptStats};
use crate::plasticity::PlasticityConfig;

/// Aggregate counters for the whole network.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct NetworkStats {
    pub concepts: usize,
    pub actors: usize,
    pub messages_processed: u64,
}

/// Facade internals shared with concept actors through a `Weak`.
pub(crate) struct KnowledgeShared {
    engine: Engine<Concept>,
    concepts: ShardedMap<u64>,
    terms: ShardedMap<u64>,
    next_concept_id: AtomicU64,
    last_maintenance: AtomicI64,
    hasher: RandomState,
    plasticity: PlasticityConfig,
    maintenance_interval_secs: i64,
}

impl KnowledgeShared {
    pub(crate) fn plasticity(&self) -> PlasticityConfig {
        self.plasticity
    }

    fn hash_term(&self, term: &str) -> u64 {
        // Fixed-seed ahash: stable within a process, which is all the term
        // registry needs. A collision silently aliases two terms onto one
        // concept; accepted for realistic corpus sizes.
        let mut hasher = self.hasher.build_hasher();
        term.hash(&mut hasher);
        hasher.finish()
    }

    fn actor_of(&self, id: ConceptId) -> Option<ActorId> {
        self.concepts.get(id.0).map(ActorId)
    }

    /// Best-effort command delivery; unknown or poisoned targets are
    /// dropped silently.
    pub(crate) fn send_command(&self, id: ConceptId, verb: &[u8]) {
        let Some(actor) = self.actor_of(id) else {
            debug!(concept = %id, "command to unknown concept dropped");
            return;
        };
        if let Err(err) = self
            .engine
            .send(actor, Message::command(ActorId::EXTERNAL, verb))
        {
            debug!(concept = %id, %err, "command not delivered");
        }
    }

    /// Deliver propagated activation from one concept to another.
    pub(crate) fn send_strength(&self, from: ConceptId, to: ConceptId, strength: f64) {
        let Some(target) = self.actor_of(to) else {
            return;
        };
        let sender = self.actor_of(from).unwrap_or(ActorId::EXTERNAL);
        let msg = Message::task(sender, move |concept: &Concept| {
            concept.apply_strength(strength);
        });
        if let Err(err) = self.engine.send(target, msg) {
            debug!(from = %from, to = %to, %err, "propagation not delivered");
        }
    }

    /// Remove a dead concept from both registries and poison its actor.
    /// Called by the concept itself from inside its death-check handler.
    pub(crate) fn retire_concept(&self, id: ConceptId, term: &str) {
        self.terms.remove(self.hash_term(term));
        if let Some(actor) = self.concepts.remove(id.0).map(ActorId) {
            if let Err(err) = self.engine.poison(actor) {
                warn!(concept = %id, %err, "retire found no live actor");
            }
        }
    }
}

/// Concurrent knowledge graph of concept actors.
pub struct KnowledgeNetwork {
    shared: Arc<KnowledgeShared>,
}

impl KnowledgeNetwork {
    /// Start a network with `workers` worker threads and registry capacity
    /// for roughly `initial_capacity` concepts.
    pub fn init(workers: usize, initial_capacity: usize) -> Self {
        let mut config = NoemaConfig::default();
        config.engine.workers = workers;
        config.engine.initial_capacity = initial_capacity;
        Self::with_config(&config)
    }

    pub fn with_config(config: &NoemaConfig) -> Self {
        let shared = Arc::new(KnowledgeShared {
            engine: Engine::new(&config.engine),
            concepts: ShardedMap::with_shards(
                config.engine.map_shards,
                config.engine.initial_capacity,
            ),
            terms: ShardedMap::with_shards(
                config.engine.map_shards,
                config.engine.initial_capacity,
            ),
            next_concept_id: AtomicU64::new(1),
            last_maintenance: AtomicI64::new(0),
            hasher: RandomState::with_seeds(
                0x243f_6a88_85a3_08d3,
                0x1319_8a2e_0370_7344,
                0xa409_3822_299f_31d0,
                0x082e_fa98_ec4e_6c89,
            ),
            plasticity: PlasticityConfig::from(&config.graph),
            maintenance_interval_secs: config.graph.maintenance_interval_secs,
        });
        info!("knowledge network initialized");
        Self { shared }
    }

    /// Create a concept for `term`, or return the existing id. Idempotent:
    /// racing creators for the same term all resolve to the winner's id.
    pub fn create_concept(&self, term: &str) -> ConceptId {
        let hash = self.shared.hash_term(term);
        if let Some(existing) = self.shared.terms.get(hash) {
            return ConceptId(existing);
        }

        let id = ConceptId(self.shared.next_concept_id.fetch_add(1, Ordering::SeqCst));
        let concept = Concept::new(id, term.to_string(), Arc::downgrade(&self.shared));
        let actor = self.shared.engine.spawn(concept);
        self.shared.concepts.insert(id.0, actor.0);

        match self.shared.terms.insert_if_absent(hash, id.0) {
            Ok(()) => {
                debug!(concept = %id, term, "concept created");
                id
            }
            Err(winner) => {
                // Lost an in-flight race for the same term: discard our
                // actor and defer to the registered concept.
                self.shared.concepts.remove(id.0);
                let _ = self.shared.engine.poison(actor);
                ConceptId(winner)
            }
        }
    }

    /// Send an `"activate"` command to a concept. Unknown ids are no-ops.
    pub fn activate_concept(&self, id: ConceptId) {
        self.shared.send_command(id, b"activate");
    }

    /// Deliver raw activation strength to a concept, as propagation does.
    pub fn send_activation(&self, id: ConceptId, strength: f64) {
        let Some(actor) = self.shared.actor_of(id) else {
            debug!(concept = %id, "activation to unknown concept dropped");
            return;
        };
        let msg = Message::task(ActorId::EXTERNAL, move |concept: &Concept| {
            concept.apply_strength(strength);
        });
        if let Err(err) = self.shared.engine.send(actor, msg) {
            debug!(concept = %id, %err, "activation not delivered");
        }
    }

    /// Ask `source` to upsert a relation towards `target`. Unknown source
    /// ids are no-ops; the target does not need to exist yet.
    pub fn add_relation(
        &self,
        source: ConceptId,
        target: ConceptId,
        kind: RelationKind,
        weight: f64,
    ) {
        let Some(actor) = self.shared.actor_of(source) else {
            debug!(concept = %source, "add_relation to unknown source dropped");
            return;
        };
        let msg = Message::task(ActorId::EXTERNAL, move |concept: &Concept| {
            concept.apply_add_relation(target, kind, weight);
        });
        if let Err(err) = self.shared.engine.send(actor, msg) {
            debug!(concept = %source, %err, "add_relation not delivered");
        }
    }

    /// Pure lookup, no side effects.
    pub fn find_concept(&self, term: &str) -> Option<ConceptId> {
        self.shared
            .terms
            .get(self.shared.hash_term(term))
            .map(ConceptId)
    }

    /// Lookup that also activates the found concept.
    pub fn query(&self, term: &str) -> Option<ConceptId> {
        let id = self.find_concept(term)?;
        self.activate_concept(id);
        Some(id)
    }

    /// Eventually consistent stats snapshot; `None` for unknown or retired
    /// concepts.
    pub fn get_stats(&self, id: ConceptId) -> Option<ConceptStats> {
        let actor = self.shared.actor_of(id)?;
        self.shared.engine.with_state(actor, |concept| concept.stats())
    }

    pub fn concept_count(&self) -> usize {
        self.shared.concepts.len()
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            concepts: self.shared.concepts.len(),
            actors: self.shared.engine.actor_count(),
            messages_processed: self.shared.engine.messages_processed(),
        }
    }

    /// Periodic sweep: at most once per maintenance interval, send every
    /// concept a `"decay"` followed by a `"death_check"`. Sends to actors
    /// that died in between are tolerated.
    pub fn run_maintenance(&self) {
        let now = now_secs();
        let last = self.shared.last_maintenance.load(Ordering::SeqCst);
        if now - last <= self.shared.maintenance_interval_secs {
            return;
        }
        if self
            .shared
            .last_maintenance
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return; // another caller claimed this sweep
        }

        let ids = self.shared.concepts.keys();
        info!(concepts = ids.len(), "maintenance sweep");
        for id in ids {
            self.shared.send_command(ConceptId(id), b"decay");
            self.shared.send_command(ConceptId(id), b"death_check");
        }
    }

    /// Learning sweep: every concept re-weighs its relations by recency
    /// of use. Run this as often or as rarely as the workload warrants;
    /// unlike maintenance it is not rate limited.
    pub fn run_learning(&self) {
        for id in self.shared.concepts.keys() {
            self.shared.send_command(ConceptId(id), b"learn");
        }
    }

    /// Advisory audit sweep: every concept evaluates its merge and split
    /// criteria and reports candidates through diagnostics.
    pub fn run_audit(&self) {
        for id in self.shared.concepts.keys() {
            self.shared.send_command(ConceptId(id), b"merge_check");
            self.shared.send_command(ConceptId(id), b"split_check");
        }
    }

    /// Block until every queued message in the engine has been handled.
    pub fn wait_all(&self) {
        self.shared.engine.wait_all();
    }

    /// Stop the worker pool. The network refuses no further calls, but
    /// messages sent after shutdown are never delivered.
    pub fn shutdown(&self) {
        self.shared.engine.shutdown();
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Arc<KnowledgeShared> {
        &self.shared
    }
}

/// Spawn a concept whose birth time and vitals are already in the past.
/// Test helper for lifecycle paths that would otherwise need a day of
/// wall-clock time.
#[cfg(test)]
pub(crate) fn plant_aged_concept(
    network: &KnowledgeNetwork,
    term: &str,
    birth_time: i64,
    energy: f64,
    stability: f64,
    last_activation: i64,
) -> ConceptId {
    let shared = network.shared();
    let id = ConceptId(shared.next_concept_id.fetch_add(1, Ordering::SeqCst));
    let concept = Concept::new_at(id, term.to_string(), Arc::downgrade(shared), birth_time);
    concept.force_vitals(energy, stability, last_activation);
    let actor = shared.engine.spawn(concept);
    shared.concepts.insert(id.0, actor.0);
    shared
        .terms
        .insert_if_absent(shared.hash_term(term), id.0)
        .expect("aged concept term must be fresh");
    id
}
