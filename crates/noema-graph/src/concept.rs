/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Concept actor state
//!
//! One concept per distinct term. Numeric state lives in `SeqCst` atomics
//! so stats snapshots never block a handler; the relations list sits under
//! a per-concept mutex. Handlers are serialized by the runtime's busy lock,
//! which is what makes plain load/store updates sufficient here.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Weak;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use noema_runtime::{ActorState, Message, Payload};
use noema_types::{AtomicF64, ConceptId, NoemaError, RelationKind};

use crate::dynamics;
use crate::knowledge::KnowledgeShared;
use crate::lifecycle;
use crate::plasticity;

/// Wall-clock seconds. All concept timestamps share this clock.
pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Weighted typed edge to another concept.
///
/// Identity within one concept's relation list is `(target, kind)`;
/// re-adding the same pair upgrades the weight instead of duplicating.
#[derive(Debug, Clone)]
pub struct Relation {
    pub target: ConceptId,
    pub kind: RelationKind,
    pub weight: f64,
    pub last_accessed: i64,
}

/// Eventually consistent snapshot of a concept's numeric state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConceptStats {
    pub activation: f64,
    pub energy: f64,
    pub stability: f64,
    pub complexity: f64,
    pub relations_count: usize,
}

/// Actor state for one concept.
pub struct Concept {
    id: ConceptId,
    term: String,
    birth_time: i64,
    activation: AtomicF64,
    energy: AtomicF64,
    stability: AtomicF64,
    complexity: AtomicF64,
    last_activation: AtomicI64,
    access_count: AtomicU64,
    relations: Mutex<Vec<Relation>>,
    /// Non-owning back-reference to the facade; a concept never outlives
    /// the network, but a `Weak` makes that explicit instead of trusted.
    network: Weak<KnowledgeShared>,
}

impl Concept {
    pub(crate) fn new(id: ConceptId, term: String, network: Weak<KnowledgeShared>) -> Self {
        Self::new_at(id, term, network, now_secs())
    }

    /// Construct with an explicit birth time. Lifecycle tests use this to
    /// age a concept without waiting a day.
    pub(crate) fn new_at(
        id: ConceptId,
        term: String,
        network: Weak<KnowledgeShared>,
        birth_time: i64,
    ) -> Self {
        Self {
            id,
            term,
            birth_time,
            activation: AtomicF64::new(0.0),
            energy: AtomicF64::new(dynamics::INITIAL_ENERGY),
            stability: AtomicF64::new(0.0),
            complexity: AtomicF64::new(0.0),
            last_activation: AtomicI64::new(birth_time),
            access_count: AtomicU64::new(0),
            relations: Mutex::new(Vec::new()),
            network,
        }
    }

    pub fn id(&self) -> ConceptId {
        self.id
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn stats(&self) -> ConceptStats {
        ConceptStats {
            activation: self.activation.load(),
            energy: self.energy.load(),
            stability: self.stability.load(),
            complexity: self.complexity.load(),
            relations_count: self.relations.lock().len(),
        }
    }

    /// Overwrite vitals to a chosen point in time (lifecycle tests only).
    #[cfg(test)]
    pub(crate) fn force_vitals(&self, energy: f64, stability: f64, last_activation: i64) {
        self.energy.store(energy);
        self.stability.store(stability);
        self.last_activation.store(last_activation, Ordering::SeqCst);
    }

    fn touch(&self, now: i64) {
        self.last_activation.store(now, Ordering::SeqCst);
        self.access_count.fetch_add(1, Ordering::SeqCst);
    }

    fn refresh_stability(&self, now: i64) {
        let age = now - self.birth_time;
        let accesses = self.access_count.load(Ordering::SeqCst);
        self.stability.store(dynamics::stability(accesses, age));
    }

    fn refresh_complexity(&self, relations: &[Relation]) {
        self.complexity
            .store(dynamics::complexity(relations.iter().map(|r| r.weight)));
    }

    /// Direct activation of this concept's term.
    fn on_activate(&self) {
        let now = now_secs();
        let activation = dynamics::reinforce(self.activation.load());
        self.activation.store(activation);
        self.touch(now);
        self.energy.store(dynamics::boost_energy(self.energy.load()));
        self.refresh_stability(now);

        if dynamics::should_propagate(activation) {
            self.on_propagate();
        }
    }

    /// Spread a fraction of the current activation to every neighbor, then
    /// pay the propagation cost.
    fn on_propagate(&self) {
        let activation = self.activation.load();
        if activation < dynamics::MIN_ACTIVATION {
            return;
        }
        let Some(network) = self.network.upgrade() else {
            return;
        };

        let now = now_secs();
        {
            let mut relations = self.relations.lock();
            for relation in relations.iter_mut() {
                let strength = dynamics::propagation_strength(activation, relation.weight);
                if strength > dynamics::MIN_ACTIVATION {
                    network.send_strength(self.id, relation.target, strength);
                }
                relation.last_accessed = now;
            }
        }

        self.activation.store(activation * dynamics::ACTIVATION_DECAY);
    }

    /// Receive propagated activation. Never chains into another
    /// propagation; that is what keeps cyclic graphs from flooding
    /// themselves.
    pub(crate) fn apply_strength(&self, strength: f64) {
        let now = now_secs();
        self.activation
            .store(dynamics::receive_strength(self.activation.load(), strength));
        self.touch(now);
        self.refresh_stability(now);
    }

    /// Upsert a relation; `(target, kind)` is the identity.
    pub(crate) fn apply_add_relation(&self, target: ConceptId, kind: RelationKind, weight: f64) {
        let now = now_secs();
        let weight = plasticity::clamp_weight(weight);
        let mut relations = self.relations.lock();
        match relations
            .iter_mut()
            .find(|r| r.target == target && r.kind == kind)
        {
            Some(existing) => {
                existing.weight = existing.weight.max(weight);
                existing.last_accessed = now;
            }
            None => {
                relations.push(Relation {
                    target,
                    kind,
                    weight,
                    last_accessed: now,
                });
            }
        }
        self.refresh_complexity(&relations);
    }

    /// Adjust every relation weight by recency of use.
    fn on_learn(&self) {
        let config = self
            .network
            .upgrade()
            .map(|n| n.plasticity())
            .unwrap_or_default();
        let now = now_secs();
        let mut relations = self.relations.lock();
        for relation in relations.iter_mut() {
            let idle = now - relation.last_accessed;
            relation.weight = plasticity::adjust_weight(relation.weight, idle, &config);
        }
        self.refresh_complexity(&relations);
    }

    fn on_decay(&self) {
        self.activation
            .store(dynamics::decay_activation(self.activation.load()));
        self.energy.store(dynamics::decay_energy(self.energy.load()));
    }

    fn on_merge_check(&self) {
        let stability = self.stability.load();
        let complexity = self.complexity.load();
        if lifecycle::should_merge(stability, complexity) {
            info!(
                concept = %self.id,
                term = %self.term,
                stability,
                complexity,
                "merge candidate"
            );
        }
    }

    fn on_split_check(&self) {
        let complexity = self.complexity.load();
        let relation_count = self.relations.lock().len();
        if lifecycle::should_split(complexity, relation_count) {
            info!(
                concept = %self.id,
                term = %self.term,
                complexity,
                relation_count,
                "split candidate"
            );
        }
    }

    /// A concept that is old, idle, and exhausted removes itself from the
    /// network by poisoning its own actor.
    fn on_death_check(&self) {
        let now = now_secs();
        let age = now - self.birth_time;
        let idle = now - self.last_activation.load(Ordering::SeqCst);
        let energy = self.energy.load();
        let stability = self.stability.load();

        if lifecycle::should_die(age, idle, energy, stability) {
            if let Some(network) = self.network.upgrade() {
                info!(concept = %self.id, term = %self.term, age, idle, "concept died");
                network.retire_concept(self.id, &self.term);
            }
        }
    }
}

impl ActorState for Concept {
    type Error = NoemaError;

    fn receive(&self, msg: Message<Self>) -> Result<(), NoemaError> {
        match msg.payload {
            Payload::Command(verb) => {
                match verb.as_slice() {
                    b"activate" => self.on_activate(),
                    b"propagate" => self.on_propagate(),
                    b"learn" => self.on_learn(),
                    b"decay" => self.on_decay(),
                    b"merge_check" => self.on_merge_check(),
                    b"split_check" => self.on_split_check(),
                    b"death_check" => self.on_death_check(),
                    other => {
                        warn!(
                            concept = %self.id,
                            command = %String::from_utf8_lossy(other),
                            "unknown command ignored"
                        );
                    }
                }
                Ok(())
            }
            Payload::Task(task) => {
                debug!(concept = %self.id, sender = %msg.sender, "task delivered");
                task.invoke(self);
                Ok(())
            }
        }
    }
}
