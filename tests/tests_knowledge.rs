// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of the knowledge facade: concept creation, queries,
//! relations, maintenance, and the numeric invariants the graph promises.

use noema::prelude::*;

#[test]
fn test_query_on_empty_network_returns_none() {
    let net = KnowledgeNetwork::init(4, 500);
    assert_eq!(net.query("nonexistent"), None);
    net.shutdown();
}

#[test]
fn test_create_then_find_roundtrip() {
    let net = KnowledgeNetwork::init(4, 500);
    let id = net.create_concept("book");
    assert_eq!(net.find_concept("book"), Some(id));
    net.shutdown();
}

#[test]
fn test_create_is_idempotent_per_term() {
    let net = KnowledgeNetwork::init(4, 500);
    let a = net.create_concept("x");
    let b = net.create_concept("x");
    assert_eq!(a, b);
    assert_eq!(net.stats().concepts, 1);
    assert_eq!(net.stats().actors, 1);
    net.shutdown();
}

#[test]
fn test_distinct_terms_get_distinct_ids() {
    let net = KnowledgeNetwork::init(4, 500);
    let a = net.create_concept("alpha");
    let b = net.create_concept("beta");
    assert_ne!(a, b);
    assert_eq!(net.concept_count(), 2);
    net.shutdown();
}

#[test]
fn test_relation_upsert_keeps_single_edge_with_max_weight() {
    let net = KnowledgeNetwork::init(4, 500);
    let src = net.create_concept("engine");
    let tgt = net.create_concept("machine");

    net.add_relation(src, tgt, RelationKind::IsA, 0.3);
    net.add_relation(src, tgt, RelationKind::IsA, 0.7);
    net.wait_all();

    let stats = net.get_stats(src).unwrap();
    assert_eq!(stats.relations_count, 1);
    // Complexity is the mean weight; with one relation it equals it.
    assert!((stats.complexity - 0.7).abs() < 1e-9);
    net.shutdown();
}

#[test]
fn test_query_activates_the_found_concept() {
    let net = KnowledgeNetwork::init(4, 500);
    let id = net.create_concept("memory");
    let before = net.get_stats(id).unwrap().activation;

    assert_eq!(net.query("memory"), Some(id));
    net.wait_all();

    let after = net.get_stats(id).unwrap().activation;
    assert!(after >= before - 0.001);
    net.shutdown();
}

#[test]
fn test_maintenance_over_document_keeps_all_concepts() {
    let net = KnowledgeNetwork::init(4, 500);

    // Roughly a kilobyte of text.
    let document = "Neurons carry signals through the brain. \
        Synapses connect neurons into circuits. \
        Circuits form patterns and patterns form memories. \
        Memories fade without rehearsal but strengthen with use. \
        The brain prunes unused connections during sleep. \
        Sleep consolidates important memories into lasting knowledge. \
        Knowledge shapes how new signals are interpreted. \
        Interpretation biases which circuits fire together. \
        Circuits that fire together wire together over time. \
        Time changes every connection in the network. "
        .repeat(2);
    assert!(document.len() >= 1000);

    net.ingest_document(&document);
    net.wait_all();
    let before = net.concept_count();
    assert!(before > 0);

    // Freshly created concepts are far from the death criteria, so a
    // maintenance sweep must not remove anything.
    net.run_maintenance();
    net.wait_all();

    assert_eq!(net.concept_count(), before);
    net.shutdown();
}

#[test]
fn test_maintenance_decay_never_increases_state() {
    let net = KnowledgeNetwork::init(4, 500);
    let id = net.create_concept("fading");
    net.activate_concept(id);
    net.wait_all();
    let before = net.get_stats(id).unwrap();

    net.run_maintenance();
    net.wait_all();

    let after = net.get_stats(id).unwrap();
    assert!(after.activation <= before.activation);
    assert!(after.energy <= before.energy);
    net.shutdown();
}

#[test]
fn test_numeric_invariants_hold_under_churn() {
    let net = KnowledgeNetwork::init(4, 500);
    net.ingest_document("storms bring rain and rain feeds rivers");
    net.wait_all();

    let rain = net.find_concept("rain").unwrap();
    for _ in 0..40 {
        net.activate_concept(rain);
    }
    net.send_activation(rain, 1.5);
    net.run_maintenance();
    net.wait_all();

    for term in ["storms", "bring", "rain", "feeds", "rivers"] {
        let id = net.find_concept(term).unwrap();
        let stats = net.get_stats(id).unwrap();
        // Reinforcement may overshoot 2.0 by one unclamped boost at most.
        assert!(stats.activation >= 0.0 && stats.activation <= 2.1, "{term}");
        assert!(stats.energy >= 0.0 && stats.energy <= 2.0, "{term}");
        assert!(stats.stability >= 0.0 && stats.stability <= 1.0, "{term}");
        assert!(stats.complexity >= 0.0 && stats.complexity <= 1.0, "{term}");
    }
    net.shutdown();
}

#[test]
fn test_stats_snapshot_fields() {
    let net = KnowledgeNetwork::init(2, 64);
    let id = net.create_concept("snapshot");
    net.wait_all();

    let stats = net.get_stats(id).unwrap();
    assert_eq!(stats.activation, 0.0);
    assert!(stats.energy > 0.0);
    assert_eq!(stats.relations_count, 0);

    assert_eq!(net.get_stats(ConceptId(99_999)), None);
    net.shutdown();
}
