// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Document ingestion front-end
//!
//! Turns raw text into concepts and co-occurrence relations. Strictly a
//! consumer of the facade's public operations (`create_concept`,
//! `activate_concept`, `add_relation`); it never reaches into actor state.
//! Linguistic sophistication is explicitly not a goal here.

use serde::{Deserialize, Serialize};

use noema_types::RelationKind;

use crate::knowledge::KnowledgeNetwork;

/// Tokens within this many positions of each other in a sentence are
/// considered associated.
pub const CO_OCCURRENCE_WINDOW: usize = 4;

/// Words shorter than this carry too little meaning to become concepts.
pub const MIN_TOKEN_LEN: usize = 3;

/// Base weight for adjacent tokens; falls off with distance.
const ADJACENT_WEIGHT: f64 = 0.6;

/// Summary of one ingested document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub sentences: usize,
    pub tokens: usize,
    pub relations: usize,
}

/// Lowercase alphanumeric tokens of a sentence, short words dropped.
fn tokenize(sentence: &str) -> Vec<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .map(|word| word.to_lowercase())
        .collect()
}

/// Weight assigned to a co-occurrence `distance` positions apart.
fn co_occurrence_weight(distance: usize) -> f64 {
    ADJACENT_WEIGHT / distance.max(1) as f64
}

impl KnowledgeNetwork {
    /// Ingest a document: every token becomes (or reinforces) a concept,
    /// and tokens co-occurring within [`CO_OCCURRENCE_WINDOW`] positions of
    /// the same sentence are linked with distance-scaled
    /// [`RelationKind::AssociatedWith`] relations.
    pub fn ingest_document(&self, text: &str) -> IngestStats {
        let mut stats = IngestStats::default();

        for sentence in text.split(['.', '!', '?']) {
            let tokens = tokenize(sentence);
            if tokens.is_empty() {
                continue;
            }
            stats.sentences += 1;
            stats.tokens += tokens.len();

            let ids: Vec<_> = tokens
                .iter()
                .map(|token| {
                    let id = self.create_concept(token);
                    self.activate_concept(id);
                    id
                })
                .collect();

            for (pos, &source) in ids.iter().enumerate() {
                for distance in 1..=CO_OCCURRENCE_WINDOW {
                    let Some(&target) = ids.get(pos + distance) else {
                        break;
                    };
                    if target == source {
                        continue; // repeated word in the same window
                    }
                    let weight = co_occurrence_weight(distance);
                    self.add_relation(source, target, RelationKind::AssociatedWith, weight);
                    stats.relations += 1;
                }
            }
        }

        stats
    }
}
