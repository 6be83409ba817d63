// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine integration: ordering, quiescence, and poisoning behavior under
//! a real worker pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use noema_runtime::{ActorState, Engine, EngineConfig, Message, Payload};
use noema_types::{ActorId, NoemaError};

/// Records the order in which task payloads arrive.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<u64>>,
    commands: AtomicUsize,
}

impl ActorState for Recorder {
    type Error = NoemaError;

    fn receive(&self, msg: Message<Self>) -> Result<(), NoemaError> {
        match msg.payload {
            Payload::Command(_) => {
                self.commands.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Payload::Task(task) => {
                task.invoke(self);
                Ok(())
            }
        }
    }
}

fn record(n: u64) -> Message<Recorder> {
    Message::task(ActorId::EXTERNAL, move |state: &Recorder| {
        state.seen.lock().push(n);
    })
}

#[test]
fn test_per_actor_order_is_fifo() {
    let engine: Engine<Recorder> = Engine::new(&EngineConfig::default());
    let id = engine.spawn(Recorder::default());

    // Mailbox capacity bounds how much can be queued ahead of the
    // drain, so feed the actor in bursts.
    let mut expected = Vec::new();
    for burst in 0..5u64 {
        for n in 0..50u64 {
            let seq = burst * 50 + n;
            engine.send(id, record(seq)).unwrap();
            expected.push(seq);
        }
        engine.wait_for_actor(id);
    }

    let seen = engine.with_state(id, |s| s.seen.lock().clone()).unwrap();
    assert_eq!(seen, expected);
    engine.shutdown();
}

#[test]
fn test_senders_interleave_but_never_reorder() {
    let engine: Arc<Engine<Recorder>> = Arc::new(Engine::new(&EngineConfig::default()));
    let id = engine.spawn(Recorder::default());

    let mut producers = Vec::new();
    for p in 0..4u64 {
        let engine = Arc::clone(&engine);
        producers.push(std::thread::spawn(move || {
            for n in 0..10u64 {
                // Encode producer in the high digits, sequence in the low.
                while engine.send(id, record(p * 100 + n)).is_err() {
                    std::thread::yield_now(); // mailbox briefly full
                }
            }
        }));
    }
    for producer in producers {
        producer.join().unwrap();
    }
    engine.wait_all();

    let seen = engine.with_state(id, |s| s.seen.lock().clone()).unwrap();
    assert_eq!(seen.len(), 40);
    // Each producer's own sequence must appear in order.
    for p in 0..4u64 {
        let stream: Vec<_> = seen.iter().filter(|v| **v / 100 == p).copied().collect();
        let expected: Vec<_> = (0..10u64).map(|n| p * 100 + n).collect();
        assert_eq!(stream, expected);
    }
    engine.shutdown();
}

#[test]
fn test_wait_all_means_quiescent() {
    let engine: Engine<Recorder> = Engine::new(&EngineConfig::default());
    let ids: Vec<_> = (0..8).map(|_| engine.spawn(Recorder::default())).collect();

    let mut sent = 0;
    for &id in &ids {
        for _ in 0..30 {
            engine
                .send(id, Message::command(ActorId::EXTERNAL, b"tick"))
                .unwrap();
            sent += 1;
        }
    }
    engine.wait_all();

    assert_eq!(engine.messages_processed(), sent);
    engine.shutdown();
}

#[test]
fn test_send_after_poison_reports_gone() {
    let engine: Engine<Recorder> = Engine::new(&EngineConfig::default());
    let id = engine.spawn(Recorder::default());

    engine.poison(id).unwrap();
    engine.wait_for_actor(id);

    let err = engine.send(id, record(1)).unwrap_err();
    assert!(matches!(err, NoemaError::ActorGone(_)));
    assert_eq!(engine.actor_count(), 0);
    engine.shutdown();
}

#[test]
fn test_shutdown_is_idempotent() {
    let engine: Engine<Recorder> = Engine::new(&EngineConfig::default());
    let id = engine.spawn(Recorder::default());
    engine.send(id, record(1)).unwrap();
    engine.wait_all();

    engine.shutdown();
    engine.shutdown();
}
