/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Actor Engine
//!
//! Fixed worker pool draining a shared ready channel of actor handles.
//! Scheduling is parallel across actors and strictly serialized within an
//! actor: a worker claims an actor with a `try_lock` on its busy mutex and
//! handles exactly one message per claim.
//!
//! ## Design
//! - Workers run in dedicated named threads (no async runtime)
//! - Ready handles are hints: a spurious handle is a cheap no-op, a missing
//!   one is impossible because whoever holds the busy lock re-checks the
//!   mailbox before releasing the actor
//! - Poisoning is the only cancellation: queued messages are discarded,
//!   the in-flight message runs to completion

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info};

use noema_types::{ActorId, NoemaError, Result};

use crate::actor::Actor;
use crate::config::EngineConfig;
use crate::message::Message;
use crate::shard_map::ShardedMap;

/// Poll interval for workers checking the shutdown flag and for idle
/// waiters re-checking their condition.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const IDLE_RECHECK: Duration = Duration::from_millis(10);

/// State hosted inside an actor.
///
/// `receive` is called by exactly one worker at a time (the busy lock is
/// held), so implementations may load/store their own atomics without
/// read-modify-write loops. An `Err` is logged by the worker and swallowed;
/// the actor keeps processing subsequent messages.
pub trait ActorState: Send + Sync + Sized + 'static {
    type Error: std::fmt::Display;

    fn receive(&self, msg: Message<Self>) -> std::result::Result<(), Self::Error>;
}

struct EngineShared<S: ActorState> {
    actors: ShardedMap<Arc<Actor<S>>>,
    ready_tx: Sender<ActorId>,
    ready_rx: Receiver<ActorId>,
    running: AtomicBool,
    next_actor_id: AtomicU64,
    /// Messages enqueued but not yet fully handled. Incremented before a
    /// successful enqueue, decremented only after the handler returns and
    /// the actor has been re-scheduled or retired, so `wait_all` observing
    /// zero means the system is truly quiescent.
    in_flight: AtomicUsize,
    /// Total messages handled since engine start (delivered, not discarded).
    messages_processed: AtomicU64,
    mailbox_capacity: usize,
    idle_lock: Mutex<()>,
    idle_cv: Condvar,
}

impl<S: ActorState> EngineShared<S> {
    fn notify_idle(&self) {
        let _guard = self.idle_lock.lock();
        self.idle_cv.notify_all();
    }

    /// Settle accounting for messages discarded by a poison drain.
    fn discard(&self, dropped: usize) {
        if dropped > 0 {
            self.in_flight.fetch_sub(dropped, Ordering::SeqCst);
            self.notify_idle();
        }
    }

    /// Remove a poisoned actor from the table once no handler runs on it.
    /// Callers must hold (or have just held) the busy lock.
    fn retire(&self, actor: &Arc<Actor<S>>) {
        let dropped = actor.drain();
        self.discard(dropped);
        if self.actors.remove(actor.id().0).is_some() {
            debug!(actor = %actor.id(), "actor retired");
        }
        self.notify_idle();
    }
}

/// Concurrent actor runtime.
pub struct Engine<S: ActorState> {
    shared: Arc<EngineShared<S>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: ActorState> Engine<S> {
    /// Start an engine with `config.workers` worker threads.
    pub fn new(config: &EngineConfig) -> Self {
        let (ready_tx, ready_rx) = channel::unbounded();
        let shared = Arc::new(EngineShared {
            actors: ShardedMap::with_shards(config.map_shards, config.initial_capacity),
            ready_tx,
            ready_rx,
            running: AtomicBool::new(true),
            next_actor_id: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
            mailbox_capacity: config.mailbox_capacity,
            idle_lock: Mutex::new(()),
            idle_cv: Condvar::new(),
        });

        let workers = (0..config.workers.max(1))
            .map(|n| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("noema-worker-{}", n))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn engine worker thread")
            })
            .collect();

        info!(workers = config.workers.max(1), "engine started");
        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Register a new actor around fully constructed state. No message is
    /// sent as part of spawn.
    pub fn spawn(&self, state: S) -> ActorId {
        let id = ActorId(self.shared.next_actor_id.fetch_add(1, Ordering::SeqCst));
        let actor = Arc::new(Actor::new(id, state, self.shared.mailbox_capacity));
        self.shared.actors.insert(id.0, actor);
        debug!(actor = %id, "actor spawned");
        id
    }

    /// Deliver a message to an actor's mailbox and mark it ready.
    pub fn send(&self, id: ActorId, msg: Message<S>) -> Result<()> {
        let actor = self
            .shared
            .actors
            .get(id.0)
            .ok_or(NoemaError::ActorGone(id))?;

        // Claim the in-flight slot before the message becomes visible to
        // workers; otherwise a fast worker could finish the message and
        // drive the counter below zero.
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = actor.enqueue(msg) {
            self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(err);
        }
        if actor.is_poisoned() {
            // Poison raced the enqueue: its drain may have run before our
            // push, and nothing else would ever empty this mailbox. The
            // flag is set before any drain, so one of the two drains is
            // guaranteed to see the message.
            let dropped = actor.drain();
            self.shared.discard(dropped);
            return Err(NoemaError::ActorGone(id));
        }
        let _ = self.shared.ready_tx.send(id);
        Ok(())
    }

    /// Read-only access to an actor's state. Returns `None` for unknown or
    /// poisoned actors. The closure runs without the busy lock, so reads
    /// of atomic fields are eventually consistent with in-flight handlers.
    pub fn with_state<R>(&self, id: ActorId, f: impl FnOnce(&S) -> R) -> Option<R> {
        let actor = self.shared.actors.get(id.0)?;
        if actor.is_poisoned() {
            return None;
        }
        Some(f(actor.state()))
    }

    /// Mark an actor for termination. Queued messages are discarded; an
    /// in-flight handler runs to completion, after which the actor is
    /// unregistered. Safe to call from inside the actor's own handler.
    pub fn poison(&self, id: ActorId) -> Result<()> {
        let actor = self
            .shared
            .actors
            .get(id.0)
            .ok_or(NoemaError::ActorNotFound(id))?;

        let dropped = actor.poison();
        self.shared.discard(dropped);
        debug!(actor = %id, dropped, "actor poisoned");

        if let Some(_busy) = actor.try_busy() {
            // Nobody is handling it: retire immediately.
            self.shared.retire(&actor);
        } else {
            // A handler is running (possibly the actor poisoning itself);
            // hand the actor to a worker for retirement once it finishes.
            let _ = self.shared.ready_tx.send(id);
        }
        Ok(())
    }

    /// Block until the actor has an empty mailbox and no handler running,
    /// or has been unregistered.
    pub fn wait_for_actor(&self, id: ActorId) {
        let mut guard = self.shared.idle_lock.lock();
        loop {
            match self.shared.actors.get(id.0) {
                None => return,
                Some(actor) => {
                    if actor.pending() == 0 && !actor.is_busy() {
                        return;
                    }
                }
            }
            self.shared
                .idle_cv
                .wait_for(&mut guard, IDLE_RECHECK);
        }
    }

    /// Block until every message in the system has been handled, including
    /// messages produced by handlers while waiting.
    pub fn wait_all(&self) {
        let mut guard = self.shared.idle_lock.lock();
        while self.shared.in_flight.load(Ordering::SeqCst) > 0 {
            self.shared
                .idle_cv
                .wait_for(&mut guard, IDLE_RECHECK);
        }
    }

    pub fn actor_count(&self) -> usize {
        self.shared.actors.len()
    }

    /// Total messages handled by the worker pool since start.
    pub fn messages_processed(&self) -> u64 {
        self.shared.messages_processed.load(Ordering::SeqCst)
    }

    /// Stop the worker pool and join the threads. Idempotent; messages
    /// still queued at shutdown are never delivered.
    pub fn shutdown(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if handle.join().is_err() {
                error!("engine worker panicked during shutdown");
            }
        }
        info!("engine stopped");
    }
}

impl<S: ActorState> Drop for Engine<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker thread body: claim an actor, handle one message, reschedule.
fn worker_loop<S: ActorState>(shared: Arc<EngineShared<S>>) {
    while shared.running.load(Ordering::SeqCst) {
        let id = match shared.ready_rx.recv_timeout(POLL_INTERVAL) {
            Ok(id) => id,
            Err(channel::RecvTimeoutError::Timeout) => continue,
            Err(channel::RecvTimeoutError::Disconnected) => break,
        };

        let Some(actor) = shared.actors.get(id.0) else {
            continue; // already retired; the handle was stale
        };

        let Some(busy) = actor.try_busy() else {
            // Another worker is inside this actor. It re-checks the mailbox
            // before releasing, so this handle is redundant.
            continue;
        };

        if actor.is_poisoned() {
            drop(busy);
            shared.retire(&actor);
            continue;
        }

        let Some(msg) = actor.dequeue() else {
            drop(busy);
            shared.notify_idle();
            continue;
        };

        if let Err(err) = actor.state().receive(msg) {
            error!(actor = %id, %err, "message handler failed");
        }
        shared.messages_processed.fetch_add(1, Ordering::SeqCst);

        drop(busy);

        // The handler may have poisoned its own actor; retire it now that
        // the busy lock is free.
        if actor.is_poisoned() {
            shared.retire(&actor);
        } else if actor.pending() > 0 {
            let _ = shared.ready_tx.send(id);
        }

        shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        shared.notify_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use noema_types::AtomicF64;
    use std::sync::atomic::AtomicUsize;

    /// Minimal actor state: counts commands, accumulates task values.
    #[derive(Default)]
    struct Counter {
        commands: AtomicUsize,
        total: AtomicF64,
    }

    impl ActorState for Counter {
        type Error = NoemaError;

        fn receive(&self, msg: Message<Self>) -> Result<()> {
            match msg.payload {
                crate::message::Payload::Command(verb) => {
                    if verb == b"fail" {
                        return Err(NoemaError::InvalidConfig("forced".into()));
                    }
                    self.commands.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                crate::message::Payload::Task(task) => {
                    task.invoke(self);
                    Ok(())
                }
            }
        }
    }

    fn engine() -> Engine<Counter> {
        Engine::new(&EngineConfig::default())
    }

    #[test]
    fn test_send_and_wait_all() {
        let engine = engine();
        let id = engine.spawn(Counter::default());

        for _ in 0..10 {
            engine
                .send(id, Message::command(ActorId::EXTERNAL, b"tick"))
                .unwrap();
        }
        engine.wait_all();

        let handled = engine
            .with_state(id, |s| s.commands.load(Ordering::SeqCst))
            .unwrap();
        assert_eq!(handled, 10);
        engine.shutdown();
    }

    #[test]
    fn test_task_payload_mutates_state() {
        let engine = engine();
        let id = engine.spawn(Counter::default());

        engine
            .send(
                id,
                Message::task(ActorId::EXTERNAL, |s: &Counter| {
                    s.total.store(s.total.load() + 0.25);
                }),
            )
            .unwrap();
        engine.wait_for_actor(id);

        let total = engine.with_state(id, |s| s.total.load()).unwrap();
        assert_eq!(total, 0.25);
        engine.shutdown();
    }

    #[test]
    fn test_handler_error_is_swallowed() {
        let engine = engine();
        let id = engine.spawn(Counter::default());

        engine
            .send(id, Message::command(ActorId::EXTERNAL, b"fail"))
            .unwrap();
        engine
            .send(id, Message::command(ActorId::EXTERNAL, b"tick"))
            .unwrap();
        engine.wait_all();

        // The failed handler did not stop the actor.
        let handled = engine
            .with_state(id, |s| s.commands.load(Ordering::SeqCst))
            .unwrap();
        assert_eq!(handled, 1);
        engine.shutdown();
    }

    #[test]
    fn test_poisoned_actor_is_unregistered() {
        let engine = engine();
        let id = engine.spawn(Counter::default());

        engine.poison(id).unwrap();
        engine.wait_for_actor(id);

        assert_eq!(engine.actor_count(), 0);
        let err = engine
            .send(id, Message::command(ActorId::EXTERNAL, b"tick"))
            .unwrap_err();
        assert!(matches!(err, NoemaError::ActorGone(_)));
        engine.shutdown();
    }

    #[test]
    fn test_poison_discards_queued_messages() {
        // One worker, and the first message parks the actor long enough
        // for the rest of the queue to pile up behind it.
        let config = EngineConfig {
            workers: 1,
            ..EngineConfig::default()
        };
        let engine: Engine<Counter> = Engine::new(&config);
        let id = engine.spawn(Counter::default());

        engine
            .send(
                id,
                Message::task(ActorId::EXTERNAL, |_: &Counter| {
                    thread::sleep(Duration::from_millis(100));
                }),
            )
            .unwrap();
        for _ in 0..5 {
            engine
                .send(id, Message::command(ActorId::EXTERNAL, b"tick"))
                .unwrap();
        }
        engine.poison(id).unwrap();
        engine.wait_all();

        assert_eq!(engine.actor_count(), 0);
        engine.shutdown();
    }

    #[test]
    fn test_parallel_actors_all_drain() {
        let engine = engine();
        let ids: Vec<_> = (0..16).map(|_| engine.spawn(Counter::default())).collect();

        for &id in &ids {
            for _ in 0..25 {
                engine
                    .send(id, Message::command(ActorId::EXTERNAL, b"tick"))
                    .unwrap();
            }
        }
        engine.wait_all();

        for &id in &ids {
            let handled = engine
                .with_state(id, |s| s.commands.load(Ordering::SeqCst))
                .unwrap();
            assert_eq!(handled, 25);
        }
        engine.shutdown();
    }
}
