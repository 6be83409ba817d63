/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Actor shell: user state plus runtime bookkeeping
//!
//! The shell owns a bounded FIFO mailbox and a busy lock that serializes
//! message handling. Workers take the busy lock with `try_lock` only, so a
//! contended actor is simply skipped; the holder re-checks the mailbox
//! before letting go of the actor (see the engine's worker loop).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};

use noema_types::{ActorId, NoemaError, Result};

use crate::message::Message;

/// Minimum mailbox capacity. Configured capacities below this are raised.
pub const MIN_MAILBOX_CAPACITY: usize = 64;

/// Runtime container for one actor.
pub struct Actor<S> {
    id: ActorId,
    state: S,
    mailbox: Mutex<VecDeque<Message<S>>>,
    capacity: usize,
    busy: Mutex<()>,
    poisoned: AtomicBool,
}

impl<S> Actor<S> {
    pub(crate) fn new(id: ActorId, state: S, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_MAILBOX_CAPACITY);
        Self {
            id,
            state,
            mailbox: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            busy: Mutex::new(()),
            poisoned: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    /// Number of queued messages.
    pub fn pending(&self) -> usize {
        self.mailbox.lock().len()
    }

    /// True while a worker is inside this actor's handler.
    pub(crate) fn is_busy(&self) -> bool {
        self.busy.is_locked()
    }

    pub(crate) fn try_busy(&self) -> Option<MutexGuard<'_, ()>> {
        self.busy.try_lock()
    }

    /// Enqueue a message. Fails if the actor is poisoned or the bounded
    /// mailbox is at capacity; the caller decides whether that is fatal.
    pub(crate) fn enqueue(&self, msg: Message<S>) -> Result<()> {
        if self.is_poisoned() {
            return Err(NoemaError::ActorGone(self.id));
        }
        let mut mailbox = self.mailbox.lock();
        if mailbox.len() >= self.capacity {
            return Err(NoemaError::MailboxFull(self.id));
        }
        mailbox.push_back(msg);
        Ok(())
    }

    pub(crate) fn dequeue(&self) -> Option<Message<S>> {
        self.mailbox.lock().pop_front()
    }

    /// Mark the actor poisoned and discard everything still queued.
    /// Returns the number of messages dropped so the engine can settle its
    /// in-flight accounting. Payloads are released by `Drop`.
    pub(crate) fn poison(&self) -> usize {
        self.poisoned.store(true, Ordering::SeqCst);
        self.drain()
    }

    /// Discard all queued messages (poisoned actors only; an enqueue that
    /// raced the poison flag can leave a straggler behind).
    pub(crate) fn drain(&self) -> usize {
        let mut mailbox = self.mailbox.lock();
        let dropped = mailbox.len();
        mailbox.clear();
        dropped
    }
}
