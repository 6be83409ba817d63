/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Message and payload types carried through actor mailboxes
//!
//! Two payload shapes cover everything the engine delivers:
//!
//! - [`Payload::Command`] - a short ASCII verb (`"activate"`, `"decay"`,
//!   ...) compared by byte equality in the receiving actor.
//! - [`Payload::Task`] - a typed callable for operations whose parameters
//!   do not fit a fixed verb (activation strength, relation upserts).
//!
//! A [`Task`] owns its captured context behind an `Arc`, which is what
//! gives the clone/destroy discipline the runtime needs: cloning a payload
//! for fan-out produces an independently droppable handle, the context is
//! released exactly once when the last handle drops, and the worker that
//! dequeues a message invokes it at most once while the target actor's
//! busy lock is held.

use std::fmt;
use std::sync::Arc;

use noema_types::ActorId;

/// A unit of work addressed to one actor.
pub struct Message<S> {
    /// Actor that produced the message, [`ActorId::EXTERNAL`] when it
    /// originated outside the runtime (facade calls, maintenance).
    pub sender: ActorId,
    pub payload: Payload<S>,
}

impl<S> Message<S> {
    /// Build a command message from an ASCII verb.
    pub fn command(sender: ActorId, verb: &[u8]) -> Self {
        Self {
            sender,
            payload: Payload::Command(verb.to_vec()),
        }
    }

    /// Build a task message from a callable over the actor state.
    pub fn task(sender: ActorId, f: impl Fn(&S) + Send + Sync + 'static) -> Self {
        Self {
            sender,
            payload: Payload::Task(Task::new(f)),
        }
    }
}

impl<S> Clone for Message<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender,
            payload: self.payload.clone(),
        }
    }
}

impl<S> fmt::Debug for Message<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("sender", &self.sender)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Message content.
pub enum Payload<S> {
    /// Short owned byte-string verb, compared by equality.
    Command(Vec<u8>),
    /// Callable with captured context, invoked against the actor state.
    Task(Task<S>),
}

impl<S> Clone for Payload<S> {
    fn clone(&self) -> Self {
        match self {
            Payload::Command(verb) => Payload::Command(verb.clone()),
            Payload::Task(task) => Payload::Task(task.clone()),
        }
    }
}

impl<S> fmt::Debug for Payload<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Command(verb) => {
                write!(f, "Command({})", String::from_utf8_lossy(verb))
            }
            Payload::Task(_) => write!(f, "Task(..)"),
        }
    }
}

/// Owned callable delivered to an actor.
pub struct Task<S> {
    run: Arc<dyn Fn(&S) + Send + Sync>,
}

impl<S> Task<S> {
    pub fn new(f: impl Fn(&S) + Send + Sync + 'static) -> Self {
        Self { run: Arc::new(f) }
    }

    /// Run the task against the actor state. The engine calls this at most
    /// once per delivered message.
    #[inline]
    pub fn invoke(&self, state: &S) {
        (self.run)(state)
    }
}

impl<S> Clone for Task<S> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}
