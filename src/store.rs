//! Event-sourced runtime persisting a decider's events as an append-only
//! stream.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::decider::{Decider, fold};
use crate::error::{ExecuteError, StateError, StoreError};

/// The events of one stream together with the version they were read at.
///
/// `version` counts the events appended so far, so a stream loaded at
/// version `n` holds `n` events and the next append is expected at `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventStream<E> {
    /// Events in append order, oldest first.
    pub events: Vec<E>,
    /// Number of events appended to the stream when it was read.
    pub version: u64,
}

impl<E> EventStream<E> {
    /// The stream of a key that has never been appended to.
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            version: 0,
        }
    }
}

/// Version precondition for an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Append regardless of the stream's current version.
    Any,
    /// The stream must not have been appended to yet.
    NoStream,
    /// The stream must currently hold exactly this many events.
    Exact(u64),
}

/// Append-only storage of event streams keyed by stream id.
///
/// # Contract
///
/// `append_to_stream` is atomic: either all of `events` land at the end of
/// the stream, or none do. The version precondition is checked under the
/// same atomic step, so of several writers appending at the same expected
/// version, exactly one succeeds.
#[async_trait]
pub trait EventStore<E>: Send + Sync {
    /// Read the full stream for `key`. A key that has never been appended
    /// to yields an empty stream at version 0.
    async fn load_stream(&self, key: &str) -> Result<EventStream<E>, StoreError>;

    /// Append `events` to the end of `key`'s stream if its current version
    /// satisfies `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the version precondition
    /// fails, and [`StoreError::Backend`] for faults in the storage itself.
    async fn append_to_stream(
        &self,
        key: &str,
        events: Vec<E>,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;
}

/// Process-local [`EventStore`] backed by a concurrent map.
///
/// Each stream's version check and append happen under the stream's map
/// entry, which serializes concurrent appends per key. Streams are never
/// emptied, so a zero-length stream is equivalent to an absent one.
pub struct InMemoryEventStore<E> {
    streams: Arc<DashMap<String, Vec<E>>>,
}

impl<E> InMemoryEventStore<E> {
    pub fn new() -> Self {
        Self {
            streams: Arc::new(DashMap::new()),
        }
    }
}

impl<E> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for InMemoryEventStore<E> {
    fn clone(&self) -> Self {
        Self {
            streams: Arc::clone(&self.streams),
        }
    }
}

#[async_trait]
impl<E> EventStore<E> for InMemoryEventStore<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn load_stream(&self, key: &str) -> Result<EventStream<E>, StoreError> {
        Ok(match self.streams.get(key) {
            Some(entry) => EventStream {
                events: entry.value().clone(),
                version: entry.value().len() as u64,
            },
            None => EventStream::empty(),
        })
    }

    async fn append_to_stream(
        &self,
        key: &str,
        events: Vec<E>,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut stream = self.streams.entry(key.to_owned()).or_default();
        let actual = stream.len() as u64;
        let satisfied = match expected {
            ExpectedVersion::Any => true,
            ExpectedVersion::NoStream => actual == 0,
            ExpectedVersion::Exact(version) => actual == version,
        };
        if !satisfied {
            tracing::warn!(
                key = %key,
                ?expected,
                actual,
                "append lost to a concurrent write"
            );
            return Err(StoreError::Conflict {
                key: key.to_owned(),
            });
        }
        stream.extend(events);
        Ok(())
    }
}

/// Runs a decider against an event stream kept in an [`EventStore`].
///
/// Each `execute` loads the stream, folds it from the initial state,
/// decides, and appends the new events at exactly the version it read. A
/// concurrent writer who appended in between makes the append fail with
/// [`ExecuteError::Conflict`], leaving the stream with only the winner's
/// events.
pub struct EventSourcedDecider<D, S> {
    store: S,
    key: String,
    _decider: PhantomData<D>,
}

impl<D, S> EventSourcedDecider<D, S>
where
    D: Decider,
    S: EventStore<D::Event>,
{
    /// Bind a decider to one stream of `store`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _decider: PhantomData,
        }
    }

    /// Run one command through the decider and append the produced events.
    ///
    /// The append is attempted even when the command produced no events,
    /// which keeps the version precondition checked on every call.
    ///
    /// # Errors
    ///
    /// [`ExecuteError::Conflict`] when a concurrent writer appended to the
    /// stream between this call's load and its append; none of this call's
    /// events are stored. [`ExecuteError::Storage`] for backend faults.
    pub async fn execute(&self, command: D::Command) -> Result<Vec<D::Event>, ExecuteError> {
        let stream = self.store.load_stream(&self.key).await?;
        let state = fold::<D>(D::initial_state(), &stream.events);

        let events = D::decide(&command, &state);
        self.store
            .append_to_stream(
                &self.key,
                events.clone(),
                ExpectedVersion::Exact(stream.version),
            )
            .await?;
        tracing::debug!(
            key = %self.key,
            appended = events.len(),
            version = stream.version,
            "appended events"
        );
        Ok(events)
    }

    /// Rebuild the current state by folding the whole stream.
    ///
    /// A stream that has never been appended to yields the initial state.
    pub async fn state(&self) -> Result<D::State, StateError> {
        let stream = self.store.load_stream(&self.key).await?;
        Ok(fold::<D>(D::initial_state(), &stream.events))
    }
}
