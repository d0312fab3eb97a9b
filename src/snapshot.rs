//! State-based runtime persisting the current state as a versioned snapshot.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::StateCodec;
use crate::decider::{Decider, fold};
use crate::error::{ExecuteError, StateError, StoreError};

/// Opaque write token identifying one stored revision of a key.
///
/// A fresh etag is minted on every successful write, so holding an etag
/// proves which revision a caller last read. Conditional writes compare
/// etags for equality and nothing else; no ordering is defined between
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Etag(Uuid);

impl Etag {
    /// Mint a token distinct from every other minted token.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for Etag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialized state plus the etag of the revision that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    /// The state in its serialized text form.
    pub state: String,
    /// Token of this revision, to be presented on the next write.
    pub etag: Etag,
}

/// Versioned key-value storage for serialized state.
///
/// # Contract
///
/// `put` must be conditional: with `expected: Some(etag)` it succeeds only
/// while the key still holds that etag, and with `expected: None` only
/// while the key is vacant. When several writers race on one key with the
/// same expectation, exactly one wins and the rest get
/// [`StoreError::Conflict`].
#[async_trait]
pub trait Container: Send + Sync {
    /// Read the current revision of `key`, or `None` if never written.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Write `value` under `key` if the key's revision still matches
    /// `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the revision check fails, and
    /// [`StoreError::Backend`] for faults in the storage itself.
    async fn put(
        &self,
        key: &str,
        value: StoredValue,
        expected: Option<&Etag>,
    ) -> Result<(), StoreError>;
}

/// Process-local [`Container`] backed by a concurrent map.
///
/// The revision check and the write happen under the key's map entry, so
/// concurrent conditional writes serialize correctly without any further
/// locking by callers.
#[derive(Clone, Default)]
pub struct InMemoryContainer {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl InMemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Container for InMemoryContainer {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(
        &self,
        key: &str,
        value: StoredValue,
        expected: Option<&Etag>,
    ) -> Result<(), StoreError> {
        match (self.entries.entry(key.to_owned()), expected) {
            (Entry::Vacant(vacant), None) => {
                vacant.insert(value);
                Ok(())
            }
            (Entry::Occupied(mut occupied), Some(etag)) if occupied.get().etag == *etag => {
                occupied.insert(value);
                Ok(())
            }
            _ => {
                tracing::warn!(key = %key, "conditional put lost to a concurrent write");
                Err(StoreError::Conflict {
                    key: key.to_owned(),
                })
            }
        }
    }
}

/// Runs a decider against serialized state kept in a [`Container`].
///
/// Each `execute` reads the key, deserializes (or starts from the initial
/// state when the key is vacant), decides, folds, and writes the new state
/// back conditionally on the etag it read. A concurrent writer who got in
/// between makes the write fail with [`ExecuteError::Conflict`], leaving
/// the store exactly as the winner wrote it.
pub struct SnapshotDecider<D, C, X> {
    container: C,
    codec: X,
    key: String,
    _decider: PhantomData<D>,
}

impl<D, C, X> SnapshotDecider<D, C, X>
where
    D: Decider,
    C: Container,
    X: StateCodec<D::State>,
{
    /// Bind a decider to one key of `container`, translating state through
    /// `codec`.
    pub fn new(container: C, codec: X, key: impl Into<String>) -> Self {
        Self {
            container,
            codec,
            key: key.into(),
            _decider: PhantomData,
        }
    }

    /// Run one command through the decider and persist the resulting state.
    ///
    /// The new revision is written even when the command produced no
    /// events, so every call rotates the key's etag.
    ///
    /// # Errors
    ///
    /// [`ExecuteError::Conflict`] when a concurrent writer updated the key
    /// between this call's read and its write; the command's effects are
    /// not stored. [`ExecuteError::Codec`] and [`ExecuteError::Storage`]
    /// for serialization and backend faults.
    pub async fn execute(&self, command: D::Command) -> Result<Vec<D::Event>, ExecuteError> {
        let stored = self.container.get(&self.key).await?;
        let (state, expected) = match &stored {
            Some(value) => (self.codec.deserialize(&value.state)?, Some(&value.etag)),
            None => (D::initial_state(), None),
        };

        let events = D::decide(&command, &state);
        let state = fold::<D>(state, &events);

        let value = StoredValue {
            state: self.codec.serialize(&state)?,
            etag: Etag::fresh(),
        };
        self.container.put(&self.key, value, expected).await?;
        tracing::debug!(key = %self.key, events = events.len(), "stored state snapshot");
        Ok(events)
    }

    /// Deserialize and return the currently stored state.
    ///
    /// # Errors
    ///
    /// [`StateError::NotFound`] if the key has never been written.
    pub async fn state(&self) -> Result<D::State, StateError> {
        match self.container.get(&self.key).await? {
            Some(value) => Ok(self.codec.deserialize(&value.state)?),
            None => Err(StateError::NotFound {
                key: self.key.clone(),
            }),
        }
    }
}
