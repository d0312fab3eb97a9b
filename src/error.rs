//! Crate-level error types for command execution and state retrieval.

/// Error produced by a [`StateCodec`](crate::StateCodec) implementation.
///
/// Deserialization failures indicate stored text the codec does not
/// recognize. That is an integration fault, not a recoverable condition, and
/// is always surfaced to the caller rather than swallowed.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The state value could not be turned into text.
    #[error("state serialization failed: {0}")]
    Serialize(String),

    /// The stored text could not be turned back into a state value.
    #[error("state deserialization failed: {0}")]
    Deserialize(String),
}

/// Error returned by storage collaborators ([`Container`](crate::Container)
/// and [`EventStore`](crate::EventStore) implementations).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A conditional write was rejected because the caller's token (etag or
    /// expected version) no longer matches what is stored.
    #[error("concurrent write detected for key `{key}`")]
    Conflict {
        /// The key the rejected write targeted.
        key: String,
    },

    /// Backend-specific failure (I/O, network, encoding at rest).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Error returned when executing a command through a stateful runtime fails.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Another writer got in between this call's read and its write.
    ///
    /// Recoverable: reload and retry if the command still applies. The
    /// runtime itself never retries; that policy belongs to the caller.
    #[error("optimistic concurrency conflict on key `{key}`")]
    Conflict {
        /// The key the losing write targeted.
        key: String,
    },

    /// The state codec rejected a stored or computed state.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The storage collaborator failed for a non-conflict reason.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for ExecuteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { key } => ExecuteError::Conflict { key },
            StoreError::Backend(msg) => ExecuteError::Storage(msg),
        }
    }
}

/// Error returned when reading a runtime's current state view fails.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Nothing has ever been written for the key.
    #[error("no stored state for key `{key}`")]
    NotFound {
        /// The key that was queried.
        key: String,
    },

    /// The state codec rejected the stored text.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for StateError {
    fn from(err: StoreError) -> Self {
        match err {
            // Reads carry no write token, so a conflict from a read path is a
            // misbehaving backend.
            StoreError::Conflict { key } => {
                StateError::Storage(format!("unexpected conflict reading key `{key}`"))
            }
            StoreError::Backend(msg) => StateError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_displays_reason() {
        let err = CodecError::Deserialize("unknown cat state `grumpy`".to_string());
        assert_eq!(
            err.to_string(),
            "state deserialization failed: unknown cat state `grumpy`"
        );
    }

    #[test]
    fn store_conflict_display_names_key() {
        let err = StoreError::Conflict {
            key: "bulb".to_string(),
        };
        assert_eq!(err.to_string(), "concurrent write detected for key `bulb`");
    }

    #[test]
    fn execute_error_conflict_display() {
        let err = ExecuteError::Conflict {
            key: "bulb".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "optimistic concurrency conflict on key `bulb`"
        );
    }

    #[test]
    fn store_conflict_flattens_into_execute_conflict() {
        let err = ExecuteError::from(StoreError::Conflict {
            key: "cat".to_string(),
        });
        assert!(
            matches!(err, ExecuteError::Conflict { ref key } if key == "cat"),
            "expected Conflict, got: {err}"
        );
    }

    #[test]
    fn store_backend_becomes_execute_storage() {
        let err = ExecuteError::from(StoreError::Backend("disk full".to_string()));
        assert!(matches!(err, ExecuteError::Storage(ref msg) if msg == "disk full"));
    }

    #[test]
    fn execute_error_codec_displays_inner() {
        let err = ExecuteError::from(CodecError::Serialize("cycle".to_string()));
        assert_eq!(err.to_string(), "state serialization failed: cycle");
    }

    #[test]
    fn state_error_not_found_display() {
        let err = StateError::NotFound {
            key: "cat".to_string(),
        };
        assert_eq!(err.to_string(), "no stored state for key `cat`");
    }

    #[test]
    fn store_conflict_on_read_becomes_storage_fault() {
        let err = StateError::from(StoreError::Conflict {
            key: "cat".to_string(),
        });
        assert!(matches!(err, StateError::Storage(_)));
    }

    // Verify `Send + Sync` bounds are satisfied so errors can cross task
    // boundaries.
    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<CodecError>();
            assert_send_sync::<StoreError>();
            assert_send_sync::<ExecuteError>();
            assert_send_sync::<StateError>();
        }
    };
}
