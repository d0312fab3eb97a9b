//! Caller-supplied state serialization for the snapshot runtime.

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::CodecError;

/// A pure serializer/deserializer pair for a decider's state.
///
/// The snapshot runtime never inspects state internals; it stores whatever
/// text [`serialize`](StateCodec::serialize) produces and hands stored text
/// back to [`deserialize`](StateCodec::deserialize). Implementations are
/// supplied per decider by the caller.
///
/// # Contract
///
/// Both methods must be pure, and for every state reachable through the
/// decider the pair must round-trip exactly:
/// `deserialize(&serialize(&state)?)? == state`.
pub trait StateCodec<S>: Send + Sync {
    /// Turn a state into its stored text form.
    fn serialize(&self, state: &S) -> Result<String, CodecError>;

    /// Turn stored text back into a state.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Deserialize`] for text this codec did not
    /// produce.
    fn deserialize(&self, text: &str) -> Result<S, CodecError>;
}

/// JSON codec for any serde-capable state type.
///
/// The default choice when a domain has no bespoke text format: states are
/// stored as their `serde_json` representation.
pub struct JsonCodec<S> {
    _state: PhantomData<S>,
}

impl<S> JsonCodec<S> {
    /// Create a new JSON codec.
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
        }
    }
}

impl<S> Default for JsonCodec<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateCodec<S> for JsonCodec<S>
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    fn serialize(&self, state: &S) -> Result<String, CodecError> {
        serde_json::to_string(state).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    fn deserialize(&self, text: &str) -> Result<S, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}
