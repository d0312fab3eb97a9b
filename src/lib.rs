//! Decision-making aggregates as pure functions, with pluggable runtimes.

mod decider;
pub use decider::{Decider, fold};
mod compose;
pub use compose::{Composed, ComposedState, Sum};
mod codec;
mod error;
mod memory;
mod snapshot;
mod store;

pub use codec::{JsonCodec, StateCodec};
pub use error::{CodecError, ExecuteError, StateError, StoreError};
pub use memory::InMemoryDecider;
pub use snapshot::{Container, Etag, InMemoryContainer, SnapshotDecider, StoredValue};
pub use store::{
    EventSourcedDecider, EventStore, EventStream, ExpectedVersion, InMemoryEventStore,
};
