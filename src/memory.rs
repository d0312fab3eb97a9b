//! In-memory runtime holding a decider's state directly, with no persistence.

use crate::decider::{Decider, fold};

/// Runs a decider against a plain owned state.
///
/// The simplest runtime: no storage, no serialization, no concurrency
/// control. State lives in the struct and every command is applied in
/// place, which makes this the reference against which the persistent
/// runtimes can be checked.
pub struct InMemoryDecider<D: Decider> {
    state: D::State,
}

impl<D: Decider> InMemoryDecider<D> {
    /// Create a runtime positioned at the decider's initial state.
    pub fn new() -> Self {
        Self {
            state: D::initial_state(),
        }
    }

    /// Decide on `command` against the current state, fold the produced
    /// events back in, and return them.
    pub fn execute(&mut self, command: D::Command) -> Vec<D::Event> {
        let events = D::decide(&command, &self.state);
        let state = std::mem::replace(&mut self.state, D::initial_state());
        self.state = fold::<D>(state, &events);
        events
    }

    /// The current state, for read views.
    pub fn state(&self) -> &D::State {
        &self.state
    }
}

impl<D: Decider> Default for InMemoryDecider<D> {
    fn default() -> Self {
        Self::new()
    }
}
