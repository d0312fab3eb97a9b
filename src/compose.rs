//! Structural composition of two deciders into one.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::decider::Decider;

/// A value belonging to one of two sides.
///
/// Commands and events of a composed decider are wrapped in `Sum`, which
/// makes the owning side explicit in the type: routing never has to guess,
/// and the two sides stay disjoint by construction even when both are the
/// same decider type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sum<A, B> {
    /// A value owned by the first (left) side.
    First(A),
    /// A value owned by the second (right) side.
    Second(B),
}

/// Joint state of a composed decider.
///
/// The two variants carry the same payload and behave identically under
/// `decide` and `is_terminal`; `Initial` additionally records that no event
/// has been folded in yet. The first `evolve` moves the state to `Pair` for
/// good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComposedState<SX, SY> {
    /// Both sides still hold their initial states; no event routed yet.
    Initial(SX, SY),
    /// At least one event has been folded into one of the sides.
    Pair(SX, SY),
}

impl<SX, SY> ComposedState<SX, SY> {
    /// Borrow both sub-states, whichever variant this is.
    pub fn parts(&self) -> (&SX, &SY) {
        match self {
            ComposedState::Initial(x, y) | ComposedState::Pair(x, y) => (x, y),
        }
    }

    /// Take ownership of both sub-states.
    pub fn into_parts(self) -> (SX, SY) {
        match self {
            ComposedState::Initial(x, y) | ComposedState::Pair(x, y) => (x, y),
        }
    }
}

/// The decider formed from two sub-deciders `X` and `Y`.
///
/// Commands and events are routed to the side named by their [`Sum`] tag;
/// the joint state is a [`ComposedState`] of both sub-states. Because
/// `Composed<X, Y>` is itself a [`Decider`], composition nests:
/// `Composed<X, Composed<Y, Z>>` routes through two levels of tags.
///
/// # Contract
///
/// - `decide` delegates to the owning side with that side's current
///   sub-state and never touches the other side.
/// - `evolve` folds the event into the sub-state carried by the incoming
///   composed state. The un-routed side passes through untouched; neither
///   side is ever re-initialized, so accumulated history survives events
///   routed to the opposite side.
/// - `is_terminal` is true only when both sides are terminal under their own
///   deciders: as long as one side can still make progress, the composition
///   can.
pub struct Composed<X, Y>(PhantomData<(X, Y)>);

impl<X, Y> Decider for Composed<X, Y>
where
    X: Decider,
    Y: Decider,
{
    type Command = Sum<X::Command, Y::Command>;
    type Event = Sum<X::Event, Y::Event>;
    type State = ComposedState<X::State, Y::State>;

    fn initial_state() -> Self::State {
        ComposedState::Initial(X::initial_state(), Y::initial_state())
    }

    fn is_terminal(state: &Self::State) -> bool {
        let (x, y) = state.parts();
        X::is_terminal(x) && Y::is_terminal(y)
    }

    fn decide(command: &Self::Command, state: &Self::State) -> Vec<Self::Event> {
        let (x, y) = state.parts();
        match command {
            Sum::First(command) => X::decide(command, x).into_iter().map(Sum::First).collect(),
            Sum::Second(command) => Y::decide(command, y).into_iter().map(Sum::Second).collect(),
        }
    }

    fn evolve(state: Self::State, event: &Self::Event) -> Self::State {
        let (x, y) = state.into_parts();
        match event {
            Sum::First(event) => ComposedState::Pair(X::evolve(x, event), y),
            Sum::Second(event) => ComposedState::Pair(x, Y::evolve(y, event)),
        }
    }
}
