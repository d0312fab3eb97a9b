//! Decider trait and the event fold.

/// A pure decision function over (Command, State, Event).
///
/// Implementing types are usually zero-sized markers; the decider itself
/// carries no data. State lives wherever a runtime puts it -- in memory, in a
/// snapshot container, or reconstructed from an event stream -- and is only
/// ever changed by folding events through [`evolve`](Decider::evolve).
///
/// # Associated Types
///
/// - `Command`: the closed set of commands this decider recognizes.
/// - `Event`: the closed set of events it can produce and apply.
/// - `State`: the states reachable from `initial_state` under `evolve`.
///
/// # Contract
///
/// - [`decide`](Decider::decide) and [`evolve`](Decider::evolve) must be pure:
///   no I/O, no shared-state mutation, deterministic for identical inputs.
/// - [`initial_state`](Decider::initial_state) returns the same value on
///   every call.
/// - A recognized command that is inapplicable in the current state returns
///   an empty event vector ("nothing happens"). Because the command and event
///   sets are closed enums, the unrecognized-type failure mode of dynamically
///   typed renditions cannot occur here.
/// - [`is_terminal`](Decider::is_terminal) is introspection only. No runtime
///   enforces it; by convention `decide` on a terminal state produces no
///   events.
///
/// # Examples
///
/// ```
/// use decider::Decider;
///
/// struct Latch;
///
/// enum LatchCommand {
///     Release,
/// }
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum LatchEvent {
///     Released,
/// }
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum LatchState {
///     Held,
///     Released,
/// }
///
/// impl Decider for Latch {
///     type Command = LatchCommand;
///     type Event = LatchEvent;
///     type State = LatchState;
///
///     fn initial_state() -> LatchState {
///         LatchState::Held
///     }
///
///     fn is_terminal(state: &LatchState) -> bool {
///         *state == LatchState::Released
///     }
///
///     fn decide(command: &LatchCommand, state: &LatchState) -> Vec<LatchEvent> {
///         match (command, state) {
///             (LatchCommand::Release, LatchState::Held) => vec![LatchEvent::Released],
///             _ => Vec::new(),
///         }
///     }
///
///     fn evolve(state: LatchState, event: &LatchEvent) -> LatchState {
///         match (state, event) {
///             (_, LatchEvent::Released) => LatchState::Released,
///         }
///     }
/// }
///
/// let state = Latch::initial_state();
/// let events = Latch::decide(&LatchCommand::Release, &state);
/// assert_eq!(events, vec![LatchEvent::Released]);
/// ```
pub trait Decider {
    /// The set of commands this decider can handle.
    type Command: Send + 'static;

    /// The set of events this decider can produce and apply.
    type Event: Clone + Send + Sync + 'static;

    /// The states reachable by folding events from the initial state.
    type State: Send + Sync + 'static;

    /// The state before any event has happened.
    fn initial_state() -> Self::State;

    /// Whether no further command can produce new events from `state`.
    fn is_terminal(state: &Self::State) -> bool;

    /// Validate a command against the current state and produce events.
    ///
    /// Returns an empty vector when the command is recognized but does not
    /// apply to `state`.
    fn decide(command: &Self::Command, state: &Self::State) -> Vec<Self::Event>;

    /// Apply a single event to produce the next state.
    ///
    /// Takes ownership of the current state and a reference to the event.
    /// Must be total for every state reachable through this decider's own
    /// events; combinations that cannot arise from `decide` return the state
    /// unchanged.
    fn evolve(state: Self::State, event: &Self::Event) -> Self::State;
}

/// Replay `events` over `state`, left to right, through [`Decider::evolve`].
///
/// No event is skipped and order is preserved, so the result is deterministic
/// for identical inputs. This is the single place state reconstruction
/// happens: every runtime in this crate routes through it rather than
/// iterating on its own.
///
/// # Arguments
///
/// * `state` - The state to start folding from.
/// * `events` - The events to apply, oldest first.
///
/// # Returns
///
/// The state after every event has been applied.
pub fn fold<D: Decider>(state: D::State, events: &[D::Event]) -> D::State {
    events.iter().fold(state, D::evolve)
}
