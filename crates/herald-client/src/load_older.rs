//! Gate for "load more" requests at the old end of the timeline
//!
//! Transitions are a pure function of `(state, event)`. Side effects of
//! entering a state (issuing the fetch when entering
//! [`LoadOlderState::Loading`]) belong to whoever drives the machine.
use std::fmt;

use tokio::sync::watch;
use tracing::debug;

const LOG_TARGET: &str = "herald::load_older";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadOlderState {
    #[default]
    Initial,
    Loading,
    Fail,
    Idle,
    NoMore,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadOlderEvent {
    /// User scrolled near the end, or asked to retry
    Trigger,
    Succeeded { end_of_data: bool },
    Failed,
    /// A refresh replaced the feed and older records went missing
    Truncated,
}

impl LoadOlderState {
    /// State entered on `event`, `None` if the event is ignored
    pub fn next(self, event: LoadOlderEvent) -> Option<Self> {
        use LoadOlderEvent::*;
        use LoadOlderState::*;

        match (self, event) {
            (Initial | Idle | Fail, Trigger) => Some(Loading),
            (Loading, Succeeded { end_of_data: false }) => Some(Idle),
            (Loading, Succeeded { end_of_data: true }) => Some(NoMore),
            (Loading, Failed) => Some(Fail),
            // Already fetching: the trigger is dropped, not queued
            (Loading, Trigger) => None,
            // End of data was reached on records that are no longer loaded
            (NoMore, Truncated) => Some(Idle),
            (NoMore, _) => None,
            // Outcome of a fetch that is no longer in flight
            (Initial | Idle | Fail, Succeeded { .. } | Failed) => None,
            // Nothing to reopen; an in-flight fetch settles on its own
            (Initial | Idle | Fail | Loading, Truncated) => None,
        }
    }
}

impl fmt::Display for LoadOlderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadOlderState::Initial => "initial",
            LoadOlderState::Loading => "loading",
            LoadOlderState::Fail => "fail",
            LoadOlderState::Idle => "idle",
            LoadOlderState::NoMore => "no-more",
        })
    }
}

/// Current [`LoadOlderState`], observable through a `watch` channel
#[derive(Debug)]
pub struct LoadOlderStateMachine {
    state_tx: watch::Sender<LoadOlderState>,
}

impl Default for LoadOlderStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadOlderStateMachine {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(LoadOlderState::Initial);
        Self { state_tx }
    }

    pub fn state(&self) -> LoadOlderState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadOlderState> {
        self.state_tx.subscribe()
    }

    /// Apply `event` atomically
    ///
    /// Returns the entered state, or `None` if the event was ignored. Of
    /// two racing `Trigger`s only one can observe `Some(Loading)`.
    pub fn handle(&self, event: LoadOlderEvent) -> Option<LoadOlderState> {
        let mut entered = None;
        self.state_tx.send_if_modified(|state| {
            let Some(next) = state.next(event) else {
                debug!(target: LOG_TARGET, %state, ?event, "Event ignored");
                return false;
            };
            debug!(target: LOG_TARGET, from = %state, to = %next, ?event, "Transition");
            *state = next;
            entered = Some(next);
            true
        });
        entered
    }
}
