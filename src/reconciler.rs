//! The client's state machine.
//!
//! [`StateReconciler`] holds the latest [`ClientState`] pushed by the server
//! (or nothing, before the first push). Server snapshots replace it
//! wholesale. Intents never change it: they are stamped with the current
//! version and handed back to the caller for transmission, and their effect
//! becomes visible only when the server pushes the next snapshot.
//!
//! ```
//! use wordgame_session::protocol::Intent;
//! use wordgame_session::reconciler::StateReconciler;
//!
//! let mut reconciler = StateReconciler::new();
//! // Nothing to stamp against yet, so the intent is dropped.
//! assert!(reconciler.apply_intent(Intent::EndTurn {}).is_none());
//! ```

use tracing::{debug, warn};

use crate::protocol::{ClientNote, ClientState, Intent, ServerNote, Version};

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the state with a server snapshot.
    SetState(ClientState),
    /// A locally dispatched player intent.
    Intent(Intent),
}

/// Holds the single current view of the room.
#[derive(Debug, Default)]
pub struct StateReconciler {
    state: Option<ClientState>,
}

impl StateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `None` until the first snapshot arrives.
    pub fn state(&self) -> Option<&ClientState> {
        self.state.as_ref()
    }

    /// Version of the current room state, if synced.
    pub fn version(&self) -> Option<Version> {
        self.state.as_ref().map(ClientState::version)
    }

    pub fn is_synced(&self) -> bool {
        self.state.is_some()
    }

    /// Apply a decoded server message.
    pub fn apply_server_note(&mut self, note: ServerNote) {
        match note {
            ServerNote::State(state) => self.set_state(state),
        }
    }

    /// Replace the current state with `next`.
    ///
    /// Snapshots are accepted whatever their version; a regression is only
    /// logged.
    pub fn set_state(&mut self, next: ClientState) {
        if let Some(current) = &self.state {
            if next.version() < current.version() {
                warn!(
                    current = current.version(),
                    incoming = next.version(),
                    "server state version went backwards"
                );
            }
        }
        debug!(version = next.version(), "state replaced");
        self.state = Some(next);
    }

    /// Stamp `intent` with the current version.
    ///
    /// Returns the [`ClientNote`] to transmit, or `None` if no snapshot has
    /// arrived yet. The state itself is left untouched.
    pub fn apply_intent(&mut self, intent: Intent) -> Option<ClientNote> {
        match &self.state {
            Some(state) => Some(intent.stamp(state.version())),
            None => {
                debug!(method = intent.method(), "dropping intent before first sync");
                None
            }
        }
    }

    /// Apply any [`Action`]. Returns the note to transmit, if any.
    pub fn apply(&mut self, action: Action) -> Option<ClientNote> {
        match action {
            Action::SetState(state) => {
                self.set_state(state);
                None
            }
            Action::Intent(intent) => self.apply_intent(intent),
        }
    }

    /// Drop the current state, returning it.
    pub fn reset(&mut self) -> Option<ClientState> {
        self.state.take()
    }
}
