//! Intent dispatch for the presentation layer.
//!
//! [`Sender`] exposes one method per [`Intent`] kind. Each call builds the
//! intent and submits it to the session, which stamps it with the current
//! room version and transmits it. Calls are fire-and-forget.

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::{Intent, WordPack};

/// Cheap, cloneable handle for dispatching player intents.
///
/// Holds no state besides the submission channel. Two senders compare equal
/// exactly when they submit to the same session, so presentation code can
/// use equality to skip needless re-renders.
#[derive(Debug, Clone)]
pub struct Sender {
    tx: mpsc::UnboundedSender<Intent>,
}

impl Sender {
    /// Wrap a submission channel.
    pub fn new(tx: mpsc::UnboundedSender<Intent>) -> Self {
        Self { tx }
    }

    /// Submit an arbitrary intent.
    ///
    /// Intents submitted after the session has ended are discarded.
    pub fn dispatch(&self, intent: Intent) {
        if let Err(mpsc::error::SendError(intent)) = self.tx.send(intent) {
            debug!(method = intent.method(), "session ended, intent discarded");
        }
    }

    /// Reveal the tile at `(row, col)`.
    pub fn reveal(&self, row: usize, col: usize) {
        self.dispatch(Intent::Reveal { row, col });
    }

    pub fn new_game(&self) {
        self.dispatch(Intent::NewGame {});
    }

    pub fn end_turn(&self) {
        self.dispatch(Intent::EndTurn {});
    }

    pub fn change_nickname(&self, nickname: impl Into<String>) {
        self.dispatch(Intent::ChangeNickname {
            nickname: nickname.into(),
        });
    }

    /// Become a spymaster (`true`) or a guesser (`false`).
    pub fn change_role(&self, spymaster: bool) {
        self.dispatch(Intent::ChangeRole { spymaster });
    }

    /// Move to the team at index `team`.
    pub fn change_team(&self, team: usize) {
        self.dispatch(Intent::ChangeTeam { team });
    }

    pub fn randomize_teams(&self) {
        self.dispatch(Intent::RandomizeTeams {});
    }

    /// Enable or disable word list `num`.
    pub fn change_pack(&self, num: usize, enable: bool) {
        self.dispatch(Intent::ChangePack { num, enable });
    }

    pub fn change_turn_mode(&self, timed: bool) {
        self.dispatch(Intent::ChangeTurnMode { timed });
    }

    pub fn change_turn_time(&self, seconds: u32) {
        self.dispatch(Intent::ChangeTurnTime { seconds });
    }

    pub fn add_packs(&self, packs: Vec<WordPack>) {
        self.dispatch(Intent::AddPacks { packs });
    }

    pub fn remove_pack(&self, num: usize) {
        self.dispatch(Intent::RemovePack { num });
    }

    pub fn change_hide_bomb(&self, hide_bomb: bool) {
        self.dispatch(Intent::ChangeHideBomb { hide_bomb });
    }
}

impl PartialEq for Sender {
    fn eq(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

impl Eq for Sender {}
