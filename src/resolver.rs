//! Locates the local player within a room snapshot.

use std::sync::Arc;

use crate::error::{Result, SessionError};
use crate::protocol::{ClientState, RoomState, StatePlayer};

/// The local player's record and team, borrowed from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPlayer<'a> {
    pub player: &'a StatePlayer,
    /// Position of the player's team in [`RoomState::teams`].
    pub team: usize,
}

/// Find this client's player in `state`.
///
/// Teams are scanned in order and the first record whose `playerID` matches
/// wins.
///
/// # Errors
///
/// Returns [`SessionError::PlayerNotFound`] if no team contains the player.
/// The server must always include the requesting player, so this is fatal.
pub fn resolve_player(state: &ClientState) -> Result<ResolvedPlayer<'_>> {
    state
        .room_state
        .teams
        .iter()
        .enumerate()
        .find_map(|(team, players)| {
            players
                .iter()
                .find(|p| p.player_id == state.player_id)
                .map(|player| ResolvedPlayer { player, team })
        })
        .ok_or(SessionError::PlayerNotFound {
            player_id: state.player_id,
        })
}

/// Everything the presentation layer reads: the snapshot plus the resolved
/// local player. Built fresh for every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub state: ClientState,
    pub player: StatePlayer,
    pub team: usize,
}

impl GameView {
    /// Resolve the local player in `state` and bundle the result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PlayerNotFound`] if the player is missing.
    pub fn resolve(state: ClientState) -> Result<Arc<Self>> {
        let (player, team) = {
            let resolved = resolve_player(&state)?;
            (resolved.player.clone(), resolved.team)
        };
        Ok(Arc::new(Self {
            state,
            player,
            team,
        }))
    }

    pub fn room(&self) -> &RoomState {
        &self.state.room_state
    }

    /// Whether it is currently the local player's team's turn.
    pub fn is_my_turn(&self) -> bool {
        self.room().turn == self.team
    }
}
