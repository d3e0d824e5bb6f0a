//! Wire-compatible protocol types for the game server.
//!
//! Every message is a JSON object tagged by `method`, with the method's
//! arguments under `params`. Field names are camelCase on the wire; the player
//! identifier is spelled `playerID`.
//!
//! - Inbound: [`ServerNote`], e.g. `{"method":"state","params":{...}}`
//! - Outbound: [`ClientNote`], an [`Intent`] plus the room version it was
//!   issued against, e.g. `{"method":"endTurn","params":{},"version":7}`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Type aliases ────────────────────────────────────────────────────

/// Unique identifier for players, assigned by the server.
pub type PlayerId = Uuid;

/// Monotonic room state version.
pub type Version = u64;

// ── Room state ──────────────────────────────────────────────────────

/// A player as seen in the room state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePlayer {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    pub nickname: String,
    pub spymaster: bool,
}

/// Identity of a tile, visible to spymasters and once revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    /// Owning team index. Meaningless when `neutral` or `bomb` is set.
    pub team: usize,
    pub neutral: bool,
    pub bomb: bool,
    pub revealed: bool,
}

/// A single word on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTile {
    pub word: String,
    pub revealed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<StateView>,
}

/// A word list the room can draw its board from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWordList {
    pub name: String,
    pub custom: bool,
    pub enabled: bool,
    pub count: usize,
}

/// Turn timer, present only in timed mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTimer {
    /// Length of a turn in seconds.
    pub turn_time: u32,
    /// Server time at which the current turn ends (ISO 8601).
    pub turn_end: String,
}

/// Server-authoritative snapshot of a room.
///
/// Replaced wholesale on every update; the client never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub version: Version,
    /// Players per team. Team identity is the position in this list.
    pub teams: Vec<Vec<StatePlayer>>,
    /// Index of the team whose turn it is.
    #[serde(default)]
    pub turn: usize,
    #[serde(default)]
    pub grow_shrink: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<usize>,
    /// Board rows, each a row of tiles.
    #[serde(default)]
    pub board: Vec<Vec<StateTile>>,
    /// Unrevealed words remaining per team.
    #[serde(default)]
    pub words_left: Vec<usize>,
    #[serde(default)]
    pub lists: Vec<StateWordList>,
    /// Total number of words across enabled lists.
    #[serde(default)]
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<StateTimer>,
    #[serde(default)]
    pub hide_bomb: bool,
}

impl RoomState {
    /// Tile at `(row, col)`, if the board has one there.
    pub fn tile(&self, row: usize, col: usize) -> Option<&StateTile> {
        self.board.get(row).and_then(|r| r.get(col))
    }
}

/// Per-client state pushed by the server: the room plus which player this
/// connection is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "roomState")]
    pub room_state: RoomState,
}

impl ClientState {
    /// Version of the contained room state.
    pub fn version(&self) -> Version {
        self.room_state.version
    }
}

/// A custom word pack uploaded by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPack {
    pub name: String,
    pub words: Vec<String>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Player-originated action, not yet stamped with a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Intent {
    /// Reveal the tile at `(row, col)`.
    Reveal { row: usize, col: usize },
    /// Deal a new board.
    NewGame {},
    /// End the current team's turn.
    EndTurn {},
    ChangeNickname { nickname: String },
    /// Switch between spymaster and guesser.
    ChangeRole { spymaster: bool },
    /// Move to the team at index `team`.
    ChangeTeam { team: usize },
    RandomizeTeams {},
    /// Enable or disable word list `num`.
    ChangePack { num: usize, enable: bool },
    ChangeTurnMode { timed: bool },
    ChangeTurnTime { seconds: u32 },
    AddPacks { packs: Vec<WordPack> },
    RemovePack { num: usize },
    ChangeHideBomb {
        #[serde(rename = "hideBomb")]
        hide_bomb: bool,
    },
}

impl Intent {
    /// The wire `method` tag of this intent.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Reveal { .. } => "reveal",
            Self::NewGame {} => "newGame",
            Self::EndTurn {} => "endTurn",
            Self::ChangeNickname { .. } => "changeNickname",
            Self::ChangeRole { .. } => "changeRole",
            Self::ChangeTeam { .. } => "changeTeam",
            Self::RandomizeTeams {} => "randomizeTeams",
            Self::ChangePack { .. } => "changePack",
            Self::ChangeTurnMode { .. } => "changeTurnMode",
            Self::ChangeTurnTime { .. } => "changeTurnTime",
            Self::AddPacks { .. } => "addPacks",
            Self::RemovePack { .. } => "removePack",
            Self::ChangeHideBomb { .. } => "changeHideBomb",
        }
    }

    /// Stamp this intent with the room version it is issued against.
    pub fn stamp(self, version: Version) -> ClientNote {
        ClientNote {
            intent: self,
            version,
        }
    }
}

/// Message sent from client to server: an intent plus the version of the
/// room state the client believed current. The server uses the version to
/// reject stale intents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientNote {
    #[serde(flatten)]
    pub intent: Intent,
    pub version: Version,
}

/// Message sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ServerNote {
    /// Full state snapshot for this client.
    State(ClientState),
}

impl ServerNote {
    /// Payload-free tag of this note.
    pub fn kind(&self) -> ServerMethod {
        match self {
            Self::State(_) => ServerMethod::State,
        }
    }

    /// The wire `method` tag of this note.
    pub fn method(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// The `method` tags a [`ServerNote`] can carry.
///
/// [`ServerNote::kind`] maps every note onto one of these, so a new note
/// variant does not compile until it has a tag here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerMethod {
    State,
}

impl ServerMethod {
    /// Parse a wire `method` tag, `None` if this client does not know it.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "state" => Some(Self::State),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
        }
    }
}
