//! WebSocket close codes with meaning to the game session.
//!
//! Only [`CloseCode::OutdatedBuild`] changes client behavior: it tells the
//! client that its build no longer speaks the server's protocol, so the
//! session must reload instead of reconnecting. Everything else is treated
//! as an ordinary unplanned close.

use std::fmt;

/// Application close code sent by the server when the client's
/// `protocolVersion` does not match its own.
pub const OUTDATED_BUILD: u16 = 4418;

/// Close codes the session distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    /// `1000`: the connection finished its purpose.
    Normal,
    /// `1001`: the server is going down or the peer navigated away.
    GoingAway,
    /// `1006`: the connection dropped without a close frame.
    Abnormal,
    /// `4418`: the client build is outdated and must be reloaded.
    OutdatedBuild,
    /// Any other code, carried verbatim.
    Other(u16),
}

impl CloseCode {
    /// Map a raw close code to a [`CloseCode`].
    pub fn from_u16(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::GoingAway,
            1006 => Self::Abnormal,
            OUTDATED_BUILD => Self::OutdatedBuild,
            other => Self::Other(other),
        }
    }

    /// The raw numeric code.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::GoingAway => 1001,
            Self::Abnormal => 1006,
            Self::OutdatedBuild => OUTDATED_BUILD,
            Self::Other(code) => code,
        }
    }

    /// Returns `true` if the server asked the client to reload its build.
    pub fn requires_reload(self) -> bool {
        self == Self::OutdatedBuild
    }

    /// Returns a human-readable description of this close code.
    pub fn description(self) -> &'static str {
        match self {
            Self::Normal => "The connection was closed normally.",
            Self::GoingAway => {
                "The server is shutting down or the connection is being moved. Reconnecting."
            }
            Self::Abnormal => "The connection dropped without a close handshake.",
            Self::OutdatedBuild => {
                "This client is out of date with the game server. Reload to get the latest version."
            }
            Self::Other(_) => "The connection was closed with an unrecognized code.",
        }
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self::from_u16(code)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_code_maps_to_outdated_build() {
        assert_eq!(CloseCode::from_u16(4418), CloseCode::OutdatedBuild);
        assert!(CloseCode::from(4418).requires_reload());
    }

    #[test]
    fn ordinary_codes_do_not_require_reload() {
        for code in [1000, 1001, 1006, 1011, 4000, 4417, 4419] {
            assert!(!CloseCode::from_u16(code).requires_reload(), "code {code}");
        }
    }

    #[test]
    fn raw_code_is_preserved() {
        for code in [1000, 1001, 1006, 4418, 4999] {
            assert_eq!(CloseCode::from_u16(code).as_u16(), code);
        }
    }

    #[test]
    fn display_includes_numeric_code() {
        let text = CloseCode::OutdatedBuild.to_string();
        assert!(text.contains("4418"));
        assert!(text.contains("out of date"));
    }
}
