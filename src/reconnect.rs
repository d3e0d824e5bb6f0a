//! Reconnection policy for the session's connection.
//!
//! [`ReconnectPolicy`] decides what happens after each unplanned close. It
//! counts consecutive closes, resets that count whenever a message arrives
//! (a message proves the server is alive and accepted us), and gives up once
//! the count reaches the configured ceiling.
//!
//! ```
//! use wordgame_session::reconnect::{CloseDecision, ReconnectPolicy, TeardownFlag};
//!
//! let mut policy = ReconnectPolicy::new(2, TeardownFlag::new());
//! assert_eq!(policy.on_close(None), CloseDecision::Reconnect { attempt: 1 });
//! policy.on_message();
//! assert_eq!(policy.on_close(None), CloseDecision::Reconnect { attempt: 1 });
//! assert_eq!(policy.on_close(None), CloseDecision::Dead { attempts: 2 });
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::close_codes::CloseCode;

/// Default number of consecutive unplanned closes before the session is dead.
pub const DEFAULT_RECONNECT_CEILING: u32 = 2;

/// Set once when the owner tears the session down.
///
/// Clones share the flag. Every reconnect decision consults it first, so no
/// reconnect survives an intended teardown.
#[derive(Debug, Clone, Default)]
pub struct TeardownFlag(Arc<AtomicBool>);

impl TeardownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session torn down. Returns `true` only for the call that
    /// actually flipped the flag.
    pub fn tear_down(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_torn_down(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What to do after the connection closed without the owner asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Open a new connection. `attempt` counts from 1 since the last message.
    Reconnect { attempt: u32 },
    /// Give up; the session is dead.
    Dead { attempts: u32 },
    /// The server says this build is outdated; reload instead of retrying.
    Reload,
    /// The session was torn down; do nothing.
    Suppressed,
}

/// Bounded retry counter with liveness reset and teardown suppression.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    ceiling: u32,
    retry: u32,
    teardown: TeardownFlag,
}

impl ReconnectPolicy {
    /// Create a policy that declares the session dead after `ceiling`
    /// consecutive closes. Values below 1 are clamped to 1.
    pub fn new(ceiling: u32, teardown: TeardownFlag) -> Self {
        Self {
            ceiling: ceiling.max(1),
            retry: 0,
            teardown,
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Consecutive unplanned closes since the last received message.
    pub fn retry_count(&self) -> u32 {
        self.retry
    }

    /// Record a successfully received message.
    pub fn on_message(&mut self) {
        self.retry = 0;
    }

    /// Decide what to do after an unplanned close (or a failed connect,
    /// reported with `code = None`).
    pub fn on_close(&mut self, code: Option<CloseCode>) -> CloseDecision {
        if self.teardown.is_torn_down() {
            debug!("reconnect suppressed: session torn down");
            return CloseDecision::Suppressed;
        }

        if code.is_some_and(CloseCode::requires_reload) {
            debug!("server reported outdated build");
            return CloseDecision::Reload;
        }

        self.retry = self.retry.saturating_add(1);
        if self.retry >= self.ceiling {
            debug!(attempts = self.retry, "reconnect ceiling reached");
            CloseDecision::Dead {
                attempts: self.retry,
            }
        } else {
            CloseDecision::Reconnect {
                attempt: self.retry,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(ceiling: u32) -> (ReconnectPolicy, TeardownFlag) {
        let flag = TeardownFlag::new();
        (ReconnectPolicy::new(ceiling, flag.clone()), flag)
    }

    #[test]
    fn dead_after_exactly_ceiling_closes() {
        let (mut p, _) = policy(2);
        assert_eq!(p.on_close(None), CloseDecision::Reconnect { attempt: 1 });
        assert_eq!(p.on_close(None), CloseDecision::Dead { attempts: 2 });
    }

    #[test]
    fn larger_ceiling_allows_more_attempts() {
        let (mut p, _) = policy(4);
        for attempt in 1..4 {
            assert_eq!(p.on_close(None), CloseDecision::Reconnect { attempt });
        }
        assert_eq!(p.on_close(None), CloseDecision::Dead { attempts: 4 });
    }

    #[test]
    fn message_resets_retry_count() {
        let (mut p, _) = policy(2);
        assert_eq!(p.on_close(None), CloseDecision::Reconnect { attempt: 1 });
        p.on_message();
        assert_eq!(p.retry_count(), 0);
        assert_eq!(p.on_close(None), CloseDecision::Reconnect { attempt: 1 });
    }

    #[test]
    fn teardown_suppresses_even_with_retries_left() {
        let (mut p, flag) = policy(5);
        assert!(flag.tear_down());
        assert_eq!(p.on_close(None), CloseDecision::Suppressed);
        assert_eq!(p.retry_count(), 0);
    }

    #[test]
    fn teardown_takes_priority_over_reload() {
        let (mut p, flag) = policy(2);
        flag.tear_down();
        assert_eq!(
            p.on_close(Some(CloseCode::OutdatedBuild)),
            CloseDecision::Suppressed
        );
    }

    #[test]
    fn outdated_build_reloads_without_counting() {
        let (mut p, _) = policy(2);
        assert_eq!(
            p.on_close(Some(CloseCode::OutdatedBuild)),
            CloseDecision::Reload
        );
        assert_eq!(p.retry_count(), 0);
    }

    #[test]
    fn ordinary_close_code_counts_as_retry() {
        let (mut p, _) = policy(2);
        assert_eq!(
            p.on_close(Some(CloseCode::GoingAway)),
            CloseDecision::Reconnect { attempt: 1 }
        );
    }

    #[test]
    fn zero_ceiling_is_clamped() {
        let (mut p, _) = policy(0);
        assert_eq!(p.ceiling(), 1);
        assert_eq!(p.on_close(None), CloseDecision::Dead { attempts: 1 });
    }

    #[test]
    fn tear_down_is_non_reentrant() {
        let flag = TeardownFlag::new();
        let other = flag.clone();
        assert!(!other.is_torn_down());
        assert!(flag.tear_down());
        assert!(!other.tear_down());
        assert!(other.is_torn_down());
    }
}
