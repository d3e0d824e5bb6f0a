#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration-style session tests.
//!
//! Uses the channel-based `MockConnector` from `tests/common` to script the
//! server side of each connection and verify connection lifecycle,
//! reconciliation and player resolution end to end.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wordgame_session::{
    CloseCode, ConnectParams, GameSession, SessionConfig, SessionError, SessionEvent,
    SessionOutcome,
};

use common::{
    collect_all, next_event, pid, player, state_json, wait_for, Frame, MockConnector,
};

fn config() -> SessionConfig {
    SessionConfig::new("R1", "Ann")
        .with_protocol_version("test-build")
        .with_reconnect_interval(Duration::ZERO)
}

fn is_state(event: &SessionEvent) -> bool {
    matches!(event, SessionEvent::StateUpdated(_))
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hook_count = Arc::clone(&count);
    (count, move || {
        hook_count.fetch_add(1, Ordering::SeqCst);
    })
}

// ════════════════════════════════════════════════════════════════════
// End to end
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn change_team_round_trip() {
    let (connector, mut servers, log) = MockConnector::with_connections(1);
    let (mut session, mut events) = GameSession::start(connector, config());
    let server = &mut servers[0];

    server.send_text(state_json(1, 1, vec![vec![player(1, "Ann")]]));
    let SessionEvent::StateUpdated(view) = wait_for(&mut events, is_state).await else {
        unreachable!()
    };
    assert_eq!(view.player.nickname, "Ann");
    assert_eq!(view.team, 0);

    session.sender().change_team(1);
    let sent: serde_json::Value = serde_json::from_str(&server.next_sent().await.unwrap()).unwrap();
    assert_eq!(
        sent,
        json!({"method": "changeTeam", "params": {"team": 1}, "version": 1})
    );

    server.send_text(state_json(1, 2, vec![vec![], vec![player(1, "Ann")]]));
    let SessionEvent::StateUpdated(view) = wait_for(&mut events, is_state).await else {
        unreachable!()
    };
    assert_eq!(view.room().version, 2);
    assert_eq!(view.player.nickname, "Ann");
    assert_eq!(view.team, 1);
    assert_eq!(session.view().unwrap().team, 1);

    assert_eq!(
        log.params(),
        vec![ConnectParams::new("R1", "Ann", "test-build")]
    );

    assert!(matches!(
        session.shutdown().await,
        Some(SessionOutcome::Closed)
    ));
}

// ════════════════════════════════════════════════════════════════════
// Reconciliation
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn intents_before_first_state_are_not_sent() {
    let (connector, mut servers, _log) = MockConnector::with_connections(1);
    let (mut session, mut events) = GameSession::start(connector, config());

    assert_eq!(next_event(&mut events).await, SessionEvent::Connected);
    session.sender().reveal(0, 0);
    session.sender().end_turn();
    tokio::time::sleep(Duration::from_millis(50)).await;

    servers[0].send_text(state_json(1, 1, vec![vec![player(1, "Ann")]]));
    wait_for(&mut events, is_state).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(servers[0].drain_sent().is_empty());
    session.shutdown().await;
}

#[tokio::test]
async fn dispatch_does_not_change_visible_state() {
    let (connector, mut servers, _log) = MockConnector::with_connections(1);
    let (mut session, mut events) = GameSession::start(connector, config());

    servers[0].send_text(state_json(1, 3, vec![vec![player(1, "Ann")], vec![]]));
    wait_for(&mut events, is_state).await;
    let before = session.view().unwrap();

    let sender = session.sender();
    sender.change_nickname("Zed");
    sender.change_team(1);
    sender.reveal(2, 2);
    for _ in 0..3 {
        assert!(servers[0].next_sent().await.is_some());
    }

    let after = session.view().unwrap();
    assert_eq!(*after, *before);
    assert_eq!(after.player.nickname, "Ann");
    assert_eq!(after.team, 0);

    session.shutdown().await;
}

#[tokio::test]
async fn notes_carry_version_current_at_dispatch() {
    let (connector, mut servers, _log) = MockConnector::with_connections(1);
    let (mut session, mut events) = GameSession::start(connector, config());
    let sender = session.sender();

    for version in [1, 2, 5] {
        servers[0].send_text(state_json(1, version, vec![vec![player(1, "Ann")]]));
        wait_for(&mut events, is_state).await;

        sender.change_turn_time(30);
        let sent: serde_json::Value =
            serde_json::from_str(&servers[0].next_sent().await.unwrap()).unwrap();
        assert_eq!(sent["version"], json!(version));
        assert_eq!(sent["method"], "changeTurnTime");
        assert_eq!(sent["params"], json!({"seconds": 30}));
    }

    session.shutdown().await;
}

#[tokio::test]
async fn observed_versions_are_non_decreasing() {
    let (connector, servers, _log) = MockConnector::with_connections(1);
    let (mut session, mut events) = GameSession::start(connector, config());

    for version in 1..=5 {
        servers[0].send_text(state_json(1, version, vec![vec![player(1, "Ann")]]));
    }

    let mut versions = Vec::new();
    while versions.len() < 5 {
        if let SessionEvent::StateUpdated(view) = wait_for(&mut events, is_state).await {
            versions.push(view.room().version);
        }
    }
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);
    assert!(versions.windows(2).all(|w| w[0] <= w[1]));

    session.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Reconnection
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn session_dead_after_ceiling_closes() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    for server in &servers {
        server.close(None);
    }
    let (dead_count, on_dead) = counter();
    let (session, mut events) = GameSession::start(connector, config().on_dead(on_dead));

    let seen = collect_all(&mut events).await;
    assert_eq!(
        seen,
        vec![
            SessionEvent::Connected,
            SessionEvent::Disconnected {
                code: None,
                reason: None
            },
            SessionEvent::Reconnecting { attempt: 1 },
            SessionEvent::Connected,
            SessionEvent::Disconnected {
                code: None,
                reason: None
            },
            SessionEvent::Dead { attempts: 2 },
        ]
    );
    assert_eq!(log.count(), 2);
    assert_eq!(dead_count.load(Ordering::SeqCst), 1);

    let outcome = session.join().await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Dead { attempts: 2 }));
    assert!(matches!(
        assert_err!(outcome.into_result()),
        SessionError::SessionDead { attempts: 2 }
    ));
}

#[tokio::test]
async fn failed_connects_count_toward_ceiling() {
    let (connector, _servers, log) = MockConnector::with_connections(0);
    let (session, mut events) =
        GameSession::start(connector, config().with_reconnect_ceiling(3));

    let seen = collect_all(&mut events).await;
    assert_eq!(seen.last(), Some(&SessionEvent::Dead { attempts: 3 }));
    assert!(!seen.contains(&SessionEvent::Connected));
    assert_eq!(log.count(), 3);
    assert!(matches!(
        session.join().await,
        Some(SessionOutcome::Dead { attempts: 3 })
    ));
}

#[tokio::test]
async fn received_message_resets_retry_count() {
    let (connector, servers, log) = MockConnector::with_connections(3);
    servers[0].close(None);
    servers[1].send_text(state_json(1, 1, vec![vec![player(1, "Ann")]]));
    servers[1].close(None);
    servers[2].close(None);

    let (session, mut events) = GameSession::start(connector, config());
    let seen = collect_all(&mut events).await;

    let attempts: Vec<u32> = seen
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Reconnecting { attempt } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![1, 1]);
    assert_eq!(seen.last(), Some(&SessionEvent::Dead { attempts: 2 }));
    assert_eq!(log.count(), 3);
    drop(session);
}

#[tokio::test]
async fn transport_error_counts_as_unplanned_close() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    servers[0].push(Frame::Error("connection reset".into()));

    let (mut session, mut events) = GameSession::start(connector, config());

    let event = wait_for(&mut events, |e| matches!(e, SessionEvent::Disconnected { .. })).await;
    match event {
        SessionEvent::Disconnected { code, reason } => {
            assert_eq!(code, None);
            assert!(reason.unwrap().contains("connection reset"));
        }
        other => panic!("expected Disconnected, got {other:?}"),
    }
    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::Reconnecting { attempt: 1 }
    );
    assert_eq!(next_event(&mut events).await, SessionEvent::Connected);
    assert_eq!(log.count(), 2);

    session.shutdown().await;
}

#[tokio::test]
async fn reconnect_reuses_original_nickname_and_resyncs() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    // The player renamed themselves before the drop.
    servers[0].send_text(state_json(1, 4, vec![vec![player(1, "Annie")]]));
    servers[0].close(Some(CloseCode::GoingAway));
    servers[1].send_text(state_json(1, 5, vec![vec![player(1, "Annie")]]));

    let (resyncs, on_resync) = counter();
    let (mut session, mut events) = GameSession::start(connector, config().on_resync(on_resync));

    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::StateUpdated(view) if view.room().version == 5)
    })
    .await;

    let params = log.params();
    assert_eq!(params.len(), 2);
    assert!(params.iter().all(|p| p.nickname == "Ann"));
    assert!(params.iter().all(|p| p.room_id == "R1"));
    assert_eq!(resyncs.load(Ordering::SeqCst), 2);
    assert_eq!(session.view().unwrap().player.nickname, "Annie");

    session.shutdown().await;
}

#[tokio::test]
async fn outdated_build_close_reloads_instead_of_reconnecting() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    servers[0].close(Some(CloseCode::OutdatedBuild));

    let (reloads, on_reload) = counter();
    let (dead_count, on_dead) = counter();
    let (session, mut events) = GameSession::start(
        connector,
        config()
            .with_reconnect_ceiling(5)
            .on_reload(on_reload)
            .on_dead(on_dead),
    );

    let seen = collect_all(&mut events).await;
    assert_eq!(seen.last(), Some(&SessionEvent::ReloadRequired));
    assert!(!seen
        .iter()
        .any(|e| matches!(e, SessionEvent::Reconnecting { .. })));
    assert_eq!(log.count(), 1);
    assert_eq!(reloads.load(Ordering::SeqCst), 1);
    assert_eq!(dead_count.load(Ordering::SeqCst), 0);

    let outcome = session.join().await.unwrap();
    assert!(matches!(
        outcome.into_result(),
        Err(SessionError::OutdatedBuild)
    ));
}

#[tokio::test]
async fn intents_while_disconnected_are_discarded() {
    let (connector, mut servers, _log) = MockConnector::with_connections(2);
    servers[0].send_text(state_json(1, 1, vec![vec![player(1, "Ann")]]));
    servers[0].close(None);

    let config = config().with_reconnect_interval(Duration::from_millis(200));
    let (mut session, mut events) = GameSession::start(connector, config);

    wait_for(&mut events, |e| matches!(e, SessionEvent::Reconnecting { .. })).await;
    session.sender().end_turn();

    wait_for(&mut events, |e| *e == SessionEvent::Connected).await;
    servers[1].send_text(state_json(1, 2, vec![vec![player(1, "Ann")]]));
    wait_for(&mut events, is_state).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(servers[0].drain_sent().is_empty());
    assert!(servers[1].drain_sent().is_empty());

    session.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Teardown
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn shutdown_closes_without_reconnecting() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    servers[0].send_text(state_json(1, 1, vec![vec![player(1, "Ann")]]));

    let (dead_count, on_dead) = counter();
    let (mut session, mut events) = GameSession::start(connector, config().on_dead(on_dead));
    wait_for(&mut events, is_state).await;

    let outcome = session.shutdown().await.unwrap();
    assert_ok!(outcome.into_result());

    let rest = collect_all(&mut events).await;
    assert_eq!(rest, vec![SessionEvent::Closed]);
    assert_eq!(log.count(), 1);
    assert_eq!(dead_count.load(Ordering::SeqCst), 0);
    assert!(!session.is_running());

    // Dispatching after teardown is a silent no-op.
    session.sender().end_turn();
}

#[tokio::test]
async fn shutdown_during_reconnect_wait_stops_retrying() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    servers[0].close(None);

    let config = config().with_reconnect_interval(Duration::from_secs(30));
    let (mut session, mut events) = GameSession::start(connector, config);
    wait_for(&mut events, |e| matches!(e, SessionEvent::Reconnecting { .. })).await;

    assert!(matches!(
        session.shutdown().await,
        Some(SessionOutcome::Closed)
    ));
    assert_eq!(collect_all(&mut events).await, vec![SessionEvent::Closed]);
    assert_eq!(log.count(), 1);
}

// ════════════════════════════════════════════════════════════════════
// Fatal protocol errors
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn malformed_message_is_fatal() {
    let (connector, servers, log) = MockConnector::with_connections(2);
    servers[0].send_text("{this is not json");

    let (session, mut events) = GameSession::start(connector, config());
    let seen = collect_all(&mut events).await;

    assert!(matches!(seen.last(), Some(SessionEvent::Fatal { .. })));
    assert_eq!(log.count(), 1);
    assert!(matches!(
        session.join().await,
        Some(SessionOutcome::Fatal(SessionError::Decode { .. }))
    ));
}

#[tokio::test]
async fn unknown_method_is_fatal() {
    let (connector, servers, _log) = MockConnector::with_connections(1);
    servers[0].send_text(r#"{"method":"chat","params":{"text":"hello"}}"#);

    let (session, mut events) = GameSession::start(connector, config());
    let seen = collect_all(&mut events).await;

    match seen.last() {
        Some(SessionEvent::Fatal { error }) => assert!(error.contains("chat")),
        other => panic!("expected Fatal, got {other:?}"),
    }
    match session.join().await {
        Some(SessionOutcome::Fatal(SessionError::UnhandledMethod { method })) => {
            assert_eq!(method, "chat");
        }
        other => panic!("expected UnhandledMethod, got {other:?}"),
    }
}

#[tokio::test]
async fn state_without_local_player_is_fatal() {
    let (connector, servers, _log) = MockConnector::with_connections(1);
    servers[0].send_text(state_json(9, 1, vec![vec![player(1, "Ann")], vec![player(2, "Bo")]]));

    let (session, mut events) = GameSession::start(connector, config());
    let seen = collect_all(&mut events).await;

    assert!(!seen.iter().any(is_state));
    assert!(session.view().is_none());
    match session.join().await {
        Some(SessionOutcome::Fatal(SessionError::PlayerNotFound { player_id })) => {
            assert_eq!(player_id, pid(9));
        }
        other => panic!("expected PlayerNotFound, got {other:?}"),
    }
}
