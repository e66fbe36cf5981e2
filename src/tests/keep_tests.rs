use super::support::{Call, MockConnection, StaticInterfaces};
use crate::igd::PortMappingProtocol;
use crate::keep::*;
use crate::router::{MappingOperation, RouterClient, RouterError};

fn router_for(conn: &MockConnection) -> RouterClient {
    RouterClient::with_interfaces(conn.boxed(), StaticInterfaces::single("192.168.1.50", 24))
}

#[test]
fn test_new_session_is_idle() {
    let conn = MockConnection::router();
    let session = KeepSession::new(router_for(&conn), 8080);

    assert_eq!(session.state(), KeepState::Idle);
    assert_eq!(session.port(), 8080);
    assert!(conn.calls().is_empty());
}

#[tokio::test]
async fn test_start_forwards_port() {
    let conn = MockConnection::router();
    let session = KeepSession::start(router_for(&conn), 8080, "kept").await.unwrap();

    assert_eq!(session.state(), KeepState::Forwarded);
    let calls = conn.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| matches!(call, Call::Add(request) if request.description == "kept")));
}

#[tokio::test]
async fn test_start_failure_returns_error() {
    let conn = MockConnection::router().failing_add(PortMappingProtocol::UDP);
    let result = KeepSession::start(router_for(&conn), 8080, "kept").await;

    assert!(matches!(
        result,
        Err(RouterError::RemoteMapping {
            operation: MappingOperation::Add,
            protocol: PortMappingProtocol::UDP,
            ..
        })
    ));
}

#[tokio::test]
async fn test_hold_clears_after_shutdown() {
    let conn = MockConnection::router();
    let mut session = KeepSession::start(router_for(&conn), 8080, "kept").await.unwrap();

    let (signal, cleared) = session.hold(async { "SIGTERM" }).await;

    assert_eq!(signal, "SIGTERM");
    assert!(cleared.is_ok());
    assert_eq!(session.state(), KeepState::Cleared);

    let deletes: Vec<_> = conn
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Delete { port, protocol, .. } => Some((port, protocol)),
            _ => None,
        })
        .collect();
    assert_eq!(
        deletes,
        vec![(8080, PortMappingProtocol::TCP), (8080, PortMappingProtocol::UDP)]
    );
}

#[tokio::test]
async fn test_hold_waits_for_shutdown() {
    let conn = MockConnection::router();
    let mut session = KeepSession::start(router_for(&conn), 8080, "kept").await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let watcher = conn.clone();
    let sender = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        // Nothing is cleared while the session is held
        let cleared_early = watcher.calls().iter().any(|call| matches!(call, Call::Delete { .. }));
        let _ = tx.send(());
        cleared_early
    });

    let (_, cleared) = session.hold(rx).await;
    assert!(cleared.is_ok());
    assert!(!sender.await.unwrap(), "Port was cleared before shutdown");
    assert_eq!(conn.calls().len(), 4);
    assert_eq!(session.exit(), KeepState::Exited);
}

#[tokio::test]
async fn test_hold_clear_failure_still_exits() {
    let conn = MockConnection::router().failing_delete(PortMappingProtocol::TCP);
    let mut session = KeepSession::start(router_for(&conn), 8080, "kept").await.unwrap();

    let (_, cleared) = session.hold(async {}).await;

    assert!(matches!(
        cleared,
        Err(RouterError::RemoteMapping {
            operation: MappingOperation::Delete,
            ..
        })
    ));
    // Still forwarded after the failed clear, but the session can end
    assert_eq!(session.state(), KeepState::Forwarded);
    assert_eq!(session.exit(), KeepState::Exited);
    // Add TCP, add UDP, failed delete TCP; no retry
    assert_eq!(conn.calls().len(), 3);
}

#[tokio::test]
async fn test_hold_idle_session_skips_clear() {
    let conn = MockConnection::router();
    let mut session = KeepSession::new(router_for(&conn), 8080);

    let (_, cleared) = session.hold(async {}).await;

    assert!(cleared.is_ok());
    assert_eq!(session.state(), KeepState::Idle);
    assert_eq!(session.exit(), KeepState::Exited);
    assert!(conn.calls().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_signal_raised_before_recv_is_delivered() {
    let mut signals = ShutdownSignal::register().unwrap();

    // Raised while nothing is waiting, as happens during the forward calls
    let pid = std::process::id().to_string();
    let status = std::process::Command::new("kill")
        .args(["-TERM", pid.as_str()])
        .status()
        .unwrap();
    assert!(status.success());

    let name = tokio::time::timeout(std::time::Duration::from_secs(5), signals.recv())
        .await
        .expect("Queued signal should be delivered");
    assert_eq!(name, "SIGTERM");
}
