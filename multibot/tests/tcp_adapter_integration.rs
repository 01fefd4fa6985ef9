//! Integration tests for the TCP adapter.
//!
//! Each test runs a scripted game server on a loopback port and drives a bot
//! through the panel actor.

use multibot::{
    AccountStore, EventFanout, LogKind, NewServer, PanelActor, PanelEvent, PanelHandle,
    ServerCatalog, SessionId, SessionStatus, TcpConnector,
    net::{ClientFrame, ServerFrame, read_prefixed, write_prefixed},
};
use std::{sync::Arc, time::Duration};
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream},
    sync::broadcast,
    time::timeout,
};

const WAIT: Duration = Duration::from_secs(5);

/// Helper to start a panel with the TCP adapter and one server on `port`
async fn setup_panel(port: u16) -> PanelHandle {
    let (actor, handle) = PanelActor::new(
        Arc::new(TcpConnector::new()),
        ServerCatalog::new(),
        AccountStore::new(),
        EventFanout::new(256),
    );
    tokio::spawn(actor.run());

    handle
        .add_server(NewServer {
            name: "Local".to_string(),
            host: "127.0.0.1".to_string(),
            port,
            protocol_version: "1.21.1".to_string(),
        })
        .await
        .expect("panel running");
    handle
}

/// Helper to accept one bot and complete its login
async fn accept_bot(listener: &TcpListener, expected_username: &str) -> TcpStream {
    let (mut stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("bot never connected")
        .expect("accept failed");

    let login: ClientFrame = read_prefixed(&mut stream).await.expect("login frame");
    assert_eq!(
        login,
        ClientFrame::Login {
            username: expected_username.to_string(),
            protocol_version: "1.21.1".to_string(),
        }
    );
    stream
}

/// Helper to wait until a session reaches `status`
async fn wait_for_status(
    rx: &mut broadcast::Receiver<PanelEvent>,
    id: SessionId,
    status: SessionStatus,
) {
    timeout(WAIT, async {
        loop {
            if let PanelEvent::SessionsChanged(sessions) = rx.recv().await.expect("fanout open")
                && sessions.iter().any(|s| s.id == id && s.status == status)
            {
                return;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("bot #{id} never reached {status}"));
}

/// Helper to wait for the next chat/log line matching `predicate`
async fn wait_for_line(
    rx: &mut broadcast::Receiver<PanelEvent>,
    predicate: impl Fn(&multibot::ChatRecord) -> bool,
) -> multibot::ChatRecord {
    timeout(WAIT, async {
        loop {
            if let PanelEvent::ChatOrLog(record) = rx.recv().await.expect("fanout open")
                && predicate(&record)
            {
                return record;
            }
        }
    })
    .await
    .expect("line never arrived")
}

#[tokio::test]
async fn test_login_chat_and_kick() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;

    write_prefixed(&mut server, &ServerFrame::Welcome).await.unwrap();
    wait_for_status(&mut rx, id, SessionStatus::Online).await;

    write_prefixed(
        &mut server,
        &ServerFrame::Chat {
            sender: Some("Alex".to_string()),
            text: "hi".to_string(),
        },
    )
    .await
    .unwrap();
    let record = wait_for_line(&mut rx, |r| r.kind == LogKind::Chat).await;
    assert_eq!(record.from.as_deref(), Some("Alex"));
    assert_eq!(record.text, "hi");
    assert_eq!(record.session_id, Some(id));

    panel.relay_chat(id, "  hello  ").await.unwrap();
    let chat: ClientFrame = timeout(WAIT, read_prefixed(&mut server))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        chat,
        ClientFrame::Chat {
            text: "hello".to_string()
        }
    );

    write_prefixed(
        &mut server,
        &ServerFrame::Kick {
            reason: "bye".to_string(),
        },
    )
    .await
    .unwrap();
    wait_for_status(&mut rx, id, SessionStatus::Kicked).await;
    let line = wait_for_line(&mut rx, |r| r.kind == LogKind::Error).await;
    assert_eq!(line.text, "[Steve] Kicked: bye");

    // The connection is gone, so chat is now dropped.
    assert!(panel.relay_chat(id, "still there?").await.is_err());
}

#[tokio::test]
async fn test_server_announcement_comes_from_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;
    write_prefixed(&mut server, &ServerFrame::Welcome).await.unwrap();
    write_prefixed(
        &mut server,
        &ServerFrame::System {
            text: "restart soon".to_string(),
        },
    )
    .await
    .unwrap();

    wait_for_status(&mut rx, id, SessionStatus::Online).await;
    let record = wait_for_line(&mut rx, |r| r.kind == LogKind::Chat).await;
    assert_eq!(record.from.as_deref(), Some("Server"));
    assert_eq!(record.text, "restart soon");
}

#[tokio::test]
async fn test_spawn_is_announced_without_status_change() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;
    write_prefixed(&mut server, &ServerFrame::Welcome).await.unwrap();
    write_prefixed(&mut server, &ServerFrame::Spawned).await.unwrap();

    wait_for_status(&mut rx, id, SessionStatus::Online).await;
    let record = wait_for_line(&mut rx, |r| r.text.contains("Spawned")).await;
    assert_eq!(record.text, "[Steve] Spawned in world");
    assert_eq!(record.kind, LogKind::System);
    assert_eq!(record.session_id, Some(id));

    let snapshot = panel.snapshot().await.unwrap();
    assert_eq!(snapshot.sessions[0].status, SessionStatus::Online);
}

#[tokio::test]
async fn test_server_close_disconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;
    write_prefixed(&mut server, &ServerFrame::Welcome).await.unwrap();
    wait_for_status(&mut rx, id, SessionStatus::Online).await;

    drop(server);
    wait_for_status(&mut rx, id, SessionStatus::Disconnected).await;
    let line = wait_for_line(&mut rx, |r| r.text.ends_with("Disconnected")).await;
    assert_eq!(line.session_id, Some(id));
    assert_eq!(line.kind, LogKind::System);
}

#[tokio::test]
async fn test_kick_during_login_is_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;
    write_prefixed(
        &mut server,
        &ServerFrame::Kick {
            reason: "outdated client".to_string(),
        },
    )
    .await
    .unwrap();

    wait_for_status(&mut rx, id, SessionStatus::Error).await;
}

#[tokio::test]
async fn test_unreachable_server_is_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    // Creation succeeds; the failure is reported asynchronously.
    let id = panel.create_session("Steve", 1).await.unwrap();
    wait_for_status(&mut rx, id, SessionStatus::Error).await;

    let snapshot = panel.snapshot().await.unwrap();
    assert_eq!(snapshot.sessions[0].status, SessionStatus::Error);
}

#[tokio::test]
async fn test_destroy_sends_quit() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;
    write_prefixed(&mut server, &ServerFrame::Welcome).await.unwrap();
    wait_for_status(&mut rx, id, SessionStatus::Online).await;

    assert!(panel.destroy_session(id).await.unwrap());
    let quit: ClientFrame = timeout(WAIT, read_prefixed(&mut server))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(quit, ClientFrame::Quit);
    assert!(panel.snapshot().await.unwrap().sessions.is_empty());
}

#[tokio::test]
async fn test_destroy_during_login_releases_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;

    let id = panel.create_session("Steve", 1).await.unwrap();
    // The server takes the login but never answers it.
    let mut server = accept_bot(&listener, "Steve").await;

    assert!(panel.destroy_session(id).await.unwrap());
    assert!(panel.snapshot().await.unwrap().sessions.is_empty());

    let mut buf = [0u8; 64];
    let read = timeout(WAIT, server.read(&mut buf))
        .await
        .expect("socket still open after destroy");
    assert_eq!(read.unwrap_or(0), 0);
}

#[tokio::test]
async fn test_chat_queued_while_connecting_is_sent_after_welcome() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let panel = setup_panel(port).await;
    let mut rx = panel.subscribe();

    let id = panel.create_session("Steve", 1).await.unwrap();
    let mut server = accept_bot(&listener, "Steve").await;
    panel.relay_chat(id, "early").await.unwrap();

    write_prefixed(&mut server, &ServerFrame::Welcome).await.unwrap();
    wait_for_status(&mut rx, id, SessionStatus::Online).await;

    let chat: ClientFrame = timeout(WAIT, read_prefixed(&mut server))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        chat,
        ClientFrame::Chat {
            text: "early".to_string()
        }
    );
}
