//! Prometheus metrics for monitoring the control panel.
//!
//! Recording is always on and costs nothing without an installed recorder.
//! The exporter is only started when `METRICS_BIND` is configured.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mb_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::commands_total("createBot");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use log::debug;
use multibot::{PanelEvent, PanelHandle};
use std::net::SocketAddr;
use tokio::sync::broadcast::{self, error::RecvError};

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// A control surface connected.
pub fn websocket_connected() {
    metrics::gauge!("websocket_connections_active").increment(1.0);
    metrics::counter!("websocket_connections_total").increment(1);
}

/// A control surface went away.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Count one control command by its event name.
pub fn commands_total(kind: &str) {
    metrics::counter!("panel_commands_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Set the number of sessions currently in the registry.
pub fn bot_sessions(count: usize) {
    metrics::gauge!("bot_sessions").set(count as f64);
}

/// Keep the session gauge in step with registry snapshots.
pub fn track_sessions(panel: PanelHandle) -> tokio::task::JoinHandle<()> {
    let events = panel.subscribe();
    tokio::spawn(follow_session_count(panel, events, bot_sessions))
}

/// Report every session count change until the panel stops. A lagged
/// receiver recovers the count from a fresh snapshot.
async fn follow_session_count(
    panel: PanelHandle,
    mut events: broadcast::Receiver<PanelEvent>,
    mut report: impl FnMut(usize),
) {
    loop {
        match events.recv().await {
            Ok(PanelEvent::SessionsChanged(sessions)) => report(sessions.len()),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!("Session gauge lagged by {} event(s)", skipped);
                match panel.resubscribe(&mut events).await {
                    Ok(snapshot) => report(snapshot.sessions.len()),
                    Err(_) => break,
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multibot::{
        AccountStore, EventFanout, LoopbackConnector, NewServer, PanelActor, ServerCatalog,
    };
    use std::sync::{Arc, Mutex};

    fn new_server(port: u16) -> NewServer {
        NewServer {
            name: format!("s{port}"),
            host: "localhost".to_string(),
            port,
            protocol_version: "1.21.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_session_count_recovers_after_lag() {
        let mut catalog = ServerCatalog::new();
        catalog.add(new_server(25565));
        let (actor, panel) = PanelActor::new(
            Arc::new(LoopbackConnector::new()),
            catalog,
            AccountStore::new(),
            EventFanout::new(2),
        );
        tokio::spawn(actor.run());
        let events = panel.subscribe();

        // Overflow the buffer before the follower starts reading
        panel.create_session("Steve", 1).await.unwrap();
        panel.create_session("Alex", 1).await.unwrap();
        for port in 1..=4 {
            panel.add_server(new_server(port)).await.unwrap();
        }

        let counts = Arc::new(Mutex::new(Vec::new()));
        let recorded = counts.clone();
        tokio::spawn(follow_session_count(panel.clone(), events, move |n| {
            recorded.lock().unwrap().push(n)
        }));

        for _ in 0..50 {
            if !counts.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let counts = counts.lock().unwrap();
        assert_eq!(counts.first(), Some(&2));
    }
}
