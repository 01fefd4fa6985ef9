//! In-process adapter with no network behind it.
//!
//! Every session goes online immediately and each outbound chat line comes
//! back as an inbound message from the bot itself. Useful for running the
//! panel without a game server and for tests.

use super::{
    AdapterEvent, AdapterEventKind, AdapterEventSender, BotConnection, BotConnector,
    ChannelConnection, ConnectRequest, OUTBOUND_CAPACITY, Outbound, spawn_task,
};
use crate::errors::PanelResult;
use tokio::sync::mpsc;

/// Loopback adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackConnector;

impl LoopbackConnector {
    pub fn new() -> Self {
        Self
    }
}

impl BotConnector for LoopbackConnector {
    fn connect(
        &self,
        request: ConnectRequest,
        events: AdapterEventSender,
    ) -> PanelResult<Box<dyn BotConnection>> {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let task = spawn_task(run(request, events, outbound_rx))?;
        Ok(Box::new(ChannelConnection::new(outbound_tx, vec![task])))
    }
}

async fn run(
    request: ConnectRequest,
    events: AdapterEventSender,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    let id = request.session_id;
    log::debug!(
        "Loopback bot #{} '{}' attached to {}",
        id,
        request.username,
        request.server.name
    );

    for kind in [AdapterEventKind::Online, AdapterEventKind::Spawned] {
        if events.send(AdapterEvent::new(id, kind)).await.is_err() {
            return;
        }
    }

    while let Some(message) = outbound.recv().await {
        match message {
            Outbound::Chat(text) => {
                let echo = AdapterEventKind::Message {
                    from: request.username.clone(),
                    text,
                };
                if events.send(AdapterEvent::new(id, echo)).await.is_err() {
                    return;
                }
            }
            Outbound::Quit => break,
        }
    }

    let _ = events
        .send(AdapterEvent::new(id, AdapterEventKind::Disconnected))
        .await;
}
