//! Frames exchanged between a bot and a game server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A frame from a bot to the game server
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ClientFrame {
    /// First frame on every connection
    Login {
        username: String,
        protocol_version: String,
    },
    /// Say something in chat
    Chat { text: String },
    /// Courtesy notice before closing the socket
    Quit,
}

/// A frame from the game server to a bot
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ServerFrame {
    /// Login accepted
    Welcome,
    /// The bot's player entered the world
    Spawned,
    /// Player chat; `sender` is `None` for server-authored lines
    Chat {
        sender: Option<String>,
        text: String,
    },
    /// Server announcement
    System { text: String },
    /// The bot is being removed
    Kick { reason: String },
}

impl fmt::Display for ServerFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome => write!(f, "welcome"),
            Self::Spawned => write!(f, "spawned"),
            Self::Chat {
                sender: Some(sender),
                text,
            } => write!(f, "<{sender}> {text}"),
            Self::Chat { sender: None, text } => write!(f, "{text}"),
            Self::System { text } => write!(f, "[system] {text}"),
            Self::Kick { reason } => write!(f, "kick: {reason}"),
        }
    }
}
