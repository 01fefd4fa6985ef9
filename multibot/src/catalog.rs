//! Server catalog: the remote endpoints bots may be attached to.
//!
//! The catalog is append-only. Entries are never updated or removed, so a
//! `ServerId` held by a session keeps resolving for the life of the process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server ID type
pub type ServerId = u64;

/// A remote endpoint definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub id: ServerId,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
}

/// Fields for a server that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServer {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(rename = "version")]
    pub protocol_version: String,
}

impl NewServer {
    fn into_config(self, id: ServerId) -> ServerConfig {
        ServerConfig {
            id,
            name: self.name,
            host: self.host,
            port: self.port,
            protocol_version: self.protocol_version,
        }
    }
}

/// Keyed collection of configured servers
#[derive(Debug)]
pub struct ServerCatalog {
    servers: BTreeMap<ServerId, ServerConfig>,
    next_server_id: ServerId,
}

impl ServerCatalog {
    pub fn new() -> Self {
        Self {
            servers: BTreeMap::new(),
            next_server_id: 1,
        }
    }

    /// Add a server. Always succeeds with a fresh id.
    pub fn add(&mut self, server: NewServer) -> ServerConfig {
        let id = self.next_server_id;
        self.next_server_id += 1;

        let config = server.into_config(id);
        self.servers.insert(id, config.clone());
        config
    }

    pub fn get(&self, id: ServerId) -> Option<&ServerConfig> {
        self.servers.get(&id)
    }

    /// All servers ordered by id
    pub fn list(&self) -> Vec<ServerConfig> {
        self.servers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl Default for ServerCatalog {
    fn default() -> Self {
        Self::new()
    }
}
