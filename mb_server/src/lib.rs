//! Web control panel for the multibot core.
//!
//! [`start_panel`] seeds the admin account and default server, spawns the
//! panel actor and returns the state the HTTP router runs on.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

use std::sync::Arc;

use multibot::{
    Account, AccountStore, BotConnector, Credentials, EventFanout, LoopbackConnector, PanelActor,
    Role, ServerCatalog, TcpConnector, accounts::AuthResult,
};

use api::{AppState, SurfaceOptions};
use config::{AdapterKind, PanelConfig};

/// Build the panel from configuration and spawn its actor.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Fails only if the admin password cannot be hashed.
pub fn start_panel(config: &PanelConfig) -> AuthResult<AppState> {
    let security = &config.security;
    let credentials = Credentials::new(
        security.password_pepper.clone(),
        security.jwt_secret.clone(),
    );

    let admin = Account {
        username: security.admin_username.trim().to_string(),
        secret_hash: credentials.hash_secret(&security.admin_password)?,
        role: Role::Admin,
    };
    let accounts = AccountStore::seeded(admin);

    let mut catalog = ServerCatalog::new();
    let default_server = catalog.add(config.default_server.clone());
    log::info!(
        "Default server #{} '{}' at {}:{} (version {})",
        default_server.id,
        default_server.name,
        default_server.host,
        default_server.port,
        default_server.protocol_version
    );

    let connector: Arc<dyn BotConnector> = match config.adapter {
        AdapterKind::Tcp => Arc::new(TcpConnector::new()),
        AdapterKind::Loopback => Arc::new(LoopbackConnector::new()),
    };
    log::info!("Using {} bot adapter", config.adapter);

    let fanout = EventFanout::new(config.fanout_capacity);
    let (actor, panel) = PanelActor::new(connector, catalog, accounts, fanout);
    tokio::spawn(actor.run());
    metrics::track_sessions(panel.clone());

    Ok(AppState {
        panel,
        credentials: Arc::new(credentials),
        options: SurfaceOptions {
            enforce_admin_commands: security.enforce_admin_commands,
            cookie_secure: security.cookie_secure,
        },
    })
}
