//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use multibot::NewServer;
use std::{fmt, net::SocketAddr, str::FromStr};

/// Default bind address when neither `SERVER_BIND` nor `PORT` is set
const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Which bot client adapter new sessions use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Real game servers over TCP
    Tcp,
    /// In-process echo adapter, no network
    Loopback,
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "loopback" => Ok(Self::Loopback),
            other => Err(format!("unknown adapter '{other}' (expected tcp or loopback)")),
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Loopback => write!(f, "loopback"),
        }
    }
}

/// Complete panel configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// HTTP bind address
    pub bind: SocketAddr,
    /// Security configuration
    pub security: SecurityConfig,
    /// Server seeded into the catalog as id 1
    pub default_server: NewServer,
    /// Adapter used for every bot
    pub adapter: AdapterKind,
    /// Broadcast buffer per control surface
    pub fanout_capacity: usize,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Seeded admin account name
    pub admin_username: String,
    /// Seeded admin account password (required)
    pub admin_password: String,
    /// Reject privileged commands from non-admins instead of only logging them
    pub enforce_admin_commands: bool,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .field("enforce_admin_commands", &self.enforce_admin_commands)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl PanelConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `adapter_override` - Optional adapter override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        adapter_override: Option<AdapterKind>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), bind_override, adapter_override)
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        bind_override: Option<SocketAddr>,
        adapter_override: Option<AdapterKind>,
    ) -> Result<Self, ConfigError> {
        // Bind address
        let bind = match bind_override {
            Some(bind) => bind,
            None => match (lookup("SERVER_BIND"), lookup("PORT")) {
                (Some(bind), _) => parse_var("SERVER_BIND", &bind)?,
                (None, Some(port)) => {
                    let port: u16 = parse_var("PORT", &port)?;
                    SocketAddr::from(([0, 0, 0, 0], port))
                }
                (None, None) => parse_var("SERVER_BIND", DEFAULT_BIND)?,
            },
        };

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let admin_password =
            lookup("ADMIN_PASSWORD").ok_or_else(|| ConfigError::MissingRequired {
                var: "ADMIN_PASSWORD".to_string(),
                hint: "Password for the seeded admin account".to_string(),
            })?;

        // Validate security params
        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        let security = SecurityConfig {
            jwt_secret,
            password_pepper,
            admin_username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_password,
            enforce_admin_commands: parse_or(&lookup, "ENFORCE_ADMIN_COMMANDS", false)?,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        };

        let default_server = NewServer {
            name: lookup("DEFAULT_SERVER_NAME").unwrap_or_else(|| "Default".to_string()),
            host: lookup("DEFAULT_SERVER_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(&lookup, "DEFAULT_SERVER_PORT", 25565)?,
            protocol_version: lookup("DEFAULT_SERVER_VERSION")
                .unwrap_or_else(|| "1.21.1".to_string()),
        };

        let adapter = match adapter_override {
            Some(adapter) => adapter,
            None => parse_or(&lookup, "BOT_ADAPTER", AdapterKind::Tcp)?,
        };

        let metrics_bind = match lookup("METRICS_BIND") {
            Some(addr) => Some(parse_var("METRICS_BIND", &addr)?),
            None => None,
        };

        Ok(PanelConfig {
            bind,
            security,
            default_server,
            adapter,
            fanout_capacity: parse_or(
                &lookup,
                "FANOUT_CAPACITY",
                multibot::fanout::DEFAULT_CAPACITY,
            )?,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fanout_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "FANOUT_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.security.admin_username.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "ADMIN_USERNAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.security.admin_password.is_empty() {
            return Err(ConfigError::Invalid {
                var: "ADMIN_PASSWORD".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.default_server.port == 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_SERVER_PORT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable value, naming the variable on failure
fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: e.to_string(),
    })
}

/// Helper to parse an optional variable with default fallback
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(value) => parse_var(key, &value),
        None => Ok(default),
    }
}
