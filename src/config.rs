//! EngineGate configuration management

use serde::{Deserialize, Serialize};

/// Main EngineGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineGateConfig {
    /// Engine connection configuration
    pub engine: EngineConfig,

    /// Security gate configuration
    pub security: SecurityConfig,
}

/// Engine connection configuration
///
/// The engine listens on a fixed loopback endpoint and closes its end of
/// the connection after every exchange, so there is nothing to pool or
/// keep alive between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine host
    pub host: String,

    /// Engine command port
    pub port: u16,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Per-read timeout in seconds while waiting for a response
    pub read_timeout_secs: u64,

    /// Socket send/receive buffer size in bytes
    pub buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 55557,
            connect_timeout_secs: 5,
            read_timeout_secs: 5,
            buffer_size: 65536,
        }
    }
}

/// Security gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Confirmation token lifetime in seconds
    pub token_ttl_secs: u64,

    /// Patterns that are always rejected, no confirmation offered
    pub blocked_patterns: Vec<String>,

    /// Patterns requiring confirmation, never whitelistable
    pub high_patterns: Vec<String>,

    /// Patterns requiring confirmation, whitelistable for the session
    pub medium_patterns: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 60,
            blocked_patterns: default_blocked_patterns(),
            high_patterns: default_high_patterns(),
            medium_patterns: default_medium_patterns(),
        }
    }
}

/// Commands that can destroy data outside the engine's own undo horizon.
pub fn default_blocked_patterns() -> Vec<String> {
    ["rm ", "del ", "shutdown", "restart", "reboot", "format "]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Commands that can end the process, load arbitrary content, or execute
/// arbitrary code. Confirmable but never remembered for the session.
pub fn default_high_patterns() -> Vec<String> {
    [
        "quit",
        "exit",
        "open ",
        "servertravel",
        "exec ",
        "run ",
        "py ",
        "python ",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Disruptive but recoverable commands. Confirmable and whitelistable.
pub fn default_medium_patterns() -> Vec<String> {
    [
        "restartlevel",
        "disconnect",
        "reconnect",
        "killall",
        "destroyall",
        "slomo ",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
