//! Engine transport
//!
//! Reconnect-per-call TCP client and wire protocol types for talking to
//! the engine's command port. The engine closes its end of the connection
//! after every exchange, so each command opens a fresh socket and the
//! client is stateless between calls by construction.

mod client;
mod protocol;

use async_trait::async_trait;

pub use client::EngineClient;
pub use protocol::{payload_preview, EngineCommand, EngineResponse};

/// Object-safe seam over the engine transport.
///
/// Lets the gateway be driven against a test double without a live
/// engine process.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one command and return the normalized response.
    ///
    /// Never fails with a raw error: every transport failure is converted
    /// to a normalized error response at this boundary.
    async fn send_command(&self, command_type: &str, params: serde_json::Value) -> EngineResponse;
}
