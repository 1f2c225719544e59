//! EngineGate - Risk-gated command gateway for live engine processes
//!
//! EngineGate lets an AI agent drive a live, stateful engine process
//! through short-lived, single-connection remote commands, some of which
//! are destructive or irreversible. It owns the trust and transport
//! boundary between the agent and the engine: a fragile JSON
//! request/response protocol over a connection the engine closes after
//! every exchange, and a risk-tiered confirmation gate that guarantees a
//! human approves any operation capable of losing work, corrupting state,
//! or executing arbitrary code.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Calling tools                          │
//! └──────────────────────────────┬─────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼─────────────────────────────┐
//! │                      CommandGateway                         │
//! │  ┌────────────────┐  classify  ┌─────────────────────────┐ │
//! │  │ RiskClassifier ├───────────▶│  blocked │ safe │ gated  │ │
//! │  └────────────────┘            └────┬─────────┬─────┬────┘ │
//! │                                reject     send    confirm   │
//! │  ┌─────────────────────┐  ┌──────────────────┐      │      │
//! │  │  SessionWhitelist   │◀─┤ Confirmation     │◀─────┘      │
//! │  │  (pre-approvals)    │  │ Gateway (tokens) │             │
//! │  └─────────────────────┘  └──────────────────┘             │
//! └──────────────────────────────┬─────────────────────────────┘
//!                                │ one TCP connection per command
//! ┌──────────────────────────────▼─────────────────────────────┐
//! │                    Engine process (external)                │
//! │      closes its end of the connection after each exchange   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`risk`]: ordered-table risk classification of raw command strings
//! - [`confirm`]: token-based two-phase approval and the session whitelist
//! - [`transport`]: reconnect-per-call TCP client and wire protocol
//! - [`gateway`]: the dispatch façade tying the pieces together
//! - [`config`]: configuration management

pub mod config;
pub mod confirm;
pub mod error;
pub mod gateway;
pub mod risk;
pub mod transport;

pub use config::EngineGateConfig;
pub use error::{Error, Result};
pub use gateway::{CommandGateway, CommandRequest, Dispatch};
