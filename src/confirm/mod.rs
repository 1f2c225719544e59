//! Two-phase confirmation gate
//!
//! Owns the pending-token state machine and the session whitelist that
//! together guarantee a human approves every risky operation before it
//! reaches the engine.

mod gateway;
mod whitelist;

pub use gateway::{
    ConfirmationGateway, ConfirmationOutcome, ConfirmationPrompt, PendingConfirmation,
    ValidationOutcome,
};
pub use whitelist::{SessionWhitelist, WhitelistStatus};
