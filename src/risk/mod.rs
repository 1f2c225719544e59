//! Risk classification for engine commands
//!
//! Maps raw command strings to risk tiers that drive the confirmation
//! gate: blocked commands are rejected outright, safe commands flow
//! without friction, and everything in between requires a human approval.

mod classifier;
mod tier;

pub use classifier::{Classification, Classifier, RiskRule};
pub use tier::RiskTier;
