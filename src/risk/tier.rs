//! Risk tier ordering and gating rules

use serde::{Deserialize, Serialize};

/// Risk tier of an engine command.
///
/// Total order: `Blocked` > `Critical`/`High` (never whitelistable) >
/// `Medium`/`Low` (whitelistable) > `Safe` (ungated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Always rejected, no confirmation offered
    Blocked,
    /// Requires confirmation, never whitelistable
    Critical,
    /// Requires confirmation, never whitelistable
    High,
    /// Requires confirmation, whitelistable for the session
    Medium,
    /// Requires confirmation, whitelistable for the session
    Low,
    /// Executes without any gate
    Safe,
}

impl RiskTier {
    /// Whether a human approval is required before execution
    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, RiskTier::Safe | RiskTier::Blocked)
    }

    /// Whether an approval for this tier may be remembered for the session.
    ///
    /// Critical and high tiers must be re-approved on every invocation,
    /// regardless of what the caller asks for.
    pub fn can_whitelist(&self) -> bool {
        matches!(self, RiskTier::Medium | RiskTier::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Blocked => "blocked",
            RiskTier::Critical => "critical",
            RiskTier::High => "high",
            RiskTier::Medium => "medium",
            RiskTier::Low => "low",
            RiskTier::Safe => "safe",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelistable_tiers() {
        assert!(RiskTier::Medium.can_whitelist());
        assert!(RiskTier::Low.can_whitelist());
        assert!(!RiskTier::High.can_whitelist());
        assert!(!RiskTier::Critical.can_whitelist());
        assert!(!RiskTier::Blocked.can_whitelist());
        assert!(!RiskTier::Safe.can_whitelist());
    }

    #[test]
    fn test_confirmation_required() {
        assert!(RiskTier::Critical.requires_confirmation());
        assert!(RiskTier::High.requires_confirmation());
        assert!(RiskTier::Medium.requires_confirmation());
        assert!(RiskTier::Low.requires_confirmation());
        assert!(!RiskTier::Safe.requires_confirmation());
        assert!(!RiskTier::Blocked.requires_confirmation());
    }

    #[test]
    fn test_tier_serialization() {
        let json = serde_json::to_string(&RiskTier::High).unwrap();
        assert_eq!(json, "\"high\"");
        let parsed: RiskTier = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(parsed, RiskTier::Blocked);
    }
}
