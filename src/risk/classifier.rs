//! Ordered-table risk classifier

use super::RiskTier;
use crate::config::SecurityConfig;
use crate::error::{Error, Result};

/// Classification result for a raw command string
#[derive(Debug, Clone)]
pub struct Classification {
    /// Risk tier of the command
    pub tier: RiskTier,
    /// First whitespace-delimited token of the command.
    ///
    /// All invocations sharing a verb bind to the same whitelist and token
    /// identity regardless of arguments, so one approval covers the class
    /// of command (`killall enemy` and `killall friendly` share an entry).
    pub operation_key: String,
    /// The table pattern that matched, if any
    pub matched_pattern: Option<String>,
}

/// A single rule in the classification tables
#[derive(Debug, Clone)]
pub struct RiskRule {
    /// Substring pattern, matched against the lowercased, trimmed command
    pub pattern: String,
    /// Tier assigned on match
    pub tier: RiskTier,
}

/// Risk classifier over ordered pattern tables.
///
/// Rules are scanned in fixed priority order (blocked, then high, then
/// medium) and the first match wins, so a command matching both a blocked
/// and a medium pattern resolves blocked. No match means safe.
pub struct Classifier {
    rules: Vec<RiskRule>,
}

impl Classifier {
    /// Build a classifier from the configured tables.
    ///
    /// Table priority is fixed here and does not depend on config ordering.
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let tables = [
            (&config.blocked_patterns, RiskTier::Blocked),
            (&config.high_patterns, RiskTier::High),
            (&config.medium_patterns, RiskTier::Medium),
        ];

        let mut rules = Vec::new();
        for (patterns, tier) in tables {
            for pattern in patterns {
                if pattern.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "Empty pattern in {} risk table",
                        tier
                    )));
                }
                rules.push(RiskRule {
                    pattern: pattern.to_lowercase(),
                    tier,
                });
            }
        }

        Ok(Self { rules })
    }

    /// Classify a raw command string.
    ///
    /// An empty command is safe and never gated.
    pub fn classify(&self, raw: &str) -> Classification {
        let command = raw.trim().to_lowercase();

        let operation_key = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        if command.is_empty() {
            return Classification {
                tier: RiskTier::Safe,
                operation_key,
                matched_pattern: None,
            };
        }

        for rule in &self.rules {
            if command.contains(&rule.pattern) {
                return Classification {
                    tier: rule.tier,
                    operation_key,
                    matched_pattern: Some(rule.pattern.clone()),
                };
            }
        }

        Classification {
            tier: RiskTier::Safe,
            operation_key,
            matched_pattern: None,
        }
    }
}
