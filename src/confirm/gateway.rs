//! Token-based two-phase approval state machine

use super::SessionWhitelist;
use crate::risk::RiskTier;
use rand::RngCore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A pending operation awaiting human approval.
///
/// Lifecycle per token: `none → pending → consumed | expired`. There is no
/// way back to pending; a failed validation consumes the token and the
/// caller must start a fresh confirmation cycle.
#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    /// Single-use approval token, 32 hex chars
    pub token: String,
    /// Tool that requested the operation
    pub tool_name: String,
    /// Identity the approval binds to (command verb, not full arguments)
    pub operation_key: String,
    /// Opaque operation payload, kept for display and logging
    pub operation_data: serde_json::Value,
    /// Risk tier the operation was classified at
    pub risk: RiskTier,
    /// Whether the requester allows a session whitelist on approval
    pub allow_whitelist: bool,
    /// Creation timestamp (UTC millis)
    pub created_at: i64,
    /// Expiry timestamp (UTC millis)
    pub expires_at: i64,
}

/// Prompt returned when an operation needs a human decision
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationPrompt {
    /// Always true; present for API consumers that switch on it
    pub requires_confirmation: bool,
    /// Token to echo back through the validation call
    pub confirmation_token: String,
    /// Risk tier driving the prompt
    pub risk_level: RiskTier,
    /// Human-readable description of the operation
    pub message: String,
    /// Human-readable consequence of approving
    pub effect: String,
    /// Seconds until the token expires
    pub token_expires_in_seconds: u64,
    /// Whether "remember for session" may be offered
    pub can_whitelist: bool,
}

/// Result of a confirmation request
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ConfirmationOutcome {
    /// The operation was pre-approved this session; execute immediately
    Whitelisted {
        whitelisted: bool,
        execute: bool,
    },
    /// A human must approve; a fresh token has been minted
    Pending(ConfirmationPrompt),
}

impl ConfirmationOutcome {
    fn whitelisted() -> Self {
        Self::Whitelisted {
            whitelisted: true,
            execute: true,
        }
    }

    /// Whether the operation may execute without a validation round-trip
    pub fn executes_immediately(&self) -> bool {
        matches!(self, Self::Whitelisted { execute: true, .. })
    }
}

/// Result of a token validation
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ValidationOutcome {
    /// The token matched; the operation may execute
    Valid { valid: bool },
    /// Terminal rejection; the caller must restart the confirmation cycle
    Rejected {
        success: bool,
        error: String,
        blocked: bool,
    },
}

impl ValidationOutcome {
    fn valid() -> Self {
        Self::Valid { valid: true }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self::Rejected {
            success: false,
            error: error.into(),
            blocked: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { valid: true })
    }

    /// Rejection message, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Valid { .. } => None,
            Self::Rejected { error, .. } => Some(error),
        }
    }
}

/// Two-phase approval gateway.
///
/// Exclusive owner of pending-token storage. All mutation happens under a
/// write lock, so two racing validations of the same token cannot both
/// succeed: the first `remove` wins and the loser sees an absent token.
pub struct ConfirmationGateway {
    pending: RwLock<HashMap<String, PendingConfirmation>>,
    whitelist: Arc<SessionWhitelist>,
    token_ttl_secs: u64,
}

impl ConfirmationGateway {
    /// Create a gateway sharing the given session whitelist
    pub fn new(whitelist: Arc<SessionWhitelist>, token_ttl_secs: u64) -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
            whitelist,
            token_ttl_secs,
        }
    }

    /// Request approval for an operation.
    ///
    /// Whitelisted medium/low operations short-circuit to immediate
    /// execution without minting a token. Everything else gets a fresh
    /// single-use token bound to `(tool_name, operation_key)`.
    pub async fn request_confirmation(
        &self,
        tool_name: &str,
        risk: RiskTier,
        operation_data: serde_json::Value,
        operation_key: &str,
        description: &str,
        effect: &str,
        allow_whitelist: bool,
    ) -> ConfirmationOutcome {
        self.purge_expired().await;

        // Tier invariant first: the caller's allow_whitelist never makes a
        // critical or high operation whitelistable.
        let can_whitelist = allow_whitelist && risk.can_whitelist();

        if can_whitelist
            && self
                .whitelist
                .is_whitelisted(tool_name, operation_key)
                .await
        {
            tracing::info!(
                tool = tool_name,
                operation = operation_key,
                "Operation pre-approved by session whitelist"
            );
            return ConfirmationOutcome::whitelisted();
        }

        let token = mint_token();
        let now = chrono::Utc::now().timestamp_millis();
        let pending = PendingConfirmation {
            token: token.clone(),
            tool_name: tool_name.to_string(),
            operation_key: operation_key.to_string(),
            operation_data,
            risk,
            allow_whitelist: can_whitelist,
            created_at: now,
            expires_at: now + (self.token_ttl_secs as i64) * 1000,
        };

        self.pending.write().await.insert(token.clone(), pending);

        tracing::info!(
            tool = tool_name,
            operation = operation_key,
            risk = %risk,
            "Confirmation required, token issued"
        );

        ConfirmationOutcome::Pending(ConfirmationPrompt {
            requires_confirmation: true,
            confirmation_token: token,
            risk_level: risk,
            message: description.to_string(),
            effect: effect.to_string(),
            token_expires_in_seconds: self.token_ttl_secs,
            can_whitelist,
        })
    }

    /// Validate a previously issued token.
    ///
    /// The token is consumed by this call whatever the outcome. A
    /// tool/operation mismatch is treated as a possible bypass attempt.
    pub async fn validate_confirmation(
        &self,
        token: &str,
        tool_name: &str,
        operation_data: &serde_json::Value,
        operation_key: &str,
        whitelist_for_session: bool,
    ) -> ValidationOutcome {
        self.purge_expired().await;

        tracing::debug!(
            tool = tool_name,
            operation = operation_key,
            data = %crate::transport::payload_preview(operation_data, 256),
            "Validating confirmation token"
        );

        // Removing up front makes single use unconditional: even a
        // mismatched validation burns the token.
        let pending = match self.pending.write().await.remove(token) {
            Some(pending) => pending,
            None => {
                tracing::warn!(tool = tool_name, "Rejected unknown confirmation token");
                return ValidationOutcome::rejected("Invalid or expired confirmation token");
            }
        };

        if pending.tool_name != tool_name || pending.operation_key != operation_key {
            tracing::error!(
                expected_tool = %pending.tool_name,
                expected_operation = %pending.operation_key,
                got_tool = tool_name,
                got_operation = operation_key,
                "Confirmation token presented for a different operation"
            );
            return ValidationOutcome::rejected(
                "Confirmation token does not match the requested operation",
            );
        }

        if whitelist_for_session && pending.allow_whitelist && pending.risk.can_whitelist() {
            self.whitelist
                .add(
                    tool_name,
                    operation_key,
                    format!("{}: {}", tool_name, operation_key),
                )
                .await;
        }

        tracing::info!(
            tool = tool_name,
            operation = operation_key,
            risk = %pending.risk,
            "Operation confirmed"
        );

        ValidationOutcome::valid()
    }

    /// Number of tokens currently awaiting validation
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Drop every token past its expiry (lazy sweep, run on each request
    /// and validation).
    async fn purge_expired(&self) {
        let now = chrono::Utc::now().timestamp_millis();
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, p| p.expires_at > now);
        let purged = before - pending.len();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired confirmation tokens");
        }
    }
}

/// 16 random bytes as 32 hex chars
fn mint_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
