//! Gateway façade wiring classification, confirmation, and transport

use crate::config::EngineGateConfig;
use crate::confirm::{
    ConfirmationGateway, ConfirmationOutcome, ConfirmationPrompt, SessionWhitelist,
};
use crate::error::Result;
use crate::risk::{Classifier, RiskTier};
use crate::transport::{payload_preview, EngineClient, EngineResponse, Transport};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// An incoming command bound for the engine
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Tool the command originates from
    pub tool_name: String,
    /// Wire command name, forwarded verbatim
    pub command_type: String,
    /// The string the risk classifier sees
    pub raw_command: String,
    /// Opaque command parameters, forwarded verbatim
    pub params: Value,
    /// Tier declared by a structured tool wrapper, if any.
    ///
    /// The effective tier is the more severe of this and the classifier's
    /// verdict, so a declaration can escalate but never soften.
    pub declared_risk: Option<RiskTier>,
    /// Whether the tool permits a session whitelist on approval
    pub allow_whitelist: bool,
}

impl CommandRequest {
    /// Command with an explicit wire type and parameters
    pub fn new(
        tool_name: impl Into<String>,
        command_type: impl Into<String>,
        raw_command: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            command_type: command_type.into(),
            raw_command: raw_command.into(),
            params,
            declared_risk: None,
            allow_whitelist: true,
        }
    }

    /// A raw console command forwarded through the generic console tool
    pub fn console(command: impl Into<String>) -> Self {
        let command = command.into();
        Self::new(
            "console",
            "console_command",
            command.clone(),
            serde_json::json!({ "command": command }),
        )
    }

    /// Declare a tier for a structured operation
    pub fn with_risk(mut self, risk: RiskTier) -> Self {
        self.declared_risk = Some(risk);
        self
    }
}

/// Outcome of dispatching a command through the gateway
#[derive(Debug)]
pub enum Dispatch {
    /// The command reached the engine; here is its normalized response
    Executed(EngineResponse),
    /// A human must approve before the command is sent
    NeedsConfirmation(ConfirmationPrompt),
    /// The command was refused and never sent
    Rejected {
        error: String,
        /// True for security rejections the caller must not retry
        blocked: bool,
    },
}

/// Operator-facing gateway snapshot
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    /// Tokens currently awaiting validation
    pub pending_confirmations: usize,
    /// Operations whitelisted this session
    pub whitelisted_operations: usize,
}

/// The trust boundary between calling tools and the engine.
///
/// Every command is classified before anything touches the wire: blocked
/// commands are refused outright, safe commands flow without friction,
/// and everything in between goes through the confirmation gate.
pub struct CommandGateway {
    classifier: Classifier,
    confirmations: ConfirmationGateway,
    whitelist: Arc<SessionWhitelist>,
    transport: Arc<dyn Transport>,
}

impl CommandGateway {
    /// Create a gateway talking to a live engine per the configuration
    pub fn new(config: &EngineGateConfig) -> Result<Self> {
        let transport = Arc::new(EngineClient::new(config.engine.clone()));
        Self::with_transport(config, transport)
    }

    /// Create a gateway over an arbitrary transport
    pub fn with_transport(
        config: &EngineGateConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let whitelist = Arc::new(SessionWhitelist::new());
        Ok(Self {
            classifier: Classifier::new(&config.security)?,
            confirmations: ConfirmationGateway::new(
                whitelist.clone(),
                config.security.token_ttl_secs,
            ),
            whitelist,
            transport,
        })
    }

    /// Dispatch a command, routing it through the confirmation gate as its
    /// risk tier demands.
    pub async fn dispatch(&self, request: CommandRequest) -> Dispatch {
        let classification = self.classifier.classify(&request.raw_command);
        let tier = match request.declared_risk {
            Some(declared) => escalate(declared, classification.tier),
            None => classification.tier,
        };

        match tier {
            RiskTier::Blocked => {
                tracing::warn!(
                    tool = %request.tool_name,
                    command = %request.raw_command,
                    "Command blocked by security policy"
                );
                let error = match classification.matched_pattern {
                    Some(pattern) => format!(
                        "Command blocked by security policy (matches \"{}\")",
                        pattern
                    ),
                    None => "Command blocked by security policy".to_string(),
                };
                Dispatch::Rejected {
                    error,
                    blocked: true,
                }
            }
            RiskTier::Safe => self.execute(&request).await,
            _ => {
                let outcome = self
                    .confirmations
                    .request_confirmation(
                        &request.tool_name,
                        tier,
                        request.params.clone(),
                        &classification.operation_key,
                        &format!("{} wants to execute: {}", request.tool_name, request.raw_command),
                        describe_effect(tier),
                        request.allow_whitelist,
                    )
                    .await;

                match outcome {
                    ConfirmationOutcome::Whitelisted { .. } => self.execute(&request).await,
                    ConfirmationOutcome::Pending(prompt) => Dispatch::NeedsConfirmation(prompt),
                }
            }
        }
    }

    /// Complete a confirmation round-trip and dispatch the command.
    ///
    /// Every validation failure is terminal for the token; the caller must
    /// restart from [`dispatch`](Self::dispatch).
    pub async fn dispatch_confirmed(
        &self,
        token: &str,
        request: CommandRequest,
        whitelist_for_session: bool,
    ) -> Dispatch {
        let classification = self.classifier.classify(&request.raw_command);

        let outcome = self
            .confirmations
            .validate_confirmation(
                token,
                &request.tool_name,
                &request.params,
                &classification.operation_key,
                whitelist_for_session,
            )
            .await;

        if !outcome.is_valid() {
            return Dispatch::Rejected {
                error: outcome
                    .error()
                    .unwrap_or("Confirmation rejected")
                    .to_string(),
                blocked: true,
            };
        }

        self.execute(&request).await
    }

    /// Session whitelist handle for management surfaces
    pub fn whitelist(&self) -> &SessionWhitelist {
        &self.whitelist
    }

    /// Operator snapshot of gate state
    pub async fn status(&self) -> GatewayStatus {
        GatewayStatus {
            pending_confirmations: self.confirmations.pending_count().await,
            whitelisted_operations: self.whitelist.status().await.whitelisted_count,
        }
    }

    async fn execute(&self, request: &CommandRequest) -> Dispatch {
        tracing::info!(
            tool = %request.tool_name,
            command = %request.command_type,
            params = %payload_preview(&request.params, 128),
            "Forwarding command to engine"
        );
        let response = self
            .transport
            .send_command(&request.command_type, request.params.clone())
            .await;
        Dispatch::Executed(response)
    }
}

/// The more severe of two tiers, in the gate's total order
fn escalate(a: RiskTier, b: RiskTier) -> RiskTier {
    fn severity(tier: RiskTier) -> u8 {
        match tier {
            RiskTier::Blocked => 5,
            RiskTier::Critical => 4,
            RiskTier::High => 3,
            RiskTier::Medium => 2,
            RiskTier::Low => 1,
            RiskTier::Safe => 0,
        }
    }
    if severity(a) >= severity(b) {
        a
    } else {
        b
    }
}

fn describe_effect(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical | RiskTier::High => {
            "May end the session, load other content, or execute arbitrary code"
        }
        RiskTier::Medium => "Disruptive to the running level, but recoverable",
        RiskTier::Low => "Minor, recoverable side effects",
        RiskTier::Safe | RiskTier::Blocked => "",
    }
}
