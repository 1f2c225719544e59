//! EngineGate - Risk-gated command gateway for live engine processes
//!
//! Command-line front end for driving a running engine through the gate:
//! one-shot sends, an interactive session, classification dry-runs, and
//! connectivity diagnostics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use enginegate::{
    config::EngineGateConfig,
    gateway::{CommandGateway, CommandRequest, Dispatch},
    transport::EngineResponse,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "enginegate")]
#[command(version)]
#[command(about = "Risk-gated command gateway for live engine processes")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ENGINEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single console command through the gate
    Send {
        /// The console command to execute
        command: String,
    },

    /// Interactive session: dispatch commands line by line
    Shell,

    /// Show how a command would be classified, without sending it
    Classify {
        /// The console command to classify
        command: String,
    },

    /// Run connectivity diagnostics against the engine
    Doctor,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("enginegate={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)?;
        toml::from_str(&content)?
    } else {
        EngineGateConfig::default()
    };

    match cli.command {
        Commands::Send { command } => {
            let gateway = CommandGateway::new(&config)?;
            run_send(&gateway, &command).await?;
        }
        Commands::Shell => {
            let gateway = CommandGateway::new(&config)?;
            run_shell(&gateway).await?;
        }
        Commands::Classify { command } => {
            run_classify(&config, &command)?;
        }
        Commands::Doctor => {
            run_doctor(&config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_send(gateway: &CommandGateway, command: &str) -> Result<()> {
    let dispatch = gateway.dispatch(CommandRequest::console(command)).await;
    handle_dispatch(gateway, command, dispatch).await
}

async fn run_shell(gateway: &CommandGateway) -> Result<()> {
    println!("EngineGate interactive session. Type a console command,");
    println!(":status, :clear-whitelist, or :quit.");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("engine> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":status" => {
                let status = gateway.status().await;
                let whitelist = gateway.whitelist().status().await;
                println!(
                    "pending confirmations: {}, whitelisted operations: {}",
                    status.pending_confirmations, status.whitelisted_operations
                );
                for label in whitelist.operations {
                    println!("  - {}", label);
                }
            }
            ":clear-whitelist" => {
                gateway.whitelist().clear().await;
                println!("Session whitelist cleared.");
            }
            command => {
                let dispatch = gateway.dispatch(CommandRequest::console(command)).await;
                if let Err(e) = handle_dispatch(gateway, command, dispatch).await {
                    println!("✗ {}", e);
                }
            }
        }
    }

    Ok(())
}

/// Print a dispatch outcome, walking the interactive confirmation
/// round-trip when the gate asks for one.
async fn handle_dispatch(
    gateway: &CommandGateway,
    command: &str,
    dispatch: Dispatch,
) -> Result<()> {
    match dispatch {
        Dispatch::Executed(response) => print_response(response),
        Dispatch::Rejected { error, .. } => {
            println!("✗ {}", error);
        }
        Dispatch::NeedsConfirmation(prompt) => {
            println!();
            println!("⚠ {} risk: {}", prompt.risk_level, prompt.message);
            println!("  Effect: {}", prompt.effect);
            println!(
                "  Token expires in {}s.",
                prompt.token_expires_in_seconds
            );

            let remember_hint = if prompt.can_whitelist {
                ", r = approve and remember for this session"
            } else {
                ""
            };
            print!("Approve? [y/N{}] ", remember_hint);
            std::io::stdout().flush()?;

            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer)?;
            let answer = answer.trim().to_lowercase();

            let (approved, remember) = match answer.as_str() {
                "y" | "yes" => (true, false),
                "r" if prompt.can_whitelist => (true, true),
                _ => (false, false),
            };

            if !approved {
                println!("Cancelled; nothing was sent.");
                return Ok(());
            }

            let confirmed = gateway
                .dispatch_confirmed(
                    &prompt.confirmation_token,
                    CommandRequest::console(command),
                    remember,
                )
                .await;
            match confirmed {
                Dispatch::Executed(response) => print_response(response),
                Dispatch::Rejected { error, .. } => println!("✗ {}", error),
                Dispatch::NeedsConfirmation(_) => {
                    // Validation never re-prompts; a fresh cycle starts from
                    // dispatch.
                    println!("✗ Confirmation cycle must be restarted.");
                }
            }
        }
    }
    Ok(())
}

fn print_response(response: EngineResponse) {
    match serde_json::to_string_pretty(&response.into_value()) {
        Ok(pretty) => println!("{}", pretty),
        Err(e) => println!("✗ Unprintable response: {}", e),
    }
}

fn run_classify(config: &EngineGateConfig, command: &str) -> Result<()> {
    let classifier = enginegate::risk::Classifier::new(&config.security)?;
    let classification = classifier.classify(command);

    println!("command:       {}", command);
    println!("risk tier:     {}", classification.tier);
    println!("operation key: {}", classification.operation_key);
    match classification.matched_pattern {
        Some(pattern) => println!("matched:       \"{}\"", pattern),
        None => println!("matched:       (no table entry)"),
    }
    Ok(())
}

async fn run_doctor(config: &EngineGateConfig) -> Result<()> {
    println!("🔍 EngineGate Doctor");
    println!();

    let addr = format!("{}:{}", config.engine.host, config.engine.port);
    println!("Checking engine at {}...", addr);

    let connect = tokio::time::timeout(
        std::time::Duration::from_secs(config.engine.connect_timeout_secs),
        tokio::net::TcpStream::connect(&addr),
    )
    .await;

    match connect {
        Ok(Ok(_stream)) => {
            println!("  ✓ Engine command port is reachable");
        }
        Ok(Err(e)) => {
            println!("  ✗ Could not connect: {}", e);
        }
        Err(_) => {
            println!(
                "  ✗ Connect timed out after {}s",
                config.engine.connect_timeout_secs
            );
        }
    }

    println!();
    println!(
        "Risk tables: {} blocked, {} high, {} medium patterns",
        config.security.blocked_patterns.len(),
        config.security.high_patterns.len(),
        config.security.medium_patterns.len()
    );
    println!("Token TTL: {}s", config.security.token_ttl_secs);
    println!();
    println!("Doctor check complete!");

    Ok(())
}

fn show_config(config: Option<&EngineGateConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
