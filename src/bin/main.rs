//! E-IMZO signing bridge CLI
//!
//! Command-line interface for signing Directum payloads through the local
//! E-IMZO agent, with Multibank timestamping and configuration support.

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use eimzo_signer::{
    AgentUrl, ConfigManager, EimzoClient, SignOutcome, SigningAgent, SigningConfig, Thumbprint,
    TimestampUrl,
};

#[derive(Parser)]
#[command(name = "eimzo-signer")]
#[command(about = "Sign Directum payloads through the local E-IMZO agent")]
#[command(long_about = "
E-IMZO Signing Bridge - Directum to Multibank signing chain

EXAMPLES:
    # Sign a payload file (base64-encoded Directum data)
    eimzo-signer sign payload.b64 -t 0123456789ABCDEF0123456789ABCDEF01234567

    # Sign inline data
    eimzo-signer sign --data SGVsbG8= -t <THUMBPRINT>

    # Check the local agent
    eimzo-signer status

    # Show configuration
    eimzo-signer config show

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign base64-encoded Directum data
    Sign {
        /// File containing the base64 payload (omit when using --data)
        #[arg(value_name = "INPUT_FILE")]
        input_file: Option<PathBuf>,

        /// Inline base64 payload instead of a file
        #[arg(short, long, value_name = "BASE64")]
        data: Option<String>,

        /// Thumbprint of the signing certificate (SHA-1 hex)
        #[arg(short, long, value_name = "THUMBPRINT")]
        thumbprint: String,

        /// Agent WebSocket endpoint (overrides config)
        #[arg(long, value_name = "URL")]
        agent_url: Option<String>,

        /// Timestamp service endpoint (overrides config)
        #[arg(long, value_name = "URL")]
        timestamp_url: Option<String>,

        /// Certificate store directory (overrides config)
        #[arg(long, value_name = "DIR")]
        cert_store: Option<PathBuf>,

        /// Write the resulting artifact to a file instead of stdout
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },

    /// Probe the local agent and report its version
    Status,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sign {
            input_file,
            data,
            thumbprint,
            agent_url,
            timestamp_url,
            cert_store,
            output,
        } => {
            handle_sign_command(SignCommandArgs {
                input_file,
                data,
                thumbprint,
                agent_url,
                timestamp_url,
                cert_store,
                output,
            })
            .await?;
        }

        Commands::Status => {
            handle_status_command().await?;
        }

        Commands::Config(config_cmd) => {
            handle_config_command(config_cmd)?;
        }
    }

    Ok(())
}

/// Parameters for the sign command
struct SignCommandArgs {
    input_file: Option<PathBuf>,
    data: Option<String>,
    thumbprint: String,
    agent_url: Option<String>,
    timestamp_url: Option<String>,
    cert_store: Option<PathBuf>,
    output: Option<PathBuf>,
}

async fn handle_sign_command(args: SignCommandArgs) -> Result<()> {
    let payload = match (&args.data, &args.input_file) {
        (Some(data), _) => data.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("Failed to read payload file {}", path.display()))?,
        (None, None) => {
            eprintln!("❌ Provide a payload file or --data");
            std::process::exit(1);
        }
    };

    let thumbprint = Thumbprint::new(&args.thumbprint)
        .into_diagnostic()
        .context("Invalid thumbprint")?;

    // Persisted settings first, command-line overrides on top.
    let manager = ConfigManager::new().into_diagnostic()?;
    let bridge = manager.load_or_create_default().into_diagnostic()?;
    let mut config = SigningConfig::from_bridge(thumbprint, &bridge)
        .into_diagnostic()
        .context("Invalid configuration")?;

    if let Some(url) = &args.agent_url {
        config.agent_url = AgentUrl::new(url).into_diagnostic()?;
    }
    if let Some(url) = &args.timestamp_url {
        config.timestamp.endpoint = TimestampUrl::new(url).into_diagnostic()?;
    }
    if let Some(dir) = args.cert_store {
        config.cert_store_dir = Some(dir);
    }

    match eimzo_signer::sign_data(payload.trim(), config).await {
        Ok(outcome) => {
            match &outcome {
                SignOutcome::Multibank { .. } => {
                    println!("✅ Signed and timestamped; Directum has been notified");
                }
                SignOutcome::Raw { .. } => {
                    println!("✅ Raw PKCS7 signature created");
                }
            }

            if let Some(path) = args.output {
                std::fs::write(&path, outcome.value())
                    .into_diagnostic()
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("  Written to: {}", path.display());
            } else {
                println!("{}", outcome.value());
            }
        }
        Err(e) => {
            eprintln!("❌ Signing failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn handle_status_command() -> Result<()> {
    println!("🔍 Probing the local E-IMZO agent...");

    let manager = ConfigManager::new().into_diagnostic()?;
    let bridge = manager.load_or_create_default().into_diagnostic()?;
    let endpoint = AgentUrl::new(&bridge.agent_url).into_diagnostic()?;
    println!("  Endpoint: {endpoint}");

    let client = EimzoClient::new(endpoint);
    match client.version().await {
        Ok(version) => {
            println!("✅ Agent is reachable");
            println!("  Version: {version}");
        }
        Err(e) => {
            eprintln!("❌ Agent is not reachable: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    let manager = ConfigManager::new().into_diagnostic()?;

    match cmd {
        ConfigCommands::Show => {
            let config = manager.load_or_create_default().into_diagnostic()?;
            println!("📋 Current configuration:");
            println!("  Agent URL: {}", config.agent_url);
            println!("  Timestamp endpoint: {}", config.timestamp_endpoint);
            println!(
                "  Certificate store: {}",
                if config.cert_store_dir.is_empty() {
                    "~/DSKEYS (default)"
                } else {
                    &config.cert_store_dir
                }
            );
            println!("  Key TTL: {} minutes", config.key_ttl_minutes);
            println!("  Network timeout: {}s", config.network_timeout_seconds);
            println!(
                "  Timestamp retries: {} (delay {}s)",
                config.retry_attempts, config.retry_delay_seconds
            );
        }

        ConfigCommands::Init => {
            let config = manager.load_or_create_default().into_diagnostic()?;
            println!("✅ Configuration ready at {}", manager.config_path().display());
            println!("  Agent URL: {}", config.agent_url);
        }

        ConfigCommands::Set { key, value } => {
            manager
                .update_value(&key, &value)
                .into_diagnostic()
                .with_context(|| format!("Failed to set {key}"))?;
            println!("✅ Set {key} = {value}");
        }

        ConfigCommands::Path => {
            println!("{}", manager.config_path().display());
        }
    }

    Ok(())
}
