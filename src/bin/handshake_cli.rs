//! Handshake command line interface
//!
//! Runs one PASS identity-verification handshake against the sign service.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for the applicant, wait for the terminal confirmation
//! handshake_cli
//!
//! # Non-interactive, JSON report, give up after two minutes
//! handshake_cli --name 홍길동 --birth 20000101 --phone 01012345678 \
//!     --confirm-timeout 120 --format json
//! ```
//!
//! Exit codes: 0 authenticated, 1 rejected, 2 aborted or setup failure.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use sign_handshake::{
    Applicant, ConfigLoader, ConfirmationGate, FixedGate, HandshakeConfig, HandshakeOrchestrator,
    HandshakeOutcome, HandshakeReport, IdentityCheckPolicy, ReqwestTransport, TerminalGate,
};

const CONFIRM_PROMPT: &str =
    "Approve the PASS request on your phone, then answer '네' (or 'yes') to continue:";

#[derive(Parser)]
#[command(name = "handshake_cli")]
#[command(version = "0.1.0")]
#[command(about = "Run a PASS identity-verification handshake")]
#[command(long_about = None)]
struct Cli {
    /// YAML configuration file (defaults to $HANDSHAKE_CONFIG, then built-ins)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Applicant name (prompted if omitted)
    #[arg(long)]
    name: Option<String>,

    /// Applicant birth date, YYYYMMDD (prompted if omitted)
    #[arg(long)]
    birth: Option<String>,

    /// Applicant phone number (prompted if omitted)
    #[arg(long)]
    phone: Option<String>,

    /// File holding the disclosure statement shown to the signer
    #[arg(long)]
    disclosure_file: Option<PathBuf>,

    /// Skip the confirmation prompt and poll straight away
    #[arg(long)]
    assume_confirmed: bool,

    /// Abort if the confirmation does not arrive within this many seconds
    #[arg(long)]
    confirm_timeout: Option<u64>,

    /// Abort when the identity submission reply carries a failure code
    #[arg(long)]
    strict_identity: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    // Prompts read stdin synchronously, so they run before the runtime starts
    let config = load_config(&cli)?;
    let applicant = read_applicant(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    let assume_confirmed = cli.assume_confirmed;
    let report = runtime.block_on(async move {
        let transport = ReqwestTransport::new(&config.http)?;
        let report = if assume_confirmed {
            handshake(config, transport, FixedGate(true), &applicant).await
        } else {
            let gate = TerminalGate::new(CONFIRM_PROMPT, config.confirmation.affirmatives.clone());
            handshake(config, transport, gate, &applicant).await
        };
        anyhow::Ok(report)
    })?;
    drop(runtime);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => print_report(&report),
    }

    Ok(match report.outcome {
        HandshakeOutcome::Authenticated => ExitCode::SUCCESS,
        HandshakeOutcome::Rejected { .. } => ExitCode::from(1),
        HandshakeOutcome::Aborted { .. } => ExitCode::from(2),
    })
}

async fn handshake<G: ConfirmationGate>(
    config: HandshakeConfig,
    transport: ReqwestTransport,
    gate: G,
    applicant: &Applicant,
) -> HandshakeReport {
    HandshakeOrchestrator::new(Arc::new(config), transport, gate)
        .run(applicant)
        .await
}

fn load_config(cli: &Cli) -> Result<HandshakeConfig> {
    let mut loader = ConfigLoader::from_env();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    if let Some(path) = &cli.disclosure_file {
        let disclosure = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        loader = loader.with_disclosure(disclosure);
    }

    let mut config = loader.load()?;
    if cli.strict_identity {
        config.identity_policy = IdentityCheckPolicy::Strict;
    }
    if let Some(secs) = cli.confirm_timeout {
        config.confirmation.timeout_secs = Some(secs);
    }
    Ok(config)
}

fn read_applicant(cli: &Cli) -> Result<Applicant> {
    let name = value_or_prompt(&cli.name, "Name: ")?;
    let birth = value_or_prompt(&cli.birth, "Birth date (e.g. 20000101): ")?;
    let phone = value_or_prompt(&cli.phone, "Phone number: ")?;
    Applicant::new(name, birth, phone).context("Invalid applicant")
}

fn value_or_prompt(value: &Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value.clone());
    }
    let mut stderr = io::stderr();
    write!(stderr, "{}", prompt)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_report(report: &HandshakeReport) {
    println!("{} {}", "Run".bold(), report.run_id);

    let path: Vec<String> = report.visited.iter().map(|p| p.to_string()).collect();
    println!("  {} {}", "phases:".dimmed(), path.join(" → "));

    let state = &report.state;
    let tokens = [
        ("mid", state.service_id()),
        ("reqSvcCd", state.requested_service_code()),
        ("mTxId", state.transaction_ref()),
        ("authHash", state.auth_hash()),
        ("txId", state.session_tx_id()),
        ("hex_txId", state.device_tx_id()),
    ];
    for (field, value) in tokens {
        match value {
            Some(value) => println!("  {} {} = {}", "✓".green(), field, value),
            None => println!("  {} {} not found", "✗".dimmed(), field),
        }
    }

    match &report.outcome {
        HandshakeOutcome::Authenticated => println!("{}", "AUTHENTICATED".green().bold()),
        HandshakeOutcome::Rejected {
            result_code,
            result_msg,
        } => println!(
            "{} code={} {}",
            "REJECTED".yellow().bold(),
            result_code.as_deref().unwrap_or("none"),
            result_msg.as_deref().unwrap_or("")
        ),
        HandshakeOutcome::Aborted { phase, error } => {
            println!("{} at {}: {}", "ABORTED".red().bold(), phase, error);
            if let Some(body) = error.raw_body() {
                println!("  {}", "response body:".dimmed());
                println!("{}", body);
            }
        }
    }
}
