//! Digital Detective CLI - fact-check news claims from the terminal
//!
//! Paste a claim, get a Tri-Lens credibility analysis from Gemini

mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use detective_analysis::{protocol_guide, GeminiClient};
use detective_core::{
    default_config_path, init_logging, log_operation_error, log_operation_success,
    validation_error, DetectiveConfig, LoggingConfig, MIN_CREDENTIAL_LEN,
};
use detective_session::{FileStore, RequestState, SessionController, View};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::render::render_analysis;

/// Default API key baked in at build time (`DETECTIVE_API_KEY=... cargo build`)
const BUILT_IN_API_KEY: Option<&str> = option_env!("DETECTIVE_API_KEY");

#[derive(Parser)]
#[command(name = "detective")]
#[command(about = "Fact-check news claims with the Tri-Lens Protocol")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single claim and exit
    Analyze {
        /// The claim or news text to check
        #[arg(required = true, num_args = 1..)]
        claim: Vec<String>,

        /// Print the raw analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive investigation session
    Interactive,

    /// Manage the saved API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show the Tri-Lens Protocol guide
    Protocol,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Set a configuration value (key=value format)
        #[arg(long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(long)]
        get: Option<String>,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save a Gemini API key
    Set { key: String },
    /// Forget the saved API key
    Clear,
    /// Show which API key is active
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DetectiveConfig::load(cli.config.as_deref())?;

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Digital Detective v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze { claim, json } => handle_analyze(claim.join(" "), json, &config).await,
        Commands::Interactive => handle_interactive(&config).await,
        Commands::Key { action } => handle_key(action, &config),
        Commands::Protocol => {
            println!("{}", protocol_guide());
            Ok(())
        }
        Commands::Config {
            show,
            init,
            set,
            get,
            validate,
        } => handle_config(cli.config, show, init, set, get, validate),
    }
}

fn open_session(config: &DetectiveConfig) -> Result<SessionController> {
    config.validate()?;

    let store_path = config.storage.store_path();
    let store = FileStore::open(&store_path)
        .with_context(|| format!("Failed to open key store at {:?}", store_path))?;
    let service = GeminiClient::new(config.analysis.clone())?;
    info!(model = service.model(), endpoint = service.endpoint(), "Gemini client ready");

    Ok(SessionController::initialize(
        Arc::new(store),
        Arc::new(service),
        BUILT_IN_API_KEY,
    ))
}

/// Print a prompt and read one line; `None` on end of input
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

fn print_failure(session: &SessionController) {
    if let RequestState::Failed {
        message,
        reauth_required,
    } = session.request_state()
    {
        println!("❌ {}", message);
        if *reauth_required {
            println!("🔑 The API key looks invalid. Enter a new one to continue.");
        }
    }
}

async fn handle_analyze(claim: String, json: bool, config: &DetectiveConfig) -> Result<()> {
    let mut session = open_session(config)?;

    if session.view() == View::CredentialPrompt {
        bail!(
            "No API key configured. Run 'detective key set <KEY>' or 'detective interactive' first."
        );
    }

    session.set_claim_text(claim);
    if !session.submit_claim().await {
        eprintln!("Nothing to analyze: the claim is empty.");
        return Ok(());
    }

    match session.request_state() {
        RequestState::Ready(result) => {
            log_operation_success!("analyze", verdict = result.verdict.label());
            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                println!("{}", render_analysis(result));
            }
            Ok(())
        }
        RequestState::Failed {
            message,
            reauth_required,
        } => {
            log_operation_error!("analyze", message);
            if *reauth_required {
                eprintln!("🔑 Run 'detective key set <KEY>' with a valid Gemini API key.");
            }
            bail!("{}", message)
        }
        RequestState::Idle | RequestState::Loading => {
            bail!("Analysis did not complete")
        }
    }
}

fn show_help() {
    println!("🔧 Commands:");
    println!("  help          - Show this help message");
    println!("  draft <text>  - Stage a claim without running it");
    println!("  run           - Analyze the staged claim");
    println!("  reset         - Clear the claim and the last result");
    println!("  key           - Forget the saved API key and enter a new one");
    println!("  protocol      - Show the Tri-Lens Protocol guide");
    println!("  quit, exit    - Leave the session");
    println!("  <claim>       - Analyze a claim right away\n");
}

async fn investigate(session: &mut SessionController) {
    println!("🕵️  Investigating...");
    if !session.submit_claim().await {
        println!("💬 Type or paste a claim first.");
        return;
    }

    match session.request_state() {
        RequestState::Ready(result) => println!("\n{}", render_analysis(result)),
        _ => print_failure(session),
    }
}

enum ReplAction {
    Continue,
    Quit,
}

/// Handle one line typed in the main view.
///
/// Only an exact command word is a command; `draft <text>` is the one prefixed form.
/// Everything else is analyzed as a claim.
async fn dispatch_line(session: &mut SessionController, line: &str) -> ReplAction {
    let input = line.trim();
    if input.is_empty() {
        return ReplAction::Continue;
    }

    match input.to_lowercase().as_str() {
        "quit" | "exit" | "q" => return ReplAction::Quit,
        "help" | "h" => show_help(),
        "protocol" => println!("{}", protocol_guide()),
        "reset" => {
            session.reset_session();
            println!("🧹 Cleared.\n");
        }
        "key" => {
            if let Err(e) = session.clear_credential() {
                e.log();
                println!("⚠️  Could not erase the saved key: {}", e.message());
            }
        }
        "run" => investigate(session).await,
        _ => match draft_text(input) {
            Some(draft) => {
                session.set_claim_text(draft);
                if session.suggests_quick_run() {
                    println!("💡 Type 'run' to start the Detective Protocol.");
                }
            }
            None => {
                session.set_claim_text(input);
                investigate(session).await;
            }
        },
    }

    ReplAction::Continue
}

fn draft_text(input: &str) -> Option<&str> {
    let (command, rest) = input.split_once(char::is_whitespace)?;
    command
        .eq_ignore_ascii_case("draft")
        .then(|| rest.trim_start())
}

async fn handle_interactive(config: &DetectiveConfig) -> Result<()> {
    let mut session = open_session(config)?;

    println!("🕵️  Digital Detective");
    println!("💡 Type 'help' for commands, 'quit' to exit\n");

    loop {
        match session.view() {
            View::CredentialPrompt => {
                println!("🔒 Identity verification required.");
                println!("   Enter your Gemini API key (it is stored locally on this machine).");
                let Some(input) = read_line("🔑 API key: ")? else {
                    break;
                };
                if matches!(input.trim(), "quit" | "exit" | "q") {
                    break;
                }

                session.set_pending_credential(input);
                if !session.can_save_credential() {
                    println!("   That does not look like a complete key.\n");
                    continue;
                }
                match session.save_pending_credential() {
                    Ok(_) => println!("✅ Key saved.\n"),
                    Err(e) => {
                        e.log();
                        println!("❌ Could not save the key: {}\n", e.message());
                    }
                }
            }
            View::Main => {
                let Some(input) = read_line("📰 Claim: ")? else {
                    break;
                };
                if let ReplAction::Quit = dispatch_line(&mut session, &input).await {
                    break;
                }
            }
        }
    }

    println!("👋 Case closed.");
    Ok(())
}

fn handle_key(action: KeyAction, config: &DetectiveConfig) -> Result<()> {
    let mut session = open_session(config)?;

    match action {
        KeyAction::Set { key } => {
            if session.save_credential(&key)? {
                println!("✅ API key saved to {:?}", config.storage.store_path());
            } else {
                return Err(validation_error!(
                    format!(
                        "API key must be longer than {} characters",
                        MIN_CREDENTIAL_LEN
                    ),
                    "key",
                    "cli"
                )
                .into());
            }
        }
        KeyAction::Clear => {
            session.clear_credential()?;
            println!("🗑️  API key removed.");
        }
        KeyAction::Status => match session.credential() {
            Some(credential) => println!("🔑 Active API key: {}", credential.masked()),
            None => println!("🔒 No API key configured."),
        },
    }

    Ok(())
}

fn handle_config(
    explicit_path: Option<PathBuf>,
    show: bool,
    init: bool,
    set: Option<String>,
    get: Option<String>,
    validate: bool,
) -> Result<()> {
    let config_path = match explicit_path.clone().or_else(default_config_path) {
        Some(path) => path,
        None => bail!("Could not determine a configuration directory"),
    };

    if init {
        DetectiveConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
    }

    if show {
        let config = DetectiveConfig::load(explicit_path.as_deref())?;
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    if validate {
        let config = DetectiveConfig::load(explicit_path.as_deref())?;
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }
        }
    }

    if let Some(key_value) = set {
        let Some((key, value)) = key_value.split_once('=') else {
            bail!("Invalid format. Use key=value, e.g. --set analysis.model=gemini-2.5-pro");
        };
        let mut config = if config_path.exists() {
            DetectiveConfig::from_file(&config_path)?
        } else {
            DetectiveConfig::default()
        };
        config.set_value(key.trim(), value.trim())?;
        config.save_to_file(&config_path)?;
        println!("✅ Set {} = {}", key.trim(), value.trim());
    }

    if let Some(key) = get {
        let config = DetectiveConfig::load(explicit_path.as_deref())?;
        println!("{} = {}", key, config.get_value(&key)?);
    }

    Ok(())
}
