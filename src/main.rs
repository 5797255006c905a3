//! emanate - mirror a directory tree into another one with symbolic links.
//!
//! Usage:
//!   emanate [OPTIONS]            Link every file of SOURCE into DESTINATION
//!   emanate [OPTIONS] clean      Remove the links created by `emanate`
//!   emanate --dry-run [create]   Show what would be linked
//!   emanate version              Show version information

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use emanate_core::{CONFIG_FILE_NAME, Config, Environment, Policy};
use emanate_ops::{Execution, Mode, Prompt};

#[derive(Parser)]
#[command(
    name = "emanate",
    version,
    about = "Link files from one directory to another",
    long_about = "emanate mirrors the file hierarchy of SOURCE into DESTINATION using \
                  symbolic links, creating directories as needed.\n\n\
                  Settings are layered: built-in defaults, then SOURCE/emanate.json \
                  (or --config), then command-line flags."
)]
struct Cli {
    /// Directory holding the files to symlink (defaults to current directory)
    #[arg(long, global = true, value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Directory containing the symbolic links (defaults to your home directory)
    #[arg(long, global = true, value_name = "DESTINATION")]
    destination: Option<PathBuf>,

    /// Configuration file to use (defaults to SOURCE/emanate.json)
    #[arg(long, global = true, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Additional glob pattern to ignore, relative to the working directory
    #[arg(long, global = true, value_name = "PATTERN")]
    ignore: Vec<PathBuf>,

    /// Don't prompt before replacing a file
    #[arg(long, global = true)]
    no_confirm: bool,

    /// Only display the actions that would be taken
    #[arg(long, global = true)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create symbolic links (the default)
    Create,

    /// Remove symbolic links
    Clean,

    /// Show version information and exit
    Version,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mode = match cli.command {
        Some(Command::Version) => {
            println!("emanate v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(Command::Clean) => Mode::Clean,
        Some(Command::Create) | None => Mode::Create,
    };

    let env = Environment::from_process().context("Cannot determine working directory")?;
    let policy = build_policy(&cli, &env)?;

    let execution = Execution::for_mode(mode, &policy, Prompt::stdio())
        .with_context(|| format!("Cannot {mode} links from {}", policy.source.display()))?;

    let mut stdout = io::stdout().lock();
    let summary = if cli.dry_run {
        execution.dry(&mut stdout)?
    } else {
        execution.run(&mut stdout)?
    };
    stdout.flush()?;

    for error in &summary.errors {
        eprintln!("error: {error}");
    }
    if !summary.is_success() {
        bail!("{}", summary.summary());
    }

    Ok(())
}

/// Route `tracing` output to stderr, honoring `RUST_LOG` first.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Layer defaults, the configuration file and command-line flags.
fn build_policy(cli: &Cli, env: &Environment) -> Result<Policy> {
    let source = cli.source.clone().unwrap_or_else(|| env.cwd.clone());
    let config_path = match &cli.config {
        Some(path) => env.absolutize(path)?,
        None => env.absolutize(&source.join(CONFIG_FILE_NAME))?,
    };

    let mut layers = Vec::new();
    if config_path.exists() {
        let file = Config::from_file(&config_path, env)
            .with_context(|| format!("Cannot load {}", config_path.display()))?;
        layers.push(file);
    } else if cli.config.is_some() {
        bail!("Configuration file not found: {}", config_path.display());
    }

    let flags = flag_layer(cli)?
        .resolve(&env.cwd, env)
        .context("Invalid command-line paths")?;
    layers.push(flags);

    Ok(Policy::from_layers(env, layers)?)
}

/// The configuration layer given by command-line flags.
fn flag_layer(cli: &Cli) -> Result<Config> {
    let mut builder = Config::builder();
    if let Some(source) = &cli.source {
        builder.source(source);
    }
    if let Some(destination) = &cli.destination {
        builder.destination(destination);
    }
    if cli.no_confirm {
        builder.confirm(false);
    }
    for pattern in &cli.ignore {
        builder.ignore_pattern(pattern);
    }
    Ok(builder.build()?)
}
