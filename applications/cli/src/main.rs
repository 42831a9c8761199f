/// Cadence - console media session
use anyhow::Context;
use cadence_cli::{
    config::CliConfig,
    console::Console,
    library::load_tracks,
    render::describe_event,
};
use cadence_playback::format_position;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Console media session with audio focus simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the library catalog
    List {
        /// Configuration file path
        #[arg(short, long, env = "CADENCE_CONFIG")]
        config: Option<PathBuf>,

        /// Library file path (overrides configuration)
        #[arg(short, long)]
        library: Option<PathBuf>,
    },
    /// Start an interactive session reading commands from stdin
    Run {
        /// Configuration file path
        #[arg(short, long, env = "CADENCE_CONFIG")]
        config: Option<PathBuf>,

        /// Library file path (overrides configuration)
        #[arg(short, long)]
        library: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_cli=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { config, library } => {
            let config = load_config(config, library)?;
            list(&config)?;
        }
        Commands::Run { config, library } => {
            let config = load_config(config, library)?;
            run(&config)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>, library: Option<PathBuf>) -> anyhow::Result<CliConfig> {
    let mut config = CliConfig::load(path.as_deref()).context("Failed to load configuration")?;
    if let Some(library) = library {
        config.library.path = library;
    }
    config.validate()?;
    Ok(config)
}

fn list(config: &CliConfig) -> anyhow::Result<()> {
    let tracks = load_tracks(&config.library.path)
        .with_context(|| format!("Failed to read library {}", config.library.path.display()))?;

    for track in &tracks {
        println!(
            "{:<24} {:>7}  {} - {}{}",
            track.id.as_str(),
            format_position(track.duration),
            track.artist,
            track.title,
            track
                .genre
                .as_deref()
                .map(|genre| format!(" [{genre}]"))
                .unwrap_or_default()
        );
    }
    println!("{} track(s)", tracks.len());
    Ok(())
}

fn run(config: &CliConfig) -> anyhow::Result<()> {
    let tracks = load_tracks(&config.library.path)
        .with_context(|| format!("Failed to read library {}", config.library.path.display()))?;
    let (console, events) = Console::start(config, &tracks)?;

    // Print events as they arrive; ends once the session drops its listener
    let printer = thread::Builder::new()
        .name("cadence-events".to_string())
        .spawn(move || {
            for event in events {
                println!("{}", describe_event(&event));
            }
        })
        .context("Failed to start event printer")?;

    if let Some(first) = tracks.first() {
        tracing::info!(first = %first.title, "Queue ready");
    }
    println!("{}", cadence_cli::command::Command::USAGE);

    let stdin = io::stdin();
    console.run(stdin.lock(), io::stdout())?;
    console.shutdown()?;

    printer
        .join()
        .map_err(|_| anyhow::anyhow!("Event printer panicked"))?;
    Ok(())
}
