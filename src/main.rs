use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use modeswitch::config::Config;
use modeswitch::host::script::run_script;
use modeswitch::modes::builtin_modes;
use modeswitch::session::{SelectionTarget, Session};
use modeswitch::store::{self, FileStore, MemoryStore, SharedStore};

/// modeswitch - drive an editor's status bar with one active mode at a time
#[derive(Parser)]
#[command(name = "modeswitch")]
#[command(version)]
#[command(about = "A single-active-mode plugin host fed by a host event script", long_about = None)]
struct Cli {
    /// Event script to replay (omit to read from stdin)
    script: Option<PathBuf>,

    /// Config file (default: ~/.config/modeswitch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State file (overrides the config's state_file)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Keep state in memory only
    #[arg(long, conflicts_with = "state")]
    memory: bool,

    /// Switch to this mode after startup ("none" disables all)
    #[arg(short, long)]
    mode: Option<String>,

    /// List the available modes and exit
    #[arg(short, long)]
    list: bool,

    /// Status bar width (overrides the config's status_width)
    #[arg(short, long)]
    width: Option<u16>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(width) = cli.width {
        config.status_width = width;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let store = open_store(&cli, &config);
    let session = Session::new(config, store);
    for mode in builtin_modes(
        session.config(),
        session.status_bar(),
        session.notifications(),
    ) {
        session.register(mode)?;
    }

    if cli.list {
        for item in session.selection_items() {
            println!("{:<12} {}", item.id, item.name);
        }
        return Ok(());
    }

    session.start();
    if let Some(mode) = &cli.mode {
        let _ = session.select(&SelectionTarget::parse(mode));
    }
    for message in session.notifications().drain() {
        eprintln!("[{}] {}", message.level, message.text);
    }

    let mut stdout = io::stdout().lock();
    let result = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            run_script(&session, BufReader::new(file), &mut stdout)
        }
        None => run_script(&session, io::stdin().lock(), &mut stdout),
    };

    session.shutdown();
    result
}

fn open_store(cli: &Cli, config: &Config) -> SharedStore {
    if cli.memory {
        return store::shared(MemoryStore::new());
    }

    match cli.state.clone().or_else(|| config.state_path()) {
        Some(path) => {
            log::debug!("using state file {}", path.display());
            store::shared(FileStore::open(path))
        }
        None => {
            log::warn!("no home directory, state will not be persisted");
            store::shared(MemoryStore::new())
        }
    }
}
