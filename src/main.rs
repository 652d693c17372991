use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::event::KeyEventKind;
use metrik::app::App;
use metrik::collector::Collector;
use metrik::config::{self, Config, load_config, load_config_from_path};
use metrik::event::{Event, EventHandler};
use metrik::logging;
use metrik::store::{Repository, Store};
use metrik::system::SysinfoSource;
use metrik::ui::{self, theme::Theme};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "metrik",
    about = "Sample host OS and hardware metrics into SQLite"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long)]
    db: Option<PathBuf>,

    /// Collection interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Keep the existing database instead of recreating it at startup
    #[arg(long, default_value_t = false)]
    keep_existing: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Collect samples until interrupted (default)
    Run {
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Print the newest stored samples as JSON
    Latest,
    /// Run a read-only SQL statement against the store and print rows as JSON lines
    Query { sql: String },
    /// Live terminal view of the newest stored samples
    Dashboard {
        /// Store re-read interval in milliseconds
        #[arg(long)]
        refresh_ms: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let mut config = load_config_for_cli(&cli);
    let command = cli.command.unwrap_or(Command::Run { cycles: None });
    match &command {
        Command::Dashboard { .. } => {
            logging::init_to_file(&config.logging, &config.dashboard.log_file)?
        }
        _ => logging::init(&config.logging)?,
    }

    let store = Store::new(&config.store.path);
    match command {
        Command::Run { cycles } => run(config, store, cycles).await,
        Command::Latest => print_latest(&existing_repository(store)?),
        Command::Query { sql } => print_query(&existing_repository(store)?, &sql),
        Command::Dashboard { refresh_ms } => {
            if let Some(refresh_ms) = refresh_ms {
                config.dashboard.refresh_ms = refresh_ms;
            }
            dashboard(config, existing_repository(store)?).await
        }
    }
}

fn existing_repository(store: Store) -> Result<Repository> {
    if !store.path().exists() {
        return Err(eyre!("no store at {}", store.path().display()));
    }
    Ok(Repository::new(store))
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref db) = cli.db {
        config.store.path = db.clone();
    }
    if let Some(interval) = cli.interval_ms {
        config.general.interval_ms = interval;
    }
    if cli.keep_existing {
        config.store.reset_on_start = false;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config
}

async fn run(config: Config, store: Store, cycles: Option<usize>) -> Result<()> {
    if config.general.interval_ms == 0 {
        return Err(eyre!("interval_ms must be greater than 0"));
    }
    info!(
        db = %store.path().display(),
        config = ?config::config_path(),
        "metric collector initialized"
    );

    let mut collector = Collector::new(SysinfoSource::new(), store)
        .with_interval(Duration::from_millis(config.general.interval_ms))
        .with_failure_policy(config.general.on_error);
    collector.bootstrap(config.store.reset_on_start)?;

    match cycles {
        Some(n) => {
            let done = collector.run_cycles(n).await?;
            info!(cycles = done, "collection finished");
        }
        None => collector.run().await?,
    }
    Ok(())
}

fn print_latest(repo: &Repository) -> Result<()> {
    let latest = json!({
        "host": repo.host()?,
        "memory": repo.latest_memory()?,
        "power": repo.latest_power()?,
        "system": repo.latest_system()?,
        "processes": repo.latest_processes()?,
        "cores": repo.latest_cpu_cores()?,
    });
    println!("{}", serde_json::to_string_pretty(&latest)?);
    Ok(())
}

fn print_query(repo: &Repository, sql: &str) -> Result<()> {
    for row in repo.query(sql)? {
        println!("{}", row.to_json());
    }
    Ok(())
}

async fn dashboard(config: Config, repo: Repository) -> Result<()> {
    if config.dashboard.refresh_ms == 0 {
        return Err(eyre!("refresh_ms must be greater than 0"));
    }
    info!(db = %config.store.path.display(), refresh_ms = config.dashboard.refresh_ms, "dashboard started");

    let mut terminal = ratatui::init();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run_dashboard(&mut terminal, config, repo).await;
    ratatui::restore();
    result
}

async fn run_dashboard(
    terminal: &mut ratatui::DefaultTerminal,
    config: Config,
    repo: Repository,
) -> Result<()> {
    let tick_rate = Duration::from_millis(config.dashboard.refresh_ms);
    let mut app = App::new(repo, Theme::from_name(&config.dashboard.theme));
    let mut events = EventHandler::new(tick_rate);

    terminal.draw(|frame| ui::draw(frame, &mut app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = app.map_key(key);
                app.dispatch(action);
            }
            Event::Tick => app.refresh_data(),
            Event::Resize => {}
        }
        terminal.draw(|frame| ui::draw(frame, &mut app))?;
    }
    info!("dashboard stopped");
    Ok(())
}
