mod report;
mod script;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use orderdesk_core::reduce;
use orderdesk_core::ClientId;
use orderdesk_core::DeskAction;
use orderdesk_core::DeskConfig;
use orderdesk_core::DeskState;
use orderdesk_core::OperatorId;
use orderdesk_core::OrderStatus;
use orderdesk_core::Role;
use orderdesk_core::RouteKey;
use orderdesk_core::UserAction;
use orderdesk_exec::BoardListing;
use orderdesk_exec::DeskHost;
use orderdesk_exec::HeadlessPresenter;
use orderdesk_exec::SimulatedTransport;

use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "orderdesk", version, about = "Order board reconciliation for factory and sales desks")]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Desk role, overrides the configured one
    #[arg(long, value_name = "ROLE")]
    role: Option<Role>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a board listing as the desk would show it
    Show {
        /// Board listing JSON (`{"orders": [...]}`)
        #[arg(long, value_name = "FILE")]
        board: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Replay a script of push events and user actions against a simulated backend
    Replay {
        #[arg(long, value_name = "FILE")]
        board: PathBuf,

        /// JSON-lines script of steps
        #[arg(long, value_name = "FILE")]
        script: PathBuf,

        /// Wait for highlight and toast timers before printing
        #[arg(long)]
        drain_timers: bool,

        /// Do not play notification sounds
        #[arg(long)]
        mute: bool,

        /// Include the activity log in the output
        #[arg(long)]
        log: bool,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug, Default, Clone)]
struct FilterArgs {
    #[arg(long)]
    status: Option<OrderStatus>,

    #[arg(long, value_name = "CLIENT_ID")]
    client: Option<u64>,

    #[arg(long, value_name = "OPERATOR_ID")]
    operator: Option<u64>,

    #[arg(long)]
    route: Option<String>,
}

impl FilterArgs {
    fn actions(&self) -> Vec<UserAction> {
        let mut actions = Vec::new();
        if let Some(status) = self.status {
            actions.push(UserAction::SetStatusFilter {
                status: Some(status),
            });
        }
        if let Some(client) = self.client {
            actions.push(UserAction::SetClientFilter {
                client_id: Some(ClientId(client)),
            });
        }
        if let Some(operator) = self.operator {
            actions.push(UserAction::SetOperatorFilter {
                operator_id: Some(OperatorId(operator)),
            });
        }
        if let Some(route) = &self.route {
            actions.push(UserAction::SetRouteFilter {
                route: Some(RouteKey::new(route.clone())),
            });
        }
        actions
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config, cli.verbose);

    match cli.command {
        Command::Show {
            board,
            filters,
            format,
        } => {
            let listing = read_board(&board)?;
            let mut state = DeskState::with_orders(&config, listing.orders);
            for action in filters.actions() {
                reduce(&mut state, DeskAction::User(action));
            }
            print!("{}", report::render(&state, format, false)?);
            Ok(())
        }
        Command::Replay {
            board,
            script,
            drain_timers,
            mute,
            log,
            filters,
            format,
        } => {
            let listing = read_board(&board)?;
            let steps = script::load_script(&script)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting runtime")?;
            let state = runtime.block_on(replay(
                &config,
                listing,
                steps,
                filters.actions(),
                drain_timers,
                mute,
            ));
            print!("{}", report::render(&state, format, log)?);
            Ok(())
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn replay(
    config: &DeskConfig,
    listing: BoardListing,
    steps: Vec<script::ScriptStep>,
    filters: Vec<UserAction>,
    drain_timers: bool,
    mute: bool,
) -> DeskState {
    let transport = Arc::new(SimulatedTransport::new(listing.orders.clone()));
    let feed = transport.subscribe();
    let presenter = HeadlessPresenter {
        muted: mute,
        ..HeadlessPresenter::default()
    };
    let mut host = DeskHost::new(
        DeskState::with_orders(config, listing.orders),
        transport,
        presenter,
    )
    .with_feed(feed)
    .drain_timers(drain_timers);
    for action in filters {
        host.dispatch(action);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let step_count = steps.len();
    for step in steps {
        if tx.send(DeskAction::from(step)).is_err() {
            break;
        }
    }
    drop(tx);

    let host = host.run(rx).await;
    tracing::info!(
        steps = step_count,
        frames = host.presenter().frames,
        sounds = host.presenter().sounds,
        "replay finished"
    );
    host.into_state()
}

fn load_config(cli: &Cli) -> anyhow::Result<DeskConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => dirs::config_dir()
            .map(|dir| dir.join("orderdesk").join("config.toml"))
            .filter(|path| path.exists()),
    };
    let mut config = DeskConfig::load(path.as_deref()).context("loading config")?;
    if let Some(role) = cli.role {
        config.role = role;
    }
    Ok(config)
}

fn init_tracing(config: &DeskConfig, verbose: u8) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_board(path: &Path) -> anyhow::Result<BoardListing> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading board {}", path.display()))?;
    BoardListing::from_json(&content).with_context(|| format!("decoding board {}", path.display()))
}
