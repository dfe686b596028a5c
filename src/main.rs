//! poll-live: follow poll results as votes come in.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      poll-live                        │
//!                 │                                                       │
//!   polls API ◀───┼── api::PollsClient ── snapshot ──┐                    │
//!   (REST)        │                                  ▼                    │
//!                 │                        realtime::LiveResultsChannel   │
//!   live feed ◀───┼── net::transport ◀── net::endpoint    │               │
//!   (ws/wss)      │        │                              │ watch         │
//!                 │        └─ deltas ─▶ tally ────────────┤               │
//!                 │                                       ▼               │
//!                 │                                 render → stdout       │
//!                 │                                                       │
//!                 │  config · observability · resilience · lifecycle      │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::future::join_all;

use poll_live::api::{Poll, PollsClient};
use poll_live::config::{self, ClientConfig};
use poll_live::lifecycle::{signals, Shutdown, ShutdownSignal};
use poll_live::net::EndpointResolver;
use poll_live::observability::{logging, metrics};
use poll_live::realtime::{LiveResultsChannel, ResultsView};
use poll_live::render::render_results;

#[derive(Parser)]
#[command(name = "poll-live")]
#[command(about = "Follow live poll results", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "poll-live.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow one or more polls until interrupted
    Watch {
        #[arg(required = true)]
        poll_ids: Vec<String>,
    },
    /// Print a poll's current results once
    Show { poll_id: String },
    /// Print the live results endpoint for a poll
    Endpoint { poll_id: String },
    /// Vote for an option
    Vote { poll_id: String, option_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = tracing::subscriber::with_default(logging::bootstrap_subscriber(), || {
        config::load_config(&cli.config)
    })?;

    logging::init_logging(&config.observability);
    tracing::debug!(
        host = %config.server.host,
        page_scheme = %config.server.page_scheme,
        max_attempts = config.reconnect.max_attempts,
        base_delay_ms = config.reconnect.base_delay_ms,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Watch { poll_ids } => watch(&config, poll_ids).await?,
        Commands::Show { poll_id } => {
            let api = PollsClient::from_config(&config)?;
            let poll = api.fetch_poll(&poll_id).await?;
            print!("{}", render_results(&ResultsView::from_poll(&poll), Some(&poll)));
        }
        Commands::Endpoint { poll_id } => {
            let resolver = EndpointResolver::new(&config.server.host)?;
            println!("{}", resolver.resolve(config.server.page_scheme, &poll_id));
        }
        Commands::Vote { poll_id, option_id } => {
            let api = PollsClient::from_config(&config)?;
            api.cast_vote(&poll_id, &option_id).await?;
            println!("Vote recorded for option {} in poll {}", option_id, poll_id);
        }
    }

    Ok(())
}

async fn watch(config: &ClientConfig, poll_ids: Vec<String>) -> Result<(), Box<dyn Error>> {
    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let api = PollsClient::from_config(config)?;
    let shutdown = Shutdown::new();
    let mut watchers = Vec::with_capacity(poll_ids.len());

    for poll_id in poll_ids {
        let poll = match api.fetch_poll(&poll_id).await {
            Ok(poll) => Some(poll),
            Err(e) => {
                tracing::warn!(poll_id = %poll_id, error = %e, "Snapshot unavailable, following live feed only");
                None
            }
        };

        let mut channel = LiveResultsChannel::from_config(config)?;
        match &poll {
            Some(poll) => channel.open_seeded(poll),
            None => channel.open(&poll_id),
        }

        watchers.push(tokio::spawn(follow(channel, poll, shutdown.subscribe())));
    }

    let all_done = join_all(watchers);
    tokio::pin!(all_done);

    let interrupted = tokio::select! {
        _ = signals::wait_for_signal() => true,
        _ = &mut all_done => false,
    };

    if interrupted {
        shutdown.trigger();
        all_done.await;
    } else {
        tracing::warn!("Every channel was abandoned");
    }

    Ok(())
}

/// Re-render on every change until shutdown or abandonment.
async fn follow(mut channel: LiveResultsChannel, poll: Option<Poll>, mut signal: ShutdownSignal) {
    let mut updates = channel.subscribe();
    print!("{}", render_results(&updates.borrow_and_update(), poll.as_ref()));

    loop {
        let changed = tokio::select! {
            res = updates.changed() => res.is_ok(),
            _ = signal.recv() => false,
        };
        if !changed {
            break;
        }

        let view = updates.borrow_and_update().clone();
        print!("{}", render_results(&view, poll.as_ref()));
        if view.is_stale() {
            return;
        }
    }

    channel.close_and_wait().await;
}
