// src/bin/status_watch.rs
use clap::Parser;
use env_logger::Env;
use log::{ error, info };
use std::time::Duration;

use stonemc_status::config::Config;
use stonemc_status::poller::{ PresenterState, ProxyClient, StatusPoller };

/// Terminal status widget: polls a running proxy and prints every change.
#[derive(Parser, Debug)]
#[command(name = "status-watch", version, about)]
struct Args {
    /// Proxy endpoint (defaults to STATUS_PROXY_URL)
    #[arg(long)]
    url: Option<String>,

    /// Seconds between polls (defaults to STATUS_POLL_INTERVAL_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

fn render(state: &PresenterState) -> String {
    let s = &state.snapshot;
    let dot = if s.online { "online " } else { "offline" };
    let fetched = state.updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let spinner = if state.loading { " (refreshing)" } else { "" };

    format!(
        "[{}] {} {}/{} players | {} | {} | {}ms{}",
        fetched,
        dot,
        s.players.online,
        s.players.max,
        s.version,
        s.motd,
        s.ping,
        spinner
    )
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let args = Args::parse();
    let config = Config::from_env();
    let url = args.url.unwrap_or_else(|| config.proxy_url.clone());
    let period = args.interval.map(Duration::from_secs).unwrap_or(config.poll_interval());

    let client = match ProxyClient::new(url, Duration::from_secs(args.timeout)) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build proxy client: {}", e);
            std::process::exit(1);
        }
    };
    info!("Watching {}", client.url());

    let handle = StatusPoller::spawn(client, period);
    let mut rx = handle.subscribe();
    println!("{}", render(&rx.borrow_and_update()));

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render(&rx.borrow_and_update()));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping poller");
                break;
            }
        }
    }

    handle.shutdown().await;
}
