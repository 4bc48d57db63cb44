use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use scan_console_rs::client::ApiClient;
use scan_console_rs::control::WorkerControl;
use scan_console_rs::format;
use scan_console_rs::panel::{Notifier, Panel, TermNotifier};
use scan_console_rs::poller::{self, BeaconPoller, UpdatePoller};
use scan_console_rs::ports;
use scan_console_rs::settings::{JsonFileStore, Settings, SettingsStore};
use scan_console_rs::types::Facility;

/// scan-console-rs — Terminal operator console for a background scan worker
/// farm (generator / scanner / XFR) over HTTP+JSON.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scan-console-rs",
    version,
    about = "Terminal operator console for a background scan worker farm (generator / scanner / XFR).",
    long_about = None
)]
struct Cli {
    /// Base URL of the worker server.
    #[arg(long, default_value = "http://localhost:4711")]
    server: Url,

    /// Path to the JSON settings file.
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Comma-separated ports of interest (single ports or ranges like
    /// 8000-8010). One result table is kept per port. Defaults to a small
    /// common set.
    #[arg(long)]
    ports: Option<String>,

    /// Log filter (tracing EnvFilter syntax).
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ports_of_interest = match cli.ports.as_deref() {
        Some(s) => ports::parse_port_list(s).context("invalid --ports list")?,
        None => ports::default_ports(),
    };

    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("loading settings from {}", cli.settings.display()))?;
    // Write the full document back so later key-level updates patch a
    // complete file even on first run.
    settings.save(&cli.settings)?;
    let settings = Arc::new(RwLock::new(settings));
    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::new(cli.settings.clone()));

    let panel = Arc::new(RwLock::new(Panel::new(&ports_of_interest)));
    let notifier: Arc<dyn Notifier> = Arc::new(TermNotifier);
    let client = ApiClient::new(cli.server.clone());
    let last_alive = Arc::new(AtomicI64::new(0));

    let cancel = CancellationToken::new();
    tokio::spawn(poller::run_poller(
        Box::new(BeaconPoller::new(
            client.clone(),
            settings.clone(),
            panel.clone(),
            last_alive.clone(),
        )),
        cancel.child_token(),
    ));
    tokio::spawn(poller::run_poller(
        Box::new(UpdatePoller::new(
            client.clone(),
            settings.clone(),
            panel.clone(),
            notifier.clone(),
        )),
        cancel.child_token(),
    ));

    let control = WorkerControl::new(client, panel.clone(), notifier.clone());
    control.load_worker_count().await;

    println!("scan-console-rs connected to {}", cli.server);
    println!("Type 'help' for the list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next() {
            None => {}
            Some("help") => print_help(),
            Some("show") => {
                print!("{}", panel.read().await.render());
                let seen = last_alive.load(Ordering::Relaxed);
                if seen > 0 {
                    let ago = (format::timestamp_unix() - seen).max(0) as u64;
                    println!("last beacon success: {} ago", format::fmt_duration(ago));
                }
            }
            Some("beacon") => {
                let on = poller::toggle_beacon(&settings, &panel, store.as_ref()).await;
                println!("beacon polling {}", if on { "enabled" } else { "suspended" });
            }
            Some("update") => {
                let on = poller::toggle_update(&settings, store.as_ref()).await;
                println!("result polling {}", if on { "enabled" } else { "suspended" });
            }
            Some("interval") => match parts.next() {
                // Rejected tokens are only logged, never echoed back.
                Some(raw) => {
                    if poller::set_update_interval(&settings, store.as_ref(), raw).await {
                        println!("update interval set to {raw} ms");
                    }
                }
                None => println!("usage: interval <milliseconds>"),
            },
            Some(cmd @ ("spawn" | "stop")) => match parts.next().map(str::parse::<Facility>) {
                Some(Ok(facility)) => {
                    if cmd == "spawn" {
                        control.spawn(facility).await;
                    } else {
                        control.stop(facility).await;
                    }
                }
                Some(Err(e)) => println!("{e}"),
                None => println!("usage: {cmd} <generator|scanner|xfr>"),
            },
            Some("counts") => control.load_worker_count().await,
            Some("msg") => {
                let text = line["msg".len()..].trim();
                if text.is_empty() {
                    println!("usage: msg <text>");
                } else {
                    panel.write().await.append_msg(text);
                }
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command: {other} (try 'help')"),
        }
    }

    cancel.cancel();
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  show                       dump the panel");
    println!("  beacon                     toggle the liveness poller");
    println!("  update                     toggle the result poller");
    println!("  interval <ms>              set the result poll interval");
    println!("  spawn <gen|scan|xfr>       start one worker");
    println!("  stop <gen|scan|xfr>        stop one worker");
    println!("  counts                     refresh worker counters");
    println!("  msg <text>                 append a line to the message log");
    println!("  quit                       exit");
}
