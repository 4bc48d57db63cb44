use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::format::{html_escape, timestamp_unix};
use crate::panel::{Notifier, Panel};
use crate::settings::{self, Settings, SettingsStore};

/// One step of a self-repeating poll loop.
///
/// A cycle issues at most one request, absorbs every failure, and returns
/// the delay before the next cycle on every exit path. Returning the delay
/// is what guarantees exactly one reschedule per invocation, the same way
/// the scheduling used to live in a `finally` block.
#[async_trait]
pub trait PollStep: Send {
    fn name(&self) -> &'static str;
    async fn cycle(&mut self) -> Duration;
}

/// Drive a poll step until the token is cancelled.
///
/// Cycles are strictly sequential: the next one is scheduled only after the
/// previous one has fully completed, so each poller has at most one request
/// in flight. A hung request delays that poller's next cycle indefinitely;
/// there is no request timeout.
pub async fn run_poller(mut step: Box<dyn PollStep>, cancel: CancellationToken) {
    info!(poller = step.name(), "poller started");
    loop {
        let delay = step.cycle().await;
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(poller = step.name(), "poller stopped");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Periodic liveness check against the server's beacon endpoint.
pub struct BeaconPoller {
    client: ApiClient,
    settings: Arc<RwLock<Settings>>,
    panel: Arc<RwLock<Panel>>,
    /// Unix seconds of the last successful check, 0 if never. Shared with
    /// the shell so the console can show "last seen N ago".
    last_alive: Arc<AtomicI64>,
}

impl BeaconPoller {
    pub fn new(
        client: ApiClient,
        settings: Arc<RwLock<Settings>>,
        panel: Arc<RwLock<Panel>>,
        last_alive: Arc<AtomicI64>,
    ) -> Self {
        Self {
            client,
            settings,
            panel,
            last_alive,
        }
    }

    async fn mark_down(&self) {
        let mut panel = self.panel.write().await;
        panel.set_html("beacon", "Server is not responding");
        panel.set_error("beacon", true);
    }
}

#[async_trait]
impl PollStep for BeaconPoller {
    fn name(&self) -> &'static str {
        "beacon"
    }

    async fn cycle(&mut self) -> Duration {
        let active = self.settings.read().await.beacon.active;
        if active {
            match self.client.beacon().await {
                Ok(reply) if reply.status => {
                    let line = format!(
                        "{} running on {} is alive at {}",
                        reply.message, reply.hostname, reply.timestamp
                    );
                    let mut panel = self.panel.write().await;
                    panel.set_html("beacon", line);
                    panel.set_error("beacon", false);
                    self.last_alive.store(timestamp_unix(), Ordering::Relaxed);
                }
                Ok(_) => self.mark_down().await,
                Err(err) => {
                    debug!(error = %err, "beacon request failed");
                    self.mark_down().await;
                }
            }
        }
        Duration::from_millis(self.settings.read().await.beacon.interval)
    }
}

/// Incremental poll for new scan results since a watermark timestamp.
pub struct UpdatePoller {
    client: ApiClient,
    settings: Arc<RwLock<Settings>>,
    panel: Arc<RwLock<Panel>>,
    notifier: Arc<dyn Notifier>,
    /// Newest instant already covered by a successful poll, Unix seconds.
    /// Monotonically non-decreasing; never advanced on a failed cycle.
    update_stamp: i64,
}

impl UpdatePoller {
    pub fn new(
        client: ApiClient,
        settings: Arc<RwLock<Settings>>,
        panel: Arc<RwLock<Panel>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            settings,
            panel,
            notifier,
            update_stamp: timestamp_unix(),
        }
    }

    pub fn watermark(&self) -> i64 {
        self.update_stamp
    }
}

#[async_trait]
impl PollStep for UpdatePoller {
    fn name(&self) -> &'static str {
        "update"
    }

    async fn cycle(&mut self) -> Duration {
        let active = self.settings.read().await.update.active;
        if active {
            match self.client.port_recent(self.update_stamp).await {
                Ok(reply) if reply.status => {
                    let mut panel = self.panel.write().await;
                    for (port, results) in &reply.results {
                        let tid = format!("tbody_{port}");
                        for r in results {
                            let row = format!(
                                "<tr><td>{} ({})</td><td>{}</td><td><pre>{}</pre></td></tr>",
                                html_escape(&r.host.name),
                                html_escape(&r.host.address),
                                html_escape(&r.stamp),
                                html_escape(&r.reply)
                            );
                            panel.append_html(&tid, &row);
                        }
                    }
                    drop(panel);
                    // Advance to "now", not to the newest result stamp. The
                    // next cycle asks for everything since this poll, at the
                    // cost of a possible small overlap.
                    self.update_stamp = timestamp_unix();
                }
                Ok(reply) => {
                    warn!(message = %reply.message, "result poll rejected by server");
                }
                Err(err) => {
                    self.notifier
                        .report_failure("Failed to load update", &err.to_string());
                }
            }
        }
        Duration::from_millis(self.settings.read().await.update.interval)
    }
}

/// Flip the beacon poller on/off, persist the flag, and when now disabled
/// show the suspension notice immediately instead of waiting for the next
/// cycle. Returns the new state.
pub async fn toggle_beacon(
    settings: &RwLock<Settings>,
    panel: &RwLock<Panel>,
    store: &dyn SettingsStore,
) -> bool {
    let active = {
        let mut s = settings.write().await;
        settings::beacon_toggle(&mut s, store)
    };
    if !active {
        let mut p = panel.write().await;
        p.set_html("beacon", "Beacon is suspended");
        p.set_error("beacon", false);
    }
    active
}

/// Flip the result poller on/off and persist the flag. Returns the new state.
pub async fn toggle_update(settings: &RwLock<Settings>, store: &dyn SettingsStore) -> bool {
    let mut s = settings.write().await;
    settings::update_toggle(&mut s, store)
}

/// Set the result poll interval from an operator-supplied token.
/// Non-integer tokens are rejected with only a log entry.
pub async fn set_update_interval(
    settings: &RwLock<Settings>,
    store: &dyn SettingsStore,
    raw: &str,
) -> bool {
    let mut s = settings.write().await;
    settings::set_update_interval(&mut s, store, raw)
}
