use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::client::ApiClient;
use crate::panel::{Notifier, Panel};
use crate::types::Facility;

/// On-demand spawn/stop commands and aggregate count refresh.
///
/// Counters only ever display the server-reported value. They are never
/// incremented or decremented locally, so concurrent operators cannot make
/// the display drift.
pub struct WorkerControl {
    client: ApiClient,
    panel: Arc<RwLock<Panel>>,
    notifier: Arc<dyn Notifier>,
}

impl WorkerControl {
    pub fn new(client: ApiClient, panel: Arc<RwLock<Panel>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            panel,
            notifier,
        }
    }

    /// Start one worker of the given facility.
    pub async fn spawn(&self, facility: Facility) {
        self.command(facility, true).await;
    }

    /// Stop one worker of the given facility.
    pub async fn stop(&self, facility: Facility) {
        self.command(facility, false).await;
    }

    async fn command(&self, facility: Facility, start: bool) {
        let verb = if start { "spawn" } else { "stop" };
        let res = if start {
            self.client.spawn_worker(facility, 1).await
        } else {
            self.client.stop_worker(facility, 1).await
        };

        match res {
            Ok(reply) if reply.status => {
                let mut panel = self.panel.write().await;
                panel.set_html(facility.counter_id(), reply.new_cnt.to_string());
                debug!(facility = %facility, count = reply.new_cnt, "worker count updated");
            }
            Ok(reply) => {
                // Logical failure: show the server's message, leave the
                // counter untouched.
                self.notifier.alert(&reply.message);
            }
            Err(err) => {
                self.notifier.report_failure(
                    &format!("Failed to {verb} {facility} worker"),
                    &err.to_string(),
                );
            }
        }
    }

    /// Refresh the displayed counts for all facilities at once.
    pub async fn load_worker_count(&self) {
        match self.client.worker_count().await {
            Ok(reply) if reply.status => {
                let mut panel = self.panel.write().await;
                for facility in Facility::ALL {
                    panel.set_html(facility.counter_id(), reply.count_for(facility).to_string());
                }
            }
            Ok(reply) => {
                let detail = if reply.timestamp.is_empty() {
                    reply.message.clone()
                } else {
                    format!("{} (at {})", reply.message, reply.timestamp)
                };
                self.notifier
                    .report_failure("Failed to load worker counts", &detail);
            }
            Err(err) => {
                self.notifier
                    .report_failure("Failed to load worker counts", &err.to_string());
            }
        }
    }
}
