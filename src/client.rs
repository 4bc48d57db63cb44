use anyhow::{Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::types::{BeaconReply, Facility, PortRecentReply, WorkerCountReply, WorkerReply};

/// HTTP client for the worker server's JSON endpoints.
///
/// All calls are GETs against fixed path templates. A transport failure
/// (connection error, non-2xx status, malformed body) is an `Err`; a reply
/// with `Status: false` is a logical failure the caller handles itself.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self
            .base
            .join(path)
            .with_context(|| format!("invalid request path: {path}"))?;
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;
        resp.json::<T>()
            .await
            .with_context(|| format!("failed to decode reply from {url}"))
    }

    /// Liveness check.
    pub async fn beacon(&self) -> Result<BeaconReply> {
        self.get_json("/ajax/beacon").await
    }

    /// Fetch scan results newer than the given Unix-seconds watermark.
    pub async fn port_recent(&self, stamp: i64) -> Result<PortRecentReply> {
        self.get_json(&format!("/ajax/port_recent/{stamp}")).await
    }

    /// Start `cnt` additional workers of the given facility.
    pub async fn spawn_worker(&self, facility: Facility, cnt: u32) -> Result<WorkerReply> {
        self.get_json(&format!("/ajax/spawn_worker/{}/{cnt}", facility.code()))
            .await
    }

    /// Stop `cnt` workers of the given facility.
    pub async fn stop_worker(&self, facility: Facility, cnt: u32) -> Result<WorkerReply> {
        self.get_json(&format!("/ajax/stop_worker/{}/{cnt}", facility.code()))
            .await
    }

    /// Aggregate worker counts across all facilities.
    pub async fn worker_count(&self) -> Result<WorkerCountReply> {
        self.get_json("/ajax/worker_count").await
    }
}
