//! Client for the remote severe-weather status API.
//!
//! One GET per run, scoped to the monitored nodes. Every outcome is
//! classified and written to the diagnostic trail because the call runs
//! unattended on a timer.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, instrument, trace};

use crate::config::AlertSourceConfig;
use crate::recorder::Recorder;
use crate::util::snippet;
use crate::{AlertRecord, AlertSet};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How much of a rejected response body is kept for diagnostics.
const BODY_SNIPPET_LEN: usize = 200;

/// Classified fetch failure. Non-fatal: the caller degrades to a visible
/// placeholder string instead of aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFailure {
    Timeout,
    Offline,
    Error,
}

/// Alert state for one node (or globally).
#[derive(Debug, Clone)]
pub enum AlertStatus {
    /// Alert sourcing is switched off in the configuration.
    Disabled,
    Ready(AlertSet),
    Failed(ApiFailure),
}

/// Result of one fetch: a global status plus optional per-node overrides.
#[derive(Debug, Clone)]
pub struct AlertResolution {
    global: AlertStatus,
    per_node: HashMap<String, AlertStatus>,
}

impl AlertResolution {
    pub fn global_only(status: AlertStatus) -> Self {
        Self {
            global: status,
            per_node: HashMap::new(),
        }
    }

    pub fn with_nodes(global: AlertStatus, per_node: HashMap<String, AlertStatus>) -> Self {
        Self { global, per_node }
    }

    /// A node's own entry wins when present, regardless of its content;
    /// everything else falls back to the global status.
    pub fn for_node(&self, id: &str) -> &AlertStatus {
        self.per_node.get(id).unwrap_or(&self.global)
    }

    pub fn global(&self) -> &AlertStatus {
        &self.global
    }
}

/// Wire format of `GET {base}/api/status`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    has_alerts: bool,
    #[serde(default)]
    alerts: Vec<AlertRecord>,
    #[serde(default)]
    alerts_by_node: HashMap<String, AlertSet>,
}

/// What `fetch` has to work with, decided once at construction.
enum Transport {
    /// Alert sourcing is off; the URL is never even parsed.
    Disabled,
    Ready { client: Client, base_url: Url },
    /// The configured URL is unusable. Kept as a description so every
    /// fetch can report it; the run itself still proceeds.
    Broken(String),
}

pub struct AlertSourceClient {
    transport: Transport,
    recorder: Arc<dyn Recorder>,
}

impl AlertSourceClient {
    /// Never fails: a bad URL degrades to an error status at fetch time
    /// instead of taking the whole run down with it.
    pub fn new(config: &AlertSourceConfig, recorder: Arc<dyn Recorder>) -> Self {
        Self::with_timeout(config, recorder, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        config: &AlertSourceConfig,
        recorder: Arc<dyn Recorder>,
        timeout: Duration,
    ) -> Self {
        let transport = if config.enabled {
            match build_transport(&config.base_url, timeout) {
                Ok((client, base_url)) => Transport::Ready { client, base_url },
                Err(e) => Transport::Broken(format!("{}: {e}", config.base_url)),
            }
        } else {
            Transport::Disabled
        };

        Self {
            transport,
            recorder,
        }
    }

    /// Base URL after normalization, mainly for logging. `None` when the
    /// source is disabled or the configured URL did not parse.
    pub fn base_url(&self) -> Option<&Url> {
        match &self.transport {
            Transport::Ready { base_url, .. } => Some(base_url),
            _ => None,
        }
    }

    /// Fetch and classify alert data for the given nodes.
    ///
    /// Never fails: every problem is folded into an [`AlertStatus`] so the
    /// run can continue with placeholders.
    #[instrument(skip(self))]
    pub async fn fetch(&self, node_ids: &[String]) -> AlertResolution {
        let (client, base_url) = match &self.transport {
            Transport::Disabled => {
                self.recorder
                    .trail("alert source disabled, no fetch attempted");
                return AlertResolution::global_only(AlertStatus::Disabled);
            }
            Transport::Broken(detail) => {
                let line = format!("unusable alert source url ({detail})");
                error!("alert fetch failed: {line}");
                self.recorder.error(&line);
                return AlertResolution::global_only(AlertStatus::Failed(ApiFailure::Error));
            }
            Transport::Ready { client, base_url } => (client, base_url),
        };

        let mut url = base_url.clone();
        url.set_path(&format!("{}/api/status", url.path().trim_end_matches('/')));
        if !node_ids.is_empty() {
            url.query_pairs_mut()
                .append_pair("nodes", &node_ids.join(","));
        }

        trace!("{url}: requesting alert status");

        let response = match client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let failure = classify(&e);
                self.record_failure(&url, failure, &format!("request error: {e}"));
                return AlertResolution::global_only(AlertStatus::Failed(failure));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            // the total timeout can also fire mid-body, so this branch
            // classifies the same way the send branch does
            Err(e) => {
                let failure = classify(&e);
                self.record_failure(&url, failure, &format!("error reading body: {e}"));
                return AlertResolution::global_only(AlertStatus::Failed(failure));
            }
        };

        if status != StatusCode::OK {
            self.record_failure(
                &url,
                ApiFailure::Error,
                &format!("status {status}, body: {}", snippet(&body, BODY_SNIPPET_LEN)),
            );
            return AlertResolution::global_only(AlertStatus::Failed(ApiFailure::Error));
        }

        let parsed = match serde_json::from_str::<StatusResponse>(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.record_failure(
                    &url,
                    ApiFailure::Error,
                    &format!("malformed body ({e}): {}", snippet(&body, BODY_SNIPPET_LEN)),
                );
                return AlertResolution::global_only(AlertStatus::Failed(ApiFailure::Error));
            }
        };

        let global = AlertSet {
            has_alerts: parsed.has_alerts,
            alerts: parsed.alerts,
        };

        let mut node_keys: Vec<String> = parsed.alerts_by_node.keys().cloned().collect();
        node_keys.sort();
        self.recorder.trail(&format!(
            "{url} -> ok, global alerts: {}, node keys: [{}]",
            global.alerts.len(),
            node_keys.join(", ")
        ));
        debug!(
            "{url}: alert status ok ({} global, {} node entries)",
            global.alerts.len(),
            parsed.alerts_by_node.len()
        );

        let per_node = parsed
            .alerts_by_node
            .into_iter()
            .map(|(id, set)| (id, AlertStatus::Ready(set)))
            .collect();

        AlertResolution::with_nodes(AlertStatus::Ready(global), per_node)
    }

    fn record_failure(&self, url: &Url, failure: ApiFailure, detail: &str) {
        let line = format!("{url} -> {failure:?}: {detail}");
        error!("alert fetch failed: {line}");
        self.recorder.error(&line);
    }
}

fn build_transport(raw_url: &str, timeout: Duration) -> anyhow::Result<(Client, Url)> {
    let mut base_url = Url::parse(raw_url)?;

    // "localhost" can resolve to ::1 while the service only listens on
    // IPv4; pin it to the v4 loopback
    if base_url.host_str() == Some("localhost")
        && base_url
            .set_ip_host(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .is_err()
    {
        anyhow::bail!("cannot rewrite localhost in alert source url");
    }

    let mut builder = Client::builder().timeout(timeout);
    if is_loopback(&base_url) {
        builder = builder.no_proxy();
    }

    Ok((builder.build()?, base_url))
}

fn classify(e: &reqwest::Error) -> ApiFailure {
    if e.is_timeout() {
        ApiFailure::Timeout
    } else if e.is_connect() {
        ApiFailure::Offline
    } else {
        ApiFailure::Error
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}
