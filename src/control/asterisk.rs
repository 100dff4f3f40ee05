//! Subprocess-backed control plane client (`asterisk -rx`).

use std::path::PathBuf;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::trace;

use crate::HostMetrics;
use crate::util::snippet;

use super::{ControlError, ControlPlaneClient, ControlResult};

const OUTPUT_SNIPPET_LEN: usize = 200;

const DEFAULT_BINARY: &str = "/usr/sbin/asterisk";
const DEFAULT_RPT_CONF: &str = "/etc/asterisk/rpt.conf";

pub struct AsteriskClient {
    binary: PathBuf,
    rpt_conf: PathBuf,
}

impl AsteriskClient {
    pub fn new() -> Self {
        Self::with_paths(DEFAULT_BINARY, DEFAULT_RPT_CONF)
    }

    pub fn with_paths(binary: impl Into<PathBuf>, rpt_conf: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            rpt_conf: rpt_conf.into(),
        }
    }

    async fn run(&self, command: &str) -> ControlResult<()> {
        let output = Command::new(&self.binary)
            .arg("-rx")
            .arg(command)
            .output()
            .await?;

        if output.status.success() {
            trace!("control command ok: {command}");
            return Ok(());
        }

        let mut captured = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if captured.is_empty() {
            captured = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }

        Err(ControlError::CommandFailed {
            status: output.status.code(),
            output: snippet(&captured, OUTPUT_SNIPPET_LEN),
        })
    }
}

impl Default for AsteriskClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlPlaneClient for AsteriskClient {
    async fn node_exists(&self, node: &str) -> ControlResult<bool> {
        let conf = tokio::fs::read_to_string(&self.rpt_conf).await.map_err(|e| {
            ControlError::ConfigUnreadable(format!("{}: {e}", self.rpt_conf.display()))
        })?;

        Ok(node_declared(&conf, node))
    }

    async fn set_metrics(&self, node: &str, metrics: &HostMetrics) -> ControlResult<()> {
        let command = format!(
            "rpt set variable {node} cpu_up={} cpu_load={} cpu_temp={} WX={} DISK={}",
            metrics.cpu_up, metrics.cpu_load, metrics.cpu_temp, metrics.wx, metrics.disk
        );
        self.run(&command).await
    }

    async fn set_alert(&self, node: &str, text: &str) -> ControlResult<()> {
        // the value travels as part of a single argv element; no shell is
        // involved, so no escaping or temp-file indirection is needed
        let command = format!("rpt set variable {node} ALERT={text}");
        self.run(&command).await
    }
}

/// Match a node declaration: a section header `[<node>]` at the start of a
/// line, optionally followed by a parenthesized alias.
pub fn node_declared(conf: &str, node: &str) -> bool {
    let pattern = format!(r"(?m)^[ \t]*\[{}\](\([^)\r\n]*\))?", regex::escape(node));
    Regex::new(&pattern)
        .map(|re| re.is_match(conf))
        .unwrap_or(false)
}
