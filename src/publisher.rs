//! Per-node delivery of metric and alert variables.
//!
//! Nodes are processed sequentially and independently: a failure on one node
//! never stops the others, and within one node the metrics and alert commands
//! are independent best-effort steps.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::HostMetrics;
use crate::control::ControlPlaneClient;
use crate::recorder::Recorder;

/// Outcome of one node's update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    /// Both commands succeeded
    Ok,

    /// The node is not declared in the control plane configuration;
    /// no commands were issued
    SkipRpt,

    /// The metric variables command failed
    ErrorVars,

    /// The alert variable command failed
    ErrorAlert,
}

pub struct NodePublisher {
    control: Arc<dyn ControlPlaneClient>,
    recorder: Arc<dyn Recorder>,
}

impl NodePublisher {
    pub fn new(control: Arc<dyn ControlPlaneClient>, recorder: Arc<dyn Recorder>) -> Self {
        Self { control, recorder }
    }

    /// Push metrics and the per-node alert string to every node, returning
    /// each node's outcome.
    #[instrument(skip_all)]
    pub async fn publish(
        &self,
        nodes: &[String],
        metrics: &HostMetrics,
        alerts: &HashMap<String, String>,
    ) -> HashMap<String, NodeOutcome> {
        let mut outcomes = HashMap::new();

        for node in nodes {
            let alert = alerts.get(node).map(String::as_str).unwrap_or("");
            let outcome = self.publish_node(node, metrics, alert).await;
            outcomes.insert(node.clone(), outcome);
        }

        outcomes
    }

    async fn publish_node(&self, node: &str, metrics: &HostMetrics, alert: &str) -> NodeOutcome {
        match self.control.node_exists(node).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("node {node} not declared in control plane configuration, skipping");
                self.recorder
                    .trail(&format!("node {node}: skipped, not declared"));
                return NodeOutcome::SkipRpt;
            }
            Err(e) => {
                error!("node {node}: declaration lookup failed: {e}");
                self.recorder
                    .error(&format!("node {node}: declaration lookup failed: {e}"));
                return NodeOutcome::SkipRpt;
            }
        }

        let vars = self.control.set_metrics(node, metrics).await;
        match &vars {
            Ok(()) => debug!("node {node}: metric variables updated"),
            Err(e) => {
                error!("node {node}: metric variables failed: {e}");
                self.recorder
                    .error(&format!("node {node}: metric variables failed: {e}"));
            }
        }

        // the alert step runs even when the vars step failed; the two
        // commands are independent
        let alert_result = self.control.set_alert(node, alert).await;
        match &alert_result {
            Ok(()) => debug!("node {node}: alert variable updated"),
            Err(e) => {
                error!("node {node}: alert variable failed: {e}");
                self.recorder
                    .error(&format!("node {node}: alert variable failed: {e}"));
            }
        }

        match (vars.is_ok(), alert_result.is_ok()) {
            (true, true) => {
                self.recorder.trail(&format!("node {node}: updated"));
                NodeOutcome::Ok
            }
            (false, _) => NodeOutcome::ErrorVars,
            (true, false) => NodeOutcome::ErrorAlert,
        }
    }
}
