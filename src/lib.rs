pub mod alerts;
pub mod config;
pub mod control;
pub mod publisher;
pub mod recorder;
pub mod samplers;
pub mod util;

use serde::{Deserialize, Serialize};

/// Host metrics rendered into the variable values the control plane expects.
///
/// Every field already carries the outer quotes of the variable-assignment
/// syntax, so the control-plane client can interpolate them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostMetrics {
    pub cpu_up: String,
    pub cpu_load: String,
    pub cpu_temp: String,
    pub wx: String,
    pub disk: String,
}

/// Alert severity as reported by the alert API.
///
/// Anything the API sends that we do not recognize becomes `Unknown` and is
/// displayed with the `Extreme` color: an unreadable severity is treated as
/// the most urgent one, not the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "extreme" => Severity::Extreme,
            "severe" => Severity::Severe,
            "moderate" => Severity::Moderate,
            "minor" => Severity::Minor,
            _ => Severity::Unknown,
        }
    }
}

impl Severity {
    /// Display color for this severity. Total: every variant maps to a fixed
    /// color, with `Unknown` sharing the `Extreme` color.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Extreme | Severity::Unknown => "#FF0000",
            Severity::Severe => "#FF8C00",
            Severity::Moderate => "#FFD700",
            Severity::Minor => "#90EE90",
        }
    }
}

/// One weather/hazard notification from the alert API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub event: String,
    pub severity: Severity,
    #[serde(default)]
    pub headline: String,
}

/// An ordered set of alerts, either global or scoped to one node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSet {
    #[serde(default)]
    pub has_alerts: bool,
    #[serde(default)]
    pub alerts: Vec<AlertRecord>,
}

impl AlertSet {
    /// Whether there is anything to render beyond the "no alerts" indicator.
    pub fn is_active(&self) -> bool {
        self.has_alerts && !self.alerts.is_empty()
    }
}
