use std::path::PathBuf;

use tracing::trace;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Nodes to update, in the order they should be processed
    #[serde(default)]
    pub nodes: Vec<String>,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub alert_source: AlertSourceConfig,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WeatherConfig {
    /// Station/location code passed to the weather script
    pub code: Option<String>,

    /// Human-readable location shown next to the weather text
    pub location: Option<String>,

    #[serde(default = "default_temp_unit")]
    pub unit: String,

    /// Weather script override; the conventional install paths are probed
    /// when this is unset
    pub script: Option<PathBuf>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            code: None,
            location: None,
            unit: default_temp_unit(),
            script: None,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AlertSourceConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional link wrapped around each rendered alert
    pub custom_link: Option<String>,

    /// Per-run diagnostic trail (truncated at the start of each run)
    #[serde(default = "default_trail_log")]
    pub trail_log: PathBuf,

    /// Persistent error log (accumulates across runs)
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

impl Default for AlertSourceConfig {
    fn default() -> Self {
        AlertSourceConfig {
            enabled: false,
            base_url: default_base_url(),
            custom_link: None,
            trail_log: default_trail_log(),
            error_log: default_error_log(),
        }
    }
}

fn default_temp_unit() -> String {
    String::from("F")
}

fn default_base_url() -> String {
    String::from("http://localhost:8100")
}

fn default_trail_log() -> PathBuf {
    PathBuf::from("/tmp/node-status-trail.log")
}

fn default_error_log() -> PathBuf {
    PathBuf::from("/tmp/node-status-errors.log")
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

/// De-duplicate the configured node list, keeping first occurrences in order.
pub fn dedup_nodes(nodes: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    nodes
        .iter()
        .map(|node| node.trim())
        .filter(|node| !node.is_empty())
        .filter(|node| seen.insert(node.to_string()))
        .map(str::to_string)
        .collect()
}
