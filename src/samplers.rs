//! Host metric samplers.
//!
//! Sampling (sysinfo, weather subprocess) is separated from the pure
//! rendering functions so the rendering rules can be unit tested without
//! touching the host.

use std::path::{Path, PathBuf};

use sysinfo::{Components, Disks, System};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::HostMetrics;
use crate::config::WeatherConfig;

const TEMP_TEXT_STYLE: &str = "color: black; font-weight: bold;";

/// Conventional install paths probed when no weather script is configured.
const WEATHER_SCRIPTS: [&str; 2] = ["/usr/sbin/weather.pl", "/usr/local/sbin/weather.sh"];

/// Sample all host metrics once and render them into variable values.
pub async fn sample(weather: &WeatherConfig) -> HostMetrics {
    let load = System::load_average();

    HostMetrics {
        cpu_up: format_uptime(System::uptime()),
        cpu_load: format_load(load.one, load.five, load.fifteen),
        cpu_temp: render_temperature(sample_temperature(), &weather.unit),
        wx: sample_weather(weather).await,
        disk: sample_disk(),
    }
}

/// Highest component temperature reported by the host, in Celsius.
fn sample_temperature() -> Option<f32> {
    let components = Components::new_with_refreshed_list();
    components
        .iter()
        .filter_map(|component| component.temperature())
        .fold(None, |max, temp| match max {
            Some(current) if current >= temp => Some(current),
            _ => Some(temp),
        })
}

fn sample_disk() -> String {
    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"));

    match root {
        Some(disk) => {
            let used = disk.total_space().saturating_sub(disk.available_space());
            render_disk(used, disk.available_space())
        }
        None => String::from("\"Disk - N/A\""),
    }
}

async fn sample_weather(config: &WeatherConfig) -> String {
    let (Some(code), Some(location)) = (&config.code, &config.location) else {
        return String::from("\" \"");
    };

    let Some(script) = resolve_weather_script(config) else {
        debug!("no weather script available, skipping weather sample");
        return String::from("\" \"");
    };

    let output = Command::new(&script).arg(code).arg("v").output().await;
    match output {
        Ok(output) if output.status.success() => {
            let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if text.is_empty() {
                String::from("\" \"")
            } else {
                format!("\"<b>{location}   ({text})</b>\"")
            }
        }
        Ok(output) => {
            warn!("weather script {script:?} exited with {}", output.status);
            String::from("\" \"")
        }
        Err(e) => {
            warn!("failed to run weather script {script:?}: {e}");
            String::from("\" \"")
        }
    }
}

fn resolve_weather_script(config: &WeatherConfig) -> Option<PathBuf> {
    if let Some(script) = &config.script {
        return Some(script.clone());
    }

    WEATHER_SCRIPTS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Render seconds of uptime as `"Up 1 week, 2 days, 3 hours, 4 minutes"`.
pub fn format_uptime(secs: u64) -> String {
    let weeks = secs / 604_800;
    let days = (secs % 604_800) / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    let mut parts = Vec::new();
    for (value, label) in [
        (weeks, "week"),
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
    ] {
        if value == 1 {
            parts.push(format!("1 {label}"));
        } else if value > 1 {
            parts.push(format!("{value} {label}s"));
        }
    }

    if parts.is_empty() {
        parts.push(String::from("0 minutes"));
    }

    format!("\"Up {}\"", parts.join(", "))
}

pub fn format_load(one: f64, five: f64, fifteen: f64) -> String {
    format!("\"Load Average: {one:.2}, {five:.2}, {fifteen:.2}\"")
}

/// Render a Celsius reading with the configured unit and a background color
/// keyed to how hot the host is running.
pub fn render_temperature(temp_c: Option<f32>, unit: &str) -> String {
    let Some(temp_c) = temp_c else {
        return String::from("\"N/A\"");
    };

    let (value, unit_str, warm, hot) = match unit.to_ascii_uppercase().as_str() {
        "C" => (temp_c, "C", 50, 60),
        "F" => (temp_c * 9.0 / 5.0 + 32.0, "F", 140, 158),
        _ => return String::from("\"Temp Unit Invalid in config\""),
    };

    let display = value as i64;
    let background = if display <= warm {
        "lightgreen"
    } else if display <= hot {
        "yellow"
    } else {
        "#fa4c2d"
    };

    format!(
        "\"<span style='background-color:{background};'><b><span style='{TEMP_TEXT_STYLE}'>{display} {unit_str}</span></b></span>\""
    )
}

/// Render root filesystem usage as `"Disk - 12G 34% used, 23G remains"`.
pub fn render_disk(used: u64, available: u64) -> String {
    let total = used + available;
    let percent = if total == 0 {
        0
    } else {
        (used as f64 / total as f64 * 100.0).round() as u64
    };

    format!(
        "\"Disk - {} {percent}% used, {} remains\"",
        format_size(used),
        format_size(available)
    )
}

/// df-style human size: one decimal below 10 of a unit, none above.
fn format_size(bytes: u64) -> String {
    const UNITS: [(&str, u64); 4] = [
        ("T", 1 << 40),
        ("G", 1 << 30),
        ("M", 1 << 20),
        ("K", 1 << 10),
    ];

    for (label, scale) in UNITS {
        if bytes >= scale {
            let value = bytes as f64 / scale as f64;
            if value < 10.0 {
                return format!("{value:.1}{label}");
            }
            return format!("{}{label}", value.round() as u64);
        }
    }

    format!("{bytes}")
}
