//! Rendering of alert data into the markup string the control plane displays.
//!
//! The control plane silently drops variable values longer than
//! [`ALERT_MAX_LEN`], so bounded rendering is all-or-nothing per record: a
//! record that would push the output over the ceiling is left out entirely.

use crate::AlertSet;

use super::source::ApiFailure;

/// Hard ceiling on the rendered alert value, including the outer quotes.
pub const ALERT_MAX_LEN: usize = 500;

/// At most this many records are rendered, regardless of length budget.
const MAX_RECORDS: usize = 5;

const BREAK: &str = "<br>";

const ENABLED_BANNER: &str =
    "<span style='color: SpringGreen;'><b><u>Weather Alerts Enabled</u></b></span>";
const ENABLED_BANNER_COMPACT: &str = "<span style='color: SpringGreen;'><b>WX Alerts</b></span>";
const DISABLED_BANNER: &str =
    "<span style='color: darkorange;'><b><u>Weather Alerts Disabled</u></b></span>";
const NO_ALERTS: &str = "<span style='color: #FF0000;'>No Alerts</span>";

/// Render an alert set into the quoted markup value for one node.
///
/// With `max_length` supplied the compact banner is used and records are
/// appended only while the total output (outer quotes included) stays within
/// the budget. Without it the full banner is used and only the record cap
/// applies.
pub fn render(
    enabled: bool,
    set: &AlertSet,
    custom_link: Option<&str>,
    max_length: Option<usize>,
) -> String {
    if !enabled {
        return quoted(DISABLED_BANNER);
    }

    if !set.is_active() {
        return no_alerts_form();
    }

    let banner = if max_length.is_some() {
        ENABLED_BANNER_COMPACT
    } else {
        ENABLED_BANNER
    };

    let mut body = banner.to_string();
    let mut appended = 0;

    for record in set.alerts.iter().take(MAX_RECORDS) {
        let piece = render_record(&record.event, record.severity.color(), custom_link);

        // total length with this record included, quotes and all
        let candidate = body.len() + BREAK.len() + piece.len() + 2;
        if let Some(max) = max_length
            && candidate > max
        {
            break;
        }

        body.push_str(BREAK);
        body.push_str(&piece);
        appended += 1;
    }

    if appended == 0 {
        return no_alerts_form();
    }

    quoted(&body)
}

/// Visible placeholder for a failed API fetch.
pub fn placeholder(failure: ApiFailure) -> String {
    let text = match failure {
        ApiFailure::Timeout => "Alert API Timeout",
        ApiFailure::Offline => "Alert API Offline",
        ApiFailure::Error => "Alert API Error",
    };
    quoted(&format!("<span style='color: #FF0000;'><b>{text}</b></span>"))
}

fn no_alerts_form() -> String {
    quoted(&format!("{ENABLED_BANNER}{BREAK}{NO_ALERTS}"))
}

fn render_record(event: &str, color: &str, custom_link: Option<&str>) -> String {
    let body = format!("<span style='color: {color};'><b>{event}</b></span>");
    match custom_link {
        Some(link) => {
            format!("<a target='WX ALERT' href='{link}' style='color: inherit;'>{body}</a>")
        }
        None => body,
    }
}

fn quoted(markup: &str) -> String {
    format!("\"{markup}\"")
}
