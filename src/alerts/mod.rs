//! Severe-weather alert pipeline: fetch from the remote status API, then
//! render into the bounded markup string delivered to each node.

pub mod format;
pub mod source;

pub use format::{ALERT_MAX_LEN, placeholder, render};
pub use source::{AlertResolution, AlertSourceClient, AlertStatus, ApiFailure};
