//! Wire DTOs for the synthetics monitor API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! the end-to-end tests catch schema drift between the two crates.
//!
//! Optional monitor options are `Option<T>` with `skip_serializing_if`, so an
//! unset field is omitted from the body while `Some(false)` or `Some("")` is
//! sent as-is. `UpdateMonitor` has no `type` field: a monitor's type cannot be
//! changed once created.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Wire format of `createdAt` / `modifiedAt`, e.g. `2016-06-08T21:32:25.114+0000`.
/// The fractional part is optional.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Parse a monitor timestamp in the API's fixed textual format.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, ApiError> {
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|source| ApiError::ParseError {
        value: raw.to_string(),
        source,
    })
}

/// How often a monitor runs, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Frequency {
    OneMinute,
    FiveMinutes,
    TenMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    SixHours,
    TwelveHours,
    OneDay,
}

impl Frequency {
    pub const ALL: [Frequency; 9] = [
        Frequency::OneMinute,
        Frequency::FiveMinutes,
        Frequency::TenMinutes,
        Frequency::FifteenMinutes,
        Frequency::ThirtyMinutes,
        Frequency::OneHour,
        Frequency::SixHours,
        Frequency::TwelveHours,
        Frequency::OneDay,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Frequency::OneMinute => 1,
            Frequency::FiveMinutes => 5,
            Frequency::TenMinutes => 10,
            Frequency::FifteenMinutes => 15,
            Frequency::ThirtyMinutes => 30,
            Frequency::OneHour => 60,
            Frequency::SixHours => 360,
            Frequency::TwelveHours => 720,
            Frequency::OneDay => 1440,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported monitor frequency {0} (expected one of 1, 5, 10, 15, 30, 60, 360, 720, 1440)")]
pub struct InvalidFrequency(pub u32);

impl TryFrom<u32> for Frequency {
    type Error = InvalidFrequency;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.minutes() == minutes)
            .ok_or(InvalidFrequency(minutes))
    }
}

impl From<Frequency> for u32 {
    fn from(frequency: Frequency) -> Self {
        frequency.minutes()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// Kind of check a monitor performs. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorType {
    Simple,
    Browser,
    ScriptApi,
    ScriptBrowser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorStatus {
    #[default]
    Enabled,
    Muted,
    Disabled,
}

/// Optional per-monitor settings. Each field is tri-state: `None` is absent
/// on the wire, `Some(v)` is sent even when `v` is `false` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorOptions {
    #[serde(rename = "validationString", default, skip_serializing_if = "Option::is_none")]
    pub validation_string: Option<String>,
    #[serde(rename = "verifySSL", default, skip_serializing_if = "Option::is_none")]
    pub verify_ssl: Option<bool>,
    #[serde(rename = "bypassHEADRequest", default, skip_serializing_if = "Option::is_none")]
    pub bypass_head_request: Option<bool>,
    #[serde(
        rename = "treatRedirectAsFailure",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub treat_redirect_as_failure: Option<bool>,
}

impl MonitorOptions {
    pub fn is_empty(&self) -> bool {
        *self == MonitorOptions::default()
    }
}

/// A monitor as returned by the API, timestamps already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub monitor_type: MonitorType,
    pub frequency: Frequency,
    pub uri: String,
    pub locations: Vec<String>,
    pub status: MonitorStatus,
    pub sla_threshold: f64,
    pub options: MonitorOptions,
    pub user_id: Option<u64>,
    pub api_version: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub modified_at: Option<DateTime<FixedOffset>>,
}

/// Monitor as it appears on the wire, before timestamp parsing.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMonitor {
    id: String,
    name: String,
    #[serde(rename = "type")]
    monitor_type: MonitorType,
    frequency: Frequency,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    locations: Vec<String>,
    status: MonitorStatus,
    #[serde(rename = "slaThreshold", default)]
    sla_threshold: f64,
    #[serde(default)]
    options: MonitorOptions,
    #[serde(rename = "userId", default)]
    user_id: Option<u64>,
    #[serde(rename = "apiVersion", default)]
    api_version: Option<String>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
    #[serde(rename = "modifiedAt", default)]
    modified_at: Option<String>,
}

impl RawMonitor {
    pub(crate) fn into_monitor(self) -> Result<Monitor, ApiError> {
        let created_at = self.created_at.as_deref().map(parse_timestamp).transpose()?;
        let modified_at = self.modified_at.as_deref().map(parse_timestamp).transpose()?;
        Ok(Monitor {
            id: self.id,
            name: self.name,
            monitor_type: self.monitor_type,
            frequency: self.frequency,
            uri: self.uri,
            locations: self.locations,
            status: self.status,
            sla_threshold: self.sla_threshold,
            options: self.options,
            user_id: self.user_id,
            api_version: self.api_version,
            created_at,
            modified_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMonitorPage {
    #[serde(default)]
    pub(crate) monitors: Vec<RawMonitor>,
    #[serde(default)]
    pub(crate) count: u64,
}

/// One page of `list_monitors`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorPage {
    pub monitors: Vec<Monitor>,
    /// Total number of monitors in the account, not just this page.
    pub count: u64,
}

/// Request payload for creating a monitor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMonitor {
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    pub frequency: Frequency,
    pub uri: String,
    pub locations: Vec<String>,
    pub status: MonitorStatus,
    #[serde(rename = "slaThreshold")]
    pub sla_threshold: f64,
    #[serde(skip_serializing_if = "MonitorOptions::is_empty")]
    pub options: MonitorOptions,
}

/// Request payload for updating a monitor. Unset options are left untouched
/// by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateMonitor {
    pub name: String,
    pub frequency: Frequency,
    pub uri: String,
    pub locations: Vec<String>,
    pub status: MonitorStatus,
    #[serde(rename = "slaThreshold")]
    pub sla_threshold: f64,
    #[serde(skip_serializing_if = "MonitorOptions::is_empty")]
    pub options: MonitorOptions,
}

/// A private location allowed to run a script, with its shared secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLocation {
    pub name: String,
    pub hmac: String,
}

impl fmt::Debug for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptLocation")
            .field("name", &self.name)
            .field("hmac", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ScriptPayload<'a> {
    #[serde(rename = "scriptText")]
    pub(crate) script_text: String,
    #[serde(rename = "scriptLocations", skip_serializing_if = "no_locations")]
    pub(crate) script_locations: &'a [ScriptLocation],
}

fn no_locations(locations: &&[ScriptLocation]) -> bool {
    locations.is_empty()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScriptBody {
    #[serde(rename = "scriptText")]
    pub(crate) script_text: String,
}
