//! Desired and observed shapes of a monitor resource.
//!
//! `MonitorSpec` is what the caller declares; `MonitorState` is what the
//! reconciler reports back after talking to the API, in the same shape so the
//! caller can diff them field by field.

use crate::fingerprint::Fingerprint;
use crate::types::{
    CreateMonitor, Frequency, Monitor, MonitorOptions, MonitorStatus, MonitorType, ScriptLocation,
};

/// Desired configuration of one monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSpec {
    pub name: String,
    /// Fixed at creation. Changing it requires delete + create.
    pub monitor_type: MonitorType,
    pub frequency: Frequency,
    pub uri: String,
    pub locations: Vec<String>,
    pub status: MonitorStatus,
    pub sla_threshold: f64,
    pub validation_string: Option<String>,
    pub verify_ssl: Option<bool>,
    pub bypass_head_request: Option<bool>,
    pub treat_redirect_as_failure: Option<bool>,
    /// Script body. Write-only: it is never read back, only fingerprinted.
    pub script: Option<String>,
    pub script_locations: Vec<ScriptLocation>,
}

impl MonitorSpec {
    /// A spec with the required fields set and every optional field unset.
    pub fn new(
        name: impl Into<String>,
        monitor_type: MonitorType,
        frequency: Frequency,
        uri: impl Into<String>,
        locations: Vec<String>,
        status: MonitorStatus,
        sla_threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            monitor_type,
            frequency,
            uri: uri.into(),
            locations,
            status,
            sla_threshold,
            validation_string: None,
            verify_ssl: None,
            bypass_head_request: None,
            treat_redirect_as_failure: None,
            script: None,
            script_locations: Vec::new(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.locations.is_empty() {
            return Err("at least one location is required".to_string());
        }
        if !self.sla_threshold.is_finite() {
            return Err(format!("sla threshold {} is not a number", self.sla_threshold));
        }
        Ok(())
    }

    /// Options present in the spec, each one only if set.
    pub(crate) fn options(&self) -> MonitorOptions {
        MonitorOptions {
            validation_string: self.validation_string.clone(),
            verify_ssl: self.verify_ssl,
            bypass_head_request: self.bypass_head_request,
            treat_redirect_as_failure: self.treat_redirect_as_failure,
        }
    }

    pub(crate) fn to_create(&self) -> CreateMonitor {
        CreateMonitor {
            name: self.name.clone(),
            monitor_type: self.monitor_type,
            frequency: self.frequency,
            uri: self.uri.clone(),
            locations: self.locations.clone(),
            status: self.status,
            sla_threshold: self.sla_threshold,
            options: self.options(),
        }
    }
}

/// Observed state of one monitor, in desired-state shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState {
    pub id: String,
    pub name: String,
    pub monitor_type: MonitorType,
    pub frequency: Frequency,
    pub uri: String,
    pub locations: Vec<String>,
    pub status: MonitorStatus,
    pub sla_threshold: f64,
    pub validation_string: Option<String>,
    pub verify_ssl: Option<bool>,
    pub bypass_head_request: Option<bool>,
    pub treat_redirect_as_failure: Option<bool>,
    /// Fingerprint of the attached script, `None` when no script is attached.
    pub script: Option<Fingerprint>,
    /// `Some(vec![])` when known to be cleared, `None` when not observable:
    /// the API never returns script locations, so they are only known right
    /// after being written.
    pub script_locations: Option<Vec<ScriptLocation>>,
}

impl MonitorState {
    /// Map a fetched monitor; script fields start out cleared.
    pub fn from_monitor(monitor: Monitor) -> Self {
        let Monitor {
            id,
            name,
            monitor_type,
            frequency,
            uri,
            locations,
            status,
            sla_threshold,
            options,
            ..
        } = monitor;
        Self {
            id,
            name,
            monitor_type,
            frequency,
            uri,
            locations,
            status,
            sla_threshold,
            validation_string: options.validation_string,
            verify_ssl: options.verify_ssl,
            bypass_head_request: options.bypass_head_request,
            treat_redirect_as_failure: options.treat_redirect_as_failure,
            script: None,
            script_locations: Some(Vec::new()),
        }
    }

    /// True when every required field matches `spec`.
    pub fn matches_required(&self, spec: &MonitorSpec) -> bool {
        self.name == spec.name
            && self.monitor_type == spec.monitor_type
            && self.frequency == spec.frequency
            && self.uri == spec.uri
            && self.locations == spec.locations
            && self.status == spec.status
            && self.sla_threshold == spec.sla_threshold
    }
}
