//! Lifecycle operations mapping a desired `MonitorSpec` onto API calls.
//!
//! # Design
//! A monitor and its script are separate remote resources. `create` and
//! `update` write the monitor first and the script second; a script failure
//! after a successful monitor write is reported as
//! `ReconcileError::ScriptProvisioning`, carrying the monitor id, so the
//! caller can retry only the script step or tear the monitor down. A failed
//! read right after creation also carries the new id.
//!
//! Two outcomes that look like failures on the wire are not errors here: a
//! missing monitor in `exists`, and a missing script in `read`.

use tracing::info;

use crate::changes::{Changes, Field};
use crate::client::{ScriptState, SyntheticsClient};
use crate::error::{ApiError, ReconcileError};
use crate::fingerprint::{Fingerprinter, Sha256Fingerprinter};
use crate::http::Transport;
use crate::resource::{MonitorSpec, MonitorState};
use crate::types::{MonitorOptions, UpdateMonitor};

#[derive(Debug, Clone)]
pub struct Reconciler<T, F = Sha256Fingerprinter> {
    client: SyntheticsClient<T, F>,
}

impl<T: Transport, F: Fingerprinter> Reconciler<T, F> {
    pub fn new(client: SyntheticsClient<T, F>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SyntheticsClient<T, F> {
        &self.client
    }

    /// Create the monitor, then attach its script if the spec has one.
    pub fn create(&self, spec: &MonitorSpec) -> Result<MonitorState, ReconcileError> {
        spec.validate().map_err(ReconcileError::InvalidSpec)?;

        let id = self
            .client
            .post_monitor(&spec.to_create())
            .map_err(|e| ReconcileError::api("create", "", e))?;
        info!(%id, name = %spec.name, "created monitor");
        let monitor = self
            .client
            .get_monitor(&id)
            .map_err(|e| ReconcileError::api("read created", &id, e))?;
        let mut state = MonitorState::from_monitor(monitor);

        if spec.script.is_some() {
            self.write_script(&mut state, spec)?;
        }
        Ok(state)
    }

    /// Fetch the monitor and its script fingerprint.
    pub fn read(&self, id: &str) -> Result<MonitorState, ReconcileError> {
        let monitor = self
            .client
            .get_monitor(id)
            .map_err(|e| ReconcileError::api("read", id, e))?;
        let mut state = MonitorState::from_monitor(monitor);
        self.observe_script(&mut state)?;
        Ok(state)
    }

    /// Push `spec` to an existing monitor.
    ///
    /// Required fields are always sent. Optional fields are sent only when
    /// `changes` reports them changed. The monitor type is never sent.
    pub fn update(
        &self,
        id: &str,
        spec: &MonitorSpec,
        changes: &impl Changes,
    ) -> Result<MonitorState, ReconcileError> {
        spec.validate().map_err(ReconcileError::InvalidSpec)?;

        let input = update_payload(spec, changes);
        let monitor = self
            .client
            .update_monitor(id, &input)
            .map_err(|e| ReconcileError::api("update", id, e))?;
        let mut state = MonitorState::from_monitor(monitor);
        info!(%id, "updated monitor");

        let script_changed =
            changes.has_change(Field::Script) || changes.has_change(Field::ScriptLocations);
        if script_changed {
            self.write_script(&mut state, spec)?;
        } else {
            self.observe_script(&mut state)?;
        }
        Ok(state)
    }

    /// Delete the monitor. A monitor that is already gone is an error.
    pub fn delete(&self, id: &str) -> Result<(), ReconcileError> {
        self.client
            .delete_monitor(id)
            .map_err(|e| ReconcileError::api("delete", id, e))?;
        info!(%id, "deleted monitor");
        Ok(())
    }

    pub fn exists(&self, id: &str) -> Result<bool, ReconcileError> {
        match self.client.get_monitor(id) {
            Ok(_) => Ok(true),
            Err(ApiError::NotFound) => Ok(false),
            Err(e) => Err(ReconcileError::api("check", id, e)),
        }
    }

    /// Upload the spec's script. A spec without one uploads empty content,
    /// which detaches the remote script.
    fn write_script(
        &self,
        state: &mut MonitorState,
        spec: &MonitorSpec,
    ) -> Result<(), ReconcileError> {
        let content = spec.script.as_deref().unwrap_or_default();
        self.client
            .update_script(&state.id, content, &spec.script_locations)
            .map_err(|source| ReconcileError::ScriptProvisioning {
                id: state.id.clone(),
                source,
            })?;
        state.script = spec
            .script
            .as_deref()
            .map(|script| self.client.fingerprinter().fingerprint(script));
        state.script_locations = Some(spec.script_locations.clone());
        Ok(())
    }

    fn observe_script(&self, state: &mut MonitorState) -> Result<(), ReconcileError> {
        let script = self
            .client
            .get_script(&state.id)
            .map_err(|e| ReconcileError::api("read script of", &state.id, e))?;
        match script {
            ScriptState::Present(fingerprint) => {
                state.script = Some(fingerprint);
                state.script_locations = None;
            }
            ScriptState::NotFound => {
                state.script = None;
                state.script_locations = Some(Vec::new());
            }
        }
        Ok(())
    }
}

/// Build the update body. Bool options that changed back to unset are sent
/// as `false`, which is also the server default.
fn update_payload(spec: &MonitorSpec, changes: &impl Changes) -> UpdateMonitor {
    let mut options = MonitorOptions::default();
    if changes.has_change(Field::ValidationString) {
        options.validation_string = spec.validation_string.clone();
    }
    if changes.has_change(Field::VerifySsl) {
        options.verify_ssl = Some(spec.verify_ssl.unwrap_or(false));
    }
    if changes.has_change(Field::BypassHeadRequest) {
        options.bypass_head_request = Some(spec.bypass_head_request.unwrap_or(false));
    }
    if changes.has_change(Field::TreatRedirectAsFailure) {
        options.treat_redirect_as_failure = Some(spec.treat_redirect_as_failure.unwrap_or(false));
    }

    UpdateMonitor {
        name: spec.name.clone(),
        frequency: spec.frequency,
        uri: spec.uri.clone(),
        locations: spec.locations.clone(),
        status: spec.status,
        sla_threshold: spec.sla_threshold,
        options,
    }
}
