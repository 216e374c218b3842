//! "Changed since last apply" tracking for optional fields.
//!
//! The reconciler never decides on its own whether an optional field moved;
//! the caller hands it a `Changes` implementation, usually computed by its
//! own plan step.

use std::collections::HashSet;

use crate::resource::MonitorSpec;

/// Fields whose presence in an update depends on whether they changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ValidationString,
    VerifySsl,
    BypassHeadRequest,
    TreatRedirectAsFailure,
    Script,
    ScriptLocations,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::ValidationString,
        Field::VerifySsl,
        Field::BypassHeadRequest,
        Field::TreatRedirectAsFailure,
        Field::Script,
        Field::ScriptLocations,
    ];
}

pub trait Changes {
    fn has_change(&self, field: Field) -> bool;
}

impl<F: Fn(Field) -> bool> Changes for F {
    fn has_change(&self, field: Field) -> bool {
        self(field)
    }
}

/// Explicit set of changed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFields(HashSet<Field>);

impl ChangedFields {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self(Field::ALL.into_iter().collect())
    }

    pub fn with(mut self, field: Field) -> Self {
        self.0.insert(field);
        self
    }

    /// Fields that differ between the last applied spec and the new one.
    pub fn between(prior: &MonitorSpec, desired: &MonitorSpec) -> Self {
        let mut changed = HashSet::new();
        if prior.validation_string != desired.validation_string {
            changed.insert(Field::ValidationString);
        }
        if prior.verify_ssl != desired.verify_ssl {
            changed.insert(Field::VerifySsl);
        }
        if prior.bypass_head_request != desired.bypass_head_request {
            changed.insert(Field::BypassHeadRequest);
        }
        if prior.treat_redirect_as_failure != desired.treat_redirect_as_failure {
            changed.insert(Field::TreatRedirectAsFailure);
        }
        if prior.script != desired.script {
            changed.insert(Field::Script);
        }
        if prior.script_locations != desired.script_locations {
            changed.insert(Field::ScriptLocations);
        }
        Self(changed)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Changes for ChangedFields {
    fn has_change(&self, field: Field) -> bool {
        self.0.contains(&field)
    }
}
