//! Synchronous reconciliation core for synthetic monitors.
//!
//! # Overview
//! Keeps a remote synthetics monitor, and the script attached to it, in line
//! with a declared `MonitorSpec`. `Reconciler` exposes the lifecycle
//! (`create`, `read`, `update`, `delete`, `exists`); `SyntheticsClient` is the
//! API client underneath it.
//!
//! # Design
//! - `MonitorRequests` builds `HttpRequest` values and parses `HttpResponse`
//!   values without I/O; `SyntheticsClient` runs them through an injected
//!   `Transport` (`UreqTransport` for real traffic).
//! - Configuration (`ClientConfig`) is immutable after construction; the
//!   client holds no per-monitor state.
//! - Script content is write-only. Its observable state is a `Fingerprint`.
//! - Wire DTOs are defined independently from the mock-server crate;
//!   end-to-end tests catch schema drift.

pub mod changes;
pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod http;
pub mod location;
pub mod reconciler;
pub mod resource;
pub mod types;

pub use changes::{ChangedFields, Changes, Field};
pub use client::{MonitorRequests, ScriptState, SyntheticsClient};
pub use config::ClientConfig;
pub use error::{ApiError, ReconcileError};
pub use fingerprint::{Fingerprint, Fingerprinter, Sha256Fingerprinter};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use location::LocationPattern;
pub use reconciler::Reconciler;
pub use resource::{MonitorSpec, MonitorState};
pub use types::{
    CreateMonitor, Frequency, Monitor, MonitorOptions, MonitorPage, MonitorStatus, MonitorType,
    ScriptLocation, UpdateMonitor,
};
