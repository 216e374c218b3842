//! Request builders, response parsers and the blocking monitor client.
//!
//! # Design
//! `MonitorRequests` carries only static configuration. Each operation is
//! split into a `build_*` method producing an `HttpRequest` and a `parse_*`
//! method consuming an `HttpResponse`, so the wire contract is testable
//! without any I/O. `SyntheticsClient` pairs it with a `Transport` and runs
//! the multi-step operations (create and update both re-fetch the monitor,
//! since neither response carries it).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::config::{ClientConfig, API_KEY_HEADER};
use crate::error::ApiError;
use crate::fingerprint::{Fingerprint, Fingerprinter, Sha256Fingerprinter};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::location::LocationPattern;
use crate::types::{
    CreateMonitor, Monitor, MonitorPage, RawMonitor, RawMonitorPage, ScriptBody, ScriptLocation,
    ScriptPayload, UpdateMonitor,
};

/// Remote state of a monitor's script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptState {
    /// A script is attached; only its fingerprint is exposed.
    Present(Fingerprint),
    /// No script is attached. Not an error.
    NotFound,
}

impl ScriptState {
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            ScriptState::Present(fingerprint) => Some(fingerprint),
            ScriptState::NotFound => None,
        }
    }
}

/// Stateless request builder and response parser for the monitor API.
#[derive(Debug, Clone)]
pub struct MonitorRequests {
    config: ClientConfig,
    location: LocationPattern,
}

impl MonitorRequests {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let location = LocationPattern::new(config.base_url())?;
        Ok(Self { config, location })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![(API_KEY_HEADER.to_string(), self.config.api_key().to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path,
            headers,
            body,
        }
    }

    fn monitor_path(&self, id: &str) -> Result<String, ApiError> {
        validate_id(id)?;
        Ok(format!("{}/monitors/{id}", self.config.base_url()))
    }

    pub fn build_list_monitors(&self, offset: u32, limit: u32) -> HttpRequest {
        let mut query = Vec::new();
        if offset > 0 {
            query.push(format!("offset={offset}"));
        }
        if limit > 0 {
            query.push(format!("limit={limit}"));
        }
        let mut path = format!("{}/monitors", self.config.base_url());
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        self.request(HttpMethod::Get, path, None)
    }

    pub fn build_get_monitor(&self, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Get, self.monitor_path(id)?, None))
    }

    pub fn build_create_monitor(&self, input: &CreateMonitor) -> Result<HttpRequest, ApiError> {
        if input.locations.is_empty() {
            return Err(ApiError::InvalidArgument(
                "monitor needs at least one location".to_string(),
            ));
        }
        let body = to_json(input)?;
        Ok(self.request(
            HttpMethod::Post,
            format!("{}/monitors", self.config.base_url()),
            Some(body),
        ))
    }

    pub fn build_update_monitor(
        &self,
        id: &str,
        input: &UpdateMonitor,
    ) -> Result<HttpRequest, ApiError> {
        let path = self.monitor_path(id)?;
        if input.locations.is_empty() {
            return Err(ApiError::InvalidArgument(
                "monitor needs at least one location".to_string(),
            ));
        }
        Ok(self.request(HttpMethod::Patch, path, Some(to_json(input)?)))
    }

    pub fn build_delete_monitor(&self, id: &str) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Delete, self.monitor_path(id)?, None))
    }

    pub fn build_get_script(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let path = format!("{}/script", self.monitor_path(id)?);
        Ok(self.request(HttpMethod::Get, path, None))
    }

    pub fn build_update_script(
        &self,
        id: &str,
        content: &str,
        locations: &[ScriptLocation],
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("{}/script", self.monitor_path(id)?);
        let payload = ScriptPayload {
            script_text: BASE64.encode(content.as_bytes()),
            script_locations: locations,
        };
        Ok(self.request(HttpMethod::Put, path, Some(to_json(&payload)?)))
    }

    pub fn parse_list_monitors(&self, response: HttpResponse) -> Result<MonitorPage, ApiError> {
        check_status(&response, 200)?;
        let page: RawMonitorPage = from_json(&response.body)?;
        let monitors = page
            .monitors
            .into_iter()
            .map(RawMonitor::into_monitor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MonitorPage {
            monitors,
            count: page.count,
        })
    }

    pub fn parse_get_monitor(&self, response: HttpResponse) -> Result<Monitor, ApiError> {
        check_not_found(&response)?;
        check_status(&response, 200)?;
        let raw: RawMonitor = from_json(&response.body)?;
        raw.into_monitor()
    }

    /// Returns the id of the created monitor, taken from `Location`.
    pub fn parse_create_monitor(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response, 201)?;
        self.location.extract_id(response.header("Location"))
    }

    pub fn parse_update_monitor(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_not_found(&response)?;
        check_success(&response)
    }

    /// A 404 is a `RemoteError` here, not `NotFound`: deleting an absent
    /// monitor fails.
    pub fn parse_delete_monitor(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)
    }

    /// A 404 or an empty script both mean no script is attached.
    pub fn parse_get_script(
        &self,
        response: HttpResponse,
        fingerprinter: &impl Fingerprinter,
    ) -> Result<ScriptState, ApiError> {
        if response.status == 404 {
            return Ok(ScriptState::NotFound);
        }
        check_status(&response, 200)?;
        let body: ScriptBody = from_json(&response.body)?;
        let bytes = BASE64
            .decode(body.script_text.trim())
            .map_err(|e| ApiError::ProtocolError(format!("script text is not base64: {e}")))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| ApiError::ProtocolError(format!("script text is not UTF-8: {e}")))?;
        if content.is_empty() {
            return Ok(ScriptState::NotFound);
        }
        Ok(ScriptState::Present(fingerprinter.fingerprint(&content)))
    }

    pub fn parse_update_script(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_not_found(&response)?;
        check_success(&response)
    }
}

fn validate_id(id: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::InvalidArgument("monitor id is empty".to_string()));
    }
    if id
        .chars()
        .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
    {
        return Err(ApiError::InvalidArgument(format!("invalid monitor id: {id:?}")));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::ProtocolError(e.to_string()))
}

fn remote_error(response: &HttpResponse) -> ApiError {
    ApiError::RemoteError {
        status: response.status,
        body: response.body.clone(),
    }
}

fn check_not_found(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(remote_error(response))
}

/// Require exactly `expected`. Any other 2xx means the server did something
/// this client does not understand.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.is_success() {
        return Err(ApiError::ProtocolError(format!(
            "expected HTTP {expected}, got {}",
            response.status
        )));
    }
    Err(remote_error(response))
}

/// Blocking client for the synthetics monitor API.
///
/// Holds only immutable configuration and the injected transport, so one
/// instance can serve many monitors. Nothing is retried.
#[derive(Debug, Clone)]
pub struct SyntheticsClient<T, F = Sha256Fingerprinter> {
    requests: MonitorRequests,
    transport: T,
    fingerprinter: F,
}

impl<T: Transport> SyntheticsClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        Self::with_fingerprinter(config, transport, Sha256Fingerprinter)
    }
}

impl<T: Transport, F: Fingerprinter> SyntheticsClient<T, F> {
    pub fn with_fingerprinter(
        config: ClientConfig,
        transport: T,
        fingerprinter: F,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            requests: MonitorRequests::new(config)?,
            transport,
            fingerprinter,
        })
    }

    pub fn requests(&self) -> &MonitorRequests {
        &self.requests
    }

    pub fn fingerprinter(&self) -> &F {
        &self.fingerprinter
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "sending synthetics request");
        let response = self.transport.execute(request)?;
        debug!(%method, %path, status = response.status, "received synthetics response");
        Ok(response)
    }

    /// List monitors. A zero `offset` or `limit` leaves the server default.
    pub fn list_monitors(&self, offset: u32, limit: u32) -> Result<MonitorPage, ApiError> {
        let response = self.send(self.requests.build_list_monitors(offset, limit))?;
        self.requests.parse_list_monitors(response)
    }

    pub fn get_monitor(&self, id: &str) -> Result<Monitor, ApiError> {
        let response = self.send(self.requests.build_get_monitor(id)?)?;
        self.requests.parse_get_monitor(response)
    }

    /// Create a monitor and return only its id, taken from `Location`.
    pub fn post_monitor(&self, input: &CreateMonitor) -> Result<String, ApiError> {
        let response = self.send(self.requests.build_create_monitor(input)?)?;
        let id = self.requests.parse_create_monitor(response)?;
        debug!(%id, name = %input.name, "monitor created");
        Ok(id)
    }

    /// Create a monitor and return it as re-fetched from the server.
    ///
    /// If the re-fetch fails the monitor still exists; use `post_monitor`
    /// when the id must survive that failure.
    pub fn create_monitor(&self, input: &CreateMonitor) -> Result<Monitor, ApiError> {
        let id = self.post_monitor(input)?;
        self.get_monitor(&id)
    }

    /// Update a monitor and return it as re-fetched from the server.
    pub fn update_monitor(&self, id: &str, input: &UpdateMonitor) -> Result<Monitor, ApiError> {
        let response = self.send(self.requests.build_update_monitor(id, input)?)?;
        self.requests.parse_update_monitor(response)?;
        self.get_monitor(id)
    }

    pub fn delete_monitor(&self, id: &str) -> Result<(), ApiError> {
        let response = self.send(self.requests.build_delete_monitor(id)?)?;
        self.requests.parse_delete_monitor(response)
    }

    pub fn get_script(&self, id: &str) -> Result<ScriptState, ApiError> {
        let response = self.send(self.requests.build_get_script(id)?)?;
        self.requests.parse_get_script(response, &self.fingerprinter)
    }

    pub fn update_script(
        &self,
        id: &str,
        content: &str,
        locations: &[ScriptLocation],
    ) -> Result<(), ApiError> {
        let response = self.send(self.requests.build_update_script(id, content, locations)?)?;
        self.requests.parse_update_script(response)
    }
}
