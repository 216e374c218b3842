//! Extraction of a newly created monitor's id from the `Location` header.
//!
//! The create call does not return the monitor in its body; the id is only
//! available as the last segment of `<base>/monitors/<id>`. The match is
//! anchored on the configured base URL so a changed URL shape fails loudly
//! instead of yielding a wrong id.

use regex::Regex;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct LocationPattern {
    regex: Regex,
}

impl LocationPattern {
    /// Build the pattern for monitors living under `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = base_url.trim_end_matches('/');
        let pattern = format!(r"^{}/monitors/([A-Za-z0-9_.~-]+)$", regex::escape(base));
        let regex = Regex::new(&pattern)
            .map_err(|e| ApiError::InvalidArgument(format!("base url {base_url:?}: {e}")))?;
        Ok(Self { regex })
    }

    /// Return the monitor id carried by a `Location` header value.
    pub fn extract_id(&self, location: Option<&str>) -> Result<String, ApiError> {
        let location = location
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::ProtocolError("missing Location header".to_string()))?;

        self.regex
            .captures(location)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
            .ok_or_else(|| {
                ApiError::ProtocolError(format!(
                    "Location header {location:?} does not name a monitor"
                ))
            })
    }
}
