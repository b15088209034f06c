//! # Persistence Module
//!
//! Saves the operator's mapping to a remote HTTP endpoint.
//!
//! The payload is the flat JSON object built by the mapping editor:
//!
//! ```json
//! {"button_0": "jump", "axis_0": "steer"}
//! ```
//!
//! A save counts as acknowledged when the endpoint answers 2xx with a JSON body
//! whose `status` field is `"success"`. Failed saves are not retried.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{PadlinkError, Result};
use crate::mapping::{MappingPayload, MappingStore};

/// Acknowledgement value expected in the response `status` field.
const STATUS_SUCCESS: &str = "success";

/// Mapping store backed by an HTTP `POST`.
#[derive(Debug, Clone)]
pub struct HttpMappingStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMappingStore {
    /// Creates a store posting to `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padlink::persistence::HttpMappingStore;
    /// use std::time::Duration;
    ///
    /// let store = HttpMappingStore::new("http://127.0.0.1:8000/save-mapping", Duration::from_secs(2))?;
    /// # Ok::<(), padlink::error::PadlinkError>(())
    /// ```
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PadlinkError::Persistence(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MappingStore for HttpMappingStore {
    async fn save(&self, payload: &MappingPayload) -> Result<()> {
        debug!("Posting mapping ({} entries) to {}", payload.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| PadlinkError::Persistence(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PadlinkError::Persistence(format!("Server returned {}", status)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PadlinkError::Persistence(format!("Invalid response body: {}", e)))?;

        match body.get("status").and_then(|v| v.as_str()) {
            Some(STATUS_SUCCESS) => Ok(()),
            Some(other) => Err(PadlinkError::Persistence(format!(
                "Server reported status '{}'",
                other
            ))),
            None => Err(PadlinkError::Persistence(
                "Response has no status field".to_string(),
            )),
        }
    }
}
