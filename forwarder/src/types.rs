use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Response to a single successful record write.
///
/// Salesforce answers a create with `{"id": "...", "success": true,
/// "errors": []}`; a body that is not JSON is kept as a JSON string.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DestinationResponse {
    /// Destination object the record was written to
    pub object: String,

    /// HTTP status returned by the destination
    pub status: u16,

    /// Parsed response body
    pub body: Value,
}

impl DestinationResponse {
    /// Id of the created record, when the destination returned one.
    pub fn record_id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }
}

/// Per-destination forwarding counters, exposed by the ingestion API.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DestinationStatus {
    /// Last successful forward timestamp
    pub last_success: Option<DateTime<Utc>>,
    /// Last error message (if any)
    pub last_error: Option<String>,
    /// Total calls that completed without error (no-op forwards included)
    pub forwarded_count: u64,
    /// Total calls that failed
    pub error_count: u64,
}

impl DestinationStatus {
    pub fn record_success(&mut self) {
        self.forwarded_count += 1;
        self.last_success = Some(Utc::now());
    }

    pub fn record_error(&mut self, error: &str) {
        self.error_count += 1;
        self.last_error = Some(error.to_string());
    }
}
