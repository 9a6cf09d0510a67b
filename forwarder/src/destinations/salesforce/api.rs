use reqwest::{Client, StatusCode};
use relay::credentials::Credentials;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::auth::TokenProvider;
use super::config::{sobject_path, INVALID_SESSION_ID, TOKEN_PATH};
use super::mapping::OutboundRecord;
use crate::error::ForwardError;
use crate::types::DestinationResponse;
use async_trait::async_trait;

/// OAuth token response. Every field is optional so error bodies returned
/// with a 2xx status still parse.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    instance_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// One entry of a REST API error array.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// HTTP client for the Salesforce REST API.
pub struct SalesforceClient {
    http_client: Client,
    endpoint: String,
    credentials: Credentials,
}

impl SalesforceClient {
    /// `endpoint` is the instance base URL without a trailing slash.
    pub fn new(endpoint: String, credentials: Credentials) -> Result<Self, ForwardError> {
        let http_client = Client::builder()
            .user_agent("relay-forwarder/1.0")
            .build()?;
        Ok(Self {
            http_client,
            endpoint,
            credentials,
        })
    }

    /// Performs the OAuth2 password grant and returns the access token.
    pub async fn request_token(&self) -> Result<String, ForwardError> {
        let url = format!("{}{}", self.endpoint, TOKEN_PATH);
        debug!(url = %url, username = %self.credentials.username, "Requesting bearer token");

        let response = self
            .http_client
            .post(&url)
            .header("Accept", "application/json")
            .form(&self.credentials.password_grant_form())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ForwardError::Authentication(describe_auth_failure(
                status, &body,
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ForwardError::Authentication(format!("unreadable token response: {}", e))
        })?;
        match token.access_token {
            Some(access_token) if !access_token.is_empty() => {
                debug!(instance_url = ?token.instance_url, "Token grant succeeded");
                Ok(access_token)
            }
            _ => Err(ForwardError::Authentication(
                token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| "token response has no access_token".to_string()),
            )),
        }
    }

    /// Creates one record of type `object`.
    pub async fn create_record(
        &self,
        token: &str,
        object: &str,
        record: &OutboundRecord,
    ) -> Result<DestinationResponse, ForwardError> {
        let url = format!("{}{}", self.endpoint, sobject_path(object));
        let missing: Vec<&str> = record.missing_fields().collect();
        debug!(object = %object, fields = record.len(), missing = ?missing, "Creating record");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_failure(object, status.as_u16(), &body));
        }

        Ok(DestinationResponse {
            object: object.to_string(),
            status: status.as_u16(),
            body: serde_json::from_str(&body).unwrap_or(Value::String(body)),
        })
    }
}

#[async_trait]
impl TokenProvider for SalesforceClient {
    async fn fetch_token(&self) -> Result<String, ForwardError> {
        self.request_token().await
    }
}

/// Maps a failed write to a connector-level error.
///
/// The body must be a non-empty JSON array of `{errorCode, message}`.
/// `INVALID_SESSION_ID` anywhere in it means the token has to be replaced.
/// Otherwise the first entry is reported.
pub fn classify_failure(object: &str, status: u16, body: &str) -> ForwardError {
    let errors: Vec<ApiError> = match serde_json::from_str(body) {
        Ok(errors) => errors,
        Err(e) => {
            return ForwardError::MalformedResponse {
                object: object.to_string(),
                status,
                reason: e.to_string(),
            }
        }
    };

    if errors.iter().any(|e| e.error_code == INVALID_SESSION_ID) {
        return ForwardError::SessionExpired { retries: 0 };
    }

    match errors.into_iter().next() {
        Some(first) => ForwardError::DestinationRejected {
            object: object.to_string(),
            status,
            code: first.error_code,
            message: if first.fields.is_empty() {
                first.message
            } else {
                format!("{} (fields: {})", first.message, first.fields.join(", "))
            },
        },
        None => ForwardError::MalformedResponse {
            object: object.to_string(),
            status,
            reason: "empty error array".to_string(),
        },
    }
}

/// Prefers the grant's `error_description`, falling back to status and body.
fn describe_auth_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenResponse>(body) {
        Ok(TokenResponse {
            error_description: Some(description),
            ..
        }) => description,
        Ok(TokenResponse {
            error: Some(error), ..
        }) => error,
        _ => format!("token endpoint returned {}: {}", status, body),
    }
}
