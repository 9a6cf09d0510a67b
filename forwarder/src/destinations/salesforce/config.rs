use relay::config::{ConfigError, EventRules, ForwardingConfig, SalesforceSettings};
use relay::credentials::Credentials;

pub const DEFAULT_ENDPOINT: &str = "https://na1.salesforce.com";
pub const API_VERSION: &str = "v42.0";
pub const TOKEN_PATH: &str = "/services/oauth2/token";

/// Error code Salesforce returns when a bearer token is expired or revoked.
pub const INVALID_SESSION_ID: &str = "INVALID_SESSION_ID";

/// Path of the create endpoint for an sObject.
pub fn sobject_path(object: &str) -> String {
    format!("/services/data/{}/sobjects/{}", API_VERSION, object)
}

/// Validated Salesforce destination configuration.
#[derive(Debug, Clone)]
pub struct SalesforceConfig {
    /// Instance base URL, without a trailing slash
    pub endpoint: String,
    pub credentials: Credentials,
    pub rules: EventRules,
    pub max_session_retries: u32,
}

impl SalesforceConfig {
    /// Validates the settings block and resolves defaults.
    pub fn from_settings(
        settings: &SalesforceSettings,
        forwarding: &ForwardingConfig,
    ) -> Result<Self, ConfigError> {
        let credentials = settings.credentials()?;

        let endpoint = settings
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "endpoint '{}' must be an http(s) URL",
                endpoint
            )));
        }

        Ok(Self {
            endpoint,
            credentials,
            rules: settings.events.clone(),
            max_session_retries: forwarding.max_session_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SalesforceSettings {
        SalesforceSettings {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_ENDPOINT, "https://na1.salesforce.com");
        assert_eq!(TOKEN_PATH, "/services/oauth2/token");
        assert_eq!(sobject_path("Lead"), "/services/data/v42.0/sobjects/Lead");
    }

    #[test]
    fn test_default_endpoint() {
        let config = SalesforceConfig::from_settings(&settings(), &ForwardingConfig::default())
            .unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_session_retries, 1);
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let mut settings = settings();
        settings.endpoint = Some("https://eu1.salesforce.com/".to_string());

        let config =
            SalesforceConfig::from_settings(&settings, &ForwardingConfig::default()).unwrap();
        assert_eq!(config.endpoint, "https://eu1.salesforce.com");
    }

    #[test]
    fn test_invalid_endpoint() {
        let mut settings = settings();
        settings.endpoint = Some("eu1.salesforce.com".to_string());

        let err =
            SalesforceConfig::from_settings(&settings, &ForwardingConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_credentials() {
        let mut settings = settings();
        settings.client_id = String::new();

        let err =
            SalesforceConfig::from_settings(&settings, &ForwardingConfig::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingSetting("clientId"));
    }
}
