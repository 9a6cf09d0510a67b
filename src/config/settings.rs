//! Salesforce destination settings.
//!
//! Key names follow the settings document the routing pipeline hands to
//! each destination (`clientId`, `events.identify[].salesforce_object`,
//! ...). snake_case aliases are accepted so the same block reads
//! naturally in TOML.

use super::ConfigError;
use crate::credentials::Credentials;
use crate::event::EventKind;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Settings for one Salesforce destination.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesforceSettings {
    #[serde(default, alias = "client_id")]
    pub client_id: String,
    #[serde(default, alias = "client_secret", skip_serializing)]
    pub client_secret: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Instance base URL; defaults to the na1 instance when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub events: EventRules,
}

impl SalesforceSettings {
    /// Validates the settings and returns the credential set.
    ///
    /// Runs before any network call: a missing credential or a malformed
    /// rule fails here, never at request time.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.validate()?;
        Ok(Credentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.username.clone(),
            self.password.clone(),
        ))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Credentials::new(
            self.client_id.as_str(),
            self.client_secret.as_str(),
            self.username.as_str(),
            self.password.as_str(),
        )
        .validate()?;

        for kind in [EventKind::Identify, EventKind::Track] {
            for (index, rule) in self.events.rules_for(kind).iter().enumerate() {
                if !is_valid_object_name(&rule.object) {
                    return Err(ConfigError::Invalid(format!(
                        "events.{}[{}]: invalid salesforce_object '{}'",
                        kind, index, rule.object
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SalesforceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesforceSettings")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("endpoint", &self.endpoint)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Configured rule lists, one per call type.
///
/// When `identify` is left out entirely, identify calls create a Lead from
/// the standard traits. An explicit empty list disables identify writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRules {
    #[serde(default = "default_identify_rules")]
    pub identify: Vec<EventMapping>,
    #[serde(default)]
    pub track: Vec<EventMapping>,
}

impl Default for EventRules {
    fn default() -> Self {
        Self {
            identify: default_identify_rules(),
            track: Vec::new(),
        }
    }
}

fn default_identify_rules() -> Vec<EventMapping> {
    vec![EventMapping {
        object: "Lead".to_string(),
        event_name: None,
        field_map: [
            ("companyName", "Company"),
            ("email", "Email"),
            ("firstName", "FirstName"),
            ("lastName", "LastName"),
        ]
        .into_iter()
        .collect(),
    }]
}

impl EventRules {
    pub fn rules_for(&self, kind: EventKind) -> &[EventMapping] {
        match kind {
            EventKind::Identify => &self.identify,
            EventKind::Track => &self.track,
        }
    }
}

/// One destination object and how to fill it from an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventMapping {
    /// sObject API name, e.g. `Lead`, `Contact`, `Signup__c`
    #[serde(rename = "salesforce_object", alias = "object")]
    pub object: String,

    /// Track event this rule is restricted to; `None` matches every event
    #[serde(default)]
    pub event_name: Option<String>,

    /// Source path → destination field
    #[serde(rename = "map", default)]
    pub field_map: FieldMap,
}

impl EventMapping {
    /// Identify rules always apply. Track rules apply when they carry no
    /// event name or when it equals the call's event name exactly.
    pub fn applies_to(&self, kind: EventKind, event_name: Option<&str>) -> bool {
        match kind {
            EventKind::Identify => true,
            EventKind::Track => match &self.event_name {
                None => true,
                Some(expected) => event_name == Some(expected.as_str()),
            },
        }
    }
}

/// Ordered source-path → destination-field pairs.
///
/// Entries keep the order of the settings document, whatever the format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(source, destination)| (source.as_str(), destination.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, D: Into<String>> FromIterator<(S, D)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (S, D)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(source, destination)| (source.into(), destination.into()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of source paths to destination field names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((source, destination)) = access.next_entry::<String, String>()? {
                    entries.push((source, destination));
                }
                Ok(FieldMap(entries))
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (source, destination) in &self.0 {
            map.serialize_entry(source, destination)?;
        }
        map.end()
    }
}

/// sObject API names: letters, digits and underscores, starting with a letter.
fn is_valid_object_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings_json() -> serde_json::Value {
        json!({
            "clientId": "id",
            "clientSecret": "secret",
            "username": "test@example.com",
            "password": "pass",
            "events": {
                "identify": [{
                    "salesforce_object": "Lead",
                    "event_name": null,
                    "map": {
                        "firstName": "FirstName",
                        "lastName": "LastName",
                        "email": "Email",
                        "traits.company.name": "Company"
                    }
                }],
                "track": [{
                    "salesforce_object": "Contact",
                    "event_name": "Sign Up",
                    "map": {
                        "properties.firstName": "FirstName",
                        "properties.lastName": "LastName",
                        "properties.email": "Email"
                    }
                }]
            }
        })
    }

    #[test]
    fn test_settings_deserialization() {
        let settings: SalesforceSettings = serde_json::from_value(settings_json()).unwrap();
        assert_eq!(settings.client_id, "id");
        assert_eq!(settings.endpoint, None);
        assert_eq!(settings.events.identify.len(), 1);
        assert_eq!(settings.events.track[0].object, "Contact");
        assert_eq!(settings.events.track[0].event_name.as_deref(), Some("Sign Up"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_field_map_keeps_document_order() {
        let settings: SalesforceSettings = serde_json::from_value(settings_json()).unwrap();
        let fields: Vec<(&str, &str)> = settings.events.identify[0].field_map.iter().collect();
        assert_eq!(
            fields,
            vec![
                ("firstName", "FirstName"),
                ("lastName", "LastName"),
                ("email", "Email"),
                ("traits.company.name", "Company"),
            ]
        );
    }

    #[test]
    fn test_missing_client_id_fails_validation() {
        let mut value = settings_json();
        value.as_object_mut().unwrap().remove("clientId");
        let settings: SalesforceSettings = serde_json::from_value(value).unwrap();

        assert_eq!(
            settings.credentials().unwrap_err(),
            ConfigError::MissingSetting("clientId")
        );
    }

    #[test]
    fn test_invalid_object_name_fails_validation() {
        let mut settings: SalesforceSettings = serde_json::from_value(settings_json()).unwrap();
        settings.events.track[0].object = "../oauth2/token".to_string();

        match settings.validate().unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("events.track[0]")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_identify_rules_default_to_lead() {
        let settings: SalesforceSettings = serde_json::from_value(json!({
            "clientId": "id",
            "events": {"track": []}
        }))
        .unwrap();
        let identify = settings.events.rules_for(EventKind::Identify);
        assert_eq!(identify.len(), 1);
        assert_eq!(identify[0].object, "Lead");
        let fields: Vec<(&str, &str)> = identify[0].field_map.iter().collect();
        assert_eq!(
            fields,
            vec![
                ("companyName", "Company"),
                ("email", "Email"),
                ("firstName", "FirstName"),
                ("lastName", "LastName"),
            ]
        );

        // No events block at all
        let settings: SalesforceSettings = serde_json::from_value(json!({"clientId": "id"})).unwrap();
        assert_eq!(settings.events.identify[0].object, "Lead");
    }

    #[test]
    fn test_explicit_empty_identify_rules_stay_empty() {
        let settings: SalesforceSettings = serde_json::from_value(json!({
            "clientId": "id",
            "events": {"identify": []}
        }))
        .unwrap();
        assert!(settings.events.identify.is_empty());
    }

    #[test]
    fn test_object_names() {
        assert!(is_valid_object_name("Lead"));
        assert!(is_valid_object_name("Signup__c"));
        assert!(!is_valid_object_name(""));
        assert!(!is_valid_object_name("_Lead"));
        assert!(!is_valid_object_name("Lead/1"));
    }

    #[test]
    fn test_applies_to() {
        let rule = EventMapping {
            object: "Contact".to_string(),
            event_name: Some("Sign Up".to_string()),
            field_map: FieldMap::default(),
        };
        assert!(rule.applies_to(EventKind::Track, Some("Sign Up")));
        assert!(!rule.applies_to(EventKind::Track, Some("Login")));
        assert!(!rule.applies_to(EventKind::Track, None));
        // Identify ignores event names
        assert!(rule.applies_to(EventKind::Identify, None));

        let catch_all = EventMapping {
            event_name: None,
            ..rule
        };
        assert!(catch_all.applies_to(EventKind::Track, Some("Login")));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let settings: SalesforceSettings = serde_json::from_value(settings_json()).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("pass\""));
    }
}
