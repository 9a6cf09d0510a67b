use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

mod resolve;
mod validation;

pub use resolve::{lookup, FieldSource};
pub use validation::{validate_and_prepare, ValidationError};

/// The two call types a destination receives from the routing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Identify,
    Track,
}

impl EventKind {
    /// Parses the envelope `type` field. Matching is case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "identify" => Some(EventKind::Identify),
            "track" => Some(EventKind::Track),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Identify => "identify",
            EventKind::Track => "track",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RelayEvent is a normalized analytics call as handed over by the router.
///
/// The envelope mirrors the common identify/track shape: a handful of
/// well-known top-level fields plus free-form `traits`, `properties` and
/// `context` objects. Unknown top-level fields are kept in `extra` so
/// field maps can still address them by path.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    /// Call type ("identify" or "track")
    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Producer message id, generated (UUIDv7) when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,

    /// Track event name (e.g. "Sign Up"); required for track calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Producer timestamp, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,

    /// Identify traits (must be an object when present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traits: Option<Value>,

    /// Track properties (must be an object when present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Any other top-level fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelayEvent {
    /// Returns the parsed call type, or `None` if `type` is not supported.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event_type)
    }

    /// Validates and prepares an event for forwarding.
    ///
    /// This method:
    /// - Validates the call type (identify or track)
    /// - Requires an event name on track calls
    /// - Validates traits/properties are JSON objects
    /// - Generates a UUIDv7 message id if missing
    pub fn validate_and_prepare(&mut self) -> Result<(), ValidationError> {
        validation::validate_and_prepare(self)
    }

    /// Email address: `traits.email`, then `properties.email`, then
    /// `context.traits.email`, then `userId` when it looks like an address.
    pub fn email(&self) -> Option<String> {
        self.traits
            .as_ref()
            .and_then(|traits| lookup(traits, "email"))
            .and_then(|value| value.as_str().map(str::to_string))
            .or_else(|| self.property_str("email"))
            .or_else(|| self.trait_str("email"))
            .or_else(|| {
                self.user_id
                    .as_ref()
                    .filter(|id| id.contains('@'))
                    .cloned()
            })
    }

    /// Full name: `traits.name`, else first and last name joined.
    pub fn name(&self) -> Option<String> {
        if let Some(name) = self.trait_str("name") {
            return Some(name);
        }
        match (self.trait_str("firstName"), self.trait_str("lastName")) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => None,
        }
    }

    /// First name: `traits.firstName`, else the first word of `traits.name`.
    pub fn first_name(&self) -> Option<String> {
        self.trait_str("firstName").or_else(|| {
            self.trait_str("name")
                .and_then(|name| name.split_whitespace().next().map(str::to_string))
        })
    }

    /// Last name: `traits.lastName`, else everything after the first word
    /// of `traits.name`.
    pub fn last_name(&self) -> Option<String> {
        self.trait_str("lastName").or_else(|| {
            self.trait_str("name").and_then(|name| {
                let (_, rest) = name.trim().split_once(char::is_whitespace)?;
                let rest = rest.trim();
                (!rest.is_empty()).then(|| rest.to_string())
            })
        })
    }

    /// Company name: `traits.company.name`, `traits.company` as a string,
    /// then `traits.companyName`.
    pub fn company_name(&self) -> Option<String> {
        self.trait_str("company.name")
            .or_else(|| self.trait_str("company"))
            .or_else(|| self.trait_str("companyName"))
    }

    pub fn phone(&self) -> Option<String> {
        self.trait_str("phone")
            .or_else(|| self.property_str("phone"))
    }

    /// String trait lookup, falling back to `context.traits`.
    fn trait_str(&self, path: &str) -> Option<String> {
        self.traits
            .as_ref()
            .and_then(|traits| lookup(traits, path))
            .or_else(|| {
                self.context
                    .as_ref()
                    .and_then(|context| lookup(context, &format!("traits.{}", path)))
            })
            .and_then(|value| value.as_str().map(str::to_string))
    }

    fn property_str(&self, path: &str) -> Option<String> {
        self.properties
            .as_ref()
            .and_then(|properties| lookup(properties, path))
            .and_then(|value| value.as_str().map(str::to_string))
    }
}
