//! Dot-path field resolution.
//!
//! Field maps address payload values with paths such as
//! `traits.company.name` or `properties.items.0.sku`. The mapping engine
//! only sees the [`FieldSource`] capability, never the payload's concrete
//! shape.

use super::{EventKind, RelayEvent};
use serde_json::Value;

/// Anything a field map can be evaluated against.
pub trait FieldSource {
    /// Resolves a dot-separated path to a value.
    ///
    /// Missing paths and explicit nulls both yield `None`; callers treat
    /// them as "no value", never as an error.
    fn resolve(&self, path: &str) -> Option<Value>;

    /// Resolves a path on behalf of a call of type `kind`.
    ///
    /// Sources whose lookup does not depend on the call type keep the
    /// default.
    fn resolve_as(&self, _kind: EventKind, path: &str) -> Option<Value> {
        self.resolve(path)
    }
}

/// Walks `path` through nested objects (and arrays, by numeric segment).
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

impl FieldSource for Value {
    fn resolve(&self, path: &str) -> Option<Value> {
        lookup(self, path).cloned()
    }
}

impl FieldSource for RelayEvent {
    /// Resolves against the event's own `type`.
    fn resolve(&self, path: &str) -> Option<Value> {
        self.resolve_with(self.kind(), path)
    }

    /// Resolution order:
    /// 1. the exact path against the envelope (`traits.company.name`)
    /// 2. the standard accessors (`email`, `firstName`, `companyName`, ...)
    /// 3. the call type's own bag: `traits` then `context.traits` for
    ///    identify, `properties` for track
    fn resolve_as(&self, kind: EventKind, path: &str) -> Option<Value> {
        self.resolve_with(Some(kind), path)
    }
}

impl RelayEvent {
    fn resolve_with(&self, kind: Option<EventKind>, path: &str) -> Option<Value> {
        if let Some(value) = self.resolve_exact(path) {
            return Some(value);
        }

        if let Some(value) = self.resolve_standard(path) {
            return Some(Value::String(value));
        }

        match kind? {
            EventKind::Identify => self
                .traits
                .as_ref()
                .and_then(|traits| lookup(traits, path))
                .or_else(|| {
                    self.context
                        .as_ref()
                        .and_then(|context| lookup(context, &format!("traits.{}", path)))
                })
                .cloned(),
            EventKind::Track => self
                .properties
                .as_ref()
                .and_then(|properties| lookup(properties, path))
                .cloned(),
        }
    }

    fn resolve_exact(&self, path: &str) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let string_field = |field: &Option<String>| field.clone().map(Value::String);
        let root = match head {
            "type" => Some(Value::String(self.event_type.clone())),
            "messageId" => string_field(&self.message_id),
            "userId" => string_field(&self.user_id),
            "anonymousId" => string_field(&self.anonymous_id),
            "event" => string_field(&self.event),
            "timestamp" => self.timestamp.clone(),
            "traits" => self.traits.clone(),
            "properties" => self.properties.clone(),
            "context" => self.context.clone(),
            other => self.extra.get(other).cloned(),
        }?;

        match rest {
            Some(rest) => lookup(&root, rest).cloned(),
            None if root.is_null() => None,
            None => Some(root),
        }
    }

    fn resolve_standard(&self, path: &str) -> Option<String> {
        match path {
            "email" => self.email(),
            "name" => self.name(),
            "firstName" => self.first_name(),
            "lastName" => self.last_name(),
            "companyName" => self.company_name(),
            "phone" => self.phone(),
            _ => None,
        }
    }
}
