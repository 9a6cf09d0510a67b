use relay::config::{EventMapping, FieldMap};
use relay::{EventKind, FieldSource};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One record to write: destination field → value.
///
/// Paths that resolved to nothing stay in the record as `None` so callers
/// can see which fields were missing; they are left out of the JSON body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutboundRecord {
    fields: Vec<(String, Option<Value>)>,
}

impl OutboundRecord {
    /// Sets a field. A repeated destination field keeps its first position
    /// and takes the latest value.
    pub fn insert(&mut self, field: &str, value: Option<Value>) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Destination fields whose source path resolved to nothing.
    pub fn missing_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.as_str())
    }
}

impl Serialize for OutboundRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.fields.iter().filter(|(_, value)| value.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (name, value) in &self.fields {
            if let Some(value) = value {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// Evaluates every field map entry against the payload of a `kind` call.
pub fn build_record<S: FieldSource + ?Sized>(
    field_map: &FieldMap,
    kind: EventKind,
    source: &S,
) -> OutboundRecord {
    let mut record = OutboundRecord::default();
    for (path, field) in field_map.iter() {
        record.insert(field, source.resolve_as(kind, path));
    }
    record
}

/// A record bound for one destination object.
#[derive(Debug)]
pub struct PlannedWrite<'a> {
    pub object: &'a str,
    pub record: OutboundRecord,
}

/// Builds one write per applicable rule, in rule order.
pub fn plan_writes<'a, S: FieldSource + ?Sized>(
    rules: &'a [EventMapping],
    kind: EventKind,
    event_name: Option<&str>,
    source: &S,
) -> Vec<PlannedWrite<'a>> {
    rules
        .iter()
        .filter(|rule| rule.applies_to(kind, event_name))
        .map(|rule| PlannedWrite {
            object: rule.object.as_str(),
            record: build_record(&rule.field_map, kind, source),
        })
        .collect()
}
