//! Event: the unit of data flowing through the pipeline.
//!
//! An [`Event`] combines a creation timestamp, an ordered tag set, and a bag
//! of dynamically-typed fields. Field lookup by name never fails: an absent
//! name yields [`serde_json::Value::Null`], which is the contract the
//! condition evaluator (see [`crate::core::condition`]) depends on.

use crate::error::MissingFieldError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A timestamped, tagged bag of fields.
///
/// `timestamp` and `tags` are reserved names: they are not stored in the
/// field map, but are synthesised by [`Event::get`] and included by
/// [`Event::to_json`] so that both accessors see a single flat view of the
/// event regardless of how the value is actually represented internally.
#[derive(Debug, Clone)]
pub struct Event {
    timestamp: DateTime<Utc>,
    tags: Vec<String>,
    fields: Map<String, Value>,
}

impl Event {
    /// Creates an empty event, stamped with the current UTC time.
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            tags: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Creates an event with an explicitly supplied timestamp, bypassing the
    /// "now" default. Mainly useful for input stages that know the true
    /// event time (e.g. a parsed log line) and for tests.
    pub fn with_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            tags: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Builds an event from an existing field map, stamped "now".
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            timestamp: Utc::now(),
            tags: Vec::new(),
            fields,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Sets (or overwrites) a field. `name` must not be `"timestamp"` or
    /// `"tags"`; those are reserved and have their own accessors.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Null-safe accessor used uniformly by the condition evaluator and the
    /// format engine: `tags` and `timestamp` resolve to their derived
    /// representation first, any other name falls back to the field map,
    /// and an absent name yields `Value::Null` rather than failing.
    pub fn get(&self, name: &str) -> Value {
        match name {
            "tags" => Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
            "timestamp" => Value::String(self.timestamp_iso()),
            _ => self.fields.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    /// Appends a tag. The tag sequence is created lazily; duplicates are
    /// permitted (no de-duplication requirement).
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Encodes the event as a JSON object. `timestamp` is emitted as an
    /// ISO-8601 string with microsecond precision; `tags` is omitted when
    /// empty and otherwise a JSON array of strings; every other field uses
    /// standard JSON encoding.
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("timestamp".to_string(), Value::String(self.timestamp_iso()));
        if !self.tags.is_empty() {
            object.insert(
                "tags".to_string(),
                Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(object)
    }

    /// Resolves `{name}` and `{0}`, `{1}`, … placeholders against this
    /// event's fields and `positional`. `{{` / `}}` render as literal braces.
    ///
    /// A placeholder may carry a `strftime`-style format specifier after a
    /// colon, honoured only for `timestamp` (e.g. `{timestamp:%Y}`); any
    /// other name with a specifier renders the resolved value as a plain
    /// string, ignoring the specifier.
    ///
    /// In default mode a missing name resolves to `""`. In `strict` mode a
    /// missing name fails with [`MissingFieldError`].
    pub fn format(
        &self,
        template: &str,
        positional: &[Value],
        strict: bool,
    ) -> Result<String, MissingFieldError> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            break;
                        }
                        placeholder.push(inner);
                    }
                    let (name, spec) = match placeholder.split_once(':') {
                        Some((n, s)) => (n, Some(s)),
                        None => (placeholder.as_str(), None),
                    };
                    out.push_str(&self.resolve_placeholder(name, spec, positional, strict)?);
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }

    fn resolve_placeholder(
        &self,
        name: &str,
        spec: Option<&str>,
        positional: &[Value],
        strict: bool,
    ) -> Result<String, MissingFieldError> {
        if let Ok(index) = name.parse::<usize>() {
            return match positional.get(index) {
                Some(value) => Ok(value_to_display(value)),
                None if strict => Err(MissingFieldError(name.to_string())),
                None => Ok(String::new()),
            };
        }

        if name == "timestamp" {
            return Ok(match spec {
                Some(pattern) => self.timestamp.format(pattern).to_string(),
                None => self.timestamp_iso(),
            });
        }

        let value = self.get(name);
        if value.is_null() && !self.fields.contains_key(name) {
            return if strict {
                Err(MissingFieldError(name.to_string()))
            } else {
                Ok(String::new())
            };
        }

        Ok(value_to_display(&value))
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_is_set_near_construction() {
        let before = Utc::now();
        let event = Event::new();
        let after = Utc::now();
        assert!(event.timestamp() >= before && event.timestamp() <= after);
    }

    #[test]
    fn missing_field_yields_null() {
        let event = Event::new();
        assert_eq!(event.get("nope"), Value::Null);
        assert!(event.tags().is_empty());
    }

    #[test]
    fn to_json_matches_reference_encoding() {
        let ts = Utc.with_ymd_and_hms(2013, 1, 1, 2, 34, 56).unwrap()
            + chrono::Duration::microseconds(789012);
        let mut event = Event::with_timestamp(ts);
        event.set_field("field", "x");

        let json = event.to_json();
        assert_eq!(
            json,
            serde_json::json!({
                "timestamp": "2013-01-01T02:34:56.789012",
                "field": "x",
            })
        );
    }

    #[test]
    fn format_default_mode_blanks_missing_names() {
        let event = Event::new();
        assert_eq!(event.format("{missing}", &[], false).unwrap(), "");
    }

    #[test]
    fn format_strict_mode_fails_on_missing_names() {
        let event = Event::new();
        assert!(event.format("{missing}", &[], true).is_err());
    }

    #[test]
    fn format_honours_timestamp_strftime_spec() {
        let ts = Utc.with_ymd_and_hms(2013, 1, 1, 2, 34, 56).unwrap();
        let event = Event::with_timestamp(ts);
        assert_eq!(event.format("{timestamp:%Y}", &[], false).unwrap(), "2013");
    }

    #[test]
    fn format_resolves_positional_and_named_placeholders() {
        let mut event = Event::new();
        event.set_field("severity", "error");
        let rendered = event
            .format("{0}: {severity}", &[Value::String("alert".into())], false)
            .unwrap();
        assert_eq!(rendered, "alert: error");
    }
}
