//! The `{"__cls__": tag, "__mbr__": payload}` envelope.

use crate::error::{CodecError, CodecResult};
use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};

/// Reserved key holding the type tag of an envelope.
pub const CLASS_KEY: &str = "__cls__";

/// Reserved key holding the payload of an envelope.
pub const MEMBER_KEY: &str = "__mbr__";

/// A record type with a stable wire tag.
pub trait Tagged {
    /// Dotted tag naming this type on the wire, unique across the registry.
    const TAG: &'static str;
}

/// An envelope whose payload has not been decoded yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// The type tag.
    #[serde(rename = "__cls__")]
    pub tag: String,
    /// The undecoded payload object.
    #[serde(rename = "__mbr__", default)]
    pub payload: Value,
}

impl RawEnvelope {
    /// Creates a raw envelope.
    pub fn new(tag: impl Into<String>, payload: Value) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// Reads an envelope out of a JSON value.
    pub fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Object(mut map) => {
                let tag = match map.remove(CLASS_KEY) {
                    Some(Value::String(tag)) => tag,
                    Some(_) => {
                        return Err(CodecError::invalid_envelope(format!(
                            "`{CLASS_KEY}` must be a string"
                        )))
                    }
                    None => {
                        return Err(CodecError::invalid_envelope(format!(
                            "missing `{CLASS_KEY}`"
                        )))
                    }
                };
                let payload = map.remove(MEMBER_KEY).unwrap_or(Value::Null);
                Ok(Self { tag, payload })
            }
            other => Err(CodecError::invalid_envelope(format!(
                "expected an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns the payload, with a missing or null payload read as an empty object.
    pub fn into_payload(self) -> Value {
        match self.payload {
            Value::Null => Value::Object(Map::new()),
            payload => payload,
        }
    }
}

/// Borrowed envelope used when serializing a value under a known tag.
pub struct TaggedRef<'a, T: ?Sized> {
    tag: &'a str,
    payload: &'a T,
}

impl<'a, T: ?Sized> TaggedRef<'a, T> {
    /// Pairs a payload with its tag.
    pub fn new(tag: &'a str, payload: &'a T) -> Self {
        Self { tag, payload }
    }
}

impl<T: Serialize + ?Sized> Serialize for TaggedRef<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(CLASS_KEY, self.tag)?;
        map.serialize_entry(MEMBER_KEY, self.payload)?;
        map.end()
    }
}

/// A value of one concrete record type, carried inside an envelope.
///
/// Decoding rejects any tag other than `T::TAG`. Use a family enum for
/// positions that accept several record types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope<T>(pub T);

impl<T> Envelope<T> {
    /// Wraps a value.
    pub fn new(value: T) -> Self {
        Envelope(value)
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Envelope<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Envelope<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Envelope<T> {
    fn from(value: T) -> Self {
        Envelope(value)
    }
}

impl<T: Tagged + Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedRef::new(T::TAG, &self.0).serialize(serializer)
    }
}

impl<'de, T: Tagged + DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;
        if raw.tag != T::TAG {
            return Err(de::Error::custom(CodecError::unexpected_type(
                raw.tag,
                T::TAG,
            )));
        }
        T::deserialize(raw.into_payload())
            .map(Envelope)
            .map_err(de::Error::custom)
    }
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Pen {
        #[serde(skip_serializing_if = "Field::is_absent")]
        width: Field<f64>,
    }

    impl Tagged for Pen {
        const TAG: &'static str = "test.Pen";
    }

    #[test]
    fn envelope_shape() {
        let pen = Envelope(Pen {
            width: Field::Value(0.5),
        });
        let value = serde_json::to_value(&pen).unwrap();
        assert_eq!(value, json!({"__cls__": "test.Pen", "__mbr__": {"width": 0.5}}));
    }

    #[test]
    fn envelope_rejects_other_tag() {
        let err = serde_json::from_value::<Envelope<Pen>>(
            json!({"__cls__": "test.Brush", "__mbr__": {}}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("test.Brush"));
    }

    #[test]
    fn missing_payload_reads_as_empty() {
        let pen: Envelope<Pen> = serde_json::from_value(json!({"__cls__": "test.Pen"})).unwrap();
        assert!(pen.width.is_absent());
    }

    #[test]
    fn raw_envelope_from_value() {
        let raw = RawEnvelope::from_value(json!({"__cls__": "a.B", "__mbr__": {"x": 1}})).unwrap();
        assert_eq!(raw.tag, "a.B");
        assert_eq!(raw.into_payload(), json!({"x": 1}));

        assert!(matches!(
            RawEnvelope::from_value(json!([1, 2])),
            Err(CodecError::InvalidEnvelope { .. })
        ));
        assert!(matches!(
            RawEnvelope::from_value(json!({"__cls__": 3})),
            Err(CodecError::InvalidEnvelope { .. })
        ));
        assert!(matches!(
            RawEnvelope::from_value(json!({"__mbr__": {}})),
            Err(CodecError::InvalidEnvelope { .. })
        ));
    }
}
