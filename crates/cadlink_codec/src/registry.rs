//! Registry mapping wire tags to record types.

use crate::envelope::{RawEnvelope, Tagged, TaggedRef, CLASS_KEY, MEMBER_KEY};
use crate::error::{CodecError, CodecResult};
use serde::de::{self, DeserializeOwned};
use serde::{ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Decodes an envelope payload into the registry's record type.
pub type DecodeFn<R> = fn(Value) -> Result<R, serde_json::Error>;

/// One registered record type.
pub struct Registration<R> {
    tag: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn<R>,
}

impl<R> Registration<R> {
    /// The wire tag.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The Rust type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The registered type's id.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Decodes a payload object into the concrete type.
    ///
    /// Keys missing from the payload decode as absent fields.
    pub fn decode(&self, payload: Value) -> CodecResult<R> {
        (self.decode)(payload).map_err(|e| {
            CodecError::decoding_failed(format!("{}: {}", self.tag, e))
        })
    }
}

fn decode_as<T, R>(payload: Value) -> Result<R, serde_json::Error>
where
    T: DeserializeOwned + Into<R>,
{
    serde_json::from_value::<T>(payload).map(Into::into)
}

/// A bidirectional map between wire tags and record types.
///
/// `R` is the sum type every registered record converts into. The registry
/// is filled once by explicit `register` calls and is read-only afterwards.
///
/// # Example
///
/// ```
/// use cadlink_codec::{Tagged, TypeRegistry};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Marker;
///
/// impl Tagged for Marker {
///     const TAG: &'static str = "demo.Marker";
/// }
///
/// let mut registry: TypeRegistry<Marker> = TypeRegistry::new();
/// registry.register::<Marker>().unwrap();
/// assert!(registry.register::<Marker>().is_err());
/// assert_eq!(registry.tag_of::<Marker>(), Some("demo.Marker"));
/// ```
pub struct TypeRegistry<R> {
    by_tag: HashMap<&'static str, Registration<R>>,
    by_type: HashMap<TypeId, &'static str>,
}

impl<R> TypeRegistry<R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_tag: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// Registers `T` under its declared tag.
    ///
    /// # Errors
    ///
    /// Fails if the tag or the type is already registered.
    pub fn register<T>(&mut self) -> CodecResult<()>
    where
        T: Tagged + DeserializeOwned + Into<R> + 'static,
    {
        self.register_as::<T>(T::TAG)
    }

    /// Registers `T` under an explicit tag.
    ///
    /// # Errors
    ///
    /// Fails if the tag or the type is already registered.
    pub fn register_as<T>(&mut self, tag: &'static str) -> CodecResult<()>
    where
        T: DeserializeOwned + Into<R> + 'static,
    {
        if let Some(existing) = self.by_tag.get(tag) {
            return Err(CodecError::DuplicateTag {
                tag: tag.to_string(),
                existing: existing.type_name.to_string(),
            });
        }
        let type_id = TypeId::of::<T>();
        if self.by_type.contains_key(&type_id) {
            return Err(CodecError::DuplicateType {
                type_name: type_name::<T>().to_string(),
            });
        }

        self.by_type.insert(type_id, tag);
        self.by_tag.insert(
            tag,
            Registration {
                tag,
                type_id,
                type_name: type_name::<T>(),
                decode: decode_as::<T, R>,
            },
        );
        Ok(())
    }

    /// Looks up the registration for a tag.
    pub fn resolve(&self, tag: &str) -> Option<&Registration<R>> {
        self.by_tag.get(tag)
    }

    /// Returns the tag `T` was registered under.
    pub fn tag_of<T: 'static>(&self) -> Option<&'static str> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns true if the tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Returns all registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.by_tag.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Decodes an envelope into its concrete record.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] if the tag is not registered, or
    /// a decoding error if the payload does not fit the registered type.
    pub fn decode(&self, envelope: RawEnvelope) -> CodecResult<R> {
        let registration = self
            .resolve(&envelope.tag)
            .ok_or_else(|| CodecError::unknown_type(envelope.tag.as_str()))?;
        registration.decode(envelope.into_payload())
    }

    /// Checks every envelope tag in a JSON tree against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] for the first unregistered tag
    /// and [`CodecError::InvalidEnvelope`] for a non-string tag.
    pub fn validate(&self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Object(map) => {
                if let Some(tag) = map.get(CLASS_KEY) {
                    let tag = tag.as_str().ok_or_else(|| {
                        CodecError::invalid_envelope(format!("`{CLASS_KEY}` must be a string"))
                    })?;
                    if !self.contains(tag) {
                        return Err(CodecError::unknown_type(tag));
                    }
                    if let Some(payload) = map.get(MEMBER_KEY) {
                        self.validate(payload)?;
                    }
                    return Ok(());
                }
                map.values().try_for_each(|v| self.validate(v))
            }
            Value::Array(items) => items.iter().try_for_each(|v| self.validate(v)),
            _ => Ok(()),
        }
    }
}

impl<R> Default for TypeRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for TypeRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Serializes one variant of a polymorphic family inside its envelope.
///
/// The tag comes from the registry, so encoding an unregistered type fails.
pub fn serialize_polymorphic<S, T, R>(
    registry: &TypeRegistry<R>,
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + 'static,
{
    let tag = registry.tag_of::<T>().ok_or_else(|| {
        ser::Error::custom(CodecError::UnregisteredType {
            type_name: type_name::<T>().to_string(),
        })
    })?;
    TaggedRef::new(tag, value).serialize(serializer)
}

/// Deserializes an envelope whose concrete type is picked by its tag.
///
/// `narrow` converts the registry's record type into the family accepted
/// at this position, handing the record back if it is not a member.
pub fn deserialize_polymorphic<'de, D, R, F>(
    registry: &TypeRegistry<R>,
    deserializer: D,
    family: &str,
    narrow: impl FnOnce(R) -> Result<F, R>,
) -> Result<F, D::Error>
where
    D: Deserializer<'de>,
{
    let envelope = RawEnvelope::deserialize(deserializer)?;
    let tag = envelope.tag.clone();
    let record = registry.decode(envelope).map_err(de::Error::custom)?;
    narrow(record).map_err(|_| de::Error::custom(CodecError::unexpected_type(tag, family)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::OnceLock;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Square {
        #[serde(skip_serializing_if = "Field::is_absent")]
        side: Field<f64>,
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Disc {
        #[serde(skip_serializing_if = "Field::is_absent")]
        radius: Field<f64>,
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Label {
        #[serde(skip_serializing_if = "Field::is_absent")]
        text: Field<String>,
    }

    impl Tagged for Square {
        const TAG: &'static str = "test.Square";
    }
    impl Tagged for Disc {
        const TAG: &'static str = "test.Disc";
    }
    impl Tagged for Label {
        const TAG: &'static str = "test.Label";
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Any {
        Square(Square),
        Disc(Disc),
        Label(Label),
    }

    impl From<Square> for Any {
        fn from(v: Square) -> Self {
            Any::Square(v)
        }
    }
    impl From<Disc> for Any {
        fn from(v: Disc) -> Self {
            Any::Disc(v)
        }
    }
    impl From<Label> for Any {
        fn from(v: Label) -> Self {
            Any::Label(v)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Shape {
        Square(Square),
        Disc(Disc),
    }

    fn registry() -> &'static TypeRegistry<Any> {
        static REGISTRY: OnceLock<TypeRegistry<Any>> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let mut registry = TypeRegistry::new();
            registry.register::<Square>().unwrap();
            registry.register::<Disc>().unwrap();
            registry.register::<Label>().unwrap();
            registry
        })
    }

    impl Serialize for Shape {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Shape::Square(v) => serialize_polymorphic(registry(), v, serializer),
                Shape::Disc(v) => serialize_polymorphic(registry(), v, serializer),
            }
        }
    }

    impl<'de> Deserialize<'de> for Shape {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserialize_polymorphic(registry(), deserializer, "Shape", |any| match any {
                Any::Square(v) => Ok(Shape::Square(v)),
                Any::Disc(v) => Ok(Shape::Disc(v)),
                other => Err(other),
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Sheet {
        #[serde(skip_serializing_if = "Field::is_absent")]
        main: Field<Shape>,
        #[serde(skip_serializing_if = "Field::is_absent")]
        shapes: Field<Vec<Shape>>,
        #[serde(skip_serializing_if = "Field::is_absent")]
        named: Field<BTreeMap<String, Shape>>,
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry: TypeRegistry<Any> = TypeRegistry::new();
        registry.register::<Square>().unwrap();
        assert!(matches!(
            registry.register_as::<Disc>("test.Square"),
            Err(CodecError::DuplicateTag { .. })
        ));
        assert!(matches!(
            registry.register_as::<Square>("test.Other"),
            Err(CodecError::DuplicateType { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_and_tag_of() {
        let registry = registry();
        assert_eq!(registry.tag_of::<Disc>(), Some("test.Disc"));
        assert_eq!(registry.tag_of::<Shape>(), None);
        assert!(registry.resolve("test.Nothing").is_none());
        let registration = registry.resolve("test.Label").unwrap();
        assert_eq!(registration.tag(), "test.Label");
        assert_eq!(registration.type_id(), TypeId::of::<Label>());
        assert_eq!(registry.tags(), vec!["test.Disc", "test.Label", "test.Square"]);
    }

    #[test]
    fn nested_polymorphic_roundtrip() {
        let mut named = BTreeMap::new();
        named.insert(
            "unit".to_string(),
            Shape::Disc(Disc {
                radius: Field::Value(1.0),
            }),
        );
        let sheet = Sheet {
            main: Field::Value(Shape::Square(Square::default())),
            shapes: Field::Value(vec![
                Shape::Disc(Disc {
                    radius: Field::Null,
                }),
                Shape::Square(Square {
                    side: Field::Value(2.5),
                }),
            ]),
            named: Field::Value(named),
        };

        let json = serde_json::to_string(&sheet).unwrap();
        let decoded: Sheet = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, sheet);
    }

    #[test]
    fn decode_picks_concrete_type() {
        let shape: Shape =
            serde_json::from_value(json!({"__cls__": "test.Disc", "__mbr__": {"radius": 3.0}}))
                .unwrap();
        assert_eq!(
            shape,
            Shape::Disc(Disc {
                radius: Field::Value(3.0)
            })
        );
    }

    #[test]
    fn decode_rejects_non_member() {
        let err = serde_json::from_value::<Shape>(json!({"__cls__": "test.Label", "__mbr__": {}}))
            .unwrap_err();
        assert!(err.to_string().contains("is not a Shape"));
    }

    #[test]
    fn validate_finds_nested_unknown_tag() {
        let doc = json!({
            "shapes": [
                {"__cls__": "test.Square", "__mbr__": {}},
                {"__cls__": "test.Hexagon", "__mbr__": {}}
            ]
        });
        assert_eq!(
            registry().validate(&doc),
            Err(CodecError::unknown_type("test.Hexagon"))
        );
        assert!(registry()
            .validate(&json!({"main": {"__cls__": "test.Disc"}}))
            .is_ok());
    }

    #[test]
    fn registry_decode_unknown() {
        let err = registry()
            .decode(RawEnvelope::new("test.Nope", json!({})))
            .unwrap_err();
        assert!(err.is_unknown_type());
    }
}
