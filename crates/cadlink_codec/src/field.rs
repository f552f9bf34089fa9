//! Three-state optional record fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A record field that distinguishes "not provided" from "explicitly cleared".
///
/// On the wire an [`Field::Absent`] field is omitted from its object, a
/// [`Field::Null`] field is written as JSON `null`, and a [`Field::Value`]
/// field is written as the value itself. Record structs pair this type with
/// `#[serde(default, skip_serializing_if = "Field::is_absent")]` so that a
/// missing key decodes back to `Absent`.
///
/// When a record is applied to a live object, `Absent` means "leave the live
/// property untouched" and anything else means "set it".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field<T> {
    /// The field was not provided.
    Absent,
    /// The field was provided as an explicit null.
    Null,
    /// The field was provided with a value.
    Value(T),
}

impl<T> Field<T> {
    /// Returns true if the field was not provided.
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// Returns true if the field was provided as an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// Returns true if the field was provided, either as null or as a value.
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Returns the value, if one was provided.
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value, if one was provided.
    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes the field and returns the value, if one was provided.
    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Converts from `&Field<T>` to `Field<&T>`.
    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Absent => Field::Absent,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(v),
        }
    }

    /// Maps the contained value, preserving absence and null.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Field::Absent => Field::Absent,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(f(v)),
        }
    }

    /// Returns `self` if present, otherwise `other`.
    pub fn or(self, other: Field<T>) -> Field<T> {
        if self.is_absent() {
            other
        } else {
            self
        }
    }

    /// Replaces the field with a value and returns the previous state.
    pub fn set(&mut self, value: T) -> Field<T> {
        std::mem::replace(self, Field::Value(value))
    }

    /// Takes the field out, leaving `Absent` in its place.
    pub fn take(&mut self) -> Field<T> {
        std::mem::replace(self, Field::Absent)
    }
}

impl<T: Copy> Field<T> {
    /// Returns the value or the given default when absent or null.
    pub fn value_or(&self, default: T) -> T {
        self.value().copied().unwrap_or(default)
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::Null,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => serializer.serialize_some(v),
            // Absent is normally skipped by the containing struct
            Field::Absent | Field::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}
