use std::borrow::Cow;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use time::OffsetDateTime;

use crate::codec::{self, CodecError};

/// An application type that can be stored in a session.
///
/// `TYPE_NAME` identifies the type inside encoded payloads, so it must stay
/// stable across deployments that share a store. The type also has to be
/// registered with the manager (see
/// [`SessionManagerBuilder::register_type`](crate::SessionManagerBuilder::register_type))
/// before a session holding it can be committed or loaded.
pub trait SessionValue: Serialize + DeserializeOwned {
    const TYPE_NAME: &'static str;
}

/// A value held in the session map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Timestamp(#[serde(with = "unix_nanos")] OffsetDateTime),
    Custom(CustomValue),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            Self::Custom(value) => Some(value),
            _ => None,
        }
    }

    /// Wraps an application value, serializing it eagerly.
    pub fn custom<T: SessionValue>(value: &T) -> Result<Self, CodecError> {
        CustomValue::new(value).map(Self::Custom)
    }
}

/// A serialized [`SessionValue`] tagged with its type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomValue {
    type_name: Cow<'static, str>,
    bytes: Vec<u8>,
}

impl CustomValue {
    pub fn new<T: SessionValue>(value: &T) -> Result<Self, CodecError> {
        Ok(Self {
            type_name: Cow::Borrowed(T::TYPE_NAME),
            bytes: codec::encode_value(value)?,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Decodes the value as `T`; `None` when the type names differ or the
    /// bytes don't decode.
    pub fn decode<T: SessionValue>(&self) -> Option<T> {
        if self.type_name != T::TYPE_NAME {
            return None;
        }
        codec::decode_value(&self.bytes).ok()
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<OffsetDateTime> for Value {
    fn from(value: OffsetDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<CustomValue> for Value {
    fn from(value: CustomValue) -> Self {
        Self::Custom(value)
    }
}

/// Timestamps travel as nanoseconds since the Unix epoch.
pub(crate) mod unix_nanos {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub(crate) fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i128(value.unix_timestamp_nanos())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let nanos = i128::deserialize(deserializer)?;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(D::Error::custom)
    }
}
