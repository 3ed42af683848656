use std::{
    borrow::Cow,
    collections::{BTreeSet, HashMap},
};

use bincode::config::Configuration;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use time::OffsetDateTime;

use crate::value::{unix_nanos, SessionValue, Value};

/// Leading byte of every encoded payload.
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("value type `{0}` is not registered with the session codec")]
    Unregistered(String),
    #[error("failed to encode session payload")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode session payload")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("session payload is empty")]
    Empty,
    #[error("unsupported session payload version {0}")]
    UnsupportedVersion(u8),
    #[error("{0} unexpected trailing bytes in session payload")]
    TrailingBytes(usize),
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    #[serde(with = "unix_nanos")]
    deadline: OffsetDateTime,
    values: &'a HashMap<String, Value>,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(with = "unix_nanos")]
    deadline: OffsetDateTime,
    values: HashMap<String, Value>,
}

/// The persisted part of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub deadline: OffsetDateTime,
    pub values: HashMap<String, Value>,
}

/// Binary encoding of session payloads.
///
/// Built-in [`Value`] variants always round-trip. [`Value::Custom`] entries
/// are only accepted, in either direction, when their type name has been
/// registered.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    types: BTreeSet<Cow<'static, str>>,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: SessionValue>(&mut self) -> &mut Self {
        self.types.insert(Cow::Borrowed(T::TYPE_NAME));
        self
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    pub fn encode(
        &self,
        deadline: OffsetDateTime,
        values: &HashMap<String, Value>,
    ) -> Result<Vec<u8>, CodecError> {
        self.check_registered(values)?;

        let body = encode_value(&PayloadRef { deadline, values })?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let (version, body) = bytes.split_first().ok_or(CodecError::Empty)?;
        if *version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(*version));
        }

        let payload: Payload = decode_value(body)?;
        self.check_registered(&payload.values)?;

        Ok(Decoded {
            deadline: payload.deadline,
            values: payload.values,
        })
    }

    fn check_registered(&self, values: &HashMap<String, Value>) -> Result<(), CodecError> {
        let unregistered = values
            .values()
            .filter_map(Value::as_custom)
            .find(|custom| !self.is_registered(custom.type_name()));

        match unregistered {
            Some(custom) => Err(CodecError::Unregistered(custom.type_name().to_owned())),
            None => Ok(()),
        }
    }
}

fn config() -> Configuration {
    bincode::config::standard()
}

pub(crate) fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(value, config())?)
}

pub(crate) fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (value, read) = bincode::serde::decode_from_slice(bytes, config())?;
    if read != bytes.len() {
        return Err(CodecError::TrailingBytes(bytes.len() - read));
    }
    Ok(value)
}
