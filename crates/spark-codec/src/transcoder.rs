//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Object-type codec translating JSON blocks to delimited protobuf."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Per-message conversion between JSON values and delimited protobuf bytes.

use std::fmt;
use std::marker::PhantomData;

use prost::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use spark_proto::{decode_checked, encode_checked, Bounded};
use tracing::trace;

use crate::delimit::{delimit, undelimit};
use crate::{CodecError, Result};

/// Converts one block type between its JSON and binary forms.
pub trait Transcoder: Send + Sync {
    /// Protobuf message name, e.g. `"Pid"`.
    fn name(&self) -> &'static str;

    /// Encode JSON values as a length-delimited protobuf payload.
    fn encode(&self, values: &Value) -> Result<Vec<u8>>;

    /// Decode a length-delimited protobuf payload into JSON values.
    fn decode(&self, encoded: &[u8]) -> Result<Value>;
}

/// [`Transcoder`] backed by a prost message type.
pub struct ProtobufTranscoder<M> {
    name: &'static str,
    _message: PhantomData<fn() -> M>,
}

impl<M> ProtobufTranscoder<M> {
    /// Create a transcoder reporting `name` in errors and listings.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _message: PhantomData,
        }
    }
}

impl<M> fmt::Debug for ProtobufTranscoder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtobufTranscoder")
            .field("name", &self.name)
            .finish()
    }
}

impl<M> Transcoder for ProtobufTranscoder<M>
where
    M: Message + Default + Bounded + Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, values: &Value) -> Result<Vec<u8>> {
        if !values.is_object() {
            return Err(CodecError::NotAnObject { message: self.name });
        }
        let message = M::deserialize(values).map_err(|source| CodecError::Json {
            message: self.name,
            source,
        })?;
        let payload = encode_checked(&message)?;
        trace!(message = self.name, bytes = payload.len(), "encoded block");
        Ok(delimit(&payload))
    }

    fn decode(&self, encoded: &[u8]) -> Result<Value> {
        let payload = undelimit(encoded)?;
        let message: M = decode_checked(payload)?;
        trace!(message = self.name, bytes = payload.len(), "decoded block");
        serde_json::to_value(&message).map_err(|source| CodecError::Json {
            message: self.name,
            source,
        })
    }
}
