//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Object-type codec translating JSON blocks to delimited protobuf."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Generic entry point for block codecs.
//!
//! Every block kind is identified by a numeric [`ObjectType`]. The registry maps
//! each type to a [`Transcoder`] that converts between the JSON representation
//! used by clients and the varint length-delimited protobuf bytes understood by
//! the controller.
#![warn(missing_docs)]

pub mod delimit;
pub mod registry;
pub mod transcoder;

use std::fmt;

use serde::{Deserialize, Serialize};
use spark_proto::ProtoError;

pub use registry::{registry, TranscoderRegistry};
pub use transcoder::{ProtobufTranscoder, Transcoder};

/// Shared result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while encoding or decoding blocks.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No transcoder is registered for the object type.
    #[error("no codec found for object type [{0}]")]
    UnknownType(ObjectType),
    /// The text is neither a registered type id nor a registered message name.
    #[error("unknown object type name: {0}")]
    UnknownName(String),
    /// Encoding requires a JSON object at the top level.
    #[error("{message} values must be a JSON object")]
    NotAnObject {
        /// Message being encoded.
        message: &'static str,
    },
    /// The JSON values do not match the message layout.
    #[error("invalid {message} values: {source}")]
    Json {
        /// Message being encoded or decoded.
        message: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Width violation or malformed protobuf payload.
    #[error(transparent)]
    Proto(#[from] ProtoError),
    /// The leading length delimiter is missing or not a valid varint.
    #[error("length delimiter is not a valid varint")]
    InvalidDelimiter,
    /// Fewer bytes follow the delimiter than it announces.
    #[error("truncated payload: delimiter announces {expected} bytes, {available} available")]
    Truncated {
        /// Bytes announced by the delimiter.
        expected: usize,
        /// Bytes actually present.
        available: usize,
    },
}

/// Numeric block type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectType(pub u16);

impl ObjectType {
    /// 16-bit [`spark_proto::Temperature`].
    pub const TEMPERATURE: Self = Self(1);
    /// 32-bit [`spark_proto::TemperatureLong`].
    pub const TEMPERATURE_LONG: Self = Self(2);
    /// 32-bit [`spark_proto::TemperaturePrecise`].
    pub const TEMPERATURE_PRECISE: Self = Self(3);
    /// Full [`spark_proto::Pid`] block.
    pub const PID: Self = Self(4);
    /// [`spark_proto::PidPersisted`], the PID block without runtime state.
    pub const PID_PERSISTED: Self = Self(5);
    /// [`spark_proto::OneWireTempSensor`].
    pub const ONE_WIRE_TEMP_SENSOR: Self = Self(6);
    /// [`spark_proto::OneWireBus`].
    pub const ONE_WIRE_BUS: Self = Self(10);
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u16> for ObjectType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Encode JSON values as a delimited protobuf block using the default registry.
pub fn encode(obj_type: ObjectType, values: &serde_json::Value) -> Result<Vec<u8>> {
    registry().get(obj_type)?.encode(values)
}

/// Decode a delimited protobuf block into JSON values using the default registry.
pub fn decode(obj_type: ObjectType, encoded: &[u8]) -> Result<serde_json::Value> {
    registry().get(obj_type)?.decode(encoded)
}
