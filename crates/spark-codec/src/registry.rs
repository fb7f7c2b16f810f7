//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Object-type codec translating JSON blocks to delimited protobuf."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Object type to transcoder lookup table.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::Value;
use spark_proto::{
    OneWireBus, OneWireTempSensor, Pid, PidPersisted, Temperature, TemperatureLong,
    TemperaturePrecise,
};
use tracing::debug;

use crate::transcoder::{ProtobufTranscoder, Transcoder};
use crate::{CodecError, ObjectType, Result};

static DEFAULT_REGISTRY: Lazy<TranscoderRegistry> = Lazy::new(TranscoderRegistry::with_defaults);

/// Process-wide registry holding every built-in block type.
pub fn registry() -> &'static TranscoderRegistry {
    &DEFAULT_REGISTRY
}

/// Transcoders keyed by [`ObjectType`].
#[derive(Default)]
pub struct TranscoderRegistry {
    transcoders: BTreeMap<ObjectType, Box<dyn Transcoder>>,
}

impl TranscoderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in block types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            ObjectType::TEMPERATURE,
            ProtobufTranscoder::<Temperature>::new("Temperature"),
        );
        registry.register(
            ObjectType::TEMPERATURE_LONG,
            ProtobufTranscoder::<TemperatureLong>::new("TemperatureLong"),
        );
        registry.register(
            ObjectType::TEMPERATURE_PRECISE,
            ProtobufTranscoder::<TemperaturePrecise>::new("TemperaturePrecise"),
        );
        registry.register(ObjectType::PID, ProtobufTranscoder::<Pid>::new("Pid"));
        registry.register(
            ObjectType::PID_PERSISTED,
            ProtobufTranscoder::<PidPersisted>::new("PidPersisted"),
        );
        registry.register(
            ObjectType::ONE_WIRE_TEMP_SENSOR,
            ProtobufTranscoder::<OneWireTempSensor>::new("OneWireTempSensor"),
        );
        registry.register(
            ObjectType::ONE_WIRE_BUS,
            ProtobufTranscoder::<OneWireBus>::new("OneWireBus"),
        );
        registry
    }

    /// Register a transcoder, returning the one it replaced.
    pub fn register(
        &mut self,
        obj_type: ObjectType,
        transcoder: impl Transcoder + 'static,
    ) -> Option<Box<dyn Transcoder>> {
        debug!(%obj_type, name = transcoder.name(), "registering transcoder");
        self.transcoders.insert(obj_type, Box::new(transcoder))
    }

    /// Look up the transcoder for `obj_type`.
    pub fn get(&self, obj_type: ObjectType) -> Result<&dyn Transcoder> {
        self.transcoders
            .get(&obj_type)
            .map(|transcoder| transcoder.as_ref())
            .ok_or(CodecError::UnknownType(obj_type))
    }

    /// Registered types with their message names, ordered by id.
    pub fn types(&self) -> impl Iterator<Item = (ObjectType, &'static str)> + '_ {
        self.transcoders
            .iter()
            .map(|(obj_type, transcoder)| (*obj_type, transcoder.name()))
    }

    /// Resolve a numeric id or a message name (case-insensitive).
    pub fn resolve(&self, text: &str) -> Result<ObjectType> {
        let text = text.trim();
        if let Ok(id) = text.parse::<u16>() {
            return Ok(ObjectType(id));
        }
        self.types()
            .find(|(_, name)| name.eq_ignore_ascii_case(text))
            .map(|(obj_type, _)| obj_type)
            .ok_or_else(|| CodecError::UnknownName(text.to_string()))
    }

    /// Encode with the transcoder registered for `obj_type`.
    pub fn encode(&self, obj_type: ObjectType, values: &Value) -> Result<Vec<u8>> {
        self.get(obj_type)?.encode(values)
    }

    /// Decode with the transcoder registered for `obj_type`.
    pub fn decode(&self, obj_type: ObjectType, encoded: &[u8]) -> Result<Value> {
        self.get(obj_type)?.decode(encoded)
    }
}
