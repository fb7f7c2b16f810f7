//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block schema definitions and storage-width validation."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Block schemas exchanged with Spark controllers.
//!
//! The message types are generated from the `.proto` definitions in `proto/`
//! at build time. Field tags and wire types are the binding contract with the
//! firmware; nanopb `int_size` annotations are enforced by [`bounds::Bounded`].
#![warn(missing_docs)]

pub mod bounds;
mod json;
pub mod onewire;
pub mod pid;
pub mod temperature;

#[allow(missing_docs, clippy::derive_partial_eq_without_eq)]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/blox.rs"));
}

use prost::Message;

pub use bounds::{Bounded, IntSize};
pub use onewire::{OneWireBus, OneWireTempSensor};
pub use pid::{Pid, PidPersisted};
pub use temperature::{Temperature, TemperatureLong, TemperaturePrecise};

/// Shared result type for schema operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors raised while validating or (de)serializing block messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// A field value does not fit the storage width declared for it.
    #[error("{field} = {value} does not fit in {size} storage")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value that was rejected.
        value: i128,
        /// Declared storage width.
        size: IntSize,
    },
    /// Wire data could not be parsed.
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Encode a message after checking its storage widths.
pub fn encode_checked<M>(message: &M) -> Result<Vec<u8>>
where
    M: Message + Bounded,
{
    message.check_bounds()?;
    Ok(message.encode_to_vec())
}

/// Decode a message and reject values wider than their declared storage.
pub fn decode_checked<M>(buf: &[u8]) -> Result<M>
where
    M: Message + Default + Bounded,
{
    let message = M::decode(buf)?;
    message.check_bounds()?;
    Ok(message)
}
