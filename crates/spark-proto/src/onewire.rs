//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block schema definitions and storage-width validation."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! OneWire bus and temperature sensor blocks.

use crate::bounds::{Bounded, IntSize};
use crate::Result;

pub use crate::generated::one_wire_bus as bus;
pub use crate::generated::one_wire_temp_sensor as temp_sensor;
pub use crate::generated::{OneWireBus, OneWireTempSensor};

impl Bounded for temp_sensor::Settings {
    fn check_bounds(&self) -> Result<()> {
        IntSize::Is16.check_signed("OneWireTempSensor.settings.offset", self.offset.into())
    }
}

impl Bounded for temp_sensor::State {
    fn check_bounds(&self) -> Result<()> {
        IntSize::Is16.check_signed("OneWireTempSensor.state.value", self.value.into())
    }
}

impl Bounded for OneWireTempSensor {
    fn check_bounds(&self) -> Result<()> {
        self.settings.check_bounds()?;
        self.state.check_bounds()
    }
}

impl Bounded for bus::Command {
    fn check_bounds(&self) -> Result<()> {
        IntSize::Is8.check_unsigned("OneWireBus.command.opcode", self.opcode.into())?;
        IntSize::Is8.check_unsigned("OneWireBus.command.data", self.data.into())
    }
}

impl Bounded for OneWireBus {
    fn check_bounds(&self) -> Result<()> {
        self.command.check_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use serde_json::json;

    #[test]
    fn sensor_fixture_from_json() {
        let sensor: OneWireTempSensor = serde_json::from_value(json!({
            "settings": {"address": "KP7p/ggAABc=", "offset": 0}
        }))
        .unwrap();
        let settings = sensor.settings.clone().unwrap();
        assert_eq!(
            settings.address,
            vec![0x28, 0xfe, 0xe9, 0xfe, 0x08, 0x00, 0x00, 0x17]
        );
        assert!(sensor.state.is_none());

        // Zero offset is dropped when written back.
        assert_eq!(
            serde_json::to_value(&sensor).unwrap(),
            json!({"settings": {"address": "KP7p/ggAABc="}})
        );
    }

    #[test]
    fn sensor_offsets_are_sixteen_bit() {
        let mut sensor = OneWireTempSensor {
            settings: Some(temp_sensor::Settings {
                address: vec![1; 8],
                offset: -32_768,
            }),
            state: None,
        };
        assert!(sensor.check_bounds().is_ok());
        sensor.settings.as_mut().unwrap().offset = -32_769;
        assert!(sensor.check_bounds().is_err());
    }

    #[test]
    fn bus_addresses_are_strings_in_json() {
        let bus = OneWireBus {
            command: Some(bus::Command { opcode: 2, data: 0 }),
            address: vec![u64::MAX, 17],
        };
        let value = serde_json::to_value(&bus).unwrap();
        assert_eq!(
            value,
            json!({"command": {"opcode": 2}, "address": ["18446744073709551615", "17"]})
        );

        let numeric: OneWireBus =
            serde_json::from_value(json!({"address": [17, "18"]})).unwrap();
        assert_eq!(numeric.address, vec![17, 18]);
    }

    #[test]
    fn command_bytes_accept_string_form() {
        let parsed: OneWireBus =
            serde_json::from_value(json!({"command": {"opcode": "2", "data": 8}})).unwrap();
        assert_eq!(parsed.command, Some(bus::Command { opcode: 2, data: 8 }));
    }

    #[test]
    fn bus_addresses_are_packed_fixed64() {
        let bytes = OneWireBus {
            command: None,
            address: vec![1],
        }
        .encode_to_vec();
        // Field 2, length-delimited, eight little-endian bytes.
        assert_eq!(bytes, vec![0x12, 0x08, 1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn bus_command_bytes_are_eight_bit() {
        let bus = OneWireBus {
            command: Some(bus::Command {
                opcode: 256,
                data: 0,
            }),
            address: Vec::new(),
        };
        let err = bus.check_bounds().unwrap_err();
        assert!(err.to_string().contains("OneWireBus.command.opcode"));
    }
}
