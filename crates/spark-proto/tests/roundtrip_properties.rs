//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block schema definitions and storage-width validation."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Round-trip properties over arbitrary in-width block values.

use proptest::prelude::*;
use spark_proto::onewire::{bus, temp_sensor};
use spark_proto::pid::{Filtering, Links, Settings, State};
use spark_proto::{
    decode_checked, encode_checked, OneWireBus, OneWireTempSensor, Pid, PidPersisted, ProtoError,
    Temperature, TemperatureLong, TemperaturePrecise,
};

const I16: std::ops::RangeInclusive<i32> = (i16::MIN as i32)..=(i16::MAX as i32);

fn opt<T: std::fmt::Debug>(inner: impl Strategy<Value = T>) -> impl Strategy<Value = Option<T>> {
    proptest::option::of(inner)
}

fn bytes() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..=8)
}

fn pid_settings() -> impl Strategy<Value = Settings> {
    (any::<i32>(), any::<u32>(), any::<u32>(), any::<bool>()).prop_map(|(kp, ti, td, enabled)| {
        Settings {
            kp,
            ti,
            td,
            enabled,
        }
    })
}

fn pid_state() -> impl Strategy<Value = State> {
    proptest::array::uniform10(any::<i32>()).prop_map(|v| State {
        input_value: v[0],
        input_setting: v[1],
        output_value: v[2],
        output_setting: v[3],
        p: v[4],
        i: v[5],
        d: v[6],
        error: v[7],
        integral: v[8],
        derivative: v[9],
    })
}

fn pid_links() -> impl Strategy<Value = Links> {
    (bytes(), bytes()).prop_map(|(input, output)| Links { input, output })
}

fn pid_filtering() -> impl Strategy<Value = Filtering> {
    (any::<u32>(), any::<u32>()).prop_map(|(input, derivative)| Filtering { input, derivative })
}

fn arb_pid() -> impl Strategy<Value = Pid> {
    (
        opt(pid_settings()),
        opt(pid_state()),
        opt(pid_links()),
        opt(pid_filtering()),
    )
        .prop_map(|(settings, state, links, filtering)| Pid {
            settings,
            state,
            links,
            filtering,
        })
}

fn sensor() -> impl Strategy<Value = OneWireTempSensor> {
    let settings = (bytes(), I16).prop_map(|(address, offset)| temp_sensor::Settings {
        address,
        offset,
    });
    let state = (I16, any::<bool>()).prop_map(|(value, connected)| temp_sensor::State {
        value,
        connected,
    });
    (opt(settings), opt(state))
        .prop_map(|(settings, state)| OneWireTempSensor { settings, state })
}

fn one_wire_bus() -> impl Strategy<Value = OneWireBus> {
    let command =
        (0u32..=255, 0u32..=255).prop_map(|(opcode, data)| bus::Command { opcode, data });
    (
        opt(command),
        proptest::collection::vec(any::<u64>(), 0..=4),
    )
        .prop_map(|(command, address)| OneWireBus { command, address })
}

fn wire_roundtrip<M>(message: &M) -> Result<(), TestCaseError>
where
    M: prost::Message + Default + PartialEq + spark_proto::Bounded,
{
    let bytes = encode_checked(message).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let decoded: M = decode_checked(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(&decoded, message);
    Ok(())
}

fn json_roundtrip<M>(message: &M) -> Result<(), TestCaseError>
where
    M: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let value = serde_json::to_value(message).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let parsed: M = serde_json::from_value(value).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(&parsed, message);
    Ok(())
}

proptest! {
    #[test]
    fn temperatures_roundtrip(short in I16, wide in any::<i32>()) {
        wire_roundtrip(&Temperature { value: short })?;
        wire_roundtrip(&TemperatureLong { value: wide })?;
        wire_roundtrip(&TemperaturePrecise { value: wide })?;
        json_roundtrip(&Temperature { value: short })?;
        json_roundtrip(&TemperatureLong { value: wide })?;
    }

    #[test]
    fn pid_roundtrips(pid in arb_pid()) {
        wire_roundtrip(&pid)?;
        json_roundtrip(&pid)?;
        wire_roundtrip(&pid.to_persisted())?;
        json_roundtrip(&pid.to_persisted())?;
    }

    #[test]
    fn full_pid_decodes_as_persisted(pid in arb_pid()) {
        let bytes = encode_checked(&pid).unwrap();
        let persisted: PidPersisted = decode_checked(&bytes).unwrap();
        prop_assert_eq!(persisted, pid.to_persisted());
    }

    #[test]
    fn onewire_roundtrips(sensor in sensor(), bus in one_wire_bus()) {
        wire_roundtrip(&sensor)?;
        json_roundtrip(&sensor)?;
        wire_roundtrip(&bus)?;
        json_roundtrip(&bus)?;
    }

    #[test]
    fn wide_sixteen_bit_values_are_rejected(
        value in prop_oneof![i32::MIN..(i16::MIN as i32), (i16::MAX as i32 + 1)..=i32::MAX],
    ) {
        let is_out_of_range = |result: Result<Vec<u8>, ProtoError>| {
            matches!(result, Err(ProtoError::OutOfRange { .. }))
        };
        let temperature = encode_checked(&Temperature { value });
        prop_assert!(is_out_of_range(temperature));
        let sensor_settings = encode_checked(&OneWireTempSensor {
            settings: Some(temp_sensor::Settings { address: Vec::new(), offset: value }),
            state: None,
        });
        prop_assert!(is_out_of_range(sensor_settings));
        let sensor_state = encode_checked(&OneWireTempSensor {
            settings: None,
            state: Some(temp_sensor::State { value, connected: false }),
        });
        prop_assert!(is_out_of_range(sensor_state));

        // The same value arriving on the wire is refused as well.
        let wire = encode_checked(&TemperatureLong { value }).unwrap();
        prop_assert!(
            matches!(
                decode_checked::<Temperature>(&wire),
                Err(ProtoError::OutOfRange { .. })
            ),
            "decoded {} into 16-bit storage",
            value
        );
    }

    #[test]
    fn wide_eight_bit_values_are_rejected(wide in 256u32..=u32::MAX, narrow in 0u32..=255) {
        for command in [
            bus::Command { opcode: wide, data: narrow },
            bus::Command { opcode: narrow, data: wide },
        ] {
            let message = OneWireBus { command: Some(command), address: Vec::new() };
            prop_assert!(
                matches!(encode_checked(&message), Err(ProtoError::OutOfRange { .. })),
                "encoded {:?}",
                message
            );
        }
    }
}
