//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "build"
//! spark_type: "source"
//! spark_scope: "build"
//! spark_description: "Compiles the block schemas into prost messages with protobuf JSON support."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
const SCHEMAS: &[&str] = &["proto/Temperature.proto", "proto/Pid.proto", "proto/OneWire.proto"];

// JSON accepts these as numbers or decimal strings.
const INTEGER_FIELDS: &[&str] = &[
    ".blox.Temperature.value",
    ".blox.TemperatureLong.value",
    ".blox.TemperaturePrecise.value",
    ".blox.Pid.Settings.kp",
    ".blox.Pid.Settings.ti",
    ".blox.Pid.Settings.td",
    ".blox.Pid.State.input_value",
    ".blox.Pid.State.input_setting",
    ".blox.Pid.State.output_value",
    ".blox.Pid.State.output_setting",
    ".blox.Pid.State.p",
    ".blox.Pid.State.i",
    ".blox.Pid.State.d",
    ".blox.Pid.State.error",
    ".blox.Pid.State.integral",
    ".blox.Pid.State.derivative",
    ".blox.Pid.Filtering.input",
    ".blox.Pid.Filtering.derivative",
    ".blox.OneWireTempSensor.Settings.offset",
    ".blox.OneWireTempSensor.State.value",
    ".blox.OneWireBus.Command.opcode",
    ".blox.OneWireBus.Command.data",
];

const BYTES_FIELDS: &[&str] = &[
    ".blox.Pid.Links.input",
    ".blox.Pid.Links.output",
    ".blox.OneWireTempSensor.Settings.address",
];

// fixed64 is written as a string, like the protobuf JSON mapping does.
const FIXED64_FIELDS: &[&str] = &[".blox.OneWireBus.address"];

fn main() {
    let protoc = protoc_bin_vendored::protoc_bin_path().expect("failed to locate protoc");
    let well_known = protoc_bin_vendored::include_path().expect("failed to locate protoc includes");
    std::env::set_var("PROTOC", protoc);

    println!("cargo:rerun-if-changed=proto");

    let mut config = prost_build::Config::new();
    config
        .type_attribute(
            ".blox",
            "#[serde_with::serde_as]\n#[derive(serde::Serialize, serde::Deserialize)]\n#[serde(rename_all = \"camelCase\", deny_unknown_fields)]",
        )
        .field_attribute(
            ".blox",
            "#[serde(default, skip_serializing_if = \"crate::json::is_default\")]",
        );

    for path in INTEGER_FIELDS {
        config.field_attribute(
            path,
            "#[serde_as(as = \"serde_with::PickFirst<(_, serde_with::DisplayFromStr)>\")]",
        );
    }
    for path in BYTES_FIELDS {
        config.field_attribute(path, "#[serde(with = \"crate::json::base64_bytes\")]");
    }
    for path in FIXED64_FIELDS {
        config.field_attribute(
            path,
            "#[serde_as(as = \"Vec<serde_with::PickFirst<(serde_with::DisplayFromStr, _)>>\")]",
        );
    }
    // The original field names are accepted next to their camelCase form.
    for path in INTEGER_FIELDS.iter().chain(BYTES_FIELDS).chain(FIXED64_FIELDS) {
        if let Some((_, name)) = path.rsplit_once('.') {
            if name.contains('_') {
                config.field_attribute(path, format!("#[serde(alias = \"{name}\")]"));
            }
        }
    }

    config
        .compile_protos(SCHEMAS, &["proto".into(), well_known])
        .expect("failed to compile block schemas");
}
