//! ---
//! spark_section: "05-networking-external-interfaces"
//! spark_subsection: "binary"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Control CLI for encoding blocks and managing the block datastore."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use spark_codec::{registry, ObjectType};

/// Parse an object type given as numeric id or message name.
pub fn parse_object_type(text: &str) -> std::result::Result<ObjectType, String> {
    registry().resolve(text).map_err(|err| err.to_string())
}

/// Parse a JSON document argument.
pub fn parse_json(text: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(text).map_err(|err| format!("invalid JSON: {err}"))
}

#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Object type id or message name.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_object_type)]
    object_type: ObjectType,
    /// Block values as a JSON object.
    #[arg(long, value_name = "JSON", value_parser = parse_json)]
    json: Value,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Object type id or message name.
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_object_type)]
    object_type: ObjectType,
    /// Hex encoded, length-delimited block.
    #[arg(value_name = "HEX")]
    hex: String,
}

pub fn encode(args: EncodeArgs) -> Result<()> {
    let encoded = spark_codec::encode(args.object_type, &args.json)
        .with_context(|| format!("encoding object type {}", args.object_type))?;
    println!("{}", hex::encode(encoded));
    Ok(())
}

pub fn decode(args: DecodeArgs) -> Result<()> {
    let bytes = hex::decode(args.hex.trim()).context("block is not valid hex")?;
    let values = spark_codec::decode(args.object_type, &bytes)
        .with_context(|| format!("decoding object type {}", args.object_type))?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

pub fn types() {
    for (obj_type, name) in registry().types() {
        println!("{obj_type:>4}  {name}");
    }
}
