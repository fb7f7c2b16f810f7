//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block schema definitions and storage-width validation."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Temperature readings. All three messages carry one signed value in field 1;
//! they differ only in how many bits the controller reserves for it.

use crate::bounds::{Bounded, IntSize};
use crate::Result;

pub use crate::generated::{Temperature, TemperatureLong, TemperaturePrecise};

impl Bounded for Temperature {
    fn check_bounds(&self) -> Result<()> {
        IntSize::Is16.check_signed("Temperature.value", self.value.into())
    }
}

impl Bounded for TemperatureLong {
    fn check_bounds(&self) -> Result<()> {
        Ok(())
    }
}

impl Bounded for TemperaturePrecise {
    fn check_bounds(&self) -> Result<()> {
        Ok(())
    }
}

impl From<Temperature> for TemperatureLong {
    fn from(value: Temperature) -> Self {
        Self { value: value.value }
    }
}
