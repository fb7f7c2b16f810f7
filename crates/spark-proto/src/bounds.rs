//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block schema definitions and storage-width validation."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use std::fmt;

use crate::{ProtoError, Result};

/// Storage width of an integer field, as declared by the nanopb `int_size` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntSize {
    /// `IS_8`
    Is8,
    /// `IS_16`
    Is16,
    /// `IS_32`
    Is32,
    /// `IS_64`, the protobuf default for 64-bit types.
    Is64,
}

impl IntSize {
    /// Number of bits available for the value.
    pub const fn bits(self) -> u32 {
        match self {
            IntSize::Is8 => 8,
            IntSize::Is16 => 16,
            IntSize::Is32 => 32,
            IntSize::Is64 => 64,
        }
    }

    /// Inclusive range representable by a signed field of this width.
    pub const fn signed_range(self) -> (i64, i64) {
        match self {
            IntSize::Is64 => (i64::MIN, i64::MAX),
            other => {
                let half = 1i64 << (other.bits() - 1);
                (-half, half - 1)
            }
        }
    }

    /// Largest value representable by an unsigned field of this width.
    pub const fn unsigned_max(self) -> u64 {
        match self {
            IntSize::Is64 => u64::MAX,
            other => (1u64 << other.bits()) - 1,
        }
    }

    /// Reject a signed value that does not fit.
    pub fn check_signed(self, field: &'static str, value: i64) -> Result<()> {
        let (min, max) = self.signed_range();
        if value < min || value > max {
            return Err(ProtoError::OutOfRange {
                field,
                value: value.into(),
                size: self,
            });
        }
        Ok(())
    }

    /// Reject an unsigned value that does not fit.
    pub fn check_unsigned(self, field: &'static str, value: u64) -> Result<()> {
        if value > self.unsigned_max() {
            return Err(ProtoError::OutOfRange {
                field,
                value: value.into(),
                size: self,
            });
        }
        Ok(())
    }
}

impl fmt::Display for IntSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Messages whose integer fields carry declared storage widths.
///
/// Implementations check every narrowed field and recurse into nested messages.
pub trait Bounded {
    /// Return an error for the first field that does not fit its storage.
    fn check_bounds(&self) -> Result<()>;
}

impl<T: Bounded> Bounded for Option<T> {
    fn check_bounds(&self) -> Result<()> {
        match self {
            Some(inner) => inner.check_bounds(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_ranges_match_twos_complement() {
        assert_eq!(IntSize::Is8.signed_range(), (-128, 127));
        assert_eq!(IntSize::Is16.signed_range(), (-32_768, 32_767));
        assert_eq!(
            IntSize::Is32.signed_range(),
            (i64::from(i32::MIN), i64::from(i32::MAX))
        );
        assert_eq!(IntSize::Is64.signed_range(), (i64::MIN, i64::MAX));
    }

    #[test]
    fn unsigned_limits() {
        assert_eq!(IntSize::Is8.unsigned_max(), 255);
        assert_eq!(IntSize::Is16.unsigned_max(), 65_535);
        assert_eq!(IntSize::Is64.unsigned_max(), u64::MAX);
    }

    #[test]
    fn edges_are_inclusive() {
        assert!(IntSize::Is16.check_signed("t", 32_767).is_ok());
        assert!(IntSize::Is16.check_signed("t", -32_768).is_ok());
        assert!(IntSize::Is16.check_signed("t", 32_768).is_err());
        assert!(IntSize::Is16.check_signed("t", -32_769).is_err());
        assert!(IntSize::Is8.check_unsigned("u", 255).is_ok());
        assert!(IntSize::Is8.check_unsigned("u", 256).is_err());
    }

    #[test]
    fn display_reports_bits() {
        assert_eq!(IntSize::Is8.to_string(), "8-bit");
        assert_eq!(IntSize::Is32.to_string(), "32-bit");
    }
}
