//! RadioBox firmware version
//!
//! The version register holds the build date as BCD `YYMMDDNN`, `NN` being
//! the build of that day.

use core::fmt;

/// Oldest version the register can plausibly hold
const VERSION_FIRST: u32 = 0x1201_0101;
/// Newest version the register can plausibly hold
const VERSION_LAST: u32 = 0x2912_3299;

/// Why a version word was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Outside the plausible date range
    #[error("version {0:#010x} is out of range")]
    OutOfRange(u32),
    /// At least one nibble is not a decimal digit
    #[error("version {0:#010x} is not BCD encoded")]
    NotBcd(u32),
}

/// Validated firmware version
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FpgaVersion(u32);

impl FpgaVersion {
    /// Validate a raw version register value
    ///
    /// # Errors
    /// [`VersionError::OutOfRange`] outside 2012-01-01 .. 2029-12-32,
    /// [`VersionError::NotBcd`] if any nibble exceeds 9.
    pub fn from_raw(raw: u32) -> Result<Self, VersionError> {
        if !(VERSION_FIRST..=VERSION_LAST).contains(&raw) {
            return Err(VersionError::OutOfRange(raw));
        }
        if (0..8).any(|nibble| (raw >> (nibble * 4)) & 0xf > 9) {
            return Err(VersionError::NotBcd(raw));
        }
        Ok(Self(raw))
    }

    /// Raw register value
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn bcd(self, shift: u32) -> u8 {
        let byte = (self.0 >> shift) & 0xff;
        ((byte >> 4) * 10 + (byte & 0xf)) as u8
    }

    /// Build year
    #[must_use]
    pub const fn year(self) -> u16 {
        2000 + self.bcd(24) as u16
    }

    /// Build month
    #[must_use]
    pub const fn month(self) -> u8 {
        self.bcd(16)
    }

    /// Build day
    #[must_use]
    pub const fn day(self) -> u8 {
        self.bcd(8)
    }

    /// Build number of the day
    #[must_use]
    pub const fn build(self) -> u8 {
        self.bcd(0)
    }
}

impl fmt::Debug for FpgaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FpgaVersion({:#010x})", self.0)
    }
}

impl fmt::Display for FpgaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} #{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.build()
        )
    }
}
