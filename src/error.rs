//! Error types
//!
//! Every fallible operation in the crate returns [`Result`]. The legacy
//! C interface spoke negative integer codes; [`Error::code`] keeps that
//! mapping for callers that still forward plain integers.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::radiobox::version::VersionError;

/// Crate result type
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by the housekeeping and RadioBox drivers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The register window has not been mapped (or was already released)
    #[error("register window is not mapped")]
    NotMapped,

    /// Requested bits are not part of the register field
    #[error("bits {bits:#010x} are outside of field mask {mask:#010x}")]
    OutOfRange {
        /// Bits the caller asked for
        bits: u32,
        /// Valid bits of the field
        mask: u32,
    },

    /// Requested bits may only be read
    #[error("bits {0:#04x} are read-only")]
    ReadOnly(u32),

    /// Raw register access outside the window or not word aligned
    #[error("register offset {0:#x} is misaligned or outside the window")]
    Misaligned(usize),

    /// `/dev/mem` could not be opened or mapped
    #[error("failed to map {size:#x} bytes at {base:#010x}")]
    Map {
        /// Physical base address
        base: usize,
        /// Window size in bytes
        size: usize,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The FPGA reported an unusable firmware version
    #[error("FPGA version check failed")]
    Version(#[from] VersionError),

    /// Copying or loading a bitstream failed
    #[error("bitstream operation on {} failed", path.display())]
    Bitstream {
        /// File being handled
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// A helper script (remount rw/ro) failed
    #[error("`{command}` exited with {status}")]
    Command {
        /// Script path
        command: String,
        /// Exit status reported by the script
        status: ExitStatus,
    },

    /// A helper script could not be started
    #[error("failed to start `{command}`")]
    Spawn {
        /// Script path
        command: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Parameter name does not fit the table's name buffer
    #[error("parameter name `{0}` is too long")]
    InvalidParamName(String),

    /// Parameter table has no room left
    #[error("parameter table is full")]
    ParamTableFull,

    /// The parameter worker thread is no longer running
    #[error("parameter worker has stopped")]
    WorkerGone,
}

impl Error {
    /// Legacy integer code of this error
    ///
    /// Mirrors the return codes of the C API: `-1` for a missing window,
    /// `-2`/`-3` for version failures and the `RP_EOOR`/`RP_EMRO` values
    /// of the housekeeping bit accessors.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NotMapped => -1,
            Self::Version(VersionError::OutOfRange(_)) => -2,
            Self::Version(VersionError::NotBcd(_)) => -3,
            Self::OutOfRange { .. } | Self::Misaligned(_) => RP_EOOR,
            Self::ReadOnly(_) => RP_EMRO,
            Self::Map { .. } => RP_EMMD,
            Self::Bitstream { .. } | Self::Command { .. } | Self::Spawn { .. } => RP_EOMD,
            Self::InvalidParamName(_) | Self::ParamTableFull | Self::WorkerGone => RP_EUF,
        }
    }
}

/// Failed to open memory device
const RP_EOMD: i32 = 2;
/// Failed to map memory device
const RP_EMMD: i32 = 4;
/// Value out of range
const RP_EOOR: i32 = 7;
/// Modifying read only field
const RP_EMRO: i32 = 12;
/// Unknown failure
const RP_EUF: i32 = 13;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_legacy_values() {
        assert_eq!(Error::NotMapped.code(), -1);
        assert_eq!(Error::Version(VersionError::OutOfRange(0)).code(), -2);
        assert_eq!(Error::Version(VersionError::NotBcd(0x1201_01a1)).code(), -3);
        assert_eq!(Error::ReadOnly(1).code(), RP_EMRO);
        assert_eq!(Error::OutOfRange { bits: 0x100, mask: 0xff }.code(), RP_EOOR);
    }

    #[test]
    fn display_names_the_field() {
        let e = Error::OutOfRange { bits: 0x100, mask: 0xff };
        assert_eq!(e.to_string(), "bits 0x00000100 are outside of field mask 0x000000ff");
    }
}
