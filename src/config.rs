//! System configuration and hardware constants
//!
//! This module defines the physical addresses, file locations and radio
//! constants of the Red Pitaya RadioBox image. Everything the lifecycle
//! manager touches at runtime is also collected in [`FpgaConfig`] so it can
//! be redirected for simulation and tests.

use std::path::PathBuf;

/// Physical base address of the housekeeping block
pub const HOUSEKEEPING_BASE_ADDR: usize = 0x4000_0000;

/// Size of the housekeeping window (13 words, through `led_control`)
pub const HOUSEKEEPING_BASE_SIZE: usize = 0x34;

/// Physical base address of the RadioBox sub-module
pub const RADIOBOX_BASE_ADDR: usize = 0x4060_0000;

/// Size of the RadioBox register window
pub const RADIOBOX_BASE_SIZE: usize = 0x1000;

/// Oldest RadioBox firmware accepted without reloading the bundled bitstream
pub const FPGA_VERSION_MIN: u32 = 0x1602_0101;

/// Nominal frequency of the ADC/DAC base oscillator
pub const BASE_OSC_HZ: f64 = 125_000_000.0;

/// Weaver SSB intermediate oscillator frequency
pub const WEAVER_OSC_HZ: f64 = 1_700.0;

/// `qrg_inc` value that stops the frequency scanner
pub const SCAN_STOP: i32 = 50;

/// Scanner rate at full deflection of `qrg_inc`
pub const SCAN_MAX_HZ_PER_SEC: f64 = 10_000.0;

/// Decades covered by the scanner control
pub const SCAN_DECADES: f64 = 3.0;

/// Scanner increment update rate of the FPGA
pub const SCAN_UPDATE_RATE_HZ: f64 = 200_000.0;

/// Memory device used for register mapping
pub const DEV_MEM: &str = "/dev/mem";

/// Device file that reconfigures the FPGA when a bitstream is written to it
pub const XDEVCFG: &str = "/dev/xdevcfg";

/// Bitstream loaded at boot
pub const FPGA_BIT: &str = "/opt/redpitaya/fpga/fpga.bit";

/// Saved copy of the boot bitstream
pub const FPGA_BIT_ORIG: &str = "/opt/redpitaya/fpga/fpga.bit_orig";

/// Bitstream bundled with the RadioBox application
pub const FPGA_BIT_FRESH: &str = "/opt/redpitaya/www/apps/radiobox/fpga.bit";

/// Script remounting the system partition read-write
pub const REMOUNT_RW: &str = "/opt/redpitaya/sbin/rw";

/// Script remounting the system partition read-only
pub const REMOUNT_RO: &str = "/opt/redpitaya/sbin/ro";

/// Runtime configuration of the FPGA lifecycle
#[derive(Clone, Debug, PartialEq)]
pub struct FpgaConfig {
    /// Physical base of the RadioBox window
    pub base_addr: usize,
    /// RadioBox window size in bytes
    pub base_size: usize,
    /// Oldest acceptable firmware version
    pub version_min: u32,
    /// Boot bitstream
    pub bitstream: PathBuf,
    /// Saved original of the boot bitstream
    pub bitstream_orig: PathBuf,
    /// Bitstream bundled with the application
    pub bitstream_fresh: PathBuf,
    /// FPGA configuration device
    pub xdevcfg: PathBuf,
    /// Remount read-write script, skipped when `None`
    pub remount_rw: Option<PathBuf>,
    /// Remount read-only script, skipped when `None`
    pub remount_ro: Option<PathBuf>,
}

impl Default for FpgaConfig {
    fn default() -> Self {
        Self {
            base_addr: RADIOBOX_BASE_ADDR,
            base_size: RADIOBOX_BASE_SIZE,
            version_min: FPGA_VERSION_MIN,
            bitstream: PathBuf::from(FPGA_BIT),
            bitstream_orig: PathBuf::from(FPGA_BIT_ORIG),
            bitstream_fresh: PathBuf::from(FPGA_BIT_FRESH),
            xdevcfg: PathBuf::from(XDEVCFG),
            remount_rw: Some(PathBuf::from(REMOUNT_RW)),
            remount_ro: Some(PathBuf::from(REMOUNT_RO)),
        }
    }
}

impl FpgaConfig {
    /// Configuration with every file living below `root`
    ///
    /// The boot bitstream, its saved original and the configuration device
    /// become `root/fpga.bit`, `root/fpga.bit_orig` and `root/xdevcfg`; the
    /// bundled bitstream is `root/fresh/fpga.bit`. Remount scripts are
    /// disabled.
    #[must_use]
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            bitstream: root.join("fpga.bit"),
            bitstream_orig: root.join("fpga.bit_orig"),
            bitstream_fresh: root.join("fresh").join("fpga.bit"),
            xdevcfg: root.join("xdevcfg"),
            remount_rw: None,
            remount_ro: None,
            ..Self::default()
        }
    }
}
