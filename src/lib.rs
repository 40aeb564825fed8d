//! Red Pitaya RadioBox Hardware Abstraction Library
//!
//! This library drives the RadioBox software-defined-radio sub-module of the
//! Red Pitaya FPGA image and the housekeeping block next to it (LEDs,
//! extension connector GPIO, device DNA). Radio parameters in human units
//! are translated into DDS increments, gain words and routing bits and
//! written to the memory-mapped register windows.
//!
//! # Architecture
//!
//! The library is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Named Parameters  │  Worker Thread  │  CLI                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     RADIOBOX LAYER                           │
//! │  Control State  │  Calibration  │  Lifecycle  │  Encoding    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  RegisterBus  │  /dev/mem mmap  │  Bit Fields  │  Delay      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      FPGA FABRIC                             │
//! │        RadioBox @ 0x4060_0000   Housekeeping @ 0x4000_0000   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Owned hardware handles**: a mapped window is a value; dropping it unmaps
//! - **Pure encoders**: register math is free of I/O and tested on the host
//! - **No unsafe outside the mapping**: `hal::mmap` is the only unsafe module
//! - **Explicit error handling**: all fallible operations return `Result`

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Hardware Abstraction Layer
///
/// Register bus trait, `/dev/mem` mapping, in-memory simulation and the
/// masked bit-field accessors.
pub mod hal;

/// Housekeeping Block
///
/// LEDs, extension connector GPIO and device DNA.
pub mod housekeeping;

/// RadioBox Sub-Module
///
/// Encoders, register setters, control state, calibration and lifecycle.
pub mod radiobox;

/// Board calibration record
pub mod calib;

/// Named-parameter interface of the front-end
pub mod params;

/// Worker thread serializing parameter updates
pub mod worker;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Error types
pub mod error;

pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::calib::CalibParams;
    pub use crate::error::{Error, Result};
    pub use crate::hal::bus::{Mapper, RegisterBus};
    pub use crate::hal::delay::{NoDelay, StdDelay};
    pub use crate::hal::memory::{MemoryBus, MemoryMapper};
    #[cfg(feature = "linux")]
    pub use crate::hal::mmap::{DevMemMapper, MmapWindow};
    pub use crate::housekeeping::{Expander, Housekeeping};
    pub use crate::params::{ParamTable, FPGA_UPDATE_MARK};
    pub use crate::radiobox::compensation::{CompensationTable, GainCompensation};
    pub use crate::radiobox::control::{RadioSettings, Readback};
    pub use crate::radiobox::lifecycle::Fpga;
    pub use crate::radiobox::version::FpgaVersion;
    pub use crate::radiobox::RadioBox;
    pub use crate::worker::Worker;

    // Common traits
    pub use embedded_hal::delay::DelayNs;

    // Logging
    pub use tracing::{debug, error, info, trace, warn};
}
