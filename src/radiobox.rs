//! RadioBox FPGA Sub-Module
//!
//! Register-level control of the RadioBox transceiver image: encoders for
//! the DDS and gain registers, the control-state updater that maps a
//! parameter snapshot onto the hardware, the ADC offset calibration and the
//! FPGA lifecycle (mapping, version check, bitstream reload).

pub mod calibration;
pub mod compensation;
pub mod control;
pub mod device;
pub mod encoding;
pub mod lifecycle;
pub mod regs;
pub mod version;

pub use device::RadioBox;
