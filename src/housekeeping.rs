//! Housekeeping Block Driver
//!
//! The housekeeping block exposes the FPGA identification, the 57-bit device
//! DNA, the extension connector GPIO expander and the on-board LEDs.
//!
//! Every field is 8 bits wide. The expander has two rows (P and N) with a
//! direction, an output and an input register each; inputs are read-only,
//! and LED0 is driven by the FPGA itself.

use crate::config::{HOUSEKEEPING_BASE_ADDR, HOUSEKEEPING_BASE_SIZE};
use crate::error::{Error, Result};
use crate::hal::bits::{are_bits_set, set_bits, unset_bits};
use crate::hal::bus::{Mapper, RegisterBus};

/// Housekeeping register offsets
pub mod reg {
    /// FPGA identification
    pub const ID: usize = 0x00;
    /// DNA bits 0..31
    pub const DNA_PART1: usize = 0x04;
    /// DNA bits 32..56
    pub const DNA_PART2: usize = 0x08;
    /// Expander direction, P row
    pub const EX_CD_P: usize = 0x10;
    /// Expander direction, N row
    pub const EX_CD_N: usize = 0x14;
    /// Expander output, P row
    pub const EX_CO_P: usize = 0x18;
    /// Expander output, N row
    pub const EX_CO_N: usize = 0x1C;
    /// Expander input, P row
    pub const EX_CI_P: usize = 0x20;
    /// Expander input, N row
    pub const EX_CI_N: usize = 0x24;
    /// LED control
    pub const LED_CONTROL: usize = 0x30;
}

/// Valid bits of every housekeeping field
pub const FIELD_MASK: u32 = 0xFF;

/// LED bits the FPGA owns
const LED_READ_ONLY: u32 = 0x01;

/// Register of the extension connector GPIO expander
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expander {
    /// Direction, P row (1 = output)
    DirectionP,
    /// Direction, N row
    DirectionN,
    /// Output latch, P row
    OutputP,
    /// Output latch, N row
    OutputN,
    /// Input state, P row
    InputP,
    /// Input state, N row
    InputN,
}

impl Expander {
    const fn offset(self) -> usize {
        match self {
            Self::DirectionP => reg::EX_CD_P,
            Self::DirectionN => reg::EX_CD_N,
            Self::OutputP => reg::EX_CO_P,
            Self::OutputN => reg::EX_CO_N,
            Self::InputP => reg::EX_CI_P,
            Self::InputN => reg::EX_CI_N,
        }
    }

    /// Whether software may change this register
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::InputP | Self::InputN)
    }
}

/// Housekeeping block on a mapped register window
pub struct Housekeeping<B> {
    bus: B,
}

impl<B: RegisterBus> Housekeeping<B> {
    /// Wrap an already mapped window
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Map the housekeeping window at its physical address
    ///
    /// # Errors
    /// Propagates the mapper's error.
    pub fn init<M: Mapper<Bus = B>>(mapper: &mut M) -> Result<Self> {
        let bus = mapper.map(HOUSEKEEPING_BASE_ADDR, HOUSEKEEPING_BASE_SIZE)?;
        Ok(Self::new(bus))
    }

    /// Unmap the window
    pub fn release(self) {
        drop(self.bus);
    }

    /// FPGA identification word
    pub fn id(&mut self) -> u32 {
        self.bus.read(reg::ID)
    }

    /// 57-bit device DNA
    pub fn dna(&mut self) -> u64 {
        let lo = u64::from(self.bus.read(reg::DNA_PART1));
        let hi = u64::from(self.bus.read(reg::DNA_PART2));
        (hi << 32 | lo) & ((1 << 57) - 1)
    }

    /// Switch LEDs on
    ///
    /// # Errors
    /// [`Error::ReadOnly`] when asked for LED0 alone, [`Error::OutOfRange`]
    /// for bits beyond the eight LEDs.
    pub fn set_led_bits(&mut self, bits: u32) -> Result<()> {
        if bits == LED_READ_ONLY {
            return Err(Error::ReadOnly(bits));
        }
        set_bits(&mut self.bus, reg::LED_CONTROL, bits, FIELD_MASK)
    }

    /// Switch LEDs off
    ///
    /// # Errors
    /// [`Error::OutOfRange`] for bits beyond the eight LEDs.
    pub fn unset_led_bits(&mut self, bits: u32) -> Result<()> {
        unset_bits(&mut self.bus, reg::LED_CONTROL, bits, FIELD_MASK)
    }

    /// Whether all of the given LEDs are on
    ///
    /// # Errors
    /// [`Error::OutOfRange`] for bits beyond the eight LEDs.
    pub fn are_led_bits_set(&mut self, bits: u32) -> Result<bool> {
        are_bits_set(&mut self.bus, reg::LED_CONTROL, bits, FIELD_MASK)
    }

    /// Set bits of an expander register
    ///
    /// # Errors
    /// [`Error::ReadOnly`] for input registers, [`Error::OutOfRange`] for
    /// bits beyond the eight pins.
    pub fn set_expander_bits(&mut self, which: Expander, bits: u32) -> Result<()> {
        if !which.is_writable() {
            return Err(Error::ReadOnly(bits));
        }
        set_bits(&mut self.bus, which.offset(), bits, FIELD_MASK)
    }

    /// Clear bits of an expander register
    ///
    /// # Errors
    /// [`Error::ReadOnly`] for input registers, [`Error::OutOfRange`] for
    /// bits beyond the eight pins.
    pub fn unset_expander_bits(&mut self, which: Expander, bits: u32) -> Result<()> {
        if !which.is_writable() {
            return Err(Error::ReadOnly(bits));
        }
        unset_bits(&mut self.bus, which.offset(), bits, FIELD_MASK)
    }

    /// Whether all given bits of an expander register are set
    ///
    /// # Errors
    /// [`Error::OutOfRange`] for bits beyond the eight pins.
    pub fn are_expander_bits_set(&mut self, which: Expander, bits: u32) -> Result<bool> {
        are_bits_set(&mut self.bus, which.offset(), bits, FIELD_MASK)
    }

    /// Underlying register window
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying register window, mutable
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}
