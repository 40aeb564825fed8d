//! Masked bit-field access
//!
//! Shared by the housekeeping and RadioBox drivers. Every operation first
//! checks that the requested bits lie inside the field mask.

use super::bus::RegisterBus;
use crate::error::{Error, Result};

fn check(bits: u32, mask: u32) -> Result<()> {
    if bits & !mask == 0 {
        Ok(())
    } else {
        Err(Error::OutOfRange { bits, mask })
    }
}

/// Set `bits` of the field at `offset`, leaving the others untouched
///
/// # Errors
/// [`Error::OutOfRange`] if `bits` has bits outside `mask`.
pub fn set_bits<B: RegisterBus>(bus: &mut B, offset: usize, bits: u32, mask: u32) -> Result<()> {
    check(bits, mask)?;
    bus.set(offset, bits);
    Ok(())
}

/// Clear `bits` of the field at `offset`, leaving the others untouched
///
/// # Errors
/// [`Error::OutOfRange`] if `bits` has bits outside `mask`.
pub fn unset_bits<B: RegisterBus>(bus: &mut B, offset: usize, bits: u32, mask: u32) -> Result<()> {
    check(bits, mask)?;
    bus.clear(offset, bits);
    Ok(())
}

/// Whether every bit of `bits` is set
///
/// # Errors
/// [`Error::OutOfRange`] if `bits` has bits outside `mask`.
pub fn are_bits_set<B: RegisterBus>(bus: &mut B, offset: usize, bits: u32, mask: u32) -> Result<bool> {
    check(bits, mask)?;
    Ok(bus.read(offset) & bits == bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::memory::MemoryBus;

    #[test]
    fn set_and_unset_keep_neighbours() {
        let mut bus = MemoryBus::new(8).with_word(4, 0x81);
        set_bits(&mut bus, 4, 0x06, 0xff).unwrap();
        assert_eq!(bus.peek(4), 0x87);
        unset_bits(&mut bus, 4, 0x80, 0xff).unwrap();
        assert_eq!(bus.peek(4), 0x07);
    }

    #[test]
    fn all_bits_must_be_set() {
        let mut bus = MemoryBus::new(4).with_word(0, 0x05);
        assert!(are_bits_set(&mut bus, 0, 0x05, 0xff).unwrap());
        assert!(!are_bits_set(&mut bus, 0, 0x07, 0xff).unwrap());
    }

    #[test]
    fn bits_outside_mask_are_rejected() {
        let mut bus = MemoryBus::new(4);
        let err = set_bits(&mut bus, 0, 0x100, 0xff).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { bits: 0x100, mask: 0xff }));
        assert_eq!(bus.peek(0), 0, "nothing written on error");
    }
}
