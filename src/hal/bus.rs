//! Register Bus Abstractions
//!
//! A register bus is a window of 32-bit registers addressed by byte offset.

use crate::error::Result;

/// Word-addressed access to a mapped register window
///
/// Offsets are byte offsets and must be 4-byte aligned. Implementations may
/// panic on offsets outside their window; callers use the constant offsets
/// of the register maps.
pub trait RegisterBus {
    /// Read the register at `offset`
    fn read(&mut self, offset: usize) -> u32;

    /// Write `value` to the register at `offset`
    fn write(&mut self, offset: usize, value: u32);

    /// Window size in bytes
    fn size(&self) -> usize;

    /// Read-modify-write
    fn modify(&mut self, offset: usize, f: impl FnOnce(u32) -> u32)
    where
        Self: Sized,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// OR `bits` into the register
    fn set(&mut self, offset: usize, bits: u32)
    where
        Self: Sized,
    {
        self.modify(offset, |v| v | bits);
    }

    /// Clear `bits` in the register
    fn clear(&mut self, offset: usize, bits: u32)
    where
        Self: Sized,
    {
        self.modify(offset, |v| v & !bits);
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read(&mut self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        (**self).write(offset, value);
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}

/// Something that can map a physical register window
///
/// Dropping the returned bus unmaps the window.
pub trait Mapper {
    /// Mapped window type
    type Bus: RegisterBus;

    /// Map `size` bytes starting at physical address `base`
    ///
    /// # Errors
    /// Returns [`crate::Error::Map`] if the window cannot be mapped.
    fn map(&mut self, base: usize, size: usize) -> Result<Self::Bus>;
}
