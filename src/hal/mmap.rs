//! `/dev/mem` register windows
//!
//! The only place in the crate that touches raw pointers.

#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::atomic::{fence, Ordering};

use tracing::debug;

use super::bus::{Mapper, RegisterBus};
use crate::config::DEV_MEM;
use crate::error::{Error, Result};

/// Memory-mapped register window
///
/// Unmapped when dropped.
pub struct MmapWindow {
    regs: NonNull<u32>,
    size: usize,
    _file: File,
}

// The mapping is owned exclusively by this value; moving it to another
// thread moves the only handle.
unsafe impl Send for MmapWindow {}

impl MmapWindow {
    fn open(device: &Path, base: usize, size: usize) -> Result<Self> {
        let map_err = |source| Error::Map { base, size, source };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(map_err)?;

        let offset = libc::off_t::try_from(base)
            .map_err(|_| map_err(io::Error::from(io::ErrorKind::InvalidInput)))?;

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(map_err(io::Error::last_os_error()));
        }

        let regs = NonNull::new(ptr.cast::<u32>()).ok_or_else(|| map_err(io::Error::last_os_error()))?;

        debug!("mapped {size:#x} bytes at {base:#010x} to {:p}", regs.as_ptr());

        Ok(Self { regs, size, _file: file })
    }

    fn check(&self, offset: usize) {
        assert!(offset % 4 == 0, "register offset must be 4-byte aligned");
        assert!(offset + 4 <= self.size, "register offset out of bounds");
    }
}

impl RegisterBus for MmapWindow {
    #[inline]
    fn read(&mut self, offset: usize) -> u32 {
        self.check(offset);
        unsafe { ptr::read_volatile(self.regs.as_ptr().add(offset / 4)) }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: u32) {
        self.check(offset);
        unsafe {
            ptr::write_volatile(self.regs.as_ptr().add(offset / 4), value);
        }
        // keep CPU stores ordered against the FPGA fabric
        fence(Ordering::SeqCst);
    }

    fn size(&self) -> usize {
        self.size
    }
}

impl Drop for MmapWindow {
    fn drop(&mut self) {
        let rc = unsafe { libc::munmap(self.regs.as_ptr().cast(), self.size) };
        if rc != 0 {
            debug!(error = %io::Error::last_os_error(), "munmap failed");
        }
    }
}

/// Maps windows of the physical address space through `/dev/mem`
#[derive(Clone, Debug)]
pub struct DevMemMapper {
    device: PathBuf,
}

impl DevMemMapper {
    /// Mapper on `/dev/mem`
    #[must_use]
    pub fn new() -> Self {
        Self::with_device(DEV_MEM)
    }

    /// Mapper on another memory device
    #[must_use]
    pub fn with_device(device: impl Into<PathBuf>) -> Self {
        Self { device: device.into() }
    }
}

impl Default for DevMemMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for DevMemMapper {
    type Bus = MmapWindow;

    fn map(&mut self, base: usize, size: usize) -> Result<MmapWindow> {
        MmapWindow::open(&self.device, base, size)
    }
}
