//! Hardware Abstraction Layer
//!
//! Register windows of the FPGA are reached through the [`bus::RegisterBus`]
//! trait. On the board the window is a `/dev/mem` mapping
//! ([`mmap::MmapWindow`]); on a host it is an in-memory array
//! ([`memory::MemoryBus`]). Everything above this layer is written against
//! the trait only.

pub mod bits;
pub mod bus;
pub mod delay;
pub mod memory;
#[cfg(feature = "linux")]
pub mod mmap;
