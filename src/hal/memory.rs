//! In-memory register window
//!
//! Stands in for the FPGA when running on a host: registers are plain
//! words, optionally with a log of every write so register sequences can be
//! checked after the fact.

use std::collections::VecDeque;

use super::bus::{Mapper, RegisterBus};
use crate::error::Result;

/// Register window backed by a `Vec<u32>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryBus {
    words: Vec<u32>,
    log: Option<Vec<(usize, u32)>>,
}

impl MemoryBus {
    /// Zeroed window of `size` bytes (rounded up to whole words)
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            words: vec![0; size.div_ceil(4)],
            log: None,
        }
    }

    /// Preset a register
    #[must_use]
    pub fn with_word(mut self, offset: usize, value: u32) -> Self {
        self.poke(offset, value);
        self
    }

    /// Record every write from now on
    #[must_use]
    pub fn logging(mut self) -> Self {
        self.log = Some(Vec::new());
        self
    }

    /// Current register value, without logging
    #[must_use]
    pub fn peek(&self, offset: usize) -> u32 {
        self.words[offset / 4]
    }

    /// Overwrite a register behind the driver's back, without logging
    pub fn poke(&mut self, offset: usize, value: u32) {
        self.words[offset / 4] = value;
    }

    /// Writes recorded since logging was enabled, as `(offset, value)`
    #[must_use]
    pub fn write_log(&self) -> &[(usize, u32)] {
        self.log.as_deref().unwrap_or(&[])
    }

    /// Values written to one register, in order
    #[must_use]
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.write_log()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Forget recorded writes
    pub fn clear_log(&mut self) {
        if let Some(log) = self.log.as_mut() {
            log.clear();
        }
    }
}

impl RegisterBus for MemoryBus {
    fn read(&mut self, offset: usize) -> u32 {
        self.peek(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.words[offset / 4] = value;
        if let Some(log) = self.log.as_mut() {
            log.push((offset, value));
        }
    }

    fn size(&self) -> usize {
        self.words.len() * 4
    }
}

/// Mapper handing out in-memory windows
///
/// Each `map` call takes the next queued window; once the queue is empty a
/// fresh zeroed window of the requested size is returned. Queueing two
/// windows with different version registers simulates an FPGA reload.
#[derive(Debug, Default)]
pub struct MemoryMapper {
    queued: VecDeque<MemoryBus>,
    maps: Vec<(usize, usize)>,
}

impl MemoryMapper {
    /// Mapper with nothing queued
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the window returned by the next unanswered `map` call
    #[must_use]
    pub fn then(mut self, bus: MemoryBus) -> Self {
        self.queued.push_back(bus);
        self
    }

    /// Every `(base, size)` mapped so far
    #[must_use]
    pub fn maps(&self) -> &[(usize, usize)] {
        &self.maps
    }
}

impl Mapper for MemoryMapper {
    type Bus = MemoryBus;

    fn map(&mut self, base: usize, size: usize) -> Result<MemoryBus> {
        self.maps.push((base, size));
        Ok(self.queued.pop_front().unwrap_or_else(|| MemoryBus::new(size)))
    }
}
