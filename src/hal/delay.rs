//! Blocking delays
//!
//! Calibration waits a few microseconds between register writes and CORDIC
//! samples. The wait goes through `embedded_hal::delay::DelayNs` so host
//! tests can run without sleeping.

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// Delay backed by `std::thread::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Delay that returns immediately
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
