//! RadioBox register encodings
//!
//! Pure conversions between radio units (Hz, percent, millivolts, degrees)
//! and the fixed-point words the FPGA expects. Host-testable, no register
//! access.
//!
//! # Theory of Operation
//!
//! Every oscillator is a 48-bit phase accumulator clocked by the base
//! oscillator (nominally 125 MHz, calibrated per board). An output frequency
//! `f` needs the increment `2^48 * f / f_base`. Offsets use the same scale,
//! a full turn of phase being `2^48`.
//!
//! The frequency scanner adds its own increment to the carrier increment
//! 200 000 times per second, so a sweep of `r` Hz/s needs
//! `r * 2^48 / f_base / 200e3` per step.
//!
//! Mixer input gains are 16-bit linear up to 80 % and then switch to a
//! booster that shifts the sample left by up to 7 (TX) or 5 (RX) bits.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use fixed::types::U8F8;

use crate::config::{SCAN_DECADES, SCAN_MAX_HZ_PER_SEC, SCAN_STOP, SCAN_UPDATE_RATE_HZ};

/// Full turn of a 48-bit phase accumulator
pub const PHASE_SCALE: f64 = (1u64 << 48) as f64;

/// Booster range of the TX mixer input, in bit shifts
pub const TX_MUXIN_BOOST_SHIFTS: f64 = 7.0;

/// Booster range of the RX mixer input, in bit shifts
pub const RX_MUXIN_BOOST_SHIFTS: f64 = 5.0;

/// Input percentage where the booster regime starts
const MUXIN_LINEAR_LIMIT: i32 = 80;

/// 48-bit DDS word (increment or offset), stored sign-extended
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DdsWord(i64);

impl DdsWord {
    /// Zero increment
    pub const ZERO: Self = Self(0);

    /// Wrap raw accumulator bits
    #[must_use]
    pub const fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    /// Reassemble from the two register halves
    #[must_use]
    pub const fn from_words(lo: u32, hi: u32) -> Self {
        Self(((hi as i64) << 32) | lo as i64)
    }

    /// Raw accumulator bits
    #[must_use]
    pub const fn bits(self) -> i64 {
        self.0
    }

    /// Low register half (bits 0..31)
    #[must_use]
    pub const fn lo(self) -> u32 {
        self.0 as u32
    }

    /// High register half (bits 32..63)
    #[must_use]
    pub const fn hi(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

/// Round half away from zero, without truncating
fn round_away(value: f64) -> f64 {
    if value > 0.0 {
        value + 0.5
    } else if value < 0.0 {
        value - 0.5
    } else {
        value
    }
}

/// Phase increment for `hz` on a base oscillator of `base_hz`
#[must_use]
pub fn frequency_to_dds(hz: f64, base_hz: f64) -> DdsWord {
    DdsWord(round_away(PHASE_SCALE * (hz / base_hz)) as i64)
}

/// Frequency produced by a phase increment, rounded to whole Hz
#[must_use]
pub fn dds_to_frequency(word: DdsWord, base_hz: f64) -> f64 {
    (base_hz * (word.0 as f64 / PHASE_SCALE) + 0.5).floor()
}

/// Sweep rate in Hz/s selected by the scanner control
///
/// `qrg_inc` runs 0..=100; 50 stops the sweep and everything within 10 % of
/// the middle counts as stopped. The remaining travel maps logarithmically
/// onto three decades below 10 kHz/s, the sign giving the direction.
#[must_use]
pub fn scan_rate(qrg_inc: i32) -> Option<f64> {
    let deflection = f64::from(qrg_inc - SCAN_STOP) / f64::from(SCAN_STOP);
    if deflection.abs() < 0.1 {
        return None;
    }
    let exponent = deflection.abs() * SCAN_DECADES - SCAN_DECADES;
    let rate = SCAN_MAX_HZ_PER_SEC * 10f64.powf(exponent);
    Some(if deflection < 0.0 { -rate } else { rate })
}

/// Scanner increment for a `qrg_inc` control value
///
/// Down-sweeps store the one's complement of the magnitude.
#[must_use]
pub fn scanner_word(qrg_inc: i32, base_hz: f64) -> DdsWord {
    match scan_rate(qrg_inc) {
        None => DdsWord::ZERO,
        Some(rate) => {
            let bits = (rate.abs() * (PHASE_SCALE / base_hz) / SCAN_UPDATE_RATE_HZ) as i64;
            DdsWord(if rate < 0.0 { !bits } else { bits })
        }
    }
}

/// Sweep rate in Hz/s programmed by a scanner increment
#[must_use]
pub fn scanner_rate(word: DdsWord, base_hz: f64) -> f64 {
    let (magnitude, sign) = if word.0 < 0 { (!word.0, -1.0) } else { (word.0, 1.0) };
    sign * (magnitude as f64 * base_hz * SCAN_UPDATE_RATE_HZ) / PHASE_SCALE
}

/// Mixer input gain word for `percent` of full scale
///
/// Values above 100 are clamped, zero and below switch the input off.
#[must_use]
pub fn muxin_gain_word(percent: i32, boost_shifts: f64) -> u32 {
    let percent = percent.min(100);
    if percent <= 0 {
        0
    } else if percent < MUXIN_LINEAR_LIMIT {
        (0.5 + f64::from(percent) * f64::from(0xffff_u16) / f64::from(MUXIN_LINEAR_LIMIT)) as u32 & 0xffff
    } else {
        let shifts = (0.5 + f64::from(percent - MUXIN_LINEAR_LIMIT) * boost_shifts / 20.0) as u32;
        (shifts << 16) | 0xffff
    }
}

/// Quadrature mixer gain and offset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Qmix {
    /// 16-bit gain word
    pub gain: u32,
    /// 48-bit offset added after the mixer
    pub offset: DdsWord,
}

/// Quadrature mixer setting for AM (`carrier`) or SSB
///
/// With carrier the mixer output rides on an offset that shrinks as the
/// modulation grade rises, 0 % giving a plain carrier.
#[must_use]
pub fn qmix_am(grade_percent: f64, carrier: bool) -> Qmix {
    if carrier {
        let gain = f64::from(0x7fff_u16) * grade_percent / 100.0;
        let ofs = ((1u64 << 47) - 1) as f64 - ((1u64 << 46) - 1) as f64 * grade_percent / 100.0;
        Qmix {
            gain: gain as u32 & 0xffff,
            offset: DdsWord(ofs as i64),
        }
    } else {
        let gain = f64::from(0xffff_u16) * grade_percent / 100.0;
        Qmix {
            gain: gain as u32 & 0xffff,
            offset: DdsWord::ZERO,
        }
    }
}

/// Quadrature mixer setting for FM around `carrier_hz` with `deviation_hz`
#[must_use]
pub fn qmix_fm(carrier_hz: f64, deviation_hz: f64, base_hz: f64) -> Qmix {
    let gain = f64::from(0xffff_u16) * (f64::from(1u32 << 14) * deviation_hz / base_hz);
    let ofs = PHASE_SCALE * carrier_hz / base_hz;
    Qmix {
        gain: gain as u32 & 0xffff,
        offset: DdsWord(ofs as u64 as i64),
    }
}

/// Quadrature mixer setting for PM with a peak deviation of `degrees`
#[must_use]
pub fn qmix_pm(degrees: f64) -> Qmix {
    let gain = f64::from(0xffff_u16) * degrees / 180.0;
    Qmix {
        gain: gain as u32 & 0xffff,
        offset: DdsWord::ZERO,
    }
}

/// TX amplifier word for `millivolts` (2048 mV full scale)
#[must_use]
pub fn amp_rf_word(millivolts: f64) -> u32 {
    (f64::from(0x7fff_u16) * millivolts / 2048.0) as i32 as u32 & 0xffff
}

/// AFC Weaver increment for an intermediate frequency of `hz`
#[must_use]
pub fn afc_weaver_word(hz: f64, base_hz: f64) -> DdsWord {
    let inc = round_away(PHASE_SCALE * (hz / base_hz));
    DdsWord((inc * -625.0) as i64)
}

/// SSB/AM demodulator gain word
#[must_use]
pub fn ssb_am_gain_word(percent: f64) -> u32 {
    (f64::from(0xffff_u16) * 0.5 * percent / 100.0) as u32 & 0xffff
}

/// AM-ENV, FM and PM demodulator gain word
#[must_use]
pub fn demod_gain_word(percent: f64) -> u32 {
    (f64::from(0xffff_u16) * percent / 100.0) as u32 & 0xffff
}

/// RF output gain as unsigned 8.8 fixed point, truncated
///
/// A factor of 0 means unity gain. Factors of 256 and above wrap to the
/// low 16 bits of the register word.
#[must_use]
pub fn rfout_gain(factor: f64) -> U8F8 {
    let factor = if factor == 0.0 { 1.0 } else { factor };
    U8F8::from_bits(((factor * 256.0) as u32 & 0xffff) as u16)
}

/// AM envelope filter variant, clamped to the three available filters
#[must_use]
pub fn amenv_filter_word(variant: i32) -> u32 {
    variant.clamp(0, 2) as u32 & 0x3
}

/// Two-bit overdrive field of the status register
#[must_use]
pub const fn overdrive_flags(status: u32) -> u16 {
    use super::regs::status::{OVERDRIVE_MASK, OVERDRIVE_SHIFT};
    ((status & OVERDRIVE_MASK) >> OVERDRIVE_SHIFT) as u16
}
