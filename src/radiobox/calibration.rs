//! ADC offset calibration
//!
//! With the input muted the CORDIC magnitude behind the RX mixer is a noise
//! proxy: the DC offset correction that minimizes it is found by successive
//! approximation, one bit per step from the MSB down.

use embedded_hal::delay::DelayNs;
use tracing::{debug, info};

use super::device::RadioBox;
use super::encoding::DdsWord;
use super::regs::{ctrl, pwr, reg};
use crate::hal::bus::RegisterBus;
use crate::types::AdcChannel;

/// RX carrier increment used while measuring, 10 kHz at 125 MHz
const MEASURE_CAR_OSC_INC: DdsWord = DdsWord::from_words(0x3E2D_6238, 0x0000_0005);

/// Input gain while measuring: full scale, no booster
const MEASURE_MUXIN_GAIN: u32 = 0x1FFF;

/// Settling time before and between CORDIC samples
const SAMPLE_DELAY_US: u32 = 5;

/// CORDIC samples accumulated per measurement
const SAMPLES: u32 = 8;

/// Offsets are searched as unsigned values around this midpoint
const OFFSET_BIAS: i32 = 0x8000;

/// Source of noise readings for a trial offset
///
/// `reduction` shifts the input gain down (`0xffff >> reduction`) so the
/// coarse steps of the search are not saturated by a large offset.
pub trait NoiseProbe {
    /// Accumulated noise for `offset` at the given gain reduction
    fn measure(&mut self, offset: i16, reduction: u32) -> u32;
}

impl<F> NoiseProbe for F
where
    F: FnMut(i16, u32) -> u32,
{
    fn measure(&mut self, offset: i16, reduction: u32) -> u32 {
        self(offset, reduction)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn biased(value: u16) -> i16 {
    (i32::from(value) - OFFSET_BIAS) as i16
}

/// Offset that minimizes the noise reported by `probe`
///
/// Bits 15 down to 1 are decided by comparing the candidates with the next
/// lower bit set and with both bits set; a strictly quieter second candidate
/// keeps the bit. The LSB is decided last at full gain.
pub fn minimize_noise<P: NoiseProbe + ?Sized>(probe: &mut P) -> i16 {
    let mut min: u16 = 0;

    for i in (1..=15u32).rev() {
        let reduction = i.saturating_sub(11);
        let lo = min | 0b01 << (i - 1);
        let hi = min | 0b11 << (i - 1);

        let noise_lo = probe.measure(biased(lo), reduction);
        let noise_hi = probe.measure(biased(hi), reduction);
        if noise_hi < noise_lo {
            min |= 1 << i;
        }
    }

    let noise_lo = probe.measure(biased(min), 0);
    let noise_hi = probe.measure(biased(min | 1), 0);
    if noise_hi < noise_lo {
        min |= 1;
    }

    biased(min)
}

impl<B: RegisterBus, D: DelayNs> RadioBox<B, D> {
    /// Route `channel` into the RX path with the rest of the module quiet
    pub fn prepare_rx_measurement(&mut self, channel: AdcChannel) {
        debug!(%channel, "prepare offset measurement");
        self.write_reg(reg::CTRL, ctrl::ENABLE);
        self.write_reg(reg::PWR_CTRL, pwr::ALL_ON);
        self.write_reg(reg::SRC_CON_PNT, 0);
        self.write_reg(reg::RX_CAR_OSC_INC_LO, MEASURE_CAR_OSC_INC.lo());
        self.write_reg(reg::RX_CAR_OSC_INC_HI, MEASURE_CAR_OSC_INC.hi());
        self.write_reg(reg::RX_MUXIN_SRC, channel.mux_id());
        self.write_reg(reg::RX_MUXIN_GAIN, MEASURE_MUXIN_GAIN);
    }

    /// Undo [`Self::prepare_rx_measurement`] and disable the module
    pub fn finish_rx_measurement(&mut self) {
        self.write_reg(reg::RX_MUXIN_OFS, 0);
        self.write_reg(reg::RX_MUXIN_SRC, 0);
        self.write_reg(reg::RX_CAR_OSC_INC_LO, 0);
        self.write_reg(reg::RX_CAR_OSC_INC_HI, 0);
        self.write_reg(reg::PWR_CTRL, 0);
        self.write_reg(reg::CTRL, 0);
    }

    /// Accumulated CORDIC magnitude with `offset` applied
    #[allow(clippy::cast_sign_loss)]
    pub fn measure_noise(&mut self, offset: i16, reduction: u32) -> u32 {
        self.write_reg(reg::RX_MUXIN_OFS, i32::from(offset) as u32);
        self.write_reg(reg::RX_MUXIN_GAIN, 0xFFFF >> reduction);
        self.delay.delay_us(SAMPLE_DELAY_US);

        let mut sum = 0u32;
        for _ in 0..SAMPLES {
            let mag = self.bus_mut().read(reg::RX_AFC_CORDIC_MAG);
            sum = sum.wrapping_add(mag.wrapping_add(16) >> 5);
            self.delay.delay_us(SAMPLE_DELAY_US);
        }
        sum
    }

    /// Measure and store the offset of every calibratable channel
    pub fn calibrate_adc_offsets(&mut self) {
        info!("ADC offset calibration");
        for channel in AdcChannel::CALIBRATION_ORDER {
            self.prepare_rx_measurement(channel);
            let offset = minimize_noise(&mut |ofs: i16, reduction: u32| self.measure_noise(ofs, reduction));
            info!(%channel, offset, "offset {:#06x}", offset as u16);
            self.calib_mut().set_adc_offset(channel, offset);
        }
        self.finish_rx_measurement();
    }

    /// Optionally recalibrate, then restore the requested run state
    pub fn calibrate(&mut self, measure: bool, enable: bool) {
        if measure {
            self.calibrate_adc_offsets();
        }
        self.enable(enable);
    }
}
