//! Board calibration values
//!
//! In-memory image of the calibration record kept in the board EEPROM.
//! Reading and writing the EEPROM belongs to the platform; this crate only
//! consumes the values and updates the ADC offsets after a calibration run.

use crate::config::BASE_OSC_HZ;
use crate::types::AdcChannel;

/// Calibration record
#[derive(Clone, Debug, PartialEq)]
pub struct CalibParams {
    /// Measured frequency of the nominal 125 MHz base oscillator
    pub base_osc_hz: f64,
    adc_offsets: [i16; AdcChannel::COUNT],
}

impl Default for CalibParams {
    fn default() -> Self {
        Self::with_base_osc(BASE_OSC_HZ)
    }
}

impl CalibParams {
    /// Record with zero offsets and the given oscillator frequency
    #[must_use]
    pub const fn with_base_osc(base_osc_hz: f64) -> Self {
        Self {
            base_osc_hz,
            adc_offsets: [0; AdcChannel::COUNT],
        }
    }

    /// DC offset correction of an ADC channel
    #[must_use]
    pub const fn adc_offset(&self, channel: AdcChannel) -> i16 {
        self.adc_offsets[channel.index()]
    }

    /// Store the DC offset correction of an ADC channel
    pub fn set_adc_offset(&mut self, channel: AdcChannel, offset: i16) {
        self.adc_offsets[channel.index()] = offset;
    }
}
