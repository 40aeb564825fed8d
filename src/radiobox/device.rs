//! RadioBox register-level driver
//!
//! One method per hardware function: every setter converts its argument
//! with [`super::encoding`] and writes the resulting words. The higher-level
//! sequencing lives in [`super::control`] and [`super::calibration`].

use std::sync::Arc;

use fixed::types::U8F8;
use tracing::{debug, trace};

use super::compensation::{GainCompensation, Uncompensated};
use super::control::OutputCache;
use super::encoding::{
    self, DdsWord, Qmix, RX_MUXIN_BOOST_SHIFTS, TX_MUXIN_BOOST_SHIFTS,
};
use super::regs::{ctrl, pwr, reg, status};
use super::version::{FpgaVersion, VersionError};
use crate::calib::CalibParams;
use crate::error::{Error, Result};
use crate::hal::bus::RegisterBus;
use crate::hal::delay::StdDelay;
use crate::types::{ModSource, Overdrive, RfOut, RxModType, TxModType};

/// Connection points selected by `enable(true)`: RFOUT2 0x30, RFOUT1 0x1C
const SRC_CON_PNT_ENABLED: u32 = 0x301C_0000;
/// TX mixer input gain selected by `enable(true)`
const TX_MUXIN_GAIN_ENABLED: u32 = 0x7FFF;
/// TX amplifier gain selected by `enable(true)`, about 200 mV
const TX_AMP_RF_GAIN_ENABLED: u32 = 0x0C80;

/// Shared gain compensation provider
pub type SharedCompensation = Arc<dyn GainCompensation + Send + Sync>;

/// RadioBox sub-module on a mapped register window
///
/// Owns the window, the calibration record, the RF output cache of the
/// control-state updater and the delay used while calibrating.
pub struct RadioBox<B, D = StdDelay> {
    bus: B,
    calib: CalibParams,
    pub(super) cache: OutputCache,
    pub(super) compensation: SharedCompensation,
    pub(super) delay: D,
}

impl<B: RegisterBus> RadioBox<B> {
    /// Driver on a mapped window, sleeping the thread while calibrating
    pub fn new(bus: B, calib: CalibParams) -> Self {
        Self::with_delay(bus, calib, StdDelay)
    }
}

impl<B: RegisterBus, D> RadioBox<B, D> {
    /// Driver on a mapped window with a custom delay
    pub fn with_delay(bus: B, calib: CalibParams, delay: D) -> Self {
        Self {
            bus,
            calib,
            cache: OutputCache::default(),
            compensation: Arc::new(Uncompensated),
            delay,
        }
    }

    /// Use `compensation` for the RF output gain correction
    #[must_use]
    pub fn with_compensation(mut self, compensation: SharedCompensation) -> Self {
        self.compensation = compensation;
        self
    }

    /// Calibration record in use
    pub fn calib(&self) -> &CalibParams {
        &self.calib
    }

    /// Calibration record in use, mutable
    pub fn calib_mut(&mut self) -> &mut CalibParams {
        &mut self.calib
    }

    /// Underlying register window
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying register window, mutable
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give back the window and the calibration record
    pub fn into_parts(self) -> (B, CalibParams) {
        (self.bus, self.calib)
    }

    fn base(&self) -> f64 {
        self.calib.base_osc_hz
    }

    fn write_dds(&mut self, lo: usize, hi: usize, word: DdsWord) {
        self.bus.write(lo, word.lo());
        self.bus.write(hi, word.hi());
    }

    fn read_dds(&mut self, lo: usize, hi: usize) -> DdsWord {
        let lo = self.bus.read(lo);
        let hi = self.bus.read(hi);
        DdsWord::from_words(lo, hi)
    }

    pub(super) fn set_ctrl_bits(&mut self, bits: u32) {
        self.bus.set(reg::CTRL, bits);
    }

    pub(super) fn clear_ctrl_bits(&mut self, bits: u32) {
        self.bus.clear(reg::CTRL, bits);
    }

    pub(super) fn write_reg(&mut self, offset: usize, value: u32) {
        self.bus.write(offset, value);
    }

    fn check_offset(&self, offset: usize) -> Result<()> {
        if offset % 4 != 0 || offset + 4 > self.bus.size() {
            return Err(Error::Misaligned(offset));
        }
        Ok(())
    }

    /// Read any register of the window
    ///
    /// # Errors
    /// [`Error::Misaligned`] for unaligned offsets or offsets beyond the
    /// window.
    pub fn read_register(&mut self, offset: usize) -> Result<u32> {
        self.check_offset(offset)?;
        let value = self.bus.read(offset);
        debug!("read register {offset:#06x} -> {value:#010x}");
        Ok(value)
    }

    /// Write any register of the window
    ///
    /// # Errors
    /// [`Error::Misaligned`] for unaligned offsets or offsets beyond the
    /// window.
    pub fn write_register(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check_offset(offset)?;
        debug!("write register {offset:#06x} <- {value:#010x}");
        self.bus.write(offset, value);
        Ok(())
    }

    /// Switch the sub-module on with a default routing, or off
    pub fn enable(&mut self, on: bool) {
        debug!(on, "RadioBox enable");
        if on {
            self.bus.write(reg::CTRL, ctrl::ENABLE);
            self.bus.write(reg::SRC_CON_PNT, SRC_CON_PNT_ENABLED);
            self.bus.write(reg::TX_MUXIN_GAIN, TX_MUXIN_GAIN_ENABLED);
            self.bus.write(reg::TX_AMP_RF_GAIN, TX_AMP_RF_GAIN_ENABLED);
            self.bus.write(reg::TX_AMP_RF_OFS, 0);
        } else {
            self.bus.write(reg::SRC_CON_PNT, 0);
            self.bus.write(reg::TX_MUXIN_GAIN, 0);
            self.bus.write(reg::TX_AMP_RF_GAIN, 0);
            self.bus.write(reg::RX_MUXIN_SRC, 0);
            self.bus.write(reg::CTRL, 0);
        }
    }

    /// Stop all oscillators and pulse their reset and resync lines
    pub fn reset(&mut self) {
        debug!("RadioBox reset");
        for (inc_lo, inc_hi, ofs_lo, ofs_hi) in [
            (reg::TX_MOD_OSC_INC_LO, reg::TX_MOD_OSC_INC_HI, reg::TX_MOD_OSC_OFS_LO, reg::TX_MOD_OSC_OFS_HI),
            (reg::TX_CAR_OSC_INC_LO, reg::TX_CAR_OSC_INC_HI, reg::TX_CAR_OSC_OFS_LO, reg::TX_CAR_OSC_OFS_HI),
            (reg::RX_MOD_OSC_INC_LO, reg::RX_MOD_OSC_INC_HI, reg::RX_MOD_OSC_OFS_LO, reg::RX_MOD_OSC_OFS_HI),
            (reg::RX_CAR_OSC_INC_LO, reg::RX_CAR_OSC_INC_HI, reg::RX_CAR_OSC_OFS_LO, reg::RX_CAR_OSC_OFS_HI),
        ] {
            self.write_dds(inc_lo, inc_hi, DdsWord::ZERO);
            self.write_dds(ofs_lo, ofs_hi, DdsWord::ZERO);
        }

        let resync = ctrl::RESYNC_ALL | ctrl::ENABLE;
        self.bus.write(reg::CTRL, resync);
        self.bus.write(reg::CTRL, resync | ctrl::RESET_CAR_OSCS);
        self.bus.write(reg::CTRL, resync);
        self.bus.write(reg::CTRL, ctrl::ENABLE);
    }

    /// Raw content of the version register
    pub fn raw_version(&mut self) -> u32 {
        self.bus.read(reg::VERSION)
    }

    /// Validated firmware version
    ///
    /// # Errors
    /// See [`FpgaVersion::from_raw`].
    pub fn version(&mut self) -> Result<FpgaVersion, VersionError> {
        FpgaVersion::from_raw(self.raw_version())
    }

    /// Power up the TX chain for a modulation
    pub fn set_tx_modtyp(&mut self, modtyp: TxModType) {
        let masked = self.bus.read(reg::PWR_CTRL) & !pwr::TX_MODTYP_MASK;
        self.bus.write(reg::PWR_CTRL, masked);
        self.bus.write(reg::PWR_CTRL, masked | u32::from(modtyp.code()) << pwr::TX_MODTYP_SHIFT);
    }

    /// Power up the RX chain for a demodulation
    pub fn set_rx_modtyp(&mut self, modtyp: RxModType) {
        let masked = self.bus.read(reg::PWR_CTRL) & !pwr::RX_MODTYP_MASK;
        self.bus.write(reg::PWR_CTRL, masked);
        self.bus.write(reg::PWR_CTRL, masked | u32::from(modtyp.code()));
    }

    /// TX mixer input gain in percent and ADC offset correction
    pub fn set_tx_muxin_gain(&mut self, percent: i32, offset: i16) {
        let gain = encoding::muxin_gain_word(percent, TX_MUXIN_BOOST_SHIFTS);
        trace!("tx_muxin_gain {percent}% -> {gain:#010x}, ofs {offset}");
        self.bus.write(reg::TX_MUXIN_GAIN, gain);
        self.bus.write(reg::TX_MUXIN_OFS, u32::from(offset as u16));
    }

    /// Route a source into the TX mixer
    pub fn set_tx_muxin_source(&mut self, source: ModSource) {
        self.bus.write(reg::TX_MUXIN_SRC, source.mux_id());
    }

    /// RX mixer input gain in percent and ADC offset correction
    pub fn set_rx_muxin_gain(&mut self, percent: i32, offset: i16) {
        let gain = encoding::muxin_gain_word(percent, RX_MUXIN_BOOST_SHIFTS);
        trace!("rx_muxin_gain {percent}% -> {gain:#010x}, ofs {offset}");
        self.bus.write(reg::RX_MUXIN_GAIN, gain);
        self.bus.write(reg::RX_MUXIN_OFS, u32::from(offset as u16));
    }

    /// Route a source into the RX mixer
    pub fn set_rx_muxin_source(&mut self, source: ModSource) {
        self.bus.write(reg::RX_MUXIN_SRC, source.mux_id());
    }

    /// TX modulation oscillator frequency (Weaver LO or test tone)
    pub fn set_tx_mod_osc_qrg(&mut self, hz: f64) {
        let word = encoding::frequency_to_dds(hz, self.base());
        trace!("tx_mod_osc {hz} Hz -> {:#014x}", word.bits());
        self.write_dds(reg::TX_MOD_OSC_INC_LO, reg::TX_MOD_OSC_INC_HI, word);
        self.write_dds(reg::TX_MOD_OSC_OFS_LO, reg::TX_MOD_OSC_OFS_HI, DdsWord::ZERO);
    }

    fn set_tx_mod_qmix(&mut self, qmix: Qmix) {
        trace!("tx_mod_qmix gain {:#06x} ofs {:#014x}", qmix.gain, qmix.offset.bits());
        self.bus.write(reg::TX_MOD_QMIX_GAIN, qmix.gain);
        self.write_dds(reg::TX_MOD_QMIX_OFS_LO, reg::TX_MOD_QMIX_OFS_HI, qmix.offset);
    }

    /// TX quadrature mixer for CW/AM (`carrier`) or SSB
    pub fn set_tx_mod_qmix_am(&mut self, grade_percent: f64, carrier: bool) {
        self.set_tx_mod_qmix(encoding::qmix_am(grade_percent, carrier));
    }

    /// TX quadrature mixer for FM
    pub fn set_tx_mod_qmix_fm(&mut self, carrier_hz: f64, deviation_hz: f64) {
        let qmix = encoding::qmix_fm(carrier_hz, deviation_hz, self.base());
        self.set_tx_mod_qmix(qmix);
    }

    /// TX quadrature mixer for PM
    pub fn set_tx_mod_qmix_pm(&mut self, degrees: f64) {
        self.set_tx_mod_qmix(encoding::qmix_pm(degrees));
    }

    /// TX carrier frequency
    pub fn set_tx_car_osc_qrg(&mut self, hz: f64) {
        let word = encoding::frequency_to_dds(hz, self.base());
        trace!("tx_car_osc {hz} Hz -> {:#014x}", word.bits());
        self.write_dds(reg::TX_CAR_OSC_INC_LO, reg::TX_CAR_OSC_INC_HI, word);
        self.write_dds(reg::TX_CAR_OSC_OFS_LO, reg::TX_CAR_OSC_OFS_HI, DdsWord::ZERO);
    }

    /// TX carrier frequency currently programmed
    pub fn tx_car_osc_qrg(&mut self) -> f64 {
        let word = self.read_dds(reg::TX_CAR_OSC_INC_LO, reg::TX_CAR_OSC_INC_HI);
        encoding::dds_to_frequency(word, self.base())
    }

    /// TX carrier sweep control (50 = stopped)
    pub fn set_tx_car_osc_scan(&mut self, qrg_inc: i32) {
        let word = encoding::scanner_word(qrg_inc, self.base());
        trace!("tx_car_osc scanner {qrg_inc} -> {:#014x}", word.bits());
        self.write_dds(reg::TX_CAR_OSC_INC_SCNR_LO, reg::TX_CAR_OSC_INC_SCNR_HI, word);
    }

    /// TX carrier sweep rate in Hz/s currently programmed
    pub fn tx_car_osc_scan_rate(&mut self) -> f64 {
        let word = self.read_dds(reg::TX_CAR_OSC_INC_SCNR_LO, reg::TX_CAR_OSC_INC_SCNR_HI);
        encoding::scanner_rate(word, self.base())
    }

    /// TX amplifier gain and offset in millivolts
    pub fn set_tx_amp_rf_gain_ofs(&mut self, gain_mv: f64, ofs_mv: f64) {
        self.bus.write(reg::TX_AMP_RF_GAIN, encoding::amp_rf_word(gain_mv));
        self.bus.write(reg::TX_AMP_RF_OFS, encoding::amp_rf_word(ofs_mv));
    }

    /// RX carrier frequency
    pub fn set_rx_car_osc_qrg(&mut self, hz: f64) {
        let word = encoding::frequency_to_dds(hz, self.base());
        trace!("rx_car_osc {hz} Hz -> {:#014x}", word.bits());
        self.write_dds(reg::RX_CAR_OSC_INC_LO, reg::RX_CAR_OSC_INC_HI, word);
        self.write_dds(reg::RX_CAR_OSC_OFS_LO, reg::RX_CAR_OSC_OFS_HI, DdsWord::ZERO);
    }

    /// RX carrier frequency currently programmed
    pub fn rx_car_osc_qrg(&mut self) -> f64 {
        let word = self.read_dds(reg::RX_CAR_OSC_INC_LO, reg::RX_CAR_OSC_INC_HI);
        encoding::dds_to_frequency(word, self.base())
    }

    /// RX carrier sweep control (50 = stopped)
    pub fn set_rx_car_osc_scan(&mut self, qrg_inc: i32) {
        let word = encoding::scanner_word(qrg_inc, self.base());
        trace!("rx_car_osc scanner {qrg_inc} -> {:#014x}", word.bits());
        self.write_dds(reg::RX_CAR_OSC_INC_SCNR_LO, reg::RX_CAR_OSC_INC_SCNR_HI, word);
    }

    /// RX carrier sweep rate in Hz/s currently programmed
    pub fn rx_car_osc_scan_rate(&mut self) -> f64 {
        let word = self.read_dds(reg::RX_CAR_OSC_INC_SCNR_LO, reg::RX_CAR_OSC_INC_SCNR_HI);
        encoding::scanner_rate(word, self.base())
    }

    /// RX modulation oscillator frequency (Weaver LO)
    pub fn set_rx_mod_osc_qrg(&mut self, hz: f64) {
        let word = encoding::frequency_to_dds(hz, self.base());
        self.write_dds(reg::RX_MOD_OSC_INC_LO, reg::RX_MOD_OSC_INC_HI, word);
        self.write_dds(reg::RX_MOD_OSC_OFS_LO, reg::RX_MOD_OSC_OFS_HI, DdsWord::ZERO);
    }

    /// AFC Weaver offset correction
    pub fn set_rx_afc_weaver(&mut self, hz: f64) {
        let word = encoding::afc_weaver_word(hz, self.base());
        self.write_dds(reg::RX_CAR_CALC_WEAVER_INC_LO, reg::RX_CAR_CALC_WEAVER_INC_HI, word);
    }

    /// AM envelope filter variant
    pub fn set_rx_amenv_filter(&mut self, variant: i32) {
        self.bus.write(reg::RX_AMENV_FILTVAR, encoding::amenv_filter_word(variant));
    }

    /// SSB/AM-sync demodulator gain in percent
    pub fn set_rx_mod_ssb_am_gain(&mut self, percent: f64) {
        self.bus.write(reg::RX_MOD_SSB_AM_GAIN, encoding::ssb_am_gain_word(percent));
    }

    /// AM envelope demodulator gain in percent
    pub fn set_rx_mod_amenv_gain(&mut self, percent: f64) {
        self.bus.write(reg::RX_MOD_AMENV_GAIN, encoding::demod_gain_word(percent));
    }

    /// FM demodulator gain in percent
    pub fn set_rx_mod_fm_gain(&mut self, percent: f64) {
        self.bus.write(reg::RX_MOD_FM_GAIN, encoding::demod_gain_word(percent));
    }

    /// PM demodulator gain in percent
    pub fn set_rx_mod_pm_gain(&mut self, percent: f64) {
        self.bus.write(reg::RX_MOD_PM_GAIN, encoding::demod_gain_word(percent));
    }

    /// RF output gain correction and DAC offset
    pub fn set_rfout_gain_ofs(&mut self, out: RfOut, gain: U8F8, offset: u16) {
        let (gain_reg, ofs_reg) = match out {
            RfOut::Out1 => (reg::RFOUT1_GAIN, reg::RFOUT1_OFS),
            RfOut::Out2 => (reg::RFOUT2_GAIN, reg::RFOUT2_OFS),
        };
        trace!("{out:?} gain {gain} ofs {offset}");
        self.bus.write(gain_reg, u32::from(gain.to_bits()));
        self.bus.write(ofs_reg, u32::from(offset));
    }

    /// Overdrive flags of the RF inputs
    pub fn overdrive(&mut self) -> Overdrive {
        Overdrive::from_bits(encoding::overdrive_flags(self.bus.read(reg::STATUS)))
    }

    /// Whether the TX modulation oscillator sits at phase zero
    pub fn tx_mod_osc_at_phase_zero(&mut self) -> bool {
        self.bus.read(reg::STATUS) & status::TX_MOD_OSC_PHASE_ZERO != 0
    }

    /// Pulse the TX modulation oscillator resync unless it is at phase zero
    ///
    /// Returns whether a resync was issued.
    pub fn resync_tx_mod_osc(&mut self) -> bool {
        if self.tx_mod_osc_at_phase_zero() {
            return false;
        }
        self.clear_ctrl_bits(ctrl::TX_MOD_OSC_RESYNC);
        self.set_ctrl_bits(ctrl::TX_MOD_OSC_RESYNC);
        true
    }
}
