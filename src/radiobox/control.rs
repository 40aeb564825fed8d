//! Control-State Updater
//!
//! Maps a [`RadioSettings`] snapshot onto the RadioBox registers. The RF
//! output gain correction is only recomputed when the routing, the
//! terminations or the carrier frequencies changed since the last call
//! ([`OutputCache`]).

use tracing::{debug, trace};

use super::device::RadioBox;
use super::encoding;
use super::regs::{ctrl, reg};
use crate::config::{SCAN_STOP, WEAVER_OSC_HZ};
use crate::hal::bus::RegisterBus;
use crate::types::{ModSource, Overdrive, RfOut, RxModType, RxMode, Termination, TxModType};

/// Demodulator gain programmed whenever the radio runs
const DEMOD_GAIN_PERCENT: f64 = 100.0;

/// Amplifier gain boost of the Weaver SSB modulator
const SSB_AMP_BOOST: f64 = 1.5;

/// Snapshot of every parameter the hardware state depends on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadioSettings {
    /// RadioBox running
    pub run: bool,
    /// TX modulation source
    pub tx_source: ModSource,
    /// TX modulation
    pub tx_modtyp: TxModType,
    /// RX demodulation and AM-ENV filter
    pub rx_mode: RxMode,
    /// Connection point shown on the LEDs
    pub led_csp: u8,
    /// Connection point routed to RF Out 1
    pub rfout1_csp: u8,
    /// Connection point routed to RF Out 2
    pub rfout2_csp: u8,
    /// Connection point routed to AC97 line-in left
    pub ac97_lil: u8,
    /// Connection point routed to AC97 line-in right
    pub ac97_lir: u8,
    /// RX mixer input
    pub rx_source: ModSource,
    /// TX carrier frequency in Hz
    pub tx_car_osc_hz: f64,
    /// RX carrier frequency in Hz
    pub rx_car_osc_hz: f64,
    /// TX modulation oscillator frequency in Hz
    pub tx_mod_osc_hz: f64,
    /// TX amplifier gain in mV
    pub tx_amp_rf_gain_mv: f64,
    /// TX modulation magnitude: percent (AM/SSB), Hz deviation (FM) or
    /// degrees (PM)
    pub tx_mod_osc_mag: f64,
    /// TX mixer input gain in percent
    pub tx_muxin_gain: i32,
    /// RX mixer input gain in percent
    pub rx_muxin_gain: i32,
    /// TX carrier follows the scanner
    pub tx_qrg_sel: bool,
    /// RX carrier follows the scanner
    pub rx_qrg_sel: bool,
    /// Load on RF Out 1
    pub rfout1_term: Termination,
    /// Load on RF Out 2
    pub rfout2_term: Termination,
    /// Scanner control, 50 = stopped
    pub qrg_inc: i32,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            run: false,
            tx_source: ModSource::None,
            tx_modtyp: TxModType::Cw,
            rx_mode: RxMode::default(),
            led_csp: 0,
            rfout1_csp: 0,
            rfout2_csp: 0,
            ac97_lil: 0,
            ac97_lir: 0,
            rx_source: ModSource::None,
            tx_car_osc_hz: 0.0,
            rx_car_osc_hz: 0.0,
            tx_mod_osc_hz: 0.0,
            tx_amp_rf_gain_mv: 0.0,
            tx_mod_osc_mag: 0.0,
            tx_muxin_gain: 0,
            rx_muxin_gain: 0,
            tx_qrg_sel: false,
            rx_qrg_sel: false,
            rfout1_term: Termination::Uncorrected,
            rfout2_term: Termination::Uncorrected,
            qrg_inc: SCAN_STOP,
        }
    }
}

impl RadioSettings {
    /// Packed `src_con_pnt` register: RFOUT2, RFOUT1 and LED points
    #[must_use]
    pub fn src_con_pnt(&self) -> u32 {
        u32::from(self.rfout2_csp) << 24 | u32::from(self.rfout1_csp) << 16 | u32::from(self.led_csp)
    }

    /// Packed `src_con_pnt2` register: AC97 line-in right and left points
    #[must_use]
    pub fn src_con_pnt2(&self) -> u32 {
        u32::from(self.ac97_lir) << 8 | u32::from(self.ac97_lil)
    }

    /// Scanner control of the TX carrier
    #[must_use]
    pub fn tx_scan(&self) -> i32 {
        if self.tx_qrg_sel { self.qrg_inc } else { SCAN_STOP }
    }

    /// Scanner control of the RX carrier
    #[must_use]
    pub fn rx_scan(&self) -> i32 {
        if self.rx_qrg_sel { self.qrg_inc } else { SCAN_STOP }
    }

    fn output_state(&self) -> OutputState {
        OutputState {
            src_con_pnt: self.src_con_pnt(),
            src_con_pnt2: self.src_con_pnt2(),
            rfout1_term: self.rfout1_term,
            rfout2_term: self.rfout2_term,
            tx_car_osc_hz: self.tx_car_osc_hz,
            rx_car_osc_hz: self.rx_car_osc_hz,
        }
    }
}

/// The values the RF output gain correction depends on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputState {
    /// Packed connection points
    pub src_con_pnt: u32,
    /// Packed AC97 connection points
    pub src_con_pnt2: u32,
    /// Load on RF Out 1
    pub rfout1_term: Termination,
    /// Load on RF Out 2
    pub rfout2_term: Termination,
    /// TX carrier frequency
    pub tx_car_osc_hz: f64,
    /// RX carrier frequency
    pub rx_car_osc_hz: f64,
}

/// Last output state written to the hardware
#[derive(Clone, Copy, Debug, Default)]
pub struct OutputCache(Option<OutputState>);

impl OutputCache {
    /// Store `state`, returning whether it differs from the cached one
    ///
    /// An empty cache always reports a change.
    pub fn refresh(&mut self, state: OutputState) -> bool {
        if self.0 == Some(state) {
            return false;
        }
        self.0 = Some(state);
        true
    }

    /// Forget the cached state so the next update rewrites the outputs
    pub fn invalidate(&mut self) {
        self.0 = None;
    }

    /// Cached state, if any
    #[must_use]
    pub fn get(&self) -> Option<&OutputState> {
        self.0.as_ref()
    }
}

/// Dominant frequency at a connection point
///
/// Audio points report the Weaver frequency, carrier points the carrier
/// they carry. Unknown points report 0 Hz, which disables compensation.
#[must_use]
pub fn rfout_frequency(con_pnt: u8, tx_car_osc_hz: f64, rx_car_osc_hz: f64) -> f64 {
    match con_pnt {
        0x04..=0x17 | 0x22..=0x41 | 0x48..=0x50 => WEAVER_OSC_HZ,
        0x18..=0x1F => tx_car_osc_hz,
        0x20..=0x21 => rx_car_osc_hz,
        _ => 0.0,
    }
}

/// Hardware state read back for the front-end
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Readback {
    /// TX carrier frequency as seen by the operator
    pub tx_car_osc_hz: f64,
    /// RX carrier frequency as seen by the operator
    pub rx_car_osc_hz: f64,
    /// RF input overdrive flags
    pub overdrive: Overdrive,
}

impl<B: RegisterBus, D> RadioBox<B, D> {
    /// Bring the hardware in line with `settings`
    pub fn apply_settings(&mut self, settings: &RadioSettings) {
        debug!(
            run = settings.run,
            tx_source = ?settings.tx_source,
            tx_modtyp = ?settings.tx_modtyp,
            rx_mode = ?settings.rx_mode,
            "apply settings"
        );

        let state = settings.output_state();
        if self.cache.refresh(state) {
            self.update_outputs(&state);
        }

        if settings.run {
            self.set_rx_mod_ssb_am_gain(DEMOD_GAIN_PERCENT);
            self.set_rx_mod_amenv_gain(DEMOD_GAIN_PERCENT);
            self.set_rx_mod_fm_gain(DEMOD_GAIN_PERCENT);
            self.set_rx_mod_pm_gain(DEMOD_GAIN_PERCENT);

            self.apply_tx_source(settings);
            if settings.tx_source != ModSource::None {
                self.apply_tx_modulation(settings);
            }
            self.apply_rx_source(settings);
            self.apply_rx_modulation(settings);
        } else {
            self.apply_stopped();
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn update_outputs(&mut self, state: &OutputState) {
        let outs = [
            (RfOut::Out1, (state.src_con_pnt >> 16) as u8, state.rfout1_term),
            (RfOut::Out2, (state.src_con_pnt >> 24) as u8, state.rfout2_term),
        ];
        for (out, con_pnt, term) in outs {
            let factor = match term {
                Termination::Uncorrected => 1.0,
                Termination::FiftyOhm | Termination::Open => {
                    let hz = rfout_frequency(con_pnt, state.tx_car_osc_hz, state.rx_car_osc_hz);
                    self.compensation.factor(hz, term == Termination::FiftyOhm)
                }
            };
            trace!("{out:?} con_pnt {con_pnt:#04x} factor {factor}");
            self.set_rfout_gain_ofs(out, encoding::rfout_gain(factor), 0);
        }
        self.write_reg(reg::SRC_CON_PNT, state.src_con_pnt);
        self.write_reg(reg::SRC_CON_PNT2, state.src_con_pnt2);
    }

    fn set_tx_carrier(&mut self, settings: &RadioSettings, hz: f64) {
        let scan = settings.tx_scan();
        if scan == SCAN_STOP {
            self.set_tx_car_osc_qrg(hz);
        }
        self.set_tx_car_osc_scan(scan);
    }

    fn set_rx_carrier(&mut self, settings: &RadioSettings, hz: f64) {
        let scan = settings.rx_scan();
        if scan == SCAN_STOP {
            self.set_rx_car_osc_qrg(hz);
        }
        self.set_rx_car_osc_scan(scan);
    }

    fn apply_tx_source(&mut self, settings: &RadioSettings) {
        let source = settings.tx_source;
        match source {
            ModSource::None => {
                self.set_tx_muxin_gain(0, 0);
                self.set_tx_muxin_source(ModSource::None);
                self.set_tx_carrier(settings, settings.tx_car_osc_hz);
                self.set_tx_mod_qmix_am(0.0, true);
                if self.resync_tx_mod_osc() {
                    self.set_ctrl_bits(ctrl::ADC_AUTO_OFS);
                }
            }
            ModSource::ModOsc => {
                self.set_tx_muxin_gain(0, 0);
                self.set_tx_muxin_source(ModSource::None);
            }
            ModSource::Ac97LineoutL | ModSource::Ac97LineoutR => {
                self.set_tx_muxin_gain(settings.tx_muxin_gain, 0);
                self.set_tx_muxin_source(source);
            }
            _ => {
                let offset = source.adc_channel().map_or(0, |ch| self.calib().adc_offset(ch));
                self.set_tx_muxin_gain(settings.tx_muxin_gain, offset);
                self.set_tx_muxin_source(source);
                self.set_ctrl_bits(ctrl::ADC_AUTO_OFS);
            }
        }
    }

    /// Modulation oscillator for AM, FM and PM: the test tone when it is the
    /// source, otherwise stopped at phase zero
    fn set_tx_mod_osc_for_source(&mut self, settings: &RadioSettings) {
        if settings.tx_source == ModSource::ModOsc {
            self.set_tx_mod_osc_qrg(settings.tx_mod_osc_hz);
        } else {
            self.set_tx_mod_osc_qrg(0.0);
            self.resync_tx_mod_osc();
        }
    }

    fn apply_tx_modulation(&mut self, settings: &RadioSettings) {
        let modtyp = settings.tx_modtyp;
        let gain = settings.tx_amp_rf_gain_mv;
        let mag = settings.tx_mod_osc_mag;
        self.set_tx_modtyp(modtyp);

        match modtyp {
            TxModType::Usb | TxModType::Lsb => {
                let weaver = if modtyp == TxModType::Usb { WEAVER_OSC_HZ } else { -WEAVER_OSC_HZ };
                self.clear_ctrl_bits(ctrl::TX_SIGNALS);
                self.set_tx_amp_rf_gain_ofs(gain * SSB_AMP_BOOST, 0.0);
                self.set_tx_carrier(settings, settings.tx_car_osc_hz + weaver);
                self.set_tx_mod_osc_qrg(weaver);
                self.set_tx_mod_qmix_am(mag, false);
            }
            TxModType::Am => {
                self.clear_ctrl_bits(ctrl::TX_SIGNALS);
                self.set_tx_amp_rf_gain_ofs(gain, 0.0);
                self.set_tx_carrier(settings, settings.tx_car_osc_hz);
                self.set_tx_mod_osc_for_source(settings);
                self.set_tx_mod_qmix_am(mag, true);
            }
            TxModType::Fm => {
                // carrier increment comes from the modulator stream
                self.clear_ctrl_bits(ctrl::TX_SIGNALS & !ctrl::TX_CAR_OSC_INC_STREAM);
                self.set_tx_amp_rf_gain_ofs(gain, 0.0);
                self.set_tx_mod_osc_for_source(settings);
                self.set_tx_mod_qmix_fm(settings.tx_car_osc_hz, mag);
                self.set_ctrl_bits(ctrl::TX_CAR_OSC_INC_STREAM);
            }
            TxModType::Pm => {
                self.clear_ctrl_bits(ctrl::TX_SIGNALS & !ctrl::TX_CAR_OSC_OFS_STREAM);
                self.set_tx_amp_rf_gain_ofs(gain, 0.0);
                self.set_tx_carrier(settings, settings.tx_car_osc_hz);
                self.set_tx_mod_osc_for_source(settings);
                self.set_tx_mod_qmix_pm(mag);
                self.set_ctrl_bits(ctrl::TX_CAR_OSC_OFS_STREAM);
            }
            TxModType::Cw => {
                self.set_tx_amp_rf_gain_ofs(gain, 0.0);
                self.set_tx_carrier(settings, settings.tx_car_osc_hz);
                self.set_tx_mod_osc_qrg(0.0);
                self.resync_tx_mod_osc();
            }
        }
    }

    fn apply_rx_source(&mut self, settings: &RadioSettings) {
        let source = settings.rx_source;
        match source {
            ModSource::Ac97LineoutL | ModSource::Ac97LineoutR => {
                self.set_rx_muxin_gain(settings.rx_muxin_gain, 0);
                self.set_rx_muxin_source(source);
            }
            _ => match source.adc_channel() {
                Some(ch) => {
                    let offset = self.calib().adc_offset(ch);
                    self.set_rx_muxin_gain(settings.rx_muxin_gain, offset);
                    self.set_rx_muxin_source(source);
                    self.set_ctrl_bits(ctrl::ADC_AUTO_OFS);
                }
                None => {
                    self.set_rx_muxin_gain(settings.rx_muxin_gain, 0);
                    self.set_rx_muxin_source(ModSource::None);
                }
            },
        }
    }

    fn apply_rx_modulation(&mut self, settings: &RadioSettings) {
        let mode = settings.rx_mode;
        let weaver = f64::from(mode.kind.weaver_sign()) * WEAVER_OSC_HZ;
        // AFC driven modes keep the increment stream running
        let afc_keep = ctrl::RX_SIGNALS & !ctrl::RX_CAR_OSC_INC_STREAM;
        self.set_rx_modtyp(mode.kind);

        match mode.kind {
            RxModType::Usb | RxModType::Lsb => {
                self.clear_ctrl_bits(ctrl::RX_SIGNALS);
                self.set_rx_carrier(settings, settings.rx_car_osc_hz + weaver);
                self.set_rx_mod_osc_qrg(weaver);
            }
            RxModType::AmSyncUsb | RxModType::AmSyncLsb => {
                self.clear_ctrl_bits(afc_keep);
                self.set_ctrl_bits(ctrl::RX_CAR_OSC_INC_STREAM);
                self.set_rx_carrier(settings, settings.rx_car_osc_hz + weaver);
                self.set_rx_mod_osc_qrg(weaver);
                self.set_rx_afc_weaver(weaver);
            }
            RxModType::Fm | RxModType::Pm | RxModType::AmEnv => {
                self.clear_ctrl_bits(afc_keep);
                self.set_ctrl_bits(ctrl::RX_CAR_OSC_INC_STREAM);
                self.set_rx_carrier(settings, settings.rx_car_osc_hz);
                self.set_rx_afc_weaver(0.0);
                if mode.kind == RxModType::AmEnv {
                    self.set_rx_amenv_filter(i32::from(mode.amenv_filter));
                }
            }
            RxModType::Off => {
                self.set_rx_car_osc_qrg(0.0);
                self.set_rx_car_osc_scan(SCAN_STOP);
            }
        }
    }

    fn apply_stopped(&mut self) {
        self.clear_ctrl_bits(ctrl::RX_SIGNALS | ctrl::TX_SIGNALS);
        self.set_tx_muxin_source(ModSource::None);
        self.set_tx_amp_rf_gain_ofs(0.0, 0.0);
        self.set_tx_car_osc_scan(SCAN_STOP);
        self.set_tx_mod_osc_qrg(0.0);
        self.set_tx_mod_qmix_fm(0.0, 0.0);
        self.set_rx_muxin_source(ModSource::None);
        self.set_rx_car_osc_scan(SCAN_STOP);
        self.set_rx_afc_weaver(0.0);
        self.set_rx_mod_osc_qrg(0.0);
    }

    /// Carrier frequencies and overdrive flags as the operator sees them
    ///
    /// The Weaver offset programmed for the sideband modes is removed from
    /// the carrier readings.
    pub fn read_back(&mut self, tx_modtyp: TxModType, rx_modtyp: RxModType) -> Readback {
        let tx_weaver = match tx_modtyp {
            TxModType::Usb => WEAVER_OSC_HZ,
            TxModType::Lsb => -WEAVER_OSC_HZ,
            _ => 0.0,
        };
        let rx_weaver = f64::from(rx_modtyp.weaver_sign()) * WEAVER_OSC_HZ;
        Readback {
            tx_car_osc_hz: self.tx_car_osc_qrg() - tx_weaver,
            rx_car_osc_hz: self.rx_car_osc_qrg() - rx_weaver,
            overdrive: self.overdrive(),
        }
    }
}
