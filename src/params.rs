//! Named-parameter interface
//!
//! The web front-end talks to the RadioBox through a table of named values.
//! Every value that must reach the FPGA carries [`FPGA_UPDATE_MARK`] in its
//! `fpga_update` field until [`update_all_params`] has consumed it.

use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};
use tracing::{debug, trace};

use crate::config::SCAN_STOP;
use crate::error::{Error, Result};
use crate::hal::bus::RegisterBus;
use crate::radiobox::control::{RadioSettings, Readback};
use crate::radiobox::RadioBox;
use crate::types::{ModSource, RxModType, RxMode, Termination, TxModType};

/// Marker for values not yet written to the FPGA
pub const FPGA_UPDATE_MARK: u32 = 0x80;

/// Longest parameter name
pub const NAME_LEN: usize = 32;

/// Capacity of a parameter table
pub const MAX_PARAMS: usize = 48;

/// Parameter name buffer
pub type Name = String<NAME_LEN>;

/// Static description of a known parameter
#[derive(Clone, Copy, Debug)]
struct ParamDef {
    name: &'static str,
    value: f64,
    read_only: bool,
    min: f64,
    max: f64,
}

const fn def(name: &'static str, value: f64, min: f64, max: f64) -> ParamDef {
    ParamDef { name, value, read_only: false, min, max }
}

/// Every parameter of the RadioBox application
const PARAM_DEFS: [ParamDef; 24] = [
    def("rb_run", 0.0, 0.0, 1.0),
    def("rb_calib", 0.0, 0.0, 1.0),
    def("tx_modsrc_s", 0.0, 0.0, 17.0),
    def("tx_modtyp_s", 0.0, 0.0, 5.0),
    def("rx_modtyp_s", 0.0, 0.0, 39.0),
    def("rbled_csp_s", 0.0, 0.0, 255.0),
    def("rfout1_csp_s", 0.0, 0.0, 255.0),
    def("rfout2_csp_s", 0.0, 0.0, 255.0),
    def("rx_muxin_src_s", 0.0, 0.0, 17.0),
    def("tx_car_osc_qrg_f", 10_000_000.0, 0.0, 62_500_000.0),
    def("rx_car_osc_qrg_f", 10_000_000.0, 0.0, 62_500_000.0),
    def("tx_mod_osc_qrg_f", 1_000.0, 0.0, 100_000.0),
    def("tx_amp_rf_gain_s", 200.0, 0.0, 2_048.0),
    def("tx_mod_osc_mag_s", 100.0, 0.0, 100_000.0),
    def("tx_muxin_gain_s", 80.0, 0.0, 100.0),
    def("rx_muxin_gain_s", 80.0, 0.0, 100.0),
    def("tx_qrg_sel_s", 0.0, 0.0, 1.0),
    def("rx_qrg_sel_s", 0.0, 0.0, 1.0),
    def("rfout1_term_s", 0.0, 0.0, 2.0),
    def("rfout2_term_s", 0.0, 0.0, 2.0),
    def("qrg_inc_s", SCAN_STOP as f64, 0.0, 100.0),
    def("ac97_lil_s", 0.0, 0.0, 255.0),
    def("ac97_lir_s", 0.0, 0.0, 255.0),
    ParamDef {
        name: "ovrdrv_s",
        value: 0.0,
        read_only: true,
        min: 0.0,
        max: 3.0,
    },
];

const _: () = {
    assert!(PARAM_DEFS.len() <= MAX_PARAMS);
    let mut i = 0;
    while i < PARAM_DEFS.len() {
        assert!(PARAM_DEFS[i].name.len() <= NAME_LEN);
        i += 1;
    }
};

fn lookup(name: &str) -> Option<&'static ParamDef> {
    PARAM_DEFS.iter().find(|s| s.name == name)
}

fn param_name(name: &str) -> Result<Name> {
    Name::try_from(name).map_err(|()| Error::InvalidParamName(name.into()))
}

/// One named value
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: Name,
    /// Current value
    pub value: f64,
    /// Update flags, see [`FPGA_UPDATE_MARK`]
    pub fpga_update: u32,
    /// Written by the FPGA side only
    pub read_only: bool,
    /// Smallest accepted value
    pub min: f64,
    /// Largest accepted value
    pub max: f64,
}

impl Param {
    /// Pending FPGA write
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.fpga_update & FPGA_UPDATE_MARK != 0
    }
}

/// Bounded list of named values
///
/// The base table holds every parameter; update tables sent by the
/// front-end hold only the values that changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamTable {
    params: Vec<Param, MAX_PARAMS>,
}

impl ParamTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every known parameter at its default value
    #[must_use]
    pub fn defaults() -> Self {
        // capacity and name lengths are checked at compile time above
        let params = PARAM_DEFS
            .iter()
            .filter_map(|s| {
                Some(Param {
                    name: Name::try_from(s.name).ok()?,
                    value: s.value,
                    fpga_update: 0,
                    read_only: s.read_only,
                    min: s.min,
                    max: s.max,
                })
            })
            .collect();
        Self { params }
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// No entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Entry by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.param(name).map(|p| p.value)
    }

    fn entry(&mut self, key: &str) -> Result<&mut Param> {
        if let Some(i) = self.params.iter().position(|p| p.name == key) {
            return Ok(&mut self.params[i]);
        }
        let (read_only, min, max) = lookup(key).map_or((false, f64::MIN, f64::MAX), |s| (s.read_only, s.min, s.max));
        self.params
            .push(Param {
                name: param_name(key)?,
                value: 0.0,
                fpga_update: 0,
                read_only,
                min,
                max,
            })
            .map_err(|_| Error::ParamTableFull)?;
        let last = self.params.len() - 1;
        Ok(&mut self.params[last])
    }

    /// Set a value from the front-end and mark it for the FPGA
    ///
    /// Values are clamped to the parameter range. Read-only parameters are
    /// left untouched.
    ///
    /// # Errors
    /// [`Error::InvalidParamName`] for over-long names,
    /// [`Error::ParamTableFull`] when a new entry does not fit.
    pub fn set(&mut self, key: &str, value: f64) -> Result<()> {
        let p = self.entry(key)?;
        if p.read_only {
            debug!("ignoring write to read-only parameter {key}");
            return Ok(());
        }
        p.value = value.clamp(p.min, p.max);
        p.fpga_update |= FPGA_UPDATE_MARK;
        trace!("{key} = {}", p.value);
        Ok(())
    }

    /// Store a value without marking it, e.g. a hardware readback
    ///
    /// # Errors
    /// As for [`Self::set`].
    pub fn update(&mut self, key: &str, value: f64) -> Result<()> {
        self.entry(key)?.value = value;
        Ok(())
    }

    /// Copy every value of `other` into this table
    ///
    /// # Errors
    /// As for [`Self::set`].
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        for p in other.iter() {
            self.update(&p.name, p.value)?;
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_int(value: f64) -> i32 {
    value as i32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_point(value: f64) -> u8 {
    (as_int(value) & 0xff) as u8
}

impl RadioSettings {
    /// Settings described by a complete parameter table
    ///
    /// Missing entries read as 0.
    #[must_use]
    pub fn from_params(table: &ParamTable) -> Self {
        let mut settings = Self { qrg_inc: 0, ..Self::default() };
        for p in table.iter() {
            settings.apply_param(&p.name, p.value);
        }
        settings
    }

    /// Take over one named value; returns whether the name is a setting
    pub fn apply_param(&mut self, name: &str, value: f64) -> bool {
        let int = as_int(value);
        match name {
            "rb_run" => self.run = int != 0,
            "tx_modsrc_s" => self.tx_source = ModSource::from_code(int),
            "tx_modtyp_s" => self.tx_modtyp = TxModType::from_code(int),
            "rx_modtyp_s" => self.rx_mode = RxMode::from_code(int),
            "rbled_csp_s" => self.led_csp = as_point(value),
            "rfout1_csp_s" => self.rfout1_csp = as_point(value),
            "rfout2_csp_s" => self.rfout2_csp = as_point(value),
            "rx_muxin_src_s" => self.rx_source = ModSource::from_code(int),
            "tx_car_osc_qrg_f" => self.tx_car_osc_hz = value,
            "rx_car_osc_qrg_f" => self.rx_car_osc_hz = value,
            "tx_mod_osc_qrg_f" => self.tx_mod_osc_hz = value,
            "tx_amp_rf_gain_s" => self.tx_amp_rf_gain_mv = f64::from(int),
            "tx_mod_osc_mag_s" => self.tx_mod_osc_mag = f64::from(int),
            "tx_muxin_gain_s" => self.tx_muxin_gain = int,
            "rx_muxin_gain_s" => self.rx_muxin_gain = int,
            "tx_qrg_sel_s" => self.tx_qrg_sel = int != 0,
            "rx_qrg_sel_s" => self.rx_qrg_sel = int != 0,
            "rfout1_term_s" => self.rfout1_term = Termination::from_code(int),
            "rfout2_term_s" => self.rfout2_term = Termination::from_code(int),
            "qrg_inc_s" => self.qrg_inc = int,
            "ac97_lil_s" => self.ac97_lil = as_point(value),
            "ac97_lir_s" => self.ac97_lir = as_point(value),
            _ => return false,
        }
        true
    }
}

/// Apply the marked entries of `new` on top of `base`
///
/// Marks are cleared as entries are consumed. `rb_run` switches the module
/// immediately and `rb_calib` runs a calibration and resets itself to 0.
/// The full control state is written afterwards when the radio runs.
pub fn update_all_params<B, D>(rb: &mut RadioBox<B, D>, base: &ParamTable, new: &mut ParamTable)
where
    B: RegisterBus,
    D: DelayNs,
{
    let mut settings = RadioSettings::from_params(base);

    for p in new.params.iter_mut().filter(|p| p.is_marked()) {
        p.fpga_update &= !FPGA_UPDATE_MARK;
        match p.name.as_str() {
            "rb_run" => {
                settings.run = as_int(p.value) != 0;
                rb.enable(settings.run);
            }
            "rb_calib" => {
                rb.calibrate(as_int(p.value) > 0, settings.run);
                p.value = 0.0;
            }
            other => {
                if !settings.apply_param(other, p.value) {
                    debug!("parameter {other} does not touch the FPGA");
                }
            }
        }
    }

    if settings.run {
        rb.apply_settings(&settings);
    }
}

/// Read the hardware state back into `new`
///
/// The modulation types and the scanner control come from `base`,
/// overridden by same-named entries of `new`. While the scanner runs the
/// carrier frequencies are reported back; the overdrive flags always are.
///
/// # Errors
/// [`Error::ParamTableFull`] if `new` cannot take the readback entries.
pub fn get_fpga_params<B, D>(rb: &mut RadioBox<B, D>, base: &ParamTable, new: &mut ParamTable) -> Result<Readback>
where
    B: RegisterBus,
{
    let current = |key: &str| new.get(key).or_else(|| base.get(key)).map_or(0, as_int);
    let tx_modtyp = TxModType::from_code(current("tx_modtyp_s"));
    let rx_modtyp = RxModType::from_code(current("rx_modtyp_s"));
    let qrg_inc = current("qrg_inc_s");

    let readback = rb.read_back(tx_modtyp, rx_modtyp);
    if qrg_inc != SCAN_STOP {
        new.update("tx_car_osc_qrg_f", readback.tx_car_osc_hz)?;
        new.update("rx_car_osc_qrg_f", readback.rx_car_osc_hz)?;
    }
    new.update("ovrdrv_s", f64::from(readback.overdrive.bits()))?;
    Ok(readback)
}
