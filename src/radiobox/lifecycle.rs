//! FPGA lifecycle
//!
//! Maps the RadioBox window, checks the firmware version and falls back to
//! the bitstream bundled with the application when the loaded image is too
//! old or has no RadioBox at all.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use tracing::{debug, info, warn};

use super::compensation::Uncompensated;
use super::device::{RadioBox, SharedCompensation};
use super::version::FpgaVersion;
use crate::calib::CalibParams;
use crate::config::FpgaConfig;
use crate::error::{Error, Result};
use crate::hal::bus::Mapper;
use crate::hal::delay::StdDelay;

/// Set in the version register by images without a RadioBox
const NO_RADIOBOX: u32 = 0x8000_0000;

/// Owner of the RadioBox mapping
///
/// Holds the calibration record while the window is unmapped and hands it
/// to every [`RadioBox`] it creates.
pub struct Fpga<M: Mapper, D = StdDelay> {
    mapper: M,
    config: FpgaConfig,
    calib: CalibParams,
    compensation: SharedCompensation,
    delay: D,
    radiobox: Option<RadioBox<M::Bus, D>>,
}

impl<M: Mapper> Fpga<M> {
    /// Unmapped manager
    pub fn new(mapper: M, config: FpgaConfig, calib: CalibParams) -> Self {
        Self::with_delay(mapper, config, calib, StdDelay)
    }
}

impl<M: Mapper, D: DelayNs + Clone> Fpga<M, D> {
    /// Unmapped manager with a custom calibration delay
    pub fn with_delay(mapper: M, config: FpgaConfig, calib: CalibParams, delay: D) -> Self {
        Self {
            mapper,
            config,
            calib,
            compensation: Arc::new(Uncompensated),
            delay,
            radiobox: None,
        }
    }

    /// Use `compensation` for every mapped RadioBox
    #[must_use]
    pub fn with_compensation(mut self, compensation: SharedCompensation) -> Self {
        self.compensation = compensation;
        self
    }

    /// Lifecycle configuration
    pub fn config(&self) -> &FpgaConfig {
        &self.config
    }

    /// Calibration record, as of the last unmap when mapped
    pub fn calib(&self) -> &CalibParams {
        self.radiobox.as_ref().map_or(&self.calib, |rb| rb.calib())
    }

    /// The mapper
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Whether the window is mapped
    pub fn is_mapped(&self) -> bool {
        self.radiobox.is_some()
    }

    fn map(&mut self) -> Result<RadioBox<M::Bus, D>> {
        let bus = self.mapper.map(self.config.base_addr, self.config.base_size)?;
        Ok(RadioBox::with_delay(bus, self.calib.clone(), self.delay.clone())
            .with_compensation(Arc::clone(&self.compensation)))
    }

    fn version_acceptable(&self, raw: u32) -> bool {
        raw & NO_RADIOBOX == 0 && raw >= self.config.version_min && FpgaVersion::from_raw(raw).is_ok()
    }

    /// Map the window and bring the RadioBox up
    ///
    /// An outdated image is replaced by the bundled bitstream before the
    /// window is mapped again. The module is then reset and enabled.
    ///
    /// # Errors
    /// Mapping, bitstream and helper script failures.
    pub fn init(&mut self) -> Result<()> {
        self.exit();

        let mut rb = self.map()?;
        let raw = rb.raw_version();
        match FpgaVersion::from_raw(raw) {
            Ok(version) => info!(%version, "RadioBox firmware {raw:#010x}"),
            Err(e) => info!("RadioBox firmware {raw:#010x}: {e}"),
        }

        if !self.version_acceptable(raw) {
            warn!(
                "fpga.bit outdated: found {raw:#010x}, requested {:#010x}, loading bundled bitstream",
                self.config.version_min
            );
            drop(rb);
            prepare_bitstream(&self.config)?;
            reload_bitstream(&self.config)?;

            rb = self.map()?;
            let raw = rb.raw_version();
            if !self.version_acceptable(raw) {
                warn!("RadioBox firmware still outdated after reload: {raw:#010x}");
            }
        }

        rb.reset();
        rb.enable(true);
        self.radiobox = Some(rb);
        Ok(())
    }

    /// Disable the RadioBox and unmap the window
    ///
    /// Calibration values measured while mapped are kept.
    pub fn exit(&mut self) {
        if let Some(mut rb) = self.radiobox.take() {
            debug!("RadioBox exit");
            rb.enable(false);
            let (_bus, calib) = rb.into_parts();
            self.calib = calib;
        }
    }

    /// The mapped RadioBox
    ///
    /// # Errors
    /// [`Error::NotMapped`] before [`Self::init`] or after [`Self::exit`].
    pub fn radiobox_mut(&mut self) -> Result<&mut RadioBox<M::Bus, D>> {
        self.radiobox.as_mut().ok_or(Error::NotMapped)
    }

    /// Move the mapped RadioBox out, e.g. into a worker thread
    ///
    /// # Errors
    /// [`Error::NotMapped`] when nothing is mapped.
    pub fn take(&mut self) -> Result<RadioBox<M::Bus, D>> {
        self.radiobox.take().ok_or(Error::NotMapped)
    }

    /// Hand a RadioBox obtained from [`Self::take`] back
    pub fn restore(&mut self, radiobox: RadioBox<M::Bus, D>) {
        self.exit();
        self.radiobox = Some(radiobox);
    }
}

fn run_script(script: Option<&Path>) -> Result<()> {
    let Some(script) = script else {
        return Ok(());
    };
    let command = script.display().to_string();
    debug!("running {command}");
    let status = Command::new(script).status().map_err(|source| Error::Spawn {
        command: command.clone(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Command { command, status })
    }
}

fn tolerate_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn bitstream_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Bitstream {
        path: path.to_path_buf(),
        source,
    }
}

/// Put the bundled bitstream in place of the boot bitstream
///
/// The boot bitstream is saved as `fpga.bit_orig` the first time; later
/// calls just replace it. The system partition is remounted read-write for
/// the duration and always remounted read-only afterwards.
///
/// # Errors
/// Script failures and file operations other than a missing boot bitstream.
pub fn prepare_bitstream(config: &FpgaConfig) -> Result<()> {
    run_script(config.remount_rw.as_deref())?;

    let moved = if config.bitstream_orig.exists() {
        tolerate_missing(fs::remove_file(&config.bitstream)).map_err(bitstream_error(&config.bitstream))
    } else {
        info!("saving {} as {}", config.bitstream.display(), config.bitstream_orig.display());
        tolerate_missing(fs::rename(&config.bitstream, &config.bitstream_orig))
            .map_err(bitstream_error(&config.bitstream))
    };
    let copied = moved.and_then(|()| {
        fs::copy(&config.bitstream_fresh, &config.bitstream)
            .map(drop)
            .map_err(bitstream_error(&config.bitstream_fresh))
    });

    let remounted = run_script(config.remount_ro.as_deref());
    copied.and(remounted)
}

/// Stream the boot bitstream into the FPGA configuration device
///
/// # Errors
/// [`Error::Bitstream`] if either file cannot be opened or the copy fails.
pub fn reload_bitstream(config: &FpgaConfig) -> Result<()> {
    info!("loading {} into {}", config.bitstream.display(), config.xdevcfg.display());
    let mut source = File::open(&config.bitstream).map_err(bitstream_error(&config.bitstream))?;
    let mut device = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&config.xdevcfg)
        .map_err(bitstream_error(&config.xdevcfg))?;
    io::copy(&mut source, &mut device).map_err(bitstream_error(&config.xdevcfg))?;
    Ok(())
}
