//! RadioBox command line tool
//!
//! Brings the RadioBox up on a Red Pitaya board and gives shell access to
//! the housekeeping block, the named parameters and raw registers.

use std::num::ParseIntError;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

use radiobox_hal::params::update_all_params;
use radiobox_hal::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about = "Red Pitaya RadioBox control")]
struct Cli {
    /// More output, repeat for trace level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the RadioBox firmware version, reloading the bitstream if needed
    Version,
    /// Measure the ADC offsets
    Calibrate,
    /// Print the device DNA and FPGA id
    Dna,
    /// Change or test LED bits
    Led {
        #[command(subcommand)]
        action: BitAction,
    },
    /// Apply `name=value` parameters and keep the radio running
    Set {
        /// Parameters, e.g. `rx_car_osc_qrg_f=7100000`
        #[arg(required = true, value_parser = parse_assignment)]
        params: Vec<(String, f64)>,
    },
    /// Read a RadioBox register
    Peek {
        /// Byte offset, hex with `0x` prefix or decimal
        #[arg(value_parser = parse_number)]
        offset: u32,
    },
    /// Write a RadioBox register
    Poke {
        /// Byte offset, hex with `0x` prefix or decimal
        #[arg(value_parser = parse_number)]
        offset: u32,
        /// Value, hex with `0x` prefix or decimal
        #[arg(value_parser = parse_number)]
        value: u32,
    },
}

#[derive(Subcommand, Debug)]
enum BitAction {
    /// Switch LEDs on
    Set {
        #[arg(value_parser = parse_number)]
        bits: u32,
    },
    /// Switch LEDs off
    Unset {
        #[arg(value_parser = parse_number)]
        bits: u32,
    },
    /// Check whether all LEDs are on
    Test {
        #[arg(value_parser = parse_number)]
        bits: u32,
    },
}

fn parse_number(s: &str) -> Result<u32, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn parse_assignment(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s.split_once('=').ok_or_else(|| format!("expected name=value, got `{s}`"))?;
    let value = value.trim().parse().map_err(|e| format!("`{value}`: {e}"))?;
    Ok((name.trim().to_owned(), value))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}

fn led(action: BitAction) -> Result<()> {
    let mut hk = Housekeeping::init(&mut DevMemMapper::new())?;
    match action {
        BitAction::Set { bits } => hk.set_led_bits(bits)?,
        BitAction::Unset { bits } => hk.unset_led_bits(bits)?,
        BitAction::Test { bits } => println!("{}", hk.are_led_bits_set(bits)?),
    }
    Ok(())
}

fn dna() -> Result<()> {
    let mut hk = Housekeeping::init(&mut DevMemMapper::new())?;
    println!("id  {:#010x}", hk.id());
    println!("dna {:#016x}", hk.dna());
    Ok(())
}

/// Bring the RadioBox up, hand it to `f` and shut it down again
fn with_radiobox(f: impl FnOnce(&mut RadioBox<MmapWindow>) -> Result<()>) -> Result<()> {
    let mut fpga = Fpga::new(DevMemMapper::new(), FpgaConfig::default(), CalibParams::default());
    fpga.init()?;
    let result = f(fpga.radiobox_mut()?);
    fpga.exit();
    result
}

fn set(params: &[(String, f64)]) -> Result<()> {
    let mut fpga = Fpga::new(DevMemMapper::new(), FpgaConfig::default(), CalibParams::default());
    fpga.init()?;
    let rb = fpga.radiobox_mut()?;

    let base = ParamTable::defaults();
    let mut new = ParamTable::new();
    new.set("rb_run", 1.0)?;
    for (name, value) in params {
        new.set(name, *value)?;
    }
    update_all_params(rb, &base, &mut new);
    info!("{} parameters applied", params.len());
    // leave the radio running
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Led { action } => led(action),
        Command::Dna => dna(),
        Command::Set { params } => set(&params),
        Command::Version => with_radiobox(|rb| {
            match rb.version() {
                Ok(version) => println!("{version}"),
                Err(e) => println!("{:#010x} ({e})", rb.raw_version()),
            }
            Ok(())
        }),
        Command::Calibrate => with_radiobox(|rb| {
            rb.calibrate(true, false);
            for channel in AdcChannel::CALIBRATION_ORDER {
                println!("{channel}: {}", rb.calib().adc_offset(channel));
            }
            Ok(())
        }),
        Command::Peek { offset } => with_radiobox(|rb| {
            let value = rb.read_register(offset as usize)?;
            println!("{offset:#06x}: {value:#010x}");
            Ok(())
        }),
        Command::Poke { offset, value } => with_radiobox(|rb| rb.write_register(offset as usize, value)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
