//! RadioBox Register Driver Tests
//!
//! Setter encodings as seen in the register window, enable/reset sequences
//! and raw register access
//! Run with: cargo test --test radiobox_device_tests

use radiobox_hal::prelude::*;
use radiobox_hal::radiobox::regs::{ctrl, reg, status};

fn radiobox() -> RadioBox<MemoryBus, NoDelay> {
    RadioBox::with_delay(MemoryBus::new(RADIOBOX_BASE_SIZE).logging(), CalibParams::default(), NoDelay)
}

fn radiobox_on(bus: MemoryBus) -> RadioBox<MemoryBus, NoDelay> {
    RadioBox::with_delay(bus.logging(), CalibParams::default(), NoDelay)
}

// =============================================================================
// Enable / Reset Tests
// =============================================================================

#[test]
fn test_enable_writes_default_routing() {
    let mut rb = radiobox();
    rb.enable(true);
    assert_eq!(
        rb.bus().write_log(),
        &[
            (reg::CTRL, 0x0000_0001),
            (reg::SRC_CON_PNT, 0x301C_0000),
            (reg::TX_MUXIN_GAIN, 0x0000_7FFF),
            (reg::TX_AMP_RF_GAIN, 0x0000_0C80),
            (reg::TX_AMP_RF_OFS, 0),
        ]
    );
}

#[test]
fn test_disable_silences_outputs_last_ctrl() {
    let mut rb = radiobox();
    rb.enable(true);
    rb.bus_mut().clear_log();
    rb.enable(false);

    let log = rb.bus().write_log();
    assert_eq!(log.last(), Some(&(reg::CTRL, 0)), "control register cleared last");
    for offset in [reg::SRC_CON_PNT, reg::TX_MUXIN_GAIN, reg::TX_AMP_RF_GAIN, reg::RX_MUXIN_SRC] {
        assert_eq!(rb.bus().writes_to(offset), vec![0], "register {offset:#x} zeroed");
    }
}

#[test]
fn test_reset_stops_oscillators_and_pulses_resync() {
    let mut bus = MemoryBus::new(RADIOBOX_BASE_SIZE);
    for offset in [reg::TX_CAR_OSC_INC_LO, reg::RX_MOD_OSC_OFS_HI, reg::TX_MOD_OSC_INC_HI] {
        bus.poke(offset, 0x1234);
    }
    let mut rb = radiobox_on(bus);
    rb.reset();

    assert_eq!(rb.bus().peek(reg::TX_CAR_OSC_INC_LO), 0);
    assert_eq!(rb.bus().peek(reg::RX_MOD_OSC_OFS_HI), 0);
    assert_eq!(rb.bus().peek(reg::TX_MOD_OSC_INC_HI), 0);
    assert_eq!(
        rb.bus().writes_to(reg::CTRL),
        vec![0x1010_1011, 0x1016_1017, 0x1010_1011, 0x0000_0001]
    );
    assert_eq!(rb.bus().write_log().len(), 16 + 4, "four oscillators, inc and ofs each");
}

// =============================================================================
// Version Tests
// =============================================================================

#[test]
fn test_version_decodes_bcd_date() {
    let mut rb = radiobox_on(MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::VERSION, 0x1603_1502));
    let version = rb.version().unwrap();
    assert_eq!(version.year(), 2016);
    assert_eq!(version.month(), 3);
    assert_eq!(version.day(), 15);
    assert_eq!(version.build(), 2);
}

#[test]
fn test_version_rejects_missing_radiobox() {
    let mut rb = radiobox_on(MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::VERSION, 0x8000_0000));
    let err = Error::from(rb.version().unwrap_err());
    assert_eq!(err.code(), -2);
    assert_eq!(rb.raw_version(), 0x8000_0000);
}

// =============================================================================
// Oscillator Tests
// =============================================================================

#[test]
fn test_tx_carrier_10mhz() {
    let mut rb = radiobox();
    rb.set_tx_car_osc_qrg(10e6);
    assert_eq!(rb.bus().peek(reg::TX_CAR_OSC_INC_LO), 0xE147_AE14);
    assert_eq!(rb.bus().peek(reg::TX_CAR_OSC_INC_HI), 0x0000_147A);
    assert_eq!(rb.bus().writes_to(reg::TX_CAR_OSC_OFS_LO), vec![0], "phase offset cleared");
    assert_eq!(rb.bus().writes_to(reg::TX_CAR_OSC_OFS_HI), vec![0]);
    assert_eq!(rb.tx_car_osc_qrg(), 10e6, "readback rounds to whole Hz");
}

#[test]
fn test_rx_carrier_round_trip() {
    let mut rb = radiobox();
    rb.set_rx_car_osc_qrg(7_100_000.0);
    assert_eq!(rb.bus().peek(reg::RX_CAR_OSC_INC_LO), 0x71DE_69AD);
    assert_eq!(rb.bus().peek(reg::RX_CAR_OSC_INC_HI), 0x0000_0E8A);
    assert_eq!(rb.rx_car_osc_qrg(), 7_100_000.0);
}

#[test]
fn test_carrier_follows_calibrated_base_oscillator() {
    let calib = CalibParams::with_base_osc(125_001_000.0);
    let mut rb = RadioBox::with_delay(MemoryBus::new(RADIOBOX_BASE_SIZE), calib, NoDelay);
    rb.set_tx_car_osc_qrg(10e6);
    assert_ne!(rb.bus().peek(reg::TX_CAR_OSC_INC_LO), 0xE147_AE14, "increment depends on base");
    assert_eq!(rb.tx_car_osc_qrg(), 10e6);
}

#[test]
fn test_negative_weaver_frequency_sign_extends() {
    let mut rb = radiobox();
    rb.set_rx_mod_osc_qrg(-1_700.0);
    assert_eq!(rb.bus().peek(reg::RX_MOD_OSC_INC_LO), 0x1BD4_71DD);
    assert_eq!(rb.bus().peek(reg::RX_MOD_OSC_INC_HI), 0xFFFF_FFFF);
}

#[test]
fn test_scanner_stop_and_sweep() {
    let mut rb = radiobox();
    rb.set_tx_car_osc_scan(SCAN_STOP);
    assert_eq!(rb.bus().peek(reg::TX_CAR_OSC_INC_SCNR_LO), 0);
    assert_eq!(rb.tx_car_osc_scan_rate(), 0.0);

    rb.set_tx_car_osc_scan(100);
    assert_eq!(rb.bus().peek(reg::TX_CAR_OSC_INC_SCNR_LO), 112_589);
    let rate = rb.tx_car_osc_scan_rate();
    assert!((rate - 10_000.0).abs() < 1.0, "full deflection sweeps 10 kHz/s, got {rate}");
}

#[test]
fn test_scanner_down_sweep_is_ones_complement() {
    let mut rb = radiobox();
    rb.set_rx_car_osc_scan(0);
    assert_eq!(rb.bus().peek(reg::RX_CAR_OSC_INC_SCNR_LO), 0xFFFE_4832);
    assert_eq!(rb.bus().peek(reg::RX_CAR_OSC_INC_SCNR_HI), 0xFFFF_FFFF);
    let rate = rb.rx_car_osc_scan_rate();
    assert!((rate + 10_000.0).abs() < 1.0, "down sweep, got {rate}");
}

#[test]
fn test_scanner_dead_band() {
    let mut rb = radiobox();
    rb.set_rx_car_osc_scan(54);
    assert_eq!(rb.bus().peek(reg::RX_CAR_OSC_INC_SCNR_LO), 0, "within 10 % of the middle");
    rb.set_rx_car_osc_scan(56);
    assert_eq!(rb.bus().peek(reg::RX_CAR_OSC_INC_SCNR_LO), 257);
}

#[test]
fn test_afc_weaver_increment() {
    let mut rb = radiobox();
    rb.set_rx_afc_weaver(-1_700.0);
    assert_eq!(rb.bus().peek(reg::RX_CAR_CALC_WEAVER_INC_LO), 0x0E56_0373);
    assert_eq!(rb.bus().peek(reg::RX_CAR_CALC_WEAVER_INC_HI), 0x0000_022D);
}

// =============================================================================
// Modulation Type Tests
// =============================================================================

#[test]
fn test_tx_modtyp_two_step_write() {
    let mut rb = radiobox_on(MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::PWR_CTRL, 0x0000_0507));
    rb.set_tx_modtyp(TxModType::Am);
    assert_eq!(rb.bus().writes_to(reg::PWR_CTRL), vec![0x0000_0007, 0x0000_0307]);
}

#[test]
fn test_rx_modtyp_keeps_tx_field() {
    let mut rb = radiobox_on(MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::PWR_CTRL, 0x0000_0507));
    rb.set_rx_modtyp(RxModType::Fm);
    assert_eq!(rb.bus().writes_to(reg::PWR_CTRL), vec![0x0000_0500, 0x0000_0505]);
}

// =============================================================================
// Mixer Input Tests
// =============================================================================

#[test]
fn test_muxin_gain_linear_range() {
    let mut rb = radiobox();
    rb.set_tx_muxin_gain(40, 0);
    assert_eq!(rb.bus().peek(reg::TX_MUXIN_GAIN), 0x8000);
    rb.set_rx_muxin_gain(0, 0);
    assert_eq!(rb.bus().peek(reg::RX_MUXIN_GAIN), 0, "0 % mutes the input");
}

#[test]
fn test_muxin_gain_booster_range() {
    let mut rb = radiobox();
    rb.set_tx_muxin_gain(100, 0);
    rb.set_rx_muxin_gain(150, 0);
    assert_eq!(rb.bus().peek(reg::TX_MUXIN_GAIN), 0x0007_FFFF, "seven TX boost shifts");
    assert_eq!(rb.bus().peek(reg::RX_MUXIN_GAIN), 0x0005_FFFF, "clamped to 100 %, five RX shifts");
}

#[test]
fn test_muxin_offset_is_sixteen_bit_twos_complement() {
    let mut rb = radiobox();
    rb.set_rx_muxin_gain(50, -2);
    assert_eq!(rb.bus().peek(reg::RX_MUXIN_OFS), 0xFFFE);
    rb.set_tx_muxin_gain(50, 300);
    assert_eq!(rb.bus().peek(reg::TX_MUXIN_OFS), 300);
}

#[test]
fn test_muxin_source_ids() {
    let mut rb = radiobox();
    rb.set_tx_muxin_source(ModSource::RfIn2);
    rb.set_rx_muxin_source(ModSource::Ac97LineoutR);
    assert_eq!(rb.bus().peek(reg::TX_MUXIN_SRC), 0x21);
    assert_eq!(rb.bus().peek(reg::RX_MUXIN_SRC), 0x31);
}

// =============================================================================
// Quadrature Mixer / Amplifier Tests
// =============================================================================

#[test]
fn test_qmix_am_carrier_only() {
    let mut rb = radiobox();
    rb.set_tx_mod_qmix_am(0.0, true);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_GAIN), 0);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_OFS_LO), 0xFFFF_FFFF);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_OFS_HI), 0x0000_7FFF);
}

#[test]
fn test_qmix_ssb_full_grade() {
    let mut rb = radiobox();
    rb.set_tx_mod_qmix_am(100.0, false);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_GAIN), 0xFFFF);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_OFS_LO), 0);
}

#[test]
fn test_qmix_pm_half_turn() {
    let mut rb = radiobox();
    rb.set_tx_mod_qmix_pm(90.0);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_GAIN), 0x7FFF);
}

#[test]
fn test_qmix_fm_offset_is_carrier_increment() {
    let mut rb = radiobox();
    rb.set_tx_mod_qmix_fm(10e6, 0.0);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_GAIN), 0);
    assert_eq!(rb.bus().peek(reg::TX_MOD_QMIX_OFS_HI), 0x147A);
}

#[test]
fn test_amp_rf_gain_millivolts() {
    let mut rb = radiobox();
    rb.set_tx_amp_rf_gain_ofs(200.0, 0.0);
    assert_eq!(rb.bus().peek(reg::TX_AMP_RF_GAIN), 0x0C7F);
    assert_eq!(rb.bus().peek(reg::TX_AMP_RF_OFS), 0);
}

#[test]
fn test_demodulator_gains() {
    let mut rb = radiobox();
    rb.set_rx_mod_ssb_am_gain(100.0);
    rb.set_rx_mod_fm_gain(100.0);
    rb.set_rx_amenv_filter(7);
    assert_eq!(rb.bus().peek(reg::RX_MOD_SSB_AM_GAIN), 0x7FFF, "SSB/AM gain is halved");
    assert_eq!(rb.bus().peek(reg::RX_MOD_FM_GAIN), 0xFFFF);
    assert_eq!(rb.bus().peek(reg::RX_AMENV_FILTVAR), 2, "filter variant clamped");
}

#[test]
fn test_rfout_gain_fixed_point() {
    let mut rb = radiobox();
    rb.set_rfout_gain_ofs(RfOut::Out2, fixed::types::U8F8::from_bits(0x0180), 0x10);
    assert_eq!(rb.bus().peek(reg::RFOUT2_GAIN), 0x0180);
    assert_eq!(rb.bus().peek(reg::RFOUT2_OFS), 0x10);
    assert_eq!(rb.bus().peek(reg::RFOUT1_GAIN), 0, "other output untouched");
}

// =============================================================================
// Status Tests
// =============================================================================

#[test]
fn test_overdrive_flags() {
    let mut rb = radiobox_on(MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::STATUS, 0x00C0_0000));
    let ovr = rb.overdrive();
    assert_eq!(ovr.bits(), 3);
    assert!(ovr.any());
}

#[test]
fn test_resync_skipped_at_phase_zero() {
    let mut rb = radiobox_on(
        MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::STATUS, status::TX_MOD_OSC_PHASE_ZERO),
    );
    assert!(!rb.resync_tx_mod_osc());
    assert!(rb.bus().writes_to(reg::CTRL).is_empty());
}

#[test]
fn test_resync_pulses_control_bit() {
    let mut rb = radiobox_on(MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::CTRL, ctrl::ENABLE));
    assert!(rb.resync_tx_mod_osc());
    assert_eq!(
        rb.bus().writes_to(reg::CTRL),
        vec![ctrl::ENABLE, ctrl::ENABLE | ctrl::TX_MOD_OSC_RESYNC],
        "cleared then set"
    );
}

// =============================================================================
// Raw Register Tests
// =============================================================================

#[test]
fn test_raw_register_access() {
    let mut rb = radiobox();
    rb.write_register(0x0FFC, 0xCAFE_F00D).unwrap();
    assert_eq!(rb.read_register(0x0FFC).unwrap(), 0xCAFE_F00D);
}

#[test]
fn test_raw_register_rejects_bad_offsets() {
    let mut rb = radiobox();
    assert!(matches!(rb.read_register(0x0002), Err(Error::Misaligned(2))));
    assert!(matches!(rb.write_register(RADIOBOX_BASE_SIZE, 0), Err(Error::Misaligned(_))));
    assert!(rb.bus().write_log().is_empty(), "nothing written on error");
}
