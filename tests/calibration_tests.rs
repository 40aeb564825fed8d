//! ADC Offset Calibration Tests
//!
//! Measurement setup/teardown sequences and the offset search against
//! simulated CORDIC readings
//! Run with: cargo test --test calibration_tests

use radiobox_hal::prelude::*;
use radiobox_hal::radiobox::calibration::minimize_noise;
use radiobox_hal::radiobox::regs::reg;

/// RadioBox window whose CORDIC magnitude grows with the distance between
/// the programmed RX offset and a per-channel DC offset
struct NoisyInput {
    regs: MemoryBus,
    dc: fn(u32) -> i16,
}

impl RegisterBus for NoisyInput {
    fn read(&mut self, offset: usize) -> u32 {
        if offset == reg::RX_AFC_CORDIC_MAG {
            let applied = i32::from(self.regs.peek(reg::RX_MUXIN_OFS) as u16 as i16);
            let dc = i32::from((self.dc)(self.regs.peek(reg::RX_MUXIN_SRC)));
            return (applied + dc).unsigned_abs() << 5;
        }
        self.regs.read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.regs.write(offset, value);
    }

    fn size(&self) -> usize {
        self.regs.size()
    }
}

fn radiobox(bus: MemoryBus) -> RadioBox<MemoryBus, NoDelay> {
    RadioBox::with_delay(bus.logging(), CalibParams::default(), NoDelay)
}

// =============================================================================
// Measurement Setup Tests
// =============================================================================

#[test]
fn test_prepare_routes_channel_into_rx() {
    let mut rb = radiobox(MemoryBus::new(RADIOBOX_BASE_SIZE));
    rb.prepare_rx_measurement(AdcChannel::Xadc8);
    assert_eq!(
        rb.bus().write_log(),
        &[
            (reg::CTRL, 1),
            (reg::PWR_CTRL, 7),
            (reg::SRC_CON_PNT, 0),
            (reg::RX_CAR_OSC_INC_LO, 0x3E2D_6238),
            (reg::RX_CAR_OSC_INC_HI, 0x0000_0005),
            (reg::RX_MUXIN_SRC, 0x18),
            (reg::RX_MUXIN_GAIN, 0x1FFF),
        ]
    );
}

#[test]
fn test_finish_restores_quiet_module() {
    let mut rb = radiobox(MemoryBus::new(RADIOBOX_BASE_SIZE));
    rb.finish_rx_measurement();
    assert_eq!(
        rb.bus().write_log(),
        &[
            (reg::RX_MUXIN_OFS, 0),
            (reg::RX_MUXIN_SRC, 0),
            (reg::RX_CAR_OSC_INC_LO, 0),
            (reg::RX_CAR_OSC_INC_HI, 0),
            (reg::PWR_CTRL, 0),
            (reg::CTRL, 0),
        ]
    );
}

#[test]
fn test_measure_noise_accumulates_eight_samples() {
    let bus = MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::RX_AFC_CORDIC_MAG, 0x3E0);
    let mut rb = radiobox(bus);
    let noise = rb.measure_noise(-3, 2);
    assert_eq!(noise, 8 * ((0x3E0 + 16) >> 5), "rounded magnitude / 32, eight samples");
    assert_eq!(rb.bus().peek(reg::RX_MUXIN_OFS), 0xFFFF_FFFD, "offset sign-extended");
    assert_eq!(rb.bus().peek(reg::RX_MUXIN_GAIN), 0x3FFF, "gain reduced by two bits");
}

// =============================================================================
// Calibration Run Tests
// =============================================================================

#[test]
fn test_flat_noise_floor_gives_most_negative_offsets() {
    let bus = MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::RX_AFC_CORDIC_MAG, 0x400);
    let mut rb = radiobox(bus);
    rb.calibrate_adc_offsets();

    for channel in AdcChannel::CALIBRATION_ORDER {
        assert_eq!(rb.calib().adc_offset(channel), i16::MIN, "{channel}");
    }
}

#[test]
fn test_channels_walked_in_calibration_order() {
    let mut rb = radiobox(MemoryBus::new(RADIOBOX_BASE_SIZE));
    rb.calibrate_adc_offsets();
    assert_eq!(
        rb.bus().writes_to(reg::RX_MUXIN_SRC),
        vec![0x20, 0x21, 0x18, 0x10, 0x11, 0x19, 0],
        "every channel in turn, then released"
    );
    assert_eq!(rb.bus().writes_to(reg::CTRL).last(), Some(&0));
}

#[test]
fn test_offsets_cancel_each_channel_dc() {
    fn dc(source: u32) -> i16 {
        match source {
            0x20 => 120,
            0x21 => -75,
            0x18 => 3000,
            0x10 => -1,
            0x11 => 0,
            _ => -2500,
        }
    }
    let bus = NoisyInput {
        regs: MemoryBus::new(RADIOBOX_BASE_SIZE),
        dc,
    };
    let mut rb = RadioBox::with_delay(bus, CalibParams::default(), NoDelay);
    rb.calibrate_adc_offsets();

    for channel in AdcChannel::CALIBRATION_ORDER {
        let expected = -i32::from(dc(channel.mux_id()));
        let found = i32::from(rb.calib().adc_offset(channel));
        assert!(
            (found - expected).abs() <= 1,
            "{channel}: expected {expected}, found {found}"
        );
    }
}

#[test]
fn test_calibrate_restores_run_state() {
    let mut rb = radiobox(MemoryBus::new(RADIOBOX_BASE_SIZE));
    rb.calibrate(false, true);
    assert_eq!(rb.bus().writes_to(reg::CTRL), vec![1], "no measurement, just enabled");
    assert_eq!(rb.calib().adc_offset(AdcChannel::Adc0), 0);

    rb.bus_mut().clear_log();
    rb.calibrate(true, false);
    assert_eq!(rb.bus().write_log().last(), Some(&(reg::CTRL, 0)));
    assert_eq!(rb.calib().adc_offset(AdcChannel::Adc0), i16::MIN);
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_with_closure_probe() {
    let mut calls = 0;
    let mut probe = |ofs: i16, _reduction: u32| {
        calls += 1;
        (i32::from(ofs) - 513).unsigned_abs()
    };
    assert_eq!(minimize_noise(&mut probe), 513);
    assert_eq!(calls, 32, "two probes per bit");
}
