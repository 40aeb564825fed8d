//! FPGA Lifecycle Tests
//!
//! Mapping, version check, bitstream fallback and calibration hand-over,
//! with the board files redirected to a temporary directory
//! Run with: cargo test --test lifecycle_tests

use std::fs;
use std::path::{Path, PathBuf};

use radiobox_hal::prelude::*;
use radiobox_hal::radiobox::lifecycle::{prepare_bitstream, reload_bitstream};
use radiobox_hal::radiobox::regs::reg;

const GOOD_VERSION: u32 = 0x1603_1502;
const OLD_VERSION: u32 = 0x1501_0101;

fn board_root(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("radiobox-hal-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(root.join("fresh")).unwrap();
    root
}

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn window(version: u32) -> MemoryBus {
    MemoryBus::new(RADIOBOX_BASE_SIZE).with_word(reg::VERSION, version)
}

fn fpga(mapper: MemoryMapper, config: FpgaConfig) -> Fpga<MemoryMapper, NoDelay> {
    Fpga::with_delay(mapper, config, CalibParams::default(), NoDelay)
}

// =============================================================================
// Version Check Tests
// =============================================================================

#[test]
fn test_init_with_current_firmware() {
    let root = board_root("current");
    let mut fpga = fpga(MemoryMapper::new().then(window(GOOD_VERSION)), FpgaConfig::rooted_at(&root));

    fpga.init().unwrap();

    assert!(fpga.is_mapped());
    assert_eq!(fpga.mapper().maps(), &[(RADIOBOX_BASE_ADDR, RADIOBOX_BASE_SIZE)]);
    let rb = fpga.radiobox_mut().unwrap();
    assert_eq!(rb.bus().peek(reg::CTRL), 1, "reset and enabled");
    assert_eq!(rb.bus().peek(reg::SRC_CON_PNT), 0x301C_0000);
    assert!(!root.join("xdevcfg").exists(), "no bitstream reload");
}

#[test]
fn test_outdated_firmware_reloads_bundled_bitstream() {
    let root = board_root("outdated");
    write(&root.join("fpga.bit"), "boot image");
    write(&root.join("fresh/fpga.bit"), "radiobox image");
    let mapper = MemoryMapper::new().then(window(OLD_VERSION)).then(window(GOOD_VERSION));
    let mut fpga = fpga(mapper, FpgaConfig::rooted_at(&root));

    fpga.init().unwrap();

    assert_eq!(fpga.mapper().maps().len(), 2, "window mapped again after reload");
    assert_eq!(read(&root.join("fpga.bit_orig")), "boot image", "boot bitstream saved");
    assert_eq!(read(&root.join("fpga.bit")), "radiobox image");
    assert_eq!(read(&root.join("xdevcfg")), "radiobox image", "bitstream streamed to the device");
    assert_eq!(fpga.radiobox_mut().unwrap().raw_version(), GOOD_VERSION);
}

#[test]
fn test_missing_radiobox_triggers_reload() {
    let root = board_root("missing");
    write(&root.join("fresh/fpga.bit"), "radiobox image");
    let mapper = MemoryMapper::new().then(window(0x8000_0000 | GOOD_VERSION)).then(window(GOOD_VERSION));
    let mut fpga = fpga(mapper, FpgaConfig::rooted_at(&root));

    fpga.init().unwrap();

    assert_eq!(read(&root.join("xdevcfg")), "radiobox image");
    assert!(!root.join("fpga.bit_orig").exists(), "nothing to save without a boot bitstream");
}

#[test]
fn test_still_outdated_after_reload_is_tolerated() {
    let root = board_root("still-outdated");
    write(&root.join("fresh/fpga.bit"), "radiobox image");
    let mapper = MemoryMapper::new().then(window(OLD_VERSION)).then(window(OLD_VERSION));
    let mut fpga = fpga(mapper, FpgaConfig::rooted_at(&root));

    fpga.init().unwrap();
    assert!(fpga.is_mapped());
    assert_eq!(fpga.mapper().maps().len(), 2, "reloaded only once");
}

#[test]
fn test_non_bcd_version_triggers_reload() {
    let root = board_root("non-bcd");
    write(&root.join("fresh/fpga.bit"), "radiobox image");
    let mapper = MemoryMapper::new().then(window(0x1603_1A02)).then(window(GOOD_VERSION));
    let mut fpga = fpga(mapper, FpgaConfig::rooted_at(&root));

    fpga.init().unwrap();
    assert_eq!(fpga.mapper().maps().len(), 2);
}

#[test]
fn test_missing_bundled_bitstream_fails_init() {
    let root = board_root("no-fresh");
    let mapper = MemoryMapper::new().then(window(OLD_VERSION));
    let mut fpga = fpga(mapper, FpgaConfig::rooted_at(&root));

    let err = fpga.init().unwrap_err();
    assert!(matches!(err, Error::Bitstream { .. }), "got {err:?}");
    assert!(!fpga.is_mapped());
    assert!(matches!(fpga.radiobox_mut(), Err(Error::NotMapped)));
}

// =============================================================================
// Bitstream File Tests
// =============================================================================

#[test]
fn test_original_bitstream_saved_only_once() {
    let root = board_root("saved-once");
    let config = FpgaConfig::rooted_at(&root);
    write(&config.bitstream, "first boot image");
    write(&config.bitstream_fresh, "radiobox image");

    prepare_bitstream(&config).unwrap();
    write(&config.bitstream, "modified image");
    prepare_bitstream(&config).unwrap();

    assert_eq!(read(&config.bitstream_orig), "first boot image");
    assert_eq!(read(&config.bitstream), "radiobox image");
}

#[test]
fn test_reload_requires_boot_bitstream() {
    let root = board_root("reload-missing");
    let config = FpgaConfig::rooted_at(&root);
    let err = reload_bitstream(&config).unwrap_err();
    match err {
        Error::Bitstream { path, .. } => assert_eq!(path, config.bitstream),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_remount_scripts_wrap_the_copy() {
    let root = board_root("remount");
    let mut config = FpgaConfig::rooted_at(&root);
    write(&config.bitstream_fresh, "radiobox image");
    config.remount_rw = Some(PathBuf::from("true"));
    config.remount_ro = Some(PathBuf::from("false"));

    let err = prepare_bitstream(&config).unwrap_err();
    assert!(matches!(err, Error::Command { .. }), "read-only remount failure reported, got {err:?}");
    assert_eq!(read(&config.bitstream), "radiobox image", "copy done before remounting");
}

#[test]
fn test_unstartable_remount_script() {
    let root = board_root("no-script");
    let mut config = FpgaConfig::rooted_at(&root);
    config.remount_rw = Some(root.join("does-not-exist"));

    let err = prepare_bitstream(&config).unwrap_err();
    assert!(matches!(err, Error::Spawn { .. }), "got {err:?}");
}

// =============================================================================
// Calibration Hand-Over Tests
// =============================================================================

#[test]
fn test_exit_keeps_calibration() {
    let root = board_root("exit");
    let mut fpga = fpga(MemoryMapper::new().then(window(GOOD_VERSION)), FpgaConfig::rooted_at(&root));
    fpga.init().unwrap();

    fpga.radiobox_mut().unwrap().calib_mut().set_adc_offset(AdcChannel::Adc1, -42);
    fpga.exit();

    assert!(!fpga.is_mapped());
    assert_eq!(fpga.calib().adc_offset(AdcChannel::Adc1), -42);
}

#[test]
fn test_reinit_hands_calibration_to_new_window() {
    let root = board_root("reinit");
    let mapper = MemoryMapper::new().then(window(GOOD_VERSION)).then(window(GOOD_VERSION));
    let mut fpga = fpga(mapper, FpgaConfig::rooted_at(&root));
    fpga.init().unwrap();
    fpga.radiobox_mut().unwrap().calib_mut().set_adc_offset(AdcChannel::Xadc9, 17);

    fpga.init().unwrap();

    assert_eq!(fpga.mapper().maps().len(), 2);
    assert_eq!(fpga.radiobox_mut().unwrap().calib().adc_offset(AdcChannel::Xadc9), 17);
}

#[test]
fn test_take_and_restore() {
    let root = board_root("take");
    let mut fpga = fpga(MemoryMapper::new().then(window(GOOD_VERSION)), FpgaConfig::rooted_at(&root));
    fpga.init().unwrap();

    let rb = fpga.take().unwrap();
    assert!(!fpga.is_mapped());
    assert!(matches!(fpga.take(), Err(Error::NotMapped)));

    fpga.restore(rb);
    assert!(fpga.is_mapped());
    fpga.exit();
}
