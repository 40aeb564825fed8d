//! RadioBox register map
//!
//! Byte offsets inside the RadioBox window. DDS increments and offsets are
//! 48-bit values split across a `_LO` (bits 0..31) and `_HI` (bits 32..47)
//! register.

/// Register offsets
pub mod reg {
    #![allow(missing_docs)]

    /// Control bits, see [`super::ctrl`]
    pub const CTRL: usize = 0x000;
    /// Status bits, see [`super::status`]
    pub const STATUS: usize = 0x004;
    /// Power control, TX modulation in bits 8..15, RX in bits 0..7
    pub const PWR_CTRL: usize = 0x008;
    /// Firmware version, BCD `YYMMDDNN`
    pub const VERSION: usize = 0x00C;
    /// Connection points: RFOUT2 (31..24), RFOUT1 (23..16), LED (7..0)
    pub const SRC_CON_PNT: usize = 0x010;
    /// Connection points: AC97 line-in right (15..8), left (7..0)
    pub const SRC_CON_PNT2: usize = 0x014;

    pub const TX_MUXIN_SRC: usize = 0x020;
    pub const TX_MUXIN_GAIN: usize = 0x024;
    pub const TX_MUXIN_OFS: usize = 0x028;

    pub const TX_MOD_OSC_INC_LO: usize = 0x030;
    pub const TX_MOD_OSC_INC_HI: usize = 0x034;
    pub const TX_MOD_OSC_OFS_LO: usize = 0x038;
    pub const TX_MOD_OSC_OFS_HI: usize = 0x03C;

    pub const TX_MOD_QMIX_GAIN: usize = 0x040;
    pub const TX_MOD_QMIX_OFS_LO: usize = 0x048;
    pub const TX_MOD_QMIX_OFS_HI: usize = 0x04C;

    pub const TX_CAR_OSC_INC_LO: usize = 0x050;
    pub const TX_CAR_OSC_INC_HI: usize = 0x054;
    pub const TX_CAR_OSC_OFS_LO: usize = 0x058;
    pub const TX_CAR_OSC_OFS_HI: usize = 0x05C;
    pub const TX_CAR_OSC_INC_SCNR_LO: usize = 0x060;
    pub const TX_CAR_OSC_INC_SCNR_HI: usize = 0x064;

    pub const TX_AMP_RF_GAIN: usize = 0x068;
    pub const TX_AMP_RF_OFS: usize = 0x06C;

    pub const RX_MUXIN_SRC: usize = 0x100;
    pub const RX_MUXIN_GAIN: usize = 0x104;
    pub const RX_MUXIN_OFS: usize = 0x108;

    pub const RX_CAR_CALC_WEAVER_INC_LO: usize = 0x110;
    pub const RX_CAR_CALC_WEAVER_INC_HI: usize = 0x114;

    pub const RX_CAR_OSC_INC_LO: usize = 0x120;
    pub const RX_CAR_OSC_INC_HI: usize = 0x124;
    pub const RX_CAR_OSC_OFS_LO: usize = 0x128;
    pub const RX_CAR_OSC_OFS_HI: usize = 0x12C;
    pub const RX_CAR_OSC_INC_SCNR_LO: usize = 0x130;
    pub const RX_CAR_OSC_INC_SCNR_HI: usize = 0x134;

    pub const RX_MOD_OSC_INC_LO: usize = 0x140;
    pub const RX_MOD_OSC_INC_HI: usize = 0x144;
    pub const RX_MOD_OSC_OFS_LO: usize = 0x148;
    pub const RX_MOD_OSC_OFS_HI: usize = 0x14C;

    pub const RX_MOD_SSB_AM_GAIN: usize = 0x150;
    pub const RX_MOD_AMENV_GAIN: usize = 0x154;
    pub const RX_MOD_FM_GAIN: usize = 0x158;
    pub const RX_MOD_PM_GAIN: usize = 0x15C;
    /// AM envelope filter variant, 0..=2
    pub const RX_AMENV_FILTVAR: usize = 0x160;

    /// CORDIC magnitude of the RX signal after the carrier mixer
    pub const RX_AFC_CORDIC_MAG: usize = 0x170;

    pub const RFOUT1_GAIN: usize = 0x180;
    pub const RFOUT1_OFS: usize = 0x184;
    pub const RFOUT2_GAIN: usize = 0x188;
    pub const RFOUT2_OFS: usize = 0x18C;
}

/// Control register bits
pub mod ctrl {
    /// RadioBox enabled
    pub const ENABLE: u32 = 0x0000_0001;
    /// Resync of all four oscillators, one bit per oscillator group
    pub const RESYNC_ALL: u32 = 0x1010_1010;
    /// Reset of the TX and RX carrier oscillators
    pub const RESET_CAR_OSCS: u32 = 0x0006_0006;
    /// TX modulation oscillator resync (held while set)
    pub const TX_MOD_OSC_RESYNC: u32 = 0x0000_1000;
    /// TX carrier increment streamed from the modulator (FM)
    pub const TX_CAR_OSC_INC_STREAM: u32 = 0x0000_0020;
    /// TX carrier phase offset streamed from the modulator (PM)
    pub const TX_CAR_OSC_OFS_STREAM: u32 = 0x0000_0040;
    /// All TX oscillator reset, resync and streaming bits
    pub const TX_SIGNALS: u32 = 0x0000_7076;
    /// RX carrier increment streamed from the AFC
    pub const RX_CAR_OSC_INC_STREAM: u32 = 0x0020_0000;
    /// All RX oscillator reset, resync and streaming bits
    pub const RX_SIGNALS: u32 = 0x1076_0000;
    /// ADC DC offset tracking
    pub const ADC_AUTO_OFS: u32 = 0x0100_0000;
}

/// Status register bits
pub mod status {
    /// TX modulation oscillator phase is at zero
    pub const TX_MOD_OSC_PHASE_ZERO: u32 = 0x0000_0100;
    /// RF input overdrive flags
    pub const OVERDRIVE_MASK: u32 = 0x00C0_0000;
    /// Position of the overdrive flags
    pub const OVERDRIVE_SHIFT: u32 = 22;
}

/// Power control register fields
pub mod pwr {
    /// RX modulation type
    pub const RX_MODTYP_MASK: u32 = 0x0000_00FF;
    /// TX modulation type
    pub const TX_MODTYP_MASK: u32 = 0x0000_FF00;
    /// Position of the TX modulation type
    pub const TX_MODTYP_SHIFT: u32 = 8;
    /// Every block powered, used during calibration
    pub const ALL_ON: u32 = 0x0000_0007;
}
