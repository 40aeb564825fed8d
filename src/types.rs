//! Shared types used across the RadioBox driver
//!
//! Parameter codes arrive from the web front-end as plain numbers. This
//! module turns them into enums once, so the register code below can match
//! on meaning instead of magic values.

use core::fmt;

/// ADC input that carries a calibrated DC offset
///
/// Variants are named after the converter channel; the discriminant is the
/// FPGA multiplexer source ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdcChannel {
    /// Fast ADC channel 0 (RF In 1)
    Adc0 = 0x20,
    /// Fast ADC channel 1 (RF In 2)
    Adc1 = 0x21,
    /// XADC channel 0 (Vin1 on the extension connector)
    Xadc0 = 0x10,
    /// XADC channel 1 (Vin2)
    Xadc1 = 0x11,
    /// XADC channel 8 (Vin0)
    Xadc8 = 0x18,
    /// XADC channel 9 (Vin3)
    Xadc9 = 0x19,
}

impl AdcChannel {
    /// Number of calibratable channels
    pub const COUNT: usize = 6;

    /// Order in which the offset calibration walks the channels
    pub const CALIBRATION_ORDER: [Self; Self::COUNT] = [
        Self::Adc0,
        Self::Adc1,
        Self::Xadc8,
        Self::Xadc0,
        Self::Xadc1,
        Self::Xadc9,
    ];

    /// FPGA multiplexer source ID
    #[must_use]
    pub const fn mux_id(self) -> u32 {
        self as u32
    }

    /// Slot of this channel in calibration tables
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Adc0 => 0,
            Self::Adc1 => 1,
            Self::Xadc8 => 2,
            Self::Xadc0 => 3,
            Self::Xadc1 => 4,
            Self::Xadc9 => 5,
        }
    }
}

impl fmt::Display for AdcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adc0 => write!(f, "RF In 1"),
            Self::Adc1 => write!(f, "RF In 2"),
            Self::Xadc8 => write!(f, "Vin0"),
            Self::Xadc0 => write!(f, "Vin1"),
            Self::Xadc1 => write!(f, "Vin2"),
            Self::Xadc9 => write!(f, "Vin3"),
        }
    }
}

/// Signal feeding the TX modulator or the RX demodulator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModSource {
    /// Nothing connected
    #[default]
    None,
    /// RF In 1
    RfIn1,
    /// RF In 2
    RfIn2,
    /// Extension connector analog input 0
    ExpAi0,
    /// Extension connector analog input 1
    ExpAi1,
    /// Extension connector analog input 2
    ExpAi2,
    /// Extension connector analog input 3
    ExpAi3,
    /// Internal modulation oscillator (TX only)
    ModOsc,
    /// AC97 line-out, left channel
    Ac97LineoutL,
    /// AC97 line-out, right channel
    Ac97LineoutR,
}

impl ModSource {
    /// Decode the front-end parameter code, unknown codes select `None`
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::RfIn1,
            2 => Self::RfIn2,
            4 => Self::ExpAi0,
            5 => Self::ExpAi1,
            6 => Self::ExpAi2,
            7 => Self::ExpAi3,
            15 => Self::ModOsc,
            16 => Self::Ac97LineoutL,
            17 => Self::Ac97LineoutR,
            _ => Self::None,
        }
    }

    /// Front-end parameter code
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::RfIn1 => 1,
            Self::RfIn2 => 2,
            Self::ExpAi0 => 4,
            Self::ExpAi1 => 5,
            Self::ExpAi2 => 6,
            Self::ExpAi3 => 7,
            Self::ModOsc => 15,
            Self::Ac97LineoutL => 16,
            Self::Ac97LineoutR => 17,
        }
    }

    /// ADC channel behind this source, if it needs an offset correction
    #[must_use]
    pub const fn adc_channel(self) -> Option<AdcChannel> {
        match self {
            Self::RfIn1 => Some(AdcChannel::Adc0),
            Self::RfIn2 => Some(AdcChannel::Adc1),
            Self::ExpAi0 => Some(AdcChannel::Xadc0),
            Self::ExpAi1 => Some(AdcChannel::Xadc8),
            Self::ExpAi2 => Some(AdcChannel::Xadc1),
            Self::ExpAi3 => Some(AdcChannel::Xadc9),
            _ => None,
        }
    }

    /// FPGA multiplexer source ID (0 when nothing is routed)
    #[must_use]
    pub const fn mux_id(self) -> u32 {
        match self {
            Self::Ac97LineoutL => 0x30,
            Self::Ac97LineoutR => 0x31,
            _ => match self.adc_channel() {
                Some(ch) => ch.mux_id(),
                None => 0,
            },
        }
    }
}

/// Transmitter modulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TxModType {
    /// Unmodulated carrier; also used for unknown codes
    #[default]
    Cw,
    /// Upper sideband
    Usb,
    /// Lower sideband
    Lsb,
    /// Amplitude modulation with carrier
    Am,
    /// Frequency modulation
    Fm,
    /// Phase modulation
    Pm,
}

impl TxModType {
    /// Decode the front-end parameter code
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Usb,
            2 => Self::Lsb,
            3 => Self::Am,
            4 => Self::Fm,
            5 => Self::Pm,
            _ => Self::Cw,
        }
    }

    /// Front-end parameter code, also written to the power control register
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Cw => 0,
            Self::Usb => 1,
            Self::Lsb => 2,
            Self::Am => 3,
            Self::Fm => 4,
            Self::Pm => 5,
        }
    }
}

/// Receiver demodulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RxModType {
    /// Receiver idle; also used for unknown codes
    #[default]
    Off,
    /// Upper sideband
    Usb,
    /// Lower sideband
    Lsb,
    /// Synchronous AM locked on the upper sideband
    AmSyncUsb,
    /// Synchronous AM locked on the lower sideband
    AmSyncLsb,
    /// Frequency demodulation
    Fm,
    /// Phase demodulation
    Pm,
    /// Envelope AM
    AmEnv,
}

impl RxModType {
    /// Decode the low nibble of the front-end parameter code
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code & 0x0f {
            1 => Self::Usb,
            2 => Self::Lsb,
            3 => Self::AmSyncUsb,
            4 => Self::AmSyncLsb,
            5 => Self::Fm,
            6 => Self::Pm,
            7 => Self::AmEnv,
            _ => Self::Off,
        }
    }

    /// Front-end parameter code, also written to the power control register
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Usb => 1,
            Self::Lsb => 2,
            Self::AmSyncUsb => 3,
            Self::AmSyncLsb => 4,
            Self::Fm => 5,
            Self::Pm => 6,
            Self::AmEnv => 7,
        }
    }

    /// Sign of the Weaver offset applied to the carrier, 0 for none
    #[must_use]
    pub const fn weaver_sign(self) -> i8 {
        match self {
            Self::Usb | Self::AmSyncUsb => 1,
            Self::Lsb | Self::AmSyncLsb => -1,
            _ => 0,
        }
    }
}

/// Receiver mode: demodulator plus AM-ENV filter variant
///
/// The front-end packs the filter variant into the upper nibble of the
/// `rx_modtyp` code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RxMode {
    /// Demodulator
    pub kind: RxModType,
    /// AM envelope filter variant (upper nibble of the code)
    pub amenv_filter: u8,
}

impl RxMode {
    /// Decode a packed `rx_modtyp` code
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self {
            kind: RxModType::from_code(code),
            amenv_filter: ((code >> 4) & 0x0f) as u8,
        }
    }

    /// Packed `rx_modtyp` code
    #[must_use]
    pub const fn code(self) -> i32 {
        (self.amenv_filter as i32) << 4 | self.kind.code() as i32
    }
}

/// Load attached to an RF output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Termination {
    /// No gain correction
    #[default]
    Uncorrected,
    /// 50 ohm load
    FiftyOhm,
    /// High impedance load
    Open,
}

impl Termination {
    /// Decode the front-end parameter code
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Uncorrected,
            1 => Self::FiftyOhm,
            _ => Self::Open,
        }
    }
}

/// RF output connector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RfOut {
    /// RF Out 1
    Out1,
    /// RF Out 2
    Out2,
}

/// Overdrive flags reported by the RF input stages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overdrive(u16);

impl Overdrive {
    /// Wrap the two-bit flag field
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & 0x3)
    }

    /// Raw flag field
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Any input overdriven
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_codes_round_trip() {
        for code in [0, 1, 2, 4, 5, 6, 7, 15, 16, 17] {
            assert_eq!(ModSource::from_code(code).code(), code);
        }
        assert_eq!(ModSource::from_code(3), ModSource::None);
    }

    #[test]
    fn mux_ids_follow_the_fpga_map() {
        assert_eq!(ModSource::RfIn1.mux_id(), 0x20);
        assert_eq!(ModSource::RfIn2.mux_id(), 0x21);
        assert_eq!(ModSource::ExpAi0.mux_id(), 0x10);
        assert_eq!(ModSource::ExpAi1.mux_id(), 0x18);
        assert_eq!(ModSource::ExpAi2.mux_id(), 0x11);
        assert_eq!(ModSource::ExpAi3.mux_id(), 0x19);
        assert_eq!(ModSource::Ac97LineoutL.mux_id(), 0x30);
        assert_eq!(ModSource::Ac97LineoutR.mux_id(), 0x31);
        assert_eq!(ModSource::ModOsc.mux_id(), 0);
    }

    #[test]
    fn rx_mode_unpacks_filter_nibble() {
        let mode = RxMode::from_code(0x27);
        assert_eq!(mode.kind, RxModType::AmEnv);
        assert_eq!(mode.amenv_filter, 2);
        assert_eq!(mode.code(), 0x27);
    }

    #[test]
    fn channel_indices_are_dense() {
        let mut seen = [false; AdcChannel::COUNT];
        for ch in AdcChannel::CALIBRATION_ORDER {
            seen[ch.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
