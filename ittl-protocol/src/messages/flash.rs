//! Flash_Setting: the flash reports its state to the camera

use crate::anomaly::{AnomalyKind, Anomalies};
use crate::command::Command;
use crate::units::FlashPower;

use super::flags::{FlashActivity, FlashStatus};

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashMode {
    /// i-TTL balanced fill flash
    TtlBl,
    Ttl,
    /// Auto aperture
    Aa,
    /// Non-TTL auto
    A,
    /// Distance priority manual
    Gn,
    Manual,
    /// Repeating (stroboscopic)
    Repeating,
    /// Code outside the documented set, kept verbatim
    Unrecognized(u8),
}

impl FlashMode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => FlashMode::TtlBl,
            2 => FlashMode::Ttl,
            3 => FlashMode::Aa,
            4 => FlashMode::A,
            5 => FlashMode::Gn,
            6 => FlashMode::Manual,
            7 => FlashMode::Repeating,
            other => FlashMode::Unrecognized(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            FlashMode::TtlBl => 1,
            FlashMode::Ttl => 2,
            FlashMode::Aa => 3,
            FlashMode::A => 4,
            FlashMode::Gn => 5,
            FlashMode::Manual => 6,
            FlashMode::Repeating => 7,
            FlashMode::Unrecognized(other) => other,
        }
    }
}

/// Flash settings, 17 payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashSetting {
    pub status: FlashStatus,
    pub mode: FlashMode,
    /// Always `unknown_8 + 102`
    pub unknown_3: u8,
    pub activity: FlashActivity,
    /// Always 0
    pub unknown_5: u8,
    pub power: FlashPower,
    /// Always `unknown_8 + 34`
    pub unknown_7: u8,
    /// Reappears modified in `unknown_3` and `unknown_7`
    pub unknown_8: u8,
    /// Always 48
    pub unknown_9: u8,
    /// Reflector zoom position, focal length in mm
    pub reflector_mm: u8,
    /// Repeating flash frequency
    pub strobe_frequency: u8,
    /// Repeating flash count
    pub strobe_count: u8,
    pub unknown_13: u8,
    pub unknown_14: u8,
    pub unknown_15: u8,
    pub unknown_16: u8,
    /// Related to the CLS (wireless) setting
    pub cls: u8,
}

impl FlashSetting {
    const UNKNOWN_3_OFFSET: u8 = 102;
    const UNKNOWN_7_OFFSET: u8 = 34;
    const UNKNOWN_9_VALUE: u8 = 48;

    pub fn from_bytes(b: &[u8; 17], anomalies: &mut Anomalies) -> Self {
        let cmd = Command::FlashSetting;
        let setting = Self {
            status: FlashStatus::from_byte(b[0]),
            mode: FlashMode::from_byte(b[1]),
            unknown_3: b[2],
            activity: FlashActivity::from_byte(b[3]),
            unknown_5: b[4],
            power: FlashPower(b[5]),
            unknown_7: b[6],
            unknown_8: b[7],
            unknown_9: b[8],
            reflector_mm: b[9],
            strobe_frequency: b[10],
            strobe_count: b[11],
            unknown_13: b[12],
            unknown_14: b[13],
            unknown_15: b[14],
            unknown_16: b[15],
            cls: b[16],
        };

        anomalies.check_bits(cmd, 0, FlashStatus::CONSTANT_MASK, FlashStatus::CONSTANT_VALUE, b[0]);
        if let FlashMode::Unrecognized(code) = setting.mode {
            anomalies.flag(cmd, AnomalyKind::UnrecognizedCode, 1, code);
        }
        let derived_3 = setting.unknown_8.wrapping_add(Self::UNKNOWN_3_OFFSET);
        anomalies.check_byte(cmd, AnomalyKind::DerivedByte, 2, derived_3, b[2]);
        anomalies.check_bits(cmd, 3, FlashActivity::CONSTANT_MASK, FlashActivity::CONSTANT_VALUE, b[3]);
        anomalies.check_byte(cmd, AnomalyKind::ConstantByte, 4, 0, b[4]);
        let derived_7 = setting.unknown_8.wrapping_add(Self::UNKNOWN_7_OFFSET);
        anomalies.check_byte(cmd, AnomalyKind::DerivedByte, 6, derived_7, b[6]);
        anomalies.check_byte(cmd, AnomalyKind::ConstantByte, 8, Self::UNKNOWN_9_VALUE, b[8]);

        setting
    }

    pub fn to_bytes(&self) -> [u8; 17] {
        [
            self.status.to_byte(),
            self.mode.to_byte(),
            self.unknown_3,
            self.activity.to_byte(),
            self.unknown_5,
            self.power.raw(),
            self.unknown_7,
            self.unknown_8,
            self.unknown_9,
            self.reflector_mm,
            self.strobe_frequency,
            self.strobe_count,
            self.unknown_13,
            self.unknown_14,
            self.unknown_15,
            self.unknown_16,
            self.cls,
        ]
    }

    /// A setting whose documented constants and derived bytes all hold
    pub fn new(mode: FlashMode, power: FlashPower, unknown_8: u8) -> Self {
        Self {
            status: FlashStatus::documented(),
            mode,
            unknown_3: unknown_8.wrapping_add(Self::UNKNOWN_3_OFFSET),
            activity: FlashActivity::documented(),
            unknown_5: 0,
            power,
            unknown_7: unknown_8.wrapping_add(Self::UNKNOWN_7_OFFSET),
            unknown_8,
            unknown_9: Self::UNKNOWN_9_VALUE,
            reflector_mm: 0,
            strobe_frequency: 0,
            strobe_count: 0,
            unknown_13: 0,
            unknown_14: 0,
            unknown_15: 0,
            unknown_16: 0,
            cls: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_mode_codes() {
        for byte in 0..=u8::MAX {
            assert_eq!(FlashMode::from_byte(byte).to_byte(), byte);
        }
        assert_eq!(FlashMode::from_byte(6), FlashMode::Manual);
        assert_eq!(FlashMode::from_byte(0), FlashMode::Unrecognized(0));
    }

    #[test]
    fn test_documented_setting_has_no_anomalies() {
        let mut setting = FlashSetting::new(FlashMode::Ttl, FlashPower(12), 10);
        setting.reflector_mm = 35;
        let bytes = setting.to_bytes();
        assert_eq!(bytes[2], 112);
        assert_eq!(bytes[6], 44);
        assert_eq!(bytes[8], 48);

        let mut anomalies = Anomalies::new();
        let decoded = FlashSetting::from_bytes(&bytes, &mut anomalies);
        assert_eq!(decoded, setting);
        assert!(anomalies.is_empty());
        assert_eq!(decoded.power.fraction(), 0.25);
    }

    #[test]
    fn test_anomalies_are_reported_not_fatal() {
        let mut bytes = FlashSetting::new(FlashMode::Manual, FlashPower::FULL, 0).to_bytes();
        bytes[0] |= 0x80; // constant status bit
        bytes[8] = 47; // unknown_9
        bytes[2] = 0; // derived from unknown_8

        let mut anomalies = Anomalies::new();
        let decoded = FlashSetting::from_bytes(&bytes, &mut anomalies);
        assert_eq!(anomalies.len(), 3);
        assert!(decoded.status.reserved_7);
        assert_eq!(decoded.to_bytes(), bytes);
    }
}
