//! Cam_Setting: the camera reports its exposure settings to the flash

use crate::anomaly::{AnomalyKind, Anomalies};
use crate::command::Command;
use crate::units::{ExposureTime, FStop, FlashCompensation, FocalLength, FocusDistance, Iso};

use super::flags::CameraConfig;

/// Flash mode requested by the camera, interpreted view of the raw code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraModeKind {
    /// Auto aperture with FP
    AaFp,
    /// TTL with FP
    TtlFp,
    /// Balanced fill TTL with FP
    TtlBlFp,
    /// Balanced fill TTL
    TtlBl,
}

/// Camera flash mode byte
///
/// Several codes map to the same mode, so the raw byte is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CameraFlashMode(pub u8);

impl CameraFlashMode {
    pub fn kind(self) -> Option<CameraModeKind> {
        match self.0 {
            0x00 | 0x08 => Some(CameraModeKind::AaFp),
            0x01 => Some(CameraModeKind::TtlFp),
            0x02 | 0x04 => Some(CameraModeKind::TtlBlFp),
            0x05 => Some(CameraModeKind::TtlBl),
            _ => None,
        }
    }
}

impl From<CameraModeKind> for CameraFlashMode {
    fn from(kind: CameraModeKind) -> Self {
        Self(match kind {
            CameraModeKind::AaFp => 0x00,
            CameraModeKind::TtlFp => 0x01,
            CameraModeKind::TtlBlFp => 0x02,
            CameraModeKind::TtlBl => 0x05,
        })
    }
}

/// Camera settings, 14 payload bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CamSetting {
    pub mode: CameraFlashMode,
    pub config: CameraConfig,
    pub unknown_3: u8,
    pub iso: Iso,
    pub exposure: ExposureTime,
    pub aperture: FStop,
    pub focal_length: FocalLength,
    pub flash_compensation: FlashCompensation,
    /// Always 0x30
    pub unknown_9: u8,
    pub distance: FocusDistance,
    /// Appears to combine focal length and focus distance
    pub unknown_11: u8,
    /// Tracks the aperture within one code
    pub unknown_12: u8,
    /// Related to ISO
    pub unknown_13: u8,
    /// Related to ISO
    pub unknown_14: u8,
}

impl CamSetting {
    const UNKNOWN_9_VALUE: u8 = 0x30;

    pub fn from_bytes(b: &[u8; 14], anomalies: &mut Anomalies) -> Self {
        let cmd = Command::CamSetting;
        let setting = Self {
            mode: CameraFlashMode(b[0]),
            config: CameraConfig::from_byte(b[1]),
            unknown_3: b[2],
            iso: Iso(b[3]),
            exposure: ExposureTime(b[4]),
            aperture: FStop(b[5]),
            focal_length: FocalLength(b[6]),
            flash_compensation: FlashCompensation(b[7]),
            unknown_9: b[8],
            distance: FocusDistance(b[9]),
            unknown_11: b[10],
            unknown_12: b[11],
            unknown_13: b[12],
            unknown_14: b[13],
        };

        if setting.mode.kind().is_none() {
            anomalies.flag(cmd, AnomalyKind::UnrecognizedCode, 0, b[0]);
        }
        anomalies.check_bits(cmd, 1, CameraConfig::CONSTANT_MASK, CameraConfig::CONSTANT_VALUE, b[1]);
        anomalies.check_byte(cmd, AnomalyKind::ConstantByte, 8, Self::UNKNOWN_9_VALUE, b[8]);

        setting
    }

    pub fn to_bytes(&self) -> [u8; 14] {
        [
            self.mode.0,
            self.config.to_byte(),
            self.unknown_3,
            self.iso.raw(),
            self.exposure.raw(),
            self.aperture.raw(),
            self.focal_length.raw(),
            self.flash_compensation.raw(),
            self.unknown_9,
            self.distance.raw(),
            self.unknown_11,
            self.unknown_12,
            self.unknown_13,
            self.unknown_14,
        ]
    }
}

impl Default for CamSetting {
    fn default() -> Self {
        Self {
            mode: CameraFlashMode::default(),
            config: CameraConfig::default(),
            unknown_3: 0,
            iso: Iso::default(),
            exposure: ExposureTime::default(),
            aperture: FStop::default(),
            focal_length: FocalLength::default(),
            flash_compensation: FlashCompensation::default(),
            unknown_9: Self::UNKNOWN_9_VALUE,
            distance: FocusDistance::default(),
            unknown_11: 0,
            unknown_12: 0,
            unknown_13: 0,
            unknown_14: 0,
        }
    }
}
