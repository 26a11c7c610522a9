//! Short control messages and opaque init/postflash payloads

use crate::anomaly::{AnomalyKind, Anomalies};
use crate::command::Command;

/// First init frame, purpose unknown
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Init0 {
    pub unknown: [u8; 17],
}

/// Second init frame, purpose unknown
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Init1 {
    pub unknown: [u8; 9],
}

/// Third init frame, purpose unknown
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Init2 {
    pub unknown: [u8; 45],
}

/// First postflash frame (code 0xC0, 1 byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Postflash1 {
    pub unknown: u8,
}

/// Second postflash frame (code 0xC0, 2 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Postflash2 {
    pub unknown: [u8; 2],
}

/// AF assist illumination on/off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AfIllumination {
    pub enable: bool,
}

impl AfIllumination {
    pub const ENABLE: u8 = 0x01;

    pub fn from_bytes(bytes: &[u8; 2], anomalies: &mut Anomalies) -> Self {
        let enable = decode_switch(Command::AfIllumination, 0, bytes[0], Self::ENABLE, anomalies);
        anomalies.check_byte(Command::AfIllumination, AnomalyKind::ConstantByte, 1, 0x00, bytes[1]);
        Self { enable }
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [encode_switch(self.enable, Self::ENABLE), 0x00]
    }
}

/// Red-eye reduction pre-flashes on/off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RedEyeReduction {
    pub enable: bool,
}

impl RedEyeReduction {
    pub const ENABLE: u8 = 0x80;

    pub fn from_bytes(bytes: &[u8; 1], anomalies: &mut Anomalies) -> Self {
        Self {
            enable: decode_switch(Command::RedEyeReduction, 0, bytes[0], Self::ENABLE, anomalies),
        }
    }

    pub fn to_bytes(&self) -> [u8; 1] {
        [encode_switch(self.enable, Self::ENABLE)]
    }
}

/// Modelling light: the flash fires a 1.5s burst when enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModellingLight {
    pub enable: bool,
}

impl ModellingLight {
    pub const ENABLE: u8 = 0xD5;

    pub fn from_bytes(bytes: &[u8; 1], anomalies: &mut Anomalies) -> Self {
        Self {
            enable: decode_switch(Command::ModellingLight, 0, bytes[0], Self::ENABLE, anomalies),
        }
    }

    pub fn to_bytes(&self) -> [u8; 1] {
        [encode_switch(self.enable, Self::ENABLE)]
    }
}

/// Preflash power level
///
/// 0 is the weakest level, 9 is 1/128 + 2/3 EV and 24 is the documented
/// maximum (1/32 + 1/3 EV). The scale between those points is not linear in
/// EV, so only the raw level is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preflash {
    pub power: u8,
}

impl Preflash {
    pub const MAX_POWER: u8 = 24;

    pub fn from_bytes(command: Command, bytes: &[u8; 1], anomalies: &mut Anomalies) -> Self {
        if bytes[0] > Self::MAX_POWER {
            anomalies.flag(command, AnomalyKind::OutOfRange, 0, bytes[0]);
        }
        Self { power: bytes[0] }
    }

    pub fn to_bytes(&self) -> [u8; 1] {
        [self.power]
    }
}

/// Decode an on/off byte with a single documented "on" code
///
/// Any non-zero byte reads as on; codes other than 0 and `on` are flagged.
fn decode_switch(command: Command, offset: u8, byte: u8, on: u8, anomalies: &mut Anomalies) -> bool {
    if byte != 0 && byte != on {
        anomalies.flag(command, AnomalyKind::UnrecognizedCode, offset, byte);
    }
    byte != 0
}

fn encode_switch(enable: bool, on: u8) -> u8 {
    if enable {
        on
    } else {
        0x00
    }
}
