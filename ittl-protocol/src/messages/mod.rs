//! Message catalog: typed payloads for every command
//!
//! Payload fields are one of three shapes:
//! - opaque bytes whose purpose is unknown, carried verbatim
//! - packed flag bits ([`flags`])
//! - scaled physical quantities ([`crate::units`])
//!
//! Decoding never fails on unexpected field values; those are collected as
//! [`ProtocolAnomaly`](crate::anomaly::ProtocolAnomaly) values in
//! [`Decoded::anomalies`].

pub mod camera;
pub mod control;
pub mod flags;
pub mod flash;

use crate::anomaly::Anomalies;
use crate::command::{Command, SequencePosition};
use crate::frame::{Frame, FrameError};

pub use camera::{CamSetting, CameraFlashMode, CameraModeKind};
pub use control::{
    AfIllumination, Init0, Init1, Init2, ModellingLight, Postflash1, Postflash2, Preflash,
    RedEyeReduction,
};
pub use flags::{CameraConfig, FlashActivity, FlashStatus};
pub use flash::{FlashMode, FlashSetting};

/// A decoded bus message, one variant per logical command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Init0(Init0),
    Init1(Init1),
    Init2(Init2),
    FlashSetting(FlashSetting),
    CamSetting(CamSetting),
    Postflash1(Postflash1),
    Postflash2(Postflash2),
    AfIllumination(AfIllumination),
    RedEyeReduction(RedEyeReduction),
    ModellingLight(ModellingLight),
    Preflash1(Preflash),
    Preflash2(Preflash),
}

/// A message together with the anomalies seen while decoding it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decoded {
    pub message: Message,
    pub anomalies: Anomalies,
}

fn payload_array<const N: usize>(frame: &Frame) -> Result<&[u8; N], FrameError> {
    frame
        .payload
        .as_slice()
        .try_into()
        .map_err(|_| FrameError::InvalidLength {
            command: frame.command,
            len: frame.payload.len() as u8,
        })
}

impl Message {
    /// Command this message travels under
    pub fn command(&self) -> Command {
        match self {
            Message::Init0(_) => Command::Init0,
            Message::Init1(_) => Command::Init1,
            Message::Init2(_) => Command::Init2,
            Message::FlashSetting(_) => Command::FlashSetting,
            Message::CamSetting(_) => Command::CamSetting,
            Message::Postflash1(_) | Message::Postflash2(_) => Command::Postflash,
            Message::AfIllumination(_) => Command::AfIllumination,
            Message::RedEyeReduction(_) => Command::RedEyeReduction,
            Message::ModellingLight(_) => Command::ModellingLight,
            Message::Preflash1(_) => Command::Preflash1,
            Message::Preflash2(_) => Command::Preflash2,
        }
    }

    /// Sequence position for commands whose code is shared
    pub fn position(&self) -> SequencePosition {
        match self {
            Message::Postflash2(_) => SequencePosition::Second,
            _ => SequencePosition::First,
        }
    }

    /// Parse a message from a validated frame
    pub fn from_frame(frame: &Frame) -> Result<Decoded, FrameError> {
        let mut anomalies = Anomalies::new();
        let a = &mut anomalies;

        let message = match frame.command {
            Command::Init0 => Message::Init0(Init0 {
                unknown: *payload_array(frame)?,
            }),
            Command::Init1 => Message::Init1(Init1 {
                unknown: *payload_array(frame)?,
            }),
            Command::Init2 => Message::Init2(Init2 {
                unknown: *payload_array(frame)?,
            }),
            Command::FlashSetting => {
                Message::FlashSetting(FlashSetting::from_bytes(payload_array(frame)?, a))
            }
            Command::CamSetting => {
                Message::CamSetting(CamSetting::from_bytes(payload_array(frame)?, a))
            }
            Command::Postflash => match frame.position() {
                SequencePosition::First => {
                    let [unknown] = *payload_array::<1>(frame)?;
                    Message::Postflash1(Postflash1 { unknown })
                }
                SequencePosition::Second => Message::Postflash2(Postflash2 {
                    unknown: *payload_array(frame)?,
                }),
            },
            Command::AfIllumination => {
                Message::AfIllumination(AfIllumination::from_bytes(payload_array(frame)?, a))
            }
            Command::RedEyeReduction => {
                Message::RedEyeReduction(RedEyeReduction::from_bytes(payload_array(frame)?, a))
            }
            Command::ModellingLight => {
                Message::ModellingLight(ModellingLight::from_bytes(payload_array(frame)?, a))
            }
            Command::Preflash1 => Message::Preflash1(Preflash::from_bytes(
                Command::Preflash1,
                payload_array(frame)?,
                a,
            )),
            Command::Preflash2 => Message::Preflash2(Preflash::from_bytes(
                Command::Preflash2,
                payload_array(frame)?,
                a,
            )),
        };

        Ok(Decoded { message, anomalies })
    }

    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let command = self.command();
        match self {
            Message::Init0(m) => Frame::new(command, &m.unknown),
            Message::Init1(m) => Frame::new(command, &m.unknown),
            Message::Init2(m) => Frame::new(command, &m.unknown),
            Message::FlashSetting(m) => Frame::new(command, &m.to_bytes()),
            Message::CamSetting(m) => Frame::new(command, &m.to_bytes()),
            Message::Postflash1(m) => Frame::new(command, &[m.unknown]),
            Message::Postflash2(m) => Frame::new(command, &m.unknown),
            Message::AfIllumination(m) => Frame::new(command, &m.to_bytes()),
            Message::RedEyeReduction(m) => Frame::new(command, &m.to_bytes()),
            Message::ModellingLight(m) => Frame::new(command, &m.to_bytes()),
            Message::Preflash1(m) | Message::Preflash2(m) => Frame::new(command, &m.to_bytes()),
        }
    }
}
