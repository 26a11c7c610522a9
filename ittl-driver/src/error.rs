//! Bus error types

use ittl_protocol::{Command, FrameError};

use crate::config::ConfigError;

/// Phase of a transfer in which a bounded wait expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStage {
    /// Waiting for a start condition on Sync
    Start,
    /// Waiting for a Clock edge inside a byte
    Bit,
    /// Waiting for the receiver to release Ack
    Acknowledge,
    /// Waiting for Sync to return high after the last byte
    End,
    /// Discarding the rest of an unrecognised frame
    Drain,
}

/// Errors reported by the handshake and the driver facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// A bounded wait expired
    Timeout(TransferStage),
    /// The receiver never pulled Ack low after a byte
    NoAck,
    /// Received checksum disagrees with the computed one
    ChecksumMismatch {
        command: Command,
        expected: u8,
        received: u8,
    },
    /// Command byte is not in the catalog; the frame was drained
    UnknownCommand(u8),
    /// Payload length disagrees with the catalog
    InvalidLength { command: Command, len: u8 },
    /// A frame arrived, but not the one that was asked for
    UnexpectedCommand { expected: Command, received: Command },
    /// The bus is already in use
    Busy,
    /// This endpoint is not the sender (or receiver) of the command
    RoleMismatch(Command),
    /// Handshake operation called outside of a matching transfer
    InvalidState,
    /// Driver configuration rejected
    Config(ConfigError),
}

impl BusError {
    /// Whether repeating the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BusError::Timeout(_)
                | BusError::NoAck
                | BusError::ChecksumMismatch { .. }
                | BusError::Busy
                | BusError::UnexpectedCommand { .. }
        )
    }
}

impl From<FrameError> for BusError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::UnknownCommand(code) => BusError::UnknownCommand(code),
            FrameError::ChecksumMismatch {
                command,
                expected,
                received,
            } => BusError::ChecksumMismatch {
                command,
                expected,
                received,
            },
            FrameError::InvalidLength { command, len } => BusError::InvalidLength { command, len },
            // Only reachable through a frame that outgrew its buffer
            FrameError::Incomplete | FrameError::BufferTooSmall => BusError::InvalidState,
        }
    }
}

impl From<ConfigError> for BusError {
    fn from(err: ConfigError) -> Self {
        BusError::Config(err)
    }
}
