//! Frame encoding and decoding for the iTTL hotshoe bus.
//!
//! Frame format:
//! - COMMAND (1 byte): command code, see [`crate::command`]
//! - PAYLOAD (fixed per command): there is no length byte on the wire
//! - CHECKSUM (1 byte): computed over COMMAND and all PAYLOAD bytes

use heapless::Vec;

use crate::command::{Command, SequencePosition, MAX_PAYLOAD_SIZE};

/// Maximum complete frame size (COMMAND + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = 1 + MAX_PAYLOAD_SIZE + 1;

/// Frame checksum
///
/// 8-bit wrapping sum of the command byte and the payload. The exact bus
/// algorithm has not been confirmed against hardware captures; every
/// checksum in the crate goes through this one function.
pub fn compute_checksum(command: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(command, |sum, &byte| sum.wrapping_add(byte))
}

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Command byte is not in the catalog
    UnknownCommand(u8),
    /// Checksum byte disagrees with the received command and payload
    ChecksumMismatch {
        command: Command,
        expected: u8,
        received: u8,
    },
    /// Payload length does not match the catalog entry
    InvalidLength { command: Command, len: u8 },
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
///
/// The checksum is not stored: it is always derived from the command and
/// payload, so a `Frame` value is valid by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command identifier
    pub command: Command,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame, checking the payload length against the catalog
    pub fn new(command: Command, payload: &[u8]) -> Result<Self, FrameError> {
        if !command.payload_length().accepts(payload.len()) {
            return Err(FrameError::InvalidLength {
                command,
                len: payload.len().min(u8::MAX as usize) as u8,
            });
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::BufferTooSmall)?;

        Ok(Self {
            command,
            payload: payload_vec,
        })
    }

    /// Checksum byte that goes on the wire after the payload
    pub fn checksum(&self) -> u8 {
        compute_checksum(self.command.code(), &self.payload)
    }

    /// Sequence position implied by the payload length
    pub fn position(&self) -> SequencePosition {
        let length = self.command.payload_length();
        if length.is_ambiguous() && self.payload.len() == length.resolve(SequencePosition::Second)
        {
            SequencePosition::Second
        } else {
            SequencePosition::First
        }
    }

    /// Number of bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        self.payload.len() + 2
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.wire_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = self.command.code();
        buffer[1..1 + self.payload.len()].copy_from_slice(&self.payload);
        buffer[frame_len - 1] = self.checksum();

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Decode one complete frame from a buffer
    ///
    /// The buffer must hold exactly one frame. For commands with a
    /// sequence-dependent length the buffer length selects the variant.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let (&code, rest) = bytes.split_first().ok_or(FrameError::Incomplete)?;
        let command = Command::from_byte(code).ok_or(FrameError::UnknownCommand(code))?;
        let (&received, payload) = rest.split_last().ok_or(FrameError::Incomplete)?;

        let frame = Frame::new(command, payload)?;
        let expected = frame.checksum();
        if received != expected {
            return Err(FrameError::ChecksumMismatch {
                command,
                expected,
                received,
            });
        }
        Ok(frame)
    }
}

/// State machine for parsing incoming frames byte by byte
///
/// Payload lengths come from the catalog. The parser remembers the last
/// completed frame so that the two Postflash variants sharing code 0xC0
/// can be told apart by position.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: usize,
    command: Option<Command>,
    previous: Option<(Command, SequencePosition)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the COMMAND byte
    WaitingForCommand,
    /// Reading payload bytes
    ReadingPayload,
    /// Waiting for CHECKSUM
    WaitingForChecksum,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForCommand,
            buffer: Vec::new(),
            expected_length: 0,
            command: None,
            previous: None,
        }
    }

    /// Drop any partial frame; sequence history is kept
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForCommand;
        self.buffer.clear();
        self.expected_length = 0;
        self.command = None;
    }

    /// Forget the previous frame so the next shared-code frame is read as the first variant
    pub fn reset_sequence(&mut self) {
        self.previous = None;
    }

    /// Whether the parser is between frames
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::WaitingForCommand
    }

    /// Payload length expected for the frame in progress
    pub fn expected_length(&self) -> Option<usize> {
        self.command.map(|_| self.expected_length)
    }

    /// Sequence position the next frame of `command` would take
    pub fn position_for(&self, command: Command) -> SequencePosition {
        match self.previous {
            Some((previous, SequencePosition::First))
                if previous == command && command.payload_length().is_ambiguous() =>
            {
                SequencePosition::Second
            }
            _ => SequencePosition::First,
        }
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForCommand => {
                let Some(command) = Command::from_byte(byte) else {
                    self.previous = None;
                    return Err(FrameError::UnknownCommand(byte));
                };
                let position = self.position_for(command);
                self.command = Some(command);
                self.expected_length = command.payload_length().resolve(position);
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForChecksum
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let Some(command) = self.command else {
                    self.reset();
                    return Err(FrameError::Incomplete);
                };
                let frame = Frame {
                    command,
                    payload: self.buffer.clone(),
                };
                self.previous = Some((command, frame.position()));
                self.reset();

                let expected = frame.checksum();
                if byte != expected {
                    return Err(FrameError::ChecksumMismatch {
                        command,
                        expected,
                        received: byte,
                    });
                }
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CATALOG;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_is_wrapping_sum() {
        assert_eq!(compute_checksum(0xD0, &[0x01, 0x00]), 0xD1);
        assert_eq!(compute_checksum(0xFF, &[0x02]), 0x01);
    }

    #[test]
    fn test_frame_encode_af_illumination() {
        let frame = Frame::new(Command::AfIllumination, &[0x01, 0x00]).unwrap();
        let mut buffer = [0u8; 8];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 4);
        assert_eq!(&buffer[..4], &[0xD0, 0x01, 0x00, 0xD1]);
    }

    #[test]
    fn test_frame_rejects_wrong_length() {
        let result = Frame::new(Command::CamSetting, &[0u8; 13]);
        assert_eq!(
            result,
            Err(FrameError::InvalidLength {
                command: Command::CamSetting,
                len: 13
            })
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::new(Command::Init1, &[0u8; 9]).unwrap();
        let mut buffer = [0u8; 10];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_decode_unknown_command() {
        assert_eq!(
            Frame::decode(&[0xD3, 0x00, 0xD3]),
            Err(FrameError::UnknownCommand(0xD3))
        );
    }

    #[test]
    fn test_decode_empty_and_truncated() {
        assert_eq!(Frame::decode(&[]), Err(FrameError::Incomplete));
        assert_eq!(Frame::decode(&[0xD5]), Err(FrameError::Incomplete));
    }

    #[test]
    fn test_decode_postflash_variants_by_length() {
        let first = Frame::new(Command::Postflash, &[0x10]).unwrap();
        let second = Frame::new(Command::Postflash, &[0x20, 0x30]).unwrap();

        let decoded = Frame::decode(&first.encode_to_vec().unwrap()).unwrap();
        assert_eq!(decoded.position(), SequencePosition::First);

        let decoded = Frame::decode(&second.encode_to_vec().unwrap()).unwrap();
        assert_eq!(decoded.position(), SequencePosition::Second);
        assert_eq!(&decoded.payload[..], &[0x20, 0x30]);
    }

    #[test]
    fn test_parser_roundtrip() {
        let original = Frame::new(Command::CamSetting, &[7u8; 14]).unwrap();
        let encoded = original.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&encoded).unwrap().unwrap();

        assert_eq!(parsed, original);
        assert!(parser.is_idle());
    }

    #[test]
    fn test_parser_invalid_checksum() {
        let frame = Frame::new(Command::ModellingLight, &[0xD5]).unwrap();
        let mut encoded = frame.encode_to_vec().unwrap();
        let last_idx = encoded.len() - 1;
        encoded[last_idx] ^= 0xFF;

        let mut parser = FrameParser::new();
        let result = parser.feed_bytes(&encoded);
        assert!(matches!(
            result,
            Err(FrameError::ChecksumMismatch {
                command: Command::ModellingLight,
                ..
            })
        ));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_parser_unknown_command_stays_idle() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed(0x42), Err(FrameError::UnknownCommand(0x42)));
        assert!(parser.is_idle());

        // A valid frame right after is still parsed
        let frame = Frame::new(Command::RedEyeReduction, &[0x80]).unwrap();
        let parsed = parser.feed_bytes(&frame.encode_to_vec().unwrap()).unwrap();
        assert_eq!(parsed, Some(frame));
    }

    #[test]
    fn test_parser_reports_expected_length() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.expected_length(), None);
        parser.feed(0xB0).unwrap();
        assert_eq!(parser.expected_length(), Some(14));
    }

    #[test]
    fn test_parser_postflash_sequence() {
        let first = Frame::new(Command::Postflash, &[0x01]).unwrap();
        let second = Frame::new(Command::Postflash, &[0x02, 0x03]).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser
            .feed_bytes(&first.encode_to_vec().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(parsed.position(), SequencePosition::First);
        assert_eq!(parser.position_for(Command::Postflash), SequencePosition::Second);

        let parsed = parser
            .feed_bytes(&second.encode_to_vec().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(parsed, second);

        // After the second variant the sequence starts over
        assert_eq!(parser.position_for(Command::Postflash), SequencePosition::First);
    }

    #[test]
    fn test_parser_sequence_broken_by_other_frame() {
        let first = Frame::new(Command::Postflash, &[0x01]).unwrap();
        let other = Frame::new(Command::Preflash1, &[0x05]).unwrap();

        let mut parser = FrameParser::new();
        parser.feed_bytes(&first.encode_to_vec().unwrap()).unwrap();
        parser.feed_bytes(&other.encode_to_vec().unwrap()).unwrap();
        assert_eq!(parser.position_for(Command::Postflash), SequencePosition::First);

        parser.feed_bytes(&first.encode_to_vec().unwrap()).unwrap();
        parser.reset_sequence();
        assert_eq!(parser.position_for(Command::Postflash), SequencePosition::First);
    }

    fn catalog_frame() -> impl Strategy<Value = Frame> {
        (0..CATALOG.len(), any::<bool>(), prop::collection::vec(any::<u8>(), MAX_PAYLOAD_SIZE))
            .prop_map(|(row, second, bytes)| {
                let command = CATALOG[row].command;
                let position = if second {
                    SequencePosition::Second
                } else {
                    SequencePosition::First
                };
                let len = command.payload_length().resolve(position);
                Frame::new(command, &bytes[..len]).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(frame in catalog_frame()) {
            let encoded = frame.encode_to_vec().unwrap();
            prop_assert_eq!(encoded.len(), frame.wire_len());
            prop_assert_eq!(Frame::decode(&encoded), Ok(frame));
        }

        #[test]
        fn prop_corrupt_checksum_is_rejected(frame in catalog_frame(), flip in 1u8..=255) {
            let mut encoded = frame.encode_to_vec().unwrap();
            let last = encoded.len() - 1;
            encoded[last] ^= flip;
            let result = Frame::decode(&encoded);
            let is_mismatch = matches!(result, Err(FrameError::ChecksumMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }
}
