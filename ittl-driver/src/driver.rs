//! Driver facade
//!
//! Combines the handshake with the frame parser and message catalog. In
//! passive mode the driver only observes; in active mode it stands in for
//! the camera or the flash and may send the commands that endpoint owns.

use ittl_hal::{BusClock, BusLines};
use ittl_protocol::messages::{AfIllumination, FlashSetting, ModellingLight, RedEyeReduction};
use ittl_protocol::{Command, Decoded, Frame, FrameError, FrameParser, Message};

use crate::config::{DriverConfig, Mode};
use crate::error::BusError;
use crate::handshake::{Handshake, Role, TransferState};
use crate::session::BusSession;

/// Hotshoe bus driver
pub struct Driver<B> {
    handshake: Handshake<B>,
    parser: FrameParser,
    mode: Mode,
    session: Option<BusSession>,
}

impl<B> Driver<B> {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Handshake state of the byte in flight
    pub fn transfer_state(&self) -> TransferState {
        self.handshake.state()
    }

    /// The current session, or the last finished one
    pub fn last_session(&self) -> Option<&BusSession> {
        self.session.as_ref()
    }

    pub fn bus(&self) -> &B {
        self.handshake.bus()
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.handshake.into_inner()
    }
}

impl<B: BusLines + BusClock> Driver<B> {
    /// Create a driver, releasing every line
    pub fn new(bus: B, config: DriverConfig) -> Result<Self, BusError> {
        config.validate()?;
        debug!("hotshoe driver up in {} mode", config.mode);
        Ok(Self {
            handshake: Handshake::new(bus, config.timing),
            parser: FrameParser::new(),
            mode: config.mode,
            session: None,
        })
    }

    /// Observe the next frame without driving any line and decode it
    ///
    /// Protocol anomalies do not fail the call; they travel in the
    /// returned [`Decoded`] and are logged.
    pub fn listen(&mut self, timeout_us: u32) -> Result<Decoded, BusError> {
        let frame = self.listen_raw(timeout_us)?;
        self.decode(&frame)
    }

    /// Observe the next frame and return it undecoded
    pub fn listen_raw(&mut self, timeout_us: u32) -> Result<Frame, BusError> {
        self.read_frame(Role::Observer, timeout_us)
    }

    /// Receive a frame addressed to this endpoint, acknowledging each byte
    pub fn receive(&mut self, expected: Command, timeout_us: u32) -> Result<Decoded, BusError> {
        match self.mode {
            Mode::Active(endpoint) if expected.sender() == endpoint.peer() => {}
            _ => return Err(BusError::RoleMismatch(expected)),
        }

        let frame = self.read_frame(Role::Receiver, timeout_us)?;
        if frame.command != expected {
            return Err(BusError::UnexpectedCommand {
                expected,
                received: frame.command,
            });
        }
        self.decode(&frame)
    }

    /// Send a message this endpoint owns
    pub fn send(&mut self, message: &Message) -> Result<(), BusError> {
        let frame = message.to_frame()?;
        self.send_frame(&frame)
    }

    /// Send a raw frame
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), BusError> {
        match self.mode {
            Mode::Active(endpoint) if frame.command.sender() == endpoint => {}
            _ => return Err(BusError::RoleMismatch(frame.command)),
        }
        let bytes = frame.encode_to_vec()?;
        let result = self.write_bytes(&bytes);
        self.finish_session(result.err());
        result
    }

    pub fn set_red_eye_reduction(&mut self, enable: bool) -> Result<(), BusError> {
        self.send(&Message::RedEyeReduction(RedEyeReduction { enable }))
    }

    pub fn set_af_illumination(&mut self, enable: bool) -> Result<(), BusError> {
        self.send(&Message::AfIllumination(AfIllumination { enable }))
    }

    /// Ask the flash for a modelling-light burst
    pub fn trigger_modelling_light(&mut self) -> Result<(), BusError> {
        self.send(&Message::ModellingLight(ModellingLight { enable: true }))
    }

    /// Wait for the flash to report its settings
    pub fn read_flash_setting(&mut self, timeout_us: u32) -> Result<FlashSetting, BusError> {
        match self.receive(Command::FlashSetting, timeout_us)?.message {
            Message::FlashSetting(setting) => Ok(setting),
            other => Err(BusError::UnexpectedCommand {
                expected: Command::FlashSetting,
                received: other.command(),
            }),
        }
    }

    fn read_frame(&mut self, role: Role, timeout_us: u32) -> Result<Frame, BusError> {
        let result = self.read_bytes(role, timeout_us);
        self.finish_session(result.as_ref().err().copied());
        result
    }

    fn read_bytes(&mut self, role: Role, timeout_us: u32) -> Result<Frame, BusError> {
        self.handshake.start_transfer(role, timeout_us)?;
        self.open_session(role);
        self.parser.reset();

        loop {
            let byte = self.handshake.receive_byte()?;
            self.record_byte(byte);

            match self.parser.feed(byte) {
                Ok(None) => {}
                Ok(Some(frame)) => {
                    self.handshake.end_transfer()?;
                    return Ok(frame);
                }
                Err(FrameError::UnknownCommand(code)) => {
                    warn!("unknown command {:#x}, draining frame", code);
                    if let Err(err) = self.handshake.drain() {
                        warn!("drain failed: {}", err);
                    }
                    return Err(BusError::UnknownCommand(code));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.handshake.start_transfer(Role::Sender, 0)?;
        self.open_session(Role::Sender);

        for &byte in bytes {
            self.handshake.send_byte(byte)?;
            self.record_byte(byte);
        }
        self.handshake.end_transfer()
    }

    fn open_session(&mut self, role: Role) {
        self.session = Some(BusSession::new(role, self.handshake.bus().now_us()));
    }

    fn record_byte(&mut self, byte: u8) {
        let now = self.handshake.bus().now_us();
        if let Some(session) = self.session.as_mut() {
            session.record_byte(byte, now);
        }
    }

    /// Close the active session; on error every line this side drives is released
    fn finish_session(&mut self, error: Option<BusError>) {
        if let Some(err) = error {
            debug!("transfer failed: {}", err);
            self.handshake.abort();
        }
        let now = self.handshake.bus().now_us();
        if let Some(session) = self.session.as_mut().filter(|s| s.is_active()) {
            session.finish(now, error);
        }
    }

    fn decode(&self, frame: &Frame) -> Result<Decoded, BusError> {
        let decoded = Message::from_frame(frame)?;
        debug!("decoded {}", frame.command);
        for anomaly in decoded.anomalies.iter() {
            warn!(
                "{} {} at byte {}: expected {:#x} (mask {:#x}), got {:#x}",
                anomaly.command,
                anomaly.kind,
                anomaly.offset,
                anomaly.expected,
                anomaly.mask,
                anomaly.observed
            );
        }
        if decoded.anomalies.dropped() > 0 {
            warn!("{} further anomalies not recorded", decoded.anomalies.dropped());
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferStage;
    use crate::sim::{SimBus, BYTE_US, SETUP_US};
    use ittl_hal::Line;
    use ittl_protocol::messages::{FlashMode, Postflash1, Postflash2, Preflash};
    use ittl_protocol::units::FlashPower;
    use ittl_protocol::{compute_checksum, AnomalyKind, Endpoint};

    fn wire(bytes: &[u8]) -> heapless::Vec<u8, 64> {
        let mut out = heapless::Vec::from_slice(bytes).unwrap();
        out.push(compute_checksum(bytes[0], &bytes[1..])).unwrap();
        out
    }

    fn passive(bus: SimBus) -> Driver<SimBus> {
        Driver::new(bus, DriverConfig::passive()).unwrap()
    }

    fn active(bus: SimBus, endpoint: Endpoint) -> Driver<SimBus> {
        Driver::new(bus, DriverConfig::active(endpoint)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_timing() {
        let mut config = DriverConfig::passive();
        config.timing.poll_interval_us = 0;
        assert!(matches!(
            Driver::new(SimBus::new(), config),
            Err(BusError::Config(_))
        ));
    }

    #[test]
    fn test_listen_times_out_without_traffic() {
        let mut driver = passive(SimBus::new());
        assert_eq!(
            driver.listen(2_000),
            Err(BusError::Timeout(TransferStage::Start))
        );
        assert_eq!(driver.bus().now(), 2_000);
        assert!(driver.last_session().is_none());
    }

    #[test]
    fn test_listen_decodes_af_illumination() {
        let mut bus = SimBus::new();
        bus.transmit_at(50, &wire(&[0xD0, 0x01, 0x00]));
        let mut driver = passive(bus);

        let decoded = driver.listen(1_000).unwrap();
        assert_eq!(
            decoded.message,
            Message::AfIllumination(AfIllumination { enable: true })
        );
        assert!(decoded.anomalies.is_empty());

        let session = driver.last_session().unwrap();
        assert!(!session.is_active());
        assert_eq!(session.role(), Role::Observer);
        assert_eq!(session.bytes(), 4);
        assert_eq!(session.command(), Some(Command::AfIllumination));
        assert_eq!(driver.transfer_state(), TransferState::Idle);
    }

    #[test]
    fn test_listen_never_drives_lines() {
        let mut bus = SimBus::new();
        bus.transmit_at(50, &wire(&[0xD5, 0xD5]));
        let mut driver = passive(bus);

        driver.listen(1_000).unwrap();
        assert_eq!(driver.bus().driver_acks, 0);
        assert_eq!(driver.bus().sync_pulls, 0);
    }

    #[test]
    fn test_listen_decodes_flash_setting() {
        let setting = FlashSetting::new(FlashMode::Ttl, FlashPower(12), 0x10);
        let frame = Message::FlashSetting(setting).to_frame().unwrap();
        let mut bus = SimBus::new();
        bus.transmit_at(50, &frame.encode_to_vec().unwrap());
        let mut driver = passive(bus);

        let decoded = driver.listen(1_000).unwrap();
        assert_eq!(decoded.message, Message::FlashSetting(setting));
        assert!(decoded.anomalies.is_empty());
    }

    #[test]
    fn test_listen_reports_anomalies_with_message() {
        let mut bus = SimBus::new();
        bus.transmit_at(50, &wire(&[0xD0, 0x01, 0x02]));
        let mut driver = passive(bus);

        let decoded = driver.listen(1_000).unwrap();
        assert_eq!(
            decoded.message,
            Message::AfIllumination(AfIllumination { enable: true })
        );
        assert_eq!(decoded.anomalies.len(), 1);
        assert_eq!(
            decoded.anomalies.iter().next().unwrap().kind,
            AnomalyKind::ConstantByte
        );
    }

    #[test]
    fn test_checksum_mismatch_then_resync() {
        let mut bus = SimBus::new();
        let end = bus.transmit_at(50, &[0xD7, 0x09, 0x00]);
        bus.transmit_at(end + 100, &wire(&[0xD8, 0x18]));
        let mut driver = passive(bus);

        assert_eq!(
            driver.listen(1_000),
            Err(BusError::ChecksumMismatch {
                command: Command::Preflash1,
                expected: 0xE0,
                received: 0x00,
            })
        );
        assert_eq!(
            driver.last_session().unwrap().error(),
            Some(BusError::ChecksumMismatch {
                command: Command::Preflash1,
                expected: 0xE0,
                received: 0x00,
            })
        );

        let decoded = driver.listen(1_000).unwrap();
        assert_eq!(decoded.message, Message::Preflash2(Preflash { power: 24 }));
    }

    #[test]
    fn test_unknown_command_is_drained() {
        let mut bus = SimBus::new();
        let end = bus.transmit_at(50, &[0xD3, 0x10, 0xE3]);
        bus.transmit_at(end + 100, &wire(&[0xD5, 0xD5]));
        let mut driver = passive(bus);

        assert_eq!(driver.listen(1_000), Err(BusError::UnknownCommand(0xD3)));
        assert_eq!(driver.bus().now(), end);

        let decoded = driver.listen(1_000).unwrap();
        assert_eq!(
            decoded.message,
            Message::ModellingLight(ModellingLight { enable: true })
        );
    }

    #[test]
    fn test_truncated_frame_times_out() {
        let mut bus = SimBus::new();
        bus.transmit_at(50, &[0xD0, 0x01]);
        let mut driver = passive(bus);

        assert_eq!(
            driver.listen(1_000),
            Err(BusError::Timeout(TransferStage::Bit))
        );
        assert_eq!(
            driver.last_session().unwrap().error(),
            Some(BusError::Timeout(TransferStage::Bit))
        );
    }

    #[test]
    fn test_postflash_sequence() {
        let mut bus = SimBus::new();
        let first = bus.transmit_at(50, &wire(&[0xC0, 0x07]));
        let second = bus.transmit_at(first + 100, &wire(&[0xC0, 0x01, 0x02]));
        bus.transmit_at(second + 100, &wire(&[0xC0, 0x03]));
        let mut driver = passive(bus);

        assert_eq!(
            driver.listen(1_000).unwrap().message,
            Message::Postflash1(Postflash1 { unknown: 0x07 })
        );
        assert_eq!(
            driver.listen(1_000).unwrap().message,
            Message::Postflash2(Postflash2 {
                unknown: [0x01, 0x02]
            })
        );
        assert_eq!(
            driver.listen(1_000).unwrap().message,
            Message::Postflash1(Postflash1 { unknown: 0x03 })
        );
    }

    #[test]
    fn test_listen_raw_returns_frame() {
        let mut bus = SimBus::new();
        bus.transmit_at(50, &wire(&[0xD1, 0x80]));
        let mut driver = passive(bus);

        let frame = driver.listen_raw(1_000).unwrap();
        assert_eq!(frame.command, Command::RedEyeReduction);
        assert_eq!(frame.payload.as_slice(), &[0x80]);
        assert_eq!(frame.checksum(), 0x51);
    }

    #[test]
    fn test_send_red_eye_reduction() {
        let mut bus = SimBus::new();
        bus.attach_receiver(true);
        let mut driver = active(bus, Endpoint::Camera);

        driver.set_red_eye_reduction(true).unwrap();
        assert_eq!(driver.bus().captured.as_slice(), &[0xD1, 0x80, 0x51]);
        for line in Line::ALL {
            assert!(driver.bus().driven(line).is_high());
        }

        let session = driver.last_session().unwrap();
        assert_eq!(session.role(), Role::Sender);
        assert_eq!(session.bytes(), 3);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_send_convenience_frames() {
        let mut bus = SimBus::new();
        bus.attach_receiver(true);
        let mut driver = active(bus, Endpoint::Camera);

        driver.trigger_modelling_light().unwrap();
        driver.set_af_illumination(false).unwrap();
        assert_eq!(
            driver.bus().captured.as_slice(),
            &[0xD5, 0xD5, 0xAA, 0xD0, 0x00, 0x00, 0xD0]
        );
    }

    #[test]
    fn test_send_without_ack_releases_bus() {
        let mut bus = SimBus::new();
        bus.attach_receiver(false);
        let mut driver = active(bus, Endpoint::Camera);

        assert_eq!(driver.trigger_modelling_light(), Err(BusError::NoAck));
        for line in Line::ALL {
            assert!(driver.bus().driven(line).is_high());
        }
        let session = driver.last_session().unwrap();
        assert!(!session.is_active());
        assert_eq!(session.bytes(), 0);
        assert_eq!(session.error(), Some(BusError::NoAck));
    }

    #[test]
    fn test_send_refused_while_bus_busy() {
        let mut bus = SimBus::new();
        bus.transmit_at(0, &wire(&[0xA0; 18]));
        bus.attach_receiver(true);
        let mut driver = active(bus, Endpoint::Camera);

        assert_eq!(driver.set_red_eye_reduction(true), Err(BusError::Busy));
        assert_eq!(driver.bus().sync_pulls, 0);
        assert!(driver.bus().captured.is_empty());
    }

    #[test]
    fn test_send_rejects_foreign_command() {
        let mut bus = SimBus::new();
        bus.attach_receiver(true);
        let mut flash = active(bus, Endpoint::Flash);
        assert_eq!(
            flash.set_red_eye_reduction(true),
            Err(BusError::RoleMismatch(Command::RedEyeReduction))
        );

        let mut observer = passive(SimBus::new());
        assert_eq!(
            observer.trigger_modelling_light(),
            Err(BusError::RoleMismatch(Command::ModellingLight))
        );
        assert_eq!(observer.bus().sync_pulls, 0);
    }

    #[test]
    fn test_receive_flash_setting_as_camera() {
        let setting = FlashSetting::new(FlashMode::Manual, FlashPower(6), 0x22);
        let frame = Message::FlashSetting(setting).to_frame().unwrap();
        let mut bus = SimBus::new();
        bus.transmit_unacked_at(50, &frame.encode_to_vec().unwrap());
        let mut driver = active(bus, Endpoint::Camera);

        assert_eq!(driver.read_flash_setting(1_000), Ok(setting));
        // Command, 17 payload bytes and checksum
        assert_eq!(driver.bus().driver_acks, 19);
        assert!(driver.bus().driven(Line::Ack).is_high());
    }

    #[test]
    fn test_receive_unexpected_command() {
        let mut bus = SimBus::new();
        bus.transmit_unacked_at(50, &wire(&[0xC0, 0x01]));
        let mut driver = active(bus, Endpoint::Camera);

        assert_eq!(
            driver.receive(Command::FlashSetting, 1_000),
            Err(BusError::UnexpectedCommand {
                expected: Command::FlashSetting,
                received: Command::Postflash,
            })
        );
    }

    #[test]
    fn test_receive_drains_unknown_command_and_resyncs() {
        let setting = FlashSetting::new(FlashMode::Ttl, FlashPower(0), 0x10);
        let frame = Message::FlashSetting(setting).to_frame().unwrap();
        let mut bus = SimBus::new();
        bus.transmit_unacked_at(50, &[0xD3, 0x10, 0xE3]);
        // The unknown code is acked, the next byte is not, so the peer gives up
        let abandoned = 50 + SETUP_US + 2 * BYTE_US;
        bus.transmit_unacked_at(abandoned + 100, &frame.encode_to_vec().unwrap());
        let mut driver = active(bus, Endpoint::Camera);

        assert_eq!(
            driver.receive(Command::FlashSetting, 1_000),
            Err(BusError::UnknownCommand(0xD3))
        );
        assert_eq!(driver.bus().now(), abandoned);
        assert_eq!(driver.bus().driver_acks, 1);
        assert!(driver.bus().driven(Line::Ack).is_high());
        assert_eq!(
            driver.last_session().unwrap().error(),
            Some(BusError::UnknownCommand(0xD3))
        );

        assert_eq!(driver.read_flash_setting(1_000), Ok(setting));
        assert_eq!(driver.bus().driver_acks, 1 + 19);
    }

    #[test]
    fn test_receive_rejects_own_command() {
        let mut driver = active(SimBus::new(), Endpoint::Camera);
        assert_eq!(
            driver.receive(Command::CamSetting, 1_000),
            Err(BusError::RoleMismatch(Command::CamSetting))
        );
        assert_eq!(driver.bus().now(), 0);
    }
}
