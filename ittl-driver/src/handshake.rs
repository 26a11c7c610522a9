//! Transfer handshake
//!
//! Moves single bytes across the hotshoe. A transfer opens with a start
//! condition (Sync falling), carries bytes MSB first (Data valid on the
//! rising edge of Clock), and each byte is closed by the receiver pulsing
//! Ack low. Every wait is bounded by a [`TimingConfig`] value.
//!
//! ```text
//! Idle -> StartDetected -> BitTransfer(0..7) -> ByteAcknowledge -> Idle
//!               \______________ any bounded wait expires ______/-> TimedOut
//! ```

use ittl_hal::{BusClock, BusLines, Level, Line};

use crate::config::TimingConfig;
use crate::error::{BusError, TransferStage};

/// Part this side plays in a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Drives Sync, Clock and Data
    Sender,
    /// Samples Data and drives Ack
    Receiver,
    /// Samples every line and drives nothing
    Observer,
}

/// Handshake state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No byte in flight
    Idle,
    /// Start condition seen or asserted, first bit not yet clocked
    StartDetected,
    /// Clocking bit `n` of the current byte (0 is the MSB)
    BitTransfer(u8),
    /// All eight bits done, Ack phase in progress
    ByteAcknowledge,
    /// A bounded wait expired; cleared by the next start
    TimedOut,
}

/// Byte-level handshake over a set of bus lines
pub struct Handshake<B> {
    bus: B,
    timing: TimingConfig,
    state: TransferState,
    role: Option<Role>,
}

impl<B> Handshake<B> {
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Role of the open transfer, if any
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: BusLines + BusClock> Handshake<B> {
    /// Take over the bus lines, releasing all of them
    pub fn new(mut bus: B, timing: TimingConfig) -> Self {
        bus.release_all();
        Self {
            bus,
            timing,
            state: TransferState::Idle,
            role: None,
        }
    }

    /// Open a transfer
    ///
    /// As sender: fails with [`BusError::Busy`] if Sync is already low,
    /// otherwise pulls Sync low. As receiver or observer: waits up to
    /// `timeout_us` for Sync to go high and then fall.
    pub fn start_transfer(&mut self, role: Role, timeout_us: u32) -> Result<(), BusError> {
        if self.role.is_some() {
            return Err(BusError::InvalidState);
        }

        match role {
            Role::Sender => {
                if self.bus.read(Line::Sync).is_low() {
                    return Err(BusError::Busy);
                }
                self.bus.drive(Line::Sync, Level::Low);
                self.bus.delay_us(self.timing.start_setup_us);
            }
            Role::Receiver | Role::Observer => {
                let deadline = self.deadline(timeout_us);
                self.wait_until(Line::Sync, Level::High, deadline, TransferStage::Start)?;
                self.wait_until(Line::Sync, Level::Low, deadline, TransferStage::Start)?;
            }
        }

        trace!("start condition as {}", role);
        self.role = Some(role);
        self.state = TransferState::StartDetected;
        Ok(())
    }

    /// Clock one byte out and wait for the receiver's acknowledgement
    pub fn send_byte(&mut self, value: u8) -> Result<(), BusError> {
        if self.role != Some(Role::Sender) {
            return Err(BusError::InvalidState);
        }

        let half = self.timing.clock_half_period_us;
        for bit in 0..8u8 {
            self.state = TransferState::BitTransfer(bit);
            self.bus
                .drive(Line::Data, Level::from(value & (0x80 >> bit) != 0));
            self.bus.drive(Line::Clock, Level::Low);
            self.bus.delay_us(half);
            self.bus.drive(Line::Clock, Level::High);
            // The receiver may ack on the last rising edge
            if bit < 7 {
                self.bus.delay_us(half);
            }
        }
        self.bus.release(Line::Data);

        self.state = TransferState::ByteAcknowledge;
        self.wait_acknowledge()?;

        self.state = TransferState::Idle;
        Ok(())
    }

    /// Clock one byte in
    ///
    /// A receiver acknowledges the byte itself; an observer waits for the
    /// real receiver's Ack pulse instead.
    pub fn receive_byte(&mut self) -> Result<u8, BusError> {
        let role = match self.role {
            Some(role @ (Role::Receiver | Role::Observer)) => role,
            _ => return Err(BusError::InvalidState),
        };

        let timeout = self.timing.bit_timeout_us;
        let mut value = 0u8;
        for bit in 0..8u8 {
            self.state = TransferState::BitTransfer(bit);
            self.wait_for(Line::Clock, Level::Low, timeout, TransferStage::Bit)?;
            self.wait_for(Line::Clock, Level::High, timeout, TransferStage::Bit)?;
            value = (value << 1) | u8::from(self.bus.read(Line::Data).is_high());
        }

        self.state = TransferState::ByteAcknowledge;
        if role == Role::Receiver {
            self.bus.drive(Line::Ack, Level::Low);
            self.bus.delay_us(self.timing.ack_hold_us);
            self.bus.release(Line::Ack);
        } else {
            self.wait_acknowledge()?;
        }

        trace!("byte {:#x}", value);
        self.state = TransferState::Idle;
        Ok(value)
    }

    /// Close the transfer after its last byte
    ///
    /// The sender releases its lines; a receiver or observer waits for the
    /// sender to release Sync.
    pub fn end_transfer(&mut self) -> Result<(), BusError> {
        let role = self.role.take().ok_or(BusError::InvalidState)?;
        self.release_for(role);

        if role != Role::Sender {
            let timeout = self.timing.bit_timeout_us;
            self.wait_for(Line::Sync, Level::High, timeout, TransferStage::End)?;
        }
        self.state = TransferState::Idle;
        Ok(())
    }

    /// Discard the remainder of a frame by waiting for Sync to go high
    ///
    /// A receiver stops acknowledging, which makes a well-behaved sender
    /// give up early.
    pub fn drain(&mut self) -> Result<(), BusError> {
        match self.role.take() {
            Some(role @ (Role::Receiver | Role::Observer)) => self.release_for(role),
            Some(Role::Sender) | None => return Err(BusError::InvalidState),
        }

        let timeout = self.timing.drain_timeout_us;
        self.wait_for(Line::Sync, Level::High, timeout, TransferStage::Drain)?;
        self.state = TransferState::Idle;
        Ok(())
    }

    /// Tear down an open transfer after an error, releasing every line this side drives
    pub fn abort(&mut self) {
        if let Some(role) = self.role.take() {
            self.release_for(role);
        }
        if self.state != TransferState::TimedOut {
            self.state = TransferState::Idle;
        }
    }

    fn release_for(&mut self, role: Role) {
        match role {
            Role::Sender => {
                self.bus.release(Line::Data);
                self.bus.release(Line::Clock);
                self.bus.release(Line::Sync);
            }
            Role::Receiver => self.bus.release(Line::Ack),
            Role::Observer => {}
        }
    }

    /// Ack must fall within the timeout (else no one received the byte) and rise again
    fn wait_acknowledge(&mut self) -> Result<(), BusError> {
        let timeout = self.timing.ack_timeout_us;
        match self.wait_for(Line::Ack, Level::Low, timeout, TransferStage::Acknowledge) {
            Err(BusError::Timeout(_)) => return Err(BusError::NoAck),
            result => result?,
        }
        self.wait_for(Line::Ack, Level::High, timeout, TransferStage::Acknowledge)
    }

    fn deadline(&self, timeout_us: u32) -> u64 {
        self.bus.now_us().saturating_add(u64::from(timeout_us))
    }

    fn wait_for(
        &mut self,
        line: Line,
        level: Level,
        timeout_us: u32,
        stage: TransferStage,
    ) -> Result<(), BusError> {
        let deadline = self.deadline(timeout_us);
        self.wait_until(line, level, deadline, stage)
    }

    fn wait_until(
        &mut self,
        line: Line,
        level: Level,
        deadline: u64,
        stage: TransferStage,
    ) -> Result<(), BusError> {
        loop {
            if self.bus.read(line) == level {
                return Ok(());
            }
            if self.bus.now_us() >= deadline {
                self.state = TransferState::TimedOut;
                return Err(BusError::Timeout(stage));
            }
            self.bus.delay_us(self.timing.poll_interval_us);
        }
    }
}
