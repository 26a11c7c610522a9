//! Virtual-time hotshoe bus for host tests
//!
//! Lines are wired-AND: a line reads low when either the driver or the
//! simulated peer pulls it low. Time only moves forward through
//! `delay_us`, so every bounded wait in the handshake terminates.
//!
//! Peer transmissions follow a fixed timeline relative to their start:
//!
//! ```text
//! Sync   ‾‾|______________________________________________|‾‾
//!          | setup | bit0 | bit1 | .. | bit7 | ack window | .. next byte
//! Clock  ‾‾‾‾‾‾‾‾‾‾‾|__|‾‾‾|__|‾‾ .. ‾|__|‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//! Ack    ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾ .. ‾‾‾‾‾‾‾‾‾|____|‾‾‾‾
//! ```
//!
//! A frame nobody acknowledges is abandoned by the peer: when no Ack pulse
//! from the driver falls inside a byte's ack window, Sync is released at
//! the end of that byte.

use heapless::Vec;
use ittl_hal::{BusClock, BusLines, Level, Line};

pub const SETUP_US: u64 = 20;
pub const BIT_US: u64 = 20;
pub const BYTE_US: u64 = 8 * BIT_US + 40;
const CLOCK_LOW: core::ops::Range<u64> = 5..15;
const PEER_ACK: core::ops::Range<u64> = 165..185;
const END_PAD_US: u64 = 10;
/// Earliest ack from the driver that still counts for a byte
const DRIVER_ACK_FROM: u64 = 8 * BIT_US - 10;

/// A frame clocked out by the simulated peer
struct Transmission {
    start: u64,
    bytes: Vec<u8, 64>,
    /// Whether a third party acknowledges each byte
    acked: bool,
}

impl Transmission {
    fn end(&self) -> u64 {
        self.start + SETUP_US + self.bytes.len() as u64 * BYTE_US + END_PAD_US
    }

    /// End time once the driver's own acknowledgements are taken into account
    fn end_given(&self, driver_acks: &[u64]) -> u64 {
        if !self.acked {
            for index in 0..self.bytes.len() as u64 {
                let byte_start = self.start + SETUP_US + index * BYTE_US;
                let window = byte_start + DRIVER_ACK_FROM..byte_start + BYTE_US;
                if !driver_acks.iter().any(|t| window.contains(t)) {
                    return window.end;
                }
            }
        }
        self.end()
    }

    fn level(&self, line: Line, t: u64, driver_acks: &[u64]) -> Level {
        if t < self.start || t >= self.end_given(driver_acks) {
            return Level::High;
        }
        if line == Line::Sync {
            return Level::Low;
        }

        let rel = t - self.start;
        if rel < SETUP_US {
            return Level::High;
        }
        let offset = rel - SETUP_US;
        let Some(&byte) = self.bytes.get((offset / BYTE_US) as usize) else {
            return Level::High;
        };
        let phase = offset % BYTE_US;

        if phase < 8 * BIT_US {
            let bit = (phase / BIT_US) as u32;
            match line {
                Line::Data => Level::from(byte & (0x80 >> bit) != 0),
                Line::Clock => Level::from(!CLOCK_LOW.contains(&(phase % BIT_US))),
                _ => Level::High,
            }
        } else if line == Line::Ack && self.acked && PEER_ACK.contains(&phase) {
            Level::Low
        } else {
            Level::High
        }
    }
}

/// Simulated receiver for frames the driver sends
struct PeerReceiver {
    acks: bool,
    shift: u8,
    bits: u8,
    ack_window: core::ops::Range<u64>,
}

pub struct SimBus {
    now: u64,
    driven: [Level; 4],
    transmissions: Vec<Transmission, 8>,
    receiver: Option<PeerReceiver>,
    /// Bytes the peer receiver clocked in, across all frames
    pub captured: Vec<u8, 128>,
    /// Times the driver pulled Ack low
    pub driver_acks: usize,
    ack_times: Vec<u64, 256>,
    /// Times the driver pulled Sync low
    pub sync_pulls: usize,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            now: 0,
            driven: [Level::High; 4],
            transmissions: Vec::new(),
            receiver: None,
            captured: Vec::new(),
            driver_acks: 0,
            ack_times: Vec::new(),
            sync_pulls: 0,
        }
    }

    /// Schedule a peer frame that a third party acknowledges; returns its end time
    pub fn transmit_at(&mut self, start: u64, bytes: &[u8]) -> u64 {
        self.schedule(start, bytes, true)
    }

    /// Schedule a peer frame with no third-party acknowledgement
    ///
    /// Returns the end time the frame has if the driver acknowledges every
    /// byte; otherwise the peer gives up after the first unacknowledged one.
    pub fn transmit_unacked_at(&mut self, start: u64, bytes: &[u8]) -> u64 {
        self.schedule(start, bytes, false)
    }

    fn schedule(&mut self, start: u64, bytes: &[u8], acked: bool) -> u64 {
        let transmission = Transmission {
            start,
            bytes: Vec::from_slice(bytes).unwrap(),
            acked,
        };
        let end = transmission.end();
        self.transmissions.push(transmission).ok().unwrap();
        end
    }

    /// Attach a peer that clocks in whatever the driver sends
    pub fn attach_receiver(&mut self, acks: bool) {
        self.receiver = Some(PeerReceiver {
            acks,
            shift: 0,
            bits: 0,
            ack_window: 0..0,
        });
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Level the driver itself is driving on a line
    pub fn driven(&self, line: Line) -> Level {
        self.driven[line.index()]
    }

    fn peer_level(&self, line: Line) -> Level {
        let pulled = self
            .transmissions
            .iter()
            .any(|t| t.level(line, self.now, &self.ack_times).is_low());
        let acking = line == Line::Ack
            && self
                .receiver
                .as_ref()
                .is_some_and(|r| r.ack_window.contains(&self.now));
        Level::from(!(pulled || acking))
    }

    fn clock_rising(&mut self) {
        let data = self.read(Line::Data);
        let now = self.now;
        let Some(receiver) = self.receiver.as_mut() else {
            return;
        };

        receiver.shift = (receiver.shift << 1) | u8::from(data.is_high());
        receiver.bits += 1;
        if receiver.bits < 8 {
            return;
        }

        let byte = receiver.shift;
        receiver.shift = 0;
        receiver.bits = 0;
        if receiver.acks {
            receiver.ack_window = now + 2..now + 12;
        }
        self.captured.push(byte).unwrap();
    }
}

impl BusLines for SimBus {
    fn read(&mut self, line: Line) -> Level {
        if self.driven(line).is_low() {
            Level::Low
        } else {
            self.peer_level(line)
        }
    }

    fn drive(&mut self, line: Line, level: Level) {
        let previous = core::mem::replace(&mut self.driven[line.index()], level);
        match (line, previous, level) {
            (Line::Sync, Level::High, Level::Low) => self.sync_pulls += 1,
            (Line::Ack, Level::High, Level::Low) => {
                self.driver_acks += 1;
                self.ack_times.push(self.now).unwrap();
            }
            (Line::Clock, Level::Low, Level::High) => self.clock_rising(),
            _ => {}
        }
    }
}

impl BusClock for SimBus {
    fn now_us(&self) -> u64 {
        self.now
    }

    fn delay_us(&mut self, us: u32) {
        self.now += u64::from(us);
    }
}
