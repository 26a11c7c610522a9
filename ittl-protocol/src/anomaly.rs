//! Protocol anomalies
//!
//! Some bytes and bits are documented as constant, or as derived from other
//! bytes. Real hardware is not guaranteed to honour that, so a violation is
//! recorded next to the decoded message instead of failing the decode.

use heapless::Vec;

use crate::command::Command;

/// Maximum anomalies tracked per message; further ones are dropped
pub const MAX_ANOMALIES: usize = 8;

/// What kind of documented expectation was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnomalyKind {
    /// Bits documented as always 0 or always 1 differ (`mask` selects them)
    ConstantBits,
    /// A byte documented as a fixed value differs
    ConstantByte,
    /// A byte documented as derived from another byte differs
    DerivedByte,
    /// A byte holds a code outside the documented set
    UnrecognizedCode,
    /// A byte exceeds its documented range
    OutOfRange,
}

/// One observed-but-unexpected value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolAnomaly {
    pub command: Command,
    pub kind: AnomalyKind,
    /// Payload byte offset
    pub offset: u8,
    /// Bits of the byte the expectation covers
    pub mask: u8,
    /// Expected value of the masked bits
    pub expected: u8,
    /// Observed value of the masked bits
    pub observed: u8,
}

/// Anomalies found while decoding one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Anomalies {
    items: Vec<ProtocolAnomaly, MAX_ANOMALIES>,
    dropped: u8,
}

impl Anomalies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.dropped == 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Anomalies that did not fit
    pub fn dropped(&self) -> u8 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolAnomaly> {
        self.items.iter()
    }

    pub fn push(&mut self, anomaly: ProtocolAnomaly) {
        if self.items.push(anomaly).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    /// Record a violation if the masked bits of `observed` differ from `expected`
    pub fn check_bits(&mut self, command: Command, offset: u8, mask: u8, expected: u8, observed: u8) {
        if observed & mask != expected & mask {
            self.push(ProtocolAnomaly {
                command,
                kind: AnomalyKind::ConstantBits,
                offset,
                mask,
                expected: expected & mask,
                observed: observed & mask,
            });
        }
    }

    /// Record a violation if a whole byte differs from its documented value
    pub fn check_byte(&mut self, command: Command, kind: AnomalyKind, offset: u8, expected: u8, observed: u8) {
        if observed != expected {
            self.push(ProtocolAnomaly {
                command,
                kind,
                offset,
                mask: 0xFF,
                expected,
                observed,
            });
        }
    }

    /// Record a byte that is outside its documented code set or range
    pub fn flag(&mut self, command: Command, kind: AnomalyKind, offset: u8, observed: u8) {
        self.push(ProtocolAnomaly {
            command,
            kind,
            offset,
            mask: 0xFF,
            expected: 0,
            observed,
        });
    }
}
