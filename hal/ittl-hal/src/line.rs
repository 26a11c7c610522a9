//! Hotshoe line abstractions
//!
//! The hotshoe carries four logical signals. All of them are open-drain
//! with pull-ups: any party may pull a line low, and a line reads high only
//! when nobody drives it. Driving a line high is therefore the same as
//! releasing it.

/// One of the four hotshoe signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Frame delimiter, held low by the sender for the whole transfer
    Sync,
    /// Byte acknowledgement, pulsed low by the receiver
    Ack,
    /// Serial data, most significant bit first
    Data,
    /// Bit clock, driven by the sender
    Clock,
}

impl Line {
    /// All lines, in a fixed order
    pub const ALL: [Line; 4] = [Line::Sync, Line::Ack, Line::Data, Line::Clock];

    /// Index of this line within [`Line::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Line::Sync => 0,
            Line::Ack => 1,
            Line::Data => 2,
            Line::Clock => 3,
        }
    }
}

/// Logic level of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

/// Access to the four hotshoe lines
///
/// Implementations handle pin muxing, pull-ups and the open-drain
/// emulation for the specific chip.
pub trait BusLines {
    /// Sample the current level of a line
    fn read(&mut self, line: Line) -> Level;

    /// Drive a line to the given level
    ///
    /// `Level::High` releases the line to its pulled-up idle state.
    fn drive(&mut self, line: Line, level: Level);

    /// Release a line to its idle (high) level
    fn release(&mut self, line: Line) {
        self.drive(line, Level::High);
    }

    /// Release every line
    fn release_all(&mut self) {
        for line in Line::ALL {
            self.release(line);
        }
    }
}
