//! Driver configuration
//!
//! All durations are in microseconds. The defaults have not been measured
//! against real camera and flash hardware; they are conservative values
//! that keep every wait bounded.

use ittl_protocol::Endpoint;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timing parameters of the transfer handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Half of a bit period when this side drives Clock
    pub clock_half_period_us: u32,
    /// Delay between pulling Sync low and the first Clock edge
    pub start_setup_us: u32,
    /// Longest wait for any Clock edge while receiving
    pub bit_timeout_us: u32,
    /// Longest wait for each Ack edge while sending or observing
    pub ack_timeout_us: u32,
    /// How long this side holds Ack low when acknowledging
    pub ack_hold_us: u32,
    /// Longest wait for Sync to return high after an unknown command
    pub drain_timeout_us: u32,
    /// Sampling interval inside every bounded wait
    pub poll_interval_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock_half_period_us: 10,
            start_setup_us: 20,
            bit_timeout_us: 200,
            ack_timeout_us: 500,
            ack_hold_us: 15,
            drain_timeout_us: 20_000,
            poll_interval_us: 1,
        }
    }
}

/// Invalid configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A duration that must be positive is zero
    ZeroDuration,
    /// Ack pulse too short to be seen at the polling rate or within a
    /// clock half period
    AckHoldTooShort,
    /// Bit timeout shorter than a full bit period
    BitTimeoutTooShort,
}

impl TimingConfig {
    /// Check the values for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_half_period_us == 0
            || self.poll_interval_us == 0
            || self.ack_timeout_us == 0
            || self.drain_timeout_us == 0
        {
            return Err(ConfigError::ZeroDuration);
        }
        if self.ack_hold_us <= self.poll_interval_us
            || self.ack_hold_us <= self.clock_half_period_us
        {
            return Err(ConfigError::AckHoldTooShort);
        }
        if self.bit_timeout_us < self.clock_half_period_us.saturating_mul(2) {
            return Err(ConfigError::BitTimeoutTooShort);
        }
        Ok(())
    }
}

/// How the driver takes part in bus traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Observe traffic between a real camera and a real flash, never driving a line
    #[default]
    Passive,
    /// Stand in for one endpoint
    Active(Endpoint),
}

/// Complete driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    pub mode: Mode,
    pub timing: TimingConfig,
}

impl DriverConfig {
    /// Passive observer with default timing
    pub fn passive() -> Self {
        Self::default()
    }

    /// Active endpoint with default timing
    pub fn active(endpoint: Endpoint) -> Self {
        Self {
            mode: Mode::Active(endpoint),
            timing: TimingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()
    }
}
