//! Microsecond clock on the embassy time driver

use embassy_time::{block_for, Duration, Instant};
use ittl_hal::BusClock;

/// [`BusClock`] backed by `embassy_time`
///
/// Delays busy-wait; the handshake polls at microsecond granularity.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    pub const fn new() -> Self {
        Self
    }
}

impl BusClock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }
}
