//! Microsecond time source
//!
//! Every wait in the handshake is bounded, so the driver needs both a
//! monotonic timestamp and a short busy-wait delay.

/// Monotonic microsecond clock with blocking delays
pub trait BusClock {
    /// Microseconds since an arbitrary, fixed epoch
    fn now_us(&self) -> u64;

    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Microseconds elapsed since `since`
    fn elapsed_us(&self, since: u64) -> u64 {
        self.now_us().saturating_sub(since)
    }
}
