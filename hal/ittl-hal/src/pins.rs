//! `embedded-hal` pin adapter
//!
//! Builds a [`BusLines`] + [`BusClock`] implementation from four
//! open-drain capable pins. Pins must be configured open-drain with
//! pull-ups (or emulate it) by the caller; this adapter only toggles levels.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::clock::BusClock;
use crate::line::{BusLines, Level, Line};

/// Pin usable as one open-drain hotshoe line
///
/// Reading must return the actual line level, not the last written state.
pub trait OpenDrainPin: InputPin + OutputPin + ErrorType<Error = Infallible> {}

// Blanket implementation for infallible I/O pins
impl<T: InputPin + OutputPin + ErrorType<Error = Infallible>> OpenDrainPin for T {}

/// Hotshoe lines backed by `embedded-hal` pins
pub struct HotshoePins<S, A, D, C, K> {
    sync: S,
    ack: A,
    data: D,
    clock: C,
    timer: K,
}

impl<S, A, D, C, K> HotshoePins<S, A, D, C, K>
where
    S: OpenDrainPin,
    A: OpenDrainPin,
    D: OpenDrainPin,
    C: OpenDrainPin,
    K: BusClock,
{
    /// Create the adapter and release every line
    pub fn new(sync: S, ack: A, data: D, clock: C, timer: K) -> Self {
        let mut pins = Self {
            sync,
            ack,
            data,
            clock,
            timer,
        };
        pins.release_all();
        pins
    }

    /// Give the pins and timer back
    pub fn into_parts(self) -> (S, A, D, C, K) {
        (self.sync, self.ack, self.data, self.clock, self.timer)
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

fn set<P: OpenDrainPin>(pin: &mut P, level: Level) {
    infallible(match level {
        Level::High => pin.set_high(),
        Level::Low => pin.set_low(),
    })
}

impl<S, A, D, C, K> BusLines for HotshoePins<S, A, D, C, K>
where
    S: OpenDrainPin,
    A: OpenDrainPin,
    D: OpenDrainPin,
    C: OpenDrainPin,
{
    fn read(&mut self, line: Line) -> Level {
        let high = match line {
            Line::Sync => self.sync.is_high(),
            Line::Ack => self.ack.is_high(),
            Line::Data => self.data.is_high(),
            Line::Clock => self.clock.is_high(),
        };
        Level::from(infallible(high))
    }

    fn drive(&mut self, line: Line, level: Level) {
        match line {
            Line::Sync => set(&mut self.sync, level),
            Line::Ack => set(&mut self.ack, level),
            Line::Data => set(&mut self.data, level),
            Line::Clock => set(&mut self.clock, level),
        }
    }
}

impl<S, A, D, C, K: BusClock> BusClock for HotshoePins<S, A, D, C, K> {
    fn now_us(&self) -> u64 {
        self.timer.now_us()
    }

    fn delay_us(&mut self, us: u32) {
        self.timer.delay_us(us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open-drain mock pin: reads back what was last written
    struct MockPin {
        high: bool,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    struct MockClock {
        now: u64,
    }

    impl BusClock for MockClock {
        fn now_us(&self) -> u64 {
            self.now
        }

        fn delay_us(&mut self, us: u32) {
            self.now += us as u64;
        }
    }

    fn pins() -> HotshoePins<MockPin, MockPin, MockPin, MockPin, MockClock> {
        HotshoePins::new(
            MockPin { high: false },
            MockPin { high: false },
            MockPin { high: false },
            MockPin { high: false },
            MockClock { now: 0 },
        )
    }

    #[test]
    fn test_new_releases_all_lines() {
        let mut bus = pins();
        for line in Line::ALL {
            assert_eq!(bus.read(line), Level::High);
        }
    }

    #[test]
    fn test_drive_routes_to_matching_pin() {
        let mut bus = pins();
        bus.drive(Line::Data, Level::Low);

        assert_eq!(bus.read(Line::Data), Level::Low);
        assert_eq!(bus.read(Line::Clock), Level::High);

        let (sync, _ack, data, _clock, _timer) = bus.into_parts();
        assert!(sync.high);
        assert!(!data.high);
    }

    #[test]
    fn test_clock_delegates_to_timer() {
        let mut bus = pins();
        bus.delay_us(25);
        assert_eq!(bus.now_us(), 25);
        assert_eq!(bus.elapsed_us(10), 15);
    }
}
