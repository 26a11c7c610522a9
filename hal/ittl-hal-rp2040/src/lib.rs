//! RP2040 hotshoe lines
//!
//! The RP2040 has no true open-drain GPIO mode. [`OpenDrain`] emulates it
//! by keeping the output latch at 0 and switching the pad direction: output
//! pulls the line low, input lets the pull-up take it high.
//!
//! [`EmbassyClock`] supplies microsecond time from the embassy time driver.

#![no_std]

pub mod clock;
pub mod open_drain;

use embassy_rp::gpio::AnyPin;
use embassy_rp::Peri;
use ittl_hal::HotshoePins;

pub use clock::EmbassyClock;
pub use open_drain::OpenDrain;

/// Hotshoe bus on four RP2040 GPIOs
pub type Rp2040Hotshoe<'d> =
    HotshoePins<OpenDrain<'d>, OpenDrain<'d>, OpenDrain<'d>, OpenDrain<'d>, EmbassyClock>;

/// Configure four GPIOs as the hotshoe lines, all released
pub fn hotshoe<'d>(
    sync: Peri<'d, AnyPin>,
    ack: Peri<'d, AnyPin>,
    data: Peri<'d, AnyPin>,
    clock: Peri<'d, AnyPin>,
) -> Rp2040Hotshoe<'d> {
    HotshoePins::new(
        OpenDrain::new(sync),
        OpenDrain::new(ack),
        OpenDrain::new(data),
        OpenDrain::new(clock),
        EmbassyClock::new(),
    )
}
