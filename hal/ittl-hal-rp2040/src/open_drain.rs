//! Open-drain emulation on a flexible GPIO

use core::convert::Infallible;

use embassy_rp::gpio::{AnyPin, Flex, Pull};
use embassy_rp::Peri;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// One hotshoe line on an RP2040 GPIO
pub struct OpenDrain<'d> {
    pin: Flex<'d>,
}

impl<'d> OpenDrain<'d> {
    /// Configure the pin with a pull-up and leave the line released
    pub fn new(pin: Peri<'d, AnyPin>) -> Self {
        let mut pin = Flex::new(pin);
        pin.set_pull(Pull::Up);
        pin.set_low();
        pin.set_as_input();
        Self { pin }
    }
}

impl ErrorType for OpenDrain<'_> {
    type Error = Infallible;
}

impl InputPin for OpenDrain<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_low())
    }
}

impl OutputPin for OpenDrain<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_as_output();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_as_input();
        Ok(())
    }
}
