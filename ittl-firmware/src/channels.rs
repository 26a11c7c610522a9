//! Inter-task communication channels

use defmt::Format;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use ittl_driver::BusError;
use ittl_protocol::Command;

/// Channel capacity for bus events
const BUS_EVENT_CHANNEL_SIZE: usize = 16;

/// Outcome of one listen call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum BusEvent {
    /// A frame decoded, with the number of anomalies it carried
    Frame { command: Command, anomalies: u8 },
    /// A frame was seen but could not be decoded
    Error(BusError),
}

/// Bus events from the sniffer to the reporter
pub static BUS_EVENTS: Channel<CriticalSectionRawMutex, BusEvent, BUS_EVENT_CHANNEL_SIZE> =
    Channel::new();
