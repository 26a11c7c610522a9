//! Report task
//!
//! Blinks the LED on every frame and logs per-command counts periodically.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use ittl_protocol::command::{CATALOG, COMMAND_COUNT};
use ittl_protocol::Command;

use crate::channels::{BusEvent, BUS_EVENTS};

/// Summary interval in seconds
const SUMMARY_INTERVAL_S: u64 = 10;

#[derive(Default)]
struct Stats {
    frames: u32,
    anomalous: u32,
    errors: u32,
    per_command: [u32; COMMAND_COUNT],
}

impl Stats {
    fn record(&mut self, event: BusEvent) {
        match event {
            BusEvent::Frame { command, anomalies } => {
                self.frames += 1;
                if anomalies > 0 {
                    self.anomalous += 1;
                }
                if let Some(count) = catalog_index(command).map(|i| &mut self.per_command[i]) {
                    *count += 1;
                }
            }
            BusEvent::Error(_) => self.errors += 1,
        }
    }

    fn log(&self) {
        info!(
            "{} frames ({} with anomalies), {} errors",
            self.frames, self.anomalous, self.errors
        );
        for (entry, count) in CATALOG.iter().zip(self.per_command) {
            if count > 0 {
                info!("  {}: {}", entry.command, count);
            }
        }
    }
}

fn catalog_index(command: Command) -> Option<usize> {
    CATALOG.iter().position(|entry| entry.command == command)
}

#[embassy_executor::task]
pub async fn report_task(mut led: Output<'static>) {
    info!("Report task started");

    let mut ticker = Ticker::every(Duration::from_secs(SUMMARY_INTERVAL_S));
    let mut stats = Stats::default();

    loop {
        match select(BUS_EVENTS.receive(), ticker.next()).await {
            Either::First(event) => {
                led.toggle();
                stats.record(event);
            }
            Either::Second(()) => stats.log(),
        }
    }
}
