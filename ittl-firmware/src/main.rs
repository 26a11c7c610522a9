//! iTTL hotshoe sniffer
//!
//! Sits on the hotshoe between a camera and a flash without driving any
//! line, decodes every frame and logs it over RTT.
//!
//! Wiring (all lines need external pull-ups to the hotshoe's logic level):
//! - GPIO2: Sync
//! - GPIO3: Ack
//! - GPIO4: Data
//! - GPIO5: Clock
//! - GPIO25: on-board LED, toggled per frame

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use {defmt_rtt as _, panic_probe as _};

use ittl_driver::{Driver, DriverConfig};

mod channels;
mod tasks;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("iTTL sniffer starting...");

    let p = embassy_rp::init(Default::default());

    let bus = ittl_hal_rp2040::hotshoe(
        p.PIN_2.into(),
        p.PIN_3.into(),
        p.PIN_4.into(),
        p.PIN_5.into(),
    );
    let driver = match Driver::new(bus, DriverConfig::passive()) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Driver configuration rejected: {}", e);
            return;
        }
    };
    info!("Hotshoe lines released, listening");

    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(tasks::sniffer_task(driver)).unwrap();
    spawner.spawn(tasks::report_task(led)).unwrap();
}
