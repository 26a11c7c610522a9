//! Sniffer task
//!
//! Runs the passive listen loop. `listen` busy-waits on the lines, so the
//! task yields between frames to let the reporter run.

use defmt::*;
use embassy_futures::yield_now;

use ittl_driver::{BusError, Driver, TransferStage};
use ittl_hal_rp2040::Rp2040Hotshoe;
use ittl_protocol::Message;

use crate::channels::{BusEvent, BUS_EVENTS};

/// Longest quiet period before `listen` returns to yield
const LISTEN_TIMEOUT_US: u32 = 20_000;

#[embassy_executor::task]
pub async fn sniffer_task(mut driver: Driver<Rp2040Hotshoe<'static>>) {
    info!("Sniffer task started");

    loop {
        match driver.listen(LISTEN_TIMEOUT_US) {
            Ok(decoded) => {
                log_message(&decoded.message);
                publish(BusEvent::Frame {
                    command: decoded.message.command(),
                    anomalies: decoded.anomalies.len() as u8,
                });
            }
            // Quiet bus
            Err(BusError::Timeout(TransferStage::Start)) => {}
            Err(e) => {
                warn!("Bus error: {}", e);
                publish(BusEvent::Error(e));
            }
        }

        yield_now().await;
    }
}

fn publish(event: BusEvent) {
    if BUS_EVENTS.try_send(event).is_err() {
        debug!("Reporter behind, event dropped");
    }
}

fn log_message(message: &Message) {
    match message {
        Message::CamSetting(cam) => info!(
            "Cam_Setting: ISO {} shutter {}s f/{} {}mm FEC {}EV subject {}m",
            cam.iso.value(),
            cam.exposure.seconds(),
            cam.aperture.value(),
            cam.focal_length.millimetres(),
            cam.flash_compensation.ev(),
            cam.distance.metres()
        ),
        Message::FlashSetting(flash) => info!(
            "Flash_Setting: mode {} power {} ({}EV) ready {}",
            flash.mode,
            flash.power.fraction(),
            flash.power.ev(),
            flash.status.ready_light
        ),
        other => info!("{}", other),
    }
}
