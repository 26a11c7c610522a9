//! Embassy async tasks

pub mod report;
pub mod sniffer;

pub use report::report_task;
pub use sniffer::sniffer_task;
