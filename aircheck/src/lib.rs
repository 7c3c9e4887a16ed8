#![warn(
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    unreachable_pub
)]

//! Periodic air-quality polling and proximity alerting.
//!
//! [`scheduler::run`] drives the engine: fetch a reading from the sensor
//! feed, evaluate it against the pollutant thresholds and, on a breach, fan
//! an alert out to every subscribed observer close enough in space and time
//! to the anchor observer.

pub mod alert;
pub mod feed;
pub mod geo;
pub mod observer;
pub mod scheduler;
pub mod threshold;
