#![cfg_attr(not(test), no_std)]

//! Firmware building blocks for small network-connected actuator
//! devices: bounded-retry wireless bring-up, a raw-socket JSON-over-HTTP
//! transaction cycle, and a blink channel for operator feedback.
//!
//! Hardware access is injected through capability interfaces — the
//! [`WirelessLink`] and [`Transport`] traits plus embedded-hal's
//! `OutputPin` — so the whole stack also runs against the [`fake`]
//! module on a host.

pub mod fake;
pub mod indicator;
pub mod link;
pub mod manager;
pub mod transport;

mod buffer;
mod request;
mod response;

pub use indicator::{Signal, StatusIndicator, DEFAULT_BLINK_MS};
pub use link::{
    Encryption, Ipv4Address, LinkStatus, MacAddress, WirelessLink, LATEST_FIRMWARE_VERSION,
};
pub use manager::{
    ConnectionManager, Credentials, CredentialsError, LinkState, CONNECT_ATTEMPT_LIMIT,
};
pub use transport::{Transport, HTTP_PORT};
