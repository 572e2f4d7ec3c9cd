//! Wireless link capability.
//!
//! Everything the connection manager needs from the radio module is
//! behind [`WirelessLink`], so firmware injects the real module driver
//! and tests inject a scripted one.

use core::fmt;

use heapless::{consts::*, String};

/// Newest module firmware this crate knows about. Older firmware is
/// reported as an advisory during bring-up, nothing more.
pub const LATEST_FIRMWARE_VERSION: &str = "1.5.0";

/// Association status reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Idle,
    NoSsidAvailable,
    Connected,
    ConnectFailed,
    ConnectionLost,
    Disconnected,
}

/// Encryption scheme of the associated network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    Auto,
    Unknown,
}

/// 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// 32-bit network address in dotted-quad form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Address(pub [u8; 4]);

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = &self.0;
        write!(f, "{}.{}.{}.{}", b[0], b[1], b[2], b[3])
    }
}

/// Capability interface over the wireless module.
///
/// `begin_connection` starts an association attempt and returns the
/// module's immediate status; the module keeps negotiating on its own,
/// so callers poll `status` afterwards. The remaining methods are pure
/// diagnostic reads with no protocol semantics.
pub trait WirelessLink {
    /// Module detected and answering.
    fn module_present(&mut self) -> bool;

    fn firmware_version(&mut self) -> String<U16>;

    /// Start associating with the named network.
    fn begin_connection(&mut self, ssid: &str, secret: &str) -> LinkStatus;

    fn status(&mut self) -> LinkStatus;

    /// SSID of the network currently associated with.
    fn ssid(&mut self) -> String<U32>;

    /// Hardware address of the access point.
    fn bssid(&mut self) -> MacAddress;

    /// Received signal strength, dBm.
    fn rssi(&mut self) -> i32;

    fn encryption(&mut self) -> Encryption;

    fn local_address(&mut self) -> Ipv4Address;

    fn mac_address(&mut self) -> MacAddress;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_formats_colon_separated_hex() {
        let mac = MacAddress([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        assert_eq!(format!("{}", mac), "DE:AD:BE:EF:00:01");
    }

    #[test]
    fn ipv4_address_formats_dotted_quad() {
        let ip = Ipv4Address([192, 168, 4, 17]);
        assert_eq!(format!("{}", ip), "192.168.4.17");
    }
}
