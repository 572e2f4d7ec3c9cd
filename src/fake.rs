//! Deterministic capability implementations for host-side tests.
//!
//! Each fake records what it was asked to do through a shared log handle,
//! so assertions stay possible after the fake itself has been moved into
//! a manager or indicator.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::digital::v2::OutputPin;
use embedded_time::fraction::Fraction;
use embedded_time::Instant;
use heapless::{consts::*, String, Vec};

use crate::link::{Encryption, Ipv4Address, LinkStatus, MacAddress, WirelessLink};
use crate::transport::Transport;

/// Clock whose time advances by one millisecond per query, so blocking
/// delays complete without wall-clock waiting.
pub struct FakeClock {
    ticks: Cell<u64>,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock {
            ticks: Cell::new(0),
        }
    }

    /// Milliseconds of simulated time spent so far.
    pub fn elapsed_ms(&self) -> u64 {
        self.ticks.get()
    }
}

impl embedded_time::Clock for FakeClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1000);

    fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
        let now = self.ticks.get();
        self.ticks.set(now + 1);
        Ok(Instant::new(now))
    }
}

/// Level-transition record shared by a [`FakePin`].
pub struct PinLog {
    rises: Cell<usize>,
    falls: Cell<usize>,
}

impl PinLog {
    pub fn new() -> Self {
        PinLog {
            rises: Cell::new(0),
            falls: Cell::new(0),
        }
    }

    pub fn rises(&self) -> usize {
        self.rises.get()
    }

    pub fn falls(&self) -> usize {
        self.falls.get()
    }
}

/// Output pin that counts its level transitions.
pub struct FakePin<'a> {
    log: &'a PinLog,
    level: bool,
}

impl<'a> FakePin<'a> {
    /// Starts low.
    pub fn new(log: &'a PinLog) -> Self {
        FakePin { log, level: false }
    }
}

impl OutputPin for FakePin<'_> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.level {
            self.log.rises.set(self.log.rises.get() + 1);
        }
        self.level = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        if self.level {
            self.log.falls.set(self.log.falls.get() + 1);
        }
        self.level = false;
        Ok(())
    }
}

/// Scripted wireless module.
///
/// By default it is present, runs current firmware, and associates on
/// the first attempt; the builder methods script other behaviors. The
/// shared cell counts `begin_connection` calls.
pub struct FakeLink<'a> {
    present: bool,
    firmware: &'static str,
    connects_on_attempt: Option<usize>,
    begin_calls: &'a Cell<usize>,
}

impl<'a> FakeLink<'a> {
    pub fn new(begin_calls: &'a Cell<usize>) -> Self {
        FakeLink {
            present: true,
            firmware: crate::link::LATEST_FIRMWARE_VERSION,
            connects_on_attempt: Some(1),
            begin_calls,
        }
    }

    /// Module does not answer at all.
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn with_firmware(mut self, firmware: &'static str) -> Self {
        self.firmware = firmware;
        self
    }

    /// Reports `Connected` starting with the given (1-based) attempt.
    pub fn connects_on_attempt(mut self, attempt: usize) -> Self {
        self.connects_on_attempt = Some(attempt);
        self
    }

    pub fn never_connects(mut self) -> Self {
        self.connects_on_attempt = None;
        self
    }

    fn current(&self) -> LinkStatus {
        match self.connects_on_attempt {
            Some(attempt) if self.begin_calls.get() >= attempt => LinkStatus::Connected,
            _ if self.begin_calls.get() > 0 => LinkStatus::Disconnected,
            _ => LinkStatus::Idle,
        }
    }
}

impl WirelessLink for FakeLink<'_> {
    fn module_present(&mut self) -> bool {
        self.present
    }

    fn firmware_version(&mut self) -> String<U16> {
        String::from(self.firmware)
    }

    fn begin_connection(&mut self, _ssid: &str, _secret: &str) -> LinkStatus {
        self.begin_calls.set(self.begin_calls.get() + 1);
        self.current()
    }

    fn status(&mut self) -> LinkStatus {
        self.current()
    }

    fn ssid(&mut self) -> String<U32> {
        String::from("workshop")
    }

    fn bssid(&mut self) -> MacAddress {
        MacAddress([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01])
    }

    fn rssi(&mut self) -> i32 {
        -61
    }

    fn encryption(&mut self) -> Encryption {
        Encryption::Wpa2Psk
    }

    fn local_address(&mut self) -> Ipv4Address {
        Ipv4Address([192, 168, 4, 17])
    }

    fn mac_address(&mut self) -> MacAddress {
        MacAddress([0xA4, 0xCF, 0x12, 0x04, 0x42, 0x99])
    }
}

/// Observable record of everything a [`FakeTransport`] was asked to do.
pub struct TransportLog {
    connects: Cell<usize>,
    closes: Cell<usize>,
    written: RefCell<Vec<u8, U1024>>,
}

impl TransportLog {
    pub fn new() -> Self {
        TransportLog {
            connects: Cell::new(0),
            closes: Cell::new(0),
            written: RefCell::new(Vec::new()),
        }
    }

    /// Accepted connections.
    pub fn connects(&self) -> usize {
        self.connects.get()
    }

    pub fn closes(&self) -> usize {
        self.closes.get()
    }

    /// Everything written so far, CRLF included.
    pub fn written_bytes(&self) -> Vec<u8, U1024> {
        self.written.borrow().clone()
    }
}

/// Transport that replays a canned response byte stream.
///
/// Each accepted `connect` rewinds the stream, so repeated requests see
/// identical data.
pub struct FakeTransport<'a> {
    log: &'a TransportLog,
    response: &'a [u8],
    accept: bool,
    cursor: usize,
}

impl<'a> FakeTransport<'a> {
    pub fn new(log: &'a TransportLog, response: &'a [u8]) -> Self {
        FakeTransport {
            log,
            response,
            accept: true,
            cursor: 0,
        }
    }

    /// Refuses every connection attempt.
    pub fn refusing(log: &'a TransportLog) -> Self {
        FakeTransport {
            log,
            response: b"",
            accept: false,
            cursor: 0,
        }
    }
}

impl Transport for FakeTransport<'_> {
    type Error = ();

    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), ()> {
        if !self.accept {
            return Err(());
        }
        self.log.connects.set(self.log.connects.get() + 1);
        self.cursor = 0;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), ()> {
        let mut written = self.log.written.borrow_mut();
        written.extend_from_slice(line.as_bytes()).map_err(|_| ())?;
        written.extend_from_slice(b"\r\n").map_err(|_| ())
    }

    fn available(&mut self) -> usize {
        self.response.len() - self.cursor
    }

    fn read_byte(&mut self) -> nb::Result<u8, ()> {
        if self.cursor < self.response.len() {
            let byte = self.response[self.cursor];
            self.cursor += 1;
            Ok(byte)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn close(&mut self) {
        self.log.closes.set(self.log.closes.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_on_every_query() {
        use embedded_time::Clock;

        let clock = FakeClock::new();
        let _ = clock.try_now();
        let _ = clock.try_now();
        assert_eq!(clock.elapsed_ms(), 2);
    }

    #[test]
    fn fake_transport_rewinds_on_reconnect() {
        let log = TransportLog::new();
        let mut transport = FakeTransport::new(&log, b"ab");

        transport.connect("h", 80).unwrap();
        assert_eq!(transport.read_byte(), Ok(b'a'));
        assert_eq!(transport.read_byte(), Ok(b'b'));
        assert!(transport.read_byte().is_err());
        transport.close();

        transport.connect("h", 80).unwrap();
        assert_eq!(transport.available(), 2);
        assert_eq!(log.connects(), 2);
        assert_eq!(log.closes(), 1);
    }
}
