//! Link lifecycle and the request/response cycle.

use drogue_embedded_timer::Delay;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::Milliseconds;
use heapless::{consts::*, String};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::indicator::{Signal, StatusIndicator};
use crate::link::{LinkStatus, WirelessLink, LATEST_FIRMWARE_VERSION};
use crate::request::{send_request, Method, RequestHead, TransactionError};
use crate::response::ResponseScanner;
use crate::transport::{Transport, HTTP_PORT};

/// Upper bound on association attempts per `init` call.
pub const CONNECT_ATTEMPT_LIMIT: usize = 10;

// Settle window per attempt: the module negotiates on its own, we poll
// it in one-second slices up to ten seconds.
const SETTLE_SLICES: usize = 10;
const SETTLE_SLICE_MS: u32 = 1000;

// Response availability window: 100 ms polls, five seconds total.
const RESPONSE_POLL_LIMIT: usize = 50;
const RESPONSE_POLL_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    SsidTooLong,
    SecretTooLong,
}

/// Network identity and secret, immutable for the manager's lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    ssid: String<U32>,
    secret: String<U64>,
}

impl Credentials {
    pub fn new(ssid: &str, secret: &str) -> Result<Self, CredentialsError> {
        let mut s: String<U32> = String::new();
        s.push_str(ssid).map_err(|_| CredentialsError::SsidTooLong)?;
        let mut p: String<U64> = String::new();
        p.push_str(secret).map_err(|_| CredentialsError::SecretTooLong)?;
        Ok(Credentials { ssid: s, secret: p })
    }

    pub fn ssid(&self) -> &str {
        self.ssid.as_str()
    }
}

/// Where the wireless association currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Connected,
    Failed,
}

/// Owns the link, the transport and the credentials, and drives both the
/// bring-up retry loop and the per-request transaction cycle.
///
/// Fully synchronous: every wait is a blocking delay, and only one
/// request can be in flight. Outcomes are reported through the return
/// value and, when an indicator is attached, the blink channel
/// (1 activity, 2 success, 3 advisory, 4 failure).
pub struct ConnectionManager<'clock, L, T, Pin, Clock>
    where L: WirelessLink,
          T: Transport,
          Pin: OutputPin,
          Clock: embedded_time::Clock + 'clock,
{
    link: L,
    transport: T,
    credentials: Credentials,
    indicator: Option<StatusIndicator<'clock, Pin, Clock>>,
    delay: Delay<'clock, Clock>,
    state: LinkState,
}

impl<'clock, L, T, Pin, Clock> ConnectionManager<'clock, L, T, Pin, Clock>
    where L: WirelessLink,
          T: Transport,
          Pin: OutputPin,
          Clock: embedded_time::Clock + 'clock,
{
    pub fn new(
        link: L,
        transport: T,
        credentials: Credentials,
        delay: Delay<'clock, Clock>,
    ) -> Self {
        Self {
            link,
            transport,
            credentials,
            indicator: None,
            delay,
            state: LinkState::Idle,
        }
    }

    pub fn with_indicator(mut self, indicator: StatusIndicator<'clock, Pin, Clock>) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Bring the wireless link up. Blocking; intended to be called once.
    ///
    /// Returns `false` when the module is absent or the attempt budget
    /// runs out, `true` once the link is associated. On success the
    /// current network parameters are logged as a diagnostic.
    pub fn init(&mut self) -> bool {
        self.state = LinkState::Connecting;

        if !self.link.module_present() {
            log::error!("wireless module is not responding");
            self.signal(Signal::Failure);
            self.state = LinkState::Failed;
            return false;
        }

        let firmware = self.link.firmware_version();
        if firmware.as_str() < LATEST_FIRMWARE_VERSION {
            log::warn!(
                "module firmware {} predates {}, consider upgrading",
                firmware.as_str(),
                LATEST_FIRMWARE_VERSION
            );
            self.signal(Signal::Advisory);
        }

        let mut status = LinkStatus::Idle;
        for attempt in 1..=CONNECT_ATTEMPT_LIMIT {
            log::info!(
                "joining {} ({}/{})",
                self.credentials.ssid(),
                attempt,
                CONNECT_ATTEMPT_LIMIT
            );
            self.signal(Signal::Activity);
            status = self
                .link
                .begin_connection(self.credentials.ssid.as_str(), self.credentials.secret.as_str());
            for _ in 0..SETTLE_SLICES {
                if status == LinkStatus::Connected {
                    break;
                }
                self.delay.delay(Milliseconds(SETTLE_SLICE_MS));
                status = self.link.status();
            }
            if status == LinkStatus::Connected {
                break;
            }
        }

        if status != LinkStatus::Connected {
            log::error!("no association after {} attempts", CONNECT_ATTEMPT_LIMIT);
            self.signal(Signal::Failure);
            self.state = LinkState::Failed;
            return false;
        }

        self.signal(Signal::Success);
        self.state = LinkState::Connected;
        self.log_link_report();
        true
    }

    /// One GET transaction. Returns the decoded document, or the default
    /// document on any failure (never panics, never retries).
    pub fn get<D>(&mut self, host: &str, path: &str, query: &str, auth: &str) -> D
    where
        D: DeserializeOwned + Default,
    {
        self.transact(Method::Get, host, path, query, auth, None)
    }

    /// One POST transaction carrying `body` serialized as JSON.
    pub fn post<D, B>(&mut self, host: &str, path: &str, query: &str, body: &B, auth: &str) -> D
    where
        D: DeserializeOwned + Default,
        B: Serialize,
    {
        let serialized: String<U512> = match serde_json_core::ser::to_string(body) {
            Ok(serialized) => serialized,
            Err(_) => {
                log::error!("POST {} failed: {:?}", path, TransactionError::BodyOverflow);
                self.signal(Signal::Failure);
                return D::default();
            }
        };
        self.transact(Method::Post, host, path, query, auth, Some(serialized.as_str()))
    }

    fn transact<D>(
        &mut self,
        method: Method,
        host: &str,
        path: &str,
        query: &str,
        auth: &str,
        body: Option<&str>,
    ) -> D
    where
        D: DeserializeOwned + Default,
    {
        if self.state != LinkState::Connected {
            log::error!("request refused, link is {:?}", self.state);
            self.signal(Signal::Failure);
            return D::default();
        }

        let scanner = match self.exchange(method, host, path, query, auth, body) {
            Ok(scanner) => scanner,
            Err(e) => {
                log::error!("{} {} failed: {:?}", method.token(), path, e);
                self.signal(Signal::Failure);
                return D::default();
            }
        };

        if scanner.truncated() {
            log::warn!("response clipped at {} bytes", scanner.body().len());
        }

        match serde_json_core::de::from_slice::<D>(scanner.body()) {
            Ok(document) => {
                self.signal(Signal::Success);
                document
            }
            Err(_) => {
                log::error!("response body is not valid JSON");
                self.signal(Signal::Failure);
                D::default()
            }
        }
    }

    /// One full wire cycle: connect, emit the request, wait for the
    /// response to start, drain it through the scanner, close.
    fn exchange(
        &mut self,
        method: Method,
        host: &str,
        path: &str,
        query: &str,
        auth: &str,
        body: Option<&str>,
    ) -> Result<ResponseScanner, TransactionError> {
        self.transport
            .connect(host, HTTP_PORT)
            .map_err(|_| TransactionError::ConnectionRefused)?;

        let head = RequestHead {
            method,
            host,
            path,
            query,
            auth,
        };
        if let Err(e) = send_request(&mut self.transport, &head, body) {
            self.transport.close();
            return Err(e);
        }

        let mut polls = 0;
        while self.transport.available() == 0 {
            if polls == RESPONSE_POLL_LIMIT {
                self.transport.close();
                return Err(TransactionError::ResponseTimeout);
            }
            self.delay.delay(Milliseconds(RESPONSE_POLL_MS));
            polls += 1;
        }

        let mut scanner = ResponseScanner::new();
        loop {
            match self.transport.read_byte() {
                Ok(byte) => scanner.push(byte),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => break,
            }
        }
        self.transport.close();
        Ok(scanner)
    }

    fn log_link_report(&mut self) {
        log::info!("ssid: {}", self.link.ssid().as_str());
        log::info!("bssid: {}", self.link.bssid());
        log::info!("signal strength: {} dBm", self.link.rssi());
        log::info!("encryption: {:?}", self.link.encryption());
        log::info!("address: {}", self.link.local_address());
        log::info!("mac: {}", self.link.mac_address());
    }

    fn signal(&mut self, signal: Signal) {
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.signal(signal);
        }
    }
}
