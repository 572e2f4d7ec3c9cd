//! Socket transport capability.

use core::fmt::Debug;

/// Default port for the plaintext request cycle. A transport is free to
/// layer TLS underneath; the engine does not know.
pub const HTTP_PORT: u16 = 80;

/// One TCP-like connection as the platform exposes it.
///
/// The engine drives exactly one connect/write/read/close cycle per
/// request and never keeps a connection across calls. `read_byte`
/// returns `nb::Error::WouldBlock` when no byte is currently buffered.
pub trait Transport {
    type Error: Debug;

    fn connect(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;

    /// Write `line` followed by CRLF.
    fn write_line(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Bytes buffered and ready to read.
    fn available(&mut self) -> usize;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    fn close(&mut self);
}
