//! Streaming response scanning.
//!
//! The response is consumed one byte at a time, so behavior does not
//! depend on how the transport chunks its reads. Carriage returns are
//! discarded outright; a blank line (two line feeds in a row) ends the
//! header block and everything after it is body.

use crate::buffer::BodyBuffer;

enum Phase {
    HeaderScan,
    BodyCapture,
}

pub(crate) struct ResponseScanner {
    phase: Phase,
    last_was_newline: bool,
    body: BodyBuffer,
}

impl ResponseScanner {
    pub(crate) fn new() -> Self {
        ResponseScanner {
            phase: Phase::HeaderScan,
            last_was_newline: false,
            body: BodyBuffer::new(),
        }
    }

    /// Consume one raw byte from the wire.
    pub(crate) fn push(&mut self, byte: u8) {
        if byte == b'\r' {
            return;
        }
        match self.phase {
            Phase::HeaderScan => {
                if byte == b'\n' {
                    if self.last_was_newline {
                        // blank line: boundary byte itself is not copied
                        self.phase = Phase::BodyCapture;
                    }
                    self.last_was_newline = true;
                } else {
                    self.last_was_newline = false;
                }
            }
            Phase::BodyCapture => self.body.append(byte),
        }
    }

    pub(crate) fn body(&self) -> &[u8] {
        self.body.as_slice()
    }

    pub(crate) fn truncated(&self) -> bool {
        self.body.truncated()
    }
}
