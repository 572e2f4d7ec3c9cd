use heapless::{consts::*, Vec};

/// Fixed-capacity store for one response body.
///
/// `append` drops bytes once the buffer is full and records that it did,
/// so a caller can tell a complete body from a clipped one.
pub(crate) struct BodyBuffer {
    data: Vec<u8, U4096>,
    truncated: bool,
}

impl BodyBuffer {
    pub(crate) fn new() -> Self {
        BodyBuffer {
            data: Vec::new(),
            truncated: false,
        }
    }

    pub(crate) fn append(&mut self, byte: u8) {
        if self.data.push(byte).is_err() {
            self.truncated = true;
        }
    }

    pub(crate) fn truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_stores_bytes_in_order() {
        let mut buffer = BodyBuffer::new();
        for b in b"{}" {
            buffer.append(*b);
        }
        assert_eq!(buffer.as_slice(), b"{}");
        assert!(!buffer.truncated());
    }

    #[test]
    fn bytes_past_capacity_are_dropped_and_flagged() {
        let mut buffer = BodyBuffer::new();
        for _ in 0..5000 {
            buffer.append(b'x');
        }
        assert_eq!(buffer.as_slice().len(), 4096);
        assert!(buffer.truncated());
    }
}
