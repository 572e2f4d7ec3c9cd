//! Request emission.
//!
//! Every line is formed in a bounded buffer and written through the
//! transport in a fixed order; the header block is part of the wire
//! contract, not a configuration surface.

use core::fmt::Write;

use heapless::{consts::*, String};

use crate::transport::Transport;

/// Failures while forming or sending one request, or waiting for its
/// response. All of them end the transaction; none of them retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionError {
    /// A host/path/query combination does not fit the line buffer.
    LineOverflow,
    /// The serialized body does not fit the send buffer.
    BodyOverflow,
    /// The remote host did not accept the connection.
    ConnectionRefused,
    /// The transport rejected a write mid-request.
    WriteFailed,
    /// No response byte arrived inside the wait window.
    ResponseTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
}

impl Method {
    pub(crate) fn token(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

macro_rules! http_line {
    ($($arg:tt)*) => ({
        let mut line = String::<U256>::new();
        match write!(line, $($arg)*) {
            Ok(()) => Ok(line),
            Err(_) => Err(TransactionError::LineOverflow),
        }
    })
}

pub(crate) struct RequestHead<'a> {
    pub method: Method,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub auth: &'a str,
}

/// Write the request line, the fixed header block, the blank terminator
/// and (for POST) the serialized body.
pub(crate) fn send_request<T>(
    transport: &mut T,
    head: &RequestHead,
    body: Option<&str>,
) -> Result<(), TransactionError>
where
    T: Transport,
{
    let request_line: String<U256> =
        http_line!("{} /{}?{} HTTP/1.1", head.method.token(), head.path, head.query)?;
    let host_line: String<U256> = http_line!("Host: {}", head.host)?;

    send_line(transport, request_line.as_str())?;
    send_line(transport, host_line.as_str())?;
    send_line(transport, "Accept: application/json")?;
    if !head.auth.is_empty() {
        let auth_line: String<U256> = http_line!("Authorization: Basic {}", head.auth)?;
        send_line(transport, auth_line.as_str())?;
    }
    send_line(transport, "Connection: close")?;
    if body.is_some() {
        send_line(transport, "Content-Type: application/json")?;
    }
    send_line(transport, "")?;
    if let Some(body) = body {
        send_line(transport, body)?;
    }
    Ok(())
}

fn send_line<T>(transport: &mut T, line: &str) -> Result<(), TransactionError>
where
    T: Transport,
{
    transport
        .write_line(line)
        .map_err(|_| TransactionError::WriteFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeTransport, TransportLog};

    #[test]
    fn get_emits_headers_in_wire_order() {
        let log = TransportLog::new();
        let mut transport = FakeTransport::new(&log, b"");
        let head = RequestHead {
            method: Method::Get,
            host: "example.local",
            path: "things/1",
            query: "unit=c",
            auth: "",
        };

        send_request(&mut transport, &head, None).unwrap();

        let expected = b"GET /things/1?unit=c HTTP/1.1\r\n\
                         Host: example.local\r\n\
                         Accept: application/json\r\n\
                         Connection: close\r\n\
                         \r\n";
        assert_eq!(&log.written_bytes()[..], &expected[..]);
    }

    #[test]
    fn auth_header_appears_iff_token_is_non_empty() {
        let log = TransportLog::new();
        let mut transport = FakeTransport::new(&log, b"");
        let head = RequestHead {
            method: Method::Get,
            host: "example.local",
            path: "things",
            query: "",
            auth: "c2VjcmV0",
        };

        send_request(&mut transport, &head, None).unwrap();

        let expected = b"GET /things? HTTP/1.1\r\n\
                         Host: example.local\r\n\
                         Accept: application/json\r\n\
                         Authorization: Basic c2VjcmV0\r\n\
                         Connection: close\r\n\
                         \r\n";
        assert_eq!(&log.written_bytes()[..], &expected[..]);
    }

    #[test]
    fn post_carries_content_type_and_body_after_the_blank_line() {
        let log = TransportLog::new();
        let mut transport = FakeTransport::new(&log, b"");
        let head = RequestHead {
            method: Method::Post,
            host: "example.local",
            path: "lamp",
            query: "",
            auth: "",
        };

        send_request(&mut transport, &head, Some("{\"power\":\"on\"}")).unwrap();

        let expected = b"POST /lamp? HTTP/1.1\r\n\
                         Host: example.local\r\n\
                         Accept: application/json\r\n\
                         Connection: close\r\n\
                         Content-Type: application/json\r\n\
                         \r\n\
                         {\"power\":\"on\"}\r\n";
        assert_eq!(&log.written_bytes()[..], &expected[..]);
    }

    #[test]
    fn oversized_request_lines_are_rejected() {
        let log = TransportLog::new();
        let mut transport = FakeTransport::new(&log, b"");
        let long_path = "p".repeat(300);
        let head = RequestHead {
            method: Method::Get,
            host: "example.local",
            path: &long_path,
            query: "",
            auth: "",
        };

        assert_eq!(
            send_request(&mut transport, &head, None),
            Err(TransactionError::LineOverflow)
        );
    }
}
