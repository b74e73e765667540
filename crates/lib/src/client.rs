//! Connection handling for the server's raw text protocol.
//!
//! The server speaks plain UTF-8 text over one persistent TCP connection,
//! with no framing at all: a command is written verbatim (no delimiter, no
//! length prefix), and whatever bytes arrive in one read call, up to
//! [`RECV_BUFFER_SIZE`], are the response to the command that preceded
//! them. Requests and responses strictly alternate; nothing is pipelined.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::string::FromUtf8Error;

use tracing::debug;

/// Upper bound on a single response, in bytes.
///
/// A response is whatever one read call yields, up to this bound. The
/// protocol has no framing, so a server reply larger than this arrives
/// split across receive calls, each chunk standing as its own response.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Errors from the session client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("transmission failed: {0}")]
    Transmission(#[source] std::io::Error),
    #[error("response is not valid UTF-8: {0}")]
    Decode(#[source] FromUtf8Error),
    #[error("connection is closed")]
    Closed,
}

/// Client owning the single persistent connection to the server.
///
/// The connection lives for the whole session: opened once by
/// [`SessionClient::connect`], closed for good when the server hangs up
/// or a transmission fails. There is no reconnect.
#[derive(Debug)]
pub struct SessionClient {
    /// `None` once the connection has been closed. Closed is terminal.
    stream: Option<TcpStream>,
}

impl SessionClient {
    /// Open a TCP connection to the server
    pub fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((host, port)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                ClientError::Connect(std::io::Error::new(
                    e.kind(),
                    format!("cannot connect to {host}:{port}: is the server running?"),
                ))
            } else {
                ClientError::Connect(e)
            }
        })?;
        debug!(host, port, "connected");
        Ok(Self {
            stream: Some(stream),
        })
    }

    /// Whether the connection is still open
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send one command to the server.
    ///
    /// The command bytes are written in full before this returns; a failed
    /// write closes the connection.
    pub fn send(&mut self, command: &str) -> Result<(), ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::Closed)?;
        let written = stream
            .write_all(command.as_bytes())
            .and_then(|()| stream.flush());
        if let Err(e) = written {
            self.stream = None;
            return Err(ClientError::Transmission(e));
        }
        debug!(bytes = command.len(), "command sent");
        Ok(())
    }

    /// Receive the response to the last sent command.
    ///
    /// Blocks until the server writes something, then returns the bytes of
    /// one read call decoded as UTF-8, at most [`RECV_BUFFER_SIZE`] of
    /// them. Returns `Ok(None)` when the server has closed the connection
    /// without sending anything; that is normal termination, not a
    /// failure. Either way a closed connection stays closed.
    pub fn receive(&mut self) -> Result<Option<String>, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::Closed)?;
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let n = match stream.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                self.stream = None;
                return Err(ClientError::Transmission(e));
            }
        };
        if n == 0 {
            debug!("server closed the connection");
            self.stream = None;
            return Ok(None);
        }
        match String::from_utf8(buf[..n].to_vec()) {
            Ok(text) => {
                debug!(bytes = n, "response received");
                Ok(Some(text))
            }
            Err(e) => {
                // Part of a response has been consumed; the stream
                // position is meaningless from here on.
                self.stream = None;
                Err(ClientError::Decode(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use crate::testutil::{connect, expect_command, spawn_server};

    #[test]
    fn command_roundtrip() {
        let (addr, handle) = spawn_server(|mut stream| {
            expect_command(&mut stream, "SET user 1");
            stream.write_all(b"OK").unwrap();
        });

        let mut client = connect(addr);
        client.send("SET user 1").unwrap();
        assert_eq!(client.receive().unwrap().as_deref(), Some("OK"));
        handle.join().unwrap();
    }

    #[test]
    fn connect_to_nothing_fails() {
        // Bind and drop to find a port with nothing listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = SessionClient::connect(&addr.ip().to_string(), addr.port()).unwrap_err();
        assert!(matches!(err, ClientError::Connect(_)));
    }

    #[test]
    fn remote_close_without_data_is_end_of_stream() {
        let (addr, handle) = spawn_server(drop);

        let mut client = connect(addr);
        assert!(client.receive().unwrap().is_none());
        assert!(!client.is_open());
        handle.join().unwrap();
    }

    #[test]
    fn send_after_close_fails() {
        let (addr, handle) = spawn_server(drop);

        let mut client = connect(addr);
        assert!(client.receive().unwrap().is_none());
        assert!(matches!(
            client.send("GET user").unwrap_err(),
            ClientError::Closed
        ));
        assert!(matches!(
            client.receive().unwrap_err(),
            ClientError::Closed
        ));
        handle.join().unwrap();
    }

    #[test]
    fn oversized_response_is_capped_per_receive() {
        let (addr, handle) = spawn_server(|mut stream| {
            stream.write_all(&[b'x'; 2000]).unwrap();
            // Hold the connection open until the client is done reading.
            let mut buf = [0u8; 1];
            let _ = stream.read(&mut buf);
        });

        let mut client = connect(addr);
        // Let the whole reply land in the socket buffer first, so the
        // first read is limited by the buffer bound, not by timing.
        thread::sleep(Duration::from_millis(200));

        let first = client.receive().unwrap().unwrap();
        assert_eq!(first.len(), RECV_BUFFER_SIZE);
        let rest = client.receive().unwrap().unwrap();
        assert_eq!(rest.len(), 2000 - RECV_BUFFER_SIZE);

        drop(client);
        handle.join().unwrap();
    }

    #[test]
    fn non_utf8_response_fails_decode() {
        let (addr, handle) = spawn_server(|mut stream| {
            stream.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
            let mut buf = [0u8; 1];
            let _ = stream.read(&mut buf);
        });

        let mut client = connect(addr);
        assert!(matches!(
            client.receive().unwrap_err(),
            ClientError::Decode(_)
        ));
        assert!(!client.is_open());
        handle.join().unwrap();
    }
}
