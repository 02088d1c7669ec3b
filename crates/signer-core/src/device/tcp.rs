//! TCP transport for the Speculos device simulator.
//!
//! Speculos accepts APDU frames over a plain socket with 4-byte
//! big-endian length framing. The reply length on the wire counts only
//! the data bytes; the two status-word bytes follow unconditionally, so
//! the transport reads `length + 2` bytes and hands the whole thing to
//! the protocol layer.
//!
//! # Example
//!
//! ```ignore
//! use sia_ledger_signer_core::device::{SiaSession, TcpTransport};
//!
//! let transport = TcpTransport::connect("127.0.0.1:9999")?;
//! let mut session = SiaSession::new(Box::new(transport));
//! println!("{}", session.version()?);
//! ```

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use super::Transport;
use crate::error::{Error, Result};

/// A TCP transport for a simulated device.
pub struct TcpTransport {
    /// The connected socket.
    stream: TcpStream,
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport").finish_non_exhaustive()
    }
}

impl TcpTransport {
    /// Connects to a Speculos APDU endpoint, typically `127.0.0.1:9999`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] if the socket cannot be opened.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| Error::ConnectionFailed(format!("failed to connect to simulator: {e}")))?;
        Ok(Self { stream })
    }
}

impl Transport for TcpTransport {
    fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let fault = |e: std::io::Error| Error::DeviceUnavailable(format!("simulator I/O: {e}"));

        self.stream
            .write_all(&(frame.len() as u32).to_be_bytes())
            .map_err(fault)?;
        self.stream.write_all(frame).map_err(fault)?;

        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).map_err(fault)?;

        // The advertised length excludes the trailing status word.
        let reply_len = u32::from_be_bytes(len_buf) as usize + 2;
        let mut reply = vec![0u8; reply_len];
        self.stream.read_exact(&mut reply).map_err(fault)?;
        Ok(reply)
    }

    fn is_connected(&self) -> bool {
        self.stream.peer_addr().is_ok()
    }
}
