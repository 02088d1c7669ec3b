//! Sia Ledger device communication module.
//!
//! This module provides the host side of the command/response protocol
//! spoken by the Sia app on Ledger devices:
//!
//! - APDU command/response framing
//! - Chunked transfer of oversized payloads
//! - Status-word classification and reply interpretation
//! - The signing commands themselves
//!
//! # Architecture
//!
//! The module is organized into several submodules:
//!
//! - [`apdu`]: command/response frame codec
//! - [`status`]: status-word taxonomy
//! - [`response`]: reply interpretation into typed results
//! - [`session`]: the [`SiaSession`] command layer and chunk driver
//!
//! # Transport Abstraction
//!
//! The [`Transport`] trait abstracts over how frame bytes reach the
//! device:
//!
//! - USB HID for real Ledger hardware ([`HidTransport`], `hid` feature)
//! - TCP for the Speculos simulator ([`TcpTransport`], `tcp` feature)
//!
//! A transport is a dumb byte pipe: it neither builds nor parses frames,
//! so the same protocol layer drives hardware, simulator, and the
//! scripted transports the tests use.

pub mod apdu;
pub mod response;
pub mod session;
pub mod status;

pub(crate) mod chunk;

#[cfg(feature = "hid")]
pub mod hid;

#[cfg(feature = "tcp")]
pub mod tcp;

pub use apdu::{Apdu, ApduResponse};
pub use response::{DeviceReply, ReplyKind, interpret};
pub use session::{CLA, NO_CHANGE_INDEX, SiaSession, TransferState};
pub use status::StatusWord;

#[cfg(feature = "hid")]
pub use hid::HidTransport;

#[cfg(feature = "tcp")]
pub use tcp::TcpTransport;

use crate::error::Result;

/// A transport carrying raw frames to and from a Ledger device.
///
/// One call to [`exchange`](Self::exchange) is one full round trip: it
/// blocks until the device replies or the transport fails. The reply
/// bytes include the trailing status word; splitting it off is the
/// protocol layer's job.
pub trait Transport {
    /// Sends an encoded command frame and returns the raw reply bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnavailable`](crate::Error::DeviceUnavailable)
    /// if the device cannot be reached — unplugged, claimed by another
    /// process, or timed out. No reply bytes exist in that case.
    fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>>;

    /// Checks if the transport still reaches a device.
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::error::Error;

    /// A minimal scripted transport.
    struct MockTransport {
        replies: VecDeque<Vec<u8>>,
    }

    impl MockTransport {
        fn new(replies: Vec<Vec<u8>>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
            }
        }
    }

    impl Transport for MockTransport {
        fn exchange(&mut self, _frame: &[u8]) -> Result<Vec<u8>> {
            self.replies
                .pop_front()
                .ok_or_else(|| Error::DeviceUnavailable("no reply scripted".to_string()))
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[test]
    fn mock_transport() {
        let mut transport = MockTransport::new(vec![vec![0x90, 0x00]]);

        let apdu = Apdu::new(0xE0, 0x01, 0x00, 0x00, vec![]);
        let reply = transport.exchange(&apdu.encode().unwrap()).unwrap();

        assert_eq!(reply, vec![0x90, 0x00]);
        assert!(transport.is_connected());
    }

    #[test]
    fn exhausted_mock_reports_unavailable() {
        let mut transport = MockTransport::new(vec![]);
        let err = transport.exchange(&[0xE0, 0x01, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
    }
}
