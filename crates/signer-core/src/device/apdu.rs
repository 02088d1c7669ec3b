//! APDU command and response framing.
//!
//! This module provides the pure frame codec for talking to the Sia app:
//! encoding a command into the fixed 5-byte-header frame the device
//! expects, and splitting a raw reply into payload and status word.
//!
//! # Command Frame
//!
//! ```text
//! | CLA | INS | P1 | P2 | Len | Data      |
//! |-----|-----|----|----|-----|-----------|
//! | 1B  | 1B  | 1B | 1B | 1B  | 0..255 B  |
//! ```
//!
//! - **CLA**: class byte (fixed `0xE0` for the Sia app)
//! - **INS**: instruction byte (operation selector)
//! - **P1**: chunk position (`0x00` first/only, `0x80` continuation)
//! - **P2**: operation-specific flag (display selector or sign flag)
//! - **Len**: payload length — a single byte, so payloads cap at 255
//!
//! # Reply
//!
//! ```text
//! | Data | SW1 | SW2 |
//! |------|-----|-----|
//! | Var  | 1B  | 1B  |
//! ```
//!
//! The trailing two bytes are the big-endian status word; they are present
//! on every completed exchange, even when the data is empty.
//!
//! The codec performs no validation beyond the two structural rules above
//! and has no side effects.

use super::status::StatusWord;
use crate::error::{Error, Result};

/// An APDU command frame.
///
/// Immutable once built; consumed by a single transport exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu {
    /// Class byte.
    cla: u8,

    /// Instruction byte.
    ins: u8,

    /// Parameter 1 (chunk position).
    p1: u8,

    /// Parameter 2 (operation-specific flag).
    p2: u8,

    /// Command payload.
    data: Vec<u8>,
}

impl Apdu {
    /// Maximum payload length of a single frame.
    ///
    /// The length field is one byte, so this is a hard ceiling; larger
    /// logical payloads must be split across frames.
    pub const MAX_DATA: usize = 255;

    /// Creates a new APDU command.
    ///
    /// The payload length is not checked here; [`encode`](Self::encode)
    /// rejects oversized payloads.
    #[must_use]
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
        }
    }

    /// Returns the class byte.
    #[must_use]
    pub const fn cla(&self) -> u8 {
        self.cla
    }

    /// Returns the instruction byte.
    #[must_use]
    pub const fn ins(&self) -> u8 {
        self.ins
    }

    /// Returns parameter 1.
    #[must_use]
    pub const fn p1(&self) -> u8 {
        self.p1
    }

    /// Returns parameter 2.
    #[must_use]
    pub const fn p2(&self) -> u8 {
        self.p2
    }

    /// Returns the command payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Serializes the command to wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_DATA`](Self::MAX_DATA). The device does not speak extended
    /// frames, so there is no fallback encoding.
    ///
    /// # Example
    ///
    /// ```
    /// use sia_ledger_signer_core::device::Apdu;
    ///
    /// let apdu = Apdu::new(0xE0, 0x02, 0x00, 0x01, vec![0x05, 0x00, 0x00, 0x00]);
    /// let bytes = apdu.encode()?;
    /// assert_eq!(&bytes[..5], &[0xE0, 0x02, 0x00, 0x01, 0x04]);
    /// # Ok::<(), sia_ledger_signer_core::Error>(())
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.data.len() > Self::MAX_DATA {
            return Err(Error::PayloadTooLarge(self.data.len()));
        }

        let mut bytes = Vec::with_capacity(5 + self.data.len());
        bytes.push(self.cla);
        bytes.push(self.ins);
        bytes.push(self.p1);
        bytes.push(self.p2);
        bytes.push(self.data.len() as u8);
        bytes.extend_from_slice(&self.data);
        Ok(bytes)
    }
}

/// A decoded reply from the device.
///
/// Holds the reply payload and the 16-bit status word that terminated it.
/// Classification of the status word into success or a specific error is
/// the response interpreter's job; this type only splits the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Reply payload.
    data: Vec<u8>,

    /// Trailing status word, big-endian on the wire.
    status: u16,
}

impl ApduResponse {
    /// Decodes a raw reply into payload and status word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedReply`] if the reply is shorter than the
    /// two mandatory status-word bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use sia_ledger_signer_core::device::ApduResponse;
    ///
    /// let reply = ApduResponse::from_bytes(&[0x01, 0x02, 0x90, 0x00])?;
    /// assert_eq!(reply.data(), &[0x01, 0x02]);
    /// assert_eq!(reply.status_word(), 0x9000);
    /// # Ok::<(), sia_ledger_signer_core::Error>(())
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::MalformedReply(format!(
                "reply of {} bytes is missing the status word",
                bytes.len()
            )));
        }

        let split = bytes.len() - 2;
        let status = u16::from_be_bytes([bytes[split], bytes[split + 1]]);
        Ok(Self {
            data: bytes[..split].to_vec(),
            status,
        })
    }

    /// Returns the reply payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the reply and returns the payload.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the full 16-bit status word.
    #[must_use]
    pub const fn status_word(&self) -> u16 {
        self.status
    }

    /// Checks whether the status word is `0x9000`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == StatusWord::Ok.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apdu_new() {
        let apdu = Apdu::new(0xE0, 0x04, 0x00, 0x00, vec![0xAA, 0xBB]);

        assert_eq!(apdu.cla(), 0xE0);
        assert_eq!(apdu.ins(), 0x04);
        assert_eq!(apdu.p1(), 0x00);
        assert_eq!(apdu.p2(), 0x00);
        assert_eq!(apdu.data(), &[0xAA, 0xBB]);
    }

    #[test]
    fn apdu_encode() {
        let apdu = Apdu::new(0xE0, 0x02, 0x00, 0x01, vec![0x05, 0x00, 0x00, 0x00]);
        let bytes = apdu.encode().unwrap();

        assert_eq!(bytes, vec![0xE0, 0x02, 0x00, 0x01, 0x04, 0x05, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn apdu_encode_empty_payload() {
        let apdu = Apdu::new(0xE0, 0x01, 0x00, 0x00, vec![]);
        let bytes = apdu.encode().unwrap();

        assert_eq!(bytes, vec![0xE0, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn apdu_encode_at_ceiling() {
        let apdu = Apdu::new(0xE0, 0x08, 0x00, 0x01, vec![0x11; 255]);
        let bytes = apdu.encode().unwrap();

        assert_eq!(bytes.len(), 5 + 255);
        assert_eq!(bytes[4], 255);
    }

    #[test]
    fn apdu_encode_rejects_oversized_payload() {
        let apdu = Apdu::new(0xE0, 0x08, 0x00, 0x01, vec![0x11; 256]);
        let err = apdu.encode().unwrap_err();

        assert!(matches!(err, Error::PayloadTooLarge(256)));
    }

    #[test]
    fn apdu_header_round_trip() {
        let apdu = Apdu::new(0xE0, 0x08, 0x80, 0x01, vec![0xAB; 7]);
        let bytes = apdu.encode().unwrap();

        assert_eq!(bytes[0], apdu.cla());
        assert_eq!(bytes[1], apdu.ins());
        assert_eq!(bytes[2], apdu.p1());
        assert_eq!(bytes[3], apdu.p2());
        assert_eq!(bytes[4] as usize, apdu.data().len());
        assert_eq!(&bytes[5..], apdu.data());
    }

    #[test]
    fn response_from_bytes() {
        let reply = ApduResponse::from_bytes(&[0x01, 0x02, 0x03, 0x90, 0x00]).unwrap();

        assert_eq!(reply.data(), &[0x01, 0x02, 0x03]);
        assert_eq!(reply.status_word(), 0x9000);
        assert!(reply.is_success());
    }

    #[test]
    fn response_status_only() {
        let reply = ApduResponse::from_bytes(&[0x69, 0x85]).unwrap();

        assert!(reply.data().is_empty());
        assert_eq!(reply.status_word(), 0x6985);
        assert!(!reply.is_success());
    }

    #[test]
    fn response_rejects_short_replies() {
        assert!(matches!(
            ApduResponse::from_bytes(&[]),
            Err(Error::MalformedReply(_))
        ));
        assert!(matches!(
            ApduResponse::from_bytes(&[0x90]),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn response_into_data() {
        let reply = ApduResponse::from_bytes(&[0xAA, 0xBB, 0x90, 0x00]).unwrap();
        assert_eq!(reply.into_data(), vec![0xAA, 0xBB]);
    }
}
