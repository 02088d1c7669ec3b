//! Error types for the Sia Ledger signer library.
//!
//! This module provides a single error type [`enum@Error`] covering every
//! failure mode of the host-side protocol: transport faults, malformed
//! frames, and the status words the device itself returns.
//!
//! # Error Categories
//!
//! - **Transport errors**: no device found, connection lost mid-exchange
//! - **Framing errors**: oversized command payloads, truncated replies
//! - **Device status errors**: the device completed the exchange and
//!   answered with a non-success status word
//!
//! Callers that need to distinguish "device present, said no" from "device
//! absent or unreachable" match on [`Error::UserRefused`] versus
//! [`Error::DeviceUnavailable`] — a refusal always comes with a completed
//! exchange, a transport fault never does.

use core::result::Result as CoreResult;

use thiserror::Error;

/// The main error type for the Sia Ledger signer library.
///
/// Every layer of the protocol returns this type; nothing is silently
/// swallowed, and nothing below the CLI prints or terminates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// No Ledger device was found.
    #[error("no Ledger device found")]
    DeviceNotFound,

    /// Failed to open a connection to the device.
    #[error("failed to connect to Ledger device: {0}")]
    ConnectionFailed(String),

    /// The transport failed mid-exchange: device unplugged, I/O error, or
    /// timeout. No reply was received, so no status word is available.
    ///
    /// Multi-chunk transfers cannot be resumed; after reconnecting, the
    /// caller must restart the whole operation from the first chunk.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    // =========================================================================
    // Framing Errors
    // =========================================================================
    /// A command payload exceeded the 255-byte frame ceiling.
    ///
    /// This is a programming error in the caller: payloads above the ceiling
    /// must go through the chunked transfer path instead.
    #[error("command payload of {0} bytes exceeds the 255-byte frame limit")]
    PayloadTooLarge(usize),

    /// A reply was too short to carry the mandatory trailing status word.
    #[error("malformed reply: {0}")]
    MalformedReply(String),

    // =========================================================================
    // Device Status Errors
    // =========================================================================
    /// The user rejected the request on the device (status `0x6985`).
    ///
    /// This is a normal negative outcome, not a protocol failure; any data
    /// accompanying the status word is ignored.
    #[error("user refused the request on the device")]
    UserRefused,

    /// The device rejected the request parameters (status `0x6B01`).
    #[error("device rejected the request parameters")]
    InvalidParameter,

    /// The instruction byte is not supported by the running app (`0x6D00`).
    #[error("instruction not supported (is the Sia app running?)")]
    InstructionNotSupported,

    /// The class byte is not supported by the running app (`0x6E00`).
    #[error("class byte not supported (is the Sia app running?)")]
    ClassNotSupported,

    /// The device answered with a status word outside the known taxonomy.
    #[error("device rejected the request with status word {0:#06x}")]
    DeviceRejected(u16),

    // =========================================================================
    // Reply Shape Errors
    // =========================================================================
    /// A successful reply did not carry the expected number of data bytes.
    #[error("reply carried {actual} data bytes, expected at least {expected}")]
    UnexpectedReplyLength {
        /// Minimum number of data bytes the operation requires.
        expected: usize,
        /// Number of data bytes actually received.
        actual: usize,
    },

    /// The address bytes in a public-key reply were not a valid address.
    #[error("invalid address in device reply: {0}")]
    InvalidAddress(String),
}

/// A specialized [`Result`] type for Sia Ledger signer operations.
pub type Result<T> = CoreResult<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::DeviceNotFound;
        assert_eq!(err.to_string(), "no Ledger device found");

        let err = Error::PayloadTooLarge(300);
        assert_eq!(
            err.to_string(),
            "command payload of 300 bytes exceeds the 255-byte frame limit"
        );

        let err = Error::DeviceRejected(0x6B02);
        assert_eq!(
            err.to_string(),
            "device rejected the request with status word 0x6b02"
        );
    }

    #[test]
    fn refusal_is_not_unavailability() {
        // The two negative outcomes callers must be able to tell apart.
        let refused = Error::UserRefused;
        let absent = Error::DeviceUnavailable("unplugged".to_string());
        assert!(matches!(refused, Error::UserRefused));
        assert!(matches!(absent, Error::DeviceUnavailable(_)));
    }
}
