//! Device session and command builders.
//!
//! This module provides the [`SiaSession`] type that drives the Sia app
//! over a [`Transport`]. It owns the full command lifecycle: payload
//! encoding, chunked dispatch, and reply interpretation for
//!
//! - App version retrieval
//! - Public key / address derivation
//! - Detached hash signing
//! - Transaction hashing and signing
//!
//! # Ordering
//!
//! The device is a single-threaded serial endpoint: chunks are sent
//! strictly in sequence and every exchange blocks until the device
//! replies or the transport fails. There is no multiplexing and no
//! request identifier, so a session must never be shared between
//! concurrent logical commands; hold one exclusive session per device.
//!
//! # Transfer states
//!
//! Each logical command moves through
//! `Idle → Sending(chunk i) → AwaitingConfirmation → Idle`. The
//! confirmation state covers the final blocking exchange, during which
//! the device waits for the operator to approve or reject on the device
//! itself. On failure the session parks in the state it failed in, which
//! records how far the transfer got.
//!
//! # Example
//!
//! ```ignore
//! use sia_ledger_signer_core::device::{HidTransport, SiaSession};
//!
//! let transport = HidTransport::connect()?;
//! let mut session = SiaSession::new(Box::new(transport));
//!
//! let info = session.public_key(0)?;
//! println!("{}", info.address);
//! ```

use tracing::debug;

use super::Transport;
use super::apdu::{Apdu, ApduResponse};
use super::chunk;
use super::response::{self, DeviceReply, ReplyKind};
use crate::error::{Error, Result};
use crate::types::{AppVersion, Hash, KeyInfo, Signature};

/// Class byte of every Sia app command.
pub const CLA: u8 = 0xE0;

/// Change index meaning "no output is change"; the device then reviews
/// every output on screen.
pub const NO_CHANGE_INDEX: u32 = u32::MAX;

/// Sia app instruction codes.
mod ins {
    /// Report the app version.
    pub(super) const GET_VERSION: u8 = 0x01;

    /// Derive a public key and address for a key index.
    pub(super) const GET_PUBLIC_KEY: u8 = 0x02;

    /// Sign a caller-supplied 256-bit hash.
    pub(super) const SIGN_HASH: u8 = 0x04;

    /// Hash a transaction on-device, optionally signing the hash.
    pub(super) const CALC_TXN_HASH: u8 = 0x08;
}

/// P2 flags per instruction.
mod p2 {
    /// `GET_PUBLIC_KEY`: confirm the derived address on screen.
    pub(super) const DISPLAY_ADDRESS: u8 = 0x00;

    /// `GET_PUBLIC_KEY`: confirm the public key on screen.
    pub(super) const DISPLAY_PUBKEY: u8 = 0x01;

    /// `CALC_TXN_HASH`: display the hash without signing.
    pub(super) const DISPLAY_HASH: u8 = 0x00;

    /// `CALC_TXN_HASH`: sign the computed hash.
    pub(super) const SIGN_HASH: u8 = 0x01;
}

/// Where a logical transfer currently stands.
///
/// Mostly interesting after a failure: the parked state records whether
/// the transfer died mid-stream or while the device was waiting for the
/// operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No transfer in flight.
    Idle,

    /// A non-final chunk is being exchanged.
    Sending {
        /// Zero-based index of the chunk in flight.
        chunk: usize,
        /// Total number of chunks in this transfer.
        total: usize,
    },

    /// The final chunk is in flight; the device is showing its prompt and
    /// the exchange blocks until the operator responds.
    AwaitingConfirmation,
}

/// A session with the Sia app on a Ledger device.
///
/// Owns the transport exclusively for its lifetime. All commands are
/// synchronous; see the module docs for ordering requirements.
pub struct SiaSession {
    /// The underlying transport.
    transport: Box<dyn Transport>,

    /// Progress of the current (or last failed) transfer.
    state: TransferState,
}

impl core::fmt::Debug for SiaSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SiaSession")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SiaSession {
    /// Creates a session over the given transport.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            state: TransferState::Idle,
        }
    }

    /// Returns the progress of the current or last transfer.
    #[must_use]
    pub const fn state(&self) -> TransferState {
        self.state
    }

    /// Checks whether the transport still reaches a device.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Queries the version of the Sia app.
    pub fn version(&mut self) -> Result<AppVersion> {
        match self.run(ins::GET_VERSION, 0x00, &[], ReplyKind::Version)? {
            DeviceReply::Version(version) => Ok(version),
            other => Err(unexpected_variant(&other)),
        }
    }

    /// Derives the key pair at `index`, confirming the public key on
    /// screen.
    ///
    /// The reply carries both the public key and the address derived from
    /// it; the flag only selects which of the two the device renders for
    /// confirmation.
    pub fn public_key(&mut self, index: u32) -> Result<KeyInfo> {
        self.derive_key(index, p2::DISPLAY_PUBKEY)
    }

    /// Derives the key pair at `index`, confirming the address on screen.
    pub fn address(&mut self, index: u32) -> Result<KeyInfo> {
        self.derive_key(index, p2::DISPLAY_ADDRESS)
    }

    fn derive_key(&mut self, index: u32, display: u8) -> Result<KeyInfo> {
        let payload = index.to_le_bytes();
        match self.run(ins::GET_PUBLIC_KEY, display, &payload, ReplyKind::PublicKey)? {
            DeviceReply::PublicKey(info) => Ok(info),
            other => Err(unexpected_variant(&other)),
        }
    }

    /// Signs a 256-bit hash with the key at `key_index`.
    ///
    /// Only sign hashes from a trusted source: the device cannot show what
    /// the hash commits to, so it displays the raw hash for confirmation.
    pub fn sign_hash(&mut self, hash: &Hash, key_index: u32) -> Result<Signature> {
        let mut payload = Vec::with_capacity(4 + Hash::BYTE_LEN);
        payload.extend_from_slice(&key_index.to_le_bytes());
        payload.extend_from_slice(hash.as_bytes());

        match self.run(ins::SIGN_HASH, 0x00, &payload, ReplyKind::Signature)? {
            DeviceReply::Signature(sig) => Ok(sig),
            other => Err(unexpected_variant(&other)),
        }
    }

    /// Hashes a Sia-encoded transaction on-device without signing it.
    ///
    /// The transaction bytes are opaque to the host; the device parses and
    /// renders them itself. `change_index` marks the output to skip during
    /// on-screen review, or [`NO_CHANGE_INDEX`] to review all outputs.
    pub fn txn_hash(&mut self, txn: &[u8], sig_index: u16, change_index: u32) -> Result<Hash> {
        let payload = txn_payload(0, sig_index, change_index, txn);
        match self.run(ins::CALC_TXN_HASH, p2::DISPLAY_HASH, &payload, ReplyKind::Hash)? {
            DeviceReply::Hash(hash) => Ok(hash),
            other => Err(unexpected_variant(&other)),
        }
    }

    /// Hashes a Sia-encoded transaction on-device and signs the hash with
    /// the key at `key_index`.
    pub fn sign_txn(
        &mut self,
        txn: &[u8],
        sig_index: u16,
        key_index: u32,
        change_index: u32,
    ) -> Result<Signature> {
        let payload = txn_payload(key_index, sig_index, change_index, txn);
        match self.run(ins::CALC_TXN_HASH, p2::SIGN_HASH, &payload, ReplyKind::Signature)? {
            DeviceReply::Signature(sig) => Ok(sig),
            other => Err(unexpected_variant(&other)),
        }
    }

    /// Sends an ad hoc frame and returns the decoded reply without
    /// interpreting it.
    ///
    /// Intended for protocol-level tooling and error-path tests; the
    /// regular commands above are the supported surface.
    pub fn exchange(&mut self, apdu: &Apdu) -> Result<ApduResponse> {
        self.exchange_frame(apdu)
    }

    /// Runs one logical command: chunked dispatch plus interpretation.
    fn run(&mut self, ins: u8, p2: u8, payload: &[u8], kind: ReplyKind) -> Result<DeviceReply> {
        self.state = TransferState::Idle;
        let terminal = self.send_chunked(ins, p2, payload)?;
        let parsed = response::interpret(&terminal, kind)?;
        self.state = TransferState::Idle;
        Ok(parsed)
    }

    /// Drives a payload through the device in order, one frame per chunk.
    ///
    /// Returns the terminal reply: the final chunk's reply on full
    /// success, or the first non-success reply, which aborts the transfer
    /// (the protocol cannot resume a partial message, so that status is
    /// authoritative). Intermediate replies are otherwise discarded.
    fn send_chunked(&mut self, ins: u8, p2: u8, payload: &[u8]) -> Result<ApduResponse> {
        let total = chunk::count(payload.len());
        let mut terminal = None;

        for (i, piece) in chunk::split(payload).enumerate() {
            if i + 1 == total {
                debug!(chunk = i, total, "sending final chunk, awaiting confirmation");
                self.state = TransferState::AwaitingConfirmation;
            } else {
                debug!(chunk = i, total, "sending chunk");
                self.state = TransferState::Sending { chunk: i, total };
            }

            let apdu = Apdu::new(CLA, ins, piece.p1, p2, piece.data.to_vec());
            let reply = self.exchange_frame(&apdu)?;
            if !reply.is_success() {
                return Ok(reply);
            }
            terminal = Some(reply);
        }

        // split() always yields at least one chunk, so a reply exists.
        terminal.ok_or_else(|| Error::MalformedReply("no frames were exchanged".to_string()))
    }

    /// Encodes one frame, exchanges it, and decodes the raw reply.
    fn exchange_frame(&mut self, apdu: &Apdu) -> Result<ApduResponse> {
        let frame = apdu.encode()?;
        debug!(frame = %hex::encode(&frame), "apdu >");

        let raw = self.transport.exchange(&frame)?;
        debug!(reply = %hex::encode(&raw), "apdu <");

        ApduResponse::from_bytes(&raw)
    }
}

/// Builds the `CALC_TXN_HASH` payload:
/// key index (LE u32) ++ signature index (LE u16) ++ change index (LE u32)
/// ++ Sia-encoded transaction. The field order is part of the wire
/// contract and must match the firmware byte for byte.
fn txn_payload(key_index: u32, sig_index: u16, change_index: u32, txn: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(10 + txn.len());
    payload.extend_from_slice(&key_index.to_le_bytes());
    payload.extend_from_slice(&sig_index.to_le_bytes());
    payload.extend_from_slice(&change_index.to_le_bytes());
    payload.extend_from_slice(txn);
    payload
}

fn unexpected_variant(reply: &DeviceReply) -> Error {
    Error::MalformedReply(format!("reply kind does not match the command: {reply:?}"))
}
