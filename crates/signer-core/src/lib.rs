//! Sia Ledger Signer Core Library
//!
//! This crate provides the host side of the command/response protocol
//! used to drive the Sia app on Ledger hardware signing devices: building
//! command frames, splitting oversized payloads into transport-sized
//! chunks, and interpreting the device's status-word-terminated replies
//! into typed results.
//!
//! # Overview
//!
//! The device holds the Ed25519 key pairs; the host never sees a private
//! key. This library implements everything between a caller's "sign this"
//! and the raw bytes on the USB cable:
//!
//! - **Command builders**: derive a public key/address, sign a detached
//!   hash, hash and sign a full transaction
//! - **Chunked transfer**: payloads above the 255-byte frame ceiling are
//!   split and streamed in order with continuation markers
//! - **Reply interpretation**: status-word classification and slicing of
//!   successful replies into [`PublicKey`], [`Signature`], and [`Hash`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Caller / CLI                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      SiaSession                             │
//! │   version │ public_key │ address │ sign_hash │ sign_txn     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │
//! │  │  APDU   │  │  Chunked │  │  Status  │  │    Reply     │  │
//! │  │  Codec  │  │ Transfer │  │  Words   │  │ Interpreter  │  │
//! │  └─────────┘  └──────────┘  └──────────┘  └──────────────┘  │
//! ├─────────────────────────────────────────────────────────────┤
//! │              Transport (USB HID / Speculos TCP)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use sia_ledger_signer_core::device::{HidTransport, NO_CHANGE_INDEX, SiaSession};
//!
//! let transport = HidTransport::connect()?;
//! let mut session = SiaSession::new(Box::new(transport));
//!
//! // Derive the address for key index 0; the device shows it for
//! // confirmation before replying.
//! let info = session.address(0)?;
//! println!("address: {}", info.address);
//!
//! // Sign a transaction (Sia-encoded bytes, opaque to the host).
//! let sig = session.sign_txn(&txn_bytes, 0, 0, NO_CHANGE_INDEX)?;
//! println!("signature: {sig}");
//! ```
//!
//! # Transports
//!
//! The protocol layer only needs a [`device::Transport`]: a blocking
//! exchange of raw frame bytes. Two implementations ship behind feature
//! flags:
//!
//! - `hid` (default): USB HID for real Ledger devices
//! - `tcp`: the Speculos simulator's APDU socket
//!
//! Tests drive the same protocol layer with scripted in-memory
//! transports.
//!
//! # Concurrency
//!
//! One session per device, one command at a time. The protocol has no
//! request identifiers, so concurrent commands against one device are
//! undefined; every exchange blocks until the device replies — including
//! however long the operator looks at a confirmation prompt.
//!
//! # Error Handling
//!
//! Every fallible operation returns the crate's [`Error`]. Of particular
//! note: [`Error::UserRefused`] (device present, operator said no) is
//! distinct from [`Error::DeviceUnavailable`] (no device reachable);
//! retrying is always the caller's decision because a multi-chunk
//! transfer restarts from its first chunk.

// Modules
pub mod device;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use device::{SiaSession, Transport};
pub use error::{Error, Result};
pub use types::{Address, AppVersion, Hash, KeyInfo, PublicKey, Signature};
