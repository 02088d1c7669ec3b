//! USB HID transport for real Ledger devices.
//!
//! Ledger devices expose a 64-byte-report HID interface. An APDU frame is
//! wrapped in a small stream protocol before it goes on the wire:
//!
//! ```text
//! per 64-byte report:
//! | channel (2B BE) | tag 0x05 | sequence (2B BE) | stream bytes |
//!
//! stream = reply/command length (2B BE) ++ frame bytes
//! ```
//!
//! The channel is fixed at `0x0101` and the sequence restarts at zero for
//! every exchange. Reads block until the device answers, which includes
//! the whole time the operator spends deciding at a confirmation prompt.
//!
//! # Example
//!
//! ```ignore
//! use sia_ledger_signer_core::device::{HidTransport, SiaSession};
//!
//! let transport = HidTransport::connect()?;
//! let mut session = SiaSession::new(Box::new(transport));
//! println!("{}", session.version()?);
//! ```

use hidapi::{HidApi, HidDevice};

use super::Transport;
use crate::error::{Error, Result};

/// Ledger USB vendor ID.
const LEDGER_VENDOR_ID: u16 = 0x2c97;

/// Product IDs of supported Ledger models: Nano S, Nano X, Stax.
const LEDGER_PRODUCT_IDS: [u16; 3] = [0x0001, 0x0004, 0x0006];

/// HID communication channel identifier.
const CHANNEL_ID: u16 = 0x0101;

/// Command tag marking APDU traffic.
const COMMAND_TAG: u8 = 0x05;

/// HID report size.
const PACKET_SIZE: usize = 64;

/// Stream bytes carried per report after the 5-byte packet header.
const PACKET_DATA: usize = PACKET_SIZE - 5;

/// A USB HID transport for a Ledger device.
pub struct HidTransport {
    /// The open HID device handle.
    device: HidDevice,
}

impl std::fmt::Debug for HidTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidTransport").finish_non_exhaustive()
    }
}

impl HidTransport {
    /// Connects to the first attached Ledger device.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotFound`] if no Ledger is attached
    /// - [`Error::ConnectionFailed`] if the device cannot be opened
    ///   (commonly: claimed by another process, or missing udev rules on
    ///   Linux)
    pub fn connect() -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| Error::ConnectionFailed(format!("failed to initialize HID: {e}")))?;

        let info = api
            .device_list()
            .find(|d| {
                d.vendor_id() == LEDGER_VENDOR_ID
                    && LEDGER_PRODUCT_IDS.contains(&d.product_id())
            })
            .ok_or(Error::DeviceNotFound)?;

        let device = info
            .open_device(&api)
            .map_err(|e| Error::ConnectionFailed(format!("failed to open Ledger device: {e}")))?;

        Ok(Self { device })
    }

    /// Lists the attached Ledger devices by product string.
    pub fn list_devices() -> Result<Vec<String>> {
        let api = HidApi::new()
            .map_err(|e| Error::ConnectionFailed(format!("failed to initialize HID: {e}")))?;

        Ok(api
            .device_list()
            .filter(|d| {
                d.vendor_id() == LEDGER_VENDOR_ID
                    && LEDGER_PRODUCT_IDS.contains(&d.product_id())
            })
            .map(|d| d.product_string().unwrap_or("Ledger device").to_string())
            .collect())
    }

    /// Writes one frame as a sequence of 64-byte reports.
    fn write_frame(&self, frame: &[u8]) -> Result<()> {
        let mut stream = Vec::with_capacity(2 + frame.len());
        stream.extend_from_slice(&(frame.len() as u16).to_be_bytes());
        stream.extend_from_slice(frame);

        for (seq, piece) in stream.chunks(PACKET_DATA).enumerate() {
            // Leading zero byte: HID report number (the device uses none).
            let mut packet = [0u8; PACKET_SIZE + 1];
            packet[1..3].copy_from_slice(&CHANNEL_ID.to_be_bytes());
            packet[3] = COMMAND_TAG;
            packet[4..6].copy_from_slice(&(seq as u16).to_be_bytes());
            packet[6..6 + piece.len()].copy_from_slice(piece);

            self.device
                .write(&packet)
                .map_err(|e| Error::DeviceUnavailable(format!("HID write failed: {e}")))?;
        }
        Ok(())
    }

    /// Reads reports until a full reply has been reassembled.
    fn read_reply(&self) -> Result<Vec<u8>> {
        let mut stream: Vec<u8> = Vec::new();
        let mut expected: Option<usize> = None;
        let mut seq: u16 = 0;

        loop {
            let mut packet = [0u8; PACKET_SIZE];
            let n = self
                .device
                .read(&mut packet)
                .map_err(|e| Error::DeviceUnavailable(format!("HID read failed: {e}")))?;
            if n < 5 {
                return Err(Error::MalformedReply(format!(
                    "HID report of {n} bytes is shorter than the packet header"
                )));
            }

            let channel = u16::from_be_bytes([packet[0], packet[1]]);
            let tag = packet[2];
            let packet_seq = u16::from_be_bytes([packet[3], packet[4]]);
            if channel != CHANNEL_ID {
                return Err(Error::MalformedReply(format!(
                    "bad HID channel {channel:#06x}"
                )));
            }
            if tag != COMMAND_TAG {
                return Err(Error::MalformedReply(format!("bad HID tag {tag:#04x}")));
            }
            if packet_seq != seq {
                return Err(Error::MalformedReply(format!(
                    "bad HID sequence number {packet_seq} (expected {seq})"
                )));
            }
            seq += 1;

            stream.extend_from_slice(&packet[5..n]);

            if expected.is_none() && stream.len() >= 2 {
                expected = Some(u16::from_be_bytes([stream[0], stream[1]]) as usize);
            }
            if let Some(len) = expected
                && stream.len() >= 2 + len
            {
                return Ok(stream[2..2 + len].to_vec());
            }
        }
    }
}

impl Transport for HidTransport {
    fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        self.write_frame(frame)?;
        self.read_reply()
    }

    fn is_connected(&self) -> bool {
        self.device.get_device_info().is_ok()
    }
}
