//! Reply interpretation: status classification and payload slicing.
//!
//! The interpreter is the single place where a status word becomes an
//! error and where a successful reply's bytes become a typed value. It is
//! only ever handed a *completed* exchange — transport faults surface as
//! [`Error::DeviceUnavailable`] long before this point, which is what lets
//! callers tell "device said no" apart from "device unreachable".
//!
//! [`Error::DeviceUnavailable`]: crate::error::Error::DeviceUnavailable

use super::apdu::ApduResponse;
use super::status::StatusWord;
use crate::error::{Error, Result};
use crate::types::{Address, AppVersion, Hash, KeyInfo, PublicKey, Signature};

/// The kind of payload a command expects in its final reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Three version bytes: major, minor, patch.
    Version,

    /// A 32-byte public key followed by the derived address string.
    PublicKey,

    /// A 64-byte Ed25519 signature.
    Signature,

    /// A 32-byte hash.
    Hash,
}

/// A typed reply sliced out of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceReply {
    /// App version.
    Version(AppVersion),

    /// Public key and derived address.
    PublicKey(KeyInfo),

    /// Detached signature.
    Signature(Signature),

    /// Transaction or input hash.
    Hash(Hash),
}

/// Classifies a reply's status word and slices its payload.
///
/// # Errors
///
/// - [`Error::UserRefused`] for status `0x6985`; the payload is ignored
///   regardless of content.
/// - A dedicated error for the other known status words, or
///   [`Error::DeviceRejected`] carrying the raw code for unknown ones.
/// - [`Error::UnexpectedReplyLength`] when a successful reply is shorter
///   than the expected kind requires.
pub fn interpret(reply: &ApduResponse, kind: ReplyKind) -> Result<DeviceReply> {
    let status = reply.status_word();
    if !reply.is_success() {
        return Err(StatusWord::error_for(status));
    }

    let data = reply.data();
    match kind {
        ReplyKind::Version => {
            if data.len() != 3 {
                return Err(Error::UnexpectedReplyLength {
                    expected: 3,
                    actual: data.len(),
                });
            }
            Ok(DeviceReply::Version(AppVersion {
                major: data[0],
                minor: data[1],
                patch: data[2],
            }))
        }
        ReplyKind::PublicKey => {
            let key: [u8; PublicKey::BYTE_LEN] =
                data.get(..PublicKey::BYTE_LEN)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(Error::UnexpectedReplyLength {
                        expected: PublicKey::BYTE_LEN,
                        actual: data.len(),
                    })?;
            let address = Address::from_device_bytes(&data[PublicKey::BYTE_LEN..])?;
            Ok(DeviceReply::PublicKey(KeyInfo {
                public_key: PublicKey::new(key),
                address,
            }))
        }
        ReplyKind::Signature => {
            let sig: [u8; Signature::BYTE_LEN] =
                data.get(..Signature::BYTE_LEN)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(Error::UnexpectedReplyLength {
                        expected: Signature::BYTE_LEN,
                        actual: data.len(),
                    })?;
            Ok(DeviceReply::Signature(Signature::new(sig)))
        }
        ReplyKind::Hash => {
            let hash: [u8; Hash::BYTE_LEN] = data
                .get(..Hash::BYTE_LEN)
                .and_then(|b| b.try_into().ok())
                .ok_or(Error::UnexpectedReplyLength {
                    expected: Hash::BYTE_LEN,
                    actual: data.len(),
                })?;
            Ok(DeviceReply::Hash(Hash::new(hash)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(bytes: &[u8]) -> ApduResponse {
        ApduResponse::from_bytes(bytes).unwrap()
    }

    const TEST_ADDRESS: &str =
        "fc8caec1fc8fd727fe5107bd949009dafbf330515ab4ad29e6e36d62f17982acc458e71d3694";

    #[test]
    fn version_reply() {
        let parsed = interpret(&reply(&[0x00, 0x04, 0x05, 0x90, 0x00]), ReplyKind::Version);
        assert_eq!(
            parsed.unwrap(),
            DeviceReply::Version(AppVersion {
                major: 0,
                minor: 4,
                patch: 5,
            })
        );
    }

    #[test]
    fn version_reply_wrong_length() {
        let err = interpret(&reply(&[0x00, 0x04, 0x90, 0x00]), ReplyKind::Version).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedReplyLength {
                expected: 3,
                actual: 2,
            }
        ));
    }

    #[test]
    fn public_key_reply_splits_key_and_address() {
        let mut raw = vec![0x42; 32];
        raw.extend_from_slice(TEST_ADDRESS.as_bytes());
        raw.extend_from_slice(&[0x90, 0x00]);

        match interpret(&reply(&raw), ReplyKind::PublicKey).unwrap() {
            DeviceReply::PublicKey(info) => {
                assert_eq!(info.public_key.as_bytes(), &[0x42; 32]);
                assert_eq!(info.address.as_str(), TEST_ADDRESS);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn signature_reply_takes_first_64_bytes() {
        let mut raw = vec![0x5A; 64];
        raw.extend_from_slice(&[0x90, 0x00]);

        match interpret(&reply(&raw), ReplyKind::Signature).unwrap() {
            DeviceReply::Signature(sig) => assert_eq!(sig.as_bytes(), &[0x5A; 64]),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn short_signature_reply_is_an_error() {
        let mut raw = vec![0x5A; 63];
        raw.extend_from_slice(&[0x90, 0x00]);

        let err = interpret(&reply(&raw), ReplyKind::Signature).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedReplyLength {
                expected: 64,
                actual: 63,
            }
        ));
    }

    #[test]
    fn refusal_ignores_payload_content() {
        // A refusal with garbage data still interprets as a clean refusal.
        let raw = [0xDE, 0xAD, 0xBE, 0xEF, 0x69, 0x85];
        let err = interpret(&reply(&raw), ReplyKind::Signature).unwrap_err();
        assert!(matches!(err, Error::UserRefused));
    }

    #[test]
    fn unknown_status_surfaces_raw_code() {
        let err = interpret(&reply(&[0x68, 0x01]), ReplyKind::Hash).unwrap_err();
        assert!(matches!(err, Error::DeviceRejected(0x6801)));
    }

    #[test]
    fn known_non_success_statuses_map_to_variants() {
        let err = interpret(&reply(&[0x6D, 0x00]), ReplyKind::Hash).unwrap_err();
        assert!(matches!(err, Error::InstructionNotSupported));

        let err = interpret(&reply(&[0x6B, 0x01]), ReplyKind::Hash).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter));
    }
}
