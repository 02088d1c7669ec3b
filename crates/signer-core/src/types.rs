//! Value types returned by the Sia Ledger app.
//!
//! Each type wraps the fixed-width byte slice the device returns for one
//! kind of result and carries the textual form the Sia ecosystem uses for
//! it: `ed25519:`-prefixed hex for public keys, base64 for signatures,
//! plain hex for hashes.
//!
//! # Example
//!
//! ```
//! use sia_ledger_signer_core::types::PublicKey;
//!
//! let key = PublicKey::new([0u8; 32]);
//! assert!(key.to_string().starts_with("ed25519:"));
//! ```

use core::fmt;
use core::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Serde helper for hex encoding/decoding fixed-width byte arrays.
mod hex_array {
    use hex::{decode, encode};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode(bytes))
    }

    pub(super) fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = decode(&s).map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| de::Error::custom(format!("expected {N} bytes")))
    }
}

/// An Ed25519 public key held by the device.
///
/// The device derives one key pair per key index; this is the 32-byte
/// public half. The textual form is the Sia convention
/// `ed25519:<lowercase hex>`.
///
/// # Example
///
/// ```
/// use sia_ledger_signer_core::types::PublicKey;
///
/// let key = PublicKey::new([0xab; 32]);
/// assert_eq!(key.as_bytes()[0], 0xab);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex_array")] [u8; 32]);

impl PublicKey {
    /// The length of a public key in bytes.
    pub const BYTE_LEN: usize = 32;

    /// Creates a public key from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Consumes the key and returns the raw bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ed25519:{}", hex::encode(self.0))
    }
}

/// A 64-byte Ed25519 signature produced by the device.
///
/// The textual form is standard base64, matching what the original host
/// tools print and what Sia transaction JSON embeds.
///
/// # Example
///
/// ```
/// use sia_ledger_signer_core::types::Signature;
///
/// let sig = Signature::new([0u8; 64]);
/// assert_eq!(sig.to_string().len(), 88);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "hex_array")] [u8; 64]);

impl Signature {
    /// The length of a signature in bytes.
    pub const BYTE_LEN: usize = 64;

    /// Creates a signature from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Consumes the signature and returns the raw bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 64] {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(self.0))
    }
}

/// A 32-byte hash, either signed by [`sign_hash`] or computed on-device
/// from a transaction.
///
/// [`sign_hash`]: crate::device::SiaSession::sign_hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hash(#[serde(with = "hex_array")] [u8; 32]);

impl Hash {
    /// The length of a hash in bytes.
    pub const BYTE_LEN: usize = 32;

    /// Creates a hash from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(bytes))
    }
}

/// A Sia address as rendered by the device.
///
/// The device appends the address to every public-key reply as a 76-byte
/// ASCII string: 64 hex characters of unlock hash followed by 12 hex
/// characters of checksum. The checksum is the device's to compute; the
/// host only validates the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// The length of an address string in characters.
    pub const STR_LEN: usize = 76;

    /// Parses an address from the raw bytes of a device reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the bytes are not 76 lowercase
    /// hex characters.
    pub fn from_device_bytes(bytes: &[u8]) -> Result<Self> {
        let s = core::str::from_utf8(bytes)
            .map_err(|_| Error::InvalidAddress("not valid UTF-8".to_string()))?;
        if s.len() != Self::STR_LEN {
            return Err(Error::InvalidAddress(format!(
                "expected {} characters, got {}",
                Self::STR_LEN,
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(Error::InvalidAddress(
                "expected lowercase hex characters".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A public key together with the address derived from it.
///
/// Every public-key reply from the device carries both; which of the two
/// the device showed on screen depends on the command's display flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// The 32-byte Ed25519 public key.
    pub public_key: PublicKey,
    /// The address derived from the key.
    pub address: Address,
}

/// The version of the Sia app running on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Patch version.
    pub patch: u8,
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_display() {
        let key = PublicKey::new([0u8; 32]);
        assert_eq!(
            key.to_string(),
            "ed25519:0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn signature_display_is_base64() {
        let sig = Signature::new([0u8; 64]);
        let encoded = sig.to_string();
        assert_eq!(encoded.len(), 88);
        assert!(encoded.starts_with("AAAA"));
        assert!(encoded.ends_with("=="));
    }

    #[test]
    fn hash_round_trips_through_hex() {
        let hash = Hash::new([0xaa; 32]);
        let parsed: Hash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn hash_from_str_rejects_wrong_length() {
        assert!("aabb".parse::<Hash>().is_err());
        assert!("zz".repeat(32).parse::<Hash>().is_err());
    }

    #[test]
    fn address_from_device_bytes() {
        let valid = "fc8caec1fc8fd727fe5107bd949009dafbf330515ab4ad29e6e36d62f17982acc458e71d3694";
        assert_eq!(valid.len(), Address::STR_LEN);

        let addr = Address::from_device_bytes(valid.as_bytes()).unwrap();
        assert_eq!(addr.as_str(), valid);
    }

    #[test]
    fn address_rejects_bad_shapes() {
        assert!(Address::from_device_bytes(b"too short").is_err());
        assert!(Address::from_device_bytes(&[0xff; 76]).is_err());
        let uppercase = "FC8CAEC1FC8FD727FE5107BD949009DAFBF330515AB4AD29E6E36D62F17982ACC458E71D3694";
        assert!(Address::from_device_bytes(uppercase.as_bytes()).is_err());
    }

    #[test]
    fn app_version_display() {
        let version = AppVersion {
            major: 0,
            minor: 4,
            patch: 5,
        };
        assert_eq!(version.to_string(), "v0.4.5");
    }

    #[test]
    fn serde_hex_helper_round_trip() {
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error as DeError, StringDeserializer};

        let sig = Signature::new([0x5a; 64]);
        let de: StringDeserializer<DeError> = hex::encode(sig.as_bytes()).into_deserializer();
        let bytes = hex_array::deserialize::<_, 64>(de).unwrap();
        assert_eq!(Signature::new(bytes), sig);
    }
}
