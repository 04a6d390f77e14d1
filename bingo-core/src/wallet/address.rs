use crate::error::{BingoError, Result};
use crate::wallet::PrivateKey;
use bitcoin::bech32::{self, primitives::decode::CheckedHrpstring, Bech32, Hrp};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ADDRESS_HRP: &str = "erd";
pub const PUBLIC_KEY_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            BingoError::malformed_address(format!(
                "expected {} public key bytes, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Ed25519 public key of a derived signing key.
pub fn public_key_of(key: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(key.as_bytes());
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Bech32 encoding of a public key; the 8-to-5 bit regrouping pads the
/// final symbol with zero bits.
pub fn encode_address(public_key: &PublicKey) -> Result<String> {
    let hrp = Hrp::parse(ADDRESS_HRP)
        .map_err(|e| BingoError::internal(format!("Invalid address prefix: {}", e)))?;
    bech32::encode::<Bech32>(hrp, public_key.as_bytes())
        .map_err(|e| BingoError::internal(format!("Failed to encode address: {}", e)))
}

pub fn decode_address(address: &str) -> Result<PublicKey> {
    let checked = CheckedHrpstring::new::<Bech32>(address)
        .map_err(|e| BingoError::malformed_address(format!("{}: {}", address, e)))?;

    let prefix = checked.hrp().to_lowercase();
    if prefix != ADDRESS_HRP {
        return Err(BingoError::malformed_address(format!(
            "{}: unexpected prefix '{}'",
            address, prefix
        )));
    }

    let bytes: Vec<u8> = checked.byte_iter().collect();
    PublicKey::from_slice(&bytes)
}

/// A validated, canonical (lowercase) account address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    encoded: String,
    public_key: PublicKey,
}

impl Address {
    pub fn from_public_key(public_key: PublicKey) -> Result<Self> {
        Ok(Self {
            encoded: encode_address(&public_key)?,
            public_key,
        })
    }

    pub fn from_private_key(key: &PrivateKey) -> Result<Self> {
        Self::from_public_key(public_key_of(key))
    }

    pub fn parse(address: &str) -> Result<Self> {
        let public_key = decode_address(address.trim())?;
        Self::from_public_key(public_key)
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// `erd1abcd...uvwxyz` form for chat output.
    pub fn short(&self) -> String {
        let len = self.encoded.len();
        format!("{}...{}", &self.encoded[..8], &self.encoded[len - 6..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encoded)
    }
}

impl FromStr for Address {
    type Err = BingoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = BingoError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.encoded
    }
}
