pub mod address;
pub mod derivation;
pub mod pem;

pub use address::{decode_address, encode_address, public_key_of, Address, PublicKey};
pub use derivation::{derive_private_key, DerivationPath};
pub use pem::to_pem;

use crate::error::{BingoError, Result};
use bip39::{Language, Mnemonic};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Stable chat-side identifier of a player.
pub type PlayerId = u64;

/// Player whose wallet signs the operator's `extract_numbers` transactions.
pub const OPERATOR_PLAYER_ID: PlayerId = 0;

/// Process-wide wallet seed. Never logged.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: Vec<u8>,
}

impl Seed {
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(BingoError::derivation("Seed phrase is empty"));
        }

        let mnemonic = Mnemonic::parse_in(Language::English, phrase)
            .map_err(|e| BingoError::derivation(format!("Invalid mnemonic: {}", e)))?;

        Ok(Self {
            bytes: mnemonic.to_seed("").to_vec(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(BingoError::derivation("Seed is empty"));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// Raw 32-byte Ed25519 secret. Re-derived on demand, never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Public half of a player's deterministic wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerWallet {
    pub player_id: PlayerId,
    pub address: Address,
}

impl PlayerWallet {
    pub fn derive(seed: &Seed, player_id: PlayerId) -> Result<Self> {
        let key = derive_private_key(seed, player_id)?;
        Ok(Self {
            player_id,
            address: Address::from_private_key(&key)?,
        })
    }

    pub fn signing_key(&self, seed: &Seed) -> Result<PrivateKey> {
        derive_private_key(seed, self.player_id)
    }
}
