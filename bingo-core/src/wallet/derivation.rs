//! Hardened-only hierarchical derivation of player signing keys.
//!
//! The root node is `HMAC-SHA512("ed25519 seed", seed)`; every path segment
//! extends the chain with `HMAC-SHA512(chain_code, 0x00 || key || index_be)`.
//! The left half of each digest is the next key, the right half the next
//! chain code.

use crate::error::{BingoError, Result};
use crate::wallet::{PlayerId, PrivateKey, Seed};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha512 = Hmac<Sha512>;

pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const ROOT_KEY: &[u8] = b"ed25519 seed";
const PURPOSE: u32 = 44;
const COIN_TYPE: u32 = 508;
const ACCOUNT: u32 = 0;

/// The player-specific tail of `m/44'/508'/0'/high'/low'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    pub high: u32,
    pub low: u32,
}

impl DerivationPath {
    pub fn for_player(player_id: PlayerId) -> Self {
        Self {
            high: (player_id >> 32) as u32,
            low: (player_id & 0xFFFF_FFFF) as u32,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        (u64::from(self.high) << 32) | u64::from(self.low)
    }

    /// Raw segment indices. The offset wraps like 32-bit unsigned addition.
    pub fn segments(&self) -> [u32; 5] {
        [
            HARDENED_OFFSET + PURPOSE,
            HARDENED_OFFSET + COIN_TYPE,
            HARDENED_OFFSET + ACCOUNT,
            HARDENED_OFFSET.wrapping_add(self.high),
            HARDENED_OFFSET.wrapping_add(self.low),
        ]
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}'/{}'",
            PURPOSE, COIN_TYPE, ACCOUNT, self.high, self.low
        )
    }
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct ChainNode {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl ChainNode {
    fn from_digest(digest: &[u8]) -> Self {
        let mut node = Self {
            key: [0u8; 32],
            chain_code: [0u8; 32],
        };
        node.key.copy_from_slice(&digest[..32]);
        node.chain_code.copy_from_slice(&digest[32..64]);
        node
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<ChainNode> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .map_err(|e| BingoError::derivation(format!("Invalid HMAC key: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    Ok(ChainNode::from_digest(&mac.finalize().into_bytes()))
}

/// Derive the private key at an explicit list of segment indices.
pub fn derive_at(seed: &[u8], segments: &[u32]) -> Result<PrivateKey> {
    if seed.is_empty() {
        return Err(BingoError::derivation("Seed is empty"));
    }

    let mut node = hmac_sha512(ROOT_KEY, &[seed])?;
    for index in segments {
        let index = index.to_be_bytes();
        node = hmac_sha512(
            &node.chain_code,
            &[&[0x00u8][..], &node.key[..], &index[..]],
        )?;
    }

    Ok(PrivateKey::from_bytes(node.key))
}

/// Deterministic signing key for a player.
pub fn derive_private_key(seed: &Seed, player_id: PlayerId) -> Result<PrivateKey> {
    let path = DerivationPath::for_player(player_id);
    derive_at(seed.as_bytes(), &path.segments())
}
