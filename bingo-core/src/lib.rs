//! Bingo core - deterministic player wallets, the ticket codec and ledger access
//!
//! This library derives one wallet per player from a single seed, encodes and
//! renders bingo tickets in the game contract's binary format, and talks to the
//! ledger node and transaction indexer the game runs on.

pub mod amount;
pub mod config;
pub mod error;
pub mod network;
pub mod ticket;
pub mod types;
pub mod wallet;

pub use amount::Denomination;
pub use config::BingoConfig;
pub use error::{BingoError, Result};
pub use network::{ContractReader, ElasticIndexer, Indexer, LedgerClient, ProxyClient};
pub use ticket::{NumberSet, Ticket};
pub use types::{
    Account, GameStatus, NetworkConfig, PrizeMultipliers, PrizeTier, ResultRecord, RoundInfo,
    Statistics, TokenProperties, TransactionStatus,
};
pub use wallet::{Address, PlayerId, PlayerWallet, PrivateKey, PublicKey, Seed};
