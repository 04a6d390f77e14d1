//! Clients for the ledger node proxy and the transaction indexer.

pub mod contract;
pub mod indexer;
pub mod proxy;
pub mod transaction;

pub use contract::{ContractReader, SYSTEM_TOKEN_CONTRACT};
pub use indexer::ElasticIndexer;
pub use proxy::ProxyClient;
pub use transaction::{
    buy_ticket_data, SignedTransaction, TransactionRequest, BUY_TICKET_FUNCTION,
    BUY_TICKET_GAS_LIMIT, EXTRACT_NUMBERS_FUNCTION, EXTRACT_NUMBERS_GAS_LIMIT,
};

use crate::error::Result;
use crate::types::{Account, NetworkConfig, ResultRecord, TransactionStatus};
use crate::wallet::Address;
use async_trait::async_trait;

/// Read and write access to the ledger through a node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn network_config(&self) -> Result<NetworkConfig>;

    /// Run a read-only contract view. Each argument is sent hex encoded.
    /// A view with no return data yields an empty list.
    async fn query_contract(
        &self,
        contract: &Address,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<Vec<u8>>>;

    async fn get_account(&self, address: &Address) -> Result<Account>;

    /// Token balance in the token's base units.
    async fn get_token_balance(&self, address: &Address, token: &str) -> Result<u128>;

    /// Broadcast a signed transaction and return its hash.
    async fn submit_transaction(&self, tx: &SignedTransaction) -> Result<String>;
}

/// Read-only search over executed transactions.
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn transaction_status(&self, hash: &str) -> Result<TransactionStatus>;

    /// Result records produced by the transaction; may be empty while the
    /// indexer catches up.
    async fn transaction_results(&self, hash: &str) -> Result<Vec<ResultRecord>>;
}
