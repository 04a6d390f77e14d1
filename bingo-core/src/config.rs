use crate::error::{BingoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Clone, Serialize, Deserialize)]
pub struct BingoConfig {
    pub bot: BotConfig,
    #[serde(rename = "seed")]
    pub seed_phrase: String,
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    pub network: NetworkEndpoints,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub token: String,
    /// Operator chat receiving administrative error reports.
    #[serde(default)]
    pub owner: i64,
    #[serde(default)]
    pub group: String,
    #[serde(rename = "groupID", default)]
    pub group_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEndpoints {
    pub proxy: String,
    pub indexer: String,
    #[serde(rename = "explorerTransaction", default)]
    pub explorer_transaction: String,
    #[serde(rename = "explorerAccount", default)]
    pub explorer_account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    pub round_secs: u64,
    pub extraction_secs: u64,
    pub transaction_secs: u64,
    pub results_retry_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            round_secs: 6,
            extraction_secs: 60,
            transaction_secs: 5,
            results_retry_secs: 6,
        }
    }
}

impl PollingConfig {
    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.round_secs)
    }

    pub fn extraction_interval(&self) -> Duration {
        Duration::from_secs(self.extraction_secs)
    }

    pub fn transaction_interval(&self) -> Duration {
        Duration::from_secs(self.transaction_secs)
    }

    pub fn results_retry_delay(&self) -> Duration {
        Duration::from_secs(self.results_retry_secs)
    }
}

impl BingoConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            BingoError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot.owner == 0 {
            return Err(BingoError::config("Bot owner ID is not set"));
        }

        if self.bot.group.is_empty() {
            return Err(BingoError::config("Public group username is not set"));
        }

        if self.seed_phrase.trim().is_empty() {
            return Err(BingoError::config("Seed phrase is not set"));
        }

        if self.contract_address.is_empty() {
            return Err(BingoError::config("Contract address is not set"));
        }

        if self.network.proxy.is_empty() {
            return Err(BingoError::config("Proxy URL cannot be empty"));
        }

        if self.network.indexer.is_empty() {
            return Err(BingoError::config("Indexer URL cannot be empty"));
        }

        let p = &self.polling;
        if p.round_secs == 0 || p.extraction_secs == 0 || p.transaction_secs == 0 {
            return Err(BingoError::config("Polling intervals must be greater than 0"));
        }

        Ok(())
    }
}

impl fmt::Debug for BingoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BingoConfig")
            .field("bot", &self.bot.group)
            .field("seed_phrase", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("network", &self.network)
            .field("polling", &self.polling)
            .finish()
    }
}
