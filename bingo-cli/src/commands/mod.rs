pub mod game;
pub mod ticket;
pub mod wallet;

use bingo_core::{BingoConfig, Seed};
use std::path::{Path, PathBuf};

/// Where the commands find their configuration.
pub struct Context {
    config_path: PathBuf,
}

impl Context {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and fully validate the configuration.
    pub async fn config(&self) -> bingo_core::Result<BingoConfig> {
        let config = BingoConfig::load(&self.config_path).await?;
        config.validate()?;
        Ok(config)
    }

    /// Wallet commands only need the seed.
    pub async fn seed(&self) -> bingo_core::Result<Seed> {
        let config = BingoConfig::load(&self.config_path).await?;
        Seed::from_mnemonic(&config.seed_phrase)
    }
}
