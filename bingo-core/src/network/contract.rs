//! Typed views over the bingo game contract.

use super::LedgerClient;
use crate::amount::{u128_from_be, u64_from_be};
use crate::error::{BingoError, Result};
use crate::ticket::{decode_number_set, decode_user_ticket, NumberSet, Ticket};
use crate::types::{
    GameStatus, NetworkConfig, PrizeMultipliers, RoundInfo, Statistics, TokenProperties,
};
use crate::wallet::{Address, PublicKey};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Built-in contract answering `getTokenProperties`.
pub const SYSTEM_TOKEN_CONTRACT: &str =
    "erd1qqqqqqqqqqqqqqqpqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqzllls8a5w6u";

const DECIMALS_PREFIX: &str = "NumDecimals-";

#[derive(Clone)]
pub struct ContractReader {
    ledger: Arc<dyn LedgerClient>,
    contract: Address,
    network: NetworkConfig,
}

impl ContractReader {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: Address, network: NetworkConfig) -> Self {
        Self {
            ledger,
            contract,
            network,
        }
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn query_one(&self, function: &str) -> Result<Vec<u8>> {
        let mut values = self.ledger.query_contract(&self.contract, function, &[]).await?;
        if values.is_empty() {
            return Err(BingoError::invalid_response(format!(
                "{}: empty response",
                function
            )));
        }
        Ok(values.swap_remove(0))
    }

    async fn query_u64(&self, function: &str) -> Result<u64> {
        u64_from_be(&self.query_one(function).await?)
    }

    pub async fn round(&self) -> Result<u64> {
        self.query_u64("getRound").await
    }

    pub async fn round_tickets(&self) -> Result<u64> {
        self.query_u64("getRoundTickets").await
    }

    pub async fn numbers_to_extract(&self) -> Result<u64> {
        self.query_u64("getNumbersToExtract").await
    }

    pub async fn last_extracted_numbers(&self) -> Result<NumberSet> {
        let bytes = self.query_one("getLastExtractedNumbers").await?;
        Ok(decode_number_set(&bytes))
    }

    /// Ticket price in base units of the round currency.
    pub async fn ticket_price(&self) -> Result<u128> {
        u128_from_be(&self.query_one("getTicketPrice").await?)
    }

    pub async fn prize_multipliers(&self) -> Result<PrizeMultipliers> {
        Ok(PrizeMultipliers {
            bingo: self.query_u64("getBingoPrizeMultiplier").await?,
            two_lines: self.query_u64("getTwoLinesPrizeMultiplier").await?,
            one_line: self.query_u64("getOneLinePrizeMultiplier").await?,
        })
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        Ok(Statistics {
            total_tickets: self.query_u64("getAllTimeTickets").await?,
            total_bingo: self.query_u64("getAllTimeBingo").await?,
            total_two_lines: self.query_u64("getAllTimeTwoLines").await?,
            total_one_line: self.query_u64("getAllTimeOneLine").await?,
        })
    }

    /// The contract stores the deadline as a block round.
    pub async fn deadline(&self) -> Result<DateTime<Utc>> {
        let block_round = self.query_u64("getDeadline").await?;
        let unix = self.network.round_to_unix(block_round);
        DateTime::from_timestamp(unix, 0)
            .ok_or_else(|| BingoError::invalid_response(format!("Deadline {} out of range", unix)))
    }

    pub async fn round_duration_secs(&self) -> Result<u64> {
        let rounds = self.query_u64("getRoundDuration").await?;
        Ok(self.network.rounds_to_secs(rounds))
    }

    pub async fn status(&self) -> Result<GameStatus> {
        GameStatus::from_code(self.query_u64("getStatus").await?)
    }

    /// Token identifier of the round currency; empty for native rounds.
    pub async fn token_identifier(&self) -> Result<String> {
        let bytes = self.query_one("getTokenIdentifier").await?;
        String::from_utf8(bytes)
            .map_err(|e| BingoError::invalid_response(format!("Token identifier: {}", e)))
    }

    pub async fn round_info(&self) -> Result<RoundInfo> {
        Ok(RoundInfo {
            round: self.round().await?,
            round_tickets: self.round_tickets().await?,
            numbers_to_extract: self.numbers_to_extract().await?,
            last_extracted: self.last_extracted_numbers().await?,
            ticket_price: self.ticket_price().await?,
            multipliers: self.prize_multipliers().await?,
            deadline: self.deadline().await?,
            round_duration_secs: self.round_duration_secs().await?,
            status: self.status().await?,
            statistics: self.statistics().await?,
            token_identifier: self.token_identifier().await?,
        })
    }

    pub async fn players(&self) -> Result<Vec<Address>> {
        let values = self
            .ledger
            .query_contract(&self.contract, "getPlayers", &[])
            .await?;

        let mut players = Vec::with_capacity(values.len());
        for value in values {
            match PublicKey::from_slice(&value).and_then(Address::from_public_key) {
                Ok(address) => players.push(address),
                Err(e) => tracing::warn!("Skipping player entry: {}", e),
            }
        }
        Ok(players)
    }

    /// Tickets held by `player` in the current round. Undecodable entries
    /// are logged and skipped.
    pub async fn player_tickets(&self, player: &Address) -> Result<Vec<Ticket>> {
        let args = [player.public_key().as_bytes().to_vec()];
        let values = self
            .ledger
            .query_contract(&self.contract, "getUserTickets", &args)
            .await?;

        let mut tickets = Vec::with_capacity(values.len());
        for value in values {
            match decode_user_ticket(&value) {
                Ok(ticket) => tickets.push(ticket),
                Err(e) => tracing::warn!("Dropping ticket of {}: {}", player.short(), e),
            }
        }
        Ok(tickets)
    }

    pub async fn token_properties(&self, ticker: &str) -> Result<TokenProperties> {
        let system = Address::parse(SYSTEM_TOKEN_CONTRACT)?;
        let values = self
            .ledger
            .query_contract(&system, "getTokenProperties", &[ticker.as_bytes().to_vec()])
            .await?;
        token_properties_from(ticker, &values)
    }
}

fn token_properties_from(ticker: &str, values: &[Vec<u8>]) -> Result<TokenProperties> {
    if values.len() < 6 {
        return Err(BingoError::invalid_response(format!(
            "getTokenProperties returned {} fields",
            values.len()
        )));
    }

    let raw_decimals = String::from_utf8_lossy(&values[5]);
    let decimals = raw_decimals
        .strip_prefix(DECIMALS_PREFIX)
        .and_then(|d| d.parse::<u32>().ok())
        .ok_or_else(|| {
            BingoError::invalid_response(format!(
                "Invalid decimals '{}' for {}",
                raw_decimals, ticker
            ))
        })?;

    Ok(TokenProperties {
        name: String::from_utf8_lossy(&values[0]).into_owned(),
        ticker: ticker.to_string(),
        short_ticker: ticker.split('-').next().unwrap_or(ticker).to_string(),
        decimals,
    })
}
