use crate::amount::Denomination;
use crate::error::{BingoError, Result};
use crate::ticket::NumberSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    /// Indexer status string. Anything other than pending or success failed.
    pub fn from_indexer(status: &str) -> Self {
        match status {
            "pending" => Self::Pending,
            "success" => Self::Success,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending ⌛️",
            Self::Success => "success ✅",
            Self::Failed => "failed ❌",
        }
    }
}

/// Smart-contract result emitted as a side effect of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub receiver: String,
    pub value: u128,
    pub data: String,
}

impl ResultRecord {
    /// Plain `@ok` acknowledgement carrying no payout or payload.
    pub fn is_ok_marker(&self) -> bool {
        self.data == "@6f6b"
    }

    /// Last `@`-separated field of the payload.
    pub fn last_param(&self) -> Option<&str> {
        self.data.rsplit('@').next().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrizeTier {
    None,
    OneLine,
    TwoLines,
    Bingo,
}

impl PrizeTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "💰",
            Self::OneLine => "Line!",
            Self::TwoLines => "2 Lines! 🥳",
            Self::Bingo => "Bingo! 💥💥💥",
        }
    }
}

impl fmt::Display for PrizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Running,
    Extracting,
    Idle,
    Paused,
}

impl GameStatus {
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Self::Running),
            1 => Ok(Self::Extracting),
            2 => Ok(Self::Idle),
            3 => Ok(Self::Paused),
            other => Err(BingoError::invalid_response(format!(
                "Unknown game status {}",
                other
            ))),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "Running",
            Self::Extracting => "Extracting",
            Self::Idle => "Idle",
            Self::Paused => "Paused",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeMultipliers {
    pub bingo: u64,
    pub two_lines: u64,
    pub one_line: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_tickets: u64,
    pub total_bingo: u64,
    pub total_two_lines: u64,
    pub total_one_line: u64,
}

impl Statistics {
    /// Share of tickets that won at least the given tier, in percent.
    pub fn bingo_rate(&self) -> f64 {
        self.rate(self.total_bingo)
    }

    pub fn two_lines_rate(&self) -> f64 {
        self.rate(self.total_bingo + self.total_two_lines)
    }

    pub fn one_line_rate(&self) -> f64 {
        self.rate(self.total_bingo + self.total_two_lines + self.total_one_line)
    }

    fn rate(&self, wins: u64) -> f64 {
        if self.total_tickets == 0 {
            return 0.0;
        }
        wins as f64 * 100.0 / self.total_tickets as f64
    }
}

/// Snapshot of the game contract's current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub round: u64,
    pub round_tickets: u64,
    pub numbers_to_extract: u64,
    pub last_extracted: NumberSet,
    /// Base units of the native coin, or of the round token when set.
    pub ticket_price: u128,
    pub multipliers: PrizeMultipliers,
    pub deadline: DateTime<Utc>,
    pub round_duration_secs: u64,
    pub status: GameStatus,
    pub statistics: Statistics,
    pub token_identifier: String,
}

impl RoundInfo {
    pub fn is_token_round(&self) -> bool {
        !self.token_identifier.is_empty()
    }

    /// `$TICK` for token rounds, `eGLD` otherwise.
    pub fn ticker_label(&self) -> String {
        match self.token_identifier.split('-').next() {
            Some(ticker) if !ticker.is_empty() => format!("${}", ticker),
            _ => "eGLD".to_string(),
        }
    }

    pub fn prize_threshold(&self, multiplier: u64) -> Option<u128> {
        self.ticket_price.checked_mul(u128::from(multiplier))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenProperties {
    pub name: String,
    pub ticker: String,
    pub short_ticker: String,
    pub decimals: u32,
}

impl TokenProperties {
    pub fn denomination(&self) -> Denomination {
        Denomination::new(self.decimals)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u128,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: String,
    pub denomination: u32,
    pub min_gas_price: u64,
    pub min_transaction_version: u32,
    pub round_duration_ms: i64,
    pub start_time: i64,
}

impl NetworkConfig {
    pub fn native_denomination(&self) -> Denomination {
        Denomination::new(self.denomination)
    }

    /// Unix time at which the given block round starts.
    pub fn round_to_unix(&self, block_round: u64) -> i64 {
        (block_round as i64).saturating_mul(self.round_duration_ms) / 1000 + self.start_time
    }

    pub fn rounds_to_secs(&self, rounds: u64) -> u64 {
        ((rounds as i64).saturating_mul(self.round_duration_ms) / 1000).max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexer_status_mapping() {
        assert_eq!(TransactionStatus::from_indexer("pending"), TransactionStatus::Pending);
        assert_eq!(TransactionStatus::from_indexer("success"), TransactionStatus::Success);
        assert_eq!(TransactionStatus::from_indexer("fail"), TransactionStatus::Failed);
        assert_eq!(TransactionStatus::from_indexer("invalid"), TransactionStatus::Failed);
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_result_record_params() {
        let record = ResultRecord {
            receiver: String::new(),
            value: 0,
            data: "ESDTTransfer@4249494e474f@0de0b6b3a7640000".to_string(),
        };
        assert_eq!(record.last_param(), Some("0de0b6b3a7640000"));
        assert!(!record.is_ok_marker());

        let ok = ResultRecord {
            data: "@6f6b".to_string(),
            ..record
        };
        assert!(ok.is_ok_marker());
    }

    #[test]
    fn test_game_status_codes() {
        assert_eq!(GameStatus::from_code(1).unwrap(), GameStatus::Extracting);
        assert_eq!(GameStatus::from_code(3).unwrap().to_string(), "Paused");
        assert!(GameStatus::from_code(4).is_err());
    }

    #[test]
    fn test_network_round_conversion() {
        let config = NetworkConfig {
            chain_id: "D".to_string(),
            denomination: 18,
            min_gas_price: 1_000_000_000,
            min_transaction_version: 1,
            round_duration_ms: 6000,
            start_time: 1_600_000_000,
        };
        assert_eq!(config.round_to_unix(10), 1_600_000_060);
        assert_eq!(config.rounds_to_secs(100), 600);
    }

    #[test]
    fn test_statistics_rates() {
        let stats = Statistics {
            total_tickets: 200,
            total_bingo: 2,
            total_two_lines: 8,
            total_one_line: 30,
        };
        assert!((stats.bingo_rate() - 1.0).abs() < f64::EPSILON);
        assert!((stats.two_lines_rate() - 5.0).abs() < f64::EPSILON);
        assert!((stats.one_line_rate() - 20.0).abs() < f64::EPSILON);
        assert_eq!(Statistics::default().one_line_rate(), 0.0);
    }
}
