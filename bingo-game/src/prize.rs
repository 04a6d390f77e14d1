//! Prize classification of extraction results.

use bingo_core::amount::u128_from_be;
use bingo_core::{PlayerId, PrizeTier, ResultRecord, RoundInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payout values of each tier, in base units of the round currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrizeThresholds {
    pub bingo: Option<u128>,
    pub two_lines: Option<u128>,
    pub one_line: Option<u128>,
}

impl PrizeThresholds {
    pub fn for_round(round: &RoundInfo) -> Self {
        Self {
            bingo: round.prize_threshold(round.multipliers.bingo),
            two_lines: round.prize_threshold(round.multipliers.two_lines),
            one_line: round.prize_threshold(round.multipliers.one_line),
        }
    }

    /// Exact match against the thresholds. Higher tiers win ties.
    pub fn classify(&self, value: u128) -> PrizeTier {
        if self.bingo == Some(value) {
            PrizeTier::Bingo
        } else if self.two_lines == Some(value) {
            PrizeTier::TwoLines
        } else if self.one_line == Some(value) {
            PrizeTier::OneLine
        } else {
            PrizeTier::None
        }
    }
}

/// Amount paid by a result record. Token prizes travel in the last data
/// field, native prizes in the record value.
pub fn payout_value(record: &ResultRecord, token_round: bool) -> Option<u128> {
    if !token_round {
        return Some(record.value);
    }
    let field = record.last_param()?;
    let bytes = hex::decode(field).ok()?;
    u128_from_be(&bytes).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winning {
    pub player: PlayerId,
    pub tier: PrizeTier,
    /// Number of identical wins folded into this entry.
    pub count: u32,
}

/// Group payout records by player and tier, best tiers first.
/// Records whose receiver is not a known player are ignored.
pub fn classify<F>(records: &[ResultRecord], round: &RoundInfo, resolve: F) -> Vec<Winning>
where
    F: Fn(&str) -> Option<PlayerId>,
{
    let thresholds = PrizeThresholds::for_round(round);
    let token_round = round.is_token_round();
    let mut grouped: BTreeMap<(PrizeTier, PlayerId), u32> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.is_ok_marker()) {
        let Some(player) = resolve(&record.receiver) else {
            tracing::debug!("Ignoring result for unknown receiver {}", record.receiver);
            continue;
        };
        let Some(value) = payout_value(record, token_round) else {
            tracing::warn!("Unreadable payout in result for player {}", player);
            continue;
        };
        let tier = thresholds.classify(value);
        *grouped.entry((tier, player)).or_insert(0) += 1;
    }

    let mut winnings: Vec<Winning> = grouped
        .into_iter()
        .map(|((tier, player), count)| Winning {
            player,
            tier,
            count,
        })
        .collect();
    winnings.sort_by(|a, b| b.tier.cmp(&a.tier).then(a.player.cmp(&b.player)));
    winnings
}

fn repeat_suffix(count: u32) -> String {
    if count > 1 {
        format!(" (x{})", count)
    } else {
        String::new()
    }
}

pub fn winner_message(winning: &Winning) -> String {
    format!("🤑 You won {}{}", winning.tier, repeat_suffix(winning.count))
}

/// Group announcement: one line per tier listing its winners.
pub fn group_summary<M>(winnings: &[Winning], mention: M) -> String
where
    M: Fn(PlayerId) -> String,
{
    if winnings.is_empty() {
        return "😔 Nobody won".to_string();
    }

    let mut by_tier: BTreeMap<PrizeTier, Vec<&Winning>> = BTreeMap::new();
    for winning in winnings {
        by_tier.entry(winning.tier).or_default().push(winning);
    }

    let mut summary = String::new();
    for (tier, winners) in by_tier.iter().rev() {
        let names: Vec<String> = winners
            .iter()
            .map(|w| format!("{}{}", mention(w.player), repeat_suffix(w.count)))
            .collect();
        let verb = if winners.len() == 1 { "has" } else { "have" };
        summary.push_str(&format!("{} {} won {}\n", names.join(", "), verb, tier));
    }
    summary.replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingo_core::{GameStatus, NumberSet, PrizeMultipliers, Statistics};
    use chrono::Utc;

    fn round(token: &str) -> RoundInfo {
        RoundInfo {
            round: 3,
            round_tickets: 10,
            numbers_to_extract: 30,
            last_extracted: NumberSet::new(),
            ticket_price: 1_000,
            multipliers: PrizeMultipliers {
                bingo: 50,
                two_lines: 10,
                one_line: 2,
            },
            deadline: Utc::now(),
            round_duration_secs: 600,
            status: GameStatus::Extracting,
            statistics: Statistics::default(),
            token_identifier: token.to_string(),
        }
    }

    fn paid(receiver: &str, value: u128) -> ResultRecord {
        ResultRecord {
            receiver: receiver.to_string(),
            value,
            data: String::new(),
        }
    }

    fn resolve(address: &str) -> Option<PlayerId> {
        match address {
            "alice" => Some(1),
            "bob" => Some(2),
            _ => None,
        }
    }

    #[test]
    fn test_thresholds_exact_match() {
        let thresholds = PrizeThresholds::for_round(&round(""));
        assert_eq!(thresholds.classify(50_000), PrizeTier::Bingo);
        assert_eq!(thresholds.classify(10_000), PrizeTier::TwoLines);
        assert_eq!(thresholds.classify(2_000), PrizeTier::OneLine);
        assert_eq!(thresholds.classify(2_001), PrizeTier::None);
        assert_eq!(thresholds.classify(0), PrizeTier::None);
    }

    #[test]
    fn test_higher_tier_has_priority() {
        let mut info = round("");
        info.multipliers.two_lines = 2;
        let thresholds = PrizeThresholds::for_round(&info);
        assert_eq!(thresholds.classify(2_000), PrizeTier::TwoLines);
    }

    #[test]
    fn test_classify_groups_repeated_wins() {
        let records = vec![
            paid("alice", 2_000),
            paid("bob", 50_000),
            paid("alice", 2_000),
            paid("carol", 50_000),
            ResultRecord {
                receiver: "alice".to_string(),
                value: 0,
                data: "@6f6b".to_string(),
            },
            paid("bob", 777),
        ];

        let winnings = classify(&records, &round(""), resolve);
        assert_eq!(
            winnings,
            vec![
                Winning {
                    player: 2,
                    tier: PrizeTier::Bingo,
                    count: 1
                },
                Winning {
                    player: 1,
                    tier: PrizeTier::OneLine,
                    count: 2
                },
                Winning {
                    player: 2,
                    tier: PrizeTier::None,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_token_round_reads_payout_from_data() {
        // 10_000 = 0x2710
        let record = ResultRecord {
            receiver: "alice".to_string(),
            value: 0,
            data: "ESDTTransfer@42494e474f2d616263646566@2710".to_string(),
        };
        assert_eq!(payout_value(&record, true), Some(10_000));
        assert_eq!(payout_value(&record, false), Some(0));

        let winnings = classify(&[record], &round("BINGO-abcdef"), resolve);
        assert_eq!(winnings[0].tier, PrizeTier::TwoLines);
    }

    #[test]
    fn test_messages() {
        let single = Winning {
            player: 1,
            tier: PrizeTier::Bingo,
            count: 1,
        };
        let double = Winning {
            player: 2,
            tier: PrizeTier::OneLine,
            count: 2,
        };
        assert_eq!(winner_message(&single), "🤑 You won Bingo! 💥💥💥");
        assert_eq!(winner_message(&double), "🤑 You won Line! (x2)");

        let third = Winning {
            player: 3,
            tier: PrizeTier::OneLine,
            count: 1,
        };
        let summary = group_summary(&[single, double, third], |id| format!("user_{}", id));
        assert_eq!(
            summary,
            "user\\_1 has won Bingo! 💥💥💥\nuser\\_2 (x2), user\\_3 have won Line!\n"
        );
        assert_eq!(group_summary(&[], |id| id.to_string()), "😔 Nobody won");
    }
}
