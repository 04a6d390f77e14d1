//! In-memory ledger, indexer and chat doubles for tests.

use crate::notifier::{Chat, MessageRef, Notifier, TextFormat};
use async_trait::async_trait;
use bingo_core::network::SignedTransaction;
use bingo_core::ticket::encode_number_set;
use bingo_core::{
    Account, Address, BingoError, Indexer, LedgerClient, NetworkConfig, NumberSet, PlayerId,
    PublicKey, ResultRecord, Seed, TransactionStatus,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon \
    abandon abandon abandon abandon abandon about";

pub(crate) fn test_seed() -> Arc<Seed> {
    Arc::new(Seed::from_mnemonic(TEST_MNEMONIC).unwrap())
}

pub(crate) fn network_config() -> NetworkConfig {
    NetworkConfig {
        chain_id: "T".to_string(),
        denomination: 18,
        min_gas_price: 1_000_000_000,
        min_transaction_version: 1,
        round_duration_ms: 6000,
        start_time: 1_600_000_000,
    }
}

pub(crate) fn contract_address() -> Address {
    Address::from_public_key(PublicKey::from_bytes([5u8; 32])).unwrap()
}

/// One scripted indexer answer for a status poll.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Poll {
    Status(TransactionStatus),
    NetworkDown,
}

pub(crate) use Poll::{NetworkDown, Status};
pub(crate) const PENDING: Poll = Status(TransactionStatus::Pending);
pub(crate) const SUCCESS: Poll = Status(TransactionStatus::Success);
pub(crate) const FAILED: Poll = Status(TransactionStatus::Failed);

/// Indexer replaying scripted answers. The last scripted answer repeats.
#[derive(Default)]
pub(crate) struct FakeIndexer {
    statuses: Mutex<HashMap<String, VecDeque<Poll>>>,
    default_statuses: Mutex<Vec<Poll>>,
    results: Mutex<HashMap<String, VecDeque<Vec<ResultRecord>>>>,
    pub(crate) status_calls: AtomicUsize,
    pub(crate) result_calls: AtomicUsize,
}

impl FakeIndexer {
    pub(crate) fn script_statuses(&self, hash: &str, polls: Vec<Poll>) {
        self.statuses
            .lock()
            .insert(hash.to_string(), polls.into_iter().collect());
    }

    /// Script used by hashes that were never scripted explicitly.
    pub(crate) fn script_default_statuses(&self, polls: Vec<Poll>) {
        *self.default_statuses.lock() = polls;
    }

    pub(crate) fn script_results(&self, hash: &str, batches: Vec<Vec<ResultRecord>>) {
        self.results
            .lock()
            .insert(hash.to_string(), batches.into_iter().collect());
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }
}

fn next_or_last<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl Indexer for FakeIndexer {
    async fn transaction_status(&self, hash: &str) -> bingo_core::Result<TransactionStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let poll = {
            let mut statuses = self.statuses.lock();
            let queue = statuses.entry(hash.to_string()).or_insert_with(|| {
                self.default_statuses.lock().iter().copied().collect()
            });
            next_or_last(queue)
        };
        match poll {
            Some(Status(status)) => Ok(status),
            Some(NetworkDown) => Err(BingoError::network("indexer unreachable")),
            None => Err(BingoError::invalid_response(format!("{} not indexed", hash))),
        }
    }

    async fn transaction_results(&self, hash: &str) -> bingo_core::Result<Vec<ResultRecord>> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.lock();
        Ok(results
            .get_mut(hash)
            .and_then(next_or_last)
            .unwrap_or_default())
    }
}

/// Ledger with canned contract views that records submitted transactions.
pub(crate) struct FakeLedger {
    views: Mutex<HashMap<String, Vec<Vec<u8>>>>,
    user_tickets: Mutex<HashMap<Vec<u8>, Vec<Vec<u8>>>>,
    accounts: Mutex<HashMap<String, Account>>,
    token_balances: Mutex<HashMap<String, u128>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    fail_submit: AtomicBool,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self {
            views: Mutex::new(HashMap::new()),
            user_tickets: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            token_balances: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            fail_submit: AtomicBool::new(false),
        }
    }
}

impl FakeLedger {
    pub(crate) fn set_view(&self, function: &str, values: Vec<Vec<u8>>) {
        self.views.lock().insert(function.to_string(), values);
    }

    pub(crate) fn set_user_tickets(&self, player: &Address, items: Vec<Vec<u8>>) {
        self.user_tickets
            .lock()
            .insert(player.public_key().as_bytes().to_vec(), items);
    }

    pub(crate) fn set_account(&self, address: &Address, account: Account) {
        self.accounts.lock().insert(address.to_string(), account);
    }

    pub(crate) fn set_token_balance(&self, address: &Address, balance: u128) {
        self.token_balances.lock().insert(address.to_string(), balance);
    }

    pub(crate) fn fail_submissions(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    pub(crate) fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().clone()
    }

    /// Views for a full round snapshot.
    pub(crate) fn set_round(&self, round: u64, status_code: u8, price: u128, token: &str) {
        let price_bytes = bingo_core::amount::u128_to_be_minimal(price);
        self.set_view("getRound", vec![round.to_be_bytes().to_vec()]);
        self.set_view("getRoundTickets", vec![vec![]]);
        self.set_view("getNumbersToExtract", vec![vec![30]]);
        self.set_view("getLastExtractedNumbers", vec![vec![]]);
        self.set_view("getTicketPrice", vec![price_bytes]);
        self.set_view("getBingoPrizeMultiplier", vec![vec![50]]);
        self.set_view("getTwoLinesPrizeMultiplier", vec![vec![10]]);
        self.set_view("getOneLinePrizeMultiplier", vec![vec![2]]);
        self.set_view("getDeadline", vec![vec![0x03, 0xe8]]);
        self.set_view("getRoundDuration", vec![vec![100]]);
        self.set_view("getStatus", vec![vec![status_code]]);
        self.set_view("getAllTimeTickets", vec![vec![40]]);
        self.set_view("getAllTimeBingo", vec![vec![1]]);
        self.set_view("getAllTimeTwoLines", vec![vec![3]]);
        self.set_view("getAllTimeOneLine", vec![vec![8]]);
        self.set_view("getTokenIdentifier", vec![token.as_bytes().to_vec()]);
    }

    pub(crate) fn set_round_tickets(&self, tickets: u64) {
        self.set_view("getRoundTickets", vec![tickets.to_be_bytes().to_vec()]);
    }

    pub(crate) fn set_extracted(&self, numbers: &NumberSet) {
        self.set_view("getLastExtractedNumbers", vec![encode_number_set(numbers)]);
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn network_config(&self) -> bingo_core::Result<NetworkConfig> {
        Ok(network_config())
    }

    async fn query_contract(
        &self,
        _contract: &Address,
        function: &str,
        args: &[Vec<u8>],
    ) -> bingo_core::Result<Vec<Vec<u8>>> {
        let values = if function == "getUserTickets" {
            args.first()
                .and_then(|key| self.user_tickets.lock().get(key).cloned())
        } else {
            self.views.lock().get(function).cloned()
        };
        Ok(values.unwrap_or_default())
    }

    async fn get_account(&self, address: &Address) -> bingo_core::Result<Account> {
        Ok(self
            .accounts
            .lock()
            .get(address.as_str())
            .copied()
            .unwrap_or_default())
    }

    async fn get_token_balance(&self, address: &Address, _token: &str) -> bingo_core::Result<u128> {
        Ok(self
            .token_balances
            .lock()
            .get(address.as_str())
            .copied()
            .unwrap_or_default())
    }

    async fn submit_transaction(&self, tx: &SignedTransaction) -> bingo_core::Result<String> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BingoError::ledger("transaction rejected"));
        }
        let mut submitted = self.submitted.lock();
        submitted.push(tx.clone());
        Ok(format!("{:064x}", submitted.len()))
    }
}

/// Everything a notifier was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Group(String),
    Direct(PlayerId, String),
    Edit(MessageRef, String, TextFormat),
    Delete(MessageRef),
    Error(String),
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    next_id: AtomicI64,
    log: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    fn record(&self, chat: Chat, sent: Sent) -> MessageRef {
        self.log.lock().push(sent);
        MessageRef {
            chat,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    pub(crate) fn log(&self) -> Vec<Sent> {
        self.log.lock().clone()
    }

    pub(crate) fn edits(&self) -> Vec<(MessageRef, String, TextFormat)> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Edit(m, text, format) => Some((m, text, format)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn directs(&self, player: PlayerId) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Direct(p, text) if p == player => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn group_posts(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Group(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post_to_group(&self, text: &str) -> crate::Result<MessageRef> {
        Ok(self.record(Chat::Group, Sent::Group(text.to_string())))
    }

    async fn send_direct(&self, player: PlayerId, text: &str) -> crate::Result<MessageRef> {
        Ok(self.record(Chat::Player(player), Sent::Direct(player, text.to_string())))
    }

    async fn edit_message(
        &self,
        message: &MessageRef,
        text: &str,
        format: TextFormat,
    ) -> crate::Result<()> {
        self.log
            .lock()
            .push(Sent::Edit(*message, text.to_string(), format));
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> crate::Result<()> {
        self.log.lock().push(Sent::Delete(*message));
        Ok(())
    }

    async fn report_error(&self, text: &str) {
        self.log.lock().push(Sent::Error(text.to_string()));
    }
}
