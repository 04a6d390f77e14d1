//! Round orchestration: polls the contract, announces rounds, buys tickets
//! for players and drives the number extraction.

use crate::notifier::{MessageRef, Notifier, TextFormat};
use crate::prize::{self, Winning};
use crate::registry::{DisplayedTicket, PlayerRegistry};
use crate::watcher::{cancelled, StatusLine, TransactionWatcher, WatchPolicy};
use crate::{GameError, Result};
use bingo_core::amount::BUY_TICKET_FEE;
use bingo_core::config::PollingConfig;
use bingo_core::network::{
    buy_ticket_data, TransactionRequest, BUY_TICKET_GAS_LIMIT, EXTRACT_NUMBERS_FUNCTION,
    EXTRACT_NUMBERS_GAS_LIMIT,
};
use bingo_core::ticket::{decode_ticket, format_strikethrough, format_ticket};
use bingo_core::wallet::OPERATOR_PLAYER_ID;
use bingo_core::{
    Address, BingoConfig, BingoError, ContractReader, Denomination, GameStatus, Indexer,
    LedgerClient, NetworkConfig, PlayerId, PlayerWallet, ResultRecord, RoundInfo, Seed, Ticket,
    TokenProperties, TransactionStatus,
};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

/// Watch window used before the first round snapshot is known.
const DEFAULT_ROUND_DURATION: Duration = Duration::from_secs(300);

const NATIVE_UNIT: &str = "eGLD";

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub contract: Address,
    /// Prefix of transaction links in status messages.
    pub explorer_transaction: String,
    pub polling: PollingConfig,
}

impl MonitorSettings {
    pub fn from_config(config: &BingoConfig) -> Result<Self> {
        Ok(Self {
            contract: Address::parse(&config.contract_address)?,
            explorer_transaction: config.network.explorer_transaction.clone(),
            polling: config.polling.clone(),
        })
    }
}

/// A submitted ticket purchase. The handle resolves to the delivered
/// ticket, or `None` when the transaction failed.
#[derive(Debug)]
pub struct PendingPurchase {
    pub hash: String,
    pub handle: JoinHandle<Result<Option<Ticket>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub round: u64,
    pub hash: String,
    pub status: TransactionStatus,
    pub winnings: Vec<Winning>,
}

#[derive(Debug, Default)]
struct Announcement {
    round: Option<u64>,
    tickets: u64,
    message: Option<MessageRef>,
}

pub struct GameRoundMonitor {
    ledger: Arc<dyn LedgerClient>,
    indexer: Arc<dyn Indexer>,
    notifier: Arc<dyn Notifier>,
    reader: ContractReader,
    registry: Arc<PlayerRegistry>,
    seed: Arc<Seed>,
    settings: MonitorSettings,
    round: RwLock<Option<RoundInfo>>,
    announcement: Mutex<Announcement>,
    tokens: Mutex<HashMap<String, TokenProperties>>,
    extracting: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl GameRoundMonitor {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        indexer: Arc<dyn Indexer>,
        notifier: Arc<dyn Notifier>,
        seed: Arc<Seed>,
        network: NetworkConfig,
        settings: MonitorSettings,
    ) -> Self {
        let reader = ContractReader::new(ledger.clone(), settings.contract.clone(), network);
        let (shutdown, _) = watch::channel(false);

        Self {
            ledger,
            indexer,
            notifier,
            reader,
            registry: Arc::new(PlayerRegistry::new(seed.clone())),
            seed,
            settings,
            round: RwLock::new(None),
            announcement: Mutex::new(Announcement::default()),
            tokens: Mutex::new(HashMap::new()),
            extracting: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Derive the seed, parse the contract address and fetch the network
    /// parameters. A bad seed aborts here.
    pub async fn from_config(
        config: &BingoConfig,
        ledger: Arc<dyn LedgerClient>,
        indexer: Arc<dyn Indexer>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let seed = Arc::new(Seed::from_mnemonic(&config.seed_phrase)?);
        let settings = MonitorSettings::from_config(config)?;
        let network = ledger.network_config().await?;
        tracing::info!(
            "Connected to chain {} (contract {})",
            network.chain_id,
            settings.contract.short()
        );

        Ok(Self::new(ledger, indexer, notifier, seed, network, settings))
    }

    pub fn reader(&self) -> &ContractReader {
        &self.reader
    }

    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    pub fn register_player(&self, player: PlayerId) -> Result<PlayerWallet> {
        self.registry.register(player)
    }

    pub fn player_by_address(&self, address: &str) -> Option<PlayerWallet> {
        self.registry.player_by_address(address)
    }

    /// Last fetched round snapshot.
    pub fn current_round(&self) -> Option<RoundInfo> {
        self.round.read().clone()
    }

    pub async fn refresh_round(&self) -> Result<RoundInfo> {
        let info = self.reader.round_info().await?;
        *self.round.write() = Some(info.clone());
        Ok(info)
    }

    /// Stop every watcher spawned by this monitor.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn require_round(&self) -> Result<RoundInfo> {
        self.current_round().ok_or(GameError::RoundUnavailable)
    }

    fn watcher(&self, round: &RoundInfo) -> TransactionWatcher {
        let round_duration = match round.round_duration_secs {
            0 => DEFAULT_ROUND_DURATION,
            secs => Duration::from_secs(secs),
        };
        TransactionWatcher::new(
            self.indexer.clone(),
            self.notifier.clone(),
            WatchPolicy::from_polling(&self.settings.polling, round_duration),
            self.shutdown.subscribe(),
        )
    }

    async fn token_properties(&self, identifier: &str) -> Result<TokenProperties> {
        let cached = self.tokens.lock().get(identifier).cloned();
        if let Some(properties) = cached {
            return Ok(properties);
        }

        let properties = self.reader.token_properties(identifier).await?;
        self.tokens
            .lock()
            .insert(identifier.to_string(), properties.clone());
        Ok(properties)
    }

    /// Denomination of the round currency: the token's when the round is
    /// paid in tokens, the native one otherwise.
    pub async fn round_denomination(&self, round: &RoundInfo) -> Result<Denomination> {
        if round.is_token_round() {
            let properties = self.token_properties(&round.token_identifier).await?;
            Ok(properties.denomination())
        } else {
            Ok(self.reader.network().native_denomination())
        }
    }

    async fn post(&self, text: &str) -> Option<MessageRef> {
        match self.notifier.post_to_group(text).await {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!("Error sending message to group: {}", e);
                None
            }
        }
    }

    async fn tell(&self, player: PlayerId, text: &str) -> Option<MessageRef> {
        match self.notifier.send_direct(player, text).await {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!("Error sending message to player {}: {}", player, e);
                None
            }
        }
    }

    async fn refuse<T>(&self, player: PlayerId, text: &str, reason: &str) -> Result<T> {
        self.tell(player, text).await;
        Err(GameError::invalid_state(reason))
    }

    /// Refresh the round snapshot, announce a new round to the group and
    /// keep the announcement's ticket count current.
    pub async fn tick(&self) -> Result<RoundInfo> {
        let info = match self.refresh_round().await {
            Ok(info) => info,
            Err(e) => {
                self.notifier
                    .report_error(&format!("Unable to get contract info. Error: {}", e))
                    .await;
                return Err(e);
            }
        };

        let (announce, changed, message) = {
            let announcement = self.announcement.lock();
            (
                announcement.round != Some(info.round) && info.status != GameStatus::Idle,
                announcement.tickets != info.round_tickets,
                announcement.message,
            )
        };

        // announcement state moves only after the text rendered
        if announce {
            let text = self.render_game_info(&info, None).await?;
            let message = self.post(&text).await;
            let mut announcement = self.announcement.lock();
            announcement.round = Some(info.round);
            announcement.tickets = info.round_tickets;
            announcement.message = message;
            tracing::info!("Announced round {}", info.round);
        } else if changed {
            if let Some(message) = message {
                let text = self.render_game_info(&info, None).await?;
                if let Err(e) = self
                    .notifier
                    .edit_message(&message, &text, TextFormat::Markdown)
                    .await
                {
                    tracing::warn!("Failed to update round announcement: {}", e);
                }
            }
            self.announcement.lock().tickets = info.round_tickets;
        }

        Ok(info)
    }

    /// Game info for the group, or for one player including their ticket count.
    pub async fn game_info_text(&self, player: Option<PlayerId>) -> Result<String> {
        let round = self.require_round()?;
        self.render_game_info(&round, player).await
    }

    async fn render_game_info(&self, round: &RoundInfo, player: Option<PlayerId>) -> Result<String> {
        let denomination = self.round_denomination(round).await?;
        let multipliers = &round.multipliers;

        let mut text = String::from("`Game Info`\n\n");
        text.push_str(&format!("`Game round:` #{}\n", round.round));
        text.push_str(&format!(
            "`Ticket price:` {} {}\n",
            denomination.format(round.ticket_price),
            round.ticker_label()
        ));
        if round.status != GameStatus::Idle {
            text.push_str(&format!("`Tickets bought:` {}\n", round.round_tickets));
        }
        text.push_str(&format!("`Numbers to extract:` {}\n", round.numbers_to_extract));
        text.push_str(&format!(
            "`Prize multipliers:`\n`   Bingo:` x{}\n`   Two lines:` x{}\n`   One line:` x{}\n",
            multipliers.bingo, multipliers.two_lines, multipliers.one_line
        ));
        text.push_str(&format!(
            "`Round duration:` {} seconds\n",
            round.round_duration_secs
        ));
        text.push_str(&format!("`Status:` {}\n", round.status));
        if round.status == GameStatus::Running {
            text.push_str(&format!(
                "`Deadline:` {}\n",
                round.deadline.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }

        if let Some(player) = player.filter(|_| round.status != GameStatus::Idle) {
            let wallet = self.registry.register(player)?;
            match self.reader.player_tickets(&wallet.address).await {
                Ok(tickets) if tickets.len() > 1 => {
                    text.push_str(&format!("\nYou have `{}` tickets", tickets.len()))
                }
                Ok(tickets) if tickets.len() == 1 => text.push_str("\nYou have `1` ticket"),
                Ok(_) => {}
                Err(e) => tracing::debug!("No ticket count for player {}: {}", player, e),
            }
        }

        Ok(text)
    }

    pub async fn statistics_text(&self) -> Result<String> {
        let stats = self.reader.statistics().await?;
        Ok(format!(
            "`Statistics`\n\n`Tickets:` {}\n`Bingo:` {} ({:.2}%)\n`2 Lines:` {} ({:.2}%)\n`1 Line:` {} ({:.2}%)",
            stats.total_tickets,
            stats.total_bingo,
            stats.bingo_rate(),
            stats.total_two_lines,
            stats.two_lines_rate(),
            stats.total_one_line,
            stats.one_line_rate()
        ))
    }

    /// Submit `count` ticket purchases for `player` and watch each of them.
    /// Refusals are explained to the player before the error is returned.
    pub async fn buy_tickets(
        self: &Arc<Self>,
        player: PlayerId,
        count: u32,
    ) -> Result<Vec<PendingPurchase>> {
        if count == 0 {
            return Err(GameError::invalid_state("Ticket count must be positive"));
        }

        let wallet = self.registry.register(player)?;
        let round = self.require_round()?;

        match round.status {
            GameStatus::Extracting => {
                return self
                    .refuse(
                        player,
                        "⌛️ Please wait for the current round to finish",
                        "Round is being extracted",
                    )
                    .await
            }
            GameStatus::Paused => {
                return self
                    .refuse(player, "⏸ Contract is paused", "Contract is paused")
                    .await
            }
            GameStatus::Running | GameStatus::Idle => {}
        }

        let account = match self.ledger.get_account(&wallet.address).await {
            Ok(account) => account,
            Err(e) => {
                let text = format!("❗️ Network error. Please contact an administrator ({})", e);
                self.tell(player, &text).await;
                return Err(e.into());
            }
        };

        let native = self.reader.network().native_denomination();
        let tickets = u128::from(count);
        let fees = native.parse_units(BUY_TICKET_FEE)?.saturating_mul(tickets);
        let price = round.ticket_price.saturating_mul(tickets);

        if round.is_token_round() {
            let token = round.token_identifier.as_str();
            let token_balance = match self.ledger.get_token_balance(&wallet.address, token).await {
                Ok(balance) => balance,
                Err(e) => {
                    let text = format!("❗️ Network error. Please contact an administrator ({})", e);
                    self.tell(player, &text).await;
                    return Err(e.into());
                }
            };

            if account.balance < fees {
                let text = format!(
                    "⛔️ Not enough balance. You have {} {} and you need {} for the transaction fee(s)",
                    native.format(account.balance),
                    NATIVE_UNIT,
                    native.format(fees)
                );
                self.tell(player, &text).await;
                return Err(GameError::InsufficientBalance {
                    need: native.format(fees),
                    available: native.format(account.balance),
                    unit: NATIVE_UNIT.to_string(),
                });
            }

            let denomination = match self.token_properties(token).await {
                Ok(properties) => properties.denomination(),
                Err(e) => {
                    self.notifier
                        .report_error("buyTicket - can not get token properties")
                        .await;
                    return Err(e);
                }
            };

            if token_balance < price {
                let text = format!(
                    "⛔️ Not enough balance. You have {} {} and you need {} for the ticket(s)",
                    denomination.format(token_balance),
                    token,
                    denomination.format(price)
                );
                self.tell(player, &text).await;
                return Err(GameError::InsufficientBalance {
                    need: denomination.format(price),
                    available: denomination.format(token_balance),
                    unit: token.to_string(),
                });
            }
        } else {
            let need = price.saturating_add(fees);
            if account.balance < need {
                let text = format!(
                    "⛔️ Not enough balance. You have {} {} and you need {} for the ticket(s) and {} for the transaction fee(s)",
                    native.format(account.balance),
                    NATIVE_UNIT,
                    native.format(price),
                    native.format(fees)
                );
                self.tell(player, &text).await;
                return Err(GameError::InsufficientBalance {
                    need: native.format(need),
                    available: native.format(account.balance),
                    unit: NATIVE_UNIT.to_string(),
                });
            }
        }

        // an idle contract starts the next round with the first ticket
        let target_round = match round.status {
            GameStatus::Idle => round.round + 1,
            _ => round.round,
        };
        let prefix = format!("`Buy ticket in round #{}` - Status: ", target_round);
        let (value, data) = if round.is_token_round() {
            (0, buy_ticket_data(Some(round.token_identifier.as_str()), round.ticket_price))
        } else {
            (round.ticket_price, buy_ticket_data(None, 0))
        };
        let key = wallet.signing_key(&self.seed)?;

        let mut purchases = Vec::with_capacity(count as usize);
        for i in 0..u64::from(count) {
            let request = TransactionRequest::call(
                self.reader.network(),
                wallet.address.clone(),
                self.settings.contract.clone(),
                account.nonce + i,
                value,
                BUY_TICKET_GAS_LIMIT,
                data.clone(),
            );
            let signed = request.sign(&key)?;

            let hash = match self.ledger.submit_transaction(&signed).await {
                Ok(hash) => hash,
                Err(e) => {
                    self.tell(player, &format!("⛔️ Error sending transaction: {}", e))
                        .await;
                    if purchases.is_empty() {
                        return Err(e.into());
                    }
                    tracing::warn!(
                        "Purchase {} of {} for player {} failed: {}",
                        i + 1,
                        count,
                        player,
                        e
                    );
                    break;
                }
            };
            tracing::info!(
                "Player {} bought a ticket for round {}: {}",
                player,
                target_round,
                hash
            );

            let mut status_line =
                StatusLine::new(prefix.clone(), self.settings.explorer_transaction.clone());
            status_line.message = self
                .tell(player, &status_line.render(&hash, TransactionStatus::Pending))
                .await;

            let handle = self.spawn_purchase_watch(player, hash.clone(), status_line, &round);
            purchases.push(PendingPurchase { hash, handle });
        }

        Ok(purchases)
    }

    fn spawn_purchase_watch(
        self: &Arc<Self>,
        player: PlayerId,
        hash: String,
        status_line: StatusLine,
        round: &RoundInfo,
    ) -> JoinHandle<Result<Option<Ticket>>> {
        let monitor = Arc::clone(self);
        let watcher = self.watcher(round);
        tokio::spawn(async move {
            monitor
                .deliver_ticket(&watcher, player, &hash, &status_line)
                .await
        })
    }

    async fn deliver_ticket(
        &self,
        watcher: &TransactionWatcher,
        player: PlayerId,
        hash: &str,
        status_line: &StatusLine,
    ) -> Result<Option<Ticket>> {
        match self.settle_purchase(watcher, player, hash, status_line).await {
            Err(GameError::Cancelled) => Err(GameError::Cancelled),
            Err(e) => {
                tracing::warn!("Ticket {} of player {} not delivered: {}", hash, player, e);
                self.notifier
                    .report_error(&format!("can not deliver ticket {}: {}", hash, e))
                    .await;
                Err(e)
            }
            delivered => delivered,
        }
    }

    async fn settle_purchase(
        &self,
        watcher: &TransactionWatcher,
        player: PlayerId,
        hash: &str,
        status_line: &StatusLine,
    ) -> Result<Option<Ticket>> {
        let outcome = watcher.watch(hash, status_line).await?;
        if outcome.status != TransactionStatus::Success {
            return Ok(None);
        }

        let ticket = outcome
            .results
            .iter()
            .find_map(purchased_ticket)
            .ok_or_else(|| {
                BingoError::invalid_response(format!("no ticket in the results of {}", hash))
            })?;

        let message = self.notifier.send_direct(player, &format_ticket(&ticket)).await?;
        self.registry
            .push_ticket(player, DisplayedTicket { ticket, message })?;
        Ok(Some(ticket))
    }

    /// Extract numbers when the round asks for it. Returns `None` when there
    /// is nothing to do or an extraction is already in flight.
    pub async fn extraction_tick(&self) -> Result<Option<ExtractionReport>> {
        let Some(round) = self.current_round() else {
            return Ok(None);
        };
        if round.status != GameStatus::Extracting {
            return Ok(None);
        }
        if self.extracting.swap(true, Ordering::SeqCst) {
            tracing::debug!("Extraction for round {} already in flight", round.round);
            return Ok(None);
        }

        let result = self.extract(&round).await;
        self.extracting.store(false, Ordering::SeqCst);
        result.map(Some)
    }

    async fn submit_extraction(&self) -> Result<String> {
        let operator = PlayerWallet::derive(&self.seed, OPERATOR_PLAYER_ID)?;
        let account = self.ledger.get_account(&operator.address).await?;
        let request = TransactionRequest::call(
            self.reader.network(),
            operator.address.clone(),
            self.settings.contract.clone(),
            account.nonce,
            0,
            EXTRACT_NUMBERS_GAS_LIMIT,
            EXTRACT_NUMBERS_FUNCTION,
        );
        let signed = request.sign(&operator.signing_key(&self.seed)?)?;
        Ok(self.ledger.submit_transaction(&signed).await?)
    }

    async fn extract(&self, round: &RoundInfo) -> Result<ExtractionReport> {
        let hash = match self.submit_extraction().await {
            Ok(hash) => hash,
            Err(e) => {
                self.notifier
                    .report_error(&format!("error sending extract numbers tx: {}", e))
                    .await;
                return Err(e);
            }
        };
        tracing::info!("Extracting numbers for round {}: {}", round.round, hash);

        match self.reader.last_extracted_numbers().await {
            Ok(numbers) => {
                self.post(&format!("`Extracted numbers:` `{}`\n", numbers))
                    .await;
            }
            Err(e) => tracing::warn!("Could not read extracted numbers: {}", e),
        }

        let mut status_line = StatusLine::new(
            format!("`Round #{}: Sending prizes` - Status: ", round.round),
            self.settings.explorer_transaction.clone(),
        );
        status_line.message = self
            .post(&status_line.render(&hash, TransactionStatus::Pending))
            .await;

        let watcher = self.watcher(round);
        let status = match watcher.wait_for_terminal(&hash, &status_line).await {
            Ok(status) => status,
            Err(e @ GameError::WatchTimeout { .. }) => {
                self.notifier.report_error(&e.to_string()).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let mut winnings = Vec::new();
        if status == TransactionStatus::Success {
            match watcher.fetch_results(&hash).await {
                Ok(records) => winnings = self.announce_winners(&records, round).await,
                Err(GameError::Cancelled) => return Err(GameError::Cancelled),
                Err(e) => {
                    tracing::warn!("No results for extraction {}: {}", hash, e);
                    self.notifier
                        .report_error(&format!("can not get results of {}: {}", hash, e))
                        .await;
                }
            }
        }

        self.refresh_tickets().await;

        Ok(ExtractionReport {
            round: round.round,
            hash,
            status,
            winnings,
        })
    }

    async fn announce_winners(&self, records: &[ResultRecord], round: &RoundInfo) -> Vec<Winning> {
        let winnings = prize::classify(records, round, |address| {
            self.registry.player_by_address(address).map(|w| w.player_id)
        });

        for winning in &winnings {
            self.tell(winning.player, &prize::winner_message(winning))
                .await;
        }

        let summary = prize::group_summary(&winnings, |player| self.notifier.mention(player));
        self.post(&summary).await;
        tracing::info!("Round {}: {} prize groups", round.round, winnings.len());
        winnings
    }

    /// Re-render every displayed ticket against the latest extracted numbers
    /// and forget them. Returns the number of tickets updated.
    pub async fn refresh_tickets(&self) -> usize {
        let extracted = match self.reader.last_extracted_numbers().await {
            Ok(numbers) => numbers,
            Err(e) => {
                tracing::warn!("Strikethrough skipped, no extracted numbers: {}", e);
                return 0;
            }
        };

        let mut refreshed = 0;
        for (player, tickets) in self.registry.take_all_tickets() {
            for displayed in tickets {
                let text = format_strikethrough(&displayed.ticket, &extracted);
                match self
                    .notifier
                    .edit_message(&displayed.message, &text, TextFormat::MarkdownV2)
                    .await
                {
                    Ok(()) => refreshed += 1,
                    Err(e) => tracing::warn!("Ticket update for player {} failed: {}", player, e),
                }
            }
        }
        refreshed
    }

    /// Re-send the player's tickets of the running round, replacing the
    /// messages shown so far. Returns the number of tickets sent.
    pub async fn send_my_tickets(&self, player: PlayerId) -> Result<usize> {
        let round = self.require_round()?;
        if round.status != GameStatus::Running {
            return self
                .refuse(player, "❕ Game must be running", "Game is not running")
                .await;
        }

        let wallet = self.registry.register(player)?;
        let tickets = self.reader.player_tickets(&wallet.address).await?;
        if tickets.is_empty() {
            self.tell(player, "🚫 You have no tickets in this round").await;
            return Ok(0);
        }

        for old in self.registry.take_tickets(player) {
            if let Err(e) = self.notifier.delete_message(&old.message).await {
                tracing::warn!("Could not delete ticket message: {}", e);
            }
        }

        let mut sent = 0;
        for ticket in tickets {
            match self.notifier.send_direct(player, &format_ticket(&ticket)).await {
                Ok(message) => {
                    self.registry
                        .push_ticket(player, DisplayedTicket { ticket, message })?;
                    sent += 1;
                }
                Err(e) => tracing::warn!("Could not send ticket to player {}: {}", player, e),
            }
        }
        Ok(sent)
    }

    /// Run the round poller and the extraction trigger until `shutdown`
    /// turns true.
    pub async fn run(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(
            "Monitoring {} every {:?}, extraction every {:?}",
            self.settings.contract.short(),
            self.settings.polling.round_interval(),
            self.settings.polling.extraction_interval()
        );

        let rounds = tokio::spawn(Arc::clone(self).round_loop());
        let extraction = tokio::spawn(Arc::clone(self).extraction_loop());

        cancelled(shutdown).await;
        tracing::info!("Shutting down monitor");
        self.shutdown();

        for task in [rounds, extraction] {
            if let Err(e) = task.await {
                tracing::warn!("Monitor task ended abnormally: {}", e);
            }
        }
        Ok(())
    }

    async fn round_loop(self: Arc<Self>) {
        let mut ticker = interval(self.settings.polling.round_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                biased;
                _ = cancelled(shutdown.clone()) => break,
                _ = ticker.tick() => match self.tick().await {
                    Ok(_) => {}
                    Err(e) if e.is_transient() => {
                        tracing::warn!("Round poll failed, retrying next tick: {}", e)
                    }
                    Err(e) => tracing::error!("Round poll failed: {}", e),
                },
            }
        }
    }

    async fn extraction_loop(self: Arc<Self>) {
        let period = self.settings.polling.extraction_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                biased;
                _ = cancelled(shutdown.clone()) => break,
                _ = ticker.tick() => match self.extraction_tick().await {
                    Ok(Some(report)) => tracing::info!(
                        "Round {} extraction finished: {:?}",
                        report.round,
                        report.status
                    ),
                    Ok(None) => {}
                    Err(GameError::Cancelled) => break,
                    Err(e) if e.is_transient() => {
                        tracing::warn!("Extraction failed, retrying next tick: {}", e)
                    }
                    Err(e) => tracing::error!("Extraction failed: {}", e),
                },
            }
        }
    }
}

/// Ticket carried in the last data field of a purchase result.
fn purchased_ticket(record: &ResultRecord) -> Option<Ticket> {
    let bytes = hex::decode(record.last_param()?).ok()?;
    decode_ticket(&bytes).ok()
}
