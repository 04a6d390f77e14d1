use crate::notifier::MessageRef;
use crate::{GameError, Result};
use bingo_core::{PlayerId, PlayerWallet, Seed, Ticket};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A ticket message currently shown to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedTicket {
    pub ticket: Ticket,
    pub message: MessageRef,
}

#[derive(Debug)]
struct PlayerRecord {
    wallet: PlayerWallet,
    tickets: Vec<DisplayedTicket>,
}

#[derive(Debug, Default)]
struct Inner {
    players: HashMap<PlayerId, PlayerRecord>,
    by_address: HashMap<String, PlayerId>,
}

/// Known players and their displayed tickets. Every access goes through one
/// lock; nothing is held across an await.
pub struct PlayerRegistry {
    seed: Arc<Seed>,
    inner: Mutex<Inner>,
}

impl PlayerRegistry {
    pub fn new(seed: Arc<Seed>) -> Self {
        Self {
            seed,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Lookup-or-create. The wallet is derived once per player.
    pub fn register(&self, player_id: PlayerId) -> Result<PlayerWallet> {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.players.get(&player_id) {
            return Ok(record.wallet.clone());
        }

        let wallet = PlayerWallet::derive(&self.seed, player_id)?;
        inner
            .by_address
            .insert(wallet.address.to_string(), player_id);
        inner.players.insert(
            player_id,
            PlayerRecord {
                wallet: wallet.clone(),
                tickets: Vec::new(),
            },
        );

        tracing::info!("Registered player {} as {}", player_id, wallet.address.short());
        Ok(wallet)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<PlayerWallet> {
        self.inner
            .lock()
            .players
            .get(&player_id)
            .map(|r| r.wallet.clone())
    }

    pub fn player_by_address(&self, address: &str) -> Option<PlayerWallet> {
        let inner = self.inner.lock();
        let id = inner.by_address.get(address)?;
        inner.players.get(id).map(|r| r.wallet.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_ticket(&self, player_id: PlayerId, ticket: DisplayedTicket) -> Result<()> {
        let mut inner = self.inner.lock();
        let record = inner
            .players
            .get_mut(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;
        record.tickets.push(ticket);
        Ok(())
    }

    pub fn tickets(&self, player_id: PlayerId) -> Vec<DisplayedTicket> {
        self.inner
            .lock()
            .players
            .get(&player_id)
            .map(|r| r.tickets.clone())
            .unwrap_or_default()
    }

    /// Remove and return one player's displayed tickets.
    pub fn take_tickets(&self, player_id: PlayerId) -> Vec<DisplayedTicket> {
        self.inner
            .lock()
            .players
            .get_mut(&player_id)
            .map(|r| std::mem::take(&mut r.tickets))
            .unwrap_or_default()
    }

    /// Remove and return every player's displayed tickets.
    pub fn take_all_tickets(&self) -> Vec<(PlayerId, Vec<DisplayedTicket>)> {
        let mut inner = self.inner.lock();
        let mut taken: Vec<(PlayerId, Vec<DisplayedTicket>)> = inner
            .players
            .iter_mut()
            .filter(|(_, r)| !r.tickets.is_empty())
            .map(|(id, r)| (*id, std::mem::take(&mut r.tickets)))
            .collect();
        taken.sort_by_key(|(id, _)| *id);
        taken
    }
}
