//! # Session Registry Module
//!
//! One dialogue session per user, held in memory. Each user's slot sits
//! behind its own async mutex: an inbound action holds the lock for its whole
//! run, so a user's actions are applied one at a time while different users
//! proceed in parallel. Nothing here is durable.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::db::UserId;
use crate::dialogue::RecipeDialogueState;

/// A user's dialogue state plus bookkeeping for idle expiry
#[derive(Debug)]
pub struct SessionSlot {
    pub state: RecipeDialogueState,
    last_touched: Instant,
    evicted: bool,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            state: RecipeDialogueState::Idle,
            last_touched: Instant::now(),
            evicted: false,
        }
    }

    /// Mark the slot as used now
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched.elapsed()
    }

    /// Drop the draft
    pub fn reset(&mut self) {
        self.state = RecipeDialogueState::Idle;
    }

    /// Reset a dialogue left untouched longer than `ttl`; true if one was dropped
    pub fn expire_if_idle(&mut self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) if !self.state.is_idle() && self.idle_for() >= ttl => {
                self.reset();
                true
            }
            _ => false,
        }
    }
}

/// Concurrency-safe map from user id to that user's session
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<UserId, Arc<Mutex<SessionSlot>>>,
    idle_timeout: Option<Duration>,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Lock `user_id`'s session, creating it on first use.
    ///
    /// If the sweeper evicted the slot while we were waiting on it, the
    /// lookup is repeated so the caller always ends up on the live slot.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<SessionSlot> {
        loop {
            let slot = self
                .sessions
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(SessionSlot::new())))
                .clone();

            let guard = slot.lock_owned().await;
            if !guard.evicted {
                return guard;
            }
            debug!(user_id, "Session slot was evicted while waiting, retrying");
        }
    }

    /// Current state of a user's dialogue, waiting for any in-flight action
    pub async fn state_of(&self, user_id: UserId) -> RecipeDialogueState {
        let slot = match self.sessions.get(&user_id) {
            Some(entry) => Arc::clone(entry.value()),
            None => return RecipeDialogueState::Idle,
        };
        let guard = slot.lock().await;
        guard.state.clone()
    }

    /// Number of users with a slot in memory
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove slots that are idle, or whose draft has outlived the timeout.
    ///
    /// Slots currently locked by an action are skipped.
    pub fn evict_idle(&self) -> usize {
        let ttl = self.idle_timeout;
        let before = self.sessions.len();
        let mut expired_drafts = 0;

        self.sessions.retain(|_, slot| {
            let Ok(mut guard) = slot.try_lock() else {
                return true;
            };

            let stale = match ttl {
                Some(ttl) => guard.idle_for() >= ttl,
                None => false,
            };
            if guard.state.is_idle() || stale {
                if !guard.state.is_idle() {
                    expired_drafts += 1;
                }
                guard.reset();
                guard.evicted = true;
                false
            } else {
                true
            }
        });

        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, expired_drafts, "Evicted idle sessions");
        }
        evicted
    }
}
