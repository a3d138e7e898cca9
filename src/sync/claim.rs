//! Single-owner decisions over a shared claim file.
//!
//! When several participants reach the same one-shot moment (the end of a
//! shift), exactly one of them must ask the user. The first to create
//! `schedule-coord.json` owns the question; everyone else polls the file
//! until the owner writes the answer.
//!
//! A claim moves through `unclaimed -> claimed -> resolved`. The resolved
//! record stays in place long enough for slower pollers to read it and is
//! reclaimed by the next round.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::clock::Clock;
use super::config::SyncConfig;
use super::error::SyncError;
use super::slot::SharedSlot;
use crate::types::{ClaimDecision, ClaimExtra, ClaimRecord};

/// File name of the claim slot inside the shared directory.
pub const CLAIM_FILE: &str = "schedule-coord.json";

/// Result of [`LeaderClaim::try_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This participant asks the user and resolves the claim
    Owner,
    /// Someone else owns the claim; await its resolution
    Follower,
}

/// How a claim ended, as seen by one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResolution {
    /// A decision was made, here (`owned`) or by another participant
    Decided {
        decision: ClaimDecision,
        extra: Option<ClaimExtra>,
        owned: bool,
    },
    /// The claim disappeared or aged out without a decision
    Abandoned,
}

/// One participant's view of the claim slot.
#[derive(Debug)]
pub struct LeaderClaim {
    slot: SharedSlot,
    clock: Arc<dyn Clock>,
    claim_stale_ms: u64,
    resolved_linger_ms: u64,
    poll_interval: Duration,
    owned: bool,
    awaiting: bool,
    resolution_tx: mpsc::UnboundedSender<ClaimResolution>,
}

impl LeaderClaim {
    /// Creates a coordinator. Every resolution, owned or observed, is also
    /// sent on `resolution_tx`.
    pub fn new(
        dir: &Path,
        config: &SyncConfig,
        clock: Arc<dyn Clock>,
        resolution_tx: mpsc::UnboundedSender<ClaimResolution>,
    ) -> Self {
        Self {
            slot: SharedSlot::new(dir.join(CLAIM_FILE)),
            clock,
            claim_stale_ms: config.claim_stale_ms,
            resolved_linger_ms: config.resolved_linger_ms,
            poll_interval: config.poll_interval(),
            owned: false,
            awaiting: false,
            resolution_tx,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.owned
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Current claim record, if any.
    pub fn read_record(&self) -> Option<ClaimRecord> {
        self.slot.read()
    }

    /// Tries to become the owner of the current round.
    ///
    /// Losing to another participant is the common case and is not an
    /// error. A leftover record (abandoned, or resolved in a previous round)
    /// is removed and the create retried exactly once.
    pub fn try_claim(&mut self) -> Result<ClaimOutcome, SyncError> {
        let now = self.clock.now_ms();
        if self.slot.create_exclusive(&ClaimRecord::claim(now))? {
            return Ok(self.became_owner());
        }

        if let Some(existing) = self.slot.read::<ClaimRecord>() {
            if !self.is_reclaimable(&existing, now) {
                tracing::debug!(age_ms = existing.age_ms(now), "claim held elsewhere");
                return Ok(ClaimOutcome::Follower);
            }
            tracing::info!(
                age_ms = existing.age_ms(now),
                resolved = existing.is_resolved(),
                "removing leftover claim"
            );
        }

        self.slot.remove()?;
        if self.slot.create_exclusive(&ClaimRecord::claim(now))? {
            Ok(self.became_owner())
        } else {
            Ok(ClaimOutcome::Follower)
        }
    }

    /// Writes the owner's decision and reports it locally.
    ///
    /// The local resolution is delivered even if the write fails; the error
    /// is returned so the caller can log it. Followers then see the claim
    /// age out and re-arm on their own.
    pub fn resolve(
        &mut self,
        decision: ClaimDecision,
        extra: Option<ClaimExtra>,
    ) -> Result<(), SyncError> {
        if !self.owned {
            tracing::debug!(decision = decision.as_str(), "resolving a claim this participant does not own");
        }
        self.owned = false;
        self.awaiting = false;

        let record = ClaimRecord::resolved(self.clock.now_ms(), decision, extra.clone());
        let written = self.slot.write(&record);

        tracing::info!(decision = decision.as_str(), "claim resolved");
        self.emit(ClaimResolution::Decided {
            decision,
            extra,
            owned: true,
        });
        written
    }

    /// Starts following the current claim.
    pub fn begin_await(&mut self) {
        self.awaiting = true;
    }

    /// Checks the claim once. Returns the resolution when following ends.
    pub fn poll_resolution(&mut self) -> Option<ClaimResolution> {
        if !self.awaiting {
            return None;
        }
        let now = self.clock.now_ms();

        let resolution = match self.slot.read::<ClaimRecord>() {
            None => ClaimResolution::Abandoned,
            Some(ClaimRecord {
                decision: Some(decision),
                extra,
                ..
            }) => ClaimResolution::Decided {
                decision,
                extra,
                owned: false,
            },
            Some(record) if record.age_ms(now) > self.claim_stale_ms => {
                if let Err(e) = self.slot.remove() {
                    tracing::warn!(error = %e, "failed to remove abandoned claim");
                }
                ClaimResolution::Abandoned
            }
            Some(_) => return None,
        };

        self.awaiting = false;
        match &resolution {
            ClaimResolution::Decided { decision, .. } => {
                tracing::info!(decision = decision.as_str(), "observed claim resolution");
            }
            ClaimResolution::Abandoned => tracing::info!("claim abandoned"),
        }
        self.emit(resolution.clone());
        Some(resolution)
    }

    /// Follows the current claim until it resolves or is abandoned.
    pub async fn await_resolution(&mut self) -> ClaimResolution {
        self.begin_await();

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Some(resolution) = self.poll_resolution() {
                return resolution;
            }
        }
    }

    /// Stops following. An unanswered claim held here is released so the
    /// other participants do not wait for it to age out.
    pub fn cancel(&mut self) {
        self.awaiting = false;
        if !self.owned {
            return;
        }
        self.owned = false;

        let unanswered = self.slot.read::<ClaimRecord>().is_some_and(|r| !r.is_resolved());
        if unanswered {
            if let Err(e) = self.slot.remove() {
                tracing::warn!(error = %e, "failed to release claim");
            }
        }
    }

    fn became_owner(&mut self) -> ClaimOutcome {
        tracing::info!(path = %self.slot.path().display(), "claim acquired");
        self.owned = true;
        self.awaiting = false;
        ClaimOutcome::Owner
    }

    fn is_reclaimable(&self, record: &ClaimRecord, now: u64) -> bool {
        let limit = if record.is_resolved() {
            self.resolved_linger_ms
        } else {
            self.claim_stale_ms
        };
        record.age_ms(now) > limit
    }

    fn emit(&self, resolution: ClaimResolution) {
        // A closed receiver only means nobody listens any more.
        let _ = self.resolution_tx.send(resolution);
    }
}
