//! Balance ledger: per-`(user, asset)` available/freeze partitions with
//! idempotent updates.
//!
//! Grounded on the teacher's `Balance` model (`models/balance.rs`, a
//! `{available, frozen}` pair per `(user_address, token)`), generalized to
//! the engine's `(user_id: u64, asset: String)` key and the `update()`
//! dedup semantics in `original_source/matchengine/me_server.c`'s
//! `on_cmd_balance_update` (`update_user_balance(true, ...)` plus the
//! `-1 → repeat`, `-2 → insufficient` code mapping).

use crate::decimal::Dec;
use crate::error::EngineError;
use std::collections::HashMap;

pub type UserId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Available,
    Freeze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BalanceKey {
    user: UserId,
    asset_idx: u32,
    kind: Kind,
}

/// Outcome of [`BalanceLedger::update`], mirroring the source's sentinel
/// integer return translated into a typed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    Repeat,
    Insufficient,
}

#[derive(Debug, Default)]
pub struct BalanceLedger {
    // Interning assets to a small integer keeps the hot key (user, asset, kind)
    // cheap to hash; the string is only touched on first sight of an asset.
    asset_ids: HashMap<String, u32>,
    next_asset_id: u32,
    balances: HashMap<BalanceKey, Dec>,
    dedup: HashMap<(String, u64), UpdateOutcome>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn asset_id(&mut self, asset: &str) -> u32 {
        if let Some(id) = self.asset_ids.get(asset) {
            return *id;
        }
        let id = self.next_asset_id;
        self.next_asset_id += 1;
        self.asset_ids.insert(asset.to_string(), id);
        id
    }

    fn asset_id_readonly(&self, asset: &str) -> Option<u32> {
        self.asset_ids.get(asset).copied()
    }

    pub fn get(&self, user: UserId, kind: Kind, asset: &str) -> Dec {
        match self.asset_id_readonly(asset) {
            Some(asset_idx) => self
                .balances
                .get(&BalanceKey { user, asset_idx, kind })
                .copied()
                .unwrap_or(Dec::ZERO),
            None => Dec::ZERO,
        }
    }

    pub fn available(&self, user: UserId, asset: &str) -> Dec {
        self.get(user, Kind::Available, asset)
    }

    pub fn freeze_balance(&self, user: UserId, asset: &str) -> Dec {
        self.get(user, Kind::Freeze, asset)
    }

    /// Apply `delta` to `(user, kind, asset)`. Negative deltas are only
    /// permitted when the resulting balance stays non-negative.
    pub fn add(&mut self, user: UserId, kind: Kind, asset: &str, delta: Dec) -> Result<(), EngineError> {
        let asset_idx = self.asset_id(asset);
        let key = BalanceKey { user, asset_idx, kind };
        let current = self.balances.get(&key).copied().unwrap_or(Dec::ZERO);
        let updated = current.checked_add(delta).ok_or_else(|| EngineError::Internal("balance overflow".into()))?;
        if updated.is_negative() {
            return Err(EngineError::BalanceNotEnough);
        }
        self.balances.insert(key, updated);
        Ok(())
    }

    /// Move `amount` from AVAILABLE to FREEZE.
    pub fn freeze(&mut self, user: UserId, asset: &str, amount: Dec) -> Result<(), EngineError> {
        if self.available(user, asset).inner() < amount.inner() {
            return Err(EngineError::BalanceNotEnough);
        }
        self.add(user, Kind::Available, asset, -amount)?;
        self.add(user, Kind::Freeze, asset, amount)?;
        Ok(())
    }

    /// Move `amount` from FREEZE back to AVAILABLE.
    pub fn unfreeze(&mut self, user: UserId, asset: &str, amount: Dec) -> Result<(), EngineError> {
        if self.freeze_balance(user, asset).inner() < amount.inner() {
            return Err(EngineError::Internal("unfreeze exceeds frozen balance".into()));
        }
        self.add(user, Kind::Freeze, asset, -amount)?;
        self.add(user, Kind::Available, asset, amount)?;
        Ok(())
    }

    /// Idempotent balance mutation keyed by `(business, business_id)`, per
    /// SPEC_FULL.md #4.3. `real = false` replays the transformation without
    /// being recorded for future dedup (used for replaying operlog without
    /// re-emitting external sink events, which the caller is responsible
    /// for suppressing separately).
    pub fn update(
        &mut self,
        real: bool,
        user: UserId,
        asset: &str,
        business: &str,
        business_id: u64,
        change: Dec,
    ) -> UpdateOutcome {
        let dedup_key = (business.to_string(), business_id);
        if self.dedup.contains_key(&dedup_key) {
            return UpdateOutcome::Repeat;
        }
        if change.is_negative() && change.inner().abs() > self.available(user, asset).inner() {
            return UpdateOutcome::Insufficient;
        }
        // `add` cannot fail here: we've already checked sufficiency above,
        // and overflow is not reachable for balances produced by this API.
        self.add(user, Kind::Available, asset, change).expect("checked balance add");
        if real {
            self.dedup.insert(dedup_key, UpdateOutcome::Applied);
        }
        UpdateOutcome::Applied
    }

    /// `(available_count, available_total, freeze_count, freeze_total)` across
    /// every user holding a non-zero balance of `asset`, per SPEC_FULL.md
    /// #4.2's asset summary query.
    pub fn asset_summary(&self, asset: &str) -> (u64, Dec, u64, Dec) {
        let mut available_count = 0u64;
        let mut available = Dec::ZERO;
        let mut freeze_count = 0u64;
        let mut freeze = Dec::ZERO;
        let Some(asset_idx) = self.asset_id_readonly(asset) else {
            return (0, Dec::ZERO, 0, Dec::ZERO);
        };
        for (key, balance) in &self.balances {
            if key.asset_idx != asset_idx || balance.is_zero() {
                continue;
            }
            match key.kind {
                Kind::Available => {
                    available_count += 1;
                    available = available + *balance;
                }
                Kind::Freeze => {
                    freeze_count += 1;
                    freeze = freeze + *balance;
                }
            }
        }
        (available_count, available, freeze_count, freeze)
    }
}
