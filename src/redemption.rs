// 12.0 redemption.rs: physical gold claims. burned gold-token becomes a record an
// external fulfillment process ships against. no reversal once burned.
// one gold-token is one gram.

use crate::types::{AccountId, Amount, Timestamp, WAD};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RedemptionId(pub u64);

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Bar sizes on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoldBar {
    Gram1,
    Gram2,
    Gram5,
    Gram10,
    Gram50,
    Gram100,
}

impl GoldBar {
    pub const ALL: [GoldBar; 6] = [
        GoldBar::Gram1,
        GoldBar::Gram2,
        GoldBar::Gram5,
        GoldBar::Gram10,
        GoldBar::Gram50,
        GoldBar::Gram100,
    ];

    pub fn grams(&self) -> u128 {
        match self {
            GoldBar::Gram1 => 1,
            GoldBar::Gram2 => 2,
            GoldBar::Gram5 => 5,
            GoldBar::Gram10 => 10,
            GoldBar::Gram50 => 50,
            GoldBar::Gram100 => 100,
        }
    }
}

/// Gold-token needed for a bar order. `None` on an empty order or overflow.
pub fn bars_amount(bars: &[(GoldBar, u32)]) -> Option<Amount> {
    let grams = bars.iter().try_fold(0u128, |acc, (bar, qty)| {
        bar.grams()
            .checked_mul(u128::from(*qty))
            .and_then(|g| acc.checked_add(g))
    })?;
    if grams == 0 {
        return None;
    }
    grams.checked_mul(WAD).map(Amount::from_raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedemptionStatus {
    Pending,
    Fulfilled { at: Timestamp },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub id: RedemptionId,
    pub account: AccountId,
    pub amount: Amount,
    pub timestamp: Timestamp,
    // empty for a plain amount claim
    pub bars: Vec<(GoldBar, u32)>,
    pub status: RedemptionStatus,
}

impl RedemptionRecord {
    pub fn is_pending(&self) -> bool {
        self.status == RedemptionStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedemptionError {
    #[error("unknown redemption {0}")]
    Unknown(RedemptionId),

    #[error("redemption {0} already fulfilled")]
    AlreadyFulfilled(RedemptionId),
}

/// Every record is kept as the delivery audit trail. Pending ids and
/// per-account ids are indexed so the shipping queue and account views never
/// scan the whole history.
#[derive(Debug, Clone)]
pub struct RedemptionRegistry {
    records: Vec<RedemptionRecord>,
    pending: BTreeSet<RedemptionId>,
    by_account: HashMap<AccountId, Vec<RedemptionId>>,
    next_id: u64,
}

impl Default for RedemptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RedemptionRegistry {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            pending: BTreeSet::new(),
            by_account: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn record(
        &mut self,
        account: AccountId,
        amount: Amount,
        bars: Vec<(GoldBar, u32)>,
        timestamp: Timestamp,
    ) -> RedemptionRecord {
        let id = RedemptionId(self.next_id);
        let record = RedemptionRecord {
            id,
            account,
            amount,
            timestamp,
            bars,
            status: RedemptionStatus::Pending,
        };
        self.next_id += 1;
        self.records.push(record.clone());
        self.pending.insert(id);
        self.by_account.entry(account).or_default().push(id);
        record
    }

    // ids are sequential from 1 and records are never removed
    fn index_of(id: RedemptionId) -> Option<usize> {
        usize::try_from(id.0.checked_sub(1)?).ok()
    }

    pub fn get(&self, id: RedemptionId) -> Option<&RedemptionRecord> {
        self.records.get(Self::index_of(id)?)
    }

    /// Oldest first.
    pub fn pending(&self) -> Vec<&RedemptionRecord> {
        self.pending.iter().filter_map(|id| self.get(*id)).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn for_account(&self, account: AccountId) -> Vec<&RedemptionRecord> {
        self.by_account
            .get(&account)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> &[RedemptionRecord] {
        &self.records
    }

    pub fn total_redeemed(&self) -> Option<Amount> {
        self.records
            .iter()
            .try_fold(Amount::ZERO, |acc, r| acc.checked_add(r.amount))
    }

    pub fn mark_fulfilled(
        &mut self,
        id: RedemptionId,
        timestamp: Timestamp,
    ) -> Result<RedemptionRecord, RedemptionError> {
        let record = Self::index_of(id)
            .and_then(|index| self.records.get_mut(index))
            .ok_or(RedemptionError::Unknown(id))?;
        if !record.is_pending() {
            return Err(RedemptionError::AlreadyFulfilled(id));
        }
        record.status = RedemptionStatus::Fulfilled { at: timestamp };
        self.pending.remove(&id);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_amounts() {
        let order = [(GoldBar::Gram5, 2), (GoldBar::Gram100, 1)];
        assert_eq!(bars_amount(&order), Amount::from_units(110));
        assert_eq!(bars_amount(&[]), None);
        assert_eq!(bars_amount(&[(GoldBar::Gram1, 0)]), None);

        let total: u128 = GoldBar::ALL.iter().map(|b| b.grams()).sum();
        assert_eq!(total, 168);
    }

    #[test]
    fn test_record_and_fulfill() {
        let mut registry = RedemptionRegistry::new();
        let alice = AccountId::from_seed(1);
        let amount = Amount::from_units(10).unwrap();

        let first = registry.record(alice, amount, vec![], Timestamp::from_millis(1));
        let second = registry.record(alice, amount, vec![(GoldBar::Gram10, 1)], Timestamp::from_millis(2));
        assert_eq!(first.id, RedemptionId(1));
        assert_eq!(second.id, RedemptionId(2));
        assert_eq!(registry.pending().len(), 2);

        let done = registry.mark_fulfilled(first.id, Timestamp::from_millis(9)).unwrap();
        assert_eq!(done.status, RedemptionStatus::Fulfilled { at: Timestamp::from_millis(9) });
        assert_eq!(registry.pending().len(), 1);
        assert_eq!(registry.get(first.id).unwrap().status, done.status);
        assert_eq!(registry.total_redeemed(), Amount::from_units(20));
    }

    #[test]
    fn test_fulfill_errors() {
        let mut registry = RedemptionRegistry::new();
        let id = registry
            .record(AccountId::from_seed(1), Amount::from_raw(1), vec![], Timestamp::from_millis(1))
            .id;

        assert_eq!(
            registry.mark_fulfilled(RedemptionId(7), Timestamp::from_millis(2)),
            Err(RedemptionError::Unknown(RedemptionId(7)))
        );
        assert_eq!(
            registry.mark_fulfilled(RedemptionId(0), Timestamp::from_millis(2)),
            Err(RedemptionError::Unknown(RedemptionId(0)))
        );
        registry.mark_fulfilled(id, Timestamp::from_millis(2)).unwrap();
        assert_eq!(
            registry.mark_fulfilled(id, Timestamp::from_millis(3)),
            Err(RedemptionError::AlreadyFulfilled(id))
        );
    }

    #[test]
    fn test_indexes_follow_fulfillment() {
        let mut registry = RedemptionRegistry::new();
        let alice = AccountId::from_seed(1);
        let bob = AccountId::from_seed(2);
        let amount = Amount::from_units(1).unwrap();

        let ids: Vec<_> = [alice, bob, alice, bob, alice]
            .iter()
            .enumerate()
            .map(|(i, who)| registry.record(*who, amount, vec![], Timestamp::from_millis(i as i64)).id)
            .collect();

        registry.mark_fulfilled(ids[0], Timestamp::from_millis(10)).unwrap();
        registry.mark_fulfilled(ids[3], Timestamp::from_millis(11)).unwrap();

        let pending: Vec<_> = registry.pending().iter().map(|r| r.id).collect();
        assert_eq!(pending, vec![ids[1], ids[2], ids[4]]);
        assert_eq!(registry.pending_count(), 3);

        // fulfilled records stay visible per account
        let alice_ids: Vec<_> = registry.for_account(alice).iter().map(|r| r.id).collect();
        assert_eq!(alice_ids, vec![ids[0], ids[2], ids[4]]);
        assert_eq!(registry.for_account(bob).len(), 2);
        assert!(registry.for_account(AccountId::from_seed(3)).is_empty());
        assert_eq!(registry.all().len(), 5);
    }
}
