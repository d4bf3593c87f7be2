//! Concurrent per-offer statistics store backed by DashMap.
//! Each offer's counters live behind their shard lock, so mutations of the
//! same offer are serialized while unrelated offers proceed in parallel.

use dashmap::DashMap;
use offer_core::types::{OfferId, OfferSnapshot, OfferStat, OfferStatsView};
use tracing::debug;

pub struct OfferStore {
    offers: DashMap<OfferId, OfferStat>,
}

impl OfferStore {
    pub fn new() -> Self {
        Self {
            offers: DashMap::new(),
        }
    }

    /// Create a zeroed record for `offer_id` if none exists.
    pub fn ensure(&self, offer_id: OfferId) {
        self.offers.entry(offer_id).or_insert_with(|| {
            debug!(offer_id, "Creating offer record");
            OfferStat::new(offer_id)
        });
    }

    /// Current counters for each requested offer, in input order.
    /// Each triple is read under the offer's lock; the batch as a whole is not atomic.
    pub fn snapshot(&self, offer_ids: &[OfferId]) -> Vec<OfferSnapshot> {
        offer_ids
            .iter()
            .map(|&offer_id| {
                self.offers
                    .entry(offer_id)
                    .or_insert_with(|| OfferStat::new(offer_id))
                    .snapshot()
            })
            .collect()
    }

    pub fn record_click(&self, offer_id: OfferId) {
        self.offers
            .entry(offer_id)
            .or_insert_with(|| OfferStat::new(offer_id))
            .clicks += 1;
    }

    /// Apply a reward to `offer_id`. Only positive rewards count as conversions;
    /// zero and negative rewards leave the statistics untouched.
    /// Returns whether the reward was counted as a conversion.
    pub fn record_feedback(&self, offer_id: OfferId, reward: f64) -> bool {
        if reward <= 0.0 || reward.is_nan() {
            return false;
        }
        let mut stat = self
            .offers
            .entry(offer_id)
            .or_insert_with(|| OfferStat::new(offer_id));
        stat.conversions += 1;
        stat.cumulative_reward += reward;
        true
    }

    /// Full statistics for one offer, creating the record on first query.
    pub fn stats(&self, offer_id: OfferId) -> OfferStatsView {
        self.offers
            .entry(offer_id)
            .or_insert_with(|| OfferStat::new(offer_id))
            .view()
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl Default for OfferStore {
    fn default() -> Self {
        Self::new()
    }
}
