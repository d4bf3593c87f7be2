//! Offer statistics and the payloads exchanged with the bandit engine.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type OfferId = i64;
pub type ClickId = i64;

/// Cumulative statistics for one offer, created lazily on first reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferStat {
    pub offer_id: OfferId,
    /// Selection events that chose this offer.
    pub clicks: u64,
    /// Feedback events with positive reward attributed to this offer.
    pub conversions: u64,
    /// Sum of all positive rewards attributed to this offer.
    pub cumulative_reward: f64,
}

impl OfferStat {
    pub fn new(offer_id: OfferId) -> Self {
        Self {
            offer_id,
            clicks: 0,
            conversions: 0,
            cumulative_reward: 0.0,
        }
    }

    pub fn snapshot(&self) -> OfferSnapshot {
        OfferSnapshot {
            clicks: self.clicks,
            conversions: self.conversions,
            cumulative_reward: self.cumulative_reward,
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.clicks == 0 {
            0.0
        } else {
            self.conversions as f64 / self.clicks as f64
        }
    }

    pub fn reward_per_click(&self) -> f64 {
        if self.clicks == 0 {
            0.0
        } else {
            self.cumulative_reward / self.clicks as f64
        }
    }

    pub fn view(&self) -> OfferStatsView {
        OfferStatsView {
            offer_id: self.offer_id,
            clicks: self.clicks,
            conversions: self.conversions,
            reward: self.cumulative_reward,
            cr: self.conversion_rate(),
            rpc: self.reward_per_click(),
        }
    }
}

/// Consistent read of a single offer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OfferSnapshot {
    pub clicks: u64,
    pub conversions: u64,
    pub cumulative_reward: f64,
}

/// Result of a selection: the offer chosen for a click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Selection {
    pub click_id: ClickId,
    pub offer_id: OfferId,
}

/// Result of applying feedback to a previously selected click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackOutcome {
    pub click_id: ClickId,
    pub offer_id: OfferId,
    pub is_conversion: bool,
    pub reward: f64,
}

/// Externally visible statistics for an offer, including derived rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OfferStatsView {
    pub offer_id: OfferId,
    pub clicks: u64,
    pub conversions: u64,
    pub reward: f64,
    /// Conversion rate: conversions / clicks.
    pub cr: f64,
    /// Reward per click: reward / clicks.
    pub rpc: f64,
}
