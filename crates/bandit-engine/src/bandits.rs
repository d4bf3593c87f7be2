//! UCB bandit engine — picks the best offer for a click and attributes
//! delayed reward feedback back to the offer that was shown.

use crate::scoring::{first_argmax, ucb_score};
use crate::store::OfferStore;
use dashmap::DashMap;
use offer_core::error::{BanditError, BanditResult};
use offer_core::types::{ClickId, FeedbackOutcome, OfferId, OfferStatsView, Selection};
use std::sync::Arc;
use tracing::{debug, warn};

/// Offer chosen for a click, and whether feedback has already been applied to it.
#[derive(Debug, Clone, Copy)]
struct Assignment {
    offer_id: OfferId,
    consumed: bool,
}

pub struct BanditEngine {
    store: Arc<OfferStore>,
    /// click_id -> assignment. Last writer wins.
    assignments: DashMap<ClickId, Assignment>,
    max_candidates: Option<usize>,
}

impl BanditEngine {
    pub fn new(store: Arc<OfferStore>) -> Self {
        Self {
            store,
            assignments: DashMap::new(),
            max_candidates: None,
        }
    }

    /// Reject selections with more than `max` candidates.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = Some(max);
        self
    }

    pub fn store(&self) -> &Arc<OfferStore> {
        &self.store
    }

    /// UCB score of each candidate, in input order. Unknown offers are created.
    pub fn scores(&self, offer_ids: &[OfferId]) -> Vec<f64> {
        self.store
            .snapshot(offer_ids)
            .iter()
            .map(ucb_score)
            .collect()
    }

    /// Choose the highest-scoring candidate for `click_id`, count the click
    /// against it and remember the assignment for later feedback.
    /// Ties go to the earliest candidate in `offer_ids`.
    pub fn select(&self, click_id: ClickId, offer_ids: &[OfferId]) -> BanditResult<Selection> {
        if offer_ids.is_empty() {
            return Err(BanditError::InvalidArgument(
                "at least one candidate offer is required".to_string(),
            ));
        }
        if let Some(max) = self.max_candidates {
            if offer_ids.len() > max {
                return Err(BanditError::InvalidArgument(format!(
                    "{} candidate offers exceeds the limit of {max}",
                    offer_ids.len()
                )));
            }
        }

        let scores = self.scores(offer_ids);
        let best = first_argmax(&scores).ok_or_else(|| {
            BanditError::InvalidArgument("no candidate offer could be scored".to_string())
        })?;
        let offer_id = offer_ids[best];

        // The click must be counted before the assignment becomes visible to
        // feedback, so conversions never outrun clicks.
        self.store.record_click(offer_id);
        let assignment = Assignment {
            offer_id,
            consumed: false,
        };
        if let Some(previous) = self.assignments.insert(click_id, assignment) {
            warn!(
                click_id,
                previous = previous.offer_id,
                offer_id,
                "Click id reused, assignment overwritten"
            );
        }

        debug!(
            click_id,
            offer_id,
            score = scores[best],
            candidates = offer_ids.len(),
            "Offer selected"
        );

        Ok(Selection { click_id, offer_id })
    }

    /// Attribute `reward` to the offer previously selected for `click_id`.
    /// Each selection accepts one feedback; a repeat fails with `UnknownClick`
    /// until the click id is selected again.
    pub fn feedback(&self, click_id: ClickId, reward: f64) -> BanditResult<FeedbackOutcome> {
        if !reward.is_finite() {
            return Err(BanditError::InvalidArgument(format!(
                "reward must be a finite number, got {reward}"
            )));
        }

        let offer_id = {
            let mut entry = self
                .assignments
                .get_mut(&click_id)
                .ok_or(BanditError::UnknownClick(click_id))?;
            if entry.consumed {
                debug!(click_id, "Feedback already applied to click");
                return Err(BanditError::UnknownClick(click_id));
            }
            entry.consumed = true;
            entry.offer_id
        };

        let is_conversion = self.store.record_feedback(offer_id, reward);

        debug!(click_id, offer_id, reward, is_conversion, "Feedback recorded");

        Ok(FeedbackOutcome {
            click_id,
            offer_id,
            is_conversion,
            reward,
        })
    }

    pub fn stats(&self, offer_id: OfferId) -> OfferStatsView {
        self.store.stats(offer_id)
    }

    pub fn assignment(&self, click_id: ClickId) -> Option<OfferId> {
        self.assignments.get(&click_id).map(|entry| entry.offer_id)
    }

    pub fn assignments_len(&self) -> usize {
        self.assignments.len()
    }
}

impl Default for BanditEngine {
    fn default() -> Self {
        Self::new(Arc::new(OfferStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_scenario_select_feedback_stats() {
        let engine = BanditEngine::default();

        let selection = engine.select(1, &[10, 20, 30]).unwrap();
        assert_eq!(selection, Selection { click_id: 1, offer_id: 10 });
        assert_eq!(engine.store().len(), 3);
        assert_eq!(engine.stats(10).clicks, 1);
        assert_eq!(engine.stats(20).clicks, 0);
        assert_eq!(engine.stats(30).clicks, 0);

        let outcome = engine.feedback(1, 5.0).unwrap();
        assert_eq!(
            outcome,
            FeedbackOutcome {
                click_id: 1,
                offer_id: 10,
                is_conversion: true,
                reward: 5.0,
            }
        );

        let stats = engine.stats(10);
        assert_eq!(stats.offer_id, 10);
        assert_eq!(stats.clicks, 1);
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.reward, 5.0);
        assert_eq!(stats.cr, 1.0);
        assert_eq!(stats.rpc, 5.0);
    }

    #[test]
    fn test_fresh_candidates_pick_first() {
        let engine = BanditEngine::default();
        assert_eq!(engine.select(1, &[7, 3, 9]).unwrap().offer_id, 7);
        // Still all zero: no conversions yet.
        assert_eq!(engine.select(2, &[3, 7, 9]).unwrap().offer_id, 3);
    }

    #[test]
    fn test_zero_conversion_offers_score_zero() {
        let engine = BanditEngine::default();
        for click_id in 0..10 {
            engine.select(click_id, &[1]).unwrap();
        }
        assert_eq!(engine.scores(&[1]), vec![0.0]);
    }

    #[test]
    fn test_converted_offer_wins_over_fresh() {
        let engine = BanditEngine::default();
        // Offer 2 gets two clicks and one conversion -> sqrt(ln 2) > 0.
        engine.select(1, &[2]).unwrap();
        engine.select(2, &[2]).unwrap();
        engine.feedback(1, 1.0).unwrap();

        let scores = engine.scores(&[1, 2]);
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
        assert_eq!(engine.select(3, &[1, 2]).unwrap().offer_id, 2);
    }

    #[test]
    fn test_duplicate_candidates_are_independent_positions() {
        let engine = BanditEngine::default();
        assert_eq!(engine.select(1, &[4, 4, 5]).unwrap().offer_id, 4);
        assert_eq!(engine.stats(4).clicks, 1);
    }

    #[test]
    fn test_empty_candidates_rejected() {
        let engine = BanditEngine::default();
        let err = engine.select(1, &[]).unwrap_err();
        assert!(matches!(err, BanditError::InvalidArgument(_)));
        assert_eq!(engine.assignments_len(), 0);
    }

    #[test]
    fn test_candidate_limit() {
        let engine = BanditEngine::default().with_max_candidates(2);
        assert!(engine.select(1, &[1, 2]).is_ok());
        assert!(matches!(
            engine.select(2, &[1, 2, 3]),
            Err(BanditError::InvalidArgument(_))
        ));
        assert_eq!(engine.assignment(2), None);
    }

    #[test]
    fn test_feedback_attribution_leaves_others_unchanged() {
        let engine = BanditEngine::default();
        let chosen = engine.select(5, &[10, 20]).unwrap().offer_id;
        let other = if chosen == 10 { 20 } else { 10 };
        let before_other = engine.stats(other);

        engine.feedback(5, 3.0).unwrap();

        let after = engine.stats(chosen);
        assert_eq!(after.conversions, 1);
        assert_eq!(after.reward, 3.0);
        assert_eq!(engine.stats(other), before_other);
    }

    #[test]
    fn test_non_positive_feedback_is_not_a_conversion() {
        let engine = BanditEngine::default();
        engine.select(1, &[10]).unwrap();
        engine.select(2, &[10]).unwrap();
        let before = engine.stats(10);

        let zero = engine.feedback(1, 0.0).unwrap();
        let negative = engine.feedback(2, -1.0).unwrap();
        assert!(!zero.is_conversion);
        assert!(!negative.is_conversion);
        assert_eq!(negative.reward, -1.0);
        assert_eq!(engine.stats(10), before);
    }

    #[test]
    fn test_unknown_click() {
        let engine = BanditEngine::default();
        let err = engine.feedback(999, 1.0).unwrap_err();
        assert!(matches!(err, BanditError::UnknownClick(999)));
    }

    #[test]
    fn test_second_feedback_on_click_is_rejected() {
        let engine = BanditEngine::default();
        engine.select(1, &[10]).unwrap();

        assert!(engine.feedback(1, 1.0).unwrap().is_conversion);
        let err = engine.feedback(1, 1.0).unwrap_err();
        assert!(matches!(err, BanditError::UnknownClick(1)));

        let stats = engine.stats(10);
        assert_eq!(stats.clicks, 1);
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.reward, 1.0);
        assert!(stats.conversions <= stats.clicks);
    }

    #[test]
    fn test_non_positive_feedback_consumes_click() {
        let engine = BanditEngine::default();
        engine.select(1, &[10]).unwrap();
        engine.feedback(1, 0.0).unwrap();
        assert!(engine.feedback(1, 4.0).is_err());
        assert_eq!(engine.stats(10).conversions, 0);
    }

    #[test]
    fn test_reselected_click_accepts_feedback_again() {
        let engine = BanditEngine::default();
        engine.select(1, &[10]).unwrap();
        engine.feedback(1, 1.0).unwrap();
        engine.select(1, &[10]).unwrap();
        engine.feedback(1, 1.0).unwrap();

        let stats = engine.stats(10);
        assert_eq!(stats.clicks, 2);
        assert_eq!(stats.conversions, 2);
    }

    #[test]
    fn test_non_finite_reward_rejected() {
        let engine = BanditEngine::default();
        engine.select(1, &[10]).unwrap();
        assert!(engine.feedback(1, f64::NAN).is_err());
        assert!(engine.feedback(1, f64::INFINITY).is_err());
        assert_eq!(engine.stats(10).conversions, 0);
        // A rejected reward leaves the click open for real feedback.
        assert!(engine.feedback(1, 2.0).unwrap().is_conversion);
    }

    #[test]
    fn test_overflowing_score_does_not_shift_selection() {
        let engine = BanditEngine::default();
        engine.select(1, &[20]).unwrap();
        engine.feedback(1, 1e200).unwrap();

        assert_eq!(engine.select(2, &[10, 20, 30]).unwrap().offer_id, 10);
        assert_eq!(engine.select(3, &[20, 30]).unwrap().offer_id, 30);
    }

    #[test]
    fn test_click_id_reuse_overwrites_assignment() {
        let engine = BanditEngine::default();
        engine.select(1, &[10]).unwrap();
        engine.select(1, &[20]).unwrap();
        assert_eq!(engine.assignment(1), Some(20));

        engine.feedback(1, 2.0).unwrap();
        assert_eq!(engine.stats(20).conversions, 1);
        assert_eq!(engine.stats(10).conversions, 0);
    }

    #[test]
    fn test_injected_store_is_shared() {
        let store = Arc::new(OfferStore::new());
        let engine = BanditEngine::new(store.clone());
        engine.select(1, &[8]).unwrap();
        assert_eq!(store.stats(8).clicks, 1);
    }

    #[test]
    fn test_concurrent_selection_and_feedback() {
        let engine = BanditEngine::default();
        let threads = 8;
        let per_thread = 500;

        thread::scope(|s| {
            for t in 0..threads {
                let engine = &engine;
                s.spawn(move || {
                    for i in 0..per_thread {
                        let click_id = (t * per_thread + i) as ClickId;
                        engine.select(click_id, &[1, 2, 3]).unwrap();
                        engine.feedback(click_id, 1.0).unwrap();
                    }
                });
            }
        });

        let total = (threads * per_thread) as u64;
        let stats: Vec<_> = [1, 2, 3].iter().map(|&id| engine.stats(id)).collect();
        assert_eq!(stats.iter().map(|s| s.clicks).sum::<u64>(), total);
        assert_eq!(stats.iter().map(|s| s.conversions).sum::<u64>(), total);
        for stat in &stats {
            assert!(stat.conversions <= stat.clicks);
        }
        assert_eq!(engine.assignments_len(), total as usize);
    }

    #[test]
    fn test_counters_are_monotonic() {
        let engine = BanditEngine::default();
        let mut last_clicks = 0;
        let mut last_conversions = 0;
        for click_id in 0..20 {
            engine.select(click_id, &[1]).unwrap();
            engine.feedback(click_id, if click_id % 2 == 0 { 1.0 } else { 0.0 }).unwrap();
            let stats = engine.stats(1);
            assert!(stats.clicks >= last_clicks);
            assert!(stats.conversions >= last_conversions);
            assert!(stats.conversions <= stats.clicks);
            last_clicks = stats.clicks;
            last_conversions = stats.conversions;
        }
    }
}
