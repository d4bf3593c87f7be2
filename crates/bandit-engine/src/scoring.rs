//! UCB scoring over offer snapshots.
//!
//! The score of an offer with cumulative reward `R`, `c` conversions and
//! `n` clicks is
//!
//! ```text
//! R^2 / c - (R / c)^2 + sqrt(ln(n) / c)
//! ```
//!
//! Every division by `c` goes through [`safe_div`], so an offer that has never
//! converted scores exactly 0 no matter how many clicks or how much reward it
//! carries.

use offer_core::types::OfferSnapshot;

/// `numerator / denominator`, or 0 when the denominator is zero.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn ucb_score(snapshot: &OfferSnapshot) -> f64 {
    let conversions = snapshot.conversions as f64;
    let reward = snapshot.cumulative_reward;
    // ln(0) is -inf; an offer that was never clicked contributes 0.
    let log_clicks = if snapshot.clicks == 0 {
        0.0
    } else {
        (snapshot.clicks as f64).ln()
    };

    let payoff = safe_div(reward * reward, conversions) - safe_div(reward, conversions).powi(2);
    let exploration = safe_div(log_clicks, conversions).sqrt();
    payoff + exploration
}

/// Index of the first maximum. Returns `None` for an empty slice.
/// NaN ranks below every other score.
pub fn first_argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        let score = if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        };
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}
