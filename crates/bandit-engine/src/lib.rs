//! Offer bandit engine — per-offer statistics store, UCB scoring, and
//! click-to-offer attribution for delayed reward feedback.

pub mod bandits;
pub mod candidates;
pub mod scoring;
pub mod store;

pub use bandits::BanditEngine;
pub use candidates::parse_offer_ids;
pub use store::OfferStore;
