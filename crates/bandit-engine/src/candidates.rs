//! Parsing of comma-separated candidate offer lists.

use offer_core::error::{BanditError, BanditResult};
use offer_core::types::OfferId;

/// Parse `"10,20,30"` into offer identifiers, preserving order and duplicates.
pub fn parse_offer_ids(raw: &str) -> BanditResult<Vec<OfferId>> {
    if raw.trim().is_empty() {
        return Err(BanditError::InvalidArgument(
            "offer_ids must contain at least one offer".to_string(),
        ));
    }

    raw.split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<OfferId>().map_err(|_| {
                BanditError::InvalidArgument(format!("offer id '{item}' is not an integer"))
            })
        })
        .collect()
}
