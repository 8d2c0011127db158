//! Two-phase name and premium reconciliation between carrier and payroll data.
//!
//! Phase 1 groups raw spreadsheet rows by employee and pairs the two sources by
//! exact, learned, and fuzzy name matching. Fuzzy pairs are reviewed by a human
//! before Phase 2 compares aggregated premiums, whose discrepancies are
//! reviewed again before the final partition is reported.

mod aggregate;
mod errors;
mod learned;
mod matcher;
mod normalize;
mod premium;
mod review;
mod similarity;
pub mod types;

pub use self::aggregate::{aggregate, normalize_product_type, parse_premium, value_text};
pub use self::errors::Error;
pub use self::learned::resolve_learned;
pub use self::matcher::{find_name_matches, match_employees};
pub use self::normalize::{name_key, normalize_name};
pub use self::premium::{apply_premium_decisions, compare_premiums, premium_difference};
pub use self::review::apply_name_decisions;
pub use self::similarity::{name_similarity, similarity};
