mod config;
pub use self::config::{
    FieldMapping, MatchOptions, RawRow, SourceRow, DEFAULT_NAME_MATCH_THRESHOLD,
};

mod employee;
pub use self::employee::{EmployeeRecord, EmployeeSet, NameKey, ProductLine};

mod matching;
pub use self::matching::{
    ComparisonRecord, DiscrepancyStatus, MatchId, MatchRecord, MatchType, ReviewedDiscrepancy,
};

mod mapping;
pub use self::mapping::{MappingCandidate, NameMapping};

mod decision;
pub use self::decision::{NameDecision, PremiumDecision};

mod results;
pub use self::results::{
    NameMatchResults, NameReviewOutcome, PremiumComparison, PremiumReviewOutcome, SourceSummary,
};
