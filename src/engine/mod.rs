pub mod aggregate;
pub mod matcher;
pub mod report;
pub mod resolver;
pub mod score;
#[cfg(test)]
mod tests;

pub use self::aggregate::{
    GroupMetrics, StatementMetrics, aggregate, aggregate_by_group, aggregate_by_statement,
};
pub use self::matcher::{MatchCounts, MatchPartition, MatchedPair, Side, match_statements};
pub use self::report::{
    ComparisonReport, RecordReport, ReportOptions, TestSetReport, Warning, build_test_set_report,
};
pub use self::resolver::{
    ClassId, EquivalenceIndex, GroupUnion, MatchPolicy, ReportGroup, load_group_unions, resolve,
};
pub use self::score::{Knorm, MetricSet, display_ratio, score, score_counts};
