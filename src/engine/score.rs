use serde::Serialize;

use super::matcher::{MatchCounts, MatchPartition};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Knorm(f64);

impl Knorm {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidKnorm(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn normalize(self, fscore: f64) -> i64 {
        ((self.0 + 1.0 / self.0) * fscore).round() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSet {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub precision: f64,
    pub recall: f64,
    pub fscore: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_fscore: Option<i64>,
}

impl MetricSet {
    pub fn counts(&self) -> MatchCounts {
        MatchCounts {
            tp: self.tp,
            fp: self.fp,
            fn_: self.fn_,
        }
    }
}

pub fn score(partition: &MatchPartition, knorm: Option<Knorm>) -> MetricSet {
    score_counts(partition.counts(), knorm)
}

pub fn score_counts(counts: MatchCounts, knorm: Option<Knorm>) -> MetricSet {
    let MatchCounts { tp, fp, fn_ } = counts;

    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else if fn_ == 0 {
        1.0
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        1.0
    };
    let fscore = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    MetricSet {
        tp,
        fp,
        fn_,
        precision,
        recall,
        fscore,
        normalized_fscore: knorm.map(|knorm| knorm.normalize(fscore)),
    }
}

pub fn display_ratio(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
