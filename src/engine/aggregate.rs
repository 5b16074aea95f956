use std::collections::HashMap;

use serde::Serialize;

use super::matcher::{MatchCounts, MatchPartition};
use super::resolver::EquivalenceIndex;
use super::score::{Knorm, MetricSet, score_counts};
use crate::thesaurus::Thesaurus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMetrics {
    pub id: String,
    pub name: String,
    pub metrics: MetricSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementMetrics {
    pub code: String,
    pub label: String,
    pub metrics: MetricSet,
}

pub fn total_counts<'a>(partitions: impl IntoIterator<Item = &'a MatchPartition>) -> MatchCounts {
    let mut totals = MatchCounts::default();
    for partition in partitions {
        totals += partition.counts();
    }
    totals
}

// Scores are recomputed from summed counts, never averaged.
pub fn aggregate<'a>(
    partitions: impl IntoIterator<Item = &'a MatchPartition>,
    knorm: Option<Knorm>,
) -> MetricSet {
    score_counts(total_counts(partitions), knorm)
}

// A matched pair counts once for every group either of its statements belongs to.
pub fn aggregate_by_group<'a>(
    partitions: impl IntoIterator<Item = &'a MatchPartition>,
    index: &EquivalenceIndex,
    knorm: Option<Knorm>,
) -> Vec<GroupMetrics> {
    let mut totals = vec![MatchCounts::default(); index.report_groups().len()];

    for partition in partitions {
        for pair in &partition.true_positives {
            let mut groups = index.report_groups_of(&pair.reference).to_vec();
            for &group in index.report_groups_of(&pair.test) {
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
            for group in groups {
                totals[group].tp += 1;
            }
        }
        for code in &partition.false_positives {
            for &group in index.report_groups_of(code) {
                totals[group].fp += 1;
            }
        }
        for code in &partition.false_negatives {
            for &group in index.report_groups_of(code) {
                totals[group].fn_ += 1;
            }
        }
    }

    index
        .report_groups()
        .iter()
        .zip(totals)
        .filter(|(_, counts)| *counts != MatchCounts::default())
        .map(|(group, counts)| GroupMetrics {
            id: group.id.clone(),
            name: group.name.clone(),
            metrics: score_counts(counts, knorm),
        })
        .collect()
}

pub fn aggregate_by_statement<'a>(
    partitions: impl IntoIterator<Item = &'a MatchPartition>,
    thesaurus: &Thesaurus,
    knorm: Option<Knorm>,
) -> Vec<StatementMetrics> {
    let mut totals = HashMap::<&str, MatchCounts>::new();

    for partition in partitions {
        for pair in &partition.true_positives {
            totals.entry(pair.reference.as_str()).or_default().tp += 1;
            if pair.test != pair.reference {
                totals.entry(pair.test.as_str()).or_default().tp += 1;
            }
        }
        for code in &partition.false_positives {
            totals.entry(code.as_str()).or_default().fp += 1;
        }
        for code in &partition.false_negatives {
            totals.entry(code.as_str()).or_default().fn_ += 1;
        }
    }

    thesaurus
        .entries()
        .iter()
        .filter_map(|entry| {
            totals.get(entry.code.as_str()).map(|counts| StatementMetrics {
                code: entry.code.clone(),
                label: entry.label.clone(),
                metrics: score_counts(*counts, knorm),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::matcher::match_statements;
    use crate::engine::resolver::{GroupUnion, MatchPolicy, resolve};
    use crate::thesaurus::{ThesaurusEntry, ThesaurusGroup};

    fn thesaurus() -> Thesaurus {
        let groups = vec![
            ThesaurusGroup {
                id: "rhythm".to_string(),
                name: "Rhythm".to_string(),
            },
            ThesaurusGroup {
                id: "conduction".to_string(),
                name: "Conduction".to_string(),
            },
            ThesaurusGroup {
                id: "ischemia".to_string(),
                name: "Ischemia".to_string(),
            },
        ];
        let entry = |code: &str, groups: &[&str]| ThesaurusEntry {
            code: code.to_string(),
            label: format!("{code} text"),
            groups: groups.iter().map(|group| group.to_string()).collect(),
        };
        let entries = vec![
            entry("sinus", &["rhythm"]),
            entry("afib", &["rhythm"]),
            entry("avb1", &["conduction"]),
            entry("rbbb", &["conduction", "ischemia"]),
            entry("stemi", &["ischemia"]),
        ];
        Thesaurus::new("ECG", None, groups, entries).expect("thesaurus")
    }

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn partitions(index: &EquivalenceIndex) -> Vec<MatchPartition> {
        vec![
            match_statements(&codes(&["sinus", "avb1"]), &codes(&["sinus"]), index),
            match_statements(&codes(&["stemi"]), &codes(&["afib", "stemi"]), index),
            match_statements(&codes(&[]), &codes(&[]), index),
        ]
    }

    #[test]
    fn corpus_totals_equal_sum_of_records_in_any_order() {
        let thesaurus = thesaurus();
        let index = resolve(&thesaurus, &[], MatchPolicy::UnionsOnly).expect("resolve");
        let mut partitions = partitions(&index);

        let forward = aggregate(&partitions, None);
        partitions.reverse();
        let backward = aggregate(&partitions, None);

        assert_eq!(forward, backward);
        assert_eq!(
            forward.counts(),
            MatchCounts {
                tp: 2,
                fp: 1,
                fn_: 1
            }
        );
        assert!((forward.precision - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn groups_follow_declared_order_and_skip_empty_groups() {
        let thesaurus = thesaurus();
        let index = resolve(&thesaurus, &[], MatchPolicy::UnionsOnly).expect("resolve");
        let groups = aggregate_by_group(&partitions(&index), &index, None);

        let summary: Vec<(&str, MatchCounts)> = groups
            .iter()
            .map(|group| (group.id.as_str(), group.metrics.counts()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("rhythm", MatchCounts { tp: 1, fp: 1, fn_: 0 }),
                ("conduction", MatchCounts { tp: 0, fp: 0, fn_: 1 }),
                ("ischemia", MatchCounts { tp: 1, fp: 0, fn_: 0 }),
            ]
        );
    }

    #[test]
    fn multi_group_statement_counts_in_each_group() {
        let thesaurus = thesaurus();
        let index = resolve(&thesaurus, &[], MatchPolicy::UnionsOnly).expect("resolve");
        let partition = match_statements(&codes(&[]), &codes(&["rbbb"]), &index);
        let groups = aggregate_by_group([&partition], &index, None);

        let ids: Vec<&str> = groups.iter().map(|group| group.id.as_str()).collect();
        assert_eq!(ids, vec!["conduction", "ischemia"]);
        assert!(groups.iter().all(|group| group.metrics.fp == 1));
    }

    #[test]
    fn unions_report_under_union_name() {
        let thesaurus = thesaurus();
        let unions = [GroupUnion {
            name: "rhythm+conduction".to_string(),
            groups: codes(&["rhythm", "conduction"]),
        }];
        let index = resolve(&thesaurus, &unions, MatchPolicy::ThesaurusGroups).expect("resolve");
        let partition = match_statements(&codes(&["avb1"]), &codes(&["afib"]), &index);
        let groups = aggregate_by_group([&partition], &index, None);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "rhythm+conduction");
        assert_eq!(groups[0].metrics.tp, 1);
    }

    #[test]
    fn statements_follow_thesaurus_order() {
        let thesaurus = thesaurus();
        let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
        let partition = match_statements(&codes(&["afib", "avb1"]), &codes(&["sinus"]), &index);
        let statements = aggregate_by_statement([&partition], &thesaurus, None);

        let summary: Vec<(&str, MatchCounts)> = statements
            .iter()
            .map(|statement| (statement.code.as_str(), statement.metrics.counts()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("sinus", MatchCounts { tp: 1, fp: 0, fn_: 0 }),
                ("afib", MatchCounts { tp: 1, fp: 0, fn_: 0 }),
                ("avb1", MatchCounts { tp: 0, fp: 0, fn_: 1 }),
            ]
        );
    }
}
