use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::aggregate::{
    GroupMetrics, StatementMetrics, aggregate, aggregate_by_group, aggregate_by_statement,
};
use super::matcher::{MatchPartition, Side, match_statements};
use super::resolver::{EquivalenceIndex, MatchPolicy};
use super::score::{Knorm, MetricSet, score};
use crate::annotations::{AnnotationRecord, AnnotationSet, RecordId};
use crate::thesaurus::Thesaurus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnknownStatement {
        record: RecordId,
        code: String,
        side: Side,
    },
    RecordMismatch { record: RecordId, missing_from: Side },
    UnknownRequiredGroup { record: RecordId, group: String },
    PathNotFound { path: String },
    UnreadableFile { path: String, reason: String },
    ThesaurusMismatch {
        path: String,
        expected: String,
        found: Option<String>,
    },
    MissingConclusions { path: String },
    DuplicateRecord { record: RecordId, path: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStatement { record, code, side } => write!(
                f,
                "{record}: {} statement '{code}' is not in the thesaurus",
                side_name(*side)
            ),
            Self::RecordMismatch {
                record,
                missing_from,
            } => write!(
                f,
                "{record}: record missing from {} annotations",
                side_name(*missing_from)
            ),
            Self::UnknownRequiredGroup { record, group } => {
                write!(f, "{record}: required group '{group}' is not in the thesaurus")
            }
            Self::PathNotFound { path } => write!(f, "path {path} not found"),
            Self::UnreadableFile { path, reason } => {
                write!(f, "cannot read file {path}: {reason}")
            }
            Self::ThesaurusMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "{path}: annotated with thesaurus '{}', expected '{expected}'",
                found.as_deref().unwrap_or("")
            ),
            Self::MissingConclusions { path } => write!(f, "{path}: no conclusions"),
            Self::DuplicateRecord { record, path } => {
                write!(f, "{record}: duplicate record, keeping {path}")
            }
        }
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::Reference => "reference",
        Side::Test => "test",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub knorm: Option<Knorm>,
    pub summary: bool,
    pub groups: bool,
    pub statements: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub id: RecordId,
    pub partition: MatchPartition,
    pub metrics: MetricSet,
    pub required_group_missing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSetReport {
    pub annotator: String,
    pub records: Vec<RecordReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<MetricSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupMetrics>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<StatementMetrics>>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub generated_at: String,
    pub thesaurus_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thesaurus_language: Option<String>,
    pub thesaurus: SourceFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_unions: Option<SourceFile>,
    pub match_policy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knorm: Option<Knorm>,
    pub test_sets: Vec<TestSetReport>,
    pub warnings: Vec<Warning>,
}

pub fn match_policy_name(policy: MatchPolicy) -> &'static str {
    match policy {
        MatchPolicy::ThesaurusGroups => "thesaurus_groups",
        MatchPolicy::UnionsOnly => "unions_only",
    }
}

fn push_warning(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!(%warning, "comparison warning");
    warnings.push(warning);
}

// Reference records come first, then records only the test set has.
pub fn build_test_set_report(
    annotator: &str,
    reference: &AnnotationSet,
    test: &AnnotationSet,
    thesaurus: &Thesaurus,
    index: &EquivalenceIndex,
    options: &ReportOptions,
) -> TestSetReport {
    let mut warnings = Vec::new();
    let mut records = Vec::with_capacity(reference.len());

    for reference_record in reference.records() {
        let test_statements: &[String] = match test.get(&reference_record.id) {
            Some(test_record) => test_record.statements.as_slice(),
            None => {
                push_warning(
                    &mut warnings,
                    Warning::RecordMismatch {
                        record: reference_record.id.clone(),
                        missing_from: Side::Test,
                    },
                );
                &[]
            }
        };
        records.push(build_record_report(
            reference_record,
            test_statements,
            thesaurus,
            index,
            options.knorm,
            &mut warnings,
        ));
    }

    for test_record in test.records() {
        if reference.get(&test_record.id).is_some() {
            continue;
        }
        push_warning(
            &mut warnings,
            Warning::RecordMismatch {
                record: test_record.id.clone(),
                missing_from: Side::Reference,
            },
        );
        let empty = AnnotationRecord::new(test_record.id.clone(), Vec::new());
        records.push(build_record_report(
            &empty,
            &test_record.statements,
            thesaurus,
            index,
            options.knorm,
            &mut warnings,
        ));
    }

    let partitions = || records.iter().map(|record| &record.partition);
    let summary = options
        .summary
        .then(|| aggregate(partitions(), options.knorm));
    let groups = options
        .groups
        .then(|| aggregate_by_group(partitions(), index, options.knorm));
    let statements = options
        .statements
        .then(|| aggregate_by_statement(partitions(), thesaurus, options.knorm));

    TestSetReport {
        annotator: annotator.to_string(),
        records,
        summary,
        groups,
        statements,
        warnings,
    }
}

fn build_record_report(
    reference: &AnnotationRecord,
    test_statements: &[String],
    thesaurus: &Thesaurus,
    index: &EquivalenceIndex,
    knorm: Option<Knorm>,
    warnings: &mut Vec<Warning>,
) -> RecordReport {
    let partition = match_statements(&reference.statements, test_statements, index);
    for excluded in &partition.excluded {
        push_warning(
            warnings,
            Warning::UnknownStatement {
                record: reference.id.clone(),
                code: excluded.code.clone(),
                side: excluded.side,
            },
        );
    }

    let metrics = score(&partition, knorm);
    let required_group_missing =
        required_group_missing(reference, test_statements, thesaurus, index, warnings);

    RecordReport {
        id: reference.id.clone(),
        partition,
        metrics,
        required_group_missing,
    }
}

// A test code satisfies a required group when it is listed under it or
// shares the group's equivalence class.
fn required_group_missing(
    reference: &AnnotationRecord,
    test_statements: &[String],
    thesaurus: &Thesaurus,
    index: &EquivalenceIndex,
    warnings: &mut Vec<Warning>,
) -> bool {
    let mut required = Vec::with_capacity(reference.required_groups.len());
    for group in &reference.required_groups {
        if thesaurus.group_position(group).is_some() {
            required.push((group.as_str(), index.class_of_group(group)));
        } else {
            push_warning(
                warnings,
                Warning::UnknownRequiredGroup {
                    record: reference.id.clone(),
                    group: group.clone(),
                },
            );
        }
    }

    if required.is_empty() {
        return false;
    }

    !test_statements.iter().any(|code| {
        let listed = thesaurus
            .entry(code)
            .map(|entry| entry.groups.as_slice())
            .unwrap_or(&[]);
        let class = index.class_of(code);
        required.iter().any(|&(group, group_class)| {
            listed.iter().any(|listed_group| listed_group == group)
                || (group_class.is_some() && group_class == class)
        })
    })
}
