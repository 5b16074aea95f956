use super::*;
use crate::annotations::{AnnotationRecord, AnnotationSet, RecordId};
use crate::thesaurus::{Thesaurus, ThesaurusEntry, ThesaurusGroup};

fn thesaurus() -> Thesaurus {
    let groups = vec![
        ThesaurusGroup {
            id: "G1".to_string(),
            name: "Rhythm disorders".to_string(),
        },
        ThesaurusGroup {
            id: "G2".to_string(),
            name: "Conduction".to_string(),
        },
        ThesaurusGroup {
            id: "G3".to_string(),
            name: "Hypertrophy".to_string(),
        },
    ];
    let entry = |code: &str, groups: &[&str]| ThesaurusEntry {
        code: code.to_string(),
        label: format!("Statement {code}"),
        groups: groups.iter().map(|group| group.to_string()).collect(),
    };
    let entries = vec![
        entry("A", &[]),
        entry("B", &[]),
        entry("C", &[]),
        entry("D", &[]),
        entry("X", &["G1"]),
        entry("Y", &["G1"]),
        entry("P", &["G2"]),
        entry("Q", &["G3"]),
    ];
    Thesaurus::new("ECG", None, groups, entries).expect("thesaurus should build")
}

fn codes(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn record(id: &str, statements: &[&str]) -> AnnotationRecord {
    AnnotationRecord::new(RecordId::new("db", id), codes(statements))
}

fn assert_ratio(actual: f64, expected: f64) {
    assert_eq!(display_ratio(actual), expected, "unrounded value {actual}");
}

#[test]
fn scenario_partial_overlap_without_groups() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");

    let partition = match_statements(&codes(&["A", "B", "C"]), &codes(&["A", "B", "D"]), &index);
    let metrics = score(&partition, None);

    assert_eq!((metrics.tp, metrics.fp, metrics.fn_), (2, 1, 1));
    assert_ratio(metrics.precision, 0.67);
    assert_ratio(metrics.recall, 0.67);
    assert_ratio(metrics.fscore, 0.67);
}

#[test]
fn scenario_group_members_match_each_other() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");

    let metrics = score(&match_statements(&codes(&["X"]), &codes(&["Y"]), &index), None);

    assert_eq!((metrics.tp, metrics.fp, metrics.fn_), (1, 0, 0));
    assert_ratio(metrics.precision, 1.0);
    assert_ratio(metrics.recall, 1.0);
    assert_ratio(metrics.fscore, 1.0);
}

#[test]
fn scenario_empty_sets_score_perfectly() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");

    let metrics = score(&match_statements(&[], &[], &index), None);

    assert_eq!((metrics.tp, metrics.fp, metrics.fn_), (0, 0, 0));
    assert_ratio(metrics.precision, 1.0);
    assert_ratio(metrics.recall, 1.0);
    assert_ratio(metrics.fscore, 1.0);
}

#[test]
fn scenario_normalized_fscore_for_knorm_two() {
    let knorm = Knorm::new(2.0).expect("valid knorm");
    assert_eq!(knorm.normalize(0.80), 2);

    let metrics = score_counts(
        MatchCounts {
            tp: 4,
            fp: 1,
            fn_: 1,
        },
        Some(knorm),
    );
    assert_ratio(metrics.fscore, 0.8);
    assert_eq!(metrics.normalized_fscore, Some(2));
}

#[test]
fn disjoint_sets_have_no_true_positives() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");

    let partition = match_statements(&codes(&["A", "X"]), &codes(&["B", "P"]), &index);
    assert_eq!(partition.counts().tp, 0);
}

#[test]
fn identical_sets_are_fully_matched() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
    let statements = codes(&["A", "X", "P", "D"]);

    let metrics = score(&match_statements(&statements, &statements, &index), None);
    assert_eq!((metrics.tp, metrics.fp, metrics.fn_), (4, 0, 0));
    assert_eq!(metrics.fscore, 1.0);
}

#[test]
fn union_turns_cross_group_pair_into_match() {
    let thesaurus = thesaurus();
    let unions = [GroupUnion {
        name: "rhythm and conduction".to_string(),
        groups: codes(&["G1", "G2"]),
    }];

    let plain = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
    let merged = resolve(&thesaurus, &unions, MatchPolicy::ThesaurusGroups).expect("resolve");

    let reference = codes(&["X"]);
    let test = codes(&["P"]);
    assert_eq!(match_statements(&reference, &test, &plain).counts().tp, 0);
    assert_eq!(match_statements(&reference, &test, &merged).counts().tp, 1);
}

#[test]
fn report_scores_missing_records_as_one_sided() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
    let reference: AnnotationSet = [record("1", &["A", "B"]), record("2", &["C"])]
        .into_iter()
        .collect();
    let test: AnnotationSet = [record("1", &["A"]), record("3", &["D"])]
        .into_iter()
        .collect();
    let options = ReportOptions {
        summary: true,
        ..ReportOptions::default()
    };

    let report = build_test_set_report("alice", &reference, &test, &thesaurus, &index, &options);

    let ids: Vec<String> = report.records.iter().map(|record| record.id.to_string()).collect();
    assert_eq!(ids, vec!["db, 1", "db, 2", "db, 3"]);
    assert_eq!(report.records[1].metrics.fn_, 1);
    assert_eq!(report.records[2].metrics.fp, 1);

    let summary = report.summary.expect("summary requested");
    assert_eq!((summary.tp, summary.fp, summary.fn_), (1, 1, 2));
    assert!(report.groups.is_none());
    assert_eq!(
        report.warnings,
        vec![
            Warning::RecordMismatch {
                record: RecordId::new("db", "2"),
                missing_from: Side::Test,
            },
            Warning::RecordMismatch {
                record: RecordId::new("db", "3"),
                missing_from: Side::Reference,
            },
        ]
    );
}

#[test]
fn report_excludes_unknown_statements_with_warning() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
    let reference: AnnotationSet = [record("1", &["A", "ZZZ"])].into_iter().collect();
    let test: AnnotationSet = [record("1", &["A"])].into_iter().collect();

    let report = build_test_set_report(
        "alice",
        &reference,
        &test,
        &thesaurus,
        &index,
        &ReportOptions::default(),
    );

    assert_eq!(report.records[0].metrics.fscore, 1.0);
    assert_eq!(
        report.warnings,
        vec![Warning::UnknownStatement {
            record: RecordId::new("db", "1"),
            code: "ZZZ".to_string(),
            side: Side::Reference,
        }]
    );
}

#[test]
fn report_flags_missing_required_group() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
    let reference: AnnotationSet = [
        record("1", &["X"]).with_required_groups(codes(&["G1"])),
        record("2", &["X"]).with_required_groups(codes(&["G1"])),
        record("3", &["A"]).with_required_groups(codes(&["nope"])),
    ]
    .into_iter()
    .collect();
    let test: AnnotationSet = [record("1", &["Y"]), record("2", &["P"]), record("3", &["A"])]
        .into_iter()
        .collect();

    let report = build_test_set_report(
        "alice",
        &reference,
        &test,
        &thesaurus,
        &index,
        &ReportOptions::default(),
    );

    let flags: Vec<bool> = report
        .records
        .iter()
        .map(|record| record.required_group_missing)
        .collect();
    assert_eq!(flags, vec![false, true, false]);
    assert!(matches!(
        report.warnings.as_slice(),
        [Warning::UnknownRequiredGroup { .. }]
    ));
}

#[test]
fn report_options_do_not_change_record_scores() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::ThesaurusGroups).expect("resolve");
    let reference: AnnotationSet = [record("1", &["A", "X"]), record("2", &["P"])]
        .into_iter()
        .collect();
    let test: AnnotationSet = [record("1", &["Y"]), record("2", &["B"])]
        .into_iter()
        .collect();

    let bare = build_test_set_report(
        "alice",
        &reference,
        &test,
        &thesaurus,
        &index,
        &ReportOptions::default(),
    );
    let full = build_test_set_report(
        "alice",
        &reference,
        &test,
        &thesaurus,
        &index,
        &ReportOptions {
            knorm: None,
            summary: true,
            groups: true,
            statements: true,
        },
    );

    assert_eq!(bare.records, full.records);
    let summary = full.summary.expect("summary requested");
    let record_totals = full
        .records
        .iter()
        .fold(MatchCounts::default(), |mut totals, record| {
            totals += record.metrics.counts();
            totals
        });
    assert_eq!(summary.counts(), record_totals);
    assert!(full.groups.is_some_and(|groups| !groups.is_empty()));
    assert!(full.statements.is_some_and(|statements| !statements.is_empty()));
}

#[test]
fn required_group_follows_chained_unions() {
    let thesaurus = thesaurus();
    let unions = [
        GroupUnion {
            name: "rhythm and conduction".to_string(),
            groups: codes(&["G1", "G2"]),
        },
        GroupUnion {
            name: "conduction and hypertrophy".to_string(),
            groups: codes(&["G2", "G3"]),
        },
    ];
    let index = resolve(&thesaurus, &unions, MatchPolicy::ThesaurusGroups).expect("resolve");
    let reference: AnnotationSet = [
        record("1", &["Q"]).with_required_groups(codes(&["G3"])),
        record("2", &["Q"]).with_required_groups(codes(&["G3"])),
        record("3", &["Q"]).with_required_groups(codes(&["G3"])),
    ]
    .into_iter()
    .collect();
    let test: AnnotationSet = [record("1", &["P"]), record("2", &["X"]), record("3", &["A"])]
        .into_iter()
        .collect();

    let report = build_test_set_report(
        "alice",
        &reference,
        &test,
        &thesaurus,
        &index,
        &ReportOptions::default(),
    );

    let flags: Vec<bool> = report
        .records
        .iter()
        .map(|record| record.required_group_missing)
        .collect();
    assert_eq!(flags, vec![false, false, true]);
    assert!(report.warnings.is_empty());
}

#[test]
fn required_group_outside_unions_is_checked_by_membership() {
    let thesaurus = thesaurus();
    let index = resolve(&thesaurus, &[], MatchPolicy::UnionsOnly).expect("resolve");
    let reference: AnnotationSet = [
        record("1", &["X"]).with_required_groups(codes(&["G1"])),
        record("2", &["X"]).with_required_groups(codes(&["G1"])),
    ]
    .into_iter()
    .collect();
    let test: AnnotationSet = [record("1", &["Y"]), record("2", &["P"])]
        .into_iter()
        .collect();

    let report = build_test_set_report(
        "alice",
        &reference,
        &test,
        &thesaurus,
        &index,
        &ReportOptions::default(),
    );

    assert!(!report.records[0].required_group_missing);
    assert!(report.records[1].required_group_missing);
}
