use std::io::Write;

use anyhow::Result;

use ecganncmp::engine::{
    ComparisonReport, GroupMetrics, MetricSet, RecordReport, StatementMetrics, TestSetReport,
    Warning, display_ratio,
};
use ecganncmp::thesaurus::Thesaurus;

use super::CompareOptions;
use crate::cli::Language;

struct Labels {
    annotator: &'static str,
    precision: &'static str,
    recall: &'static str,
    fscore: &'static str,
    normalized_fscore: &'static str,
    matched: &'static str,
    false_positives: &'static str,
    false_negatives: &'static str,
    required_group_missing: &'static str,
    summary: &'static str,
    groups: &'static str,
    group: &'static str,
    statements: &'static str,
    statement: &'static str,
    warnings: &'static str,
}

const EN: Labels = Labels {
    annotator: "Annotator",
    precision: "Precision",
    recall: "Recall",
    fscore: "F-Score",
    normalized_fscore: "Normalized F-score",
    matched: "Matched",
    false_positives: "False positives",
    false_negatives: "False negatives",
    required_group_missing: "REQUIRED GROUP MISSING",
    summary: "Summary",
    groups: "Groups",
    group: "Group",
    statements: "Statements",
    statement: "Statement",
    warnings: "Warnings",
};

const RU: Labels = Labels {
    annotator: "Аннотатор",
    precision: "Точность",
    recall: "Полнота",
    fscore: "F-мера",
    normalized_fscore: "Нормированная F-мера",
    matched: "Совпавшие",
    false_positives: "Ложноположительные",
    false_negatives: "Ложноотрицательные",
    required_group_missing: "НЕТ ЗАКЛЮЧЕНИЯ ИЗ ОБЯЗАТЕЛЬНОЙ ГРУППЫ",
    summary: "Итого",
    groups: "Группы",
    group: "Группа",
    statements: "Заключения",
    statement: "Заключение",
    warnings: "Предупреждения",
};

fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Ru => &RU,
    }
}

pub fn write_text_report<W: Write>(
    out: &mut W,
    report: &ComparisonReport,
    thesaurus: &Thesaurus,
    options: &CompareOptions,
) -> Result<()> {
    let labels = labels(options.language);

    for test_set in &report.test_sets {
        write_test_set(out, test_set, thesaurus, options, labels)?;
    }

    if !report.warnings.is_empty() {
        write_warnings(out, &report.warnings, labels)?;
    }

    Ok(())
}

fn write_test_set<W: Write>(
    out: &mut W,
    test_set: &TestSetReport,
    thesaurus: &Thesaurus,
    options: &CompareOptions,
    labels: &Labels,
) -> Result<()> {
    writeln!(out, "{}: {}", labels.annotator, test_set.annotator)?;
    writeln!(out)?;

    for record in &test_set.records {
        write_record(out, record, thesaurus, options.full, labels)?;
    }

    if let Some(summary) = &test_set.summary {
        writeln!(out, "{}", labels.summary)?;
        write_metrics(out, summary, labels)?;
        writeln!(out)?;
    }

    if let Some(groups) = &test_set.groups {
        write_group_table(out, groups, labels)?;
    }

    if let Some(statements) = &test_set.statements {
        write_statement_table(out, statements, labels)?;
    }

    if !test_set.warnings.is_empty() {
        write_warnings(out, &test_set.warnings, labels)?;
    }

    Ok(())
}

fn write_record<W: Write>(
    out: &mut W,
    record: &RecordReport,
    thesaurus: &Thesaurus,
    full: bool,
    labels: &Labels,
) -> Result<()> {
    writeln!(out, "{}", record.id)?;
    write_metrics(out, &record.metrics, labels)?;
    if record.required_group_missing {
        writeln!(out, "{}", labels.required_group_missing)?;
    }

    if full {
        let partition = &record.partition;
        if !partition.true_positives.is_empty() {
            writeln!(out, "  {}:", labels.matched)?;
            for pair in &partition.true_positives {
                if pair.reference == pair.test {
                    writeln!(out, "    {}", thesaurus.display_label(&pair.test))?;
                } else {
                    writeln!(
                        out,
                        "    {} ~ {}",
                        thesaurus.display_label(&pair.test),
                        thesaurus.display_label(&pair.reference)
                    )?;
                }
            }
        }
        write_statement_list(out, labels.false_positives, &partition.false_positives, thesaurus)?;
        write_statement_list(out, labels.false_negatives, &partition.false_negatives, thesaurus)?;
    }

    writeln!(out)?;
    Ok(())
}

fn write_statement_list<W: Write>(
    out: &mut W,
    title: &str,
    codes: &[String],
    thesaurus: &Thesaurus,
) -> Result<()> {
    if codes.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {title}:")?;
    for code in codes {
        writeln!(out, "    {}", thesaurus.display_label(code))?;
    }
    Ok(())
}

fn write_metrics<W: Write>(out: &mut W, metrics: &MetricSet, labels: &Labels) -> Result<()> {
    writeln!(out, "TP: {}", metrics.tp)?;
    writeln!(out, "FP: {}", metrics.fp)?;
    writeln!(out, "FN: {}", metrics.fn_)?;
    writeln!(out, "{}: {:.2}", labels.precision, display_ratio(metrics.precision))?;
    writeln!(out, "{}: {:.2}", labels.recall, display_ratio(metrics.recall))?;
    writeln!(out, "{}: {:.2}", labels.fscore, display_ratio(metrics.fscore))?;
    if let Some(normalized) = metrics.normalized_fscore {
        writeln!(out, "{}: {}", labels.normalized_fscore, normalized)?;
    }
    Ok(())
}

fn write_table_header<W: Write>(
    out: &mut W,
    first_column: &str,
    normalized: bool,
    labels: &Labels,
) -> Result<()> {
    write!(
        out,
        "{first_column}\tTP\tFP\tFN\t{}\t{}\t{}",
        labels.precision, labels.recall, labels.fscore
    )?;
    if normalized {
        write!(out, "\t{}", labels.normalized_fscore)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_table_row<W: Write>(out: &mut W, name: &str, metrics: &MetricSet) -> Result<()> {
    write!(
        out,
        "{name}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}",
        metrics.tp,
        metrics.fp,
        metrics.fn_,
        display_ratio(metrics.precision),
        display_ratio(metrics.recall),
        display_ratio(metrics.fscore)
    )?;
    if let Some(normalized) = metrics.normalized_fscore {
        write!(out, "\t{normalized}")?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_group_table<W: Write>(out: &mut W, groups: &[GroupMetrics], labels: &Labels) -> Result<()> {
    writeln!(out, "{}", labels.groups)?;
    let normalized = groups
        .iter()
        .any(|group| group.metrics.normalized_fscore.is_some());
    write_table_header(out, labels.group, normalized, labels)?;
    for group in groups {
        let name = if group.name.is_empty() {
            &group.id
        } else {
            &group.name
        };
        write_table_row(out, name, &group.metrics)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_statement_table<W: Write>(
    out: &mut W,
    statements: &[StatementMetrics],
    labels: &Labels,
) -> Result<()> {
    writeln!(out, "{}", labels.statements)?;
    let normalized = statements
        .iter()
        .any(|statement| statement.metrics.normalized_fscore.is_some());
    write_table_header(out, labels.statement, normalized, labels)?;
    for statement in statements {
        let name = if statement.label.is_empty() {
            &statement.code
        } else {
            &statement.label
        };
        write_table_row(out, name, &statement.metrics)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_warnings<W: Write>(out: &mut W, warnings: &[Warning], labels: &Labels) -> Result<()> {
    writeln!(out, "{}:", labels.warnings)?;
    for warning in warnings {
        writeln!(out, "  {warning}")?;
    }
    writeln!(out)?;
    Ok(())
}
