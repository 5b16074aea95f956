use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use ecganncmp::annotations::{ensure_inputs_found, load_reference, load_test_sets};
use ecganncmp::engine::report::{SourceFile, match_policy_name};
use ecganncmp::engine::{
    ComparisonReport, Knorm, MatchPolicy, ReportOptions, build_test_set_report,
    load_group_unions, resolve,
};
use ecganncmp::thesaurus::Thesaurus;
use ecganncmp::util::{now_utc_string, sha256_file, write_json_pretty};

use crate::cli::{Cli, Language};

mod output;


#[derive(Debug, Clone, Copy)]
pub struct CompareOptions {
    pub report: ReportOptions,
    pub policy: MatchPolicy,
    pub full: bool,
    pub language: Language,
}

impl CompareOptions {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let knorm = cli
            .knorm
            .map(Knorm::new)
            .transpose()
            .context("invalid --knorm")?;
        let policy = if cli.unions_only {
            MatchPolicy::UnionsOnly
        } else {
            MatchPolicy::ThesaurusGroups
        };

        Ok(Self {
            report: ReportOptions {
                knorm,
                summary: cli.summary,
                groups: cli.groups,
                statements: cli.statements,
            },
            policy,
            full: cli.full,
            language: cli.language,
        })
    }
}

pub fn run(args: Cli) -> Result<()> {
    let options = CompareOptions::from_cli(&args)?;
    let report = compare(&args, &options)?;

    if args.json {
        match &args.output {
            Some(path) => {
                write_json_pretty(path, &report.model)?;
                info!(path = %path.display(), "wrote comparison report");
            }
            None => {
                let mut out = io::BufWriter::new(io::stdout().lock());
                serde_json::to_writer_pretty(&mut out, &report.model)
                    .context("failed to serialize comparison report")?;
                writeln!(out)?;
                out.flush()?;
            }
        }
        return Ok(());
    }

    let mut out = io::BufWriter::new(io::stdout().lock());
    output::write_text_report(&mut out, &report.model, &report.thesaurus, &options)?;
    out.flush()?;
    Ok(())
}

pub struct CompareRun {
    pub model: ComparisonReport,
    pub thesaurus: Thesaurus,
}

pub fn compare(args: &Cli, options: &CompareOptions) -> Result<CompareRun> {
    let thesaurus = Thesaurus::from_file(&args.thesaurus)?;
    info!(
        label = %thesaurus.label(),
        groups = thesaurus.groups().len(),
        codes = thesaurus.entries().len(),
        "loaded thesaurus"
    );

    let unions = match &args.group_unions {
        Some(path) => load_group_unions(path)?,
        None => Vec::new(),
    };
    if options.policy == MatchPolicy::UnionsOnly && unions.is_empty() {
        warn!("no group unions given; only identical codes will match");
    }
    let index = resolve(&thesaurus, &unions, options.policy).context("invalid group unions")?;

    let mut warnings = Vec::new();
    let reference = load_reference(
        std::slice::from_ref(&args.ref_path),
        thesaurus.label(),
        &mut warnings,
    )?;
    let test_sets = load_test_sets(&args.test_paths, thesaurus.label(), &mut warnings)?;
    ensure_inputs_found(&reference, &test_sets)?;

    let reports = test_sets
        .iter()
        .map(|set| {
            build_test_set_report(
                &set.annotator,
                &reference,
                &set.annotations,
                &thesaurus,
                &index,
                &options.report,
            )
        })
        .collect::<Vec<_>>();

    for report in &reports {
        info!(
            annotator = %report.annotator,
            records = report.records.len(),
            warnings = report.warnings.len(),
            "compared test annotations"
        );
    }

    let model = ComparisonReport {
        generated_at: now_utc_string(),
        thesaurus_label: thesaurus.label().to_string(),
        thesaurus_language: thesaurus.language().map(str::to_string),
        thesaurus: source_file(&args.thesaurus)?,
        group_unions: args.group_unions.as_deref().map(source_file).transpose()?,
        match_policy: match_policy_name(options.policy),
        knorm: options.report.knorm,
        test_sets: reports,
        warnings,
    };

    Ok(CompareRun { model, thesaurus })
}

fn source_file(path: &Path) -> Result<SourceFile> {
    Ok(SourceFile {
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
    })
}
