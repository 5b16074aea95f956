use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::engine::report::Warning;
use crate::util::read_json;

const COMPARISON_RESULT_TYPE: &str = "cmpresult";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId {
    pub database: String,
    pub record: String,
}

impl RecordId {
    pub fn new(database: impl Into<String>, record: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            record: record.into(),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.database.is_empty() {
            write!(f, "{}", self.record)
        } else {
            write!(f, "{}, {}", self.database, self.record)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub id: RecordId,
    pub statements: Vec<String>,
    pub required_groups: Vec<String>,
}

impl AnnotationRecord {
    pub fn new(id: RecordId, statements: Vec<String>) -> Self {
        let mut unique = Vec::with_capacity(statements.len());
        for statement in statements {
            if !unique.contains(&statement) {
                unique.push(statement);
            }
        }
        Self {
            id,
            statements: unique,
            required_groups: Vec::new(),
        }
    }

    pub fn with_required_groups(mut self, groups: Vec<String>) -> Self {
        self.required_groups = groups;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    records: Vec<AnnotationRecord>,
    index: HashMap<RecordId, usize>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns true when a record with the same id was replaced in place.
    pub fn insert(&mut self, record: AnnotationRecord) -> bool {
        match self.index.get(&record.id).copied() {
            Some(position) => {
                self.records[position] = record;
                true
            }
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                false
            }
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&AnnotationRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<AnnotationRecord> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = AnnotationRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

#[derive(Debug, Clone)]
pub struct TestSet {
    pub annotator: String,
    pub annotations: AnnotationSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationFile {
    #[serde(default)]
    conclusion_thesaurus: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    database: String,
    #[serde(deserialize_with = "string_or_number")]
    record: String,
    #[serde(default)]
    annotator: Option<String>,
    #[serde(default)]
    conclusions: Option<Vec<String>>,
    #[serde(default)]
    required_groups: Vec<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

#[derive(Debug)]
struct LoadedFile {
    origin: PathBuf,
    path: PathBuf,
    annotator: Option<String>,
    record: AnnotationRecord,
}

pub fn load_reference(
    paths: &[PathBuf],
    thesaurus_label: &str,
    warnings: &mut Vec<Warning>,
) -> Result<AnnotationSet> {
    let files = collect_annotations(paths, thesaurus_label, warnings)?;

    let mut set = AnnotationSet::new();
    for file in files {
        insert_record(&mut set, file, warnings);
    }

    info!(records = set.len(), "loaded reference annotations");
    Ok(set)
}

pub fn load_test_sets(
    paths: &[PathBuf],
    thesaurus_label: &str,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<TestSet>> {
    let files = collect_annotations(paths, thesaurus_label, warnings)?;

    let mut sets = Vec::<TestSet>::new();
    for file in files {
        let annotator = file
            .annotator
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| file.origin.display().to_string());
        let position = match sets.iter().position(|set| set.annotator == annotator) {
            Some(position) => position,
            None => {
                sets.push(TestSet {
                    annotator,
                    annotations: AnnotationSet::new(),
                });
                sets.len() - 1
            }
        };
        insert_record(&mut sets[position].annotations, file, warnings);
    }

    for set in &sets {
        info!(
            annotator = %set.annotator,
            records = set.annotations.len(),
            "loaded test annotations"
        );
    }
    Ok(sets)
}

fn insert_record(set: &mut AnnotationSet, file: LoadedFile, warnings: &mut Vec<Warning>) {
    let id = file.record.id.clone();
    if set.insert(file.record) {
        push_warning(
            warnings,
            Warning::DuplicateRecord {
                record: id,
                path: file.path.display().to_string(),
            },
        );
    }
}

fn push_warning(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!(%warning, "annotation input warning");
    warnings.push(warning);
}

fn collect_annotations(
    paths: &[PathBuf],
    thesaurus_label: &str,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<LoadedFile>> {
    let mut loaded = Vec::new();

    for origin in paths {
        if !origin.exists() {
            push_warning(
                warnings,
                Warning::PathNotFound {
                    path: origin.display().to_string(),
                },
            );
            continue;
        }

        if origin.is_file() {
            if let Some(file) = read_annotation_file(origin)? {
                accept_file(origin, origin, file, thesaurus_label, warnings, &mut loaded);
            }
            continue;
        }

        for path in discover_json_files(origin)? {
            match read_annotation_file(&path) {
                Ok(Some(file)) => {
                    accept_file(origin, &path, file, thesaurus_label, warnings, &mut loaded)
                }
                Ok(None) => {}
                Err(err) => push_warning(
                    warnings,
                    Warning::UnreadableFile {
                        path: path.display().to_string(),
                        reason: format!("{err:#}"),
                    },
                ),
            }
        }
    }

    Ok(loaded)
}

// Comparison results carry no record and are skipped before decoding.
fn read_annotation_file(path: &Path) -> Result<Option<AnnotationFile>> {
    let value: serde_json::Value = read_json(path)?;
    if value.get("type").and_then(serde_json::Value::as_str) == Some(COMPARISON_RESULT_TYPE) {
        debug!(path = %path.display(), "skipping comparison result file");
        return Ok(None);
    }

    let file = serde_json::from_value(value)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(file))
}

fn accept_file(
    origin: &Path,
    path: &Path,
    file: AnnotationFile,
    thesaurus_label: &str,
    warnings: &mut Vec<Warning>,
    loaded: &mut Vec<LoadedFile>,
) {
    if file.conclusion_thesaurus.as_deref() != Some(thesaurus_label) {
        push_warning(
            warnings,
            Warning::ThesaurusMismatch {
                path: path.display().to_string(),
                expected: thesaurus_label.to_string(),
                found: file.conclusion_thesaurus,
            },
        );
        return;
    }

    let Some(conclusions) = file.conclusions else {
        push_warning(
            warnings,
            Warning::MissingConclusions {
                path: path.display().to_string(),
            },
        );
        return;
    };

    let record = AnnotationRecord::new(RecordId::new(file.database, file.record), conclusions)
        .with_required_groups(file.required_groups);
    loaded.push(LoadedFile {
        origin: origin.to_path_buf(),
        path: path.to_path_buf(),
        annotator: file.annotator,
        record,
    });
}

fn discover_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn ensure_inputs_found(reference: &AnnotationSet, tests: &[TestSet]) -> Result<()> {
    if reference.is_empty() || tests.iter().all(|set| set.annotations.is_empty()) {
        bail!("input annotations not found");
    }
    Ok(())
}
