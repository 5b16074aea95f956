use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::util::read_json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThesaurusGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThesaurusEntry {
    pub code: String,
    pub label: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Thesaurus {
    label: String,
    language: Option<String>,
    groups: Vec<ThesaurusGroup>,
    entries: Vec<ThesaurusEntry>,
    group_index: HashMap<String, usize>,
    entry_index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct ThesaurusFile {
    #[serde(default)]
    thesaurus: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    groups: Vec<ThesaurusFileGroup>,
}

#[derive(Debug, Deserialize)]
struct ThesaurusFileGroup {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    reports: Vec<ThesaurusFileReport>,
}

#[derive(Debug, Deserialize)]
struct ThesaurusFileReport {
    id: String,
    #[serde(default)]
    name: String,
}

impl Thesaurus {
    // A repeated entry keeps its first label and accumulates groups.
    pub fn new(
        label: impl Into<String>,
        language: Option<String>,
        groups: Vec<ThesaurusGroup>,
        entries: Vec<ThesaurusEntry>,
    ) -> Result<Self, ConfigError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ConfigError::InvalidThesaurus(
                "missing thesaurus label".to_string(),
            ));
        }

        let mut group_index = HashMap::with_capacity(groups.len());
        for (position, group) in groups.iter().enumerate() {
            if group_index.insert(group.id.clone(), position).is_some() {
                return Err(ConfigError::InvalidThesaurus(format!(
                    "duplicate group id '{}'",
                    group.id
                )));
            }
        }

        let mut merged: Vec<ThesaurusEntry> = Vec::with_capacity(entries.len());
        let mut entry_index = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Some(unknown) = entry
                .groups
                .iter()
                .find(|group| !group_index.contains_key(*group))
            {
                return Err(ConfigError::InvalidThesaurus(format!(
                    "code '{}' references undeclared group '{}'",
                    entry.code, unknown
                )));
            }

            match entry_index.get(&entry.code).copied() {
                Some(position) => {
                    let existing: &mut ThesaurusEntry = &mut merged[position];
                    for group in entry.groups {
                        if !existing.groups.contains(&group) {
                            existing.groups.push(group);
                        }
                    }
                }
                None => {
                    entry_index.insert(entry.code.clone(), merged.len());
                    let mut groups = Vec::with_capacity(entry.groups.len());
                    for group in entry.groups {
                        if !groups.contains(&group) {
                            groups.push(group);
                        }
                    }
                    merged.push(ThesaurusEntry { groups, ..entry });
                }
            }
        }

        Ok(Self {
            label,
            language,
            groups,
            entries: merged,
            group_index,
            entry_index,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw: ThesaurusFile = read_json(path)?;

        let mut groups = Vec::with_capacity(raw.groups.len());
        let mut entries = Vec::new();
        for group in raw.groups {
            for report in group.reports {
                entries.push(ThesaurusEntry {
                    code: report.id,
                    label: report.name,
                    groups: vec![group.id.clone()],
                });
            }
            groups.push(ThesaurusGroup {
                id: group.id,
                name: group.name,
            });
        }

        Self::new(raw.thesaurus, raw.language, groups, entries)
            .with_context(|| format!("failed to load thesaurus {}", path.display()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn groups(&self) -> &[ThesaurusGroup] {
        &self.groups
    }

    pub fn entries(&self) -> &[ThesaurusEntry] {
        &self.entries
    }

    pub fn entry(&self, code: &str) -> Option<&ThesaurusEntry> {
        self.entry_index.get(code).map(|&position| &self.entries[position])
    }

    pub fn group_position(&self, id: &str) -> Option<usize> {
        self.group_index.get(id).copied()
    }

    pub fn display_label<'a>(&'a self, code: &'a str) -> &'a str {
        match self.entry(code) {
            Some(entry) if !entry.label.is_empty() => &entry.label,
            _ => code,
        }
    }
}
