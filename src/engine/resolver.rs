use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::thesaurus::Thesaurus;
use crate::util::read_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(usize);

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MatchPolicy {
    #[default]
    ThesaurusGroups,
    UnionsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUnion {
    pub name: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GroupUnionsFile {
    groups: serde_json::Map<String, serde_json::Value>,
}

pub fn load_group_unions(path: &Path) -> Result<Vec<GroupUnion>> {
    let raw: GroupUnionsFile = read_json(path)?;

    let mut unions = Vec::with_capacity(raw.groups.len());
    for (name, members) in raw.groups {
        let groups: Vec<String> = serde_json::from_value(members).map_err(|err| {
            anyhow::anyhow!(
                "group union '{name}' in {} must be a list of group ids: {err}",
                path.display()
            )
        })?;
        unions.push(GroupUnion { name, groups });
    }

    Ok(unions)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceIndex {
    classes: HashMap<String, ClassId>,
    group_classes: HashMap<String, ClassId>,
    code_report_groups: HashMap<String, Vec<usize>>,
    report_groups: Vec<ReportGroup>,
}

impl EquivalenceIndex {
    pub fn class_of(&self, code: &str) -> Option<ClassId> {
        self.classes.get(code).copied()
    }

    pub fn class_of_group(&self, group_id: &str) -> Option<ClassId> {
        self.group_classes.get(group_id).copied()
    }

    pub fn report_groups(&self) -> &[ReportGroup] {
        &self.report_groups
    }

    pub fn report_groups_of(&self, code: &str) -> &[usize] {
        self.code_report_groups
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            let grandparent = self.parent[self.parent[node]];
            self.parent[node] = grandparent;
            node = grandparent;
        }
        node
    }

    fn union(&mut self, left: usize, right: usize) {
        let left = self.find(left);
        let right = self.find(right);
        if left == right {
            return;
        }

        match self.rank[left].cmp(&self.rank[right]) {
            std::cmp::Ordering::Less => self.parent[left] = right,
            std::cmp::Ordering::Greater => self.parent[right] = left,
            std::cmp::Ordering::Equal => {
                self.parent[right] = left;
                self.rank[left] += 1;
            }
        }
    }
}

pub fn resolve(
    thesaurus: &Thesaurus,
    unions: &[GroupUnion],
    policy: MatchPolicy,
) -> Result<EquivalenceIndex, ConfigError> {
    let group_count = thesaurus.groups().len();

    let mut union_members = Vec::with_capacity(unions.len());
    for union in unions {
        if union.groups.is_empty() {
            return Err(ConfigError::EmptyUnion(union.name.clone()));
        }
        let members = union
            .groups
            .iter()
            .map(|group| {
                thesaurus
                    .group_position(group)
                    .ok_or_else(|| ConfigError::UnknownUnionGroup {
                        union: union.name.clone(),
                        group: group.clone(),
                    })
            })
            .collect::<Result<Vec<usize>, ConfigError>>()?;
        union_members.push(members);
    }

    let mut owning_union = vec![None::<usize>; group_count];
    for (union_position, members) in union_members.iter().enumerate() {
        for &member in members {
            if owning_union[member].is_none() {
                owning_union[member] = Some(union_position);
            }
        }
    }

    let participating: Vec<bool> = match policy {
        MatchPolicy::ThesaurusGroups => vec![true; group_count],
        MatchPolicy::UnionsOnly => owning_union.iter().map(Option::is_some).collect(),
    };

    let mut sets = DisjointSet::new(group_count);
    for members in &union_members {
        for &member in &members[1..] {
            sets.union(members[0], member);
        }
    }

    // A code listed under several groups bridges them.
    let mut entry_groups = Vec::with_capacity(thesaurus.entries().len());
    for entry in thesaurus.entries() {
        let positions: Vec<usize> = entry
            .groups
            .iter()
            .filter_map(|group| thesaurus.group_position(group))
            .collect();
        let linked: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&position| participating[position])
            .collect();
        if let Some((&first, rest)) = linked.split_first() {
            for &other in rest {
                sets.union(first, other);
            }
        }
        entry_groups.push((positions, linked));
    }

    let mut next_class = 0_usize;
    let mut root_classes = HashMap::<usize, ClassId>::new();
    let mut group_classes = HashMap::with_capacity(group_count);
    for (position, group) in thesaurus.groups().iter().enumerate() {
        if !participating[position] {
            continue;
        }
        let root = sets.find(position);
        let class = *root_classes.entry(root).or_insert_with(|| {
            let class = ClassId(next_class);
            next_class += 1;
            class
        });
        group_classes.insert(group.id.clone(), class);
    }

    let mut classes = HashMap::with_capacity(thesaurus.entries().len());
    for (entry, (_, linked)) in thesaurus.entries().iter().zip(&entry_groups) {
        let class = match linked.first() {
            Some(&position) => root_classes[&sets.find(position)],
            None => {
                let class = ClassId(next_class);
                next_class += 1;
                class
            }
        };
        classes.insert(entry.code.clone(), class);
    }

    let mut report_groups = Vec::<ReportGroup>::new();
    let mut union_report_group = HashMap::<usize, usize>::new();
    let mut position_report_group = Vec::with_capacity(group_count);
    for (position, group) in thesaurus.groups().iter().enumerate() {
        let report_group = match owning_union[position] {
            Some(union_position) => *union_report_group
                .entry(union_position)
                .or_insert_with(|| {
                    let name = unions[union_position].name.clone();
                    report_groups.push(ReportGroup {
                        id: name.clone(),
                        name,
                    });
                    report_groups.len() - 1
                }),
            None => {
                report_groups.push(ReportGroup {
                    id: group.id.clone(),
                    name: group.name.clone(),
                });
                report_groups.len() - 1
            }
        };
        position_report_group.push(report_group);
    }

    let mut code_report_groups = HashMap::with_capacity(thesaurus.entries().len());
    for (entry, (positions, _)) in thesaurus.entries().iter().zip(&entry_groups) {
        let mut targets = Vec::with_capacity(positions.len());
        for &position in positions {
            let report_group = position_report_group[position];
            if !targets.contains(&report_group) {
                targets.push(report_group);
            }
        }
        code_report_groups.insert(entry.code.clone(), targets);
    }

    debug!(
        classes = next_class,
        report_groups = report_groups.len(),
        unions = unions.len(),
        "resolved equivalence classes"
    );

    Ok(EquivalenceIndex {
        classes,
        group_classes,
        code_report_groups,
        report_groups,
    })
}
