use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::resolver::{ClassId, EquivalenceIndex};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Reference,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedPair {
    pub reference: String,
    pub test: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedStatement {
    pub code: String,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl std::ops::AddAssign for MatchCounts {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchPartition {
    pub true_positives: Vec<MatchedPair>,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
    pub excluded: Vec<ExcludedStatement>,
}

impl MatchPartition {
    pub fn counts(&self) -> MatchCounts {
        MatchCounts {
            tp: self.true_positives.len(),
            fp: self.false_positives.len(),
            fn_: self.false_negatives.len(),
        }
    }
}

fn unique_in_order(codes: &[String]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(codes.len());
    codes
        .iter()
        .map(String::as_str)
        .filter(|code| seen.insert(*code))
        .collect()
}

fn resolve_side<'a>(
    codes: &[&'a str],
    side: Side,
    index: &EquivalenceIndex,
    excluded: &mut Vec<ExcludedStatement>,
) -> Vec<(&'a str, ClassId)> {
    let mut resolved = Vec::with_capacity(codes.len());
    for &code in codes {
        match index.class_of(code) {
            Some(class) => resolved.push((code, class)),
            None => excluded.push(ExcludedStatement {
                code: code.to_string(),
                side,
            }),
        }
    }
    resolved
}

// Identical codes pair first; the rest pair by class in input order.
pub fn match_statements(
    reference: &[String],
    test: &[String],
    index: &EquivalenceIndex,
) -> MatchPartition {
    let mut excluded = Vec::new();
    let reference = resolve_side(
        &unique_in_order(reference),
        Side::Reference,
        index,
        &mut excluded,
    );
    let test = resolve_side(&unique_in_order(test), Side::Test, index, &mut excluded);

    let mut reference_used = vec![false; reference.len()];
    let mut test_partner = vec![None::<usize>; test.len()];

    let reference_by_code: HashMap<&str, usize> = reference
        .iter()
        .enumerate()
        .map(|(position, (code, _))| (*code, position))
        .collect();
    for (test_position, (code, _)) in test.iter().enumerate() {
        if let Some(&reference_position) = reference_by_code.get(code) {
            reference_used[reference_position] = true;
            test_partner[test_position] = Some(reference_position);
        }
    }

    let mut remaining_by_class = HashMap::<ClassId, VecDeque<usize>>::new();
    for (position, (_, class)) in reference.iter().enumerate() {
        if !reference_used[position] {
            remaining_by_class.entry(*class).or_default().push_back(position);
        }
    }
    for (test_position, (_, class)) in test.iter().enumerate() {
        if test_partner[test_position].is_some() {
            continue;
        }
        let candidate = remaining_by_class
            .get_mut(class)
            .and_then(VecDeque::pop_front);
        if let Some(reference_position) = candidate {
            reference_used[reference_position] = true;
            test_partner[test_position] = Some(reference_position);
        }
    }

    let mut partition = MatchPartition {
        excluded,
        ..MatchPartition::default()
    };
    for ((code, _), partner) in test.iter().zip(&test_partner) {
        match partner {
            Some(reference_position) => partition.true_positives.push(MatchedPair {
                reference: reference[*reference_position].0.to_string(),
                test: code.to_string(),
            }),
            None => partition.false_positives.push(code.to_string()),
        }
    }
    for ((code, _), used) in reference.iter().zip(&reference_used) {
        if !used {
            partition.false_negatives.push(code.to_string());
        }
    }

    partition
}
