//! Per-move level differences between the source and reference tables

use crate::learnset::{level_lookup, LearnsetTable};
use std::collections::{BTreeMap, BTreeSet};

/// A move both tables teach, at different levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDifference {
    pub move_name: String,
    pub source_level: u8,
    pub reference_level: u8,
}

impl LevelDifference {
    pub fn new(move_name: impl Into<String>, source_level: u8, reference_level: u8) -> Self {
        Self {
            move_name: move_name.into(),
            source_level,
            reference_level,
        }
    }

    /// The reference teaches the move sooner
    pub fn is_earlier(&self) -> bool {
        self.reference_level < self.source_level
    }
}

/// Species -> differences, species in lexicographic order
pub type Differences = BTreeMap<String, Vec<LevelDifference>>;

/// Compare every species present in both tables.
///
/// Only moves in the valid-move mask are considered. Species missing from
/// the reference are skipped, and species without differences are left out.
/// Within a species, differences are ordered by move name.
pub fn compare_learnsets(
    source: &LearnsetTable,
    reference: &LearnsetTable,
    valid_moves: &BTreeSet<String>,
) -> Differences {
    let mut differences = Differences::new();

    for (species, source_moves) in source {
        let Some(reference_moves) = reference.get(species) else {
            continue;
        };

        let source_lookup: BTreeMap<&str, u8> = level_lookup(source_moves).into_iter().collect();
        let reference_lookup = level_lookup(reference_moves);

        let species_diffs: Vec<LevelDifference> = source_lookup
            .into_iter()
            .filter(|(move_name, _)| valid_moves.contains(*move_name))
            .filter_map(|(move_name, source_level)| {
                let reference_level = *reference_lookup.get(move_name)?;
                (reference_level != source_level)
                    .then(|| LevelDifference::new(move_name, source_level, reference_level))
            })
            .collect();

        if !species_diffs.is_empty() {
            differences.insert(species.clone(), species_diffs);
        }
    }

    differences
}

/// Counts for the comparison report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonSummary {
    /// Species with at least one difference
    pub species: usize,
    /// Differences where the reference is earlier
    pub earlier: usize,
    /// Differences where the reference is later
    pub later: usize,
}

impl ComparisonSummary {
    pub fn from_differences(differences: &Differences) -> Self {
        let mut summary = Self {
            species: differences.len(),
            ..Self::default()
        };
        for diff in differences.values().flatten() {
            if diff.is_earlier() {
                summary.earlier += 1;
            } else {
                summary.later += 1;
            }
        }
        summary
    }
}
