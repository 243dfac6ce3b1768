//! Core learnset types shared by the reference loader, source scanner and merger

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A single level-up move: the species learns `move_name` on reaching `level`.
///
/// Serializes as a `[level, move]` pair, which is the layout of the
/// reference cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u8, String)", into = "(u8, String)")]
pub struct LearnsetEntry {
    /// Level at which the move is learned (0 means known from the start)
    pub level: u8,
    /// Move name without the `MOVE_` prefix, e.g. "THUNDERSHOCK"
    pub move_name: String,
}

impl LearnsetEntry {
    /// Create a new entry
    pub fn new(level: u8, move_name: impl Into<String>) -> Self {
        Self {
            level,
            move_name: move_name.into(),
        }
    }
}

impl From<(u8, String)> for LearnsetEntry {
    fn from((level, move_name): (u8, String)) -> Self {
        Self { level, move_name }
    }
}

impl From<LearnsetEntry> for (u8, String) {
    fn from(entry: LearnsetEntry) -> Self {
        (entry.level, entry.move_name)
    }
}

/// One species' moves, in stored order
pub type Learnset = Vec<LearnsetEntry>;

/// Species name -> learnset. A BTreeMap so iteration is always lexicographic.
pub type LearnsetTable = BTreeMap<String, Learnset>;

/// Build a move -> level lookup. A move listed twice keeps its last level.
pub fn level_lookup(learnset: &[LearnsetEntry]) -> HashMap<&str, u8> {
    learnset
        .iter()
        .map(|e| (e.move_name.as_str(), e.level))
        .collect()
}

/// Highest level in the learnset, or 0 when it is empty
pub fn final_level(learnset: &[LearnsetEntry]) -> u8 {
    learnset.iter().map(|e| e.level).max().unwrap_or(0)
}

/// Sort by (level, move name)
pub fn sort_learnset(learnset: &mut Learnset) {
    learnset.sort_by(|a, b| {
        a.level
            .cmp(&b.level)
            .then_with(|| a.move_name.cmp(&b.move_name))
    });
}

/// Every move name that appears anywhere in the table.
///
/// Used as the valid-move mask: a reference move outside this set has no
/// constant in the source data and can never be written back.
pub fn valid_moves(table: &LearnsetTable) -> BTreeSet<String> {
    table
        .values()
        .flat_map(|moves| moves.iter().map(|e| e.move_name.clone()))
        .collect()
}
