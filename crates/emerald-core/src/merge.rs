//! Merge reference levels into the source learnsets and rewrite the source text

use crate::learnset::{final_level, level_lookup, Learnset, LearnsetEntry, LearnsetTable};
use crate::source::SourceDocument;
use log::debug;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write;

/// How a reference level is applied to a matched move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Take the reference level only when it is lower than the source level
    #[default]
    OnlyEarlier,
    /// Take the reference level whenever it differs
    Reference,
}

impl MergePolicy {
    fn resolve(self, source_level: u8, reference_level: u8) -> u8 {
        match self {
            MergePolicy::OnlyEarlier => reference_level.min(source_level),
            MergePolicy::Reference => reference_level,
        }
    }
}

/// Compute the adjusted learnset for one species.
///
/// Returns `None` when no entry changes. Rules per entry:
/// - a move in the reference and in the mask gets the level chosen by `policy`
/// - otherwise, an entry at the source's final level is pulled down to the
///   reference's final level when the reference's final level is lower
/// - everything else is kept
///
/// The result is sorted by level only; entries on the same level keep their
/// source order.
pub fn merge_species(
    source: &[LearnsetEntry],
    reference: &[LearnsetEntry],
    valid_moves: &BTreeSet<String>,
    policy: MergePolicy,
) -> Option<Learnset> {
    let reference_lookup = level_lookup(reference);
    let source_final = final_level(source);
    let reference_final = final_level(reference);

    let mut changed = false;
    let mut merged: Learnset = source
        .iter()
        .map(|entry| {
            let matched = reference_lookup
                .get(entry.move_name.as_str())
                .filter(|_| valid_moves.contains(&entry.move_name));

            let level = match matched {
                Some(&reference_level) => policy.resolve(entry.level, reference_level),
                None if entry.level == source_final && reference_final < source_final => {
                    reference_final
                }
                None => entry.level,
            };

            changed |= level != entry.level;
            LearnsetEntry::new(level, entry.move_name.clone())
        })
        .collect();

    if !changed {
        return None;
    }

    merged.sort_by_key(|e| e.level);
    Some(merged)
}

/// Adjusted learnsets for every species in both tables, only those that changed
pub fn merge_learnsets(
    source: &LearnsetTable,
    reference: &LearnsetTable,
    valid_moves: &BTreeSet<String>,
    policy: MergePolicy,
) -> LearnsetTable {
    source
        .iter()
        .filter_map(|(species, source_moves)| {
            let reference_moves = reference.get(species)?;
            merge_species(source_moves, reference_moves, valid_moves, policy)
                .map(|merged| (species.clone(), merged))
        })
        .collect()
}

/// Text layout of a learnset body, i.e. everything between `{` and `}`
pub trait LearnsetFormat {
    fn render_body(&self, entries: &[LearnsetEntry]) -> String;
}

/// `LEVEL_UP_MOVE(lv, MOVE_X),` lines closed by `LEVEL_UP_END`
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelUpMacroFormat;

impl LearnsetFormat for LevelUpMacroFormat {
    fn render_body(&self, entries: &[LearnsetEntry]) -> String {
        let mut body = String::from("\n");
        for entry in entries {
            let _ = writeln!(
                body,
                "    LEVEL_UP_MOVE({:>2}, MOVE_{}),",
                entry.level, entry.move_name
            );
        }
        body.push_str("    LEVEL_UP_END\n");
        body
    }
}

/// Output of a rewrite
#[derive(Debug, Clone)]
pub struct RewriteResult {
    /// The new file content
    pub text: String,
    /// Species whose block was replaced, in file order
    pub rewritten: Vec<String>,
    /// Species with changes but no declaration in the document
    pub skipped: Vec<String>,
}

/// Replace the body of each changed species' declaration.
///
/// Only the first declaration of a species is touched; all other bytes of
/// the document are copied through unchanged. Rendered bodies use CRLF
/// line endings when the document does.
pub fn rewrite_document(
    document: &SourceDocument,
    changes: &LearnsetTable,
    format: &dyn LearnsetFormat,
) -> RewriteResult {
    let text = document.text();
    let crlf = text.contains("\r\n");
    let mut output = String::with_capacity(text.len());
    let mut rewritten = Vec::new();
    let mut done: HashSet<&str> = HashSet::new();
    let mut copied_to = 0;

    for decl in document.declarations() {
        let Some(entries) = changes.get(&decl.species) else {
            continue;
        };
        if !done.insert(decl.species.as_str()) {
            continue;
        }

        output.push_str(&text[copied_to..decl.body.start]);
        let body = format.render_body(entries);
        if crlf {
            output.push_str(&body.replace('\n', "\r\n"));
        } else {
            output.push_str(&body);
        }
        copied_to = decl.body.end;
        rewritten.push(decl.species.clone());
    }
    output.push_str(&text[copied_to..]);

    let skipped: Vec<String> = changes
        .keys()
        .filter(|species| !done.contains(species.as_str()))
        .cloned()
        .collect();
    for species in &skipped {
        debug!("No declaration found for {}, skipping", species);
    }

    RewriteResult {
        text: output,
        rewritten,
        skipped,
    }
}
