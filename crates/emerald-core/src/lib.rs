//! emerald-core: Core library for Pokemon Emerald data tooling
//!
//! This library provides functionality to:
//! - Load reference learnsets from the veekun/pokedex CSV export, with a JSON cache
//! - Scan the learnset declarations in `level_up_learnsets.h`
//! - Compare the two tables and merge reference levels back into the source text
//! - Diff GBA tilemaps and patch tiles in indexed PNG sheets

pub mod apply;
pub mod button;
pub mod cache;
pub mod compare;
pub mod error;
pub mod learnset;
pub mod merge;
pub mod reference;
pub mod source;
pub mod tilemap;
pub mod tileset;

pub use apply::{backup_path, write_with_backup};
pub use button::{create_pc_button, ButtonReport, TileFix};
pub use cache::{reference_learnsets, ReferenceCache};
pub use compare::{compare_learnsets, ComparisonSummary, Differences, LevelDifference};
pub use error::{Error, Result};
pub use learnset::{valid_moves, Learnset, LearnsetEntry, LearnsetTable};
pub use merge::{
    merge_learnsets, merge_species, rewrite_document, LearnsetFormat, LevelUpMacroFormat,
    MergePolicy, RewriteResult,
};
pub use reference::{HttpSource, ReferenceConfig, ReferenceResource, ReferenceSource};
pub use source::{Declaration, SourceDocument};
pub use tilemap::{diff_tilemaps, Region, TileDifference, Tilemap, TilemapEntry};
pub use tileset::IndexedImage;
