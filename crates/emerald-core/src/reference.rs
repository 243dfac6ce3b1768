//! Reference learnset loader for the veekun/pokedex CSV export
//!
//! This module provides:
//! - Species and move id -> name tables, normalized to the Emerald naming style
//! - Extraction of level-up learnsets for one version group
//! - A `ReferenceSource` seam so the CSVs can come from HTTP or from memory

use crate::error::{Error, Result};
use crate::learnset::{sort_learnset, LearnsetEntry, LearnsetTable};
use log::info;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

const POKEMON_SPECIES_URL: &str =
    "https://raw.githubusercontent.com/veekun/pokedex/master/pokedex/data/csv/pokemon_species.csv";
const MOVES_URL: &str =
    "https://raw.githubusercontent.com/veekun/pokedex/master/pokedex/data/csv/moves.csv";
const POKEMON_MOVES_URL: &str =
    "https://raw.githubusercontent.com/veekun/pokedex/master/pokedex/data/csv/pokemon_moves.csv";

/// Version group ids in the veekun data
pub mod version_group {
    pub const RUBY_SAPPHIRE: u32 = 3;
    pub const FIRERED_LEAFGREEN: u32 = 4;
    pub const EMERALD: u32 = 5;
    pub const DIAMOND_PEARL: u32 = 8;
    pub const PLATINUM: u32 = 9;
    pub const HEARTGOLD_SOULSILVER: u32 = 10;
}

/// `pokemon_move_method_id` for level-up moves
pub const LEVEL_UP_METHOD: u32 = 1;

/// Deoxys, the last species of the third generation
pub const MAX_GEN3_SPECIES: u32 = 386;

/// Identifiers whose tokenization differs from Emerald's MOVE_ constants
const MOVE_NAME_FIXES: &[(&str, &str)] = &[
    ("POISON_GAS", "POISONGAS"),
    ("SELF_DESTRUCT", "SELFDESTRUCT"),
    ("SOFT_BOILED", "SOFTBOILED"),
    ("DOUBLE_SLAP", "DOUBLESLAP"),
    ("SOLAR_BEAM", "SOLARBEAM"),
    ("DRAGON_BREATH", "DRAGONBREATH"),
    ("EXTREME_SPEED", "EXTREMESPEED"),
    ("ANCIENT_POWER", "ANCIENTPOWER"),
    ("FEINT_ATTACK", "FAINT_ATTACK"),
    ("THUNDER_SHOCK", "THUNDERSHOCK"),
    ("THUNDER_PUNCH", "THUNDERPUNCH"),
    ("VICE_GRIP", "VICEGRIP"),
    ("SMELLING_SALTS", "SMELLINGSALT"),
    ("DYNAMIC_PUNCH", "DYNAMICPUNCH"),
    ("BUBBLE_BEAM", "BUBBLEBEAM"),
];

/// Species identifiers that don't survive the plain upper-casing
const SPECIES_NAME_FIXES: &[(&str, &str)] = &[("FARFETCHD", "FARFETCH_D")];

/// Which of the three reference CSVs a request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceResource {
    Species,
    Moves,
    Learnsets,
}

impl ReferenceResource {
    /// File name of the CSV in the veekun export
    pub fn file_name(self) -> &'static str {
        match self {
            ReferenceResource::Species => "pokemon_species.csv",
            ReferenceResource::Moves => "moves.csv",
            ReferenceResource::Learnsets => "pokemon_moves.csv",
        }
    }
}

/// Where the reference data comes from and which slice of it to keep
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub species_url: String,
    pub moves_url: String,
    pub learnsets_url: String,
    /// Version group whose timings are the target
    pub version_group: u32,
    /// Acquisition method to keep
    pub method: u32,
    /// Highest species id to keep
    pub max_species: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            species_url: POKEMON_SPECIES_URL.to_string(),
            moves_url: MOVES_URL.to_string(),
            learnsets_url: POKEMON_MOVES_URL.to_string(),
            version_group: version_group::HEARTGOLD_SOULSILVER,
            method: LEVEL_UP_METHOD,
            max_species: MAX_GEN3_SPECIES,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ReferenceConfig {
    /// URL of one of the three CSVs
    pub fn url(&self, resource: ReferenceResource) -> &str {
        match resource {
            ReferenceResource::Species => &self.species_url,
            ReferenceResource::Moves => &self.moves_url,
            ReferenceResource::Learnsets => &self.learnsets_url,
        }
    }
}

/// Supplies the raw text of a reference CSV
pub trait ReferenceSource {
    fn fetch(&self, resource: ReferenceResource) -> Result<String>;
}

/// Fetches the CSVs over HTTP with a fixed timeout and no retries
pub struct HttpSource {
    agent: ureq::Agent,
    config: ReferenceConfig,
}

impl HttpSource {
    pub fn new(config: ReferenceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }
}

impl ReferenceSource for HttpSource {
    fn fetch(&self, resource: ReferenceResource) -> Result<String> {
        let url = self.config.url(resource);
        info!("Downloading {}...", resource.file_name());

        let unavailable = |message: String| Error::ReferenceUnavailable {
            resource: url.to_string(),
            message,
        };

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| unavailable(e.to_string()))?;

        // into_string() caps bodies at 10 MB; pokemon_moves.csv is larger
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| unavailable(e.to_string()))?;
        Ok(body)
    }
}

/// Convert a veekun identifier ("thunder-shock") to constant style ("THUNDER_SHOCK")
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_uppercase().replace('-', "_")
}

fn apply_fix(name: String, fixes: &[(&str, &str)]) -> String {
    match fixes.iter().find(|(from, _)| *from == name) {
        Some((_, to)) => to.to_string(),
        None => name,
    }
}

/// Parse `pokemon_species.csv` into species id -> Emerald-style name
pub fn load_species_names(content: &str) -> Result<BTreeMap<u32, String>> {
    load_names(content, ReferenceResource::Species, SPECIES_NAME_FIXES)
}

/// Parse `moves.csv` into move id -> Emerald-style name
pub fn load_move_names(content: &str) -> Result<BTreeMap<u32, String>> {
    load_names(content, ReferenceResource::Moves, MOVE_NAME_FIXES)
}

fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes())
}

fn parse_id(field: &str, resource: ReferenceResource, row: usize) -> Result<u32> {
    field.trim().parse().map_err(|_| Error::CsvField {
        resource: resource.file_name().to_string(),
        row,
        message: format!("expected an integer, found '{}'", field),
    })
}

/// Both name tables share the layout `id,identifier,...`
fn load_names(
    content: &str,
    resource: ReferenceResource,
    fixes: &[(&str, &str)],
) -> Result<BTreeMap<u32, String>> {
    let mut names = BTreeMap::new();

    for (row_idx, result) in csv_reader(content).records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            resource: resource.file_name().to_string(),
            source: e,
        })?;
        if record.len() < 2 {
            continue;
        }

        let id = parse_id(&record[0], resource, row_idx + 1)?;
        let name = apply_fix(normalize_identifier(&record[1]), fixes);
        names.insert(id, name);
    }

    Ok(names)
}

/// Which rows of `pokemon_moves.csv` to keep
#[derive(Debug, Clone, Copy)]
pub struct LearnsetFilter {
    pub version_group: u32,
    pub method: u32,
    pub max_species: u32,
}

impl From<&ReferenceConfig> for LearnsetFilter {
    fn from(config: &ReferenceConfig) -> Self {
        Self {
            version_group: config.version_group,
            method: config.method,
            max_species: config.max_species,
        }
    }
}

/// Parse `pokemon_moves.csv` (`pokemon_id,version_group_id,move_id,method_id,level,...`)
/// into a learnset table.
///
/// Rows with an unknown species or move id are dropped; they are gaps in the
/// reference data, not errors. Each learnset comes back sorted by (level, move).
pub fn extract_learnsets(
    content: &str,
    filter: LearnsetFilter,
    species_names: &BTreeMap<u32, String>,
    move_names: &BTreeMap<u32, String>,
) -> Result<LearnsetTable> {
    let resource = ReferenceResource::Learnsets;
    let mut learnsets = LearnsetTable::new();

    for (row_idx, result) in csv_reader(content).records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            resource: resource.file_name().to_string(),
            source: e,
        })?;
        if record.len() < 5 {
            continue;
        }

        let row = row_idx + 1;
        let species_id = parse_id(&record[0], resource, row)?;
        let version_group = parse_id(&record[1], resource, row)?;
        let move_id = parse_id(&record[2], resource, row)?;
        let method = parse_id(&record[3], resource, row)?;

        if version_group != filter.version_group || method != filter.method {
            continue;
        }
        if species_id > filter.max_species {
            continue;
        }

        let level = match record[4].trim() {
            "" => 0,
            level => level.parse::<u8>().map_err(|_| Error::CsvField {
                resource: resource.file_name().to_string(),
                row,
                message: format!("bad level '{}'", level),
            })?,
        };

        let (Some(species), Some(move_name)) =
            (species_names.get(&species_id), move_names.get(&move_id))
        else {
            continue;
        };

        learnsets
            .entry(species.clone())
            .or_default()
            .push(LearnsetEntry::new(level, move_name.clone()));
    }

    for learnset in learnsets.values_mut() {
        sort_learnset(learnset);
    }

    Ok(learnsets)
}

/// Fetch and parse all three CSVs.
///
/// Any failure aborts the whole load; no partial table is ever returned.
pub fn load_reference(
    source: &dyn ReferenceSource,
    config: &ReferenceConfig,
) -> Result<LearnsetTable> {
    let species_content = source.fetch(ReferenceResource::Species)?;
    let moves_content = source.fetch(ReferenceResource::Moves)?;
    let learnsets_content = source.fetch(ReferenceResource::Learnsets)?;

    let species_names = load_species_names(&species_content)?;
    let move_names = load_move_names(&moves_content)?;
    info!(
        "Loaded {} species and {} moves",
        species_names.len(),
        move_names.len()
    );

    let learnsets = extract_learnsets(
        &learnsets_content,
        LearnsetFilter::from(config),
        &species_names,
        &move_names,
    )?;
    info!(
        "Loaded learnsets for {} species (version group {})",
        learnsets.len(),
        config.version_group
    );

    Ok(learnsets)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SPECIES_CSV: &str = "id,identifier,generation_id\n\
        1,bulbasaur,1\n\
        83,farfetchd,1\n\
        122,mr-mime,1\n\
        387,turtwig,4\n";

    pub(crate) const MOVES_CSV: &str = "id,identifier,generation_id\n\
        33,tackle,1\n\
        45,growl,1\n\
        84,thunder-shock,1\n\
        185,feint-attack,2\n";

    pub(crate) const POKEMON_MOVES_CSV: &str =
        "pokemon_id,version_group_id,move_id,pokemon_move_method_id,level,order\n\
        1,10,45,1,3,\n\
        1,10,33,1,1,\n\
        1,10,33,4,,\n\
        1,5,45,1,4,\n\
        1,10,999,1,9,\n\
        83,10,185,1,,\n\
        387,10,33,1,1,\n";

    pub(crate) struct MemorySource {
        pub species: Option<&'static str>,
        pub moves: Option<&'static str>,
        pub learnsets: Option<&'static str>,
    }

    impl MemorySource {
        pub(crate) fn complete() -> Self {
            Self {
                species: Some(SPECIES_CSV),
                moves: Some(MOVES_CSV),
                learnsets: Some(POKEMON_MOVES_CSV),
            }
        }
    }

    impl ReferenceSource for MemorySource {
        fn fetch(&self, resource: ReferenceResource) -> Result<String> {
            let content = match resource {
                ReferenceResource::Species => self.species,
                ReferenceResource::Moves => self.moves,
                ReferenceResource::Learnsets => self.learnsets,
            };
            content
                .map(str::to_string)
                .ok_or_else(|| Error::ReferenceUnavailable {
                    resource: resource.file_name().to_string(),
                    message: "offline".to_string(),
                })
        }
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("thunder-shock"), "THUNDER_SHOCK");
        assert_eq!(normalize_identifier("ho-oh"), "HO_OH");
    }

    #[test]
    fn test_species_names_with_fixes() {
        let names = load_species_names(SPECIES_CSV).unwrap();
        assert_eq!(names[&1], "BULBASAUR");
        assert_eq!(names[&83], "FARFETCH_D");
        assert_eq!(names[&122], "MR_MIME");
    }

    #[test]
    fn test_move_names_with_fixes() {
        let names = load_move_names(MOVES_CSV).unwrap();
        assert_eq!(names[&84], "THUNDERSHOCK");
        assert_eq!(names[&185], "FAINT_ATTACK");
        assert_eq!(names[&33], "TACKLE");
    }

    #[test]
    fn test_bad_id_is_an_error() {
        let result = load_move_names("id,identifier\nabc,tackle\n");
        assert!(matches!(result, Err(Error::CsvField { row: 1, .. })));
    }

    #[test]
    fn test_extract_filters_and_sorts() {
        let species = load_species_names(SPECIES_CSV).unwrap();
        let moves = load_move_names(MOVES_CSV).unwrap();
        let filter = LearnsetFilter::from(&ReferenceConfig::default());

        let table = extract_learnsets(POKEMON_MOVES_CSV, filter, &species, &moves).unwrap();

        // Turtwig is past the species bound
        assert_eq!(table.len(), 2);
        assert_eq!(
            table["BULBASAUR"],
            vec![LearnsetEntry::new(1, "TACKLE"), LearnsetEntry::new(3, "GROWL")]
        );
        // Empty level means known from the start
        assert_eq!(table["FARFETCH_D"], vec![LearnsetEntry::new(0, "FAINT_ATTACK")]);
    }

    #[test]
    fn test_extract_other_version_group() {
        let species = load_species_names(SPECIES_CSV).unwrap();
        let moves = load_move_names(MOVES_CSV).unwrap();
        let filter = LearnsetFilter {
            version_group: version_group::EMERALD,
            method: LEVEL_UP_METHOD,
            max_species: MAX_GEN3_SPECIES,
        };

        let table = extract_learnsets(POKEMON_MOVES_CSV, filter, &species, &moves).unwrap();
        assert_eq!(table["BULBASAUR"], vec![LearnsetEntry::new(4, "GROWL")]);
    }

    #[test]
    fn test_load_reference_in_memory() {
        let table = load_reference(&MemorySource::complete(), &ReferenceConfig::default()).unwrap();
        assert!(table.contains_key("BULBASAUR"));
    }

    #[test]
    fn test_load_reference_fails_whole() {
        let source = MemorySource {
            learnsets: None,
            ..MemorySource::complete()
        };
        let result = load_reference(&source, &ReferenceConfig::default());
        assert!(matches!(result, Err(Error::ReferenceUnavailable { .. })));
    }
}
