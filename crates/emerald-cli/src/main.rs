//! Emerald Tools CLI
//!
//! Command-line tool for syncing Emerald learnsets to another game's level
//! timings, diffing map tilemaps, and building the party menu PC button.

use clap::{Args, Parser, Subcommand, ValueEnum};
use emerald_core::{
    compare_learnsets, create_pc_button, diff_tilemaps, merge_learnsets, reference_learnsets,
    rewrite_document, valid_moves, write_with_backup, ComparisonSummary, HttpSource,
    LevelUpMacroFormat, MergePolicy, ReferenceCache, ReferenceConfig, Region, SourceDocument,
    TileFix, Tilemap,
};
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "emerald-tools")]
#[command(about = "Pokemon Emerald data tooling", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare learnsets with a reference game and optionally apply its level timings
    Learnsets(LearnsetArgs),

    /// Show tile index differences between two map files
    MapDiff {
        /// Map the differences are measured from
        source: PathBuf,

        /// Map the differences lead to
        target: PathBuf,

        /// Map width in tiles
        #[arg(short, long, default_value_t = 45)]
        width: usize,

        /// Inclusive region to compare: x0,y0,x1,y1
        #[arg(short, long)]
        region: Option<Region>,
    },

    /// Write the PC button tilemap and fix its fill tile in the party menu sheet
    PcButton {
        /// Directory holding bg.png
        #[arg(short, long, default_value = "graphics/party_menu")]
        dir: PathBuf,

        /// Tile to fix
        #[arg(long, default_value = "0x0B", value_parser = parse_hex_usize)]
        tile: usize,

        /// Palette index to replace
        #[arg(long, default_value = "0x11", value_parser = parse_hex_u8)]
        from: u8,

        /// Palette index to write
        #[arg(long, default_value = "0x1F", value_parser = parse_hex_u8)]
        to: u8,
    },
}

#[derive(Args)]
struct LearnsetArgs {
    /// Report differences only (default)
    #[arg(long)]
    compare: bool,

    /// Report differences and rewrite the learnset file (overrides --compare)
    #[arg(long)]
    apply: bool,

    /// Ignore the cache and download fresh reference data
    #[arg(long)]
    download: bool,

    /// Learnset source file
    #[arg(long, default_value = "src/data/pokemon/level_up_learnsets.h")]
    learnsets: PathBuf,

    /// Reference data cache
    #[arg(long, default_value = "tools/hgss_learnsets_cache.json")]
    cache: PathBuf,

    /// Reference version group (10 = HeartGold/SoulSilver)
    #[arg(long)]
    version_group: Option<u32>,

    /// Highest species id to take from the reference
    #[arg(long)]
    max_species: Option<u32>,

    /// How reference levels are applied
    #[arg(long, value_enum, default_value_t = Policy::OnlyEarlier)]
    policy: Policy,
}

impl LearnsetArgs {
    /// Whether the learnset file gets rewritten
    fn applies(&self) -> bool {
        if self.compare && self.apply {
            debug!("--apply given, running as --apply");
        }
        self.apply
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Only move learn levels earlier
    OnlyEarlier,
    /// Use the reference level whenever it differs
    Reference,
}

impl From<Policy> for MergePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::OnlyEarlier => MergePolicy::OnlyEarlier,
            Policy::Reference => MergePolicy::Reference,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> emerald_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Learnsets(args) => cmd_learnsets(&args),
        Commands::MapDiff {
            source,
            target,
            width,
            region,
        } => cmd_map_diff(&source, &target, width, region),
        Commands::PcButton { dir, tile, from, to } => cmd_pc_button(&dir, TileFix { tile, from, to }),
    }
}

fn cmd_learnsets(args: &LearnsetArgs) -> emerald_core::Result<()> {
    if !args.learnsets.exists() {
        return Err(emerald_core::Error::SourceNotFound(args.learnsets.clone()));
    }

    let mut config = ReferenceConfig::default();
    if let Some(version_group) = args.version_group {
        config.version_group = version_group;
    }
    if let Some(max_species) = args.max_species {
        config.max_species = max_species;
    }

    let cache = ReferenceCache::new(&args.cache);
    let source = HttpSource::new(config.clone());
    let reference = reference_learnsets(&cache, &source, &config, args.download)?;

    info!("Parsing {}...", args.learnsets.display());
    let document = SourceDocument::load(&args.learnsets)?;
    let learnsets = document.learnsets();
    info!("Found {} learnsets", learnsets.len());

    let valid = valid_moves(&learnsets);
    info!("Found {} unique moves", valid.len());

    let policy = MergePolicy::from(args.policy);
    print_comparison(&learnsets, &reference, &valid, policy);

    if !args.applies() {
        println!();
        println!("Run with --apply to apply these changes");
        return Ok(());
    }

    println!();
    println!("Applying changes...");
    let changes = merge_learnsets(&learnsets, &reference, &valid, policy);
    let result = rewrite_document(&document, &changes, &LevelUpMacroFormat);
    println!("Updated {} learnsets", result.rewritten.len());
    if !result.skipped.is_empty() {
        println!(
            "Skipped {} species with no matching declaration: {}",
            result.skipped.len(),
            result.skipped.join(", ")
        );
    }

    if let Some(backup) = write_with_backup(&args.learnsets, &result.text)? {
        println!("Backup saved to {}", backup.display());
    }
    println!("Updated {}", args.learnsets.display());

    Ok(())
}

fn print_comparison(
    learnsets: &emerald_core::LearnsetTable,
    reference: &emerald_core::LearnsetTable,
    valid: &std::collections::BTreeSet<String>,
    policy: MergePolicy,
) {
    let banner = "=".repeat(70);
    println!();
    println!("{}", banner);
    match policy {
        MergePolicy::OnlyEarlier => println!("LEARNSET COMPARISON (Only Earlier Levels Applied)"),
        MergePolicy::Reference => println!("LEARNSET COMPARISON (Reference Levels Applied)"),
    }
    println!("{}", banner);

    let differences = compare_learnsets(learnsets, reference, valid);

    for (species, diffs) in &differences {
        let shown: Vec<_> = diffs
            .iter()
            .filter(|d| d.is_earlier() || policy == MergePolicy::Reference)
            .collect();
        if shown.is_empty() {
            continue;
        }

        println!();
        println!("{}:", species);
        for diff in shown {
            let (direction, sign, delta) = if diff.is_earlier() {
                ("earlier", '-', diff.source_level - diff.reference_level)
            } else {
                ("later", '+', diff.reference_level - diff.source_level)
            };
            println!(
                "  {}: Lv{} -> Lv{} ({}, {}{})",
                diff.move_name, diff.source_level, diff.reference_level, direction, sign, delta
            );
        }
    }

    let summary = ComparisonSummary::from_differences(&differences);
    println!();
    println!("{}", banner);
    println!("SUMMARY: {} species have differences", summary.species);
    println!("  {} moves will be learned EARLIER (applied)", summary.earlier);
    match policy {
        MergePolicy::OnlyEarlier => println!(
            "  {} moves would be later in the reference (SKIPPED - keeping current level)",
            summary.later
        ),
        MergePolicy::Reference => println!("  {} moves will be learned LATER (applied)", summary.later),
    }
    println!("{}", banner);
}

fn cmd_map_diff(
    source_path: &Path,
    target_path: &Path,
    width: usize,
    region: Option<Region>,
) -> emerald_core::Result<()> {
    let source = Tilemap::load(source_path, width)?;
    let target = Tilemap::load(target_path, width)?;
    let differences = diff_tilemaps(&source, &target, region)?;

    if let Some(region) = region {
        println!(
            "REGION x={}-{}, y={}-{}",
            region.x0, region.x1, region.y0, region.y1
        );
        println!("{}", "=".repeat(60));

        for (label, map) in [(source_path, &source), (target_path, &target)] {
            println!();
            println!("{}:", label.display());
            for y in region.y0..=region.y1 {
                println!("y={}: {}", y, map.grid_row(region, y));
            }
        }
        println!();
    }

    println!(
        "DIFFERENCES ({}), {} -> {}:",
        differences.len(),
        source_path.display(),
        target_path.display()
    );
    for diff in &differences {
        println!("  {}", diff);
    }

    Ok(())
}

fn cmd_pc_button(dir: &Path, fix: TileFix) -> emerald_core::Result<()> {
    let report = create_pc_button(dir, fix)?;

    println!("Created {}", report.tilemap_path.display());
    let entries: Vec<String> = report.entries.iter().map(|e| format!("0x{:04X}", e.0)).collect();
    println!("Tilemap entries: [{}]", entries.join(", "));

    println!();
    println!(
        "Tile 0x{:02X} is at pixel position ({}, {})",
        fix.tile, report.tile_origin.0, report.tile_origin.1
    );
    print_tile("before", fix.tile, &report.before);
    print_tile("after", fix.tile, &report.after);

    println!();
    println!(
        "Fixed {} (replaced {} pixels of 0x{:02X} with 0x{:02X} in tile 0x{:02X})",
        report.sheet_path.display(),
        report.replaced,
        fix.from,
        fix.to,
        fix.tile
    );

    Ok(())
}

fn print_tile(label: &str, tile: usize, rows: &[String]) {
    println!();
    println!("Tile 0x{:02X} {} fix:", tile, label);
    for (y, row) in rows.iter().enumerate() {
        println!("  Row {}: {}", y, row);
    }
}

fn parse_hex_usize(s: &str) -> Result<usize, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    usize::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{}': {}", s, e))
}

fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_usize(s)?;
    u8::try_from(value).map_err(|_| format!("'{}' does not fit in a byte", s))
}
