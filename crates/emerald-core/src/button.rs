//! Party menu "PC" button: tilemap plus a fix to the shared fill tile
//!
//! The button reuses the cancel button's frame. The fill tile 0x0B has a
//! dark line (palette index 0x11) that shows through on the new button, so
//! that index is swapped for the light fill colour 0x1F inside the tile.

use crate::error::{Error, Result};
use crate::tilemap::{encode_entries, TilemapEntry};
use crate::tileset::IndexedImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Button width in tiles
pub const BUTTON_WIDTH: usize = 7;

/// 7x2 button, palette 1. Bottom row fill is the v-flipped fill tile.
#[rustfmt::skip]
pub const PC_BUTTON_TILEMAP: [u16; 14] = [
    0x100A, 0x100B, 0x100B, 0x100B, 0x100B, 0x100B, 0x100C,
    0x1012, 0x180B, 0x180B, 0x180B, 0x180B, 0x180B, 0x1013,
];

pub const TILEMAP_FILE: &str = "start_button.bin";
pub const SHEET_FILE: &str = "bg.png";

/// Which palette index to swap in which tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileFix {
    pub tile: usize,
    pub from: u8,
    pub to: u8,
}

impl Default for TileFix {
    fn default() -> Self {
        Self {
            tile: 0x0B,
            from: 0x11,
            to: 0x1F,
        }
    }
}

/// What `create_pc_button` did
#[derive(Debug, Clone)]
pub struct ButtonReport {
    pub tilemap_path: PathBuf,
    pub entries: Vec<TilemapEntry>,
    pub sheet_path: PathBuf,
    /// Pixel position of the fixed tile
    pub tile_origin: (usize, usize),
    pub before: Vec<String>,
    pub after: Vec<String>,
    pub replaced: usize,
}

pub fn pc_button_entries() -> Vec<TilemapEntry> {
    PC_BUTTON_TILEMAP.iter().map(|&raw| TilemapEntry(raw)).collect()
}

/// Write `start_button.bin` into `dir` and apply `fix` to `dir/bg.png`.
///
/// The sheet is validated before anything is written.
pub fn create_pc_button<P: AsRef<Path>>(dir: P, fix: TileFix) -> Result<ButtonReport> {
    let dir = dir.as_ref();
    let sheet_path = dir.join(SHEET_FILE);
    let mut sheet = IndexedImage::load(&sheet_path)?;

    let tile_origin = sheet.tile_origin(fix.tile)?;
    let before = sheet.tile_rows(fix.tile)?;
    let replaced = sheet.replace_in_tile(fix.tile, fix.from, fix.to)?;
    let after = sheet.tile_rows(fix.tile)?;

    let entries = pc_button_entries();
    let tilemap_path = dir.join(TILEMAP_FILE);
    fs::write(&tilemap_path, encode_entries(&entries)).map_err(|e| Error::FileWrite {
        path: tilemap_path.clone(),
        source: e,
    })?;

    sheet.save(&sheet_path)?;

    Ok(ButtonReport {
        tilemap_path,
        entries,
        sheet_path,
        tile_origin,
        before,
        after,
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::TILE_SIZE;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("emerald-button-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_button_layout() {
        let entries = pc_button_entries();
        assert_eq!(entries.len(), BUTTON_WIDTH * 2);
        assert_eq!(entries[0].tile(), 0x0A);
        let bottom_fill = entries[BUTTON_WIDTH + 1];
        assert_eq!(bottom_fill.tile(), 0x0B);
        assert!(bottom_fill.vflip());
        assert!(!bottom_fill.hflip());
        assert!(entries.iter().all(|e| e.palette() == 1));
    }

    #[test]
    fn test_create_pc_button() {
        let dir = temp_dir("create");
        // 64x16 sheet: tile 0x0B is at (24, 8); stripe its first row with 0x11
        let (width, height) = (64, 16);
        let mut pixels = vec![0x1Fu8; width * height];
        for x in 24..32 {
            pixels[8 * width + x] = 0x11;
        }
        pixels[0] = 0x11;
        let image = IndexedImage {
            width,
            height,
            bit_depth: 8,
            pixels,
            palette: vec![0; 256 * 3],
            transparency: None,
        };
        image.save(dir.join(SHEET_FILE)).unwrap();

        let report = create_pc_button(&dir, TileFix::default()).unwrap();
        assert_eq!(report.tile_origin, (24, 8));
        assert_eq!(report.replaced, TILE_SIZE);
        assert_eq!(report.before[0], "1111111111111111");
        assert_eq!(report.after[0], "1F1F1F1F1F1F1F1F");

        let bin = fs::read(dir.join(TILEMAP_FILE)).unwrap();
        assert_eq!(bin.len(), 28);
        assert_eq!(&bin[..4], &[0x0A, 0x10, 0x0B, 0x10]);

        let patched = IndexedImage::load(dir.join(SHEET_FILE)).unwrap();
        // Pixels outside the tile are untouched
        assert_eq!(patched.pixels[0], 0x11);
        assert!(patched.tile_rows(0x0B).unwrap().iter().all(|r| !r.contains("11")));
    }

    #[test]
    fn test_missing_sheet_writes_nothing() {
        let dir = temp_dir("missing");
        assert!(create_pc_button(&dir, TileFix::default()).is_err());
        assert!(!dir.join(TILEMAP_FILE).exists());
    }
}
