//! GBA text-mode tilemaps: little-endian u16 entries, row-major
//!
//! Entry layout: bits 0-9 tile index, bit 10 horizontal flip, bit 11
//! vertical flip, bits 12-15 palette.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Mask for the tile index bits of an entry
pub const TILE_INDEX_MASK: u16 = 0x03FF;

const HFLIP_BIT: u16 = 1 << 10;
const VFLIP_BIT: u16 = 1 << 11;
const PALETTE_SHIFT: u16 = 12;

/// A single tilemap entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilemapEntry(pub u16);

impl TilemapEntry {
    pub fn new(tile: u16, palette: u8, hflip: bool, vflip: bool) -> Self {
        let mut raw = (tile & TILE_INDEX_MASK) | ((palette as u16 & 0xF) << PALETTE_SHIFT);
        if hflip {
            raw |= HFLIP_BIT;
        }
        if vflip {
            raw |= VFLIP_BIT;
        }
        Self(raw)
    }

    pub fn tile(self) -> u16 {
        self.0 & TILE_INDEX_MASK
    }

    pub fn hflip(self) -> bool {
        self.0 & HFLIP_BIT != 0
    }

    pub fn vflip(self) -> bool {
        self.0 & VFLIP_BIT != 0
    }

    pub fn palette(self) -> u8 {
        (self.0 >> PALETTE_SHIFT) as u8
    }
}

/// A tilemap with a known width in tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tilemap {
    pub width: usize,
    pub entries: Vec<TilemapEntry>,
}

impl Tilemap {
    /// Decode raw bytes. `name` is only used in errors.
    pub fn from_bytes(bytes: &[u8], width: usize, name: &str) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(Error::TilemapLength {
                name: name.to_string(),
                len: bytes.len(),
            });
        }
        let entries = bytes
            .chunks_exact(2)
            .map(|pair| TilemapEntry(u16::from_le_bytes([pair[0], pair[1]])))
            .collect();
        Ok(Self { width, entries })
    }

    pub fn load<P: AsRef<Path>>(path: P, width: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes, width, &path.display().to_string())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_entries(&self.entries)
    }

    /// Number of full rows
    pub fn height(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.entries.len() / self.width
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<TilemapEntry> {
        if x >= self.width {
            return None;
        }
        self.entries.get(y * self.width + x).copied()
    }

    /// Tile indices of one row within `region`, as 3-digit hex
    pub fn grid_row(&self, region: Region, y: usize) -> String {
        (region.x0..=region.x1)
            .filter_map(|x| self.get(x, y))
            .map(|e| format!("{:03X}", e.tile()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Encode entries as little-endian bytes
pub fn encode_entries(entries: &[TilemapEntry]) -> Vec<u8> {
    entries.iter().flat_map(|e| e.0.to_le_bytes()).collect()
}

/// An inclusive rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Region {
    fn check(self, map: &Tilemap) -> Result<()> {
        let height = map.height();
        if self.x0 > self.x1 || self.y0 > self.y1 || self.x1 >= map.width || self.y1 >= height {
            return Err(Error::RegionOutOfBounds {
                x0: self.x0,
                y0: self.y0,
                x1: self.x1,
                y1: self.y1,
                width: map.width,
                height,
            });
        }
        Ok(())
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    /// Parse "x0,y0,x1,y1"
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<usize> = s
            .split(',')
            .map(|p| p.trim().parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| format!("invalid region '{}': {}", s, e))?;
        match parts.as_slice() {
            &[x0, y0, x1, y1] => Ok(Region { x0, y0, x1, y1 }),
            _ => Err(format!("invalid region '{}': expected x0,y0,x1,y1", s)),
        }
    }
}

/// A cell whose tile index differs between two maps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDifference {
    pub x: usize,
    pub y: usize,
    /// Byte offset of the entry in either file
    pub offset: usize,
    /// Tile index in the first map
    pub source: u16,
    /// Tile index in the second map
    pub target: u16,
}

impl fmt::Display for TileDifference {
    /// A `setmetatile` line that turns the source cell into the target cell
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "setmetatile {}, {}, 0x{:03X}, TRUE  @ was 0x{:03X}",
            self.x, self.y, self.target, self.source
        )
    }
}

/// Compare tile indices (flip and palette bits ignored).
///
/// With no region every entry is compared, including a trailing partial row.
pub fn diff_tilemaps(
    source: &Tilemap,
    target: &Tilemap,
    region: Option<Region>,
) -> Result<Vec<TileDifference>> {
    if source.entries.len() != target.entries.len() {
        return Err(Error::TilemapSizeMismatch {
            left: source.entries.len(),
            right: target.entries.len(),
        });
    }

    let differs = |index: usize| {
        let a = source.entries[index].tile();
        let b = target.entries[index].tile();
        (a != b).then(|| TileDifference {
            x: index % source.width.max(1),
            y: index / source.width.max(1),
            offset: index * 2,
            source: a,
            target: b,
        })
    };

    match region {
        Some(region) => {
            region.check(source)?;
            Ok((region.y0..=region.y1)
                .flat_map(|y| (region.x0..=region.x1).map(move |x| (x, y)))
                .filter_map(|(x, y)| differs(y * source.width + x))
                .collect())
        }
        None => Ok((0..source.entries.len()).filter_map(differs).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(width: usize, raw: &[u16]) -> Tilemap {
        Tilemap {
            width,
            entries: raw.iter().map(|&r| TilemapEntry(r)).collect(),
        }
    }

    #[test]
    fn test_entry_fields() {
        let entry = TilemapEntry(0x180B);
        assert_eq!(entry.tile(), 0x0B);
        assert!(entry.vflip());
        assert!(!entry.hflip());
        assert_eq!(entry.palette(), 1);
        assert_eq!(TilemapEntry::new(0x0B, 1, false, true), entry);
        assert!(TilemapEntry(0x140B).hflip());
    }

    #[test]
    fn test_from_bytes_little_endian() {
        let map = Tilemap::from_bytes(&[0x0A, 0x10, 0x0B, 0x18], 2, "t").unwrap();
        assert_eq!(map.entries, vec![TilemapEntry(0x100A), TilemapEntry(0x180B)]);
        assert_eq!(map.to_bytes(), vec![0x0A, 0x10, 0x0B, 0x18]);
    }

    #[test]
    fn test_odd_length_rejected() {
        let result = Tilemap::from_bytes(&[1, 2, 3], 1, "odd.bin");
        assert!(matches!(result, Err(Error::TilemapLength { len: 3, .. })));
    }

    #[test]
    fn test_diff_ignores_flip_and_palette() {
        let a = map(2, &[0x0001, 0x0002, 0x0003, 0x0004]);
        let b = map(2, &[0xF401, 0x0002, 0x0C03, 0x0005]);

        let diffs = diff_tilemaps(&a, &b, None).unwrap();
        assert_eq!(
            diffs,
            vec![TileDifference {
                x: 1,
                y: 1,
                offset: 6,
                source: 0x004,
                target: 0x005
            }]
        );
    }

    #[test]
    fn test_every_masked_difference_reported_once() {
        let a_raw: Vec<u16> = (0..40).collect();
        let b_raw: Vec<u16> = (0..40).map(|v| if v % 3 == 0 { v + 0x100 } else { v | 0x8000 }).collect();
        let a = map(8, &a_raw);
        let b = map(8, &b_raw);

        let diffs = diff_tilemaps(&a, &b, None).unwrap();
        let expected: Vec<usize> = (0..40).filter(|v| v % 3 == 0).map(|v| v * 2).collect();
        assert_eq!(diffs.iter().map(|d| d.offset).collect::<Vec<_>>(), expected);
        for d in &diffs {
            assert_eq!(d.source, a_raw[d.offset / 2] & TILE_INDEX_MASK);
            assert_eq!(d.target, b_raw[d.offset / 2] & TILE_INDEX_MASK);
        }
    }

    #[test]
    fn test_diff_region() {
        let a = map(3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let b = map(3, &[0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let region = Region { x0: 1, y0: 1, x1: 2, y1: 2 };

        let diffs = diff_tilemaps(&a, &b, Some(region)).unwrap();
        let cells: Vec<(usize, usize)> = diffs.iter().map(|d| (d.x, d.y)).collect();
        assert_eq!(cells, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_region_out_of_bounds() {
        let a = map(3, &[0; 9]);
        let region = Region { x0: 0, y0: 0, x1: 3, y1: 0 };
        assert!(matches!(
            diff_tilemaps(&a, &a, Some(region)),
            Err(Error::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let result = diff_tilemaps(&map(2, &[0, 0]), &map(2, &[0, 0, 0, 0]), None);
        assert!(matches!(result, Err(Error::TilemapSizeMismatch { left: 2, right: 4 })));
    }

    #[test]
    fn test_difference_display() {
        let diff = TileDifference {
            x: 35,
            y: 2,
            offset: 0,
            source: 0x1A2,
            target: 0x00F,
        };
        assert_eq!(diff.to_string(), "setmetatile 35, 2, 0x00F, TRUE  @ was 0x1A2");
    }

    #[test]
    fn test_grid_row_and_region_parse() {
        let a = map(3, &[0x3001, 0x0002, 0x0403]);
        let region: Region = "1,0,2,0".parse().unwrap();
        assert_eq!(a.grid_row(region, 0), "002 003");
        assert!("1,2,3".parse::<Region>().is_err());
    }
}
