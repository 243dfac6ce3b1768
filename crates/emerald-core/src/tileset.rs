//! Indexed-colour tile sheets (PNG) edited at the palette-index level
//!
//! The image is kept as one palette index per pixel; the palette, the
//! transparency chunk and the bit depth are carried through a load/save so
//! the file can be rebuilt by the game's graphics pipeline unchanged.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Tiles are 8x8 pixels
pub const TILE_SIZE: usize = 8;

/// A paletted image with unpacked pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,
    /// Bits per pixel in the file: 1, 2, 4 or 8
    pub bit_depth: u8,
    /// One palette index per pixel, row-major
    pub pixels: Vec<u8>,
    /// RGB triplets
    pub palette: Vec<u8>,
    pub transparency: Option<Vec<u8>>,
}

impl IndexedImage {
    /// Decode a PNG without expanding the palette
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let decode_err = |source| Error::PngDecode {
            path: path.to_path_buf(),
            source,
        };

        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info().map_err(decode_err)?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf).map_err(decode_err)?;

        if frame.color_type != png::ColorType::Indexed {
            return Err(Error::UnsupportedImage {
                path: path.to_path_buf(),
                message: format!("expected an indexed image, found {:?}", frame.color_type),
            });
        }

        let info = reader.info();
        let palette = info
            .palette
            .as_ref()
            .map(|p| p.to_vec())
            .ok_or_else(|| Error::UnsupportedImage {
                path: path.to_path_buf(),
                message: "indexed image has no palette".to_string(),
            })?;
        let transparency = info.trns.as_ref().map(|t| t.to_vec());

        let bit_depth = frame.bit_depth as u8;
        let width = frame.width as usize;
        let height = frame.height as usize;
        let pixels = unpack_rows(&buf, frame.line_size, width, height, bit_depth);

        Ok(Self {
            width,
            height,
            bit_depth,
            pixels,
            palette,
            transparency,
        })
    }

    /// Encode as an indexed PNG with the original bit depth
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

        let encode_err = |source| Error::PngEncode {
            path: path.to_path_buf(),
            source,
        };

        let depth = match self.bit_depth {
            1 => png::BitDepth::One,
            2 => png::BitDepth::Two,
            4 => png::BitDepth::Four,
            _ => png::BitDepth::Eight,
        };

        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(depth);
        encoder.set_palette(self.palette.clone());
        if let Some(trns) = &self.transparency {
            encoder.set_trns(trns.clone());
        }

        let mut writer = encoder.write_header().map_err(encode_err)?;
        let data = pack_rows(&self.pixels, self.width, self.height, self.bit_depth);
        writer.write_image_data(&data).map_err(encode_err)?;
        writer.finish().map_err(encode_err)
    }

    /// Number of 8x8 tiles per row of the sheet
    pub fn tiles_per_row(&self) -> usize {
        self.width / TILE_SIZE
    }

    /// Number of whole tiles on the sheet
    pub fn tile_count(&self) -> usize {
        self.tiles_per_row() * (self.height / TILE_SIZE)
    }

    /// Top-left pixel of a tile, tiles numbered row-major across the sheet
    pub fn tile_origin(&self, tile: usize) -> Result<(usize, usize)> {
        let count = self.tile_count();
        if tile >= count {
            return Err(Error::TileOutOfRange { tile, count });
        }
        let per_row = self.tiles_per_row();
        Ok(((tile % per_row) * TILE_SIZE, (tile / per_row) * TILE_SIZE))
    }

    /// The 8 rows of a tile as hex strings, two digits per pixel
    pub fn tile_rows(&self, tile: usize) -> Result<Vec<String>> {
        let (ox, oy) = self.tile_origin(tile)?;
        Ok((0..TILE_SIZE)
            .map(|y| {
                let start = (oy + y) * self.width + ox;
                self.pixels[start..start + TILE_SIZE]
                    .iter()
                    .map(|p| format!("{:02X}", p))
                    .collect()
            })
            .collect())
    }

    /// Replace palette index `from` with `to` inside one tile.
    ///
    /// Returns how many pixels changed.
    pub fn replace_in_tile(&mut self, tile: usize, from: u8, to: u8) -> Result<usize> {
        let max = ((1u16 << self.bit_depth) - 1) as u8;
        if to > max {
            return Err(Error::PixelValueOutOfRange {
                value: to,
                bit_depth: self.bit_depth,
            });
        }

        let (ox, oy) = self.tile_origin(tile)?;
        let mut replaced = 0;
        for y in 0..TILE_SIZE {
            let start = (oy + y) * self.width + ox;
            for pixel in &mut self.pixels[start..start + TILE_SIZE] {
                if *pixel == from {
                    *pixel = to;
                    replaced += 1;
                }
            }
        }
        Ok(replaced)
    }
}

/// Split packed rows into one byte per pixel. Sub-byte pixels are MSB first.
fn unpack_rows(buf: &[u8], line_size: usize, width: usize, height: usize, bit_depth: u8) -> Vec<u8> {
    let depth = bit_depth as usize;
    let mask = ((1u16 << depth) - 1) as u8;
    let mut pixels = Vec::with_capacity(width * height);

    for row in buf.chunks(line_size).take(height) {
        for x in 0..width {
            let bit = x * depth;
            let byte = row[bit / 8];
            let shift = 8 - depth - (bit % 8);
            pixels.push((byte >> shift) & mask);
        }
    }
    pixels
}

fn pack_rows(pixels: &[u8], width: usize, height: usize, bit_depth: u8) -> Vec<u8> {
    let depth = bit_depth as usize;
    let line_size = (width * depth).div_ceil(8);
    let mut data = vec![0u8; line_size * height];

    for y in 0..height {
        let row = &mut data[y * line_size..(y + 1) * line_size];
        for x in 0..width {
            let bit = x * depth;
            let shift = 8 - depth - (bit % 8);
            row[bit / 8] |= pixels[y * width + x] << shift;
        }
    }
    data
}
