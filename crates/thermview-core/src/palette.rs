//! Intensity → colour lookup tables and the per-pixel gather.

use alloc::vec::Vec;

use crate::image::{CHANNELS, GrayImage, Image, ImageError, Rgb};

/// 256-entry colour lookup table indexed by 8-bit intensity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Palette {
    table: [Rgb; 256],
}

impl Palette {
    pub const fn from_table(table: [Rgb; 256]) -> Self {
        Self { table }
    }

    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(u8) -> Rgb,
    {
        let mut table = [Rgb::BLACK; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = f(i as u8);
        }
        Self { table }
    }

    #[inline]
    pub fn color(&self, intensity: u8) -> Rgb {
        self.table[intensity as usize]
    }

    pub fn table(&self) -> &[Rgb; 256] {
        &self.table
    }
}

/// Maps every sample of `gray` through `palette` into `dst`.
pub fn map_palette_into(
    dst: &mut Image,
    gray: &GrayImage,
    palette: &Palette,
) -> Result<(), ImageError> {
    if dst.size() != gray.size() {
        return Err(ImageError::SizeMismatch {
            expected: gray.size(),
            actual: dst.size(),
        });
    }

    let width = gray.size().width as usize;
    for (y, src_row) in gray.as_bytes().chunks_exact(width).enumerate() {
        let Some(dst_row) = dst.row_mut(y as u32) else {
            break;
        };
        for (px, &sample) in dst_row.chunks_exact_mut(3).zip(src_row) {
            px.copy_from_slice(&palette.color(sample).0);
        }
    }

    Ok(())
}

/// Maps `gray` through `palette` into a newly allocated image.
pub fn map_palette(gray: &GrayImage, palette: &Palette) -> Image {
    let mut data = Vec::with_capacity(gray.as_bytes().len() * CHANNELS);
    for &sample in gray.as_bytes() {
        data.extend_from_slice(&palette.color(sample).0);
    }
    Image::from_parts(gray.size(), data)
}

/// Built-in palettes, in the order the colour selector cycles through them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PaletteId {
    /// Hot is white.
    WhiteHot,
    /// Hot is black.
    BlackHot,
    /// Quadratic amber ramp.
    Psq,
    /// Exponential red with a linear grey base.
    P45,
    /// Dim red for night use.
    Coti,
}

impl PaletteId {
    pub const ALL: [PaletteId; 5] = [
        PaletteId::WhiteHot,
        PaletteId::BlackHot,
        PaletteId::Psq,
        PaletteId::P45,
        PaletteId::Coti,
    ];

    /// Option names shown in the menu, index-aligned with [`PaletteId::ALL`].
    pub const NAMES: [&'static str; 5] = ["WHOT", "BHOT", "PSQ", "P45", "COTI"];

    pub const fn name(self) -> &'static str {
        match self {
            PaletteId::WhiteHot => "WHOT",
            PaletteId::BlackHot => "BHOT",
            PaletteId::Psq => "PSQ",
            PaletteId::P45 => "P45",
            PaletteId::Coti => "COTI",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Supplies a palette for a palette identifier.
pub trait PaletteProvider {
    fn palette(&self, id: PaletteId) -> &Palette;
}

#[inline]
fn channel(v: f64) -> u8 {
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v as u8
    }
}

fn white_hot() -> Palette {
    Palette::from_fn(|i| Rgb::new(i, i, i))
}

fn black_hot() -> Palette {
    Palette::from_fn(|i| {
        let v = 255 - i;
        Rgb::new(v, v, v)
    })
}

fn psq() -> Palette {
    Palette::from_fn(|i| {
        let t = i as f64 / 255.0;
        let curve = t * t * 255.0;
        Rgb::new(
            channel(curve * 250.0 / 255.0),
            channel(curve * 156.0 / 255.0),
            channel(curve * 28.0 / 255.0),
        )
    })
}

fn p45() -> Palette {
    const GROWTH: f64 = 1.021_897_148_7;

    // GROWTH^i, accumulated so no float pow is needed.
    let mut red = 1.0f64;
    Palette::from_fn(|i| {
        let base = i as f64;
        let out = Rgb::new(channel(red), channel(base - red), channel(base - red));
        red *= GROWTH;
        out
    })
}

fn coti() -> Palette {
    Palette::from_fn(|i| Rgb::new(channel(i as f64 / 255.0 * 35.0), 0, 0))
}

/// Owns one table per [`PaletteId`], built once at startup.
#[derive(Clone, Debug)]
pub struct BuiltinPalettes {
    tables: [Palette; 5],
}

impl Default for BuiltinPalettes {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinPalettes {
    pub fn new() -> Self {
        Self {
            tables: [white_hot(), black_hot(), psq(), p45(), coti()],
        }
    }
}

impl PaletteProvider for BuiltinPalettes {
    fn palette(&self, id: PaletteId) -> &Palette {
        &self.tables[id.index()]
    }
}
