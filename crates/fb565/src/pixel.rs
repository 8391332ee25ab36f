//! 16-bit pixel packing.

/// Channel order of the panel's 16-bit words.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PixelOrder {
    /// Red in the high five bits.
    Rgb,
    /// Blue in the high five bits.
    #[default]
    Bgr,
}

impl PixelOrder {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("rgb") {
            Some(Self::Rgb)
        } else if name.eq_ignore_ascii_case("bgr") {
            Some(Self::Bgr)
        } else {
            None
        }
    }

    #[inline]
    pub const fn pack(self, r: u8, g: u8, b: u8) -> u16 {
        match self {
            Self::Rgb => pack_rgb565(r, g, b),
            Self::Bgr => pack_bgr565(r, g, b),
        }
    }
}

#[inline]
pub const fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

#[inline]
pub const fn pack_bgr565(r: u8, g: u8, b: u8) -> u16 {
    pack_rgb565(b, g, r)
}

/// Expands a 5-6-5 word back to 8-bit channels, replicating the high bits.
#[inline]
pub const fn unpack_rgb565(word: u16) -> (u8, u8, u8) {
    let r = ((word >> 11) & 0x1F) as u8;
    let g = ((word >> 5) & 0x3F) as u8;
    let b = (word & 0x1F) as u8;
    ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_land_in_their_fields() {
        assert_eq!(pack_rgb565(255, 0, 0), 0xF800);
        assert_eq!(pack_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(pack_rgb565(0, 0, 255), 0x001F);
        assert_eq!(pack_bgr565(255, 0, 0), 0x001F);
        assert_eq!(pack_bgr565(0, 0, 255), 0xF800);
    }

    #[test]
    fn unpack_restores_extremes() {
        assert_eq!(unpack_rgb565(0xFFFF), (255, 255, 255));
        assert_eq!(unpack_rgb565(0x0000), (0, 0, 0));
        assert_eq!(unpack_rgb565(pack_rgb565(200, 100, 50)), (206, 101, 49));
    }

    #[test]
    fn order_parses_case_insensitively() {
        assert_eq!(PixelOrder::from_name("BGR"), Some(PixelOrder::Bgr));
        assert_eq!(PixelOrder::from_name("rgb"), Some(PixelOrder::Rgb));
        assert_eq!(PixelOrder::from_name("grb"), None);
        assert_eq!(PixelOrder::Rgb.pack(255, 255, 255), 0xFFFF);
    }
}
