//! IconVG color model
//!
//! Colors are either direct alpha-premultiplied RGBA values, or indirect ones
//! that refer to the custom palette, to a color register of the decoder, or to
//! a blend of two other colors. Indirect colors only have an RGBA value in the
//! context of a palette and a register file, see [`Color::resolve`].
use crate::decode_color1;
use bytemuck::{Pod, Zeroable};
use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

/// Alpha premultiplied sRGBA color with 8 bits per channel
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Pod, Zeroable)]
pub struct RGBA(pub [u8; 4]);

impl RGBA {
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::new(0x00, 0x00, 0x00, 0x00);

    /// Opaque black
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00, 0xff);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub const fn red(self) -> u8 {
        self.0[0]
    }

    pub const fn green(self) -> u8 {
        self.0[1]
    }

    pub const fn blue(self) -> u8 {
        self.0[2]
    }

    pub const fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Convert color to RGBA list
    pub const fn to_rgba(self) -> [u8; 4] {
        self.0
    }

    /// Color channels do not exceed alpha, as premultiplication requires
    pub const fn is_valid_premul(self) -> bool {
        let [r, g, b, a] = self.0;
        r <= a && g <= a && b <= a
    }

    /// Remove alpha premultiplication, rounding to the nearest value
    ///
    /// Fully transparent colors become transparent black.
    pub fn to_nonpremul(self) -> [u8; 4] {
        let [r, g, b, a] = self.0;
        match a {
            0x00 => [0, 0, 0, 0],
            0xff => self.0,
            _ => {
                let a32 = a as u32;
                let unmul = |c: u8| ((c as u32 * 0xff + a32 / 2) / a32).min(0xff) as u8;
                [unmul(r), unmul(g), unmul(b), a]
            }
        }
    }

    /// Premultiply non-premultiplied RGBA values, rounding to the nearest value
    pub fn from_nonpremul([r, g, b, a]: [u8; 4]) -> Self {
        let mul = |c: u8| ((c as u32 * a as u32 + 0x7f) / 0xff) as u8;
        Self([mul(r), mul(g), mul(b), a])
    }

    /// Color channels as floats in `[0, 1]` range
    pub fn to_f32(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl From<[u8; 4]> for RGBA {
    fn from(rgba: [u8; 4]) -> Self {
        Self(rgba)
    }
}

impl From<RGBA> for [u8; 4] {
    fn from(color: RGBA) -> Self {
        color.0
    }
}

impl fmt::Debug for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "RGBA(#{:02x}{:02x}{:02x}{:02x})", r, g, b, a)
    }
}

impl fmt::Display for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

impl FromStr for RGBA {
    type Err = ColorError;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        if color.starts_with('#') && (color.len() == 7 || color.len() == 9) {
            // #RRGGBB(AA)
            let bytes: &[u8] = color[1..].as_ref();
            let digit = |byte| match byte {
                b'A'..=b'F' => Ok(byte - b'A' + 10),
                b'a'..=b'f' => Ok(byte - b'a' + 10),
                b'0'..=b'9' => Ok(byte - b'0'),
                _ => Err(ColorError::HexExpected),
            };
            let mut hex = bytes
                .chunks(2)
                .map(|pair| Ok(digit(pair[0])? << 4 | digit(pair[1])?));
            Ok(RGBA::new(
                hex.next().unwrap_or(Ok(0))?,
                hex.next().unwrap_or(Ok(0))?,
                hex.next().unwrap_or(Ok(0))?,
                hex.next().unwrap_or(Ok(255))?,
            ))
        } else {
            Err(ColorError::HexExpected)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RGBA {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RGBA {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        std::borrow::Cow::<'de, str>::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// IconVG color, whose RGBA value may depend on context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// Direct alpha premultiplied color
    Direct(RGBA),
    /// Index (6 bits) into the custom palette
    PaletteIndex(u8),
    /// Index (6 bits) of a color register of the decoder
    RegisterIndex(u8),
    /// Blend of two colors given by their one byte encoding, `t` is the weight
    /// of `c1` (0 gives `c0`, 255 gives `c1`)
    Blend { t: u8, c0: u8, c1: u8 },
}

impl Color {
    /// Direct color
    pub const fn direct(rgba: RGBA) -> Self {
        Self::Direct(rgba)
    }

    /// Indirect color referring to an index of the custom palette
    pub const fn palette_index(index: u8) -> Self {
        Self::PaletteIndex(index & 0x3f)
    }

    /// Indirect color referring to a color register
    pub const fn register_index(index: u8) -> Self {
        Self::RegisterIndex(index & 0x3f)
    }

    /// Indirect color blending two colors given by their one byte encodings
    ///
    /// To blend a color that has no one byte encoding, load it into a color
    /// register first and blend the register.
    pub const fn blend(t: u8, c0: u8, c1: u8) -> Self {
        Self::Blend { t, c0, c1 }
    }

    /// Blend two colors, if both of them have a one byte encoding
    pub fn try_blend(t: u8, c0: Color, c1: Color) -> Option<Self> {
        Some(Self::Blend {
            t,
            c0: crate::encode_color1(c0)?,
            c1: crate::encode_color1(c1)?,
        })
    }

    /// Whether the color depends on a palette or a register file
    pub fn is_indirect(&self) -> bool {
        !matches!(self, Self::Direct(_))
    }

    /// Resolve RGBA value of the color given the palette and the color registers
    pub fn resolve(&self, palette: &Palette, registers: &ColorRegisters) -> RGBA {
        match *self {
            Self::Direct(rgba) => rgba,
            Self::PaletteIndex(index) => palette[index & 0x3f],
            Self::RegisterIndex(index) => registers[index & 0x3f],
            Self::Blend { t, c0, c1 } => {
                let p = 255 - t as u32;
                let q = t as u32;
                let c0 = decode_color1(c0).resolve(palette, registers);
                let c1 = decode_color1(c1).resolve(palette, registers);
                let mix = |v0: u8, v1: u8| ((p * v0 as u32 + q * v1 as u32 + 128) / 255) as u8;
                RGBA::new(
                    mix(c0.red(), c1.red()),
                    mix(c0.green(), c1.green()),
                    mix(c0.blue(), c1.blue()),
                    mix(c0.alpha(), c1.alpha()),
                )
            }
        }
    }
}

impl From<RGBA> for Color {
    fn from(rgba: RGBA) -> Self {
        Self::Direct(rgba)
    }
}

/// Resolve RGBA value of the color given the palette and the color registers
pub fn resolve(color: Color, palette: &Palette, registers: &ColorRegisters) -> RGBA {
    color.resolve(palette, registers)
}

/// Number of entries in a palette and in a register file
pub const PALETTE_SIZE: usize = 64;

/// Custom palette, 64 colors referenced by index from the encoded graphic
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Palette(pub [RGBA; PALETTE_SIZE]);

impl Default for Palette {
    fn default() -> Self {
        Self([RGBA::BLACK; PALETTE_SIZE])
    }
}

impl Palette {
    /// Create palette from the list of colors, missing entries are opaque black
    pub fn new(colors: &[RGBA]) -> Option<Self> {
        if colors.len() > PALETTE_SIZE {
            return None;
        }
        let mut palette = Self::default();
        palette.0[..colors.len()].copy_from_slice(colors);
        Some(palette)
    }

    pub fn colors(&self) -> &[RGBA; PALETTE_SIZE] {
        &self.0
    }

    /// Palette as a flat list of RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.0)
    }

    /// Create palette from 256 bytes of RGBA values
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let colors: &[RGBA] = bytemuck::try_cast_slice(bytes).ok()?;
        if colors.len() != PALETTE_SIZE {
            return None;
        }
        Self::new(colors)
    }
}

impl Index<u8> for Palette {
    type Output = RGBA;

    fn index(&self, index: u8) -> &Self::Output {
        &self.0[(index & 0x3f) as usize]
    }
}

impl IndexMut<u8> for Palette {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self.0[(index & 0x3f) as usize]
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Palette {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Palette {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let colors = Vec::<RGBA>::deserialize(deserializer)?;
        Self::new(&colors).ok_or_else(|| serde::de::Error::invalid_length(colors.len(), &"at most 64 colors"))
    }
}

/// Color registers (CREG) of the decoder virtual machine
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorRegisters(pub [RGBA; PALETTE_SIZE]);

impl Default for ColorRegisters {
    fn default() -> Self {
        Self([RGBA::TRANSPARENT; PALETTE_SIZE])
    }
}

impl Index<u8> for ColorRegisters {
    type Output = RGBA;

    fn index(&self, index: u8) -> &Self::Output {
        &self.0[(index & 0x3f) as usize]
    }
}

impl IndexMut<u8> for ColorRegisters {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self.0[(index & 0x3f) as usize]
    }
}

impl fmt::Debug for ColorRegisters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[derive(Debug, Clone)]
pub enum ColorError {
    HexExpected,
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::HexExpected => {
                write!(f, "Color expected to be #RRGGBB(AA) in hexidemical format")
            }
        }
    }
}

impl std::error::Error for ColorError {}
