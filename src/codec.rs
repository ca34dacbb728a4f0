//! Compact color codec
//!
//! Colors are stored in the stream using 1, 2, 3 or 4 bytes. The one byte form
//! covers a 5x5x5 color cube, three translucent grays and the indirect palette
//! and register colors. Two bytes store 4 bits per channel, three bytes store
//! either an opaque color or a blend, four bytes store any direct color.
use crate::{Color, RGBA};

/// Channel values of the one byte color cube
static CUBE_TABLE: [u8; 5] = [0x00, 0x40, 0x80, 0xc0, 0xff];

/// Translucent grays encoded as one byte values `125`, `126` and `127`
static SENTINEL_GRAYS: [RGBA; 3] = [
    RGBA::new(0xc0, 0xc0, 0xc0, 0xc0),
    RGBA::new(0x80, 0x80, 0x80, 0x80),
    RGBA::new(0x00, 0x00, 0x00, 0x00),
];

/// Decode one byte color
pub fn decode_color1(x: u8) -> Color {
    if x >= 0xc0 {
        return Color::register_index(x);
    }
    if x >= 0x80 {
        return Color::palette_index(x);
    }
    if x >= 125 {
        return Color::Direct(SENTINEL_GRAYS[(x - 125) as usize]);
    }
    let blue = CUBE_TABLE[(x % 5) as usize];
    let x = x / 5;
    let green = CUBE_TABLE[(x % 5) as usize];
    let x = x / 5;
    let red = CUBE_TABLE[x as usize];
    Color::Direct(RGBA::new(red, green, blue, 0xff))
}

/// Channel value is exactly representable on the one byte color cube
fn is_cube_channel(value: u8) -> bool {
    value & 0x3f == 0 || value == 0xff
}

/// Encode color as one byte, if possible
pub fn encode_color1(color: Color) -> Option<u8> {
    match color {
        Color::Direct(rgba) if rgba.alpha() != 0xff => SENTINEL_GRAYS
            .iter()
            .position(|gray| *gray == rgba)
            .map(|index| 125 + index as u8),
        Color::Direct(rgba) => {
            let [r, g, b, _] = rgba.to_rgba();
            if is_cube_channel(r) && is_cube_channel(g) && is_cube_channel(b) {
                Some(25 * (r / 0x3f) + 5 * (g / 0x3f) + b / 0x3f)
            } else {
                None
            }
        }
        Color::PaletteIndex(index) => Some(0x80 | (index & 0x3f)),
        Color::RegisterIndex(index) => Some(0xc0 | (index & 0x3f)),
        Color::Blend { .. } => None,
    }
}

/// Decode two byte color, 4 bits per channel
pub fn decode_color2(x: [u8; 2]) -> Color {
    Color::Direct(RGBA::new(
        (x[0] >> 4) * 0x11,
        (x[0] & 0x0f) * 0x11,
        (x[1] >> 4) * 0x11,
        (x[1] & 0x0f) * 0x11,
    ))
}

/// Encode color as two bytes, if every channel is a multiple of `0x11`
pub fn encode_color2(color: Color) -> Option<[u8; 2]> {
    match color {
        Color::Direct(rgba) if rgba.to_rgba().iter().all(|c| c % 0x11 == 0) => {
            let [r, g, b, a] = rgba.to_rgba().map(|c| c / 0x11);
            Some([r << 4 | g, b << 4 | a])
        }
        _ => None,
    }
}

/// Decode three byte opaque color
pub fn decode_color3_direct(x: [u8; 3]) -> Color {
    Color::Direct(RGBA::new(x[0], x[1], x[2], 0xff))
}

/// Encode opaque direct color as three bytes
pub fn encode_color3_direct(color: Color) -> Option<[u8; 3]> {
    match color {
        Color::Direct(rgba) if rgba.alpha() == 0xff => {
            Some([rgba.red(), rgba.green(), rgba.blue()])
        }
        _ => None,
    }
}

/// Decode three byte blend color
pub fn decode_color3_indirect(x: [u8; 3]) -> Color {
    Color::blend(x[0], x[1], x[2])
}

/// Encode blend color as three bytes
pub fn encode_color3_indirect(color: Color) -> Option<[u8; 3]> {
    match color {
        Color::Blend { t, c0, c1 } => Some([t, c0, c1]),
        _ => None,
    }
}

/// Decode four byte color
pub fn decode_color4(x: [u8; 4]) -> Color {
    Color::Direct(RGBA(x))
}

/// Encode direct color as four bytes, always succeeds for direct colors
pub fn encode_color4(color: Color) -> Option<[u8; 4]> {
    match color {
        Color::Direct(rgba) => Some(rgba.to_rgba()),
        _ => None,
    }
}

/// Encoded form of a color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorEncoding {
    One(u8),
    Two([u8; 2]),
    ThreeDirect([u8; 3]),
    ThreeIndirect([u8; 3]),
    Four([u8; 4]),
}

impl ColorEncoding {
    /// Smallest encoding of the color
    ///
    /// Direct colors try 1, 2, 3 and 4 bytes in this order, palette and
    /// register colors always use one byte and blends use three bytes.
    pub fn smallest(color: Color) -> Self {
        if let Some(x) = encode_color1(color) {
            return Self::One(x);
        }
        match color {
            Color::Blend { t, c0, c1 } => Self::ThreeIndirect([t, c0, c1]),
            Color::Direct(rgba) => encode_color2(color)
                .map(Self::Two)
                .or_else(|| encode_color3_direct(color).map(Self::ThreeDirect))
                .unwrap_or(Self::Four(rgba.to_rgba())),
            // indirect index colors always have one byte encoding
            Color::PaletteIndex(index) => Self::One(0x80 | (index & 0x3f)),
            Color::RegisterIndex(index) => Self::One(0xc0 | (index & 0x3f)),
        }
    }

    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::One(x) => std::slice::from_ref(x),
            Self::Two(x) => x,
            Self::ThreeDirect(x) | Self::ThreeIndirect(x) => x,
            Self::Four(x) => x,
        }
    }

    /// Decode color back from its encoding
    pub fn decode(&self) -> Color {
        match *self {
            Self::One(x) => decode_color1(x),
            Self::Two(x) => decode_color2(x),
            Self::ThreeDirect(x) => decode_color3_direct(x),
            Self::ThreeIndirect(x) => decode_color3_indirect(x),
            Self::Four(x) => decode_color4(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorRegisters, Palette};

    #[test]
    fn test_color1_round_trip() {
        for x in 0..=255u8 {
            let color = decode_color1(x);
            assert_eq!(encode_color1(color), Some(x), "byte {}", x);
        }
    }

    #[test]
    fn test_color1_decode() {
        assert_eq!(
            decode_color1(38),
            Color::Direct(RGBA::new(0x40, 0x80, 0xc0, 0xff))
        );
        assert_eq!(decode_color1(0), Color::Direct(RGBA::BLACK));
        assert_eq!(
            decode_color1(124),
            Color::Direct(RGBA::new(0xff, 0xff, 0xff, 0xff))
        );
        assert_eq!(decode_color1(125), Color::Direct(RGBA::new(0xc0, 0xc0, 0xc0, 0xc0)));
        assert_eq!(decode_color1(126), Color::Direct(RGBA::new(0x80, 0x80, 0x80, 0x80)));
        assert_eq!(decode_color1(127), Color::Direct(RGBA::TRANSPARENT));
        assert_eq!(decode_color1(0x85), Color::PaletteIndex(5));
        assert_eq!(decode_color1(200), Color::RegisterIndex(8));

        let mut registers = ColorRegisters::default();
        registers.0[8] = RGBA::new(1, 2, 3, 4);
        assert_eq!(
            decode_color1(200).resolve(&Palette::default(), &registers),
            RGBA::new(1, 2, 3, 4)
        );
    }

    #[test]
    fn test_color1_encode() {
        let color = Color::Direct(RGBA::new(0x40, 0x80, 0xc0, 0xff));
        assert_eq!(encode_color1(color), Some(38));
        // not on the cube
        assert_eq!(encode_color1(Color::Direct(RGBA::new(0x3f, 0, 0, 0xff))), None);
        // translucent but not a sentinel
        assert_eq!(encode_color1(Color::Direct(RGBA::new(0, 0, 0, 0x40))), None);
        assert_eq!(encode_color1(Color::blend(1, 2, 3)), None);
        assert_eq!(encode_color1(Color::palette_index(0x7f)), Some(0xbf));
        assert_eq!(encode_color1(Color::register_index(0xff)), Some(0xff));
    }

    #[test]
    fn test_color2() {
        let color = Color::Direct(RGBA::new(0x11, 0x22, 0x33, 0x44));
        assert_eq!(encode_color2(color), Some([0x12, 0x34]));
        assert_eq!(decode_color2([0x12, 0x34]), color);
        assert_eq!(encode_color2(Color::Direct(RGBA::new(0x10, 0, 0, 0xff))), None);
        assert_eq!(encode_color2(Color::palette_index(1)), None);
    }

    #[test]
    fn test_color3_and_color4() {
        let opaque = Color::Direct(RGBA::new(0x12, 0x34, 0x56, 0xff));
        let translucent = Color::Direct(RGBA::new(0x12, 0x34, 0x56, 0x78));
        assert_eq!(encode_color3_direct(opaque), Some([0x12, 0x34, 0x56]));
        assert_eq!(decode_color3_direct([0x12, 0x34, 0x56]), opaque);
        assert_eq!(encode_color3_direct(translucent), None);

        let blend = Color::blend(0x40, 0x81, 0xc2);
        assert_eq!(encode_color3_indirect(blend), Some([0x40, 0x81, 0xc2]));
        assert_eq!(decode_color3_indirect([0x40, 0x81, 0xc2]), blend);
        assert_eq!(encode_color3_indirect(opaque), None);

        assert_eq!(encode_color4(translucent), Some([0x12, 0x34, 0x56, 0x78]));
        assert_eq!(decode_color4([0x12, 0x34, 0x56, 0x78]), translucent);
        assert_eq!(encode_color4(blend), None);
        assert_eq!(encode_color4(Color::register_index(3)), None);
    }

    #[test]
    fn test_fallback_to_four_bytes() {
        // anything encodable as a direct color is also encodable as four bytes
        for rgba in [
            RGBA::new(0x40, 0x80, 0xc0, 0xff),
            RGBA::new(0x11, 0x22, 0x33, 0x44),
            RGBA::new(0x12, 0x34, 0x56, 0xff),
            RGBA::new(0x80, 0x80, 0x80, 0x80),
        ] {
            assert_eq!(encode_color4(Color::Direct(rgba)), Some(rgba.to_rgba()));
        }
    }

    #[test]
    fn test_smallest() {
        use ColorEncoding::*;
        let cases = [
            (Color::Direct(RGBA::new(0x40, 0x80, 0xc0, 0xff)), One(38)),
            (Color::Direct(RGBA::new(0x11, 0x22, 0x33, 0x44)), Two([0x12, 0x34])),
            (
                Color::Direct(RGBA::new(0x12, 0x34, 0x56, 0xff)),
                ThreeDirect([0x12, 0x34, 0x56]),
            ),
            (
                Color::Direct(RGBA::new(0x12, 0x34, 0x56, 0x78)),
                Four([0x12, 0x34, 0x56, 0x78]),
            ),
            (Color::palette_index(9), One(0x89)),
            (Color::register_index(9), One(0xc9)),
            (Color::blend(9, 0, 124), ThreeIndirect([9, 0, 124])),
        ];
        for (color, encoding) in cases {
            assert_eq!(ColorEncoding::smallest(color), encoding);
            assert_eq!(encoding.decode(), color);
        }
        assert_eq!(ThreeDirect([1, 2, 3]).as_bytes(), &[1, 2, 3]);
        assert_eq!(One(7).as_bytes(), &[7]);
    }
}
