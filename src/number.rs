//! Variable width numbers
//!
//! Every number occupies 1, 2 or 4 bytes, the low bits of the first byte
//! select the width:
//!
//! ```text
//! xxxx_xxx0             1 byte,  value = byte >> 1
//! xxxx_xx01 (u16 le)    2 bytes, value = u16 >> 2
//! xxxx_xx11 (u32 le)    4 bytes, value = u32 >> 2, or the f32 with bits `u32 & !3`
//! ```
//!
//! | Kind        | 1 byte        | 2 bytes             | 4 bytes     |
//! |-------------|---------------|---------------------|-------------|
//! | natural     | `v`           | `v`                 | `u32 >> 2`  |
//! | real        | `v`           | `v`                 | f32         |
//! | coordinate  | `v - 64`      | `v / 64 - 128`      | f32         |
//! | zero-to-one | `v / 120`     | `v / 15120`         | f32         |

/// Raw value of a variable width number
#[derive(Debug, Clone, Copy, PartialEq)]
enum Raw {
    /// 7 bit value of one byte encoding
    One(u32),
    /// 14 bit value of two byte encoding
    Two(u32),
    /// Full 32 bits of four byte encoding, including the width tag
    Four(u32),
}

fn decode_raw(src: &[u8]) -> Option<(Raw, usize)> {
    let b0 = *src.first()?;
    if b0 & 0x01 == 0 {
        Some((Raw::One((b0 >> 1) as u32), 1))
    } else if b0 & 0x02 == 0 {
        let bytes = src.get(..2)?;
        let value = u16::from_le_bytes([bytes[0], bytes[1]]);
        Some((Raw::Two((value >> 2) as u32), 2))
    } else {
        let bytes = src.get(..4)?;
        let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Some((Raw::Four(value), 4))
    }
}

/// Decode natural number, returns the value and the number of consumed bytes
pub fn decode_natural(src: &[u8]) -> Option<(u32, usize)> {
    let (raw, size) = decode_raw(src)?;
    let value = match raw {
        Raw::One(v) | Raw::Two(v) => v,
        Raw::Four(v) => v >> 2,
    };
    Some((value, size))
}

/// Decode real number, returns the value and the number of consumed bytes
pub fn decode_real(src: &[u8]) -> Option<(f32, usize)> {
    let (raw, size) = decode_raw(src)?;
    let value = match raw {
        Raw::One(v) | Raw::Two(v) => v as f32,
        Raw::Four(v) => f32::from_bits(v & !0x03),
    };
    Some((value, size))
}

/// Decode coordinate number, returns the value and the number of consumed bytes
pub fn decode_coordinate(src: &[u8]) -> Option<(f32, usize)> {
    let (raw, size) = decode_raw(src)?;
    let value = match raw {
        Raw::One(v) => v as f32 - 64.0,
        Raw::Two(v) => v as f32 / 64.0 - 128.0,
        Raw::Four(v) => f32::from_bits(v & !0x03),
    };
    Some((value, size))
}

/// Decode zero-to-one number, returns the value and the number of consumed bytes
pub fn decode_zero_to_one(src: &[u8]) -> Option<(f32, usize)> {
    let (raw, size) = decode_raw(src)?;
    let value = match raw {
        Raw::One(v) => v as f32 / 120.0,
        Raw::Two(v) => v as f32 / 15120.0,
        Raw::Four(v) => f32::from_bits(v & !0x03),
    };
    Some((value, size))
}

/// Encoded bytes of a variable width number
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NumberBytes {
    buf: [u8; 4],
    len: usize,
}

impl NumberBytes {
    fn one(value: u32) -> Self {
        Self {
            buf: [(value << 1) as u8, 0, 0, 0],
            len: 1,
        }
    }

    fn two(value: u32) -> Self {
        let [b0, b1] = ((value << 2) as u16 | 0x01).to_le_bytes();
        Self {
            buf: [b0, b1, 0, 0],
            len: 2,
        }
    }

    fn four(bits: u32) -> Self {
        Self {
            buf: (bits | 0x03).to_le_bytes(),
            len: 4,
        }
    }

    fn float(value: f32) -> Self {
        Self::four(value.to_bits() & !0x03)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for NumberBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NumberBytes({:02x?})", self.as_bytes())
    }
}

/// Encode natural number, fails if it does not fit into 30 bits
pub fn encode_natural(value: u32) -> Option<NumberBytes> {
    if value < 1 << 7 {
        Some(NumberBytes::one(value))
    } else if value < 1 << 14 {
        Some(NumberBytes::two(value))
    } else if value < 1 << 30 {
        Some(NumberBytes::four(value << 2))
    } else {
        None
    }
}

/// Pick the smallest exact encoding among the candidates, falls back to four
/// byte float which loses two least significant bits of the mantissa
fn encode_with(
    value: f32,
    decode: fn(&[u8]) -> Option<(f32, usize)>,
    candidates: [Option<NumberBytes>; 2],
) -> NumberBytes {
    candidates
        .into_iter()
        .flatten()
        .find(|bytes| {
            decode(bytes.as_bytes()).map(|(decoded, _)| decoded.to_bits()) == Some(value.to_bits())
        })
        .unwrap_or_else(|| NumberBytes::float(value))
}

/// Integer value in `[0, limit)` range, if `value` is one
fn as_index(value: f32, limit: u32) -> Option<u32> {
    if value >= 0.0 && value < limit as f32 && value.fract() == 0.0 {
        Some(value as u32)
    } else {
        None
    }
}

/// Encode real number
pub fn encode_real(value: f32) -> NumberBytes {
    encode_with(
        value,
        decode_real,
        [
            as_index(value, 1 << 7).map(NumberBytes::one),
            as_index(value, 1 << 14).map(NumberBytes::two),
        ],
    )
}

/// Encode coordinate number
pub fn encode_coordinate(value: f32) -> NumberBytes {
    encode_with(
        value,
        decode_coordinate,
        [
            as_index(value + 64.0, 1 << 7).map(NumberBytes::one),
            as_index((value + 128.0) * 64.0, 1 << 14).map(NumberBytes::two),
        ],
    )
}

/// Encode zero-to-one number
pub fn encode_zero_to_one(value: f32) -> NumberBytes {
    encode_with(
        value,
        decode_zero_to_one,
        [
            as_index(value * 120.0, 1 << 7).map(NumberBytes::one),
            as_index(value * 15120.0, 1 << 14).map(NumberBytes::two),
        ],
    )
}
