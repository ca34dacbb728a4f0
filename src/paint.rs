//! Paints used to fill paths
//!
//! A paint is either a flat color or a gradient. Colors inside a paint may be
//! indirect, [`Paint`] keeps access to the palette and the color registers of
//! the decoder so they can be resolved while the paint is in use.
use crate::{Color, ColorRegisters, Palette, Point, RGBA, Scalar, Transform, utils::clamp};
use std::cmp::Ordering;

/// Gradient spread logic for the parameter smaller than 0 and greater than 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Spread {
    /// Transparent outside of the gradient
    #[default]
    None,
    /// Use the same colors as the edge of the gradient
    Pad,
    /// Repeat gradient but alternate reflected and non reflectet versions
    Reflect,
    /// Repeat gradient
    Repeat,
}

impl Spread {
    /// Spread from its two bit encoding
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::None,
            1 => Self::Pad,
            2 => Self::Reflect,
            _ => Self::Repeat,
        }
    }

    /// Two bit encoding of the spread
    pub fn bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Pad => 1,
            Self::Reflect => 2,
            Self::Repeat => 3,
        }
    }

    /// Map gradient parameter value to the range of [0, 1], `None` if the
    /// parameter lies outside of the painted area
    pub fn at(self, t: Scalar) -> Option<Scalar> {
        match self {
            Self::None if !(0.0..=1.0).contains(&t) => None,
            Self::None | Self::Pad => Some(clamp(t, 0.0, 1.0)),
            Self::Repeat => Some(t.rem_euclid(1.0)),
            Self::Reflect => Some(((t + 1.0).rem_euclid(2.0) - 1.0).abs()),
        }
    }
}

/// Specifies color at a particular parameter offset of the gradient
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientStop {
    pub offset: Scalar,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: Scalar, color: impl Into<Color>) -> Self {
        Self {
            offset,
            color: color.into(),
        }
    }
}

/// Linear or radial gradient
///
/// `transform` maps canvas space onto pattern space. In pattern space linear
/// gradients run along x axis from 0 to 1 and radial gradients are centered
/// at the origin with the unit radius.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gradient {
    pub transform: Transform,
    pub spread: Spread,
    pub stops: Vec<GradientStop>,
}

/// What a path is filled with
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaintKind {
    FlatColor(Color),
    LinearGradient(Gradient),
    RadialGradient(Gradient),
    /// Color register holds neither a premultiplied color nor a gradient
    Invalid,
}

impl PaintKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlatColor(_) => "flat_color",
            Self::LinearGradient(_) => "linear_gradient",
            Self::RadialGradient(_) => "radial_gradient",
            Self::Invalid => "invalid",
        }
    }
}

/// Paint together with the color context it was created in
#[derive(Debug, Clone)]
pub struct Paint<'a> {
    kind: PaintKind,
    palette: &'a Palette,
    registers: &'a ColorRegisters,
}

impl<'a> Paint<'a> {
    pub fn new(kind: PaintKind, palette: &'a Palette, registers: &'a ColorRegisters) -> Self {
        Self {
            kind,
            palette,
            registers,
        }
    }

    pub fn kind(&self) -> &PaintKind {
        &self.kind
    }

    pub fn palette(&self) -> &'a Palette {
        self.palette
    }

    pub fn registers(&self) -> &'a ColorRegisters {
        self.registers
    }

    /// Resolve color in the context of this paint
    pub fn resolve(&self, color: Color) -> RGBA {
        color.resolve(self.palette, self.registers)
    }

    /// Resolved color of the flat color paint
    pub fn flat_color(&self) -> Option<RGBA> {
        match self.kind {
            PaintKind::FlatColor(color) => Some(self.resolve(color)),
            _ => None,
        }
    }

    /// Gradient of the linear or radial gradient paint
    pub fn gradient(&self) -> Option<&Gradient> {
        match &self.kind {
            PaintKind::LinearGradient(gradient) | PaintKind::RadialGradient(gradient) => {
                Some(gradient)
            }
            _ => None,
        }
    }

    /// Gradient stops with resolved colors
    pub fn resolved_stops(&self) -> impl Iterator<Item = (Scalar, RGBA)> + '_ {
        self.gradient()
            .into_iter()
            .flat_map(|gradient| gradient.stops.iter())
            .map(|stop| (stop.offset, self.resolve(stop.color)))
    }

    /// Color of the paint at the point given in canvas space
    ///
    /// Colors between gradient stops are interpolated in premultiplied space.
    pub fn color_at(&self, point: Point) -> RGBA {
        let (gradient, t) = match &self.kind {
            PaintKind::FlatColor(color) => return self.resolve(*color),
            PaintKind::Invalid => return RGBA::TRANSPARENT,
            PaintKind::LinearGradient(gradient) => {
                (gradient, gradient.transform.apply(point).x())
            }
            PaintKind::RadialGradient(gradient) => {
                (gradient, gradient.transform.apply(point).length())
            }
        };
        match gradient.spread.at(t) {
            Some(t) => self.stops_at(&gradient.stops, t),
            None => RGBA::TRANSPARENT,
        }
    }

    fn stops_at(&self, stops: &[GradientStop], t: Scalar) -> RGBA {
        let index = stops
            .binary_search_by(|stop| {
                if stop.offset < t {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
            .unwrap_or_else(|index| index);
        let size = stops.len();
        if size == 0 {
            RGBA::TRANSPARENT
        } else if index == 0 {
            self.resolve(stops[0].color)
        } else if index == size {
            self.resolve(stops[size - 1].color)
        } else {
            let s0 = &stops[index - 1];
            let s1 = &stops[index];
            let ratio = clamp((t - s0.offset) / (s1.offset - s0.offset), 0.0, 1.0);
            let c0 = self.resolve(s0.color).to_f32();
            let c1 = self.resolve(s1.color).to_f32();
            let mut out = [0u8; 4];
            for (o, (v0, v1)) in out.iter_mut().zip(c0.into_iter().zip(c1)) {
                *o = ((v0 + (v1 - v0) * ratio) * 255.0).round() as u8;
            }
            RGBA(out)
        }
    }
}
