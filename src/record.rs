//! Canvas capturing decoded drawings as plain data
use crate::{
    Canvas, EllipArc, Error, Paint, PaintKind, Palette, Point, RGBA, Rectangle, Scalar, Spread,
    Transform, scalar_fmt,
};
use std::fmt;

/// Color substituted for invalid paints
pub const INVALID_PAINT_PLACEHOLDER: RGBA = RGBA::new(0x60, 0x20, 0x60, 0x80);

/// Path command in destination coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    ArcTo {
        radii: Point,
        /// rotation in radians
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        dst: Point,
    },
    /// Close subpath, point is the start of the closed subpath
    Close(Point),
}

impl PathCmd {
    /// Destination point of the command
    pub fn dst(&self) -> Point {
        use PathCmd::*;
        *match self {
            MoveTo(dst) => dst,
            LineTo(dst) => dst,
            QuadTo(_, dst) => dst,
            CubicTo(_, _, dst) => dst,
            ArcTo { dst, .. } => dst,
            Close(dst) => dst,
        }
    }
}

/// SVG path data of the command, arc rotation is in degrees
impl fmt::Display for PathCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PathCmd::*;
        match self {
            MoveTo(p) => write!(f, "M{:?}", p),
            LineTo(p) => write!(f, "L{:?}", p),
            QuadTo(p1, p2) => write!(f, "Q{:?} {:?}", p1, p2),
            CubicTo(p1, p2, p3) => write!(f, "C{:?} {:?} {:?}", p1, p2, p3),
            ArcTo {
                radii,
                x_axis_rot,
                large,
                sweep,
                dst,
            } => {
                write!(f, "A{:?} ", radii)?;
                scalar_fmt(f, x_axis_rot.to_degrees())?;
                write!(f, " {},{} {:?}", *large as u8, *sweep as u8, dst)
            }
            Close(_) => write!(f, "Z"),
        }
    }
}

/// Paint with all colors resolved
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordedPaint {
    Flat(RGBA),
    Linear {
        transform: Transform,
        spread: Spread,
        stops: Vec<(Scalar, RGBA)>,
    },
    Radial {
        transform: Transform,
        spread: Spread,
        stops: Vec<(Scalar, RGBA)>,
    },
}

impl RecordedPaint {
    /// Capture paint, `None` for an invalid paint
    pub fn from_paint(paint: &Paint<'_>) -> Option<Self> {
        let stops = || paint.resolved_stops().collect();
        match paint.kind() {
            PaintKind::FlatColor(color) => Some(Self::Flat(paint.resolve(*color))),
            PaintKind::LinearGradient(gradient) => Some(Self::Linear {
                transform: gradient.transform,
                spread: gradient.spread,
                stops: stops(),
            }),
            PaintKind::RadialGradient(gradient) => Some(Self::Radial {
                transform: gradient.transform,
                spread: gradient.spread,
                stops: stops(),
            }),
            PaintKind::Invalid => None,
        }
    }
}

/// Filled path
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Drawing {
    pub path: Vec<PathCmd>,
    pub paint: RecordedPaint,
}

impl Drawing {
    /// SVG path data of the drawing
    pub fn to_svg_path(&self) -> String {
        let mut output = String::new();
        for cmd in self.path.iter() {
            if !output.is_empty() {
                output.push(' ');
            }
            output.push_str(&cmd.to_string());
        }
        output
    }
}

/// Recorder configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecorderOptions {
    /// Lower quads and arcs to cubic curves
    pub cubics_only: bool,
    /// Fill paths with invalid paint with [`INVALID_PAINT_PLACEHOLDER`]
    /// instead of failing with [`Error::InvalidPaintType`]
    pub placeholder_for_invalid_paint: bool,
}

impl RecorderOptions {
    pub fn with_cubics_only(self, cubics_only: bool) -> Self {
        Self {
            cubics_only,
            ..self
        }
    }

    pub fn with_placeholder_for_invalid_paint(self, placeholder: bool) -> Self {
        Self {
            placeholder_for_invalid_paint: placeholder,
            ..self
        }
    }
}

/// Canvas that records everything the decoder produces
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Recorder {
    #[cfg_attr(feature = "serde", serde(skip))]
    options: RecorderOptions,
    dst_rect: Option<Rectangle>,
    viewbox: Option<Rectangle>,
    suggested_palette: Option<Palette>,
    drawings: Vec<Drawing>,
    consumed: usize,
    remaining: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    path: Vec<PathCmd>,
    #[cfg_attr(feature = "serde", serde(skip))]
    subpath_start: Point,
    #[cfg_attr(feature = "serde", serde(skip))]
    current: Point,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RecorderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> RecorderOptions {
        self.options
    }

    /// Destination rectangle given to the decoder
    pub fn dst_rect(&self) -> Option<Rectangle> {
        self.dst_rect
    }

    /// View box from the metadata
    pub fn viewbox(&self) -> Option<Rectangle> {
        self.viewbox
    }

    /// Suggested palette from the metadata
    pub fn suggested_palette(&self) -> Option<&Palette> {
        self.suggested_palette.as_ref()
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn into_drawings(self) -> Vec<Drawing> {
        self.drawings
    }

    /// Number of bytes consumed and left unconsumed by the decoder
    pub fn byte_counts(&self) -> (usize, usize) {
        (self.consumed, self.remaining)
    }

    /// Serialize recording to JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn push(&mut self, cmd: PathCmd) {
        self.current = cmd.dst();
        self.path.push(cmd);
    }
}

impl Canvas for Recorder {
    fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error> {
        self.dst_rect = Some(dst_rect);
        self.viewbox = None;
        self.suggested_palette = None;
        self.drawings.clear();
        self.path.clear();
        Ok(())
    }

    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        consumed: usize,
        remaining: usize,
    ) -> Result<(), Error> {
        self.consumed = consumed;
        self.remaining = remaining;
        self.path.clear();
        result
    }

    fn begin_drawing(&mut self) -> Result<(), Error> {
        self.path.clear();
        Ok(())
    }

    fn end_drawing(&mut self, paint: &Paint<'_>) -> Result<(), Error> {
        let paint = match RecordedPaint::from_paint(paint) {
            Some(paint) => paint,
            None if self.options.placeholder_for_invalid_paint => {
                RecordedPaint::Flat(INVALID_PAINT_PLACEHOLDER)
            }
            None => return Err(Error::InvalidPaintType),
        };
        let path = std::mem::take(&mut self.path);
        self.drawings.push(Drawing { path, paint });
        Ok(())
    }

    fn begin_path(&mut self, p0: Point) -> Result<(), Error> {
        self.subpath_start = p0;
        self.push(PathCmd::MoveTo(p0));
        Ok(())
    }

    fn end_path(&mut self) -> Result<(), Error> {
        self.push(PathCmd::Close(self.subpath_start));
        Ok(())
    }

    fn path_line_to(&mut self, p1: Point) -> Result<(), Error> {
        self.push(PathCmd::LineTo(p1));
        Ok(())
    }

    fn path_quad_to(&mut self, p1: Point, p2: Point) -> Result<(), Error> {
        if self.options.cubics_only {
            let p0 = self.current;
            let c1 = p0 + (2.0 / 3.0) * (p1 - p0);
            let c2 = p2 + (2.0 / 3.0) * (p1 - p2);
            self.push(PathCmd::CubicTo(c1, c2, p2));
        } else {
            self.push(PathCmd::QuadTo(p1, p2));
        }
        Ok(())
    }

    fn path_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), Error> {
        self.push(PathCmd::CubicTo(p1, p2, p3));
        Ok(())
    }

    fn path_arc_to(
        &mut self,
        radii: Point,
        x_axis_rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<(), Error> {
        if !self.options.cubics_only {
            self.push(PathCmd::ArcTo {
                radii,
                x_axis_rot: x_axis_rotation,
                large: large_arc,
                sweep,
                dst: p,
            });
            return Ok(());
        }
        let src = self.current;
        match EllipArc::new_param(src, p, radii, x_axis_rotation, large_arc, sweep) {
            Some(arc) => {
                for [_, p1, p2, p3] in arc.to_cubics() {
                    self.push(PathCmd::CubicTo(p1, p2, p3));
                }
            }
            // zero radius arc is a straight line, arc to itself is nothing
            None if src != p => self.push(PathCmd::LineTo(p)),
            None => {}
        }
        Ok(())
    }

    fn on_metadata_viewbox(&mut self, viewbox: Rectangle) -> Result<(), Error> {
        self.viewbox = Some(viewbox);
        Ok(())
    }

    fn on_metadata_suggested_palette(&mut self, palette: &Palette) -> Result<(), Error> {
        self.suggested_palette = Some(*palette);
        Ok(())
    }
}
