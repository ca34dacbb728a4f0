//! Canvas logging every call it receives
use crate::{Canvas, Error, Paint, PaintKind, Palette, Point, Rectangle, Scalar, scalar_fmt};
use std::{
    fmt,
    io::{self, Write},
};

/// Canvas that writes one line per call to the sink and forwards the call to
/// the wrapped canvas
///
/// Without a sink nothing is logged. Without a wrapped canvas every call
/// succeeds, except `end_decode` which returns its `result` argument.
pub struct DebugCanvas<'a, W> {
    sink: Option<W>,
    prefix: String,
    wrapped: Option<&'a mut dyn Canvas>,
}

impl<W> fmt::Debug for DebugCanvas<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugCanvas")
            .field("prefix", &self.prefix)
            .field("has_sink", &self.sink.is_some())
            .field("has_wrapped", &self.wrapped.is_some())
            .finish()
    }
}

impl<'a, W: Write> DebugCanvas<'a, W> {
    pub fn new(
        sink: Option<W>,
        prefix: impl Into<String>,
        wrapped: Option<&'a mut dyn Canvas>,
    ) -> Self {
        Self {
            sink,
            prefix: prefix.into(),
            wrapped,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sink(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    pub fn into_sink(self) -> Option<W> {
        self.sink
    }

    fn log(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = &mut self.sink {
            if let Err(error) = writeln!(sink, "{}{}", self.prefix, args) {
                tracing::warn!("[DebugCanvas] failed to write: {}", error);
            }
        }
    }
}

macro_rules! forward {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self.wrapped.as_mut() {
            Some(wrapped) => wrapped.$method($($arg),*),
            None => Ok(()),
        }
    };
}

/// Scalar formatted the same way as coordinates
struct Num(Scalar);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        scalar_fmt(f, self.0)
    }
}

/// Color with all four channels, alpha included
struct Hex([u8; 4]);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

fn describe_paint(paint: &Paint<'_>) -> String {
    match paint.kind() {
        PaintKind::FlatColor(color) => {
            format!("flat_color{{{}}}", Hex(paint.resolve(*color).to_rgba()))
        }
        kind @ (PaintKind::LinearGradient(gradient) | PaintKind::RadialGradient(gradient)) => {
            let stops: Vec<String> = paint
                .resolved_stops()
                .map(|(offset, color)| format!("{}:{}", Num(offset), Hex(color.to_rgba())))
                .collect();
            format!(
                "{}{{spread={:?}, stops=[{}]}}",
                kind.name(),
                gradient.spread,
                stops.join(" ")
            )
        }
        PaintKind::Invalid => "invalid".to_owned(),
    }
}

fn describe_result(result: &Result<(), Error>) -> String {
    match result {
        Ok(()) => "ok".to_owned(),
        Err(error) => format!("\"{}\"", error),
    }
}

impl<W: Write> Canvas for DebugCanvas<'_, W> {
    fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error> {
        self.log(format_args!("begin_decode({})", dst_rect));
        forward!(self, begin_decode(dst_rect))
    }

    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        consumed: usize,
        remaining: usize,
    ) -> Result<(), Error> {
        self.log(format_args!(
            "end_decode({}, {}, {})",
            describe_result(&result),
            consumed,
            remaining
        ));
        match self.wrapped.as_mut() {
            Some(wrapped) => wrapped.end_decode(result, consumed, remaining),
            None => result,
        }
    }

    fn begin_drawing(&mut self) -> Result<(), Error> {
        self.log(format_args!("begin_drawing()"));
        forward!(self, begin_drawing())
    }

    fn end_drawing(&mut self, paint: &Paint<'_>) -> Result<(), Error> {
        self.log(format_args!("end_drawing({})", describe_paint(paint)));
        forward!(self, end_drawing(paint))
    }

    fn begin_path(&mut self, p0: Point) -> Result<(), Error> {
        self.log(format_args!("begin_path({:?})", p0));
        forward!(self, begin_path(p0))
    }

    fn end_path(&mut self) -> Result<(), Error> {
        self.log(format_args!("end_path()"));
        forward!(self, end_path())
    }

    fn path_line_to(&mut self, p1: Point) -> Result<(), Error> {
        self.log(format_args!("path_line_to({:?})", p1));
        forward!(self, path_line_to(p1))
    }

    fn path_quad_to(&mut self, p1: Point, p2: Point) -> Result<(), Error> {
        self.log(format_args!("path_quad_to({:?}, {:?})", p1, p2));
        forward!(self, path_quad_to(p1, p2))
    }

    fn path_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), Error> {
        self.log(format_args!("path_cube_to({:?}, {:?}, {:?})", p1, p2, p3));
        forward!(self, path_cube_to(p1, p2, p3))
    }

    fn path_arc_to(
        &mut self,
        radii: Point,
        x_axis_rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<(), Error> {
        self.log(format_args!(
            "path_arc_to({:?}, {}, {}, {}, {:?})",
            radii,
            Num(x_axis_rotation),
            large_arc,
            sweep,
            p
        ));
        forward!(self, path_arc_to(radii, x_axis_rotation, large_arc, sweep, p))
    }

    fn on_metadata_viewbox(&mut self, viewbox: Rectangle) -> Result<(), Error> {
        self.log(format_args!("on_metadata_viewbox({})", viewbox));
        forward!(self, on_metadata_viewbox(viewbox))
    }

    fn on_metadata_suggested_palette(&mut self, palette: &Palette) -> Result<(), Error> {
        let colors: Vec<String> = palette
            .colors()
            .iter()
            .map(|color| Hex(color.to_rgba()).to_string())
            .collect();
        self.log(format_args!(
            "on_metadata_suggested_palette({})",
            colors.join(" ")
        ));
        forward!(self, on_metadata_suggested_palette(palette))
    }
}

/// Debug canvas logging to standard error
impl DebugCanvas<'_, io::Stderr> {
    pub fn stderr(prefix: impl Into<String>) -> Self {
        Self::new(Some(io::stderr()), prefix, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BrokenCanvas, Color, DecodeOptions, Encoder, GradientStop, RGBA, Recorder, Spread,
        decode,
    };

    fn square() -> Result<Vec<u8>, Error> {
        let mut encoder = Encoder::new();
        encoder
            .set_creg(0, false, RGBA::new(0x40, 0x80, 0xc0, 0xff).into())?
            .start_path(0, Point::new(0.0, 0.0))?
            .abs_line_to(Point::new(8.0, 0.0))?
            .abs_line_to(Point::new(8.0, 8.0))?
            .close_path_end_path()?;
        encoder.into_bytes()
    }

    fn lines(canvas: DebugCanvas<'_, Vec<u8>>) -> Vec<String> {
        let output = canvas.into_sink().unwrap_or_default();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_log() -> Result<(), Error> {
        let mut canvas = DebugCanvas::new(Some(Vec::new()), "dbg: ", None);
        decode(
            &mut canvas,
            Rectangle::DEFAULT_VIEWBOX,
            &square()?,
            &DecodeOptions::default(),
        )?;
        assert_eq!(
            lines(canvas),
            [
                "dbg: begin_decode({-32, -32, 32, 32})",
                "dbg: begin_drawing()",
                "dbg: begin_path(0,0)",
                "dbg: path_line_to(8,0)",
                "dbg: path_line_to(8,8)",
                "dbg: end_path()",
                "dbg: end_drawing(flat_color{#4080c0ff})",
                "dbg: end_decode(ok, 16, 0)",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_log_metadata_and_gradient() -> Result<(), Error> {
        let mut encoder = Encoder::new();
        encoder
            .set_viewbox(Rectangle::new(0.0, 0.0, 64.0, 64.0))?
            .set_suggested_palette(&[RGBA::new(0xff, 0x00, 0x00, 0xff)])?
            .set_csel(2)?
            .set_linear_gradient(
                10,
                20,
                Point::new(0.0, 0.0),
                Point::new(64.0, 0.0),
                Spread::Repeat,
                &[
                    GradientStop::new(0.0, Color::palette_index(0)),
                    GradientStop::new(1.0, RGBA::TRANSPARENT),
                ],
            )?
            .start_path(0, Point::new(0.0, 0.0))?
            .abs_arc_to(Point::new(4.0, 4.0), 0.0, true, false, Point::new(8.0, 0.0))?
            .close_path_end_path()?;
        let mut canvas = DebugCanvas::new(Some(Vec::new()), "", None);
        decode(
            &mut canvas,
            Rectangle::new(0.0, 0.0, 64.0, 64.0),
            &encoder.into_bytes()?,
            &DecodeOptions::default(),
        )?;
        let lines = lines(canvas);
        assert_eq!(lines[1], "on_metadata_viewbox({0, 0, 64, 64})");
        assert!(lines[2].starts_with("on_metadata_suggested_palette(#ff0000ff #000000ff"));
        assert_eq!(lines[4], "begin_path(0,0)");
        assert_eq!(lines[5], "path_arc_to(4,4, 0, true, false, 8,0)");
        assert_eq!(
            lines[7],
            "end_drawing(linear_gradient{spread=Repeat, stops=[0:#ff0000ff 1:#00000000]})"
        );
        Ok(())
    }

    #[test]
    fn test_forward() -> Result<(), Error> {
        let bytes = square()?;
        let mut recorder = Recorder::new();
        let mut canvas: DebugCanvas<'_, Vec<u8>> = DebugCanvas::new(None, "", Some(&mut recorder as &mut dyn Canvas));
        decode(
            &mut canvas,
            Rectangle::DEFAULT_VIEWBOX,
            &bytes,
            &DecodeOptions::default(),
        )?;
        assert!(canvas.into_sink().is_none());
        assert_eq!(recorder.drawings().len(), 1);
        assert_eq!(recorder.drawings()[0].path.len(), 4);

        let mut broken = BrokenCanvas::new(Some(Error::Canvas("broken")));
        let mut canvas = DebugCanvas::new(Some(Vec::new()), "", Some(&mut broken as &mut dyn Canvas));
        let result = decode(
            &mut canvas,
            Rectangle::DEFAULT_VIEWBOX,
            &bytes,
            &DecodeOptions::default(),
        );
        assert_eq!(result, Err(Error::Canvas("broken")));
        assert_eq!(
            lines(canvas),
            ["begin_decode({-32, -32, 32, 32})", "end_decode(\"broken\", 0, 16)"]
        );
        Ok(())
    }

    #[test]
    fn test_end_decode_without_wrapped() {
        let mut canvas: DebugCanvas<'_, Vec<u8>> = DebugCanvas::new(None, "", None);
        assert_eq!(canvas.begin_drawing(), Ok(()));
        assert_eq!(
            canvas.end_decode(Err(Error::BadMagicIdentifier), 0, 3),
            Err(Error::BadMagicIdentifier)
        );
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink is closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failing_sink() -> Result<(), Error> {
        let mut canvas = DebugCanvas::new(Some(FailingSink), "", None);
        decode(
            &mut canvas,
            Rectangle::DEFAULT_VIEWBOX,
            &square()?,
            &DecodeOptions::default(),
        )?;
        Ok(())
    }
}
