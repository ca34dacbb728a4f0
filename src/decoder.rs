//! IconVG decoder
//!
//! Decoder is a small virtual machine that reads the magic identifier, the
//! metadata chunks and then a sequence of styling and drawing opcodes, and
//! translates them into [`Canvas`] calls.
use crate::{
    CANVAS_OPS_COUNT, Canvas, Color, ColorRegisters, Error, Gradient, GradientStop, Paint,
    PaintKind, Palette, Point, RGBA, Rectangle, Scalar, Spread, Transform, decode_color1,
    decode_color2, decode_color3_direct, decode_color3_indirect, decode_color4,
    number::{decode_coordinate, decode_natural, decode_real, decode_zero_to_one},
};

/// Magic identifier every IconVG graphic starts with
pub const MAGIC: [u8; 4] = [0x89, 0x49, 0x56, 0x47];

/// Metadata identifier of the view box chunk
pub(crate) const MID_VIEWBOX: u32 = 0;

/// Metadata identifier of the suggested palette chunk
pub(crate) const MID_SUGGESTED_PALETTE: u32 = 1;

/// Number of number registers
const NREG_SIZE: usize = 64;

/// Caller provided decoding options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOptions {
    /// Custom palette, takes precedence over the suggested palette of the graphic
    pub palette: Option<Palette>,
    /// Height used to select paths by their level of detail, defaults to the
    /// height of the destination rectangle
    pub height_in_pixels: Option<Scalar>,
}

impl DecodeOptions {
    pub fn with_palette(self, palette: Palette) -> Self {
        Self {
            palette: Some(palette),
            ..self
        }
    }

    pub fn with_height_in_pixels(self, height: Scalar) -> Self {
        Self {
            height_in_pixels: Some(height),
            ..self
        }
    }
}

/// Decode IconVG graphic onto the canvas
///
/// Graphic is scaled so its view box fills `dst_rect`. Returned value is the
/// value returned by [`Canvas::end_decode`], which always receives the result
/// of decoding and the number of consumed and remaining bytes. If the canvas
/// implements too few operations, fails with [`Error::UnsupportedVtable`]
/// without calling the canvas at all.
pub fn decode(
    canvas: &mut dyn Canvas,
    dst_rect: Rectangle,
    src: &[u8],
    options: &DecodeOptions,
) -> Result<(), Error> {
    let _span = tracing::debug_span!("[decode]", size = src.len()).entered();
    if canvas.ops_count() < CANVAS_OPS_COUNT {
        tracing::debug!("[decode:vtable] ops_count={}", canvas.ops_count());
        return Err(Error::UnsupportedVtable);
    }
    let mut decoder = Decoder::new(src, dst_rect, options);
    let result = canvas
        .begin_decode(dst_rect)
        .and_then(|_| decoder.run(canvas));
    if let Err(error) = result {
        tracing::debug!(
            "[decode:error] {} state={:?} offset={}",
            error,
            decoder.state,
            decoder.reader.consumed()
        );
    }
    canvas.end_decode(
        result,
        decoder.reader.consumed(),
        decoder.reader.remaining(),
    )
}

/// Decode only the view box of the graphic, without drawing anything
///
/// Graphics without an explicit view box get [`Rectangle::DEFAULT_VIEWBOX`].
pub fn decode_viewbox(src: &[u8]) -> Result<Rectangle, Error> {
    let mut reader = Reader::new(src);
    reader.magic()?;
    if reader.is_empty() {
        return Ok(Rectangle::DEFAULT_VIEWBOX);
    }
    let count = reader.natural(Error::BadMetadata)?;
    if count == 0 {
        return Ok(Rectangle::DEFAULT_VIEWBOX);
    }
    let (mid, mut chunk) = reader.chunk()?;
    if mid == MID_VIEWBOX {
        parse_viewbox(&mut chunk)
    } else {
        Ok(Rectangle::DEFAULT_VIEWBOX)
    }
}

/// Progress of the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitMagic,
    AwaitMetadata,
    AwaitOpcodes,
    Done,
    Errored(Error),
}

/// Cursor over the input bytes
#[derive(Debug, Clone)]
struct Reader<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a [u8] {
        &self.src[self.pos..]
    }

    fn consumed(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.src.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn byte(&mut self) -> Option<u8> {
        let byte = *self.src.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn array<const N: usize>(&mut self, error: Error) -> Result<[u8; N], Error> {
        let bytes = self.rest().get(..N).ok_or(error)?;
        let array = <[u8; N]>::try_from(bytes).map_err(|_| error)?;
        self.pos += N;
        Ok(array)
    }

    fn take(&mut self, size: usize, error: Error) -> Result<Reader<'a>, Error> {
        let bytes = self.rest().get(..size).ok_or(error)?;
        self.pos += size;
        Ok(Reader::new(bytes))
    }

    fn number<T>(
        &mut self,
        decode: fn(&[u8]) -> Option<(T, usize)>,
        error: Error,
    ) -> Result<T, Error> {
        let (value, size) = decode(self.rest()).ok_or(error)?;
        self.pos += size;
        Ok(value)
    }

    fn natural(&mut self, error: Error) -> Result<u32, Error> {
        self.number(decode_natural, error)
    }

    fn real(&mut self) -> Result<Scalar, Error> {
        self.number(decode_real, Error::BadNumber)
    }

    fn coordinate(&mut self, error: Error) -> Result<Scalar, Error> {
        self.number(decode_coordinate, error)
    }

    fn zero_to_one(&mut self) -> Result<Scalar, Error> {
        self.number(decode_zero_to_one, Error::BadNumber)
    }

    fn point(&mut self) -> Result<Point, Error> {
        let x = self.coordinate(Error::BadCoordinate)?;
        let y = self.coordinate(Error::BadCoordinate)?;
        Ok(Point::new(x, y))
    }

    fn magic(&mut self) -> Result<(), Error> {
        if !self.rest().starts_with(&MAGIC) {
            return Err(Error::BadMagicIdentifier);
        }
        self.pos += MAGIC.len();
        Ok(())
    }

    /// Metadata chunk identifier and a reader over its payload
    fn chunk(&mut self) -> Result<(u32, Reader<'a>), Error> {
        let size = self.natural(Error::BadMetadata)?;
        let mut chunk = self.take(size as usize, Error::BadMetadata)?;
        let mid = chunk.natural(Error::BadMetadata)?;
        Ok((mid, chunk))
    }
}

fn parse_viewbox(chunk: &mut Reader<'_>) -> Result<Rectangle, Error> {
    let mut coords = [0.0; 4];
    for coord in coords.iter_mut() {
        *coord = chunk.coordinate(Error::BadMetadataViewbox)?;
    }
    let [min_x, min_y, max_x, max_y] = coords;
    if !coords.iter().all(|c| c.is_finite()) || min_x > max_x || min_y > max_y {
        return Err(Error::BadMetadataViewbox);
    }
    if !chunk.is_empty() {
        return Err(Error::BadMetadata);
    }
    Ok(Rectangle::new(min_x, min_y, max_x, max_y))
}

fn parse_suggested_palette(chunk: &mut Reader<'_>) -> Result<Palette, Error> {
    let error = Error::BadMetadataSuggestedPalette;
    let header = chunk.byte().ok_or(error)?;
    let count = (header & 0x3f) as usize + 1;
    let width = (header >> 6) + 1;
    let mut palette = Palette::default();
    for entry in palette.0[..count].iter_mut() {
        let color = match width {
            1 => match decode_color1(chunk.byte().ok_or(error)?) {
                color @ Color::Direct(_) => color,
                _ => return Err(error),
            },
            2 => decode_color2(chunk.array(error)?),
            3 => decode_color3_direct(chunk.array(error)?),
            _ => decode_color4(chunk.array(error)?),
        };
        let Color::Direct(rgba) = color else {
            return Err(error);
        };
        if !rgba.is_valid_premul() {
            return Err(error);
        }
        *entry = rgba;
    }
    if !chunk.is_empty() {
        return Err(Error::BadMetadata);
    }
    Ok(palette)
}

/// Last curve of the path, used to reflect control points of smooth curves
#[derive(Debug, Clone, Copy)]
enum Smooth {
    None,
    Quad(Point),
    Cube(Point),
}

struct Decoder<'a> {
    reader: Reader<'a>,
    state: State,
    dst_rect: Rectangle,
    custom_palette: bool,
    palette: Palette,
    creg: ColorRegisters,
    nreg: [Scalar; NREG_SIZE],
    csel: u8,
    nsel: u8,
    lod0: Scalar,
    lod1: Scalar,
    height: Scalar,
    /// Maps view box onto destination rectangle
    transform: Transform,
}

impl<'a> Decoder<'a> {
    fn new(src: &'a [u8], dst_rect: Rectangle, options: &DecodeOptions) -> Self {
        Self {
            reader: Reader::new(src),
            state: State::AwaitMagic,
            dst_rect,
            custom_palette: options.palette.is_some(),
            palette: options.palette.unwrap_or_default(),
            creg: ColorRegisters::default(),
            nreg: [0.0; NREG_SIZE],
            csel: 0,
            nsel: 0,
            lod0: 0.0,
            lod1: Scalar::INFINITY,
            height: options.height_in_pixels.unwrap_or(dst_rect.height()),
            transform: Transform::fit(Rectangle::DEFAULT_VIEWBOX, dst_rect),
        }
    }

    /// Advance the state machine until it is done or has failed
    fn run(&mut self, canvas: &mut dyn Canvas) -> Result<(), Error> {
        loop {
            let step = match self.state {
                State::AwaitMagic => self.reader.magic().map(|_| State::AwaitMetadata),
                State::AwaitMetadata => self
                    .decode_metadata(canvas)
                    .map(|_| State::AwaitOpcodes),
                State::AwaitOpcodes => self.decode_styling(canvas).map(|_| State::Done),
                State::Done => return Ok(()),
                State::Errored(error) => return Err(error),
            };
            self.state = step.unwrap_or_else(State::Errored);
        }
    }

    fn decode_metadata(&mut self, canvas: &mut dyn Canvas) -> Result<(), Error> {
        if self.reader.is_empty() {
            return Ok(());
        }
        let count = self.reader.natural(Error::BadMetadata)?;
        let mut prev_mid: Option<u32> = None;
        for _ in 0..count {
            let (mid, mut chunk) = self.reader.chunk()?;
            if prev_mid.is_some_and(|prev_mid| mid <= prev_mid) {
                return Err(Error::BadMetadataIdOrder);
            }
            prev_mid = Some(mid);
            match mid {
                MID_VIEWBOX => {
                    let viewbox = parse_viewbox(&mut chunk)?;
                    self.transform = Transform::fit(viewbox, self.dst_rect);
                    canvas.on_metadata_viewbox(viewbox)?;
                }
                MID_SUGGESTED_PALETTE => {
                    let palette = parse_suggested_palette(&mut chunk)?;
                    if !self.custom_palette {
                        self.palette = palette;
                    }
                    canvas.on_metadata_suggested_palette(&palette)?;
                }
                _ => return Err(Error::BadMetadata),
            }
        }
        Ok(())
    }

    fn decode_styling(&mut self, canvas: &mut dyn Canvas) -> Result<(), Error> {
        while let Some(op) = self.reader.byte() {
            tracing::trace!("[decode:styling] {:#04x}", op);
            let adj = op & 0x07;
            match op {
                0x00..=0x3f => self.csel = op & 0x3f,
                0x40..=0x7f => self.nsel = op & 0x3f,
                0x80..=0xa7 => {
                    let error = Error::BadColor;
                    let color = match op {
                        0x80..=0x87 => decode_color1(self.reader.byte().ok_or(error)?),
                        0x88..=0x8f => decode_color2(self.reader.array(error)?),
                        0x90..=0x97 => decode_color3_direct(self.reader.array(error)?),
                        0x98..=0x9f => decode_color4(self.reader.array(error)?),
                        _ => decode_color3_indirect(self.reader.array(error)?),
                    };
                    let rgba = color.resolve(&self.palette, &self.creg);
                    self.creg[self.csel.wrapping_sub(adj % 7)] = rgba;
                    if adj == 7 {
                        self.csel = (self.csel + 1) & 0x3f;
                    }
                }
                0xa8..=0xbf => {
                    let value = match op {
                        0xa8..=0xaf => self.reader.real()?,
                        0xb0..=0xb7 => self.reader.coordinate(Error::BadNumber)?,
                        _ => self.reader.zero_to_one()?,
                    };
                    self.nreg[(self.nsel.wrapping_sub(adj % 7) & 0x3f) as usize] = value;
                    if adj == 7 {
                        self.nsel = (self.nsel + 1) & 0x3f;
                    }
                }
                0xc0..=0xc6 => {
                    let fill = self.csel.wrapping_sub(adj) & 0x3f;
                    let start = self.reader.point()?;
                    self.decode_drawing(canvas, fill, start)?;
                }
                0xc7 => {
                    self.lod0 = self.reader.real()?;
                    self.lod1 = self.reader.real()?;
                }
                _ => return Err(Error::BadStylingOpcode),
            }
        }
        Ok(())
    }

    fn decode_drawing(
        &mut self,
        canvas: &mut dyn Canvas,
        fill: u8,
        start: Point,
    ) -> Result<(), Error> {
        let visible = self.lod0 <= self.height && self.height < self.lod1;
        let mut path = PathEmitter {
            canvas,
            transform: self.transform,
            visible,
        };
        path.begin_drawing(start)?;

        let mut current = start;
        let mut subpath_start = start;
        let mut smooth = Smooth::None;
        loop {
            let op = self.reader.byte().ok_or(Error::BadPathUnfinished)?;
            tracing::trace!("[decode:drawing] {:#04x}", op);
            let relative = op & 0x10 != 0;
            let offset = |current: Point, p: Point, relative: bool| {
                if relative { current + p } else { p }
            };
            match op {
                0x00..=0x3f => {
                    let relative = op >= 0x20;
                    for _ in 0..(op & 0x1f) + 1 {
                        let p1 = offset(current, self.reader.point()?, relative);
                        path.line_to(p1)?;
                        current = p1;
                    }
                    smooth = Smooth::None;
                }
                0x40..=0x5f => {
                    for _ in 0..(op & 0x0f) + 1 {
                        let p1 = match smooth {
                            Smooth::Quad(ctrl) => 2.0 * current - ctrl,
                            _ => current,
                        };
                        let p2 = offset(current, self.reader.point()?, relative);
                        path.quad_to(p1, p2)?;
                        current = p2;
                        smooth = Smooth::Quad(p1);
                    }
                }
                0x60..=0x7f => {
                    for _ in 0..(op & 0x0f) + 1 {
                        let p1 = offset(current, self.reader.point()?, relative);
                        let p2 = offset(current, self.reader.point()?, relative);
                        path.quad_to(p1, p2)?;
                        current = p2;
                        smooth = Smooth::Quad(p1);
                    }
                }
                0x80..=0x9f => {
                    for _ in 0..(op & 0x0f) + 1 {
                        let p1 = match smooth {
                            Smooth::Cube(ctrl) => 2.0 * current - ctrl,
                            _ => current,
                        };
                        let p2 = offset(current, self.reader.point()?, relative);
                        let p3 = offset(current, self.reader.point()?, relative);
                        path.cube_to(p1, p2, p3)?;
                        current = p3;
                        smooth = Smooth::Cube(p2);
                    }
                }
                0xa0..=0xbf => {
                    for _ in 0..(op & 0x0f) + 1 {
                        let p1 = offset(current, self.reader.point()?, relative);
                        let p2 = offset(current, self.reader.point()?, relative);
                        let p3 = offset(current, self.reader.point()?, relative);
                        path.cube_to(p1, p2, p3)?;
                        current = p3;
                        smooth = Smooth::Cube(p2);
                    }
                }
                0xc0..=0xdf => {
                    for _ in 0..(op & 0x0f) + 1 {
                        let radii = self.reader.point()?;
                        let rotation = self.reader.zero_to_one()? * 2.0 * crate::PI;
                        let flags = self.reader.natural(Error::BadNumber)?;
                        let p = offset(current, self.reader.point()?, relative);
                        path.arc_to(radii, rotation, flags & 0x01 != 0, flags & 0x02 != 0, p)?;
                        current = p;
                    }
                    smooth = Smooth::None;
                }
                0xe1 => {
                    let paint = Paint::new(self.paint_kind(fill), &self.palette, &self.creg);
                    return path.end_drawing(&paint);
                }
                0xe2 | 0xe3 => {
                    let p = offset(subpath_start, self.reader.point()?, op == 0xe3);
                    path.move_to(p)?;
                    current = p;
                    subpath_start = p;
                    smooth = Smooth::None;
                }
                0xe6..=0xe9 => {
                    let value = self.reader.coordinate(Error::BadCoordinate)?;
                    let p1 = match op {
                        0xe6 => Point::new(value, current.y()),
                        0xe7 => Point::new(current.x() + value, current.y()),
                        0xe8 => Point::new(current.x(), value),
                        _ => Point::new(current.x(), current.y() + value),
                    };
                    path.line_to(p1)?;
                    current = p1;
                    smooth = Smooth::None;
                }
                _ => return Err(Error::BadDrawingOpcode),
            }
        }
    }

    /// Classify value of the fill color register
    fn paint_kind(&self, fill: u8) -> PaintKind {
        let rgba = self.creg[fill];
        if rgba.is_valid_premul() {
            return PaintKind::FlatColor(Color::register_index(fill));
        }
        let RGBA([r, g, b, a]) = rgba;
        if a != 0 || b & 0x80 == 0 {
            return PaintKind::Invalid;
        }
        let nstops = r & 0x3f;
        let cbase = g & 0x3f;
        let nbase = b & 0x3f;
        let nreg = |index: u8| self.nreg[(index & 0x3f) as usize];
        let pattern = Transform([
            nreg(nbase.wrapping_sub(6)),
            nreg(nbase.wrapping_sub(5)),
            nreg(nbase.wrapping_sub(4)),
            nreg(nbase.wrapping_sub(3)),
            nreg(nbase.wrapping_sub(2)),
            nreg(nbase.wrapping_sub(1)),
        ]);
        // pattern matrix expects view box coordinates
        let transform = match self.transform.invert() {
            Some(inverse) => pattern.matmul(inverse),
            None => pattern,
        };
        let gradient = Gradient {
            transform,
            spread: Spread::from_bits(g >> 6),
            stops: (0..nstops)
                .map(|i| GradientStop {
                    offset: nreg(nbase.wrapping_add(i)),
                    color: Color::register_index(cbase.wrapping_add(i)),
                })
                .collect(),
        };
        if b & 0x40 == 0 {
            PaintKind::LinearGradient(gradient)
        } else {
            PaintKind::RadialGradient(gradient)
        }
    }
}

/// Forwards path segments to the canvas in destination coordinates, unless
/// the path is filtered out by its level of detail
struct PathEmitter<'c> {
    canvas: &'c mut dyn Canvas,
    transform: Transform,
    visible: bool,
}

impl PathEmitter<'_> {
    fn begin_drawing(&mut self, p0: Point) -> Result<(), Error> {
        if self.visible {
            self.canvas.begin_drawing()?;
            self.canvas.begin_path(self.transform.apply(p0))?;
        }
        Ok(())
    }

    fn end_drawing(&mut self, paint: &Paint<'_>) -> Result<(), Error> {
        if self.visible {
            self.canvas.end_path()?;
            self.canvas.end_drawing(paint)?;
        }
        Ok(())
    }

    fn move_to(&mut self, p0: Point) -> Result<(), Error> {
        if self.visible {
            self.canvas.end_path()?;
            self.canvas.begin_path(self.transform.apply(p0))?;
        }
        Ok(())
    }

    fn line_to(&mut self, p1: Point) -> Result<(), Error> {
        if self.visible {
            self.canvas.path_line_to(self.transform.apply(p1))?;
        }
        Ok(())
    }

    fn quad_to(&mut self, p1: Point, p2: Point) -> Result<(), Error> {
        if self.visible {
            let tr = self.transform;
            self.canvas.path_quad_to(tr.apply(p1), tr.apply(p2))?;
        }
        Ok(())
    }

    fn cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), Error> {
        if self.visible {
            let tr = self.transform;
            self.canvas
                .path_cube_to(tr.apply(p1), tr.apply(p2), tr.apply(p3))?;
        }
        Ok(())
    }

    fn arc_to(
        &mut self,
        radii: Point,
        rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<(), Error> {
        if self.visible {
            let Point([rx, ry]) = self.transform.apply_vector(radii);
            let radii = Point::new(rx.abs(), ry.abs());
            self.canvas.path_arc_to(
                radii,
                rotation,
                large_arc,
                sweep,
                self.transform.apply(p),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrokenCanvas;

    /// Canvas logging every call as a line of text
    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
        fail_on: Option<&'static str>,
        ops_count: Option<usize>,
    }

    impl Log {
        fn push(&mut self, call: String) -> Result<(), Error> {
            let name = call.split('(').next().unwrap_or_default().to_owned();
            self.calls.push(call);
            match self.fail_on {
                Some(fail_on) if fail_on == name => Err(Error::Canvas("log: fail")),
                _ => Ok(()),
            }
        }
    }

    impl Canvas for Log {
        fn ops_count(&self) -> usize {
            self.ops_count.unwrap_or(CANVAS_OPS_COUNT)
        }

        fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error> {
            self.push(format!("begin_decode({})", dst_rect))
        }

        fn end_decode(
            &mut self,
            result: Result<(), Error>,
            consumed: usize,
            remaining: usize,
        ) -> Result<(), Error> {
            self.push(format!("end_decode({:?}, {}, {})", result, consumed, remaining))?;
            result
        }

        fn begin_drawing(&mut self) -> Result<(), Error> {
            self.push("begin_drawing()".to_owned())
        }

        fn end_drawing(&mut self, paint: &Paint<'_>) -> Result<(), Error> {
            let call = match paint.flat_color() {
                Some(color) => format!("end_drawing({})", color),
                None => format!("end_drawing({})", paint.kind().name()),
            };
            self.push(call)
        }

        fn begin_path(&mut self, p0: Point) -> Result<(), Error> {
            self.push(format!("begin_path({:?})", p0))
        }

        fn end_path(&mut self) -> Result<(), Error> {
            self.push("end_path()".to_owned())
        }

        fn path_line_to(&mut self, p1: Point) -> Result<(), Error> {
            self.push(format!("path_line_to({:?})", p1))
        }

        fn path_quad_to(&mut self, p1: Point, p2: Point) -> Result<(), Error> {
            self.push(format!("path_quad_to({:?} {:?})", p1, p2))
        }

        fn path_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), Error> {
            self.push(format!("path_cube_to({:?} {:?} {:?})", p1, p2, p3))
        }

        fn path_arc_to(
            &mut self,
            radii: Point,
            x_axis_rotation: Scalar,
            large_arc: bool,
            sweep: bool,
            p: Point,
        ) -> Result<(), Error> {
            self.push(format!(
                "path_arc_to({:?} {:.4} {} {} {:?})",
                radii, x_axis_rotation, large_arc, sweep, p
            ))
        }

        fn on_metadata_viewbox(&mut self, viewbox: Rectangle) -> Result<(), Error> {
            self.push(format!("on_metadata_viewbox({})", viewbox))
        }

        fn on_metadata_suggested_palette(&mut self, palette: &Palette) -> Result<(), Error> {
            self.push(format!("on_metadata_suggested_palette({})", palette[0]))
        }
    }

    fn stream(body: &[u8]) -> Vec<u8> {
        let mut stream = MAGIC.to_vec();
        stream.extend_from_slice(body);
        stream
    }

    fn run(dst_rect: Rectangle, src: &[u8], options: &DecodeOptions) -> (Result<(), Error>, Vec<String>) {
        let mut log = Log::default();
        let result = decode(&mut log, dst_rect, src, options);
        (result, log.calls)
    }

    // CREG[0] = 38 (#4080c0), path from (0, 0) with two lines
    const TRIANGLE: &[u8] = &[
        0x00, 0x80, 0x26, 0xc0, 0x80, 0x80, 0x01, 0x90, 0x80, 0x90, 0x90, 0xe1,
    ];

    #[test]
    fn test_magic_only() {
        let src = stream(&[]);
        let dst = Rectangle::new(0.0, 0.0, 64.0, 64.0);
        let (result, calls) = run(dst, &src, &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(
            calls,
            vec!["begin_decode({0, 0, 64, 64})", "end_decode(Ok(()), 4, 0)"]
        );
    }

    #[test]
    fn test_states() {
        let dst = Rectangle::new(0.0, 0.0, 64.0, 64.0);
        let options = DecodeOptions::default();
        let cases: [(Vec<u8>, State); 4] = [
            (stream(TRIANGLE), State::Done),
            (vec![0x89, 0x49], State::Errored(Error::BadMagicIdentifier)),
            (stream(&[0x02]), State::Errored(Error::BadMetadata)),
            (stream(&[0x00, 0xff]), State::Errored(Error::BadStylingOpcode)),
        ];
        for (src, expected) in cases {
            let mut log = Log::default();
            let mut decoder = Decoder::new(&src, dst, &options);
            let result = decoder.run(&mut log);
            assert_eq!(decoder.state, expected);
            assert_eq!(result.err(), match expected {
                State::Errored(error) => Some(error),
                _ => None,
            });
            // finished decoder does not consume anything else
            let consumed = decoder.reader.consumed();
            assert_eq!(decoder.run(&mut log), result);
            assert_eq!(decoder.reader.consumed(), consumed);
        }
    }

    #[test]
    fn test_bad_magic() {
        let cases: [&[u8]; 3] = [&[0x89, 0x49, 0x56], &[0x89, 0x49, 0x56, 0x48, 0x00], &[]];
        for src in cases {
            let (result, calls) = run(Rectangle::EMPTY, src, &DecodeOptions::default());
            assert_eq!(result, Err(Error::BadMagicIdentifier));
            assert_eq!(calls.len(), 2);
            assert_eq!(
                calls[1],
                format!("end_decode(Err(BadMagicIdentifier), 0, {})", src.len())
            );
        }
    }

    #[test]
    fn test_path() {
        let src = stream(TRIANGLE);
        let (result, calls) = run(Rectangle::DEFAULT_VIEWBOX, &src, &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(
            calls,
            vec![
                "begin_decode({-32, -32, 32, 32})",
                "begin_drawing()",
                "begin_path(0,0)",
                "path_line_to(8,0)",
                "path_line_to(8,8)",
                "end_path()",
                "end_drawing(#4080c0)",
                "end_decode(Ok(()), 16, 0)",
            ]
        );
    }

    #[test]
    fn test_dst_rect_mapping() {
        let src = stream(TRIANGLE);
        let dst = Rectangle::new(0.0, 0.0, 128.0, 64.0);
        let (_, calls) = run(dst, &src, &DecodeOptions::default());
        assert_eq!(calls[2], "begin_path(64,32)");
        assert_eq!(calls[3], "path_line_to(80,32)");
        assert_eq!(calls[4], "path_line_to(80,40)");

        // zero width destination collapses x axis
        let dst = Rectangle::new(1.0, 0.0, 1.0, 64.0);
        let (_, calls) = run(dst, &src, &DecodeOptions::default());
        assert_eq!(calls[3], "path_line_to(1,32)");
    }

    #[test]
    fn test_viewbox() {
        // view box (-16, -16, 16, 16)
        let src = stream(&[0x02, 0x0a, 0x00, 0x60, 0x60, 0xa0, 0xa0]);
        assert_eq!(
            decode_viewbox(&src),
            Ok(Rectangle::new(-16.0, -16.0, 16.0, 16.0))
        );
        assert_eq!(decode_viewbox(&stream(&[])), Ok(Rectangle::DEFAULT_VIEWBOX));
        assert_eq!(decode_viewbox(&stream(&[0x00])), Ok(Rectangle::DEFAULT_VIEWBOX));
        assert_eq!(decode_viewbox(&[0x00]), Err(Error::BadMagicIdentifier));
        // suggested palette only
        assert_eq!(
            decode_viewbox(&stream(&[0x02, 0x06, 0x02, 0x00, 0x26])),
            Ok(Rectangle::DEFAULT_VIEWBOX)
        );

        let mut src = src;
        src.extend_from_slice(TRIANGLE);
        let dst = Rectangle::new(0.0, 0.0, 64.0, 64.0);
        let (result, calls) = run(dst, &src, &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(calls[1], "on_metadata_viewbox({-16, -16, 16, 16})");
        assert_eq!(calls[3], "begin_path(32,32)");
        assert_eq!(calls[4], "path_line_to(48,32)");
    }

    #[test]
    fn test_bad_viewbox() {
        // inverted x axis
        let src = stream(&[0x02, 0x0a, 0x00, 0xa0, 0x60, 0x60, 0xa0]);
        assert_eq!(decode_viewbox(&src), Err(Error::BadMetadataViewbox));
        let (result, _) = run(Rectangle::EMPTY, &src, &DecodeOptions::default());
        assert_eq!(result, Err(Error::BadMetadataViewbox));
        // truncated
        let src = stream(&[0x02, 0x06, 0x00, 0x60, 0x60]);
        assert_eq!(decode_viewbox(&src), Err(Error::BadMetadataViewbox));
        // chunk is longer than the input
        let src = stream(&[0x02, 0x0a, 0x00, 0x60]);
        assert_eq!(decode_viewbox(&src), Err(Error::BadMetadata));
    }

    #[test]
    fn test_metadata_errors() {
        let cases: [(&[u8], Error); 5] = [
            // palette before view box
            (
                &[
                    0x04, 0x06, 0x02, 0x00, 0x26, 0x0a, 0x00, 0x60, 0x60, 0xa0, 0xa0,
                ],
                Error::BadMetadataIdOrder,
            ),
            // unknown metadata id
            (&[0x02, 0x02, 0x04], Error::BadMetadata),
            // indirect color in one byte palette
            (&[0x02, 0x06, 0x02, 0x00, 0x85], Error::BadMetadataSuggestedPalette),
            // not premultiplied
            (
                &[0x02, 0x0c, 0x02, 0xc0, 0xff, 0x00, 0x00, 0x80],
                Error::BadMetadataSuggestedPalette,
            ),
            // truncated palette
            (&[0x02, 0x06, 0x02, 0x01, 0x26], Error::BadMetadataSuggestedPalette),
        ];
        for (body, error) in cases {
            let (result, calls) = run(Rectangle::EMPTY, &stream(body), &DecodeOptions::default());
            assert_eq!(result, Err(error));
            assert!(calls.last().unwrap().starts_with("end_decode(Err"));
        }
    }

    #[test]
    fn test_suggested_palette() {
        // palette [#4080c0ff, #80808080], CREG[0] = palette[1]
        let mut src = stream(&[0x02, 0x08, 0x02, 0x01, 0x26, 0x7e]);
        src.extend_from_slice(&[0x80, 0x81, 0xc0, 0x80, 0x80, 0xe1]);
        let (result, calls) = run(Rectangle::DEFAULT_VIEWBOX, &src, &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(calls[1], "on_metadata_suggested_palette(#4080c0)");
        assert_eq!(calls[5], "end_drawing(#80808080)");

        // custom palette wins over suggested one
        let mut custom = Palette::default();
        custom[1] = RGBA::new(0x10, 0x10, 0x10, 0x10);
        let options = DecodeOptions::default().with_palette(custom);
        let (_, calls) = run(Rectangle::DEFAULT_VIEWBOX, &src, &options);
        assert_eq!(calls[1], "on_metadata_suggested_palette(#4080c0)");
        assert_eq!(calls[5], "end_drawing(#10101010)");
    }

    #[test]
    fn test_truncated_operands() {
        let cases: [(&[u8], Error, usize); 7] = [
            (&[0x00, 0x80], Error::BadColor, 6),
            (&[0x00, 0x98, 0x00, 0x00], Error::BadColor, 6),
            (&[0x00, 0xa8], Error::BadNumber, 6),
            (&[0x00, 0xc7, 0x00], Error::BadNumber, 7),
            (&[0x00, 0xc0, 0x80], Error::BadCoordinate, 7),
            (&[0x00, 0xc0, 0x80, 0x80, 0x01, 0x90], Error::BadCoordinate, 10),
            (&[0x00, 0xc0, 0x80, 0x80, 0x01, 0x90, 0x80, 0x90, 0x90], Error::BadPathUnfinished, 13),
        ];
        for (body, error, consumed) in cases {
            let src = stream(body);
            let (result, calls) = run(Rectangle::EMPTY, &src, &DecodeOptions::default());
            assert_eq!(result, Err(error));
            assert_eq!(
                calls.last().unwrap(),
                &format!("end_decode(Err({:?}), {}, {})", error, consumed, src.len() - consumed)
            );
        }
    }

    #[test]
    fn test_bad_opcodes() {
        let (result, _) = run(Rectangle::EMPTY, &stream(&[0x00, 0xc8]), &DecodeOptions::default());
        assert_eq!(result, Err(Error::BadStylingOpcode));
        let (result, _) = run(
            Rectangle::EMPTY,
            &stream(&[0x00, 0xc0, 0x80, 0x80, 0xe0]),
            &DecodeOptions::default(),
        );
        assert_eq!(result, Err(Error::BadDrawingOpcode));
    }

    /// One `begin_decode` first, one `end_decode` last, paths never nest and
    /// are closed before the end of drawing
    fn check_sequence(calls: &[String]) {
        assert!(calls.first().unwrap().starts_with("begin_decode"), "{:?}", calls);
        assert!(calls.last().unwrap().starts_with("end_decode"), "{:?}", calls);
        let mut path_open = false;
        let mut drawing_open = false;
        for call in &calls[1..calls.len() - 1] {
            let name = call.split('(').next().unwrap();
            match name {
                "begin_drawing" => {
                    assert!(!drawing_open, "{:?}", calls);
                    drawing_open = true;
                }
                "end_drawing" => {
                    assert!(drawing_open && !path_open, "{:?}", calls);
                    drawing_open = false;
                }
                "begin_path" => {
                    assert!(drawing_open && !path_open, "{:?}", calls);
                    path_open = true;
                }
                "end_path" => {
                    assert!(path_open, "{:?}", calls);
                    path_open = false;
                }
                name if name.starts_with("path_") => assert!(path_open, "{:?}", calls),
                name => assert!(name.starts_with("on_metadata") && !drawing_open, "{:?}", calls),
            }
        }
    }

    #[test]
    fn test_byte_accounting() {
        let src = stream(TRIANGLE);
        for len in 0..=src.len() {
            let mut log = Log::default();
            let _ = decode(&mut log, Rectangle::DEFAULT_VIEWBOX, &src[..len], &DecodeOptions::default());
            let last = log.calls.last().unwrap();
            let counts: Vec<usize> = last
                .trim_end_matches(')')
                .rsplit(", ")
                .take(2)
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(counts[0] + counts[1], len, "{}", last);
            check_sequence(&log.calls);
        }
    }

    #[test]
    fn test_curves() {
        let body = [
            0x00, 0x80, 0x26, 0xc0, 0x80, 0x80,
            // Q (8, 0) (8, 8)
            0x60, 0x90, 0x80, 0x90, 0x90,
            // T (0, 8)
            0x40, 0x80, 0x90,
            // l (-8, -8)
            0x20, 0x70, 0x70,
            // s (8, 0) (8, 8), no previous cube so first control is current
            0x90, 0x90, 0x80, 0x90, 0x90,
            // H 0, v 8
            0xe6, 0x80, 0xe9, 0x90,
            // a (8, 8) quarter turn, large and sweep, (8, 0)
            0xd0, 0x90, 0x90, 0x3c, 0x06, 0x90, 0x80,
            // close and move relative to subpath start (0, 0)
            0xe3, 0x90, 0x90,
            0xe1,
        ];
        let (result, calls) = run(Rectangle::DEFAULT_VIEWBOX, &stream(&body), &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(
            &calls[2..calls.len() - 1],
            &[
                "begin_path(0,0)",
                "path_quad_to(8,0 8,8)",
                "path_quad_to(8,16 0,8)",
                "path_line_to(-8,0)",
                "path_cube_to(-8,0 0,0 0,8)",
                "path_line_to(0,8)",
                "path_line_to(0,16)",
                "path_arc_to(8,8 1.5708 true true 8,16)",
                "end_path()",
                "begin_path(8,8)",
                "end_path()",
                "end_drawing(#4080c0)",
            ]
        );
    }

    #[test]
    fn test_lod() {
        // LOD [0, 32)
        let mut body = vec![0x00, 0xc7, 0x00, 0x40];
        body.extend_from_slice(&TRIANGLE[1..]);
        let src = stream(&body);
        let dst = Rectangle::new(0.0, 0.0, 64.0, 64.0);

        let (result, calls) = run(dst, &src, &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(calls.len(), 2);

        let options = DecodeOptions::default().with_height_in_pixels(16.0);
        let (result, calls) = run(dst, &src, &options);
        assert_eq!(result, Ok(()));
        assert_eq!(calls.len(), 8);

        let small = Rectangle::new(0.0, 0.0, 16.0, 16.0);
        let (_, calls) = run(small, &src, &DecodeOptions::default());
        assert_eq!(calls.len(), 8);
    }

    #[test]
    fn test_selectors() {
        // CREG[CSEL - 7] with ADJ 7 writes CREG[CSEL] and increments CSEL
        let body = [
            0x00, 0x05, 0x87, 0x26, 0x87, 0x7e,
            // start path with CREG[CSEL - 1] = CREG[6]
            0xc1, 0x80, 0x80, 0xe1,
            // start path with CREG[CSEL - 2] = CREG[5]
            0xc2, 0x80, 0x80, 0xe1,
        ];
        let (result, calls) = run(Rectangle::DEFAULT_VIEWBOX, &stream(&body), &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        let paints: Vec<_> = calls.iter().filter(|c| c.starts_with("end_drawing")).collect();
        assert_eq!(paints, ["end_drawing(#80808080)", "end_drawing(#4080c0)"]);
    }

    #[test]
    fn test_invalid_paint() {
        // #ff000080 is neither premultiplied nor a gradient
        let body = [0x00, 0x98, 0xff, 0x00, 0x00, 0x80, 0xc0, 0x80, 0x80, 0xe1];
        let (result, calls) = run(Rectangle::DEFAULT_VIEWBOX, &stream(&body), &DecodeOptions::default());
        assert_eq!(result, Ok(()));
        assert_eq!(calls[4], "end_drawing(invalid)");
    }

    #[test]
    fn test_canvas_errors() {
        let src = stream(TRIANGLE);
        let mut log = Log {
            fail_on: Some("path_line_to"),
            ..Log::default()
        };
        let result = decode(&mut log, Rectangle::DEFAULT_VIEWBOX, &src, &DecodeOptions::default());
        assert_eq!(result, Err(Error::Canvas("log: fail")));
        assert_eq!(log.calls.len(), 5);
        assert!(log.calls[4].starts_with("end_decode(Err(Canvas(\"log: fail\")), 13, 3)"));

        let mut broken = BrokenCanvas::new(Some(Error::InvalidArgument));
        let result = decode(&mut broken, Rectangle::DEFAULT_VIEWBOX, &src, &DecodeOptions::default());
        assert_eq!(result, Err(Error::InvalidArgument));

        let mut log = Log {
            ops_count: Some(CANVAS_OPS_COUNT - 1),
            ..Log::default()
        };
        let result = decode(&mut log, Rectangle::DEFAULT_VIEWBOX, &src, &DecodeOptions::default());
        assert_eq!(result, Err(Error::UnsupportedVtable));
        assert!(log.calls.is_empty());
    }
}
