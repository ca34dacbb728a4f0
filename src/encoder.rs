//! IconVG encoder
//!
//! [`Encoder`] produces a byte stream accepted by [`crate::decode`]. Metadata
//! is collected first and written out when the first opcode is emitted, all
//! numbers and colors use their smallest exact encoding.
use crate::{
    Color, ColorEncoding, Error, GradientStop, MAGIC, PALETTE_SIZE, Point, RGBA, Rectangle,
    Scalar, Spread, Transform,
    decoder::{MID_SUGGESTED_PALETTE, MID_VIEWBOX},
    encode_color1, encode_color2, encode_color3_direct,
    number::{NumberBytes, encode_coordinate, encode_natural, encode_real, encode_zero_to_one},
};

/// Maximum number of segments sharing a single line opcode
const LINE_REPEAT_LIMIT: u8 = 32;

/// Maximum number of segments sharing any other curve opcode
const CURVE_REPEAT_LIMIT: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Metadata,
    Styling,
    Drawing,
}

/// Last emitted drawing opcode, extended while the same segment kind repeats
#[derive(Debug, Clone, Copy)]
struct Repeat {
    opcode: u8,
    offset: usize,
    count: u8,
}

/// Encoder of IconVG graphics
#[derive(Debug, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
    mode: Mode,
    viewbox: Option<Rectangle>,
    suggested_palette: Option<Vec<RGBA>>,
    csel: u8,
    nsel: u8,
    repeat: Option<Repeat>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: MAGIC.to_vec(),
            mode: Mode::Metadata,
            viewbox: None,
            suggested_palette: None,
            csel: 0,
            nsel: 0,
            repeat: None,
        }
    }

    /// Current value of the color register selector
    pub fn csel(&self) -> u8 {
        self.csel
    }

    /// Current value of the number register selector
    pub fn nsel(&self) -> u8 {
        self.nsel
    }

    /// Encoded graphic
    pub fn bytes(&self) -> Result<Vec<u8>, Error> {
        self.clone().into_bytes()
    }

    /// Encoded graphic, fails if a path is not finished
    pub fn into_bytes(mut self) -> Result<Vec<u8>, Error> {
        match self.mode {
            Mode::Drawing => Err(Error::InvalidEncoderState),
            Mode::Metadata => {
                self.write_metadata()?;
                Ok(self.buf)
            }
            Mode::Styling => Ok(self.buf),
        }
    }

    // ---------------------------------------------------------------------
    // metadata
    // ---------------------------------------------------------------------

    /// Set view box, only allowed before any opcode
    pub fn set_viewbox(&mut self, viewbox: Rectangle) -> Result<&mut Self, Error> {
        self.expect_mode(Mode::Metadata)?;
        let Rectangle {
            min_x,
            min_y,
            max_x,
            max_y,
        } = viewbox;
        let finite = [min_x, min_y, max_x, max_y].iter().all(|c| c.is_finite());
        if !finite || min_x > max_x || min_y > max_y {
            return Err(Error::InvalidArgument);
        }
        self.viewbox = Some(viewbox);
        Ok(self)
    }

    /// Set suggested palette of 1 to 64 premultiplied colors, only allowed
    /// before any opcode
    pub fn set_suggested_palette(&mut self, colors: &[RGBA]) -> Result<&mut Self, Error> {
        self.expect_mode(Mode::Metadata)?;
        if colors.is_empty()
            || colors.len() > PALETTE_SIZE
            || !colors.iter().all(|c| c.is_valid_premul())
        {
            return Err(Error::InvalidArgument);
        }
        self.suggested_palette = Some(colors.to_vec());
        Ok(self)
    }

    fn write_metadata(&mut self) -> Result<(), Error> {
        let mut chunks = Vec::new();
        if let Some(viewbox) = self.viewbox {
            let mut chunk = natural(MID_VIEWBOX)?.as_bytes().to_vec();
            for value in [viewbox.min_x, viewbox.min_y, viewbox.max_x, viewbox.max_y] {
                chunk.extend_from_slice(encode_coordinate(value).as_bytes());
            }
            chunks.push(chunk);
        }
        if let Some(colors) = &self.suggested_palette {
            let mut chunk = natural(MID_SUGGESTED_PALETTE)?.as_bytes().to_vec();
            let (width, encoded) = encode_palette(colors);
            chunk.push((width - 1) << 6 | (colors.len() - 1) as u8);
            chunk.extend(encoded);
            chunks.push(chunk);
        }
        self.buf
            .extend_from_slice(natural(chunks.len() as u32)?.as_bytes());
        for chunk in chunks {
            self.buf
                .extend_from_slice(natural(chunk.len() as u32)?.as_bytes());
            self.buf.extend(chunk);
        }
        self.mode = Mode::Styling;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // styling
    // ---------------------------------------------------------------------

    fn styling(&mut self) -> Result<(), Error> {
        match self.mode {
            Mode::Metadata => self.write_metadata(),
            Mode::Styling => Ok(()),
            Mode::Drawing => Err(Error::InvalidEncoderState),
        }
    }

    /// Set color register selector
    pub fn set_csel(&mut self, csel: u8) -> Result<&mut Self, Error> {
        self.styling()?;
        if csel > 0x3f {
            return Err(Error::InvalidArgument);
        }
        self.buf.push(csel);
        self.csel = csel;
        Ok(self)
    }

    /// Set number register selector
    pub fn set_nsel(&mut self, nsel: u8) -> Result<&mut Self, Error> {
        self.styling()?;
        if nsel > 0x3f {
            return Err(Error::InvalidArgument);
        }
        self.buf.push(0x40 | nsel);
        self.nsel = nsel;
        Ok(self)
    }

    /// Opcode selector adjustment, `incr` writes register at the selector and
    /// increments the selector afterwards
    fn adjustment(adj: u8, incr: bool) -> Result<u8, Error> {
        match (adj, incr) {
            (0, true) => Ok(7),
            (0..=6, false) => Ok(adj),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// Set `CREG[CSEL - adj]` to the color
    pub fn set_creg(&mut self, adj: u8, incr: bool, color: Color) -> Result<&mut Self, Error> {
        self.styling()?;
        let adj = Self::adjustment(adj, incr)?;
        let encoding = ColorEncoding::smallest(color);
        let opcode = match encoding {
            ColorEncoding::One(_) => 0x80,
            ColorEncoding::Two(_) => 0x88,
            ColorEncoding::ThreeDirect(_) => 0x90,
            ColorEncoding::Four(_) => 0x98,
            ColorEncoding::ThreeIndirect(_) => 0xa0,
        };
        self.buf.push(opcode | adj);
        self.buf.extend_from_slice(encoding.as_bytes());
        if incr {
            self.csel = (self.csel + 1) & 0x3f;
        }
        Ok(self)
    }

    fn set_nreg(
        &mut self,
        opcode: u8,
        adj: u8,
        incr: bool,
        value: NumberBytes,
    ) -> Result<&mut Self, Error> {
        self.styling()?;
        let adj = Self::adjustment(adj, incr)?;
        self.buf.push(opcode | adj);
        self.buf.extend_from_slice(value.as_bytes());
        if incr {
            self.nsel = (self.nsel + 1) & 0x3f;
        }
        Ok(self)
    }

    /// Set `NREG[NSEL - adj]` to the real number
    pub fn set_nreg_real(&mut self, adj: u8, incr: bool, value: Scalar) -> Result<&mut Self, Error> {
        self.set_nreg(0xa8, adj, incr, encode_real(number(value)?))
    }

    /// Set `NREG[NSEL - adj]` to the coordinate number
    pub fn set_nreg_coordinate(
        &mut self,
        adj: u8,
        incr: bool,
        value: Scalar,
    ) -> Result<&mut Self, Error> {
        self.set_nreg(0xb0, adj, incr, encode_coordinate(number(value)?))
    }

    /// Set `NREG[NSEL - adj]` to the zero-to-one number
    pub fn set_nreg_zero_to_one(
        &mut self,
        adj: u8,
        incr: bool,
        value: Scalar,
    ) -> Result<&mut Self, Error> {
        self.set_nreg(0xb8, adj, incr, encode_zero_to_one(number(value)?))
    }

    /// Set level of detail range `[lod0, lod1)` of the following paths
    pub fn set_lod(&mut self, lod0: Scalar, lod1: Scalar) -> Result<&mut Self, Error> {
        self.styling()?;
        if lod0.is_nan() || lod1.is_nan() || lod0 > lod1 {
            return Err(Error::InvalidArgument);
        }
        self.buf.push(0xc7);
        self.buf.extend_from_slice(encode_real(lod0).as_bytes());
        self.buf.extend_from_slice(encode_real(lod1).as_bytes());
        Ok(self)
    }

    /// Store linear gradient from `p1` to `p2` into `CREG[CSEL]`
    ///
    /// Stop colors occupy `CREG[cbase..]`, gradient matrix `NREG[nbase - 6..nbase]`
    /// and stop offsets `NREG[nbase..]`. Selectors are restored afterwards.
    pub fn set_linear_gradient(
        &mut self,
        cbase: u8,
        nbase: u8,
        p1: Point,
        p2: Point,
        spread: Spread,
        stops: &[GradientStop],
    ) -> Result<&mut Self, Error> {
        let dir = p2 - p1;
        let d = dir.dot(dir);
        if !d.is_normal() {
            return Err(Error::InvalidArgument);
        }
        let Point([dx, dy]) = dir;
        let transform = Transform::new(
            dx / d,
            dy / d,
            -(p1.x() * dx + p1.y() * dy) / d,
            0.0,
            0.0,
            0.0,
        );
        self.set_gradient(cbase, nbase, transform, spread, false, stops)
    }

    /// Store radial gradient centered at `center` into `CREG[CSEL]`, see
    /// [`Encoder::set_linear_gradient`] for register usage
    pub fn set_radial_gradient(
        &mut self,
        cbase: u8,
        nbase: u8,
        center: Point,
        radii: Point,
        spread: Spread,
        stops: &[GradientStop],
    ) -> Result<&mut Self, Error> {
        let Point([rx, ry]) = radii;
        if !rx.is_normal() || !ry.is_normal() {
            return Err(Error::InvalidArgument);
        }
        let transform = Transform::new(
            1.0 / rx,
            0.0,
            -center.x() / rx,
            0.0,
            1.0 / ry,
            -center.y() / ry,
        );
        self.set_gradient(cbase, nbase, transform, spread, true, stops)
    }

    fn set_gradient(
        &mut self,
        cbase: u8,
        nbase: u8,
        transform: Transform,
        spread: Spread,
        radial: bool,
        stops: &[GradientStop],
    ) -> Result<&mut Self, Error> {
        self.styling()?;
        let nstops = stops.len();
        // matrix and stop offsets share the number register file
        if cbase > 0x3f || nbase > 0x3f || nstops == 0 || nstops > PALETTE_SIZE - 6 {
            return Err(Error::InvalidArgument);
        }
        // descriptor register must not be overwritten by stop colors
        let csel = self.csel;
        if (csel.wrapping_sub(cbase) & 0x3f) < nstops as u8 {
            return Err(Error::InvalidArgument);
        }
        let nsel = self.nsel;

        let len = self.buf.len();
        let result = self.write_gradient(cbase, nbase, transform, stops, (csel, nsel));
        if let Err(error) = result {
            tracing::debug!("[encoder:gradient] rolled back: {}", error);
            self.buf.truncate(len);
            self.csel = csel;
            self.nsel = nsel;
            return Err(error);
        }

        let descriptor = RGBA::new(
            nstops as u8,
            cbase | spread.bits() << 6,
            0x80 | (radial as u8) << 6 | nbase,
            0x00,
        );
        self.set_creg(0, false, Color::Direct(descriptor))
    }

    /// Write stop colors, matrix and stop offsets then restore the selectors
    fn write_gradient(
        &mut self,
        cbase: u8,
        nbase: u8,
        transform: Transform,
        stops: &[GradientStop],
        (csel, nsel): (u8, u8),
    ) -> Result<(), Error> {
        self.set_csel(cbase)?;
        for stop in stops {
            self.set_creg(0, true, stop.color)?;
        }
        self.set_nsel(nbase.wrapping_sub(6) & 0x3f)?;
        for value in transform.0 {
            self.set_nreg_real(0, true, value)?;
        }
        for stop in stops {
            self.set_nreg_zero_to_one(0, true, stop.offset)?;
        }
        self.set_csel(csel)?;
        self.set_nsel(nsel)?;
        Ok(())
    }

    /// Start path filled with `CREG[CSEL - adj]` at point `p`
    pub fn start_path(&mut self, adj: u8, p: Point) -> Result<&mut Self, Error> {
        self.styling()?;
        if adj > 6 {
            return Err(Error::InvalidArgument);
        }
        let (x, y) = (coordinate(p.x())?, coordinate(p.y())?);
        self.buf.push(0xc0 | adj);
        self.buf.extend_from_slice(x.as_bytes());
        self.buf.extend_from_slice(y.as_bytes());
        self.mode = Mode::Drawing;
        self.repeat = None;
        Ok(self)
    }

    // ---------------------------------------------------------------------
    // drawing
    // ---------------------------------------------------------------------

    fn drawing(&mut self) -> Result<(), Error> {
        if self.mode != Mode::Drawing {
            return Err(Error::InvalidEncoderState);
        }
        Ok(())
    }

    /// Emit segment opcode, reusing the previous one if it is the same opcode
    /// family and has not reached its repeat limit
    fn segment(&mut self, opcode: u8, limit: u8, operands: &[NumberBytes]) -> Result<(), Error> {
        self.drawing()?;
        match self.repeat {
            Some(Repeat {
                opcode: last,
                offset,
                count,
            }) if last == opcode && count < limit => {
                self.buf[offset] += 1;
                self.repeat = Some(Repeat {
                    opcode,
                    offset,
                    count: count + 1,
                });
            }
            _ => {
                self.repeat = Some(Repeat {
                    opcode,
                    offset: self.buf.len(),
                    count: 1,
                });
                self.buf.push(opcode);
            }
        }
        for operand in operands {
            self.buf.extend_from_slice(operand.as_bytes());
        }
        Ok(())
    }

    fn single(&mut self, opcode: u8, operands: &[NumberBytes]) -> Result<(), Error> {
        self.drawing()?;
        self.repeat = None;
        self.buf.push(opcode);
        for operand in operands {
            self.buf.extend_from_slice(operand.as_bytes());
        }
        Ok(())
    }

    pub fn abs_line_to(&mut self, p: Point) -> Result<&mut Self, Error> {
        self.segment(0x00, LINE_REPEAT_LIMIT, &points([p])?)?;
        Ok(self)
    }

    pub fn rel_line_to(&mut self, p: Point) -> Result<&mut Self, Error> {
        self.segment(0x20, LINE_REPEAT_LIMIT, &points([p])?)?;
        Ok(self)
    }

    pub fn abs_smooth_quad_to(&mut self, p2: Point) -> Result<&mut Self, Error> {
        self.segment(0x40, CURVE_REPEAT_LIMIT, &points([p2])?)?;
        Ok(self)
    }

    pub fn rel_smooth_quad_to(&mut self, p2: Point) -> Result<&mut Self, Error> {
        self.segment(0x50, CURVE_REPEAT_LIMIT, &points([p2])?)?;
        Ok(self)
    }

    pub fn abs_quad_to(&mut self, p1: Point, p2: Point) -> Result<&mut Self, Error> {
        self.segment(0x60, CURVE_REPEAT_LIMIT, &points([p1, p2])?)?;
        Ok(self)
    }

    pub fn rel_quad_to(&mut self, p1: Point, p2: Point) -> Result<&mut Self, Error> {
        self.segment(0x70, CURVE_REPEAT_LIMIT, &points([p1, p2])?)?;
        Ok(self)
    }

    pub fn abs_smooth_cube_to(&mut self, p2: Point, p3: Point) -> Result<&mut Self, Error> {
        self.segment(0x80, CURVE_REPEAT_LIMIT, &points([p2, p3])?)?;
        Ok(self)
    }

    pub fn rel_smooth_cube_to(&mut self, p2: Point, p3: Point) -> Result<&mut Self, Error> {
        self.segment(0x90, CURVE_REPEAT_LIMIT, &points([p2, p3])?)?;
        Ok(self)
    }

    pub fn abs_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<&mut Self, Error> {
        self.segment(0xa0, CURVE_REPEAT_LIMIT, &points([p1, p2, p3])?)?;
        Ok(self)
    }

    pub fn rel_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<&mut Self, Error> {
        self.segment(0xb0, CURVE_REPEAT_LIMIT, &points([p1, p2, p3])?)?;
        Ok(self)
    }

    fn arc_to(
        &mut self,
        opcode: u8,
        radii: Point,
        x_axis_rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<&mut Self, Error> {
        let (rx, ry) = (coordinate(radii.x())?, coordinate(radii.y())?);
        let (x, y) = (coordinate(p.x())?, coordinate(p.y())?);
        let turns = number(x_axis_rotation)?.rem_euclid(2.0 * crate::PI) / (2.0 * crate::PI);
        // tiny negative angles round up to a full turn
        let turns = if turns >= 1.0 { 0.0 } else { turns };
        let flags = natural(large_arc as u32 | (sweep as u32) << 1)?;
        let operands = [rx, ry, encode_zero_to_one(turns), flags, x, y];
        self.segment(opcode, CURVE_REPEAT_LIMIT, &operands)?;
        Ok(self)
    }

    /// Elliptical arc to absolute point, `x_axis_rotation` is in radians
    pub fn abs_arc_to(
        &mut self,
        radii: Point,
        x_axis_rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<&mut Self, Error> {
        self.arc_to(0xc0, radii, x_axis_rotation, large_arc, sweep, p)
    }

    /// Elliptical arc to relative point, `x_axis_rotation` is in radians
    pub fn rel_arc_to(
        &mut self,
        radii: Point,
        x_axis_rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<&mut Self, Error> {
        self.arc_to(0xd0, radii, x_axis_rotation, large_arc, sweep, p)
    }

    pub fn abs_hline_to(&mut self, x: Scalar) -> Result<&mut Self, Error> {
        self.single(0xe6, &[coordinate(x)?])?;
        Ok(self)
    }

    pub fn rel_hline_to(&mut self, dx: Scalar) -> Result<&mut Self, Error> {
        self.single(0xe7, &[coordinate(dx)?])?;
        Ok(self)
    }

    pub fn abs_vline_to(&mut self, y: Scalar) -> Result<&mut Self, Error> {
        self.single(0xe8, &[coordinate(y)?])?;
        Ok(self)
    }

    pub fn rel_vline_to(&mut self, dy: Scalar) -> Result<&mut Self, Error> {
        self.single(0xe9, &[coordinate(dy)?])?;
        Ok(self)
    }

    /// Close current subpath, finish the path and return to styling mode
    pub fn close_path_end_path(&mut self) -> Result<&mut Self, Error> {
        self.single(0xe1, &[])?;
        self.mode = Mode::Styling;
        Ok(self)
    }

    /// Close current subpath and start a new one at absolute point
    pub fn close_path_abs_move_to(&mut self, p: Point) -> Result<&mut Self, Error> {
        self.single(0xe2, &points([p])?)?;
        Ok(self)
    }

    /// Close current subpath and start a new one relative to the start of
    /// the closed subpath
    pub fn close_path_rel_move_to(&mut self, p: Point) -> Result<&mut Self, Error> {
        self.single(0xe3, &points([p])?)?;
        Ok(self)
    }

    fn expect_mode(&self, mode: Mode) -> Result<(), Error> {
        if self.mode != mode {
            return Err(Error::InvalidEncoderState);
        }
        Ok(())
    }
}

fn natural(value: u32) -> Result<NumberBytes, Error> {
    encode_natural(value).ok_or(Error::InvalidArgument)
}

fn number(value: Scalar) -> Result<Scalar, Error> {
    if value.is_nan() {
        return Err(Error::InvalidArgument);
    }
    Ok(value)
}

fn coordinate(value: Scalar) -> Result<NumberBytes, Error> {
    if !value.is_finite() {
        return Err(Error::InvalidArgument);
    }
    Ok(encode_coordinate(value))
}

/// Encoded coordinates of the points, two entries per point
fn points<const N: usize>(points: [Point; N]) -> Result<Vec<NumberBytes>, Error> {
    let mut coords = Vec::with_capacity(2 * N);
    for Point([x, y]) in points {
        coords.push(coordinate(x)?);
        coords.push(coordinate(y)?);
    }
    Ok(coords)
}

/// Smallest common width of the palette colors and their encoding
fn encode_palette(colors: &[RGBA]) -> (u8, Vec<u8>) {
    let direct = |c: &RGBA| Color::Direct(*c);
    let one: Option<Vec<u8>> = colors
        .iter()
        .map(|c| encode_color1(direct(c)).filter(|x| *x < 0x80))
        .collect();
    if let Some(one) = one {
        return (1, one);
    }
    let two: Option<Vec<[u8; 2]>> = colors.iter().map(|c| encode_color2(direct(c))).collect();
    if let Some(two) = two {
        return (2, two.concat());
    }
    let three: Option<Vec<[u8; 3]>> = colors
        .iter()
        .map(|c| encode_color3_direct(direct(c)))
        .collect();
    if let Some(three) = three {
        return (3, three.concat());
    }
    (4, colors.iter().flat_map(|c| c.to_rgba()).collect())
}
