//! Drawing surface contract
//!
//! The decoder drives a [`Canvas`] through a strict call sequence:
//!
//! ```text
//! begin_decode
//!   on_metadata_viewbox?  on_metadata_suggested_palette?
//!   ( begin_drawing
//!       ( begin_path  path_*_to*  end_path )+
//!     end_drawing )*
//! end_decode
//! ```
//!
//! Any error returned by a canvas aborts decoding, the decoder proceeds
//! directly to `end_decode` with that error.
use crate::{Error, Paint, Palette, Point, Rectangle, Scalar};

/// Number of operations defined by [`Canvas`]
pub const CANVAS_OPS_COUNT: usize = 12;

/// Receiver of the drawing operations produced by the decoder
///
/// Coordinates are in the destination space of the `dst_rect` given to
/// `begin_decode`.
pub trait Canvas {
    /// Number of operations this canvas implements
    fn ops_count(&self) -> usize {
        CANVAS_OPS_COUNT
    }

    fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error>;

    /// Called once at the end of decoding, value returned is the result of
    /// the whole decoding
    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        consumed: usize,
        remaining: usize,
    ) -> Result<(), Error>;

    fn begin_drawing(&mut self) -> Result<(), Error>;

    /// Fill all paths since `begin_drawing` with the paint
    fn end_drawing(&mut self, paint: &Paint<'_>) -> Result<(), Error>;

    fn begin_path(&mut self, p0: Point) -> Result<(), Error>;

    /// End path, implicitly closing it
    fn end_path(&mut self) -> Result<(), Error>;

    fn path_line_to(&mut self, p1: Point) -> Result<(), Error>;

    fn path_quad_to(&mut self, p1: Point, p2: Point) -> Result<(), Error>;

    fn path_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), Error>;

    /// Elliptical arc with SVG semantics, `x_axis_rotation` is in radians
    fn path_arc_to(
        &mut self,
        radii: Point,
        x_axis_rotation: Scalar,
        large_arc: bool,
        sweep: bool,
        p: Point,
    ) -> Result<(), Error>;

    fn on_metadata_viewbox(&mut self, _viewbox: Rectangle) -> Result<(), Error> {
        Ok(())
    }

    fn on_metadata_suggested_palette(&mut self, _palette: &Palette) -> Result<(), Error> {
        Ok(())
    }
}

macro_rules! forward_canvas {
    () => {
        fn ops_count(&self) -> usize {
            (**self).ops_count()
        }

        fn begin_decode(&mut self, dst_rect: Rectangle) -> Result<(), Error> {
            (**self).begin_decode(dst_rect)
        }

        fn end_decode(
            &mut self,
            result: Result<(), Error>,
            consumed: usize,
            remaining: usize,
        ) -> Result<(), Error> {
            (**self).end_decode(result, consumed, remaining)
        }

        fn begin_drawing(&mut self) -> Result<(), Error> {
            (**self).begin_drawing()
        }

        fn end_drawing(&mut self, paint: &Paint<'_>) -> Result<(), Error> {
            (**self).end_drawing(paint)
        }

        fn begin_path(&mut self, p0: Point) -> Result<(), Error> {
            (**self).begin_path(p0)
        }

        fn end_path(&mut self) -> Result<(), Error> {
            (**self).end_path()
        }

        fn path_line_to(&mut self, p1: Point) -> Result<(), Error> {
            (**self).path_line_to(p1)
        }

        fn path_quad_to(&mut self, p1: Point, p2: Point) -> Result<(), Error> {
            (**self).path_quad_to(p1, p2)
        }

        fn path_cube_to(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), Error> {
            (**self).path_cube_to(p1, p2, p3)
        }

        fn path_arc_to(
            &mut self,
            radii: Point,
            x_axis_rotation: Scalar,
            large_arc: bool,
            sweep: bool,
            p: Point,
        ) -> Result<(), Error> {
            (**self).path_arc_to(radii, x_axis_rotation, large_arc, sweep, p)
        }

        fn on_metadata_viewbox(&mut self, viewbox: Rectangle) -> Result<(), Error> {
            (**self).on_metadata_viewbox(viewbox)
        }

        fn on_metadata_suggested_palette(&mut self, palette: &Palette) -> Result<(), Error> {
            (**self).on_metadata_suggested_palette(palette)
        }
    };
}

impl<C: Canvas + ?Sized> Canvas for &mut C {
    forward_canvas!();
}

impl<C: Canvas + ?Sized> Canvas for Box<C> {
    forward_canvas!();
}

/// Canvas that fails every operation with the same error
///
/// Without an error it is a canvas that does nothing, see [`BrokenCanvas::nop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokenCanvas {
    error: Option<Error>,
}

impl BrokenCanvas {
    pub fn new(error: Option<Error>) -> Self {
        Self { error }
    }

    /// Canvas that accepts every operation and draws nothing
    pub fn nop() -> Self {
        Self { error: None }
    }

    pub fn error(&self) -> Option<Error> {
        self.error
    }

    fn result(&self) -> Result<(), Error> {
        self.error.map_or(Ok(()), Err)
    }
}

impl Canvas for BrokenCanvas {
    fn begin_decode(&mut self, _dst_rect: Rectangle) -> Result<(), Error> {
        self.result()
    }

    fn end_decode(
        &mut self,
        result: Result<(), Error>,
        _consumed: usize,
        _remaining: usize,
    ) -> Result<(), Error> {
        match self.error {
            Some(error) => Err(error),
            None => result,
        }
    }

    fn begin_drawing(&mut self) -> Result<(), Error> {
        self.result()
    }

    fn end_drawing(&mut self, _paint: &Paint<'_>) -> Result<(), Error> {
        self.result()
    }

    fn begin_path(&mut self, _p0: Point) -> Result<(), Error> {
        self.result()
    }

    fn end_path(&mut self) -> Result<(), Error> {
        self.result()
    }

    fn path_line_to(&mut self, _p1: Point) -> Result<(), Error> {
        self.result()
    }

    fn path_quad_to(&mut self, _p1: Point, _p2: Point) -> Result<(), Error> {
        self.result()
    }

    fn path_cube_to(&mut self, _p1: Point, _p2: Point, _p3: Point) -> Result<(), Error> {
        self.result()
    }

    fn path_arc_to(
        &mut self,
        _radii: Point,
        _x_axis_rotation: Scalar,
        _large_arc: bool,
        _sweep: bool,
        _p: Point,
    ) -> Result<(), Error> {
        self.result()
    }

    fn on_metadata_viewbox(&mut self, _viewbox: Rectangle) -> Result<(), Error> {
        self.result()
    }

    fn on_metadata_suggested_palette(&mut self, _palette: &Palette) -> Result<(), Error> {
        self.result()
    }
}
