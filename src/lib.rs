//! IconVG compact binary vector graphics.
//!
//! Main features:
//!  - Decoder driving any [`Canvas`] implementation
//!  - Indirect color model with palettes, color registers and blends
//!  - Encoder producing the smallest encoding of numbers and colors
//!  - [`DebugCanvas`] logging decoder calls and [`Recorder`] capturing drawings
//!
//! ```
//! use iconvg::{decode, DecodeOptions, Encoder, Point, Rectangle, Recorder, RGBA};
//!
//! let mut encoder = Encoder::new();
//! encoder
//!     .set_creg(0, false, RGBA::BLACK.into())?
//!     .start_path(0, Point::new(-16.0, -16.0))?
//!     .abs_line_to(Point::new(16.0, -16.0))?
//!     .abs_line_to(Point::new(0.0, 16.0))?
//!     .close_path_end_path()?;
//! let bytes = encoder.into_bytes()?;
//!
//! let mut recorder = Recorder::new();
//! decode(
//!     &mut recorder,
//!     Rectangle::new(0.0, 0.0, 64.0, 64.0),
//!     &bytes,
//!     &DecodeOptions::default(),
//! )?;
//! assert_eq!(recorder.drawings()[0].to_svg_path(), "M16,16 L48,16 L32,48 Z");
//! # Ok::<(), iconvg::Error>(())
//! ```

mod canvas;
mod codec;
mod color;
mod debug;
mod decoder;
mod ellipse;
mod encoder;
mod error;
mod geometry;
pub mod number;
mod paint;
mod record;
mod utils;

pub use canvas::{BrokenCanvas, CANVAS_OPS_COUNT, Canvas};
pub use codec::{
    ColorEncoding, decode_color1, decode_color2, decode_color3_direct, decode_color3_indirect,
    decode_color4, encode_color1, encode_color2, encode_color3_direct, encode_color3_indirect,
    encode_color4,
};
pub use color::{Color, ColorError, ColorRegisters, PALETTE_SIZE, Palette, RGBA, resolve};
pub use debug::DebugCanvas;
pub use decoder::{DecodeOptions, MAGIC, decode, decode_viewbox};
pub use ellipse::{EllipArc, EllipArcCubicIter};
pub use encoder::Encoder;
pub use error::Error;
pub use geometry::{EPSILON, PI, Point, Rectangle, Scalar, Transform, scalar_fmt};
pub use paint::{Gradient, GradientStop, Paint, PaintKind, Spread};
pub use record::{
    Drawing, INVALID_PAINT_PLACEHOLDER, PathCmd, RecordedPaint, Recorder, RecorderOptions,
};
