use std::fmt;

/// Error produced while decoding, encoding or drawing IconVG graphics
///
/// Errors are plain values that compare by identity of the variant, the message
/// text is informational only. `Bad*` variants are file format errors (the
/// bytes are not IconVG), `Invalid*`/`Unsupported*` variants are programming
/// errors, and `Canvas` carries an error defined by a canvas implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// Stream does not start with the IconVG magic identifier
    BadMagicIdentifier,
    /// Malformed metadata chunk or unknown metadata identifier
    BadMetadata,
    /// Metadata identifiers are not in strictly increasing order
    BadMetadataIdOrder,
    /// View box metadata is truncated, not finite or inverted
    BadMetadataViewbox,
    /// Suggested palette metadata is truncated or contains invalid colors
    BadMetadataSuggestedPalette,
    /// Truncated color operand
    BadColor,
    /// Truncated coordinate operand
    BadCoordinate,
    /// Truncated natural, real or zero-to-one operand
    BadNumber,
    /// Reserved opcode in styling mode
    BadStylingOpcode,
    /// Reserved opcode in drawing mode
    BadDrawingOpcode,
    /// Input ended in the middle of a path
    BadPathUnfinished,
    /// Canvas implements fewer operations than the decoder requires
    UnsupportedVtable,
    /// Argument is out of its valid range
    InvalidArgument,
    /// Encoder method called in a state where it is not allowed
    InvalidEncoderState,
    /// Canvas can not handle the paint it was asked to fill with
    InvalidPaintType,
    /// Error reported by a canvas implementation
    Canvas(&'static str),
}

impl Error {
    /// Human readable (non localized) message
    pub fn message(&self) -> &'static str {
        use Error::*;
        match self {
            BadMagicIdentifier => "iconvg: bad magic identifier",
            BadMetadata => "iconvg: bad metadata",
            BadMetadataIdOrder => "iconvg: bad metadata ID order",
            BadMetadataViewbox => "iconvg: bad metadata (viewbox)",
            BadMetadataSuggestedPalette => "iconvg: bad metadata (suggested palette)",
            BadColor => "iconvg: bad color",
            BadCoordinate => "iconvg: bad coordinate",
            BadNumber => "iconvg: bad number",
            BadStylingOpcode => "iconvg: bad styling opcode",
            BadDrawingOpcode => "iconvg: bad drawing opcode",
            BadPathUnfinished => "iconvg: bad path (unfinished)",
            UnsupportedVtable => "iconvg: unsupported vtable",
            InvalidArgument => "iconvg: invalid argument",
            InvalidEncoderState => "iconvg: invalid encoder state",
            InvalidPaintType => "iconvg: invalid paint type",
            Canvas(message) => message,
        }
    }

    /// Whether the error means that the source bytes are not valid IconVG
    pub fn is_file_format_error(&self) -> bool {
        use Error::*;
        matches!(
            self,
            BadMagicIdentifier
                | BadMetadata
                | BadMetadataIdOrder
                | BadMetadataViewbox
                | BadMetadataSuggestedPalette
                | BadColor
                | BadCoordinate
                | BadNumber
                | BadStylingOpcode
                | BadDrawingOpcode
                | BadPathUnfinished
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        let kind = if error.is_file_format_error() {
            std::io::ErrorKind::InvalidData
        } else {
            std::io::ErrorKind::InvalidInput
        };
        Self::new(kind, error)
    }
}
