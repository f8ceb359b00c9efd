//! Pixel encodings and their decoders.
//!
//! Every wire format is described by a [`FormatSpec`] entry in [`FORMATS`]:
//! its wire code, encoded byte width and decode function. The decoder only
//! ever asks a [`PixelFormat`] for its width and decode rule, so a new encoding
//! is added here without touching the state machine. Unrecognized wire codes
//! resolve to [`DEFAULT_FORMAT`].

use serde::{Deserialize, Serialize};

/// One decoded pixel with 8-bit red, green and blue channels.
///
/// # Examples
/// ```
/// use linecap_core::Pixel;
///
/// let pixel = Pixel::new(248, 0, 0);
/// assert_eq!(pixel.r, 248);
/// assert_eq!(Pixel::default(), Pixel::new(0, 0, 0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an `[r, g, b]` triple.
    pub const fn to_rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Pixel encodings understood on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Packed 16-bit RGB: `rrrrrggg gggbbbbb`, big-endian.
    #[default]
    Rgb565,
}

/// Registry entry for a pixel encoding.
#[derive(Debug, Clone, Copy)]
pub struct FormatSpec {
    pub format: PixelFormat,
    /// Code carried in the new-frame command.
    pub code: u8,
    pub name: &'static str,
    /// Number of encoded bytes per pixel.
    pub byte_width: usize,
    pub decode: fn(&[u8]) -> Pixel,
}

const RGB565: FormatSpec = FormatSpec {
    format: PixelFormat::Rgb565,
    code: 0x00,
    name: "rgb565",
    byte_width: 2,
    decode: decode_rgb565,
};

/// All known encodings, indexed by wire code lookup.
pub const FORMATS: &[FormatSpec] = &[RGB565];

/// Encoding substituted for unrecognized wire codes.
pub const DEFAULT_FORMAT: PixelFormat = PixelFormat::Rgb565;

/// Largest `byte_width` among the registered encodings.
pub const MAX_PIXEL_BYTES: usize = max_byte_width(FORMATS);

const fn max_byte_width(formats: &[FormatSpec]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < formats.len() {
        if formats[i].byte_width > max {
            max = formats[i].byte_width;
        }
        i += 1;
    }
    max
}

impl PixelFormat {
    /// Look up an encoding by wire code.
    ///
    /// # Examples
    /// ```
    /// use linecap_core::PixelFormat;
    ///
    /// assert_eq!(PixelFormat::from_code(0x00), Some(PixelFormat::Rgb565));
    /// assert_eq!(PixelFormat::from_code(0x7f), None);
    /// ```
    pub fn from_code(code: u8) -> Option<Self> {
        FORMATS
            .iter()
            .find(|spec| spec.code == code)
            .map(|spec| spec.format)
    }

    /// Look up an encoding by wire code, falling back to [`DEFAULT_FORMAT`].
    pub fn from_code_or_default(code: u8) -> Self {
        Self::from_code(code).unwrap_or(DEFAULT_FORMAT)
    }

    /// Registry entry for this encoding.
    pub fn spec(self) -> &'static FormatSpec {
        FORMATS
            .iter()
            .find(|spec| spec.format == self)
            .unwrap_or(&RGB565)
    }

    pub fn code(self) -> u8 {
        self.spec().code
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn byte_width(self) -> usize {
        self.spec().byte_width
    }

    /// Decode one pixel from exactly `byte_width()` encoded bytes.
    pub fn decode(self, bytes: &[u8]) -> Pixel {
        (self.spec().decode)(bytes)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode encoded pixel bytes with the given format.
///
/// # Examples
/// ```
/// use linecap_core::{Pixel, PixelFormat, decode_pixel};
///
/// assert_eq!(decode_pixel(&[0x07, 0xE0], PixelFormat::Rgb565), Pixel::new(0, 252, 0));
/// ```
pub fn decode_pixel(bytes: &[u8], format: PixelFormat) -> Pixel {
    format.decode(bytes)
}

/// RGB565 keeps the source truncation: channels are the top bits of each
/// field, so red/blue are multiples of 8 and green a multiple of 4.
fn decode_rgb565(bytes: &[u8]) -> Pixel {
    let value = match bytes {
        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
        _ => 0,
    };
    Pixel {
        r: ((value >> 8) & 0xF8) as u8,
        g: ((value >> 3) & 0xFC) as u8,
        b: ((value << 3) & 0xF8) as u8,
    }
}
