//! Frame under construction.
//!
//! A `Frame` has fixed geometry and format; pixels are appended to the line
//! under the cursor and the cursor only moves forward. Writes past the
//! declared width or height are accepted: they stay visible through
//! [`Frame::current_line`] until the next line starts, but in-bounds reads via
//! [`Frame::pixel_color_at`] never reach them.

use crate::pixel::{Pixel, PixelFormat};

/// Widest frame the device can announce.
pub const MAX_WIDTH: u16 = 640;
/// Tallest frame the device can announce.
pub const MAX_HEIGHT: u16 = 480;

/// Clamp a raw dimension into `[1, max]`.
///
/// # Examples
/// ```
/// use linecap_core::{MAX_WIDTH, clamp_dimension};
///
/// assert_eq!(clamp_dimension(0, MAX_WIDTH), 1);
/// assert_eq!(clamp_dimension(9999, MAX_WIDTH), 640);
/// assert_eq!(clamp_dimension(320, MAX_WIDTH), 320);
/// ```
pub fn clamp_dimension(value: u16, max: u16) -> u16 {
    value.clamp(1, max.max(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    format: PixelFormat,
    rows: Vec<Vec<Pixel>>,
    // Current line once the cursor has moved past `height`.
    overflow: Vec<Pixel>,
    cursor: usize,
}

impl Frame {
    /// Blank frame with the cursor on line 0. Geometry is clamped to
    /// `[1, MAX_WIDTH]` x `[1, MAX_HEIGHT]`.
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        let width = clamp_dimension(width, MAX_WIDTH);
        let height = clamp_dimension(height, MAX_HEIGHT);
        Self {
            width,
            height,
            format,
            rows: vec![Vec::new(); height as usize],
            overflow: Vec::new(),
            cursor: 0,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Index of the line currently being written.
    pub fn line_index(&self) -> usize {
        self.cursor
    }

    /// Append a pixel at the next column of the current line.
    pub fn add_pixel(&mut self, pixel: Pixel) {
        match self.rows.get_mut(self.cursor) {
            Some(row) => row.push(pixel),
            None => self.overflow.push(pixel),
        }
    }

    /// Move the cursor to the next line. Not bounded by `height`.
    pub fn new_line(&mut self) {
        self.cursor = self.cursor.saturating_add(1);
        self.overflow.clear();
    }

    /// Pixels written so far on the current line, including any past `width`.
    pub fn current_line(&self) -> &[Pixel] {
        self.rows
            .get(self.cursor)
            .map(Vec::as_slice)
            .unwrap_or(self.overflow.as_slice())
    }

    /// Pixels written on line `y`; empty for lines outside the frame.
    pub fn line(&self, y: usize) -> &[Pixel] {
        self.rows.get(y).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stored pixel at `(x, y)`, or black when the coordinate lies outside
    /// the frame or was never written.
    pub fn pixel_color_at(&self, x: usize, y: usize) -> Pixel {
        if x >= self.width as usize {
            return Pixel::default();
        }
        self.line(y).get(x).copied().unwrap_or_default()
    }
}
