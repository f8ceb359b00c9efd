use serde::{Deserialize, Serialize};

use crate::pixel::{Pixel, PixelFormat};

/// Notification produced by the decoder.
///
/// Events come out in the order their commands were parsed. Each carries
/// owned data, so a consumer on another thread never observes a frame that is
/// still being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A new-frame command replaced the frame in progress.
    FrameStarted {
        /// Sequence number of the frame within this decoder, starting at 1.
        frame: u64,
        width: u16,
        height: u16,
        format: PixelFormat,
    },
    /// An end-of-line command closed line `index` of frame `frame`.
    LineCompleted(LineSnapshot),
}

impl Event {
    /// Sequence number of the frame the event belongs to.
    pub fn frame(&self) -> u64 {
        match self {
            Event::FrameStarted { frame, .. } => *frame,
            Event::LineCompleted(line) => line.frame,
        }
    }
}

/// Copy of one completed line, taken when the end-of-line command was parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub frame: u64,
    /// Line index within the frame; may exceed `height` on a long frame.
    pub index: usize,
    pub width: u16,
    pub height: u16,
    /// Pixels in arrival order; may be shorter or longer than `width`.
    pub pixels: Vec<Pixel>,
}

impl LineSnapshot {
    /// Pixels that fall inside the declared frame width.
    pub fn visible_pixels(&self) -> &[Pixel] {
        let end = self.pixels.len().min(self.width as usize);
        &self.pixels[..end]
    }

    /// Whether the line falls inside the declared frame height.
    pub fn in_bounds(&self) -> bool {
        self.index < self.height as usize
    }
}
