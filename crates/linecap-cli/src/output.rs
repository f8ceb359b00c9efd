//! JSON-lines event log.

use std::io::Write;

use anyhow::{Context, Result};
use linecap_core::{Event, PixelFormat};
use serde::Serialize;

/// One line of the event log.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventRecord {
    FrameStarted {
        frame: u64,
        width: u16,
        height: u16,
        format: PixelFormat,
    },
    LineCompleted {
        frame: u64,
        line: usize,
        pixel_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        pixels: Option<Vec<[u8; 3]>>,
    },
}

impl EventRecord {
    pub fn from_event(event: &Event, with_pixels: bool) -> Self {
        match event {
            Event::FrameStarted {
                frame,
                width,
                height,
                format,
            } => EventRecord::FrameStarted {
                frame: *frame,
                width: *width,
                height: *height,
                format: *format,
            },
            Event::LineCompleted(line) => EventRecord::LineCompleted {
                frame: line.frame,
                line: line.index,
                pixel_count: line.pixels.len(),
                pixels: with_pixels
                    .then(|| line.pixels.iter().map(|pixel| pixel.to_rgb()).collect()),
            },
        }
    }
}

pub struct EventLog {
    out: Box<dyn Write>,
    with_pixels: bool,
}

impl EventLog {
    pub fn new(out: Box<dyn Write>, with_pixels: bool) -> Self {
        Self { out, with_pixels }
    }

    pub fn write(&mut self, event: &Event) -> Result<()> {
        let record = EventRecord::from_event(event, self.with_pixels);
        serde_json::to_writer(&mut self.out, &record).context("JSON serialization failed")?;
        self.out
            .write_all(b"\n")
            .context("Failed to write event log")
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush().context("Failed to write event log")
    }
}
