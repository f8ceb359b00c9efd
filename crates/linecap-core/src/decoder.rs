//! Byte-at-a-time protocol decoder.
//!
//! The decoder owns all parsing state: the current mode, the bytes of the
//! command or pixel being accumulated, and the frame under construction.
//! `push` never fails. Unknown opcodes are dropped, unknown pixel formats
//! fall back to the default encoding, and out-of-range geometry is clamped,
//! so a noisy link only ever costs garbled lines.
//!
//! A pixel byte equal to the start marker cannot be told apart from a command
//! and is always read as one. If it arrives partway through a pixel, the
//! partial pixel is thrown away and counted in `truncated_pixels`.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::event::{Event, LineSnapshot};
use crate::frame::Frame;
use crate::pixel::{MAX_PIXEL_BYTES, PixelFormat};
use crate::protocol::layout::{MAX_BODY_LEN, START_MARKER};
use crate::protocol::reader::body_len;
use crate::protocol::{Command, FrameHeader, parse_command};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Opcode,
    Body { opcode: u8, needed: usize },
    Pixel { needed: usize },
}

/// Counters accumulated over the life of a decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderStats {
    pub bytes_total: u64,
    pub frames_started: u64,
    pub lines_completed: u64,
    pub pixels_decoded: u64,
    pub unknown_commands: u64,
    pub unknown_pixel_formats: u64,
    /// Pixels decoded before the first new-frame command.
    pub dropped_pixels: u64,
    /// End-of-line commands seen before the first new-frame command.
    pub dropped_lines: u64,
    /// Partial pixels cut short by a command start.
    pub truncated_pixels: u64,
}

/// Partial command or pixel held by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// Start marker received, opcode not yet.
    Opcode,
    /// Command body incomplete.
    CommandBody { opcode: u8, have: usize, needed: usize },
    /// Pixel payload incomplete.
    Pixel { have: usize, needed: usize },
}

impl Pending {
    /// Stream bytes consumed by the partial item, marker and opcode included.
    pub fn bytes(&self) -> usize {
        match *self {
            Pending::Opcode => 1,
            Pending::CommandBody { have, .. } => 2 + have,
            Pending::Pixel { have, .. } => have,
        }
    }
}

/// Incremental decoder for one byte stream.
///
/// # Examples
/// ```
/// use linecap_core::{Decoder, Event};
///
/// let mut decoder = Decoder::new();
/// let events = decoder.push_slice(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00, 0x07, 0xE0, 0x00, 0x02]);
/// assert_eq!(events.len(), 2);
/// assert!(matches!(events[0], Event::FrameStarted { width: 2, height: 1, .. }));
/// let Event::LineCompleted(line) = &events[1] else { unreachable!() };
/// assert_eq!(line.pixels.len(), 1);
/// assert_eq!(line.pixels[0].g, 252);
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    mode: Mode,
    accumulator: Vec<u8>,
    frame: Option<Frame>,
    format: PixelFormat,
    frame_seq: u64,
    stats: DecoderStats,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            accumulator: Vec::with_capacity(MAX_BODY_LEN.max(MAX_PIXEL_BYTES)),
            frame: None,
            format: PixelFormat::default(),
            frame_seq: 0,
            stats: DecoderStats::default(),
        }
    }

    /// Feed one byte. Each byte completes at most one command, so at most one
    /// event comes out.
    pub fn push(&mut self, byte: u8) -> Option<Event> {
        self.stats.bytes_total += 1;
        match self.mode {
            Mode::Idle if byte == START_MARKER => {
                self.mode = Mode::Opcode;
                None
            }
            Mode::Idle => {
                self.accumulator.clear();
                self.mode = Mode::Pixel {
                    needed: self.format.byte_width(),
                };
                self.accumulate_pixel(byte);
                None
            }
            Mode::Opcode => self.begin_command(byte),
            Mode::Body { opcode, needed } => {
                self.accumulator.push(byte);
                if self.accumulator.len() >= needed {
                    self.dispatch(opcode)
                } else {
                    None
                }
            }
            Mode::Pixel { .. } if byte == START_MARKER => {
                trace!(
                    "command start after {} pixel byte(s), discarding partial pixel",
                    self.accumulator.len()
                );
                self.accumulator.clear();
                self.stats.truncated_pixels += 1;
                self.mode = Mode::Opcode;
                None
            }
            Mode::Pixel { .. } => {
                self.accumulate_pixel(byte);
                None
            }
        }
    }

    /// Feed a chunk of bytes, collecting events in order.
    pub fn push_slice(&mut self, bytes: &[u8]) -> Vec<Event> {
        bytes.iter().filter_map(|&byte| self.push(byte)).collect()
    }

    /// Frame under construction, if a new-frame command has been seen.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Encoding used for incoming pixels.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Sequence number of the current frame; 0 before the first frame.
    pub fn frame_seq(&self) -> u64 {
        self.frame_seq
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn is_idle(&self) -> bool {
        self.mode == Mode::Idle
    }

    /// Partial command or pixel waiting for more bytes.
    pub fn pending(&self) -> Option<Pending> {
        match self.mode {
            Mode::Idle => None,
            Mode::Opcode => Some(Pending::Opcode),
            Mode::Body { opcode, needed } => Some(Pending::CommandBody {
                opcode,
                have: self.accumulator.len(),
                needed,
            }),
            Mode::Pixel { needed } => Some(Pending::Pixel {
                have: self.accumulator.len(),
                needed,
            }),
        }
    }

    /// Drop any partial command or pixel and return to idle. The frame in
    /// progress is kept.
    pub fn discard_pending(&mut self) -> Option<Pending> {
        let pending = self.pending();
        self.mode = Mode::Idle;
        self.accumulator.clear();
        pending
    }

    fn accumulate_pixel(&mut self, byte: u8) {
        self.accumulator.push(byte);
        if self.accumulator.len() < self.format.byte_width() {
            return;
        }

        let pixel = self.format.decode(&self.accumulator);
        self.accumulator.clear();
        self.mode = Mode::Idle;
        match self.frame.as_mut() {
            Some(frame) => {
                frame.add_pixel(pixel);
                self.stats.pixels_decoded += 1;
            }
            None => {
                trace!("dropping pixel received before the first frame");
                self.stats.dropped_pixels += 1;
            }
        }
    }

    fn begin_command(&mut self, opcode: u8) -> Option<Event> {
        self.accumulator.clear();
        match body_len(opcode) {
            Some(0) => self.dispatch(opcode),
            Some(needed) => {
                self.mode = Mode::Body { opcode, needed };
                None
            }
            None => {
                warn!("unknown command opcode 0x{opcode:02x}, ignoring");
                self.stats.unknown_commands += 1;
                self.mode = Mode::Idle;
                None
            }
        }
    }

    fn dispatch(&mut self, opcode: u8) -> Option<Event> {
        let parsed = parse_command(opcode, &self.accumulator);
        self.accumulator.clear();
        self.mode = Mode::Idle;
        match parsed {
            Ok(Command::NewFrame(header)) => Some(self.start_frame(header)),
            Ok(Command::EndOfLine) => self.end_line(),
            Err(err) => {
                warn!("dropping command 0x{opcode:02x}: {err}");
                self.stats.unknown_commands += 1;
                None
            }
        }
    }

    fn start_frame(&mut self, header: FrameHeader) -> Event {
        if !header.format_recognized() {
            warn!(
                "unknown pixel format code 0x{:02x}, using {}",
                header.format_code, header.format
            );
            self.stats.unknown_pixel_formats += 1;
        }
        if header.clamped() {
            debug!(
                "frame geometry {}x{} clamped to {}x{}",
                header.raw_width, header.raw_height, header.width, header.height
            );
        }

        self.frame_seq += 1;
        self.format = header.format;
        self.frame = Some(Frame::new(header.width, header.height, header.format));
        self.stats.frames_started += 1;
        debug!(
            "frame {} started: {}x{} {}",
            self.frame_seq, header.width, header.height, header.format
        );

        Event::FrameStarted {
            frame: self.frame_seq,
            width: header.width,
            height: header.height,
            format: header.format,
        }
    }

    fn end_line(&mut self) -> Option<Event> {
        let Some(frame) = self.frame.as_mut() else {
            trace!("dropping end of line received before the first frame");
            self.stats.dropped_lines += 1;
            return None;
        };

        let snapshot = LineSnapshot {
            frame: self.frame_seq,
            index: frame.line_index(),
            width: frame.width(),
            height: frame.height(),
            pixels: frame.current_line().to_vec(),
        };
        frame.new_line();
        self.stats.lines_completed += 1;
        Some(Event::LineCompleted(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn new_frame(width: u16, height: u16, format: u8) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x01];
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.push(format);
        bytes
    }

    const EOL: [u8; 2] = [0x00, 0x02];

    #[test]
    fn starts_idle_without_frame() {
        let decoder = Decoder::new();
        assert!(decoder.is_idle());
        assert!(decoder.frame().is_none());
        assert_eq!(decoder.frame_seq(), 0);
        assert_eq!(decoder.format(), PixelFormat::Rgb565);
    }

    #[test]
    fn new_frame_emits_frame_started() {
        let mut decoder = Decoder::new();
        let events = decoder.push_slice(&new_frame(10, 8, 0));
        assert_eq!(
            events,
            vec![Event::FrameStarted {
                frame: 1,
                width: 10,
                height: 8,
                format: PixelFormat::Rgb565,
            }]
        );
        let frame = decoder.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (10, 8));
        assert!(decoder.is_idle());
    }

    #[test]
    fn start_marker_inside_pixel_starts_command() {
        let mut decoder = Decoder::new();
        decoder.push_slice(&new_frame(4, 4, 0));
        assert!(decoder.push(0xF8).is_none());
        assert_eq!(decoder.pending(), Some(Pending::Pixel { have: 1, needed: 2 }));

        assert!(decoder.push(0x00).is_none());
        assert_eq!(decoder.pending(), Some(Pending::Opcode));

        let event = decoder.push(0x02);
        let Some(Event::LineCompleted(line)) = event else {
            panic!("expected line event, got {event:?}");
        };
        assert_eq!(line.index, 0);
        assert!(line.pixels.is_empty());
        assert_eq!(decoder.stats().truncated_pixels, 1);
        assert_eq!(decoder.stats().pixels_decoded, 0);
    }

    #[test]
    fn pixel_completes_before_next_marker() {
        let mut decoder = Decoder::new();
        decoder.push_slice(&new_frame(2, 1, 0));
        decoder.push_slice(&[0xF8, 0x1F]);
        assert!(decoder.is_idle());
        assert_eq!(
            decoder.frame().unwrap().current_line(),
            &[Pixel::new(248, 0, 248)]
        );
        assert_eq!(decoder.stats().truncated_pixels, 0);
    }

    #[test]
    fn end_of_line_snapshots_and_advances() {
        let mut decoder = Decoder::new();
        decoder.push_slice(&new_frame(2, 2, 0));
        decoder.push_slice(&[0x07, 0xE0, 0x07, 0xE0]);
        let events = decoder.push_slice(&EOL);
        let [Event::LineCompleted(line)] = events.as_slice() else {
            panic!("expected one line event, got {events:?}");
        };
        assert_eq!(line.frame, 1);
        assert_eq!(line.index, 0);
        assert_eq!(line.pixels, vec![Pixel::new(0, 252, 0); 2]);
        assert_eq!(decoder.frame().unwrap().line_index(), 1);
    }

    #[test]
    fn unknown_opcode_returns_to_idle() {
        let mut decoder = Decoder::new();
        decoder.push_slice(&new_frame(2, 1, 0));
        assert!(decoder.push_slice(&[0x00, 0x05]).is_empty());
        assert!(decoder.is_idle());
        assert_eq!(decoder.stats().unknown_commands, 1);

        // The next byte is read fresh from idle: here, a command start.
        let events = decoder.push_slice(&EOL);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_format_still_starts_frame() {
        let mut decoder = Decoder::new();
        let events = decoder.push_slice(&new_frame(4, 4, 0x33));
        assert!(matches!(
            events.as_slice(),
            [Event::FrameStarted {
                format: PixelFormat::Rgb565,
                ..
            }]
        ));
        assert_eq!(decoder.stats().unknown_pixel_formats, 1);
    }

    #[test]
    fn bytes_before_first_frame_are_dropped() {
        let mut decoder = Decoder::new();
        assert!(decoder.push_slice(&[0x12, 0x34, 0x00, 0x02]).is_empty());
        assert_eq!(decoder.stats().dropped_pixels, 1);
        assert_eq!(decoder.stats().dropped_lines, 1);
    }

    #[test]
    fn pending_reports_partial_state() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.pending(), None);

        decoder.push(0x00);
        assert_eq!(decoder.pending(), Some(Pending::Opcode));

        decoder.push_slice(&[0x01, 0x00, 0x0A]);
        let pending = decoder.pending().unwrap();
        assert_eq!(
            pending,
            Pending::CommandBody {
                opcode: 0x01,
                have: 2,
                needed: 5
            }
        );
        assert_eq!(pending.bytes(), 4);

        assert_eq!(decoder.discard_pending(), Some(pending));
        assert!(decoder.is_idle());
        assert!(decoder.frame().is_none());
    }

    #[test]
    fn stalled_command_waits_for_more_bytes() {
        let mut decoder = Decoder::new();
        decoder.push_slice(&[0x00, 0x01, 0x00, 0x0A, 0x00]);
        assert!(!decoder.is_idle());
        let events = decoder.push_slice(&[0x08, 0x00]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn stats_count_bytes_and_lines() {
        let mut decoder = Decoder::new();
        decoder.push_slice(&new_frame(1, 1, 0));
        decoder.push_slice(&[0xFF, 0xFF]);
        decoder.push_slice(&EOL);
        let stats = decoder.stats();
        assert_eq!(stats.bytes_total, 11);
        assert_eq!(stats.frames_started, 1);
        assert_eq!(stats.pixels_decoded, 1);
        assert_eq!(stats.lines_completed, 1);
    }
}
