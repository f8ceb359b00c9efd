//! linecap core library: decodes a serial camera stream into frames.
//!
//! The device sends raw pixel payload interleaved with small control
//! commands (new frame, end of line). Byte sources feed the decoder one byte
//! at a time; the decoder assembles the frame under construction and emits an
//! [`Event`] for every new frame and every completed line. Parsing is pure
//! and never fails; all I/O is isolated in `source` and `stream`.
//!
//! Invariants:
//! - Frame width stays in `[1, 640]` and height in `[1, 480]`.
//! - Events come out in parse order; line `L` is reported before line `L+1`.
//! - Feeding the same bytes to two fresh decoders yields equal event sequences.
//! - Events own their data; consumers never see a frame mid-write.
//! - A `0x00` byte always starts a command, even halfway through a pixel.
//!
//! # Examples
//! ```
//! use linecap_core::{Decoder, Event, PixelFormat};
//!
//! let mut decoder = Decoder::new();
//! let mut bytes = vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00];
//! bytes.extend_from_slice(&[0xF8, 0x1F, 0x07, 0xE0]);
//! bytes.extend_from_slice(&[0x00, 0x02]);
//!
//! let events = decoder.push_slice(&bytes);
//! assert!(matches!(
//!     events[0],
//!     Event::FrameStarted { width: 2, height: 1, format: PixelFormat::Rgb565, .. }
//! ));
//! let Event::LineCompleted(line) = &events[1] else { unreachable!() };
//! assert_eq!(line.pixels.len(), 2);
//! ```

mod decoder;
mod event;
mod frame;
mod pixel;
pub mod protocol;
mod source;
mod stream;

pub use decoder::{Decoder, DecoderStats, Pending};
pub use event::{Event, LineSnapshot};
pub use frame::{Frame, MAX_HEIGHT, MAX_WIDTH, clamp_dimension};
pub use pixel::{
    DEFAULT_FORMAT, FORMATS, FormatSpec, MAX_PIXEL_BYTES, Pixel, PixelFormat, decode_pixel,
};
pub use protocol::{Command, FrameHeader, ProtocolError};
pub use source::{ByteSource, DEFAULT_CHUNK_SIZE, ReaderSource, SliceSource, SourceError};
pub use stream::{
    DecoderHandle, FrameInfo, SUMMARY_VERSION, StreamError, StreamSummary, decode_source,
    decode_source_until, spawn_decoder,
};
