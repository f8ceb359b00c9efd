//! Command grammar of the capture stream.
//!
//! Commands open with [`layout::START_MARKER`] followed by a one-byte opcode
//! and a fixed-length body:
//!
//! ```text
//! 00 01 WWhi WWlo HHhi HHlo PP   new frame (big-endian width/height, format code)
//! 00 02                          end of line
//! ```
//!
//! Any other byte seen while idle is pixel payload. The module follows the
//! usual split: `layout` holds the byte positions, `reader` the safe body
//! access, `parser` the domain decoding and `error` the failures. Parsing is
//! pure; the stateful byte-at-a-time handling lives in [`crate::Decoder`].

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::ProtocolError;
pub use parser::{Command, FrameHeader, parse_command};
