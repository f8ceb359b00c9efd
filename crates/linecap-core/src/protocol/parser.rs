use super::error::ProtocolError;
use super::layout;
use super::reader::BodyReader;
use crate::frame::{MAX_HEIGHT, MAX_WIDTH, clamp_dimension};
use crate::pixel::PixelFormat;

/// Geometry and encoding announced by a new-frame command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Width clamped to `[1, MAX_WIDTH]`.
    pub width: u16,
    /// Height clamped to `[1, MAX_HEIGHT]`.
    pub height: u16,
    pub format: PixelFormat,
    /// Width as sent on the wire.
    pub raw_width: u16,
    /// Height as sent on the wire.
    pub raw_height: u16,
    /// Format code as sent on the wire.
    pub format_code: u8,
}

impl FrameHeader {
    pub fn format_recognized(&self) -> bool {
        PixelFormat::from_code(self.format_code).is_some()
    }

    pub fn clamped(&self) -> bool {
        self.width != self.raw_width || self.height != self.raw_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NewFrame(FrameHeader),
    EndOfLine,
}

/// Decode a complete command body for `opcode`.
///
/// Geometry is clamped and unknown format codes resolve to the default
/// encoding; neither is an error.
pub fn parse_command(opcode: u8, body: &[u8]) -> Result<Command, ProtocolError> {
    match opcode {
        layout::OP_NEW_FRAME => parse_new_frame(body).map(Command::NewFrame),
        layout::OP_END_OF_LINE => Ok(Command::EndOfLine),
        _ => Err(ProtocolError::UnknownOpcode { opcode }),
    }
}

pub fn parse_new_frame(body: &[u8]) -> Result<FrameHeader, ProtocolError> {
    let reader = BodyReader::new(body);
    reader.require_len(layout::NEW_FRAME_BODY_LEN)?;

    let raw_width = reader.read_u16_be(layout::WIDTH_RANGE)?;
    let raw_height = reader.read_u16_be(layout::HEIGHT_RANGE)?;
    let format_code = reader.read_u8(layout::FORMAT_OFFSET)?;

    Ok(FrameHeader {
        width: clamp_dimension(raw_width, MAX_WIDTH),
        height: clamp_dimension(raw_height, MAX_HEIGHT),
        format: PixelFormat::from_code_or_default(format_code),
        raw_width,
        raw_height,
        format_code,
    })
}
