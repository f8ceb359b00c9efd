//! Byte-level layout of the command grammar.

/// Reserved byte that opens every command.
pub const START_MARKER: u8 = 0x00;

pub const OP_NEW_FRAME: u8 = 0x01;
pub const OP_END_OF_LINE: u8 = 0x02;

pub const NEW_FRAME_BODY_LEN: usize = 5;
pub const END_OF_LINE_BODY_LEN: usize = 0;

/// Longest command body in the grammar.
pub const MAX_BODY_LEN: usize = NEW_FRAME_BODY_LEN;

// New-frame body: WWhi WWlo HHhi HHlo PP
pub const WIDTH_RANGE: std::ops::Range<usize> = 0..2;
pub const HEIGHT_RANGE: std::ops::Range<usize> = 2..4;
pub const FORMAT_OFFSET: usize = 4;
