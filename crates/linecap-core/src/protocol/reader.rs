use super::error::ProtocolError;
use super::layout;

/// Body length that follows `opcode`, or `None` for opcodes outside the
/// grammar.
///
/// # Examples
/// ```
/// use linecap_core::protocol::reader::body_len;
///
/// assert_eq!(body_len(0x01), Some(5));
/// assert_eq!(body_len(0x02), Some(0));
/// assert_eq!(body_len(0x05), None);
/// ```
pub fn body_len(opcode: u8) -> Option<usize> {
    match opcode {
        layout::OP_NEW_FRAME => Some(layout::NEW_FRAME_BODY_LEN),
        layout::OP_END_OF_LINE => Some(layout::END_OF_LINE_BODY_LEN),
        _ => None,
    }
}

pub struct BodyReader<'a> {
    body: &'a [u8],
}

impl<'a> BodyReader<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self { body }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ProtocolError> {
        if self.body.len() < needed {
            return Err(ProtocolError::TooShort {
                needed,
                actual: self.body.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ProtocolError> {
        self.body
            .get(offset)
            .copied()
            .ok_or(ProtocolError::TooShort {
                needed: offset + 1,
                actual: self.body.len(),
            })
    }

    pub fn read_u16_be(&self, range: std::ops::Range<usize>) -> Result<u16, ProtocolError> {
        match self.read_slice(range)? {
            [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
            bytes => Err(ProtocolError::TooShort {
                needed: 2,
                actual: bytes.len(),
            }),
        }
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], ProtocolError> {
        self.body
            .get(range.clone())
            .ok_or(ProtocolError::TooShort {
                needed: range.end,
                actual: self.body.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{BodyReader, body_len};
    use crate::protocol::error::ProtocolError;
    use crate::protocol::layout;

    #[test]
    fn body_len_for_known_opcodes() {
        assert_eq!(body_len(layout::OP_NEW_FRAME), Some(5));
        assert_eq!(body_len(layout::OP_END_OF_LINE), Some(0));
    }

    #[test]
    fn body_len_rejects_unknown_opcodes() {
        assert_eq!(body_len(0x00), None);
        assert_eq!(body_len(0x05), None);
        assert_eq!(body_len(0xFF), None);
    }

    #[test]
    fn read_u16_is_big_endian() {
        let reader = BodyReader::new(&[0x01, 0x40, 0x00, 0xF0]);
        assert_eq!(reader.read_u16_be(layout::WIDTH_RANGE).unwrap(), 320);
        assert_eq!(reader.read_u16_be(layout::HEIGHT_RANGE).unwrap(), 240);
    }

    #[test]
    fn read_past_end_is_too_short() {
        let reader = BodyReader::new(&[0x01, 0x40]);
        let err = reader.read_u8(layout::FORMAT_OFFSET).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::TooShort {
                needed: 5,
                actual: 2
            }
        );
        assert!(reader.require_len(layout::NEW_FRAME_BODY_LEN).is_err());
    }
}
