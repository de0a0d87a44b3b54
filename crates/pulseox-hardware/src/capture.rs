//! Recorded PPG capture parser.
//!
//! Two formats are accepted.
//!
//! # Text
//!
//! One sample per line, `infrared,red` (comma or whitespace separated).
//! Blank lines and lines starting with `#` are skipped.
//!
//! # Binary
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic (0x50504731, "PPG1")
//! 4       4     Sample count N
//! 8       8*N   N x (infrared u32, red u32)
//! ```
//!
//! All integers are little-endian, matching the FIFO dump written by the
//! logging firmware.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ParseError;
use crate::sample::SamplePair;

/// Binary capture magic number.
pub const CAPTURE_MAGIC: u32 = 0x5050_4731;

const HEADER_LEN: usize = 8;
const RECORD_LEN: usize = 8;

/// Parser for recorded captures.
pub struct CaptureParser;

impl CaptureParser {
    /// Parse a single text line. Returns `Ok(None)` for blank and comment lines.
    ///
    /// `line_no` is 1-based and only used for error reporting.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Option<SamplePair>, ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut fields = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());

        let mut next_value = |name: &str| -> Result<u32, ParseError> {
            let field = fields.next().ok_or_else(|| ParseError::InvalidLine {
                line: line_no,
                message: format!("missing {name} value"),
            })?;
            field.parse::<u32>().map_err(|e| ParseError::InvalidLine {
                line: line_no,
                message: format!("bad {name} value {field:?}: {e}"),
            })
        };

        let infrared = next_value("infrared")?;
        let red = next_value("red")?;

        if let Some(extra) = fields.next() {
            return Err(ParseError::InvalidLine {
                line: line_no,
                message: format!("unexpected trailing field {extra:?}"),
            });
        }

        Ok(Some(SamplePair { infrared, red }))
    }

    /// Parse a whole text capture.
    pub fn parse_text(text: &str) -> Result<Vec<SamplePair>, ParseError> {
        let mut samples = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if let Some(sample) = Self::parse_line(line, idx + 1)? {
                samples.push(sample);
            }
        }
        Ok(samples)
    }

    /// Parse a binary capture.
    pub fn parse_binary(data: &[u8]) -> Result<Vec<SamplePair>, ParseError> {
        if data.len() < HEADER_LEN {
            return Err(ParseError::InsufficientData {
                needed: HEADER_LEN,
                got: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);

        let magic = cursor.read_u32::<LittleEndian>().map_err(|_| ParseError::InsufficientData {
            needed: 4,
            got: data.len(),
        })?;
        if magic != CAPTURE_MAGIC {
            return Err(ParseError::InvalidMagic {
                expected: CAPTURE_MAGIC,
                got: magic,
            });
        }

        let count = cursor.read_u32::<LittleEndian>().map_err(|_| ParseError::InsufficientData {
            needed: HEADER_LEN,
            got: data.len(),
        })? as usize;

        let needed = HEADER_LEN + count * RECORD_LEN;
        if data.len() < needed {
            return Err(ParseError::InsufficientData {
                needed,
                got: data.len(),
            });
        }

        let truncated = |_| ParseError::InsufficientData {
            needed,
            got: data.len(),
        };
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            let infrared = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
            let red = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
            samples.push(SamplePair { infrared, red });
        }

        Ok(samples)
    }

    /// Parse either format, choosing binary when the magic is present.
    pub fn parse_any(data: &[u8]) -> Result<Vec<SamplePair>, ParseError> {
        if data.len() >= 4 && data[..4] == CAPTURE_MAGIC.to_le_bytes() {
            return Self::parse_binary(data);
        }
        let text = String::from_utf8_lossy(data);
        Self::parse_text(&text)
    }

    /// Encode samples as a binary capture.
    pub fn encode_binary(samples: &[SamplePair]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + samples.len() * RECORD_LEN);
        buf.extend_from_slice(&CAPTURE_MAGIC.to_le_bytes());
        buf.extend_from_slice(&(samples.len() as u32).to_le_bytes());
        for s in samples {
            buf.extend_from_slice(&s.infrared.to_le_bytes());
            buf.extend_from_slice(&s.red.to_le_bytes());
        }
        buf
    }
}
