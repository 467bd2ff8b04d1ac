//! Sentinel-delimited framing for the spa bus.
//!
//! Wire format (maximum 35 bytes on the wire):
//!
//! ```text
//! +----------+--------+------+------+------+---------+-----+----------+
//! | sentinel | length | dest | src  | kind | payload | crc | sentinel |
//! |   0x7E   | 1 byte |1 byte|1 byte|1 byte|    N    |  1  |   0x7E   |
//! +----------+--------+------+------+------+---------+-----+----------+
//! ```
//!
//! The length byte counts itself through the CRC (everything between the
//! sentinels), so the smallest legal value is 5: length, dest, src, kind,
//! CRC, with an empty payload. The CRC covers the length byte through the
//! end of the payload (see [`crate::protocol::crc`]).
//!
//! [`FrameReader`] reassembles frames from a byte stream one byte at a
//! time. The bus is electrically noisy and shares sentinels between
//! back-to-back frames, so the reader scans rather than trusts: a frame
//! that fails its length or CRC check is dropped silently and scanning
//! resumes at the next sentinel. Framing failures are counted but only
//! logged at trace level.

use thiserror::Error;
use tracing::trace;

use crate::protocol::crc;

/// Frame boundary marker, used at both ends.
pub const SENTINEL: u8 = 0x7E;

/// Maximum number of bytes in a frame on the wire, sentinels included.
pub const MAX_FRAME_LEN: usize = 35;

/// Smallest legal value of the length byte: length + dest + src + kind + CRC.
const MIN_BODY_LEN: u8 = 5;

/// Errors detected while validating a candidate frame.
///
/// These never escape [`FrameReader::feed`]; the reader drops the bytes and
/// keeps scanning. They exist so validation failures have one well-typed
/// path through the code (and through the trace log).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The declared length byte does not match the accumulated byte count.
    #[error("length mismatch: declared {declared}, accumulated {actual}")]
    LengthMismatch { declared: u8, actual: usize },

    /// The declared length is below the 5-byte minimum body.
    #[error("runt frame: declared length {0}")]
    Runt(u8),

    /// The CRC byte does not match the computed checksum.
    #[error("crc mismatch: frame carries {carried:#04X}, computed {computed:#04X}")]
    CrcMismatch { carried: u8, computed: u8 },

    /// The payload would not fit in the 35-byte wire limit.
    #[error("frame too long: {0} byte payload")]
    TooLong(usize),
}

/// A validated frame, stripped of sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Channel byte: a client address, 0xFE (assignment), or 0xFF (broadcast).
    pub dest: u8,
    /// Source designation byte (0xBF from the master and from clients,
    /// 0xAF on status broadcasts).
    pub src: u8,
    /// Message kind code.
    pub kind: u8,
    /// Payload bytes between the kind byte and the CRC.
    pub payload: Vec<u8>,
    /// Wire CRC; for constructed frames this is computed eagerly.
    pub crc: u8,
}

impl Frame {
    /// Builds a frame and computes its CRC.
    pub fn new(dest: u8, src: u8, kind: u8, payload: Vec<u8>) -> Self {
        let length = (MIN_BODY_LEN as usize + payload.len()) as u8;
        let mut body = Vec::with_capacity(4 + payload.len());
        body.push(length);
        body.push(dest);
        body.push(src);
        body.push(kind);
        body.extend_from_slice(&payload);
        let crc = crc::checksum(&body);
        Self {
            dest,
            src,
            kind,
            payload,
            crc,
        }
    }

    /// Encodes the frame for transmission, sentinels included.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLong`] if the payload would push the frame
    /// past the 35-byte wire limit.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let total = self.payload.len() + MIN_BODY_LEN as usize + 2;
        if total > MAX_FRAME_LEN {
            return Err(FrameError::TooLong(self.payload.len()));
        }
        let mut out = Vec::with_capacity(total);
        out.push(SENTINEL);
        out.push((MIN_BODY_LEN as usize + self.payload.len()) as u8);
        out.push(self.dest);
        out.push(self.src);
        out.push(self.kind);
        out.extend_from_slice(&self.payload);
        let crc = crc::checksum(&out[1..]);
        out.push(crc);
        out.push(SENTINEL);
        Ok(out)
    }
}

/// Byte-at-a-time frame reassembler.
///
/// Feed every received byte through [`feed`](Self::feed); a validated
/// [`Frame`] pops out whenever one completes. The accumulation buffer never
/// grows past [`MAX_FRAME_LEN`].
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
    frames_with_errors: usize,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts one byte from the wire.
    ///
    /// Returns a frame when the byte completes one that passes length and
    /// CRC validation. Malformed accumulations are discarded silently; the
    /// master re-polls, so there is nothing useful to do with them.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        self.buf.push(byte);

        // Scan until a sentinel heads the buffer.
        if self.buf[0] != SENTINEL {
            self.buf.clear();
            return None;
        }

        // A repeated start sentinel: either the master stuttered or the
        // previous frame's terminator was retained as our head. Keep one.
        if self.buf.len() == 2 && byte == SENTINEL {
            self.buf.pop();
            return None;
        }

        if byte == SENTINEL && self.buf.len() > 2 {
            let result = Self::validate(&self.buf);
            self.buf.clear();
            // The terminator may double as the next frame's start on a
            // bus that runs frames back to back.
            self.buf.push(SENTINEL);
            match result {
                Ok(frame) => return Some(frame),
                Err(e) => {
                    self.frames_with_errors += 1;
                    trace!(error = %e, total = self.frames_with_errors, "dropped malformed frame");
                }
            }
            return None;
        }

        if self.buf.len() >= MAX_FRAME_LEN {
            self.frames_with_errors += 1;
            trace!(
                total = self.frames_with_errors,
                "discarded over-long accumulation"
            );
            self.buf.clear();
        }

        None
    }

    /// Number of accumulations dropped for framing errors since creation.
    pub fn frames_with_errors(&self) -> usize {
        self.frames_with_errors
    }

    /// Validates `buf` = `[0x7E, length, dest, src, kind, payload.., crc, 0x7E]`.
    fn validate(buf: &[u8]) -> Result<Frame, FrameError> {
        let declared = buf[1];
        let actual = buf.len() - 2;
        if usize::from(declared) != actual {
            return Err(FrameError::LengthMismatch { declared, actual });
        }
        if declared < MIN_BODY_LEN {
            return Err(FrameError::Runt(declared));
        }
        let crc_at = usize::from(declared);
        let carried = buf[crc_at];
        let computed = crc::checksum(&buf[1..crc_at]);
        if carried != computed {
            return Err(FrameError::CrcMismatch { carried, computed });
        }
        Ok(Frame {
            dest: buf[2],
            src: buf[3],
            kind: buf[4],
            payload: buf[5..crc_at].to_vec(),
            crc: carried,
        })
    }
}
