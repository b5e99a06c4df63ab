//! Self-describing binary payload encoding.
//!
//! The queue treats payloads as opaque byte sequences; this module
//! supplies the default injection between typed values and those bytes.
//! Scalar types and strings are framed as a one-byte type tag, a
//! fixed-width big-endian body, and a CRC32 trailer computed over the
//! tag and body. Distinct tags per integer width mean a value written as
//! an `i32` can never be misread as an `i64`, and the trailer makes a
//! corrupt record fail at decode instead of producing garbage.
//!
//! `Vec<u8>` is deliberately exempt from framing: it round-trips as raw
//! octets (any length, including zero) so callers can layer their own
//! serializer on top of the queue.

use crc32fast::Hasher;

/// Error produced while encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload carried a different type tag than the decoder
    /// expected.
    #[error("expected type tag {expected:#04x}, found {found:#04x}")]
    UnexpectedTag {
        /// The tag the requested type encodes with.
        expected: u8,
        /// The tag found in the payload.
        found: u8,
    },

    /// The payload ended before the frame was complete.
    #[error("payload truncated: needed {needed} bytes, had {remaining}")]
    Truncated {
        /// Bytes the decoder needed.
        needed: usize,
        /// Bytes actually present.
        remaining: usize,
    },

    /// The payload was longer than the decoded value accounts for.
    #[error("payload has {0} trailing bytes")]
    TrailingBytes(usize),

    /// The CRC32 trailer did not match the frame contents.
    #[error("payload checksum mismatch")]
    ChecksumMismatch,

    /// The payload body held a value outside the type's domain.
    #[error("payload body is not a valid {0}")]
    BadValue(&'static str),
}

/// A value that can be stored in a persistent queue.
///
/// Implementations must be injective: decoding the bytes produced by
/// `encode` yields a value equal to the original, and bytes that were
/// not produced for this type fail to decode.
pub trait Element: Sized {
    /// Append this value's serialized form to `buf`.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Reconstruct a value from the exact byte sequence `encode`
    /// produced.
    fn decode(bytes: &[u8]) -> Result<Self, WireError>;
}

const TAG_BOOL: u8 = 0x01;
const TAG_I32: u8 = 0x02;
const TAG_I64: u8 = 0x03;
const TAG_U32: u8 = 0x04;
const TAG_U64: u8 = 0x05;
const TAG_F32: u8 = 0x06;
const TAG_F64: u8 = 0x07;
const TAG_STR: u8 = 0x08;

/// Bytes of frame overhead around a tagged body: tag plus CRC trailer.
const FRAME_OVERHEAD: usize = 5;

fn put_frame(buf: &mut Vec<u8>, tag: u8, body: &[u8]) {
    let start = buf.len();
    buf.push(tag);
    buf.extend_from_slice(body);

    let mut hasher = Hasher::new();
    hasher.update(&buf[start..]);
    buf.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Validate the tag and trailer of a frame, returning its body.
fn open_frame(bytes: &[u8], tag: u8) -> Result<&[u8], WireError> {
    if bytes.len() < FRAME_OVERHEAD {
        return Err(WireError::Truncated {
            needed: FRAME_OVERHEAD,
            remaining: bytes.len(),
        });
    }

    let (frame, trailer) = bytes.split_at(bytes.len() - 4);

    let mut hasher = Hasher::new();
    hasher.update(frame);
    let expected = hasher.finalize().to_be_bytes();

    if trailer != &expected[..] {
        return Err(WireError::ChecksumMismatch);
    }

    if frame[0] != tag {
        return Err(WireError::UnexpectedTag {
            expected: tag,
            found: frame[0],
        });
    }

    Ok(&frame[1..])
}

/// Validate that a fixed-width body has exactly `width` bytes.
fn fixed_body(body: &[u8], width: usize) -> Result<&[u8], WireError> {
    if body.len() < width {
        return Err(WireError::Truncated {
            needed: width,
            remaining: body.len(),
        });
    }

    if body.len() > width {
        return Err(WireError::TrailingBytes(body.len() - width));
    }

    Ok(body)
}

macro_rules! numeric_element {
    ($type:ty, $tag:expr, $width:expr) => {
        impl Element for $type {
            fn encode(&self, buf: &mut Vec<u8>) {
                put_frame(buf, $tag, &self.to_be_bytes());
            }

            fn decode(bytes: &[u8]) -> Result<Self, WireError> {
                let body = fixed_body(open_frame(bytes, $tag)?, $width)?;
                let mut raw = [0u8; $width];
                raw.copy_from_slice(body);

                Ok(<$type>::from_be_bytes(raw))
            }
        }
    };
}

numeric_element!(i32, TAG_I32, 4);
numeric_element!(i64, TAG_I64, 8);
numeric_element!(u32, TAG_U32, 4);
numeric_element!(u64, TAG_U64, 8);
numeric_element!(f32, TAG_F32, 4);
numeric_element!(f64, TAG_F64, 8);

impl Element for bool {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_frame(buf, TAG_BOOL, &[u8::from(*self)]);
    }

    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        match fixed_body(open_frame(bytes, TAG_BOOL)?, 1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(WireError::BadValue("bool")),
        }
    }
}

impl Element for String {
    fn encode(&self, buf: &mut Vec<u8>) {
        let mut body = Vec::with_capacity(4 + self.len());
        body.extend_from_slice(&(self.len() as u32).to_be_bytes());
        body.extend_from_slice(self.as_bytes());

        put_frame(buf, TAG_STR, &body);
    }

    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let body = open_frame(bytes, TAG_STR)?;

        if body.len() < 4 {
            return Err(WireError::Truncated {
                needed: 4,
                remaining: body.len(),
            });
        }

        let declared = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize;
        let text = fixed_body(&body[4..], declared)?;

        String::from_utf8(text.to_vec()).map_err(|_| WireError::BadValue("utf-8 string"))
    }
}

/// Raw octets round-trip unframed so any byte sequence, including the
/// empty one, is a valid payload.
impl Element for Vec<u8> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }

    fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(bytes.to_vec())
    }
}
