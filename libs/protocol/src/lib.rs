#![no_std]

//! Framing and marshalling for the base-node RPC link.
//!
//! Every request and response is one frame:
//!
//! ```text
//! +----------------+--------------+----------------+-------------------+
//! | boundary "|||" | operation id | payload length | payload           |
//! | 3 bytes        | u16 LE       | u16 LE         | 0..=capacity - 7  |
//! +----------------+--------------+----------------+-------------------+
//! ```
//!
//! The node owns exactly one [`CommandBuffer`] per link and decodes, executes
//! and encodes in place, so the payload ceiling is derived from the buffer
//! capacity and the header widths below.

#[cfg(test)]
extern crate std;

pub mod array;
pub mod buffer;
pub mod command;

pub use array::{ArrayView, Element};
pub use buffer::{CommandBuffer, Span};
pub use command::{Operation, Request, Response};

/// Marker opening every frame; stream receivers resynchronize on it.
pub const FRAME_BOUNDARY: [u8; 3] = *b"|||";
pub const BOUNDARY_LEN: usize = FRAME_BOUNDARY.len();
pub const ID_LEN: usize = core::mem::size_of::<u16>();
pub const LEN_FIELD_LEN: usize = core::mem::size_of::<u16>();
pub const HEADER_LEN: usize = BOUNDARY_LEN + ID_LEN + LEN_FIELD_LEN;

const ID_OFFSET: usize = BOUNDARY_LEN;
const LEN_OFFSET: usize = ID_OFFSET + ID_LEN;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Operation identifier; echoed unchanged in the reply.
    pub id: u16,
    /// Number of payload bytes following the header.
    pub len: u16,
}

impl FrameHeader {
    pub const fn new(id: u16, len: u16) -> Self {
        Self { id, len }
    }

    pub const fn payload_len(&self) -> usize {
        self.len as usize
    }

    pub const fn frame_len(&self) -> usize {
        HEADER_LEN + self.len as usize
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fewer bytes than a complete header.
    Truncated,
    InvalidBoundary,
    /// Declared payload length above the ceiling for this capacity.
    PayloadTooLarge(usize),
    /// Declared payload length disagrees with the bytes received.
    InvalidPayloadLength,
    UnsupportedOperation(u16),
    /// Payload does not match the argument layout of the operation.
    InvalidArguments,
    /// Array bytes are not a whole number of elements.
    MisalignedArray,
    BufferTooSmall,
    /// A result view does not lie inside the command buffer.
    ViewOutOfBounds,
}

/// Coarse classification used by the node when dropping a frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was malformed; it is dropped without a reply.
    Framing,
    /// A write would have left the buffer; only the current frame is aborted.
    Capacity,
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::BufferTooSmall | Error::ViewOutOfBounds => ErrorKind::Capacity,
            _ => ErrorKind::Framing,
        }
    }
}

/// Largest payload a frame can carry in a buffer of `capacity` bytes.
pub const fn max_payload_size(capacity: usize) -> usize {
    capacity.saturating_sub(HEADER_LEN)
}

/// Parse the fixed header at the start of `buf` without looking at the payload.
pub fn decode_header(buf: &[u8]) -> Result<FrameHeader, Error> {
    if buf.len() < HEADER_LEN {
        return Err(Error::Truncated);
    }
    if buf[..BOUNDARY_LEN] != FRAME_BOUNDARY {
        return Err(Error::InvalidBoundary);
    }

    let id = u16::from_le_bytes([buf[ID_OFFSET], buf[ID_OFFSET + 1]]);
    let len = u16::from_le_bytes([buf[LEN_OFFSET], buf[LEN_OFFSET + 1]]);
    Ok(FrameHeader { id, len })
}

/// Validate a received frame against the buffer `capacity` it arrived in.
///
/// `buf` must hold exactly the bytes received for one frame.
pub fn decode_frame(buf: &[u8], capacity: usize) -> Result<(FrameHeader, &[u8]), Error> {
    let header = decode_header(buf)?;
    let payload_len = header.payload_len();
    if payload_len > max_payload_size(capacity) {
        return Err(Error::PayloadTooLarge(payload_len));
    }
    if header.frame_len() != buf.len() {
        return Err(Error::InvalidPayloadLength);
    }

    Ok((header, &buf[HEADER_LEN..]))
}

/// Write a header into the first [`HEADER_LEN`] bytes of `out`.
pub fn encode_header(header: FrameHeader, out: &mut [u8]) -> Result<(), Error> {
    let out = out.get_mut(..HEADER_LEN).ok_or(Error::BufferTooSmall)?;
    out[..BOUNDARY_LEN].copy_from_slice(&FRAME_BOUNDARY);
    out[ID_OFFSET..LEN_OFFSET].copy_from_slice(&header.id.to_le_bytes());
    out[LEN_OFFSET..].copy_from_slice(&header.len.to_le_bytes());
    Ok(())
}

/// Encode a complete frame into `out`, whose length is the buffer capacity.
///
/// Nothing is written unless the whole frame fits.
pub fn encode_frame(id: u16, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    if payload.len() > max_payload_size(out.len()) {
        return Err(Error::BufferTooSmall);
    }
    let len = u16::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge(payload.len()))?;

    let header = FrameHeader { id, len };
    encode_header(header, out)?;
    out[HEADER_LEN..header.frame_len()].copy_from_slice(payload);
    Ok(header.frame_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_declared_len(declared: u16, actual: usize) -> std::vec::Vec<u8> {
        let mut raw = std::vec![0u8; HEADER_LEN + actual];
        encode_header(FrameHeader::new(0x0F, declared), &mut raw).unwrap();
        raw
    }

    #[test]
    fn header_width_is_seven_bytes() {
        assert_eq!(HEADER_LEN, 7);
    }

    #[test]
    fn max_payload_tracks_capacity() {
        for capacity in HEADER_LEN..=512 {
            assert_eq!(max_payload_size(capacity), capacity - 7);
        }
        assert_eq!(max_payload_size(27), 20);
        assert_eq!(max_payload_size(3), 0);
    }

    #[test]
    fn frame_roundtrip() {
        let mut raw = [0u8; 32];
        let len = encode_frame(0x0010, b"hello", &mut raw).unwrap();
        assert_eq!(len, HEADER_LEN + 5);
        assert_eq!(&raw[..3], b"|||");
        assert_eq!(&raw[3..7], &[0x10, 0x00, 0x05, 0x00]);

        let (header, payload) = decode_frame(&raw[..len], raw.len()).unwrap();
        assert_eq!(header, FrameHeader::new(0x0010, 5));
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn empty_payload_is_valid() {
        let mut raw = [0u8; HEADER_LEN];
        let len = encode_frame(0x0002, &[], &mut raw).unwrap();
        let (header, payload) = decode_frame(&raw[..len], raw.len()).unwrap();
        assert_eq!(header.len, 0);
        assert!(payload.is_empty());
    }

    #[test]
    fn declared_len_at_ceiling_accepted() {
        let capacity = 27;
        let raw = frame_with_declared_len(20, 20);
        let (header, payload) = decode_frame(&raw, capacity).unwrap();
        assert_eq!(header.payload_len(), 20);
        assert_eq!(payload.len(), 20);
    }

    #[test]
    fn declared_len_above_ceiling_rejected() {
        let capacity = 27;
        let raw = frame_with_declared_len(21, 21);
        let err = decode_frame(&raw, capacity).unwrap_err();
        assert_eq!(err, Error::PayloadTooLarge(21));
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn declared_len_beyond_received_rejected() {
        let raw = frame_with_declared_len(10, 4);
        let err = decode_frame(&raw, 64).unwrap_err();
        assert!(matches!(err, Error::InvalidPayloadLength));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let raw = frame_with_declared_len(2, 6);
        let err = decode_frame(&raw, 64).unwrap_err();
        assert!(matches!(err, Error::InvalidPayloadLength));
    }

    #[test]
    fn truncated_header_rejected() {
        let err = decode_frame(b"|||\x01", 32).unwrap_err();
        assert!(matches!(err, Error::Truncated));
    }

    #[test]
    fn wrong_boundary_rejected() {
        let mut raw = [0u8; 16];
        let len = encode_frame(1, &[], &mut raw).unwrap();
        raw[1] = b'#';
        let err = decode_frame(&raw[..len], raw.len()).unwrap_err();
        assert!(matches!(err, Error::InvalidBoundary));
    }

    #[test]
    fn encode_refuses_overflow_without_writing() {
        let mut raw = [0xAAu8; 27];
        let payload = [0x55u8; 21];
        let err = encode_frame(0x000F, &payload, &mut raw).unwrap_err();
        assert_eq!(err, Error::BufferTooSmall);
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert!(raw.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn encode_fills_capacity_exactly() {
        let mut raw = [0u8; 27];
        let payload = [0x42u8; 20];
        let len = encode_frame(0x000F, &payload, &mut raw).unwrap();
        assert_eq!(len, raw.len());
    }
}
