//! The single reusable frame buffer shared by decode, dispatch and encode.

use heapless::Vec;

use crate::array::Element;
use crate::{
    Error, FrameHeader, HEADER_LEN, decode_frame, encode_frame, encode_header, max_payload_size,
};

/// Location of reply bytes inside the payload region of a [`CommandBuffer`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    pub const EMPTY: Span = Span { offset: 0, len: 0 };

    /// The first `len` payload bytes.
    pub const fn prefix(len: usize) -> Self {
        Self { offset: 0, len }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Fixed-capacity storage for one in-flight frame.
///
/// `N` is the link packet size. The filled length tracks either the bytes of
/// the received request or the staged reply; capacity never changes.
pub struct CommandBuffer<const N: usize> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> CommandBuffer<N> {
    pub const CAPACITY: usize = N;
    pub const MAX_PAYLOAD: usize = max_payload_size(N);

    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub const fn max_payload_size(&self) -> usize {
        Self::MAX_PAYLOAD
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Filled bytes: the received request, or the reply once staged.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Replace the contents with one received frame.
    pub fn load(&mut self, received: &[u8]) -> Result<(), Error> {
        self.bytes.clear();
        self.bytes
            .extend_from_slice(received)
            .map_err(|_| Error::BufferTooSmall)
    }

    /// Append one byte from a stream transport.
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        self.bytes.push(byte).map_err(|_| Error::BufferTooSmall)
    }

    /// Validate the loaded bytes as a request frame.
    pub fn decode_request(&self) -> Result<FrameHeader, Error> {
        decode_frame(&self.bytes, N).map(|(header, _)| header)
    }

    /// Payload bytes of the loaded frame.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(HEADER_LEN..).unwrap_or(&[])
    }

    /// The whole payload region, for operations that produce their result in
    /// place. Bytes already received are preserved.
    pub fn scratch(&mut self) -> &mut [u8] {
        let _ = self.bytes.resize(N, 0);
        self.bytes.get_mut(HEADER_LEN..).unwrap_or(&mut [])
    }

    /// Write a scalar result at the start of the payload.
    pub fn write_scalar<T: Element>(&mut self, value: T) -> Result<Span, Error> {
        let out = self
            .scratch()
            .get_mut(..T::WIDTH)
            .ok_or(Error::BufferTooSmall)?;
        value.write_le(out);
        Ok(Span::prefix(T::WIDTH))
    }

    /// Locate `bytes`, which must borrow from this buffer's payload region.
    pub fn span_of(&self, bytes: &[u8]) -> Result<Span, Error> {
        if bytes.is_empty() {
            return Ok(Span::EMPTY);
        }

        let base = self.bytes.as_ptr() as usize + HEADER_LEN;
        let limit = self.bytes.as_ptr() as usize + self.bytes.len();
        let start = bytes.as_ptr() as usize;
        let end = start + bytes.len();
        if start < base || end > limit {
            return Err(Error::ViewOutOfBounds);
        }

        Ok(Span {
            offset: start - base,
            len: bytes.len(),
        })
    }

    /// Turn the buffer into a reply frame for operation `id` carrying the
    /// payload bytes at `span`. Returns the frame length.
    pub fn stage_reply(&mut self, id: u16, span: Span) -> Result<usize, Error> {
        let start = HEADER_LEN + span.offset;
        let end = start + span.len;
        if span.len > Self::MAX_PAYLOAD || end > N {
            return Err(Error::BufferTooSmall);
        }
        if end > self.bytes.len() {
            return Err(Error::ViewOutOfBounds);
        }
        let len = u16::try_from(span.len).map_err(|_| Error::PayloadTooLarge(span.len))?;

        self.bytes.copy_within(start..end, HEADER_LEN);
        self.bytes.truncate(HEADER_LEN + span.len);
        encode_header(FrameHeader::new(id, len), &mut self.bytes)?;
        Ok(self.bytes.len())
    }

    /// Encode a complete frame from an external payload, as a host would.
    pub fn stage_frame(&mut self, id: u16, payload: &[u8]) -> Result<usize, Error> {
        if payload.len() > Self::MAX_PAYLOAD {
            return Err(Error::BufferTooSmall);
        }
        self.bytes.clear();
        let _ = self.bytes.resize(N, 0);
        let len = encode_frame(id, payload, &mut self.bytes)?;
        self.bytes.truncate(len);
        Ok(len)
    }
}

impl<const N: usize> Default for CommandBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
