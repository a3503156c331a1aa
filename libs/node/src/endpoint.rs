//! Transport glue: one frame in, at most one frame out.

use basenode_protocol::{
    BOUNDARY_LEN, CommandBuffer, Error, FRAME_BOUNDARY, HEADER_LEN, decode_header,
};

use crate::Node;
use crate::dispatch::process;
use crate::hal::Board;

/// I2C slave endpoint.
///
/// Wire the two methods to the slave receive and request interrupts. A
/// transfer delivers a whole frame; the reply is clocked out on the next
/// master read.
pub struct I2cEndpoint<const N: usize> {
    buf: CommandBuffer<N>,
    reply_len: Option<usize>,
}

impl<const N: usize> I2cEndpoint<N> {
    pub const fn new() -> Self {
        Self {
            buf: CommandBuffer::new(),
            reply_len: None,
        }
    }

    pub fn has_reply(&self) -> bool {
        self.reply_len.is_some()
    }

    /// Handle one received frame. Any reply not yet read is discarded.
    pub fn on_receive<B: Board>(
        &mut self,
        node: &mut Node<B, N>,
        received: &[u8],
    ) -> Result<usize, Error> {
        self.reply_len = None;
        let result = self
            .buf
            .load(received)
            .and_then(|()| process(node, &mut self.buf));

        match result {
            Ok(len) => {
                self.reply_len = Some(len);
                Ok(len)
            }
            Err(err) => {
                warn!("dropped frame: {}", err);
                self.buf.clear();
                Err(err)
            }
        }
    }

    /// Bytes to send for a master read: the staged reply once, then nothing.
    pub fn on_request(&mut self) -> &[u8] {
        match self.reply_len.take() {
            Some(len) => &self.buf.as_bytes()[..len],
            None => &[],
        }
    }
}

impl<const N: usize> Default for I2cEndpoint<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-stream endpoint (UART, USB CDC).
///
/// Hunts for the frame boundary and runs each frame once its declared payload
/// has arrived. Frames declaring more than the payload ceiling are dropped as
/// soon as their header is complete.
pub struct SerialEndpoint<const N: usize> {
    buf: CommandBuffer<N>,
    replied: bool,
}

impl<const N: usize> SerialEndpoint<N> {
    pub const fn new() -> Self {
        Self {
            buf: CommandBuffer::new(),
            replied: false,
        }
    }

    /// Number of bytes collected towards the current frame.
    pub fn pending(&self) -> usize {
        if self.replied { 0 } else { self.buf.len() }
    }

    /// Feed one received byte; returns the reply frame when it completes a
    /// request.
    pub fn push<B: Board>(&mut self, node: &mut Node<B, N>, byte: u8) -> Option<&[u8]> {
        if self.replied {
            self.buf.clear();
            self.replied = false;
        }

        let filled = self.buf.len();
        // Extra boundary bytes before a frame keep the hunt at "|||"; no
        // operation id has a 0x7C low byte.
        if filled == BOUNDARY_LEN && byte == FRAME_BOUNDARY[0] {
            return None;
        }
        if filled < BOUNDARY_LEN && byte != FRAME_BOUNDARY[filled] {
            self.buf.clear();
            if byte != FRAME_BOUNDARY[0] {
                return None;
            }
        }
        if let Err(err) = self.buf.push(byte) {
            self.drop_frame(err);
            return None;
        }
        if self.buf.len() < HEADER_LEN {
            return None;
        }

        let header = match decode_header(self.buf.as_bytes()) {
            Ok(header) => header,
            Err(err) => {
                self.drop_frame(err);
                return None;
            }
        };
        if header.payload_len() > self.buf.max_payload_size() {
            self.drop_frame(Error::PayloadTooLarge(header.payload_len()));
            return None;
        }
        if self.buf.len() < header.frame_len() {
            return None;
        }

        match process(node, &mut self.buf) {
            Ok(len) => {
                self.replied = true;
                Some(&self.buf.as_bytes()[..len])
            }
            Err(err) => {
                self.drop_frame(err);
                None
            }
        }
    }

    fn drop_frame(&mut self, err: Error) {
        warn!("dropped frame: {}", err);
        self.buf.clear();
    }
}

impl<const N: usize> Default for SerialEndpoint<N> {
    fn default() -> Self {
        Self::new()
    }
}
