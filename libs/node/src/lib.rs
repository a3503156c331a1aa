#![no_std]

//! Device side of the base-node RPC link.
//!
//! [`Node`] is the command surface a host drives through framed requests;
//! [`dispatch::process`] runs one request in place inside a
//! [`CommandBuffer`](basenode_protocol::CommandBuffer), and the
//! [`endpoint`] types glue that to an I2C slave or a byte stream.

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod address;
pub mod config;
pub mod dispatch;
pub mod eeprom;
pub mod endpoint;
pub mod hal;

#[cfg(test)]
mod testing;

pub use basenode_protocol as protocol;

pub use address::{AddressState, AddressStore, BROADCAST_ADDRESS, EEPROM_ADDRESS_OFFSET};
pub use config::{NodeConfig, NodeProperties};
pub use dispatch::process;
pub use endpoint::{I2cEndpoint, SerialEndpoint};
pub use hal::{Board, BusTransceiver, Clock, MemoryProbe, NonVolatile, Pins};

use basenode_protocol::{ArrayView, Element, HEADER_LEN, max_payload_size};

/// Smallest packet that can carry the widest scalar reply (`u32`).
pub const MIN_PACKET_SIZE: usize = HEADER_LEN + 4;

/// Payload produced by [`Node::str_demo`].
pub const DEMO_STRING: &[u8] = b"hello";

/// A node on a link whose packets are at most `N` bytes.
///
/// Operations never fail; bad arguments are the board's concern and storage
/// failures are logged.
pub struct Node<B: Board, const N: usize> {
    board: B,
    config: NodeConfig,
    address: AddressStore,
}

impl<B: Board, const N: usize> Node<B, N> {
    /// Take ownership of `board` and join the bus at the persisted address.
    pub fn new(board: B, config: NodeConfig) -> Self {
        const { assert!(N >= MIN_PACKET_SIZE, "packet size too small for u32 replies") };
        let mut node = Self {
            board,
            config,
            address: AddressStore::new(config.address_offset),
        };
        node.address.begin(&mut node.board);
        node
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn into_board(self) -> B {
        self.board
    }

    pub fn microseconds(&self) -> u32 {
        self.board.micros()
    }

    pub fn milliseconds(&self) -> u32 {
        self.board.millis()
    }

    pub fn delay_us(&mut self, us: u16) {
        if us > 0 {
            self.board.delay_us(us);
        }
    }

    pub fn delay_ms(&mut self, ms: u16) {
        if ms > 0 {
            self.board.delay_ms(ms);
        }
    }

    pub fn max_payload_size(&self) -> u32 {
        max_payload_size(N) as u32
    }

    pub fn ram_free(&self) -> u32 {
        self.board.free_memory()
    }

    pub fn pin_mode(&mut self, pin: u8, mode: u8) {
        self.board.pin_mode(pin, mode);
    }

    pub fn digital_read(&mut self, pin: u8) -> u8 {
        self.board.digital_read(pin)
    }

    pub fn digital_write(&mut self, pin: u8, value: u8) {
        self.board.digital_write(pin, value);
    }

    pub fn analog_read(&mut self, pin: u8) -> u16 {
        self.board.analog_read(pin)
    }

    pub fn analog_write(&mut self, pin: u8, value: u8) {
        self.board.analog_write(pin, value);
    }

    pub fn i2c_address(&self) -> u8 {
        self.address.get_address()
    }

    pub fn address_state(&self) -> AddressState {
        self.address.state()
    }

    /// Rebind the bus address and persist it. Takes effect on the bus before
    /// the reply to this request is sent.
    pub fn set_i2c_address(&mut self, address: u8) -> u8 {
        self.address.set_address(&mut self.board, address)
    }

    pub fn array_length(&self, array: ArrayView<'_, u8>) -> u16 {
        array.len() as u16
    }

    /// Return `array` itself; the reply reuses the request bytes.
    pub fn echo_array<'a, T: Element>(&self, array: ArrayView<'a, T>) -> ArrayView<'a, T> {
        array
    }

    /// Write [`DEMO_STRING`] into the start of `out`, truncated to fit.
    pub fn str_demo<'a>(&self, out: &'a mut [u8]) -> ArrayView<'a, u8> {
        fill(out, DEMO_STRING)
    }

    pub fn str_echo<'a>(&self, msg: ArrayView<'a, u8>) -> ArrayView<'a, u8> {
        msg
    }

    /// Read `out.len()` bytes of storage starting at `address`.
    ///
    /// A failed read yields an empty view.
    pub fn eeprom_read_block<'a>(
        &mut self,
        address: u16,
        out: &'a mut [u8],
    ) -> ArrayView<'a, u8> {
        if self.board.read_block(address, out).is_err() {
            warn!("storage read failed at {=u16:#x}", address);
            return ArrayView::empty();
        }
        ArrayView::from(&*out)
    }

    /// Write `data` to storage at `address`.
    ///
    /// Ranges covering the address byte are refused so the cached and
    /// persisted bus address cannot diverge behind the node's back.
    pub fn eeprom_update_block(&mut self, address: u16, data: ArrayView<'_, u8>) -> bool {
        if self.address.overlaps(address, data.byte_len()) {
            warn!(
                "refused storage write over address byte at {=u16:#x}",
                self.address.offset()
            );
            return false;
        }
        if self.board.write_block(address, data.as_bytes()).is_err() {
            warn!("storage write failed at {=u16:#x}", address);
            return false;
        }
        true
    }

    pub fn name<'a>(&self, out: &'a mut [u8]) -> ArrayView<'a, u8> {
        fill(out, self.config.properties.name.as_bytes())
    }

    pub fn manufacturer<'a>(&self, out: &'a mut [u8]) -> ArrayView<'a, u8> {
        fill(out, self.config.properties.manufacturer.as_bytes())
    }

    pub fn software_version<'a>(&self, out: &'a mut [u8]) -> ArrayView<'a, u8> {
        fill(out, self.config.properties.software_version.as_bytes())
    }

    pub fn url<'a>(&self, out: &'a mut [u8]) -> ArrayView<'a, u8> {
        fill(out, self.config.properties.url.as_bytes())
    }
}

/// Copy as much of `src` as fits to the start of `out`.
fn fill<'a>(out: &'a mut [u8], src: &[u8]) -> ArrayView<'a, u8> {
    let len = src.len().min(out.len());
    out[..len].copy_from_slice(&src[..len]);
    ArrayView::from(&out[..len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BoardEvent, MockBoard};

    type TestNode = Node<MockBoard, 27>;

    fn node() -> TestNode {
        Node::new(MockBoard::with_address(0x10), NodeConfig::default())
    }

    #[test]
    fn construction_binds_persisted_address() {
        let node = node();
        assert_eq!(node.address_state(), AddressState::Bound(0x10));
        assert_eq!(node.i2c_address(), 0x10);
        assert_eq!(node.board().bus_address(), Some(0x10));
    }

    #[test]
    fn max_payload_follows_packet_size() {
        assert_eq!(node().max_payload_size(), 20);
        let big: Node<MockBoard, 64> = Node::new(MockBoard::new(), NodeConfig::default());
        assert_eq!(big.max_payload_size(), 57);
    }

    #[test]
    fn smallest_packet_serves_word_replies() {
        use basenode_protocol::{CommandBuffer, Request};

        let mut node: Node<MockBoard, MIN_PACKET_SIZE> =
            Node::new(MockBoard::with_address(0x10), NodeConfig::default());
        node.board_mut().micros = 7;
        let mut buf = CommandBuffer::new();

        buf.stage_frame(Request::Microseconds.operation().id(), &[]).unwrap();
        let len = crate::process(&mut node, &mut buf).unwrap();
        assert_eq!(len, MIN_PACKET_SIZE);
        assert_eq!(&buf.as_bytes()[HEADER_LEN..], &7u32.to_le_bytes());
        assert_eq!(node.max_payload_size(), 4);
    }

    #[test]
    fn zero_delays_are_no_ops() {
        let mut node = node();
        node.board_mut().events.clear();
        node.delay_us(0);
        node.delay_ms(0);
        assert!(node.board().events.is_empty());

        node.delay_ms(5);
        assert_eq!(node.board().events, [BoardEvent::DelayMs(5)]);
    }

    #[test]
    fn pins_pass_through() {
        let mut node = node();
        node.pin_mode(3, 1);
        node.digital_write(3, 1);
        node.analog_write(5, 200);
        node.board_mut().analog_in[2] = 1023;

        assert_eq!(node.board().pin_modes[3], 1);
        assert_eq!(node.digital_read(3), 1);
        assert_eq!(node.board().analog_out[5], 200);
        assert_eq!(node.analog_read(2), 1023);
    }

    #[test]
    fn address_survives_restart() {
        let mut node = node();
        assert_eq!(node.set_i2c_address(0x21), 0x21);
        assert_eq!(node.i2c_address(), 0x21);

        let board = node.into_board();
        let restarted: TestNode = Node::new(board, NodeConfig::default());
        assert_eq!(restarted.i2c_address(), 0x21);
    }

    #[test]
    fn str_demo_truncates_to_output() {
        let node = node();
        let mut out = [0u8; 20];
        assert_eq!(node.str_demo(&mut out).as_bytes(), b"hello");

        let mut short = [0u8; 3];
        assert_eq!(node.str_demo(&mut short).as_bytes(), b"hel");
    }

    #[test]
    fn echo_returns_the_same_bytes() {
        let node = node();
        let raw = [1u8, 0, 0, 0, 2, 0, 0, 0];
        let words = ArrayView::<u32>::from_bytes(&raw).unwrap();
        let echoed = node.echo_array(words);
        assert_eq!(echoed.as_bytes().as_ptr(), raw.as_ptr());
        assert_eq!(node.array_length(ArrayView::from(&raw[..])), 8);
    }

    #[test]
    fn eeprom_block_roundtrip() {
        let mut node = node();
        assert!(node.eeprom_update_block(0x20, ArrayView::from(&b"abc"[..])));

        let mut out = [0u8; 3];
        assert_eq!(node.eeprom_read_block(0x20, &mut out).as_bytes(), b"abc");
    }

    #[test]
    fn eeprom_update_refuses_address_byte() {
        let mut node = node();
        assert!(!node.eeprom_update_block(0, ArrayView::from(&[0x55u8, 0x66][..])));
        assert_eq!(node.board().eeprom[0], 0x10);
        assert_eq!(node.i2c_address(), 0x10);
    }

    #[test]
    fn eeprom_read_failure_is_empty() {
        let mut node = node();
        let mut out = [0u8; 4];
        assert!(node.eeprom_read_block(0xFFFE, &mut out).is_empty());
    }

    #[test]
    fn properties_come_from_config() {
        let props = NodeProperties::new("pump", "acme", "1.2.3", "https://example.invalid");
        let config = NodeConfig::default().with_properties(props);
        let node: TestNode = Node::new(MockBoard::new(), config);
        let mut out = [0u8; 32];
        assert_eq!(node.name(&mut out).as_bytes(), b"pump");
        assert_eq!(node.manufacturer(&mut out).as_bytes(), b"acme");
        assert_eq!(node.software_version(&mut out).as_bytes(), b"1.2.3");
        assert_eq!(node.url(&mut out).as_bytes(), b"https://example.invalid");
    }
}
