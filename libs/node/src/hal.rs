//! Board collaborators the node drives.
//!
//! These are thin pass-throughs to the platform I/O layer. Range checks on
//! pin numbers and modes belong to the implementation, not to the node.

pub trait Clock {
    /// Microseconds since boot; wraps at `u32::MAX`.
    fn micros(&self) -> u32;

    /// Milliseconds since boot; wraps at `u32::MAX`.
    fn millis(&self) -> u32;

    fn delay_us(&mut self, us: u16);

    fn delay_ms(&mut self, ms: u16);
}

pub trait Pins {
    fn pin_mode(&mut self, pin: u8, mode: u8);

    fn digital_read(&mut self, pin: u8) -> u8;

    fn digital_write(&mut self, pin: u8, value: u8);

    fn analog_read(&mut self, pin: u8) -> u16;

    fn analog_write(&mut self, pin: u8, value: u8);
}

pub trait MemoryProbe {
    /// Free dynamic memory in bytes.
    fn free_memory(&self) -> u32;
}

/// Byte-addressed non-volatile storage (EEPROM or emulation).
///
/// Writes are synchronous; there is no read-back verification.
pub trait NonVolatile {
    type Error;

    fn read_block(&mut self, offset: u16, out: &mut [u8]) -> Result<(), Self::Error>;

    fn write_block(&mut self, offset: u16, data: &[u8]) -> Result<(), Self::Error>;
}

/// Slave-side bus transceiver.
pub trait BusTransceiver {
    /// (Re)join the bus as a slave at `address`.
    fn begin(&mut self, address: u8);
}

/// Everything a node needs from its board.
pub trait Board: Clock + Pins + MemoryProbe + NonVolatile + BusTransceiver {}

impl<T> Board for T where T: Clock + Pins + MemoryProbe + NonVolatile + BusTransceiver {}
