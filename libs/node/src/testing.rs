//! In-memory board for unit tests.

use std::vec::Vec;

use crate::hal::{BusTransceiver, Clock, MemoryProbe, NonVolatile, Pins};

pub const PIN_COUNT: usize = 32;
pub const EEPROM_BYTES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Begin(u8),
    Persist { offset: u16, data: Vec<u8> },
    DelayUs(u16),
    DelayMs(u16),
}

pub struct MockBoard {
    pub micros: u32,
    pub millis: u32,
    pub free_memory: u32,
    pub pin_modes: [u8; PIN_COUNT],
    pub digital: [u8; PIN_COUNT],
    pub analog_in: [u16; PIN_COUNT],
    pub analog_out: [u8; PIN_COUNT],
    pub eeprom: [u8; EEPROM_BYTES],
    pub fail_writes: bool,
    pub events: Vec<BoardEvent>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            micros: 0,
            millis: 0,
            free_memory: 1024,
            pin_modes: [0; PIN_COUNT],
            digital: [0; PIN_COUNT],
            analog_in: [0; PIN_COUNT],
            analog_out: [0; PIN_COUNT],
            eeprom: [0; EEPROM_BYTES],
            fail_writes: false,
            events: Vec::new(),
        }
    }

    /// Board whose storage already holds `address` at offset 0.
    pub fn with_address(address: u8) -> Self {
        let mut board = Self::new();
        board.eeprom[0] = address;
        board
    }

    pub fn bus_address(&self) -> Option<u8> {
        self.events.iter().rev().find_map(|event| match event {
            BoardEvent::Begin(address) => Some(*address),
            _ => None,
        })
    }
}

impl Clock for MockBoard {
    fn micros(&self) -> u32 {
        self.micros
    }

    fn millis(&self) -> u32 {
        self.millis
    }

    fn delay_us(&mut self, us: u16) {
        self.events.push(BoardEvent::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u16) {
        self.events.push(BoardEvent::DelayMs(ms));
    }
}

impl Pins for MockBoard {
    fn pin_mode(&mut self, pin: u8, mode: u8) {
        self.pin_modes[pin as usize] = mode;
    }

    fn digital_read(&mut self, pin: u8) -> u8 {
        self.digital[pin as usize]
    }

    fn digital_write(&mut self, pin: u8, value: u8) {
        self.digital[pin as usize] = value;
    }

    fn analog_read(&mut self, pin: u8) -> u16 {
        self.analog_in[pin as usize]
    }

    fn analog_write(&mut self, pin: u8, value: u8) {
        self.analog_out[pin as usize] = value;
    }
}

impl MemoryProbe for MockBoard {
    fn free_memory(&self) -> u32 {
        self.free_memory
    }
}

impl NonVolatile for MockBoard {
    type Error = ();

    fn read_block(&mut self, offset: u16, out: &mut [u8]) -> Result<(), ()> {
        let start = offset as usize;
        let src = self.eeprom.get(start..start + out.len()).ok_or(())?;
        out.copy_from_slice(src);
        Ok(())
    }

    fn write_block(&mut self, offset: u16, data: &[u8]) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        let start = offset as usize;
        let dst = self.eeprom.get_mut(start..start + data.len()).ok_or(())?;
        dst.copy_from_slice(data);
        self.events.push(BoardEvent::Persist {
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }
}

impl BusTransceiver for MockBoard {
    fn begin(&mut self, address: u8) {
        self.events.push(BoardEvent::Begin(address));
    }
}
