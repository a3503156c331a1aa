//! Blocking driver for 24xx-series I2C EEPROMs with a 16-bit word address
//! (M24C64, 24LC64 and larger).

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::Vec;

use crate::hal::NonVolatile;

pub const EEPROM_I2C_ADDR_7BIT: u8 = 0x50;
pub const EEPROM_PAGE_SIZE_BYTES: usize = 32;
/// M24C64: 64 Kbit.
pub const EEPROM_SIZE_BYTES: usize = 8 * 1024;

// Typical tWR is a few ms; keep a generous budget.
const POLL_TIMEOUT_MS: u32 = 20;
// Write at most this many bytes per cycle even on parts with larger pages.
const WRITE_CHUNK_MAX: usize = 16;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromError {
    I2c,
    Timeout,
    /// Access runs past the end of the device.
    OutOfRange,
}

/// EEPROM on an exclusively owned I2C bus.
///
/// Page writes never cross an `EEPROM_PAGE_SIZE_BYTES` boundary and each
/// chunk waits for the internal write cycle by acknowledge polling.
pub struct Eeprom24x<I2C, D> {
    i2c: I2C,
    delay: D,
    addr_7bit: u8,
    size_bytes: usize,
}

impl<I2C: I2c, D: DelayNs> Eeprom24x<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_geometry(i2c, delay, EEPROM_I2C_ADDR_7BIT, EEPROM_SIZE_BYTES)
    }

    pub fn with_geometry(i2c: I2C, delay: D, addr_7bit: u8, size_bytes: usize) -> Self {
        Self {
            i2c,
            delay,
            addr_7bit,
            size_bytes,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    pub fn read(&mut self, addr: u16, out: &mut [u8]) -> Result<(), EepromError> {
        self.check_range(addr, out.len())?;
        if out.is_empty() {
            return Ok(());
        }
        self.i2c
            .write_read(self.addr_7bit, &addr.to_be_bytes(), out)
            .map_err(|_| EepromError::I2c)
    }

    pub fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), EepromError> {
        self.check_range(addr, data.len())?;

        let mut cur_addr = addr as usize;
        let mut offset = 0usize;
        while offset < data.len() {
            let page_rem = EEPROM_PAGE_SIZE_BYTES - cur_addr % EEPROM_PAGE_SIZE_BYTES;
            let chunk_len = (data.len() - offset).min(page_rem).min(WRITE_CHUNK_MAX);

            self.write_chunk(cur_addr as u16, &data[offset..offset + chunk_len])?;
            self.wait_ready(cur_addr as u16)?;

            cur_addr += chunk_len;
            offset += chunk_len;
        }
        Ok(())
    }

    fn check_range(&self, addr: u16, len: usize) -> Result<(), EepromError> {
        if addr as usize + len > self.size_bytes {
            return Err(EepromError::OutOfRange);
        }
        Ok(())
    }

    fn write_chunk(&mut self, addr: u16, data: &[u8]) -> Result<(), EepromError> {
        let mut buf: Vec<u8, { 2 + WRITE_CHUNK_MAX }> = Vec::new();
        buf.extend_from_slice(&addr.to_be_bytes())
            .and_then(|()| buf.extend_from_slice(data))
            .map_err(|_| EepromError::OutOfRange)?;
        self.i2c
            .write(self.addr_7bit, &buf)
            .map_err(|_| EepromError::I2c)
    }

    fn wait_ready(&mut self, probe_addr: u16) -> Result<(), EepromError> {
        let probe = probe_addr.to_be_bytes();
        let mut dummy = [0u8; 1];
        for _ in 0..POLL_TIMEOUT_MS {
            if self
                .i2c
                .write_read(self.addr_7bit, &probe, &mut dummy)
                .is_ok()
            {
                return Ok(());
            }
            self.delay.delay_ms(1);
        }
        Err(EepromError::Timeout)
    }
}

impl<I2C: I2c, D: DelayNs> NonVolatile for Eeprom24x<I2C, D> {
    type Error = EepromError;

    fn read_block(&mut self, offset: u16, out: &mut [u8]) -> Result<(), EepromError> {
        self.read(offset, out)
    }

    fn write_block(&mut self, offset: u16, data: &[u8]) -> Result<(), EepromError> {
        self.write(offset, data)
    }
}
