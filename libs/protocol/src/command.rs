//! Closed set of node operations and their payload layouts.
//!
//! Scalars are little-endian in declaration order. An array argument is always
//! last and takes the rest of the payload; array results are the whole reply
//! payload.

use crate::Error;
use crate::array::{ArrayView, Element};

pub const OP_MICROSECONDS: u16 = 0x0001;
pub const OP_MILLISECONDS: u16 = 0x0002;
pub const OP_DELAY_US: u16 = 0x0003;
pub const OP_DELAY_MS: u16 = 0x0004;
/// Reports the payload ceiling so the host never sends a frame that cannot fit.
pub const OP_MAX_PAYLOAD_SIZE: u16 = 0x0005;
pub const OP_RAM_FREE: u16 = 0x0006;
pub const OP_PIN_MODE: u16 = 0x0007;
pub const OP_DIGITAL_READ: u16 = 0x0008;
pub const OP_DIGITAL_WRITE: u16 = 0x0009;
pub const OP_ANALOG_READ: u16 = 0x000A;
pub const OP_ANALOG_WRITE: u16 = 0x000B;
pub const OP_I2C_ADDRESS: u16 = 0x000C;
pub const OP_SET_I2C_ADDRESS: u16 = 0x000D;
pub const OP_ARRAY_LENGTH: u16 = 0x000E;
pub const OP_ECHO_ARRAY: u16 = 0x000F;
pub const OP_STR_DEMO: u16 = 0x0010;
pub const OP_STR_ECHO: u16 = 0x0011;
/// Alias of `OP_MILLISECONDS` kept for hosts that call `get_millis`.
pub const OP_GET_MILLIS: u16 = 0x0012;
pub const OP_EEPROM_READ_BLOCK: u16 = 0x0020;
pub const OP_EEPROM_UPDATE_BLOCK: u16 = 0x0021;
pub const OP_NAME: u16 = 0x0030;
pub const OP_MANUFACTURER: u16 = 0x0031;
pub const OP_SOFTWARE_VERSION: u16 = 0x0032;
pub const OP_URL: u16 = 0x0033;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Operation {
    Microseconds = OP_MICROSECONDS,
    Milliseconds = OP_MILLISECONDS,
    DelayUs = OP_DELAY_US,
    DelayMs = OP_DELAY_MS,
    MaxPayloadSize = OP_MAX_PAYLOAD_SIZE,
    RamFree = OP_RAM_FREE,
    PinMode = OP_PIN_MODE,
    DigitalRead = OP_DIGITAL_READ,
    DigitalWrite = OP_DIGITAL_WRITE,
    AnalogRead = OP_ANALOG_READ,
    AnalogWrite = OP_ANALOG_WRITE,
    I2cAddress = OP_I2C_ADDRESS,
    SetI2cAddress = OP_SET_I2C_ADDRESS,
    ArrayLength = OP_ARRAY_LENGTH,
    EchoArray = OP_ECHO_ARRAY,
    StrDemo = OP_STR_DEMO,
    StrEcho = OP_STR_ECHO,
    GetMillis = OP_GET_MILLIS,
    EepromReadBlock = OP_EEPROM_READ_BLOCK,
    EepromUpdateBlock = OP_EEPROM_UPDATE_BLOCK,
    Name = OP_NAME,
    Manufacturer = OP_MANUFACTURER,
    SoftwareVersion = OP_SOFTWARE_VERSION,
    Url = OP_URL,
}

impl Operation {
    pub const fn id(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for Operation {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let op = match value {
            OP_MICROSECONDS => Operation::Microseconds,
            OP_MILLISECONDS => Operation::Milliseconds,
            OP_DELAY_US => Operation::DelayUs,
            OP_DELAY_MS => Operation::DelayMs,
            OP_MAX_PAYLOAD_SIZE => Operation::MaxPayloadSize,
            OP_RAM_FREE => Operation::RamFree,
            OP_PIN_MODE => Operation::PinMode,
            OP_DIGITAL_READ => Operation::DigitalRead,
            OP_DIGITAL_WRITE => Operation::DigitalWrite,
            OP_ANALOG_READ => Operation::AnalogRead,
            OP_ANALOG_WRITE => Operation::AnalogWrite,
            OP_I2C_ADDRESS => Operation::I2cAddress,
            OP_SET_I2C_ADDRESS => Operation::SetI2cAddress,
            OP_ARRAY_LENGTH => Operation::ArrayLength,
            OP_ECHO_ARRAY => Operation::EchoArray,
            OP_STR_DEMO => Operation::StrDemo,
            OP_STR_ECHO => Operation::StrEcho,
            OP_GET_MILLIS => Operation::GetMillis,
            OP_EEPROM_READ_BLOCK => Operation::EepromReadBlock,
            OP_EEPROM_UPDATE_BLOCK => Operation::EepromUpdateBlock,
            OP_NAME => Operation::Name,
            OP_MANUFACTURER => Operation::Manufacturer,
            OP_SOFTWARE_VERSION => Operation::SoftwareVersion,
            OP_URL => Operation::Url,
            other => return Err(Error::UnsupportedOperation(other)),
        };
        Ok(op)
    }
}

impl From<Operation> for u16 {
    fn from(op: Operation) -> Self {
        op.id()
    }
}

/// A decoded request. Array arguments borrow from the frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Microseconds,
    Milliseconds,
    DelayUs(u16),
    DelayMs(u16),
    MaxPayloadSize,
    RamFree,
    PinMode { pin: u8, mode: u8 },
    DigitalRead { pin: u8 },
    DigitalWrite { pin: u8, value: u8 },
    AnalogRead { pin: u8 },
    AnalogWrite { pin: u8, value: u8 },
    I2cAddress,
    SetI2cAddress { address: u8 },
    ArrayLength(ArrayView<'a, u8>),
    EchoArray(ArrayView<'a, u32>),
    StrDemo,
    StrEcho(ArrayView<'a, u8>),
    GetMillis,
    EepromReadBlock { address: u16, len: u16 },
    EepromUpdateBlock { address: u16, data: ArrayView<'a, u8> },
    Name,
    Manufacturer,
    SoftwareVersion,
    Url,
}

impl<'a> Request<'a> {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Microseconds => Operation::Microseconds,
            Request::Milliseconds => Operation::Milliseconds,
            Request::DelayUs(_) => Operation::DelayUs,
            Request::DelayMs(_) => Operation::DelayMs,
            Request::MaxPayloadSize => Operation::MaxPayloadSize,
            Request::RamFree => Operation::RamFree,
            Request::PinMode { .. } => Operation::PinMode,
            Request::DigitalRead { .. } => Operation::DigitalRead,
            Request::DigitalWrite { .. } => Operation::DigitalWrite,
            Request::AnalogRead { .. } => Operation::AnalogRead,
            Request::AnalogWrite { .. } => Operation::AnalogWrite,
            Request::I2cAddress => Operation::I2cAddress,
            Request::SetI2cAddress { .. } => Operation::SetI2cAddress,
            Request::ArrayLength(_) => Operation::ArrayLength,
            Request::EchoArray(_) => Operation::EchoArray,
            Request::StrDemo => Operation::StrDemo,
            Request::StrEcho(_) => Operation::StrEcho,
            Request::GetMillis => Operation::GetMillis,
            Request::EepromReadBlock { .. } => Operation::EepromReadBlock,
            Request::EepromUpdateBlock { .. } => Operation::EepromUpdateBlock,
            Request::Name => Operation::Name,
            Request::Manufacturer => Operation::Manufacturer,
            Request::SoftwareVersion => Operation::SoftwareVersion,
            Request::Url => Operation::Url,
        }
    }

    /// Decode the payload of a request frame with identifier `id`.
    pub fn decode(id: u16, payload: &'a [u8]) -> Result<Self, Error> {
        let op = Operation::try_from(id)?;
        let mut args = Args::new(payload);
        let request = match op {
            Operation::Microseconds => Request::Microseconds,
            Operation::Milliseconds => Request::Milliseconds,
            Operation::DelayUs => Request::DelayUs(args.scalar()?),
            Operation::DelayMs => Request::DelayMs(args.scalar()?),
            Operation::MaxPayloadSize => Request::MaxPayloadSize,
            Operation::RamFree => Request::RamFree,
            Operation::PinMode => Request::PinMode {
                pin: args.scalar()?,
                mode: args.scalar()?,
            },
            Operation::DigitalRead => Request::DigitalRead { pin: args.scalar()? },
            Operation::DigitalWrite => Request::DigitalWrite {
                pin: args.scalar()?,
                value: args.scalar()?,
            },
            Operation::AnalogRead => Request::AnalogRead { pin: args.scalar()? },
            Operation::AnalogWrite => Request::AnalogWrite {
                pin: args.scalar()?,
                value: args.scalar()?,
            },
            Operation::I2cAddress => Request::I2cAddress,
            Operation::SetI2cAddress => Request::SetI2cAddress {
                address: args.scalar()?,
            },
            Operation::ArrayLength => return Ok(Request::ArrayLength(args.array()?)),
            Operation::EchoArray => return Ok(Request::EchoArray(args.array()?)),
            Operation::StrDemo => Request::StrDemo,
            Operation::StrEcho => return Ok(Request::StrEcho(args.array()?)),
            Operation::GetMillis => Request::GetMillis,
            Operation::EepromReadBlock => Request::EepromReadBlock {
                address: args.scalar()?,
                len: args.scalar()?,
            },
            Operation::EepromUpdateBlock => {
                let address = args.scalar()?;
                return Ok(Request::EepromUpdateBlock {
                    address,
                    data: args.array()?,
                });
            }
            Operation::Name => Request::Name,
            Operation::Manufacturer => Request::Manufacturer,
            Operation::SoftwareVersion => Request::SoftwareVersion,
            Operation::Url => Request::Url,
        };
        args.finish()?;
        Ok(request)
    }

    /// Encode the request payload into `out`; returns the payload length.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, Error> {
        let mut w = Writer::new(out);
        match *self {
            Request::Microseconds
            | Request::Milliseconds
            | Request::GetMillis
            | Request::MaxPayloadSize
            | Request::RamFree
            | Request::I2cAddress
            | Request::StrDemo
            | Request::Name
            | Request::Manufacturer
            | Request::SoftwareVersion
            | Request::Url => {}
            Request::DelayUs(us) => w.scalar(us)?,
            Request::DelayMs(ms) => w.scalar(ms)?,
            Request::PinMode { pin, mode } => {
                w.scalar(pin)?;
                w.scalar(mode)?;
            }
            Request::DigitalRead { pin } | Request::AnalogRead { pin } => w.scalar(pin)?,
            Request::DigitalWrite { pin, value } | Request::AnalogWrite { pin, value } => {
                w.scalar(pin)?;
                w.scalar(value)?;
            }
            Request::SetI2cAddress { address } => w.scalar(address)?,
            Request::ArrayLength(array) | Request::StrEcho(array) => w.bytes(array.as_bytes())?,
            Request::EchoArray(array) => w.bytes(array.as_bytes())?,
            Request::EepromReadBlock { address, len } => {
                w.scalar(address)?;
                w.scalar(len)?;
            }
            Request::EepromUpdateBlock { address, data } => {
                w.scalar(address)?;
                w.bytes(data.as_bytes())?;
            }
        }
        Ok(w.position())
    }
}

/// A decoded reply payload, as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    Unit,
    U8(u8),
    U16(u16),
    U32(u32),
    Bytes(ArrayView<'a, u8>),
    Words(ArrayView<'a, u32>),
}

impl<'a> Response<'a> {
    /// Decode a reply payload for operation `op`.
    pub fn decode(op: Operation, payload: &'a [u8]) -> Result<Self, Error> {
        let mut args = Args::new(payload);
        let response = match op {
            Operation::DelayUs
            | Operation::DelayMs
            | Operation::PinMode
            | Operation::DigitalWrite
            | Operation::AnalogWrite => Response::Unit,
            Operation::Microseconds
            | Operation::Milliseconds
            | Operation::GetMillis
            | Operation::MaxPayloadSize
            | Operation::RamFree => Response::U32(args.scalar()?),
            Operation::DigitalRead
            | Operation::I2cAddress
            | Operation::SetI2cAddress
            | Operation::EepromUpdateBlock => Response::U8(args.scalar()?),
            Operation::AnalogRead | Operation::ArrayLength => Response::U16(args.scalar()?),
            Operation::EchoArray => return Ok(Response::Words(args.array()?)),
            Operation::StrDemo
            | Operation::StrEcho
            | Operation::EepromReadBlock
            | Operation::Name
            | Operation::Manufacturer
            | Operation::SoftwareVersion
            | Operation::Url => return Ok(Response::Bytes(args.array()?)),
        };
        args.finish()?;
        Ok(response)
    }

    /// Encode the reply payload into `out`; returns the payload length.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, Error> {
        let mut w = Writer::new(out);
        match *self {
            Response::Unit => {}
            Response::U8(v) => w.scalar(v)?,
            Response::U16(v) => w.scalar(v)?,
            Response::U32(v) => w.scalar(v)?,
            Response::Bytes(array) => w.bytes(array.as_bytes())?,
            Response::Words(array) => w.bytes(array.as_bytes())?,
        }
        Ok(w.position())
    }
}

struct Args<'a> {
    rest: &'a [u8],
}

impl<'a> Args<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self { rest: payload }
    }

    fn scalar<T: Element>(&mut self) -> Result<T, Error> {
        if self.rest.len() < T::WIDTH {
            return Err(Error::InvalidArguments);
        }
        let (head, rest) = self.rest.split_at(T::WIDTH);
        self.rest = rest;
        Ok(T::read_le(head))
    }

    /// Consume the remaining payload as a trailing array argument.
    fn array<T: Element>(self) -> Result<ArrayView<'a, T>, Error> {
        ArrayView::from_bytes(self.rest)
    }

    fn finish(self) -> Result<(), Error> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidArguments)
        }
    }
}

struct Writer<'b> {
    out: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    fn new(out: &'b mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    fn scalar<T: Element>(&mut self, value: T) -> Result<(), Error> {
        let dst = self
            .out
            .get_mut(self.pos..self.pos + T::WIDTH)
            .ok_or(Error::BufferTooSmall)?;
        value.write_le(dst);
        self.pos += T::WIDTH;
        Ok(())
    }

    fn bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let dst = self
            .out
            .get_mut(self.pos..self.pos + bytes.len())
            .ok_or(Error::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }
}
