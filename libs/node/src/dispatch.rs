//! Decode, execute and encode one request inside the command buffer.

use basenode_protocol::{CommandBuffer, Error, Request, Span};

use crate::Node;
use crate::hal::Board;

/// Run the request frame loaded in `buf` against `node`.
///
/// On success `buf` holds the reply frame and its length is returned. On
/// error the request is dropped; the buffer contents are unspecified and the
/// caller must not send them.
pub fn process<B: Board, const N: usize>(
    node: &mut Node<B, N>,
    buf: &mut CommandBuffer<N>,
) -> Result<usize, Error> {
    let header = buf.decode_request()?;
    let span = execute(node, buf, header.id)?;
    buf.stage_reply(header.id, span)
}

fn execute<B: Board, const N: usize>(
    node: &mut Node<B, N>,
    buf: &mut CommandBuffer<N>,
    id: u16,
) -> Result<Span, Error> {
    let request = Request::decode(id, buf.payload())?;
    debug!("request {}", request.operation());

    match request {
        Request::Microseconds => buf.write_scalar(node.microseconds()),
        Request::Milliseconds | Request::GetMillis => buf.write_scalar(node.milliseconds()),
        Request::DelayUs(us) => {
            node.delay_us(us);
            Ok(Span::EMPTY)
        }
        Request::DelayMs(ms) => {
            node.delay_ms(ms);
            Ok(Span::EMPTY)
        }
        Request::MaxPayloadSize => buf.write_scalar(node.max_payload_size()),
        Request::RamFree => buf.write_scalar(node.ram_free()),
        Request::PinMode { pin, mode } => {
            node.pin_mode(pin, mode);
            Ok(Span::EMPTY)
        }
        Request::DigitalRead { pin } => {
            let value = node.digital_read(pin);
            buf.write_scalar(value)
        }
        Request::DigitalWrite { pin, value } => {
            node.digital_write(pin, value);
            Ok(Span::EMPTY)
        }
        Request::AnalogRead { pin } => {
            let value = node.analog_read(pin);
            buf.write_scalar(value)
        }
        Request::AnalogWrite { pin, value } => {
            node.analog_write(pin, value);
            Ok(Span::EMPTY)
        }
        Request::I2cAddress => buf.write_scalar(node.i2c_address()),
        Request::SetI2cAddress { address } => {
            let address = node.set_i2c_address(address);
            buf.write_scalar(address)
        }
        Request::ArrayLength(array) => {
            let len = node.array_length(array);
            buf.write_scalar(len)
        }
        Request::EchoArray(array) => {
            let echoed = node.echo_array(array);
            buf.span_of(echoed.as_bytes())
        }
        Request::StrDemo => {
            let len = node.str_demo(buf.scratch()).byte_len();
            Ok(Span::prefix(len))
        }
        Request::StrEcho(msg) => {
            let echoed = node.str_echo(msg);
            buf.span_of(echoed.as_bytes())
        }
        Request::EepromReadBlock { address, len } => {
            let out = buf
                .scratch()
                .get_mut(..len as usize)
                .ok_or(Error::BufferTooSmall)?;
            let len = node.eeprom_read_block(address, out).byte_len();
            Ok(Span::prefix(len))
        }
        Request::EepromUpdateBlock { address, data } => {
            let written = node.eeprom_update_block(address, data);
            buf.write_scalar(u8::from(written))
        }
        Request::Name => Ok(Span::prefix(node.name(buf.scratch()).byte_len())),
        Request::Manufacturer => Ok(Span::prefix(node.manufacturer(buf.scratch()).byte_len())),
        Request::SoftwareVersion => {
            Ok(Span::prefix(node.software_version(buf.scratch()).byte_len()))
        }
        Request::Url => Ok(Span::prefix(node.url(buf.scratch()).byte_len())),
    }
}
