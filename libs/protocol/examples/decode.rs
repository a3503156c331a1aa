use basenode_protocol::{Operation, Request, Response, decode_frame};

const PACKET_SIZE: usize = 27;

fn parse_hex(args: &[String]) -> Vec<u8> {
    args.iter()
        .map(|s| u8::from_str_radix(s.trim_start_matches("0x"), 16).unwrap())
        .collect()
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    // Default: the reply to `str_demo`.
    let raw = if args.is_empty() {
        vec![
            0x7c, 0x7c, 0x7c, 0x10, 0x00, 0x05, 0x00, b'h', b'e', b'l', b'l', b'o',
        ]
    } else {
        parse_hex(&args)
    };

    let (header, payload) = match decode_frame(&raw, PACKET_SIZE) {
        Ok(decoded) => decoded,
        Err(err) => {
            println!("framing error: {:?}", err);
            return;
        }
    };
    println!("id 0x{:04x} len {}", header.id, header.len);

    let op = match Operation::try_from(header.id) {
        Ok(op) => op,
        Err(err) => {
            println!("unknown operation: {:?}", err);
            return;
        }
    };
    println!("as request:  {:?}", Request::decode(header.id, payload));
    println!("as response: {:?}", Response::decode(op, payload));
    if let Ok(Response::Bytes(bytes)) = Response::decode(op, payload) {
        println!("text: {}", String::from_utf8_lossy(bytes.as_bytes()));
    }
}
