use basenode_protocol::{
    ArrayView, CommandBuffer, FRAME_BOUNDARY, HEADER_LEN, Request, max_payload_size,
};

const PACKET_SIZE: usize = 27;

fn main() {
    println!(
        "packet {} bytes, header {} bytes, max payload {} bytes",
        PACKET_SIZE,
        HEADER_LEN,
        max_payload_size(PACKET_SIZE)
    );

    let words = [1u32, 2, 0xDEAD_BEEF];
    let mut raw_words = [0u8; 12];
    for (chunk, word) in raw_words.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    let requests = [
        Request::Milliseconds,
        Request::DigitalWrite { pin: 13, value: 1 },
        Request::SetI2cAddress { address: 0x21 },
        Request::StrEcho(ArrayView::from(&b"ping"[..])),
        Request::EchoArray(ArrayView::from_bytes(&raw_words).unwrap()),
    ];

    let mut buf: CommandBuffer<PACKET_SIZE> = CommandBuffer::new();
    let mut payload = [0u8; PACKET_SIZE];
    for request in requests {
        let payload_len = request.encode(&mut payload).unwrap();
        let len = buf
            .stage_frame(request.operation().id(), &payload[..payload_len])
            .unwrap();
        println!("{:?}", request.operation());
        println!("  frame len {}: {:02x?}", len, buf.as_bytes());
    }

    let boundary_count = buf
        .as_bytes()
        .windows(FRAME_BOUNDARY.len())
        .filter(|w| *w == FRAME_BOUNDARY)
        .count();
    println!("boundary markers in last frame: {}", boundary_count);
}
