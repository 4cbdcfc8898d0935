#![no_main]

use bitstream::{unpack_flags_u16, unpack_from_byte, unpack_from_short, ByteReader, QuantRange};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = ByteReader::new(data);
    let mut idx = 0usize;

    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 5;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_u8().map(|b| unpack_from_byte(b, QuantRange::UNIT));
            }
            1 => {
                if let Ok(range) = QuantRange::new(-100.0, 100.0) {
                    let _ = reader.read_u16().map(|v| unpack_from_short(v, range));
                }
            }
            2 => {
                let _ = reader.read_u16().map(unpack_flags_u16);
            }
            3 => {
                let _ = reader.read_i32();
            }
            _ => {
                let _ = reader.peek_u8();
            }
        }
    }
});
