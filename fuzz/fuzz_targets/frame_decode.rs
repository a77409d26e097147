//! Fuzz target for frame sequence decoding.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use quicnet_proto::Frame;

fuzz_target!(|data: &[u8]| {
    let Ok(frames) = Frame::decode_all(Bytes::copy_from_slice(data)) else {
        return;
    };

    let mut encoded = Vec::new();
    for frame in &frames {
        frame.encode(&mut encoded).expect("decoded frame re-encodes");
    }
    let encoded_len: usize = frames.iter().map(Frame::encoded_len).sum();
    assert_eq!(encoded.len(), encoded_len);
});
