#![no_main]
use libfuzzer_sys::fuzz_target;
use vbprox::vbyte;

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic on arbitrary bytes, only return errors.
    let plain = vbyte::decode(data, false);
    let _ = vbyte::decode(data, true);

    // Streaming and bulk decoding agree.
    let streamed: Result<Vec<u64>, _> = vbyte::Decoder::new(data).collect();
    assert_eq!(streamed, plain);

    // Re-encoding is canonical: never longer, and decodes to the same list.
    if let Ok(values) = plain {
        let again = vbyte::encode(&values, false);
        assert!(again.len() <= data.len());
        assert_eq!(vbyte::decode(&again, false).unwrap(), values);
    }
});
