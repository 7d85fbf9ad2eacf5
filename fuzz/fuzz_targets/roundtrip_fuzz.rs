#![no_main]
use libfuzzer_sys::fuzz_target;
use vbprox::intersect::{Window, intersect};
use vbprox::vbyte;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First two bytes pick the window, the rest becomes u64 values.
    let window = Window::new(u64::from(data[0]), u64::from(data[1]));
    let values: Vec<u64> = data[2..]
        .chunks(8)
        .map(|c| {
            let mut rec = [0u8; 8];
            rec[..c.len()].copy_from_slice(c);
            u64::from_le_bytes(rec)
        })
        .collect();

    let plain = vbyte::encode(&values, false);
    assert_eq!(vbyte::decode(&plain, false).unwrap(), values);

    let mut sorted = values.clone();
    sorted.sort_unstable();
    let delta = vbyte::sort_and_delta_encode(&values);
    assert_eq!(vbyte::decode(&delta, true).unwrap(), sorted);

    // Split the sorted list and intersect the halves.
    let (a, b) = sorted.split_at(sorted.len() / 2);
    let r = intersect(window, a, b).unwrap();
    assert!(r.steps() <= a.len() + b.len());
    assert!(r.len() <= b.len());
});
