#![no_main]
use libfuzzer_sys::fuzz_target;
use vbprox::intersect::parse_pairs;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_pairs(text);
        let args: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        vbprox::cli::fuzz_try_parse_args(&args);
    }
});
