#![no_main]

use clickaway_dom::parse_src;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(src) = std::str::from_utf8(data) {
        let _ = parse_src(src);
    }
});
