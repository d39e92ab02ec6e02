#![no_main]

use clickaway_dom::{FontFace, FontFaceDescriptors, FontFaceLoadStatus, FontFormat, FontSource};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let sniffed = FontFormat::sniff(data);
    let face = FontFace::new(
        "Fuzz",
        FontSource::binary(data.to_vec()),
        FontFaceDescriptors::default(),
    );
    match sniffed {
        Some(format) => {
            assert_eq!(face.status(), FontFaceLoadStatus::Loaded);
            assert_eq!(face.format(), Some(format));
        }
        None => assert_eq!(face.status(), FontFaceLoadStatus::Error),
    }
});
