#![no_main]
use delta_hardware::frame::{FrameFormat, FrameSpec, decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for format in [FrameFormat::Basic, FrameFormat::Extended] {
        let Ok(records) = decode(data, format) else {
            continue;
        };
        // Whatever decodes must encode back to the same basic bytes
        if format == FrameFormat::Basic {
            let batch: Vec<_> = records.iter().map(|r| r.command).collect();
            let bytes = encode(&batch, &FrameSpec::basic()).unwrap_or_default();
            assert_eq!(bytes, data);
        }
    }
});
