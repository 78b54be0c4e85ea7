#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 { return; }

    let options = saphyr_json::Options::default().with_json_float_sentinels();
    if let Ok(values) = saphyr_json::from_reader_multiple_with_options(data, options) {
        for value in &values {
            let _ = saphyr_json::to_string(value);
        }
    }
});
