#![no_main]

use libfuzzer_sys::fuzz_target;

// Biases inputs toward anchors, aliases and `<<` merge keys. Conversion may fail, but it
// must never hang or overflow the stack, and with sentinels set every value serializes.
fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 { return; }

    let s = String::from_utf8_lossy(data);

    let yaml_alias = format!(
        "a: &A {s}\nb: *A\nseq: &S [1, 2, *A]\nseq_alias: [*S, *S]\n"
    );
    let yaml_merge = format!(
        "base1: &B1 {{k: 1, v: {s}}}\nbase2: &B2 {{k: 2, w: {s}}}\nmerged: {{<<: [*B1, *B2], extra: 3}}\n"
    );

    let options = saphyr_json::Options::default().with_json_float_sentinels();
    for yaml in [yaml_alias, yaml_merge] {
        if let Ok(value) = saphyr_json::from_str_with_options(&yaml, options.clone()) {
            let json = saphyr_json::to_string(&value).expect("non-finite floats were replaced");
            let _ = saphyr_json::from_json_str(&json);
        }
    }
});
