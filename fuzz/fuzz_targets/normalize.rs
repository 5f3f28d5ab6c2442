#![no_main]
use libfuzzer_sys::fuzz_target;
use xsdgen::config::Config;

// Zwei Dokumente, getrennt am ersten NUL-Byte: deckt Cross-Document-Refs ab.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let docs: Vec<&str> = text.splitn(2, '\0').collect();
    let config = Config::default().without_standard_schemas().with_max_depth(64);
    let _ = xsdgen::xsd::normalize(&docs, &config);
});
