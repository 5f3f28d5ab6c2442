#![no_main]
use libfuzzer_sys::fuzz_target;
use xsdgen::config::Config;

fuzz_target!(|data: &[u8]| {
    if let Ok(xsd) = std::str::from_utf8(data) {
        let config = Config::default().with_max_depth(64);
        if let Ok(set) = xsdgen::xsd::parse(&[xsd], &config) {
            let _ = xsdgen::codegen::render(&set);
        }
    }
});
