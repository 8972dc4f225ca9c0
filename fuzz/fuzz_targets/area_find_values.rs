#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(area) = hidewatch::props::PropArea::from_bytes(data) {
        let _ = area.find_values("ro.boot.verifiedbootstate");
    }
    let _ = hidewatch::props::area::find_values_in(data, b"ro.");
});
