#![no_main]

use btck::{flags_to_string, parse_flags, VERIFY_ALL};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (u32, &[u8])| {
    let (flags, text) = data;

    match flags_to_string(flags) {
        Ok(rendered) => {
            assert_eq!(flags & !VERIFY_ALL, 0);
            assert_eq!(parse_flags(&rendered).unwrap(), flags);
        }
        Err(_) => assert_ne!(flags & !VERIFY_ALL, 0),
    }

    if let Ok(text) = std::str::from_utf8(text) {
        if let Ok(parsed) = parse_flags(text) {
            assert_eq!(parsed & !VERIFY_ALL, 0);
        }
    }
});
