#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate dashi;

use dashi::parser::Parser;

fuzz_target!(|data: &[u8]| {
    if let Ok(data) = std::str::from_utf8(data) {
        let parser = Parser::new(&["a", "b.c", "d.e.f"]).unwrap();
        if let Ok(mut state) = parser.start(data) {
            while let Ok(Some(_)) = state.advance() {}
        }
    }
});
