#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![warn(unused_extern_crates)]

//! A projective JSON parser.
//!
//! Given a fixed set of dotted field paths, `dashi` streams out the values of
//! exactly those fields from a JSON object without materializing a parse
//! tree. The work happens in two phases: a bit-parallel *structural index*
//! built once per document (character bitmaps, structural-quote filtering, a
//! string mask, and per-depth colon bitmaps), and a query-directed walk that
//! jumps from colon to colon, recovering field names and parsing only the
//! literals that were asked for.
//!
//! ```
//! use dashi::parser::Parser;
//!
//! let parser = Parser::new(&["user.name", "user.id"]).unwrap();
//! let record = r#"{"user": {"id": 3, "name": "aki"}, "tags": null}"#;
//!
//! let mut state = parser.start(record).unwrap();
//! while let Some(kv) = state.advance().unwrap() {
//!     println!("#{} = {:?}", kv.field_id, kv.value);
//! }
//! ```

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;

pub mod bit;
pub mod errors;
pub mod index_builder;
pub mod parser;
pub mod query;
pub mod value;

mod escape;
