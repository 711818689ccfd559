//! Reading documents and writing results in the compiled-in formats.

mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{parse_document_any, parse_document_str};
pub use output::{OutputOptions, emit, render};
