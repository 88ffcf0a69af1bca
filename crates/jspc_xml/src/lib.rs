//! Canonical XML serialization of template trees, and a reader for it

mod printer;
mod reader;

pub use printer::print_xml;
pub use reader::{read_template, ReadError};
