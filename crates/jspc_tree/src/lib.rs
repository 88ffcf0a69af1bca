//! Turns the events of a template parser into a validated [`jspc_core::TemplateTree`]

mod builder;
mod text;
mod validate;

#[cfg(test)]
mod test_utils;

pub use builder::TreeBuilder;
pub use text::{is_whitespace, split_el, TextSegment};
