//! Turns a validated template tree into the source of a page class

mod context;
mod control_flow;
mod custom;
mod imports;
mod loops;
mod nodes;
mod page;
mod pool;
mod scripting;
mod text;
mod urls;
mod values;
mod variables;
mod writer;

#[cfg(test)]
mod test_utils;

pub use context::CodegenContext;
pub use imports::{RuntimeImports, PAGE_IMPORTS};
pub use page::{generate_page, GeneratedPage};
pub use pool::{split_literal, ExprPool, StringPool, STRING_CHUNK_LEN, STRING_SPLIT_THRESHOLD};
pub use scripting::{ends_in_line_comment, normalize_line_ends};
pub use values::{escape_java_string, quoted};
pub use writer::{CodeWriter, LineMapping};
