//! The main public crate of `jspc`.
//!
//! Compiles a page written in JSP XML syntax into the source of a Java page class:
//!
//! ```
//! use jspc::CompileConfig;
//!
//! let source = r#"<jsp:root xmlns:jsp="http://java.sun.com/JSP/Page"><p>Hello</p></jsp:root>"#;
//!
//! let page = jspc::compile_source(source, "hello.jsp", &CompileConfig::default()).unwrap();
//! assert!(page.source.contains("public class _jsp_page extends com.caucho.jsp.JavaPage {"));
//! assert_eq!(page.strings, vec!["<p>", "Hello", "</p>"]);
//! ```
//!
//! Pages built some other way go through a [`TreeBuilder`] and [`compile_tree`].

mod error;

use log::info;

pub use error::Error;
pub use jspc_codegen::{generate_page, GeneratedPage, LineMapping};
pub use jspc_core::*;
pub use jspc_tree::TreeBuilder;
pub use jspc_xml::{print_xml, read_template, ReadError};

/// Reads a page and compiles it
pub fn compile_source(source: &str, filename: &str, config: &CompileConfig) -> Result<GeneratedPage, Error> {
    let tree = read_template(source, filename, config)?;
    compile_tree(&tree, &config.options)
}

/// Compiles an already validated tree
pub fn compile_tree(tree: &TemplateTree, options: &CompileOptions) -> Result<GeneratedPage, Error> {
    let page = generate_page(tree, options)?;

    info!(
        "Compiled {} into {} ({} lines, {} dependencies)",
        tree.filename(),
        options.class_name,
        page.source.lines().count(),
        page.dependencies.len()
    );

    Ok(page)
}

/// Reads a page and prints it back in canonical form
pub fn canonical_xml(source: &str, filename: &str, config: &CompileConfig) -> Result<String, Error> {
    let tree = read_template(source, filename, config)?;
    Ok(print_xml(&tree)?)
}
