use jspc_core::{CompileConfig, CompileResult, NodeId, TemplateTree};

use crate::TreeBuilder;

/// Builds a tree from a small XML-like snippet with the default configuration
pub fn build(source: &str) -> CompileResult<TemplateTree> {
    build_with(&CompileConfig::default(), source)
}

/// Feeds `source` to a [`TreeBuilder`] the way a parser would.
/// Understands start, end and empty tags with quoted attributes, and text.
pub fn build_with(config: &CompileConfig, source: &str) -> CompileResult<TemplateTree> {
    let mut builder = TreeBuilder::new(config, "test.jsp");
    let mut rest = source;
    let mut line = 1;

    while !rest.is_empty() {
        let Some(tag_start) = rest.find('<') else {
            builder.text(rest, line)?;
            break;
        };

        if tag_start > 0 {
            let text = &rest[..tag_start];
            builder.text(text, line)?;
            line += text.matches('\n').count() as u32;
        }

        let tag_end = rest[tag_start..].find('>').expect("unclosed tag") + tag_start;
        let tag = &rest[tag_start + 1..tag_end];
        rest = &rest[tag_end + 1..];

        if let Some(name) = tag.strip_prefix('/') {
            builder.close_element(name.trim(), line)?;
        } else {
            let (tag, is_empty) = match tag.strip_suffix('/') {
                Some(tag) => (tag, true),
                None => (tag, false),
            };

            let (name, mut attrs) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
            builder.start_element(name, line)?;

            loop {
                attrs = attrs.trim_start();
                let Some((attr_name, value_rest)) = attrs.split_once('=') else {
                    break;
                };
                let quote = value_rest.chars().next().expect("unquoted attribute");
                let value_end = value_rest[1..].find(quote).expect("unclosed attribute") + 1;
                builder.attribute(attr_name.trim(), &value_rest[1..value_end])?;
                attrs = &value_rest[value_end + 1..];
            }

            builder.close_attributes()?;
            if is_empty {
                builder.close_element(name, line)?;
            }
        }

        line += tag.matches('\n').count() as u32;
    }

    builder.finish()
}

/// Names of the children of a node
pub fn kinds(tree: &TemplateTree, id: NodeId) -> Vec<String> {
    tree.children(id)
        .iter()
        .map(|&child| tree.node(child).name.to_string())
        .collect()
}
