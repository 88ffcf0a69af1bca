use jspc_core::{CompileConfig, CompileOptions, CompileResult, NodeId, TemplateTree, JSP_NS, JSTL_CORE_NS};

use crate::CodegenContext;

/// Builds a tree from a snippet of XML-syntax template, with the default configuration
pub fn parse(source: &str) -> TemplateTree {
    parse_with(&CompileConfig::default(), source)
}

/// The snippet gets a `<jsp:root>` around it, so it may hold several top-level elements
pub fn parse_with(config: &CompileConfig, source: &str) -> TemplateTree {
    let document = format!(r#"<jsp:root xmlns:jsp="{JSP_NS}" xmlns:c="{JSTL_CORE_NS}">{source}</jsp:root>"#);
    jspc_xml::read_template(&document, "test.jsp", config).unwrap()
}

/// Generated code of a single node, at depth 0
pub fn render(tree: &TemplateTree, id: NodeId) -> CompileResult<String> {
    render_with_strings(tree, id).map(|(code, _)| code)
}

/// Same as [`render`], along with the pooled strings the code refers to
pub fn render_with_strings(tree: &TemplateTree, id: NodeId) -> CompileResult<(String, Vec<String>)> {
    let options = CompileOptions::default();
    let mut ctx = CodegenContext::new(tree, &options);
    ctx.generate_node(id)?;

    let (code, _) = ctx.out.into_parts();
    Ok((code, ctx.strings.into_vec()))
}
