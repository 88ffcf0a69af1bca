use jspc_core::{BodyContent, CompileResult, CustomTag, NodeId, TagHandlerKind, ValueType};
use log::debug;

use crate::{CodegenContext, RuntimeImports};

impl CodegenContext<'_> {
    /// Drives a classic tag handler through its lifecycle
    pub(crate) fn generate_custom_tag(&mut self, id: NodeId, tag: &CustomTag) -> CompileResult<()> {
        self.add_to_imports(RuntimeImports::TagExt);

        let info = &tag.info;
        for dependency in info.dependencies.iter() {
            debug!("<{}> depends on {}", info.name, dependency.resource);
        }
        self.depends.extend(info.dependencies.iter().cloned());

        let tag_var = self.temp_var("tag");
        let parent = self
            .tree
            .ancestors(id)
            .find_map(|ancestor| self.tag_vars.get(&ancestor))
            .map_or("null", String::as_str)
            .to_owned();

        let class = &info.tag_class;
        self.out.println(&format!("{class} {tag_var} = new {class}();"));
        self.out.println(&format!("{tag_var}.setPageContext(pageContext);"));
        self.out.println(&format!("{tag_var}.setParent({parent});"));

        for (name, value) in tag.attributes.iter() {
            let value_type = info
                .find_attribute(name)
                .map_or(ValueType::String, |attr| attr.value_type);
            let value = self.generate_value(id, name, value, value_type)?;
            self.out
                .println(&format!("{tag_var}.{}({value});", setter_name(name)));
        }

        self.tag_vars.insert(id, tag_var.clone());

        let eval = self.temp_var("eval");
        self.out.println(&format!("int {eval} = {tag_var}.doStartTag();"));

        if info.body_content != BodyContent::Empty && self.has_body(id) {
            self.out.println(&format!("if ({eval} != Tag.SKIP_BODY) {{"));
            self.in_block(|ctx| match info.handler {
                TagHandlerKind::Tag => ctx.generate_body(id),
                TagHandlerKind::Iteration => ctx.generate_body_loop(id, &tag_var),
                TagHandlerKind::Body => ctx.generate_buffered_body(id, &tag_var, &eval),
            })?;
            self.out.println("}");
        }

        let end_eval = self.temp_var("end_eval");
        self.out.println(&format!("int {end_eval} = {tag_var}.doEndTag();"));
        self.out.println(&format!("{tag_var}.release();"));
        self.out.println(&format!("if ({end_eval} == Tag.SKIP_PAGE) return;"));

        Ok(())
    }

    /// The body runs again for as long as the handler asks for it
    fn generate_body_loop(&mut self, id: NodeId, tag_var: &str) -> CompileResult<()> {
        self.out.println("do {");
        self.in_block(|ctx| ctx.generate_body(id))?;
        self.out.println(&format!(
            "}} while ({tag_var}.doAfterBody() == IterationTag.EVAL_BODY_AGAIN);"
        ));
        Ok(())
    }

    fn generate_buffered_body(&mut self, id: NodeId, tag_var: &str, eval: &str) -> CompileResult<()> {
        let buffered = format!("{eval} == BodyTag.EVAL_BODY_BUFFERED");

        self.out.println(&format!("if ({buffered}) {{"));
        self.out.println("  out = pageContext.pushBody();");
        self.out
            .println(&format!("  {tag_var}.setBodyContent((BodyContent) out);"));
        self.out.println(&format!("  {tag_var}.doInitBody();"));
        self.out.println("}");

        self.out.println("try {");
        self.in_block(|ctx| ctx.generate_body_loop(id, tag_var))?;
        self.out.println("} finally {");
        self.out.println(&format!("  if ({buffered}) {{"));
        self.out.println("    out = pageContext.popBody();");
        self.out.println("  }");
        self.out.println("}");

        Ok(())
    }
}

/// `currency` becomes `setCurrency`
fn setter_name(attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use jspc_core::{
        BodyContent, CompileConfig, Dependency, TagAttributeInfo, TagHandlerKind, TagInfo,
        TagLibrary, TagLibraryRegistry, ValueType,
    };
    use pretty_assertions::assert_eq;

    use crate::test_utils::{parse_with, render};
    use crate::CodegenContext;

    use super::setter_name;

    fn shop_config() -> CompileConfig {
        let mut price = TagInfo::new("price", "shop.PriceTag");
        price.body_content = BodyContent::Empty;
        price.attributes = vec![
            TagAttributeInfo::new("amount").required().typed(ValueType::Double),
            TagAttributeInfo::new("currency").static_only(),
        ];
        price.dependencies = vec![Dependency::new("/WEB-INF/shop.tld", 7)];

        let mut repeat = TagInfo::new("repeat", "shop.RepeatTag");
        repeat.handler = TagHandlerKind::Iteration;
        repeat.attributes = vec![TagAttributeInfo::new("times").typed(ValueType::Int)];

        let mut upper = TagInfo::new("upper", "shop.UpperTag");
        upper.handler = TagHandlerKind::Body;

        let mut library = TagLibrary::new("urn:shop");
        library.add_tag(price);
        library.add_tag(repeat);
        library.add_tag(upper);

        let mut registry = TagLibraryRegistry::default();
        registry.register("shop", library);

        CompileConfig::default().with_tag_libraries(registry)
    }

    #[test]
    fn it_names_setters() {
        assert_eq!(setter_name("currency"), "setCurrency");
        assert_eq!(setter_name("varStatus"), "setVarStatus");
    }

    #[test]
    fn it_generates_simple_tags() {
        let config = shop_config();
        let tree = parse_with(&config, r#"<shop:price amount="9.5" currency="EUR"/>"#);
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            r#"shop.PriceTag _jsp_tag_0 = new shop.PriceTag();
_jsp_tag_0.setPageContext(pageContext);
_jsp_tag_0.setParent(null);
_jsp_tag_0.setAmount(9.5);
_jsp_tag_0.setCurrency("EUR");
int _jsp_eval_1 = _jsp_tag_0.doStartTag();
int _jsp_end_eval_2 = _jsp_tag_0.doEndTag();
_jsp_tag_0.release();
if (_jsp_end_eval_2 == Tag.SKIP_PAGE) return;
"#
        );
    }

    #[test]
    fn it_registers_tag_dependencies() {
        let config = shop_config();
        let tree = parse_with(&config, r#"<shop:price amount="1"/>"#);
        let options = config.options.clone();
        let mut ctx = CodegenContext::new(&tree, &options);
        ctx.generate_node(tree.root()).unwrap();

        assert_eq!(ctx.depends.len(), 1);
        assert_eq!(
            ctx.depends.iter().next(),
            Some(&Dependency::new("/WEB-INF/shop.tld", 7))
        );
    }

    #[test]
    fn it_loops_over_iteration_bodies() {
        let config = shop_config();
        let tree = parse_with(&config, r#"<shop:repeat times="${n}">x</shop:repeat>"#);
        let code = render(&tree, tree.root()).unwrap();

        assert!(code.contains("_jsp_tag_0.setTimes((int) _jsp_expr_0.evalLong(_jsp_env));\n"));
        assert!(code.contains(
            r#"if (_jsp_eval_1 != Tag.SKIP_BODY) {
  do {
    out.write(_jsp_string0, 0, _jsp_string0.length);
  } while (_jsp_tag_0.doAfterBody() == IterationTag.EVAL_BODY_AGAIN);
}
"#
        ));
    }

    #[test]
    fn it_buffers_body_tags() {
        let config = shop_config();
        let tree = parse_with(&config, r#"<shop:upper>x</shop:upper>"#);
        let code = render(&tree, tree.root()).unwrap();

        assert!(code.contains("  if (_jsp_eval_1 == BodyTag.EVAL_BODY_BUFFERED) {\n    out = pageContext.pushBody();\n"));
        assert!(code.contains("  } finally {\n    if (_jsp_eval_1 == BodyTag.EVAL_BODY_BUFFERED) {\n      out = pageContext.popBody();\n"));
    }

    #[test]
    fn it_passes_the_enclosing_handler_as_parent() {
        let config = shop_config();
        let tree = parse_with(
            &config,
            r#"<shop:repeat times="2"><p><shop:price amount="1"/></p></shop:repeat>"#,
        );
        let code = render(&tree, tree.root()).unwrap();

        assert!(code.contains("_jsp_tag_2.setParent(_jsp_tag_0);\n"));
    }
}
