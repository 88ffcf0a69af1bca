//! Tags building a URL out of a base and `<c:param>`/`<jsp:param>` children

use jspc_core::{
    AttributeValue, CompileResult, CoreImport, CoreRedirect, CoreUrl, JspInclude, NodeId, NodeKind,
    ValueSyntax, ValueType,
};

use crate::{escape_java_string, quoted, CodegenContext, RuntimeImports};

/// Either side of a parameter, kept literal while it can be folded
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Literal(String),
    Expr(String),
}

impl Operand {
    fn to_expr(&self) -> String {
        match self {
            Operand::Literal(text) => quoted(text),
            Operand::Expr(expr) => expr.to_owned(),
        }
    }
}

struct Param {
    name: Operand,
    value: Operand,
}

impl Param {
    /// `name=value` as a string expression
    fn query(&self) -> String {
        match (&self.name, &self.value) {
            (Operand::Literal(name), Operand::Literal(value)) => quoted(&format!("{name}={value}")),
            (Operand::Literal(name), Operand::Expr(value)) => {
                format!("\"{}=\" + {value}", escape_java_string(name))
            }
            (Operand::Expr(name), Operand::Literal(value)) => {
                format!("{name} + \"={}\"", escape_java_string(value))
            }
            (Operand::Expr(name), Operand::Expr(value)) => format!("{name} + \"=\" + {value}"),
        }
    }
}

impl CodegenContext<'_> {
    /// Generates `<c:url>`, printing the encoded URL or storing it in `var`
    pub(crate) fn generate_url(&mut self, id: NodeId, node: &CoreUrl) -> CompileResult<()> {
        let url = self.generate_url_buffer(id, "value", node.value.as_ref(), node.context.as_ref())?;
        let encoded = format!("response.encodeURL({url}.toString())");

        match &node.var {
            Some(var) => self.generate_set_or_remove(node.scope.unwrap_or_default(), var, &encoded),
            None => self.out.println(&format!("out.print({encoded});")),
        }

        Ok(())
    }

    /// Generates `<c:redirect>`. Nothing after it runs.
    pub(crate) fn generate_redirect(&mut self, id: NodeId, node: &CoreRedirect) -> CompileResult<()> {
        let url = self.generate_url_buffer(id, "url", node.url.as_ref(), node.context.as_ref())?;
        self.out.println(&format!(
            "response.sendRedirect(response.encodeRedirectURL({url}.toString()));"
        ));
        self.out.println("if (true) return;");
        Ok(())
    }

    /// Generates `<jsp:include>`
    pub(crate) fn generate_include(&mut self, id: NodeId, node: &JspInclude) -> CompileResult<()> {
        let url = self.generate_url_buffer(id, "page", node.page.as_ref(), None)?;
        let flush = node.flush.unwrap_or(false);
        self.out
            .println(&format!("pageContext.include({url}.toString(), {flush});"));
        Ok(())
    }

    /// Generates `<c:import>`. Parameters travel as a map rather than in the URL.
    pub(crate) fn generate_import(&mut self, id: NodeId, node: &CoreImport) -> CompileResult<()> {
        let url = self.generate_optional_value(id, "url", node.url.as_ref(), ValueType::String)?;
        let context = self.generate_optional_value(id, "context", node.context.as_ref(), ValueType::String)?;
        let encoding =
            self.generate_optional_value(id, "charEncoding", node.char_encoding.as_ref(), ValueType::String)?;

        let params = self.generate_params(id)?;
        let params_var = if params.is_empty() {
            "null".to_owned()
        } else {
            self.add_to_imports(RuntimeImports::Util);
            let params_var = self.temp_var("params");
            self.out.println(&format!(
                "HashMap<String, Object> {params_var} = new HashMap<String, Object>();"
            ));
            for param in params.iter() {
                self.out.println(&format!(
                    "{params_var}.put({}, {});",
                    param.name.to_expr(),
                    param.value.to_expr()
                ));
            }
            params_var
        };

        let args = format!("{url}, {context}, {encoding}, {params_var}");
        match &node.var {
            Some(var) => self.generate_set_or_remove(
                node.scope.unwrap_or_default(),
                var,
                &format!("pageContext.importText({args})"),
            ),
            None => self.out.println(&format!("pageContext.importUrl(out, {args});")),
        }

        Ok(())
    }

    /// Declares the URL buffer and appends every parameter child to it
    fn generate_url_buffer(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&AttributeValue>,
        context: Option<&AttributeValue>,
    ) -> CompileResult<String> {
        let url = self.generate_optional_value(id, name, value, ValueType::String)?;
        let url = match context {
            Some(context) => {
                let context = self.generate_value(id, "context", context, ValueType::String)?;
                format!("{context} + {url}")
            }
            None => url,
        };

        let params = self.generate_params(id)?;

        let url_var = self.temp_var("url");
        self.out
            .println(&format!("StringBuilder {url_var} = pageContext.encode({url});"));
        for param in params.iter() {
            self.out
                .println(&format!("pageContext.encode({url_var}, {});", param.query()));
        }

        Ok(url_var)
    }

    /// Asks each parameter child for its name and value, in document order
    fn generate_params(&mut self, id: NodeId) -> CompileResult<Vec<Param>> {
        let tree = self.tree;
        let mut params = Vec::new();

        for &child in tree.children(id) {
            let param = match tree.kind(child) {
                NodeKind::CoreParam(param) => Param {
                    name: self.generate_operand(child, "name", param.name.as_ref())?,
                    value: match &param.value {
                        Some(value) => self.generate_operand(child, "value", Some(value))?,
                        None if self.has_body(child) => Operand::Expr(self.generate_capture(child, true)?),
                        None => Operand::Literal(String::new()),
                    },
                },
                NodeKind::JspParam(param) => Param {
                    name: Operand::Literal(param.name.clone().unwrap_or_default()),
                    value: self.generate_operand(child, "value", param.value.as_ref())?,
                },
                _ => continue,
            };

            params.push(param);
        }

        Ok(params)
    }

    fn generate_operand(
        &mut self,
        owner: NodeId,
        name: &str,
        value: Option<&AttributeValue>,
    ) -> CompileResult<Operand> {
        let Some(value) = value else {
            return Ok(Operand::Literal(String::new()));
        };

        if let AttributeValue::Static(raw) = value {
            let syntax = ValueSyntax::classify(raw, !self.options.scripting_invalid, !self.options.el_ignored)
                .map_err(|kind| self.error(owner, kind))?;
            if let ValueSyntax::Literal(text) = syntax {
                return Ok(Operand::Literal(text.to_owned()));
            }
        }

        self.generate_value(owner, name, value, ValueType::String)
            .map(Operand::Expr)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test_utils::{parse, render};

    #[test]
    fn it_generates_urls() {
        let tree = parse(r#"<c:url value="/cart"><c:param name="id" value="${id}"/></c:url>"#);
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            r#"StringBuilder _jsp_url_0 = pageContext.encode("/cart");
pageContext.encode(_jsp_url_0, "id=" + _jsp_expr_0.evalString(_jsp_env));
out.print(response.encodeURL(_jsp_url_0.toString()));
"#
        );
    }

    #[test]
    fn it_stores_urls_in_variables() {
        let tree = parse(r#"<c:url value="/cart" var="link" scope="request"/>"#);
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            r#"StringBuilder _jsp_url_0 = pageContext.encode("/cart");
pageContext.requestSetOrRemove("link", response.encodeURL(_jsp_url_0.toString()));
"#
        );
    }

    #[test]
    fn it_captures_param_bodies() {
        let tree = parse(r#"<c:url value="/find"><c:param name="q"> ${term} </c:param></c:url>"#);
        let code = render(&tree, tree.root()).unwrap();

        assert!(code.contains("String _jsp_str_0 = _jsp_body_0.getString().trim();\n"));
        assert!(code.contains("pageContext.encode(_jsp_url_1, \"q=\" + _jsp_str_0);\n"));
    }

    #[test]
    fn it_generates_redirects() {
        let tree = parse(r#"<c:redirect url="/login" context="/shop"/>"#);
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            r#"StringBuilder _jsp_url_0 = pageContext.encode("/shop" + "/login");
response.sendRedirect(response.encodeRedirectURL(_jsp_url_0.toString()));
if (true) return;
"#
        );
    }

    #[test]
    fn it_generates_includes() {
        let tree = parse(
            r#"<jsp:include page="/header.jsp" flush="true"><jsp:param name="title" value="Home"/></jsp:include>"#,
        );
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            r#"StringBuilder _jsp_url_0 = pageContext.encode("/header.jsp");
pageContext.encode(_jsp_url_0, "title=Home");
pageContext.include(_jsp_url_0.toString(), true);
"#
        );
    }

    #[test]
    fn it_generates_imports() {
        let tree = parse(
            r#"<c:import url="/news" var="news"><c:param name="max" value="5"/></c:import>"#,
        );
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            r#"HashMap<String, Object> _jsp_params_0 = new HashMap<String, Object>();
_jsp_params_0.put("max", "5");
pageContext.pageSetOrRemove("news", pageContext.importText("/news", null, null, _jsp_params_0));
"#
        );

        let tree = parse(r#"<c:import url="/news" charEncoding="UTF-8"/>"#);
        assert_eq!(
            render(&tree, tree.root()).unwrap(),
            "pageContext.importUrl(out, \"/news\", null, \"UTF-8\", null);\n"
        );
    }
}
