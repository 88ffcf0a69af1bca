use jspc_core::{AttributeValue, CompileResult, MarkupElement, NodeId, QName, ValueSyntax, ValueType};

use crate::CodegenContext;

impl CodegenContext<'_> {
    /// Writes a literal through the string pool, one bulk write per pooled chunk
    pub fn generate_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        for idx in self.strings.add(text) {
            self.out
                .println(&format!("out.write(_jsp_string{idx}, 0, _jsp_string{idx}.length);"));
        }
    }

    /// Markup which is not a tag is template text, except for dynamic attribute values
    pub(crate) fn generate_element(
        &mut self,
        id: NodeId,
        name: &QName,
        element: &MarkupElement,
    ) -> CompileResult<()> {
        let mut text = format!("<{name}");

        for (attr_name, value) in element.attributes.iter() {
            text.push(' ');
            text.push_str(&attr_name.to_string());
            text.push_str("=\"");

            let literal = match value {
                AttributeValue::Static(raw) => ValueSyntax::classify(
                    raw,
                    !self.options.scripting_invalid,
                    !self.options.el_ignored,
                )
                .map_err(|kind| self.error(id, kind))?
                .is_literal()
                .then_some(raw.as_str()),
                AttributeValue::Fragment(_) => None,
            };

            match literal {
                Some(raw) => text.push_str(&escape_attribute(raw)),
                None => {
                    self.generate_text(&text);
                    text.clear();

                    let expr = self.generate_value(id, &attr_name.to_string(), value, ValueType::String)?;
                    self.out.println(&format!("out.print({expr});"));
                }
            }

            text.push('"');
        }

        if !self.has_body(id) {
            text.push_str("/>");
            self.generate_text(&text);
            return Ok(());
        }

        text.push('>');
        self.generate_text(&text);
        self.generate_body(id)?;
        self.generate_text(&format!("</{name}>"));
        Ok(())
    }
}

fn escape_attribute(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test_utils::{parse, render, render_with_strings};

    #[test]
    fn it_writes_pooled_text() {
        let tree = parse("<p>Hello</p>");
        let (code, strings) = render_with_strings(&tree, tree.root()).unwrap();

        assert_eq!(
            code,
            "out.write(_jsp_string0, 0, _jsp_string0.length);\nout.write(_jsp_string1, 0, _jsp_string1.length);\nout.write(_jsp_string2, 0, _jsp_string2.length);\n"
        );
        assert_eq!(strings, vec!["<p>", "Hello", "</p>"]);
    }

    #[test]
    fn it_writes_split_text_in_order() {
        let long = "z".repeat(40_000);
        let tree = parse(&format!("<p>{long}</p>"));
        let (code, strings) = render_with_strings(&tree, tree.root()).unwrap();

        assert_eq!(code.matches("out.write(").count(), 4);
        assert_eq!(strings[1].len() + strings[2].len(), 40_000);
        assert_eq!(strings[1].len(), 16_384);
    }

    #[test]
    fn it_prints_dynamic_attributes() {
        let tree = parse(r#"<a href="${link}" title="a &amp; b"/>"#);
        let (code, strings) = render_with_strings(&tree, tree.root()).unwrap();

        assert_eq!(
            code,
            "out.write(_jsp_string0, 0, _jsp_string0.length);\nout.print(_jsp_expr_0.evalString(_jsp_env));\nout.write(_jsp_string1, 0, _jsp_string1.length);\n"
        );
        assert_eq!(strings, vec!["<a href=\"", "\" title=\"a &amp; b\"/>"]);
    }

    #[test]
    fn it_reuses_equal_literals() {
        let tree = parse("<p>x</p><p>x</p>");
        let code = render(&tree, tree.root()).unwrap();
        assert_eq!(code.matches("_jsp_string1,").count(), 2);
    }
}
