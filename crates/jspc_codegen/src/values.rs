//! Attribute values as expressions of the generated code

use jspc_core::{
    AttributeValue, CompileErrorKind, CompileResult, NodeId, NodeKind, TestSource, ValueSyntax,
    ValueType,
};

use crate::{CodegenContext, RuntimeImports};

/// Escapes text for a double-quoted string literal
pub fn escape_java_string(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            _ => result.push(ch),
        }
    }
    result
}

/// Double-quoted string literal
pub fn quoted(text: &str) -> String {
    format!("\"{}\"", escape_java_string(text))
}

impl CodegenContext<'_> {
    /// Expression producing an attribute value converted to `value_type`.
    ///
    /// Fragments are captured first, so this may write statements
    /// which have to run before the returned expression.
    pub fn generate_value(
        &mut self,
        owner: NodeId,
        name: &str,
        value: &AttributeValue,
        value_type: ValueType,
    ) -> CompileResult<String> {
        match value {
            AttributeValue::Static(raw) => self.generate_static_value(owner, name, raw, value_type),
            AttributeValue::Fragment(fragment) => {
                if let Some(text) = self.static_fragment_text(*fragment) {
                    return self.literal_value(owner, name, &text, value_type);
                }

                let trim = match self.tree.kind(*fragment) {
                    NodeKind::Attribute(attr) => attr.trim,
                    _ => true,
                };
                let captured = self.generate_capture(*fragment, trim)?;
                Ok(convert_string(&captured, value_type))
            }
        }
    }

    /// Same as [`CodegenContext::generate_value`] for an optional attribute
    pub fn generate_optional_value(
        &mut self,
        owner: NodeId,
        name: &str,
        value: Option<&AttributeValue>,
        value_type: ValueType,
    ) -> CompileResult<String> {
        match value {
            Some(value) => self.generate_value(owner, name, value, value_type),
            None => Ok("null".to_owned()),
        }
    }

    /// Whether generating the value writes statements of its own
    pub fn needs_preparation(&self, value: &AttributeValue) -> bool {
        match value {
            AttributeValue::Static(_) => false,
            AttributeValue::Fragment(fragment) => self.static_fragment_text(*fragment).is_none(),
        }
    }

    /// Boolean expression of a conditional's test
    pub fn generate_test(&mut self, owner: NodeId, test: &TestSource) -> CompileResult<String> {
        let value = match (&test.expr, test.fragment) {
            (Some(expr), None) => AttributeValue::Static(expr.to_owned()),
            (None, Some(fragment)) => AttributeValue::Fragment(fragment),
            (Some(_), Some(_)) => {
                return Err(self.error(
                    owner,
                    CompileErrorKind::ConflictingAttributes {
                        first: "test".to_owned(),
                        second: "jsp:attribute test".to_owned(),
                    },
                ))
            }
            (None, None) => {
                return Err(self.error(
                    owner,
                    CompileErrorKind::MissingAttribute {
                        attribute: "test".to_owned(),
                    },
                ))
            }
        };

        self.generate_value(owner, "test", &value, ValueType::Boolean)
    }

    /// Whether a test can go straight into an `else if`
    pub fn is_simple_test(&self, test: &TestSource) -> bool {
        test.fragment
            .map_or(true, |fragment| self.static_fragment_text(fragment).is_some())
    }

    fn generate_static_value(
        &mut self,
        owner: NodeId,
        name: &str,
        raw: &str,
        value_type: ValueType,
    ) -> CompileResult<String> {
        let syntax = ValueSyntax::classify(
            raw,
            !self.options.scripting_invalid,
            !self.options.el_ignored,
        )
        .map_err(|kind| self.error(owner, kind))?;

        match syntax {
            ValueSyntax::Runtime(code) => Ok(format!("({})", code.trim())),
            ValueSyntax::El(expr) => {
                self.add_to_imports(RuntimeImports::El);
                let idx = self.exprs.add(expr);
                let call = match value_type {
                    ValueType::String => "evalString",
                    ValueType::Boolean => "evalBoolean",
                    ValueType::Int | ValueType::Long => "evalLong",
                    ValueType::Double => "evalDouble",
                    ValueType::Object => "evalObject",
                };

                let expr = format!("_jsp_expr_{idx}.{call}(_jsp_env)");
                Ok(match value_type {
                    ValueType::Int => format!("(int) {expr}"),
                    _ => expr,
                })
            }
            ValueSyntax::Literal(text) => self.literal_value(owner, name, text, value_type),
        }
    }

    fn literal_value(
        &self,
        owner: NodeId,
        name: &str,
        text: &str,
        value_type: ValueType,
    ) -> CompileResult<String> {
        let invalid_number = || {
            self.error(
                owner,
                CompileErrorKind::InvalidNumber {
                    attribute: name.to_owned(),
                    value: text.to_owned(),
                },
            )
        };

        match value_type {
            ValueType::String | ValueType::Object => Ok(quoted(text)),
            ValueType::Boolean => Ok(text.trim().eq_ignore_ascii_case("true").to_string()),
            ValueType::Int => text
                .trim()
                .parse::<i32>()
                .map(|number| number.to_string())
                .map_err(|_| invalid_number()),
            ValueType::Long => text
                .trim()
                .parse::<i64>()
                .map(|number| format!("{number}L"))
                .map_err(|_| invalid_number()),
            ValueType::Double => text
                .trim()
                .parse::<f64>()
                .map(|number| format!("{number:?}"))
                .map_err(|_| invalid_number()),
        }
    }

    /// Text of a fragment holding nothing but text, trimmed unless asked otherwise
    fn static_fragment_text(&self, fragment: NodeId) -> Option<String> {
        let text = self.tree.static_text(fragment)?;
        match self.tree.kind(fragment) {
            NodeKind::Attribute(attr) if !attr.trim => Some(text),
            _ => Some(text.trim().to_owned()),
        }
    }

    /// Runs the body of `owner` against a pushed body and returns the variable holding its text
    pub fn generate_capture(&mut self, owner: NodeId, trim: bool) -> CompileResult<String> {
        self.add_to_imports(RuntimeImports::TagExt);

        let id = self.next_id();
        let body_var = format!("_jsp_body_{id}");
        let str_var = format!("_jsp_str_{id}");

        self.out.println(&format!("BodyContent {body_var} = pageContext.pushBody();"));
        self.out.println(&format!("out = {body_var};"));
        self.out.println("try {");
        self.in_block(|ctx| ctx.generate_body(owner))?;
        self.out.println("} finally {");
        self.in_block(|ctx| {
            ctx.out.println("out = pageContext.popBody();");
            Ok(())
        })?;
        self.out.println("}");

        let trim = if trim { ".trim()" } else { "" };
        self.out.println(&format!("String {str_var} = {body_var}.getString(){trim};"));

        Ok(str_var)
    }
}

/// Converts the text of a captured body
fn convert_string(var: &str, value_type: ValueType) -> String {
    match value_type {
        ValueType::String | ValueType::Object => var.to_owned(),
        ValueType::Boolean => format!("Boolean.parseBoolean({var})"),
        ValueType::Int => format!("Integer.parseInt({var})"),
        ValueType::Long => format!("Long.parseLong({var})"),
        ValueType::Double => format!("Double.parseDouble({var})"),
    }
}
