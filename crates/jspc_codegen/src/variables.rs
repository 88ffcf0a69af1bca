//! `<c:out>`, `<c:set>` and `<c:remove>`

use jspc_core::{
    parse_boolean, AttributeValue, CompileResult, CoreOut, CoreRemove, CoreSet, NodeId, ValueSyntax,
    ValueType,
};

use crate::{quoted, CodegenContext};

impl CodegenContext<'_> {
    /// Prints a value, falling back to `default` or the body when it is null
    pub(crate) fn generate_out(&mut self, id: NodeId, node: &CoreOut) -> CompileResult<()> {
        let value_var = self.temp_var("value");
        let value = self.generate_optional_value(id, "value", node.value.as_ref(), ValueType::Object)?;
        self.out.println(&format!("Object {value_var} = {value};"));

        if let Some(default) = &node.default {
            self.out.println(&format!("if ({value_var} == null) {{"));
            self.in_block(|ctx| {
                let default = ctx.generate_value(id, "default", default, ValueType::Object)?;
                ctx.out.println(&format!("{value_var} = {default};"));
                Ok(())
            })?;
            self.out.println("}");
        } else if self.has_body(id) {
            self.out.println(&format!("if ({value_var} == null) {{"));
            self.in_block(|ctx| {
                let body = ctx.generate_capture(id, true)?;
                ctx.out.println(&format!("{value_var} = {body};"));
                Ok(())
            })?;
            self.out.println("}");
        }

        let escape = self.generate_escape_xml(id, node.escape_xml.as_ref())?;
        self.out
            .println(&format!("pageContext.printOut(out, {value_var}, {escape});"));

        Ok(())
    }

    /// `escapeXml` defaults to true, literals are checked at compile time
    fn generate_escape_xml(&mut self, id: NodeId, value: Option<&AttributeValue>) -> CompileResult<String> {
        let Some(value) = value else {
            return Ok("true".to_owned());
        };

        if let AttributeValue::Static(raw) = value {
            let syntax = ValueSyntax::classify(raw, !self.options.scripting_invalid, !self.options.el_ignored)
                .map_err(|kind| self.error(id, kind))?;

            if let ValueSyntax::Literal(text) = syntax {
                let escape = parse_boolean("escapeXml", text).map_err(|kind| self.error(id, kind))?;
                return Ok(escape.to_string());
            }
        }

        self.generate_value(id, "escapeXml", value, ValueType::Boolean)
    }

    /// Sets a scoped variable or a bean property
    pub(crate) fn generate_set(&mut self, id: NodeId, node: &CoreSet) -> CompileResult<()> {
        let value = match &node.value {
            Some(value) => self.generate_value(id, "value", value, ValueType::Object)?,
            None if self.has_body(id) => self.generate_capture(id, true)?,
            None => quoted(""),
        };

        if let Some(var) = &node.var {
            self.generate_set_or_remove(node.scope.unwrap_or_default(), var, &value);
            return Ok(());
        }

        let target = self.generate_optional_value(id, "target", node.target.as_ref(), ValueType::Object)?;
        let property =
            self.generate_optional_value(id, "property", node.property.as_ref(), ValueType::String)?;
        self.out.println(&format!(
            "pageContext.setProperty({target}, {property}, {value});"
        ));

        Ok(())
    }

    /// Without a scope the variable goes away in every scope
    pub(crate) fn generate_remove(&mut self, node: &CoreRemove) {
        let Some(var) = &node.var else {
            return;
        };

        match node.scope {
            Some(scope) => self.out.println(&format!(
                "pageContext.removeAttribute({}, {});",
                quoted(var),
                scope.context_constant()
            )),
            None => self
                .out
                .println(&format!("pageContext.removeAttribute({});", quoted(var))),
        }
    }
}
