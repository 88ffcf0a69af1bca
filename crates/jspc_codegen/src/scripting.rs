use std::borrow::Cow;

use jspc_core::{Scripting, ScriptingKind};

use crate::{CodegenContext, RuntimeImports};

impl CodegenContext<'_> {
    pub(crate) fn generate_scripting(&mut self, scripting: &Scripting) {
        match scripting.kind {
            ScriptingKind::Expression => self.generate_expression(&scripting.code),
            ScriptingKind::Scriptlet => {
                self.out.print(&normalize_line_ends(&scripting.code));
                self.out.finish_line();
            }
            ScriptingKind::Declaration => {
                self.declarations.print(&normalize_line_ends(&scripting.code));
                self.declarations.finish_line();
            }
        }
    }

    /// Prints the value of a raw expression
    fn generate_expression(&mut self, code: &str) {
        self.out.print("out.print((");
        self.out.print(code);

        // Otherwise the closing parens would end up in the comment
        if ends_in_line_comment(code) {
            self.out.newline();
        }

        self.out.println("));");
    }

    /// Prints an expression-language run through the expression pool
    pub(crate) fn generate_el(&mut self, expr: &str) {
        self.add_to_imports(RuntimeImports::El);
        let idx = self.exprs.add(expr);
        self.out
            .println(&format!("_jsp_expr_{idx}.print(out, _jsp_env, false);"));
    }
}

/// Whether a `//` is still open on the last line of the code
pub fn ends_in_line_comment(code: &str) -> bool {
    let mut in_comment = false;
    let mut prev = None;

    for ch in code.chars() {
        match ch {
            '\n' | '\r' => in_comment = false,
            '/' if prev == Some('/') => in_comment = true,
            _ => {}
        }
        prev = Some(ch);
    }

    in_comment
}

/// A carriage return not followed by a line feed becomes a line feed
pub fn normalize_line_ends(code: &str) -> Cow<'_, str> {
    if !code.contains('\r') {
        return Cow::Borrowed(code);
    }

    let mut result = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' && chars.peek() != Some(&'\n') {
            result.push('\n');
        } else {
            result.push(ch);
        }
    }

    Cow::Owned(result)
}
