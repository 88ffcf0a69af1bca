use jspc_core::SourceLocation;

/// Generated line which starts the code for a template location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMapping {
    /// 1-based line of the generated source
    pub generated_line: u32,
    pub source: SourceLocation,
}

/// Output buffer for generated source.
///
/// Keeps the block depth for indentation and counts the lines it writes,
/// so that every location change can be mapped from the generated line back to the template.
#[derive(Debug)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
    indent_str: &'static str,
    at_line_start: bool,
    line: u32,
    location: Option<SourceLocation>,
    /// Location changed since the last line started
    location_pending: bool,
    line_markers: bool,
    line_map: Vec<LineMapping>,
}

impl Default for CodeWriter {
    fn default() -> Self {
        CodeWriter::new(false)
    }
}

impl CodeWriter {
    pub fn new(line_markers: bool) -> Self {
        CodeWriter {
            buf: String::new(),
            depth: 0,
            indent_str: "  ",
            at_line_start: true,
            line: 1,
            location: None,
            location_pending: false,
            line_markers,
            line_map: Vec::new(),
        }
    }

    /// Starts writing at the given depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn push_depth(&mut self) {
        self.depth += 1;
    }

    pub fn pop_depth(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced pop_depth");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Line the next character is written to
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn line_map(&self) -> &[LineMapping] {
        &self.line_map
    }

    pub fn into_parts(self) -> (String, Vec<LineMapping>) {
        (self.buf, self.line_map)
    }

    /// Template location of the code written next.
    /// Takes effect at the start of the next line.
    pub fn set_location(&mut self, location: &SourceLocation) {
        if self.location.as_ref() == Some(location) {
            return;
        }

        self.location = Some(location.clone());
        self.location_pending = true;
    }

    /// Writes text, indenting each line it starts
    pub fn print(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.newline();
                continue;
            }

            if self.at_line_start {
                self.start_line();
            }
            self.buf.push(ch);
        }
    }

    pub fn println(&mut self, text: &str) {
        self.print(text);
        self.newline();
    }

    pub fn newline(&mut self) {
        self.buf.push('\n');
        self.line += 1;
        self.at_line_start = true;
    }

    /// Ends the current line unless nothing was written to it
    pub fn finish_line(&mut self) {
        if !self.at_line_start {
            self.newline();
        }
    }

    /// Appends the output of another writer, moving its line map along
    pub fn append(&mut self, other: CodeWriter) {
        self.finish_line();

        let offset = self.line - 1;
        self.buf.push_str(&other.buf);
        self.line_map
            .extend(other.line_map.into_iter().map(|mapping| LineMapping {
                generated_line: mapping.generated_line + offset,
                source: mapping.source,
            }));
        self.line += other.line - 1;
        self.at_line_start = other.at_line_start;
    }

    fn start_line(&mut self) {
        self.at_line_start = false;

        if self.location_pending {
            self.location_pending = false;
            if let Some(location) = self.location.clone() {
                if self.line_markers {
                    self.indent();
                    self.buf.push_str("// ");
                    self.buf.push_str(&location.to_string());
                    self.buf.push('\n');
                    self.line += 1;
                }

                self.line_map.push(LineMapping {
                    generated_line: self.line,
                    source: location,
                });
            }
        }

        self.indent();
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str(self.indent_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn location(line: u32) -> SourceLocation {
        SourceLocation::new(Arc::from("page.jsp"), line)
    }

    #[test]
    fn it_indents_by_depth() {
        let mut out = CodeWriter::default();
        out.println("if (a) {");
        out.push_depth();
        out.println("b();\n\nc();");
        out.pop_depth();
        out.println("}");

        assert_eq!(out.as_str(), "if (a) {\n  b();\n\n  c();\n}\n");
        assert_eq!(out.line(), 6);
        assert_eq!(out.depth(), 0);
    }

    #[test]
    fn it_maps_lines() {
        let mut out = CodeWriter::default();
        out.set_location(&location(3));
        out.println("a();");
        out.println("b();");
        out.set_location(&location(3));
        out.println("c();");
        out.set_location(&location(7));
        out.println("d();");

        assert_eq!(
            out.line_map(),
            &[
                LineMapping {
                    generated_line: 1,
                    source: location(3)
                },
                LineMapping {
                    generated_line: 4,
                    source: location(7)
                },
            ]
        );
    }

    #[test]
    fn it_writes_line_markers() {
        let mut out = CodeWriter::new(true).with_depth(1);
        out.set_location(&location(2));
        out.println("a();");
        out.set_location(&location(5));
        out.println("b();");

        assert_eq!(
            out.as_str(),
            "  // page.jsp:2\n  a();\n  // page.jsp:5\n  b();\n"
        );
        assert_eq!(out.line_map()[1].generated_line, 4);
    }

    #[test]
    fn it_shifts_appended_lines() {
        let mut body = CodeWriter::default();
        body.set_location(&location(9));
        body.println("x();");

        let mut out = CodeWriter::default();
        out.println("class A {");
        out.print("void f() {");
        out.append(body);
        out.println("}");

        assert_eq!(out.as_str(), "class A {\nvoid f() {\nx();\n}\n");
        assert_eq!(out.line_map()[0].generated_line, 3);
        assert_eq!(out.line(), 5);
    }
}
