use jspc_core::{CompileOptions, CompileResult, Dependency, TemplateTree};
use log::debug;

use crate::{quoted, CodeWriter, CodegenContext, LineMapping, RuntimeImports};

/// Everything one compilation produces
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    /// Source of the page class
    pub source: String,
    /// Resources the page was compiled from, to decide when to recompile
    pub dependencies: Vec<Dependency>,
    /// Generated line to template location
    pub line_map: Vec<LineMapping>,
    /// Pooled literals, by index
    pub strings: Vec<String>,
    /// Pooled expressions, by index
    pub expressions: Vec<String>,
}

/// Depth of the statements inside the service method's `try`
const BODY_DEPTH: usize = 3;

/// Compiles a tree into the source of a page class
pub fn generate_page(tree: &TemplateTree, options: &CompileOptions) -> CompileResult<GeneratedPage> {
    let mut ctx = CodegenContext::new(tree, options);
    ctx.out = CodeWriter::new(options.line_markers).with_depth(BODY_DEPTH);
    ctx.generate_node(tree.root())?;

    debug!(
        "Generated body of {}: {} strings, {} expressions, {} dependencies",
        tree.filename(),
        ctx.strings.len(),
        ctx.exprs.len(),
        ctx.depends.len()
    );

    let body = std::mem::replace(&mut ctx.out, CodeWriter::new(false));
    ctx.generate_page_wrapper(body);

    let CodegenContext {
        out,
        strings,
        exprs,
        depends,
        ..
    } = ctx;
    let (source, line_map) = out.into_parts();

    Ok(GeneratedPage {
        source,
        dependencies: depends.into_vec(),
        line_map,
        strings: strings.into_vec(),
        expressions: exprs.into_vec(),
    })
}

impl CodegenContext<'_> {
    /// Puts the generated body into its class
    fn generate_page_wrapper(&mut self, body: CodeWriter) {
        if !self.options.package.is_empty() {
            self.out.println(&format!("package {};", self.options.package));
            self.out.newline();
        }

        self.generate_imports();
        self.out.newline();

        self.out.println(&format!(
            "public class {} extends com.caucho.jsp.JavaPage {{",
            self.options.class_name
        ));

        let declarations = std::mem::take(&mut self.declarations);
        if !declarations.as_str().is_empty() {
            self.out.append(declarations);
            self.out.newline();
        }

        self.out.push_depth();
        self.generate_service_method(body);
        self.generate_constants();
        self.out.pop_depth();

        self.out.println("}");
    }

    fn generate_service_method(&mut self, body: CodeWriter) {
        self.out.println(
            "public void _jspService(HttpServletRequest request, HttpServletResponse response)",
        );
        self.out.println("  throws IOException, ServletException");
        self.out.println("{");
        self.out.push_depth();

        self.out.println(
            "com.caucho.jsp.PageContextImpl pageContext = allocatePageContext(request, response);",
        );
        self.out.println("JspWriter out = pageContext.getOut();");
        if self.used_imports.contains(RuntimeImports::El) {
            self.out.println("ELContext _jsp_env = pageContext.getELContext();");
        }

        self.out.println("try {");
        self.out.append(body);
        self.out.println("} catch (Throwable _jsp_exn) {");
        self.out.println("  pageContext.handlePageException(_jsp_exn);");
        self.out.println("} finally {");
        self.out.println("  freePageContext(pageContext);");
        self.out.println("}");

        self.out.pop_depth();
        self.out.println("}");
    }

    /// Pooled strings become `char[]` constants, pooled expressions are parsed once
    fn generate_constants(&mut self) {
        if !self.strings.is_empty() {
            self.out.newline();
            for idx in 0..self.strings.len() {
                self.out
                    .println(&format!("private final static char []_jsp_string{idx};"));
            }

            self.out.newline();
            self.out.println("static {");
            self.out.push_depth();
            for (idx, text) in self.strings.iter().enumerate() {
                self.out
                    .println(&format!("_jsp_string{idx} = {}.toCharArray();", quoted(text)));
            }
            self.out.pop_depth();
            self.out.println("}");
        }

        if !self.exprs.is_empty() {
            self.out.newline();
            for (idx, expr) in self.exprs.iter().enumerate() {
                self.out.println(&format!(
                    "private final static com.caucho.el.Expr _jsp_expr_{idx} = com.caucho.jsp.JspUtil.createExpr({});",
                    quoted(expr)
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jspc_core::{CompileConfig, CompileOptions, Dependency};
    use pretty_assertions::assert_eq;

    use crate::test_utils::{parse, parse_with};

    use super::*;

    #[test]
    fn it_wraps_the_body_in_a_page_class() {
        let tree = parse("<p>Hi</p>");
        let page = generate_page(&tree, &CompileOptions::default()).unwrap();

        assert_eq!(
            page.source,
            r#"import java.io.*;
import javax.servlet.*;
import javax.servlet.http.*;
import javax.servlet.jsp.*;

public class _jsp_page extends com.caucho.jsp.JavaPage {
  public void _jspService(HttpServletRequest request, HttpServletResponse response)
    throws IOException, ServletException
  {
    com.caucho.jsp.PageContextImpl pageContext = allocatePageContext(request, response);
    JspWriter out = pageContext.getOut();
    try {
      out.write(_jsp_string0, 0, _jsp_string0.length);
      out.write(_jsp_string1, 0, _jsp_string1.length);
      out.write(_jsp_string2, 0, _jsp_string2.length);
    } catch (Throwable _jsp_exn) {
      pageContext.handlePageException(_jsp_exn);
    } finally {
      freePageContext(pageContext);
    }
  }

  private final static char []_jsp_string0;
  private final static char []_jsp_string1;
  private final static char []_jsp_string2;

  static {
    _jsp_string0 = "<p>".toCharArray();
    _jsp_string1 = "Hi".toCharArray();
    _jsp_string2 = "</p>".toCharArray();
  }
}
"#
        );
        assert_eq!(page.strings, vec!["<p>", "Hi", "</p>"]);
        assert!(page.expressions.is_empty());
    }

    #[test]
    fn it_sets_up_el_only_when_used() {
        let tree = parse("<p>${user.name}</p>");
        let page = generate_page(&tree, &CompileOptions::default()).unwrap();

        assert!(page.source.contains("import javax.el.*;\n"));
        assert!(page.source.contains("    ELContext _jsp_env = pageContext.getELContext();\n"));
        assert!(page.source.contains(
            "  private final static com.caucho.el.Expr _jsp_expr_0 = com.caucho.jsp.JspUtil.createExpr(\"${user.name}\");\n"
        ));
        assert_eq!(page.expressions, vec!["${user.name}"]);
    }

    #[test]
    fn it_hoists_declarations_and_names_the_class() {
        let tree = parse("<jsp:declaration>int hits;</jsp:declaration><p>x</p>");
        let options = CompileOptions {
            class_name: "_jsp_index".to_owned(),
            package: "_jsp.shop".to_owned(),
            ..Default::default()
        };
        let page = generate_page(&tree, &options).unwrap();

        assert!(page.source.starts_with("package _jsp.shop;\n\nimport java.io.*;\n"));
        assert!(page
            .source
            .contains("public class _jsp_index extends com.caucho.jsp.JavaPage {\n  int hits;\n\n  public void _jspService("));
    }

    #[test]
    fn it_maps_generated_lines_to_the_template() {
        let tree = parse("<p>\n<jsp:scriptlet>count++;</jsp:scriptlet>\n</p>");
        let options = CompileOptions {
            line_markers: true,
            ..Default::default()
        };
        let page = generate_page(&tree, &options).unwrap();

        let scriptlet_line = page
            .source
            .lines()
            .position(|line| line.trim() == "count++;")
            .unwrap() as u32
            + 1;
        let mapping = page
            .line_map
            .iter()
            .find(|mapping| mapping.generated_line == scriptlet_line)
            .unwrap();
        assert_eq!(mapping.source.line, 2);
        assert!(page.source.contains("// test.jsp:2\n"));
    }

    #[test]
    fn it_lists_dependencies() {
        let config = CompileConfig::default();
        let mut tree = parse_with(&config, "<p>x</p>");
        tree.dependencies_mut().add(Dependency::new("/header.jspf", 3));

        let page = generate_page(&tree, &config.options).unwrap();
        assert_eq!(page.dependencies, vec![Dependency::new("/header.jspf", 3)]);
    }
}
