use jspc_core::{CompileResult, CoreCatch, CoreIf, NodeId, NodeKind, Scope, TestSource};
use smallvec::SmallVec;

use crate::{quoted, CodegenContext};

/// One clause of a `<c:choose>`
#[derive(Clone, Copy)]
enum Branch<'t> {
    When(NodeId, &'t TestSource),
    Otherwise(NodeId),
}

impl CodegenContext<'_> {
    /// Generates `<c:if>`.
    /// When `var` is given, it ends up holding the test result on both paths.
    pub(crate) fn generate_if(&mut self, id: NodeId, node: &CoreIf) -> CompileResult<()> {
        let test = self.generate_test(id, &node.test)?;
        let store = node
            .var
            .as_deref()
            .map(|var| (var, node.scope.unwrap_or_default()));

        self.out.println(&format!("if ({test}) {{"));
        self.in_block(|ctx| {
            if let Some((var, scope)) = store {
                ctx.generate_set_or_remove(scope, var, "Boolean.TRUE");
            }
            ctx.generate_body(id)
        })?;

        if let Some((var, scope)) = store {
            self.out.println("} else {");
            self.in_block(|ctx| {
                ctx.generate_set_or_remove(scope, var, "Boolean.FALSE");
                Ok(())
            })?;
        }

        self.out.println("}");
        Ok(())
    }

    /// Generates `<c:choose>` as a first-match chain
    pub(crate) fn generate_choose(&mut self, id: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        let branches: SmallVec<[Branch; 4]> = tree
            .children(id)
            .iter()
            .filter_map(|&child| match tree.kind(child) {
                NodeKind::When(test) => Some(Branch::When(child, test)),
                NodeKind::Otherwise => Some(Branch::Otherwise(child)),
                _ => None,
            })
            .collect();

        self.generate_branches(&branches)
    }

    fn generate_branches(&mut self, branches: &[Branch]) -> CompileResult<()> {
        let Some((first, rest)) = branches.split_first() else {
            return Ok(());
        };

        match *first {
            Branch::When(when, test) => {
                self.out.set_location(&self.tree.node(when).location);
                let test = self.generate_test(when, test)?;
                self.out.println(&format!("if ({test}) {{"));
                self.in_block(|ctx| ctx.generate_node(when))?;
                self.generate_else(rest)
            }

            // Never first after validation
            Branch::Otherwise(otherwise) => self.generate_node(otherwise),
        }
    }

    /// Continues an open `if` with the remaining branches and closes it
    fn generate_else(&mut self, rest: &[Branch]) -> CompileResult<()> {
        let Some(next) = rest.first() else {
            self.out.println("}");
            return Ok(());
        };

        match *next {
            Branch::When(when, test) if self.is_simple_test(test) => {
                let test = self.generate_test(when, test)?;
                self.out.println(&format!("}} else if ({test}) {{"));
                self.in_block(|ctx| ctx.generate_node(when))?;
                self.generate_else(&rest[1..])
            }

            // The test writes statements, so it has to live inside the else
            Branch::When(..) => {
                self.out.println("} else {");
                self.in_block(|ctx| ctx.generate_branches(rest))?;
                self.out.println("}");
                Ok(())
            }

            Branch::Otherwise(otherwise) => {
                self.out.println("} else {");
                self.in_block(|ctx| ctx.generate_node(otherwise))?;
                self.out.println("}");
                Ok(())
            }
        }
    }

    /// Generates `<c:catch>`. The variable only ever lives in page scope.
    pub(crate) fn generate_catch(&mut self, id: NodeId, node: &CoreCatch) -> CompileResult<()> {
        let writer = self.temp_var("writer");
        let exn = self.temp_var("exn");
        let var = node.var.as_deref();

        self.out.println(&format!("JspWriter {writer} = out;"));
        self.out.println("try {");
        self.in_block(|ctx| {
            ctx.generate_body(id)?;
            if let Some(var) = var {
                ctx.generate_set_or_remove(Scope::Page, var, "null");
            }
            Ok(())
        })?;

        self.out.println(&format!("}} catch (Throwable {exn}) {{"));
        self.in_block(|ctx| {
            ctx.out.println(&format!("out = pageContext.setWriter({writer});"));
            if let Some(var) = var {
                ctx.generate_set_or_remove(Scope::Page, var, &exn);
            }
            Ok(())
        })?;
        self.out.println("}");

        Ok(())
    }

    /// Stores `value` in a scoped variable, removing the variable when the value is null
    pub(crate) fn generate_set_or_remove(&mut self, scope: Scope, var: &str, value: &str) {
        self.out.println(&format!(
            "pageContext.{}({}, {value});",
            scope.set_or_remove_method(),
            quoted(var)
        ));
    }
}
