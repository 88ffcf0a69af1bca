use flagset::FlagSet;
use fxhash::FxHashMap;
use jspc_core::{
    CompileError, CompileErrorKind, CompileOptions, CompileResult, DependencyList, NodeId,
    TemplateTree,
};

use crate::{CodeWriter, ExprPool, RuntimeImports, StringPool};

/// State of one compilation.
///
/// Created per tree and threaded through every generation call,
/// nothing in it outlives the compilation.
#[derive(Debug)]
pub struct CodegenContext<'t> {
    pub(crate) tree: &'t TemplateTree,
    pub(crate) options: &'t CompileOptions,
    /// Body of the service method
    pub out: CodeWriter,
    /// Class members hoisted from `<jsp:declaration>`s
    pub declarations: CodeWriter,
    pub strings: StringPool,
    pub exprs: ExprPool,
    pub depends: DependencyList,
    pub(crate) used_imports: FlagSet<RuntimeImports>,
    unique_id: u32,
    /// Handler variables of the custom tags being generated, for `setParent`
    pub(crate) tag_vars: FxHashMap<NodeId, String>,
}

impl<'t> CodegenContext<'t> {
    pub fn new(tree: &'t TemplateTree, options: &'t CompileOptions) -> Self {
        CodegenContext {
            tree,
            options,
            out: CodeWriter::new(options.line_markers),
            declarations: CodeWriter::new(options.line_markers).with_depth(1),
            strings: StringPool::default(),
            exprs: ExprPool::default(),
            depends: tree.dependencies().clone(),
            used_imports: FlagSet::default(),
            unique_id: 0,
            tag_vars: FxHashMap::default(),
        }
    }

    /// Fresh id, never handed out twice in one compilation
    pub fn next_id(&mut self) -> u32 {
        let id = self.unique_id;
        self.unique_id += 1;
        id
    }

    /// Name for a temporary, `_jsp_<purpose>_<id>`
    pub fn temp_var(&mut self, purpose: &str) -> String {
        format!("_jsp_{}_{}", purpose, self.next_id())
    }

    /// Runs `f` one block deeper. The depth is restored even when `f` fails.
    pub fn in_block<F>(&mut self, f: F) -> CompileResult<()>
    where
        F: FnOnce(&mut Self) -> CompileResult<()>,
    {
        self.out.push_depth();
        let result = f(self);
        self.out.pop_depth();
        result
    }

    /// `header {`, the block contents, `}`
    pub fn generate_block<F>(&mut self, header: &str, f: F) -> CompileResult<()>
    where
        F: FnOnce(&mut Self) -> CompileResult<()>,
    {
        self.out.println(&format!("{header} {{"));
        self.in_block(f)?;
        self.out.println("}");
        Ok(())
    }

    pub(crate) fn error(&self, id: NodeId, kind: CompileErrorKind) -> CompileError {
        self.tree.error(id, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_hands_out_unique_ids() {
        let tree = TemplateTree::new("page.jsp");
        let options = CompileOptions::default();
        let mut ctx = CodegenContext::new(&tree, &options);

        assert_eq!(ctx.next_id(), 0);
        assert_eq!(ctx.temp_var("writer"), "_jsp_writer_1");
        assert_eq!(ctx.temp_var("writer"), "_jsp_writer_2");
    }

    #[test]
    fn it_balances_depth_on_failure() {
        let tree = TemplateTree::new("page.jsp");
        let options = CompileOptions::default();
        let mut ctx = CodegenContext::new(&tree, &options);
        let root = tree.root();

        let result = ctx.generate_block("try", |ctx| {
            ctx.in_block(|ctx| Err(ctx.error(root, CompileErrorKind::NotGenerable)))
        });

        assert!(result.is_err());
        assert_eq!(ctx.out.depth(), 0);
        assert_eq!(ctx.out.as_str(), "try {\n");
    }
}
