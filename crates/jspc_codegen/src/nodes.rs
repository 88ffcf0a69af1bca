use jspc_core::{CompileErrorKind, CompileResult, NodeId, NodeKind};
use log::trace;

use crate::CodegenContext;

impl CodegenContext<'_> {
    /// Generates a node and, through it, its subtree.
    /// Code is written in document order, bracketed by the node's start and end location.
    pub fn generate_node(&mut self, id: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        let node = tree.node(id);
        trace!("Generating <{}> at {}", node.name, node.location);
        self.out.set_location(&node.location);

        match &node.kind {
            NodeKind::Page(_) | NodeKind::JspText | NodeKind::Body => self.generate_body(id)?,
            NodeKind::Text(run) => self.generate_text(&run.text),
            NodeKind::El(run) => self.generate_el(&run.expr),
            NodeKind::Scripting(scripting) => self.generate_scripting(scripting),
            NodeKind::Element(element) => self.generate_element(id, &node.name, element)?,

            // Only ever generated by the tag owning them
            NodeKind::Attribute(_) | NodeKind::JspParam(_) | NodeKind::CoreParam(_) => {
                return Err(self.error(id, CompileErrorKind::NotGenerable))
            }

            // Included at tree-building time
            NodeKind::IncludeDirective(_) => {}

            NodeKind::Include(include) => self.generate_include(id, include)?,
            NodeKind::Out(out) => self.generate_out(id, out)?,
            NodeKind::Set(set) => self.generate_set(id, set)?,
            NodeKind::Remove(remove) => self.generate_remove(remove),
            NodeKind::If(node) => self.generate_if(id, node)?,
            NodeKind::Choose => self.generate_choose(id)?,
            NodeKind::When(_) | NodeKind::Otherwise => self.generate_body(id)?,
            NodeKind::Catch(node) => self.generate_catch(id, node)?,
            NodeKind::ForEach(node) => self.generate_for_each(id, node)?,
            NodeKind::Url(url) => self.generate_url(id, url)?,
            NodeKind::Import(import) => self.generate_import(id, import)?,
            NodeKind::Redirect(redirect) => self.generate_redirect(id, redirect)?,
            NodeKind::Custom(tag) => self.generate_custom_tag(id, tag)?,
        }

        self.out.set_location(&node.end_location());
        Ok(())
    }

    /// Generates the body children of a node, skipping its `<jsp:attribute>`s
    pub fn generate_body(&mut self, id: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        for &child in tree.children(id) {
            if matches!(tree.kind(child), NodeKind::Attribute(_)) {
                continue;
            }

            self.generate_node(child)?;
        }

        Ok(())
    }

    /// Whether the node has children besides `<jsp:attribute>`s
    pub(crate) fn has_body(&self, id: NodeId) -> bool {
        self.tree
            .children(id)
            .iter()
            .any(|&child| !matches!(self.tree.kind(child), NodeKind::Attribute(_)))
    }
}

#[cfg(test)]
mod tests {
    use jspc_core::CompileErrorKind;

    use crate::test_utils::{parse, render};

    #[test]
    fn it_refuses_to_generate_params_directly() {
        let tree = parse(r#"<c:url value="/a"><c:param name="q" value="1"/></c:url>"#);
        let url = tree.children(tree.root())[0];
        let param = tree.children(url)[0];

        let err = render(&tree, param).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::NotGenerable);
        assert_eq!(err.tag_name, "c:param");
    }

    #[test]
    fn it_skips_attribute_fragments_in_bodies() {
        let tree = parse(
            r#"<c:if><jsp:attribute name="test">${a}</jsp:attribute><jsp:body>yes</jsp:body></c:if>"#,
        );
        let code = render(&tree, tree.root()).unwrap();
        assert_eq!(code.matches("out.write(").count(), 1);
    }
}
