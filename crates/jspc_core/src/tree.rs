use std::sync::Arc;

use crate::{
    CompileError, CompileErrorKind, DependencyList, NodeKind, PageRoot, QName, SourceLocation,
    JSP_PREFIX,
};

/// Index of a node in its [`TemplateTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: QName,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub location: SourceLocation,
    /// Line of the closing tag
    pub end_line: u32,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn end_location(&self) -> SourceLocation {
        self.location.with_line(self.end_line)
    }
}

/// Arena holding all nodes of one template.
///
/// Parent links and child lists are only changed together,
/// through [`TemplateTree::attach`] and [`TemplateTree::detach`].
#[derive(Debug, Clone)]
pub struct TemplateTree {
    nodes: Vec<Node>,
    filename: Arc<str>,
    dependencies: DependencyList,
    /// Tag library prefixes in use, in first-use order
    namespaces: Vec<(String, String)>,
}

impl TemplateTree {
    pub fn new(filename: &str) -> Self {
        let filename: Arc<str> = Arc::from(filename);
        let root = Node {
            name: QName::new(Some(JSP_PREFIX), "root"),
            kind: NodeKind::Page(PageRoot::default()),
            parent: None,
            children: Vec::new(),
            location: SourceLocation::new(filename.clone(), 1),
            end_line: 1,
        };

        TemplateTree {
            nodes: vec![root],
            filename,
            dependencies: DependencyList::default(),
            namespaces: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn filename(&self) -> &Arc<str> {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a detached node
    pub fn create(&mut self, name: QName, kind: NodeKind, line: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name,
            kind,
            parent: None,
            children: Vec::new(),
            location: SourceLocation::new(self.filename.clone(), line),
            end_line: line,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Appends `child` to `parent`, taking it away from its previous parent first
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Removes `child` from its parent. The node stays in the arena, unreachable.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes[child.index()].parent.take() else {
            return;
        };

        self.nodes[parent.index()].children.retain(|&id| id != child);
    }

    /// Parent, grandparent and so on up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&id| self.parent(id))
    }

    /// Concatenated text of a node's children, `None` if any child is not plain text
    pub fn static_text(&self, id: NodeId) -> Option<String> {
        let mut text = String::new();
        for &child in self.children(id) {
            text.push_str(self.kind(child).as_text()?);
        }
        Some(text)
    }

    pub fn dependencies(&self) -> &DependencyList {
        &self.dependencies
    }

    pub fn dependencies_mut(&mut self) -> &mut DependencyList {
        &mut self.dependencies
    }

    pub fn add_namespace(&mut self, prefix: &str, uri: &str) {
        if self.namespaces.iter().any(|(known, _)| known == prefix) {
            return;
        }
        self.namespaces.push((prefix.to_owned(), uri.to_owned()));
    }

    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    /// Error reported against a node
    pub fn error(&self, id: NodeId, kind: CompileErrorKind) -> CompileError {
        let node = self.node(id);
        CompileError::new(kind, node.name.to_string(), node.location.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::StandardTag;

    use super::*;

    fn new_if(tree: &mut TemplateTree, line: u32) -> NodeId {
        tree.create(QName::parse("c:if"), StandardTag::If.new_kind(), line)
    }

    #[test]
    fn it_keeps_parent_links_in_sync() {
        let mut tree = TemplateTree::new("page.jsp");
        let root = tree.root();
        let outer = new_if(&mut tree, 2);
        let inner = new_if(&mut tree, 3);

        tree.attach(root, outer);
        tree.attach(outer, inner);
        assert_eq!(tree.children(root), &[outer]);
        assert_eq!(tree.parent(inner), Some(outer));
        assert_eq!(tree.ancestors(inner).collect::<Vec<_>>(), vec![outer, root]);

        // Reparenting moves the child entirely
        tree.attach(root, inner);
        assert!(tree.children(outer).is_empty());
        assert_eq!(tree.children(root), &[outer, inner]);
        assert_eq!(tree.parent(inner), Some(root));

        tree.detach(inner);
        assert_eq!(tree.children(root), &[outer]);
        assert_eq!(tree.parent(inner), None);
    }

    #[test]
    fn it_reports_errors_against_nodes() {
        let mut tree = TemplateTree::new("page.jsp");
        let node = new_if(&mut tree, 7);
        let err = tree.error(node, CompileErrorKind::ChooseWithoutWhen);
        assert_eq!(err.tag_name, "c:if");
        assert_eq!(err.location.line, 7);
        assert_eq!(
            err.to_string(),
            "page.jsp:7: <c:if>: at least one <c:when> is required"
        );
    }
}
