use jspc_core::{
    AttributeValue, CompileConfig, CompileError, CompileErrorKind, CompileResult, NodeId, NodeKind,
    QName, SourceLocation, StandardTag, TemplateTree,
};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootElement {
    /// No `<jsp:root>` seen, the page root is implicit
    Absent,
    /// `<jsp:root>` started, attributes still coming
    Attributes,
    Open,
    Closed,
}

/// Builds a [`TemplateTree`] from the events of an upstream parser.
///
/// Each element goes through the node lifecycle in order:
/// creation, attributes, attachment to its parent, children, completion,
/// and finally notification of the parent.
/// Every step validates as early as it can, so a failure points at the first offending node.
pub struct TreeBuilder<'c> {
    pub(crate) config: &'c CompileConfig,
    pub(crate) tree: TemplateTree,
    /// Elements whose end tag has not been seen yet, innermost last
    open: Vec<NodeId>,
    /// Element which is still receiving attributes
    pending: Option<NodeId>,
    root_element: RootElement,
}

impl<'c> TreeBuilder<'c> {
    pub fn new(config: &'c CompileConfig, filename: &str) -> Self {
        TreeBuilder {
            config,
            tree: TemplateTree::new(filename),
            open: Vec::new(),
            pending: None,
            root_element: RootElement::Absent,
        }
    }

    pub fn tree(&self) -> &TemplateTree {
        &self.tree
    }

    /// Innermost open element, or the page root
    pub fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.tree.root())
    }

    pub fn start_element(&mut self, raw_name: &str, line: u32) -> CompileResult<NodeId> {
        self.close_attributes()?;

        let name = QName::parse(raw_name);
        if StandardTag::lookup(&name) == Some(StandardTag::Root) {
            let root = self.tree.root();
            let is_document_element = self.root_element == RootElement::Absent
                && self.open.is_empty()
                && self.tree.children(root).is_empty();

            if !is_document_element {
                return Err(self.error_at(&name, line, CompileErrorKind::MisplacedRoot));
            }

            self.tree.node_mut(root).location.line = line;
            self.root_element = RootElement::Attributes;
            self.pending = Some(root);
            return Ok(root);
        }

        let id = self.create_node(name, line)?;
        self.pending = Some(id);
        Ok(id)
    }

    /// Static attribute of the element started last
    pub fn attribute(&mut self, raw_name: &str, value: &str) -> CompileResult<()> {
        let Some(id) = self.pending else {
            let current = self.current();
            return Err(self.tree.error(
                current,
                CompileErrorKind::UnknownAttribute {
                    attribute: raw_name.to_owned(),
                },
            ));
        };

        let name = QName::parse(raw_name);

        // Namespace declarations are implied by the prefixes in use
        let is_namespace = raw_name == "xmlns" || name.prefix() == Some("xmlns");
        if is_namespace && matches!(self.tree.kind(id), NodeKind::Page(_)) {
            return Ok(());
        }

        self.add_attribute(id, name, AttributeValue::Static(value.to_owned()))
    }

    /// Attaches the element started last to its parent.
    /// Called implicitly by the next event if the parser does not.
    pub fn close_attributes(&mut self) -> CompileResult<()> {
        let Some(id) = self.pending.take() else {
            return Ok(());
        };

        if id == self.tree.root() {
            self.root_element = RootElement::Open;
            return Ok(());
        }

        let parent = self.current();
        self.add_child(parent, id)?;
        self.open.push(id);
        self.end_attributes(id)
    }

    pub fn text(&mut self, text: &str, line: u32) -> CompileResult<()> {
        self.close_attributes()?;

        let current = self.current();
        self.add_text(current, text, line)
    }

    pub fn close_element(&mut self, raw_name: &str, line: u32) -> CompileResult<()> {
        self.close_attributes()?;

        let name = QName::parse(raw_name);
        let Some(&id) = self.open.last() else {
            let root = self.tree.root();
            if self.root_element == RootElement::Open && StandardTag::lookup(&name) == Some(StandardTag::Root) {
                self.root_element = RootElement::Closed;
                self.tree.node_mut(root).end_line = line;
                return Ok(());
            }

            return Err(self.error_at(
                &name,
                line,
                CompileErrorKind::MismatchedEndTag {
                    expected: self.tree.node(root).name.to_string(),
                    found: raw_name.to_owned(),
                },
            ));
        };

        if self.tree.node(id).name != name {
            return Err(self.tree.error(
                id,
                CompileErrorKind::MismatchedEndTag {
                    expected: self.tree.node(id).name.to_string(),
                    found: raw_name.to_owned(),
                },
            ));
        }

        self.open.pop();
        self.tree.node_mut(id).end_line = line;
        self.end_element(id)?;

        let parent = self.current();
        self.add_child_end(parent, id)
    }

    /// Hands out the complete tree
    pub fn finish(mut self) -> CompileResult<TemplateTree> {
        self.close_attributes()?;

        if let Some(&id) = self.open.last() {
            return Err(self.tree.error(id, CompileErrorKind::UnclosedTag));
        }

        if self.root_element == RootElement::Open {
            return Err(self.tree.error(self.tree.root(), CompileErrorKind::UnclosedTag));
        }

        debug!(
            "Built {} with {} nodes and {} dependencies",
            self.tree.filename(),
            self.tree.len(),
            self.tree.dependencies().len()
        );

        Ok(self.tree)
    }

    /// Error for a node which does not exist (yet)
    pub(crate) fn error_at(&self, name: &QName, line: u32, kind: CompileErrorKind) -> CompileError {
        CompileError::new(
            kind,
            name.to_string(),
            SourceLocation::new(self.tree.filename().clone(), line),
        )
    }
}
