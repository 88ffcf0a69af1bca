//! Node lifecycle: attribute binding, child attachment and completion checks

use jspc_core::{
    AttributeForm, AttributeValue, BodyContent, CompileErrorKind, CompileResult, CustomTag,
    ElRun, NodeId, NodeKind, QName, Scope, TemplateTree, TextRun,
};
use log::{debug, trace};

use crate::{
    text::{is_whitespace, split_el, TextSegment},
    TreeBuilder,
};

mod control_flow;
mod core_tags;
mod custom;
mod jsp;

pub(crate) type AttributeTable = phf::Map<&'static str, AttributeForm>;

impl<'c> TreeBuilder<'c> {
    /// Creates the node for a tag name. The node is not attached yet.
    pub fn create_node(&mut self, name: QName, line: u32) -> CompileResult<NodeId> {
        let kind = match jspc_core::StandardTag::lookup(&name) {
            Some(tag) => tag.new_kind(),
            None => self.resolve_tag(&name, line)?,
        };

        let id = self.tree.create(name, kind, line);
        trace!("Created <{}> at line {}", self.tree.node(id).name, line);
        Ok(id)
    }

    /// Custom tag from the tag libraries, or plain markup for unknown prefixes
    fn resolve_tag(&mut self, name: &QName, line: u32) -> CompileResult<NodeKind> {
        let Some(prefix) = name.prefix() else {
            return Ok(NodeKind::Element(Default::default()));
        };

        let unknown_tag = || CompileErrorKind::UnknownTag {
            name: name.to_string(),
        };

        if jspc_core::StandardTag::is_reserved_prefix(prefix) {
            return Err(self.error_at(name, line, unknown_tag()));
        }

        let config = self.config;
        let Some(uri) = config.tag_libraries.namespace_uri(prefix) else {
            return Ok(NodeKind::Element(Default::default()));
        };

        let Some(info) = config.tag_libraries.find_tag(name) else {
            return Err(self.error_at(name, line, unknown_tag()));
        };

        self.tree.add_namespace(prefix, uri);
        self.tree
            .dependencies_mut()
            .extend(info.dependencies.iter().cloned());

        Ok(NodeKind::Custom(CustomTag::new(info)))
    }

    /// Binds an attribute to a node, checking the name and the form of the value
    pub fn add_attribute(&mut self, id: NodeId, name: QName, value: AttributeValue) -> CompileResult<()> {
        let attribute = name.to_string();

        let Some(form) = self.attribute_form(id, &name) else {
            return Err(self.tree.error(id, CompileErrorKind::UnknownAttribute { attribute }));
        };

        // A fragment of plain text is as good as a static value
        let value = match value {
            AttributeValue::Fragment(fragment) if form == AttributeForm::Static => {
                match self.static_fragment_text(fragment) {
                    Some(text) => AttributeValue::Static(text),
                    None => {
                        return Err(self
                            .tree
                            .error(id, CompileErrorKind::FragmentNotAllowed { attribute }))
                    }
                }
            }
            value => value,
        };

        let options = &self.config.options;
        let local = name.local();
        let result = match self.tree.kind_mut(id) {
            NodeKind::Page(page) => jsp::set_page_attribute(page, local, value),
            NodeKind::Element(element) => {
                if element.attributes.iter().any(|(known, _)| *known == name) {
                    Err(CompileErrorKind::DuplicateAttribute { attribute })
                } else {
                    element.attributes.push((name.clone(), value));
                    Ok(())
                }
            }
            NodeKind::Attribute(attr) => jsp::set_attribute_attribute(attr, local, value),
            NodeKind::JspParam(param) => jsp::set_param_attribute(param, local, value),
            NodeKind::Include(include) => jsp::set_include_attribute(include, local, value),
            NodeKind::IncludeDirective(directive) => jsp::set_directive_attribute(directive, local, value),
            NodeKind::Out(out) => core_tags::set_out_attribute(out, local, value),
            NodeKind::Set(set) => core_tags::set_set_attribute(set, local, value),
            NodeKind::Remove(remove) => core_tags::set_remove_attribute(remove, local, value),
            NodeKind::Url(url) => core_tags::set_url_attribute(url, local, value),
            NodeKind::Import(import) => core_tags::set_import_attribute(import, local, value),
            NodeKind::Redirect(redirect) => core_tags::set_redirect_attribute(redirect, local, value),
            NodeKind::CoreParam(param) => core_tags::set_param_attribute(param, local, value),
            NodeKind::If(node) => control_flow::set_if_attribute(node, local, value),
            NodeKind::When(test) => control_flow::set_when_attribute(test, local, value),
            NodeKind::Catch(node) => control_flow::set_catch_attribute(node, local, value),
            NodeKind::ForEach(node) => control_flow::set_for_each_attribute(node, local, value),
            NodeKind::Custom(tag) => custom::set_custom_attribute(tag, local, value, options),
            NodeKind::Text(_)
            | NodeKind::El(_)
            | NodeKind::Scripting(_)
            | NodeKind::JspText
            | NodeKind::Body
            | NodeKind::Choose
            | NodeKind::Otherwise => Err(unknown(local)),
        };

        result.map_err(|kind| self.tree.error(id, kind))
    }

    /// Accepted form of an attribute, `None` if the tag does not know it
    fn attribute_form(&self, id: NodeId, name: &QName) -> Option<AttributeForm> {
        let table = match self.tree.kind(id) {
            NodeKind::Element(_) => return Some(AttributeForm::Any),
            NodeKind::Custom(tag) => return custom::attribute_form(tag, name),
            NodeKind::Page(_) => &jsp::PAGE_ATTRIBUTES,
            NodeKind::Attribute(_) => &jsp::ATTRIBUTE_ATTRIBUTES,
            NodeKind::JspParam(_) => &jsp::PARAM_ATTRIBUTES,
            NodeKind::Include(_) => &jsp::INCLUDE_ATTRIBUTES,
            NodeKind::IncludeDirective(_) => &jsp::DIRECTIVE_ATTRIBUTES,
            NodeKind::Out(_) => &core_tags::OUT_ATTRIBUTES,
            NodeKind::Set(_) => &core_tags::SET_ATTRIBUTES,
            NodeKind::Remove(_) => &core_tags::REMOVE_ATTRIBUTES,
            NodeKind::Url(_) => &core_tags::URL_ATTRIBUTES,
            NodeKind::Import(_) => &core_tags::IMPORT_ATTRIBUTES,
            NodeKind::Redirect(_) => &core_tags::REDIRECT_ATTRIBUTES,
            NodeKind::CoreParam(_) => &core_tags::PARAM_ATTRIBUTES,
            NodeKind::If(_) => &control_flow::IF_ATTRIBUTES,
            NodeKind::When(_) => &control_flow::WHEN_ATTRIBUTES,
            NodeKind::Catch(_) => &control_flow::CATCH_ATTRIBUTES,
            NodeKind::ForEach(_) => &control_flow::FOR_EACH_ATTRIBUTES,
            NodeKind::Text(_)
            | NodeKind::El(_)
            | NodeKind::Scripting(_)
            | NodeKind::JspText
            | NodeKind::Body
            | NodeKind::Choose
            | NodeKind::Otherwise => return None,
        };

        if name.prefix().is_some() {
            return None;
        }

        table.get(name.local()).copied()
    }

    /// Text of a `<jsp:attribute>` holding nothing but text, trimmed unless asked otherwise
    fn static_fragment_text(&self, fragment: NodeId) -> Option<String> {
        let text = self.tree.static_text(fragment)?;
        match self.tree.kind(fragment) {
            NodeKind::Attribute(attr) if !attr.trim => Some(text),
            _ => Some(text.trim().to_owned()),
        }
    }

    /// Attaches a child, enforcing what the parent accepts
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> CompileResult<()> {
        let result = self.check_placement(parent, child).and_then(|_| {
            let parent_name = || self.tree.node(parent).name.to_string();
            match self.tree.kind(parent) {
                NodeKind::Choose => control_flow::check_choose_child(&self.tree, parent, child),
                NodeKind::Url(_) | NodeKind::Import(_) | NodeKind::Redirect(_) => {
                    core_tags::check_url_child(&self.tree, child, parent_name())
                }
                NodeKind::Include(_) => jsp::check_include_child(&self.tree, child),
                NodeKind::JspText => Err(CompileErrorKind::ChildNotAllowed {
                    parent: parent_name(),
                }),
                NodeKind::Custom(tag) if tag.info.body_content == BodyContent::Empty => {
                    custom::check_empty_body_child(&self.tree, child)
                }
                kind if kind.is_container() => Ok(()),
                _ => match self.tree.kind(child) {
                    NodeKind::Attribute(_) => Ok(()),
                    _ => Err(CompileErrorKind::ChildNotAllowed {
                        parent: parent_name(),
                    }),
                },
            }
        });

        let result = match result {
            Ok(()) if self.is_plain_container(parent) => self.prepare_container(parent, child),
            result => result,
        };
        result.map_err(|kind| self.tree.error(child, kind))?;

        self.tree.attach(parent, child);
        Ok(())
    }

    /// Tags which may only appear under a specific parent
    fn check_placement(&self, parent: NodeId, child: NodeId) -> Result<(), CompileErrorKind> {
        let parent_kind = self.tree.kind(parent);
        let expected = match self.tree.kind(child) {
            NodeKind::When(_) | NodeKind::Otherwise if !matches!(parent_kind, NodeKind::Choose) => {
                "<c:choose>"
            }
            NodeKind::CoreParam(_)
                if !matches!(
                    parent_kind,
                    NodeKind::Url(_) | NodeKind::Import(_) | NodeKind::Redirect(_)
                ) =>
            {
                "<c:url>, <c:import> or <c:redirect>"
            }
            NodeKind::JspParam(_) if !matches!(parent_kind, NodeKind::Include(_)) => "<jsp:include>",
            _ => return Ok(()),
        };

        Err(CompileErrorKind::MisplacedTag {
            expected: expected.to_owned(),
        })
    }

    /// Containers which take any body content
    fn is_plain_container(&self, id: NodeId) -> bool {
        match self.tree.kind(id) {
            NodeKind::Choose
            | NodeKind::Url(_)
            | NodeKind::Import(_)
            | NodeKind::Redirect(_)
            | NodeKind::Include(_)
            | NodeKind::JspText => false,
            NodeKind::Custom(tag) => tag.info.body_content != BodyContent::Empty,
            kind => kind.is_container(),
        }
    }

    /// Once a `<jsp:attribute>` is present the body has to be in a single `<jsp:body>`
    fn prepare_container(&mut self, parent: NodeId, child: NodeId) -> Result<(), CompileErrorKind> {
        match self.tree.kind(child) {
            NodeKind::Attribute(_) => {
                let children = self.tree.children(parent).to_vec();
                for existing in children {
                    match self.tree.kind(existing) {
                        NodeKind::Attribute(_) | NodeKind::Body => {}
                        NodeKind::Text(run) if is_whitespace(&run.text) => self.tree.detach(existing),
                        _ => return Err(CompileErrorKind::BodyAfterAttribute),
                    }
                }
                Ok(())
            }
            NodeKind::Body => {
                let has_body = self
                    .tree
                    .children(parent)
                    .iter()
                    .any(|&existing| matches!(self.tree.kind(existing), NodeKind::Body));
                if has_body {
                    Err(CompileErrorKind::DuplicateBody)
                } else {
                    Ok(())
                }
            }
            _ if self.has_attribute_children(parent) => Err(CompileErrorKind::BodyAfterAttribute),
            _ => Ok(()),
        }
    }

    fn has_attribute_children(&self, id: NodeId) -> bool {
        self.tree
            .children(id)
            .iter()
            .any(|&child| matches!(self.tree.kind(child), NodeKind::Attribute(_)))
    }

    /// Adds template text, splitting out `${...}` expressions
    pub fn add_text(&mut self, parent: NodeId, text: &str, line: u32) -> CompileResult<()> {
        if text.is_empty() {
            return Ok(());
        }

        if let NodeKind::Scripting(scripting) = self.tree.kind_mut(parent) {
            scripting.code.push_str(text);
            return Ok(());
        }

        let whitespace = is_whitespace(text);
        let accepts_text =
            self.is_plain_container(parent) || matches!(self.tree.kind(parent), NodeKind::JspText);
        if !accepts_text || self.has_attribute_children(parent) {
            if whitespace {
                return Ok(());
            }

            let kind = match self.tree.kind(parent) {
                NodeKind::Custom(tag) if tag.info.body_content == BodyContent::Empty => {
                    CompileErrorKind::BodyMustBeEmpty
                }
                _ if accepts_text => CompileErrorKind::BodyAfterAttribute,
                _ => CompileErrorKind::TextNotAllowed {
                    text: text.trim().to_owned(),
                },
            };
            return Err(self.tree.error(parent, kind));
        }

        let options = &self.config.options;
        if whitespace && options.is_xml && !matches!(self.tree.kind(parent), NodeKind::JspText) {
            return Ok(());
        }

        let segments = if options.el_ignored || self.in_tag_dependent_body(parent) {
            vec![TextSegment::Text(text)]
        } else {
            split_el(text)
        };

        let mut line = line;
        for segment in segments {
            // Adjacent runs are one run, however the parser delivered them
            if let TextSegment::Text(raw) = segment {
                if let Some(&last) = self.tree.children(parent).last() {
                    if let NodeKind::Text(run) = self.tree.kind_mut(last) {
                        run.text.push_str(raw);
                        line += raw.matches('\n').count() as u32;
                        continue;
                    }
                }
            }

            let (name, kind, raw) = match segment {
                TextSegment::Text(raw) => (
                    "#text",
                    NodeKind::Text(TextRun {
                        text: raw.to_owned(),
                    }),
                    raw,
                ),
                TextSegment::El(raw) => (
                    "#el",
                    NodeKind::El(ElRun {
                        expr: raw.to_owned(),
                    }),
                    raw,
                ),
            };

            let id = self.tree.create(QName::new(None, name), kind, line);
            self.tree.attach(parent, id);
            line += raw.matches('\n').count() as u32;
        }

        Ok(())
    }

    fn in_tag_dependent_body(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.tree.ancestors(id))
            .any(|node| match self.tree.kind(node) {
                NodeKind::Custom(tag) => tag.info.body_content == BodyContent::TagDependent,
                _ => false,
            })
    }

    /// Runs once all attributes are known, before any child is added
    pub fn end_attributes(&mut self, id: NodeId) -> CompileResult<()> {
        match self.tree.kind(id) {
            NodeKind::Attribute(attr) if attr.name.is_none() => Err(self.tree.error(
                id,
                CompileErrorKind::MissingAttribute {
                    attribute: "name".to_owned(),
                },
            )),
            _ => Ok(()),
        }
    }

    /// Cross-field checks once the element and all its children are complete
    pub fn end_element(&mut self, id: NodeId) -> CompileResult<()> {
        if matches!(self.tree.kind(id), NodeKind::IncludeDirective(_)) {
            return self.include_file(id);
        }

        let tree = &self.tree;
        let options = &self.config.options;
        let result = match tree.kind(id) {
            NodeKind::Scripting(_) => self.check_scripting(id),
            NodeKind::JspParam(param) => jsp::end_param(param),
            NodeKind::Include(include) => jsp::end_include(include),
            NodeKind::Out(out) => core_tags::end_out(out, has_body_content(tree, id)),
            NodeKind::Set(set) => core_tags::end_set(set, has_body_content(tree, id)),
            NodeKind::Remove(remove) => core_tags::end_remove(remove),
            NodeKind::Url(url) => core_tags::end_url(url),
            NodeKind::Import(import) => core_tags::end_import(import),
            NodeKind::Redirect(redirect) => core_tags::end_redirect(redirect),
            NodeKind::CoreParam(param) => core_tags::end_param(param, has_body_content(tree, id)),
            NodeKind::If(node) => control_flow::end_if(node),
            NodeKind::When(test) => control_flow::end_test(test),
            NodeKind::Choose => control_flow::end_choose(tree, id),
            NodeKind::ForEach(node) => control_flow::end_for_each(node, options),
            NodeKind::Custom(tag) => custom::end_custom(tag),
            _ => Ok(()),
        };

        result.map_err(|kind| self.tree.error(id, kind))?;
        trace!("Completed <{}>", self.tree.node(id).name);
        Ok(())
    }

    /// Scripting is forbidden by the page configuration, by a tag whose body is not JSP,
    /// or inside the fragment value of a custom tag attribute
    fn check_scripting(&self, id: NodeId) -> Result<(), CompileErrorKind> {
        if self.config.options.scripting_invalid {
            return Err(CompileErrorKind::ScriptingForbidden);
        }

        for ancestor in self.tree.ancestors(id) {
            let forbidden = match self.tree.kind(ancestor) {
                NodeKind::Custom(tag) => tag.info.body_content != BodyContent::Jsp,
                NodeKind::Attribute(attr) => {
                    let owner = self.tree.parent(ancestor).map(|owner| self.tree.kind(owner));
                    match (owner, attr.name.as_deref()) {
                        (Some(NodeKind::Custom(tag)), Some(name)) => tag
                            .info
                            .find_attribute(name)
                            .is_some_and(|info| info.fragment),
                        _ => false,
                    }
                }
                _ => false,
            };

            if forbidden {
                return Err(CompileErrorKind::ScriptingForbidden);
            }
        }

        Ok(())
    }

    /// Resolves `<jsp:directive.include>` and records the file as a dependency
    fn include_file(&mut self, id: NodeId) -> CompileResult<()> {
        let NodeKind::IncludeDirective(directive) = self.tree.kind(id) else {
            return Ok(());
        };

        let Some(file) = directive.file.clone() else {
            return Err(self.tree.error(
                id,
                CompileErrorKind::MissingAttribute {
                    attribute: "file".to_owned(),
                },
            ));
        };

        match self.config.includes.resolve(self.tree.filename(), &file) {
            Ok(dependency) => {
                debug!("Included {} into {}", dependency.resource, self.tree.filename());
                self.tree.dependencies_mut().add(dependency);
                Ok(())
            }
            Err(err) => Err(self.tree.error(
                id,
                CompileErrorKind::IncludeNotFound {
                    path: file,
                    reason: err.to_string(),
                },
            )),
        }
    }

    /// Tells the parent its child is complete.
    /// A finished `<jsp:attribute>` becomes an attribute of its parent.
    pub fn add_child_end(&mut self, parent: NodeId, child: NodeId) -> CompileResult<()> {
        let NodeKind::Attribute(attr) = self.tree.kind(child) else {
            return Ok(());
        };

        let Some(name) = attr.name.as_deref() else {
            return Ok(());
        };

        let name = QName::parse(name);
        self.add_attribute(parent, name, AttributeValue::Fragment(child))
    }
}

/// Whether a node has body content besides `<jsp:attribute>`s and whitespace
pub(crate) fn has_body_content(tree: &TemplateTree, id: NodeId) -> bool {
    tree.children(id).iter().any(|&child| match tree.kind(child) {
        NodeKind::Attribute(_) => false,
        NodeKind::Text(run) => !is_whitespace(&run.text),
        _ => true,
    })
}

pub(crate) fn unknown(name: &str) -> CompileErrorKind {
    CompileErrorKind::UnknownAttribute {
        attribute: name.to_owned(),
    }
}

pub(crate) fn missing(name: &str) -> CompileErrorKind {
    CompileErrorKind::MissingAttribute {
        attribute: name.to_owned(),
    }
}

pub(crate) fn conflicting(first: &str, second: &str) -> CompileErrorKind {
    CompileErrorKind::ConflictingAttributes {
        first: first.to_owned(),
        second: second.to_owned(),
    }
}

pub(crate) fn requires(attribute: &str, required: &str) -> CompileErrorKind {
    CompileErrorKind::AttributeRequires {
        attribute: attribute.to_owned(),
        required: required.to_owned(),
    }
}

pub(crate) fn set_once<T>(slot: &mut Option<T>, name: &str, value: T) -> Result<(), CompileErrorKind> {
    if slot.is_some() {
        return Err(CompileErrorKind::DuplicateAttribute {
            attribute: name.to_owned(),
        });
    }

    *slot = Some(value);
    Ok(())
}

pub(crate) fn static_value(name: &str, value: AttributeValue) -> Result<String, CompileErrorKind> {
    match value {
        AttributeValue::Static(value) => Ok(value),
        AttributeValue::Fragment(_) => Err(CompileErrorKind::FragmentNotAllowed {
            attribute: name.to_owned(),
        }),
    }
}

pub(crate) fn set_static(slot: &mut Option<String>, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    set_once(slot, name, static_value(name, value)?)
}

pub(crate) fn set_scope(slot: &mut Option<Scope>, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    let value = static_value(name, value)?;
    set_once(slot, name, Scope::resolve(Some(&value))?)
}
