use std::borrow::Cow;

use jspc_core::{
    runtime_expression, AttributeValue, CompileErrorKind, CompileResult, NodeId, NodeKind, Scope,
    TemplateTree, TestSource, CORE_PREFIX, JSP_NS, JSP_PREFIX, JSTL_CORE_NS,
};
use log::debug;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Version written when the page did not declare one
const DEFAULT_VERSION: &str = "2.1";

/// Prints the canonical XML form of a tree.
///
/// Reading the output back gives a tree which prints the same again.
/// `<c:param>` has no form of its own, a tree holding one cannot be printed.
pub fn print_xml(tree: &TemplateTree) -> CompileResult<String> {
    let mut printer = XmlPrinter {
        tree,
        writer: Writer::new(Vec::new()),
    };
    printer.print_node(tree.root())?;

    let xml = String::from_utf8(printer.writer.into_inner()).map_err(|err| {
        tree.error(
            tree.root(),
            CompileErrorKind::XmlWrite {
                message: err.to_string(),
            },
        )
    })?;

    debug!("Printed {} as {} bytes of XML", tree.filename(), xml.len());
    Ok(xml)
}

enum XmlValue<'t> {
    Text(Cow<'t, str>),
    /// Printed as the `<jsp:attribute>` child it refers to
    Fragment(NodeId),
}

/// Attributes of one element, in canonical order
#[derive(Default)]
struct AttributeList<'t>(Vec<(Cow<'t, str>, XmlValue<'t>)>);

impl<'t> AttributeList<'t> {
    fn value(&mut self, name: &'static str, value: Option<&'t AttributeValue>) {
        if let Some(value) = value {
            self.push(Cow::Borrowed(name), value);
        }
    }

    fn push(&mut self, name: Cow<'t, str>, value: &'t AttributeValue) {
        let value = match value {
            AttributeValue::Static(raw) => XmlValue::Text(xml_syntax(raw)),
            AttributeValue::Fragment(fragment) => XmlValue::Fragment(*fragment),
        };
        self.0.push((name, value));
    }

    fn text(&mut self, name: &'static str, value: Option<&'t str>) {
        if let Some(value) = value {
            self.0.push((Cow::Borrowed(name), XmlValue::Text(Cow::Borrowed(value))));
        }
    }

    fn scope(&mut self, scope: Option<Scope>) {
        self.text("scope", scope.map(<&'static str>::from));
    }

    fn test(&mut self, test: &'t TestSource) {
        if let Some(expr) = &test.expr {
            self.0.push((Cow::Borrowed("test"), XmlValue::Text(xml_syntax(expr))));
        }
        if let Some(fragment) = test.fragment {
            self.0.push((Cow::Borrowed("test"), XmlValue::Fragment(fragment)));
        }
    }

    fn fragments(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().filter_map(|(_, value)| match value {
            XmlValue::Fragment(fragment) => Some(*fragment),
            XmlValue::Text(_) => None,
        })
    }
}

struct XmlPrinter<'t> {
    tree: &'t TemplateTree,
    writer: Writer<Vec<u8>>,
}

impl<'t> XmlPrinter<'t> {
    fn print_node(&mut self, id: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Text(run) => self.write_text(id, &run.text),
            NodeKind::El(run) => self.write_text(id, &run.expr),
            NodeKind::CoreParam(_) => Err(tree.error(id, CompileErrorKind::NotRepresentable)),
            _ => self.print_element(id),
        }
    }

    fn print_element(&mut self, id: NodeId) -> CompileResult<()> {
        let tree = self.tree;
        let name = tree.node(id).name.to_string();
        let attributes = attributes(tree, id);

        let mut start = BytesStart::new(name.as_str());
        if id == tree.root() {
            start.push_attribute((format!("xmlns:{JSP_PREFIX}").as_str(), JSP_NS));
            start.push_attribute((format!("xmlns:{CORE_PREFIX}").as_str(), JSTL_CORE_NS));
            for (prefix, uri) in tree.namespaces() {
                if prefix != JSP_PREFIX && prefix != CORE_PREFIX {
                    start.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
                }
            }
        }

        for (key, value) in attributes.0.iter() {
            if let XmlValue::Text(text) = value {
                start.push_attribute((key.as_ref(), text.as_ref()));
            }
        }

        // Attribute children folded into a static value are already printed above
        let fragments: Vec<NodeId> = attributes.fragments().collect();
        let children: Vec<NodeId> = tree
            .children(id)
            .iter()
            .copied()
            .filter(|child| match tree.kind(*child) {
                NodeKind::Attribute(_) => fragments.contains(child),
                _ => true,
            })
            .collect();

        let code = match tree.kind(id) {
            NodeKind::Scripting(scripting) if !scripting.code.is_empty() => Some(scripting.code.as_str()),
            _ => None,
        };

        if children.is_empty() && code.is_none() {
            return self.write_event(id, Event::Empty(start));
        }

        self.write_event(id, Event::Start(start))?;
        if let Some(code) = code {
            self.write_text(id, code)?;
        }
        for child in children {
            self.print_node(child)?;
        }
        self.write_event(id, Event::End(BytesEnd::new(name.as_str())))
    }

    fn write_text(&mut self, id: NodeId, text: &str) -> CompileResult<()> {
        self.write_event(id, Event::Text(BytesText::from_escaped(partial_escape(text))))
    }

    fn write_event(&mut self, id: NodeId, event: Event) -> CompileResult<()> {
        let tree = self.tree;
        self.writer.write_event(event).map_err(|err| {
            tree.error(
                id,
                CompileErrorKind::XmlWrite {
                    message: err.to_string(),
                },
            )
        })
    }
}

/// Attributes of a node in the order they are printed
fn attributes(tree: &TemplateTree, id: NodeId) -> AttributeList<'_> {
    let mut list = AttributeList::default();

    match tree.kind(id) {
        NodeKind::Page(page) => {
            list.text("version", Some(page.version.as_deref().unwrap_or(DEFAULT_VERSION)))
        }
        NodeKind::Element(element) => {
            for (name, value) in element.attributes.iter() {
                list.push(Cow::Owned(name.to_string()), value);
            }
        }
        NodeKind::Attribute(attr) => {
            list.text("name", attr.name.as_deref());
            if !attr.trim {
                list.text("trim", Some("false"));
            }
        }
        NodeKind::JspParam(param) => {
            list.text("name", param.name.as_deref());
            list.value("value", param.value.as_ref());
        }
        NodeKind::Include(include) => {
            list.value("page", include.page.as_ref());
            list.text("flush", include.flush.map(|flush| if flush { "true" } else { "false" }));
        }
        NodeKind::IncludeDirective(directive) => list.text("file", directive.file.as_deref()),
        NodeKind::Out(out) => {
            list.value("value", out.value.as_ref());
            list.value("default", out.default.as_ref());
            list.value("escapeXml", out.escape_xml.as_ref());
        }
        NodeKind::Set(set) => {
            list.text("var", set.var.as_deref());
            list.value("value", set.value.as_ref());
            list.value("target", set.target.as_ref());
            list.value("property", set.property.as_ref());
            list.scope(set.scope);
        }
        NodeKind::Remove(remove) => {
            list.text("var", remove.var.as_deref());
            list.scope(remove.scope);
        }
        NodeKind::If(node) => {
            list.test(&node.test);
            list.text("var", node.var.as_deref());
            list.scope(node.scope);
        }
        NodeKind::When(test) => list.test(test),
        NodeKind::Catch(node) => list.text("var", node.var.as_deref()),
        NodeKind::ForEach(node) => {
            list.text("var", node.var.as_deref());
            list.text("varStatus", node.var_status.as_deref());
            list.value("items", node.items.as_ref());
            list.value("begin", node.begin.as_ref());
            list.value("end", node.end.as_ref());
            list.value("step", node.step.as_ref());
        }
        NodeKind::Url(url) => {
            list.value("value", url.value.as_ref());
            list.value("context", url.context.as_ref());
            list.text("var", url.var.as_deref());
            list.scope(url.scope);
        }
        NodeKind::Import(import) => {
            list.value("url", import.url.as_ref());
            list.value("context", import.context.as_ref());
            list.text("var", import.var.as_deref());
            list.scope(import.scope);
            list.value("charEncoding", import.char_encoding.as_ref());
        }
        NodeKind::Redirect(redirect) => {
            list.value("url", redirect.url.as_ref());
            list.value("context", redirect.context.as_ref());
        }
        NodeKind::CoreParam(param) => {
            list.value("name", param.name.as_ref());
            list.value("value", param.value.as_ref());
        }
        NodeKind::Custom(tag) => {
            for (name, value) in tag.attributes.iter() {
                list.push(Cow::Borrowed(name.as_str()), value);
            }
        }
        NodeKind::Text(_)
        | NodeKind::El(_)
        | NodeKind::Scripting(_)
        | NodeKind::JspText
        | NodeKind::Body
        | NodeKind::Choose
        | NodeKind::Otherwise => {}
    }

    list
}

/// Runtime expressions use the `%= code %` form inside XML attributes
fn xml_syntax(raw: &str) -> Cow<'_, str> {
    match runtime_expression(raw) {
        Some(code) if raw.starts_with("<%=") => Cow::Owned(format!("%={code}%")),
        _ => Cow::Borrowed(raw),
    }
}
