use std::sync::Arc;

use phf::phf_map;
use smallvec::SmallVec;
use strum_macros::{AsRefStr, IntoStaticStr};

use crate::{AttributeValue, NodeId, QName, Scope, TagInfo, CORE_PREFIX, JSP_PREFIX};

/// Every kind of node a template tree can hold, with the fields that kind needs
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Implicit root of every tree
    Page(PageRoot),
    Text(TextRun),
    /// `${...}` split out of template text
    El(ElRun),
    /// `<jsp:scriptlet>`, `<jsp:expression>` and `<jsp:declaration>`
    Scripting(Scripting),
    /// Markup which is neither a standard action nor a known custom tag
    Element(MarkupElement),
    /// `<jsp:text>`
    JspText,
    /// `<jsp:attribute>`
    Attribute(JspAttribute),
    /// `<jsp:body>`
    Body,
    /// `<jsp:param>`
    JspParam(JspParam),
    /// `<jsp:include>`
    Include(JspInclude),
    /// `<jsp:directive.include>`
    IncludeDirective(IncludeDirective),
    Out(CoreOut),
    Set(CoreSet),
    Remove(CoreRemove),
    If(CoreIf),
    Choose,
    When(TestSource),
    Otherwise,
    Catch(CoreCatch),
    ForEach(CoreForEach),
    Url(CoreUrl),
    Import(CoreImport),
    Redirect(CoreRedirect),
    /// `<c:param>`
    CoreParam(CoreParam),
    Custom(CustomTag),
}

impl NodeKind {
    /// Kinds which keep an ordered list of body children
    pub fn is_container(&self) -> bool {
        !matches!(
            self,
            NodeKind::Text(_)
                | NodeKind::El(_)
                | NodeKind::Scripting(_)
                | NodeKind::JspParam(_)
                | NodeKind::IncludeDirective(_)
                | NodeKind::Remove(_)
        )
    }

    /// Plain literal text, including whitespace
    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(run) => Some(&run.text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRoot {
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElRun {
    /// Whole expression including `${` and `}`
    pub expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
pub enum ScriptingKind {
    #[strum(serialize = "scriptlet")]
    Scriptlet,
    #[strum(serialize = "expression")]
    Expression,
    #[strum(serialize = "declaration")]
    Declaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scripting {
    pub kind: ScriptingKind,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupElement {
    pub attributes: SmallVec<[(QName, AttributeValue); 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JspAttribute {
    pub name: Option<String>,
    /// Whether the static value of the fragment is trimmed
    pub trim: bool,
}

impl Default for JspAttribute {
    fn default() -> Self {
        JspAttribute {
            name: None,
            trim: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JspParam {
    pub name: Option<String>,
    pub value: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JspInclude {
    pub page: Option<AttributeValue>,
    pub flush: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeDirective {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreOut {
    pub value: Option<AttributeValue>,
    pub default: Option<AttributeValue>,
    pub escape_xml: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreSet {
    pub var: Option<String>,
    pub value: Option<AttributeValue>,
    pub scope: Option<Scope>,
    pub target: Option<AttributeValue>,
    pub property: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreRemove {
    pub var: Option<String>,
    pub scope: Option<Scope>,
}

/// Test of a conditional. Exactly one of the two is set once the tag is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSource {
    /// `test="..."`
    pub expr: Option<String>,
    /// `<jsp:attribute name="test">`
    pub fragment: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreIf {
    pub test: TestSource,
    pub var: Option<String>,
    pub scope: Option<Scope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreCatch {
    pub var: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreForEach {
    pub var: Option<String>,
    pub var_status: Option<String>,
    pub items: Option<AttributeValue>,
    pub begin: Option<AttributeValue>,
    pub end: Option<AttributeValue>,
    pub step: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreUrl {
    pub value: Option<AttributeValue>,
    pub context: Option<AttributeValue>,
    pub var: Option<String>,
    pub scope: Option<Scope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreImport {
    pub url: Option<AttributeValue>,
    pub context: Option<AttributeValue>,
    pub char_encoding: Option<AttributeValue>,
    pub var: Option<String>,
    pub scope: Option<Scope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreRedirect {
    pub url: Option<AttributeValue>,
    pub context: Option<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreParam {
    pub name: Option<AttributeValue>,
    pub value: Option<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomTag {
    pub info: Arc<TagInfo>,
    /// In the order they were given
    pub attributes: SmallVec<[(String, AttributeValue); 4]>,
}

impl CustomTag {
    pub fn new(info: Arc<TagInfo>) -> Self {
        CustomTag {
            info,
            attributes: SmallVec::new(),
        }
    }
}

/// Tags with a fixed meaning, independent of any tag library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardTag {
    Root,
    Scriptlet,
    Expression,
    Declaration,
    Text,
    Attribute,
    Body,
    Param,
    Include,
    IncludeDirective,
    Out,
    Set,
    Remove,
    If,
    Choose,
    When,
    Otherwise,
    Catch,
    ForEach,
    Url,
    Import,
    Redirect,
    CoreParam,
}

static JSP_ACTIONS: phf::Map<&'static str, StandardTag> = phf_map! {
    "root" => StandardTag::Root,
    "scriptlet" => StandardTag::Scriptlet,
    "expression" => StandardTag::Expression,
    "declaration" => StandardTag::Declaration,
    "text" => StandardTag::Text,
    "attribute" => StandardTag::Attribute,
    "body" => StandardTag::Body,
    "param" => StandardTag::Param,
    "include" => StandardTag::Include,
    "directive.include" => StandardTag::IncludeDirective,
};

static CORE_TAGS: phf::Map<&'static str, StandardTag> = phf_map! {
    "out" => StandardTag::Out,
    "set" => StandardTag::Set,
    "remove" => StandardTag::Remove,
    "if" => StandardTag::If,
    "choose" => StandardTag::Choose,
    "when" => StandardTag::When,
    "otherwise" => StandardTag::Otherwise,
    "catch" => StandardTag::Catch,
    "forEach" => StandardTag::ForEach,
    "url" => StandardTag::Url,
    "import" => StandardTag::Import,
    "redirect" => StandardTag::Redirect,
    "param" => StandardTag::CoreParam,
};

impl StandardTag {
    pub fn lookup(name: &QName) -> Option<StandardTag> {
        match name.prefix()? {
            JSP_PREFIX => JSP_ACTIONS.get(name.local()).copied(),
            CORE_PREFIX => CORE_TAGS.get(name.local()).copied(),
            _ => None,
        }
    }

    /// Whether the prefix is reserved for standard tags
    pub fn is_reserved_prefix(prefix: &str) -> bool {
        prefix == JSP_PREFIX || prefix == CORE_PREFIX
    }

    /// Fresh, attribute-less node kind
    pub fn new_kind(self) -> NodeKind {
        let scripting = |kind| {
            NodeKind::Scripting(Scripting {
                kind,
                code: String::new(),
            })
        };

        match self {
            StandardTag::Root => NodeKind::Page(PageRoot::default()),
            StandardTag::Scriptlet => scripting(ScriptingKind::Scriptlet),
            StandardTag::Expression => scripting(ScriptingKind::Expression),
            StandardTag::Declaration => scripting(ScriptingKind::Declaration),
            StandardTag::Text => NodeKind::JspText,
            StandardTag::Attribute => NodeKind::Attribute(JspAttribute::default()),
            StandardTag::Body => NodeKind::Body,
            StandardTag::Param => NodeKind::JspParam(JspParam::default()),
            StandardTag::Include => NodeKind::Include(JspInclude::default()),
            StandardTag::IncludeDirective => NodeKind::IncludeDirective(IncludeDirective::default()),
            StandardTag::Out => NodeKind::Out(CoreOut::default()),
            StandardTag::Set => NodeKind::Set(CoreSet::default()),
            StandardTag::Remove => NodeKind::Remove(CoreRemove::default()),
            StandardTag::If => NodeKind::If(CoreIf::default()),
            StandardTag::Choose => NodeKind::Choose,
            StandardTag::When => NodeKind::When(TestSource::default()),
            StandardTag::Otherwise => NodeKind::Otherwise,
            StandardTag::Catch => NodeKind::Catch(CoreCatch::default()),
            StandardTag::ForEach => NodeKind::ForEach(CoreForEach::default()),
            StandardTag::Url => NodeKind::Url(CoreUrl::default()),
            StandardTag::Import => NodeKind::Import(CoreImport::default()),
            StandardTag::Redirect => NodeKind::Redirect(CoreRedirect::default()),
            StandardTag::CoreParam => NodeKind::CoreParam(CoreParam::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_looks_up_standard_tags() {
        assert_eq!(StandardTag::lookup(&QName::parse("c:forEach")), Some(StandardTag::ForEach));
        assert_eq!(StandardTag::lookup(&QName::parse("c:param")), Some(StandardTag::CoreParam));
        assert_eq!(StandardTag::lookup(&QName::parse("jsp:param")), Some(StandardTag::Param));
        assert_eq!(
            StandardTag::lookup(&QName::parse("jsp:directive.include")),
            Some(StandardTag::IncludeDirective)
        );
        assert_eq!(StandardTag::lookup(&QName::parse("c:foreach")), None);
        assert_eq!(StandardTag::lookup(&QName::parse("div")), None);
        assert_eq!(StandardTag::lookup(&QName::parse("x:if")), None);
    }

    #[test]
    fn it_tells_containers_apart() {
        assert!(StandardTag::If.new_kind().is_container());
        assert!(StandardTag::CoreParam.new_kind().is_container());
        assert!(!StandardTag::Param.new_kind().is_container());
        assert!(!StandardTag::Scriptlet.new_kind().is_container());
        assert!(!StandardTag::Remove.new_kind().is_container());
    }
}
