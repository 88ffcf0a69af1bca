use std::sync::Arc;

use fxhash::FxHashMap;
use strum_macros::{AsRefStr, EnumString, IntoStaticStr};

use crate::{Dependency, QName, ValueType};

/// What a custom tag accepts as its body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString, IntoStaticStr)]
pub enum BodyContent {
    #[strum(serialize = "empty")]
    Empty,
    #[default]
    #[strum(serialize = "JSP", serialize = "jsp")]
    Jsp,
    #[strum(serialize = "scriptless")]
    Scriptless,
    #[strum(serialize = "tagdependent")]
    TagDependent,
}

/// Interfaces the handler class implements, decides the shape of the generated protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString, IntoStaticStr)]
pub enum TagHandlerKind {
    /// `doStartTag`/`doEndTag` only
    #[default]
    Tag,
    /// Adds `doAfterBody`
    Iteration,
    /// Adds a buffered body and `doInitBody`
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAttributeInfo {
    pub name: String,
    pub required: bool,
    /// Whether EL and runtime expressions are accepted
    pub rtexprvalue: bool,
    /// Value is a fragment, its body must be scriptless
    pub fragment: bool,
    pub value_type: ValueType,
}

impl TagAttributeInfo {
    pub fn new(name: &str) -> Self {
        TagAttributeInfo {
            name: name.to_owned(),
            required: false,
            rtexprvalue: true,
            fragment: false,
            value_type: ValueType::String,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn static_only(mut self) -> Self {
        self.rtexprvalue = false;
        self
    }

    pub fn fragment(mut self) -> Self {
        self.fragment = true;
        self
    }

    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

/// Metadata of a custom tag, as loaded from its tag library descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub tag_class: String,
    pub body_content: BodyContent,
    pub handler: TagHandlerKind,
    pub attributes: Vec<TagAttributeInfo>,
    /// Descriptor files the tag was read from
    pub dependencies: Vec<Dependency>,
}

impl TagInfo {
    pub fn new(name: &str, tag_class: &str) -> Self {
        TagInfo {
            name: name.to_owned(),
            tag_class: tag_class.to_owned(),
            body_content: BodyContent::default(),
            handler: TagHandlerKind::default(),
            attributes: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn find_attribute(&self, name: &str) -> Option<&TagAttributeInfo> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// Tag-library metadata by prefix
pub trait TagLibraryProvider {
    /// Namespace URI the prefix is bound to, `None` if the prefix is not a tag library
    fn namespace_uri(&self, prefix: &str) -> Option<&str>;

    fn find_tag(&self, name: &QName) -> Option<Arc<TagInfo>>;
}

#[derive(Debug, Clone)]
pub struct TagLibrary {
    pub uri: String,
    tags: FxHashMap<String, Arc<TagInfo>>,
}

impl TagLibrary {
    pub fn new(uri: &str) -> Self {
        TagLibrary {
            uri: uri.to_owned(),
            tags: FxHashMap::default(),
        }
    }

    pub fn add_tag(&mut self, tag: TagInfo) {
        self.tags.insert(tag.name.to_owned(), Arc::new(tag));
    }
}

/// In-memory provider
#[derive(Debug, Clone, Default)]
pub struct TagLibraryRegistry {
    libraries: FxHashMap<String, TagLibrary>,
}

impl TagLibraryRegistry {
    pub fn register(&mut self, prefix: &str, library: TagLibrary) {
        self.libraries.insert(prefix.to_owned(), library);
    }
}

impl TagLibraryProvider for TagLibraryRegistry {
    fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.libraries.get(prefix).map(|lib| lib.uri.as_str())
    }

    fn find_tag(&self, name: &QName) -> Option<Arc<TagInfo>> {
        let library = self.libraries.get(name.prefix()?)?;
        library.tags.get(name.local()).cloned()
    }
}
