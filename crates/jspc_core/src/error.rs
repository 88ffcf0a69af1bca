use thiserror::Error;

use crate::SourceLocation;

pub type CompileResult<T> = Result<T, CompileError>;

/// A failure that aborts the compilation of a whole template.
///
/// Carries the tag name of the offending node and the place it was found,
/// so that the message can be shown as `file:line: <tag>: message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: <{tag_name}>: {kind}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub tag_name: String,
    pub location: SourceLocation,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, tag_name: impl Into<String>, location: SourceLocation) -> Self {
        CompileError {
            kind,
            tag_name: tag_name.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    // Structural errors
    /// Attribute name is not in the whitelist of the tag
    #[error("attribute '{attribute}' is not allowed here")]
    UnknownAttribute { attribute: String },

    /// Same attribute given twice
    #[error("'{attribute}' is a duplicate attribute name. Attributes must occur only once in a tag")]
    DuplicateAttribute { attribute: String },

    /// `<jsp:attribute>` given for an attribute which must be known at compile time
    #[error("attribute '{attribute}' must be a static value and cannot be given as a <jsp:attribute>")]
    FragmentNotAllowed { attribute: String },

    #[error("required attribute '{attribute}' is missing")]
    MissingAttribute { attribute: String },

    /// Both alternatives of a mutually exclusive pair are present
    #[error("'{first}' and '{second}' cannot be used together")]
    ConflictingAttributes { first: String, second: String },

    /// An attribute which only makes sense together with another one
    #[error("'{attribute}' requires '{required}'")]
    AttributeRequires { attribute: String, required: String },

    #[error("'{value}' is an unknown value for {attribute}. 'true' or 'false' are the expected values")]
    InvalidBoolean { attribute: String, value: String },

    #[error("'{value}' is not a valid number for {attribute}")]
    InvalidNumber { attribute: String, value: String },

    /// `<%=` appearing in the middle of an attribute value
    #[error("interpolated runtime values are forbidden at '{value}'")]
    InterpolatedRuntimeValue { value: String },

    /// EL or a runtime expression on a custom tag attribute declared `rtexprvalue=false`
    #[error("attribute '{attribute}' does not accept runtime values, found '{value}'")]
    RuntimeValueNotAllowed { attribute: String, value: String },

    #[error("this tag is not allowed inside <{parent}>")]
    ChildNotAllowed { parent: String },

    #[error("text is not allowed here, found '{text}'")]
    TextNotAllowed { text: String },

    #[error("tags using jsp:attribute must put body content in a jsp:body tag")]
    BodyAfterAttribute,

    #[error("tags may only have a single jsp:body tag")]
    DuplicateBody,

    /// Tag declared with `body-content` of `empty` received a body
    #[error("the body of this tag must be empty")]
    BodyMustBeEmpty,

    #[error("this tag must be a direct child of {expected}")]
    MisplacedTag { expected: String },

    // Control flow
    #[error("<c:otherwise> must follow at least one <c:when>")]
    OtherwiseBeforeWhen,

    #[error("<c:when> cannot follow <c:otherwise>")]
    WhenAfterOtherwise,

    #[error("only one <c:otherwise> is allowed")]
    DuplicateOtherwise,

    #[error("at least one <c:when> is required")]
    ChooseWithoutWhen,

    /// Policy error, names every way scripting can get disabled
    #[error(
        "scripting elements are forbidden here. Scripting has been disabled either \
         (1) by the page's scripting-invalid configuration, \
         (2) by the enclosing tag's body-content, \
         or (3) inside a <jsp:attribute> or <jsp:body> fragment value"
    )]
    ScriptingForbidden,

    /// Scope error
    #[error("'{value}' is an unknown scope. Expected one of 'page', 'request', 'session' or 'application'")]
    InvalidScope { value: String },

    // Resolution
    #[error("<{name}> is an unknown tag")]
    UnknownTag { name: String },

    #[error("cannot include '{path}': {reason}")]
    IncludeNotFound { path: String, reason: String },

    // Document shape
    #[error("close tag </{found}> does not match the current tag <{expected}>")]
    MismatchedEndTag { expected: String, found: String },

    #[error("the document ended before this tag was closed")]
    UnclosedTag,

    #[error("<jsp:root> is only allowed as the document element")]
    MisplacedRoot,

    // Representation errors
    /// Tag can only be printed by its parent
    #[error("this tag has no canonical XML form on its own")]
    NotRepresentable,

    /// Tag can only be generated by its parent
    #[error("this tag generates code only through its parent tag")]
    NotGenerable,

    #[error("failed to write canonical XML: {message}")]
    XmlWrite { message: String },
}
