use strum_macros::{AsRefStr, EnumString, IntoStaticStr};

use crate::{CompileErrorKind, NodeId};

/// Value of a tag attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Raw string fixed at compile time. May still contain EL or a runtime expression.
    Static(String),
    /// A `<jsp:attribute>` node whose body must be compiled to produce the value
    Fragment(NodeId),
}

impl AttributeValue {
    pub fn as_static(&self) -> Option<&str> {
        match self {
            AttributeValue::Static(value) => Some(value),
            AttributeValue::Fragment(_) => None,
        }
    }
}

/// Which value forms an attribute accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeForm {
    /// Only a compile-time string (names, scopes)
    Static,
    /// Either a static string or a `<jsp:attribute>`
    Any,
}

/// What a static attribute value turns out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSyntax<'v> {
    Literal(&'v str),
    /// `<%= code %>` or `%= code %`, holds the code
    Runtime(&'v str),
    /// Contains `${...}`, holds the whole value
    El(&'v str),
}

impl<'v> ValueSyntax<'v> {
    /// Classifies a static value.
    /// Runtime expressions are only recognized when scripting is allowed
    /// and EL only when it is not ignored.
    pub fn classify(value: &'v str, allow_runtime: bool, allow_el: bool) -> Result<Self, CompileErrorKind> {
        if allow_runtime {
            if let Some(code) = runtime_expression(value) {
                return Ok(ValueSyntax::Runtime(code));
            }

            if value.contains("<%=") {
                return Err(CompileErrorKind::InterpolatedRuntimeValue {
                    value: value.to_owned(),
                });
            }
        }

        if allow_el && has_el(value) {
            return Ok(ValueSyntax::El(value));
        }

        Ok(ValueSyntax::Literal(value))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, ValueSyntax::Literal(_))
    }
}

/// Returns the code of `<%= code %>` (JSP syntax) or `%= code %` (XML syntax)
pub fn runtime_expression(value: &str) -> Option<&str> {
    let inner = value
        .strip_prefix("<%=")
        .or_else(|| value.strip_prefix("%="))?;
    inner.strip_suffix("%>").or_else(|| inner.strip_suffix('%'))
}

/// Whether the value holds an unescaped `${`
pub fn has_el(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes
        .windows(2)
        .enumerate()
        .any(|(idx, pair)| pair == b"${" && (idx == 0 || bytes[idx - 1] != b'\\'))
}

/// Boolean literal as accepted by `flush`, `escapeXml` and `trim`
pub fn parse_boolean(attribute: &str, value: &str) -> Result<bool, CompileErrorKind> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") {
        Ok(false)
    } else {
        Err(CompileErrorKind::InvalidBoolean {
            attribute: attribute.to_owned(),
            value: value.to_owned(),
        })
    }
}

/// Runtime type an attribute value gets converted to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString, IntoStaticStr)]
pub enum ValueType {
    #[default]
    #[strum(serialize = "String", serialize = "java.lang.String")]
    String,
    #[strum(serialize = "boolean", serialize = "java.lang.Boolean")]
    Boolean,
    #[strum(serialize = "int", serialize = "java.lang.Integer")]
    Int,
    #[strum(serialize = "long", serialize = "java.lang.Long")]
    Long,
    #[strum(serialize = "double", serialize = "java.lang.Double")]
    Double,
    #[strum(serialize = "Object", serialize = "java.lang.Object")]
    Object,
}

impl ValueType {
    /// Maps a declared attribute type, anything unknown is passed as an object
    pub fn from_type_name(name: &str) -> ValueType {
        name.parse().unwrap_or(ValueType::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_classifies_static_values() {
        assert_eq!(
            ValueSyntax::classify("plain", true, true),
            Ok(ValueSyntax::Literal("plain"))
        );
        assert_eq!(
            ValueSyntax::classify("<%= user.getName() %>", true, true),
            Ok(ValueSyntax::Runtime(" user.getName() "))
        );
        assert_eq!(
            ValueSyntax::classify("%=count%", true, true),
            Ok(ValueSyntax::Runtime("count"))
        );
        assert_eq!(
            ValueSyntax::classify("a ${b} c", true, true),
            Ok(ValueSyntax::El("a ${b} c"))
        );
    }

    #[test]
    fn it_honours_disabled_syntaxes() {
        assert_eq!(
            ValueSyntax::classify("<%= x %>", false, true),
            Ok(ValueSyntax::Literal("<%= x %>"))
        );
        assert_eq!(
            ValueSyntax::classify("${x}", true, false),
            Ok(ValueSyntax::Literal("${x}"))
        );
        assert_eq!(
            ValueSyntax::classify("\\${x}", true, true),
            Ok(ValueSyntax::Literal("\\${x}"))
        );
    }

    #[test]
    fn it_rejects_interpolated_runtime_values() {
        assert!(matches!(
            ValueSyntax::classify("a<%= x %>", true, true),
            Err(CompileErrorKind::InterpolatedRuntimeValue { .. })
        ));
    }

    #[test]
    fn it_parses_booleans() {
        assert_eq!(parse_boolean("flush", "TRUE"), Ok(true));
        assert_eq!(parse_boolean("flush", "yes"), Ok(true));
        assert_eq!(parse_boolean("flush", " no "), Ok(false));
        assert!(matches!(
            parse_boolean("flush", "maybe"),
            Err(CompileErrorKind::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn it_maps_declared_types() {
        assert_eq!(ValueType::from_type_name("java.lang.String"), ValueType::String);
        assert_eq!(ValueType::from_type_name("int"), ValueType::Int);
        assert_eq!(ValueType::from_type_name("java.util.List"), ValueType::Object);
    }
}
