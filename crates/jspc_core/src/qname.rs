use std::fmt::Display;

/// Prefix of the standard actions (`jsp:include`, `jsp:attribute`, ...)
pub const JSP_PREFIX: &str = "jsp";
/// Prefix the JSTL core library is bound to
pub const CORE_PREFIX: &str = "c";

pub const JSP_NS: &str = "http://java.sun.com/JSP/Page";
pub const JSTL_CORE_NS: &str = "http://java.sun.com/jsp/jstl/core";

/// Qualified name of a tag or an attribute, e.g. `c:if` or `test`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    prefix: Option<String>,
    local: String,
}

impl QName {
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        QName {
            prefix: prefix.map(ToOwned::to_owned),
            local: local.to_owned(),
        }
    }

    /// Splits `raw` at the first colon
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => QName::new(Some(prefix), local),
            None => QName::new(None, raw),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    pub fn is(&self, prefix: &str, local: &str) -> bool {
        self.prefix.as_deref() == Some(prefix) && self.local == local
    }

    /// Attribute names without a prefix compare by their local part
    pub fn is_plain(&self, local: &str) -> bool {
        self.prefix.is_none() && self.local == local
    }
}

impl Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(ref prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_splits_at_first_colon() {
        let name = QName::parse("c:when");
        assert_eq!(name.prefix(), Some("c"));
        assert_eq!(name.local(), "when");
        assert!(name.is(CORE_PREFIX, "when"));
        assert_eq!(name.to_string(), "c:when");

        let name = QName::parse("xmlns:my:odd");
        assert_eq!(name.prefix(), Some("xmlns"));
        assert_eq!(name.local(), "my:odd");
    }

    #[test]
    fn it_keeps_plain_names() {
        let name = QName::parse("test");
        assert!(name.prefix().is_none());
        assert!(name.is_plain("test"));
        assert!(!QName::parse("x:test").is_plain("test"));
        assert_eq!(name.to_string(), "test");
    }
}
