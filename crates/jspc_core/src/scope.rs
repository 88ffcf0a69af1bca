use strum_macros::{AsRefStr, EnumString, IntoStaticStr};

use crate::CompileErrorKind;

/// Where a named runtime variable is stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Scope {
    #[default]
    Page,
    Request,
    Session,
    Application,
}

impl Scope {
    /// Resolves the value of a `scope` attribute. Unset means page scope.
    pub fn resolve(value: Option<&str>) -> Result<Scope, CompileErrorKind> {
        match value {
            None => Ok(Scope::Page),
            Some(value) => value.parse().map_err(|_| CompileErrorKind::InvalidScope {
                value: value.to_owned(),
            }),
        }
    }

    /// Constant naming the scope in the page context API
    pub fn context_constant(self) -> &'static str {
        match self {
            Scope::Page => "PageContext.PAGE_SCOPE",
            Scope::Request => "PageContext.REQUEST_SCOPE",
            Scope::Session => "PageContext.SESSION_SCOPE",
            Scope::Application => "PageContext.APPLICATION_SCOPE",
        }
    }

    /// Page context method which sets the variable, or removes it when the value is null
    pub fn set_or_remove_method(self) -> &'static str {
        match self {
            Scope::Page => "pageSetOrRemove",
            Scope::Request => "requestSetOrRemove",
            Scope::Session => "sessionSetOrRemove",
            Scope::Application => "applicationSetOrRemove",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_resolves_known_scopes() {
        assert_eq!(Scope::resolve(None), Ok(Scope::Page));
        assert_eq!(Scope::resolve(Some("page")), Ok(Scope::Page));
        assert_eq!(Scope::resolve(Some("request")), Ok(Scope::Request));
        assert_eq!(Scope::resolve(Some("session")), Ok(Scope::Session));
        assert_eq!(Scope::resolve(Some("application")), Ok(Scope::Application));
    }

    #[test]
    fn it_rejects_other_scopes() {
        for value in ["", "Page", "global", "${scope}"] {
            assert_eq!(
                Scope::resolve(Some(value)),
                Err(CompileErrorKind::InvalidScope {
                    value: value.to_owned()
                })
            );
        }
    }

    #[test]
    fn it_routes_to_scope_storage() {
        assert_eq!(Scope::Request.set_or_remove_method(), "requestSetOrRemove");
        assert_eq!(Scope::Application.context_constant(), "PageContext.APPLICATION_SCOPE");
        assert_eq!(Scope::Session.as_ref(), "session");
    }
}
