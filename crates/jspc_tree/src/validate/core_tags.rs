use jspc_core::{
    has_el, parse_boolean, runtime_expression, AttributeForm, AttributeValue, CompileErrorKind,
    CoreImport, CoreOut, CoreParam, CoreRedirect, CoreRemove, CoreSet, CoreUrl, NodeId, NodeKind,
    TemplateTree,
};
use phf::phf_map;

use super::{conflicting, missing, requires, set_once, set_scope, set_static, unknown, AttributeTable};

pub(crate) static OUT_ATTRIBUTES: AttributeTable = phf_map! {
    "value" => AttributeForm::Any,
    "default" => AttributeForm::Any,
    "escapeXml" => AttributeForm::Any,
};

pub(crate) static SET_ATTRIBUTES: AttributeTable = phf_map! {
    "var" => AttributeForm::Static,
    "value" => AttributeForm::Any,
    "scope" => AttributeForm::Static,
    "target" => AttributeForm::Any,
    "property" => AttributeForm::Any,
};

pub(crate) static REMOVE_ATTRIBUTES: AttributeTable = phf_map! {
    "var" => AttributeForm::Static,
    "scope" => AttributeForm::Static,
};

pub(crate) static URL_ATTRIBUTES: AttributeTable = phf_map! {
    "value" => AttributeForm::Any,
    "context" => AttributeForm::Any,
    "var" => AttributeForm::Static,
    "scope" => AttributeForm::Static,
};

pub(crate) static IMPORT_ATTRIBUTES: AttributeTable = phf_map! {
    "url" => AttributeForm::Any,
    "context" => AttributeForm::Any,
    "charEncoding" => AttributeForm::Any,
    "var" => AttributeForm::Static,
    "scope" => AttributeForm::Static,
};

pub(crate) static REDIRECT_ATTRIBUTES: AttributeTable = phf_map! {
    "url" => AttributeForm::Any,
    "context" => AttributeForm::Any,
};

pub(crate) static PARAM_ATTRIBUTES: AttributeTable = phf_map! {
    "name" => AttributeForm::Any,
    "value" => AttributeForm::Any,
};

pub(crate) fn set_out_attribute(out: &mut CoreOut, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "value" => set_once(&mut out.value, name, value),
        "default" => set_once(&mut out.default, name, value),
        "escapeXml" => {
            // Literal flags are checked now, expressions at run time
            if let AttributeValue::Static(ref flag) = value {
                if !has_el(flag) && runtime_expression(flag).is_none() {
                    parse_boolean(name, flag)?;
                }
            }
            set_once(&mut out.escape_xml, name, value)
        }
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_set_attribute(set: &mut CoreSet, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "var" => set_static(&mut set.var, name, value),
        "value" => set_once(&mut set.value, name, value),
        "scope" => set_scope(&mut set.scope, name, value),
        "target" => set_once(&mut set.target, name, value),
        "property" => set_once(&mut set.property, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_remove_attribute(remove: &mut CoreRemove, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "var" => set_static(&mut remove.var, name, value),
        "scope" => set_scope(&mut remove.scope, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_url_attribute(url: &mut CoreUrl, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "value" => set_once(&mut url.value, name, value),
        "context" => set_once(&mut url.context, name, value),
        "var" => set_static(&mut url.var, name, value),
        "scope" => set_scope(&mut url.scope, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_import_attribute(import: &mut CoreImport, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "url" => set_once(&mut import.url, name, value),
        "context" => set_once(&mut import.context, name, value),
        "charEncoding" => set_once(&mut import.char_encoding, name, value),
        "var" => set_static(&mut import.var, name, value),
        "scope" => set_scope(&mut import.scope, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_redirect_attribute(
    redirect: &mut CoreRedirect,
    name: &str,
    value: AttributeValue,
) -> Result<(), CompileErrorKind> {
    match name {
        "url" => set_once(&mut redirect.url, name, value),
        "context" => set_once(&mut redirect.context, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_param_attribute(param: &mut CoreParam, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "name" => set_once(&mut param.name, name, value),
        "value" => set_once(&mut param.value, name, value),
        _ => Err(unknown(name)),
    }
}

/// URL tags only hold `<c:param>`s
pub(crate) fn check_url_child(tree: &TemplateTree, child: NodeId, parent: String) -> Result<(), CompileErrorKind> {
    match tree.kind(child) {
        NodeKind::CoreParam(_) | NodeKind::Attribute(_) => Ok(()),
        _ => Err(CompileErrorKind::ChildNotAllowed { parent }),
    }
}

pub(crate) fn end_out(out: &CoreOut, has_body: bool) -> Result<(), CompileErrorKind> {
    if out.value.is_none() {
        return Err(missing("value"));
    }

    if out.default.is_some() && has_body {
        return Err(conflicting("default", "body"));
    }

    Ok(())
}

pub(crate) fn end_set(set: &CoreSet, has_body: bool) -> Result<(), CompileErrorKind> {
    match (&set.var, &set.target) {
        (Some(_), Some(_)) => return Err(conflicting("var", "target")),
        (None, None) => return Err(missing("var")),
        _ => {}
    }

    if set.target.is_some() && set.property.is_none() {
        return Err(requires("target", "property"));
    }

    if set.property.is_some() && set.target.is_none() {
        return Err(requires("property", "target"));
    }

    if set.scope.is_some() && set.var.is_none() {
        return Err(requires("scope", "var"));
    }

    if set.value.is_some() && has_body {
        return Err(conflicting("value", "body"));
    }

    Ok(())
}

pub(crate) fn end_remove(remove: &CoreRemove) -> Result<(), CompileErrorKind> {
    match remove.var {
        Some(_) => Ok(()),
        None => Err(missing("var")),
    }
}

pub(crate) fn end_url(url: &CoreUrl) -> Result<(), CompileErrorKind> {
    if url.value.is_none() {
        return Err(missing("value"));
    }

    if url.scope.is_some() && url.var.is_none() {
        return Err(requires("scope", "var"));
    }

    Ok(())
}

pub(crate) fn end_import(import: &CoreImport) -> Result<(), CompileErrorKind> {
    if import.url.is_none() {
        return Err(missing("url"));
    }

    if import.scope.is_some() && import.var.is_none() {
        return Err(requires("scope", "var"));
    }

    Ok(())
}

pub(crate) fn end_redirect(redirect: &CoreRedirect) -> Result<(), CompileErrorKind> {
    match redirect.url {
        Some(_) => Ok(()),
        None => Err(missing("url")),
    }
}

pub(crate) fn end_param(param: &CoreParam, has_body: bool) -> Result<(), CompileErrorKind> {
    if param.name.is_none() {
        return Err(missing("name"));
    }

    if param.value.is_some() && has_body {
        return Err(conflicting("value", "body"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use jspc_core::Scope;

    use crate::test_utils::{build, kinds};

    use super::*;

    #[test]
    fn it_resolves_scopes() {
        for (scope, expected) in [
            ("page", Scope::Page),
            ("request", Scope::Request),
            ("session", Scope::Session),
            ("application", Scope::Application),
        ] {
            let tree = build(&format!("<c:set var=\"a\" value=\"1\" scope=\"{scope}\"/>")).unwrap();
            let set = tree.children(tree.root())[0];
            let NodeKind::Set(set) = tree.kind(set) else { panic!() };
            assert_eq!(set.scope, Some(expected));
        }

        let tree = build("<c:remove var=\"a\"/>").unwrap();
        let remove = tree.children(tree.root())[0];
        let NodeKind::Remove(remove) = tree.kind(remove) else { panic!() };
        assert_eq!(remove.scope, None);
    }

    #[test]
    fn it_rejects_unknown_scopes() {
        let err = build("<c:set var=\"a\" value=\"1\" scope=\"global\"/>").unwrap_err();
        assert_eq!(
            err.kind,
            CompileErrorKind::InvalidScope {
                value: "global".to_owned()
            }
        );
        assert_eq!(err.tag_name, "c:set");

        let err = build("<c:remove var=\"a\" scope=\"Request\"/>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::InvalidScope { .. }));
    }

    #[test]
    fn it_checks_set_combinations() {
        let err = build("<c:set value=\"1\"/>").unwrap_err();
        assert_eq!(err.kind, missing("var"));

        let err = build("<c:set var=\"a\" target=\"${b}\" property=\"c\" value=\"1\"/>").unwrap_err();
        assert_eq!(err.kind, conflicting("var", "target"));

        let err = build("<c:set target=\"${b}\" value=\"1\"/>").unwrap_err();
        assert_eq!(err.kind, requires("target", "property"));

        let err = build("<c:set target=\"${b}\" property=\"c\" scope=\"page\" value=\"1\"/>").unwrap_err();
        assert_eq!(err.kind, requires("scope", "var"));

        let err = build("<c:set var=\"a\" value=\"1\">body</c:set>").unwrap_err();
        assert_eq!(err.kind, conflicting("value", "body"));

        assert!(build("<c:set var=\"a\"> ${b} </c:set>").is_ok());
        assert!(build("<c:set var=\"a\" value=\"1\"> </c:set>").is_ok());
    }

    #[test]
    fn it_checks_out() {
        let err = build("<c:out default=\"x\"/>").unwrap_err();
        assert_eq!(err.kind, missing("value"));

        let err = build("<c:out value=\"${a}\" escapeXml=\"perhaps\"/>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::InvalidBoolean { .. }));

        assert!(build("<c:out value=\"${a}\" escapeXml=\"${escape}\"/>").is_ok());
        assert!(build("<c:out value=\"${a}\">fallback</c:out>").is_ok());
    }

    #[test]
    fn it_keeps_params_under_urls() {
        let tree = build(
            "<c:url value=\"/search\" var=\"u\">\n  <c:param name=\"q\" value=\"${q}\"/>\n  <c:param name=\"page\">2</c:param>\n</c:url>",
        )
        .unwrap();
        let url = tree.children(tree.root())[0];
        assert_eq!(kinds(&tree, url), vec!["c:param", "c:param"]);

        let err = build("<p><c:param name=\"q\" value=\"1\"/></p>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::MisplacedTag { .. }));
        assert_eq!(err.tag_name, "c:param");

        let err = build("<c:url value=\"/\"><b/></c:url>").unwrap_err();
        assert_eq!(
            err.kind,
            CompileErrorKind::ChildNotAllowed {
                parent: "c:url".to_owned()
            }
        );

        let err = build("<c:redirect url=\"/\"><c:param name=\"a\" value=\"1\">x</c:param></c:redirect>")
            .unwrap_err();
        assert_eq!(err.kind, conflicting("value", "body"));

        let err = build("<c:import url=\"/\" scope=\"request\"/>").unwrap_err();
        assert_eq!(err.kind, requires("scope", "var"));
    }
}
