use jspc_core::{
    parse_boolean, AttributeForm, AttributeValue, CompileErrorKind, IncludeDirective, JspAttribute,
    JspInclude, JspParam, NodeId, NodeKind, PageRoot, TemplateTree,
};
use phf::phf_map;

use super::{missing, set_once, set_static, static_value, unknown, AttributeTable};

pub(crate) static PAGE_ATTRIBUTES: AttributeTable = phf_map! {
    "version" => AttributeForm::Static,
};

pub(crate) static ATTRIBUTE_ATTRIBUTES: AttributeTable = phf_map! {
    "name" => AttributeForm::Static,
    "trim" => AttributeForm::Static,
};

pub(crate) static PARAM_ATTRIBUTES: AttributeTable = phf_map! {
    "name" => AttributeForm::Static,
    "value" => AttributeForm::Any,
};

pub(crate) static INCLUDE_ATTRIBUTES: AttributeTable = phf_map! {
    "page" => AttributeForm::Any,
    "flush" => AttributeForm::Static,
};

pub(crate) static DIRECTIVE_ATTRIBUTES: AttributeTable = phf_map! {
    "file" => AttributeForm::Static,
};

pub(crate) fn set_page_attribute(page: &mut PageRoot, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "version" => set_static(&mut page.version, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_attribute_attribute(
    attr: &mut JspAttribute,
    name: &str,
    value: AttributeValue,
) -> Result<(), CompileErrorKind> {
    match name {
        "name" => set_static(&mut attr.name, name, value),
        "trim" => {
            attr.trim = parse_boolean(name, &static_value(name, value)?)?;
            Ok(())
        }
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_param_attribute(param: &mut JspParam, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "name" => set_static(&mut param.name, name, value),
        "value" => set_once(&mut param.value, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_include_attribute(
    include: &mut JspInclude,
    name: &str,
    value: AttributeValue,
) -> Result<(), CompileErrorKind> {
    match name {
        "page" => set_once(&mut include.page, name, value),
        "flush" => {
            let flush = parse_boolean(name, &static_value(name, value)?)?;
            set_once(&mut include.flush, name, flush)
        }
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_directive_attribute(
    directive: &mut IncludeDirective,
    name: &str,
    value: AttributeValue,
) -> Result<(), CompileErrorKind> {
    match name {
        "file" => set_static(&mut directive.file, name, value),
        _ => Err(unknown(name)),
    }
}

/// `<jsp:include>` only holds parameters
pub(crate) fn check_include_child(tree: &TemplateTree, child: NodeId) -> Result<(), CompileErrorKind> {
    match tree.kind(child) {
        NodeKind::JspParam(_) | NodeKind::Attribute(_) => Ok(()),
        _ => Err(CompileErrorKind::ChildNotAllowed {
            parent: "jsp:include".to_owned(),
        }),
    }
}

pub(crate) fn end_param(param: &JspParam) -> Result<(), CompileErrorKind> {
    if param.name.is_none() {
        return Err(missing("name"));
    }

    if param.value.is_none() {
        return Err(missing("value"));
    }

    Ok(())
}

pub(crate) fn end_include(include: &JspInclude) -> Result<(), CompileErrorKind> {
    match include.page {
        Some(_) => Ok(()),
        None => Err(missing("page")),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use jspc_core::{CompileConfig, Dependency, IncludeResolver};

    use crate::test_utils::{build, build_with, kinds};

    use super::*;

    struct Fragments;

    impl IncludeResolver for Fragments {
        fn resolve(&self, from: &str, path: &str) -> io::Result<Dependency> {
            assert_eq!(from, "test.jsp");
            match path {
                "header.jspf" => Ok(Dependency::new("/pages/header.jspf", 42)),
                _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            }
        }
    }

    #[test]
    fn it_builds_includes_with_params() {
        let tree = build(
            "<jsp:include page=\"/nav.jsp\" flush=\"yes\"> <jsp:param name=\"section\" value=\"${s}\"/> </jsp:include>",
        )
        .unwrap();
        let include = tree.children(tree.root())[0];
        assert_eq!(kinds(&tree, include), vec!["jsp:param"]);

        let NodeKind::Include(node) = tree.kind(include) else { panic!() };
        assert_eq!(node.flush, Some(true));
    }

    #[test]
    fn it_validates_includes() {
        let err = build("<jsp:include flush=\"true\"/>").unwrap_err();
        assert_eq!(err.kind, missing("page"));

        let err = build("<jsp:include page=\"a.jsp\" flush=\"sometimes\"/>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::InvalidBoolean { .. }));

        let err = build("<jsp:include page=\"a.jsp\"><b/></jsp:include>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::ChildNotAllowed { .. }));

        let err = build("<jsp:include page=\"a.jsp\">text</jsp:include>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::TextNotAllowed { .. }));

        let err = build("<p><jsp:param name=\"a\" value=\"b\"/></p>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::MisplacedTag { .. }));

        let err = build("<jsp:include page=\"a.jsp\"><jsp:param name=\"a\"/></jsp:include>").unwrap_err();
        assert_eq!(err.kind, missing("value"));
    }

    #[test]
    fn it_registers_included_files() {
        let config = CompileConfig::default().with_includes(Fragments);
        let tree = build_with(
            &config,
            "<jsp:directive.include file=\"header.jspf\"/><jsp:directive.include file=\"header.jspf\"/>",
        )
        .unwrap();

        let dependencies: Vec<_> = tree.dependencies().iter().cloned().collect();
        assert_eq!(dependencies, vec![Dependency::new("/pages/header.jspf", 42)]);

        let err = build_with(&config, "<jsp:directive.include file=\"footer.jspf\"/>").unwrap_err();
        assert_eq!(
            err.kind,
            CompileErrorKind::IncludeNotFound {
                path: "footer.jspf".to_owned(),
                reason: "no such file".to_owned()
            }
        );
    }

    #[test]
    fn it_requires_attribute_names() {
        let err = build("<c:if><jsp:attribute>${a}</jsp:attribute></c:if>").unwrap_err();
        assert_eq!(err.kind, missing("name"));
        assert_eq!(err.tag_name, "jsp:attribute");

        let err = build("<c:if test=\"a\"><jsp:attribute name=\"x\" trim=\"maybe\">b</jsp:attribute></c:if>")
            .unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::InvalidBoolean { .. }));
    }

    #[test]
    fn it_keeps_untrimmed_fragments() {
        let tree = build("<c:remove><jsp:attribute name=\"var\" trim=\"false\"> a </jsp:attribute></c:remove>")
            .unwrap();
        let remove = tree.children(tree.root())[0];
        let NodeKind::Remove(remove) = tree.kind(remove) else { panic!() };
        assert_eq!(remove.var.as_deref(), Some(" a "));
    }
}
