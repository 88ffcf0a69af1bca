use jspc_core::{
    AttributeForm, AttributeValue, CompileErrorKind, CompileOptions, CustomTag, NodeId, NodeKind,
    QName, TemplateTree, ValueSyntax,
};

use super::{missing, unknown};

/// Declared attributes only. Attributes without runtime values must be static.
pub(crate) fn attribute_form(tag: &CustomTag, name: &QName) -> Option<AttributeForm> {
    if name.prefix().is_some() {
        return None;
    }

    let info = tag.info.find_attribute(name.local())?;
    if info.rtexprvalue || info.fragment {
        Some(AttributeForm::Any)
    } else {
        Some(AttributeForm::Static)
    }
}

pub(crate) fn set_custom_attribute(
    tag: &mut CustomTag,
    name: &str,
    value: AttributeValue,
    options: &CompileOptions,
) -> Result<(), CompileErrorKind> {
    let Some(info) = tag.info.find_attribute(name) else {
        return Err(unknown(name));
    };

    if tag.attributes.iter().any(|(known, _)| known == name) {
        return Err(CompileErrorKind::DuplicateAttribute {
            attribute: name.to_owned(),
        });
    }

    if let AttributeValue::Static(ref raw) = value {
        let syntax = ValueSyntax::classify(raw, !options.scripting_invalid, !options.el_ignored)?;
        if !info.rtexprvalue && !syntax.is_literal() {
            return Err(CompileErrorKind::RuntimeValueNotAllowed {
                attribute: name.to_owned(),
                value: raw.to_owned(),
            });
        }
    }

    tag.attributes.push((name.to_owned(), value));
    Ok(())
}

/// A tag declared with an empty body only takes `<jsp:attribute>`s
pub(crate) fn check_empty_body_child(tree: &TemplateTree, child: NodeId) -> Result<(), CompileErrorKind> {
    match tree.kind(child) {
        NodeKind::Attribute(_) => Ok(()),
        _ => Err(CompileErrorKind::BodyMustBeEmpty),
    }
}

pub(crate) fn end_custom(tag: &CustomTag) -> Result<(), CompileErrorKind> {
    let absent = tag
        .info
        .attributes
        .iter()
        .filter(|info| info.required)
        .find(|info| !tag.attributes.iter().any(|(name, _)| *name == info.name));

    match absent {
        Some(info) => Err(missing(&info.name)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use jspc_core::{
        BodyContent, CompileConfig, Dependency, TagAttributeInfo, TagInfo, TagLibrary,
        TagLibraryRegistry,
    };

    use crate::test_utils::build_with;

    use super::*;

    fn shop_config() -> CompileConfig {
        let mut price = TagInfo::new("price", "shop.PriceTag");
        price.body_content = BodyContent::Empty;
        price.attributes = vec![
            TagAttributeInfo::new("amount").required(),
            TagAttributeInfo::new("currency").static_only(),
        ];
        price.dependencies = vec![Dependency::new("/WEB-INF/shop.tld", 7)];

        let mut cart = TagInfo::new("cart", "shop.CartTag");
        cart.body_content = BodyContent::Scriptless;

        let mut library = TagLibrary::new("urn:shop");
        library.add_tag(price);
        library.add_tag(cart);

        let mut registry = TagLibraryRegistry::default();
        registry.register("shop", library);

        CompileConfig::default().with_tag_libraries(registry)
    }

    #[test]
    fn it_resolves_custom_tags() {
        let config = shop_config();
        let tree = build_with(&config, "<shop:price amount=\"${p}\" currency=\"EUR\"/>").unwrap();

        let price = tree.children(tree.root())[0];
        let NodeKind::Custom(tag) = tree.kind(price) else { panic!() };
        assert_eq!(tag.info.tag_class, "shop.PriceTag");
        assert_eq!(tag.attributes.len(), 2);

        assert_eq!(tree.namespaces(), &[("shop".to_owned(), "urn:shop".to_owned())]);
        assert_eq!(tree.dependencies().len(), 1);
    }

    #[test]
    fn it_validates_custom_attributes() {
        let config = shop_config();

        let err = build_with(&config, "<shop:price currency=\"EUR\"/>").unwrap_err();
        assert_eq!(err.kind, missing("amount"));

        let err = build_with(&config, "<shop:price amount=\"1\" tax=\"0\"/>").unwrap_err();
        assert_eq!(err.kind, unknown("tax"));

        let err = build_with(&config, "<shop:price amount=\"1\" currency=\"${c}\"/>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::RuntimeValueNotAllowed { .. }));

        let err = build_with(&config, "<shop:price amount=\"1\">body</shop:price>").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::BodyMustBeEmpty);

        let err = build_with(&config, "<shop:price amount=\"1\"><b/></shop:price>").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::BodyMustBeEmpty);

        let err = build_with(&config, "<shop:basket/>").unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::UnknownTag { .. }));
    }

    #[test]
    fn it_forbids_scripting_in_scriptless_bodies() {
        let config = shop_config();
        let err = build_with(
            &config,
            "<shop:cart><p><jsp:scriptlet>x++;</jsp:scriptlet></p></shop:cart>",
        )
        .unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::ScriptingForbidden);

        assert!(build_with(&config, "<shop:cart><p>${x}</p></shop:cart>").is_ok());
    }

    #[test]
    fn it_leaves_unknown_prefixes_as_markup() {
        let config = shop_config();
        let tree = build_with(&config, "<svg:rect width=\"1\"/>").unwrap();
        let rect = tree.children(tree.root())[0];
        assert!(matches!(tree.kind(rect), NodeKind::Element(_)));
    }
}
