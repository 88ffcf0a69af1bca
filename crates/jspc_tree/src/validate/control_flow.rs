use jspc_core::{
    AttributeForm, AttributeValue, CompileErrorKind, CompileOptions, CoreCatch, CoreForEach, CoreIf,
    NodeId, NodeKind, TemplateTree, TestSource, ValueSyntax,
};
use phf::phf_map;

use super::{conflicting, missing, requires, set_once, set_scope, set_static, unknown, AttributeTable};

pub(crate) static IF_ATTRIBUTES: AttributeTable = phf_map! {
    "test" => AttributeForm::Any,
    "var" => AttributeForm::Static,
    "scope" => AttributeForm::Static,
};

pub(crate) static WHEN_ATTRIBUTES: AttributeTable = phf_map! {
    "test" => AttributeForm::Any,
};

pub(crate) static CATCH_ATTRIBUTES: AttributeTable = phf_map! {
    "var" => AttributeForm::Static,
};

pub(crate) static FOR_EACH_ATTRIBUTES: AttributeTable = phf_map! {
    "var" => AttributeForm::Static,
    "varStatus" => AttributeForm::Static,
    "items" => AttributeForm::Any,
    "begin" => AttributeForm::Any,
    "end" => AttributeForm::Any,
    "step" => AttributeForm::Any,
};

/// The static and the fragment test are kept apart, so that giving both is caught on completion
fn set_test(test: &mut TestSource, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match value {
        AttributeValue::Static(expr) => set_once(&mut test.expr, name, expr),
        AttributeValue::Fragment(fragment) => set_once(&mut test.fragment, name, fragment),
    }
}

pub(crate) fn set_if_attribute(node: &mut CoreIf, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "test" => set_test(&mut node.test, name, value),
        "var" => set_static(&mut node.var, name, value),
        "scope" => set_scope(&mut node.scope, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_when_attribute(test: &mut TestSource, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "test" => set_test(test, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_catch_attribute(node: &mut CoreCatch, name: &str, value: AttributeValue) -> Result<(), CompileErrorKind> {
    match name {
        "var" => set_static(&mut node.var, name, value),
        _ => Err(unknown(name)),
    }
}

pub(crate) fn set_for_each_attribute(
    node: &mut CoreForEach,
    name: &str,
    value: AttributeValue,
) -> Result<(), CompileErrorKind> {
    match name {
        "var" => set_static(&mut node.var, name, value),
        "varStatus" => set_static(&mut node.var_status, name, value),
        "items" => set_once(&mut node.items, name, value),
        "begin" => set_once(&mut node.begin, name, value),
        "end" => set_once(&mut node.end, name, value),
        "step" => set_once(&mut node.step, name, value),
        _ => Err(unknown(name)),
    }
}

/// Branch ordering inside `<c:choose>`, checked as each child arrives
pub(crate) fn check_choose_child(tree: &TemplateTree, parent: NodeId, child: NodeId) -> Result<(), CompileErrorKind> {
    let siblings = tree.children(parent);
    let has_when = siblings
        .iter()
        .any(|&sibling| matches!(tree.kind(sibling), NodeKind::When(_)));
    let has_otherwise = siblings
        .iter()
        .any(|&sibling| matches!(tree.kind(sibling), NodeKind::Otherwise));

    match tree.kind(child) {
        NodeKind::When(_) if has_otherwise => Err(CompileErrorKind::WhenAfterOtherwise),
        NodeKind::When(_) => Ok(()),
        NodeKind::Otherwise if !has_when => Err(CompileErrorKind::OtherwiseBeforeWhen),
        NodeKind::Otherwise if has_otherwise => Err(CompileErrorKind::DuplicateOtherwise),
        NodeKind::Otherwise => Ok(()),
        _ => Err(CompileErrorKind::ChildNotAllowed {
            parent: "c:choose".to_owned(),
        }),
    }
}

/// Exactly one test source
pub(crate) fn end_test(test: &TestSource) -> Result<(), CompileErrorKind> {
    match (&test.expr, &test.fragment) {
        (Some(_), Some(_)) => Err(conflicting("test", "jsp:attribute test")),
        (None, None) => Err(missing("test")),
        _ => Ok(()),
    }
}

pub(crate) fn end_if(node: &CoreIf) -> Result<(), CompileErrorKind> {
    end_test(&node.test)?;

    if node.scope.is_some() && node.var.is_none() {
        return Err(requires("scope", "var"));
    }

    Ok(())
}

pub(crate) fn end_choose(tree: &TemplateTree, id: NodeId) -> Result<(), CompileErrorKind> {
    let has_when = tree
        .children(id)
        .iter()
        .any(|&child| matches!(tree.kind(child), NodeKind::When(_)));

    if has_when {
        Ok(())
    } else {
        Err(CompileErrorKind::ChooseWithoutWhen)
    }
}

pub(crate) fn end_for_each(node: &CoreForEach, options: &CompileOptions) -> Result<(), CompileErrorKind> {
    // Counting loops need both bounds
    if node.items.is_none() {
        if node.begin.is_none() {
            return Err(missing("begin"));
        }
        if node.end.is_none() {
            return Err(missing("end"));
        }
    }

    let literal = |name: &str, value: &Option<AttributeValue>| -> Result<Option<i64>, CompileErrorKind> {
        let Some(AttributeValue::Static(raw)) = value else {
            return Ok(None);
        };

        let syntax = ValueSyntax::classify(raw, !options.scripting_invalid, !options.el_ignored)?;
        if !syntax.is_literal() {
            return Ok(None);
        }

        raw.trim()
            .parse::<i32>()
            .map(|number| Some(number as i64))
            .map_err(|_| CompileErrorKind::InvalidNumber {
                attribute: name.to_owned(),
                value: raw.to_owned(),
            })
    };

    literal("begin", &node.begin)?;
    literal("end", &node.end)?;
    if let Some(step) = literal("step", &node.step)? {
        if step < 1 {
            return Err(CompileErrorKind::InvalidNumber {
                attribute: "step".to_owned(),
                value: step.to_string(),
            });
        }
    }

    Ok(())
}
