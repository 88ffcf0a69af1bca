use jspc_core::{AttributeValue, CompileResult, CoreForEach, NodeId, Scope, ValueType};

use crate::{quoted, CodegenContext, RuntimeImports};

/// Names of the temporaries of one loop, all sharing one id
struct LoopVars {
    begin: String,
    end: String,
    step: String,
    index: String,
    skip: String,
    items: String,
    iter: String,
    item: String,
    status: String,
    old_status: String,
}

impl LoopVars {
    fn new(id: u32) -> Self {
        LoopVars {
            begin: format!("_jsp_begin_{id}"),
            end: format!("_jsp_end_{id}"),
            step: format!("_jsp_step_{id}"),
            index: format!("_jsp_i_{id}"),
            skip: format!("_jsp_skip_{id}"),
            items: format!("_jsp_items_{id}"),
            iter: format!("_jsp_iter_{id}"),
            item: format!("_jsp_item_{id}"),
            status: format!("_jsp_status_{id}"),
            old_status: format!("_jsp_old_status_{id}"),
        }
    }
}

/// Loop bounds as generated, `None` where the attribute was not given
struct Bounds {
    begin: Option<String>,
    end: Option<String>,
    step: Option<String>,
}

impl Bounds {
    /// `init` arguments of a loop status object
    fn init_args(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}",
            self.begin.as_deref().unwrap_or("0"),
            self.end.as_deref().unwrap_or("Integer.MAX_VALUE"),
            self.step.as_deref().unwrap_or("1"),
            self.begin.is_some(),
            self.end.is_some(),
            self.step.is_some()
        )
    }
}

impl CodegenContext<'_> {
    /// Generates `<c:forEach>`, either counting or walking over `items`
    pub(crate) fn generate_for_each(&mut self, id: NodeId, node: &CoreForEach) -> CompileResult<()> {
        let vars = LoopVars::new(self.next_id());

        match &node.items {
            Some(items) => self.generate_items_loop(id, node, items, &vars)?,
            None => self.generate_counting_loop(id, node, &vars)?,
        }

        if let Some(var) = &node.var {
            self.generate_set_or_remove(Scope::Page, var, "null");
        }

        if let Some(var_status) = &node.var_status {
            self.generate_status_restore(var_status, &vars);
        }

        Ok(())
    }

    fn generate_counting_loop(&mut self, id: NodeId, node: &CoreForEach, vars: &LoopVars) -> CompileResult<()> {
        let bounds = self.generate_bounds(id, node, vars)?;
        let begin = bounds.begin.as_deref().unwrap_or("0");
        let end = bounds.end.as_deref().unwrap_or("Integer.MAX_VALUE");
        let step = bounds.step.as_deref().unwrap_or("1");

        if let Some(var_status) = &node.var_status {
            self.generate_status_setup("com.caucho.jsp.IntegerLoopSupportTag", var_status, &bounds, vars);
        }

        let index = &vars.index;
        self.out.println(&format!(
            "for (int {index} = {begin}; {index} <= {end}; {index} += {step}) {{"
        ));
        self.in_block(|ctx| {
            if let Some(var) = &node.var {
                ctx.out.println(&format!(
                    "pageContext.setAttribute({}, Integer.valueOf({index}));",
                    quoted(var)
                ));
            }
            if node.var_status.is_some() {
                ctx.out.println(&format!("{}.setCurrent({index});", vars.status));
            }
            ctx.generate_body(id)
        })?;
        self.out.println("}");

        Ok(())
    }

    fn generate_items_loop(
        &mut self,
        id: NodeId,
        node: &CoreForEach,
        items: &AttributeValue,
        vars: &LoopVars,
    ) -> CompileResult<()> {
        self.add_to_imports(RuntimeImports::Util);

        let items_var = &vars.items;
        let iter = &vars.iter;
        let item = &vars.item;

        let items_expr = self.generate_value(id, "items", items, ValueType::Object)?;
        self.out.println(&format!("Object {items_var} = {items_expr};"));
        self.out.println(&format!(
            "Iterator {iter} = com.caucho.jstl.rt.CoreForEachTag.getIterator({items_var});"
        ));

        let bounds = self.generate_bounds(id, node, vars)?;

        // Items before `begin` are dropped up front
        if let Some(begin) = &bounds.begin {
            let skip = &vars.skip;
            self.out.println(&format!("for (int {skip} = {begin}; {skip} > 0; {skip}--) {{"));
            self.out.println(&format!("  if ({iter}.hasNext()) {iter}.next();"));
            self.out.println("}");
        }

        if let Some(var_status) = &node.var_status {
            self.generate_status_setup("com.caucho.jsp.IteratorLoopSupportTag", var_status, &bounds, vars);
        }

        match &bounds.end {
            Some(end) => {
                let index = &vars.index;
                let begin = bounds.begin.as_deref().unwrap_or("0");
                let step = bounds.step.as_deref().unwrap_or("1");
                self.out.println(&format!(
                    "for (int {index} = {begin}; {index} <= {end} && {iter}.hasNext(); {index} += {step}) {{"
                ));
            }
            None => self.out.println(&format!("while ({iter}.hasNext()) {{")),
        }

        self.in_block(|ctx| {
            ctx.out.println(&format!("Object {item} = {iter}.next();"));
            if node.var_status.is_some() {
                ctx.out
                    .println(&format!("{}.setCurrent({item}, {iter}.hasNext());", vars.status));
            }
            if let Some(var) = &node.var {
                ctx.out
                    .println(&format!("pageContext.setAttribute({}, {item});", quoted(var)));
            }

            ctx.generate_body(id)?;

            // Every item but each step-th is passed over
            if let Some(step) = &bounds.step {
                let skip = &vars.skip;
                ctx.out
                    .println(&format!("for (int {skip} = {step}; {skip} > 1; {skip}--) {{"));
                ctx.out.println(&format!("  if ({iter}.hasNext()) {iter}.next();"));
                ctx.out.println("}");
            }

            Ok(())
        })?;
        self.out.println("}");

        Ok(())
    }

    /// Declares an `int` for each bound which was given
    fn generate_bounds(&mut self, id: NodeId, node: &CoreForEach, vars: &LoopVars) -> CompileResult<Bounds> {
        Ok(Bounds {
            begin: self.generate_bound(id, "begin", node.begin.as_ref(), &vars.begin)?,
            end: self.generate_bound(id, "end", node.end.as_ref(), &vars.end)?,
            step: self.generate_bound(id, "step", node.step.as_ref(), &vars.step)?,
        })
    }

    fn generate_bound(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&AttributeValue>,
        var: &str,
    ) -> CompileResult<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };

        let expr = self.generate_value(id, name, value, ValueType::Int)?;
        self.out.println(&format!("int {var} = {expr};"));
        Ok(Some(var.to_owned()))
    }

    fn generate_status_setup(&mut self, class: &str, var_status: &str, bounds: &Bounds, vars: &LoopVars) {
        let status = &vars.status;
        self.out.println(&format!("{class} {status} = new {class}();"));
        self.out.println(&format!("{status}.init({});", bounds.init_args()));
        self.out.println(&format!(
            "Object {} = pageContext.putAttribute({}, {status});",
            vars.old_status,
            quoted(var_status)
        ));
    }

    /// An outer loop's status comes back, anything else is dropped
    fn generate_status_restore(&mut self, var_status: &str, vars: &LoopVars) {
        self.add_to_imports(RuntimeImports::JstlCore);

        let old_status = &vars.old_status;
        let name = quoted(var_status);
        self.out
            .println(&format!("if ({old_status} instanceof LoopTagStatus) {{"));
        self.out
            .println(&format!("  pageContext.pageSetOrRemove({name}, {old_status});"));
        self.out.println("} else {");
        self.out
            .println(&format!("  pageContext.pageSetOrRemove({name}, null);"));
        self.out.println("}");
    }
}
