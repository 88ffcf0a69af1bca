use flagset::{flags, FlagSet};
use strum_macros::{AsRefStr, EnumString, IntoStaticStr};

use crate::CodegenContext;

flags! {
    /// Packages the generated page imports, one flag per package
    #[derive(AsRefStr, EnumString, IntoStaticStr)]
    pub enum RuntimeImports: u16 {
        #[strum(serialize = "java.io.*")]
        Io,
        #[strum(serialize = "java.util.*")]
        Util,
        #[strum(serialize = "javax.el.*")]
        El,
        #[strum(serialize = "javax.servlet.*")]
        Servlet,
        #[strum(serialize = "javax.servlet.http.*")]
        Http,
        #[strum(serialize = "javax.servlet.jsp.*")]
        Jsp,
        #[strum(serialize = "javax.servlet.jsp.jstl.core.*")]
        JstlCore,
        #[strum(serialize = "javax.servlet.jsp.tagext.*")]
        TagExt,
    }
}

/// Imported by every page, the service method needs them
pub const PAGE_IMPORTS: [RuntimeImports; 4] = [
    RuntimeImports::Io,
    RuntimeImports::Servlet,
    RuntimeImports::Http,
    RuntimeImports::Jsp,
];

impl CodegenContext<'_> {
    pub fn add_to_imports(&mut self, import: RuntimeImports) {
        self.used_imports |= import;
    }

    pub fn used_imports(&self) -> FlagSet<RuntimeImports> {
        self.used_imports
    }

    /// Writes one `import` line per used package, in declaration order
    pub fn generate_imports(&mut self) {
        for import in PAGE_IMPORTS {
            self.add_to_imports(import);
        }

        for import in self.used_imports.into_iter() {
            let package: &'static str = import.into();
            self.out.println(&format!("import {package};"));
        }
    }
}
