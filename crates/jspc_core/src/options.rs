use crate::{IncludeResolver, NoIncludes, TagLibraryProvider, TagLibraryRegistry};

/// Page-level switches
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Forbids scriptlets, expressions and declarations everywhere
    pub scripting_invalid: bool,
    /// `${...}` is plain text
    pub el_ignored: bool,
    /// Document uses XML syntax, whitespace-only text between tags is dropped
    pub is_xml: bool,
    /// Name of the generated class
    pub class_name: String,
    /// Package of the generated class, empty for none
    pub package: String,
    /// Interleave `// file:line` comments into the generated code
    pub line_markers: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            scripting_invalid: false,
            el_ignored: false,
            is_xml: false,
            class_name: "_jsp_page".to_owned(),
            package: String::new(),
            line_markers: false,
        }
    }
}

/// Everything a single compilation consults besides the tree itself
pub struct CompileConfig {
    pub options: CompileOptions,
    pub includes: Box<dyn IncludeResolver>,
    pub tag_libraries: Box<dyn TagLibraryProvider>,
}

impl CompileConfig {
    pub fn new(options: CompileOptions) -> Self {
        CompileConfig {
            options,
            includes: Box::new(NoIncludes),
            tag_libraries: Box::<TagLibraryRegistry>::default(),
        }
    }

    pub fn with_includes(mut self, includes: impl IncludeResolver + 'static) -> Self {
        self.includes = Box::new(includes);
        self
    }

    pub fn with_tag_libraries(mut self, provider: impl TagLibraryProvider + 'static) -> Self {
        self.tag_libraries = Box::new(provider);
        self
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig::new(CompileOptions::default())
    }
}
