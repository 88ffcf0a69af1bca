mod attributes;
mod depend;
mod error;
mod location;
mod nodes;
mod options;
mod qname;
mod scope;
mod taglib;
mod tree;

pub use attributes::*;
pub use depend::*;
pub use error::*;
pub use location::SourceLocation;
pub use nodes::*;
pub use options::*;
pub use qname::*;
pub use scope::Scope;
pub use taglib::*;
pub use tree::*;
