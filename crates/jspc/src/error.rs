//! Error definitions for the glue code of `jspc`

use jspc_core::{CompileError, SourceLocation};
use jspc_xml::ReadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The page is not well-formed XML, or failed validation while it was read
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The tree could not be generated or printed
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl Error {
    /// Where in the page the compiler gave up, when it got as far as a tag
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Error::Read(ReadError::Compile(err)) | Error::Compile(err) => Some(&err.location),
            Error::Read(_) => None,
        }
    }
}
