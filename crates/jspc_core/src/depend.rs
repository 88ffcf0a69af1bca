use std::{
    hash::{Hash, Hasher},
    io,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use fxhash::FxHasher;
use log::trace;

/// External resource a compiled page was built from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// Path or URI of the resource
    pub resource: String,
    /// Changes whenever the resource changes
    pub fingerprint: u64,
}

impl Dependency {
    pub fn new(resource: impl Into<String>, fingerprint: u64) -> Self {
        Dependency {
            resource: resource.into(),
            fingerprint,
        }
    }

    /// Fingerprints a file by its size and modification time
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        let mut hasher = FxHasher::default();
        metadata.len().hash(&mut hasher);
        modified.as_secs().hash(&mut hasher);
        modified.subsec_nanos().hash(&mut hasher);

        Ok(Dependency::new(path.to_string_lossy(), hasher.finish()))
    }
}

/// Ordered set of dependencies. Only ever appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    items: Vec<Dependency>,
}

impl DependencyList {
    /// Appends unless an identical dependency is already present
    pub fn add(&mut self, dependency: Dependency) {
        if self.items.contains(&dependency) {
            return;
        }

        trace!("Registered dependency {}", dependency.resource);
        self.items.push(dependency);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Dependency>) {
        for dependency in other {
            self.add(dependency);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Dependency> {
        self.items
    }
}

/// Resolves files named by `<jsp:directive.include>`
pub trait IncludeResolver {
    /// `from` is the file containing the directive
    fn resolve(&self, from: &str, path: &str) -> io::Result<Dependency>;
}

/// Resolver which refuses every include
#[derive(Debug, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, _from: &str, path: &str) -> io::Result<Dependency> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no include resolver configured for '{path}'"),
        ))
    }
}

/// Resolves includes against a document root on disk.
/// Absolute paths start at the root, relative ones at the including file.
#[derive(Debug)]
pub struct FsIncludeResolver {
    root: PathBuf,
}

impl FsIncludeResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsIncludeResolver { root: root.into() }
    }
}

impl IncludeResolver for FsIncludeResolver {
    fn resolve(&self, from: &str, path: &str) -> io::Result<Dependency> {
        let full_path = match path.strip_prefix('/') {
            Some(absolute) => self.root.join(absolute),
            None => {
                let from = Path::new(from);
                let from = if from.is_absolute() {
                    from.to_path_buf()
                } else {
                    self.root.join(from)
                };
                from.parent().unwrap_or(&self.root).join(path)
            }
        };

        Dependency::from_path(&full_path)
    }
}
