use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

/// An auxiliary file (image, stylesheet) that the HTML may reference.
///
/// Bytes are read from disk on first access and kept for the lifetime of the
/// value.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    path: PathBuf,
    bytes: OnceCell<Vec<u8>>,
}

impl ResourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ResourceFile { path: path.into(), bytes: OnceCell::new() }
    }
    /// A resource whose contents are already in memory.
    pub fn with_bytes(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        ResourceFile { path: path.into(), bytes: OnceCell::with_value(bytes.into()) }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn bytes(&self) -> std::io::Result<&[u8]> {
        self.bytes
            .get_or_try_init(|| {
                log::debug!("reading resource {:?}", self.path);
                std::fs::read(&self.path)
            })
            .map(Vec::as_slice)
    }
    /// The contents decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> std::io::Result<String> {
        self.bytes().map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Files are identified by their path alone.
impl PartialEq for ResourceFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ResourceFile {}

/// Resource files in archive enumeration order.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    files: Vec<ResourceFile>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, file: ResourceFile) {
        self.files.push(file);
    }
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceFile> {
        self.files.iter()
    }
    pub fn len(&self) -> usize {
        self.files.len()
    }
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(ResourceFile::path)
    }
    /// Recomputed on every call; resource sets are small and short-lived.
    pub fn base_directory(&self) -> PathBuf {
        crate::path_utils::common_base_directory(self.paths())
    }
}

impl FromIterator<ResourceFile> for ResourceSet {
    fn from_iter<T: IntoIterator<Item = ResourceFile>>(iter: T) -> Self {
        ResourceSet { files: iter.into_iter().collect() }
    }
}

impl FromIterator<PathBuf> for ResourceSet {
    fn from_iter<T: IntoIterator<Item = PathBuf>>(iter: T) -> Self {
        iter.into_iter().map(ResourceFile::new).collect()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceFile;
    type IntoIter = std::slice::Iter<'a, ResourceFile>;
    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
