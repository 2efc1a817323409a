//! Byte sources a provider can load class files from: a directory
//! root, a jar-style archive, or an ordered classpath of either.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;
use zip::ZipArchive;

/// Maps a class name to the raw bytes of its class file.
///
/// A source that cannot supply the class, for whatever reason,
/// answers `None`; callers cannot tell "missing" from "unreadable".
pub trait ClassSource {
    fn class_bytes(&self, class_name: &str) -> Option<Vec<u8>>;
}

/// Loads `<root>/<class name>.class` from a directory tree.
#[derive(Debug)]
pub struct DirectoryClassSource {
    root: PathBuf,
}

impl DirectoryClassSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ClassSource for DirectoryClassSource {
    fn class_bytes(&self, class_name: &str) -> Option<Vec<u8>> {
        let path = self.root.join(format!("{class_name}.class"));
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                debug!(class = class_name, path = %path.display(), %err, "class file not readable");
                None
            }
        }
    }
}

/// Loads `<class name>.class` entries out of a zip archive, e.g. a
/// jar. The archive handle seeks, so lookups serialise on a lock.
pub struct JarClassSource<R = File> {
    archive: Mutex<ZipArchive<R>>,
}

impl JarClassSource<File> {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file).map_err(std::io::Error::other)?;
        Ok(Self::new(archive))
    }
}

impl<R: Read + Seek> JarClassSource<R> {
    pub fn new(archive: ZipArchive<R>) -> Self {
        Self {
            archive: Mutex::new(archive),
        }
    }
}

impl<R: Read + Seek> ClassSource for JarClassSource<R> {
    fn class_bytes(&self, class_name: &str) -> Option<Vec<u8>> {
        let mut archive = self.archive.lock();
        let mut entry = match archive.by_name(&format!("{class_name}.class")) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(class = class_name, %err, "no archive entry");
                return None;
            }
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        match entry.read_to_end(&mut bytes) {
            Ok(_) => Some(bytes),
            Err(err) => {
                debug!(class = class_name, %err, "archive entry not readable");
                None
            }
        }
    }
}

/// An ordered list of sources, searched first to last, the way a
/// class loader walks its classpath.
#[derive(Default)]
pub struct ClasspathSource {
    sources: Vec<Box<dyn ClassSource + Send + Sync>>,
}

impl ClasspathSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl ClassSource + Send + Sync + 'static) {
        self.sources.push(Box::new(source));
    }
}

impl ClassSource for ClasspathSource {
    fn class_bytes(&self, class_name: &str) -> Option<Vec<u8>> {
        self.sources
            .iter()
            .find_map(|source| source.class_bytes(class_name))
    }
}
