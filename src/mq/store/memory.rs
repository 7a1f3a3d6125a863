use super::{FilePattern, FileStore, UniqueFile};
use crate::error::{MqError, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// In-memory file store for testing.
///
/// Clones share the same files. Paths are kept as given; a directory "exists" when at
/// least one file lives in it (the base directory always exists).
#[derive(Clone)]
pub struct InMemoryStore {
    base: PathBuf,
    files: Rc<RefCell<BTreeMap<PathBuf, Vec<u8>>>>,
    next_id: Rc<Cell<u64>>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            files: Rc::default(),
            next_id: Rc::new(Cell::new(1)),
            fail_writes: false,
        }
    }

    /// Add a file, relative paths land under the base directory.
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        let path = self.base.join(path);
        self.files.borrow_mut().insert(path, content.into());
        self
    }

    /// Make every write to a new unique file fail.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    /// All files, sorted by path.
    pub fn files(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.files
            .borrow()
            .iter()
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect()
    }

    fn dir_exists(&self, dir: &Path) -> bool {
        dir == self.base.as_path()
            || self
                .files
                .borrow()
                .keys()
                .any(|p| p.parent() == Some(dir))
    }
}

impl FileStore for InMemoryStore {
    type Output = MemoryFile;

    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let Some(pattern_spec) = FilePattern::parse(pattern, &self.base)? else {
            return Ok(Vec::new());
        };
        if !self.dir_exists(&pattern_spec.dir) {
            return Err(MqError::Pattern(format!(
                "{}: {}: no such directory",
                pattern,
                pattern_spec.dir.display()
            )));
        }

        let matched = self
            .files
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(pattern_spec.dir.as_path()))
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| pattern_spec.matches(&n.to_string_lossy()))
            })
            .cloned()
            .collect();
        Ok(matched)
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        self.get(path).ok_or_else(|| {
            MqError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    fn create_unique(&mut self) -> Result<MemoryFile> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(MemoryFile {
            path: self.base.join(format!("tmp{:04}.tmp", id)),
            buffer: Vec::new(),
            files: Rc::clone(&self.files),
            fail_writes: self.fail_writes,
        })
    }
}

pub struct MemoryFile {
    path: PathBuf,
    buffer: Vec<u8>,
    files: Rc<RefCell<BTreeMap<PathBuf, Vec<u8>>>>,
    fail_writes: bool,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::other("disk full"));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl UniqueFile for MemoryFile {
    fn persist(self) -> Result<PathBuf> {
        self.files
            .borrow_mut()
            .insert(self.path.clone(), self.buffer);
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_matches_in_base() {
        let store = InMemoryStore::new("/work")
            .with_file("b.xml", "b")
            .with_file("a.xml", "a")
            .with_file("c.txt", "c")
            .with_file("sub/d.xml", "d");
        let matched = store.expand("*.xml").unwrap();
        assert_eq!(
            matched,
            vec![PathBuf::from("/work/a.xml"), PathBuf::from("/work/b.xml")]
        );
    }

    #[test]
    fn test_expand_unknown_directory() {
        let store = InMemoryStore::new("/work");
        assert!(store.expand("*.xml").unwrap().is_empty());
        assert!(matches!(store.expand("nope/*.xml"), Err(MqError::Pattern(_))));
    }

    #[test]
    fn test_unique_file_visible_after_persist() {
        let mut store = InMemoryStore::new("/work");
        let mut out = store.create_unique().unwrap();
        out.write_all(b"data").unwrap();
        assert!(store.files().is_empty());

        let path = out.persist().unwrap();
        assert_eq!(store.get(&path), Some(b"data".to_vec()));
    }

    #[test]
    fn test_failing_writes() {
        let mut store = InMemoryStore::new("/work").failing_writes();
        let mut out = store.create_unique().unwrap();
        assert!(out.write_all(b"data").is_err());
    }
}
