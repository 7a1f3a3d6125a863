//! # File Store Layer
//!
//! The transfer engine reads and writes files through the [`FileStore`] trait, so the
//! import and export loops can be tested without touching disk.
//!
//! ## Implementations
//!
//! - [`fs::LocalStore`]: the real filesystem, rooted at the working directory
//! - [`memory::InMemoryStore`]: a path -> bytes map for testing
//!
//! ## Patterns
//!
//! Import patterns follow the usual shell convention: the directory part is
//! taken literally (relative to the store's base directory), and the file-name part may use
//! `*` (any run of characters) and `?` (exactly one character). Matches are returned sorted
//! so repeated runs send files in the same order.
//!
//! ## Output files
//!
//! [`FileStore::create_unique`] hands out a [`UniqueFile`], a writer for a freshly named file
//! in the base directory. Nothing is visible until [`UniqueFile::persist`] is called;
//! dropping the writer first discards what was written.

use crate::error::{MqError, Result};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod fs;
pub mod memory;

pub trait FileStore {
    type Output: UniqueFile;

    /// Expand `pattern` into the files it matches, sorted by path.
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Read a whole file.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create a new, uniquely named file in the base directory.
    fn create_unique(&mut self) -> Result<Self::Output>;
}

pub trait UniqueFile: Write {
    /// Keep the file and return its path.
    fn persist(self) -> Result<PathBuf>;
}

/// A pattern split into the directory to list and the matcher for file names in it.
#[derive(Debug)]
pub struct FilePattern {
    pub dir: PathBuf,
    matcher: Regex,
}

impl FilePattern {
    /// Split `pattern` against `base`. Returns `None` when the pattern names no file
    /// (e.g. `dir/`), which matches nothing.
    pub fn parse(pattern: &str, base: &Path) -> Result<Option<Self>> {
        let path = Path::new(pattern);
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        if pattern.ends_with('/') || pattern.ends_with(std::path::MAIN_SEPARATOR) {
            return Ok(None);
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => base.join(parent),
            _ => base.to_path_buf(),
        };
        let matcher = wildcard_regex(name)
            .map_err(|e| MqError::Pattern(format!("{}: {}", pattern, e)))?;

        Ok(Some(Self { dir, matcher }))
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.matcher.is_match(file_name)
    }
}

fn wildcard_regex(name: &str) -> std::result::Result<Regex, regex::Error> {
    let mut source = String::with_capacity(name.len() + 2);
    source.push('^');
    for c in name.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(p: &str) -> FilePattern {
        FilePattern::parse(p, Path::new("/work")).unwrap().unwrap()
    }

    #[test]
    fn test_plain_name_uses_base_dir() {
        let p = pattern("a.bin");
        assert_eq!(p.dir, PathBuf::from("/work"));
        assert!(p.matches("a.bin"));
        assert!(!p.matches("a.bins"));
        assert!(!p.matches("xa.bin"));
    }

    #[test]
    fn test_relative_dir_joins_base() {
        let p = pattern("data/*.xml");
        assert_eq!(p.dir, PathBuf::from("/work/data"));
        assert!(p.matches("order.xml"));
        assert!(!p.matches("order.xml.bak"));
    }

    #[test]
    fn test_absolute_dir_replaces_base() {
        let p = pattern("/tmp/in/*");
        assert_eq!(p.dir, PathBuf::from("/tmp/in"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        let p = pattern("msg?.txt");
        assert!(p.matches("msg1.txt"));
        assert!(!p.matches("msg12.txt"));
        assert!(!p.matches("msg.txt"));
    }

    #[test]
    fn test_regex_characters_are_literal() {
        let p = pattern("a+b(1).txt");
        assert!(p.matches("a+b(1).txt"));
        assert!(!p.matches("aab1.txt"));
    }

    #[test]
    fn test_trailing_separator_matches_nothing() {
        assert!(FilePattern::parse("data/", Path::new("/work"))
            .unwrap()
            .is_none());
    }
}
