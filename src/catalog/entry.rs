use std::fmt;
use std::path::{Path, PathBuf};

/// Where an example's text lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A program compiled into the binary, keyed by file name
    Bundled(String),
    /// A file read from disk at fetch time
    File(PathBuf),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Bundled(key) => write!(f, "bundled:{}", key),
            Locator::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleEntry {
    pub name: String,
    pub locator: Locator,
}

impl ExampleEntry {
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
        }
    }

    pub fn bundled(key: &str) -> Self {
        Self::new(key, Locator::Bundled(key.to_string()))
    }

    /// Entry named after the file's last path component
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = file_name(&path);
        Self::new(name, Locator::File(path))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_entry_is_named_after_last_component() {
        let entry = ExampleEntry::file("/srv/lox_files/linked_list.lox");
        assert_eq!(entry.name, "linked_list.lox");
        assert_eq!(
            entry.locator,
            Locator::File(PathBuf::from("/srv/lox_files/linked_list.lox"))
        );
    }

    #[test]
    fn locator_display() {
        assert_eq!(
            Locator::Bundled("hello.lox".to_string()).to_string(),
            "bundled:hello.lox"
        );
        assert_eq!(Locator::File(PathBuf::from("a/b.lox")).to_string(), "a/b.lox");
    }
}
