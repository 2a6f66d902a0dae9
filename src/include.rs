use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};

/// File type of a search result.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FileKind {
    Regular,
    Directory,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct FoundFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// Expands wildcard filespecs for `include:`.
///
/// `find` opens a search, the iterator yields matches until the search is
/// exhausted and dropping it closes the search.
pub trait FileFinder {
    fn find<'f>(&'f self, filespec: &Path)
        -> Result<Box<dyn Iterator<Item = Result<FoundFile>> + 'f>>;
}

/// Turns a file name into the canonical path used to detect include loops.
pub trait PathResolver {
    fn resolve(&self, path: &Path) -> Result<PathBuf>;
}

/// Wildcard expansion with the `glob` crate: `*` and `?` in the last
/// component only, sorted by name. The directory part and any `[` or `]`
/// are taken literally.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobFinder;

impl FileFinder for GlobFinder {
    fn find<'f>(&'f self, filespec: &Path)
        -> Result<Box<dyn Iterator<Item = Result<FoundFile>> + 'f>>
    {
        let name = match filespec.file_name().and_then(|n| n.to_str()) {
            Some(name) if !filespec.to_string_lossy().ends_with('/') => name,
            _ => {
                return Err(Error::new(
                    ErrorKind::BadParameter,
                    format!("{}: no file name", filespec.display()),
                ));
            }
        };
        let pattern = glob::Pattern::new(&literal_brackets(name))
            .map_err(|e| Error::new(ErrorKind::BadParameter, format!("{}: {}", name, e.msg)))?;

        let dir = match filespec.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let meta = fs::metadata(dir).map_err(|e| Error::io(&e, dir.display()))?;
        if !meta.is_dir() {
            return Err(Error::new(
                ErrorKind::NoSuchFile,
                format!("{}: not a directory", dir.display()),
            ));
        }
        let entries = fs::read_dir(dir).map_err(|e| Error::io(&e, dir.display()))?;

        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&e, dir.display()))?;
            if !pattern.matches_with(&entry.file_name().to_string_lossy(), options) {
                continue;
            }
            let path = entry.path();
            let kind = match fs::metadata(&path) {
                Ok(m) if m.is_file() => FileKind::Regular,
                Ok(m) if m.is_dir() => FileKind::Directory,
                _ => FileKind::Unknown,
            };
            found.push(FoundFile { path, kind });
        }
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Box::new(found.into_iter().map(Ok)))
    }
}

// Only `*` and `?` are wildcards in a filespec.
fn literal_brackets(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '[' | ']' => {
                pattern.push('[');
                pattern.push(c);
                pattern.push(']');
            }
            _ => pattern.push(c),
        }
    }
    pattern
}

/// Resolves names with `std::fs::canonicalize`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Canonicalize;

impl PathResolver for Canonicalize {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).map_err(|e| Error::io(&e, path.display()))
    }
}

/// Filespec needs expanding.
pub(crate) fn is_wildcard(filespec: &str) -> bool {
    filespec.contains(&['*', '?'][..])
}

/// Resolve a relative filespec against the directory of the including file.
pub(crate) fn relative_to(filespec: &str, includer: Option<&Path>) -> PathBuf {
    let path = Path::new(filespec);
    if path.is_relative() {
        if let Some(parent) = includer.and_then(|p| p.parent()) {
            return parent.join(path);
        }
    }
    path.to_path_buf()
}
