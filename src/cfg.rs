use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::file::File;
use crate::include::{Canonicalize, FileFinder, GlobFinder, PathResolver};
use crate::parser::Parser;
use crate::schema::Schema;

const DEFAULT_NAME: &str = "config-text";

/// Configuration parser builder.
///
/// ```
/// use indentconf::{Builder, Schema, SchemaNode};
///
/// let schema = Schema::new(vec![SchemaNode::section(
///     "zone",
///     vec![SchemaNode::option("file", vec![]).on_value(|_, value, files: &mut Vec<String>| {
///         files.push(value.as_str().into_owned());
///         Ok(())
///     })],
/// )])?;
///
/// let mut files = Vec::new();
/// Builder::new()
///     .name("inline")
///     .parse_str(&schema, "zone:\n  file: db.example.com\n", &mut files)?;
/// assert_eq!(files, vec!["db.example.com"]);
/// # Ok::<(), indentconf::Error>(())
/// ```
pub struct Builder {
    name: String,
    pub(crate) include: bool,
    pub(crate) finder: Box<dyn FileFinder>,
    pub(crate) resolver: Box<dyn PathResolver>,
}

impl Builder {
    /// Return a new builder.
    pub fn new() -> Builder {
        Builder {
            name: DEFAULT_NAME.to_string(),
            include: true,
            finder: Box::new(GlobFinder),
            resolver: Box::new(Canonicalize),
        }
    }

    /// Name used for in-memory input in errors and lexemes.
    pub fn name(mut self, name: impl Into<String>) -> Builder {
        self.name = name.into();
        self
    }

    /// Recognize `include:` directives (on by default).
    pub fn include(mut self, include: bool) -> Builder {
        self.include = include;
        self
    }

    /// Replace the wildcard expansion used for includes.
    pub fn finder(mut self, finder: impl FileFinder + 'static) -> Builder {
        self.finder = Box::new(finder);
        self
    }

    /// Replace the path canonicalization used to detect include loops.
    pub fn resolver(mut self, resolver: impl PathResolver + 'static) -> Builder {
        self.resolver = Box::new(resolver);
        self
    }

    /// Parse configuration text.
    pub fn parse_str<U>(&self, schema: &Schema<U>, text: &str, user: &mut U) -> Result<()> {
        self.parse_bytes(schema, text.as_bytes(), user)
    }

    /// Parse configuration bytes. They need not be valid UTF-8.
    pub fn parse_bytes<U>(&self, schema: &Schema<U>, data: &[u8], user: &mut U) -> Result<()> {
        let file = File::new(self.name.clone(), None, Cow::Borrowed(data), schema.root());
        Parser::new(self, file, user).parse()
    }

    /// Read and parse a configuration file.
    pub fn parse_file<U>(&self, schema: &Schema<U>, path: impl AsRef<Path>, user: &mut U) -> Result<()> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let canonical = self.resolver.resolve(path)?;
        let file = File::open(name, canonical, schema.root())?;
        Parser::new(self, file, user).parse()
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("name", &self.name)
            .field("include", &self.include)
            .finish()
    }
}

/// Parse configuration text with the default settings.
pub fn parse_str<U>(schema: &Schema<U>, text: &str, user: &mut U) -> Result<()> {
    Builder::new().parse_str(schema, text, user)
}

/// Parse configuration bytes with the default settings.
pub fn parse_bytes<U>(schema: &Schema<U>, data: &[u8], user: &mut U) -> Result<()> {
    Builder::new().parse_bytes(schema, data, user)
}

/// Read and parse a configuration file with the default settings.
pub fn parse_file<U>(schema: &Schema<U>, path: impl AsRef<Path>, user: &mut U) -> Result<()> {
    Builder::new().parse_file(schema, path, user)
}
