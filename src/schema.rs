use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, ErrorKind, Result};
use crate::tokenizer::TokenPos;

/// Schema node variant.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// `name:` followed by indented sections and options.
    Section,
    /// `name:` followed by values and suboptions.
    Option,
    /// `name=value` on an option's line.
    Suboption,
}

/// Callback invoked on scope entry, scope exit, or for each value.
pub type Callback<U> = Box<dyn Fn(&SchemaNode<U>, &Lexeme<'_>, &mut U) -> Result<()>>;

/// A matched piece of input, as handed to callbacks.
#[derive(Debug, Clone, Copy)]
pub struct Lexeme<'a> {
    /// Name of the file the text was read from.
    pub file: &'a str,
    /// Where the token starts. For quoted values, the opening quote.
    pub pos: TokenPos,
    /// Just past the token's last byte. Tokens never span lines.
    pub end: TokenPos,
    /// Raw text. For quoted values the quotes are stripped but escapes
    /// are left in place.
    pub text: &'a [u8],
    pub quoted: bool,
}

impl<'a> Lexeme<'a> {
    /// Text as a string, lossy for non UTF-8 input.
    pub fn as_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.text)
    }

    /// Text with backslash escapes removed.
    ///
    /// A backslash protects the byte that follows it, no other escape
    /// sequences exist.
    pub fn unescape(&self) -> Cow<'a, [u8]> {
        if !self.quoted || !self.text.contains(&b'\\') {
            return Cow::Borrowed(self.text);
        }
        let mut r = Vec::with_capacity(self.text.len());
        let mut escaped = false;
        for &b in self.text {
            if b == b'\\' && !escaped {
                escaped = true;
                continue;
            }
            escaped = false;
            r.push(b);
        }
        Cow::Owned(r)
    }
}

/// A node in the schema tree the parser resolves identifiers against.
///
/// The pattern is a regular expression that must match a whole identifier,
/// so `peer[0-9]+` accepts `peer1:` and `peer22:`. A plain name matches
/// only itself. Identifiers are runs of ASCII letters and digits.
///
/// `U` is the type of the user data threaded through every callback.
pub struct SchemaNode<U> {
    kind: NodeKind,
    pattern: String,
    // compiled by `Schema::new` for patterns that are not plain names.
    regex: Option<Regex>,
    children: Vec<SchemaNode<U>>,
    pub(crate) enter: Option<Callback<U>>,
    pub(crate) exit: Option<Callback<U>>,
    pub(crate) value: Option<Callback<U>>,
}

impl<U> SchemaNode<U> {
    fn new(kind: NodeKind, pattern: impl Into<String>, children: Vec<SchemaNode<U>>) -> Self {
        SchemaNode {
            kind,
            pattern: pattern.into(),
            regex: None,
            children,
            enter: None,
            exit: None,
            value: None,
        }
    }

    /// A section containing sections and options.
    pub fn section(pattern: impl Into<String>, children: Vec<SchemaNode<U>>) -> Self {
        SchemaNode::new(NodeKind::Section, pattern, children)
    }

    /// An option with its suboptions.
    pub fn option(pattern: impl Into<String>, suboptions: Vec<SchemaNode<U>>) -> Self {
        SchemaNode::new(NodeKind::Option, pattern, suboptions)
    }

    pub fn suboption(pattern: impl Into<String>) -> Self {
        SchemaNode::new(NodeKind::Suboption, pattern, Vec::new())
    }

    pub fn on_enter<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaNode<U>, &Lexeme<'_>, &mut U) -> Result<()> + 'static,
    {
        self.enter = Some(Box::new(f));
        self
    }

    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaNode<U>, &Lexeme<'_>, &mut U) -> Result<()> + 'static,
    {
        self.exit = Some(Box::new(f));
        self
    }

    pub fn on_value<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaNode<U>, &Lexeme<'_>, &mut U) -> Result<()> + 'static,
    {
        self.value = Some(Box::new(f));
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn children(&self) -> &[SchemaNode<U>] {
        &self.children
    }

    fn matches(&self, name: &[u8]) -> bool {
        match self.regex {
            Some(ref re) => std::str::from_utf8(name).map_or(false, |name| re.is_match(name)),
            None => self.pattern.as_bytes() == name,
        }
    }

    // Section or option directly below this node. The first match in
    // declaration order wins.
    pub(crate) fn find_key(&self, name: &[u8]) -> Option<&SchemaNode<U>> {
        self.children
            .iter()
            .find(|c| c.kind != NodeKind::Suboption && c.matches(name))
    }

    pub(crate) fn find_suboption(&self, name: &[u8]) -> Option<&SchemaNode<U>> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::Suboption && c.matches(name))
    }

    fn compile(&mut self, path: &str) -> Result<()> {
        let mut seen = HashSet::new();
        let kind = self.kind;
        for child in &mut self.children {
            let allowed = match kind {
                NodeKind::Section => child.kind != NodeKind::Suboption,
                NodeKind::Option => child.kind == NodeKind::Suboption,
                NodeKind::Suboption => false,
            };
            let child_path = if path.is_empty() {
                child.pattern.clone()
            } else {
                format!("{}.{}", path, child.pattern)
            };
            if !allowed {
                return Err(Error::new(
                    ErrorKind::BadParameter,
                    format!("{}: {:?} not allowed here", child_path, child.kind),
                ));
            }
            if child.pattern.is_empty() {
                return Err(Error::new(
                    ErrorKind::BadParameter,
                    format!("empty pattern below '{}'", path),
                ));
            }
            if !seen.insert(child.pattern.clone()) {
                return Err(Error::new(
                    ErrorKind::BadParameter,
                    format!("{}: duplicate pattern", child_path),
                ));
            }
            if !is_name(&child.pattern) {
                let re = Regex::new(&format!("^(?:{})$", child.pattern)).map_err(|e| {
                    Error::new(
                        ErrorKind::BadParameter,
                        format!("{}: invalid pattern: {}", child_path, e),
                    )
                })?;
                child.regex = Some(re);
            }
            child.compile(&child_path)?;
        }
        Ok(())
    }
}

impl<U> fmt::Debug for SchemaNode<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern)
            .field("children", &self.children)
            .finish()
    }
}

// Patterns that are plain identifiers are compared byte for byte.
fn is_name(s: &str) -> bool {
    static RE_NAME: Lazy<Regex> = Lazy::new(|| {
        let re = r"^[A-Za-z][A-Za-z0-9]*$";
        Regex::new(re).expect("could not compile RE_NAME regexp")
    });
    RE_NAME.is_match(s)
}

/// A validated schema.
///
/// The top-level nodes are wrapped in a nameless root section.
#[derive(Debug)]
pub struct Schema<U> {
    root: SchemaNode<U>,
}

impl<U> Schema<U> {
    pub fn new(nodes: Vec<SchemaNode<U>>) -> Result<Schema<U>> {
        let mut root = SchemaNode::section("", nodes);
        root.compile("")?;
        Ok(Schema { root })
    }

    pub fn root(&self) -> &SchemaNode<U> {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexeme(text: &[u8], quoted: bool) -> Lexeme<'_> {
        Lexeme { file: "test", pos: TokenPos::new(), end: TokenPos::new(), text, quoted }
    }

    #[test]
    fn valid_schema() {
        let schema: Result<Schema<()>> = Schema::new(vec![SchemaNode::section(
            "zone",
            vec![
                SchemaNode::option("file", vec![]),
                SchemaNode::option("class", vec![SchemaNode::suboption("internal")]),
                SchemaNode::section("acl2", vec![]),
            ],
        )]);
        let schema = schema.unwrap();
        let zone = &schema.root().children()[0];
        assert_eq!(zone.kind(), NodeKind::Section);
        assert_eq!(zone.find_key(b"class").map(|n| n.pattern()), Some("class"));
        assert!(zone.find_key(b"internal").is_none());
        let class = zone.find_key(b"class").unwrap();
        assert!(class.find_suboption(b"internal").is_some());
        assert!(class.find_suboption(b"intern").is_none());
    }

    #[test]
    fn regex_patterns() {
        let schema = Schema::<()>::new(vec![SchemaNode::section(
            "peers",
            vec![
                SchemaNode::option("peer0", vec![]),
                SchemaNode::option("peer[0-9]+", vec![SchemaNode::suboption("weight|prio")]),
                SchemaNode::section("[a-z]+Group", vec![]),
            ],
        )])
        .unwrap();
        let peers = &schema.root().children()[0];
        let pattern = |name: &[u8]| peers.find_key(name).map(|n| n.pattern());
        // declaration order decides.
        assert_eq!(pattern(b"peer0"), Some("peer0"));
        assert_eq!(pattern(b"peer1"), Some("peer[0-9]+"));
        assert_eq!(pattern(b"peer22"), Some("peer[0-9]+"));
        assert_eq!(pattern(b"peerx"), None);
        // anchored at both ends.
        assert_eq!(pattern(b"xpeer1"), None);
        assert_eq!(pattern(b"peer1x"), None);
        assert_eq!(pattern(b"mailGroup"), Some("[a-z]+Group"));
        let peer = peers.find_key(b"peer7").unwrap();
        assert!(peer.find_suboption(b"weight").is_some());
        assert!(peer.find_suboption(b"prio").is_some());
        assert!(peer.find_suboption(b"weightprio").is_none());
    }

    #[test]
    fn invalid_schema() {
        let bad = |nodes: Vec<SchemaNode<()>>| Schema::new(nodes).unwrap_err().kind;
        assert_eq!(bad(vec![SchemaNode::suboption("top")]), ErrorKind::BadParameter);
        assert_eq!(
            bad(vec![SchemaNode::option("o", vec![SchemaNode::option("p", vec![])])]),
            ErrorKind::BadParameter
        );
        assert_eq!(bad(vec![SchemaNode::option("peer[0-9", vec![])]), ErrorKind::BadParameter);
        assert_eq!(bad(vec![SchemaNode::option("", vec![])]), ErrorKind::BadParameter);
        assert_eq!(
            bad(vec![SchemaNode::option("a", vec![]), SchemaNode::section("a", vec![])]),
            ErrorKind::BadParameter
        );
        let e = Schema::<()>::new(vec![SchemaNode::section(
            "zone",
            vec![SchemaNode::suboption("x")],
        )])
        .unwrap_err();
        assert!(e.msg.starts_with("zone.x:"), "{}", e.msg);
        let e = Schema::<()>::new(vec![SchemaNode::option("a(", vec![])]).unwrap_err();
        assert!(e.msg.starts_with("a(: invalid pattern"), "{}", e.msg);
    }

    #[test]
    fn unescape() {
        assert_eq!(&*lexeme(br#"a \"b\" c"#, true).unescape(), b"a \"b\" c");
        assert_eq!(&*lexeme(br#"a\\b"#, true).unescape(), b"a\\b");
        assert_eq!(&*lexeme(br#"a\b"#, false).unescape(), b"a\\b");
        assert_eq!(lexeme(b"IN", false).as_str(), "IN");
    }
}
