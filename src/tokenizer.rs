use std::fmt;

use crate::class::{classify, Class};
use crate::error::{Error, Result};
use crate::file::File;
use crate::schema::{NodeKind, SchemaNode};

/// Position of a token in its file. Lines and columns count from 1,
/// columns count bytes.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenPos {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl TokenPos {
    pub(crate) fn new() -> TokenPos {
        TokenPos {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    pub(crate) fn none() -> TokenPos {
        TokenPos {
            line: 0,
            column: 0,
            offset: 0,
        }
    }
}

/// What the parser is currently working on. Decides which identifiers
/// are eligible for schema resolution.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Context {
    File,
    Section,
    Option,
    Suboption,
    Include,
}

pub(crate) enum TokenKind<'a, U> {
    EndOfFile,
    Space,
    LineFeed,
    Comment,
    Section(&'a SchemaNode<U>),
    Option(&'a SchemaNode<U>),
    Suboption(&'a SchemaNode<U>),
    Include,
    Value,
    QuotedValue,
}

impl<U> Clone for TokenKind<'_, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for TokenKind<'_, U> {}

impl<U> fmt::Debug for TokenKind<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TokenKind::EndOfFile => write!(f, "EndOfFile"),
            TokenKind::Space => write!(f, "Space"),
            TokenKind::LineFeed => write!(f, "LineFeed"),
            TokenKind::Comment => write!(f, "Comment"),
            TokenKind::Section(node) => write!(f, "Section({})", node.pattern()),
            TokenKind::Option(node) => write!(f, "Option({})", node.pattern()),
            TokenKind::Suboption(node) => write!(f, "Suboption({})", node.pattern()),
            TokenKind::Include => write!(f, "Include"),
            TokenKind::Value => write!(f, "Value"),
            TokenKind::QuotedValue => write!(f, "QuotedValue"),
        }
    }
}

pub(crate) struct Token<'a, U> {
    pub(crate) kind: TokenKind<'a, U>,
    pub(crate) pos: TokenPos,
    /// Length in bytes. Excludes the ':' or '=' of an identifier.
    pub(crate) len: usize,
    /// First token on its line that is not leading space.
    pub(crate) head: bool,
}

impl<'a, U> Token<'a, U> {
    /// Zero-length space: the indentation of a line that has none.
    pub(crate) fn no_indent() -> Token<'a, U> {
        Token {
            kind: TokenKind::Space,
            pos: TokenPos::new(),
            len: 0,
            head: false,
        }
    }
}

impl<U> Clone for Token<'_, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Token<'_, U> {}

impl<U> fmt::Debug for Token<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &self.kind)
            .field("pos", &self.pos)
            .field("len", &self.len)
            .field("head", &self.head)
            .finish()
    }
}

/// Scanner state inside a quoted value.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Quote {
    Open { escaped: bool },
    Closed,
}

/// Scan the body of a quoted value starting at `start`, which is just past
/// the opening quote or wherever a previous call stopped.
///
/// Returns the offset where scanning stopped and the state to resume with.
/// When `Closed`, the offset is just past the closing quote. When still
/// `Open`, it points at the line feed or invalid byte that stopped the
/// scan, or at the end of the data.
pub(crate) fn scan_quoted(data: &[u8], start: usize, state: Quote) -> (usize, Quote) {
    let mut escaped = match state {
        Quote::Open { escaped } => escaped,
        Quote::Closed => return (start, state),
    };
    let mut i = start;
    while i < data.len() && classify(data[i]).is_printable() {
        if !escaped && data[i] == b'"' {
            return (i + 1, Quote::Closed);
        }
        escaped = data[i] == b'\\' && !escaped;
        i += 1;
    }
    (i, Quote::Open { escaped })
}

fn skip(data: &[u8], mut i: usize, want: impl Fn(Class) -> bool) -> usize {
    while i < data.len() && want(classify(data[i])) {
        i += 1;
    }
    i
}

/// Scan the next token at the file's current position.
///
/// Returns the token and the number of bytes it consumes, which includes
/// the delimiter of a resolved identifier.
pub(crate) fn scan<'a, U>(
    file: &File<'a, U>,
    ctx: Context,
    include: bool,
) -> Result<(Token<'a, U>, usize)> {
    let data = file.data();
    let pos = file.pos;
    let start = pos.offset;
    let head = file.line_start();
    let token = |kind, len| Token { kind, pos, len, head };

    if start == data.len() {
        return Ok((token(TokenKind::EndOfFile, 0), 0));
    }

    let first = data[start];
    if first == b'"' {
        let (end, state) = scan_quoted(data, start + 1, Quote::Open { escaped: false });
        if state == Quote::Closed {
            return Ok((token(TokenKind::QuotedValue, end - start), end - start));
        }
        let msg = match data.get(end) {
            Some(b'\n') => "line feed in quoted value",
            Some(_) => "invalid character in quoted value",
            None => "unterminated quoted value",
        };
        return Err(Error::syntax(msg, &file.name, pos));
    }

    let (kind, end) = match classify(first) {
        Class::Invalid => {
            return Err(Error::syntax(
                format!("invalid character 0x{:02x}", first),
                &file.name,
                pos,
            ));
        }
        Class::Space => (TokenKind::Space, skip(data, start + 1, |c| c == Class::Space)),
        Class::LineFeed => (TokenKind::LineFeed, start + 1),
        Class::Comment => (TokenKind::Comment, skip(data, start + 1, Class::is_printable)),
        Class::Identifier => {
            let end = skip(data, start + 1, |c| c == Class::Identifier);
            let name = &data[start..end];
            let resolved = match data.get(end) {
                Some(b':') if head => resolve_key(file, ctx, include, name),
                Some(b'=') => resolve_suboption(file, ctx, name),
                _ => None,
            };
            if let Some(kind) = resolved {
                return Ok((token(kind, end - start), end - start + 1));
            }
            (TokenKind::Value, skip(data, end, Class::is_literal))
        }
        Class::Value => (TokenKind::Value, skip(data, start + 1, Class::is_literal)),
    };

    Ok((token(kind, end - start), end - start))
}

// `name:` at the start of a line.
fn resolve_key<'a, U>(
    file: &File<'a, U>,
    ctx: Context,
    include: bool,
    name: &[u8],
) -> Option<TokenKind<'a, U>> {
    match ctx {
        Context::File | Context::Section | Context::Option => {}
        Context::Suboption | Context::Include => return None,
    }
    if include && name == b"include" {
        return Some(TokenKind::Include);
    }
    let node = file.key_scope()?.find_key(name)?;
    match node.kind() {
        NodeKind::Section => Some(TokenKind::Section(node)),
        _ => Some(TokenKind::Option(node)),
    }
}

// `name=` inside an option.
fn resolve_suboption<'a, U>(
    file: &File<'a, U>,
    ctx: Context,
    name: &[u8],
) -> Option<TokenKind<'a, U>> {
    if ctx != Context::Option {
        return None;
    }
    let schema = file.scope().schema;
    if schema.kind() != NodeKind::Option {
        return None;
    }
    schema.find_suboption(name).map(TokenKind::Suboption)
}
