use std::borrow::Cow;
use std::fs;
use std::iter;
use std::mem;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::schema::{Lexeme, NodeKind, SchemaNode};
use crate::scope::{in_scope, is_indent, Nesting, Scope};
use crate::tokenizer::{self, Context, Token, TokenKind, TokenPos};
use crate::tokens::{TokenBuffer, TokenIndex, NO_INDENT};

/// One input: an in-memory string or a file read from disk.
pub(crate) struct File<'a, U> {
    pub(crate) name: String,
    /// Canonical path, `None` for in-memory input.
    pub(crate) path: Option<PathBuf>,
    data: Cow<'a, [u8]>,
    pub(crate) pos: TokenPos,
    tokens: TokenBuffer<'a, U>,
    root: Scope<'a, U>,
    scopes: Vec<Scope<'a, U>>,
    // leading space token of the current line
    line_indent: TokenIndex,
    line_start: bool,
}

impl<'a, U> File<'a, U> {
    pub(crate) fn new(
        name: String,
        path: Option<PathBuf>,
        data: Cow<'a, [u8]>,
        schema: &'a SchemaNode<U>,
    ) -> File<'a, U> {
        File {
            name,
            path,
            data,
            pos: TokenPos::new(),
            tokens: TokenBuffer::new(),
            root: Scope::root(schema),
            scopes: Vec::new(),
            line_indent: NO_INDENT,
            line_start: true,
        }
    }

    /// Read a file in full.
    pub(crate) fn open(name: String, path: PathBuf, schema: &'a SchemaNode<U>) -> Result<File<'a, U>> {
        let data = fs::read(&path).map_err(|e| Error::io(&e, &name))?;
        debug!("opened {} ({} bytes)", name, data.len());
        Ok(File::new(name, Some(path), Cow::Owned(data), schema))
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn line_start(&self) -> bool {
        self.line_start
    }

    pub(crate) fn line_indent(&self) -> TokenIndex {
        self.line_indent
    }

    /// Text of a buffered token.
    pub(crate) fn bytes(&self, at: TokenIndex) -> &[u8] {
        let token = self.tokens.get(at);
        &self.data[token.pos.offset..token.pos.offset + token.len]
    }

    pub(crate) fn lexeme(&self, at: TokenIndex) -> Lexeme<'_> {
        let token = self.tokens.get(at);
        let (start, end, quoted) = match token.kind {
            TokenKind::QuotedValue => (token.pos.offset + 1, token.pos.offset + token.len - 1, true),
            _ => (token.pos.offset, token.pos.offset + token.len, false),
        };
        let end_pos = TokenPos {
            line: token.pos.line,
            column: token.pos.column + token.len as u32,
            offset: token.pos.offset + token.len,
        };
        Lexeme {
            file: &self.name,
            pos: token.pos,
            end: end_pos,
            text: &self.data[start..end],
            quoted,
        }
    }

    /// Innermost open scope.
    pub(crate) fn scope(&self) -> &Scope<'a, U> {
        self.scopes.last().unwrap_or(&self.root)
    }

    fn scope_mut(&mut self) -> &mut Scope<'a, U> {
        match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.root,
        }
    }

    pub(crate) fn push_scope(&mut self, scope: Scope<'a, U>) {
        self.scopes.push(scope);
    }

    /// Close the innermost scope. The file's own scope is never popped.
    pub(crate) fn pop_scope(&mut self) -> Option<Scope<'a, U>> {
        self.scopes.pop()
    }

    /// Hand out the next token, scanning a new one if none was pushed back.
    pub(crate) fn shift(&mut self, ctx: Context, include: bool) -> Result<(TokenIndex, Token<'a, U>)> {
        if let Some(next) = self.tokens.next() {
            return Ok(next);
        }

        let (token, n) = tokenizer::scan(self, ctx, include)?;
        trace!("{}:{}:{}: {:?} in {:?}", self.name, token.pos.line, token.pos.column, token.kind, ctx);

        let line_feed = match token.kind {
            TokenKind::LineFeed => {
                let previous = mem::replace(&mut self.line_indent, NO_INDENT);
                self.release(previous);
                true
            }
            TokenKind::Space | TokenKind::Comment | TokenKind::EndOfFile => false,
            _ => {
                self.line_start = false;
                false
            }
        };
        let leading_space = self.line_start && matches!(token.kind, TokenKind::Space);

        self.pos.offset += n;
        if line_feed {
            self.pos.line += 1;
            self.pos.column = 1;
            self.line_start = true;
        } else {
            self.pos.column += n as u32;
        }

        let at = self.tokens.push(token)?;
        if leading_space {
            self.line_indent = at;
        }
        Ok((at, token))
    }

    /// Push back the last token handed out.
    pub(crate) fn unshift(&mut self) {
        self.tokens.unshift();
    }

    /// Drop a token unless the current line or an open scope still
    /// refers to it.
    pub(crate) fn release(&mut self, at: TokenIndex) {
        if at == NO_INDENT || at == self.line_indent || self.scopes.iter().any(|s| s.refers_to(at)) {
            return;
        }
        self.tokens.reduce(at);
        if self.line_indent > at {
            self.line_indent -= 1;
        }
        for scope in &mut self.scopes {
            scope.rebase(at);
        }
    }

    /// Release the tokens a closed scope was holding on to.
    pub(crate) fn release_scope(&mut self, scope: &Scope<'a, U>) {
        for at in scope.held() {
            self.release(at);
        }
    }

    /// Number of tokens currently buffered.
    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.tokens.len()
    }

    /// Relate the current line's indentation to the innermost scope.
    ///
    /// The first line deeper than the scope's own line fixes the
    /// indentation of its children.
    pub(crate) fn nesting(&mut self, pos: TokenPos) -> Result<Nesting> {
        let line = self.line_indent;
        let (indent, outer) = {
            let scope = self.scope();
            (scope.indent, scope.outer_indent)
        };
        match indent {
            Some(fixed) => {
                let nesting = in_scope(self.bytes(fixed), self.bytes(line));
                if nesting == Nesting::Equal && self.bytes(fixed) != self.bytes(line) {
                    return Err(Error::syntax("inconsistent indentation", &self.name, pos));
                }
                Ok(nesting)
            }
            None => {
                let (outer, candidate) = (self.bytes(outer), self.bytes(line));
                if candidate.len() <= outer.len() {
                    return Ok(Nesting::Outer);
                }
                if !is_indent(outer, candidate) {
                    return Err(Error::syntax("inconsistent indentation", &self.name, pos));
                }
                self.scope_mut().indent = Some(line);
                Ok(Nesting::Equal)
            }
        }
    }

    /// A line that left the innermost scope must line up with one of the
    /// enclosing scopes.
    pub(crate) fn dedent_is_valid(&self) -> bool {
        let line = self.bytes(self.line_indent);
        let enclosing = self.scopes.iter().rev().skip(1).chain(iter::once(&self.root));
        for scope in enclosing {
            if let Some(fixed) = scope.indent {
                let fixed = self.bytes(fixed);
                match in_scope(fixed, line) {
                    Nesting::Outer => continue,
                    Nesting::Equal => return fixed == line,
                    Nesting::Inner => return false,
                }
            }
        }
        false
    }

    /// Section whose children the current line's indentation places it
    /// among, if any.
    pub(crate) fn key_scope(&self) -> Option<&'a SchemaNode<U>> {
        let line = self.bytes(self.line_indent);
        for scope in self.scopes.iter().rev().chain(iter::once(&self.root)) {
            if scope.schema.kind() != NodeKind::Section {
                continue;
            }
            let nesting = match scope.indent {
                Some(fixed) => in_scope(self.bytes(fixed), line),
                None if line.len() > self.bytes(scope.outer_indent).len() => Nesting::Equal,
                None => Nesting::Outer,
            };
            match nesting {
                Nesting::Equal => return Some(scope.schema),
                Nesting::Inner => return None,
                Nesting::Outer => {}
            }
        }
        None
    }
}
