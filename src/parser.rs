use std::iter;
use std::mem;
use std::path::Path;

use crate::cfg::Builder;
use crate::error::{Error, ErrorKind, Result};
use crate::file::File;
use crate::include::{is_wildcard, relative_to, FileKind};
use crate::schema::{Callback, SchemaNode};
use crate::scope::{Nesting, Scope};
use crate::tokenizer::{Context, Token, TokenKind, TokenPos};
use crate::tokens::TokenIndex;

/// Recursive descent over one input and everything it includes.
pub(crate) struct Parser<'a, U> {
    builder: &'a Builder,
    // the file being parsed, its includers are on the stack.
    file: File<'a, U>,
    includers: Vec<File<'a, U>>,
    user: &'a mut U,
}

impl<'a, U> Parser<'a, U> {
    pub(crate) fn new(builder: &'a Builder, file: File<'a, U>, user: &'a mut U) -> Parser<'a, U> {
        Parser {
            builder,
            file,
            includers: Vec::new(),
            user,
        }
    }

    pub(crate) fn parse(mut self) -> Result<()> {
        debug!("parsing {}", self.file.name);
        self.parse_file()
    }

    fn shift(&mut self, ctx: Context) -> Result<(TokenIndex, Token<'a, U>)> {
        self.file.shift(ctx, self.builder.include)
    }

    fn syntax(&self, msg: impl Into<String>, token: &Token<'a, U>) -> Error {
        Error::syntax(msg, &self.file.name, token.pos)
    }

    fn semantic(&self, msg: impl Into<String>, token: &Token<'a, U>) -> Error {
        Error::semantic(msg, &self.file.name, token.pos)
    }

    // Errors from the file finder and path resolver carry no location.
    fn locate(&self, e: Error, pos: TokenPos) -> Error {
        if e.file_name.is_empty() {
            e.at(&self.file.name, pos)
        } else {
            e
        }
    }

    fn invoke(&mut self, callback: Option<&Callback<U>>, node: &SchemaNode<U>, at: TokenIndex) -> Result<()> {
        if let Some(callback) = callback {
            let lexeme = self.file.lexeme(at);
            callback(node, &lexeme, &mut *self.user)?;
        }
        Ok(())
    }

    fn enter_scope(&mut self, node: &'a SchemaNode<U>, at: TokenIndex) -> Result<()> {
        debug!("enter {:?} {}", node.kind(), node.pattern());
        let scope = Scope::new(node, at, self.file.line_indent());
        self.file.push_scope(scope);
        self.invoke(node.enter.as_ref(), node, at)
    }

    fn exit_scope(&mut self) -> Result<()> {
        // the file's own scope is synthetic and has no callbacks.
        let scope = match self.file.pop_scope() {
            Some(scope) => scope,
            None => return Ok(()),
        };
        debug!("exit {:?} {}", scope.schema.kind(), scope.schema.pattern());
        let result = self.invoke(scope.schema.exit.as_ref(), scope.schema, scope.identifier);
        self.file.release_scope(&scope);
        result
    }

    fn accept_value(&mut self, at: TokenIndex) -> Result<()> {
        let node = self.file.scope().schema;
        self.invoke(node.value.as_ref(), node, at)?;
        self.file.release(at);
        Ok(())
    }

    /// Parse the current file up to its end.
    fn parse_file(&mut self) -> Result<()> {
        loop {
            let (at, token) = self.shift(Context::File)?;
            match token.kind {
                TokenKind::EndOfFile => return self.exit_scope(),
                TokenKind::Space | TokenKind::LineFeed | TokenKind::Comment => self.file.release(at),
                _ => {
                    if token.head && self.file.nesting(token.pos)? != Nesting::Equal {
                        return Err(self.semantic("indentation not allowed at top level", &token));
                    }
                    self.parse_member(at, token)?;
                }
            }
        }
    }

    // A line that belongs to the current section or file.
    fn parse_member(&mut self, at: TokenIndex, token: Token<'a, U>) -> Result<()> {
        match token.kind {
            TokenKind::Section(node) => {
                self.enter_scope(node, at)?;
                self.parse_section()
            }
            TokenKind::Option(node) => {
                self.enter_scope(node, at)?;
                self.parse_option()
            }
            TokenKind::Include => {
                self.file.release(at);
                self.parse_include()
            }
            TokenKind::Suboption(node) => {
                Err(self.semantic(format!("suboption {} outside of option", node.pattern()), &token))
            }
            _ => Err(self.semantic("unexpected literal", &token)),
        }
    }

    fn parse_section(&mut self) -> Result<()> {
        loop {
            let (at, token) = self.shift(Context::Section)?;
            match token.kind {
                TokenKind::EndOfFile => {
                    self.file.unshift();
                    return self.exit_scope();
                }
                TokenKind::Space | TokenKind::LineFeed | TokenKind::Comment => self.file.release(at),
                _ if token.head => match self.file.nesting(token.pos)? {
                    Nesting::Equal => self.parse_member(at, token)?,
                    Nesting::Outer => {
                        if !self.file.dedent_is_valid() {
                            return Err(self.syntax("invalid indentation", &token));
                        }
                        self.file.unshift();
                        return self.exit_scope();
                    }
                    Nesting::Inner => return Err(self.syntax("invalid indentation", &token)),
                },
                _ => return Err(self.semantic("unexpected literal", &token)),
            }
        }
    }

    fn parse_option(&mut self) -> Result<()> {
        // suboptions end the values on a line.
        let mut values = true;
        loop {
            let (at, token) = self.shift(Context::Option)?;
            match token.kind {
                TokenKind::EndOfFile
                | TokenKind::Section(_)
                | TokenKind::Option(_)
                | TokenKind::Include => {
                    self.file.unshift();
                    return self.exit_scope();
                }
                TokenKind::Space | TokenKind::LineFeed | TokenKind::Comment => {
                    self.file.release(at);
                    continue;
                }
                _ => {}
            }

            // a line continuing the option must be indented deeper.
            if token.head {
                match self.file.nesting(token.pos)? {
                    Nesting::Equal => values = true,
                    Nesting::Outer => {
                        self.file.unshift();
                        return self.exit_scope();
                    }
                    Nesting::Inner => return Err(self.syntax("invalid indentation", &token)),
                }
            }

            match token.kind {
                // only this option's suboptions resolve here.
                TokenKind::Suboption(node) => {
                    self.enter_scope(node, at)?;
                    self.parse_suboption()?;
                    values = false;
                }
                _ if !values => return Err(self.semantic("unexpected literal", &token)),
                _ => self.accept_value(at)?,
            }
        }
    }

    fn parse_suboption(&mut self) -> Result<()> {
        let (at, token) = self.shift(Context::Suboption)?;
        match token.kind {
            TokenKind::Value | TokenKind::QuotedValue => self.accept_value(at)?,
            _ => self.file.unshift(),
        }
        self.exit_scope()
    }

    fn parse_include(&mut self) -> Result<()> {
        let (mut at, mut token) = self.shift(Context::Include)?;
        if let TokenKind::Space = token.kind {
            self.file.release(at);
            let next = self.shift(Context::Include)?;
            at = next.0;
            token = next.1;
        }

        let filespec = match token.kind {
            TokenKind::Value | TokenKind::QuotedValue => {
                let name = self.file.lexeme(at).unescape().into_owned();
                String::from_utf8(name).map_err(|_| {
                    Error::new(ErrorKind::BadParameter, "include: file name is not valid UTF-8")
                        .at(&self.file.name, token.pos)
                })?
            }
            _ => return Err(self.semantic("include: directive takes a file name", &token)),
        };
        let pos = token.pos;
        self.file.release(at);

        loop {
            let (at, token) = self.shift(Context::Include)?;
            match token.kind {
                TokenKind::Space | TokenKind::Comment => self.file.release(at),
                TokenKind::LineFeed => {
                    self.file.release(at);
                    break;
                }
                TokenKind::EndOfFile => {
                    self.file.unshift();
                    break;
                }
                _ => return Err(self.semantic("include: directive takes only a file name", &token)),
            }
        }

        self.include_filespec(&filespec, pos)
    }

    fn include_filespec(&mut self, filespec: &str, pos: TokenPos) -> Result<()> {
        let path = relative_to(filespec, self.file.path.as_deref());
        if !is_wildcard(filespec) {
            return self.include_file(&path, pos);
        }

        debug!("expanding {}", path.display());
        let builder = self.builder;
        let found = builder.finder.find(&path).map_err(|e| self.locate(e, pos))?;
        for entry in found {
            let entry = entry.map_err(|e| self.locate(e, pos))?;
            match entry.kind {
                FileKind::Regular => self.include_file(&entry.path, pos)?,
                _ => debug!("skipping {}: not a regular file", entry.path.display()),
            }
        }
        Ok(())
    }

    fn include_file(&mut self, path: &Path, pos: TokenPos) -> Result<()> {
        let name = path.display().to_string();
        let canonical = self.builder.resolver.resolve(path).map_err(|e| self.locate(e, pos))?;

        let mut open = iter::once(&self.file).chain(self.includers.iter());
        if open.any(|f| f.path.as_ref() == Some(&canonical)) {
            return Err(Error::semantic(format!("circular include in {}", name), &self.file.name, pos));
        }

        // included text is parsed against the includer's current schema.
        let schema = self.file.scope().schema;
        let file = File::open(name, canonical, schema).map_err(|e| self.locate(e, pos))?;
        debug!("including {}", file.name);

        let includer = mem::replace(&mut self.file, file);
        self.includers.push(includer);
        let result = self.parse_file();
        if let Some(includer) = self.includers.pop() {
            let included = mem::replace(&mut self.file, includer);
            debug!("closed {}", included.name);
        }
        result
    }
}
