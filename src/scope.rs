use crate::schema::SchemaNode;
use crate::tokens::{TokenIndex, NO_INDENT};

/// A section, option or suboption the parser is inside of.
///
/// Indentation is kept as indexes of space tokens in the file's token
/// buffer, which are kept alive for as long as the scope is.
pub(crate) struct Scope<'a, U> {
    pub(crate) schema: &'a SchemaNode<U>,
    /// Identifier token that opened the scope.
    pub(crate) identifier: TokenIndex,
    /// Indentation of the line the scope was opened on.
    pub(crate) outer_indent: TokenIndex,
    /// Indentation of the scope's children, fixed by the first of them.
    pub(crate) indent: Option<TokenIndex>,
}

impl<'a, U> Scope<'a, U> {
    /// Scope of a whole file. Its children sit at zero indentation.
    pub(crate) fn root(schema: &'a SchemaNode<U>) -> Scope<'a, U> {
        Scope {
            schema,
            identifier: NO_INDENT,
            outer_indent: NO_INDENT,
            indent: Some(NO_INDENT),
        }
    }

    pub(crate) fn new(
        schema: &'a SchemaNode<U>,
        identifier: TokenIndex,
        outer_indent: TokenIndex,
    ) -> Scope<'a, U> {
        Scope {
            schema,
            identifier,
            outer_indent,
            indent: None,
        }
    }

    pub(crate) fn refers_to(&self, at: TokenIndex) -> bool {
        self.identifier == at || self.outer_indent == at || self.indent == Some(at)
    }

    /// Token indexes held by this scope, highest first.
    pub(crate) fn held(&self) -> Vec<TokenIndex> {
        let mut held = vec![self.identifier, self.outer_indent];
        held.extend(self.indent);
        held.sort_unstable_by(|a, b| b.cmp(a));
        held.dedup();
        held
    }

    /// Account for the removal of token `at` from the buffer.
    pub(crate) fn rebase(&mut self, at: TokenIndex) {
        let fix = |i: &mut TokenIndex| {
            if *i > at {
                *i -= 1;
            }
        };
        fix(&mut self.identifier);
        fix(&mut self.outer_indent);
        if let Some(indent) = self.indent.as_mut() {
            fix(indent);
        }
    }
}

/// Where a line belongs relative to a scope's indentation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Nesting {
    /// Shallower: the line belongs to an enclosing scope.
    Outer,
    /// Deeper than the scope allows.
    Inner,
    Equal,
}

/// One indentation is a byte-for-byte prefix of the other.
pub(crate) fn is_indent(a: &[u8], b: &[u8]) -> bool {
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

/// Compare a candidate indentation with a scope's, by length only.
pub(crate) fn in_scope(scope: &[u8], candidate: &[u8]) -> Nesting {
    if scope.len() > candidate.len() {
        Nesting::Outer
    } else if scope.len() < candidate.len() {
        Nesting::Inner
    } else {
        Nesting::Equal
    }
}
