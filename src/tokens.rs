use crate::error::Result;
use crate::tokenizer::Token;

pub(crate) type TokenIndex = usize;

/// Index of the zero-length indentation token every buffer starts with.
pub(crate) const NO_INDENT: TokenIndex = 0;

const CHUNK: usize = 64;

/// Tokens of one file that are still of interest to the parser.
///
/// Everything below `consumed` has been handed to the parser. Anything at
/// or above it was scanned but pushed back. Tokens the parser is done with
/// are removed with `reduce`, so the buffer only holds what open scopes
/// still refer to.
pub(crate) struct TokenBuffer<'a, U> {
    tokens: Vec<Token<'a, U>>,
    consumed: usize,
}

impl<'a, U> TokenBuffer<'a, U> {
    pub(crate) fn new() -> TokenBuffer<'a, U> {
        let mut tokens = Vec::with_capacity(CHUNK);
        tokens.push(Token::no_indent());
        TokenBuffer { tokens, consumed: 1 }
    }

    /// Next pushed back token, if there is one.
    pub(crate) fn next(&mut self) -> Option<(TokenIndex, Token<'a, U>)> {
        if self.consumed == self.tokens.len() {
            return None;
        }
        let at = self.consumed;
        self.consumed += 1;
        Some((at, self.tokens[at]))
    }

    /// Append a freshly scanned token and hand it out.
    pub(crate) fn push(&mut self, token: Token<'a, U>) -> Result<TokenIndex> {
        debug_assert_eq!(self.consumed, self.tokens.len());
        if self.tokens.len() == self.tokens.capacity() {
            self.tokens.try_reserve(self.tokens.capacity().max(CHUNK))?;
        }
        self.tokens.push(token);
        self.consumed = self.tokens.len();
        Ok(self.consumed - 1)
    }

    /// Push back the last token handed out.
    pub(crate) fn unshift(&mut self) {
        debug_assert!(self.consumed > 1);
        self.consumed -= 1;
    }

    /// Drop a token the parser is done with. Indexes above `at` move down
    /// by one.
    pub(crate) fn reduce(&mut self, at: TokenIndex) {
        debug_assert!(at != NO_INDENT && at < self.consumed);
        let _ = self.tokens.remove(at);
        self.consumed -= 1;
    }

    pub(crate) fn get(&self, at: TokenIndex) -> &Token<'a, U> {
        &self.tokens[at]
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }
}
