// Byte classification driving every scanning decision.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Class {
    Invalid,
    /// ' ', '\t', '\r'
    Space,
    LineFeed,
    /// '#'
    Comment,
    /// ASCII letters and digits.
    Identifier,
    /// Anything else that may appear in an unquoted value.
    Value,
}
use Class::*;

const X: Class = Invalid;
const S: Class = Space;
const L: Class = LineFeed;
const C: Class = Comment;
const I: Class = Identifier;
const V: Class = Value;

static TABLE: [Class; 256] = [
    X, X, X, X, X, X, X, X, // 0x00 - 0x07
    X, S, L, X, X, S, X, X, // 0x08 - 0x0f
    X, X, X, X, X, X, X, X, // 0x10 - 0x17
    X, X, X, X, X, X, X, X, // 0x18 - 0x1f
    S, V, V, C, V, V, V, V, // 0x20 - 0x27
    V, V, V, V, V, V, V, V, // 0x28 - 0x2f
    I, I, I, I, I, I, I, I, // 0x30 - 0x37
    I, I, V, V, V, V, V, V, // 0x38 - 0x3f
    V, I, I, I, I, I, I, I, // 0x40 - 0x47
    I, I, I, I, I, I, I, I, // 0x48 - 0x4f
    I, I, I, I, I, I, I, I, // 0x50 - 0x57
    I, I, I, V, V, V, V, V, // 0x58 - 0x5f
    V, I, I, I, I, I, I, I, // 0x60 - 0x67
    I, I, I, I, I, I, I, I, // 0x68 - 0x6f
    I, I, I, I, I, I, I, I, // 0x70 - 0x77
    I, I, I, V, V, V, V, X, // 0x78 - 0x7f
    V, V, V, V, V, V, V, V, // 0x80 - 0x87
    V, V, V, V, V, V, V, V, // 0x88 - 0x8f
    V, V, V, V, V, V, V, V, // 0x90 - 0x97
    V, V, V, V, V, V, V, V, // 0x98 - 0x9f
    V, V, V, V, V, V, V, V, // 0xa0 - 0xa7
    V, V, V, V, V, V, V, V, // 0xa8 - 0xaf
    V, V, V, V, V, V, V, V, // 0xb0 - 0xb7
    V, V, V, V, V, V, V, V, // 0xb8 - 0xbf
    V, V, V, V, V, V, V, V, // 0xc0 - 0xc7
    V, V, V, V, V, V, V, V, // 0xc8 - 0xcf
    V, V, V, V, V, V, V, V, // 0xd0 - 0xd7
    V, V, V, V, V, V, V, V, // 0xd8 - 0xdf
    V, V, V, V, V, V, V, V, // 0xe0 - 0xe7
    V, V, V, V, V, V, V, V, // 0xe8 - 0xef
    V, V, V, V, V, V, V, V, // 0xf0 - 0xf7
    V, V, V, V, V, V, V, V, // 0xf8 - 0xff
];

#[inline]
pub(crate) fn classify(b: u8) -> Class {
    TABLE[b as usize]
}

impl Class {
    /// May continue an unquoted value.
    #[inline]
    pub(crate) fn is_literal(self) -> bool {
        self == Identifier || self == Value
    }

    /// May appear inside a quoted value or a comment.
    #[inline]
    pub(crate) fn is_printable(self) -> bool {
        self != Invalid && self != LineFeed
    }
}
