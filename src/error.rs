use std::collections::TryReserveError;
use std::fmt;
use std::io;

use crate::tokenizer::TokenPos;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What went wrong.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed input: invalid byte, bad quoting, bad indentation.
    Syntax,
    /// Well-formed input in the wrong place.
    Semantic,
    OutOfMemory,
    NoAccess,
    NoSuchFile,
    BadParameter,
    /// Raised by a schema callback, carries the callback's code.
    Callback(i32),
}

impl ErrorKind {
    /// Stable numeric error code.
    pub fn code(&self) -> i32 {
        match *self {
            ErrorKind::Syntax => -1,
            ErrorKind::Semantic => -2,
            ErrorKind::OutOfMemory => -3,
            ErrorKind::NoAccess => -4,
            ErrorKind::NoSuchFile => -5,
            ErrorKind::BadParameter => -6,
            ErrorKind::Callback(code) => code,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub pos: TokenPos,
    pub msg: String,
    pub file_name: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Error {
        Error {
            kind,
            pos: TokenPos::none(),
            msg: msg.into(),
            file_name: String::new(),
        }
    }

    /// Error for a callback to return. Parsing stops and the error is
    /// handed back to the caller unchanged.
    pub fn callback(code: i32, msg: impl Into<String>) -> Error {
        Error::new(ErrorKind::Callback(code), msg)
    }

    pub(crate) fn at(mut self, file_name: &str, pos: TokenPos) -> Error {
        self.file_name = file_name.to_string();
        self.pos = pos;
        self
    }

    pub(crate) fn syntax(msg: impl Into<String>, file_name: &str, pos: TokenPos) -> Error {
        Error::new(ErrorKind::Syntax, msg).at(file_name, pos)
    }

    pub(crate) fn semantic(msg: impl Into<String>, file_name: &str, pos: TokenPos) -> Error {
        Error::new(ErrorKind::Semantic, msg).at(file_name, pos)
    }

    pub(crate) fn io(err: &io::Error, name: impl fmt::Display) -> Error {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::NoSuchFile,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => ErrorKind::BadParameter,
            io::ErrorKind::OutOfMemory => ErrorKind::OutOfMemory,
            _ => ErrorKind::NoAccess,
        };
        Error::new(kind, format!("{}: {}", name, err))
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Error {
        Error::new(ErrorKind::OutOfMemory, "out of memory")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file_name.is_empty() {
            write!(f, "{}", self.msg)
        } else if self.pos.line == 0 {
            write!(f, "{}: {}", self.file_name, self.msg)
        } else {
            write!(f, "{}:{}:{}: {}", self.file_name, self.pos.line, self.pos.column, self.msg)
        }
    }
}

impl std::error::Error for Error {}
