use std::fmt;
use std::num::ParseIntError;

use pest::error::Error as PestError;
use tv_util::ParseEnumError;

use crate::parser::Rule;

#[derive(Clone, Debug)]
pub enum ParseError {
    Pest(Box<PestError<Rule>>),
    ParseInt(String),
    ParseEnum(ParseEnumError),
    /// An instruction's operand count or kinds don't match its opcode's
    /// shape, e.g. `inc %r0, %r1` or `mov 5, %r0`.
    InvalidOperand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Pest(e) => write!(f, "{}", e),
            ParseError::ParseInt(s) => write!(f, "invalid integer literal: {}", s),
            ParseError::ParseEnum(e) => write!(f, "{}", e),
            ParseError::InvalidOperand(s) => write!(f, "invalid operand: {}", s),
        }
    }
}

impl From<PestError<Rule>> for ParseError {
    fn from(err: PestError<Rule>) -> ParseError {
        ParseError::Pest(Box::new(err))
    }
}

impl From<ParseIntError> for ParseError {
    fn from(err: ParseIntError) -> ParseError {
        ParseError::ParseInt(err.to_string())
    }
}

impl From<ParseEnumError> for ParseError {
    fn from(err: ParseEnumError) -> ParseError {
        ParseError::ParseEnum(err)
    }
}

/// The fatal error kinds named by the image format and linker contract.
/// Every variant carries the offending identifier so the single-line
/// report can name it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssembleError {
    DupLabel(String),
    DupData(String),
    DupSym(String),
    Load(String),
    MissingInit(String),
    InitFailed(String),
    Unresolved(String),
    EmptyCode,
    NoMain,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssembleError::DupLabel(n) => write!(f, "dup-label: {}", n),
            AssembleError::DupData(n) => write!(f, "dup-data: {}", n),
            AssembleError::DupSym(n) => write!(f, "dup-sym: {}", n),
            AssembleError::Load(n) => write!(f, "load: {}", n),
            AssembleError::MissingInit(n) => write!(f, "missing-init: {}", n),
            AssembleError::InitFailed(n) => write!(f, "init-failed: {}", n),
            AssembleError::Unresolved(n) => write!(f, "unresolved: {}", n),
            AssembleError::EmptyCode => write!(f, "empty-code"),
            AssembleError::NoMain => write!(f, "no-main"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Assemble(AssembleError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Assemble(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<AssembleError> for Error {
    fn from(err: AssembleError) -> Error {
        Error::Assemble(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assemble_error_reports_offending_identifier() {
        assert_eq!(AssembleError::DupLabel("foo".into()).to_string(), "dup-label: foo");
        assert_eq!(AssembleError::NoMain.to_string(), "no-main");
    }
}
