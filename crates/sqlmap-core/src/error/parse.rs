use super::Error;

/// Malformed markup, parameter placeholder, property path or guard expression.
#[derive(Debug)]
pub(super) struct ParseError {
    message: Box<str>,
}

impl std::error::Error for ParseError {}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl Error {
    pub fn parse(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Parse(ParseError {
            message: message.into().into(),
        }))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Parse(_))
    }
}
