use super::Error;

/// An accessor conflict or constructor match that has no single winner.
#[derive(Debug)]
pub(super) struct Ambiguity {
    message: Box<str>,
}

impl std::error::Error for Ambiguity {}

impl core::fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "ambiguity: {}", self.message)
    }
}

impl Error {
    pub fn ambiguity(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Ambiguity(Ambiguity {
            message: message.into().into(),
        }))
    }

    pub fn is_ambiguity(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Ambiguity(_))
    }
}
