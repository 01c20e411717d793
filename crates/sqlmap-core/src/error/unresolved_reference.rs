use super::Error;

/// A reference that still names nothing once every source unit has been loaded.
#[derive(Debug)]
pub(super) struct UnresolvedReference {
    message: Box<str>,
}

impl std::error::Error for UnresolvedReference {}

impl core::fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unresolved reference: {}", self.message)
    }
}

impl Error {
    pub fn unresolved_reference(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnresolvedReference(UnresolvedReference {
            message: message.into().into(),
        }))
    }

    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnresolvedReference(_))
    }
}
