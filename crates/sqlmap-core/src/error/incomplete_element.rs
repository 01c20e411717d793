use super::Error;

/// A reference that cannot be resolved yet.
///
/// Raised while registering a source unit when a result map, cache, fragment
/// or statement points at an id that has not been registered. The loader
/// catches it and parks the work in a pending queue; it only escapes to the
/// caller as an [`unresolved_reference`](Error::unresolved_reference) once the
/// final retry pass still fails.
#[derive(Debug)]
pub(super) struct IncompleteElement {
    message: Box<str>,
}

impl std::error::Error for IncompleteElement {}

impl core::fmt::Display for IncompleteElement {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "incomplete element: {}", self.message)
    }
}

impl Error {
    pub fn incomplete_element(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::IncompleteElement(IncompleteElement {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if the root cause of this error is an incomplete element.
    ///
    /// Context added on top of the root does not hide it.
    pub fn is_incomplete_element(&self) -> bool {
        matches!(self.root().kind(), super::ErrorKind::IncompleteElement(_))
    }
}
