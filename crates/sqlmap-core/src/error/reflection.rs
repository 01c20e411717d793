use super::Error;

/// A missing accessor, unknown type, or an accessor invoked on the wrong shape of value.
#[derive(Debug)]
pub(super) struct ReflectionError {
    message: Box<str>,
}

impl std::error::Error for ReflectionError {}

impl core::fmt::Display for ReflectionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "reflection error: {}", self.message)
    }
}

impl Error {
    pub fn reflection(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Reflection(ReflectionError {
            message: message.into().into(),
        }))
    }

    pub fn is_reflection(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Reflection(_))
    }
}
