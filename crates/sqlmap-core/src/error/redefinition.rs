use super::Error;

/// A fully qualified id registered twice in the same symbol table collection.
#[derive(Debug)]
pub(super) struct Redefinition {
    collection: Box<str>,
    id: Box<str>,
}

impl std::error::Error for Redefinition {}

impl core::fmt::Display for Redefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} collection already contains value for {}",
            self.collection, self.id
        )
    }
}

impl Error {
    pub fn redefinition(collection: impl Into<String>, id: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Redefinition(Redefinition {
            collection: collection.into().into(),
            id: id.into().into(),
        }))
    }

    pub fn is_redefinition(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Redefinition(_))
    }
}
