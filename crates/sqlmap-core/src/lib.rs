mod error;
pub use error::{Error, IntoError};

pub mod mapping;
pub mod parsing;
pub mod reflect;
pub mod ty;
pub mod types;

pub mod value;
pub use value::Value;

/// A Result type alias that uses the crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
