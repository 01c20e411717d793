//! Compiles mapping documents into a [`Configuration`](crate::Configuration).

mod assistant;
use assistant::Assistant;

mod include;

mod mapper;
pub(crate) use mapper::load_mapper;

pub(crate) mod pending;
pub(crate) use pending::Pending;

mod script;
mod statement;

use sqlmap_core::Error;

/// Turns a failed lookup into a deferral. Any other failure is kept as is.
fn defer_missing(err: Error, message: impl FnOnce() -> String) -> Error {
    if err.is_unresolved_reference() {
        Error::incomplete_element(message())
    } else {
        err
    }
}
