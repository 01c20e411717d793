//! Common imports for test files
//!
//! `use tests::prelude::*;` brings in the fixtures, the harness and the
//! assertion macros.

pub use crate::{classes, fixtures, EventLog, MapperTest};
pub use std_util::prelude::*;
