#[macro_use]
mod macros;

mod event_log;
pub use event_log::{EventLog, LoggedEvent};

pub mod fixtures;
pub mod prelude;

mod mapper_test;
pub use mapper_test::MapperTest;

pub use std_util::*;
