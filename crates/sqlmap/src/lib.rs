//! Compiles SQL mapping documents into a queryable symbol table of
//! statements, result maps, parameter maps and caches, and binds statements
//! to parameter objects.
//!
//! ```
//! use sqlmap::{Configuration, Value};
//!
//! let mut config = Configuration::builder().build().unwrap();
//! config
//!     .load(
//!         "users.xml",
//!         r#"<mapper namespace="users">
//!              <select id="find" resultType="map">select * from users where id = #{id}</select>
//!            </mapper>"#,
//!     )
//!     .unwrap();
//! config.finish().unwrap();
//!
//! let bound = config.bound_sql("find", &Value::Null).unwrap();
//! assert_eq!(bound.sql(), "select * from users where id = ?");
//! ```

mod builder;

mod config;
pub use config::{Builder, Configuration, Settings, Symbols};

mod statement;
pub use statement::Statement;

pub mod xml;

pub use sqlmap_core as core;
pub use sqlmap_core::{Error, Result, Value};
pub use sqlmap_sql as sql;
