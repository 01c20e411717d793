//! Compiled mapping descriptors handed to the execution layer.

mod bound_sql;
pub use bound_sql::BoundSql;

mod cache;
pub use cache::CacheConfig;

mod discriminator;
pub use discriminator::Discriminator;

mod parameter;
pub use parameter::{ParameterMap, ParameterMapping, ParameterMappingBuilder, ParameterMode};

mod result_map;
pub use result_map::{ResultMap, ResultMapBuilder};

mod result_mapping;
pub use result_mapping::{ResultFlag, ResultMapping, ResultMappingBuilder};

mod statement;
pub use statement::{CommandKind, KeyGenerator, ResultSetType, StatementType};
