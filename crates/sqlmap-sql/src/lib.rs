mod context;
pub use context::{DynamicContext, Env, DATABASE_ID_KEY, PARAMETER_OBJECT_KEY};

pub mod expr;
pub use expr::{DefaultEvaluator, ExpressionEvaluator, Scope};

pub mod node;
pub use node::SqlNode;

mod param_expr;
pub use param_expr::ParameterExpression;

mod placeholder;
pub use placeholder::{Placeholder, PlaceholderStyle};

mod source;
pub use source::{SqlSource, SqlSourceBuilder, StaticSqlSource};
