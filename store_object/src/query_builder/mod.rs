//! Query builder utilities
//!
//! Criteria, query specs over a model's table hierarchy, and SQL rendering.

pub mod builder;
pub mod criteria;
pub mod filter;
pub mod join;
pub mod ordering;
pub mod spec;
pub mod sql_generation;


pub use builder::QueryBuilder;
pub use criteria::{Criteria, ExtraJoin};
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use join::{JoinClause, JoinCondition, JoinType};
pub use ordering::{OrderBy, SortOrder};
pub use spec::QuerySpec;
pub use sql_generation::SqlGenerator;
