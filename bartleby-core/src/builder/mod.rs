//! Statement builders

pub mod common;
pub mod condition;
pub mod order;
pub mod table;
pub mod select;
pub mod insert;
pub mod replace;
pub mod bulk;
pub mod update;
pub mod delete;

pub use bulk::{BatchOptions, BatchQueries, InsertBulk, ReplaceBulk, DEFAULT_BATCH_SIZE};
pub use common::{prepare_cols, prepare_on_duplicate_key_update, prepare_row, QueryBuilder};
pub use condition::{InList, Operator, Where, WhereConnector};
pub use delete::Delete;
pub use insert::{Insert, InsertSelect};
pub use order::{GroupBy, OrderBy, OrderByClause, SortDirection, SortKey};
pub use replace::{Replace, ReplaceSelect};
pub use select::{col, Column, ColumnExpr, IntoColumns, ResultSize, Select};
pub use table::{JoinClause, JoinOn, JoinType, TableFactor};
pub use update::Update;
