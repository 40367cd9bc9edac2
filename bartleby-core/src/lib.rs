//! Bartleby Core - a MySQL statement builder
//!
//! Statements are assembled from composable builders and rendered to complete
//! SQL text. Values are escaped into literals while rendering, so the text
//! can be sent as is over the text protocol.
//!
//! # Examples
//! ```
//! use bartleby_core::{col, Connect, DebugConnection, QueryBuilder};
//!
//! let conn = DebugConnection::new();
//! let sql = conn
//!     .select("users", vec![col("id"), col("name")])
//!     .where_eq("active", true)
//!     .where_sub_fn(|w| {
//!         w.gt("karma", 100).or_is_null("banned_at");
//!     })
//!     .order_by_desc("id")
//!     .limit(10)
//!     .to_sql()
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT `id`,`name` FROM `users` WHERE `active`=1 AND (`karma`>100 OR  `banned_at` IS NULL) ORDER BY `id` DESC LIMIT 10"
//! );
//! ```

pub mod error;
pub mod value;
pub mod raw;
pub mod escape;
pub mod builder;
pub mod executor;
pub mod connect;

// Re-export main types
pub use error::{Error, Result};
pub use value::{IntoRow, Row, Value};
pub use raw::Raw;
pub use escape::{escape_name, DebugEscaper, Escaper, MySqlEscaper, Name};
pub use builder::{
    col, BatchOptions, BatchQueries, Column, Delete, GroupBy, InList, Insert, InsertBulk,
    InsertSelect, IntoColumns, JoinOn, JoinType, OrderBy, QueryBuilder, Replace, ReplaceBulk,
    ReplaceSelect, Select, SortDirection, TableFactor, Update, Where,
};
pub use executor::{
    DebugConnection, Executable, ExecutableQuery, Executor, QueryResult, ResultSet,
};
pub use connect::{Connect, ConnectConfig};

#[cfg(feature = "mysql")]
pub use connect::mysql::MySqlConnection;
