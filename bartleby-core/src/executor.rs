//! Statement execution boundary, result shaping and the no-op debug connection

use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::builder::{Delete, Insert, InsertSelect, Replace, ReplaceSelect, Select, Update};
use crate::{Connect, DebugEscaper, Error, Escaper, QueryBuilder, Result};

/// Anything that accepts finished SQL text.
///
/// Statements are sent as complete text: values were escaped while rendering,
/// so there are no bind parameters.
pub trait Executor: Send + Sync {
    /// Send one statement
    fn exec(&self, sql: &str) -> impl Future<Output = Result<QueryResult>> + Send;

    /// AUTO_INCREMENT id generated by the latest statement
    fn last_insert_id(&self) -> u64;

    /// Rows changed by the latest statement
    fn last_affected_rows(&self) -> u64;
}

/// Outcome of one executed statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Affected { rows_affected: u64, last_insert_id: u64 },
    Rows(ResultSet),
}

impl QueryResult {
    pub fn rows_affected(&self) -> u64 {
        match self {
            QueryResult::Affected { rows_affected, .. } => *rows_affected,
            QueryResult::Rows(_) => 0,
        }
    }

    pub fn last_insert_id(&self) -> u64 {
        match self {
            QueryResult::Affected { last_insert_id, .. } => *last_insert_id,
            QueryResult::Rows(_) => 0,
        }
    }

    /// The fetched rows; a statement without a result set gives an empty set
    pub fn into_result_set(self) -> ResultSet {
        match self {
            QueryResult::Rows(set) => set,
            QueryResult::Affected { .. } => ResultSet::default(),
        }
    }
}

/// Rows returned by a statement, cells decoded to JSON values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<JsonValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn record(&self, cells: &[JsonValue]) -> Map<String, JsonValue> {
        self.columns
            .iter()
            .cloned()
            .zip(cells.iter().cloned())
            .collect()
    }

    /// Every row as a column-name keyed object
    pub fn rows(&self) -> Vec<Map<String, JsonValue>> {
        self.rows.iter().map(|cells| self.record(cells)).collect()
    }

    pub fn first_row(&self) -> Option<Map<String, JsonValue>> {
        self.rows.first().map(|cells| self.record(cells))
    }

    /// Values of the column at `index` across all rows
    pub fn column(&self, index: usize) -> Result<Vec<JsonValue>> {
        if index >= self.columns.len() {
            return Err(Error::malformed_fetch(format!(
                "column index {index} out of range for {} columns",
                self.columns.len()
            )));
        }
        Ok(self
            .rows
            .iter()
            .map(|cells| cells.get(index).cloned().unwrap_or(JsonValue::Null))
            .collect())
    }

    /// First column as key, second as value; needs exactly two columns
    pub fn pairs(&self) -> Result<Vec<(JsonValue, JsonValue)>> {
        if self.columns.len() != 2 {
            return Err(Error::malformed_fetch(format!(
                "pairs need exactly 2 columns, got {}",
                self.columns.len()
            )));
        }
        Ok(self
            .rows
            .iter()
            .map(|cells| {
                let mut cells = cells.iter().cloned();
                (
                    cells.next().unwrap_or(JsonValue::Null),
                    cells.next().unwrap_or(JsonValue::Null),
                )
            })
            .collect())
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|cells| {
                serde_json::from_value(JsonValue::Object(self.record(cells))).map_err(Error::from)
            })
            .collect()
    }
}

/// Render-then-send for single statements
pub trait Executable: QueryBuilder + Sync {
    fn exec<E: Executor>(&self, executor: &E) -> impl Future<Output = Result<QueryResult>> + Send {
        async move {
            let sql = self.to_sql()?;
            executor.exec(&sql).await
        }
    }
}

impl Executable for Select {}
impl Executable for Insert {}
impl Executable for InsertSelect {}
impl Executable for Replace {}
impl Executable for ReplaceSelect {}
impl Executable for Update {}
impl Executable for Delete {}

/// Typed fetching for SELECT statements
pub trait ExecutableQuery: Executable {
    /// Execute and decode every row
    fn fetch_all<T, E>(&self, executor: &E) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send,
        E: Executor,
    {
        async move { self.exec(executor).await?.into_result_set().deserialize() }
    }

    /// Execute and decode the first row; no rows is an error
    fn fetch_one<T, E>(&self, executor: &E) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send,
        E: Executor,
    {
        async move {
            self.fetch_optional(executor)
                .await?
                .ok_or_else(|| Error::malformed_fetch("query returned no rows"))
        }
    }

    fn fetch_optional<T, E>(&self, executor: &E) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send,
        E: Executor,
    {
        async move {
            let set = self.exec(executor).await?.into_result_set();
            match set.first_row() {
                Some(row) => Ok(Some(serde_json::from_value(JsonValue::Object(row))?)),
                None => Ok(None),
            }
        }
    }
}

impl ExecutableQuery for Select {}

/// Connection with the deterministic escaper and an executor that sends
/// nothing. Every statement is recorded and succeeds with zero affected rows,
/// or with the canned result set for SELECTs when one was given.
#[derive(Debug)]
pub struct DebugConnection {
    escaper: Arc<dyn Escaper>,
    executed: Mutex<Vec<String>>,
    result_set: Option<ResultSet>,
}

impl DebugConnection {
    pub fn new() -> Self {
        Self {
            escaper: Arc::new(DebugEscaper),
            executed: Mutex::new(Vec::new()),
            result_set: None,
        }
    }

    /// Answer every SELECT with these rows
    pub fn with_result_set(mut self, result_set: ResultSet) -> Self {
        self.result_set = Some(result_set);
        self
    }

    /// Statements sent so far, oldest first
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for DebugConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connect for DebugConnection {
    fn escaper(&self) -> Arc<dyn Escaper> {
        Arc::clone(&self.escaper)
    }
}

impl Executor for DebugConnection {
    async fn exec(&self, sql: &str) -> Result<QueryResult> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sql.to_string());
        tracing::debug!(sql, "debug exec");

        Ok(match &self.result_set {
            Some(set) if sql.starts_with("SELECT") => QueryResult::Rows(set.clone()),
            _ => QueryResult::Affected {
                rows_affected: 0,
                last_insert_id: 0,
            },
        })
    }

    fn last_insert_id(&self) -> u64 {
        0
    }

    fn last_affected_rows(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    fn users() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into()],
            vec![vec![json!(1), json!("Alice")], vec![json!(2), json!("Bob")]],
        )
    }

    #[test]
    fn test_result_set_shapes() {
        let set = users();
        assert_eq!(set.len(), 2);
        assert_eq!(set.columns(), ["id", "name"]);
        assert_eq!(set.first_row().unwrap()["name"], json!("Alice"));
        assert_eq!(set.rows()[1]["id"], json!(2));
        assert_eq!(set.column(1).unwrap(), vec![json!("Alice"), json!("Bob")]);
        assert_eq!(
            set.pairs().unwrap(),
            vec![(json!(1), json!("Alice")), (json!(2), json!("Bob"))]
        );
    }

    #[test]
    fn test_result_set_shape_errors() {
        let set = ResultSet::new(vec!["a".into()], vec![vec![json!(1)]]);
        assert!(matches!(set.pairs(), Err(Error::MalformedFetchShape { .. })));
        assert!(matches!(set.column(3), Err(Error::MalformedFetchShape { .. })));
        assert!(ResultSet::default().first_row().is_none());
    }

    #[test]
    fn test_deserialize_rows() {
        let parsed: Vec<User> = users().deserialize().unwrap();
        assert_eq!(
            parsed,
            vec![
                User { id: 1, name: "Alice".into() },
                User { id: 2, name: "Bob".into() },
            ]
        );
    }

    #[test]
    fn test_query_result_accessors() {
        let affected = QueryResult::Affected {
            rows_affected: 3,
            last_insert_id: 17,
        };
        assert_eq!(affected.rows_affected(), 3);
        assert_eq!(affected.last_insert_id(), 17);
        assert!(affected.into_result_set().is_empty());
        assert_eq!(QueryResult::Rows(users()).rows_affected(), 0);
    }

    #[tokio::test]
    async fn test_debug_connection_records_statements() {
        let conn = DebugConnection::new();
        conn.update("users").set("name", "x").exec(&conn).await.unwrap();
        conn.insert("users", row! { "name" => "y" }).exec(&conn).await.unwrap();
        assert_eq!(
            conn.executed(),
            vec![
                "UPDATE `users` SET `name`='x'",
                "INSERT `users`(`name`) VALUE ('y')",
            ]
        );
        assert_eq!(conn.last_insert_id(), 0);
        assert_eq!(conn.last_affected_rows(), 0);
    }

    #[tokio::test]
    async fn test_fetch_helpers() {
        let conn = DebugConnection::new().with_result_set(users());
        let select = conn.select("users", vec!["id", "name"]);

        let all: Vec<User> = select.fetch_all(&conn).await.unwrap();
        assert_eq!(all.len(), 2);

        let first: User = select.fetch_one(&conn).await.unwrap();
        assert_eq!(first.name, "Alice");

        let maybe: Option<User> = select.fetch_optional(&conn).await.unwrap();
        assert!(maybe.is_some());
    }

    #[test]
    fn test_fetch_one_without_rows() {
        let conn = DebugConnection::new();
        let select = conn.select("users", ());
        let result: Result<User> = tokio_test::block_on(select.fetch_one(&conn));
        assert!(matches!(result, Err(Error::MalformedFetchShape { .. })));

        let none: Option<User> = tokio_test::block_on(select.fetch_optional(&conn)).unwrap();
        assert!(none.is_none());
    }
}
