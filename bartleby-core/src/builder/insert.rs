//! INSERT and INSERT ... SELECT builders

use std::sync::Arc;

use super::common::{
    partition_clause, prepare_cols, prepare_on_duplicate_key_update, prepare_row, QueryBuilder,
};
use crate::escape::quote_name;
use crate::executor::{Executable, Executor};
use crate::{Escaper, IntoRow, Result, Row, Select};

/// Single-row INSERT builder.
///
/// `INSERT [IGNORE ]`table`[ PARTITION (p)](cols) VALUE (vals)[ ON DUPLICATE KEY UPDATE ..]`
///
/// # Examples
/// ```
/// use bartleby_core::{row, Connect, DebugConnection, QueryBuilder, Raw};
///
/// let conn = DebugConnection::new();
/// let sql = conn
///     .insert("table", row! { "id" => 1, "label" => "hello" })
///     .on_duplicate_key_update(row! { "edits" => Raw::new("`edits`+1") })
///     .to_sql()
///     .unwrap();
/// assert_eq!(
///     sql,
///     "INSERT `table`(`id`,`label`) VALUE (1,'hello') ON DUPLICATE KEY UPDATE `edits`=`edits`+1"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Insert {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    row: Row,
    ignore: bool,
    partition: Option<String>,
    on_duplicate_key_update: Row,
}

impl Insert {
    pub fn new(escaper: Arc<dyn Escaper>, table: impl Into<String>, row: impl IntoRow) -> Self {
        Self {
            escaper,
            table_name: table.into(),
            row: row.into_row(),
            ignore: false,
            partition: None,
            on_duplicate_key_update: Row::new(),
        }
    }

    pub fn set_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    pub fn set_row(mut self, row: impl IntoRow) -> Self {
        self.row = row.into_row();
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn on_duplicate_key_update(mut self, update: impl IntoRow) -> Self {
        self.on_duplicate_key_update = update.into_row();
        self
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Execute and return the id generated for an AUTO_INCREMENT column
    pub async fn exec_and_get_last_id<E: Executor>(&self, executor: &E) -> Result<u64> {
        Ok(self.exec(executor).await?.last_insert_id())
    }
}

impl QueryBuilder for Insert {
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::from("INSERT ");
        if self.ignore {
            sql.push_str("IGNORE ");
        }
        sql.push_str(&quote_name(&self.table_name));
        sql.push_str(&partition_clause(&self.partition));
        sql.push_str(&prepare_row(self.escaper.as_ref(), &self.row)?);
        if !self.on_duplicate_key_update.is_empty() {
            sql.push(' ');
            sql.push_str(&prepare_on_duplicate_key_update(
                self.escaper.as_ref(),
                &self.on_duplicate_key_update,
            )?);
        }
        Ok(sql)
    }
}

/// INSERT ... SELECT builder.
///
/// `INSERT [IGNORE ]`table`[ PARTITION (p)][(cols)] <select>[ ON DUPLICATE KEY UPDATE ..]`
#[derive(Debug, Clone)]
pub struct InsertSelect {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    select: Select,
    columns: Vec<String>,
    ignore: bool,
    partition: Option<String>,
    on_duplicate_key_update: Row,
}

impl InsertSelect {
    pub fn new(escaper: Arc<dyn Escaper>, table: impl Into<String>, select: Select) -> Self {
        Self {
            escaper,
            table_name: table.into(),
            select,
            columns: Vec::new(),
            ignore: false,
            partition: None,
            on_duplicate_key_update: Row::new(),
        }
    }

    /// Target column list; empty means every column in table order
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn select_mut(&mut self) -> &mut Select {
        &mut self.select
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn on_duplicate_key_update(mut self, update: impl IntoRow) -> Self {
        self.on_duplicate_key_update = update.into_row();
        self
    }
}

impl QueryBuilder for InsertSelect {
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::from("INSERT ");
        if self.ignore {
            sql.push_str("IGNORE ");
        }
        sql.push_str(&quote_name(&self.table_name));
        sql.push_str(&partition_clause(&self.partition));
        sql.push_str(&prepare_cols(&self.columns));
        sql.push(' ');
        sql.push_str(&self.select.to_sql()?);
        if !self.on_duplicate_key_update.is_empty() {
            sql.push(' ');
            sql.push_str(&prepare_on_duplicate_key_update(
                self.escaper.as_ref(),
                &self.on_duplicate_key_update,
            )?);
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::QueryResult;
    use crate::{col, row, Connect, DebugConnection, Raw};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Hands out increasing ids and keeps the latest one in shared state,
    /// like a pooled connection does
    #[derive(Debug, Default)]
    struct SequenceExecutor {
        next_id: AtomicU64,
        last_id: AtomicU64,
    }

    impl Executor for SequenceExecutor {
        async fn exec(&self, _sql: &str) -> Result<QueryResult> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.last_id.store(id, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(QueryResult::Affected {
                rows_affected: 1,
                last_insert_id: id,
            })
        }

        fn last_insert_id(&self) -> u64 {
            self.last_id.load(Ordering::SeqCst)
        }

        fn last_affected_rows(&self) -> u64 {
            1
        }
    }

    #[test]
    fn test_insert_basic() {
        let conn = DebugConnection::new();
        let sql = conn
            .insert("table", row! { "id" => 1, "label" => "hello" })
            .to_sql()
            .unwrap();
        assert_eq!(sql, "INSERT `table`(`id`,`label`) VALUE (1,'hello')");
    }

    #[test]
    fn test_insert_all_options() {
        let conn = DebugConnection::new();
        let sql = conn
            .insert("table", row! { "id" => 1, "label" => "hello" })
            .ignore()
            .partition("p1")
            .on_duplicate_key_update(row! {
                "edits" => Raw::new("`edits`+1"),
                "last_edit" => Raw::new("NOW()"),
            })
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT IGNORE `table` PARTITION (p1)(`id`,`label`) VALUE (1,'hello') ON DUPLICATE KEY UPDATE `edits`=`edits`+1,`last_edit`=NOW()"
        );
    }

    #[test]
    fn test_insert_escapes_values() {
        let conn = DebugConnection::new();
        let sql = conn
            .insert("people", row! { "name" => "O'Brien", "nick" => None::<&str>, "vip" => false })
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT `people`(`name`,`nick`,`vip`) VALUE ('O\\'Brien',null,0)"
        );
    }

    #[test]
    fn test_insert_select() {
        let conn = DebugConnection::new();
        let select = conn
            .select("users", vec![col("id"), col("name")])
            .where_gt("id", 100);
        let sql = conn
            .insert_select("archive", select.clone())
            .columns(["user_id", "user_name"])
            .ignore()
            .partition("p0")
            .on_duplicate_key_update(row! { "moved" => 1 })
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT IGNORE `archive` PARTITION (p0)(`user_id`,`user_name`) SELECT `id`,`name` FROM `users` WHERE `id`>100 ON DUPLICATE KEY UPDATE `moved`=1"
        );

        let sql = conn.insert_select("archive", select).to_sql().unwrap();
        assert_eq!(
            sql,
            "INSERT `archive` SELECT `id`,`name` FROM `users` WHERE `id`>100"
        );
    }

    #[tokio::test]
    async fn test_exec_and_get_last_id() {
        let conn = DebugConnection::new();
        let id = conn
            .insert("table", row! { "label" => "x" })
            .exec_and_get_last_id(&conn)
            .await
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(conn.executed(), vec!["INSERT `table`(`label`) VALUE ('x')"]);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_their_own_id() {
        let conn = DebugConnection::new();
        let executor = SequenceExecutor::default();
        let first = conn.insert("table", row! { "label" => "a" });
        let second = conn.insert("table", row! { "label" => "b" });

        let (a, b) = futures::join!(
            first.exec_and_get_last_id(&executor),
            second.exec_and_get_last_id(&executor)
        );
        assert_eq!((a.unwrap(), b.unwrap()), (1, 2));
        assert_eq!(executor.last_insert_id(), 2);
    }
}
