//! DELETE statement builder

use std::sync::Arc;

use super::common::{partition_clause, where_shortcuts, QueryBuilder};
use super::order::{OrderBy, SortKey};
use super::select::condition_clause;
use crate::escape::quote_name;
use crate::{Escaper, IntoRow, Result, Where};

/// DELETE statement builder.
///
/// `DELETE[ IGNORE] FROM `table`[ AS `alias`][ PARTITION (p)][ WHERE ..][ ORDER BY ..][ LIMIT n]`
#[derive(Debug, Clone)]
pub struct Delete {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    alias: Option<String>,
    partition: Option<String>,
    ignore: bool,
    where_conditions: Option<Where>,
    order_by: OrderBy,
    limit_value: Option<u64>,
}

impl Delete {
    pub fn new(escaper: Arc<dyn Escaper>, table: impl Into<String>) -> Self {
        Self {
            escaper,
            table_name: table.into(),
            alias: None,
            partition: None,
            ignore: false,
            where_conditions: None,
            order_by: OrderBy::new(),
            limit_value: None,
        }
    }

    pub fn set_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn set_where(mut self, conditions: Where) -> Self {
        self.where_conditions = Some(conditions);
        self
    }

    pub fn where_map(mut self, row: impl IntoRow) -> Self {
        let conditions = self.where_mut();
        for (name, value) in row.into_row() {
            conditions.eq(name, value);
        }
        self
    }

    pub fn where_mut(&mut self) -> &mut Where {
        self.where_conditions
            .get_or_insert_with(|| Where::new(Arc::clone(&self.escaper)))
    }

    pub fn order(mut self, key: impl Into<SortKey>) -> Self {
        self.order_by.asc(key);
        self
    }

    pub fn order_desc(mut self, key: impl Into<SortKey>) -> Self {
        self.order_by.desc(key);
        self
    }

    pub fn order_expr(mut self, expr: impl Into<String>) -> Self {
        self.order_by.expr_asc(expr);
        self
    }

    pub fn order_expr_desc(mut self, expr: impl Into<String>) -> Self {
        self.order_by.expr_desc(expr);
        self
    }

    pub fn order_by_mut(&mut self) -> &mut OrderBy {
        &mut self.order_by
    }

    pub fn set_limit(mut self, limit: Option<u64>) -> Self {
        self.limit_value = limit;
        self
    }

    pub fn limit(self, limit: u64) -> Self {
        self.set_limit(Some(limit))
    }

    where_shortcuts!();
}

impl QueryBuilder for Delete {
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::from("DELETE");
        if self.ignore {
            sql.push_str(" IGNORE");
        }
        sql.push_str(" FROM ");
        sql.push_str(&quote_name(&self.table_name));
        if let Some(alias) = self.alias.as_deref().filter(|a| !a.is_empty()) {
            sql.push_str(" AS ");
            sql.push_str(&quote_name(alias));
        }
        sql.push_str(&partition_clause(&self.partition));

        sql.push_str(&condition_clause("WHERE", &self.where_conditions)?);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.to_sql());
        }

        if let Some(limit) = self.limit_value {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Executable;
    use crate::{Connect, DebugConnection};

    #[test]
    fn test_delete_whole_table() {
        let conn = DebugConnection::new();
        assert_eq!(conn.delete("sessions").to_sql().unwrap(), "DELETE FROM `sessions`");
    }

    #[test]
    fn test_delete_all_clauses() {
        let conn = DebugConnection::new();
        let sql = conn
            .delete("table")
            .ignore()
            .alias("t")
            .partition("p1")
            .where_lt("expires", 100)
            .where_in("state", vec!["done", "failed"])
            .order_desc("id")
            .limit(50)
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "DELETE IGNORE FROM `table` AS `t` PARTITION (p1) WHERE `expires`<100 AND `state` IN ('done','failed') ORDER BY `id` DESC LIMIT 50"
        );
    }

    #[test]
    fn test_delete_sub_conditions() {
        let conn = DebugConnection::new();
        let sql = conn
            .delete("logs")
            .where_eq("level", "debug")
            .where_sub_fn(|w| {
                w.lt("created", 10).or_is_null("created");
            })
            .order("created")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "DELETE FROM `logs` WHERE `level`='debug' AND (`created`<10 OR  `created` IS NULL) ORDER BY `created`"
        );
    }

    #[test]
    fn test_delete_exec_records_statement() {
        let conn = DebugConnection::new();
        let result = tokio_test::block_on(conn.delete("t").where_eq("id", 3).exec(&conn)).unwrap();
        assert_eq!(result.rows_affected(), 0);
        assert_eq!(conn.executed(), vec!["DELETE FROM `t` WHERE `id`=3"]);
    }
}
