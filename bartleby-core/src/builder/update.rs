//! UPDATE statement builder

use std::sync::Arc;

use super::common::{partition_clause, where_shortcuts, QueryBuilder};
use super::order::{OrderBy, SortKey};
use super::select::condition_clause;
use crate::escape::quote_name;
use crate::{Error, Escaper, IntoRow, Name, Result, Value, Where};

/// UPDATE statement builder.
///
/// `UPDATE[ IGNORE] `table`[ AS `alias`][ PARTITION (p)] SET ..[ WHERE ..][ ORDER BY ..][ LIMIT n]`
///
/// # Examples
/// ```
/// use bartleby_core::{Connect, DebugConnection, QueryBuilder, Raw};
///
/// let conn = DebugConnection::new();
/// let sql = conn
///     .update("users")
///     .set("name", "Bob")
///     .set("visits", Raw::new("`visits`+1"))
///     .where_eq("id", 7)
///     .to_sql()
///     .unwrap();
/// assert_eq!(sql, "UPDATE `users` SET `name`='Bob',`visits`=`visits`+1 WHERE `id`=7");
/// ```
#[derive(Debug, Clone)]
pub struct Update {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    alias: Option<String>,
    partition: Option<String>,
    ignore: bool,
    assignments: Vec<(Name, Value)>,
    where_conditions: Option<Where>,
    order_by: OrderBy,
    limit_value: Option<u64>,
}

impl Update {
    pub fn new(escaper: Arc<dyn Escaper>, table: impl Into<String>) -> Self {
        Self {
            escaper,
            table_name: table.into(),
            alias: None,
            partition: None,
            ignore: false,
            assignments: Vec::new(),
            where_conditions: None,
            order_by: OrderBy::new(),
            limit_value: None,
        }
    }

    pub fn set_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    /// Add one `column=value` assignment
    pub fn set(mut self, name: impl Into<Name>, value: impl Into<Value>) -> Self {
        self.assignments.push((name.into(), value.into()));
        self
    }

    /// Add one assignment per entry of the row, in row order
    pub fn set_row(mut self, row: impl IntoRow) -> Self {
        for (name, value) in row.into_row() {
            self.assignments.push((Name::from(name), value));
        }
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

    /// Add an equality predicate per entry of the row
    pub fn where_map(mut self, row: impl IntoRow) -> Self {
        let conditions = self.where_mut();
        for (name, value) in row.into_row() {
            conditions.eq(name, value);
        }
        self
    }

    /// The WHERE builder, created on first use
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

impl QueryBuilder for Update {
    fn to_sql(&self) -> Result<String> {
        if self.assignments.is_empty() {
            return Err(Error::invalid_query("UPDATE requires at least one assignment"));
        }

        let mut sql = String::from("UPDATE");
        if self.ignore {
            sql.push_str(" IGNORE");
        }
        sql.push(' ');
        sql.push_str(&quote_name(&self.table_name));
        if let Some(alias) = self.alias.as_deref().filter(|a| !a.is_empty()) {
            sql.push_str(" AS ");
            sql.push_str(&quote_name(alias));
        }
        sql.push_str(&partition_clause(&self.partition));

        let assignments = self
            .assignments
            .iter()
            .map(|(name, value)| Ok(format!("{}={}", name.quoted(), self.escaper.escape(value)?)))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(" SET ");
        sql.push_str(&assignments.join(","));

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
    use crate::{row, Connect, DebugConnection, Raw};

    #[test]
    fn test_update_basic() {
        let conn = DebugConnection::new();
        let sql = conn
            .update("users")
            .set_row(row! { "name" => "Alice", "active" => true })
            .where_eq("id", 1)
            .to_sql()
            .unwrap();
        assert_eq!(sql, "UPDATE `users` SET `name`='Alice',`active`=1 WHERE `id`=1");
    }

    #[test]
    fn test_update_all_clauses() {
        let conn = DebugConnection::new();
        let sql = conn
            .update("users")
            .ignore()
            .alias("u")
            .partition("p3")
            .set(("u", "score"), Raw::new("`score`*2"))
            .where_gt("score", 10)
            .or_where_is_null("score")
            .order_desc("updated_at")
            .order_expr("RAND()")
            .limit(5)
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE IGNORE `users` AS `u` PARTITION (p3) SET `u`.`score`=`score`*2 WHERE `score`>10 OR  `score` IS NULL ORDER BY `updated_at` DESC,RAND() LIMIT 5"
        );
    }

    #[test]
    fn test_update_without_assignments_fails() {
        let conn = DebugConnection::new();
        let err = conn.update("users").where_eq("id", 1).to_sql().unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }

    #[test]
    fn test_update_limit_cleared() {
        let conn = DebugConnection::new();
        let sql = conn
            .update("users")
            .set("flag", 0)
            .limit(10)
            .set_limit(None)
            .order("id")
            .order_expr_desc("LENGTH(`name`)")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE `users` SET `flag`=0 ORDER BY `id`,LENGTH(`name`) DESC"
        );
    }

    #[test]
    fn test_update_where_map() {
        let conn = DebugConnection::new();
        let sql = conn
            .update("users")
            .set("flag", 1)
            .where_map(row! { "group" => 2, "kind" => "x" })
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE `users` SET `flag`=1 WHERE `group`=2 AND `kind`='x'"
        );
    }
}
