//! REPLACE and REPLACE ... SELECT builders

use std::sync::Arc;

use super::common::{partition_clause, prepare_cols, prepare_row, QueryBuilder};
use crate::escape::quote_name;
use crate::{Escaper, IntoRow, Result, Row, Select};

/// Single-row REPLACE builder.
///
/// `REPLACE `table`[ PARTITION (p)](cols) VALUE (vals)`
#[derive(Debug, Clone)]
pub struct Replace {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    row: Row,
    partition: Option<String>,
}

impl Replace {
    pub fn new(escaper: Arc<dyn Escaper>, table: impl Into<String>, row: impl IntoRow) -> Self {
        Self {
            escaper,
            table_name: table.into(),
            row: row.into_row(),
            partition: None,
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

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }
}

impl QueryBuilder for Replace {
    fn to_sql(&self) -> Result<String> {
        Ok(format!(
            "REPLACE {}{}{}",
            quote_name(&self.table_name),
            partition_clause(&self.partition),
            prepare_row(self.escaper.as_ref(), &self.row)?
        ))
    }
}

/// REPLACE ... SELECT builder
#[derive(Debug, Clone)]
pub struct ReplaceSelect {
    table_name: String,
    select: Select,
    columns: Vec<String>,
    partition: Option<String>,
}

impl ReplaceSelect {
    pub fn new(table: impl Into<String>, select: Select) -> Self {
        Self {
            table_name: table.into(),
            select,
            columns: Vec::new(),
            partition: None,
        }
    }

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

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }
}

impl QueryBuilder for ReplaceSelect {
    fn to_sql(&self) -> Result<String> {
        Ok(format!(
            "REPLACE {}{}{} {}",
            quote_name(&self.table_name),
            partition_clause(&self.partition),
            prepare_cols(&self.columns),
            self.select.to_sql()?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{row, Connect, DebugConnection};

    #[test]
    fn test_replace() {
        let conn = DebugConnection::new();
        let sql = conn
            .replace("table", row! { "id" => 1, "label" => "hello" })
            .to_sql()
            .unwrap();
        assert_eq!(sql, "REPLACE `table`(`id`,`label`) VALUE (1,'hello')");

        let sql = conn
            .replace("table", row! { "id" => 1 })
            .partition("p1")
            .to_sql()
            .unwrap();
        assert_eq!(sql, "REPLACE `table` PARTITION (p1)(`id`) VALUE (1)");
    }

    #[test]
    fn test_replace_select() {
        let conn = DebugConnection::new();
        let select = conn.select("staging", vec!["id", "label"]);
        let sql = conn
            .replace_select("table", select.clone())
            .columns(vec!["id", "label"])
            .partition("p2")
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "REPLACE `table` PARTITION (p2)(`id`,`label`) SELECT `id`,`label` FROM `staging`"
        );

        let mut stmt = conn.replace_select("table", select);
        stmt.select_mut().where_mut().eq("ready", true);
        assert_eq!(
            stmt.to_sql().unwrap(),
            "REPLACE `table` SELECT `id`,`label` FROM `staging` WHERE `ready`=1"
        );
    }
}
