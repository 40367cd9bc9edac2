//! Table factors and JOIN clauses

use super::common::{partition_clause, QueryBuilder};
use crate::escape::quote_name;
use crate::{Name, Result, Select, Where};

#[derive(Debug, Clone)]
enum TableSource {
    Named(String),
    Derived(Box<Select>),
}

/// A table reference: a named table or a derived table (sub-select).
///
/// Renders as
/// `` `table`[ PARTITION (p)][ AS `alias`][ index hints] `` or
/// `` (<select>)[ AS `alias`] ``.
#[derive(Debug, Clone)]
pub struct TableFactor {
    source: TableSource,
    alias: Option<String>,
    partition: Option<String>,
    index_hints: Option<String>,
}

impl TableFactor {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            source: TableSource::Named(table.into()),
            alias: None,
            partition: None,
            index_hints: None,
        }
    }

    /// Derived table; MySQL requires the alias
    pub fn derived(select: Select, alias: impl Into<String>) -> Self {
        Self {
            source: TableSource::Derived(Box::new(select)),
            alias: Some(alias.into()),
            partition: None,
            index_hints: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// Raw index hint list, e.g. `USE INDEX (idx_created)`
    pub fn index_hints(mut self, hints: impl Into<String>) -> Self {
        self.index_hints = Some(hints.into());
        self
    }

    /// Table name, `None` for a derived table
    pub fn name(&self) -> Option<&str> {
        match &self.source {
            TableSource::Named(name) => Some(name),
            TableSource::Derived(_) => None,
        }
    }
}

impl QueryBuilder for TableFactor {
    fn to_sql(&self) -> Result<String> {
        let alias = match &self.alias {
            Some(alias) if !alias.is_empty() => format!(" AS {}", quote_name(alias)),
            _ => String::new(),
        };
        Ok(match &self.source {
            TableSource::Named(name) => {
                let hints = match &self.index_hints {
                    Some(hints) if !hints.is_empty() => format!(" {hints}"),
                    _ => String::new(),
                };
                format!(
                    "{}{}{}{}",
                    quote_name(name),
                    partition_clause(&self.partition),
                    alias,
                    hints
                )
            }
            TableSource::Derived(select) => format!("({}){}", select.to_sql()?, alias),
        })
    }
}

impl From<&str> for TableFactor {
    fn from(table: &str) -> Self {
        TableFactor::new(table)
    }
}

impl From<String> for TableFactor {
    fn from(table: String) -> Self {
        TableFactor::new(table)
    }
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
    Straight,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Cross => "CROSS JOIN",
            JoinType::Straight => "STRAIGHT_JOIN",
        }
    }
}

/// Join condition
#[derive(Debug, Clone)]
pub enum JoinOn {
    /// `` ON `t1`.`c1`=`t2`.`c2` ``
    Columns(Name, Name),
    /// `ON <conditions>`
    Where(Where),
}

impl JoinOn {
    pub fn columns(left: impl Into<Name>, right: impl Into<Name>) -> Self {
        JoinOn::Columns(left.into(), right.into())
    }
}

impl From<Where> for JoinOn {
    fn from(conditions: Where) -> Self {
        JoinOn::Where(conditions)
    }
}

/// A JOIN clause
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableFactor,
    pub on: Option<JoinOn>,
}

impl QueryBuilder for JoinClause {
    fn to_sql(&self) -> Result<String> {
        let mut sql = format!(" {} {}", self.join_type.as_str(), self.table.to_sql()?);
        match &self.on {
            Some(JoinOn::Columns(left, right)) => {
                sql.push_str(&format!(" ON {}={}", left.quoted(), right.quoted()));
            }
            Some(JoinOn::Where(conditions)) if !conditions.is_empty() => {
                sql.push_str(" ON ");
                sql.push_str(&conditions.to_sql()?);
            }
            _ => {}
        }
        Ok(sql)
    }
}
