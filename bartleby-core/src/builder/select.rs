//! SELECT statement builder

use std::sync::Arc;

use super::common::{having_shortcuts, where_shortcuts, QueryBuilder};
use super::order::{GroupBy, OrderBy, SortKey};
use super::table::{JoinClause, JoinOn, JoinType, TableFactor};
use crate::escape::quote_name;
use crate::{Error, Escaper, IntoRow, Name, Raw, Result, Value, Where};

/// What a select-list entry renders
#[derive(Debug, Clone)]
pub enum ColumnExpr {
    Name(Name),
    Select(Box<Select>),
    Raw(Raw),
}

/// One entry of the select list, optionally aliased
#[derive(Debug, Clone)]
pub struct Column {
    expr: ColumnExpr,
    alias: Option<String>,
}

/// Create a column selector for a plain or qualified name
///
/// # Examples
/// ```
/// use bartleby_core::{col, Connect, DebugConnection, QueryBuilder};
///
/// let conn = DebugConnection::new();
/// let sql = conn
///     .select("table", vec![col("id"), col("name").as_alias("label")])
///     .to_sql()
///     .unwrap();
/// assert_eq!(sql, "SELECT `id`,`name` AS `label` FROM `table`");
/// ```
pub fn col(name: impl Into<Name>) -> Column {
    Column {
        expr: ColumnExpr::Name(name.into()),
        alias: None,
    }
}

impl Column {
    pub fn raw(raw: impl Into<Raw>) -> Self {
        Column {
            expr: ColumnExpr::Raw(raw.into()),
            alias: None,
        }
    }

    /// Scalar sub-select in the select list
    pub fn select(select: Select) -> Self {
        Column {
            expr: ColumnExpr::Select(Box::new(select)),
            alias: None,
        }
    }

    /// Add alias to this column
    pub fn as_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn expr(&self) -> &ColumnExpr {
        &self.expr
    }

    fn render(&self, escaper: &dyn Escaper) -> Result<String> {
        let mut sql = match &self.expr {
            ColumnExpr::Name(name) => name.quoted(),
            ColumnExpr::Select(select) => format!("({})", select.to_sql()?),
            ColumnExpr::Raw(raw) => raw.render(escaper)?,
        };
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&quote_name(alias));
        }
        Ok(sql)
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        col(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        col(name)
    }
}

impl From<Name> for Column {
    fn from(name: Name) -> Self {
        col(name)
    }
}

impl From<Raw> for Column {
    fn from(raw: Raw) -> Self {
        Column::raw(raw)
    }
}

impl From<Select> for Column {
    fn from(select: Select) -> Self {
        Column::select(select)
    }
}

/// Columns coming from dynamic data: strings name a column, raw values
/// are inlined, anything else has no select-list meaning.
impl TryFrom<Value> for Column {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(col(name)),
            Value::Raw(raw) => Ok(Column::raw(raw)),
            other => Err(Error::unsupported_column(format!(
                "{} value in a select list",
                other.type_name()
            ))),
        }
    }
}

/// Trait for types that can be converted to a select list
pub trait IntoColumns {
    fn into_columns(self) -> Vec<Column>;
}

impl IntoColumns for () {
    fn into_columns(self) -> Vec<Column> {
        Vec::new()
    }
}

impl<T: Into<Column>> IntoColumns for Vec<T> {
    fn into_columns(self) -> Vec<Column> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Column>, const N: usize> IntoColumns for [T; N] {
    fn into_columns(self) -> Vec<Column> {
        self.into_iter().map(Into::into).collect()
    }
}

/// MySQL result-size hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSize {
    Small,
    Big,
}

/// SELECT statement builder.
///
/// `SELECT [DISTINCT ][STRAIGHT_JOIN ][SQL_SMALL_RESULT |SQL_BIG_RESULT ]<columns>
/// FROM <table><joins>[ WHERE ..][ GROUP BY ..][ HAVING ..][ ORDER BY ..][ LIMIT n[,offset]]`
#[derive(Debug, Clone)]
pub struct Select {
    escaper: Arc<dyn Escaper>,
    table: TableFactor,
    columns: Vec<Column>,
    joins: Vec<JoinClause>,
    where_conditions: Option<Where>,
    having_conditions: Option<Where>,
    group_by: GroupBy,
    order_by: OrderBy,
    limit_value: Option<u64>,
    offset_value: Option<u64>,
    distinct: bool,
    straight_join: bool,
    result_size: Option<ResultSize>,
}

impl Select {
    /// Create a new SELECT builder; an empty column list selects `*`
    pub fn new(
        escaper: Arc<dyn Escaper>,
        table: impl Into<TableFactor>,
        columns: impl IntoColumns,
    ) -> Self {
        Self {
            escaper,
            table: table.into(),
            columns: columns.into_columns(),
            joins: Vec::new(),
            where_conditions: None,
            having_conditions: None,
            group_by: GroupBy::new(),
            order_by: OrderBy::new(),
            limit_value: None,
            offset_value: None,
            distinct: false,
            straight_join: false,
            result_size: None,
        }
    }

    pub fn set_table(mut self, table: impl Into<TableFactor>) -> Self {
        self.table = table.into();
        self
    }

    pub fn set_columns(mut self, columns: impl IntoColumns) -> Self {
        self.columns = columns.into_columns();
        self
    }

    /// Append one select-list entry
    pub fn column(mut self, column: impl Into<Column>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn straight_join(mut self) -> Self {
        self.straight_join = true;
        self
    }

    pub fn sql_small_result(mut self) -> Self {
        self.result_size = Some(ResultSize::Small);
        self
    }

    pub fn sql_big_result(mut self) -> Self {
        self.result_size = Some(ResultSize::Big);
        self
    }

    /// Drop any result-size hint
    pub fn sql_default_result(mut self) -> Self {
        self.result_size = None;
        self
    }

    /// Set LIMIT and offset together. An offset without a limit is ignored.
    pub fn set_limit(mut self, limit: Option<u64>, offset: Option<u64>) -> Self {
        self.limit_value = limit;
        self.offset_value = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_value = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_value = Some(offset);
        self
    }

    /// Add a JOIN clause
    pub fn join(
        mut self,
        join_type: JoinType,
        table: impl Into<TableFactor>,
        on: Option<JoinOn>,
    ) -> Self {
        self.joins.push(JoinClause {
            join_type,
            table: table.into(),
            on,
        });
        self
    }

    pub fn inner_join(self, table: impl Into<TableFactor>, on: impl Into<JoinOn>) -> Self {
        self.join(JoinType::Inner, table, Some(on.into()))
    }

    pub fn left_join(self, table: impl Into<TableFactor>, on: impl Into<JoinOn>) -> Self {
        self.join(JoinType::Left, table, Some(on.into()))
    }

    pub fn right_join(self, table: impl Into<TableFactor>, on: impl Into<JoinOn>) -> Self {
        self.join(JoinType::Right, table, Some(on.into()))
    }

    pub fn cross_join(self, table: impl Into<TableFactor>) -> Self {
        self.join(JoinType::Cross, table, None)
    }

    pub fn straight_join_on(self, table: impl Into<TableFactor>, on: impl Into<JoinOn>) -> Self {
        self.join(JoinType::Straight, table, Some(on.into()))
    }

    /// Replace the WHERE builder
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

    pub fn set_having(mut self, conditions: Where) -> Self {
        self.having_conditions = Some(conditions);
        self
    }

    /// The HAVING builder, created on first use
    pub fn having_mut(&mut self) -> &mut Where {
        self.having_conditions
            .get_or_insert_with(|| Where::new(Arc::clone(&self.escaper)))
    }

    pub fn set_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn group_by(mut self, key: impl Into<SortKey>) -> Self {
        self.group_by.add(key);
        self
    }

    pub fn group_by_mut(&mut self) -> &mut GroupBy {
        &mut self.group_by
    }

    pub fn set_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn order_by_asc(mut self, key: impl Into<SortKey>) -> Self {
        self.order_by.asc(key);
        self
    }

    pub fn order_by_desc(mut self, key: impl Into<SortKey>) -> Self {
        self.order_by.desc(key);
        self
    }

    pub fn order_by_mut(&mut self) -> &mut OrderBy {
        &mut self.order_by
    }

    pub fn escaper(&self) -> &Arc<dyn Escaper> {
        &self.escaper
    }

    where_shortcuts!();
    having_shortcuts!();

    fn render_columns(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Ok("*".to_string());
        }
        let parts = self
            .columns
            .iter()
            .map(|c| c.render(self.escaper.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(","))
    }
}

/// Render ` KEYWORD <conditions>` or nothing when there are no conditions
pub(crate) fn condition_clause(keyword: &str, conditions: &Option<Where>) -> Result<String> {
    if let Some(conditions) = conditions {
        let sql = conditions.to_sql()?;
        if !sql.is_empty() {
            return Ok(format!(" {keyword} {sql}"));
        }
    }
    Ok(String::new())
}

impl QueryBuilder for Select {
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::from("SELECT ");

        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.straight_join {
            sql.push_str("STRAIGHT_JOIN ");
        }
        match self.result_size {
            Some(ResultSize::Small) => sql.push_str("SQL_SMALL_RESULT "),
            Some(ResultSize::Big) => sql.push_str("SQL_BIG_RESULT "),
            None => {}
        }

        sql.push_str(&self.render_columns()?);
        sql.push_str(" FROM ");
        sql.push_str(&self.table.to_sql()?);

        for join in &self.joins {
            sql.push_str(&join.to_sql()?);
        }

        sql.push_str(&condition_clause("WHERE", &self.where_conditions)?);

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.to_sql());
        }

        sql.push_str(&condition_clause("HAVING", &self.having_conditions)?);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.to_sql());
        }

        if let Some(limit) = self.limit_value {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset_value {
                sql.push_str(&format!(",{offset}"));
            }
        }

        Ok(sql)
    }
}
