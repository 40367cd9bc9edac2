//! ORDER BY / GROUP BY term lists

use crate::Name;

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// What a sort or group term refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Column name, backtick-quoted on render
    Column(Name),
    /// 1-based select-list position, rendered unquoted
    Position(u32),
    /// Trusted SQL expression, rendered verbatim
    Expr(String),
}

impl SortKey {
    fn render(&self) -> String {
        match self {
            SortKey::Column(name) => name.quoted(),
            SortKey::Position(pos) => pos.to_string(),
            SortKey::Expr(expr) => expr.clone(),
        }
    }
}

impl From<&str> for SortKey {
    fn from(name: &str) -> Self {
        SortKey::Column(name.into())
    }
}

impl From<String> for SortKey {
    fn from(name: String) -> Self {
        SortKey::Column(name.into())
    }
}

impl From<(&str, &str)> for SortKey {
    fn from(name: (&str, &str)) -> Self {
        SortKey::Column(name.into())
    }
}

impl From<Name> for SortKey {
    fn from(name: Name) -> Self {
        SortKey::Column(name)
    }
}

impl From<u32> for SortKey {
    fn from(pos: u32) -> Self {
        SortKey::Position(pos)
    }
}

/// An ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByClause {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Comma separated ORDER BY term list.
///
/// ASC is the server default and is never written out.
///
/// # Examples
/// ```
/// use bartleby_core::OrderBy;
///
/// let mut order = OrderBy::new();
/// order.desc("created_at").asc(2).expr_desc("LENGTH(`name`)");
/// assert_eq!(order.to_sql(), "`created_at` DESC,2,LENGTH(`name`) DESC");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    clauses: Vec<OrderByClause>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, key: SortKey, direction: SortDirection) -> &mut Self {
        self.clauses.push(OrderByClause { key, direction });
        self
    }

    pub fn asc(&mut self, key: impl Into<SortKey>) -> &mut Self {
        self.push(key.into(), SortDirection::Asc)
    }

    pub fn desc(&mut self, key: impl Into<SortKey>) -> &mut Self {
        self.push(key.into(), SortDirection::Desc)
    }

    pub fn expr_asc(&mut self, expr: impl Into<String>) -> &mut Self {
        self.push(SortKey::Expr(expr.into()), SortDirection::Asc)
    }

    pub fn expr_desc(&mut self, expr: impl Into<String>) -> &mut Self {
        self.push(SortKey::Expr(expr.into()), SortDirection::Desc)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[OrderByClause] {
        &self.clauses
    }

    pub fn to_sql(&self) -> String {
        self.clauses
            .iter()
            .map(|clause| match clause.direction {
                SortDirection::Asc => clause.key.render(),
                SortDirection::Desc => format!("{} DESC", clause.key.render()),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Comma separated GROUP BY term list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupBy {
    keys: Vec<SortKey>,
}

impl GroupBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<SortKey>) -> &mut Self {
        self.keys.push(key.into());
        self
    }

    pub fn expr(&mut self, expr: impl Into<String>) -> &mut Self {
        self.keys.push(SortKey::Expr(expr.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn to_sql(&self) -> String {
        self.keys
            .iter()
            .map(SortKey::render)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(OrderBy::new().to_sql(), "");
        assert_eq!(GroupBy::new().to_sql(), "");
        assert!(OrderBy::new().is_empty());
    }

    #[test]
    fn test_order_terms() {
        let mut order = OrderBy::new();
        order.asc("name").desc("id").asc(1).desc(3u32);
        assert_eq!(order.to_sql(), "`name`,`id` DESC,1,3 DESC");
    }

    #[test]
    fn test_order_expressions() {
        let mut order = OrderBy::new();
        order.expr_asc("RAND()").expr_desc("FIELD(`id`, 3, 1)");
        assert_eq!(order.to_sql(), "RAND(),FIELD(`id`, 3, 1) DESC");
    }

    #[test]
    fn test_order_qualified() {
        let mut order = OrderBy::new();
        order.desc(("o", "created_at"));
        assert_eq!(order.to_sql(), "`o`.`created_at` DESC");
        assert_eq!(order.clauses()[0].direction, SortDirection::Desc);
    }

    #[test]
    fn test_group_terms() {
        let mut group = GroupBy::new();
        group.add("department").add(2).expr("YEAR(`created_at`)");
        assert_eq!(group.to_sql(), "`department`,2,YEAR(`created_at`)");
    }
}
