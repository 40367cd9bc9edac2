//! WHERE / HAVING condition builder

use std::sync::Arc;

use super::common::QueryBuilder;
use crate::{Escaper, Name, Raw, Result, Select, Value};

/// How a predicate is joined to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereConnector {
    And,
    Or,
}

impl WhereConnector {
    /// Separator placed before the predicate.
    ///
    /// OR carries two trailing spaces so both tokens are five bytes wide.
    pub fn as_str(&self) -> &'static str {
        match self {
            WhereConnector::And => " AND ",
            WhereConnector::Or => " OR  ",
        }
    }
}

/// Comparison operator of a single-value predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("<>");
    pub const GT: Self = Operator(">");
    pub const LT: Self = Operator("<");
    pub const GTE: Self = Operator(">=");
    pub const LTE: Self = Operator("<=");
    pub const LIKE: Self = Operator(" LIKE ");
    pub const NOT_LIKE: Self = Operator(" NOT LIKE ");

    /// Get the string representation of the operator, including spacing
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// Right-hand side of an IN predicate
#[derive(Debug, Clone)]
pub enum InList {
    Values(Vec<Value>),
    Select(Box<Select>),
}

impl<T: Into<Value>> From<Vec<T>> for InList {
    fn from(values: Vec<T>) -> Self {
        InList::Values(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for InList {
    fn from(values: &[T]) -> Self {
        InList::Values(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for InList {
    fn from(values: [T; N]) -> Self {
        InList::Values(values.into_iter().map(Into::into).collect())
    }
}

impl From<Select> for InList {
    fn from(select: Select) -> Self {
        InList::Select(Box::new(select))
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    Raw(Raw),
    Compare {
        name: Name,
        operator: Operator,
        value: Value,
    },
    Null {
        name: Name,
        negated: bool,
    },
    Between {
        name: Name,
        start: Value,
        end: Value,
    },
    In {
        name: Name,
        list: InList,
        negated: bool,
    },
    Exists {
        select: Box<Select>,
        negated: bool,
    },
    Group(Where),
}

/// A WHERE condition: one predicate and its connector
#[derive(Debug, Clone)]
struct WhereCondition {
    connector: WhereConnector,
    predicate: Predicate,
}

/// Accumulates AND/OR joined predicates.
///
/// Used for WHERE, HAVING and JOIN ... ON clauses. Values are escaped when
/// the builder is rendered, with the escaper it was created with.
///
/// # Examples
/// ```
/// use bartleby_core::{Connect, DebugConnection, QueryBuilder};
///
/// let conn = DebugConnection::new();
/// let mut w = conn.where_();
/// w.eq("id", 1).or_eq("label", "hello");
/// assert_eq!(w.to_sql().unwrap(), "`id`=1 OR  `label`='hello'");
/// ```
#[derive(Debug, Clone)]
pub struct Where {
    escaper: Arc<dyn Escaper>,
    conditions: Vec<WhereCondition>,
}

impl Where {
    pub fn new(escaper: Arc<dyn Escaper>) -> Self {
        Self {
            escaper,
            conditions: Vec::new(),
        }
    }

    pub fn escaper(&self) -> &Arc<dyn Escaper> {
        &self.escaper
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    fn push(&mut self, connector: WhereConnector, predicate: Predicate) -> &mut Self {
        self.conditions.push(WhereCondition {
            connector,
            predicate,
        });
        self
    }

    fn compare(
        &mut self,
        connector: WhereConnector,
        name: impl Into<Name>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push(
            connector,
            Predicate::Compare {
                name: name.into(),
                operator,
                value: value.into(),
            },
        )
    }

    fn sub_builder(&self, build: impl FnOnce(&mut Where)) -> Where {
        let mut sub = Where::new(Arc::clone(&self.escaper));
        build(&mut sub);
        sub
    }

    /// Raw condition, wrapped in parentheses
    ///
    /// ```
    /// use bartleby_core::{Connect, DebugConnection, QueryBuilder, Raw};
    ///
    /// let conn = DebugConnection::new();
    /// let mut w = conn.where_();
    /// w.cond(Raw::new("`foo`=%s or `foo` is null").bind("boo"));
    /// assert_eq!(w.to_sql().unwrap(), "(`foo`='boo' or `foo` is null)");
    /// ```
    pub fn cond(&mut self, condition: impl Into<Raw>) -> &mut Self {
        self.push(WhereConnector::And, Predicate::Raw(condition.into()))
    }

    pub fn eq(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::EQ, value)
    }

    pub fn not_eq(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::NEQ, value)
    }

    pub fn gt(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::GT, value)
    }

    pub fn lt(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::LT, value)
    }

    pub fn gte(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::GTE, value)
    }

    pub fn lte(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::LTE, value)
    }

    /// `LIKE` with the caller's own `%` / `_` wildcards inside the value
    pub fn like(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::LIKE, value)
    }

    pub fn not_like(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::And, name, Operator::NOT_LIKE, value)
    }

    pub fn is_null(&mut self, name: impl Into<Name>) -> &mut Self {
        let name = name.into();
        self.push(WhereConnector::And, Predicate::Null { name, negated: false })
    }

    pub fn is_not_null(&mut self, name: impl Into<Name>) -> &mut Self {
        let name = name.into();
        self.push(WhereConnector::And, Predicate::Null { name, negated: true })
    }

    pub fn between(
        &mut self,
        name: impl Into<Name>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> &mut Self {
        let predicate = Predicate::Between {
            name: name.into(),
            start: start.into(),
            end: end.into(),
        };
        self.push(WhereConnector::And, predicate)
    }

    /// `IN` against literal values or a sub-select.
    ///
    /// An empty value list renders the always-false `0=1`.
    pub fn in_(&mut self, name: impl Into<Name>, list: impl Into<InList>) -> &mut Self {
        let predicate = Predicate::In {
            name: name.into(),
            list: list.into(),
            negated: false,
        };
        self.push(WhereConnector::And, predicate)
    }

    /// `NOT IN`; an empty value list renders the always-true `1=1`
    pub fn not_in(&mut self, name: impl Into<Name>, list: impl Into<InList>) -> &mut Self {
        let predicate = Predicate::In {
            name: name.into(),
            list: list.into(),
            negated: true,
        };
        self.push(WhereConnector::And, predicate)
    }

    pub fn exists(&mut self, select: Select) -> &mut Self {
        let select = Box::new(select);
        self.push(WhereConnector::And, Predicate::Exists { select, negated: false })
    }

    pub fn not_exists(&mut self, select: Select) -> &mut Self {
        let select = Box::new(select);
        self.push(WhereConnector::And, Predicate::Exists { select, negated: true })
    }

    /// Inline another builder as a parenthesized group; an empty one adds nothing
    pub fn sub_where(&mut self, sub: Where) -> &mut Self {
        self.push_group(WhereConnector::And, sub)
    }

    /// Build a parenthesized group in place.
    ///
    /// The closure receives a fresh builder sharing this builder's escaper.
    ///
    /// ```
    /// use bartleby_core::{Connect, DebugConnection, QueryBuilder};
    ///
    /// let conn = DebugConnection::new();
    /// let mut w = conn.where_();
    /// w.eq("active", true).sub_fn(|sub| {
    ///     sub.eq("role", "admin").or_gt("karma", 100);
    /// });
    /// assert_eq!(
    ///     w.to_sql().unwrap(),
    ///     "`active`=1 AND (`role`='admin' OR  `karma`>100)"
    /// );
    /// ```
    pub fn sub_fn(&mut self, build: impl FnOnce(&mut Where)) -> &mut Self {
        let sub = self.sub_builder(build);
        self.push_group(WhereConnector::And, sub)
    }

    pub fn or_cond(&mut self, condition: impl Into<Raw>) -> &mut Self {
        self.push(WhereConnector::Or, Predicate::Raw(condition.into()))
    }

    pub fn or_eq(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::EQ, value)
    }

    pub fn or_not_eq(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::NEQ, value)
    }

    pub fn or_gt(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::GT, value)
    }

    pub fn or_lt(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::LT, value)
    }

    pub fn or_gte(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::GTE, value)
    }

    pub fn or_lte(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::LTE, value)
    }

    pub fn or_like(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::LIKE, value)
    }

    pub fn or_not_like(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> &mut Self {
        self.compare(WhereConnector::Or, name, Operator::NOT_LIKE, value)
    }

    pub fn or_is_null(&mut self, name: impl Into<Name>) -> &mut Self {
        let name = name.into();
        self.push(WhereConnector::Or, Predicate::Null { name, negated: false })
    }

    pub fn or_is_not_null(&mut self, name: impl Into<Name>) -> &mut Self {
        let name = name.into();
        self.push(WhereConnector::Or, Predicate::Null { name, negated: true })
    }

    pub fn or_between(
        &mut self,
        name: impl Into<Name>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> &mut Self {
        let predicate = Predicate::Between {
            name: name.into(),
            start: start.into(),
            end: end.into(),
        };
        self.push(WhereConnector::Or, predicate)
    }

    pub fn or_in(&mut self, name: impl Into<Name>, list: impl Into<InList>) -> &mut Self {
        let predicate = Predicate::In {
            name: name.into(),
            list: list.into(),
            negated: false,
        };
        self.push(WhereConnector::Or, predicate)
    }

    pub fn or_not_in(&mut self, name: impl Into<Name>, list: impl Into<InList>) -> &mut Self {
        let predicate = Predicate::In {
            name: name.into(),
            list: list.into(),
            negated: true,
        };
        self.push(WhereConnector::Or, predicate)
    }

    pub fn or_exists(&mut self, select: Select) -> &mut Self {
        let select = Box::new(select);
        self.push(WhereConnector::Or, Predicate::Exists { select, negated: false })
    }

    pub fn or_not_exists(&mut self, select: Select) -> &mut Self {
        let select = Box::new(select);
        self.push(WhereConnector::Or, Predicate::Exists { select, negated: true })
    }

    pub fn or_sub_where(&mut self, sub: Where) -> &mut Self {
        self.push_group(WhereConnector::Or, sub)
    }

    pub fn or_sub_fn(&mut self, build: impl FnOnce(&mut Where)) -> &mut Self {
        let sub = self.sub_builder(build);
        self.push_group(WhereConnector::Or, sub)
    }

    fn push_group(&mut self, connector: WhereConnector, sub: Where) -> &mut Self {
        if sub.is_empty() {
            return self;
        }
        self.push(connector, Predicate::Group(sub))
    }

    fn escape(&self, value: &Value) -> Result<String> {
        self.escaper.escape(value)
    }

    fn render_predicate(&self, predicate: &Predicate) -> Result<String> {
        Ok(match predicate {
            Predicate::Raw(raw) => format!("({})", raw.render(self.escaper.as_ref())?),
            Predicate::Compare {
                name,
                operator,
                value,
            } => format!("{}{}{}", name.quoted(), operator.as_str(), self.escape(value)?),
            Predicate::Null { name, negated } => format!(
                "{} IS {}NULL",
                name.quoted(),
                if *negated { "NOT " } else { "" }
            ),
            Predicate::Between { name, start, end } => format!(
                "{} BETWEEN {} AND {}",
                name.quoted(),
                self.escape(start)?,
                self.escape(end)?
            ),
            Predicate::In {
                list: InList::Values(values),
                negated,
                ..
            } if values.is_empty() => {
                if *negated { "1=1" } else { "0=1" }.to_string()
            }
            Predicate::In {
                name,
                list,
                negated,
            } => {
                let items = match list {
                    InList::Values(values) => values
                        .iter()
                        .map(|v| self.escape(v))
                        .collect::<Result<Vec<_>>>()?
                        .join(","),
                    InList::Select(select) => select.to_sql()?,
                };
                format!(
                    "{} {}IN ({})",
                    name.quoted(),
                    if *negated { "NOT " } else { "" },
                    items
                )
            }
            Predicate::Exists { select, negated } => format!(
                "{}EXISTS ({})",
                if *negated { "NOT " } else { "" },
                select.to_sql()?
            ),
            Predicate::Group(sub) => format!("({})", sub.to_sql()?),
        })
    }
}

impl QueryBuilder for Where {
    /// Render the predicates. The first connector is never emitted and an
    /// empty builder renders an empty string.
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::new();
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(condition.connector.as_str());
            }
            sql.push_str(&self.render_predicate(&condition.predicate)?);
        }
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Connect, DebugConnection};

    fn w() -> Where {
        DebugConnection::new().where_()
    }

    fn sql(w: &Where) -> String {
        w.to_sql().unwrap()
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(sql(&w()), "");
        assert!(w().is_empty());
    }

    #[test]
    fn test_cond() {
        let mut a = w();
        a.cond(Raw::new("foo=%s or foo in null").bind("boo"));
        assert_eq!(sql(&a), "(foo='boo' or foo in null)");

        let mut b = w();
        b.cond("`a` > `b`");
        assert_eq!(sql(&b), "(`a` > `b`)");
    }

    fn one(build: impl FnOnce(&mut Where)) -> String {
        let mut builder = w();
        build(&mut builder);
        sql(&builder)
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(one(|w| { w.eq("foo", "boo"); }), "`foo`='boo'");
        assert_eq!(one(|w| { w.not_eq("foo", "boo"); }), "`foo`<>'boo'");
        assert_eq!(one(|w| { w.gt("foo", 1); }), "`foo`>1");
        assert_eq!(one(|w| { w.lt("foo", 1); }), "`foo`<1");
        assert_eq!(one(|w| { w.gte("foo", 1); }), "`foo`>=1");
        assert_eq!(one(|w| { w.lte("foo", 1); }), "`foo`<=1");
        assert_eq!(one(|w| { w.like("foo", "%boo"); }), "`foo` LIKE '%boo'");
        assert_eq!(one(|w| { w.not_like("foo", "boo%"); }), "`foo` NOT LIKE 'boo%'");
        assert_eq!(one(|w| { w.is_null("foo"); }), "`foo` IS NULL");
        assert_eq!(one(|w| { w.is_not_null("foo"); }), "`foo` IS NOT NULL");
        assert_eq!(one(|w| { w.between("foo", 1, 2); }), "`foo` BETWEEN 1 AND 2");
        assert_eq!(one(|w| { w.in_("foo", vec![1, 2]); }), "`foo` IN (1,2)");
        assert_eq!(one(|w| { w.not_in("foo", [1, 2]); }), "`foo` NOT IN (1,2)");
    }

    #[test]
    fn test_or_forms_use_double_space() {
        let mut b = w();
        b.eq("id", 1)
            .or_eq("label", "hello")
            .eq("x", 2)
            .or_is_null("y")
            .or_between("z", 1, 5);
        assert_eq!(
            sql(&b),
            "`id`=1 OR  `label`='hello' AND `x`=2 OR  `y` IS NULL OR  `z` BETWEEN 1 AND 5"
        );
    }

    #[test]
    fn test_first_connector_is_dropped() {
        let mut b = w();
        b.or_eq("a", 1).eq("b", 2);
        assert_eq!(sql(&b), "`a`=1 AND `b`=2");
    }

    #[test]
    fn test_qualified_names() {
        let mut b = w();
        b.eq(("users", "id"), 5).or_like(["u", "name"], "a%");
        assert_eq!(sql(&b), "`users`.`id`=5 OR  `u`.`name` LIKE 'a%'");
    }

    #[test]
    fn test_empty_in_lists() {
        let empty: Vec<i32> = Vec::new();
        let mut a = w();
        a.eq("x", 1).in_("foo", empty.clone());
        assert_eq!(sql(&a), "`x`=1 AND 0=1");

        let mut b = w();
        b.eq("x", 1).or_in("foo", empty.clone());
        assert_eq!(sql(&b), "`x`=1 OR  0=1");

        let mut c = w();
        c.eq("x", 1).not_in("foo", empty.clone()).or_not_in("bar", empty);
        assert_eq!(sql(&c), "`x`=1 AND 1=1 OR  1=1");
    }

    #[test]
    fn test_in_and_exists_subselect() {
        let conn = DebugConnection::new();
        let sub = conn.select("roles", vec!["user_id"]).where_eq("name", "admin");
        let expected = "SELECT `user_id` FROM `roles` WHERE `name`='admin'";

        let mut a = w();
        a.in_("id", sub.clone()).or_not_in("id", sub.clone());
        assert_eq!(
            sql(&a),
            format!("`id` IN ({expected}) OR  `id` NOT IN ({expected})")
        );

        let mut b = w();
        b.exists(sub.clone()).or_not_exists(sub);
        assert_eq!(
            sql(&b),
            format!("EXISTS ({expected}) OR  NOT EXISTS ({expected})")
        );
    }

    #[test]
    fn test_sub_where_and_sub_fn_match() {
        let mut inner = w();
        inner.eq("foo", 1).or_eq("bar", 2);

        let mut via_where = w();
        via_where.eq("a", 0).or_sub_where(inner);

        let mut via_fn = w();
        via_fn.eq("a", 0).or_sub_fn(|sub| {
            sub.eq("foo", 1).or_eq("bar", 2);
        });

        assert_eq!(sql(&via_where), "`a`=0 OR  (`foo`=1 OR  `bar`=2)");
        assert_eq!(sql(&via_where), sql(&via_fn));
    }

    #[test]
    fn test_empty_group_adds_nothing() {
        let mut b = w();
        b.sub_where(w()).eq("a", 1).or_sub_fn(|_| {}).sub_fn(|sub| {
            sub.sub_fn(|_| {});
        });
        assert_eq!(sql(&b), "`a`=1");

        let conn = DebugConnection::new();
        let select = conn.select("t", ()).where_sub_fn(|_| {});
        assert_eq!(select.to_sql().unwrap(), "SELECT * FROM `t`");
    }

    #[test]
    fn test_rerender_is_stable_and_late_mutation_shows() {
        let mut b = w();
        b.eq("name", "O'Brien");
        let first = sql(&b);
        assert_eq!(first, sql(&b));
        assert_eq!(first, "`name`='O\\'Brien'");

        b.gt("age", 18);
        assert_eq!(sql(&b), "`name`='O\\'Brien' AND `age`>18");
    }

    #[test]
    fn test_render_surfaces_errors() {
        let mut b = w();
        b.eq("ratio", f64::NAN);
        assert!(matches!(
            b.to_sql(),
            Err(crate::Error::UnescapableValueKind { .. })
        ));

        let mut c = w();
        c.cond(Raw::new("`a`=%s AND `b`=%s").bind(1));
        assert!(matches!(c.to_sql(), Err(crate::Error::Format { .. })));
    }
}
