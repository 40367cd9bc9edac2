//! Common types and helpers shared across all statement builders

use crate::escape::quote_name;
use crate::{Escaper, Result, Row};

/// Core trait for everything that renders to SQL text
pub trait QueryBuilder {
    /// Generate the SQL text.
    ///
    /// Rendering never mutates the builder, so an unchanged builder renders
    /// the same text every time.
    fn to_sql(&self) -> Result<String>;
}

/// Render `(`a`,`b`) VALUE (1,'x')` from an ordered row
pub fn prepare_row(escaper: &dyn Escaper, row: &Row) -> Result<String> {
    let mut names = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (name, value) in row {
        names.push(quote_name(name));
        values.push(escaper.escape(value)?);
    }
    Ok(format!("({}) VALUE ({})", names.join(","), values.join(",")))
}

/// Render `(`a`,`b`)`, or nothing for an empty list
pub fn prepare_cols<S: AsRef<str>>(cols: &[S]) -> String {
    if cols.is_empty() {
        return String::new();
    }
    let names: Vec<String> = cols.iter().map(|c| quote_name(c.as_ref())).collect();
    format!("({})", names.join(","))
}

/// Render `ON DUPLICATE KEY UPDATE `a`=1,...`
pub fn prepare_on_duplicate_key_update(escaper: &dyn Escaper, update: &Row) -> Result<String> {
    let assignments = prepare_assignments(escaper, update)?;
    Ok(format!("ON DUPLICATE KEY UPDATE {assignments}"))
}

/// Render `` `a`=1,`b`='x' `` assignment lists
pub(crate) fn prepare_assignments(escaper: &dyn Escaper, row: &Row) -> Result<String> {
    let parts = row
        .iter()
        .map(|(name, value)| Ok(format!("{}={}", quote_name(name), escaper.escape(value)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(","))
}

pub(crate) fn partition_clause(partition: &Option<String>) -> String {
    match partition {
        Some(p) if !p.is_empty() => format!(" PARTITION ({p})"),
        _ => String::new(),
    }
}

/// Generate consuming statement methods that forward to a condition builder
macro_rules! condition_shortcuts {
    ($accessor:ident => {
        $( $method:ident => $target:ident ( $($arg:ident : $ty:ty),* ); )*
    }) => {
        $(
            pub fn $method(mut self, $($arg: $ty),*) -> Self {
                self.$accessor().$target($($arg),*);
                self
            }
        )*
    };
}
pub(crate) use condition_shortcuts;

/// `where_*` / `or_where_*` forwarding methods for statements with a WHERE clause
macro_rules! where_shortcuts {
    () => {
        $crate::builder::common::condition_shortcuts!(where_mut => {
            where_cond => cond(condition: impl Into<$crate::Raw>);
            where_eq => eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_not_eq => not_eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_gt => gt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_lt => lt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_gte => gte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_lte => lte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_like => like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_not_like => not_like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            where_is_null => is_null(name: impl Into<$crate::Name>);
            where_is_not_null => is_not_null(name: impl Into<$crate::Name>);
            where_between => between(name: impl Into<$crate::Name>, start: impl Into<$crate::Value>, end: impl Into<$crate::Value>);
            where_in => in_(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            where_not_in => not_in(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            where_exists => exists(select: $crate::Select);
            where_not_exists => not_exists(select: $crate::Select);
            where_sub_where => sub_where(sub: $crate::Where);
            where_sub_fn => sub_fn(build: impl FnOnce(&mut $crate::Where));
            or_where_cond => or_cond(condition: impl Into<$crate::Raw>);
            or_where_eq => or_eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_not_eq => or_not_eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_gt => or_gt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_lt => or_lt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_gte => or_gte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_lte => or_lte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_like => or_like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_not_like => or_not_like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_where_is_null => or_is_null(name: impl Into<$crate::Name>);
            or_where_is_not_null => or_is_not_null(name: impl Into<$crate::Name>);
            or_where_between => or_between(name: impl Into<$crate::Name>, start: impl Into<$crate::Value>, end: impl Into<$crate::Value>);
            or_where_in => or_in(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            or_where_not_in => or_not_in(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            or_where_exists => or_exists(select: $crate::Select);
            or_where_not_exists => or_not_exists(select: $crate::Select);
            or_where_sub_where => or_sub_where(sub: $crate::Where);
            or_where_sub_fn => or_sub_fn(build: impl FnOnce(&mut $crate::Where));
        });
    };
}
pub(crate) use where_shortcuts;

/// `having_*` / `or_having_*` forwarding methods
macro_rules! having_shortcuts {
    () => {
        $crate::builder::common::condition_shortcuts!(having_mut => {
            having_cond => cond(condition: impl Into<$crate::Raw>);
            having_eq => eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_not_eq => not_eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_gt => gt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_lt => lt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_gte => gte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_lte => lte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_like => like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_not_like => not_like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            having_is_null => is_null(name: impl Into<$crate::Name>);
            having_is_not_null => is_not_null(name: impl Into<$crate::Name>);
            having_between => between(name: impl Into<$crate::Name>, start: impl Into<$crate::Value>, end: impl Into<$crate::Value>);
            having_in => in_(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            having_not_in => not_in(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            having_exists => exists(select: $crate::Select);
            having_not_exists => not_exists(select: $crate::Select);
            having_sub_where => sub_where(sub: $crate::Where);
            having_sub_fn => sub_fn(build: impl FnOnce(&mut $crate::Where));
            or_having_cond => or_cond(condition: impl Into<$crate::Raw>);
            or_having_eq => or_eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_not_eq => or_not_eq(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_gt => or_gt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_lt => or_lt(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_gte => or_gte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_lte => or_lte(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_like => or_like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_not_like => or_not_like(name: impl Into<$crate::Name>, value: impl Into<$crate::Value>);
            or_having_is_null => or_is_null(name: impl Into<$crate::Name>);
            or_having_is_not_null => or_is_not_null(name: impl Into<$crate::Name>);
            or_having_between => or_between(name: impl Into<$crate::Name>, start: impl Into<$crate::Value>, end: impl Into<$crate::Value>);
            or_having_in => or_in(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            or_having_not_in => or_not_in(name: impl Into<$crate::Name>, list: impl Into<$crate::InList>);
            or_having_exists => or_exists(select: $crate::Select);
            or_having_not_exists => or_not_exists(select: $crate::Select);
            or_having_sub_where => or_sub_where(sub: $crate::Where);
            or_having_sub_fn => or_sub_fn(build: impl FnOnce(&mut $crate::Where));
        });
    };
}
pub(crate) use having_shortcuts;
