//! Multi-row INSERT / REPLACE builders and the lazy batch generator behind them

use std::iter::{Enumerate, FusedIterator};
use std::slice;
use std::sync::Arc;

use super::common::{partition_clause, prepare_on_duplicate_key_update};
use crate::escape::quote_name;
use crate::executor::Executor;
use crate::{Error, Escaper, IntoRow, Result, Row};

/// Rows per statement unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options shared by every bulk statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Rows per statement; 0 puts every row into one statement
    pub batch_size: usize,
    pub ignore: bool,
    /// Check every row against the first row's columns and reject extra
    /// columns that collide with row columns
    pub deep_validation: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            ignore: false,
            deep_validation: true,
        }
    }
}

/// Lazy sequence of multi-row statements.
///
/// Each item is `prefix + (tuple),(tuple),.. + suffix`. A row whose columns
/// differ from the first row yields an error at its position; the rows of the
/// unfinished batch are dropped and the iterator ends.
///
/// # Examples
/// ```
/// use bartleby_core::{row, BatchOptions, BatchQueries, DebugEscaper};
///
/// let rows = vec![row! { "id" => 1 }, row! { "id" => 2 }, row! { "id" => 3 }];
/// let options = BatchOptions { batch_size: 2, ..Default::default() };
/// let queries = BatchQueries::new(&DebugEscaper, "INSERT", "", "t", None, &rows, &Default::default(), options)
///     .unwrap()
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(queries, vec!["INSERT `t`(`id`) VALUE (1),(2)", "INSERT `t`(`id`) VALUE (3)"]);
/// ```
#[derive(Debug)]
pub struct BatchQueries<'a> {
    escaper: &'a dyn Escaper,
    prefix: String,
    suffix: String,
    extra_values: String,
    signature: Option<String>,
    rows: Enumerate<slice::Iter<'a, Row>>,
    batch_size: usize,
    finished: bool,
}

fn row_signature(row: &Row) -> String {
    row.keys().map(String::as_str).collect::<Vec<_>>().join(":")
}

impl<'a> BatchQueries<'a> {
    /// Build the generator. Fails immediately on an empty row set, on extra
    /// columns colliding with row columns, or on an unescapable extra value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        escaper: &'a dyn Escaper,
        verb: &str,
        suffix: &str,
        table: &str,
        partition: Option<&str>,
        rows: &'a [Row],
        extra: &Row,
        options: BatchOptions,
    ) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyRowSet)?;

        if options.deep_validation {
            if let Some(name) = first.keys().find(|name| extra.contains_key(*name)) {
                return Err(Error::duplicate_column(name));
            }
        }

        let names: Vec<String> = extra
            .keys()
            .chain(first.keys())
            .map(|name| quote_name(name))
            .collect();

        let mut prefix = String::from(verb);
        if options.ignore {
            prefix.push_str(" IGNORE");
        }
        prefix.push(' ');
        prefix.push_str(&quote_name(table));
        prefix.push_str(&partition_clause(&partition.map(str::to_string)));
        prefix.push('(');
        prefix.push_str(&names.join(","));
        prefix.push_str(") VALUE ");

        let mut extra_values = String::new();
        for value in extra.values() {
            extra_values.push_str(&escaper.escape(value)?);
            extra_values.push(',');
        }

        Ok(Self {
            escaper,
            prefix,
            suffix: suffix.to_string(),
            extra_values,
            signature: options.deep_validation.then(|| row_signature(first)),
            rows: rows.iter().enumerate(),
            batch_size: options.batch_size,
            finished: false,
        })
    }

    fn render_tuple(&self, index: usize, row: &Row) -> Result<String> {
        if let Some(expected) = &self.signature {
            let found = row_signature(row);
            if *expected != found {
                return Err(Error::RowShapeMismatch {
                    row: index + 1,
                    expected: expected.clone(),
                    found,
                });
            }
        }
        let values = row
            .values()
            .map(|value| self.escaper.escape(value))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({}{})", self.extra_values, values.join(",")))
    }
}

impl BatchQueries<'_> {
    /// Check the shape and escape every value of the rows not yet yielded,
    /// keeping no rendered text.
    pub fn validate(&self) -> Result<()> {
        for (index, row) in self.rows.clone() {
            self.render_tuple(index, row)?;
        }
        Ok(())
    }
}

impl Iterator for BatchQueries<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut tuples = Vec::new();
        while let Some((index, row)) = self.rows.next() {
            match self.render_tuple(index, row) {
                Ok(tuple) => tuples.push(tuple),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
            if self.batch_size != 0 && tuples.len() == self.batch_size {
                return Some(Ok(self.assemble(&tuples)));
            }
        }

        self.finished = true;
        if tuples.is_empty() {
            None
        } else {
            Some(Ok(self.assemble(&tuples)))
        }
    }
}

impl FusedIterator for BatchQueries<'_> {}

impl BatchQueries<'_> {
    fn assemble(&self, tuples: &[String]) -> String {
        format!("{}{}{}", self.prefix, tuples.join(","), self.suffix)
    }
}

/// Validate every remaining row, then render and send one batch at a time.
/// Returns the summed affected-row count.
async fn exec_batches<E: Executor>(queries: BatchQueries<'_>, executor: &E) -> Result<u64> {
    queries.validate()?;
    let mut affected = 0;
    for (batch, sql) in queries.enumerate() {
        let result = executor.exec(&sql?).await?;
        affected += result.rows_affected();
        tracing::trace!(batch = batch + 1, affected, "bulk batch executed");
    }
    Ok(affected)
}

/// Setters shared by the bulk builders
macro_rules! bulk_setters {
    () => {
        pub fn set_table(mut self, table: impl Into<String>) -> Self {
            self.table_name = table.into();
            self
        }

        pub fn set_rows<I, R>(mut self, rows: I) -> Self
        where
            I: IntoIterator<Item = R>,
            R: IntoRow,
        {
            self.rows = rows.into_iter().map(IntoRow::into_row).collect();
            self
        }

        pub fn add_row(mut self, row: impl IntoRow) -> Self {
            self.rows.push(row.into_row());
            self
        }

        /// Rows per statement; 0 puts every row into one statement
        pub fn batch(mut self, batch_size: usize) -> Self {
            self.options.batch_size = batch_size;
            self
        }

        /// Columns prepended to every row with the same value
        pub fn add_to_row(mut self, extra: impl IntoRow) -> Self {
            self.add_to_row = extra.into_row();
            self
        }

        pub fn partition(mut self, partition: impl Into<String>) -> Self {
            self.partition = Some(partition.into());
            self
        }

        pub fn deep_validation(mut self, enabled: bool) -> Self {
            self.options.deep_validation = enabled;
            self
        }

        pub fn rows(&self) -> &[Row] {
            &self.rows
        }
    };
}

/// Multi-row INSERT split into batches.
///
/// # Examples
/// ```
/// use bartleby_core::{row, Connect, DebugConnection};
///
/// let conn = DebugConnection::new();
/// let bulk = conn
///     .insert_bulk("table", vec![
///         row! { "id" => 1, "label" => "hello" },
///         row! { "id" => 2, "label" => "world" },
///         row! { "id" => 3, "label" => "privet" },
///     ])
///     .batch(2);
/// let queries = bulk.queries().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
/// assert_eq!(queries, vec![
///     "INSERT `table`(`id`,`label`) VALUE (1,'hello'),(2,'world')",
///     "INSERT `table`(`id`,`label`) VALUE (3,'privet')",
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct InsertBulk {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    rows: Vec<Row>,
    add_to_row: Row,
    partition: Option<String>,
    on_duplicate_key_update: Row,
    options: BatchOptions,
}

impl InsertBulk {
    pub fn new<I, R>(escaper: Arc<dyn Escaper>, table: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoRow,
    {
        Self {
            escaper,
            table_name: table.into(),
            rows: rows.into_iter().map(IntoRow::into_row).collect(),
            add_to_row: Row::new(),
            partition: None,
            on_duplicate_key_update: Row::new(),
            options: BatchOptions::default(),
        }
    }

    bulk_setters!();

    pub fn ignore(mut self) -> Self {
        self.options.ignore = true;
        self
    }

    pub fn on_duplicate_key_update(mut self, update: impl IntoRow) -> Self {
        self.on_duplicate_key_update = update.into_row();
        self
    }

    pub fn queries(&self) -> Result<BatchQueries<'_>> {
        let suffix = if self.on_duplicate_key_update.is_empty() {
            String::new()
        } else {
            format!(
                " {}",
                prepare_on_duplicate_key_update(
                    self.escaper.as_ref(),
                    &self.on_duplicate_key_update
                )?
            )
        };
        BatchQueries::new(
            self.escaper.as_ref(),
            "INSERT",
            &suffix,
            &self.table_name,
            self.partition.as_deref(),
            &self.rows,
            &self.add_to_row,
            self.options,
        )
    }

    /// Execute every batch; returns the summed affected-row count
    pub async fn exec<E: Executor>(&self, executor: &E) -> Result<u64> {
        exec_batches(self.queries()?, executor).await
    }
}

/// Multi-row REPLACE split into batches
#[derive(Debug, Clone)]
pub struct ReplaceBulk {
    escaper: Arc<dyn Escaper>,
    table_name: String,
    rows: Vec<Row>,
    add_to_row: Row,
    partition: Option<String>,
    options: BatchOptions,
}

impl ReplaceBulk {
    pub fn new<I, R>(escaper: Arc<dyn Escaper>, table: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoRow,
    {
        Self {
            escaper,
            table_name: table.into(),
            rows: rows.into_iter().map(IntoRow::into_row).collect(),
            add_to_row: Row::new(),
            partition: None,
            options: BatchOptions::default(),
        }
    }

    bulk_setters!();

    pub fn queries(&self) -> Result<BatchQueries<'_>> {
        BatchQueries::new(
            self.escaper.as_ref(),
            "REPLACE",
            "",
            &self.table_name,
            self.partition.as_deref(),
            &self.rows,
            &self.add_to_row,
            self.options,
        )
    }

    pub async fn exec<E: Executor>(&self, executor: &E) -> Result<u64> {
        exec_batches(self.queries()?, executor).await
    }
}
