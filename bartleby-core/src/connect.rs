//! Connections: statement factories bound to an escaper, configuration, and
//! the live MySQL connection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::builder::{
    Delete, Insert, InsertBulk, InsertSelect, IntoColumns, Replace, ReplaceBulk, ReplaceSelect,
    Select, TableFactor, Update,
};
use crate::executor::Executor;
use crate::{Error, Escaper, IntoRow, Raw, Result, Value, Where};

/// Statement factories for a connection.
///
/// Every builder made here escapes with the connection's escaper, so its text
/// is valid for that server's SQL mode.
///
/// # Examples
/// ```
/// use bartleby_core::{Connect, DebugConnection, QueryBuilder};
///
/// let conn = DebugConnection::new();
/// let sql = conn.delete("sessions").where_lt("expires", 100).to_sql().unwrap();
/// assert_eq!(sql, "DELETE FROM `sessions` WHERE `expires`<100");
/// ```
pub trait Connect: Executor {
    fn escaper(&self) -> Arc<dyn Escaper>;

    /// Escape one value as an SQL literal
    fn escape(&self, value: impl Into<Value>) -> Result<String> {
        self.escaper().escape(&value.into())
    }

    fn where_(&self) -> Where {
        Where::new(self.escaper())
    }

    fn raw(&self, expression: impl Into<String>) -> Raw {
        Raw::new(expression)
    }

    fn select(&self, table: impl Into<TableFactor>, columns: impl IntoColumns) -> Select {
        Select::new(self.escaper(), table, columns)
    }

    fn insert(&self, table: impl Into<String>, row: impl IntoRow) -> Insert {
        Insert::new(self.escaper(), table, row)
    }

    fn insert_select(&self, table: impl Into<String>, select: Select) -> InsertSelect {
        InsertSelect::new(self.escaper(), table, select)
    }

    fn insert_bulk<I, R>(&self, table: impl Into<String>, rows: I) -> InsertBulk
    where
        I: IntoIterator<Item = R>,
        R: IntoRow,
    {
        InsertBulk::new(self.escaper(), table, rows)
    }

    fn replace(&self, table: impl Into<String>, row: impl IntoRow) -> Replace {
        Replace::new(self.escaper(), table, row)
    }

    fn replace_select(&self, table: impl Into<String>, select: Select) -> ReplaceSelect {
        ReplaceSelect::new(table, select)
    }

    fn replace_bulk<I, R>(&self, table: impl Into<String>, rows: I) -> ReplaceBulk
    where
        I: IntoIterator<Item = R>,
        R: IntoRow,
    {
        ReplaceBulk::new(self.escaper(), table, rows)
    }

    fn update(&self, table: impl Into<String>) -> Update {
        Update::new(self.escaper(), table)
    }

    fn delete(&self, table: impl Into<String>) -> Delete {
        Delete::new(self.escaper(), table)
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Connection tries before giving up
    pub connect_attempts: u32,
    pub connect_timeout_secs: f64,
    /// Statements run on every new connection, in order
    pub init_commands: Vec<String>,
    pub max_connections: u32,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            connect_attempts: 2,
            connect_timeout_secs: 1.0,
            init_commands: Vec::new(),
            max_connections: 10,
        }
    }
}

impl ConnectConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if self.connect_attempts == 0 {
            return Err(Error::config("connect_attempts must be at least 1"));
        }
        if !self.connect_timeout_secs.is_finite() || self.connect_timeout_secs <= 0.0 {
            return Err(Error::config(format!(
                "connect_timeout_secs must be a positive number, got {}",
                self.connect_timeout_secs
            )));
        }
        if self.max_connections == 0 {
            return Err(Error::config("max_connections must be at least 1"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }
}

/// Live MySQL connection over an sqlx pool
#[cfg(feature = "mysql")]
pub mod mysql {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use futures::TryStreamExt;
    use serde_json::Value as JsonValue;
    use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
    use sqlx::{Column, Either, Executor as SqlxExecutor, Row, TypeInfo, ValueRef};

    use super::{Connect, ConnectConfig};
    use crate::executor::{Executor, QueryResult, ResultSet};
    use crate::{Escaper, MySqlEscaper, Result};

    /// Pooled MySQL connection.
    ///
    /// Statements go over the text protocol exactly as rendered. The escaper
    /// follows the session's `NO_BACKSLASH_ESCAPES` setting and client charset
    /// read at connect. Changing either later with a raw `SET` is not tracked.
    #[derive(Debug)]
    pub struct MySqlConnection {
        pool: MySqlPool,
        escaper: Arc<MySqlEscaper>,
        config: ConnectConfig,
        last_insert_id: AtomicU64,
        last_affected_rows: AtomicU64,
    }

    fn pool_options(config: &ConnectConfig) -> MySqlPoolOptions {
        let init_commands = Arc::new(config.init_commands.clone());
        MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .after_connect(move |conn, _meta| {
                let init_commands = Arc::clone(&init_commands);
                Box::pin(async move {
                    for command in init_commands.iter() {
                        (&mut *conn).execute(command.as_str()).await?;
                    }
                    Ok(())
                })
            })
    }

    /// Escaper for the `sql_mode` and client charset left by the init commands
    async fn session_escaper(pool: &MySqlPool) -> Result<MySqlEscaper> {
        let (sql_mode, charset): (Vec<u8>, Vec<u8>) =
            sqlx::query_as("SELECT @@SESSION.sql_mode, @@SESSION.character_set_client")
                .fetch_one(pool)
                .await?;
        MySqlEscaper::from_session(
            &String::from_utf8_lossy(&sql_mode),
            &String::from_utf8_lossy(&charset),
        )
    }

    impl MySqlConnection {
        /// Connect, retrying up to `connect_attempts` times
        pub async fn connect(config: ConnectConfig) -> Result<Self> {
            config.validate()?;

            let options = MySqlConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.username)
                .password(&config.password)
                .database(&config.database);

            let started = Instant::now();
            let mut attempt = 0;
            let pool = loop {
                attempt += 1;
                match pool_options(&config).connect_with(options.clone()).await {
                    Ok(pool) => break pool,
                    Err(err) if attempt < config.connect_attempts => {
                        tracing::warn!(
                            host = %config.host,
                            port = config.port,
                            attempt,
                            error = %err,
                            "connect attempt failed"
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            let escaper = session_escaper(&pool).await?;

            tracing::debug!(
                host = %config.host,
                port = config.port,
                database = %config.database,
                attempts = attempt,
                no_backslash_escapes = escaper.no_backslash_escapes(),
                charset = escaper.charset(),
                runtime_ms = started.elapsed().as_secs_f64() * 1000.0,
                "connect"
            );

            Ok(Self {
                pool,
                escaper: Arc::new(escaper),
                config,
                last_insert_id: AtomicU64::new(0),
                last_affected_rows: AtomicU64::new(0),
            })
        }

        /// Wrap an existing pool; the escaper is chosen the same way as in [`connect`](Self::connect)
        pub async fn from_pool(pool: MySqlPool, config: ConnectConfig) -> Result<Self> {
            let escaper = session_escaper(&pool).await?;
            Ok(Self {
                pool,
                escaper: Arc::new(escaper),
                config,
                last_insert_id: AtomicU64::new(0),
                last_affected_rows: AtomicU64::new(0),
            })
        }

        pub fn pool(&self) -> &MySqlPool {
            &self.pool
        }

        pub fn config(&self) -> &ConnectConfig {
            &self.config
        }

        pub async fn close(&self) {
            self.pool.close().await;
        }
    }

    impl Connect for MySqlConnection {
        fn escaper(&self) -> Arc<dyn Escaper> {
            self.escaper.clone()
        }
    }

    impl Executor for MySqlConnection {
        async fn exec(&self, sql: &str) -> Result<QueryResult> {
            let started = Instant::now();

            let mut columns = Vec::new();
            let mut rows = Vec::new();
            let mut rows_affected = 0;
            let mut last_insert_id = 0;

            let mut stream = self.pool.fetch_many(sql);
            while let Some(step) = stream.try_next().await? {
                match step {
                    Either::Left(done) => {
                        rows_affected += done.rows_affected();
                        last_insert_id = done.last_insert_id();
                    }
                    Either::Right(row) => {
                        if columns.is_empty() {
                            columns = row
                                .columns()
                                .iter()
                                .map(|column| column.name().to_string())
                                .collect();
                        }
                        rows.push(decode_row(&row)?);
                    }
                }
            }
            drop(stream);

            self.last_insert_id.store(last_insert_id, Ordering::Relaxed);
            self.last_affected_rows.store(rows_affected, Ordering::Relaxed);

            tracing::debug!(
                sql,
                host = %self.config.host,
                port = self.config.port,
                database = %self.config.database,
                runtime_ms = started.elapsed().as_secs_f64() * 1000.0,
                "exec"
            );

            Ok(if rows.is_empty() {
                QueryResult::Affected {
                    rows_affected,
                    last_insert_id,
                }
            } else {
                QueryResult::Rows(ResultSet::new(columns, rows))
            })
        }

        fn last_insert_id(&self) -> u64 {
            self.last_insert_id.load(Ordering::Relaxed)
        }

        fn last_affected_rows(&self) -> u64 {
            self.last_affected_rows.load(Ordering::Relaxed)
        }
    }

    fn decode_row(row: &MySqlRow) -> Result<Vec<JsonValue>> {
        (0..row.len())
            .map(|index| {
                let raw = row.try_get_raw(index)?;
                if raw.is_null() {
                    return Ok(JsonValue::Null);
                }
                let type_name = raw.type_info().name().to_string();
                let bytes: Vec<u8> = row.try_get_unchecked(index)?;
                Ok(decode_cell(&type_name, &bytes))
            })
            .collect()
    }

    /// Text-protocol cell to JSON by column type
    pub(crate) fn decode_cell(type_name: &str, bytes: &[u8]) -> JsonValue {
        let text = String::from_utf8_lossy(bytes);
        let unsigned = type_name.ends_with(" UNSIGNED");
        match type_name.trim_end_matches(" UNSIGNED") {
            "BOOLEAN" => JsonValue::Bool(text != "0"),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                let number = if unsigned {
                    text.parse::<u64>().ok().map(JsonValue::from)
                } else {
                    text.parse::<i64>().ok().map(JsonValue::from)
                };
                number.unwrap_or_else(|| JsonValue::String(text.into_owned()))
            }
            "FLOAT" | "DOUBLE" => text
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(text.into_owned())),
            "JSON" => serde_json::from_str(&text)
                .unwrap_or_else(|_| JsonValue::String(text.into_owned())),
            _ => JsonValue::String(text.into_owned()),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn test_decode_integers() {
            assert_eq!(decode_cell("INT", b"-42"), json!(-42));
            assert_eq!(
                decode_cell("BIGINT UNSIGNED", b"18446744073709551615"),
                json!(u64::MAX)
            );
            assert_eq!(decode_cell("BOOLEAN", b"1"), json!(true));
        }

        #[test]
        fn test_decode_floats_and_text() {
            assert_eq!(decode_cell("DOUBLE", b"2.5"), json!(2.5));
            assert_eq!(decode_cell("DECIMAL", b"10.00"), json!("10.00"));
            assert_eq!(decode_cell("DATETIME", b"2024-01-02 03:04:05"), json!("2024-01-02 03:04:05"));
            assert_eq!(decode_cell("VARCHAR", b"hello"), json!("hello"));
        }

        #[test]
        fn test_decode_json_column() {
            assert_eq!(decode_cell("JSON", br#"{"a":[1,2]}"#), json!({"a": [1, 2]}));
            assert_eq!(decode_cell("JSON", b"not json"), json!("not json"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{row, DebugConnection, QueryBuilder};

    #[test]
    fn test_config_defaults() {
        let config = ConnectConfig::default();
        assert_eq!(config.port, 3306);
        assert_eq!(config.connect_attempts, 2);
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.max_connections, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config = ConnectConfig::from_json(
            r#"{
                "host": "db.internal",
                "username": "app",
                "database": "shop",
                "connect_timeout_secs": 0.5,
                "init_commands": ["SET NAMES utf8mb4"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3306);
        assert_eq!(config.connect_timeout(), Duration::from_millis(500));
        assert_eq!(config.init_commands, vec!["SET NAMES utf8mb4"]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConnectConfig::new("localhost", "root", "", "test");
        config.connect_attempts = 0;
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = ConnectConfig {
            connect_timeout_secs: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        assert!(matches!(
            ConnectConfig::from_json(r#"{"max_connections": 0}"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            ConnectConfig::from_json("{"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_factories_share_escaper() {
        let conn = DebugConnection::new();
        assert_eq!(conn.escape("it's").unwrap(), "'it\\'s'");
        assert_eq!(conn.escape(None::<i32>).unwrap(), "null");

        let mut conditions = conn.where_();
        conditions.cond(conn.raw("`a`=`b`"));
        assert_eq!(conditions.to_sql().unwrap(), "(`a`=`b`)");

        let sql = conn
            .replace_bulk("t", vec![row! { "id" => 1 }])
            .queries()
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(sql, "REPLACE `t`(`id`) VALUE (1)");
    }
}
