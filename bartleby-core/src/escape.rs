//! Value escaping and identifier quoting

use crate::{Error, Result, Value};
use std::fmt;

/// Turns values into SQL-safe literal text.
///
/// Implementors only decide how a string literal is quoted; every other value
/// kind shares one rendering through the provided [`Escaper::escape`].
pub trait Escaper: Send + Sync + fmt::Debug {
    /// Quote and escape a string as a single-quoted literal
    fn quote_str(&self, s: &str) -> String;

    /// Escape any value into its literal form
    fn escape(&self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            Value::I32(i) => Ok(i.to_string()),
            Value::I64(i) => Ok(i.to_string()),
            Value::U64(i) => Ok(i.to_string()),
            Value::F32(f) if f.is_finite() => Ok(f.to_string()),
            Value::F64(f) if f.is_finite() => Ok(f.to_string()),
            Value::F32(f) => Err(Error::unescapable(format!("non-finite float {f}"))),
            Value::F64(f) => Err(Error::unescapable(format!("non-finite float {f}"))),
            Value::String(s) => Ok(self.quote_str(s)),
            Value::Json(j) => Ok(self.quote_str(&j.to_string())),
            Value::Array(_) => Ok(self.quote_str(&value.to_json()?.to_string())),
            Value::Raw(raw) => raw.render(self),
        }
    }
}

/// Deterministic escaper needing no server state.
///
/// Backslash-escapes `'`, `"`, `\` and NUL.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugEscaper;

impl Escaper for DebugEscaper {
    fn quote_str(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for c in s.chars() {
            match c {
                '\'' | '"' | '\\' => {
                    out.push('\\');
                    out.push(c);
                }
                '\0' => out.push_str("\\0"),
                _ => out.push(c),
            }
        }
        out.push('\'');
        out
    }
}

/// Client charsets with multibyte characters whose trailing byte can be
/// 0x5C, so a backslash escape may be swallowed into the preceding character.
const BACKSLASH_UNSAFE_CHARSETS: &[&str] = &["big5", "cp932", "gb18030", "gbk", "sjis"];

/// Escaper following the string-literal rules of a live MySQL session.
///
/// With `NO_BACKSLASH_ESCAPES` in the session `sql_mode` the server treats
/// backslash as an ordinary character, so only quotes are doubled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlEscaper {
    no_backslash_escapes: bool,
    charset: String,
}

impl Default for MySqlEscaper {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MySqlEscaper {
    /// Escaper for a `utf8mb4` session
    pub fn new(no_backslash_escapes: bool) -> Self {
        Self {
            no_backslash_escapes,
            charset: "utf8mb4".to_string(),
        }
    }

    /// Build from the value of `@@SESSION.sql_mode`
    pub fn from_sql_mode(sql_mode: &str) -> Self {
        Self::new(
            sql_mode
                .split(',')
                .any(|mode| mode.trim().eq_ignore_ascii_case("NO_BACKSLASH_ESCAPES")),
        )
    }

    /// Build from `@@SESSION.sql_mode` and `@@SESSION.character_set_client`.
    ///
    /// Backslash escaping under `big5`, `cp932`, `gb18030`, `gbk` or `sjis`
    /// is rejected with [`Error::Config`]; those sessions need
    /// `NO_BACKSLASH_ESCAPES`, where only quotes are doubled.
    pub fn from_session(sql_mode: &str, charset: &str) -> Result<Self> {
        let mut escaper = Self::from_sql_mode(sql_mode);
        let charset = charset.trim().to_ascii_lowercase();
        if !escaper.no_backslash_escapes && BACKSLASH_UNSAFE_CHARSETS.contains(&charset.as_str()) {
            return Err(Error::config(format!(
                "character_set_client '{charset}' cannot be escaped safely with backslashes, \
                 enable NO_BACKSLASH_ESCAPES or use utf8mb4"
            )));
        }
        escaper.charset = charset;
        Ok(escaper)
    }

    pub fn no_backslash_escapes(&self) -> bool {
        self.no_backslash_escapes
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }
}

impl Escaper for MySqlEscaper {
    fn quote_str(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        if self.no_backslash_escapes {
            for c in s.chars() {
                if c == '\'' {
                    out.push('\'');
                }
                out.push(c);
            }
        } else {
            for c in s.chars() {
                match c {
                    '\0' => out.push_str("\\0"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\x1a' => out.push_str("\\Z"),
                    '\\' | '\'' | '"' => {
                        out.push('\\');
                        out.push(c);
                    }
                    _ => out.push(c),
                }
            }
        }
        out.push('\'');
        out
    }
}

/// Column or table identifier.
///
/// Names are quoted without validation. Never build one from untrusted input;
/// use [`escape_name`] when the identifier is not a literal in code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Name {
    Plain(String),
    Qualified(String, String),
}

impl Name {
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Name::Qualified(table.into(), column.into())
    }

    /// Render with backtick quoting
    pub fn quoted(&self) -> String {
        match self {
            Name::Plain(name) => quote_name(name),
            Name::Qualified(table, column) => {
                format!("{}.{}", quote_name(table), quote_name(column))
            }
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name::Plain(name.to_string())
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name::Plain(name)
    }
}

impl From<&String> for Name {
    fn from(name: &String) -> Self {
        Name::Plain(name.clone())
    }
}

impl From<(&str, &str)> for Name {
    fn from((table, column): (&str, &str)) -> Self {
        Name::qualified(table, column)
    }
}

impl From<[&str; 2]> for Name {
    fn from([table, column]: [&str; 2]) -> Self {
        Name::qualified(table, column)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted())
    }
}

/// Wrap an identifier in backticks, trimming any the caller already added
pub fn quote_name(name: &str) -> String {
    format!("`{}`", name.trim_matches('`'))
}

/// Strictly validate and quote an identifier.
///
/// Only ASCII letters, digits, `_` and `.` are accepted; dots split the
/// name into quoted parts.
///
/// # Examples
/// ```
/// use bartleby_core::escape_name;
///
/// assert_eq!(escape_name("users.id").unwrap(), "`users`.`id`");
/// assert!(escape_name("id; DROP TABLE users").is_err());
/// ```
pub fn escape_name(name: &str) -> Result<String> {
    let stripped: String = name.chars().filter(|c| *c != '_' && *c != '.').collect();
    if name.contains("..")
        || stripped.is_empty()
        || !stripped.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(Error::invalid_column_name(name));
    }
    Ok(format!("`{}`", name.replace('.', "`.`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Raw;

    #[test]
    fn test_debug_escaper_strings() {
        let e = DebugEscaper;
        assert_eq!(e.escape(&"O'Brien".into()).unwrap(), "'O\\'Brien'");
        assert_eq!(e.escape(&"Joe's test".into()).unwrap(), "'Joe\\'s test'");
        assert_eq!(e.escape(&"a\"b\\c".into()).unwrap(), "'a\\\"b\\\\c'");
        assert_eq!(e.escape(&"nul\0".into()).unwrap(), "'nul\\0'");
    }

    #[test]
    fn test_scalars() {
        let e = DebugEscaper;
        assert_eq!(e.escape(&Value::Null).unwrap(), "null");
        assert_eq!(e.escape(&true.into()).unwrap(), "1");
        assert_eq!(e.escape(&false.into()).unwrap(), "0");
        assert_eq!(e.escape(&(-42).into()).unwrap(), "-42");
        assert_eq!(e.escape(&u64::MAX.into()).unwrap(), "18446744073709551615");
        assert_eq!(e.escape(&1.5f64.into()).unwrap(), "1.5");
        assert_eq!(e.escape(&0.25f32.into()).unwrap(), "0.25");
    }

    #[test]
    fn test_non_finite_float_is_unescapable() {
        let e = DebugEscaper;
        assert!(matches!(
            e.escape(&f64::INFINITY.into()),
            Err(Error::UnescapableValueKind { .. })
        ));
        assert!(e.escape(&f32::NAN.into()).is_err());
    }

    #[test]
    fn test_composites_are_json_literals() {
        let e = DebugEscaper;
        assert_eq!(e.escape(&vec![1, 2].into()).unwrap(), "'[1,2]'");
        assert_eq!(
            e.escape(&serde_json::json!({"k": "v"}).into()).unwrap(),
            "'{\\\"k\\\":\\\"v\\\"}'"
        );
    }

    #[test]
    fn test_raw_renders_through_escaper() {
        let e = DebugEscaper;
        let raw = Raw::new("COALESCE(`a`, %s)").bind("x");
        assert_eq!(e.escape(&raw.into()).unwrap(), "COALESCE(`a`, 'x')");
    }

    #[test]
    fn test_mysql_escaper_rules() {
        let e = MySqlEscaper::default();
        assert_eq!(e.quote_str("O'Brien"), "'O\\'Brien'");
        assert_eq!(e.quote_str("a\nb\r\x1a"), "'a\\nb\\r\\Z'");
        assert_eq!(e.quote_str("c:\\dir"), "'c:\\\\dir'");
    }

    #[test]
    fn test_mysql_escaper_no_backslash_escapes() {
        let e = MySqlEscaper::from_sql_mode("STRICT_TRANS_TABLES,NO_BACKSLASH_ESCAPES");
        assert!(e.no_backslash_escapes());
        assert_eq!(e.quote_str("O'Brien \\n"), "'O''Brien \\n'");

        let e = MySqlEscaper::from_sql_mode("ONLY_FULL_GROUP_BY,STRICT_TRANS_TABLES");
        assert!(!e.no_backslash_escapes());
    }

    #[test]
    fn test_mysql_escaper_session_charset() {
        let e = MySqlEscaper::from_session("STRICT_TRANS_TABLES", "utf8mb4").unwrap();
        assert_eq!(e.charset(), "utf8mb4");
        assert_eq!(e.quote_str("\u{30BF}'"), "'\u{30BF}\\''");

        for charset in ["gbk", "GBK", "big5", "sjis", "cp932", "gb18030"] {
            assert!(
                matches!(
                    MySqlEscaper::from_session("STRICT_TRANS_TABLES", charset),
                    Err(Error::Config { .. })
                ),
                "{charset} should be rejected"
            );
        }

        let e = MySqlEscaper::from_session("NO_BACKSLASH_ESCAPES", "gbk").unwrap();
        assert_eq!(e.charset(), "gbk");
        assert_eq!(e.quote_str("\u{30BF}' OR 1=1 -- "), "'\u{30BF}'' OR 1=1 -- '");
    }

    #[test]
    fn test_name_quoting() {
        assert_eq!(Name::from("id").quoted(), "`id`");
        assert_eq!(Name::from("`id`").quoted(), "`id`");
        assert_eq!(Name::from(("users", "id")).quoted(), "`users`.`id`");
        assert_eq!(Name::from(["u", "name"]).to_string(), "`u`.`name`");
        assert_eq!(Name::from(("`users`", "`id`")).quoted(), "`users`.`id`");
        // unchecked path keeps embedded backticks
        assert_eq!(Name::from("o`.`amount").quoted(), "`o`.`amount`");
    }

    #[test]
    fn test_escape_name_strict() {
        assert_eq!(escape_name("id").unwrap(), "`id`");
        assert_eq!(escape_name("db.users.id").unwrap(), "`db`.`users`.`id`");
        assert_eq!(escape_name("user_id").unwrap(), "`user_id`");
        for bad in ["", "a..b", "a b", "a`b", "name;", "_", "."] {
            assert!(
                matches!(escape_name(bad), Err(Error::InvalidColumnNameFormat { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
