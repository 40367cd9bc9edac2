//! Raw SQL fragments with escaped parameters

use crate::{Error, Escaper, Result, Value};
use serde::Serialize;

/// A trusted SQL template plus untrusted parameters.
///
/// The expression text is inlined as is. Each parameter is escaped and
/// substituted for the next `%s` placeholder when the fragment is rendered.
///
/// # Examples
/// ```
/// use bartleby_core::{DebugEscaper, Raw};
///
/// let raw = Raw::new("CASE WHEN `kind`=%s THEN 1 ELSE 0 END").bind("o'clock");
/// assert_eq!(
///     raw.render(&DebugEscaper).unwrap(),
///     "CASE WHEN `kind`='o\\'clock' THEN 1 ELSE 0 END"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raw {
    expression: String,
    params: Vec<Value>,
}

impl Raw {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            params: Vec::new(),
        }
    }

    /// Create a fragment with all of its parameters at once
    pub fn with_params<I, V>(expression: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            expression: expression.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one positional parameter
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Render the fragment, escaping every parameter exactly once.
    ///
    /// Without parameters the expression is returned verbatim, so literal `%`
    /// characters need no doubling.
    pub fn render<E: Escaper + ?Sized>(&self, escaper: &E) -> Result<String> {
        if self.params.is_empty() {
            return Ok(self.expression.clone());
        }
        let escaped = self
            .params
            .iter()
            .map(|p| escaper.escape(p))
            .collect::<Result<Vec<_>>>()?;
        format_template(&self.expression, &escaped)
    }
}

impl From<&str> for Raw {
    fn from(expression: &str) -> Self {
        Raw::new(expression)
    }
}

impl From<String> for Raw {
    fn from(expression: String) -> Self {
        Raw::new(expression)
    }
}

/// Substitute `%s` placeholders in order.
///
/// Supports `%%` for a literal percent and `%N$s` for an explicit 1-based
/// argument. Every argument must be consumed and every placeholder filled.
pub(crate) fn format_template(template: &str, args: &[String]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    let mut used = vec![false; args.len()];
    let mut next = 0usize;
    let mut chars = template.char_indices();

    while let Some((pos, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some((_, '%')) => out.push('%'),
            Some((_, 's')) => {
                let arg = args.get(next).ok_or_else(|| {
                    Error::format(format!(
                        "template has more placeholders than the {} given params",
                        args.len()
                    ))
                })?;
                used[next] = true;
                next += 1;
                out.push_str(arg);
            }
            Some((_, d)) if d.is_ascii_digit() => {
                let mut index = d.to_digit(10).unwrap_or(0) as usize;
                loop {
                    match chars.next() {
                        Some((_, d)) if d.is_ascii_digit() => {
                            index = index * 10 + d.to_digit(10).unwrap_or(0) as usize;
                        }
                        Some((_, '$')) => break,
                        _ => {
                            return Err(Error::format(format!(
                                "malformed positional placeholder at byte {pos}"
                            )))
                        }
                    }
                }
                if !matches!(chars.next(), Some((_, 's'))) {
                    return Err(Error::format(format!(
                        "positional placeholder at byte {pos} must end with 's'"
                    )));
                }
                let slot = index
                    .checked_sub(1)
                    .filter(|i| *i < args.len())
                    .ok_or_else(|| Error::format(format!("param %{index}$s does not exist")))?;
                used[slot] = true;
                out.push_str(&args[slot]);
            }
            Some((_, other)) => {
                return Err(Error::format(format!(
                    "unsupported conversion '%{other}' at byte {pos}"
                )))
            }
            None => return Err(Error::format("template ends with a lone '%'")),
        }
    }

    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(Error::format(format!(
            "param #{} is never used by the template",
            unused + 1
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DebugEscaper;

    #[test]
    fn test_render_without_params_is_verbatim() {
        let raw = Raw::new("`name` LIKE '%abc%'");
        assert_eq!(raw.render(&DebugEscaper).unwrap(), "`name` LIKE '%abc%'");
    }

    #[test]
    fn test_render_escapes_in_order() {
        let raw = Raw::with_params("`a`=%s AND `b`=%s", vec![Value::from("x"), Value::from(2)]);
        assert_eq!(raw.render(&DebugEscaper).unwrap(), "`a`='x' AND `b`=2");
    }

    #[test]
    fn test_render_positional_and_percent() {
        let raw = Raw::new("%2$s LIKE %1$s AND 100%% = 1").bind("a%").bind(Raw::new("`c`"));
        assert_eq!(raw.render(&DebugEscaper).unwrap(), "`c` LIKE 'a%' AND 100% = 1");
    }

    #[test]
    fn test_render_param_count_mismatch() {
        let too_few = Raw::new("%s and %s").bind(1);
        assert!(matches!(too_few.render(&DebugEscaper), Err(Error::Format { .. })));

        let too_many = Raw::new("%s").bind(1).bind(2);
        assert!(matches!(too_many.render(&DebugEscaper), Err(Error::Format { .. })));
    }

    #[test]
    fn test_render_bad_conversion() {
        let raw = Raw::new("%d").bind(1);
        assert!(matches!(raw.render(&DebugEscaper), Err(Error::Format { .. })));
    }

    #[test]
    fn test_nested_raw_is_rendered_once() {
        let inner = Raw::new("LOWER(%s)").bind("It's");
        let outer = Raw::new("`name`=%s").bind(inner);
        assert_eq!(outer.render(&DebugEscaper).unwrap(), "`name`=LOWER('It\\'s')");
    }
}
