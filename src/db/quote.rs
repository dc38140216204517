//! Literal and identifier quoting.
//!
//! Only for statements that cannot take bound parameters (administrative
//! statements, ad-hoc queries). Prefer `prepare` + `execute` with values.

use super::dsn::Backend;

/// Hint for how a value is going to be used, mirroring the parameter types
/// accepted by `quote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    /// Character data (default)
    #[default]
    Str,
    /// Integer: emitted unquoted when the input is a valid integer
    Int,
    /// Boolean: truthy input becomes `1`, anything else `0`
    Bool,
    /// SQL NULL regardless of input
    Null,
}

/// Quotes `input` as an SQL literal for `backend`.
///
/// MySQL additionally backslash-escapes control characters, since its default
/// SQL mode treats backslash as an escape character inside string literals.
/// When no backend is known the portable doubling of single quotes is used.
pub fn quote(input: &str, param_type: ParamType, backend: Option<Backend>) -> String {
    match param_type {
        ParamType::Null => return "NULL".to_string(),
        ParamType::Bool => {
            let truthy = !matches!(input.trim().to_ascii_lowercase().as_str(), "" | "0" | "false");
            return if truthy { "1" } else { "0" }.to_string();
        }
        ParamType::Int => {
            if let Ok(i) = input.trim().parse::<i64>() {
                return i.to_string();
            }
        }
        ParamType::Str => {}
    }

    let mut quoted = String::with_capacity(input.len() + 2);
    quoted.push('\'');
    for ch in input.chars() {
        match (backend, ch) {
            (_, '\'') => quoted.push_str("''"),
            (Some(Backend::MySql), '\\') => quoted.push_str("\\\\"),
            (Some(Backend::MySql), '\0') => quoted.push_str("\\0"),
            (Some(Backend::MySql), '\n') => quoted.push_str("\\n"),
            (Some(Backend::MySql), '\r') => quoted.push_str("\\r"),
            (Some(Backend::MySql), '\x1a') => quoted.push_str("\\Z"),
            (_, c) => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Quotes a table or column name for `backend`.
pub fn quote_identifier(name: &str, backend: Backend) -> String {
    match backend {
        Backend::MySql => format!("`{}`", name.replace('`', "``")),
        Backend::Postgres | Backend::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("O'Brien", ParamType::Str, None), "'O''Brien'");
        assert_eq!(
            quote("O'Brien", ParamType::Str, Some(Backend::Sqlite)),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_quote_mysql_escapes_backslashes_and_controls() {
        assert_eq!(
            quote("a\\b\nc", ParamType::Str, Some(Backend::MySql)),
            "'a\\\\b\\nc'"
        );
        // Postgres keeps standard_conforming_strings semantics
        assert_eq!(
            quote("a\\b", ParamType::Str, Some(Backend::Postgres)),
            "'a\\b'"
        );
    }

    #[test]
    fn test_quote_typed_inputs() {
        assert_eq!(quote(" 42 ", ParamType::Int, None), "42");
        assert_eq!(quote("42; DROP", ParamType::Int, None), "'42; DROP'");
        assert_eq!(quote("yes", ParamType::Bool, None), "1");
        assert_eq!(quote("false", ParamType::Bool, None), "0");
        assert_eq!(quote("anything", ParamType::Null, None), "NULL");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users", Backend::MySql), "`users`");
        assert_eq!(quote_identifier("we`ird", Backend::MySql), "`we``ird`");
        assert_eq!(quote_identifier("users", Backend::Sqlite), "\"users\"");
        assert_eq!(quote_identifier("a\"b", Backend::Postgres), "\"a\"\"b\"");
    }
}
