//! Query lifecycle hooks
//!
//! A [`QueryHook`] attached to a [`DatabaseConn`](crate::database::DatabaseConn)
//! is called before and after every query the connection issues. The stock
//! [`QueryLogger`] renders each executed query with its bound parameters and
//! hands the text to a caller-supplied logging function.

use std::time::Duration;

use crate::database::core::SqlValue;
use crate::database::error::QueryFormatError;

/// Text passed to the logging function when a query cannot be rendered
pub const QUERY_UNAVAILABLE: &str = "<query unavailable>";

/// A single query execution as seen by hooks
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvent {
    /// Query text with placeholders, as sent to the driver
    pub query: String,
    /// Bound parameters in placeholder order
    pub params: Vec<SqlValue>,
    /// Wall time spent in the driver; only set for `after_query`
    pub elapsed: Option<Duration>,
}

impl QueryEvent {
    pub fn new(query: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            query: query.into(),
            params,
            elapsed: None,
        }
    }

    /// The query text exactly as it was issued
    pub fn unformatted_query(&self) -> &str {
        &self.query
    }

    /// The query text with numbered placeholders (`$1`, `?1`) replaced by
    /// the SQL literals of their bound parameters
    ///
    /// Quoted literals, quoted identifiers and comments are copied verbatim.
    /// Fails when a placeholder points past the bound parameters.
    pub fn formatted_query(&self) -> Result<String, QueryFormatError> {
        let mut out = String::with_capacity(self.query.len());
        let mut chars = self.query.char_indices().peekable();
        let mut state = Scan::Code;

        while let Some((i, c)) = chars.next() {
            out.push(c);
            let next = chars.peek().map(|&(_, d)| d);

            match state {
                Scan::Quoted(quote) => {
                    if c == quote {
                        state = Scan::Code;
                    }
                    continue;
                }
                Scan::LineComment => {
                    if c == '\n' {
                        state = Scan::Code;
                    }
                    continue;
                }
                Scan::BlockComment => {
                    if c == '*' && next == Some('/') {
                        out.push('/');
                        chars.next();
                        state = Scan::Code;
                    }
                    continue;
                }
                Scan::Code => {}
            }

            match (c, next) {
                ('\'' | '"', _) => {
                    state = Scan::Quoted(c);
                    continue;
                }
                ('-', Some('-')) | ('/', Some('*')) => {
                    state = if c == '-' {
                        Scan::LineComment
                    } else {
                        Scan::BlockComment
                    };
                    out.push(chars.next().map_or(c, |(_, d)| d));
                    continue;
                }
                ('$' | '?', _) => {}
                _ => continue,
            }

            let start = i + c.len_utf8();
            let mut end = start;
            while let Some(&(j, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = j + d.len_utf8();
                chars.next();
            }

            // bare `?` or `$` (e.g. `$user`) is not a numbered placeholder
            if end == start {
                continue;
            }

            out.pop();
            let placeholder = &self.query[i..end];
            let index: usize = self.query[start..end]
                .parse()
                .map_err(|_| QueryFormatError::InvalidPlaceholder(placeholder.to_string()))?;
            let value = index
                .checked_sub(1)
                .and_then(|idx| self.params.get(idx))
                .ok_or_else(|| QueryFormatError::MissingParameter {
                    placeholder: placeholder.to_string(),
                    bound: self.params.len(),
                })?;
            out.push_str(&value.to_sql_literal());
        }

        Ok(out)
    }
}

/// Lexical context while scanning query text for placeholders
#[derive(Clone, Copy)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Hooks invoked around every query issued through a connection
pub trait QueryHook: Send + Sync {
    /// Called before the query is handed to the driver
    fn before_query(&self, _event: &QueryEvent) {}

    /// Called after the driver returns, whether or not the query succeeded
    fn after_query(&self, event: &QueryEvent);
}

type LogFn = Box<dyn Fn(&str, &[SqlValue]) + Send + Sync>;
type ErrFn = Box<dyn Fn(&QueryFormatError) + Send + Sync>;

/// Query hook that forwards each executed query to a logging function
///
/// When the query cannot be rendered, `err_fn` receives the formatting error
/// and `log_fn` is then called with [`QUERY_UNAVAILABLE`] in place of the
/// query text, so every executed query still produces exactly one log call.
pub struct QueryLogger {
    log_fn: LogFn,
    err_fn: ErrFn,
}

impl QueryLogger {
    pub fn new<L, E>(log_fn: L, err_fn: E) -> Self
    where
        L: Fn(&str, &[SqlValue]) + Send + Sync + 'static,
        E: Fn(&QueryFormatError) + Send + Sync + 'static,
    {
        Self {
            log_fn: Box::new(log_fn),
            err_fn: Box::new(err_fn),
        }
    }

    /// Logger writing to `tracing` at debug level
    pub fn tracing() -> Self {
        Self::new(
            |query, params| {
                tracing::debug!(target: "migrate_bootstrap::query", params = params.len(), "{}", query)
            },
            |err| tracing::warn!(target: "migrate_bootstrap::query", "Failed to format query: {}", err),
        )
    }
}

impl QueryHook for QueryLogger {
    fn after_query(&self, event: &QueryEvent) {
        match event.formatted_query() {
            Ok(query) => (self.log_fn)(&query, &event.params),
            Err(e) => {
                (self.err_fn)(&e);
                (self.log_fn)(QUERY_UNAVAILABLE, &event.params);
            }
        }
    }
}

impl std::fmt::Debug for QueryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryLogger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_formatted_query_postgres_placeholders() {
        let event = QueryEvent::new(
            "SELECT 1 FROM t WHERE a = $1 AND b = $2",
            vec![SqlValue::from("public"), SqlValue::Int(7)],
        );
        assert_eq!(
            event.formatted_query().unwrap(),
            "SELECT 1 FROM t WHERE a = 'public' AND b = 7"
        );
    }

    #[test]
    fn test_formatted_query_sqlite_placeholders() {
        let event = QueryEvent::new("SELECT ?2, ?1, ?10", (1..=10).map(SqlValue::Int).collect());
        assert_eq!(event.formatted_query().unwrap(), "SELECT 2, 1, 10");
    }

    #[test]
    fn test_formatted_query_ignores_literals_and_bare_markers() {
        let event = QueryEvent::new(
            "SELECT '$1', $user, ? FROM t WHERE x = $1",
            vec![SqlValue::Bool(true)],
        );
        assert_eq!(
            event.formatted_query().unwrap(),
            "SELECT '$1', $user, ? FROM t WHERE x = TRUE"
        );
    }

    #[test]
    fn test_formatted_query_skips_identifiers_and_comments() {
        let event = QueryEvent::new(
            "SELECT \"col$2\", x -- matches $3\nFROM t /* ?4 */ WHERE y = $1",
            vec![SqlValue::Int(5)],
        );
        assert_eq!(
            event.formatted_query().unwrap(),
            "SELECT \"col$2\", x -- matches $3\nFROM t /* ?4 */ WHERE y = 5"
        );

        let event = QueryEvent::new("SELECT 'it''s $2', 8-$1 /* $9", vec![SqlValue::Int(1)]);
        assert_eq!(event.formatted_query().unwrap(), "SELECT 'it''s $2', 8-1 /* $9");
    }

    #[test]
    fn test_formatted_query_missing_parameter() {
        let event = QueryEvent::new("SELECT $1, $2", vec![SqlValue::Null]);
        assert_eq!(
            event.formatted_query(),
            Err(QueryFormatError::MissingParameter {
                placeholder: "$2".to_string(),
                bound: 1,
            })
        );

        let event = QueryEvent::new("SELECT $0", vec![SqlValue::Null]);
        assert!(event.formatted_query().is_err());
    }

    #[test]
    fn test_logger_forwards_formatted_query() {
        let logged = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(0));

        let sink = logged.clone();
        let err_count = errors.clone();
        let logger = QueryLogger::new(
            move |query, params| sink.lock().unwrap().push((query.to_string(), params.to_vec())),
            move |_| *err_count.lock().unwrap() += 1,
        );

        let event = QueryEvent::new("SELECT $1", vec![SqlValue::from("x")]);
        logger.before_query(&event);
        assert!(logged.lock().unwrap().is_empty());

        logger.after_query(&event);
        let logged = logged.lock().unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].0, "SELECT 'x'");
        assert_eq!(logged[0].1, vec![SqlValue::from("x")]);
        assert_eq!(*errors.lock().unwrap(), 0);
    }

    #[test]
    fn test_logger_marks_unavailable_query() {
        let logged = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let sink = logged.clone();
        let err_sink = errors.clone();
        let logger = QueryLogger::new(
            move |query, _| sink.lock().unwrap().push(query.to_string()),
            move |e| err_sink.lock().unwrap().push(e.clone()),
        );

        logger.after_query(&QueryEvent::new("SELECT $3", vec![]));

        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(*logged.lock().unwrap(), vec![QUERY_UNAVAILABLE.to_string()]);
    }

    #[test]
    fn test_tracing_logger_handles_both_paths() {
        let logger = QueryLogger::tracing();
        logger.after_query(&QueryEvent::new("SELECT $1", vec![SqlValue::Int(1)]));
        logger.after_query(&QueryEvent::new("SELECT $2", vec![]));
    }
}
