//! SQLite FTS5-based conference search.
//!
//! # Responsibility
//! - Translate query strings into FTS5 match expressions and id filters.
//! - Return full conference records with an optional highlight snippet.
//!
//! # Invariants
//! - Terms are ANDed unless joined by `OR`; `id:` filters are always ANDed.
//! - Terms without letters or digits are ignored.
//! - Result ordering is deterministic: rank first, then `id ASC`.
//! - Deleted conferences never appear; the index is trigger-maintained.

use crate::db::DbError;
use crate::model::conference::{Conference, ConferenceId};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

static FIELD_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(id|name|date):(.*)$").expect("valid field term regex")
});

const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// Query string cannot be turned into a valid search.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid search query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for query-string behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query string, e.g. `rust name:conf id:4`.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
    /// Whether to pass text directly as raw FTS5 expression.
    ///
    /// Default is `false` so arbitrary user input never hits FTS5 syntax errors.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    /// Creates a query with default limit and escaped term handling.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_SEARCH_LIMIT,
            raw_fts_syntax: false,
        }
    }
}

/// Single search hit returned by [`search_conferences`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub conference: Conference,
    /// Highlighted excerpt; `None` for id-only and match-all queries.
    pub snippet: Option<String>,
}

/// Parsed form of a query string.
#[derive(Debug, Default, PartialEq, Eq)]
struct ParsedQuery {
    match_expr: Option<String>,
    ids: Vec<ConferenceId>,
}

/// Searches conferences and returns ranked hits.
///
/// Returns an empty list for blank or punctuation-only queries and `limit == 0`.
///
/// # Errors
/// - `InvalidQuery` for non-integer `id:` filters, empty field terms,
///   dangling `OR` or malformed raw FTS5 expressions.
pub fn search_conferences(
    conn: &Connection,
    query: &SearchQuery,
) -> SearchResult<Vec<SearchHit>> {
    let Some(parsed) = parse_query(query)? else {
        return Ok(Vec::new());
    };

    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut bind_values: Vec<Value> = Vec::new();
    let mut sql = match &parsed.match_expr {
        Some(match_expr) => {
            bind_values.push(Value::Text(match_expr.clone()));
            String::from(
                "SELECT
                    conferences.id AS id,
                    conferences.name AS name,
                    conferences.date AS date,
                    snippet(conferences_fts, -1, '[', ']', ' ... ', 10) AS snippet
                 FROM conferences_fts
                 JOIN conferences ON conferences.id = conferences_fts.rowid
                 WHERE conferences_fts MATCH ?",
            )
        }
        None => String::from(
            "SELECT id, name, date, NULL AS snippet
             FROM conferences
             WHERE 1 = 1",
        ),
    };

    for id in &parsed.ids {
        sql.push_str(" AND conferences.id = ?");
        bind_values.push(Value::Integer(*id));
    }

    if parsed.match_expr.is_some() {
        sql.push_str(" ORDER BY bm25(conferences_fts), conferences.id ASC LIMIT ?");
    } else {
        sql.push_str(" ORDER BY conferences.id ASC LIMIT ?");
    }
    bind_values.push(Value::Integer(i64::from(query.limit)));

    debug!(
        "event=conference_search module=search status=start fts={} id_filters={} limit={}",
        parsed.match_expr.is_some(),
        parsed.ids.len(),
        query.limit
    );

    let raw_query = parsed.match_expr.as_deref().unwrap_or("*");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, raw_query))?;
    let mut hits = Vec::new();

    while let Some(row) = rows.next().map_err(|err| map_query_error(err, raw_query))? {
        hits.push(parse_search_hit(row)?);
    }

    Ok(hits)
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    Ok(SearchHit {
        conference: Conference {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            date: row.get("date")?,
        },
        snippet: row.get("snippet")?,
    })
}

fn parse_query(query: &SearchQuery) -> SearchResult<Option<ParsedQuery>> {
    let text = query.text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if query.raw_fts_syntax {
        return Ok(Some(ParsedQuery {
            match_expr: Some(text.to_string()),
            ids: Vec::new(),
        }));
    }

    let mut parsed = ParsedQuery::default();
    // AND of OR-groups.
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut match_all = false;
    let mut pending_or = false;
    let mut last_was_fts = false;
    let mut last_token_was_or = false;

    for token in text.split_whitespace() {
        last_token_was_or = token == "OR";
        if last_token_was_or {
            if !last_was_fts || pending_or {
                return Err(invalid_query(text, "`OR` needs a term on both sides".to_string()));
            }
            pending_or = true;
            continue;
        }

        match parse_term(text, token)? {
            QueryTerm::MatchAll => match_all = true,
            QueryTerm::Skip => {}
            QueryTerm::Id(id) => {
                if pending_or {
                    return Err(invalid_query(
                        text,
                        "`id:` filters cannot be combined with `OR`".to_string(),
                    ));
                }
                parsed.ids.push(id);
                last_was_fts = false;
            }
            QueryTerm::Fts(expr) => {
                match groups.last_mut() {
                    Some(group) if pending_or => group.push(expr),
                    _ => groups.push(vec![expr]),
                }
                pending_or = false;
                last_was_fts = true;
            }
        }
    }

    if last_token_was_or {
        return Err(invalid_query(text, "`OR` needs a term on both sides".to_string()));
    }

    if !groups.is_empty() {
        let clauses = groups
            .into_iter()
            .map(|group| {
                if group.len() == 1 {
                    group.join("")
                } else {
                    format!("({})", group.join(" OR "))
                }
            })
            .collect::<Vec<_>>();
        parsed.match_expr = Some(clauses.join(" AND "));
    } else if parsed.ids.is_empty() && !match_all {
        // Only punctuation terms were given.
        return Ok(None);
    }

    Ok(Some(parsed))
}

/// One whitespace-separated query term after classification.
#[derive(Debug, PartialEq, Eq)]
enum QueryTerm {
    MatchAll,
    /// Term without searchable characters.
    Skip,
    Id(ConferenceId),
    Fts(String),
}

fn parse_term(text: &str, term: &str) -> SearchResult<QueryTerm> {
    if term == "*" {
        return Ok(QueryTerm::MatchAll);
    }

    let Some(captures) = FIELD_TERM_RE.captures(term) else {
        return Ok(fts_phrase(None, term));
    };

    let field = captures[1].to_ascii_lowercase();
    let value = &captures[2];
    if value.is_empty() {
        return Err(invalid_query(text, format!("`{field}:` needs a value")));
    }

    if field == "id" {
        let id = value.parse::<ConferenceId>().map_err(|_| {
            invalid_query(text, format!("id filter expects an integer, got `{value}`"))
        })?;
        return Ok(QueryTerm::Id(id));
    }

    Ok(fts_phrase(Some(&field), value))
}

/// Quotes `raw` as a phrase; a trailing `*` turns it into a prefix query.
fn fts_phrase(column: Option<&str>, raw: &str) -> QueryTerm {
    let (stem, prefix) = match raw.strip_suffix('*') {
        Some(stem) => (stem.trim_end_matches('*'), true),
        None => (raw, false),
    };
    if !stem.chars().any(char::is_alphanumeric) {
        return QueryTerm::Skip;
    }

    let mut phrase = escape_fts_term(stem);
    if prefix {
        phrase.push_str(" *");
    }
    match column {
        Some(column) => QueryTerm::Fts(format!("{column} : {phrase}")),
        None => QueryTerm::Fts(phrase),
    }
}

fn invalid_query(query: &str, message: String) -> SearchError {
    SearchError::InvalidQuery {
        query: query.to_string(),
        message,
    }
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return invalid_query(query, err.to_string());
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
                || msg.contains("no such column")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_query, ParsedQuery, SearchError, SearchQuery};

    fn parse(text: &str) -> Option<ParsedQuery> {
        parse_query(&SearchQuery::new(text)).unwrap()
    }

    #[test]
    fn bare_terms_are_quoted_and_joined() {
        let parsed = parse("rust  \"conf\"").unwrap();
        assert_eq!(
            parsed.match_expr.as_deref(),
            Some("\"rust\" AND \"\"\"conf\"\"\"")
        );
        assert!(parsed.ids.is_empty());
    }

    #[test]
    fn field_terms_become_column_filters() {
        let parsed = parse("NAME:devcon date:2024").unwrap();
        assert_eq!(
            parsed.match_expr.as_deref(),
            Some("name : \"devcon\" AND date : \"2024\"")
        );
    }

    #[test]
    fn id_terms_become_filters() {
        let parsed = parse("id:42").unwrap();
        assert_eq!(parsed.match_expr, None);
        assert_eq!(parsed.ids, vec![42]);
    }

    #[test]
    fn unknown_field_prefix_is_a_plain_term() {
        let parsed = parse("venue:hall").unwrap();
        assert_eq!(parsed.match_expr.as_deref(), Some("\"venue:hall\""));
    }

    #[test]
    fn wildcard_alone_matches_everything() {
        assert_eq!(parse("*"), Some(ParsedQuery::default()));
    }

    #[test]
    fn blank_text_yields_no_query() {
        assert_eq!(parse("  \t "), None);
    }

    #[test]
    fn non_integer_id_is_rejected() {
        let err = parse_query(&SearchQuery::new("id:abc")).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
        assert!(err.to_string().contains("expects an integer"));
    }

    #[test]
    fn punctuation_only_terms_are_dropped() {
        let parsed = parse("DevCon - name:/ &").unwrap();
        assert_eq!(parsed.match_expr.as_deref(), Some("\"DevCon\""));
        assert_eq!(parse("- /"), None);
    }

    #[test]
    fn trailing_star_becomes_prefix_query() {
        let parsed = parse("dev* name:rust**").unwrap();
        assert_eq!(
            parsed.match_expr.as_deref(),
            Some("\"dev\" * AND name : \"rust\" *")
        );
    }

    #[test]
    fn or_groups_adjacent_terms() {
        let parsed = parse("DevCon OR RustConf 2024").unwrap();
        assert_eq!(
            parsed.match_expr.as_deref(),
            Some("(\"DevCon\" OR \"RustConf\") AND \"2024\"")
        );

        let lowercase = parse("a or b").unwrap();
        assert_eq!(
            lowercase.match_expr.as_deref(),
            Some("\"a\" AND \"or\" AND \"b\"")
        );
    }

    #[test]
    fn dangling_or_and_id_or_are_rejected() {
        for text in ["OR DevCon", "DevCon OR", "DevCon OR OR RustConf", "DevCon OR id:4"] {
            let err = parse_query(&SearchQuery::new(text)).unwrap_err();
            assert!(matches!(err, SearchError::InvalidQuery { .. }), "{text}");
        }
    }

    #[test]
    fn empty_field_value_is_rejected() {
        let err = parse_query(&SearchQuery::new("name:")).unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery { .. }));
    }
}
