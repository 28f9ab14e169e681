//! Conference repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `conferences` storage.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Create paths reject records that already carry an id.
//! - Deletes are hard deletes; the FTS index follows via triggers.
//! - List ordering always ends with `id ASC` as tie-breaker.

use crate::db::DbError;
use crate::model::conference::{Conference, ConferenceId, ConferenceValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const CONFERENCE_SELECT_SQL: &str = "SELECT id, name, date FROM conferences";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for conference persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ConferenceValidationError),
    Db(DbError),
    NotFound(ConferenceId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "conference not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted conference data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ConferenceValidationError> for RepoError {
    fn from(value: ConferenceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column used to order conference listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Date,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Date => "date",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Listing order, parsed from `field[,asc|desc]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConferenceSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Rejected sort expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSort(pub String);

impl Display for InvalidSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid sort `{}`; expected id|name|date optionally followed by ,asc|,desc",
            self.0
        )
    }
}

impl Error for InvalidSort {}

impl FromStr for ConferenceSort {
    type Err = InvalidSort;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSort(raw.to_string());
        let mut parts = raw.split(',').map(|part| part.trim().to_ascii_lowercase());

        let field = match parts.next().as_deref() {
            Some("id") => SortField::Id,
            Some("name") => SortField::Name,
            Some("date") => SortField::Date,
            _ => return Err(invalid()),
        };
        let direction = match parts.next().as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { field, direction })
    }
}

/// Query options for listing conferences.
#[derive(Debug, Clone, Default)]
pub struct ConferenceListQuery {
    pub sort: ConferenceSort,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for conference CRUD operations.
pub trait ConferenceRepository {
    fn create_conference(&self, conference: &Conference) -> RepoResult<Conference>;
    fn update_conference(&self, conference: &Conference) -> RepoResult<Conference>;
    fn get_conference(&self, id: ConferenceId) -> RepoResult<Option<Conference>>;
    fn exists(&self, id: ConferenceId) -> RepoResult<bool>;
    fn list_conferences(&self, query: &ConferenceListQuery) -> RepoResult<Vec<Conference>>;
    fn count_conferences(&self) -> RepoResult<u64>;
    fn delete_conference(&self, id: ConferenceId) -> RepoResult<bool>;
}

/// SQLite-backed conference repository.
pub struct SqliteConferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConferenceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ConferenceRepository for SqliteConferenceRepository<'_> {
    fn create_conference(&self, conference: &Conference) -> RepoResult<Conference> {
        conference.validate_new()?;

        self.conn.execute(
            "INSERT INTO conferences (name, date) VALUES (?1, ?2);",
            params![conference.name.as_deref(), conference.date.as_deref()],
        )?;

        Ok(Conference {
            id: Some(self.conn.last_insert_rowid()),
            ..conference.clone()
        })
    }

    fn update_conference(&self, conference: &Conference) -> RepoResult<Conference> {
        let id = conference
            .id
            .ok_or(RepoError::Validation(ConferenceValidationError::IdNull))?;

        let changed = self.conn.execute(
            "UPDATE conferences
             SET
                name = ?1,
                date = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![conference.name.as_deref(), conference.date.as_deref(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(conference.clone())
    }

    fn get_conference(&self, id: ConferenceId) -> RepoResult<Option<Conference>> {
        let conference = self
            .conn
            .query_row(
                &format!("{CONFERENCE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_conference_row,
            )
            .optional()?;
        Ok(conference)
    }

    fn exists(&self, id: ConferenceId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM conferences WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_conferences(&self, query: &ConferenceListQuery) -> RepoResult<Vec<Conference>> {
        let mut sql = format!(
            "{CONFERENCE_SELECT_SQL} ORDER BY {} {}",
            query.sort.field.column(),
            query.sort.direction.keyword()
        );
        if query.sort.field != SortField::Id {
            sql.push_str(", id ASC");
        }

        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let conferences = stmt
            .query_map(params_from_iter(bind_values), parse_conference_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(conferences)
    }

    fn count_conferences(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM conferences;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative conference count {count}")))
    }

    fn delete_conference(&self, id: ConferenceId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM conferences WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

pub(crate) fn parse_conference_row(row: &Row<'_>) -> rusqlite::Result<Conference> {
    Ok(Conference {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        date: row.get("date")?,
    })
}
