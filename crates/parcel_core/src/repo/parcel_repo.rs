//! Parcel repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level CRUD over the `parcel` table.
//! - Enforce the `registered`-only policy for address change and deletion.
//!
//! # Invariants
//! - Guarded writes are single conditional statements; a rejected write
//!   changes zero rows.
//! - Absence is reported as `RepoError::NotFound`, never folded into
//!   driver errors.
//! - The store borrows its connection and never opens, migrates or closes it.

use crate::db::DbError;
use crate::model::parcel::{
    ClientId, Parcel, ParcelNumber, ParcelStatus, PARCEL_STATUS_REGISTERED,
};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_TABLE: &str = "parcel";
const PARCEL_COLUMNS: &[&str] = &["number", "client", "status", "address", "created_at"];

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Mutation kinds that require `registered` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    SetAddress,
    Delete,
}

impl Display for GuardedAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetAddress => f.write_str("address change"),
            Self::Delete => f.write_str("deletion"),
        }
    }
}

/// Repository error for parcel persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// No row matches the parcel number.
    NotFound(ParcelNumber),
    /// Business-rule rejection; nothing was written.
    StatusGuard {
        number: ParcelNumber,
        action: GuardedAction,
        status: ParcelStatus,
    },
    /// Statement, scan or iteration failure in the named operation.
    Db {
        operation: &'static str,
        source: DbError,
    },
    /// Row mapping failed midway through a multi-row read.
    PartialRead {
        parcels: Vec<Parcel>,
        source: Box<RepoError>,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_status_guard(&self) -> bool {
        matches!(self, Self::StatusGuard { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::StatusGuard {
                number,
                action,
                status,
            } => write!(
                f,
                "parcel {number} has status `{status}`; {action} requires `{PARCEL_STATUS_REGISTERED}`"
            ),
            Self::Db { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::PartialRead { parcels, source } => write!(
                f,
                "read stopped after {} parcels: {source}",
                parcels.len()
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db { source, .. } => Some(source),
            Self::PartialRead { source, .. } => Some(source.as_ref()),
            Self::NotFound(_)
            | Self::StatusGuard { .. }
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

/// Attaches the failing operation name to SQLite errors.
trait SqlContext<T> {
    fn context(self, operation: &'static str) -> RepoResult<T>;
}

impl<T> SqlContext<T> for rusqlite::Result<T> {
    fn context(self, operation: &'static str) -> RepoResult<T> {
        self.map_err(|err| RepoError::Db {
            operation,
            source: DbError::Sqlite(err),
        })
    }
}

/// Repository interface for parcel CRUD and guarded mutation.
pub trait ParcelRepository {
    /// Inserts a new row and returns the storage-assigned number.
    /// `parcel.number` is ignored.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Returns rows in database result order; may be empty.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    /// Overwrites status unconditionally. Unknown numbers are not an error.
    fn set_status(&self, number: ParcelNumber, status: &ParcelStatus) -> RepoResult<()>;
    fn get_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus>;
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
}

/// SQLite-backed parcel store.
pub struct SqliteParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelStore<'conn> {
    /// Wraps a connection whose `parcel` table is known to exist.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying the `parcel` table shape.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the table is absent.
    /// - `MissingRequiredColumn` for the first required column not found.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_schema(conn)?;
        Ok(Self::new(conn))
    }

    /// Reads current status to explain why a guarded write matched no row.
    fn guard_rejection(&self, number: ParcelNumber, action: GuardedAction) -> RepoError {
        match self.get_status(number) {
            Ok(status) => {
                warn!(
                    "event=parcel_guard module=repo status=rejected action={action} number={number} parcel_status={status}"
                );
                RepoError::StatusGuard {
                    number,
                    action,
                    status,
                }
            }
            Err(err) => err,
        }
    }
}

impl ParcelRepository for SqliteParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        self.conn
            .execute(
                "INSERT INTO parcel (
                    client,
                    status,
                    address,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    parcel.client,
                    parcel.status.as_str(),
                    parcel.address.as_str(),
                    parcel.created_at.as_str(),
                ],
            )
            .context("insert")?;

        let number = self.conn.last_insert_rowid();
        debug!(
            "event=parcel_add module=repo status=ok number={number} client={}",
            parcel.client
        );
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))
            .context("select")?;

        let mut rows = stmt.query([number]).context("select")?;
        match rows.next().context("select")? {
            Some(row) => parse_parcel_row(row),
            None => Err(RepoError::NotFound(number)),
        }
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE client = ?1;"))
            .context("select_by_client")?;

        let mut rows = stmt.query([client]).context("select_by_client")?;
        let mut parcels = Vec::new();

        while let Some(row) = rows.next().context("select_by_client")? {
            match parse_parcel_row(row) {
                Ok(parcel) => parcels.push(parcel),
                Err(err) => {
                    return Err(RepoError::PartialRead {
                        parcels,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(parcels)
    }

    fn set_status(&self, number: ParcelNumber, status: &ParcelStatus) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE parcel SET status = ?1 WHERE number = ?2;",
                params![status.as_str(), number],
            )
            .context("update_status")?;

        debug!(
            "event=parcel_set_status module=repo status=ok number={number} parcel_status={status} changed={changed}"
        );
        Ok(())
    }

    fn get_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus> {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM parcel WHERE number = ?1;",
                [number],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .context("select_status")?;

        match status {
            Some(Some(value)) => Ok(ParcelStatus::from(value)),
            Some(None) => Err(RepoError::InvalidData(format!(
                "NULL status for parcel {number}"
            ))),
            None => Err(RepoError::NotFound(number)),
        }
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE parcel SET address = ?1 WHERE number = ?2 AND status = ?3;",
                params![address, number, PARCEL_STATUS_REGISTERED],
            )
            .context("update_address")?;

        if changed == 0 {
            return Err(self.guard_rejection(number, GuardedAction::SetAddress));
        }

        debug!("event=parcel_set_address module=repo status=ok number={number}");
        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM parcel WHERE number = ?1 AND status = ?2;",
                params![number, PARCEL_STATUS_REGISTERED],
            )
            .context("delete")?;

        if changed == 0 {
            return Err(self.guard_rejection(number, GuardedAction::Delete));
        }

        debug!("event=parcel_delete module=repo status=ok number={number}");
        Ok(())
    }
}

fn ensure_parcel_schema(conn: &Connection) -> RepoResult<()> {
    let table_exists: bool = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [PARCEL_TABLE],
            |row| row.get(0),
        )
        .context("schema_check")?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(PARCEL_TABLE));
    }

    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1);")
        .context("schema_check")?;
    let present = stmt
        .query_map([PARCEL_TABLE], |row| row.get::<_, String>(0))
        .context("schema_check")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("schema_check")?;

    for &column in PARCEL_COLUMNS {
        if !present.iter().any(|name| name.eq_ignore_ascii_case(column)) {
            return Err(RepoError::MissingRequiredColumn {
                table: PARCEL_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let number: ParcelNumber = row.get("number").context("scan")?;

    Ok(Parcel {
        number,
        client: row.get("client").context("scan")?,
        status: ParcelStatus::from(required_text(row, "status", number)?),
        address: required_text(row, "address", number)?,
        created_at: required_text(row, "created_at", number)?,
    })
}

fn required_text(row: &Row<'_>, column: &str, number: ParcelNumber) -> RepoResult<String> {
    row.get::<_, Option<String>>(column)
        .context("scan")?
        .ok_or_else(|| RepoError::InvalidData(format!("NULL {column} for parcel {number}")))
}
