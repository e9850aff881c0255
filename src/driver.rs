//! The database surface the executor consumes, and its SQLite backend.

use std::fmt;
use std::path::Path;

use rusqlite::types::ValueRef;
use serde::Serialize;
use tracing::debug;

use crate::compile::Placeholder;
use crate::quote::QuoteIdentifier;

/// A scalar column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(t) => write!(f, "{t}"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        }
    }
}

pub type Row = Vec<Value>;
pub type Rows = Vec<Row>;

/// Render a row as a JSON array, e.g. `[1,"a.mp4",null]`.
pub fn row_to_json(row: &Row) -> crate::error::Result<String> {
    Ok(serde_json::to_string(row)?)
}

/// A failure reported by the database itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError(pub String);

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DriverError {}

impl From<rusqlite::Error> for DriverError {
    fn from(e: rusqlite::Error) -> Self {
        DriverError(e.to_string())
    }
}

/// A connection with an implicit current transaction.
///
/// Statements run inside the current transaction until [`Driver::commit`] or
/// [`Driver::rollback`] ends it; the next statement starts a new one.
pub trait Driver: QuoteIdentifier {
    /// Run `sql` with `args` bound positionally. Returns all rows when the
    /// statement produces columns, `None` otherwise.
    fn execute(&mut self, sql: &str, args: &[String]) -> Result<Option<Rows>, DriverError>;
    /// Run several argument-less statements, e.g. a schema script.
    fn execute_script(&mut self, sql: &str) -> Result<(), DriverError>;
    fn commit(&mut self) -> Result<(), DriverError>;
    fn rollback(&mut self) -> Result<(), DriverError>;
    fn placeholder(&self) -> Placeholder;
}

// ------------- SQLite -------------
pub struct SqliteDriver {
    connection: rusqlite::Connection,
}

impl SqliteDriver {
    pub fn new(connection: rusqlite::Connection) -> Self {
        Self { connection }
    }
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        Ok(Self::new(rusqlite::Connection::open(path)?))
    }
    pub fn open_in_memory() -> Result<Self, DriverError> {
        Ok(Self::new(rusqlite::Connection::open_in_memory()?))
    }
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.connection
    }
    /// True while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        !self.connection.is_autocommit()
    }
    fn begin_if_needed(&mut self) -> Result<(), DriverError> {
        if self.connection.is_autocommit() {
            debug!("begin");
            self.connection.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

impl QuoteIdentifier for SqliteDriver {}

impl Driver for SqliteDriver {
    fn execute(&mut self, sql: &str, args: &[String]) -> Result<Option<Rows>, DriverError> {
        self.begin_if_needed()?;
        let mut statement = self.connection.prepare(sql)?;
        let columns = statement.column_count();
        let mut rows = statement.query(rusqlite::params_from_iter(args.iter()))?;
        if columns == 0 {
            // stepping is what actually runs a mutation
            while rows.next()?.is_some() {}
            return Ok(None);
        }
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns);
            for i in 0..columns {
                values.push(Value::from(row.get_ref(i)?));
            }
            fetched.push(values);
        }
        Ok(Some(fetched))
    }
    fn execute_script(&mut self, sql: &str) -> Result<(), DriverError> {
        self.begin_if_needed()?;
        self.connection.execute_batch(sql)?;
        Ok(())
    }
    fn commit(&mut self) -> Result<(), DriverError> {
        if !self.connection.is_autocommit() {
            debug!("commit");
            self.connection.execute_batch("COMMIT")?;
        }
        Ok(())
    }
    fn rollback(&mut self) -> Result<(), DriverError> {
        if !self.connection.is_autocommit() {
            debug!("rollback");
            self.connection.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
    fn placeholder(&self) -> Placeholder {
        Placeholder::Qmark
    }
}
