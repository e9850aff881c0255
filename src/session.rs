//! Executing compiled statements with commit or rollback.
//!
//! A [`Session`] owns one driver connection. Single statements run through
//! [`Session::execute`] and are committed straight away. Several statements
//! that must succeed or fail together run through a [`Batch`], which holds the
//! session exclusively until it is committed, rolled back or dropped.

use tracing::{error, info, warn};

use crate::compile::{compile_with, CompiledStatement};
use crate::driver::{Driver, Rows};
use crate::error::{Result, StencilError};
use crate::template::{Substitutions, Template};

/// When the transaction a statement ran in is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Immediate,
    /// Leave the transaction open for further statements.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

fn roll_back<D: Driver + ?Sized>(driver: &mut D, sql: &str) {
    warn!(sql, "rolling back after failed statement");
    if let Err(e) = driver.rollback() {
        error!(error = %e, "rollback failed");
    }
}

/// Run `statement` on `driver`.
///
/// A database failure rolls the current transaction back before
/// [`StencilError::ExecutionFailure`] is returned; there are no retries.
pub fn execute<D: Driver + ?Sized>(driver: &mut D, statement: &CompiledStatement, commit: Commit) -> Result<Option<Rows>> {
    let rows = match driver.execute(statement.sql(), statement.args()) {
        Ok(rows) => rows,
        Err(e) => {
            roll_back(driver, statement.sql());
            return Err(StencilError::ExecutionFailure {
                sql: statement.sql().to_string(),
                message: e.to_string(),
            });
        }
    };
    if commit == Commit::Immediate {
        commit_or_roll_back(driver, statement.sql())?;
    }
    Ok(rows)
}

fn commit_or_roll_back<D: Driver + ?Sized>(driver: &mut D, sql: &str) -> Result<()> {
    driver.commit().map_err(|e| {
        roll_back(driver, sql);
        StencilError::ExecutionFailure { sql: sql.to_string(), message: e.to_string() }
    })
}

pub struct Session<D: Driver> {
    driver: D,
}

impl<D: Driver> Session<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }
    pub fn driver(&self) -> &D {
        &self.driver
    }
    /// Compile `template` with this session's quoting and placeholder syntax.
    pub fn compile(&self, template: &Template, request: &Substitutions) -> Result<CompiledStatement> {
        compile_with(template, request, &self.driver, self.driver.placeholder())
    }
    /// Compile and run a single statement, committing on success.
    pub fn execute(&mut self, template: &Template, request: &Substitutions) -> Result<Option<Rows>> {
        let statement = self.compile(template, request)?;
        execute(&mut self.driver, &statement, Commit::Immediate)
    }
    /// Run an argument-less script (e.g. schema creation) and commit it.
    pub fn execute_script(&mut self, sql: &str) -> Result<()> {
        if let Err(e) = self.driver.execute_script(sql) {
            roll_back(&mut self.driver, sql);
            return Err(StencilError::ExecutionFailure { sql: sql.to_string(), message: e.to_string() });
        }
        commit_or_roll_back(&mut self.driver, sql)
    }
    /// Start a batch: statements run in one transaction that is committed once.
    pub fn batch(&mut self) -> Batch<'_, D> {
        Batch { session: self, state: TransactionState::Open, statements: 0 }
    }
}

/// One transaction spanning several statements.
///
/// A failing statement rolls back everything the batch did so far and closes
/// it; dropping a batch that was neither committed nor rolled back rolls it
/// back as well.
pub struct Batch<'s, D: Driver> {
    session: &'s mut Session<D>,
    state: TransactionState,
    statements: usize,
}

impl<D: Driver> Batch<'_, D> {
    pub fn state(&self) -> TransactionState {
        self.state
    }
    /// Number of statements executed so far.
    pub fn len(&self) -> usize {
        self.statements
    }
    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }
    fn ensure_open(&self) -> Result<()> {
        match self.state {
            TransactionState::Open => Ok(()),
            _ => Err(StencilError::TransactionClosed),
        }
    }
    pub fn execute(&mut self, template: &Template, request: &Substitutions) -> Result<Option<Rows>> {
        self.ensure_open()?;
        let statement = self.session.compile(template, request)?;
        self.execute_compiled(&statement)
    }
    pub fn execute_compiled(&mut self, statement: &CompiledStatement) -> Result<Option<Rows>> {
        self.ensure_open()?;
        match execute(&mut self.session.driver, statement, Commit::Deferred) {
            Ok(rows) => {
                self.statements += 1;
                Ok(rows)
            }
            Err(e) => {
                self.state = TransactionState::RolledBack;
                Err(e)
            }
        }
    }
    pub fn commit(mut self) -> Result<()> {
        self.ensure_open()?;
        let result = commit_or_roll_back(&mut self.session.driver, "COMMIT");
        self.state = match result {
            Ok(()) => TransactionState::Committed,
            Err(_) => TransactionState::RolledBack,
        };
        if result.is_ok() {
            info!(statements = self.statements, "batch committed");
        }
        result
    }
    pub fn rollback(mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = TransactionState::RolledBack;
        self.session
            .driver
            .rollback()
            .map_err(|e| StencilError::ExecutionFailure { sql: "ROLLBACK".to_string(), message: e.to_string() })
    }
}

impl<D: Driver> Drop for Batch<'_, D> {
    fn drop(&mut self) {
        if self.state == TransactionState::Open {
            warn!(statements = self.statements, "batch dropped without commit, rolling back");
            if let Err(e) = self.session.driver.rollback() {
                error!(error = %e, "rollback failed");
            }
        }
    }
}
