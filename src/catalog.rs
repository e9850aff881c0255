//! Table level operations assembled from the bundled templates in `queries/`.

use lazy_static::lazy_static;
use tracing::info;

use crate::driver::{Driver, Rows};
use crate::error::{Result, StencilError};
use crate::session::Session;
use crate::template::{Binding, Substitutions, Template};

lazy_static! {
    static ref LIST_TABLES: Template = Template::new(include_str!("../queries/list_tables.sql"));
    static ref LIST_COLUMNS: Template = Template::new(include_str!("../queries/list_columns.sql"));
    static ref SELECT: Template = Template::new(include_str!("../queries/select.sql"));
    static ref INSERT: Template = Template::new(include_str!("../queries/insert.sql"));
    static ref DROP_TABLE: Template = Template::new(include_str!("../queries/drop_table.sql"));
}

fn first_column(rows: Option<Rows>) -> Vec<String> {
    rows.unwrap_or_default()
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|value| value.to_string())
        .collect()
}

pub struct Catalog<'s, D: Driver> {
    session: &'s mut Session<D>,
}

impl<'s, D: Driver> Catalog<'s, D> {
    pub fn new(session: &'s mut Session<D>) -> Self {
        Self { session }
    }

    /// Run a schema script, e.g. a set of `create table` statements.
    pub fn create_tables(&mut self, script: &str) -> Result<()> {
        self.session.execute_script(script)?;
        info!("tables created");
        Ok(())
    }

    /// Names of all user tables, sorted.
    pub fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(first_column(self.session.execute(&LIST_TABLES, &Substitutions::new())?))
    }

    fn ensure_table(&mut self, table: &str) -> Result<()> {
        if self.list_tables()?.iter().any(|t| t.as_str() == table) {
            Ok(())
        } else {
            Err(StencilError::UnknownTable { table: table.to_string() })
        }
    }

    /// Column names of `table` in declaration order.
    pub fn list_columns(&mut self, table: &str) -> Result<Vec<String>> {
        self.ensure_table(table)?;
        let request = Substitutions::new().with("table", table);
        Ok(first_column(self.session.execute(&LIST_COLUMNS, &request)?))
    }

    /// Resolve the column list for `table`: all of its columns when `columns`
    /// is `None`, otherwise the given ones after checking each exists.
    fn resolve_columns(&mut self, table: &str, columns: Option<&[&str]>) -> Result<Vec<String>> {
        let existing = self.list_columns(table)?;
        let Some(requested) = columns else {
            return Ok(existing);
        };
        let invalid: Vec<String> = requested
            .iter()
            .filter(|c| !existing.iter().any(|e| e.as_str() == **c))
            .map(|c| c.to_string())
            .collect();
        if !invalid.is_empty() {
            return Err(StencilError::InvalidColumnReference { table: table.to_string(), columns: invalid });
        }
        Ok(requested.iter().map(|c| c.to_string()).collect())
    }

    /// Fetch `columns` (or every column) of all rows in `table`.
    pub fn select(&mut self, table: &str, columns: Option<&[&str]>) -> Result<Rows> {
        let columns = self.resolve_columns(table, columns)?;
        let request = Substitutions::new()
            .with("table", table)
            .with("columns", Binding::List(columns));
        Ok(self.session.execute(&SELECT, &request)?.unwrap_or_default())
    }

    /// Insert `rows` into `table` in a single transaction.
    ///
    /// Either every row is inserted or, on the first failure, none are.
    pub fn insert_rows(&mut self, table: &str, columns: Option<&[&str]>, rows: &[Vec<String>]) -> Result<usize> {
        let columns = self.resolve_columns(table, columns)?;
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(StencilError::RowArity { expected: columns.len(), found: row.len() });
        }
        if rows.is_empty() {
            return Ok(0);
        }
        let mut batch = self.session.batch();
        for row in rows {
            let request = Substitutions::new()
                .with("table", table)
                .with("columns", Binding::List(columns.clone()))
                .with("values", Binding::List(row.clone()));
            batch.execute(&INSERT, &request)?;
        }
        batch.commit()?;
        info!(table, rows = rows.len(), "rows inserted");
        Ok(rows.len())
    }

    /// Drop every table in `tables` in one transaction.
    pub fn drop_tables(&mut self, tables: &[&str]) -> Result<()> {
        if tables.is_empty() {
            return Err(StencilError::EmptyTableList);
        }
        let existing = self.list_tables()?;
        if let Some(missing) = tables.iter().find(|t| !existing.iter().any(|e| e.as_str() == **t)) {
            return Err(StencilError::UnknownTable { table: missing.to_string() });
        }
        let mut batch = self.session.batch();
        for table in tables {
            batch.execute(&DROP_TABLE, &Substitutions::new().with("table", *table))?;
        }
        batch.commit()?;
        info!(tables = ?tables, "tables dropped");
        Ok(())
    }
}

impl<D: Driver> Session<D> {
    pub fn catalog(&mut self) -> Catalog<'_, D> {
        Catalog::new(self)
    }
}
