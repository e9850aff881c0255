//! sqlstencil – templated SQL with safe identifier and value substitution.
//!
//! A template is SQL text with two kinds of markers:
//! * `{key}` – an *identifier* (table or column name). Drivers cannot bind
//!   identifiers, so these are quoted and written into the text.
//! * `%key%` – a *value*. These become positional placeholders and the values
//!   are passed to the driver as arguments.
//!
//! A key is bound to either a single string or a list of strings. A list
//! bound to an identifier becomes a comma separated list of quoted
//! identifiers; a list bound to a value becomes as many placeholders.
//!
//! ## Modules
//! * [`template`] – [`template::Template`], [`template::Binding`] and [`template::Substitutions`].
//! * [`classify`] – partitions requested keys into identifiers and values.
//! * [`compile`] – identifier substitution, then value substitution.
//! * [`quote`] – the identifier quoting primitive.
//! * [`driver`] – the [`driver::Driver`] surface and the SQLite backend.
//! * [`session`] – execution with commit / rollback and batches.
//! * [`catalog`] – table operations built from bundled templates.
//! * [`settings`] – configuration for the command line tool.
//!
//! ## Quick Start
//! ```
//! use sqlstencil::{compile, Substitutions, Template};
//! let template = Template::new("SELECT {cols} FROM {table} WHERE id = %id%");
//! let request = Substitutions::new()
//!     .with("cols", vec!["a", "b"])
//!     .with("table", "t")
//!     .with("id", "5");
//! let statement = compile(&template, &request).unwrap();
//! assert_eq!(statement.sql(), r#"SELECT "a", "b" FROM "t" WHERE id = %s"#);
//! assert_eq!(statement.args(), ["5"]);
//! ```
//!
//! ## Transactions
//! ```
//! use sqlstencil::{driver::SqliteDriver, Session, Substitutions, Template};
//! let mut session = Session::new(SqliteDriver::open_in_memory().unwrap());
//! session.execute_script("create table t (id integer primary key)").unwrap();
//! let insert = Template::new("insert into {table} (id) values (%id%)");
//! let mut batch = session.batch();
//! for id in ["1", "2", "3"] {
//!     batch.execute(&insert, &Substitutions::new().with("table", "t").with("id", id)).unwrap();
//! }
//! batch.commit().unwrap();
//! ```
//! A failing statement inside a batch rolls back everything the batch did.

pub mod catalog;
pub mod classify;
pub mod compile;
pub mod driver;
pub mod error;
pub mod quote;
pub mod session;
pub mod settings;
pub mod template;

pub use classify::{classify, ClassifiedKeys};
pub use compile::{compile, compile_with, substitute_identifiers, substitute_values, CompiledStatement, Placeholder};
pub use error::{Result, StencilError};
pub use session::{execute, Batch, Commit, Session, TransactionState};
pub use template::{Binding, Substitutions, Template};
