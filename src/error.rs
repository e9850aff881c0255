use thiserror::Error;

#[derive(Error, Debug)]
pub enum StencilError {
    #[error("Key \"{key}\" wasn't found in the SQL template")]
    KeyNotFoundInTemplate { key: String },
    #[error("Repeated use of \"{key}\" key word")]
    RepeatedKeyUsage { key: String },
    #[error("Key \"{key}\" is used both as {{{key}}} and as %{key}%")]
    AmbiguousKeyUsage { key: String },
    #[error("Invalid key \"{key}\": keys are made of letters, digits and underscores")]
    InvalidKey { key: String },
    #[error("Identifier marker {{{key}}} has no substitution")]
    UnboundIdentifier { key: String },
    #[error("Invalid identifier {identifier:?}: {reason}")]
    InvalidIdentifier { identifier: String, reason: &'static str },
    #[error("Key \"{key}\" is bound to an empty list")]
    EmptyBinding { key: String },
    #[error("Markers %{first}% and %{second}% overlap")]
    OverlappingMarkers { first: String, second: String },
    #[error("Invalid columns {columns:?} for table {table}")]
    InvalidColumnReference { table: String, columns: Vec<String> },
    #[error("Table '{table}' does not exist")]
    UnknownTable { table: String },
    #[error("Table names must be provided")]
    EmptyTableList,
    #[error("Row has {found} values but {expected} columns were given")]
    RowArity { expected: usize, found: usize },
    #[error("Execution failed: {message} (sql: {sql})")]
    ExecutionFailure { sql: String, message: String },
    #[error("The transaction has already been committed or rolled back")]
    TransactionClosed,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StencilError {
    /// True for errors raised while composing a statement, before the
    /// database was touched.
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFoundInTemplate { .. }
                | Self::RepeatedKeyUsage { .. }
                | Self::AmbiguousKeyUsage { .. }
                | Self::InvalidKey { .. }
                | Self::UnboundIdentifier { .. }
                | Self::InvalidIdentifier { .. }
                | Self::EmptyBinding { .. }
                | Self::OverlappingMarkers { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StencilError>;

// Helper conversions
impl From<config::ConfigError> for StencilError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
