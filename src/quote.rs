use crate::error::{Result, StencilError};

/// Quote `identifier` as an SQL identifier using double quotes, doubling any
/// embedded double quote so the value cannot leave its quoted form.
pub fn quote_identifier(identifier: &str) -> Result<String> {
    if identifier.is_empty() {
        return Err(StencilError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: "identifier is empty",
        });
    }
    if identifier.contains('\0') {
        return Err(StencilError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: "identifier contains a NUL character",
        });
    }
    Ok(format!("\"{}\"", identifier.replace('"', "\"\"")))
}

/// The identifier quoting primitive a driver offers.
pub trait QuoteIdentifier {
    fn quote_identifier(&self, identifier: &str) -> Result<String> {
        quote_identifier(identifier)
    }
}

/// Standard SQL double quote quoting, understood by SQLite and PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiQuoter;

impl QuoteIdentifier for AnsiQuoter {}
