//! Turning a template and its classified keys into a statement.
//!
//! Compilation happens in two phases. Identifier substitution replaces every
//! `{key}` with a quoted identifier, producing text that is final apart from
//! its `%key%` value markers. Value substitution then replaces each value
//! marker with positional placeholders and collects the arguments so that
//! argument `i` binds placeholder `i`.
//!
//! Both phases rebuild the text in a single left-to-right pass using offsets
//! taken from the text they were given, never by repeated string replacement.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::classify::{classify, ClassifiedKeys};
use crate::error::{Result, StencilError};
use crate::quote::{AnsiQuoter, QuoteIdentifier};
use crate::template::{Binding, MarkerKind, Substitutions, Template};

/// Positional placeholder syntax of the target driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `%s`
    #[default]
    Format,
    /// `?`
    Qmark,
    /// `$1`, `$2`, ...
    Numbered,
}

impl Placeholder {
    /// Placeholder text for the argument at 1-based `position`.
    pub fn render(&self, position: usize) -> String {
        match self {
            Placeholder::Format => "%s".to_string(),
            Placeholder::Qmark => "?".to_string(),
            Placeholder::Numbered => format!("${position}"),
        }
    }
}

/// A value marker still waiting for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    offset: usize,
    key: String,
    binding: Binding,
}

/// Template text after identifier substitution. Value markers are still in
/// place, so this is not executable yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierResolved {
    sql: String,
    pending: Vec<Pending>,
}

impl IdentifierResolved {
    pub fn sql(&self) -> &str {
        &self.sql
    }
    /// Replace the remaining value markers with placeholders.
    pub fn bind_values(self, placeholder: Placeholder) -> Result<CompiledStatement> {
        rebuild_values(&self.sql, self.pending, placeholder)
    }
}

/// Final SQL text together with its ordered argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStatement {
    sql: String,
    args: Vec<String>,
}

impl CompiledStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn args(&self) -> &[String] {
        &self.args
    }
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.sql, self.args)
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {:?}", self.sql, self.args)
    }
}

enum Edit<'a> {
    Identifier { offset: usize, key: &'a str, binding: &'a Binding },
    Value { offset: usize, key: &'a str, binding: &'a Binding },
}

impl Edit<'_> {
    fn offset(&self) -> usize {
        match self {
            Edit::Identifier { offset, .. } | Edit::Value { offset, .. } => *offset,
        }
    }
}

fn quote_binding<Q: QuoteIdentifier + ?Sized>(quoter: &Q, key: &str, binding: &Binding) -> Result<String> {
    if binding.is_empty() {
        return Err(StencilError::EmptyBinding { key: key.to_string() });
    }
    let quoted = binding
        .items()
        .iter()
        .map(|item| quoter.quote_identifier(item))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

/// Replace every `{key}` marker with its quoted identifier (or comma separated
/// list of quoted identifiers).
///
/// Fails with [`StencilError::UnboundIdentifier`] if the template contains an
/// identifier marker that nothing was supplied for.
pub fn substitute_identifiers<Q: QuoteIdentifier + ?Sized>(
    template: &Template,
    classified: &ClassifiedKeys,
    quoter: &Q,
) -> Result<IdentifierResolved> {
    if let Some(key) = template
        .identifier_keys()
        .find(|key| !classified.identifiers.contains_key(*key))
    {
        return Err(StencilError::UnboundIdentifier { key: key.to_string() });
    }

    let mut edits: Vec<Edit> = classified
        .identifiers
        .iter()
        .map(|(key, placed)| Edit::Identifier { offset: placed.offset, key: key.as_str(), binding: &placed.binding })
        .chain(
            classified
                .values
                .iter()
                .map(|(key, placed)| Edit::Value { offset: placed.offset, key: key.as_str(), binding: &placed.binding }),
        )
        .collect();
    edits.sort_by_key(|edit| edit.offset());

    let text = template.text();
    let mut sql = String::with_capacity(text.len());
    let mut pending = Vec::with_capacity(classified.values.len());
    let mut cursor = 0;
    for edit in edits {
        match edit {
            Edit::Identifier { offset, key, binding } => {
                sql.push_str(&text[cursor..offset]);
                sql.push_str(&quote_binding(quoter, key, binding)?);
                cursor = offset + MarkerKind::Identifier.marker(key).len();
            }
            Edit::Value { offset, key, binding } => {
                // value markers are copied through verbatim, only their new position is recorded
                sql.push_str(&text[cursor..offset]);
                cursor = offset;
                pending.push(Pending { offset: sql.len(), key: key.to_string(), binding: binding.clone() });
            }
        }
    }
    sql.push_str(&text[cursor..]);
    Ok(IdentifierResolved { sql, pending })
}

/// Replace every `%key%` marker in `sql` with positional placeholders and
/// build the matching argument list.
///
/// `sql` is searched as plain text, so each marker must occur exactly once.
/// Text that went through [`substitute_identifiers`] may hold marker-like
/// quoted identifiers; bind it with [`IdentifierResolved::bind_values`], which
/// knows where the real markers are.
pub fn substitute_values(
    sql: &str,
    values: &BTreeMap<String, Binding>,
    placeholder: Placeholder,
) -> Result<CompiledStatement> {
    let mut pending = Vec::with_capacity(values.len());
    for (key, binding) in values {
        let marker = MarkerKind::Value.marker(key);
        let offset = sql
            .find(&marker)
            .ok_or_else(|| StencilError::KeyNotFoundInTemplate { key: key.clone() })?;
        if sql[offset + 1..].contains(&marker) {
            return Err(StencilError::RepeatedKeyUsage { key: key.clone() });
        }
        pending.push(Pending { offset, key: key.clone(), binding: binding.clone() });
    }
    rebuild_values(sql, pending, placeholder)
}

fn rebuild_values(sql: &str, mut pending: Vec<Pending>, placeholder: Placeholder) -> Result<CompiledStatement> {
    pending.sort_by_key(|p| p.offset);
    let mut text = String::with_capacity(sql.len());
    let mut args = Vec::new();
    let mut cursor = 0;
    let mut previous: Option<&str> = None;
    for p in &pending {
        if p.offset < cursor {
            return Err(StencilError::OverlappingMarkers {
                first: previous.unwrap_or_default().to_string(),
                second: p.key.clone(),
            });
        }
        if p.binding.is_empty() {
            return Err(StencilError::EmptyBinding { key: p.key.clone() });
        }
        text.push_str(&sql[cursor..p.offset]);
        let placeholders: Vec<String> = (0..p.binding.len())
            .map(|i| placeholder.render(args.len() + i + 1))
            .collect();
        text.push_str(&placeholders.join(", "));
        args.extend(p.binding.items().iter().cloned());
        cursor = p.offset + MarkerKind::Value.marker(&p.key).len();
        previous = Some(p.key.as_str());
    }
    text.push_str(&sql[cursor..]);
    Ok(CompiledStatement { sql: text, args })
}

/// Classify, then substitute identifiers and values, using standard quoting
/// and `%s` placeholders.
pub fn compile(template: &Template, request: &Substitutions) -> Result<CompiledStatement> {
    compile_with(template, request, &AnsiQuoter, Placeholder::Format)
}

/// Like [`compile`], with the quoting primitive and placeholder syntax of a
/// particular driver.
pub fn compile_with<Q: QuoteIdentifier + ?Sized>(
    template: &Template,
    request: &Substitutions,
    quoter: &Q,
    placeholder: Placeholder,
) -> Result<CompiledStatement> {
    let classified = classify(template, request)?;
    let statement = substitute_identifiers(template, &classified, quoter)?.bind_values(placeholder)?;
    debug!(
        sql = statement.sql(),
        identifiers = classified.identifiers.len(),
        args = statement.args().len(),
        "compiled template"
    );
    Ok(statement)
}
