//! Identifier safety checks.
//!
//! Table and column names cannot be bound as parameters, so they are
//! concatenated into the SQL text. Every such name must pass
//! [`is_identifier_safe`] first.

use crate::error::{KiwiError, KiwiResult};

/// True iff `name` is non-empty and made only of word characters `[A-Za-z0-9_]`.
pub fn is_identifier_safe(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True iff the list is non-empty and every element is identifier-safe.
pub fn are_identifiers_safe<S: AsRef<str>>(names: &[S]) -> bool {
    !names.is_empty() && names.iter().all(|n| is_identifier_safe(n.as_ref()))
}

/// Reject an unsafe identifier with [`KiwiError::InvalidInput`].
///
/// `kind` names the role of the identifier in the message ("table", "column").
pub fn ensure_identifier(kind: &str, name: &str) -> KiwiResult<()> {
    if is_identifier_safe(name) {
        Ok(())
    } else {
        Err(KiwiError::invalid(format!("unsafe {} name '{}'", kind, name)))
    }
}

/// Reject a column list that is empty or holds an unsafe name.
pub fn ensure_columns<S: AsRef<str>>(columns: &[S]) -> KiwiResult<()> {
    if columns.is_empty() {
        return Err(KiwiError::invalid("column list is empty"));
    }
    for col in columns {
        ensure_identifier("column", col.as_ref())?;
    }
    Ok(())
}
