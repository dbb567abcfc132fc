use std::fmt;
use std::str::FromStr;

use crate::error::KiraError;

/// Separator for fallback columns in textual input, e.g. `dummy|ENSG00000097007`.
pub const FALLBACK_SEPARATOR: char = '|';

/// One submitted gene. `WithFallbacks` holds alternatives ordered by
/// authority; the first entry is the identifier reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Simple(String),
    WithFallbacks(Vec<String>),
}

impl Identifier {
    pub fn simple(value: impl Into<String>) -> Self {
        Identifier::Simple(value.into())
    }

    pub fn with_fallbacks<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Identifier::WithFallbacks(values.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        match self {
            Identifier::Simple(value) => std::slice::from_ref(value),
            Identifier::WithFallbacks(values) => values,
        }
    }

    pub fn width(&self) -> usize {
        self.columns().len()
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns().get(index).map(String::as_str)
    }

    /// Most authoritative identifier; `None` only for an empty fallback list.
    pub fn primary(&self) -> Option<&str> {
        self.column(0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Simple(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Simple(value)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Identifier::Simple(value.to_string())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns().join(&FALLBACK_SEPARATOR.to_string()))
    }
}

impl FromStr for Identifier {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut columns = value
            .split(FALLBACK_SEPARATOR)
            .map(|column| column.trim().to_string())
            .collect::<Vec<_>>();
        if columns.iter().any(String::is_empty) {
            return Err(KiraError::InvalidIdentifiers(format!(
                "empty identifier column in '{value}'"
            )));
        }
        if columns.len() == 1 {
            Ok(Identifier::Simple(columns.remove(0)))
        } else {
            Ok(Identifier::WithFallbacks(columns))
        }
    }
}

/// Provider scopes. `Single` is one comma-joined scope string queried once;
/// `Fallback` is one scope string per retry column, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scopes {
    Single(String),
    Fallback(Vec<String>),
}

impl Scopes {
    pub fn single(scope: impl Into<String>) -> Self {
        Scopes::Single(scope.into())
    }

    pub fn fallback<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scopes::Fallback(scopes.into_iter().map(Into::into).collect())
    }

    /// One scope collapses to `Single`, several to `Fallback`.
    pub fn from_list(mut scopes: Vec<String>) -> Result<Self, KiraError> {
        match scopes.len() {
            0 => Err(KiraError::InvalidIdentifiers(
                "at least one scope is required".to_string(),
            )),
            1 => Ok(Scopes::Single(scopes.remove(0))),
            _ => Ok(Scopes::Fallback(scopes)),
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            Scopes::Single(scope) => std::slice::from_ref(scope),
            Scopes::Fallback(scopes) => scopes,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Scopes::Fallback(_))
    }
}

/// Rejects batches whose shape does not match the scopes before any request
/// is made.
pub fn validate_batch(ids: &[Identifier], scopes: &Scopes) -> Result<(), KiraError> {
    if scopes.columns().is_empty() {
        return Err(KiraError::InvalidIdentifiers(
            "at least one scope is required".to_string(),
        ));
    }
    if scopes.columns().iter().any(|scope| scope.trim().is_empty()) {
        return Err(KiraError::InvalidIdentifiers("empty scope".to_string()));
    }

    let expected = scopes.columns().len();
    for id in ids {
        match (scopes, id) {
            (Scopes::Single(_), Identifier::WithFallbacks(values)) if values.len() != 1 => {
                return Err(KiraError::InvalidIdentifiers(format!(
                    "fallback identifier '{id}' requires one scope per column"
                )));
            }
            (Scopes::Fallback(_), Identifier::Simple(_)) => {
                return Err(KiraError::InvalidIdentifiers(format!(
                    "scope fallback requires fallback identifiers, got '{id}'"
                )));
            }
            _ => {}
        }
        if id.width() != expected {
            return Err(KiraError::InvalidIdentifiers(format!(
                "identifier '{id}' has {} columns, expected {expected}",
                id.width()
            )));
        }
        if id.columns().iter().any(|value| value.trim().is_empty()) {
            return Err(KiraError::InvalidIdentifiers(format!(
                "identifier '{id}' contains an empty column"
            )));
        }
    }
    Ok(())
}

/// All identifiers passed to the result assembler must have the same width.
pub fn uniform_width(ids: &[Identifier]) -> Result<usize, KiraError> {
    let Some(first) = ids.first() else {
        return Ok(0);
    };
    let width = first.width();
    if width == 0 {
        return Err(KiraError::InvalidIdentifiers(
            "empty fallback identifier".to_string(),
        ));
    }
    if let Some(odd) = ids.iter().find(|id| id.width() != width) {
        return Err(KiraError::InvalidIdentifiers(format!(
            "identifier '{odd}' has {} columns, expected {width}",
            odd.width()
        )));
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_fallback_columns() {
        let id: Identifier = "dummy_id_1 | ENSG00000097007".parse().unwrap();
        assert_eq!(
            id,
            Identifier::with_fallbacks(["dummy_id_1", "ENSG00000097007"])
        );
        assert_eq!(id.primary(), Some("dummy_id_1"));

        let id: Identifier = "ABL1".parse().unwrap();
        assert_eq!(id, Identifier::simple("ABL1"));
    }

    #[test]
    fn parse_rejects_empty_column() {
        let err = "ABL1||25".parse::<Identifier>().unwrap_err();
        assert_matches!(err, KiraError::InvalidIdentifiers(_));
    }

    #[test]
    fn numeric_identifiers_are_stringified() {
        assert_eq!(Identifier::from(3550u64), Identifier::simple("3550"));
    }

    #[test]
    fn fallback_width_must_match_scopes() {
        let scopes = Scopes::fallback(["symbol", "ensembl.gene"]);
        let ids = vec![
            Identifier::with_fallbacks(["ABL1", "ENSG00000097007"]),
            Identifier::with_fallbacks(["JAK2"]),
        ];
        let err = validate_batch(&ids, &scopes).unwrap_err();
        assert_matches!(err, KiraError::InvalidIdentifiers(_));
    }

    #[test]
    fn fallback_scopes_reject_plain_identifiers() {
        let scopes = Scopes::fallback(["symbol", "ensembl.gene"]);
        let err = validate_batch(&[Identifier::simple("ABL1")], &scopes).unwrap_err();
        assert_matches!(err, KiraError::InvalidIdentifiers(_));
    }

    #[test]
    fn single_scope_rejects_multi_column_identifiers() {
        let scopes = Scopes::single("symbol,alias");
        let ids = vec![Identifier::with_fallbacks(["ABL1", "25"])];
        assert!(validate_batch(&ids, &scopes).is_err());
        assert!(validate_batch(&[Identifier::simple("ABL1")], &scopes).is_ok());
    }

    #[test]
    fn uniform_width_checks_every_identifier() {
        assert_eq!(uniform_width(&[]).unwrap(), 0);
        let ids = vec![
            Identifier::with_fallbacks(["a", "b"]),
            Identifier::simple("c"),
        ];
        assert!(uniform_width(&ids).is_err());
    }
}
