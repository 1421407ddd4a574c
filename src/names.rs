//! Schema reference names
//!
//! A reference to a schema type is either a bare name (`PongSerializer`) or a
//! dotted path whose last segment is the name and whose prefix is the module
//! that declares it (`app.links.LinkSerializer`).

use crate::error::LookupError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

/// Check if a string is a valid identifier (field, schema or module segment)
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Check if a string is a valid module path or schema reference
pub fn is_valid_reference(reference: &str) -> bool {
    REFERENCE.is_match(reference)
}

/// Split a reference into its module (if qualified) and name
///
/// The split happens on the last `.`, so `a.b.Name` names `Name` in module
/// `a.b`, and a bare `Name` carries no module.
pub fn split_reference(reference: &str) -> Result<(Option<&str>, &str), LookupError> {
    if !is_valid_reference(reference) {
        return Err(LookupError::InvalidReference(reference.to_string()));
    }
    Ok(match reference.rsplit_once('.') {
        Some((module, name)) => (Some(module), name),
        None => (None, reference),
    })
}

/// Join a module path and a name into a qualified reference
pub fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", module, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("LinkSerializer"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("field2"));

        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2field"));
        assert!(!is_valid_identifier("a.b"));
    }

    #[test]
    fn test_is_valid_reference() {
        assert!(is_valid_reference("Name"));
        assert!(is_valid_reference("app.models.Name"));

        assert!(!is_valid_reference(""));
        assert!(!is_valid_reference(".Name"));
        assert!(!is_valid_reference("app..Name"));
        assert!(!is_valid_reference("app.Name."));
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("Name").unwrap(), (None, "Name"));
        assert_eq!(
            split_reference("app.models.Name").unwrap(),
            (Some("app.models"), "Name")
        );
        assert_eq!(
            split_reference("bad name"),
            Err(LookupError::InvalidReference("bad name".to_string()))
        );
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("app", "Name"), "app.Name");
        assert_eq!(qualify("", "Name"), "Name");
    }
}
