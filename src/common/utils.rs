use crate::common::error::{ErrorKind, Result};
use crate::{arango_bail, arango_ensure};

/// Validate collection name according to ArangoDB rules
pub fn validate_collection_name(name: &str) -> Result<()> {
    let kind = ErrorKind::CollectionCreate;
    let Some(first_char) = name.chars().next() else {
        arango_bail!(kind, "collection name cannot be empty");
    };

    arango_ensure!(name.len() <= 256, kind, "collection name too long (max 256 characters)");

    // Must start with letter or underscore
    arango_ensure!(
        first_char.is_ascii_alphabetic() || first_char == '_',
        kind,
        "collection name must start with a letter or underscore"
    );

    if let Some(c) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-') {
        arango_bail!(kind, "invalid character '{}' in collection name", c);
    }

    Ok(())
}

/// Validate database name according to ArangoDB rules
pub fn validate_database_name(name: &str) -> Result<()> {
    let kind = ErrorKind::DatabaseCreate;
    arango_ensure!(!name.is_empty(), kind, "database name cannot be empty");
    arango_ensure!(name.len() <= 64, kind, "database name too long (max 64 characters)");
    arango_ensure!(
        !name.starts_with('_') && !name.starts_with(char::is_numeric),
        kind,
        "database name must not start with a digit or underscore"
    );

    if let Some(c) = name.chars().find(|c| *c == '/' || c.is_control()) {
        arango_bail!(kind, "invalid character {:?} in database name", c);
    }

    Ok(())
}

/// Percent-encode one URL path segment
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
