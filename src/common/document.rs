use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use crate::common::error::{ArangoError, Result};

/// Document key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        Self::validate_key(&key)?;
        Ok(DocumentKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(ArangoError::document_parse("document key cannot be empty"));
        }

        if key.len() > 254 {
            return Err(ArangoError::document_parse("document key too long (max 254 characters)"));
        }

        const PUNCTUATION: &str = "_-:.@()+,=;$!*'%";
        if let Some(c) = key.chars().find(|c| !c.is_ascii_alphanumeric() && !PUNCTUATION.contains(*c)) {
            return Err(ArangoError::document_parse(format!("invalid character '{}' in document key", c)));
        }

        Ok(())
    }
}

impl FromStr for DocumentKey {
    type Err = ArangoError;

    fn from_str(s: &str) -> Result<Self> {
        DocumentKey::new(s)
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = ArangoError;

    fn try_from(key: String) -> Result<Self> {
        DocumentKey::new(key)
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> String {
        key.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document ID - `collection/key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    pub collection: String,
    pub key: DocumentKey,
}

impl DocumentId {
    pub fn new(collection: impl Into<String>, key: DocumentKey) -> Self {
        DocumentId {
            collection: collection.into(),
            key,
        }
    }

    /// Parse document ID from string format "collection/key"
    pub fn parse(id: &str) -> Result<Self> {
        let (collection, key) = id
            .split_once('/')
            .ok_or_else(|| ArangoError::document_parse(format!("bad document ID \"{}\"", id)))?;
        if collection.is_empty() {
            return Err(ArangoError::document_parse(format!("bad document ID \"{}\"", id)));
        }

        Ok(DocumentId {
            collection: collection.to_string(),
            key: DocumentKey::new(key)?,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

impl Serialize for DocumentId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DocumentId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Metadata returned by document write operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_key")]
    pub key: String,

    #[serde(rename = "_rev")]
    pub rev: String,

    /// Previous revision, set on update/replace and on overwriting inserts
    #[serde(rename = "_oldRev", default, skip_serializing_if = "Option::is_none")]
    pub old_rev: Option<String>,

    /// New document body when `return_new` was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,

    /// Old document body when `return_old` was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
}

impl DocumentMetadata {
    pub fn document_id(&self) -> Result<DocumentId> {
        DocumentId::parse(&self.id)
    }
}
