use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::common::error::{ArangoError, ErrorKind};

/// Collection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CollectionType {
    Document,
    Edge,
}

impl TryFrom<u8> for CollectionType {
    type Error = ArangoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(CollectionType::Document),
            3 => Ok(CollectionType::Edge),
            other => Err(ArangoError::client(
                ErrorKind::CollectionList,
                format!("unknown collection type {}", other),
            )),
        }
    }
}

impl From<CollectionType> for u8 {
    fn from(value: CollectionType) -> u8 {
        match value {
            CollectionType::Document => 2,
            CollectionType::Edge => 3,
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionType::Document => write!(f, "document"),
            CollectionType::Edge => write!(f, "edge"),
        }
    }
}

/// Entry of the collection list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    #[serde(default)]
    pub status: Option<u8>,
    #[serde(default)]
    pub globally_unique_id: Option<String>,
}

impl CollectionInfo {
    pub fn status_text(&self) -> Option<&'static str> {
        match self.status? {
            1 => Some("new"),
            2 => Some("unloaded"),
            3 => Some("loaded"),
            4 => Some("unloading"),
            5 => Some("deleted"),
            6 => Some("loading"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVersion {
    pub server: String,
    pub version: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub details: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseProperties {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub sharding: Option<String>,
    #[serde(default)]
    pub replication_factor: Option<Value>,
    #[serde(default)]
    pub write_concern: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub period: Option<f64>,
    #[serde(default)]
    pub created: Option<f64>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub offset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "user")]
    pub username: String,
    pub active: bool,
    #[serde(default)]
    pub extra: Option<Value>,
}

/// Access level of a user on a database or collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "rw")]
    ReadWrite,
    #[serde(rename = "ro")]
    ReadOnly,
    #[serde(rename = "none")]
    None,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadWrite => "rw",
            Permission::ReadOnly => "ro",
            Permission::None => "none",
        }
    }
}

/// Foxx service summary or details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub mount: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub development: bool,
    #[serde(default)]
    pub legacy: bool,
    #[serde(default)]
    pub provides: Option<Value>,
    /// Remaining fields of the detailed view (`manifest`, `options`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Running or slow AQL query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInfo {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bind_vars: Option<Value>,
    #[serde(default)]
    pub run_time: Option<f64>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Index of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// `<collection>/<number>`
    pub id: String,
    #[serde(rename = "type")]
    pub index_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(default)]
    pub unique: Option<bool>,
    #[serde(default)]
    pub sparse: Option<bool>,
    #[serde(default)]
    pub is_newly_created: Option<bool>,
    /// Type specific attributes (`expireAfter`, `minLength`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexInfo {
    /// Id without the collection prefix, as used by [`delete_index`]
    ///
    /// [`delete_index`]: crate::api::Collection::delete_index
    pub fn short_id(&self) -> &str {
        self.id.rsplit_once('/').map_or(self.id.as_str(), |(_, id)| id)
    }
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub empty: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub ignored: u64,
    /// One message per failed document, when details were requested
    #[serde(default)]
    pub details: Vec<String>,
}

/// Server log entries, one position per entry across the lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntries {
    #[serde(default)]
    pub lid: Vec<u64>,
    #[serde(default)]
    pub level: Vec<u8>,
    #[serde(default)]
    pub timestamp: Vec<u64>,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub topic: Vec<String>,
    #[serde(default)]
    pub total_amount: u64,
}

/// State of a stream transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Running,
    Committed,
    Aborted,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Running => write!(f, "running"),
            TransactionStatus::Committed => write!(f, "committed"),
            TransactionStatus::Aborted => write!(f, "aborted"),
        }
    }
}
