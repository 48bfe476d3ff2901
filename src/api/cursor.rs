use std::collections::VecDeque;
use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::connection::{Connection, Request};

/// Execution statistics reported with a query result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorStatistics {
    #[serde(rename = "writesExecuted", default)]
    pub modified: Option<u64>,
    #[serde(rename = "writesIgnored", default)]
    pub ignored: Option<u64>,
    #[serde(default)]
    pub scanned_full: Option<u64>,
    #[serde(default)]
    pub scanned_index: Option<u64>,
    #[serde(default)]
    pub filtered: Option<u64>,
    #[serde(default)]
    pub full_count: Option<u64>,
    #[serde(default)]
    pub http_requests: Option<u64>,
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub peak_memory_usage: Option<u64>,
    #[serde(default)]
    pub cursors_created: Option<u64>,
    #[serde(default)]
    pub cursors_rearmed: Option<u64>,
    #[serde(default)]
    pub cache_hits: Option<u64>,
    #[serde(default)]
    pub cache_misses: Option<u64>,
}

/// Server-side query cursor.
///
/// Results arrive in batches; the cursor buffers the current batch and fetches
/// the next one on demand. A cursor is stateful and meant to be driven by a
/// single task.
pub struct Cursor {
    conn: Connection,
    id: Option<String>,
    batch: VecDeque<Value>,
    has_more: bool,
    count: Option<u64>,
    cached: Option<bool>,
    statistics: Option<CursorStatistics>,
    profile: Option<Value>,
    warnings: Option<Vec<Value>>,
}

impl Cursor {
    pub(crate) fn new(conn: Connection, data: &Value) -> Result<Self> {
        let mut cursor = Cursor {
            conn,
            id: None,
            batch: VecDeque::new(),
            has_more: false,
            count: None,
            cached: None,
            statistics: None,
            profile: None,
            warnings: None,
        };
        cursor.update(data)?;
        Ok(cursor)
    }

    fn update(&mut self, data: &Value) -> Result<()> {
        if let Some(id) = data.get("id").and_then(Value::as_str) {
            self.id = Some(id.to_string());
        }
        if let Some(count) = data.get("count").and_then(Value::as_u64) {
            self.count = Some(count);
        }
        if let Some(cached) = data.get("cached").and_then(Value::as_bool) {
            self.cached = Some(cached);
        }
        self.has_more = data.get("hasMore").and_then(Value::as_bool).unwrap_or(false);

        match data.get("result") {
            Some(Value::Array(items)) => self.batch.extend(items.iter().cloned()),
            _ => {
                return Err(ArangoError::client(
                    ErrorKind::CursorNext,
                    "cursor response carries no result batch",
                ))
            }
        }

        if let Some(extra) = data.get("extra") {
            if let Some(profile) = extra.get("profile") {
                self.profile = Some(profile.clone());
            }
            if let Some(Value::Array(warnings)) = extra.get("warnings") {
                self.warnings = Some(warnings.clone());
            }
            if let Some(stats) = extra.get("stats") {
                self.statistics = Some(serde_json::from_value(stats.clone())?);
            }
        }
        Ok(())
    }

    /// Server-side id, unset when the whole result fit in the first batch
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn batch(&self) -> &VecDeque<Value> {
        &self.batch
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Total number of results, only when counting was requested
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Like [`Cursor::count`] but fails when counting was not requested
    pub fn len(&self) -> Result<u64> {
        self.count
            .ok_or_else(|| ArangoError::client(ErrorKind::CursorCount, "cursor count not enabled"))
    }

    pub fn cached(&self) -> Option<bool> {
        self.cached
    }

    pub fn statistics(&self) -> Option<&CursorStatistics> {
        self.statistics.as_ref()
    }

    pub fn profile(&self) -> Option<&Value> {
        self.profile.as_ref()
    }

    pub fn warnings(&self) -> Option<&[Value]> {
        self.warnings.as_deref()
    }

    /// True when the current batch is used up
    pub fn empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Take the next item of the current batch without contacting the server
    pub fn pop(&mut self) -> Result<Value> {
        self.batch
            .pop_front()
            .ok_or_else(|| ArangoError::client(ErrorKind::CursorEmpty, "current batch is empty"))
    }

    /// Next item, fetching a new batch when needed. `None` once the result
    /// set is exhausted.
    pub async fn next(&mut self) -> Result<Option<Value>> {
        if self.empty() {
            if !self.has_more {
                return Ok(None);
            }
            self.fetch().await?;
        }
        self.pop().map(Some)
    }

    /// Fetch the next batch into the buffer
    pub async fn fetch(&mut self) -> Result<()> {
        let Some(id) = self.id.clone() else {
            return Err(ArangoError::client(ErrorKind::CursorState, "cursor ID not set"));
        };
        let request = Request::put(format!("/_api/cursor/{}", id));
        let resp = self.conn.send_request(&request).await?;
        if !resp.is_success {
            return Err(ArangoError::server(ErrorKind::CursorNext, &resp));
        }
        self.update(&resp.body)
    }

    /// Release the cursor on the server.
    ///
    /// `None` when there is nothing to release, `Some(false)` when the server
    /// no longer knows the cursor and `ignore_missing` is set.
    pub async fn close(&mut self, ignore_missing: bool) -> Result<Option<bool>> {
        let Some(id) = self.id.as_deref() else {
            return Ok(None);
        };
        let request = Request::delete(format!("/_api/cursor/{}", id));
        let resp = self.conn.send_request(&request).await?;
        if resp.is_success {
            return Ok(Some(true));
        }
        if resp.status_code == 404 && ignore_missing {
            return Ok(Some(false));
        }
        Err(ArangoError::server(ErrorKind::CursorClose, &resp))
    }

    /// Drain every remaining result, fetching batches as needed
    pub async fn collect_all(&mut self) -> Result<Vec<Value>> {
        let mut items = Vec::with_capacity(self.batch.len());
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "<Cursor {}>", id),
            None => write!(f, "<Cursor>"),
        }
    }
}
