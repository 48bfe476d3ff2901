use std::fmt;
use std::sync::Arc;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use crate::api::cursor::Cursor;
use crate::api::executor::ApiExecutor;
use crate::api::types::ImportResult;
use crate::arango_ensure;
use crate::common::document::{DocumentId, DocumentKey, DocumentMetadata};
use crate::common::error::{ArangoError, ErrorCode, ErrorKind, Result};
use crate::common::utils::encode_segment;
use crate::connection::{Request, Response};

/// Behaviour of an insert hitting an existing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteMode {
    Ignore,
    Replace,
    Update,
    Conflict,
}

impl OverwriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverwriteMode::Ignore => "ignore",
            OverwriteMode::Replace => "replace",
            OverwriteMode::Update => "update",
            OverwriteMode::Conflict => "conflict",
        }
    }
}

/// Options of document reads (`has`, `get`)
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Expected revision, overrides the `_rev` of a document body
    pub rev: Option<String>,
    pub check_rev: bool,
    pub allow_dirty_read: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            rev: None,
            check_rev: true,
            allow_dirty_read: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    pub return_new: bool,
    pub return_old: bool,
    pub sync: Option<bool>,
    pub overwrite: bool,
    pub overwrite_mode: Option<OverwriteMode>,
    pub keep_none: Option<bool>,
    pub merge: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub check_rev: bool,
    pub merge: bool,
    pub keep_none: bool,
    pub return_new: bool,
    pub return_old: bool,
    pub sync: Option<bool>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        UpdateOptions {
            check_rev: true,
            merge: true,
            keep_none: true,
            return_new: false,
            return_old: false,
            sync: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplaceOptions {
    pub check_rev: bool,
    pub return_new: bool,
    pub return_old: bool,
    pub sync: Option<bool>,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        ReplaceOptions {
            check_rev: true,
            return_new: false,
            return_old: false,
            sync: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub rev: Option<String>,
    pub check_rev: bool,
    pub ignore_missing: bool,
    pub return_old: bool,
    pub sync: Option<bool>,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        DeleteOptions {
            rev: None,
            check_rev: true,
            ignore_missing: false,
            return_old: false,
            sync: None,
        }
    }
}

/// Handling of imported documents whose key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDuplicate {
    Error,
    Update,
    Replace,
    Ignore,
}

impl OnDuplicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDuplicate::Error => "error",
            OnDuplicate::Update => "update",
            OnDuplicate::Replace => "replace",
            OnDuplicate::Ignore => "ignore",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Import nothing when any document fails
    pub halt_on_error: bool,
    /// Report a message for every failed document
    pub details: bool,
    pub from_prefix: Option<String>,
    pub to_prefix: Option<String>,
    /// Remove all documents before importing
    pub overwrite: Option<bool>,
    pub on_duplicate: Option<OnDuplicate>,
    pub sync: Option<bool>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            halt_on_error: true,
            details: true,
            from_prefix: None,
            to_prefix: None,
            overwrite: None,
            on_duplicate: None,
            sync: None,
        }
    }
}

/// Changes of collection properties, see [`Collection::configure`]
#[derive(Debug, Clone, Default)]
pub struct ConfigureOptions {
    pub sync: Option<bool>,
    pub schema: Option<Value>,
    pub replication_factor: Option<u64>,
    pub write_concern: Option<u64>,
}

impl ConfigureOptions {
    fn body(&self) -> Value {
        let mut body = Map::new();
        if let Some(sync) = self.sync {
            body.insert("waitForSync".to_string(), json!(sync));
        }
        if let Some(schema) = &self.schema {
            body.insert("schema".to_string(), schema.clone());
        }
        if let Some(factor) = self.replication_factor {
            body.insert("replicationFactor".to_string(), json!(factor));
        }
        if let Some(concern) = self.write_concern {
            body.insert("writeConcern".to_string(), json!(concern));
        }
        Value::Object(body)
    }
}

pub(crate) fn strip_status(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        map.remove("code");
        map.remove("error");
    }
    body
}

/// Document collection API.
///
/// Clones share the collection name, so a rename through one handle is seen
/// by all of them.
#[derive(Clone)]
pub struct Collection<E: ApiExecutor> {
    executor: E,
    name: Arc<RwLock<String>>,
}

impl<E: ApiExecutor> Collection<E> {
    pub(crate) fn new(executor: E, name: impl Into<String>) -> Self {
        Collection { executor, name: Arc::new(RwLock::new(name.into())) }
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn id_prefix(&self) -> String {
        format!("{}/", self.name.read())
    }

    /// Collection name, percent-encoded for use in a path
    pub(crate) fn segment(&self) -> String {
        encode_segment(&self.name.read())
    }

    pub(crate) fn validate_id<'a>(&self, doc_id: &'a str) -> Result<&'a str> {
        if DocumentId::parse(doc_id)?.collection() != self.name.read().as_str() {
            return Err(ArangoError::document_parse(format!(
                "bad collection name in document ID \"{}\"",
                doc_id
            )));
        }
        Ok(doc_id)
    }

    pub(crate) fn extract_id(&self, body: &Map<String, Value>) -> Result<String> {
        if let Some(id) = body.get("_id").and_then(Value::as_str) {
            return self.validate_id(id).map(str::to_string);
        }
        match body.get("_key").and_then(Value::as_str) {
            Some(key) => Ok(format!("{}{}", self.id_prefix(), key)),
            None => Err(ArangoError::document_parse("field \"_key\" or \"_id\" required")),
        }
    }

    /// Resolve a key, an ID or a body into a document ID and the revision to
    /// check, if any
    fn prep_handle(&self, document: &Value, rev: Option<&str>, check_rev: bool) -> Result<(String, Option<String>)> {
        let (doc_id, rev) = match document {
            Value::Object(body) => {
                let doc_id = self.extract_id(body)?;
                let rev = rev
                    .map(str::to_string)
                    .or_else(|| body.get("_rev").and_then(Value::as_str).map(str::to_string));
                (doc_id, rev)
            }
            Value::String(handle) if handle.contains('/') => {
                (self.validate_id(handle)?.to_string(), rev.map(str::to_string))
            }
            Value::String(key) => {
                let key = DocumentKey::new(key.as_str())?;
                (format!("{}{}", self.id_prefix(), key), rev.map(str::to_string))
            }
            _ => {
                return Err(ArangoError::document_parse(
                    "document must be a key, an ID or an object",
                ))
            }
        };
        Ok((doc_id, rev.filter(|_| check_rev)))
    }

    /// Copy the key out of `_id` when the body only carries the ID
    pub(crate) fn ensure_key_from_id(&self, mut body: Map<String, Value>) -> Result<Map<String, Value>> {
        if body.contains_key("_key") {
            return Ok(body);
        }
        if let Some(id) = body.get("_id").and_then(Value::as_str) {
            let key = self.validate_id(id)?[self.id_prefix().len()..].to_string();
            body.insert("_key".to_string(), Value::String(key));
        }
        Ok(body)
    }

    /// Like [`Self::ensure_key_from_id`], but a body with neither `_key`
    /// nor `_id` is an error
    pub(crate) fn ensure_key_in_body(&self, body: Map<String, Value>) -> Result<Map<String, Value>> {
        if !body.contains_key("_key") && !body.contains_key("_id") {
            return Err(ArangoError::document_parse("field \"_key\" or \"_id\" required"));
        }
        self.ensure_key_from_id(body)
    }

    fn document_endpoint(&self, doc_id: &str) -> String {
        let key = &doc_id[self.id_prefix().len()..];
        format!("/_api/document/{}/{}", self.segment(), encode_segment(key))
    }

    pub(crate) fn into_body(document: Value) -> Result<Map<String, Value>> {
        match document {
            Value::Object(body) => Ok(body),
            _ => Err(ArangoError::document_parse("document must be an object")),
        }
    }

    fn metadata(kind: ErrorKind, resp: Response) -> Result<DocumentMetadata> {
        if resp.status_code == 412 {
            return Err(ArangoError::server(ErrorKind::DocumentRevision, &resp));
        }
        if !resp.is_success {
            return Err(ArangoError::server(kind, &resp));
        }
        resp.json()
    }

    /// Collection properties
    pub async fn properties(&self) -> Result<E::Output<Value>> {
        let request = Request::get(format!("/_api/collection/{}/properties", self.segment()));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionProperties, &resp));
                }
                Ok(strip_status(resp.body))
            })
            .await
    }

    /// Number of documents
    pub async fn count(&self) -> Result<E::Output<u64>> {
        let request = Request::get(format!("/_api/collection/{}/count", self.segment()));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::DocumentCount, &resp));
                }
                resp.json_field::<u64>("count")
            })
            .await
    }

    /// Delete every document
    pub async fn truncate(&self) -> Result<E::Output<bool>> {
        let request = Request::put(format!("/_api/collection/{}/truncate", self.segment()));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionTruncate, &resp));
                }
                Ok(true)
            })
            .await
    }

    fn read_request(&self, document: &Value, options: &ReadOptions) -> Result<Request> {
        let (doc_id, rev) = self.prep_handle(document, options.rev.as_deref(), options.check_rev)?;
        let mut request = Request::get(self.document_endpoint(&doc_id));
        if let Some(rev) = rev {
            request = request.with_header("If-Match", rev);
        }
        if options.allow_dirty_read {
            request = request.with_header("x-arango-allow-dirty-read", "true");
        }
        Ok(request)
    }

    /// Check whether a document exists. `document` is a key, an ID or a body
    /// carrying `_key` or `_id`.
    pub async fn has(&self, document: impl Into<Value>, options: ReadOptions) -> Result<E::Output<bool>> {
        let request = self.read_request(&document.into(), &options)?;
        self.executor
            .execute(request, |resp: Response| {
                if resp.error_code == Some(ErrorCode::ArangoDocumentNotFound.as_u32()) {
                    return Ok(false);
                }
                if resp.status_code == 412 {
                    return Err(ArangoError::server(ErrorKind::DocumentRevision, &resp));
                }
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::DocumentIn, &resp));
                }
                Ok(true)
            })
            .await
    }

    /// Fetch a document, `None` when it does not exist
    pub async fn get(&self, document: impl Into<Value>, options: ReadOptions) -> Result<E::Output<Option<Value>>> {
        let request = self.read_request(&document.into(), &options)?;
        self.executor
            .execute(request, |resp: Response| {
                if resp.error_code == Some(ErrorCode::ArangoDocumentNotFound.as_u32()) {
                    return Ok(None);
                }
                if resp.status_code == 412 {
                    return Err(ArangoError::server(ErrorKind::DocumentRevision, &resp));
                }
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::DocumentGet, &resp));
                }
                Ok(Some(resp.body))
            })
            .await
    }

    /// Insert a new document. A `_key` (or an `_id` of this collection) picks
    /// the key, otherwise the server generates one.
    pub async fn insert(&self, document: Value, options: InsertOptions) -> Result<E::Output<DocumentMetadata>> {
        let body = self.ensure_key_from_id(Self::into_body(document)?)?;

        let request = Request::post(format!("/_api/document/{}", self.segment()))
            .with_json(Value::Object(body))
            .with_param("returnNew", options.return_new)
            .with_param("returnOld", options.return_old)
            .with_param("overwrite", options.overwrite)
            .with_opt_param("waitForSync", options.sync)
            .with_opt_param("overwriteMode", options.overwrite_mode.map(|m| m.as_str()))
            .with_opt_param("keepNull", options.keep_none)
            .with_opt_param("mergeObjects", options.merge);

        self.executor
            .execute(request, |resp: Response| Self::metadata(ErrorKind::DocumentInsert, resp))
            .await
    }

    /// Partially update a document. The body must carry `_key` or `_id`; with
    /// `check_rev` its `_rev` must match the stored revision.
    pub async fn update(&self, document: Value, options: UpdateOptions) -> Result<E::Output<DocumentMetadata>> {
        let body = Self::into_body(document)?;
        let doc_id = self.extract_id(&body)?;

        let request = Request::patch(self.document_endpoint(&doc_id))
            .with_json(Value::Object(body))
            .with_param("keepNull", options.keep_none)
            .with_param("mergeObjects", options.merge)
            .with_param("returnNew", options.return_new)
            .with_param("returnOld", options.return_old)
            .with_param("ignoreRevs", !options.check_rev)
            .with_opt_param("waitForSync", options.sync);

        self.executor
            .execute(request, |resp: Response| Self::metadata(ErrorKind::DocumentUpdate, resp))
            .await
    }

    /// Replace a document body entirely
    pub async fn replace(&self, document: Value, options: ReplaceOptions) -> Result<E::Output<DocumentMetadata>> {
        let body = Self::into_body(document)?;
        let doc_id = self.extract_id(&body)?;

        let request = Request::put(self.document_endpoint(&doc_id))
            .with_json(Value::Object(body))
            .with_param("returnNew", options.return_new)
            .with_param("returnOld", options.return_old)
            .with_param("ignoreRevs", !options.check_rev)
            .with_opt_param("waitForSync", options.sync);

        self.executor
            .execute(request, |resp: Response| Self::metadata(ErrorKind::DocumentReplace, resp))
            .await
    }

    /// Delete a document. `None` when it is missing and `ignore_missing` is set.
    pub async fn delete(&self, document: impl Into<Value>, options: DeleteOptions) -> Result<E::Output<Option<DocumentMetadata>>> {
        let (doc_id, rev) = self.prep_handle(&document.into(), options.rev.as_deref(), options.check_rev)?;

        let mut request = Request::delete(self.document_endpoint(&doc_id))
            .with_param("returnOld", options.return_old)
            .with_param("ignoreRevs", !options.check_rev)
            .with_opt_param("waitForSync", options.sync);
        if let Some(rev) = rev {
            request = request.with_header("If-Match", rev);
        }

        let ignore_missing = options.ignore_missing;
        self.executor
            .execute(request, move |resp: Response| {
                if ignore_missing && resp.error_code == Some(ErrorCode::ArangoDocumentNotFound.as_u32()) {
                    return Ok(None);
                }
                Self::metadata(ErrorKind::DocumentDelete, resp).map(Some)
            })
            .await
    }
}

/// Value of a field that the server reports either as a string or a number
fn text_field(kind: ErrorKind, resp: &Response, field: &str) -> Result<String> {
    match resp.field(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        _ => Err(ArangoError::server_with_message(kind, resp, format!("missing field \"{}\"", field))),
    }
}

/// Split a bulk response into one result per submitted document. Items
/// without `_id` are failures; with `revision_errors` a conflicting revision
/// is reported as [`ErrorKind::DocumentRevision`].
fn bulk_results(kind: ErrorKind, resp: Response, revision_errors: bool) -> Result<Vec<Result<DocumentMetadata>>> {
    if !resp.is_success {
        return Err(ArangoError::server(kind, &resp));
    }
    let Value::Array(items) = &resp.body else {
        return Err(ArangoError::server_with_message(kind, &resp, "expected one result per document"));
    };

    Ok(items
        .iter()
        .map(|item| {
            if item.get("_id").is_some() {
                return serde_json::from_value::<DocumentMetadata>(item.clone()).map_err(ArangoError::from);
            }
            let item_resp = resp.bulk_error(item.clone());
            let kind = if revision_errors && item_resp.error_code == Some(ErrorCode::ArangoConflict.as_u32()) {
                ErrorKind::DocumentRevision
            } else {
                kind
            };
            Err(ArangoError::server(kind, &item_resp))
        })
        .collect())
}

impl<E: ApiExecutor> Collection<E> {
    // Reads returning cursors

    async fn cursor_read(&self, endpoint: &str, kind: ErrorKind, body: Value) -> Result<E::Output<Cursor>> {
        let request = Request::put(endpoint).with_json(body);
        let conn = self.executor.connection().clone();
        self.executor
            .execute(request, move |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(kind, &resp));
                }
                Cursor::new(conn.clone(), &resp.body)
            })
            .await
    }

    /// Every document, optionally skipping the first `skip` and returning
    /// at most `limit`
    pub async fn all(&self, skip: Option<u64>, limit: Option<u64>) -> Result<E::Output<Cursor>> {
        let mut body = json!({ "collection": self.name() });
        if let Some(skip) = skip {
            body["skip"] = json!(skip);
        }
        if let Some(limit) = limit {
            body["limit"] = json!(limit);
        }
        self.cursor_read("/_api/simple/all", ErrorKind::DocumentGet, body).await
    }

    /// Documents matching every field of `filters`
    pub async fn find(&self, filters: Value, skip: Option<u64>, limit: Option<u64>) -> Result<E::Output<Cursor>> {
        arango_ensure!(filters.is_object(), ErrorKind::DocumentGet, "filters must be an object");
        let mut body = json!({ "collection": self.name(), "example": filters });
        if let Some(skip) = skip {
            body["skip"] = json!(skip);
        }
        if let Some(limit) = limit {
            body["limit"] = json!(limit);
        }
        self.cursor_read("/_api/simple/by-example", ErrorKind::DocumentGet, body).await
    }

    /// IDs of all documents
    pub async fn ids(&self) -> Result<E::Output<Cursor>> {
        let body = json!({ "collection": self.name(), "type": "id" });
        self.cursor_read("/_api/simple/all-keys", ErrorKind::DocumentIds, body).await
    }

    /// Keys of all documents
    pub async fn keys(&self) -> Result<E::Output<Cursor>> {
        let body = json!({ "collection": self.name(), "type": "key" });
        self.cursor_read("/_api/simple/all-keys", ErrorKind::DocumentKeys, body).await
    }

    /// Fetch several documents by key, ID or body. Missing ones are left out.
    pub async fn get_many(&self, documents: Vec<Value>, allow_dirty_read: bool) -> Result<E::Output<Vec<Value>>> {
        let handles = documents
            .into_iter()
            .map(|document| match document {
                Value::Object(body) => self.extract_id(&body).map(Value::String),
                other => Ok(other),
            })
            .collect::<Result<Vec<Value>>>()?;

        let mut request = Request::put(format!("/_api/document/{}", self.segment()))
            .with_param("onlyget", true)
            .with_json(Value::Array(handles));
        if allow_dirty_read {
            request = request.with_header("x-arango-allow-dirty-read", "true");
        }

        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::DocumentGet, &resp));
                }
                let docs: Vec<Value> = resp.json()?;
                Ok(docs.into_iter().filter(|doc| doc.get("_id").is_some()).collect())
            })
            .await
    }

    // Bulk writes

    /// Insert several documents in one request. Each document gets its own
    /// result; a failed insert does not fail the others.
    pub async fn insert_many(&self, documents: Vec<Value>, options: InsertOptions) -> Result<E::Output<Vec<Result<DocumentMetadata>>>> {
        let bodies = documents
            .into_iter()
            .map(|document| self.ensure_key_from_id(Self::into_body(document)?).map(Value::Object))
            .collect::<Result<Vec<Value>>>()?;

        let request = Request::post(format!("/_api/document/{}", self.segment()))
            .with_json(Value::Array(bodies))
            .with_param("returnNew", options.return_new)
            .with_param("returnOld", options.return_old)
            .with_param("overwrite", options.overwrite)
            .with_opt_param("waitForSync", options.sync)
            .with_opt_param("overwriteMode", options.overwrite_mode.map(|m| m.as_str()))
            .with_opt_param("keepNull", options.keep_none)
            .with_opt_param("mergeObjects", options.merge);

        self.executor
            .execute(request, |resp: Response| bulk_results(ErrorKind::DocumentInsert, resp, false))
            .await
    }

    fn bulk_bodies(&self, documents: Vec<Value>) -> Result<Value> {
        documents
            .into_iter()
            .map(|document| self.ensure_key_in_body(Self::into_body(document)?).map(Value::Object))
            .collect::<Result<Vec<Value>>>()
            .map(Value::Array)
    }

    /// Partially update several documents, each identified by its `_key` or `_id`
    pub async fn update_many(&self, documents: Vec<Value>, options: UpdateOptions) -> Result<E::Output<Vec<Result<DocumentMetadata>>>> {
        let request = Request::patch(format!("/_api/document/{}", self.segment()))
            .with_json(self.bulk_bodies(documents)?)
            .with_param("keepNull", options.keep_none)
            .with_param("mergeObjects", options.merge)
            .with_param("returnNew", options.return_new)
            .with_param("returnOld", options.return_old)
            .with_param("ignoreRevs", !options.check_rev)
            .with_param("overwrite", !options.check_rev)
            .with_opt_param("waitForSync", options.sync);

        self.executor
            .execute(request, |resp: Response| bulk_results(ErrorKind::DocumentUpdate, resp, true))
            .await
    }

    /// Replace several documents, each identified by its `_key` or `_id`
    pub async fn replace_many(&self, documents: Vec<Value>, options: ReplaceOptions) -> Result<E::Output<Vec<Result<DocumentMetadata>>>> {
        let request = Request::put(format!("/_api/document/{}", self.segment()))
            .with_json(self.bulk_bodies(documents)?)
            .with_param("returnNew", options.return_new)
            .with_param("returnOld", options.return_old)
            .with_param("ignoreRevs", !options.check_rev)
            .with_param("overwrite", !options.check_rev)
            .with_opt_param("waitForSync", options.sync);

        self.executor
            .execute(request, |resp: Response| bulk_results(ErrorKind::DocumentReplace, resp, true))
            .await
    }

    /// Delete several documents given as keys, IDs or bodies. `rev` and
    /// `ignore_missing` of the options do not apply: revisions come from the
    /// bodies and missing documents are reported per item.
    pub async fn delete_many(&self, documents: Vec<Value>, options: DeleteOptions) -> Result<E::Output<Vec<Result<DocumentMetadata>>>> {
        let handles = documents
            .into_iter()
            .map(|document| match document {
                Value::Object(body) => self.ensure_key_in_body(body).map(Value::Object),
                other => Ok(other),
            })
            .collect::<Result<Vec<Value>>>()?;

        let request = Request::delete(format!("/_api/document/{}", self.segment()))
            .with_json(Value::Array(handles))
            .with_param("returnOld", options.return_old)
            .with_param("ignoreRevs", !options.check_rev)
            .with_param("overwrite", !options.check_rev)
            .with_opt_param("waitForSync", options.sync);

        self.executor
            .execute(request, |resp: Response| bulk_results(ErrorKind::DocumentDelete, resp, true))
            .await
    }

    fn import_request(&self, documents: Vec<Map<String, Value>>, options: &ImportOptions) -> Request {
        let documents = documents.into_iter().map(Value::Object).collect();
        Request::post("/_api/import")
            .with_json(Value::Array(documents))
            .with_param("type", "array")
            .with_param("collection", self.name())
            .with_param("complete", options.halt_on_error)
            .with_param("details", options.details)
            .with_opt_param("fromPrefix", options.from_prefix.as_deref())
            .with_opt_param("toPrefix", options.to_prefix.as_deref())
            .with_opt_param("overwrite", options.overwrite)
            .with_opt_param("onDuplicate", options.on_duplicate.map(|d| d.as_str()))
            .with_opt_param("waitForSync", options.sync)
    }

    fn import_handler(resp: Response) -> Result<ImportResult> {
        if !resp.is_success {
            return Err(ArangoError::server(ErrorKind::DocumentInsert, &resp));
        }
        resp.json::<ImportResult>()
    }

    /// Import documents with the bulk import API. Faster than
    /// [`Self::insert_many`] but reports only counts and error messages.
    pub async fn import_bulk(&self, documents: Vec<Value>, options: ImportOptions) -> Result<E::Output<ImportResult>> {
        let bodies = documents
            .into_iter()
            .map(|document| self.ensure_key_from_id(Self::into_body(document)?))
            .collect::<Result<Vec<_>>>()?;
        let request = self.import_request(bodies, &options);
        self.executor.execute(request, Self::import_handler).await
    }

    /// Import documents in requests of at most `batch_size` documents each.
    /// Not allowed together with `overwrite`, which would empty the
    /// collection before every batch.
    pub async fn import_bulk_batched(
        &self,
        documents: Vec<Value>,
        batch_size: usize,
        options: ImportOptions,
    ) -> Result<Vec<E::Output<ImportResult>>> {
        arango_ensure!(batch_size > 0, ErrorKind::DocumentInsert, "batch size must be positive");
        arango_ensure!(
            options.overwrite != Some(true),
            ErrorKind::DocumentInsert,
            "cannot use a batch size together with overwrite"
        );

        let bodies = documents
            .into_iter()
            .map(|document| self.ensure_key_from_id(Self::into_body(document)?))
            .collect::<Result<Vec<_>>>()?;

        let mut results = Vec::new();
        for batch in bodies.chunks(batch_size) {
            let request = self.import_request(batch.to_vec(), &options);
            results.push(self.executor.execute(request, Self::import_handler).await?);
        }
        Ok(results)
    }

    // Administration

    /// Rename the collection. Handles cloned from this one follow the new
    /// name once the rename succeeded.
    pub async fn rename(&self, new_name: &str) -> Result<E::Output<bool>> {
        let request = Request::put(format!("/_api/collection/{}/rename", self.segment()))
            .with_json(json!({ "name": new_name }));
        let name = Arc::clone(&self.name);
        let new_name = new_name.to_string();
        self.executor
            .execute(request, move |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionRename, &resp));
                }
                *name.write() = new_name.clone();
                Ok(true)
            })
            .await
    }

    /// Change collection properties and return the new ones
    pub async fn configure(&self, options: ConfigureOptions) -> Result<E::Output<Value>> {
        let request = Request::put(format!("/_api/collection/{}/properties", self.segment()))
            .with_json(options.body());
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionConfigure, &resp));
                }
                Ok(strip_status(resp.body))
            })
            .await
    }

    /// Storage figures of the collection
    pub async fn statistics(&self) -> Result<E::Output<Value>> {
        let request = Request::get(format!("/_api/collection/{}/figures", self.segment()));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionStatistics, &resp));
                }
                Ok(resp.field("figures").cloned().unwrap_or_else(|| strip_status(resp.body)))
            })
            .await
    }

    pub async fn revision(&self) -> Result<E::Output<String>> {
        let request = Request::get(format!("/_api/collection/{}/revision", self.segment()));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionRevision, &resp));
                }
                text_field(ErrorKind::CollectionRevision, &resp, "revision")
            })
            .await
    }

    /// Checksum over the document keys, optionally covering revisions and data
    pub async fn checksum(&self, with_rev: bool, with_data: bool) -> Result<E::Output<String>> {
        let request = Request::get(format!("/_api/collection/{}/checksum", self.segment()))
            .with_param("withRevision", with_rev)
            .with_param("withData", with_data);
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionChecksum, &resp));
                }
                text_field(ErrorKind::CollectionChecksum, &resp, "checksum")
            })
            .await
    }

    pub async fn recalculate_count(&self) -> Result<E::Output<bool>> {
        let request = Request::put(format!("/_api/collection/{}/recalculateCount", self.segment()));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::CollectionRecalculateCount, &resp));
                }
                Ok(true)
            })
            .await
    }
}

impl<E: ApiExecutor> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<StandardCollection {}>", self.name.read())
    }
}
