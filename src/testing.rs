//! In-memory stand-in for an ArangoDB server, plugged in as the transport of
//! a [`Connection`]. It understands the subset of the REST API the client
//! exercises, including the async job store.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use crate::api::executor::{ASYNC_HEADER, TRANSACTION_HEADER};
use crate::api::job::ASYNC_ID_HEADER;
use crate::common::error::Result;
use crate::connection::{Auth, Connection, HostResolver, HttpClient, HttpMethod, HttpRequest, HttpResponse};

const HOST: &str = "http://127.0.0.1:8529";
const DEFAULT_BATCH_SIZE: usize = 1000;
const TOKEN_SECRET: &[u8] = b"fake-server-secret";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Entries of the server log: id, level, text
const LOG_ENTRIES: [(u64, u8, &str); 3] = [
    (1, 3, "ArangoDB (version 3.11.0) is starting"),
    (2, 3, "using storage engine 'rocksdb'"),
    (3, 2, "ArangoDB is ready for business"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum FakeJobState {
    Pending,
    Done,
    Cancelled,
}

struct FakeJob {
    response: HttpResponse,
    state: FakeJobState,
    created: i64,
}

struct FakeCollection {
    id: String,
    edge: bool,
    wait_for_sync: bool,
    schema: Value,
    docs: BTreeMap<String, Value>,
    indexes: Vec<Value>,
}

struct FakeTransaction {
    status: &'static str,
    /// Documents of every collection at begin, restored on abort
    snapshot: Option<BTreeMap<String, BTreeMap<String, Value>>>,
}

struct FakeCursor {
    remaining: VecDeque<Value>,
    batch_size: usize,
}

struct FakeUser {
    active: bool,
    extra: Value,
    grants: BTreeMap<String, String>,
}

struct FakeService {
    development: bool,
    legacy: bool,
    config: Map<String, Value>,
}

struct State {
    auto_complete: bool,
    reject_async: bool,
    password: Option<String>,
    last_request: Option<HttpRequest>,
    request_count: usize,
    fail_job_result: bool,
    tokens: HashSet<String>,
    next_id: u64,
    jobs: BTreeMap<u64, FakeJob>,
    databases: Vec<String>,
    collections: BTreeMap<String, FakeCollection>,
    cursors: HashMap<String, FakeCursor>,
    tasks: BTreeMap<String, Value>,
    users: BTreeMap<String, FakeUser>,
    services: BTreeMap<String, FakeService>,
    transactions: BTreeMap<String, FakeTransaction>,
    log_levels: BTreeMap<String, String>,
}

fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
}

fn error_response(status: u16, error_num: u32, message: &str) -> HttpResponse {
    json_response(status, json!({
        "error": true,
        "code": status,
        "errorNum": error_num,
        "errorMessage": message,
    }))
}

fn ok_response(status: u16, mut body: Value) -> HttpResponse {
    if let Value::Object(map) = &mut body {
        map.insert("error".to_string(), json!(false));
        map.insert("code".to_string(), json!(status));
    }
    json_response(status, body)
}

fn not_found_collection() -> HttpResponse {
    error_response(404, 1203, "collection or view not found")
}

fn not_found_document() -> HttpResponse {
    error_response(404, 1202, "document not found")
}

fn not_found_service() -> HttpResponse {
    error_response(404, 3009, "service not found")
}

fn not_found_transaction() -> HttpResponse {
    error_response(404, 1655, "transaction not found")
}

/// Entry of a bulk response: the document metadata, or only the error
/// attributes of a failed operation
fn bulk_item(resp: HttpResponse) -> Value {
    let body: Value = serde_json::from_str(&resp.body).unwrap_or(Value::Null);
    if resp.status_code < 300 {
        return body;
    }
    json!({
        "error": true,
        "errorNum": body["errorNum"],
        "errorMessage": body["errorMessage"],
    })
}

/// Key named by a bulk item: a key, an ID or a body with `_key`
fn item_key(item: &Value) -> Option<String> {
    let handle = match item {
        Value::String(handle) => handle.as_str(),
        Value::Object(body) => body.get("_key").and_then(Value::as_str)?,
        _ => return None,
    };
    Some(handle.rsplit_once('/').map_or(handle, |(_, key)| key).to_string())
}

fn matches_example(doc: &Value, example: &Value) -> bool {
    match example {
        Value::Object(fields) => fields.iter().all(|(field, value)| doc.get(field) == Some(value)),
        _ => false,
    }
}

/// FNV-1a over the given parts
fn checksum<'a>(parts: impl Iterator<Item = &'a str>) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for part in parts {
        for byte in part.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
    }
    hash
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Parsed form of the supported AQL subset
enum FakeQuery {
    Value(Value),
    Scan(String),
}

fn parse_query(query: &str) -> std::result::Result<FakeQuery, HttpResponse> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    match tokens.as_slice() {
        ["RETURN", rest @ ..] if !rest.is_empty() => {
            if let Ok(value) = serde_json::from_str::<Value>(&rest.join(" ")) {
                return Ok(FakeQuery::Value(value));
            }
        }
        ["FOR", var, "IN", collection, "RETURN", ret] if var == ret => {
            return Ok(FakeQuery::Scan(collection.to_string()));
        }
        _ => {}
    }
    let near = tokens.get(1).copied().unwrap_or(query);
    Err(error_response(
        400,
        1501,
        &format!("syntax error, unexpected identifier near '{}' at position 1:9", near),
    ))
}

impl State {
    fn new() -> Self {
        State {
            auto_complete: false,
            reject_async: false,
            password: None,
            last_request: None,
            request_count: 0,
            fail_job_result: false,
            tokens: HashSet::new(),
            next_id: 1000,
            jobs: BTreeMap::new(),
            databases: vec!["_system".to_string(), "test".to_string()],
            collections: BTreeMap::new(),
            cursors: HashMap::new(),
            tasks: BTreeMap::new(),
            users: BTreeMap::new(),
            services: BTreeMap::new(),
            transactions: BTreeMap::new(),
            log_levels: BTreeMap::from([
                ("general".to_string(), "INFO".to_string()),
                ("queries".to_string(), "INFO".to_string()),
                ("requests".to_string(), "INFO".to_string()),
            ]),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn store_job(&mut self, response: HttpResponse, done: bool) -> String {
        let id = self.next_id();
        let state = if done { FakeJobState::Done } else { FakeJobState::Pending };
        self.jobs.insert(id, FakeJob { response, state, created: unix_now() });
        id.to_string()
    }

    fn create_collection(&mut self, name: &str, edge: bool) -> bool {
        if self.collections.contains_key(name) {
            return false;
        }
        let id = self.next_id().to_string();
        let primary = json!({
            "id": format!("{}/0", name),
            "type": "primary",
            "name": "primary",
            "fields": ["_key"],
            "unique": true,
            "sparse": false,
        });
        self.collections.insert(
            name.to_string(),
            FakeCollection {
                id,
                edge,
                wait_for_sync: false,
                schema: Value::Null,
                docs: BTreeMap::new(),
                indexes: vec![primary],
            },
        );
        true
    }

    fn collection_info(name: &str, col: &FakeCollection) -> Value {
        json!({
            "id": col.id,
            "name": name,
            "isSystem": name.starts_with('_'),
            "type": if col.edge { 3 } else { 2 },
            "status": 3,
            "globallyUniqueId": format!("h1/{}", col.id),
        })
    }

    fn authorized(&self, request: &HttpRequest) -> bool {
        match (&self.password, &request.auth) {
            (None, _) => true,
            (Some(expected), Some(Auth::Basic { password, .. })) => password == expected,
            (Some(_), Some(Auth::Bearer(token))) => self.tokens.contains(token),
            (Some(_), _) => false,
        }
    }

    /// Exchange credentials for a signed token
    fn open_auth(&mut self, request: &HttpRequest) -> HttpResponse {
        let body: Value = request
            .body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
            .unwrap_or(Value::Null);
        if let Some(expected) = &self.password {
            if body["password"].as_str() != Some(expected.as_str()) {
                return error_response(401, 401, "Wrong credentials");
            }
        }

        let now = unix_now();
        let claims = json!({
            "iss": "arangodb",
            "iat": now,
            "exp": now + TOKEN_LIFETIME_SECS,
            "jti": self.next_id(),
            "preferred_username": body["username"],
        });
        match jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(TOKEN_SECRET)) {
            Ok(token) => {
                self.tokens.insert(token.clone());
                json_response(200, json!({"jwt": token}))
            }
            Err(e) => error_response(500, 4, &e.to_string()),
        }
    }

    fn handle(&mut self, request: HttpRequest) -> HttpResponse {
        self.request_count += 1;
        self.last_request = Some(request.clone());
        let is_open_auth = url::Url::parse(&request.url).is_ok_and(|url| url.path().ends_with("/_open/auth"));
        if request.method == HttpMethod::POST && is_open_auth {
            return self.open_auth(&request);
        }
        if !self.authorized(&request) {
            return error_response(401, 11, "not authorized to execute this request");
        }
        if let Some(id) = request.headers.get(TRANSACTION_HEADER) {
            let running = self.transactions.get(id).is_some_and(|txn| txn.status == "running");
            if !running {
                return not_found_transaction();
            }
        }

        match request.headers.get(ASYNC_HEADER).map(String::as_str) {
            Some(mode) => {
                if self.reject_async {
                    return error_response(403, 11, "async execution is disabled");
                }
                let response = self.route(&request);
                if mode == "store" {
                    let done = self.auto_complete;
                    let id = self.store_job(response, done);
                    HttpResponse::new(202).with_header(ASYNC_ID_HEADER, id)
                } else {
                    HttpResponse::new(202)
                }
            }
            None => self.route(&request),
        }
    }

    fn route(&mut self, request: &HttpRequest) -> HttpResponse {
        let Ok(url) = url::Url::parse(&request.url) else {
            return error_response(400, 10, "bad url");
        };
        let segments: Vec<String> = url
            .path()
            .trim_start_matches('/')
            .split('/')
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
            .collect();
        let segs: Vec<&str> = segments.iter().map(String::as_str).collect();
        let (db, path) = match segs.as_slice() {
            ["_db", db, rest @ ..] => (db.to_string(), rest.to_vec()),
            rest => ("_system".to_string(), rest.to_vec()),
        };

        let params = &request.params;
        let flag = |key: &str| params.get(key).map(String::as_str) == Some("1");
        let body: Value = request
            .body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
            .unwrap_or(Value::Null);

        use HttpMethod::*;
        match (request.method, path.as_slice()) {
            // jobs
            (GET, ["_api", "job", "pending"]) => self.list_jobs(FakeJobState::Pending, params.get("count")),
            (GET, ["_api", "job", "done"]) => self.list_jobs(FakeJobState::Done, params.get("count")),
            (DELETE, ["_api", "job", "all"]) => {
                self.jobs.clear();
                ok_response(200, json!({"result": true}))
            }
            (DELETE, ["_api", "job", "expired"]) => {
                let stamp = params.get("stamp").and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
                self.jobs.retain(|_, job| job.created >= stamp);
                ok_response(200, json!({"result": true}))
            }
            (GET, ["_api", "job", id]) => self.job_status(id),
            (PUT, ["_api", "job", id]) => {
                if std::mem::take(&mut self.fail_job_result) {
                    return error_response(503, 503, "service unavailable");
                }
                self.job_result(id)
            }
            (PUT, ["_api", "job", id, "cancel"]) => self.job_cancel(id),
            (DELETE, ["_api", "job", id]) => match id.parse::<u64>().ok().and_then(|id| self.jobs.remove(&id)) {
                Some(_) => ok_response(200, json!({"result": true})),
                None => error_response(404, 404, "job not found"),
            },

            // server
            (GET, ["_api", "version"]) => {
                let mut info = json!({"server": "arango", "version": FakeArangoServer::VERSION, "license": "community"});
                if flag("details") {
                    info["details"] = json!({"mode": "server", "architecture": "64bit"});
                }
                json_response(200, info)
            }
            (GET, ["_admin", "time"]) => {
                let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
                ok_response(200, json!({"time": now}))
            }
            (GET, ["_api", "engine"]) => ok_response(200, json!({"name": "rocksdb", "supports": {"indexes": ["primary"]}})),
            (GET, ["_admin", "server", "role"]) => ok_response(200, json!({"role": "SINGLE", "mode": "default"})),
            (GET, ["_admin", "status"]) => json_response(200, json!({
                "server": "arango",
                "version": FakeArangoServer::VERSION,
                "mode": "server",
                "serverInfo": {"role": "SINGLE"},
            })),
            (GET, ["_admin", "echo"]) => json_response(200, json!({
                "requestType": request.method.as_str(),
                "url": url.path(),
                "parameters": params,
            })),
            (GET, ["_admin", "database", "target-version"]) => {
                ok_response(200, json!({"version": FakeArangoServer::VERSION}))
            }
            (GET, ["_admin", "metrics", "v2"]) => HttpResponse::new(200)
                .with_header("content-type", "text/plain")
                .with_body("# TYPE arangodb_client_connections gauge\narangodb_client_connections 1\n"),
            (GET, ["_admin", "statistics"]) => ok_response(200, json!({
                "time": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
                "enabled": true,
                "system": {"minorPageFaults": 0, "majorPageFaults": 0, "numberOfThreads": 8},
                "client": {"httpConnections": 1},
                "http": {"requestsTotal": self.request_count},
                "server": {"uptime": 1.5},
            })),
            (GET, ["_admin", "statistics-description"]) => ok_response(200, json!({
                "groups": [{"group": "system", "name": "Process Statistics"}],
                "figures": [{"group": "system", "identifier": "numberOfThreads", "type": "current"}],
            })),
            (GET, ["_admin", "log", "level"]) => json_response(200, json!(self.log_levels)),
            (PUT, ["_admin", "log", "level"]) => {
                if let Value::Object(update) = body {
                    for (topic, level) in update {
                        if let Some(level) = level.as_str() {
                            self.log_levels.insert(topic, level.to_uppercase());
                        }
                    }
                }
                json_response(200, json!(self.log_levels))
            }
            (GET, ["_admin", "log"]) => Self::read_log(params),
            (POST, ["_admin", "routing", "reload"]) => ok_response(200, json!({})),

            // databases
            (GET, ["_api", "database", "current"]) => ok_response(200, json!({"result": {
                "id": "1",
                "name": db,
                "path": format!("/var/lib/arangodb3/databases/{}", db),
                "isSystem": db == "_system",
            }})),
            (GET, ["_api", "database"]) => ok_response(200, json!({"result": self.databases})),
            (POST, ["_api", "database"]) => {
                let name = body["name"].as_str().unwrap_or_default().to_string();
                if self.databases.contains(&name) {
                    return error_response(409, 1207, "duplicate database name");
                }
                self.databases.push(name);
                ok_response(201, json!({"result": true}))
            }
            (DELETE, ["_api", "database", name]) => match self.databases.iter().position(|d| d == name) {
                Some(index) => {
                    self.databases.remove(index);
                    ok_response(200, json!({"result": true}))
                }
                None => error_response(404, 1228, "database not found"),
            },

            // collections
            (GET, ["_api", "collection"]) => {
                let result: Vec<Value> = self
                    .collections
                    .iter()
                    .map(|(name, col)| Self::collection_info(name, col))
                    .collect();
                ok_response(200, json!({"result": result}))
            }
            (POST, ["_api", "collection"]) => {
                let name = body["name"].as_str().unwrap_or_default();
                if !self.create_collection(name, body["type"] == json!(3)) {
                    return error_response(409, 1207, "duplicate name");
                }
                match self.collections.get(name) {
                    Some(col) => ok_response(200, Self::collection_info(name, col)),
                    None => error_response(500, 4, "internal error"),
                }
            }
            (DELETE, ["_api", "collection", name]) => match self.collections.remove(*name) {
                Some(col) => ok_response(200, json!({"id": col.id})),
                None => not_found_collection(),
            },
            (GET, ["_api", "collection", name, "properties"]) => match self.collections.get(*name) {
                Some(col) => {
                    let mut info = Self::collection_info(name, col);
                    info["waitForSync"] = json!(false);
                    info["keyOptions"] = json!({"type": "traditional", "allowUserKeys": true});
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (GET, ["_api", "collection", name, "count"]) => match self.collections.get(*name) {
                Some(col) => {
                    let mut info = Self::collection_info(name, col);
                    info["count"] = json!(col.docs.len());
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (PUT, ["_api", "collection", name, "truncate"]) => match self.collections.get_mut(*name) {
                Some(col) => {
                    col.docs.clear();
                    let info = Self::collection_info(name, col);
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (PUT, ["_api", "collection", name, "rename"]) => {
                let new_name = body["name"].as_str().unwrap_or_default().to_string();
                if self.collections.contains_key(&new_name) {
                    return error_response(409, 1207, "duplicate name");
                }
                match self.collections.remove(*name) {
                    Some(col) => {
                        let info = Self::collection_info(&new_name, &col);
                        self.collections.insert(new_name, col);
                        ok_response(200, info)
                    }
                    None => not_found_collection(),
                }
            }
            (PUT, ["_api", "collection", name, "properties"]) => match self.collections.get_mut(*name) {
                Some(col) => {
                    if let Some(sync) = body["waitForSync"].as_bool() {
                        col.wait_for_sync = sync;
                    }
                    if let Some(schema) = body.get("schema") {
                        col.schema = schema.clone();
                    }
                    let mut info = Self::collection_info(name, col);
                    info["waitForSync"] = json!(col.wait_for_sync);
                    info["schema"] = col.schema.clone();
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (GET, ["_api", "collection", name, "figures"]) => match self.collections.get(*name) {
                Some(col) => {
                    let mut info = Self::collection_info(name, col);
                    info["figures"] = json!({
                        "indexes": {"count": col.indexes.len(), "size": 0},
                        "documentsSize": col.docs.values().map(|doc| doc.to_string().len()).sum::<usize>(),
                        "cacheInUse": false,
                    });
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (GET, ["_api", "collection", name, "revision"]) => match self.collections.get(*name) {
                Some(col) => {
                    let revision = col
                        .docs
                        .values()
                        .filter_map(|doc| doc["_rev"].as_str()?.parse::<u64>().ok())
                        .max()
                        .unwrap_or(0);
                    let mut info = Self::collection_info(name, col);
                    info["revision"] = json!(revision.to_string());
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (GET, ["_api", "collection", name, "checksum"]) => match self.collections.get(*name) {
                Some(col) => {
                    let with_rev = flag("withRevision");
                    let with_data = flag("withData");
                    let parts: Vec<String> = col
                        .docs
                        .iter()
                        .map(|(key, doc)| {
                            let mut part = key.clone();
                            if with_rev {
                                part.push_str(doc["_rev"].as_str().unwrap_or_default());
                            }
                            if with_data {
                                part.push_str(&doc.to_string());
                            }
                            part
                        })
                        .collect();
                    let mut info = Self::collection_info(name, col);
                    info["checksum"] = json!(checksum(parts.iter().map(String::as_str)).to_string());
                    ok_response(200, info)
                }
                None => not_found_collection(),
            },
            (PUT, ["_api", "collection", name, "recalculateCount"]) => match self.collections.get(*name) {
                Some(col) => ok_response(200, json!({"result": true, "count": col.docs.len()})),
                None => not_found_collection(),
            },

            // documents
            (POST, ["_api", "document", col]) => match body {
                Value::Array(items) => self.bulk(col, items, |state, item| state.insert_document(col, item, params)),
                body => self.insert_document(col, body, params),
            },
            (PUT, ["_api", "document", col]) if flag("onlyget") => self.read_many(col, &body),
            (PATCH, ["_api", "document", col]) => self.bulk(col, body.as_array().cloned().unwrap_or_default(), |state, item| {
                match item_key(&item) {
                    Some(key) => state.write_document(col, &key, item, request, true),
                    None => error_response(400, 1221, "illegal document key"),
                }
            }),
            (PUT, ["_api", "document", col]) => self.bulk(col, body.as_array().cloned().unwrap_or_default(), |state, item| {
                match item_key(&item) {
                    Some(key) => state.write_document(col, &key, item, request, false),
                    None => error_response(400, 1221, "illegal document key"),
                }
            }),
            (DELETE, ["_api", "document", col]) => self.bulk(col, body.as_array().cloned().unwrap_or_default(), |state, item| {
                state.delete_item(col, &item, request)
            }),
            (POST, ["_api", "import"]) => self.import(body, params),
            (GET, ["_api", "document", col, key]) => self.read_document(col, key, request),
            (PATCH, ["_api", "document", col, key]) => self.write_document(col, key, body, request, true),
            (PUT, ["_api", "document", col, key]) => self.write_document(col, key, body, request, false),
            (DELETE, ["_api", "document", col, key]) => self.delete_document(col, key, request),

            // queries
            (POST, ["_api", "cursor"]) => self.create_cursor(&body),
            (PUT, ["_api", "simple", "all"]) => self.simple_query(&body, |_| true, |doc| doc.clone()),
            (PUT, ["_api", "simple", "by-example"]) => {
                let example = body["example"].clone();
                self.simple_query(&body, |doc| matches_example(doc, &example), |doc| doc.clone())
            }
            (PUT, ["_api", "simple", "all-keys"]) => {
                let field = if body["type"] == json!("key") { "_key" } else { "_id" };
                self.simple_query(&body, |_| true, |doc| doc[field].clone())
            }
            (PUT, ["_api", "cursor", id]) => self.next_batch(id),
            (DELETE, ["_api", "cursor", id]) => match self.cursors.remove(*id) {
                Some(_) => ok_response(202, json!({"id": id})),
                None => error_response(404, 1600, "cursor not found"),
            },
            (POST, ["_api", "explain"]) => match parse_query(body["query"].as_str().unwrap_or_default()) {
                Ok(_) => {
                    let plan = json!({"nodes": [{"type": "SingletonNode", "id": 1}], "estimatedCost": 1});
                    if body["options"]["allPlans"] == json!(true) {
                        ok_response(200, json!({"plans": [plan]}))
                    } else {
                        ok_response(200, json!({"plan": plan, "cacheable": true}))
                    }
                }
                Err(resp) => resp,
            },
            (POST, ["_api", "query"]) => match parse_query(body["query"].as_str().unwrap_or_default()) {
                Ok(_) => ok_response(200, json!({"parsed": true, "collections": [], "bindVars": []})),
                Err(resp) => resp,
            },
            (GET, ["_api", "query", "current"]) => json_response(200, json!([])),
            (DELETE, ["_api", "query", _]) => error_response(404, 1591, "query not found"),

            // indexes
            (GET, ["_api", "index"]) => {
                let name = params.get("collection").cloned().unwrap_or_default();
                match self.collections.get(&name) {
                    Some(col) => ok_response(200, json!({"indexes": col.indexes})),
                    None => not_found_collection(),
                }
            }
            (POST, ["_api", "index"]) => {
                let name = params.get("collection").cloned().unwrap_or_default();
                self.create_index(&name, body)
            }
            (DELETE, ["_api", "index", name, id]) => {
                let Some(col) = self.collections.get_mut(*name) else {
                    return not_found_collection();
                };
                let full_id = format!("{}/{}", name, id);
                match col.indexes.iter().position(|index| index["id"] == json!(full_id)) {
                    Some(position) => {
                        col.indexes.remove(position);
                        ok_response(200, json!({"id": full_id}))
                    }
                    None => error_response(404, 1212, "index not found"),
                }
            }

            // transactions
            (POST, ["_api", "transaction", "begin"]) => self.begin_transaction(&body),
            (GET, ["_api", "transaction", id]) => match self.transactions.get(*id) {
                Some(txn) => ok_response(200, json!({"result": {"id": id, "status": txn.status}})),
                None => not_found_transaction(),
            },
            (PUT, ["_api", "transaction", id]) => self.finish_transaction(id, "committed"),
            (DELETE, ["_api", "transaction", id]) => self.finish_transaction(id, "aborted"),
            (POST, ["_api", "transaction"]) => {
                let action = body["action"].as_str().unwrap_or_default();
                if !action.trim_start().starts_with("function") {
                    return error_response(400, 10, "invalid transaction action");
                }
                ok_response(200, json!({"result": body.get("params").cloned().unwrap_or(Value::Null)}))
            }

            // tasks
            (GET, ["_api", "tasks"]) => json_response(200, Value::Array(self.tasks.values().cloned().collect())),
            (GET, ["_api", "tasks", id]) => match self.tasks.get(*id) {
                Some(task) => ok_response(200, task.clone()),
                None => error_response(404, 1852, "task not found"),
            },
            (POST, ["_api", "tasks"]) => {
                let id = self.next_id().to_string();
                self.create_task(id, &db, body)
            }
            (PUT, ["_api", "tasks", id]) => {
                if self.tasks.contains_key(*id) {
                    return error_response(400, 1851, "duplicate task id");
                }
                self.create_task(id.to_string(), &db, body)
            }
            (DELETE, ["_api", "tasks", id]) => match self.tasks.remove(*id) {
                Some(_) => ok_response(200, json!({})),
                None => error_response(404, 1852, "task not found"),
            },

            // users and permissions
            (GET, ["_api", "user"]) => {
                let result: Vec<Value> = self.users.iter().map(|(name, user)| Self::user_info(name, user)).collect();
                ok_response(200, json!({"result": result}))
            }
            (GET, ["_api", "user", name]) => match self.users.get(*name) {
                Some(user) => ok_response(200, Self::user_info(name, user)),
                None => error_response(404, 1703, "user not found"),
            },
            (POST, ["_api", "user"]) => {
                let name = body["user"].as_str().unwrap_or_default().to_string();
                if self.users.contains_key(&name) {
                    return error_response(409, 1702, "duplicate user");
                }
                let user = FakeUser {
                    active: body["active"].as_bool().unwrap_or(true),
                    extra: body.get("extra").cloned().unwrap_or_else(|| json!({})),
                    grants: BTreeMap::new(),
                };
                let info = Self::user_info(&name, &user);
                self.users.insert(name, user);
                ok_response(201, info)
            }
            (PATCH, ["_api", "user", name]) => match self.users.get_mut(*name) {
                Some(user) => {
                    if let Some(active) = body["active"].as_bool() {
                        user.active = active;
                    }
                    if let Some(extra) = body.get("extra") {
                        user.extra = extra.clone();
                    }
                    ok_response(200, Self::user_info(name, user))
                }
                None => error_response(404, 1703, "user not found"),
            },
            (PUT, ["_api", "user", name]) => match self.users.get_mut(*name) {
                Some(user) => {
                    user.active = body["active"].as_bool().unwrap_or(true);
                    user.extra = body.get("extra").cloned().unwrap_or_else(|| json!({}));
                    ok_response(200, Self::user_info(name, user))
                }
                None => error_response(404, 1703, "user not found"),
            },
            (DELETE, ["_api", "user", name]) => match self.users.remove(*name) {
                Some(_) => ok_response(202, json!({})),
                None => error_response(404, 1703, "user not found"),
            },
            (GET, ["_api", "user", name, "database"]) => match self.users.get(*name) {
                Some(user) => {
                    let result: Map<String, Value> = self
                        .databases
                        .iter()
                        .map(|db| {
                            let grant = user.grants.get(db).cloned().unwrap_or_else(|| "none".to_string());
                            (db.clone(), json!({"permission": grant, "collections": {}}))
                        })
                        .collect();
                    ok_response(200, json!({"result": result}))
                }
                None => error_response(404, 1703, "user not found"),
            },
            (method, ["_api", "user", name, "database", target @ ..]) if !target.is_empty() => {
                let scope = target.join("/");
                let Some(user) = self.users.get_mut(*name) else {
                    return error_response(404, 1703, "user not found");
                };
                match method {
                    GET => {
                        let grant = user.grants.get(&scope).cloned().unwrap_or_else(|| "none".to_string());
                        ok_response(200, json!({"result": grant}))
                    }
                    PUT => {
                        let grant = body["grant"].as_str().unwrap_or("none").to_string();
                        user.grants.insert(scope.clone(), grant.clone());
                        let mut result = Map::new();
                        result.insert(scope, json!(grant));
                        ok_response(200, Value::Object(result))
                    }
                    DELETE => {
                        user.grants.remove(&scope);
                        ok_response(202, json!({}))
                    }
                    _ => error_response(405, 405, "method not supported"),
                }
            }

            // foxx
            (_, ["_api", "foxx", rest @ ..]) => self.foxx(request.method, rest, params, body),

            _ => error_response(404, 404, "unknown path"),
        }
    }

    fn list_jobs(&self, state: FakeJobState, count: Option<&String>) -> HttpResponse {
        let count = count.and_then(|c| c.parse::<usize>().ok()).unwrap_or(usize::MAX);
        let ids: Vec<String> = self
            .jobs
            .iter()
            .rev()
            .filter(|(_, job)| job.state == state)
            .take(count)
            .map(|(id, _)| id.to_string())
            .collect();
        json_response(200, json!(ids))
    }

    fn job_status(&self, id: &str) -> HttpResponse {
        match id.parse::<u64>().ok().and_then(|id| self.jobs.get(&id)) {
            Some(job) => match job.state {
                FakeJobState::Pending => HttpResponse::new(204),
                FakeJobState::Done => HttpResponse::new(200),
                FakeJobState::Cancelled => error_response(410, 410, "job cancelled"),
            },
            None => error_response(404, 404, "job not found"),
        }
    }

    fn job_result(&mut self, id: &str) -> HttpResponse {
        let Some(key) = id.parse::<u64>().ok().filter(|id| self.jobs.contains_key(id)) else {
            return error_response(404, 404, "job not found");
        };
        let state = self.jobs.get(&key).map(|job| job.state);
        match state {
            Some(FakeJobState::Pending) => HttpResponse::new(204),
            Some(FakeJobState::Cancelled) => error_response(410, 410, "job cancelled"),
            _ => match self.jobs.remove(&key) {
                Some(job) => job.response.with_header(ASYNC_ID_HEADER, id),
                None => error_response(404, 404, "job not found"),
            },
        }
    }

    fn job_cancel(&mut self, id: &str) -> HttpResponse {
        match id.parse::<u64>().ok().and_then(|id| self.jobs.get_mut(&id)) {
            Some(job) if job.state == FakeJobState::Pending => {
                job.state = FakeJobState::Cancelled;
                ok_response(200, json!({"result": true}))
            }
            _ => error_response(404, 404, "job not found"),
        }
    }

    fn revision_conflict(doc: &Value) -> HttpResponse {
        json_response(412, json!({
            "error": true,
            "code": 412,
            "errorNum": 1200,
            "errorMessage": "conflict, _rev values do not match",
            "_id": doc["_id"],
            "_key": doc["_key"],
            "_rev": doc["_rev"],
        }))
    }

    fn insert_document(&mut self, col: &str, body: Value, params: &BTreeMap<String, String>) -> HttpResponse {
        if !self.collections.contains_key(col) {
            return not_found_collection();
        }
        let Value::Object(mut doc) = body else {
            return error_response(400, 600, "invalid document");
        };
        let key = match doc.get("_key").and_then(Value::as_str) {
            Some(key) => key.to_string(),
            None => self.next_id().to_string(),
        };
        let rev = self.next_id().to_string();
        let Some(collection) = self.collections.get_mut(col) else {
            return not_found_collection();
        };
        if collection.docs.contains_key(&key) {
            return error_response(409, 1210, "unique constraint violated - in index primary of type primary");
        }

        doc.insert("_key".to_string(), json!(key));
        doc.insert("_id".to_string(), json!(format!("{}/{}", col, key)));
        doc.insert("_rev".to_string(), json!(rev));
        let doc = Value::Object(doc);
        collection.docs.insert(key.clone(), doc.clone());

        let mut meta = json!({"_id": doc["_id"], "_key": key, "_rev": rev});
        if params.get("returnNew").map(String::as_str) == Some("1") {
            meta["new"] = doc;
        }
        json_response(202, meta)
    }

    fn read_document(&self, col: &str, key: &str, request: &HttpRequest) -> HttpResponse {
        let Some(collection) = self.collections.get(col) else {
            return not_found_collection();
        };
        let Some(doc) = collection.docs.get(key) else {
            return not_found_document();
        };
        if let Some(rev) = request.headers.get("if-match") {
            if doc["_rev"].as_str() != Some(rev.as_str()) {
                return Self::revision_conflict(doc);
            }
        }
        json_response(200, doc.clone())
    }

    fn write_document(&mut self, col: &str, key: &str, body: Value, request: &HttpRequest, merge: bool) -> HttpResponse {
        let rev = self.next_id().to_string();
        let Some(collection) = self.collections.get_mut(col) else {
            return not_found_collection();
        };
        let Some(old) = collection.docs.get(key).cloned() else {
            return not_found_document();
        };
        let Value::Object(patch) = body else {
            return error_response(400, 600, "invalid document");
        };

        let check_rev = request.params.get("ignoreRevs").map(String::as_str) != Some("1");
        if let Some(expected) = patch.get("_rev").and_then(Value::as_str) {
            if check_rev && old["_rev"].as_str() != Some(expected) {
                return Self::revision_conflict(&old);
            }
        }

        let mut doc = match (&old, merge) {
            (Value::Object(existing), true) => existing.clone(),
            _ => Map::new(),
        };
        let keep_null = request.params.get("keepNull").map(String::as_str) != Some("0");
        for (field, value) in patch {
            if field.starts_with('_') {
                continue;
            }
            if value.is_null() && !keep_null {
                doc.remove(&field);
            } else {
                doc.insert(field, value);
            }
        }
        doc.insert("_key".to_string(), json!(key));
        doc.insert("_id".to_string(), json!(format!("{}/{}", col, key)));
        doc.insert("_rev".to_string(), json!(rev));
        let doc = Value::Object(doc);
        collection.docs.insert(key.to_string(), doc.clone());

        let mut meta = json!({"_id": doc["_id"], "_key": key, "_rev": rev, "_oldRev": old["_rev"]});
        if request.params.get("returnNew").map(String::as_str) == Some("1") {
            meta["new"] = doc;
        }
        if request.params.get("returnOld").map(String::as_str) == Some("1") {
            meta["old"] = old;
        }
        json_response(202, meta)
    }

    fn delete_document(&mut self, col: &str, key: &str, request: &HttpRequest) -> HttpResponse {
        let Some(collection) = self.collections.get_mut(col) else {
            return not_found_collection();
        };
        let Some(doc) = collection.docs.get(key).cloned() else {
            return not_found_document();
        };
        if let Some(rev) = request.headers.get("if-match") {
            if doc["_rev"].as_str() != Some(rev.as_str()) {
                return Self::revision_conflict(&doc);
            }
        }
        collection.docs.remove(key);

        let mut meta = json!({"_id": doc["_id"], "_key": key, "_rev": doc["_rev"]});
        if request.params.get("returnOld").map(String::as_str) == Some("1") {
            meta["old"] = doc;
        }
        json_response(202, meta)
    }

    fn create_cursor(&mut self, body: &Value) -> HttpResponse {
        let results = match parse_query(body["query"].as_str().unwrap_or_default()) {
            Ok(FakeQuery::Value(value)) => vec![value],
            Ok(FakeQuery::Scan(name)) => match self.collections.get(&name) {
                Some(col) => col.docs.values().cloned().collect(),
                None => return not_found_collection(),
            },
            Err(resp) => return resp,
        };
        self.cursor_response(results, body)
    }

    /// Documents of `body.collection` passing `filter`, mapped by `project`,
    /// after `body.skip` and up to `body.limit`
    fn simple_query(
        &mut self,
        body: &Value,
        filter: impl Fn(&Value) -> bool,
        project: impl Fn(&Value) -> Value,
    ) -> HttpResponse {
        let name = body["collection"].as_str().unwrap_or_default();
        let Some(col) = self.collections.get(name) else {
            return not_found_collection();
        };
        let skip = body["skip"].as_u64().unwrap_or(0) as usize;
        let limit = body["limit"].as_u64().map_or(usize::MAX, |n| n as usize);
        let results: Vec<Value> = col
            .docs
            .values()
            .filter(|doc| filter(doc))
            .skip(skip)
            .take(limit)
            .map(project)
            .collect();
        self.cursor_response(results, body)
    }

    fn cursor_response(&mut self, results: Vec<Value>, body: &Value) -> HttpResponse {
        let total = results.len();
        let batch_size = body["batchSize"].as_u64().map(|n| n as usize).unwrap_or(DEFAULT_BATCH_SIZE).max(1);

        let mut remaining: VecDeque<Value> = results.into();
        let batch: Vec<Value> = remaining.drain(..batch_size.min(total)).collect();
        let mut response = json!({
            "result": batch,
            "hasMore": !remaining.is_empty(),
            "cached": false,
            "extra": {
                "stats": {"writesExecuted": 0, "writesIgnored": 0, "scannedFull": total, "scannedIndex": 0},
                "warnings": [],
            },
        });
        if body["count"] == json!(true) {
            response["count"] = json!(total);
        }
        if !remaining.is_empty() {
            let id = self.next_id().to_string();
            response["id"] = json!(id);
            self.cursors.insert(id, FakeCursor { remaining, batch_size });
        }
        ok_response(201, response)
    }

    fn next_batch(&mut self, id: &str) -> HttpResponse {
        let Some(cursor) = self.cursors.get_mut(id) else {
            return error_response(404, 1600, "cursor not found");
        };
        let take = cursor.batch_size.min(cursor.remaining.len());
        let batch: Vec<Value> = cursor.remaining.drain(..take).collect();
        let has_more = !cursor.remaining.is_empty();
        if !has_more {
            self.cursors.remove(id);
        }
        ok_response(200, json!({"id": id, "result": batch, "hasMore": has_more}))
    }

    /// Apply `op` to every item, collecting one entry per item
    fn bulk(&mut self, col: &str, items: Vec<Value>, op: impl Fn(&mut Self, Value) -> HttpResponse) -> HttpResponse {
        if !self.collections.contains_key(col) {
            return not_found_collection();
        }
        let results: Vec<Value> = items.into_iter().map(|item| bulk_item(op(self, item))).collect();
        json_response(202, Value::Array(results))
    }

    fn delete_item(&mut self, col: &str, item: &Value, request: &HttpRequest) -> HttpResponse {
        let Some(key) = item_key(item) else {
            return error_response(400, 1221, "illegal document key");
        };
        let check_rev = request.params.get("ignoreRevs").map(String::as_str) != Some("1");
        if let (true, Some(expected)) = (check_rev, item.get("_rev").and_then(Value::as_str)) {
            let current = self.collections.get(col).and_then(|c| c.docs.get(&key)).cloned();
            if let Some(doc) = current.filter(|doc| doc["_rev"].as_str() != Some(expected)) {
                return Self::revision_conflict(&doc);
            }
        }
        self.delete_document(col, &key, request)
    }

    fn read_many(&self, col: &str, body: &Value) -> HttpResponse {
        let Some(collection) = self.collections.get(col) else {
            return not_found_collection();
        };
        let results: Vec<Value> = body
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|item| match item_key(item).and_then(|key| collection.docs.get(&key)) {
                Some(doc) => doc.clone(),
                None => json!({"error": true, "errorNum": 1202, "errorMessage": "document not found"}),
            })
            .collect();
        json_response(200, Value::Array(results))
    }

    fn import(&mut self, body: Value, params: &BTreeMap<String, String>) -> HttpResponse {
        let flag = |key: &str| params.get(key).map(String::as_str) == Some("1");
        let name = params.get("collection").cloned().unwrap_or_default();
        let Some(original) = self.collections.get(&name).map(|col| col.docs.clone()) else {
            return not_found_collection();
        };
        if flag("overwrite") {
            if let Some(col) = self.collections.get_mut(&name) {
                col.docs.clear();
            }
        }

        let on_duplicate = params.get("onDuplicate").map(String::as_str).unwrap_or("error");
        let plain = HttpRequest {
            method: HttpMethod::PUT,
            url: String::new(),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            auth: None,
        };
        let (mut created, mut errors, mut empty, mut updated, mut ignored) = (0, 0, 0, 0, 0);
        let mut details = Vec::new();
        for (position, item) in body.as_array().cloned().unwrap_or_default().into_iter().enumerate() {
            let Value::Object(doc) = item else {
                errors += 1;
                details.push(format!("at position {}: invalid JSON type (expecting object)", position));
                continue;
            };
            if doc.is_empty() {
                empty += 1;
                continue;
            }
            let key = doc.get("_key").and_then(Value::as_str).unwrap_or_default().to_string();
            let exists = self.collections.get(&name).is_some_and(|col| col.docs.contains_key(&key));
            let resp = match (exists, on_duplicate) {
                (false, _) => self.insert_document(&name, Value::Object(doc), params),
                (true, "ignore") => {
                    ignored += 1;
                    continue;
                }
                (true, "update") => self.write_document(&name, &key, Value::Object(doc), &plain, true),
                (true, "replace") => self.write_document(&name, &key, Value::Object(doc), &plain, false),
                (true, _) => error_response(409, 1210, "unique constraint violated"),
            };
            match (resp.status_code < 300, exists) {
                (true, false) => created += 1,
                (true, true) => updated += 1,
                (false, _) => {
                    errors += 1;
                    let item = bulk_item(resp);
                    details.push(format!(
                        "at position {}: creating document failed with error '{}'",
                        position,
                        item["errorMessage"].as_str().unwrap_or_default()
                    ));
                }
            }
        }

        if errors > 0 && flag("complete") {
            if let Some(col) = self.collections.get_mut(&name) {
                col.docs = original;
            }
            return error_response(409, 1210, "unique constraint violated");
        }
        let mut result = json!({
            "created": created,
            "errors": errors,
            "empty": empty,
            "updated": updated,
            "ignored": ignored,
        });
        if flag("details") {
            result["details"] = json!(details);
        }
        ok_response(201, result)
    }

    fn create_index(&mut self, name: &str, body: Value) -> HttpResponse {
        let number = self.next_id();
        let Some(col) = self.collections.get_mut(name) else {
            return not_found_collection();
        };
        let Value::Object(mut definition) = body else {
            return error_response(400, 10, "invalid index definition");
        };
        let existing = col
            .indexes
            .iter()
            .find(|index| index["type"] == definition["type"] && index["fields"] == definition["fields"]);
        if let Some(index) = existing {
            let mut index = index.clone();
            index["isNewlyCreated"] = json!(false);
            return ok_response(200, index);
        }

        definition.remove("inBackground");
        definition.insert("id".to_string(), json!(format!("{}/{}", name, number)));
        definition.entry("name").or_insert_with(|| json!(format!("idx_{}", number)));
        definition.entry("unique").or_insert(json!(false));
        definition.entry("sparse").or_insert(json!(false));
        let index = Value::Object(definition);
        col.indexes.push(index.clone());

        let mut response = index;
        response["isNewlyCreated"] = json!(true);
        ok_response(201, response)
    }

    fn begin_transaction(&mut self, body: &Value) -> HttpResponse {
        let declared = ["read", "write", "exclusive"]
            .iter()
            .filter_map(|mode| body["collections"][mode].as_array())
            .flatten()
            .filter_map(Value::as_str);
        for name in declared {
            if !self.collections.contains_key(name) {
                return not_found_collection();
            }
        }

        let id = self.next_id().to_string();
        let snapshot = self
            .collections
            .iter()
            .map(|(name, col)| (name.clone(), col.docs.clone()))
            .collect();
        self.transactions.insert(id.clone(), FakeTransaction { status: "running", snapshot: Some(snapshot) });
        ok_response(201, json!({"result": {"id": id, "status": "running"}}))
    }

    fn finish_transaction(&mut self, id: &str, status: &'static str) -> HttpResponse {
        let Some(txn) = self.transactions.get_mut(id) else {
            return not_found_transaction();
        };
        if txn.status != "running" {
            return error_response(409, 1653, &format!("transaction is already {}", txn.status));
        }
        txn.status = status;
        let snapshot = txn.snapshot.take();
        if status == "aborted" {
            for (name, docs) in snapshot.unwrap_or_default() {
                if let Some(col) = self.collections.get_mut(&name) {
                    col.docs = docs;
                }
            }
        }
        ok_response(200, json!({"result": {"id": id, "status": status}}))
    }

    fn read_log(params: &BTreeMap<String, String>) -> HttpResponse {
        let level_number = |level: &str| match level {
            "fatal" => Some(0),
            "error" => Some(1),
            "warning" => Some(2),
            "info" => Some(3),
            "debug" => Some(4),
            other => other.parse::<u8>().ok(),
        };
        let exact = params.get("level").and_then(|l| level_number(l.as_str()));
        let upto = params.get("upto").and_then(|l| level_number(l.as_str()));
        let search = params.get("search");

        let entries: Vec<&(u64, u8, &str)> = LOG_ENTRIES
            .iter()
            .filter(|(_, level, _)| exact.map_or(true, |exact| *level == exact))
            .filter(|(_, level, _)| upto.map_or(true, |upto| *level <= upto))
            .filter(|(_, _, text)| search.map_or(true, |search| text.contains(search.as_str())))
            .collect();
        let now = unix_now();
        json_response(200, json!({
            "lid": entries.iter().map(|(lid, _, _)| lid).collect::<Vec<_>>(),
            "level": entries.iter().map(|(_, level, _)| level).collect::<Vec<_>>(),
            "timestamp": entries.iter().map(|_| now).collect::<Vec<_>>(),
            "text": entries.iter().map(|(_, _, text)| text).collect::<Vec<_>>(),
            "topic": entries.iter().map(|_| "general").collect::<Vec<_>>(),
            "totalAmount": entries.len(),
        }))
    }

    fn create_task(&mut self, id: String, db: &str, body: Value) -> HttpResponse {
        let mut task = json!({
            "id": id,
            "name": body["name"],
            "type": if body.get("period").is_some() { "periodic" } else { "timed" },
            "created": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            "command": body["command"],
            "database": db,
        });
        if let Some(period) = body.get("period") {
            task["period"] = period.clone();
        }
        if let Some(offset) = body.get("offset") {
            task["offset"] = offset.clone();
        }
        self.tasks.insert(id, task.clone());
        ok_response(200, task)
    }

    fn user_info(name: &str, user: &FakeUser) -> Value {
        json!({"user": name, "active": user.active, "extra": user.extra})
    }

    fn service_info(mount: &str, service: &FakeService) -> Value {
        json!({
            "mount": mount,
            "name": "test",
            "version": "0.0.1",
            "development": service.development,
            "legacy": service.legacy,
            "provides": {},
            "checksum": "1234",
        })
    }

    fn foxx(&mut self, method: HttpMethod, path: &[&str], params: &BTreeMap<String, String>, body: Value) -> HttpResponse {
        use HttpMethod::*;
        let mount = params.get("mount").cloned().unwrap_or_default();
        let flag = |key: &str| params.get(key).map(String::as_str) == Some("1");

        match (method, path) {
            (GET, []) => {
                let list: Vec<Value> = self
                    .services
                    .iter()
                    .map(|(mount, service)| Self::service_info(mount, service))
                    .collect();
                json_response(200, Value::Array(list))
            }
            (POST, []) => {
                if self.services.contains_key(&mount) {
                    return error_response(400, 3011, "service already installed");
                }
                let service = FakeService {
                    development: flag("development"),
                    legacy: flag("legacy"),
                    config: body["configuration"].as_object().cloned().unwrap_or_default(),
                };
                let info = Self::service_info(&mount, &service);
                self.services.insert(mount, service);
                json_response(201, info)
            }
            (PUT, ["service"]) => {
                if !self.services.contains_key(&mount) && !flag("force") {
                    return not_found_service();
                }
                let service = FakeService {
                    development: false,
                    legacy: flag("legacy"),
                    config: body["configuration"].as_object().cloned().unwrap_or_default(),
                };
                let info = Self::service_info(&mount, &service);
                self.services.insert(mount, service);
                json_response(200, info)
            }
            (DELETE, ["service"]) => match self.services.remove(&mount) {
                Some(_) => HttpResponse::new(204),
                None => not_found_service(),
            },
            _ => {
                let Some(service) = self.services.get_mut(&mount) else {
                    return not_found_service();
                };
                match (method, path) {
                    (GET, ["service"]) => json_response(200, Self::service_info(&mount, service)),
                    (GET, ["configuration"]) => json_response(200, Value::Object(service.config.clone())),
                    (PATCH, ["configuration"]) => {
                        if let Value::Object(update) = body {
                            service.config.extend(update);
                        }
                        json_response(200, Value::Object(service.config.clone()))
                    }
                    (GET, ["dependencies"]) | (GET, ["scripts"]) => json_response(200, json!({})),
                    (POST, ["scripts", _]) => error_response(404, 3016, "unknown script"),
                    (POST, ["development"]) => {
                        service.development = true;
                        json_response(200, Self::service_info(&mount, service))
                    }
                    (DELETE, ["development"]) => {
                        service.development = false;
                        json_response(200, Self::service_info(&mount, service))
                    }
                    (GET, ["readme"]) => HttpResponse::new(204),
                    _ => error_response(404, 404, "unknown path"),
                }
            }
        }
    }
}

/// Fake server shared by every connection built from it
#[derive(Clone)]
pub(crate) struct FakeArangoServer {
    state: Arc<Mutex<State>>,
}

impl FakeArangoServer {
    pub const VERSION: &'static str = "3.11.0";

    pub fn new() -> Self {
        FakeArangoServer { state: Arc::new(Mutex::new(State::new())) }
    }

    /// Mark async jobs done as soon as they are submitted
    pub fn with_auto_complete(self, auto_complete: bool) -> Self {
        self.state.lock().auto_complete = auto_complete;
        self
    }

    pub fn connection(&self, db_name: &str) -> Connection {
        self.connection_with_auth(db_name, None)
    }

    pub fn connection_with_auth(&self, db_name: &str, auth: Option<Auth>) -> Connection {
        Connection::new(
            &[HOST.to_string()],
            HostResolver::single(),
            Arc::new(self.clone()),
            db_name,
            auth,
        )
    }

    /// Store a job whose result is `body`, pending until [`Self::complete_jobs`]
    /// unless `done` is set
    pub fn store_job(&self, body: Value, done: bool) -> String {
        self.state.lock().store_job(json_response(200, body), done)
    }

    pub fn complete_jobs(&self) {
        for job in self.state.lock().jobs.values_mut() {
            if job.state == FakeJobState::Pending {
                job.state = FakeJobState::Done;
            }
        }
    }

    pub fn job_count(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn reject_async_submissions(&self, reject: bool) {
        self.state.lock().reject_async = reject;
    }

    /// Answer 401 unless basic auth carries this password
    pub fn require_password(&self, password: &str) {
        self.state.lock().password = Some(password.to_string());
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.state.lock().last_request.clone()
    }

    /// Requests received so far, rejected ones included
    pub fn request_count(&self) -> usize {
        self.state.lock().request_count
    }

    /// Answer the next job result fetch with "service unavailable"
    pub fn fail_next_job_result(&self) {
        self.state.lock().fail_job_result = true;
    }

    /// Reject every token handed out so far
    pub fn expire_tokens(&self) {
        self.state.lock().tokens.clear();
    }

    pub fn create_collection(&self, name: &str) {
        self.state.lock().create_collection(name, false);
    }

    /// Store a document directly, bypassing the API
    pub fn put_document(&self, collection: &str, mut doc: Value) {
        let mut state = self.state.lock();
        let rev = state.next_id().to_string();
        let key = doc["_key"].as_str().unwrap_or_default().to_string();
        doc["_id"] = json!(format!("{}/{}", collection, key));
        doc["_rev"] = json!(rev);
        if let Some(col) = state.collections.get_mut(collection) {
            col.docs.insert(key, doc);
        }
    }

    pub fn document(&self, collection: &str, key: &str) -> Option<Value> {
        let state = self.state.lock();
        state.collections.get(collection)?.docs.get(key).cloned()
    }
}

#[async_trait]
impl HttpClient for FakeArangoServer {
    async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        Ok(self.state.lock().handle(request))
    }
}
