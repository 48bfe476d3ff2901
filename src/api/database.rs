use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};
use crate::api::aql::Aql;
use crate::api::collection::Collection;
use crate::api::executor::{ApiExecutor, AsyncExecutor, ExecutionContext, FireAndForgetExecutor, TransactionExecutor};
use crate::api::foxx::Foxx;
use crate::api::job::{AsyncJob, JobStatus};
use crate::api::types::{
    CollectionInfo, DatabaseProperties, LogEntries, Permission, ServerVersion, TaskInfo, TransactionStatus, UserInfo,
};
use crate::common::error::{ArangoError, ErrorCode, ErrorKind, Result};
use crate::common::utils::{encode_segment, validate_collection_name, validate_database_name};
use crate::connection::{Connection, Request, Response};
use crate::arango_ensure;

/// Options of [`Database::create_collection`]
#[derive(Debug, Clone, Default)]
pub struct CollectionOptions {
    /// Create an edge collection
    pub edge: bool,
    pub sync: Option<bool>,
    pub system: Option<bool>,
    /// `traditional`, `autoincrement`, `uuid` or `padded`
    pub key_generator: Option<String>,
    pub user_keys: Option<bool>,
    pub schema: Option<Value>,
    pub number_of_shards: Option<u32>,
    pub replication_factor: Option<u32>,
}

impl CollectionOptions {
    fn body(&self, name: &str) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(name));
        body.insert("type".to_string(), json!(if self.edge { 3 } else { 2 }));
        if let Some(sync) = self.sync {
            body.insert("waitForSync".to_string(), json!(sync));
        }
        if let Some(system) = self.system {
            body.insert("isSystem".to_string(), json!(system));
        }
        if self.key_generator.is_some() || self.user_keys.is_some() {
            let mut key_options = Map::new();
            if let Some(generator) = &self.key_generator {
                key_options.insert("type".to_string(), json!(generator));
            }
            if let Some(user_keys) = self.user_keys {
                key_options.insert("allowUserKeys".to_string(), json!(user_keys));
            }
            body.insert("keyOptions".to_string(), Value::Object(key_options));
        }
        if let Some(schema) = &self.schema {
            body.insert("schema".to_string(), schema.clone());
        }
        if let Some(shards) = self.number_of_shards {
            body.insert("numberOfShards".to_string(), json!(shards));
        }
        if let Some(factor) = self.replication_factor {
            body.insert("replicationFactor".to_string(), json!(factor));
        }
        Value::Object(body)
    }
}

/// A server-side task to schedule
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    pub name: String,
    /// JavaScript source run by the task
    pub command: String,
    pub params: Option<Value>,
    /// Repeat every `period` seconds; run once when unset
    pub period: Option<u64>,
    /// Delay in seconds before the first run
    pub offset: Option<f64>,
    /// Pick the task id instead of letting the server generate one
    pub task_id: Option<String>,
}

/// User attributes for create, update and replace
#[derive(Debug, Clone, Default)]
pub struct UserOptions {
    pub password: Option<String>,
    pub active: Option<bool>,
    pub extra: Option<Value>,
}

impl UserOptions {
    fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        if let Some(password) = &self.password {
            body.insert("passwd".to_string(), json!(password));
        }
        if let Some(active) = self.active {
            body.insert("active".to_string(), json!(active));
        }
        if let Some(extra) = &self.extra {
            body.insert("extra".to_string(), extra.clone());
        }
        body
    }
}

/// Filters of [`Database::read_log`]
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Entries up to this level: `fatal`, `error`, `warning`, `info`,
    /// `debug` or `0` to `4`
    pub upto: Option<String>,
    /// Entries of exactly this level; wins over `upto`
    pub level: Option<String>,
    /// Lowest log entry id
    pub start: Option<u64>,
    pub size: Option<u64>,
    pub offset: Option<u64>,
    /// Only entries whose text contains this string
    pub search: Option<String>,
    /// `asc` or `desc` by entry id
    pub sort: Option<String>,
}

/// Options of [`Database::begin_transaction`] and
/// [`Database::execute_transaction`]
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub exclusive: Vec<String>,
    pub sync: Option<bool>,
    /// Allow reads from collections not declared above
    pub allow_implicit: Option<bool>,
    /// Seconds to wait for collection locks
    pub lock_timeout: Option<u64>,
    /// Bytes
    pub max_size: Option<u64>,
    /// JavaScript transactions only
    pub intermediate_commit_count: Option<u64>,
    /// JavaScript transactions only
    pub intermediate_commit_size: Option<u64>,
}

impl TransactionOptions {
    fn body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(
            "collections".to_string(),
            json!({ "read": self.read, "write": self.write, "exclusive": self.exclusive }),
        );
        if let Some(sync) = self.sync {
            body.insert("waitForSync".to_string(), json!(sync));
        }
        if let Some(allow_implicit) = self.allow_implicit {
            body.insert("allowImplicit".to_string(), json!(allow_implicit));
        }
        if let Some(timeout) = self.lock_timeout {
            body.insert("lockTimeout".to_string(), json!(timeout));
        }
        if let Some(max_size) = self.max_size {
            body.insert("maxTransactionSize".to_string(), json!(max_size));
        }
        body
    }
}

fn strip_status(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        map.remove("code");
        map.remove("error");
    }
    body
}

fn ensure_success(kind: ErrorKind, resp: &Response) -> Result<()> {
    if !resp.is_success {
        return Err(ArangoError::server(kind, resp));
    }
    Ok(())
}

fn permission_endpoint(username: &str, database: &str, collection: Option<&str>) -> String {
    let mut endpoint = format!(
        "/_api/user/{}/database/{}",
        encode_segment(username),
        encode_segment(database)
    );
    if let Some(collection) = collection {
        endpoint.push('/');
        endpoint.push_str(&encode_segment(collection));
    }
    endpoint
}

/// Database API.
///
/// Generic over its executor: a `Database<DefaultExecutor>` returns values,
/// a `Database<AsyncExecutor>` returns [`AsyncJob`] handles and a
/// `Database<FireAndForgetExecutor>` returns nothing.
#[derive(Clone)]
pub struct Database<E: ApiExecutor> {
    executor: E,
    job_poll_interval: Duration,
}

impl<E: ApiExecutor> Database<E> {
    pub(crate) fn new(executor: E, job_poll_interval: Duration) -> Self {
        Database { executor, job_poll_interval }
    }

    pub fn name(&self) -> &str {
        self.executor.connection().db_name()
    }

    pub fn context(&self) -> ExecutionContext {
        self.executor.context()
    }

    pub fn username(&self) -> Option<&str> {
        self.executor.connection().username()
    }

    pub fn connection(&self) -> &Connection {
        self.executor.connection()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn collection(&self, name: &str) -> Collection<E> {
        Collection::new(self.executor.clone(), name)
    }

    pub fn aql(&self) -> Aql<E> {
        Aql::new(self.executor.clone())
    }

    pub fn foxx(&self) -> Foxx<E> {
        Foxx::new(self.executor.clone())
    }

    /// Same database, with every call submitted as a server-side job whose
    /// result is kept for retrieval
    pub fn begin_async_execution(&self) -> Database<AsyncExecutor> {
        let conn = self.executor.connection().clone();
        Database::new(AsyncExecutor::new(conn, self.job_poll_interval), self.job_poll_interval)
    }

    /// Same database, with every call submitted as a server-side job whose
    /// result is discarded
    pub fn begin_fire_and_forget_execution(&self) -> Database<FireAndForgetExecutor> {
        let conn = self.executor.connection().clone();
        Database::new(FireAndForgetExecutor::new(conn), self.job_poll_interval)
    }

    /// Attach to a job submitted earlier, decoding its result with `handler`
    pub fn async_job<T, H>(&self, job_id: impl Into<String>, handler: H) -> AsyncJob<T>
    where
        H: Fn(Response) -> Result<T> + Send + Sync + 'static,
    {
        AsyncJob::new(self.executor.connection().clone(), job_id, handler)
            .with_poll_interval(self.job_poll_interval)
    }

    // Server administration

    pub async fn properties(&self) -> Result<E::Output<DatabaseProperties>> {
        let request = Request::get("/_api/database/current");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::DatabaseProperties, &resp)?;
                resp.json_field::<DatabaseProperties>("result")
            })
            .await
    }

    /// Server version string
    pub async fn version(&self) -> Result<E::Output<String>> {
        let request = Request::get("/_api/version").with_param("details", false);
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerVersion, &resp)?;
                resp.json_field::<String>("version")
            })
            .await
    }

    /// Server name, version and license, with build details when `details` is set
    pub async fn version_info(&self, details: bool) -> Result<E::Output<ServerVersion>> {
        let request = Request::get("/_api/version").with_param("details", details);
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerVersion, &resp)?;
                resp.json::<ServerVersion>()
            })
            .await
    }

    pub async fn details(&self) -> Result<E::Output<Value>> {
        let request = Request::get("/_api/version").with_param("details", true);
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerDetails, &resp)?;
                Ok(resp.field("details").cloned().unwrap_or(Value::Null))
            })
            .await
    }

    pub async fn status(&self) -> Result<E::Output<Value>> {
        let request = Request::get("/_admin/status");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerStatus, &resp)?;
                Ok(resp.body)
            })
            .await
    }

    /// Server system time
    pub async fn time(&self) -> Result<E::Output<DateTime<Utc>>> {
        let request = Request::get("/_admin/time");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerTime, &resp)?;
                let seconds: f64 = resp.json_field("time")?;
                let millis = (seconds * 1000.0).round() as i64;
                Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                    ArangoError::server_with_message(ErrorKind::ServerTime, &resp, "invalid server time")
                })
            })
            .await
    }

    pub async fn engine(&self) -> Result<E::Output<Value>> {
        let request = Request::get("/_api/engine");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerEngine, &resp)?;
                Ok(strip_status(resp.body))
            })
            .await
    }

    /// `SINGLE`, `COORDINATOR`, `PRIMARY`, `SECONDARY`, `AGENT` or `UNDEFINED`
    pub async fn role(&self) -> Result<E::Output<String>> {
        let request = Request::get("/_admin/server/role");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerRole, &resp)?;
                resp.json_field::<String>("role")
            })
            .await
    }

    /// Details of the request as the server received it
    pub async fn echo(&self) -> Result<E::Output<Value>> {
        let request = Request::get("/_admin/echo");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerEcho, &resp)?;
                Ok(resp.body)
            })
            .await
    }

    pub async fn required_db_version(&self) -> Result<E::Output<String>> {
        let request = Request::get("/_admin/database/target-version");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerRequiredDbVersion, &resp)?;
                resp.json_field::<String>("version")
            })
            .await
    }

    /// Server metrics in Prometheus text format
    pub async fn metrics(&self) -> Result<E::Output<String>> {
        let request = Request::get("/_admin/metrics/v2").raw_response();
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerMetrics, &resp)?;
                Ok(resp.text())
            })
            .await
    }

    // Databases

    /// Names of all databases; needs `_system`
    pub async fn databases(&self) -> Result<E::Output<Vec<String>>> {
        let request = Request::get("/_api/database");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::DatabaseList, &resp)?;
                resp.json_field::<Vec<String>>("result")
            })
            .await
    }

    pub async fn has_database(&self, name: &str) -> Result<E::Output<bool>> {
        let request = Request::get("/_api/database");
        let name = name.to_string();
        self.executor
            .execute(request, move |resp: Response| {
                ensure_success(ErrorKind::DatabaseList, &resp)?;
                let names: Vec<String> = resp.json_field("result")?;
                Ok(names.contains(&name))
            })
            .await
    }

    /// Create a database; `users` are granted access to it
    pub async fn create_database(&self, name: &str, users: Option<Vec<Value>>) -> Result<E::Output<bool>> {
        validate_database_name(name)?;
        let mut body = json!({ "name": name });
        if let Some(users) = users {
            body["users"] = Value::Array(users);
        }
        let request = Request::post("/_api/database").with_json(body);
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::DatabaseCreate, &resp)?;
                Ok(true)
            })
            .await
    }

    pub async fn delete_database(&self, name: &str, ignore_missing: bool) -> Result<E::Output<bool>> {
        let request = Request::delete(format!("/_api/database/{}", encode_segment(name)));
        self.executor
            .execute(request, move |resp: Response| {
                if ignore_missing && resp.error_code == Some(ErrorCode::ArangoDatabaseNotFound.as_u32()) {
                    return Ok(false);
                }
                ensure_success(ErrorKind::DatabaseDelete, &resp)?;
                Ok(true)
            })
            .await
    }

    // Collections

    pub async fn collections(&self) -> Result<E::Output<Vec<CollectionInfo>>> {
        let request = Request::get("/_api/collection");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::CollectionList, &resp)?;
                resp.json_field::<Vec<CollectionInfo>>("result")
            })
            .await
    }

    pub async fn has_collection(&self, name: &str) -> Result<E::Output<bool>> {
        let request = Request::get("/_api/collection");
        let name = name.to_string();
        self.executor
            .execute(request, move |resp: Response| {
                ensure_success(ErrorKind::CollectionList, &resp)?;
                let collections: Vec<CollectionInfo> = resp.json_field("result")?;
                Ok(collections.iter().any(|c| c.name == name))
            })
            .await
    }

    /// Create a collection and return its API wrapper
    pub async fn create_collection(&self, name: &str, options: CollectionOptions) -> Result<E::Output<Collection<E>>> {
        validate_collection_name(name)?;
        let request = Request::post("/_api/collection").with_json(options.body(name));
        let executor = self.executor.clone();
        let name = name.to_string();
        self.executor
            .execute(request, move |resp: Response| {
                ensure_success(ErrorKind::CollectionCreate, &resp)?;
                Ok(Collection::new(executor.clone(), name.clone()))
            })
            .await
    }

    pub async fn delete_collection(&self, name: &str, ignore_missing: bool, system: Option<bool>) -> Result<E::Output<bool>> {
        let request = Request::delete(format!("/_api/collection/{}", encode_segment(name)))
            .with_opt_param("isSystem", system);
        self.executor
            .execute(request, move |resp: Response| {
                if ignore_missing && resp.error_code == Some(ErrorCode::ArangoDataSourceNotFound.as_u32()) {
                    return Ok(false);
                }
                ensure_success(ErrorKind::CollectionDelete, &resp)?;
                Ok(true)
            })
            .await
    }

    // Async jobs

    /// Ids of jobs in the given state, newest first. Only `Pending` and
    /// `Done` can be listed.
    pub async fn async_jobs(&self, status: JobStatus, count: Option<u32>) -> Result<E::Output<Vec<String>>> {
        arango_ensure!(
            status != JobStatus::Cancelled,
            ErrorKind::AsyncJobList,
            "job status must be \"pending\" or \"done\""
        );
        let request = Request::get(format!("/_api/job/{}", status)).with_opt_param("count", count);
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::AsyncJobList, &resp)?;
                resp.json::<Vec<String>>()
            })
            .await
    }

    /// Clear stored job results: all of them, or only those older than
    /// `threshold` (UNIX seconds)
    pub async fn clear_async_jobs(&self, threshold: Option<i64>) -> Result<E::Output<bool>> {
        let request = match threshold {
            None => Request::delete("/_api/job/all"),
            Some(stamp) => Request::delete("/_api/job/expired").with_param("stamp", stamp),
        };
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::AsyncJobClear, &resp)?;
                Ok(true)
            })
            .await
    }

    // Tasks

    pub async fn tasks(&self) -> Result<E::Output<Vec<TaskInfo>>> {
        let request = Request::get("/_api/tasks");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::TaskList, &resp)?;
                resp.json::<Vec<TaskInfo>>()
            })
            .await
    }

    pub async fn task(&self, task_id: &str) -> Result<E::Output<TaskInfo>> {
        let request = Request::get(format!("/_api/tasks/{}", encode_segment(task_id)));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::TaskGet, &resp)?;
                resp.json::<TaskInfo>()
            })
            .await
    }

    pub async fn create_task(&self, task: TaskOptions) -> Result<E::Output<TaskInfo>> {
        let mut body = json!({ "name": task.name, "command": task.command });
        if let Some(params) = task.params {
            body["params"] = params;
        }
        if let Some(period) = task.period {
            body["period"] = json!(period);
        }
        if let Some(offset) = task.offset {
            body["offset"] = json!(offset);
        }

        let request = match &task.task_id {
            Some(id) => Request::put(format!("/_api/tasks/{}", encode_segment(id))),
            None => Request::post("/_api/tasks"),
        }
        .with_json(body);

        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::TaskCreate, &resp)?;
                resp.json::<TaskInfo>()
            })
            .await
    }

    pub async fn delete_task(&self, task_id: &str, ignore_missing: bool) -> Result<E::Output<bool>> {
        let request = Request::delete(format!("/_api/tasks/{}", encode_segment(task_id)));
        self.executor
            .execute(request, move |resp: Response| {
                if ignore_missing && resp.error_code == Some(ErrorCode::TaskNotFound.as_u32()) {
                    return Ok(false);
                }
                ensure_success(ErrorKind::TaskDelete, &resp)?;
                Ok(true)
            })
            .await
    }

    // Users

    pub async fn users(&self) -> Result<E::Output<Vec<UserInfo>>> {
        let request = Request::get("/_api/user");
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::UserList, &resp)?;
                resp.json_field::<Vec<UserInfo>>("result")
            })
            .await
    }

    pub async fn has_user(&self, username: &str) -> Result<E::Output<bool>> {
        let request = Request::get("/_api/user");
        let username = username.to_string();
        self.executor
            .execute(request, move |resp: Response| {
                ensure_success(ErrorKind::UserList, &resp)?;
                let users: Vec<UserInfo> = resp.json_field("result")?;
                Ok(users.iter().any(|u| u.username == username))
            })
            .await
    }

    pub async fn user(&self, username: &str) -> Result<E::Output<UserInfo>> {
        let request = Request::get(format!("/_api/user/{}", encode_segment(username)));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::UserGet, &resp)?;
                resp.json::<UserInfo>()
            })
            .await
    }

    pub async fn create_user(&self, username: &str, options: UserOptions) -> Result<E::Output<UserInfo>> {
        let mut body = options.body();
        body.insert("user".to_string(), json!(username));
        let request = Request::post("/_api/user").with_json(Value::Object(body));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::UserCreate, &resp)?;
                resp.json::<UserInfo>()
            })
            .await
    }

    /// Change the given attributes, keeping the others
    pub async fn update_user(&self, username: &str, options: UserOptions) -> Result<E::Output<UserInfo>> {
        let request = Request::patch(format!("/_api/user/{}", encode_segment(username)))
            .with_json(Value::Object(options.body()));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::UserUpdate, &resp)?;
                resp.json::<UserInfo>()
            })
            .await
    }

    /// Reset every attribute to the given ones
    pub async fn replace_user(&self, username: &str, options: UserOptions) -> Result<E::Output<UserInfo>> {
        let request = Request::put(format!("/_api/user/{}", encode_segment(username)))
            .with_json(Value::Object(options.body()));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::UserReplace, &resp)?;
                resp.json::<UserInfo>()
            })
            .await
    }

    pub async fn delete_user(&self, username: &str, ignore_missing: bool) -> Result<E::Output<bool>> {
        let request = Request::delete(format!("/_api/user/{}", encode_segment(username)));
        self.executor
            .execute(request, move |resp: Response| {
                if ignore_missing && resp.error_code == Some(ErrorCode::UserNotFound.as_u32()) {
                    return Ok(false);
                }
                ensure_success(ErrorKind::UserDelete, &resp)?;
                Ok(true)
            })
            .await
    }

    // Permissions

    /// Database access level of a user, keyed by database name
    pub async fn permissions(&self, username: &str) -> Result<E::Output<Value>> {
        let request = Request::get(format!("/_api/user/{}/database", encode_segment(username)))
            .with_param("full", true);
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::PermissionList, &resp)?;
                Ok(resp.field("result").cloned().unwrap_or(Value::Null))
            })
            .await
    }

    pub async fn permission(&self, username: &str, database: &str, collection: Option<&str>) -> Result<E::Output<Permission>> {
        let request = Request::get(permission_endpoint(username, database, collection));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::PermissionGet, &resp)?;
                resp.json_field::<Permission>("result")
            })
            .await
    }

    pub async fn update_permission(
        &self,
        username: &str,
        permission: Permission,
        database: &str,
        collection: Option<&str>,
    ) -> Result<E::Output<bool>> {
        let request = Request::put(permission_endpoint(username, database, collection))
            .with_json(json!({ "grant": permission.as_str() }));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::PermissionUpdate, &resp)?;
                Ok(true)
            })
            .await
    }

    /// Drop an explicit grant so that the default access level applies again
    pub async fn reset_permission(&self, username: &str, database: &str, collection: Option<&str>) -> Result<E::Output<bool>> {
        let request = Request::delete(permission_endpoint(username, database, collection));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::PermissionReset, &resp)?;
                Ok(true)
            })
            .await
    }
}

impl<E: ApiExecutor> Database<E> {
    // Server monitoring

    /// Server statistics, or the description of their fields when
    /// `description` is set
    pub async fn statistics(&self, description: bool) -> Result<E::Output<Value>> {
        let endpoint = if description { "/_admin/statistics-description" } else { "/_admin/statistics" };
        self.executor
            .execute(Request::get(endpoint), |resp: Response| {
                ensure_success(ErrorKind::ServerStatistics, &resp)?;
                Ok(strip_status(resp.body))
            })
            .await
    }

    /// Log level per topic
    pub async fn log_levels(&self) -> Result<E::Output<BTreeMap<String, String>>> {
        self.executor
            .execute(Request::get("/_admin/log/level"), |resp: Response| {
                ensure_success(ErrorKind::ServerLogLevel, &resp)?;
                resp.json::<BTreeMap<String, String>>()
            })
            .await
    }

    /// Change the level of the given topics and return all levels
    pub async fn set_log_levels(&self, levels: BTreeMap<String, String>) -> Result<E::Output<BTreeMap<String, String>>> {
        let request = Request::put("/_admin/log/level").with_json(json!(levels));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerLogLevelSet, &resp)?;
                resp.json::<BTreeMap<String, String>>()
            })
            .await
    }

    pub async fn read_log(&self, options: LogOptions) -> Result<E::Output<LogEntries>> {
        let request = Request::get("/_admin/log")
            .with_opt_param("upto", options.upto.as_deref())
            .with_opt_param("level", options.level.as_deref())
            .with_opt_param("start", options.start)
            .with_opt_param("size", options.size)
            .with_opt_param("offset", options.offset)
            .with_opt_param("search", options.search.as_deref())
            .with_opt_param("sort", options.sort.as_deref());
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::ServerReadLog, &resp)?;
                resp.json::<LogEntries>()
            })
            .await
    }

    /// Rebuild the routing table from the stored Foxx routes
    pub async fn reload_routing(&self) -> Result<E::Output<bool>> {
        self.executor
            .execute(Request::post("/_admin/routing/reload"), |resp: Response| {
                ensure_success(ErrorKind::ServerReloadRouting, &resp)?;
                Ok(true)
            })
            .await
    }

    // Transactions

    /// Start a stream transaction and return a database whose calls all run
    /// inside it. The begin request itself always waits for the server.
    pub async fn begin_transaction(&self, options: TransactionOptions) -> Result<Database<TransactionExecutor>> {
        let request = Request::post("/_api/transaction/begin").with_json(Value::Object(options.body()));
        let conn = self.executor.connection();
        let resp = conn.send_request(&request).await?;
        ensure_success(ErrorKind::TransactionInit, &resp)?;

        let id = match resp.field("result").and_then(|result| result.get("id")) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ArangoError::server_with_message(
                    ErrorKind::TransactionInit,
                    &resp,
                    "missing transaction id",
                ))
            }
        };
        tracing::debug!("began transaction {} in {}", id, self.name());
        Ok(Database::new(TransactionExecutor::new(conn.clone(), id), self.job_poll_interval))
    }

    /// Run a JavaScript transaction on the server and return its result
    pub async fn execute_transaction(
        &self,
        command: &str,
        params: Option<Value>,
        options: TransactionOptions,
    ) -> Result<E::Output<Value>> {
        let mut body = options.body();
        body.insert("action".to_string(), json!(command));
        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }
        if let Some(count) = options.intermediate_commit_count {
            body.insert("intermediateCommitCount".to_string(), json!(count));
        }
        if let Some(size) = options.intermediate_commit_size {
            body.insert("intermediateCommitSize".to_string(), json!(size));
        }

        let request = Request::post("/_api/transaction").with_json(Value::Object(body));
        self.executor
            .execute(request, |resp: Response| {
                ensure_success(ErrorKind::TransactionExecute, &resp)?;
                Ok(resp.field("result").cloned().unwrap_or(Value::Null))
            })
            .await
    }
}

fn transaction_status(kind: ErrorKind, resp: &Response) -> Result<TransactionStatus> {
    ensure_success(kind, resp)?;
    match resp.field("result").and_then(|result| result.get("status")) {
        Some(status) => Ok(serde_json::from_value(status.clone())?),
        None => Err(ArangoError::server_with_message(kind, resp, "missing transaction status")),
    }
}

/// Control of the stream transaction the database is bound to. These calls
/// are not part of the transaction and go straight to the server.
impl Database<TransactionExecutor> {
    pub fn transaction_id(&self) -> &str {
        self.executor.id()
    }

    fn transaction_endpoint(&self) -> String {
        format!("/_api/transaction/{}", encode_segment(self.transaction_id()))
    }

    pub async fn transaction_status(&self) -> Result<TransactionStatus> {
        let request = Request::get(self.transaction_endpoint());
        let resp = self.connection().send_request(&request).await?;
        transaction_status(ErrorKind::TransactionStatus, &resp)
    }

    pub async fn commit_transaction(&self) -> Result<bool> {
        let request = Request::put(self.transaction_endpoint());
        let resp = self.connection().send_request(&request).await?;
        transaction_status(ErrorKind::TransactionCommit, &resp)?;
        tracing::debug!("committed transaction {}", self.transaction_id());
        Ok(true)
    }

    pub async fn abort_transaction(&self) -> Result<bool> {
        let request = Request::delete(self.transaction_endpoint());
        let resp = self.connection().send_request(&request).await?;
        transaction_status(ErrorKind::TransactionAbort, &resp)?;
        tracing::debug!("aborted transaction {}", self.transaction_id());
        Ok(true)
    }
}

impl<E: ApiExecutor> fmt::Debug for Database<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context() {
            ExecutionContext::Transaction => write!(f, "<TransactionDatabase {}>", self.name()),
            context => write!(f, "<Database {} ({})>", self.name(), context),
        }
    }
}
