use std::fmt;
use serde_json::{json, Map, Value};
use crate::api::cursor::Cursor;
use crate::api::executor::ApiExecutor;
use crate::api::types::QueryInfo;
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::common::utils::encode_segment;
use crate::connection::{Request, Response};

/// Options of [`Aql::execute`]
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub bind_vars: Option<Map<String, Value>>,
    /// Ask the server for the total result count
    pub count: bool,
    pub batch_size: Option<u32>,
    /// Cursor time-to-live in seconds
    pub ttl: Option<u32>,
    pub full_count: Option<bool>,
    pub max_runtime: Option<f64>,
    pub profile: Option<bool>,
    pub stream: Option<bool>,
    pub fail_on_warning: Option<bool>,
    pub memory_limit: Option<u64>,
    pub cache: Option<bool>,
}

impl QueryOptions {
    fn to_body(&self, query: &str) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), json!(query));
        body.insert("count".to_string(), json!(self.count));
        if let Some(batch_size) = self.batch_size {
            body.insert("batchSize".to_string(), json!(batch_size));
        }
        if let Some(ttl) = self.ttl {
            body.insert("ttl".to_string(), json!(ttl));
        }
        if let Some(bind_vars) = &self.bind_vars {
            body.insert("bindVars".to_string(), Value::Object(bind_vars.clone()));
        }
        if let Some(memory_limit) = self.memory_limit {
            body.insert("memoryLimit".to_string(), json!(memory_limit));
        }
        if let Some(cache) = self.cache {
            body.insert("cache".to_string(), json!(cache));
        }

        let mut options = Map::new();
        if let Some(full_count) = self.full_count {
            options.insert("fullCount".to_string(), json!(full_count));
        }
        if let Some(max_runtime) = self.max_runtime {
            options.insert("maxRuntime".to_string(), json!(max_runtime));
        }
        if let Some(profile) = self.profile {
            options.insert("profile".to_string(), json!(profile));
        }
        if let Some(stream) = self.stream {
            options.insert("stream".to_string(), json!(stream));
        }
        if let Some(fail_on_warning) = self.fail_on_warning {
            options.insert("failOnWarning".to_string(), json!(fail_on_warning));
        }
        if !options.is_empty() {
            body.insert("options".to_string(), Value::Object(options));
        }
        Value::Object(body)
    }
}

/// Options of [`Aql::explain`]
#[derive(Debug, Clone, Default)]
pub struct ExplainOptions {
    pub all_plans: bool,
    pub max_plans: Option<u32>,
    /// Optimizer rules to enable (`+rule`) or disable (`-rule`)
    pub opt_rules: Option<Vec<String>>,
    pub bind_vars: Option<Map<String, Value>>,
}

fn strip_status(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        map.remove("code");
        map.remove("error");
    }
    body
}

/// AQL API
#[derive(Clone)]
pub struct Aql<E: ApiExecutor> {
    executor: E,
}

impl<E: ApiExecutor> Aql<E> {
    pub(crate) fn new(executor: E) -> Self {
        Aql { executor }
    }

    /// Run a query and return a cursor over its results
    pub async fn execute(&self, query: &str, options: QueryOptions) -> Result<E::Output<Cursor>> {
        let request = Request::post("/_api/cursor").with_json(options.to_body(query));
        let conn = self.executor.connection().clone();

        self.executor
            .execute(request, move |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::AqlQueryExecute, &resp));
                }
                Cursor::new(conn.clone(), &resp.body)
            })
            .await
    }

    /// Execution plan of a query; every plan when `all_plans` is set
    pub async fn explain(&self, query: &str, options: ExplainOptions) -> Result<E::Output<Value>> {
        let mut explain_options = Map::new();
        explain_options.insert("allPlans".to_string(), json!(options.all_plans));
        if let Some(max_plans) = options.max_plans {
            explain_options.insert("maxNumberOfPlans".to_string(), json!(max_plans));
        }
        if let Some(rules) = &options.opt_rules {
            explain_options.insert("optimizer".to_string(), json!({ "rules": rules }));
        }

        let mut body = json!({ "query": query, "options": explain_options });
        if let Some(bind_vars) = options.bind_vars {
            body["bindVars"] = Value::Object(bind_vars);
        }

        let request = Request::post("/_api/explain").with_json(body);
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::AqlQueryExplain, &resp));
                }
                match resp.field("plans").or_else(|| resp.field("plan")) {
                    Some(plan) => Ok(plan.clone()),
                    None => Err(ArangoError::server_with_message(
                        ErrorKind::AqlQueryExplain,
                        &resp,
                        "explain response carries no plan",
                    )),
                }
            })
            .await
    }

    /// Parse a query without running it
    pub async fn validate(&self, query: &str) -> Result<E::Output<Value>> {
        let request = Request::post("/_api/query").with_json(json!({ "query": query }));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::AqlQueryValidate, &resp));
                }
                Ok(strip_status(resp.body))
            })
            .await
    }

    /// Queries currently running in the database
    pub async fn queries(&self) -> Result<E::Output<Vec<QueryInfo>>> {
        let request = Request::get("/_api/query/current");
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::AqlQueryList, &resp));
                }
                resp.json::<Vec<QueryInfo>>()
            })
            .await
    }

    /// Kill a running query
    pub async fn kill(&self, query_id: &str) -> Result<E::Output<bool>> {
        let request = Request::delete(format!("/_api/query/{}", encode_segment(query_id)));
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::AqlQueryKill, &resp));
                }
                Ok(true)
            })
            .await
    }
}

impl<E: ApiExecutor> fmt::Debug for Aql<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<AQL in {}>", self.executor.connection().db_name())
    }
}
