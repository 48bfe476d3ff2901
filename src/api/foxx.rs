use std::fmt;
use serde_json::{json, Value};
use crate::api::executor::ApiExecutor;
use crate::api::types::ServiceInfo;
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::common::utils::encode_segment;
use crate::connection::{Request, Response};

/// Options for installing or replacing a service
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub config: Option<Value>,
    pub dependencies: Option<Value>,
    pub development: Option<bool>,
    pub setup: Option<bool>,
    pub legacy: Option<bool>,
    /// Replace only: run the teardown script of the old service
    pub teardown: Option<bool>,
    /// Replace only: install even when nothing is mounted yet
    pub force: Option<bool>,
}

impl ServiceOptions {
    fn body(&self, source: &str) -> Value {
        let mut body = json!({ "source": source });
        if let Some(config) = &self.config {
            body["configuration"] = config.clone();
        }
        if let Some(dependencies) = &self.dependencies {
            body["dependencies"] = dependencies.clone();
        }
        body
    }
}

/// Foxx microservice API
#[derive(Clone)]
pub struct Foxx<E: ApiExecutor> {
    executor: E,
}

fn ok_body(kind: ErrorKind, resp: Response) -> Result<Value> {
    if !resp.is_success {
        return Err(ArangoError::server(kind, &resp));
    }
    Ok(resp.body)
}

fn service_info(kind: ErrorKind, resp: Response) -> Result<ServiceInfo> {
    if !resp.is_success {
        return Err(ArangoError::server(kind, &resp));
    }
    resp.json()
}

impl<E: ApiExecutor> Foxx<E> {
    pub(crate) fn new(executor: E) -> Self {
        Foxx { executor }
    }

    /// Installed services
    pub async fn services(&self, exclude_system: bool) -> Result<E::Output<Vec<ServiceInfo>>> {
        let request = Request::get("/_api/foxx").with_param("excludeSystem", exclude_system);
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::FoxxServiceList, &resp));
                }
                resp.json::<Vec<ServiceInfo>>()
            })
            .await
    }

    pub async fn service(&self, mount: &str) -> Result<E::Output<ServiceInfo>> {
        let request = Request::get("/_api/foxx/service").with_param("mount", mount);
        self.executor
            .execute(request, |resp: Response| service_info(ErrorKind::FoxxServiceGet, resp))
            .await
    }

    /// Install a service from a source URL or server-local path
    pub async fn create_service(&self, mount: &str, source: &str, options: ServiceOptions) -> Result<E::Output<ServiceInfo>> {
        let request = Request::post("/_api/foxx")
            .with_param("mount", mount)
            .with_opt_param("development", options.development)
            .with_opt_param("setup", options.setup)
            .with_opt_param("legacy", options.legacy)
            .with_json(options.body(source));
        self.executor
            .execute(request, |resp: Response| service_info(ErrorKind::FoxxServiceCreate, resp))
            .await
    }

    pub async fn replace_service(&self, mount: &str, source: &str, options: ServiceOptions) -> Result<E::Output<ServiceInfo>> {
        let request = Request::put("/_api/foxx/service")
            .with_param("mount", mount)
            .with_opt_param("teardown", options.teardown)
            .with_opt_param("setup", options.setup)
            .with_opt_param("legacy", options.legacy)
            .with_opt_param("force", options.force)
            .with_json(options.body(source));
        self.executor
            .execute(request, |resp: Response| service_info(ErrorKind::FoxxServiceReplace, resp))
            .await
    }

    pub async fn delete_service(&self, mount: &str, teardown: Option<bool>) -> Result<E::Output<bool>> {
        let request = Request::delete("/_api/foxx/service")
            .with_param("mount", mount)
            .with_opt_param("teardown", teardown);
        self.executor
            .execute(request, |resp: Response| {
                ok_body(ErrorKind::FoxxServiceDelete, resp).map(|_| true)
            })
            .await
    }

    pub async fn config(&self, mount: &str) -> Result<E::Output<Value>> {
        let request = Request::get("/_api/foxx/configuration").with_param("mount", mount);
        self.executor
            .execute(request, |resp: Response| ok_body(ErrorKind::FoxxConfigGet, resp))
            .await
    }

    /// Merge `config` into the service configuration
    pub async fn update_config(&self, mount: &str, config: Value) -> Result<E::Output<Value>> {
        let request = Request::patch("/_api/foxx/configuration")
            .with_param("mount", mount)
            .with_json(config);
        self.executor
            .execute(request, |resp: Response| ok_body(ErrorKind::FoxxConfigUpdate, resp))
            .await
    }

    pub async fn dependencies(&self, mount: &str) -> Result<E::Output<Value>> {
        let request = Request::get("/_api/foxx/dependencies").with_param("mount", mount);
        self.executor
            .execute(request, |resp: Response| ok_body(ErrorKind::FoxxDependencyGet, resp))
            .await
    }

    pub async fn scripts(&self, mount: &str) -> Result<E::Output<Value>> {
        let request = Request::get("/_api/foxx/scripts").with_param("mount", mount);
        self.executor
            .execute(request, |resp: Response| ok_body(ErrorKind::FoxxScriptList, resp))
            .await
    }

    pub async fn run_script(&self, mount: &str, name: &str, arg: Option<Value>) -> Result<E::Output<Value>> {
        let request = Request::post(format!("/_api/foxx/scripts/{}", encode_segment(name)))
            .with_param("mount", mount)
            .with_json(arg.unwrap_or(Value::Null));
        self.executor
            .execute(request, |resp: Response| ok_body(ErrorKind::FoxxScriptRun, resp))
            .await
    }

    pub async fn enable_development(&self, mount: &str) -> Result<E::Output<ServiceInfo>> {
        let request = Request::post("/_api/foxx/development").with_param("mount", mount);
        self.executor
            .execute(request, |resp: Response| service_info(ErrorKind::FoxxDevModeEnable, resp))
            .await
    }

    pub async fn disable_development(&self, mount: &str) -> Result<E::Output<ServiceInfo>> {
        let request = Request::delete("/_api/foxx/development").with_param("mount", mount);
        self.executor
            .execute(request, |resp: Response| service_info(ErrorKind::FoxxDevModeDisable, resp))
            .await
    }

    /// Service README, empty when the service has none
    pub async fn readme(&self, mount: &str) -> Result<E::Output<String>> {
        let request = Request::get("/_api/foxx/readme")
            .with_param("mount", mount)
            .raw_response();
        self.executor
            .execute(request, |resp: Response| {
                if !resp.is_success {
                    return Err(ArangoError::server(ErrorKind::FoxxReadme, &resp));
                }
                Ok(resp.text())
            })
            .await
    }
}

impl<E: ApiExecutor> fmt::Debug for Foxx<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Foxx in {}>", self.executor.connection().db_name())
    }
}
