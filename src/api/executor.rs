use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use crate::api::job::{AsyncJob, ASYNC_ID_HEADER};
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::connection::{Connection, Request, Response};

/// Request header asking the server to run a request in the background
pub const ASYNC_HEADER: &str = "x-arango-async";

/// Request header binding a request to a stream transaction
pub const TRANSACTION_HEADER: &str = "x-arango-trx-id";

/// Execution mode of an API surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    Default,
    Async,
    Transaction,
}

impl ExecutionContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionContext::Default => "default",
            ExecutionContext::Async => "async",
            ExecutionContext::Transaction => "transaction",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes API requests.
///
/// Every API method builds a [`Request`] plus a handler decoding the response
/// into the method's result type, then hands both to its executor. The
/// executor decides what the caller gets back: the decoded value, a job
/// handle, or nothing.
#[async_trait]
pub trait ApiExecutor: Clone + Send + Sync + 'static {
    /// What a method returning `T` returns under this executor
    type Output<T: Send + 'static>: Send;

    fn context(&self) -> ExecutionContext;

    fn connection(&self) -> &Connection;

    async fn execute<T, H>(&self, request: Request, handler: H) -> Result<Self::Output<T>>
    where
        T: Send + 'static,
        H: Fn(Response) -> Result<T> + Send + Sync + 'static;
}

/// Sends the request and decodes the response right away
#[derive(Debug, Clone)]
pub struct DefaultExecutor {
    conn: Connection,
}

impl DefaultExecutor {
    pub fn new(conn: Connection) -> Self {
        DefaultExecutor { conn }
    }
}

#[async_trait]
impl ApiExecutor for DefaultExecutor {
    type Output<T: Send + 'static> = T;

    fn context(&self) -> ExecutionContext {
        ExecutionContext::Default
    }

    fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn execute<T, H>(&self, request: Request, handler: H) -> Result<Self::Output<T>>
    where
        T: Send + 'static,
        H: Fn(Response) -> Result<T> + Send + Sync + 'static,
    {
        let resp = self.conn.send_request(&request).await?;
        handler(resp)
    }
}

/// Submits requests for background execution and returns job handles.
///
/// Only a rejected submission fails here. Failures of the operation itself
/// surface from [`AsyncJob::result`].
#[derive(Debug, Clone)]
pub struct AsyncExecutor {
    conn: Connection,
    poll_interval: Duration,
}

impl AsyncExecutor {
    pub fn new(conn: Connection, poll_interval: Duration) -> Self {
        AsyncExecutor { conn, poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[async_trait]
impl ApiExecutor for AsyncExecutor {
    type Output<T: Send + 'static> = AsyncJob<T>;

    fn context(&self) -> ExecutionContext {
        ExecutionContext::Async
    }

    fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn execute<T, H>(&self, request: Request, handler: H) -> Result<Self::Output<T>>
    where
        T: Send + 'static,
        H: Fn(Response) -> Result<T> + Send + Sync + 'static,
    {
        let request = request.with_header(ASYNC_HEADER, "store");
        let resp = self.conn.send_request(&request).await?;
        if !resp.is_success {
            return Err(ArangoError::server(ErrorKind::AsyncExecute, &resp));
        }

        let job_id = resp.header(ASYNC_ID_HEADER).ok_or_else(|| {
            ArangoError::client(ErrorKind::AsyncExecute, "server did not return a job id")
        })?;
        tracing::debug!("{} {} submitted as job {}", request.method, request.endpoint, job_id);

        Ok(AsyncJob::new(self.conn.clone(), job_id, handler).with_poll_interval(self.poll_interval))
    }
}

/// Submits requests for background execution without keeping results.
///
/// The server stores nothing, so there is no job to return.
#[derive(Debug, Clone)]
pub struct FireAndForgetExecutor {
    conn: Connection,
}

impl FireAndForgetExecutor {
    pub fn new(conn: Connection) -> Self {
        FireAndForgetExecutor { conn }
    }
}

#[async_trait]
impl ApiExecutor for FireAndForgetExecutor {
    type Output<T: Send + 'static> = ();

    fn context(&self) -> ExecutionContext {
        ExecutionContext::Async
    }

    fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn execute<T, H>(&self, request: Request, _handler: H) -> Result<Self::Output<T>>
    where
        T: Send + 'static,
        H: Fn(Response) -> Result<T> + Send + Sync + 'static,
    {
        let request = request.with_header(ASYNC_HEADER, "true");
        let resp = self.conn.send_request(&request).await?;
        if !resp.is_success {
            return Err(ArangoError::server(ErrorKind::AsyncExecute, &resp));
        }
        tracing::debug!("{} {} submitted without result", request.method, request.endpoint);
        Ok(())
    }
}

/// Runs every request inside a stream transaction
#[derive(Debug, Clone)]
pub struct TransactionExecutor {
    conn: Connection,
    id: String,
}

impl TransactionExecutor {
    pub fn new(conn: Connection, id: impl Into<String>) -> Self {
        TransactionExecutor { conn, id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl ApiExecutor for TransactionExecutor {
    type Output<T: Send + 'static> = T;

    fn context(&self) -> ExecutionContext {
        ExecutionContext::Transaction
    }

    fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn execute<T, H>(&self, request: Request, handler: H) -> Result<Self::Output<T>>
    where
        T: Send + 'static,
        H: Fn(Response) -> Result<T> + Send + Sync + 'static,
    {
        let request = request.with_header(TRANSACTION_HEADER, self.id.clone());
        let resp = self.conn.send_request(&request).await?;
        handler(resp)
    }
}
