use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::common::error::{ArangoError, ErrorKind, Result};
use crate::connection::{Connection, Request, Response};

/// Response header carrying the id of a stored job result
pub const ASYNC_ID_HEADER: &str = "x-arango-async-id";

/// Server-side state of an async job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Done => "done",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ArangoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "done" => Ok(JobStatus::Done),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(ArangoError::client(
                ErrorKind::AsyncJobStatus,
                format!("unknown job status \"{}\"", other),
            )),
        }
    }
}

/// Decoder turning the stored response of a job into its result
pub type ResponseHandler<T> = Arc<dyn Fn(Response) -> Result<T> + Send + Sync>;

/// Handle to an operation executed in the background by the server.
///
/// The handle holds nothing but the job id and the decoder of the submitted
/// operation; every method asks the server. Failures of the operation itself
/// are reported by [`AsyncJob::result`] with the error kind the operation
/// reports when executed directly.
pub struct AsyncJob<T> {
    conn: Connection,
    id: String,
    handler: ResponseHandler<T>,
    poll_interval: Duration,
}

impl<T> AsyncJob<T> {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new<H>(conn: Connection, id: impl Into<String>, handler: H) -> Self
    where
        H: Fn(Response) -> Result<T> + Send + Sync + 'static,
    {
        AsyncJob {
            conn,
            id: id.into(),
            handler: Arc::new(handler),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Set the sleep between polls of [`AsyncJob::result`]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Query the current job status
    pub async fn status(&self) -> Result<JobStatus> {
        let request = Request::get(format!("/_api/job/{}", self.id));
        let resp = self.conn.send_request(&request).await?;

        match resp.status_code {
            204 => Ok(JobStatus::Pending),
            410 => Ok(JobStatus::Cancelled),
            404 => Err(ArangoError::job_not_found(ErrorKind::AsyncJobStatus, &self.id)),
            _ if resp.is_success => Ok(JobStatus::Done),
            _ => Err(ArangoError::server(ErrorKind::AsyncJobStatus, &resp)),
        }
    }

    /// Fetch the result once, without waiting.
    ///
    /// Fails with [`ArangoError::JobPending`] while the job is still running.
    /// The server discards the stored result after a successful fetch.
    ///
    /// The fetch is never resent to another host: a server answering
    /// "service unavailable" may already have handed out and dropped the
    /// result, so that answer is returned as an
    /// [`ErrorKind::AsyncJobResult`] server error instead.
    pub async fn try_result(&self) -> Result<T> {
        let request = Request::put(format!("/_api/job/{}", self.id)).without_failover();
        let resp = self.conn.send_request(&request).await?;

        if resp.header(ASYNC_ID_HEADER).is_some() {
            return (self.handler)(resp);
        }

        match resp.status_code {
            204 => Err(ArangoError::JobPending { job_id: self.id.clone() }),
            404 | 410 => Err(ArangoError::job_not_found(ErrorKind::AsyncJobResult, &self.id)),
            _ => Err(ArangoError::server(ErrorKind::AsyncJobResult, &resp)),
        }
    }

    /// Wait until the job is done and return its decoded result.
    ///
    /// Polls every [`AsyncJob::poll_interval`] with no upper bound; wrap the
    /// call in `tokio::time::timeout` to give up early.
    pub async fn result(&self) -> Result<T> {
        loop {
            match self.try_result().await {
                Err(ArangoError::JobPending { .. }) => {
                    tracing::trace!("job {} pending, retrying in {:?}", self.id, self.poll_interval);
                    tokio::time::sleep(self.poll_interval).await;
                }
                other => return other,
            }
        }
    }

    /// Cancel a pending job.
    ///
    /// Returns `Ok(false)` instead of failing when the job is unknown (already
    /// done, cleared or never existed) and `ignore_missing` is set.
    pub async fn cancel(&self, ignore_missing: bool) -> Result<bool> {
        let request = Request::put(format!("/_api/job/{}/cancel", self.id));
        let resp = self.conn.send_request(&request).await?;

        match resp.status_code {
            200 => Ok(true),
            404 if ignore_missing => Ok(false),
            404 => Err(ArangoError::job_not_found(ErrorKind::AsyncJobCancel, &self.id)),
            _ => Err(ArangoError::server(ErrorKind::AsyncJobCancel, &resp)),
        }
    }

    /// Discard the job and its stored result on the server
    pub async fn clear(&self, ignore_missing: bool) -> Result<bool> {
        let request = Request::delete(format!("/_api/job/{}", self.id));
        let resp = self.conn.send_request(&request).await?;

        if resp.is_success {
            return Ok(true);
        }
        match resp.status_code {
            404 if ignore_missing => Ok(false),
            404 => Err(ArangoError::job_not_found(ErrorKind::AsyncJobClear, &self.id)),
            _ => Err(ArangoError::server(ErrorKind::AsyncJobClear, &resp)),
        }
    }
}

impl<T> Clone for AsyncJob<T> {
    fn clone(&self) -> Self {
        AsyncJob {
            conn: self.conn.clone(),
            id: self.id.clone(),
            handler: Arc::clone(&self.handler),
            poll_interval: self.poll_interval,
        }
    }
}

impl<T> fmt::Debug for AsyncJob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<AsyncJob {}>", self.id)
    }
}
