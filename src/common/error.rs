use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use crate::connection::request::HttpMethod;
use crate::connection::response::Response;

/// ArangoDB error numbers (`errorNum`) as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    // General errors
    NoError = 0,
    Failed = 1,
    SystemError = 2,
    OutOfMemory = 3,
    Internal = 4,
    NotImplemented = 9,
    BadParameter = 10,
    Forbidden = 11,
    RequestCanceled = 21,
    ShuttingDown = 30,

    // HTTP errors
    HttpBadParameter = 400,
    HttpUnauthorized = 401,
    HttpForbidden = 403,
    HttpNotFound = 404,
    HttpMethodNotAllowed = 405,
    HttpPreconditionFailed = 412,
    HttpServerError = 500,
    HttpServiceUnavailable = 503,

    // Document and collection errors
    ArangoConflict = 1200,
    ArangoDocumentNotFound = 1202,
    ArangoDataSourceNotFound = 1203,
    ArangoCollectionParameterMissing = 1204,
    ArangoDocumentHandleBad = 1205,
    ArangoDuplicateName = 1207,
    ArangoIllegalName = 1208,
    ArangoUniqueConstraintViolated = 1210,
    ArangoIndexNotFound = 1212,
    ArangoDocumentKeyBad = 1221,
    ArangoDatabaseNotFound = 1228,
    ArangoDatabaseNameInvalid = 1229,
    ArangoUseSystemDatabase = 1230,

    // Query errors
    QueryKilled = 1500,
    QueryParse = 1501,
    QueryEmpty = 1502,
    QueryBindParameterMissing = 1551,
    QueryNotFound = 1591,
    CursorNotFound = 1600,

    // Transaction errors
    TransactionNotFound = 1655,

    // User and task errors
    UserInvalidName = 1700,
    UserDuplicate = 1702,
    UserNotFound = 1703,
    TaskInvalidId = 1850,
    TaskDuplicateId = 1851,
    TaskNotFound = 1852,

    // Foxx errors
    ServiceNotFound = 3009,

    /// Any error number this client does not enumerate
    Unknown = u32::MAX,
}

impl ErrorCode {
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ErrorCode::NoError,
            1 => ErrorCode::Failed,
            2 => ErrorCode::SystemError,
            3 => ErrorCode::OutOfMemory,
            4 => ErrorCode::Internal,
            9 => ErrorCode::NotImplemented,
            10 => ErrorCode::BadParameter,
            11 => ErrorCode::Forbidden,
            21 => ErrorCode::RequestCanceled,
            30 => ErrorCode::ShuttingDown,
            400 => ErrorCode::HttpBadParameter,
            401 => ErrorCode::HttpUnauthorized,
            403 => ErrorCode::HttpForbidden,
            404 => ErrorCode::HttpNotFound,
            405 => ErrorCode::HttpMethodNotAllowed,
            412 => ErrorCode::HttpPreconditionFailed,
            500 => ErrorCode::HttpServerError,
            503 => ErrorCode::HttpServiceUnavailable,
            1200 => ErrorCode::ArangoConflict,
            1202 => ErrorCode::ArangoDocumentNotFound,
            1203 => ErrorCode::ArangoDataSourceNotFound,
            1204 => ErrorCode::ArangoCollectionParameterMissing,
            1205 => ErrorCode::ArangoDocumentHandleBad,
            1207 => ErrorCode::ArangoDuplicateName,
            1208 => ErrorCode::ArangoIllegalName,
            1210 => ErrorCode::ArangoUniqueConstraintViolated,
            1212 => ErrorCode::ArangoIndexNotFound,
            1221 => ErrorCode::ArangoDocumentKeyBad,
            1228 => ErrorCode::ArangoDatabaseNotFound,
            1229 => ErrorCode::ArangoDatabaseNameInvalid,
            1230 => ErrorCode::ArangoUseSystemDatabase,
            1500 => ErrorCode::QueryKilled,
            1501 => ErrorCode::QueryParse,
            1502 => ErrorCode::QueryEmpty,
            1551 => ErrorCode::QueryBindParameterMissing,
            1591 => ErrorCode::QueryNotFound,
            1600 => ErrorCode::CursorNotFound,
            1655 => ErrorCode::TransactionNotFound,
            1700 => ErrorCode::UserInvalidName,
            1702 => ErrorCode::UserDuplicate,
            1703 => ErrorCode::UserNotFound,
            1850 => ErrorCode::TaskInvalidId,
            1851 => ErrorCode::TaskDuplicateId,
            1852 => ErrorCode::TaskNotFound,
            3009 => ErrorCode::ServiceNotFound,
            _ => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::NoError => write!(f, "no error"),
            ErrorCode::Failed => write!(f, "failed"),
            ErrorCode::Internal => write!(f, "internal error"),
            ErrorCode::BadParameter | ErrorCode::HttpBadParameter => write!(f, "bad parameter"),
            ErrorCode::Forbidden | ErrorCode::HttpForbidden => write!(f, "forbidden"),
            ErrorCode::RequestCanceled => write!(f, "request canceled"),
            ErrorCode::HttpUnauthorized => write!(f, "unauthorized"),
            ErrorCode::HttpNotFound => write!(f, "not found"),
            ErrorCode::ArangoConflict => write!(f, "conflict"),
            ErrorCode::ArangoDocumentNotFound => write!(f, "document not found"),
            ErrorCode::ArangoDataSourceNotFound => write!(f, "collection or view not found"),
            ErrorCode::ArangoDuplicateName => write!(f, "duplicate name"),
            ErrorCode::ArangoUniqueConstraintViolated => write!(f, "unique constraint violated"),
            ErrorCode::ArangoDatabaseNotFound => write!(f, "database not found"),
            ErrorCode::QueryParse => write!(f, "query parse error"),
            ErrorCode::ArangoIndexNotFound => write!(f, "index not found"),
            ErrorCode::CursorNotFound => write!(f, "cursor not found"),
            ErrorCode::TransactionNotFound => write!(f, "transaction not found"),
            ErrorCode::UserNotFound => write!(f, "user not found"),
            ErrorCode::TaskNotFound => write!(f, "task not found"),
            ErrorCode::ServiceNotFound => write!(f, "service not found"),
            ErrorCode::Unknown => write!(f, "unknown error"),
            _ => write!(f, "error code {}", self.as_u32()),
        }
    }
}

/// The operation an error was raised by.
///
/// An operation executed in an async context reports a deferred failure with
/// the same kind it would have reported when executed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Connection
    ServerConnection,
    JwtAuth,

    // Async jobs
    AsyncExecute,
    AsyncJobStatus,
    AsyncJobResult,
    AsyncJobCancel,
    AsyncJobClear,
    AsyncJobList,

    // Server administration
    ServerVersion,
    ServerDetails,
    ServerStatus,
    ServerTime,
    ServerEngine,
    ServerRole,
    ServerEcho,
    ServerRequiredDbVersion,
    ServerMetrics,
    ServerStatistics,
    ServerLogLevel,
    ServerLogLevelSet,
    ServerReadLog,
    ServerReloadRouting,

    // Databases
    DatabaseProperties,
    DatabaseList,
    DatabaseCreate,
    DatabaseDelete,

    // Collections
    CollectionList,
    CollectionCreate,
    CollectionDelete,
    CollectionProperties,
    CollectionTruncate,
    CollectionRename,
    CollectionConfigure,
    CollectionStatistics,
    CollectionRevision,
    CollectionChecksum,
    CollectionRecalculateCount,
    DocumentCount,

    // Documents
    DocumentParse,
    DocumentGet,
    DocumentIn,
    DocumentInsert,
    DocumentUpdate,
    DocumentReplace,
    DocumentDelete,
    DocumentRevision,
    DocumentIds,
    DocumentKeys,

    // Indexes
    IndexList,
    IndexCreate,
    IndexDelete,

    // Transactions
    TransactionInit,
    TransactionStatus,
    TransactionCommit,
    TransactionAbort,
    TransactionExecute,

    // AQL and cursors
    AqlQueryExecute,
    AqlQueryExplain,
    AqlQueryValidate,
    AqlQueryList,
    AqlQueryKill,
    CursorNext,
    CursorClose,
    CursorState,
    CursorEmpty,
    CursorCount,

    // Tasks
    TaskList,
    TaskGet,
    TaskCreate,
    TaskDelete,

    // Users and permissions
    UserList,
    UserGet,
    UserCreate,
    UserUpdate,
    UserReplace,
    UserDelete,
    PermissionList,
    PermissionGet,
    PermissionUpdate,
    PermissionReset,

    // Foxx
    FoxxServiceList,
    FoxxServiceGet,
    FoxxServiceCreate,
    FoxxServiceReplace,
    FoxxServiceDelete,
    FoxxConfigGet,
    FoxxConfigUpdate,
    FoxxDependencyGet,
    FoxxScriptList,
    FoxxScriptRun,
    FoxxDevModeEnable,
    FoxxDevModeDisable,
    FoxxReadme,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ServerConnection => "server connection",
            ErrorKind::JwtAuth => "JWT auth",
            ErrorKind::AsyncExecute => "async execute",
            ErrorKind::AsyncJobStatus => "async job status",
            ErrorKind::AsyncJobResult => "async job result",
            ErrorKind::AsyncJobCancel => "async job cancel",
            ErrorKind::AsyncJobClear => "async job clear",
            ErrorKind::AsyncJobList => "async job list",
            ErrorKind::ServerVersion => "server version",
            ErrorKind::ServerDetails => "server details",
            ErrorKind::ServerStatus => "server status",
            ErrorKind::ServerTime => "server time",
            ErrorKind::ServerEngine => "server engine",
            ErrorKind::ServerRole => "server role",
            ErrorKind::ServerEcho => "server echo",
            ErrorKind::ServerRequiredDbVersion => "server required db version",
            ErrorKind::ServerMetrics => "server metrics",
            ErrorKind::ServerStatistics => "server statistics",
            ErrorKind::ServerLogLevel => "server log level",
            ErrorKind::ServerLogLevelSet => "server log level set",
            ErrorKind::ServerReadLog => "server read log",
            ErrorKind::ServerReloadRouting => "server reload routing",
            ErrorKind::DatabaseProperties => "database properties",
            ErrorKind::DatabaseList => "database list",
            ErrorKind::DatabaseCreate => "database create",
            ErrorKind::DatabaseDelete => "database delete",
            ErrorKind::CollectionList => "collection list",
            ErrorKind::CollectionCreate => "collection create",
            ErrorKind::CollectionDelete => "collection delete",
            ErrorKind::CollectionProperties => "collection properties",
            ErrorKind::CollectionTruncate => "collection truncate",
            ErrorKind::CollectionRename => "collection rename",
            ErrorKind::CollectionConfigure => "collection configure",
            ErrorKind::CollectionStatistics => "collection statistics",
            ErrorKind::CollectionRevision => "collection revision",
            ErrorKind::CollectionChecksum => "collection checksum",
            ErrorKind::CollectionRecalculateCount => "collection recalculate count",
            ErrorKind::DocumentCount => "document count",
            ErrorKind::DocumentParse => "document parse",
            ErrorKind::DocumentGet => "document get",
            ErrorKind::DocumentIn => "document in",
            ErrorKind::DocumentInsert => "document insert",
            ErrorKind::DocumentUpdate => "document update",
            ErrorKind::DocumentReplace => "document replace",
            ErrorKind::DocumentDelete => "document delete",
            ErrorKind::DocumentRevision => "document revision",
            ErrorKind::DocumentIds => "document ids",
            ErrorKind::DocumentKeys => "document keys",
            ErrorKind::IndexList => "index list",
            ErrorKind::IndexCreate => "index create",
            ErrorKind::IndexDelete => "index delete",
            ErrorKind::TransactionInit => "transaction init",
            ErrorKind::TransactionStatus => "transaction status",
            ErrorKind::TransactionCommit => "transaction commit",
            ErrorKind::TransactionAbort => "transaction abort",
            ErrorKind::TransactionExecute => "transaction execute",
            ErrorKind::AqlQueryExecute => "AQL query execute",
            ErrorKind::AqlQueryExplain => "AQL query explain",
            ErrorKind::AqlQueryValidate => "AQL query validate",
            ErrorKind::AqlQueryList => "AQL query list",
            ErrorKind::AqlQueryKill => "AQL query kill",
            ErrorKind::CursorNext => "cursor next",
            ErrorKind::CursorClose => "cursor close",
            ErrorKind::CursorState => "cursor state",
            ErrorKind::CursorEmpty => "cursor empty",
            ErrorKind::CursorCount => "cursor count",
            ErrorKind::TaskList => "task list",
            ErrorKind::TaskGet => "task get",
            ErrorKind::TaskCreate => "task create",
            ErrorKind::TaskDelete => "task delete",
            ErrorKind::UserList => "user list",
            ErrorKind::UserGet => "user get",
            ErrorKind::UserCreate => "user create",
            ErrorKind::UserUpdate => "user update",
            ErrorKind::UserReplace => "user replace",
            ErrorKind::UserDelete => "user delete",
            ErrorKind::PermissionList => "permission list",
            ErrorKind::PermissionGet => "permission get",
            ErrorKind::PermissionUpdate => "permission update",
            ErrorKind::PermissionReset => "permission reset",
            ErrorKind::FoxxServiceList => "foxx service list",
            ErrorKind::FoxxServiceGet => "foxx service get",
            ErrorKind::FoxxServiceCreate => "foxx service create",
            ErrorKind::FoxxServiceReplace => "foxx service replace",
            ErrorKind::FoxxServiceDelete => "foxx service delete",
            ErrorKind::FoxxConfigGet => "foxx config get",
            ErrorKind::FoxxConfigUpdate => "foxx config update",
            ErrorKind::FoxxDependencyGet => "foxx dependency get",
            ErrorKind::FoxxScriptList => "foxx script list",
            ErrorKind::FoxxScriptRun => "foxx script run",
            ErrorKind::FoxxDevModeEnable => "foxx development mode enable",
            ErrorKind::FoxxDevModeDisable => "foxx development mode disable",
            ErrorKind::FoxxReadme => "foxx readme",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the server for a specific operation
#[derive(Debug, Clone)]
pub struct ServerError {
    pub kind: ErrorKind,
    /// Formatted message, `[HTTP <code>][ERR <num>] <text>`
    pub message: String,
    pub error_message: Option<String>,
    pub error_num: Option<u32>,
    pub http_method: HttpMethod,
    pub http_code: u16,
    pub url: String,
    pub http_headers: HashMap<String, String>,
}

impl ServerError {
    pub fn from_response(kind: ErrorKind, resp: &Response) -> Self {
        Self::with_message(kind, resp, None)
    }

    pub fn with_message(kind: ErrorKind, resp: &Response, message: Option<String>) -> Self {
        let text = message
            .or_else(|| resp.error_message.clone())
            .unwrap_or_else(|| resp.status_text.clone());

        let message = match resp.error_code {
            Some(num) => format!("[HTTP {}][ERR {}] {}", resp.status_code, num, text),
            None => format!("[HTTP {}] {}", resp.status_code, text),
        };

        ServerError {
            kind,
            message,
            error_message: resp.error_message.clone(),
            error_num: resp.error_code,
            http_method: resp.method,
            http_code: resp.status_code,
            url: resp.url.clone(),
            http_headers: resp.headers.clone(),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_num.map(ErrorCode::from_u32)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Main client error type
#[derive(Error, Debug)]
pub enum ArangoError {
    #[error("{0}")]
    Server(Box<ServerError>),

    #[error("{message}")]
    Client {
        kind: ErrorKind,
        message: String,
    },

    #[error("job {job_id} not found")]
    JobNotFound {
        kind: ErrorKind,
        job_id: String,
    },

    #[error("job {job_id} not done")]
    JobPending {
        job_id: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ArangoError {
    pub fn server(kind: ErrorKind, resp: &Response) -> Self {
        ArangoError::Server(Box::new(ServerError::from_response(kind, resp)))
    }

    pub fn server_with_message(kind: ErrorKind, resp: &Response, message: impl Into<String>) -> Self {
        ArangoError::Server(Box::new(ServerError::with_message(kind, resp, Some(message.into()))))
    }

    pub fn client(kind: ErrorKind, message: impl Into<String>) -> Self {
        ArangoError::Client {
            kind,
            message: message.into(),
        }
    }

    pub fn document_parse(message: impl Into<String>) -> Self {
        ArangoError::client(ErrorKind::DocumentParse, message)
    }

    pub fn job_not_found(kind: ErrorKind, job_id: impl Into<String>) -> Self {
        ArangoError::JobNotFound {
            kind,
            job_id: job_id.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ArangoError::Server(err) => Some(err.kind),
            ArangoError::Client { kind, .. } => Some(*kind),
            ArangoError::JobNotFound { kind, .. } => Some(*kind),
            ArangoError::JobPending { .. } => Some(ErrorKind::AsyncJobResult),
            ArangoError::Connection(_) => Some(ErrorKind::ServerConnection),
            ArangoError::Jwt(_) => Some(ErrorKind::JwtAuth),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ArangoError::Server(err) => err.error_code(),
            _ => None,
        }
    }

    pub fn http_code(&self) -> Option<u16> {
        match self {
            ArangoError::Server(err) => Some(err.http_code),
            _ => None,
        }
    }

    /// True when the error was detected by the server rather than the client
    pub fn is_server_error(&self) -> bool {
        matches!(self, ArangoError::Server(_))
    }

    pub fn is_job_not_found(&self) -> bool {
        matches!(self, ArangoError::JobNotFound { .. })
    }

    pub fn is_not_found(&self) -> bool {
        if self.is_job_not_found() {
            return true;
        }
        matches!(self.error_code(),
            Some(ErrorCode::ArangoDocumentNotFound) |
            Some(ErrorCode::ArangoDataSourceNotFound) |
            Some(ErrorCode::ArangoDatabaseNotFound) |
            Some(ErrorCode::HttpNotFound) |
            Some(ErrorCode::CursorNotFound) |
            Some(ErrorCode::ArangoIndexNotFound) |
            Some(ErrorCode::TransactionNotFound) |
            Some(ErrorCode::UserNotFound) |
            Some(ErrorCode::TaskNotFound) |
            Some(ErrorCode::ServiceNotFound)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.error_code(),
            Some(ErrorCode::ArangoConflict) |
            Some(ErrorCode::ArangoUniqueConstraintViolated) |
            Some(ErrorCode::ArangoDuplicateName)
        )
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ArangoError>;

/// Macro for creating client-side errors
#[macro_export]
macro_rules! arango_error {
    ($kind:expr, $($arg:tt)*) => {
        $crate::common::error::ArangoError::client($kind, format!($($arg)*))
    };
}

/// Macro for early return on a client-side error
#[macro_export]
macro_rules! arango_bail {
    ($kind:expr, $($arg:tt)*) => {
        return Err($crate::arango_error!($kind, $($arg)*))
    };
}

/// Macro for ensuring a condition or returning a client-side error
#[macro_export]
macro_rules! arango_ensure {
    ($cond:expr, $kind:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::arango_bail!($kind, $($arg)*);
        }
    };
}
