pub mod aql;
pub mod collection;
pub mod cursor;
pub mod database;
pub mod executor;
pub mod foxx;
pub mod index;
pub mod job;
pub mod types;

pub use aql::{Aql, ExplainOptions, QueryOptions};
pub use collection::{
    Collection, ConfigureOptions, DeleteOptions, ImportOptions, InsertOptions, OnDuplicate, OverwriteMode,
    ReadOptions, ReplaceOptions, UpdateOptions,
};
pub use cursor::{Cursor, CursorStatistics};
pub use database::{CollectionOptions, Database, LogOptions, TaskOptions, TransactionOptions, UserOptions};
pub use executor::{
    ApiExecutor, AsyncExecutor, DefaultExecutor, ExecutionContext, FireAndForgetExecutor, TransactionExecutor,
};
pub use foxx::{Foxx, ServiceOptions};
pub use index::IndexOptions;
pub use job::{AsyncJob, JobStatus};
pub use types::{
    CollectionInfo, CollectionType, DatabaseProperties, ImportResult, IndexInfo, LogEntries, Permission, QueryInfo,
    ServerVersion, ServiceInfo, TaskInfo, TransactionStatus, UserInfo,
};
