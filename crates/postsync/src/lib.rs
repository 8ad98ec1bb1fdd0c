pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod remote;
pub mod retry;
pub mod store;
pub mod worker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, Config, RetryConfig};
pub use db::Database;
pub use error::{ConfigError, PostsyncError, Result};
pub use remote::{EnrichmentPayload, HttpRemote, RemoteError, RemoteSource};
pub use retry::{RetryAttempt, RetryPolicy};
pub use store::{RecordStore, SqliteStore, StoreError};
pub use worker::{PassEvent, PassReporter, Reconciler};
