//! Blob Proxy - A read-through cache in front of a MinIO / S3 bucket
//!
//! Serves files from an in-memory cache with sliding TTL expiration and
//! falls back to the object store on a miss.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use fetch::FetchThrough;
pub use tasks::{spawn_sweeper, SweepConfig, SweeperHandle};
