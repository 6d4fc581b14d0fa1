pub mod fetcher;
pub mod manifest;
pub mod storage;
pub mod worker;

pub use fetcher::{Fetcher, HttpFetcher};
pub use manifest::CacheManifest;
pub use storage::{CacheStorage, CachedResponse};
pub use worker::{AssetRequest, AssetResponse, AssetWorker, InstallReport, ResponseSource, WorkerEvent};
