use futures::future::join_all;
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use super::fetcher::Fetcher;
use super::manifest::CacheManifest;
use super::storage::{CacheStorage, CachedResponse};
use crate::api::ApiError;

/// Paths served by the backend rather than the app shell
const API_PATH_PREFIXES: &[&str] = &["/rest/v1", "/auth/v1"];

/// Broadcast to every connected client
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Installed { cache_name: String, cached: usize, failed: usize },
    /// A new cache version took over
    Updated { cache_name: String, removed: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub method: String,
    pub url: String,
    /// Top-level document load
    pub navigate: bool,
}

impl AssetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            navigate: false,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            navigate: true,
            ..Self::get(url)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// Not eligible for caching, fetched directly
    Bypass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetResponse {
    pub response: CachedResponse,
    pub source: ResponseSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: usize,
    pub failed: usize,
}

/// Offline cache for the app shell: precache on install, evict old
/// versions on activate, answer requests network-first for the app's own
/// origin and cache-first for third-party assets.
pub struct AssetWorker {
    manifest: CacheManifest,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    api_origin: Option<Url>,
    events: broadcast::Sender<WorkerEvent>,
    write_lock: Mutex<()>,
}

impl AssetWorker {
    pub fn new(
        manifest: CacheManifest,
        storage: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
        app_url: &str,
        api_url: Option<&str>,
    ) -> Result<Self, ApiError> {
        let origin = Url::parse(app_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid app URL '{}': {}", app_url, e)))?;
        let api_origin = api_url.and_then(|url| Url::parse(url).ok());
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            manifest,
            storage,
            fetcher,
            origin,
            api_origin,
            events,
            write_lock: Mutex::new(()),
        })
    }

    pub fn cache_name(&self) -> String {
        self.manifest.cache_name()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }

    fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        self.origin
            .join(url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL '{}': {}", url, e)))
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    /// Cache key: path and query for our own origin, full URL otherwise
    fn cache_key(&self, url: &Url) -> String {
        if self.is_same_origin(url) {
            match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }
        } else {
            url.to_string()
        }
    }

    fn is_api(&self, url: &Url) -> bool {
        if let Some(api) = &self.api_origin {
            if url.origin() == api.origin() {
                return true;
            }
        }
        API_PATH_PREFIXES.iter().any(|prefix| url.path().starts_with(prefix))
    }

    async fn store(&self, key: &str, response: &CachedResponse) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.storage.put(&self.cache_name(), key, response) {
            log::warn!("Failed to cache {}: {}", key, e);
        }
    }

    /// Precache the manifest. Failures are logged and counted, never fatal.
    pub async fn install(&self) -> InstallReport {
        let cache_name = self.cache_name();
        log::info!("Installing offline cache {}", cache_name);

        let fetches = self.manifest.resources.iter().map(|resource| async move {
            let url = self.resolve(resource)?;
            let response = self.fetcher.fetch("GET", url.as_str()).await?;
            if response.status != 200 {
                return Err(ApiError::Backend {
                    status: response.status,
                    code: None,
                    message: format!("{} answered {}", resource, response.status),
                });
            }
            Ok::<_, ApiError>((self.cache_key(&url), response))
        });

        let mut report = InstallReport { cached: 0, failed: 0 };
        for (resource, result) in self.manifest.resources.iter().zip(join_all(fetches).await) {
            match result {
                Ok((key, response)) => {
                    self.store(&key, &response).await;
                    report.cached += 1;
                }
                Err(e) => {
                    log::error!("Cache install error for {}: {}", resource, e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Offline cache {} ready: {} cached, {} failed",
            cache_name,
            report.cached,
            report.failed
        );
        let _ = self.events.send(WorkerEvent::Installed {
            cache_name,
            cached: report.cached,
            failed: report.failed,
        });
        report
    }

    /// Remove other versions of this app's cache and tell clients
    pub async fn activate(&self) -> Result<Vec<String>, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut removed = Vec::new();
        for name in self.storage.cache_names()? {
            if self.manifest.is_stale(&name) {
                log::info!("Deleting old cache: {}", name);
                self.storage.delete_cache(&name)?;
                removed.push(name);
            }
        }

        // no receivers is fine
        let _ = self.events.send(WorkerEvent::Updated {
            cache_name: self.cache_name(),
            removed: removed.clone(),
        });
        Ok(removed)
    }

    pub async fn handle(&self, request: &AssetRequest) -> Result<AssetResponse, ApiError> {
        let url = self.resolve(&request.url)?;

        if !request.method.eq_ignore_ascii_case("GET") || self.is_api(&url) {
            let response = self.fetcher.fetch(&request.method, url.as_str()).await?;
            return Ok(AssetResponse {
                response,
                source: ResponseSource::Bypass,
            });
        }

        if self.is_same_origin(&url) {
            self.network_first(request, &url).await
        } else {
            self.cache_first(&url).await
        }
    }

    async fn network_first(&self, request: &AssetRequest, url: &Url) -> Result<AssetResponse, ApiError> {
        let key = self.cache_key(url);
        match self.fetcher.fetch("GET", url.as_str()).await {
            Ok(response) => {
                if response.status == 200 {
                    self.store(&key, &response).await;
                }
                Ok(AssetResponse {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(e) => {
                log::debug!("Network failed for {}, trying cache: {}", key, e);
                let cache_name = self.cache_name();
                let mut hit = self.storage.lookup(&cache_name, &key)?;
                if hit.is_none() && request.navigate {
                    hit = match self.storage.lookup(&cache_name, "/")? {
                        Some(root) => Some(root),
                        None => self.storage.lookup(&cache_name, "/index.html")?,
                    };
                }
                match hit {
                    Some(response) => Ok(AssetResponse {
                        response,
                        source: ResponseSource::Cache,
                    }),
                    None => Err(e),
                }
            }
        }
    }

    async fn cache_first(&self, url: &Url) -> Result<AssetResponse, ApiError> {
        let key = self.cache_key(url);
        if let Some(response) = self.storage.lookup(&self.cache_name(), &key)? {
            return Ok(AssetResponse {
                response,
                source: ResponseSource::Cache,
            });
        }

        let response = self.fetcher.fetch("GET", url.as_str()).await?;
        if response.status == 200 {
            self.store(&key, &response).await;
        }
        Ok(AssetResponse {
            response,
            source: ResponseSource::Network,
        })
    }
}
