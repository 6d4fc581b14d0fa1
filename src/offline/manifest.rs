pub const CACHE_PREFIX: &str = "g-trade-journal";
pub const DEFAULT_VERSION: &str = "v1.0.9";

/// Shell resources precached on install
pub const SHELL_RESOURCES: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css?v=1.0.2",
    "/app.js?v=1.0.9",
    "/config.js",
    "/logo.png",
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700;800&display=swap",
    "https://fonts.gstatic.com/s/inter/v13/UcC73FwrK3iLTeHuS_fvQtMwCp50KnMa1ZL7W0Q5nw.woff2",
];

/// Versioned list of what the offline cache holds
#[derive(Debug, Clone, PartialEq)]
pub struct CacheManifest {
    pub prefix: String,
    pub version: String,
    pub resources: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

impl CacheManifest {
    pub fn new(version: &str) -> Self {
        Self {
            prefix: CACHE_PREFIX.to_string(),
            version: version.to_string(),
            resources: SHELL_RESOURCES.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// `<prefix>-<version>`
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.prefix, self.version)
    }

    /// Another version of this app's cache
    pub fn is_stale(&self, cache_name: &str) -> bool {
        cache_name.starts_with(&self.prefix) && cache_name != self.cache_name()
    }
}
