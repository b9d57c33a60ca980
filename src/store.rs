use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::StoreConfig;
use crate::db::PgStore;
use crate::error::FetchError;

/// Read-only access to a hierarchical JSON key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Value>, FetchError>;
}

pub type StoreHandle = Arc<dyn KeyValueStore>;

/// Opens the backend named by the configured URL scheme.
pub async fn open_store(config: &StoreConfig) -> Result<StoreHandle, FetchError> {
    let url = config.url.as_str();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(Arc::new(HttpStore::new(url, config.auth.clone())))
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(Arc::new(PgStore::connect(url).await?))
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(Arc::new(FileStore::new(path)))
    }
}

/// Realtime-database style REST backend: `GET {base}/{path}.json`.
pub struct HttpStore {
    base_url: String,
    auth: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: &str, auth: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            client,
        }
    }

    fn path_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl KeyValueStore for HttpStore {
    #[instrument(name = "store_http_get", skip(self))]
    async fn get(&self, path: &str) -> Result<Option<Value>, FetchError> {
        let mut request = self.client.get(self.path_url(path));
        if let Some(token) = &self.auth {
            request = request.query(&[("auth", token.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let value: Value = response.json().await?;
        debug!(%status, "store responded");
        Ok(non_null(value))
    }
}

/// A JSON document on disk; nested object keys are the path segments.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, FetchError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let document: Value = serde_json::from_str(&raw)?;
        Ok(lookup(&document, path).cloned().and_then(non_null))
    }
}

/// In-process store keyed by full path.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    entries: std::collections::HashMap<String, Value>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_entry(mut self, path: &str, value: Value) -> Self {
        self.entries.insert(path.trim_matches('/').to_string(), value);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, FetchError> {
        Ok(self
            .entries
            .get(path.trim_matches('/'))
            .cloned()
            .and_then(non_null))
    }
}

pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |node, segment| node.get(segment))
}

fn non_null(value: Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn lookup_walks_nested_keys() {
        let document = json!({ "config": { "classes": { "classData": { "1B": ["ALI"] } } } });
        assert_eq!(
            lookup(&document, "config/classes/classData"),
            Some(&json!({ "1B": ["ALI"] }))
        );
        assert_eq!(lookup(&document, "config/missing"), None);
    }

    #[test]
    fn http_paths_end_in_json() {
        let store = HttpStore::new("https://example.test/", None);
        assert_eq!(
            store.path_url("/config/classes/classData"),
            "https://example.test/config/classes/classData.json"
        );
    }

    #[tokio::test]
    async fn file_store_reads_nested_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"config": {{"classes": {{"classData": {{"2C": ["Abu"]}}}}}}}}"#).unwrap();
        let store = FileStore::new(file.path());

        let value = store.get("config/classes/classData").await.unwrap();
        assert_eq!(value, Some(json!({ "2C": ["Abu"] })));
        assert_eq!(store.get("config/other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let store = FileStore::new("/nonexistent/roster.json");
        assert!(matches!(store.get("config").await, Err(FetchError::Io(_))));
    }

    #[tokio::test]
    async fn memory_store_treats_null_as_absent() {
        let store = MemoryStore::default()
            .with_entry("a/b", json!(null))
            .with_entry("a/c", json!(1));
        assert_eq!(store.get("a/b").await.unwrap(), None);
        assert_eq!(store.get("/a/c").await.unwrap(), Some(json!(1)));
    }
}
