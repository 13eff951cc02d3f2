//! Media resolver
//!
//! Turns the optional image reference of a record into a locally served one.
//! External http(s) images are downloaded, checked and written to the media
//! store; internal paths, `data:` URIs and local paths pass through as given.
//!
//! Resolution is best effort. Any fetch or storage failure is logged at WARN
//! and the record continues without an image.

use async_trait::async_trait;
use quizbank_common::config::MediaConfig;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Content type assumed when a server omits the header
const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// Media resolver errors
///
/// Never propagated past [`MediaResolver::resolve`].
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Not an image: content type {0:?}")]
    ContentType(String),

    #[error("Image too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// How an image reference is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRefKind {
    /// Blank: no image
    Empty,
    /// Already served by this service
    Internal,
    /// Inline `data:` URI
    DataUri,
    /// http(s) URL to download
    External,
    /// Anything else, e.g. a relative path
    Local,
}

/// Classify an image reference
pub fn classify(reference: &str, public_prefix: &str) -> ImageRefKind {
    let reference = reference.trim();
    if reference.is_empty() {
        ImageRefKind::Empty
    } else if reference.starts_with(public_prefix) {
        ImageRefKind::Internal
    } else if reference.starts_with("data:") {
        ImageRefKind::DataUri
    } else if reference.starts_with("http://") || reference.starts_with("https://") {
        ImageRefKind::External
    } else {
        ImageRefKind::Local
    }
}

/// Downloaded image bytes with their declared content type
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Source of external images
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `url`, giving up once the body exceeds `max_bytes`
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<FetchedImage, MediaError>;
}

/// HTTP fetcher with a per-request timeout and a streamed size ceiling
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quizbank-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MediaError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<FetchedImage, MediaError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        // Declared length lets oversized images fail before any download
        if let Some(size) = response.content_length() {
            if size > max_bytes {
                return Err(MediaError::TooLarge { size, limit: max_bytes });
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::Network(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > max_bytes {
                return Err(MediaError::TooLarge {
                    size: bytes.len() as u64,
                    limit: max_bytes,
                });
            }
        }

        Ok(FetchedImage { content_type, bytes })
    }
}

/// Durable blob sink for stored images
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), MediaError>;

    /// Bytes stored under `name`, `None` when absent
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, MediaError>;

    async fn exists(&self, name: &str) -> bool;

    /// Delete `name`; absent names are not an error
    async fn remove(&self, name: &str) -> Result<(), MediaError>;
}

/// Media store backed by a directory
pub struct FsMediaStore {
    dir: PathBuf,
}

impl FsMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), MediaError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;
        tokio::fs::write(self.dir.join(name), bytes)
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, MediaError> {
        match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaError::Storage(e.to_string())),
        }
    }

    async fn exists(&self, name: &str) -> bool {
        tokio::fs::try_exists(self.dir.join(name))
            .await
            .unwrap_or(false)
    }

    async fn remove(&self, name: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Storage(e.to_string())),
        }
    }
}

/// File extension for a downloaded image's content type
pub fn extension_for(content_type: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();
    if content_type.contains("png") {
        "png"
    } else if content_type.contains("gif") {
        "gif"
    } else if content_type.contains("webp") {
        "webp"
    } else {
        "jpg"
    }
}

/// Content type for serving a stored file, from its extension
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// Final path component of a requested media name, `None` if nothing is left
pub fn sanitize_name(name: &str) -> Option<String> {
    name.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_string)
}

/// Stored name: time-based with a random suffix to avoid collisions
fn generate_name(extension: &str) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!(
        "imported-{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

/// Resolves record image references into locally served ones
pub struct MediaResolver {
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<dyn MediaStore>,
    public_prefix: String,
    max_image_bytes: u64,
}

impl MediaResolver {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<dyn MediaStore>,
        config: &MediaConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            public_prefix: config.public_prefix.clone(),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// HTTP fetcher plus a directory store under `media_dir`
    pub fn with_defaults(media_dir: PathBuf, config: &MediaConfig) -> Result<Self, MediaError> {
        let fetcher = HttpImageFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(FsMediaStore::new(media_dir)),
            config,
        ))
    }

    pub fn store(&self) -> &Arc<dyn MediaStore> {
        &self.store
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Resolve one image reference
    ///
    /// Returns the reference to persist, or `None` for no image. Never fails.
    pub async fn resolve(&self, reference: Option<&str>) -> Option<String> {
        let reference = reference.map(str::trim).unwrap_or_default();

        match classify(reference, &self.public_prefix) {
            ImageRefKind::Empty => None,
            ImageRefKind::Internal | ImageRefKind::DataUri | ImageRefKind::Local => {
                Some(reference.to_string())
            }
            ImageRefKind::External => match self.import_external(reference).await {
                Ok(stored) => {
                    tracing::info!(url = %reference, stored = %stored, "External image stored");
                    Some(stored)
                }
                Err(e) => {
                    tracing::warn!(url = %reference, error = %e, "External image skipped, continuing without image");
                    None
                }
            },
        }
    }

    /// Delete an image that [`resolve`](Self::resolve) downloaded for a
    /// record that was then not persisted
    ///
    /// Only acts when `original` was an external URL, so images that were
    /// already served before the import are never touched.
    pub async fn discard(&self, original: Option<&str>, resolved: &str) {
        let original = original.map(str::trim).unwrap_or_default();
        if classify(original, &self.public_prefix) != ImageRefKind::External {
            return;
        }
        let Some(name) = resolved.strip_prefix(self.public_prefix.as_str()) else {
            return;
        };

        match self.store.remove(name).await {
            Ok(()) => tracing::debug!(stored = %resolved, "Unreferenced image removed"),
            Err(e) => tracing::warn!(stored = %resolved, error = %e, "Failed to remove unreferenced image"),
        }
    }

    async fn import_external(&self, url: &str) -> Result<String, MediaError> {
        let image = self.fetcher.fetch(url, self.max_image_bytes).await?;

        if !image.content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(MediaError::ContentType(image.content_type));
        }

        let size = image.bytes.len() as u64;
        if size > self.max_image_bytes {
            return Err(MediaError::TooLarge {
                size,
                limit: self.max_image_bytes,
            });
        }

        let name = generate_name(extension_for(&image.content_type));
        self.store.write(&name, &image.bytes).await?;

        Ok(format!("{}{}", self.public_prefix, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fetcher returning a canned result and counting calls
    struct CannedFetcher {
        content_type: &'static str,
        size: usize,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CannedFetcher {
        fn image(content_type: &'static str, size: usize) -> Self {
            Self {
                content_type,
                size,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn unreachable() -> Self {
            Self {
                fail: true,
                ..Self::image("image/png", 0)
            }
        }
    }

    #[async_trait]
    impl ImageFetcher for CannedFetcher {
        async fn fetch(&self, _url: &str, _max_bytes: u64) -> Result<FetchedImage, MediaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MediaError::Network("connection refused".to_string()));
            }
            Ok(FetchedImage {
                content_type: self.content_type.to_string(),
                bytes: vec![0u8; self.size],
            })
        }
    }

    fn resolver(fetcher: Arc<CannedFetcher>, dir: &TempDir) -> MediaResolver {
        MediaResolver::new(
            fetcher,
            Arc::new(FsMediaStore::new(dir.path())),
            &MediaConfig::default(),
        )
    }

    #[test]
    fn test_classify() {
        let prefix = "/api/images/";
        assert_eq!(classify("  ", prefix), ImageRefKind::Empty);
        assert_eq!(classify("/api/images/a.png", prefix), ImageRefKind::Internal);
        assert_eq!(classify("data:image/png;base64,AAAA", prefix), ImageRefKind::DataUri);
        assert_eq!(classify("https://example.com/a.png", prefix), ImageRefKind::External);
        assert_eq!(classify("http://example.com/a.png", prefix), ImageRefKind::External);
        assert_eq!(classify("images/a.png", prefix), ImageRefKind::Local);
    }

    #[test]
    fn test_extension_and_content_type() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/GIF"), "gif");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/bmp"), "jpg");

        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.svg"), "image/svg+xml");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "image/jpeg");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_name("a.png").as_deref(), Some("a.png"));
        assert_eq!(sanitize_name("dir\\b.png").as_deref(), Some("b.png"));
        assert_eq!(sanitize_name(".."), None);
        assert_eq!(sanitize_name("dir/"), None);
    }

    #[test]
    fn test_generated_name_shape() {
        let name = generate_name("png");
        assert!(name.starts_with("imported-"));
        assert!(name.ends_with(".png"));
        assert_ne!(generate_name("png"), generate_name("png"));
    }

    #[tokio::test]
    async fn test_pass_through_does_no_io() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(CannedFetcher::image("image/png", 10));
        let resolver = resolver(fetcher.clone(), &dir);

        assert_eq!(resolver.resolve(None).await, None);
        assert_eq!(resolver.resolve(Some("  ")).await, None);
        assert_eq!(
            resolver.resolve(Some("/api/images/x.png")).await.as_deref(),
            Some("/api/images/x.png")
        );
        assert_eq!(
            resolver.resolve(Some("data:image/png;base64,AA")).await.as_deref(),
            Some("data:image/png;base64,AA")
        );
        assert_eq!(
            resolver.resolve(Some("maps/island.png")).await.as_deref(),
            Some("maps/island.png")
        );
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_external_image_is_stored() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(Arc::new(CannedFetcher::image("image/png", 128)), &dir);

        let stored = resolver
            .resolve(Some("https://example.com/dodo.png"))
            .await
            .expect("stored reference");

        assert!(stored.starts_with("/api/images/imported-"));
        assert!(stored.ends_with(".png"));
        let name = stored.trim_start_matches("/api/images/");
        assert!(resolver.store().exists(name).await);
        assert_eq!(resolver.store().read(name).await.unwrap().unwrap().len(), 128);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_no_image() {
        let dir = TempDir::new().unwrap();

        let not_image = resolver(Arc::new(CannedFetcher::image("text/html", 10)), &dir);
        assert_eq!(not_image.resolve(Some("https://example.com/page")).await, None);

        let oversized = resolver(
            Arc::new(CannedFetcher::image("image/jpeg", 5 * 1024 * 1024 + 1)),
            &dir,
        );
        assert_eq!(oversized.resolve(Some("https://example.com/big.jpg")).await, None);

        let unreachable = resolver(Arc::new(CannedFetcher::unreachable()), &dir);
        assert_eq!(unreachable.resolve(Some("https://unreachable.invalid/a.png")).await, None);

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none(), "nothing should be stored");
    }

    #[tokio::test]
    async fn test_discard_only_removes_downloaded_images() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(Arc::new(CannedFetcher::image("image/png", 8)), &dir);

        resolver.store().write("existing.png", &[1, 2]).await.unwrap();
        resolver
            .discard(Some("/api/images/existing.png"), "/api/images/existing.png")
            .await;
        assert!(resolver.store().exists("existing.png").await);

        let url = "https://example.com/dodo.png";
        let stored = resolver.resolve(Some(url)).await.unwrap();
        let name = stored.trim_start_matches("/api/images/").to_string();
        assert!(resolver.store().exists(&name).await);

        resolver.discard(Some(url), &stored).await;
        assert!(!resolver.store().exists(&name).await);

        // Second removal of the same name is harmless
        resolver.discard(Some(url), &stored).await;
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FsMediaStore::new(dir.path());
        assert!(store.read("absent.png").await.unwrap().is_none());
        assert!(!store.exists("absent.png").await);
    }
}
