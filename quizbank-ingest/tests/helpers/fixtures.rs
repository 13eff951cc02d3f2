//! Pipeline fixtures
//!
//! In-memory database, a stub image fetcher and raw record builders.

use async_trait::async_trait;
use quizbank_common::config::MediaConfig;
use quizbank_common::db::init_memory_database;
use quizbank_ingest::models::RawRecord;
use quizbank_ingest::services::media_resolver::FetchedImage;
use quizbank_ingest::services::{BatchImporter, FsMediaStore, ImageFetcher, MediaError, MediaResolver};
use quizbank_ingest::AppState;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Image fetcher answering every URL the same way
pub struct StubFetcher {
    pub content_type: String,
    pub size: usize,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn png(size: usize) -> Arc<Self> {
        Arc::new(Self {
            content_type: "image/png".to_string(),
            size,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            content_type: String::new(),
            size: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, _url: &str, _max_bytes: u64) -> Result<FetchedImage, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MediaError::Network("connection refused".to_string()));
        }
        Ok(FetchedImage {
            content_type: self.content_type.clone(),
            bytes: vec![7u8; self.size],
        })
    }
}

fn resolver(fetcher: Arc<StubFetcher>, media_dir: &TempDir) -> MediaResolver {
    MediaResolver::new(
        fetcher,
        Arc::new(FsMediaStore::new(media_dir.path())),
        &MediaConfig::default(),
    )
}

/// Importer over a fresh in-memory database
///
/// Returns (TempDir, SqlitePool, BatchImporter) - TempDir holds stored media
/// and must be kept alive for the duration of the test.
pub async fn test_importer(fetcher: Arc<StubFetcher>) -> (TempDir, SqlitePool, BatchImporter) {
    let media_dir = TempDir::new().unwrap();
    let pool = init_memory_database().await.unwrap();
    let importer = BatchImporter::new(pool.clone(), Arc::new(resolver(fetcher, &media_dir)), 10);
    (media_dir, pool, importer)
}

/// Router state over a fresh in-memory database
pub async fn test_app_state(fetcher: Arc<StubFetcher>) -> (TempDir, AppState) {
    let media_dir = TempDir::new().unwrap();
    let pool = init_memory_database().await.unwrap();
    let state = AppState::new(pool, resolver(fetcher, &media_dir), 10);
    (media_dir, state)
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn base(question_type: &str, question: &str) -> RawRecord {
    RawRecord::new()
        .with("subject", "history")
        .with("level", 1)
        .with("type", question_type)
        .with("question", question)
}

/// Valid mcq whose correct answer is option B
pub fn mcq_record(question: &str) -> RawRecord {
    base("mcq", question)
        .with("optionA", "1810")
        .with("optionB", "1968")
        .with("optionC", "1992")
        .with("optionD", "1715")
        .with("correctAnswer", "1968")
}

/// Matching with pairs 1 and 2 complete, pair 3 left-only, pair 4 empty
pub fn matching_record() -> RawRecord {
    base("matching", "Match each place with its district")
        .with("leftItem1", "Le Morne")
        .with("rightItem1", "Black River")
        .with("leftItem2", "Mahebourg")
        .with("rightItem2", "Grand Port")
        .with("leftItem3", "Curepipe")
}

pub fn fill_record(question: &str) -> RawRecord {
    base("fill", question).with("answer", "Port Louis")
}

pub fn reorder_record(steps: &[&str]) -> RawRecord {
    let mut record = base("reorder", "Put these events in order");
    for (i, step) in steps.iter().enumerate() {
        record = record.with(&format!("step{}", i + 1), *step);
    }
    record
}

pub fn truefalse_record(flag: &str) -> RawRecord {
    base("truefalse", "The dodo was native to Mauritius").with("isTrue", flag)
}
