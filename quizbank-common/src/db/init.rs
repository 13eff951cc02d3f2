//! Database initialization
//!
//! Creates the question bank schema on first run and seeds the static lookup
//! tables (subjects, levels, question types). Every step is idempotent, so
//! opening an existing database re-runs the same statements harmlessly.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Subjects seeded into the lookup table (name, description)
pub const SUBJECT_SEEDS: &[(&str, &str)] = &[
    ("history", "History of Mauritius"),
    ("geography", "Geography of Mauritius"),
    ("combined", "Combined History and Geography"),
];

/// Levels seeded into the lookup table (number, name, difficulty)
pub const LEVEL_SEEDS: &[(i64, &str, &str)] = &[
    (1, "Level 1", "Beginner"),
    (2, "Level 2", "Intermediate"),
    (3, "Level 3", "Advanced"),
];

/// Question types seeded into the lookup table (name, description)
pub const QUESTION_TYPE_SEEDS: &[(&str, &str)] = &[
    ("mcq", "Multiple Choice Question"),
    ("matching", "Matching Pairs"),
    ("fill", "Fill in the Blanks"),
    ("reorder", "Put in Order"),
    ("truefalse", "True or False"),
];

/// Open (or create) the database file and bring the schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Pragmas go through connect options so every pooled connection gets them
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    seed_lookup_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema, for tests and dry runs
///
/// Limited to one connection: each SQLite in-memory connection is a
/// separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    seed_lookup_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_lookup_tables(pool).await?;
    create_questions_table(pool).await?;
    create_satellite_tables(pool).await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_questions_subject_level ON questions(subject_id, level_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_type ON questions(question_type_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_lookup_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS levels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            level_number INTEGER NOT NULL UNIQUE CHECK (level_number BETWEEN 1 AND 3),
            name TEXT,
            difficulty TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS question_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_questions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id INTEGER NOT NULL REFERENCES subjects(id),
            level_id INTEGER NOT NULL REFERENCES levels(id),
            question_type_id INTEGER NOT NULL REFERENCES question_types(id),
            question_text TEXT NOT NULL,
            image_url TEXT,
            timer_seconds INTEGER NOT NULL DEFAULT 30,
            created_by TEXT NOT NULL CHECK (created_by IN ('MES', 'MAI', 'MIE')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_satellite_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mcq_options (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            option_order INTEGER NOT NULL CHECK (option_order BETWEEN 1 AND 4),
            option_text TEXT NOT NULL,
            is_correct INTEGER NOT NULL DEFAULT 0,
            UNIQUE(question_id, option_order)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matching_pairs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            pair_order INTEGER NOT NULL,
            left_item TEXT NOT NULL CHECK (left_item <> ''),
            right_item TEXT NOT NULL CHECK (right_item <> ''),
            UNIQUE(question_id, pair_order)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fill_answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            answer_text TEXT NOT NULL,
            case_sensitive INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reorder_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            item_order INTEGER NOT NULL,
            item_text TEXT NOT NULL,
            correct_position INTEGER NOT NULL,
            UNIQUE(question_id, item_order)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS truefalse_answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            correct_answer INTEGER NOT NULL,
            explanation TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the static lookup rows, leaving existing rows untouched
pub async fn seed_lookup_tables(pool: &SqlitePool) -> Result<()> {
    for (name, description) in SUBJECT_SEEDS {
        sqlx::query("INSERT OR IGNORE INTO subjects (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
    }

    for (number, name, difficulty) in LEVEL_SEEDS {
        sqlx::query("INSERT OR IGNORE INTO levels (level_number, name, difficulty) VALUES (?, ?, ?)")
            .bind(number)
            .bind(name)
            .bind(difficulty)
            .execute(pool)
            .await?;
    }

    for (name, description) in QUESTION_TYPE_SEEDS {
        sqlx::query("INSERT OR IGNORE INTO question_types (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
    }

    info!(
        subjects = SUBJECT_SEEDS.len(),
        levels = LEVEL_SEEDS.len(),
        question_types = QUESTION_TYPE_SEEDS.len(),
        "Lookup tables seeded"
    );

    Ok(())
}
