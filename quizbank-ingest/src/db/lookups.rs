//! Lookup table access (subjects, levels, question types)
//!
//! Lookup rows are seeded at startup and only read during import.

use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub id: i64,
    pub level_number: i64,
    pub name: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionTypeRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Subject id by name, case-insensitive exact match
pub async fn find_subject_id(conn: &mut SqliteConnection, name: &str) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar("SELECT id FROM subjects WHERE LOWER(name) = LOWER(?)")
        .bind(name)
        .fetch_optional(conn)
        .await
}

/// Level id by level number
pub async fn find_level_id(conn: &mut SqliteConnection, level_number: i64) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar("SELECT id FROM levels WHERE level_number = ?")
        .bind(level_number)
        .fetch_optional(conn)
        .await
}

/// Question type id by tag
pub async fn find_question_type_id(conn: &mut SqliteConnection, name: &str) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar("SELECT id FROM question_types WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await
}

pub async fn list_subjects(pool: &SqlitePool) -> sqlx::Result<Vec<Subject>> {
    let rows = sqlx::query("SELECT id, name, description FROM subjects ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| Subject {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
        })
        .collect())
}

pub async fn list_levels(pool: &SqlitePool) -> sqlx::Result<Vec<Level>> {
    let rows = sqlx::query("SELECT id, level_number, name, difficulty FROM levels ORDER BY level_number")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| Level {
            id: row.get("id"),
            level_number: row.get("level_number"),
            name: row.get("name"),
            difficulty: row.get("difficulty"),
        })
        .collect())
}

pub async fn list_question_types(pool: &SqlitePool) -> sqlx::Result<Vec<QuestionTypeRow>> {
    let rows = sqlx::query("SELECT id, name, description FROM question_types ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| QuestionTypeRow {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
        })
        .collect())
}
