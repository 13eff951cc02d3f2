//! Question and satellite table access
//!
//! Inserts take a connection so they can run inside the caller's
//! per-record transaction.

use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::models::{QuestionType, SatelliteRow};

/// Parent row ready for insertion, foreign keys already resolved
#[derive(Debug, Clone)]
pub struct NewQuestion<'a> {
    pub subject_id: i64,
    pub level_id: i64,
    pub question_type_id: i64,
    pub question_text: &'a str,
    pub image_url: Option<&'a str>,
    pub timer_seconds: i64,
    pub created_by: &'a str,
}

/// Insert the parent question row, returning its id
pub async fn insert_question(conn: &mut SqliteConnection, question: &NewQuestion<'_>) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO questions (
            subject_id, level_id, question_type_id, question_text, image_url,
            timer_seconds, created_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(question.subject_id)
    .bind(question.level_id)
    .bind(question.question_type_id)
    .bind(question.question_text)
    .bind(question.image_url)
    .bind(question.timer_seconds)
    .bind(question.created_by)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert one satellite row keyed to `question_id`
pub async fn insert_satellite_row(
    conn: &mut SqliteConnection,
    question_id: i64,
    row: &SatelliteRow,
) -> sqlx::Result<()> {
    match row {
        SatelliteRow::McqOption { order, text, is_correct } => {
            sqlx::query(
                "INSERT INTO mcq_options (question_id, option_order, option_text, is_correct) VALUES (?, ?, ?, ?)",
            )
            .bind(question_id)
            .bind(order)
            .bind(text)
            .bind(is_correct)
            .execute(conn)
            .await?;
        }
        SatelliteRow::MatchingPair { order, left, right } => {
            sqlx::query(
                "INSERT INTO matching_pairs (question_id, pair_order, left_item, right_item) VALUES (?, ?, ?, ?)",
            )
            .bind(question_id)
            .bind(order)
            .bind(left)
            .bind(right)
            .execute(conn)
            .await?;
        }
        SatelliteRow::FillAnswer { answer, case_sensitive } => {
            sqlx::query(
                "INSERT INTO fill_answers (question_id, answer_text, case_sensitive) VALUES (?, ?, ?)",
            )
            .bind(question_id)
            .bind(answer)
            .bind(case_sensitive)
            .execute(conn)
            .await?;
        }
        SatelliteRow::ReorderItem { order, text, correct_position } => {
            sqlx::query(
                "INSERT INTO reorder_items (question_id, item_order, item_text, correct_position) VALUES (?, ?, ?, ?)",
            )
            .bind(question_id)
            .bind(order)
            .bind(text)
            .bind(correct_position)
            .execute(conn)
            .await?;
        }
        SatelliteRow::TrueFalse { correct, explanation } => {
            sqlx::query(
                "INSERT INTO truefalse_answers (question_id, correct_answer, explanation) VALUES (?, ?, ?)",
            )
            .bind(question_id)
            .bind(correct)
            .bind(explanation)
            .execute(conn)
            .await?;
        }
    }

    Ok(())
}

/// Optional filters for listing questions; `None` matches everything
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub level: Option<i64>,
    pub question_type: Option<String>,
}

/// Question joined with its lookup names and satellite rows
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub subject: String,
    pub level: i64,
    pub question_type: String,
    pub question_text: String,
    pub image_url: Option<String>,
    pub timer_seconds: i64,
    pub created_by: String,
    pub created_at: String,
    pub answers: Vec<SatelliteRow>,
}

/// List questions, newest first
pub async fn list_questions(pool: &SqlitePool, filter: &QuestionFilter) -> sqlx::Result<Vec<QuestionDetail>> {
    let rows = sqlx::query(
        r#"
        SELECT q.id, s.name AS subject, l.level_number, t.name AS question_type,
               q.question_text, q.image_url, q.timer_seconds, q.created_by, q.created_at
        FROM questions q
        JOIN subjects s ON s.id = q.subject_id
        JOIN levels l ON l.id = q.level_id
        JOIN question_types t ON t.id = q.question_type_id
        WHERE (? IS NULL OR LOWER(s.name) = LOWER(?))
          AND (? IS NULL OR l.level_number = ?)
          AND (? IS NULL OR t.name = ?)
        ORDER BY q.created_at DESC, q.id DESC
        "#,
    )
    .bind(&filter.subject)
    .bind(&filter.subject)
    .bind(filter.level)
    .bind(filter.level)
    .bind(&filter.question_type)
    .bind(&filter.question_type)
    .fetch_all(pool)
    .await?;

    let mut questions = Vec::with_capacity(rows.len());
    for row in rows {
        let id: i64 = row.get("id");
        let question_type: String = row.get("question_type");
        let answers = match question_type.parse::<QuestionType>() {
            Ok(t) => load_satellite_rows(pool, id, t).await?,
            Err(_) => Vec::new(),
        };

        questions.push(QuestionDetail {
            id,
            subject: row.get("subject"),
            level: row.get("level_number"),
            question_type,
            question_text: row.get("question_text"),
            image_url: row.get("image_url"),
            timer_seconds: row.get("timer_seconds"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            answers,
        });
    }

    Ok(questions)
}

/// Satellite rows of one question, in stored order
pub async fn load_satellite_rows(
    pool: &SqlitePool,
    question_id: i64,
    question_type: QuestionType,
) -> sqlx::Result<Vec<SatelliteRow>> {
    let rows: Vec<SatelliteRow> = match question_type {
        QuestionType::Mcq => sqlx::query(
            "SELECT option_order, option_text, is_correct FROM mcq_options WHERE question_id = ? ORDER BY option_order",
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| SatelliteRow::McqOption {
            order: r.get("option_order"),
            text: r.get("option_text"),
            is_correct: r.get("is_correct"),
        })
        .collect(),
        QuestionType::Matching => sqlx::query(
            "SELECT pair_order, left_item, right_item FROM matching_pairs WHERE question_id = ? ORDER BY pair_order",
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| SatelliteRow::MatchingPair {
            order: r.get("pair_order"),
            left: r.get("left_item"),
            right: r.get("right_item"),
        })
        .collect(),
        QuestionType::Fill => sqlx::query(
            "SELECT answer_text, case_sensitive FROM fill_answers WHERE question_id = ? ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| SatelliteRow::FillAnswer {
            answer: r.get("answer_text"),
            case_sensitive: r.get("case_sensitive"),
        })
        .collect(),
        QuestionType::Reorder => sqlx::query(
            "SELECT item_order, item_text, correct_position FROM reorder_items WHERE question_id = ? ORDER BY item_order",
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| SatelliteRow::ReorderItem {
            order: r.get("item_order"),
            text: r.get("item_text"),
            correct_position: r.get("correct_position"),
        })
        .collect(),
        QuestionType::TrueFalse => sqlx::query(
            "SELECT correct_answer, explanation FROM truefalse_answers WHERE question_id = ? ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(|r| SatelliteRow::TrueFalse {
            correct: r.get("correct_answer"),
            explanation: r.get("explanation"),
        })
        .collect(),
    };

    Ok(rows)
}

/// Delete a question; satellites go with it by cascade
///
/// Returns false when no question had that id.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
