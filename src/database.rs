// src/database.rs

use log::debug;
use rusqlite::{Connection, Result};

pub fn init_db(conn: &Connection) -> Result<()> {
    debug!("[DB] init_db: Checking database schema...");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS topic_progress (
            student_id TEXT NOT NULL,
            topic TEXT NOT NULL,
            understanding REAL NOT NULL DEFAULT 0.0,
            quizzes_taken INTEGER NOT NULL DEFAULT 0,
            weak_areas TEXT NOT NULL DEFAULT '[]',
            strong_areas TEXT NOT NULL DEFAULT '[]',
            last_quiz_ts INTEGER,
            PRIMARY KEY (student_id, topic)
        );
        CREATE TABLE IF NOT EXISTS subject_progress (
            student_id TEXT NOT NULL,
            subject TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            score_sum INTEGER NOT NULL DEFAULT 0,
            topics TEXT NOT NULL DEFAULT '[]',
            overall_progress REAL NOT NULL DEFAULT 0.0,
            PRIMARY KEY (student_id, subject)
        );
        CREATE TABLE IF NOT EXISTS quizzes (
            id TEXT PRIMARY KEY,
            topic TEXT NOT NULL,
            questions TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS attempts (
            id TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            subject TEXT NOT NULL,
            score INTEGER NOT NULL,
            total_time_spent INTEGER NOT NULL,
            analysis TEXT NOT NULL,
            submitted_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_attempts_student
            ON attempts (student_id, submitted_at);
        CREATE TABLE IF NOT EXISTS study_plans (
            student_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            day INTEGER NOT NULL,
            topic TEXT NOT NULL,
            task TEXT NOT NULL,
            description TEXT NOT NULL,
            priority TEXT NOT NULL,
            PRIMARY KEY (student_id, position)
        );
        ",
    )?;

    Ok(())
}
