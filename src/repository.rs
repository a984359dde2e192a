// src/repository.rs

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttemptAnalysis, PerformanceProfile, Priority, Question, Quiz, QuizAttempt, StudyPlanItem,
    SubjectProgress, TaskKind, TopicProgress,
};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;

fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

// --- Performance Profile ---

/// Loads every topic and subject row for a student. Unknown students get an empty profile.
pub fn load_profile(conn: &Connection, student_id: &str) -> EngineResult<PerformanceProfile> {
    let mut profile = PerformanceProfile::new(student_id);

    let mut stmt = conn.prepare(
        "SELECT topic, understanding, quizzes_taken, weak_areas, strong_areas, last_quiz_ts
         FROM topic_progress
         WHERE student_id = ?",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<i64>>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (topic, understanding, quizzes_taken, weak, strong, last_ts) in rows {
        let progress = TopicProgress {
            topic: topic.clone(),
            understanding,
            quizzes_taken,
            weak_areas: serde_json::from_str::<BTreeSet<String>>(&weak)?,
            strong_areas: serde_json::from_str::<BTreeSet<String>>(&strong)?,
            last_quiz_date: last_ts.map(from_ts),
        };
        profile.topics.insert(topic, progress);
    }

    let mut stmt = conn.prepare(
        "SELECT subject, attempts, score_sum, topics, overall_progress
         FROM subject_progress
         WHERE student_id = ?",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (subject, attempts, score_sum, topics, overall_progress) in rows {
        let progress = SubjectProgress {
            subject: subject.clone(),
            attempts,
            score_sum: score_sum.max(0) as u64,
            topics: serde_json::from_str(&topics)?,
            overall_progress,
        };
        profile.subjects.insert(subject, progress);
    }

    debug!(
        "[DB] Loaded profile {}: {} topic(s), {} subject(s)",
        student_id,
        profile.topics.len(),
        profile.subjects.len()
    );
    Ok(profile)
}

/// Upserts every topic and subject row. Topics are never deleted.
pub fn save_profile(conn: &Connection, profile: &PerformanceProfile) -> EngineResult<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO topic_progress
         (student_id, topic, understanding, quizzes_taken, weak_areas, strong_areas, last_quiz_ts)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )?;
    for progress in profile.topics.values() {
        stmt.execute(params![
            profile.student_id,
            progress.topic,
            progress.understanding,
            progress.quizzes_taken,
            serde_json::to_string(&progress.weak_areas)?,
            serde_json::to_string(&progress.strong_areas)?,
            progress.last_quiz_date.map(|d| d.timestamp()),
        ])?;
    }

    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO subject_progress
         (student_id, subject, attempts, score_sum, topics, overall_progress)
         VALUES (?, ?, ?, ?, ?, ?)",
    )?;
    for progress in profile.subjects.values() {
        stmt.execute(params![
            profile.student_id,
            progress.subject,
            progress.attempts,
            progress.score_sum as i64,
            serde_json::to_string(&progress.topics)?,
            progress.overall_progress,
        ])?;
    }

    debug!("[DB] Saved profile {}", profile.student_id);
    Ok(())
}

// --- Quizzes ---

pub fn save_quiz(conn: &Connection, quiz: &Quiz) -> EngineResult<()> {
    conn.execute(
        "INSERT INTO quizzes (id, topic, questions, created_at) VALUES (?, ?, ?, ?)",
        params![
            quiz.id,
            quiz.topic,
            serde_json::to_string(&quiz.questions)?,
            quiz.created_at.timestamp()
        ],
    )?;
    Ok(())
}

pub fn load_quiz(conn: &Connection, quiz_id: &str) -> EngineResult<Option<Quiz>> {
    let row = conn
        .query_row(
            "SELECT id, topic, questions, created_at FROM quizzes WHERE id = ?",
            [quiz_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, topic, questions, created_at)) => Ok(Some(Quiz {
            id,
            topic,
            questions: serde_json::from_str::<Vec<Question>>(&questions)?,
            created_at: from_ts(created_at),
        })),
        None => Ok(None),
    }
}

// --- Attempts ---

pub fn record_attempt(conn: &Connection, attempt: &QuizAttempt) -> EngineResult<()> {
    conn.execute(
        "INSERT INTO attempts (id, quiz_id, student_id, subject, score, total_time_spent, analysis, submitted_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            attempt.id,
            attempt.quiz_id,
            attempt.student_id,
            attempt.subject,
            attempt.score,
            attempt.total_time_spent as i64,
            serde_json::to_string(&attempt.analysis)?,
            attempt.submitted_at.timestamp()
        ],
    )?;
    Ok(())
}

/// Attempts for a student, oldest first.
pub fn list_attempts(conn: &Connection, student_id: &str) -> EngineResult<Vec<QuizAttempt>> {
    let mut stmt = conn.prepare(
        "SELECT id, quiz_id, subject, score, total_time_spent, analysis, submitted_at
         FROM attempts
         WHERE student_id = ?
         ORDER BY submitted_at ASC, rowid ASC",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u8>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(
            |(id, quiz_id, subject, score, total_time_spent, analysis, submitted_at)|
             -> EngineResult<QuizAttempt> {
                Ok(QuizAttempt {
                    id,
                    quiz_id,
                    student_id: student_id.to_string(),
                    subject,
                    score,
                    total_time_spent: total_time_spent.max(0) as u64,
                    analysis: serde_json::from_str::<AttemptAnalysis>(&analysis)?,
                    submitted_at: from_ts(submitted_at),
                })
            },
        )
        .collect()
}

// --- Study Plans ---

/// Discards the student's previous plan and stores `plan` in its place.
pub fn replace_study_plan(
    conn: &Connection,
    student_id: &str,
    plan: &[StudyPlanItem],
) -> EngineResult<()> {
    let removed = conn.execute("DELETE FROM study_plans WHERE student_id = ?", [student_id])?;

    let mut stmt = conn.prepare(
        "INSERT INTO study_plans (student_id, position, day, topic, task, description, priority)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )?;
    for (position, item) in plan.iter().enumerate() {
        stmt.execute(params![
            student_id,
            position as i64,
            item.day,
            item.topic,
            item.task.as_str(),
            item.description,
            item.priority.as_str(),
        ])?;
    }

    debug!(
        "[DB] Replaced plan for {}: {} old row(s), {} new",
        student_id,
        removed,
        plan.len()
    );
    Ok(())
}

pub fn load_study_plan(conn: &Connection, student_id: &str) -> EngineResult<Vec<StudyPlanItem>> {
    let mut stmt = conn.prepare(
        "SELECT day, topic, task, description, priority
         FROM study_plans
         WHERE student_id = ?
         ORDER BY position ASC",
    )?;
    let rows = stmt
        .query_map([student_id], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(day, topic, task, description, priority)| -> EngineResult<StudyPlanItem> {
            Ok(StudyPlanItem {
                day,
                topic,
                task: TaskKind::parse(&task)
                    .ok_or_else(|| EngineError::Corrupt(format!("task '{}'", task)))?,
                description,
                priority: Priority::parse(&priority)
                    .ok_or_else(|| EngineError::Corrupt(format!("priority '{}'", priority)))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use crate::models::{Difficulty, GradedAnswer};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn test_unknown_student_loads_empty_profile() {
        let profile = load_profile(&conn(), "nobody").unwrap();
        assert_eq!(profile, PerformanceProfile::new("nobody"));
    }

    #[test]
    fn test_profile_survives_save_and_load() {
        let conn = conn();
        let mut profile = PerformanceProfile::new("s1");
        let arrays = profile.topic_mut("Arrays");
        arrays.understanding = 40.0;
        arrays.quizzes_taken = 3;
        arrays.strong_areas.insert("Arrays".into());
        arrays.weak_areas.insert("Graphs".into());
        arrays.last_quiz_date = Some(from_ts(1_700_000_000));
        let mut dsa = SubjectProgress::new("DSA");
        dsa.attempts = 2;
        dsa.score_sum = 150;
        dsa.topics.insert("Arrays".into());
        dsa.overall_progress = 50.5;
        profile.subjects.insert("DSA".into(), dsa);

        save_profile(&conn, &profile).unwrap();
        let loaded = load_profile(&conn, "s1").unwrap();
        assert_eq!(loaded, profile);
        assert_eq!(loaded.overall_growth(), 40.0);

        // Other students are untouched
        assert!(load_profile(&conn, "s2").unwrap().topics.is_empty());
    }

    #[test]
    fn test_quiz_and_attempt_storage() {
        let conn = conn();
        let quiz = Quiz::new(
            "DSA",
            vec![Question {
                id: "q1".into(),
                text: "Which is O(1)?".into(),
                options: vec!["Hash lookup".into(), "Linear scan".into()],
                correct_answer: "Hash lookup".into(),
                topic: "Hashing".into(),
                difficulty: Difficulty::Easy,
                confidence: 0.9,
            }],
        );
        save_quiz(&conn, &quiz).unwrap();

        let loaded = load_quiz(&conn, &quiz.id).unwrap().unwrap();
        assert_eq!(loaded.questions, quiz.questions);
        assert_eq!(loaded.created_at.timestamp(), quiz.created_at.timestamp());
        assert!(load_quiz(&conn, "missing").unwrap().is_none());

        let analysis = AttemptAnalysis {
            score: 100,
            strengths: vec!["Hashing".into()],
            weaknesses: Vec::new(),
            recommended_topics: Vec::new(),
            difficulty_suggestion: Difficulty::Hard,
            understanding_level: 100,
            correct_count: 1,
            answered_count: 1,
            topic_results: Vec::new(),
            answers: vec![GradedAnswer {
                question_id: "q1".into(),
                topic: "Hashing".into(),
                student_answer: "Hash lookup".into(),
                is_correct: true,
                time_spent_seconds: 12,
            }],
        };
        let attempt = QuizAttempt::record(&quiz, "s1", analysis);
        record_attempt(&conn, &attempt).unwrap();

        let attempts = list_attempts(&conn, "s1").unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].id, attempt.id);
        assert_eq!(attempts[0].total_time_spent, 12);
        assert_eq!(attempts[0].answers(), attempt.answers());
    }

    #[test]
    fn test_study_plan_is_replaced() {
        let conn = conn();
        let item = |day: u32, topic: &str| StudyPlanItem {
            day,
            topic: topic.to_string(),
            task: TaskKind::Learn,
            description: format!("Learn the fundamentals of {}", topic),
            priority: Priority::High,
        };

        replace_study_plan(&conn, "s1", &[item(1, "Arrays"), item(2, "Graphs")]).unwrap();
        replace_study_plan(&conn, "s1", &[item(1, "Heaps")]).unwrap();

        assert_eq!(load_study_plan(&conn, "s1").unwrap(), vec![item(1, "Heaps")]);
    }

    #[test]
    fn test_corrupt_plan_row_is_reported() {
        let conn = conn();
        conn.execute(
            "INSERT INTO study_plans VALUES ('s1', 0, 1, 'Arrays', 'nap', 'Sleep', 'high')",
            [],
        )
        .unwrap();
        assert!(matches!(
            load_study_plan(&conn, "s1"),
            Err(EngineError::Corrupt(_))
        ));
    }
}
