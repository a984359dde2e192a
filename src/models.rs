// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// --- Questions & Quizzes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate question as produced by a pool provider. Never mutated by the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Generator quality score in [0, 1].
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub topic: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(topic: &str, questions: Vec<Question>) -> Self {
        Quiz {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            questions,
            created_at: Utc::now(),
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

// --- Attempts ---

/// Raw answer as submitted by the student. Carries no correctness flag.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub student_answer: String,
    #[serde(default)]
    pub time_spent_seconds: u32,
}

/// An answer matched to a quiz question, with correctness derived by the analyzer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_id: String,
    pub topic: String,
    pub student_answer: String,
    pub is_correct: bool,
    pub time_spent_seconds: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicResult {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

impl TopicResult {
    pub fn correct_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnalysis {
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommended_topics: Vec<String>,
    /// Advisory only; not persisted on the profile.
    pub difficulty_suggestion: Difficulty,
    pub understanding_level: u8,
    pub correct_count: u32,
    pub answered_count: u32,
    pub topic_results: Vec<TopicResult>,
    pub answers: Vec<GradedAnswer>,
}

impl AttemptAnalysis {
    pub fn is_strength(&self, topic: &str) -> bool {
        self.strengths.iter().any(|t| t == topic)
    }

    /// Every topic classified by this attempt, strengths first.
    pub fn topics(&self) -> impl Iterator<Item = &String> {
        self.strengths.iter().chain(self.weaknesses.iter())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub subject: String,
    pub score: u8,
    pub total_time_spent: u64,
    pub analysis: AttemptAnalysis,
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn record(quiz: &Quiz, student_id: &str, analysis: AttemptAnalysis) -> Self {
        let total_time_spent = analysis
            .answers
            .iter()
            .map(|a| a.time_spent_seconds as u64)
            .sum();

        QuizAttempt {
            id: uuid::Uuid::new_v4().to_string(),
            quiz_id: quiz.id.clone(),
            student_id: student_id.to_string(),
            subject: quiz.topic.clone(),
            score: analysis.score,
            total_time_spent,
            analysis,
            submitted_at: Utc::now(),
        }
    }

    pub fn answers(&self) -> &[GradedAnswer] {
        &self.analysis.answers
    }
}

// --- Performance Profile ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub topic: String,
    /// Mastery in [0, 100].
    pub understanding: f64,
    pub quizzes_taken: u32,
    pub weak_areas: BTreeSet<String>,
    pub strong_areas: BTreeSet<String>,
    pub last_quiz_date: Option<DateTime<Utc>>,
}

impl TopicProgress {
    pub fn new(topic: &str) -> Self {
        TopicProgress {
            topic: topic.to_string(),
            understanding: 0.0,
            quizzes_taken: 0,
            weak_areas: BTreeSet::new(),
            strong_areas: BTreeSet::new(),
            last_quiz_date: None,
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.understanding / 100.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub subject: String,
    pub attempts: u32,
    pub score_sum: u64,
    pub topics: BTreeSet<String>,
    pub overall_progress: f64,
}

impl SubjectProgress {
    pub fn new(subject: &str) -> Self {
        SubjectProgress {
            subject: subject.to_string(),
            attempts: 0,
            score_sum: 0,
            topics: BTreeSet::new(),
            overall_progress: 0.0,
        }
    }

    pub fn quiz_history_average(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.score_sum as f64 / self.attempts as f64
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceProfile {
    pub student_id: String,
    pub topics: BTreeMap<String, TopicProgress>,
    pub subjects: BTreeMap<String, SubjectProgress>,
}

impl PerformanceProfile {
    pub fn new(student_id: &str) -> Self {
        PerformanceProfile {
            student_id: student_id.to_string(),
            topics: BTreeMap::new(),
            subjects: BTreeMap::new(),
        }
    }

    /// Mean understanding across all topics. Always derived, never stored.
    pub fn overall_growth(&self) -> f64 {
        mean(self.topics.values().map(|t| t.understanding))
    }

    pub fn topic_mut(&mut self, topic: &str) -> &mut TopicProgress {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicProgress::new(topic))
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// --- Study Plan ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Learn,
    Practice,
    Advance,
    Review,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Learn => "learn",
            TaskKind::Practice => "practice",
            TaskKind::Advance => "advance",
            TaskKind::Review => "review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "learn" => Some(TaskKind::Learn),
            "practice" => Some(TaskKind::Practice),
            "advance" => Some(TaskKind::Advance),
            "review" => Some(TaskKind::Review),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanItem {
    pub day: u32,
    pub topic: String,
    pub task: TaskKind,
    pub description: String,
    pub priority: Priority,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct StudyBudget {
    pub hours_per_week: u32,
    pub block_minutes: u32,
    pub horizon_weeks: u32,
}
