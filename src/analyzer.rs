// src/analyzer.rs

use crate::constants::*;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttemptAnalysis, Difficulty, GradedAnswer, Quiz, SubmittedAnswer, TopicResult};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

/// Grades `answers` against `quiz` and classifies each topic as strength or weakness.
///
/// Correctness is always derived from the quiz's `correct_answer`. Answers whose
/// `question_id` is not in the quiz are ignored, as are repeat answers to an
/// already-answered question (the first one counts).
pub fn analyze(quiz: &Quiz, answers: &[SubmittedAnswer]) -> EngineResult<AttemptAnalysis> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut graded: Vec<GradedAnswer> = Vec::with_capacity(answers.len());
    let mut tally: BTreeMap<&str, TopicResult> = BTreeMap::new();

    for answer in answers {
        let Some(question) = quiz.question(&answer.question_id) else {
            debug!(
                "[Analyze] Ignoring answer for unknown question {} on quiz {}",
                answer.question_id, quiz.id
            );
            continue;
        };
        if !seen.insert(question.id.as_str()) {
            debug!("[Analyze] Ignoring repeat answer for {}", question.id);
            continue;
        }

        let is_correct = answer.student_answer.trim() == question.correct_answer.trim();
        let entry = tally
            .entry(question.topic.as_str())
            .or_insert_with(|| TopicResult {
                topic: question.topic.clone(),
                correct: 0,
                total: 0,
            });
        entry.total += 1;
        if is_correct {
            entry.correct += 1;
        }

        graded.push(GradedAnswer {
            question_id: question.id.clone(),
            topic: question.topic.clone(),
            student_answer: answer.student_answer.clone(),
            is_correct,
            time_spent_seconds: answer.time_spent_seconds,
        });
    }

    let answered_count = graded.len() as u32;
    if answered_count == 0 {
        return Err(EngineError::EmptySubmission);
    }
    let correct_count = graded.iter().filter(|a| a.is_correct).count() as u32;
    let score = compute_score(correct_count, answered_count);

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for result in tally.values() {
        if result.correct_ratio() >= STRENGTH_THRESHOLD {
            strengths.push(result.topic.clone());
        } else {
            weaknesses.push(result.topic.clone());
        }
    }

    let difficulty_suggestion = suggest_difficulty(score);
    info!(
        "[Analyze] Quiz {}: {}/{} correct, score {}, strengths {:?}, weaknesses {:?}, next {}",
        quiz.id, correct_count, answered_count, score, strengths, weaknesses, difficulty_suggestion
    );

    Ok(AttemptAnalysis {
        score,
        recommended_topics: weaknesses.clone(),
        strengths,
        weaknesses,
        difficulty_suggestion,
        understanding_level: score,
        correct_count,
        answered_count,
        topic_results: tally.into_values().collect(),
        answers: graded,
    })
}

/// Percentage rounded to the nearest integer. Only a perfect attempt scores 100;
/// `correct` beyond `answered` counts as `answered`.
pub fn compute_score(correct: u32, answered: u32) -> u8 {
    if answered == 0 {
        return 0;
    }
    let correct = correct.min(answered);
    let pct = (100.0 * correct as f64 / answered as f64).round() as u8;
    if correct < answered {
        pct.min(MAX_IMPERFECT_SCORE)
    } else {
        pct
    }
}

pub fn suggest_difficulty(understanding_level: u8) -> Difficulty {
    if understanding_level >= SUGGEST_HARD_AT {
        Difficulty::Hard
    } else if understanding_level <= SUGGEST_EASY_AT {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    }
}
