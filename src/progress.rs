// src/progress.rs

use crate::constants::*;
use crate::models::{mean, AttemptAnalysis, PerformanceProfile, SubjectProgress};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Folds an analyzed attempt on `subject` into the profile.
pub fn apply(profile: &mut PerformanceProfile, subject: &str, analysis: &AttemptAnalysis) {
    apply_at(profile, subject, analysis, Utc::now());
}

/// Same as [`apply`] with an explicit clock.
///
/// Every topic classified by the attempt gets its understanding moved by the
/// strength/weakness delta and clamped to [0, 100]. Each touched topic also
/// records the attempt's strong and weak areas; an area entering one set leaves
/// the other, so the two never overlap. Subject-level progress is recomputed last.
pub fn apply_at(
    profile: &mut PerformanceProfile,
    subject: &str,
    analysis: &AttemptAnalysis,
    now: DateTime<Utc>,
) {
    for topic in analysis.topics() {
        let is_strength = analysis.is_strength(topic);
        let delta = if is_strength {
            STRENGTH_DELTA
        } else {
            WEAKNESS_DELTA
        };

        let progress = profile.topic_mut(topic);
        let old_understanding = progress.understanding;
        progress.understanding =
            (progress.understanding + delta).clamp(UNDERSTANDING_MIN, UNDERSTANDING_MAX);
        progress.quizzes_taken += 1;
        progress.last_quiz_date = Some(now);

        for area in &analysis.strengths {
            progress.weak_areas.remove(area);
            progress.strong_areas.insert(area.clone());
        }
        for area in &analysis.weaknesses {
            progress.strong_areas.remove(area);
            progress.weak_areas.insert(area.clone());
        }

        info!(
            "[Progress] Topic {}: {:.1} -> {:.1} ({}, quizzes: {})",
            topic,
            old_understanding,
            progress.understanding,
            if is_strength { "strength" } else { "weakness" },
            progress.quizzes_taken
        );
    }

    let subject_progress = profile
        .subjects
        .entry(subject.to_string())
        .or_insert_with(|| SubjectProgress::new(subject));
    subject_progress.attempts += 1;
    subject_progress.score_sum += analysis.score as u64;
    subject_progress
        .topics
        .extend(analysis.topics().cloned());

    let topic_average = mean(
        subject_progress
            .topics
            .iter()
            .filter_map(|t| profile.topics.get(t))
            .map(|t| t.understanding),
    );
    let history_average = subject_progress.quiz_history_average();
    let overall_progress =
        QUIZ_HISTORY_WEIGHT * history_average + TOPIC_UNDERSTANDING_WEIGHT * topic_average;
    subject_progress.overall_progress = overall_progress;

    debug!(
        "[Progress] Subject {}: history avg {:.1}, topic avg {:.1}",
        subject, history_average, topic_average
    );
    info!(
        "[Progress] Student {}: subject {} progress {:.1}, overall growth {:.1}",
        profile.student_id,
        subject,
        overall_progress,
        profile.overall_growth()
    );
}
