// src/pedagogy.rs

use crate::analyzer::analyze;
use crate::error::{EngineError, EngineResult};
use crate::models::{PerformanceProfile, QuizAttempt, StudyBudget, StudyPlanItem, SubmittedAnswer};
use crate::pool::{pad_with_repeats, ProviderChain};
use crate::progress;
use crate::repository;
use crate::scheduler::{neutral_profile, schedule};
use crate::selector::{select, DifficultyMix, Selection};
use crate::store::{ProfileStore, SqliteStore};
use log::{debug, info, warn};

// --- Public Interface ---

#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub student_id: String,
    pub subject: String,
    /// Topics to draw candidates from; empty means any.
    pub topics: Vec<String>,
    pub total: usize,
    /// Explicit `[easy, medium, hard]` split. `None` derives one from the profile.
    pub mix: Option<[f64; 3]>,
    /// Pad a short quiz with repeated questions instead of returning it short.
    pub pad_short_quiz: bool,
}

#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub attempt: QuizAttempt,
    pub profile: PerformanceProfile,
}

/// Mix for a request: the explicit one if given, otherwise adapted to the profile.
pub fn request_mix(
    request: &QuizRequest,
    profile: &PerformanceProfile,
) -> EngineResult<DifficultyMix> {
    match request.mix {
        Some(mix) => DifficultyMix::from_array(mix),
        None => Ok(DifficultyMix::adaptive(profile, &request.topics)),
    }
}

/// Selects and stores a quiz. A selection with no questions at all is
/// reported as `PoolExhausted` and not stored.
pub fn prepare_quiz(
    store: &SqliteStore,
    providers: &ProviderChain,
    request: &QuizRequest,
) -> EngineResult<Selection> {
    let profile = store.load(&request.student_id)?;
    let mix = request_mix(request, &profile)?;
    let targets = mix.targets(request.total);
    debug!(
        "[Quiz] Requesting {} question(s) on {} with mix {:?}",
        request.total,
        request.subject,
        mix.fractions()
    );

    let candidates = providers.gather(&request.topics, &targets)?;
    let mut selection = select(
        &request.subject,
        &candidates,
        &profile,
        request.total,
        mix.fractions(),
    )?;

    if selection.is_exhausted() {
        let available = selection.quiz.questions.len();
        if available == 0 {
            warn!(
                "[Quiz] No usable questions for {} on {}",
                request.student_id, request.subject
            );
            return Err(EngineError::PoolExhausted {
                requested: request.total,
                available,
            });
        }
        if request.pad_short_quiz {
            selection.quiz.questions = pad_with_repeats(&selection.quiz.questions, request.total);
            selection.padded = selection.quiz.questions.len() - available;
            warn!(
                "[Quiz] Padded quiz {} with {} repeated question(s)",
                selection.quiz.id, selection.padded
            );
        } else {
            warn!(
                "[Quiz] Quiz {} is short: {} of {} question(s)",
                selection.quiz.id, available, request.total
            );
        }
    }

    store.transact(|tx| repository::save_quiz(tx, &selection.quiz))?;
    info!(
        "[Quiz] Prepared quiz {} for {} ({} question(s))",
        selection.quiz.id,
        request.student_id,
        selection.quiz.questions.len()
    );
    Ok(selection)
}

/// Grades a submission and folds it into the student's profile.
///
/// The profile update and the attempt record are written in one transaction;
/// an empty submission records nothing.
pub fn submit_attempt(
    store: &SqliteStore,
    student_id: &str,
    quiz_id: &str,
    answers: &[SubmittedAnswer],
) -> EngineResult<AttemptOutcome> {
    info!(
        "Processing attempt for quiz {} by student {}",
        quiz_id, student_id
    );
    let quiz = store
        .with_conn(|conn| repository::load_quiz(conn, quiz_id))?
        .ok_or_else(|| EngineError::UnknownQuiz(quiz_id.to_string()))?;

    let analysis = analyze(&quiz, answers)?;
    let attempt = QuizAttempt::record(&quiz, student_id, analysis);

    let profile = store.update(student_id, |tx, profile| {
        progress::apply(profile, &quiz.topic, &attempt.analysis);
        repository::record_attempt(tx, &attempt)
    })?;

    Ok(AttemptOutcome { attempt, profile })
}

/// Replaces the stored plan with a fresh one.
///
/// `bootstrap_topics` is only consulted when the student has no topics yet; it
/// plans from a neutral profile over those topics instead of returning an empty plan.
pub fn regenerate_plan(
    store: &SqliteStore,
    student_id: &str,
    budget: StudyBudget,
    bootstrap_topics: &[String],
) -> EngineResult<Vec<StudyPlanItem>> {
    store.transact(|tx| {
        let mut profile = repository::load_profile(tx, student_id)?;
        if profile.topics.is_empty() && !bootstrap_topics.is_empty() {
            info!(
                "[Plan] No history for {}; planning from neutral profile over {} topic(s)",
                student_id,
                bootstrap_topics.len()
            );
            profile = neutral_profile(student_id, bootstrap_topics);
        }

        let plan = schedule(
            &profile,
            budget.hours_per_week,
            budget.block_minutes,
            budget.horizon_weeks,
        )?;
        repository::replace_study_plan(tx, student_id, &plan)?;
        Ok(plan)
    })
}
