// src/pool.rs

use crate::error::{EngineError, EngineResult};
use crate::models::Question;
use crate::selector::DifficultyTargets;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Source of candidate questions. May return fewer (or more) than `count_hint`.
pub trait PoolProvider {
    fn name(&self) -> &str;

    fn candidate_questions(
        &self,
        topics: &[String],
        count_hint: usize,
    ) -> EngineResult<Vec<Question>>;
}

fn matches_topics(question: &Question, topics: &[String]) -> bool {
    topics.is_empty() || topics.contains(&question.topic)
}

// --- Providers ---

/// Fixed in-memory question bank.
pub struct StaticPool {
    name: String,
    questions: Vec<Question>,
}

impl StaticPool {
    pub fn new(name: &str, questions: Vec<Question>) -> Self {
        StaticPool {
            name: name.to_string(),
            questions,
        }
    }
}

impl PoolProvider for StaticPool {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidate_questions(
        &self,
        topics: &[String],
        _count_hint: usize,
    ) -> EngineResult<Vec<Question>> {
        Ok(self
            .questions
            .iter()
            .filter(|q| matches_topics(q, topics))
            .cloned()
            .collect())
    }
}

/// Question bank stored as a JSON array of questions.
pub struct JsonFilePool {
    path: PathBuf,
}

impl JsonFilePool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFilePool { path: path.into() }
    }
}

impl PoolProvider for JsonFilePool {
    fn name(&self) -> &str {
        "json-file"
    }

    fn candidate_questions(
        &self,
        topics: &[String],
        _count_hint: usize,
    ) -> EngineResult<Vec<Question>> {
        let data = fs::read_to_string(&self.path)
            .map_err(|e| EngineError::Provider(format!("{}: {}", self.path.display(), e)))?;
        let questions: Vec<Question> = serde_json::from_str(&data)?;
        debug!(
            "[Pool] Read {} question(s) from {}",
            questions.len(),
            self.path.display()
        );
        Ok(questions
            .into_iter()
            .filter(|q| matches_topics(q, topics))
            .collect())
    }
}

// --- Strategy Chain ---

/// Providers queried in order until every difficulty target is covered.
/// A failing provider is skipped; no retries.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn PoolProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl PoolProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Merges valid candidates from each provider (first occurrence of an id wins).
    /// Malformed questions are dropped per batch, so they never count toward
    /// `targets`. Fails only when every provider consulted failed.
    pub fn gather(
        &self,
        topics: &[String],
        targets: &DifficultyTargets,
    ) -> EngineResult<Vec<Question>> {
        let mut gathered: Vec<Question> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_error = None;
        let mut any_succeeded = false;

        for provider in &self.providers {
            let shortfall = targets.shortfall(&gathered);
            if shortfall == 0 {
                break;
            }
            match provider.candidate_questions(topics, shortfall) {
                Ok(questions) => {
                    any_succeeded = true;
                    let before = gathered.len();
                    for q in validate_pool(questions) {
                        if seen.insert(q.id.clone()) {
                            gathered.push(q);
                        }
                    }
                    info!(
                        "[Pool] Provider {} contributed {} candidate(s)",
                        provider.name(),
                        gathered.len() - before
                    );
                }
                Err(e) => {
                    warn!("[Pool] Provider {} failed: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_succeeded => Err(e),
            _ => Ok(gathered),
        }
    }
}

// --- Pre/Post Processing ---

fn defect(q: &Question) -> Option<&'static str> {
    if q.options.len() < 2 {
        Some("fewer than two options")
    } else if !(0.0..=1.0).contains(&q.confidence) {
        Some("confidence outside [0, 1]")
    } else if !q.options.iter().any(|o| o.trim() == q.correct_answer.trim()) {
        Some("correct answer not among options")
    } else {
        None
    }
}

/// Drops malformed candidates before selection.
pub fn validate_pool(pool: Vec<Question>) -> Vec<Question> {
    pool.into_iter()
        .filter(|q| match defect(q) {
            Some(reason) => {
                warn!("[Pool] Dropping question {}: {}", q.id, reason);
                false
            }
            None => true,
        })
        .collect()
}

/// Opt-in padding for short quizzes: cycles through `questions` in order,
/// cloning each with a derived id (`{id}#r{round}`) until `target` is reached.
pub fn pad_with_repeats(questions: &[Question], target: usize) -> Vec<Question> {
    let mut padded = questions.to_vec();
    if questions.is_empty() {
        return padded;
    }

    let mut round = 1;
    while padded.len() < target {
        for q in questions.iter().take(target - padded.len()) {
            let mut repeat = q.clone();
            repeat.id = format!("{}#r{}", q.id, round);
            padded.push(repeat);
        }
        round += 1;
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn question(id: &str, topic: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            options: vec!["A".into(), "B".into()],
            correct_answer: "A".into(),
            topic: topic.to_string(),
            difficulty: Difficulty::Easy,
            confidence: 0.5,
        }
    }

    fn graded(id: &str, difficulty: Difficulty) -> Question {
        Question {
            difficulty,
            ..question(id, "Arrays")
        }
    }

    fn easy(n: usize) -> DifficultyTargets {
        DifficultyTargets {
            easy: n,
            medium: 0,
            hard: 0,
        }
    }

    struct Unavailable;

    impl PoolProvider for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        fn candidate_questions(&self, _: &[String], _: usize) -> EngineResult<Vec<Question>> {
            Err(EngineError::Provider("service unavailable".into()))
        }
    }

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_static_pool_filters_by_topic() {
        let pool = StaticPool::new(
            "bank",
            vec![question("a", "Arrays"), question("g", "Graphs")],
        );
        let found = pool.candidate_questions(&["Graphs".to_string()], 5).unwrap();
        assert_eq!(ids(&found), vec!["g"]);
        assert_eq!(pool.candidate_questions(&[], 5).unwrap().len(), 2);
    }

    #[test]
    fn test_chain_skips_failing_provider() {
        let chain = ProviderChain::new()
            .with(Unavailable)
            .with(StaticPool::new("bank", vec![question("a", "Arrays")]));
        let found = chain.gather(&[], &easy(3)).unwrap();
        assert_eq!(ids(&found), vec!["a"]);
    }

    #[test]
    fn test_chain_stops_once_enough_and_dedupes() {
        let chain = ProviderChain::new()
            .with(StaticPool::new(
                "primary",
                vec![question("a", "Arrays"), question("b", "Arrays")],
            ))
            .with(StaticPool::new(
                "fallback",
                vec![question("b", "Arrays"), question("c", "Arrays")],
            ))
            .with(Unavailable);

        assert_eq!(ids(&chain.gather(&[], &easy(2)).unwrap()), vec!["a", "b"]);
        assert_eq!(ids(&chain.gather(&[], &easy(5)).unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_chain_keeps_going_until_each_difficulty_is_covered() {
        let chain = ProviderChain::new()
            .with(StaticPool::new(
                "easy-bank",
                vec![
                    graded("e1", Difficulty::Easy),
                    graded("e2", Difficulty::Easy),
                    graded("e3", Difficulty::Easy),
                ],
            ))
            .with(StaticPool::new(
                "mixed-bank",
                vec![graded("m1", Difficulty::Medium), graded("h1", Difficulty::Hard)],
            ));
        let targets = DifficultyTargets {
            easy: 1,
            medium: 1,
            hard: 1,
        };

        let found = chain.gather(&[], &targets).unwrap();
        assert_eq!(ids(&found), vec!["e1", "e2", "e3", "m1", "h1"]);
    }

    #[test]
    fn test_malformed_batch_does_not_count_toward_targets() {
        let mut broken = Vec::new();
        for id in ["x1", "x2", "x3"] {
            let mut q = question(id, "Arrays");
            q.correct_answer = "Z".into();
            broken.push(q);
        }
        let chain = ProviderChain::new()
            .with(StaticPool::new("broken", broken))
            .with(StaticPool::new(
                "fallback",
                vec![question("a", "Arrays"), question("b", "Arrays")],
            ));

        let found = chain.gather(&[], &easy(2)).unwrap();
        assert_eq!(ids(&found), vec!["a", "b"]);
    }

    #[test]
    fn test_chain_fails_when_every_provider_fails() {
        let chain = ProviderChain::new().with(Unavailable).with(Unavailable);
        let err = chain.gather(&[], &easy(3)).unwrap_err();
        assert!(matches!(err, EngineError::Provider(_)));
    }

    #[test]
    fn test_json_file_pool_reads_questions() {
        let path = std::env::temp_dir().join(format!("pool-{}.json", uuid::Uuid::new_v4()));
        let questions = vec![question("a", "Arrays"), question("g", "Graphs")];
        fs::write(&path, serde_json::to_string(&questions).unwrap()).unwrap();

        let pool = JsonFilePool::new(&path);
        let found = pool.candidate_questions(&["Arrays".to_string()], 1).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(found, vec![question("a", "Arrays")]);
    }

    #[test]
    fn test_json_file_pool_missing_file_is_provider_error() {
        let pool = JsonFilePool::new("/nonexistent/pool.json");
        assert!(matches!(
            pool.candidate_questions(&[], 1),
            Err(EngineError::Provider(_))
        ));
    }

    #[test]
    fn test_validate_drops_malformed_questions() {
        let mut one_option = question("one", "Arrays");
        one_option.options = vec!["A".into()];
        let mut bad_confidence = question("conf", "Arrays");
        bad_confidence.confidence = f64::NAN;
        let mut no_answer = question("answer", "Arrays");
        no_answer.correct_answer = "Z".into();

        let kept = validate_pool(vec![
            one_option,
            question("ok", "Arrays"),
            bad_confidence,
            no_answer,
        ]);
        assert_eq!(ids(&kept), vec!["ok"]);
    }

    #[test]
    fn test_padding_is_deterministic() {
        let questions = vec![question("a", "Arrays"), question("b", "Arrays")];
        let padded = pad_with_repeats(&questions, 5);
        assert_eq!(ids(&padded), vec!["a", "b", "a#r1", "b#r1", "a#r2"]);
        assert_eq!(pad_with_repeats(&questions, 5), padded);
        assert_eq!(pad_with_repeats(&questions, 1).len(), 2);
        assert!(pad_with_repeats(&[], 3).is_empty());
    }
}
